use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted refresh token. Only the SHA-256 digest of the opaque value is kept.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Only an active token may be exchanged for a new access token.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewRefreshToken {
    pub fn new(user_id: Uuid, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            issued_at: now,
            expires_at: now + ttl,
        }
    }
}

impl From<NewRefreshToken> for RefreshToken {
    fn from(token: NewRefreshToken) -> Self {
        Self {
            id: token.id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            issued_at: token.issued_at,
            expires_at: token.expires_at,
            revoked_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_activity() {
        let token: RefreshToken =
            NewRefreshToken::new(Uuid::new_v4(), "hash".into(), Duration::days(7)).into();
        let now = Utc::now();
        assert!(token.is_active(now));
        assert!(!token.is_active(now + Duration::days(8)));

        let revoked = RefreshToken {
            revoked_at: Some(now),
            ..token
        };
        assert!(!revoked.is_active(now));
    }
}
