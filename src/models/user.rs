use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row together with its bcrypt hash. Stays inside the auth service.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Insert payload for a new account. `email` is already normalised.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

impl NewUser {
    pub fn new(email: String, password_hash: String, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
        }
    }
}

/// Emails are unique regardless of case and surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_user_serialization_has_no_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            name: Some("Alice".to_string()),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
