//! Registration, login, token refresh and logout.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;
use validator::Validate;

use crate::auth::cookies::CookieSettings;
use crate::auth::token::{generate_refresh_token, hash_refresh_token, AccessTokens};
use crate::auth::{password, LoginRequest, LoginResponse, RegisterRequest, TokenPair};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::user::normalize_email;
use crate::models::{NewRefreshToken, NewUser, User};
use crate::store::{SessionStore, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";
/// Hashed once and verified against for unknown emails.
const DUMMY_PASSWORD: &str = "taskboard-timing-equaliser";

/// Tunables of the auth flow.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub cookie_secure: bool,
}

impl AuthSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_token_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_token_ttl: Duration::days(config.refresh_token_ttl_days),
            bcrypt_cost: config.bcrypt_cost,
            cookie_secure: config.cookie_secure,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cookie_secure: false,
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    access_tokens: AccessTokens,
    settings: AuthSettings,
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        jwt_secret: &str,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            sessions,
            access_tokens: AccessTokens::new(jwt_secret, settings.access_token_ttl),
            settings,
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.settings.cookie_secure,
            refresh_ttl_secs: self.settings.refresh_token_ttl.num_seconds(),
        }
    }

    /// Creates an account. Fails with `Conflict` if the email is taken.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.users.find_user_by_email(&email).await?.is_some() {
            log::info!("Registration rejected, email already in use");
            return Err(AppError::Conflict(
                "User with this email already exists".into(),
            ));
        }

        let password_hash = self.hash(request.password).await?;
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        // The unique index still guards against a concurrent registration.
        let user = self
            .users
            .insert_user(NewUser::new(email, password_hash, name))
            .await?;
        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Verifies credentials and opens a session.
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let record = match self.users.find_user_by_email(&email).await? {
            Some(record) => record,
            None => {
                // Spend the same bcrypt work as a real check before answering.
                let dummy = self.dummy_hash().await?;
                self.verify(request.password, dummy).await?;
                log::warn!("Login failed: unknown email");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        if !self
            .verify(request.password, record.password_hash.clone())
            .await?
        {
            log::warn!("Login failed: wrong password for user {}", record.user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let purged = self
            .sessions
            .purge_refresh_tokens(record.user.id, Utc::now())
            .await?;
        if purged > 0 {
            log::debug!("Purged {} dead refresh tokens of user {}", purged, record.user.id);
        }

        let raw_refresh = generate_refresh_token();
        self.sessions
            .insert_refresh_token(NewRefreshToken::new(
                record.user.id,
                hash_refresh_token(&raw_refresh),
                self.settings.refresh_token_ttl,
            ))
            .await?;

        let tokens = self.token_pair(record.user.id, raw_refresh)?;
        log::info!("User {} logged in", record.user.id);
        Ok(LoginResponse {
            user: record.user,
            tokens,
        })
    }

    /// Exchanges an active refresh token for a new pair. The presented token is
    /// revoked in the same step, so it can be used at most once.
    pub async fn refresh(&self, raw_refresh: &str) -> AppResult<TokenPair> {
        let unauthorized = || AppError::Unauthorized(INVALID_REFRESH_TOKEN.into());

        let stored = self
            .sessions
            .find_refresh_token(&hash_refresh_token(raw_refresh))
            .await?
            .ok_or_else(unauthorized)?;

        if !stored.is_active(Utc::now()) {
            log::warn!(
                "Rejected inactive refresh token {} of user {}",
                stored.id,
                stored.user_id
            );
            return Err(unauthorized());
        }

        if self.users.find_user_by_id(stored.user_id).await?.is_none() {
            return Err(unauthorized());
        }

        let new_raw = generate_refresh_token();
        let replacement = NewRefreshToken::new(
            stored.user_id,
            hash_refresh_token(&new_raw),
            self.settings.refresh_token_ttl,
        );
        // Lost a race with another refresh or a logout.
        if self
            .sessions
            .rotate_refresh_token(stored.id, replacement)
            .await?
            .is_none()
        {
            return Err(unauthorized());
        }

        log::info!("Rotated refresh token for user {}", stored.user_id);
        self.token_pair(stored.user_id, new_raw)
    }

    /// Revokes the presented refresh token. Calling it twice, or without a token, is fine.
    pub async fn logout(&self, raw_refresh: Option<&str>) -> AppResult<()> {
        if let Some(raw) = raw_refresh.filter(|raw| !raw.is_empty()) {
            self.sessions
                .revoke_refresh_token(&hash_refresh_token(raw))
                .await?;
        }
        Ok(())
    }

    /// Resolves an access token to the id of the user it was issued for.
    pub fn authenticate(&self, access_token: &str) -> AppResult<Uuid> {
        self.access_tokens.verify(access_token).map(|claims| claims.sub)
    }

    fn token_pair(&self, user_id: Uuid, refresh_token: String) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.access_tokens.issue(user_id)?,
            refresh_token,
            expires_in: self.access_tokens.ttl_secs(),
        })
    }

    async fn hash(&self, password: String) -> AppResult<String> {
        let cost = self.settings.bcrypt_cost;
        tokio::task::spawn_blocking(move || password::hash_password(&password, cost)).await?
    }

    async fn dummy_hash(&self) -> AppResult<String> {
        self.dummy_hash
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    async fn verify(&self, password: String, hash: String) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || password::verify_password(&password, &hash)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AuthService {
        let store = Arc::new(MemoryStore::new());
        AuthService::new(
            store.clone(),
            store,
            "unit-test-secret",
            AuthSettings {
                bcrypt_cost: 4,
                ..AuthSettings::default()
            },
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            name: Some("  Ada  ".to_string()),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_then_login() {
        let auth = service();
        let user = auth.register(register_request("Ada@Example.com")).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada"));

        let session = auth
            .login(login_request("ada@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(auth.authenticate(&session.tokens.access_token).unwrap(), user.id);
    }

    #[actix_rt::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service();
        auth.register(register_request("dup@example.com")).await.unwrap();
        let second = auth.register(register_request("DUP@example.com")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(register_request("bob@example.com")).await.unwrap();

        let wrong_password = auth
            .login(login_request("bob@example.com", "nope-nope"))
            .await;
        let unknown = auth
            .login(login_request("nobody@example.com", "password123"))
            .await;

        match (wrong_password, unknown) {
            (Err(AppError::Unauthorized(a)), Err(AppError::Unauthorized(b))) => assert_eq!(a, b),
            other => panic!("expected two Unauthorized errors, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_refresh_rotates_and_old_token_dies() {
        let auth = service();
        auth.register(register_request("eve@example.com")).await.unwrap();
        let session = auth
            .login(login_request("eve@example.com", "password123"))
            .await
            .unwrap();

        let rotated = auth.refresh(&session.tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, session.tokens.refresh_token);

        let reused = auth.refresh(&session.tokens.refresh_token).await;
        assert!(matches!(reused, Err(AppError::Unauthorized(_))));

        assert!(auth.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_logout_is_idempotent_and_revokes() {
        let auth = service();
        auth.register(register_request("sam@example.com")).await.unwrap();
        let session = auth
            .login(login_request("sam@example.com", "password123"))
            .await
            .unwrap();

        auth.logout(Some(&session.tokens.refresh_token)).await.unwrap();
        auth.logout(Some(&session.tokens.refresh_token)).await.unwrap();
        auth.logout(None).await.unwrap();

        let after = auth.refresh(&session.tokens.refresh_token).await;
        assert!(matches!(after, Err(AppError::Unauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_expired_refresh_token_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            "unit-test-secret",
            AuthSettings {
                bcrypt_cost: 4,
                refresh_token_ttl: Duration::seconds(-1),
                ..AuthSettings::default()
            },
        );
        auth.register(register_request("old@example.com")).await.unwrap();
        let session = auth
            .login(login_request("old@example.com", "password123"))
            .await
            .unwrap();

        let result = auth.refresh(&session.tokens.refresh_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_unknown_refresh_token_is_rejected() {
        let auth = service();
        let result = auth.refresh("does-not-exist").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_unknown_email_still_runs_bcrypt() {
        let auth = service();
        assert!(auth.dummy_hash.get().is_none());

        let result = auth
            .login(login_request("ghost@example.com", "password123"))
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let dummy = auth.dummy_hash.get().expect("dummy hash computed");
        assert!(password::verify_password(DUMMY_PASSWORD, dummy).unwrap());
    }

    #[actix_rt::test]
    async fn test_login_purges_dead_refresh_tokens() {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            "unit-test-secret",
            AuthSettings {
                bcrypt_cost: 4,
                ..AuthSettings::default()
            },
        );
        auth.register(register_request("tidy@example.com")).await.unwrap();

        let first = auth
            .login(login_request("tidy@example.com", "password123"))
            .await
            .unwrap();
        auth.logout(Some(&first.tokens.refresh_token)).await.unwrap();
        let first_hash = hash_refresh_token(&first.tokens.refresh_token);
        assert!(store.find_refresh_token(&first_hash).await.unwrap().is_some());

        let second = auth
            .login(login_request("tidy@example.com", "password123"))
            .await
            .unwrap();
        assert!(store.find_refresh_token(&first_hash).await.unwrap().is_none());
        assert!(auth.refresh(&second.tokens.refresh_token).await.is_ok());
    }
}
