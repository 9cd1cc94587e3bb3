pub mod cookies;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use service::AuthService;
pub use token::{AccessTokens, Claims};

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account. Compared case-insensitively.
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Optional display name.
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /auth/refresh`. The token may also arrive in the `refreshToken` cookie.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: Option<String>,
}

/// Access/refresh pair handed out by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Successful login: the user and a fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn violated_fields(result: Result<(), validator::ValidationErrors>) -> Vec<String> {
        match result.map_err(AppError::from) {
            Err(AppError::ValidationError(violations)) => {
                violations.into_iter().map(|v| v.field).collect()
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_register_rules() {
        let ok = RegisterRequest {
            email: "new@example.com".to_string(),
            password: "secret".to_string(),
            name: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "no-at-sign".to_string(),
            password: "12345".to_string(),
            name: Some("n".repeat(101)),
        };
        assert_eq!(violated_fields(bad.validate()), vec!["email", "name", "password"]);
    }

    #[test]
    fn test_login_requires_a_password() {
        let login = LoginRequest {
            email: "someone@example.com".to_string(),
            password: String::new(),
        };
        assert_eq!(violated_fields(login.validate()), vec!["password"]);
    }

    #[test]
    fn test_refresh_request_reads_camel_case() {
        let request: RefreshRequest =
            serde_json::from_str(r#"{"refreshToken": "abc"}"#).unwrap();
        assert_eq!(request.refresh_token.as_deref(), Some("abc"));

        let empty = RefreshRequest {
            refresh_token: Some(String::new()),
        };
        assert_eq!(violated_fields(empty.validate()), vec!["refreshToken"]);
    }

    #[test]
    fn test_login_response_is_flat() {
        let response = LoginResponse {
            user: User {
                id: uuid::Uuid::nil(),
                email: "a@example.com".to_string(),
                name: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            tokens: TokenPair {
                access_token: "jwt".to_string(),
                refresh_token: "opaque".to_string(),
                expires_in: 900,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "jwt");
        assert_eq!(json["refreshToken"], "opaque");
        assert_eq!(json["expiresIn"], 900);
        assert_eq!(json["user"]["email"], "a@example.com");
    }
}
