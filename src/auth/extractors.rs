use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

/// The id of the user the current request is authenticated as.
///
/// Inserted into the request extensions by `AuthMiddleware`; extracting it on a
/// route the middleware does not cover yields `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().copied() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let user_id = Uuid::new_v4();
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUser(user_id));

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().0, user_id);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedUser::from_request(&req, &mut payload).await;

        let err = result.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
