use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::{AuthService, AuthenticatedUser};
use crate::error::AppError;

/// Rejects requests without a valid access token and records the caller's identity
/// in the request extensions for [`AuthenticatedUser`].
///
/// The token is read from `Authorization: Bearer …`, falling back to the
/// `accessToken` cookie.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

fn access_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer
        .or_else(|| req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string()))
        .filter(|token| !token.is_empty())
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user_id = match req.app_data::<web::Data<AuthService>>() {
            Some(auth) => match access_token(&req) {
                Some(token) => auth.authenticate(&token),
                None => Err(AppError::Unauthorized("Authentication required".into())),
            },
            None => Err(AppError::InternalServerError(
                "AuthService is not registered as app data".into(),
            )),
        };

        match user_id {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser(user_id));
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            // Rendered here so the rejection carries the JSON envelope.
            Err(app_err) => {
                log::debug!("Rejected request to {}: {}", req.path(), app_err);
                let response = req
                    .into_response(app_err.error_response())
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
