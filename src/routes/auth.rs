use crate::{
    auth::{cookies, AuthService, LoginRequest, RefreshRequest, RegisterRequest},
    error::AppError,
    response::ApiResponse,
};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates the account and returns it, without the password hash.
///
/// ## Responses:
/// - `201 Created`: `{ user }`.
/// - `400 Bad Request`: invalid email, short password or malformed body.
/// - `409 Conflict`: the email is already registered.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = auth.register(register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        "User registered successfully",
        json!({ "user": user }),
    )))
}

/// Login user
///
/// Returns the user, an access token and a refresh token, and sets both tokens as
/// HTTP-only cookies.
///
/// ## Responses:
/// - `200 OK`: `{ user, accessToken, refreshToken, expiresIn }`.
/// - `400 Bad Request`: malformed body.
/// - `401 Unauthorized`: unknown email or wrong password.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let session = auth.login(login_data.into_inner()).await?;

    let mut response = HttpResponse::Ok();
    for cookie in cookies::session_cookies(&session.tokens, auth.cookie_settings()) {
        response.cookie(cookie);
    }
    Ok(response.json(ApiResponse::with_message("Login successful", session)))
}

/// Refresh the session
///
/// Takes the refresh token from the body (`refreshToken`) or, failing that, from the
/// cookie. The token is consumed: a new access token and a new refresh token are
/// returned and set as cookies.
///
/// ## Responses:
/// - `200 OK`: `{ accessToken, refreshToken, expiresIn }`.
/// - `400 Bad Request`: no refresh token supplied.
/// - `401 Unauthorized`: unknown, expired, revoked or already used token.
#[post("/refresh")]
pub async fn refresh(
    auth: web::Data<AuthService>,
    body: Option<web::Json<RefreshRequest>>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    body.validate()?;

    let raw = body
        .refresh_token
        .or_else(|| cookies::refresh_cookie(&req))
        .ok_or_else(|| AppError::invalid("refreshToken", "Refresh token is required"))?;

    let tokens = auth.refresh(&raw).await?;

    let mut response = HttpResponse::Ok();
    for cookie in cookies::session_cookies(&tokens, auth.cookie_settings()) {
        response.cookie(cookie);
    }
    Ok(response.json(ApiResponse::with_message("Token refreshed successfully", tokens)))
}

/// Logout
///
/// Revokes the presented refresh token (body or cookie) and clears the session
/// cookies. Always succeeds.
#[post("/logout")]
pub async fn logout(
    auth: web::Data<AuthService>,
    body: Option<web::Json<RefreshRequest>>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let raw = body
        .and_then(|b| b.into_inner().refresh_token)
        .filter(|token| !token.is_empty())
        .or_else(|| cookies::refresh_cookie(&req));

    auth.logout(raw.as_deref()).await?;

    let mut response = HttpResponse::Ok();
    for cookie in cookies::removal_cookies(auth.cookie_settings()) {
        response.cookie(cookie);
    }
    Ok(response.json(ApiResponse::message("Logged out successfully")))
}
