//! HTTP-only cookies carrying the session for browser clients.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::HttpRequest;

use crate::auth::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

const ACCESS_COOKIE_PATH: &str = "/api";
/// The refresh token is only ever sent to the auth endpoints.
const REFRESH_COOKIE_PATH: &str = "/api/auth";

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub refresh_ttl_secs: i64,
}

fn build(name: &'static str, value: String, path: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path(path)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .finish()
}

/// Cookies set after login and refresh.
pub fn session_cookies(tokens: &TokenPair, settings: CookieSettings) -> [Cookie<'static>; 2] {
    let mut access = build(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        ACCESS_COOKIE_PATH,
        settings.secure,
    );
    access.set_max_age(time::Duration::seconds(tokens.expires_in));

    let mut refresh = build(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        REFRESH_COOKIE_PATH,
        settings.secure,
    );
    refresh.set_max_age(time::Duration::seconds(settings.refresh_ttl_secs));

    [access, refresh]
}

/// Expired, empty cookies that make the browser forget the session.
pub fn removal_cookies(settings: CookieSettings) -> [Cookie<'static>; 2] {
    let mut access = build(ACCESS_COOKIE, String::new(), ACCESS_COOKIE_PATH, settings.secure);
    access.make_removal();
    let mut refresh = build(REFRESH_COOKIE, String::new(), REFRESH_COOKIE_PATH, settings.secure);
    refresh.make_removal();
    [access, refresh]
}

/// Non-empty value of the refresh cookie, if the client sent one.
pub fn refresh_cookie(req: &HttpRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
