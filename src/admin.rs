//! Shared-passphrase gate in front of the legacy write routes.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};

use crate::{AppState, config::Config, error::AppError};

pub const ADMIN_HEADER: &str = "x-admin-passphrase";
pub const ADMIN_COOKIE_NAME: &str = "ft_admin";
const ADMIN_MAX_AGE_DAYS: i64 = 7;

/// Passes when writes are open, or when the header or cookie carries the passphrase.
pub fn is_admin(config: &Config, header: Option<&str>, cookie: Option<&str>) -> bool {
    if !config.public_readonly {
        return true;
    }
    let Some(expected) = config.admin_passphrase.as_deref() else {
        return false;
    };
    [header, cookie]
        .into_iter()
        .flatten()
        .any(|given| constant_time_eq::constant_time_eq(given.as_bytes(), expected.as_bytes()))
}

pub fn admin_cookie(passphrase: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_COOKIE_NAME, passphrase.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::days(ADMIN_MAX_AGE_DAYS))
        .build()
}

/// Extractor that rejects with `ADMIN_REQUIRED` unless the request passes [`is_admin`].
#[derive(Clone, Copy, Debug)]
pub struct RequireAdmin;

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(ADMIN_COOKIE_NAME).map(|c| c.value());

        if is_admin(&state.config, header, cookie) {
            Ok(RequireAdmin)
        } else {
            tracing::debug!(path = %parts.uri.path(), "admin passphrase missing or wrong");
            Err(AppError::AdminRequired)
        }
    }
}
