//! Cookie session: base64url JSON `{id, email}` checked against the user table on every request.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::AppError, models::SessionUser};

pub const SESSION_COOKIE_NAME: &str = "mbd_session";
const SESSION_MAX_AGE_DAYS: i64 = 30;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub id: String,
    pub email: String,
}

pub fn encode_session(payload: &SessionPayload) -> String {
    let json = serde_json::to_vec(payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode_session(value: &str) -> Option<SessionPayload> {
    // Tolerate padded input from other encoders.
    let bytes = URL_SAFE_NO_PAD.decode(value.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn session_cookie(payload: &SessionPayload, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, encode_session(payload)))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::days(SESSION_MAX_AGE_DAYS))
        .build()
}

pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Resolves the session cookie to a user, or `None` for anonymous/invalid sessions.
pub async fn resolve(state: &AppState, jar: &CookieJar) -> Option<SessionUser> {
    let raw = jar.get(SESSION_COOKIE_NAME)?.value();
    if raw.is_empty() {
        return None;
    }
    let payload = decode_session(raw)?;
    if payload.id.is_empty() {
        return None;
    }

    match state.store.find_user_with_profile(&payload.id).await {
        Ok(Some((user, profile))) if user.email == payload.email => Some(SessionUser {
            id: user.id,
            email: user.email,
            name: profile.and_then(|p| p.display_name),
        }),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(error = %err, "session lookup failed");
            None
        },
    }
}

/// Signed-in user; rejects with 401 when there is no valid session.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        resolve(state, &jar).await.map(CurrentUser).ok_or(AppError::Unauthorized)
    }
}

/// Session user if present; never rejects.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybeUser(resolve(state, &jar).await))
    }
}
