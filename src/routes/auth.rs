use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};

use super::next_path;
use crate::{
    AppState,
    admin,
    entities::auth_user,
    error::AppResult,
    password,
    session::{self, MaybeUser, SessionPayload},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    email: String,
    password: String,
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    name: String,
    email: String,
    password: String,
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UnlockForm {
    passphrase: String,
    next: Option<String>,
}

pub async fn sign_in_redirect() -> Redirect {
    Redirect::to("/sign-in")
}

pub async fn sign_up_redirect() -> Redirect {
    Redirect::to("/sign-up")
}

fn signed_in(state: &AppState, jar: CookieJar, user: auth_user::Model, next: &str) -> (CookieJar, Redirect) {
    let payload = SessionPayload { id: user.id, email: user.email };
    let jar = jar.add(session::session_cookie(&payload, state.config.production));
    (jar, Redirect::to(next))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> (CookieJar, Redirect) {
    let email = form.email.trim();
    let next = next_path(form.next.as_deref(), "/me");
    if email.is_empty() || form.password.is_empty() {
        return (jar, Redirect::to("/sign-in"));
    }

    match state.store.find_user_by_email(email).await {
        Ok(Some(user)) if password::verify_password(&form.password, &user.password_hash) => {
            tracing::debug!(user_id = %user.id, "signed in");
            signed_in(&state, jar, user, &next)
        },
        Ok(_) => (jar, Redirect::to("/sign-in?error=invalid")),
        Err(err) => {
            tracing::error!(error = %err, "sign-in failed");
            (jar, Redirect::to("/sign-in?error=server"))
        },
    }
}

enum SignUpOutcome {
    Created(auth_user::Model),
    Exists,
}

async fn register(state: &AppState, form: &SignUpForm, email: &str) -> AppResult<SignUpOutcome> {
    if state.store.find_user_by_email(email).await?.is_some() {
        return Ok(SignUpOutcome::Exists);
    }
    let name = form.name.trim();
    let seed = if name.is_empty() { email.split('@').next().unwrap_or_default() } else { name };
    let hash = password::hash_password(&form.password);
    let user = state.store.create_user(email, &hash, seed, Some(name)).await?;
    Ok(SignUpOutcome::Created(user))
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> (CookieJar, Redirect) {
    let email = form.email.trim().to_string();
    let next = next_path(form.next.as_deref(), "/me");
    if email.is_empty() || form.password.is_empty() {
        return (jar, Redirect::to("/sign-up"));
    }

    match register(&state, &form, &email).await {
        Ok(SignUpOutcome::Created(user)) => {
            tracing::info!(user_id = %user.id, "signed up");
            signed_in(&state, jar, user, &next)
        },
        Ok(SignUpOutcome::Exists) => (jar, Redirect::to("/sign-in?error=exists")),
        Err(err) => {
            tracing::error!(error = %err, "sign-up failed");
            (jar, Redirect::to("/sign-up?error=server"))
        },
    }
}

pub async fn sign_out(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.add(session::clear_session_cookie(state.config.production));
    (jar, Redirect::to("/"))
}

pub async fn session(MaybeUser(user): MaybeUser) -> Json<Value> {
    Json(json!({ "ok": true, "user": user }))
}

pub async fn admin_unlock(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<UnlockForm>,
) -> (CookieJar, Redirect) {
    let next = next_path(form.next.as_deref(), "/reviews");
    let expected = state.config.admin_passphrase.as_deref().unwrap_or_default();

    if expected.is_empty()
        || !constant_time_eq::constant_time_eq(form.passphrase.as_bytes(), expected.as_bytes())
    {
        tracing::warn!("admin unlock rejected");
        let back = format!("/admin/unlock?error=1&next={}", urlencoding::encode(&next));
        return (jar, Redirect::to(&back));
    }

    let jar = jar.add(admin::admin_cookie(expected, state.config.production));
    (jar, Redirect::to(&next))
}
