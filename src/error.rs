use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{catalog::CatalogError, templates};

/// Per-field validation messages, serialized as `error.details`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { message: String, details: Option<FieldErrors> },

    #[error("Sign in required.")]
    Unauthorized,

    #[error("Admin required.")]
    AdminRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited,

    #[error(transparent)]
    Upstream(#[from] CatalogError),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), details: None }
    }

    pub fn invalid_body(details: FieldErrors) -> Self {
        Self::BadRequest { message: "Invalid request body.".to_string(), details: Some(details) }
    }

    pub fn invalid_query(details: FieldErrors) -> Self {
        Self::BadRequest {
            message: "Invalid query parameters.".to_string(),
            details: Some(details),
        }
    }

    /// A 400 carrying one field error, for checks that only the store can make.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::invalid_body(single_detail(field, message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Text safe to show on a page: the first field error if any, never database or internal detail.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest { details: Some(details), .. } => details
                .values()
                .flatten()
                .next()
                .cloned()
                .unwrap_or_else(|| self.to_string()),
            AppError::Database(_) | AppError::Internal(_) => "Something went wrong.".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::AdminRequired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::AdminRequired => "ADMIN_REQUIRED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Database(_) | AppError::Internal(_) => "SERVER_ERROR",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid_body(single_detail("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid_query(single_detail("query", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: "Invalid path parameter.".to_string(),
            details: Some(single_detail("path", rejection.body_text())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(err) => tracing::error!(error = %err, "database error"),
            AppError::Internal(err) => tracing::error!(error = ?err, "internal error"),
            AppError::Upstream(err) => tracing::warn!(error = %err, "upstream catalog error"),
            _ => {},
        }

        let mut error = json!({ "code": self.code(), "message": self.to_string() });
        if let AppError::BadRequest { details: Some(details), .. } = &self {
            error["details"] = json!(details);
        }

        (status, Json(json!({ "ok": false, "error": error }))).into_response()
    }
}

/// Rejection for HTML pages: renders the error page instead of the JSON envelope.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl From<QueryRejection> for PageError {
    fn from(rejection: QueryRejection) -> Self {
        PageError(rejection.into())
    }
}

impl From<FormRejection> for PageError {
    fn from(rejection: FormRejection) -> Self {
        PageError(AppError::BadRequest {
            message: "Invalid form data.".to_string(),
            details: Some(single_detail("form", rejection.body_text())),
        })
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let err = self.0;
        match &err {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %err, "page render failed")
            },
            AppError::Upstream(inner) => tracing::warn!(error = %inner, "page upstream error"),
            _ => {},
        }
        (err.status(), Html(templates::error_page(&err.user_message()))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Accumulates field errors and turns them into a 400 once validation is done.
#[derive(Debug, Default)]
pub struct Validation {
    errors: FieldErrors,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.entry(field.to_string()).or_default().push(message.to_string());
        }
        self
    }

    pub fn body(&mut self) -> AppResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(AppError::invalid_body(std::mem::take(&mut self.errors)))
    }

    pub fn query(&mut self) -> AppResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(AppError::invalid_query(std::mem::take(&mut self.errors)))
    }
}

fn single_detail(field: &str, message: String) -> FieldErrors {
    FieldErrors::from([(field.to_string(), vec![message])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AdminRequired.code(), "ADMIN_REQUIRED");
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Upstream(CatalogError::MissingName).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::not_found("x").code(), "NOT_FOUND");
    }

    #[test]
    fn validation_collects_fields() {
        let mut v = Validation::new();
        v.check(false, "q", "q must be at least 2 characters.").check(true, "page", "unused");
        let Err(AppError::BadRequest { message, details: Some(details) }) = v.query() else {
            panic!("expected bad request");
        };
        assert_eq!(message, "Invalid query parameters.");
        assert_eq!(details.len(), 1);
        assert_eq!(details["q"], vec!["q must be at least 2 characters.".to_string()]);
        assert!(v.query().is_ok());
    }

    #[test]
    fn user_message_hides_internals() {
        let field = AppError::invalid_field("rank", "rank must be between 1 and 10000.");
        assert_eq!(field.user_message(), "rank must be between 1 and 10000.");
        assert_eq!(AppError::bad_request("Invalid tmdbId.").user_message(), "Invalid tmdbId.");
        assert_eq!(AppError::Forbidden("Not allowed.".into()).user_message(), "Not allowed.");
        let internal = AppError::Internal(anyhow::anyhow!("row 7 vanished"));
        assert_eq!(internal.user_message(), "Something went wrong.");
    }
}
