use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use yatube_types::api::{ErrorPage, FormErrors, NON_FIELD_ERRORS};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("form is not valid")]
    Validation(FormErrors),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A body that is not the expected JSON form is an invalid form.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let mut errors = FormErrors::default();
        errors.add(NON_FIELD_ERRORS, rejection.body_text());
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                ErrorPage {
                    error: "server error".into(),
                    path: None,
                    errors: None,
                }
            }
            Self::Validation(errors) => ErrorPage {
                error: "form is not valid".into(),
                path: None,
                errors: Some(errors),
            },
            other => ErrorPage {
                error: other.to_string(),
                path: None,
                errors: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// `302 Found`, the redirect a form submission answers with.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
