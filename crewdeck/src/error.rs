use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mycrew::{schedule::FetchError, AuthError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("portal sign-in failed")]
    PortalAuth(#[source] AuthError),

    #[error("portal unavailable")]
    PortalFetch(#[source] FetchError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::PortalAuth(err)
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Auth(err) => Self::PortalAuth(err),
            err => Self::PortalFetch(err),
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PortalAuth(_) | Self::PortalFetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
