use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::{error, FolioError};
use folio_storage::FolioStorageError;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq)]
pub enum ErrorStatus {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    Unauthorized,
    InternalServerError,
}

#[derive(Serialize)]
struct ErrorInfo {
    message: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorInfo {
            message: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> Response {
        match self {
            ErrorStatus::NotFound(message) => error_response(StatusCode::NOT_FOUND, &message),
            ErrorStatus::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, &message),
            ErrorStatus::Forbidden(message) => error_response(StatusCode::FORBIDDEN, &message),
            ErrorStatus::Unauthorized => error_response(StatusCode::UNAUTHORIZED, "Unauthorized."),
            ErrorStatus::InternalServerError => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error, please try again later.",
            ),
        }
    }
}

impl From<FolioError> for ErrorStatus {
    fn from(err: FolioError) -> Self {
        match err {
            err if err.is_not_found() => Self::NotFound(err.to_string()),
            FolioError::Validation(_)
            | FolioError::OrderMismatch(_)
            | FolioError::CyclicParent { .. }
            | FolioError::PositionOutOfRange { .. } => Self::BadRequest(err.to_string()),
            FolioError::AccessDenied(_) => Self::Forbidden(err.to_string()),
            err => {
                error!("request failed: {err}");
                Self::InternalServerError
            }
        }
    }
}

impl From<FolioStorageError> for ErrorStatus {
    fn from(err: FolioStorageError) -> Self {
        FolioError::from(err).into()
    }
}
