use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::Display;
use serde::Serialize;

use crate::filters::FilterError;
use crate::validation::{FieldError, ValidationErrors};

#[derive(Debug, Display)]
pub enum ApiError {
    #[display("{}", _0)]
    NotFound(String),
    #[display("{}", _0)]
    BadRequest(String),
    #[display("{}", _0)]
    Validation(ValidationErrors),
    #[display("{}", _0)]
    Unauthorized(String),
    #[display("forbidden")]
    Forbidden,
    #[display("{}", _0)]
    Conflict(String),
    #[display("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrBody<'a> {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let errors = match self {
            Self::Validation(v) => Some(v.as_slice()),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrBody {
            success: false,
            error: self.to_string(),
            errors,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepoErr {
    #[error("not found")]
    NotFound,
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    #[error("database: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("codec: {0}")]
    Codec(String),
}

impl From<RepoErr> for ApiError {
    fn from(e: RepoErr) -> Self {
        match e {
            RepoErr::NotFound => ApiError::NotFound("Order not found".into()),
            RepoErr::Duplicate(field) => ApiError::Conflict(format!("{field} already exists")),
            other => {
                tracing::error!(err = %other, "repository failure");
                ApiError::Internal
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(v: ValidationErrors) -> Self {
        ApiError::Validation(v)
    }
}
