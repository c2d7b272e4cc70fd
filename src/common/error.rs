use crate::extractors::IdentityError;
use crate::models::dtos::response::ResponseDto;
use crate::services::store::StoreError;
use crate::services::validate::ValidationError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    /// the body is not JSON or does not have the expected shape
    InvalidBody(String),
    Unauthenticated,
    /// the token verified, but its claims cannot identify the caller
    MalformedIdentity,
    Forbidden,
    DuplicateMac(String),
    MacNotFound(String),
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidBody(_) | ApiError::MacNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::DuplicateMac(_) => StatusCode::CONFLICT,
            ApiError::MalformedIdentity | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short category reported in the `Error` field of the envelope.
    pub fn category(&self) -> &str {
        match self {
            ApiError::Validation(_) => "Invalid Request",
            ApiError::InvalidBody(detail) => detail,
            ApiError::Unauthenticated => "Missing token",
            ApiError::MalformedIdentity => "Error unmarshaling request context",
            ApiError::Forbidden => "Not authorized",
            ApiError::DuplicateMac(_) => "Duplicate MAC Error",
            ApiError::MacNotFound(_) => "MAC lookup error",
            ApiError::Storage(_) => "Something went wrong",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(err) => write!(f, "{err}"),
            ApiError::InvalidBody(_) => f.write_str("Error unmarshalling request body"),
            ApiError::Unauthenticated => f.write_str("No authorization token provided"),
            ApiError::MalformedIdentity => {
                f.write_str("Error getting authorization information from identity token")
            }
            ApiError::Forbidden => f.write_str("Not authorized to perform this action"),
            ApiError::DuplicateMac(mac) => {
                write!(f, "The following MAC is already registered: {mac}")
            }
            ApiError::MacNotFound(mac) => write!(f, "MAC not found: {mac}"),
            ApiError::Storage(_) => f.write_str("Error processing device request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Storage(err) => {
                tracing::error!("{}", self);
                err.chain()
                    .for_each(|cause| tracing::error!("Because: {}", cause));
            }
            ApiError::MalformedIdentity => tracing::error!("{}", self),
            _ => tracing::debug!(status = status.as_u16(), "{}", self),
        }
        let body = ResponseDto::error(self.to_string(), self.category());
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<IdentityError> for ApiError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Unauthenticated => Self::Unauthenticated,
            IdentityError::MalformedIdentity => Self::MalformedIdentity,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::AlreadyExists(mac) => Self::DuplicateMac(mac),
            other => Self::Storage(other.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidBody(value.body_text())
    }
}
