use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use utoipa::ToSchema;

use crate::repo::RepoError;

/// Message shown for any backend failure. The request is abandoned, never retried.
pub const TRANSIENT_MESSAGE: &str = "temporarily unavailable, please try again";

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Failures of business operations.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error(transparent)] Repo(#[from] RepoError),
    #[error("{0}")] Invalid(String),
    #[error("{0}")] Forbidden(&'static str),
    #[error("you have already reviewed this listing")] DuplicateReview,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("not found")] NotFound,
    #[error("{0}")] Conflict(String),
    #[error("{0}")] BadRequest(String),
    #[error("unauthorized")] Unauthorized,
    #[error("{0}")] Forbidden(String),
    #[error("{}", TRANSIENT_MESSAGE)] Internal,
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::NotFound,
            RepoError::Conflict => ApiError::Conflict("conflict".into()),
            RepoError::Internal(msg) => {
                tracing::error!(error = %msg, "store failure");
                ApiError::Internal
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Repo(r) => r.into(),
            ServiceError::Invalid(msg) => ApiError::BadRequest(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg.into()),
            e @ ServiceError::DuplicateReview => ApiError::Conflict(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::SERVICE_UNAVAILABLE,
        };
        HttpResponse::build(status).json(ApiErrorBody { error: self.to_string() })
    }
}
