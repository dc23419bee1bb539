//! Mapping of query failures onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use rent_insights_query::InsightsError;
use rent_insights_server_models::ValidationErrors;

/// Every failure a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Query parameters failed validation.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The postal code matches no district.
    #[error("{0}")]
    NotFound(String),

    /// The rent store could not be reached.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<InsightsError> for ApiError {
    fn from(e: InsightsError) -> Self {
        match e {
            InsightsError::NotFound { .. } => Self::NotFound(e.to_string()),
            InsightsError::ServiceUnavailable(_) => {
                log::error!("{e}");
                Self::ServiceUnavailable("The rent store is unavailable.".to_string())
            }
            InsightsError::Corrupt(_) => {
                log::error!("{e}");
                Self::Internal("Stored rent data could not be read.".to_string())
            }
        }
    }
}

impl From<duckdb::Error> for ApiError {
    fn from(e: duckdb::Error) -> Self {
        log::error!("Failed to open a store connection: {e}");
        Self::ServiceUnavailable("The rent store is unavailable.".to_string())
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        log::error!("Blocking query task failed: {e}");
        Self::Internal("The query could not be completed.".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            Self::Validation(errors) => response.json(errors),
            Self::NotFound(message)
            | Self::ServiceUnavailable(message)
            | Self::Internal(message) => response.json(serde_json::json!({ "message": message })),
        }
    }
}
