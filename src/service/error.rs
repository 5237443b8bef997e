use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Utility '{0}' not found")]
    UtilityNotFound(String),

    #[error("Room {0} not found")]
    RoomNotFound(Uuid),

    #[error("Room {0} has no active rental")]
    NoActiveRental(Uuid),

    #[error("Invoice {0} not found")]
    InvoiceNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        ServiceError::Cache(err.to_string())
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UtilityNotFound(_)
            | ServiceError::RoomNotFound(_)
            | ServiceError::NoActiveRental(_)
            | ServiceError::InvoiceNotFound(_)
            | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,

            ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::Database(_)
            | ServiceError::Cache(_)
            | ServiceError::Notification(_)
            | ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_utility_maps_to_not_found() {
        let err: HttpError = ServiceError::UtilityNotFound("Gas".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Utility 'Gas' not found");
    }

    #[test]
    fn database_errors_map_to_server_error() {
        let err: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn forbidden_keeps_its_message() {
        let err: HttpError = ServiceError::Forbidden("You do not own this room".into()).into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "You do not own this room");
    }
}
