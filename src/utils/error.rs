use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, BoxOfficeError>;

#[derive(Debug, Error)]
pub enum BoxOfficeError {
    #[error("Uniqueness violation: {0}")]
    UniquenessViolation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Seat '{seat}' is not available for event {event_id}")]
    SeatUnavailable { event_id: Uuid, seat: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),
}

impl BoxOfficeError {
    pub fn not_found(kind: &str, id: Uuid) -> Self {
        BoxOfficeError::NotFound(format!("{} with id '{}' was not found", kind, id))
    }

    pub fn code(&self) -> &'static str {
        match self {
            BoxOfficeError::UniquenessViolation(_) => "UNIQUENESS_VIOLATION",
            BoxOfficeError::PermissionDenied(_) => "PERMISSION_DENIED",
            BoxOfficeError::InvalidState(_) => "INVALID_STATE",
            BoxOfficeError::SeatUnavailable { .. } => "SEAT_UNAVAILABLE",
            BoxOfficeError::NotFound(_) => "NOT_FOUND",
            BoxOfficeError::ResourceBusy(_) => "RESOURCE_BUSY",
            BoxOfficeError::Storage(_) => "STORAGE_ERROR",
            BoxOfficeError::Io(_) => "IO_ERROR",
            BoxOfficeError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Only lock contention is worth retrying; every other failure is a
    /// business rule or a broken storage root.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoxOfficeError::ResourceBusy(_))
    }

    pub fn log(&self) {
        match self {
            BoxOfficeError::UniquenessViolation(msg)
            | BoxOfficeError::PermissionDenied(msg)
            | BoxOfficeError::InvalidState(msg)
            | BoxOfficeError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Operation rejected");
            }
            BoxOfficeError::SeatUnavailable { event_id, seat } => {
                warn!(code = self.code(), %event_id, seat = %seat, "Operation rejected");
            }
            BoxOfficeError::ResourceBusy(resource) => {
                warn!(code = self.code(), resource = %resource, "Lock acquisition timed out");
            }
            BoxOfficeError::Storage(msg) => {
                error!(code = self.code(), message = %msg, "Storage error");
            }
            BoxOfficeError::Io(e) => {
                error!(error = ?e, "I/O error");
            }
            BoxOfficeError::Serialization(e) => {
                error!(error = ?e, "Serialization error");
            }
        }
    }
}
