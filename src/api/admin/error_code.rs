//! API error codes

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::ReftrackerError;

/// Numeric error codes carried in the admin API envelope.
///
/// Serialized as plain numbers via serde_repr. Grouped by thousands:
/// - 0: success
/// - 1000-1099: generic errors
/// - 3000-3099: domain errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // Generic errors 1000-1099
    BadRequest = 1000,
    MethodNotAllowed = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // Domain errors 3000-3099
    AgentCodeExhausted = 3001,
    StorageError = 3005,
}

impl From<&ReftrackerError> for ErrorCode {
    fn from(err: &ReftrackerError) -> Self {
        match err {
            ReftrackerError::InvalidArgument(_) => ErrorCode::BadRequest,
            ReftrackerError::NotFound(_) => ErrorCode::NotFound,
            ReftrackerError::MethodNotAllowed(_) => ErrorCode::MethodNotAllowed,
            ReftrackerError::CapacityExhausted(_) => ErrorCode::AgentCodeExhausted,
            ReftrackerError::DateParse(_) => ErrorCode::InvalidDateFormat,
            ReftrackerError::DatabaseConfig(_)
            | ReftrackerError::DatabaseConnection(_)
            | ReftrackerError::DatabaseOperation(_) => ErrorCode::StorageError,
            ReftrackerError::FileOperation(_)
            | ReftrackerError::Serialization(_)
            | ReftrackerError::Internal(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::BadRequest as i32, 1000);
        assert_eq!(ErrorCode::NotFound as i32, 1004);
        assert_eq!(ErrorCode::AgentCodeExhausted as i32, 3001);
    }

    #[test]
    fn test_mapping_from_domain_errors() {
        let err = ReftrackerError::not_found("agent not found: x");
        assert_eq!(ErrorCode::from(&err), ErrorCode::NotFound);

        let err = ReftrackerError::capacity_exhausted("no free codes");
        assert_eq!(ErrorCode::from(&err), ErrorCode::AgentCodeExhausted);

        let err = ReftrackerError::database_operation("boom");
        assert_eq!(ErrorCode::from(&err), ErrorCode::StorageError);
    }
}
