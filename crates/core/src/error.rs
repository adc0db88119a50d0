//! Failure model.
//!
//! Two layers:
//! - [`StoreError`]: what an entity store adapter can report.
//! - [`HotelError`]: the closed taxonomy every request failure is expressed in. The HTTP
//!   boundary translates it with a single exhaustive match.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type used by domain operations.
pub type HotelResult<T> = Result<T, HotelError>;

/// Store adapter failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id exists.
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// A referential / uniqueness / check constraint rejected the write.
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    /// A payload named a field the entity does not declare.
    #[error("unknown field `{field}` for {resource}")]
    UnknownField { resource: &'static str, field: String },

    /// A stored row could not be turned back into an entity.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Connectivity or any other backend failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Request-level failure taxonomy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HotelError {
    /// Requested id is absent. Terminal, never retried.
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// Booking check-out is not strictly after check-in.
    #[error("Check-out date must be after check-in date")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
        days: i64,
    },

    /// Input failed boundary validation (query, path or body).
    #[error("{message}")]
    Validation {
        message: String,
        details: serde_json::Value,
    },

    /// Store-level referential or uniqueness violation. The text is for logs only.
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    /// Any other store or connectivity failure. The text is for logs only.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// Rate limit exceeded for a route class.
    #[error("rate limit {limit} exceeded on {path}")]
    AdmissionRejected {
        limit: String,
        quota: u64,
        path: String,
        retry_after: u64,
    },

    /// Anything that does not fit the kinds above.
    #[error("unclassified failure: {0}")]
    Unclassified(String),
}

impl HotelError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn validation(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
}

impl From<StoreError> for HotelError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, id } => HotelError::NotFound { resource, id },
            StoreError::ConstraintViolation(msg) => HotelError::ConstraintViolation(msg),
            e @ (StoreError::UnknownField { .. } | StoreError::Decode(_) | StoreError::Backend(_)) => {
                HotelError::StoreFailure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_resource_and_id() {
        let err = HotelError::not_found("Booking", 42);
        assert_eq!(err.to_string(), "Booking with ID 42 not found");
    }

    #[test]
    fn store_not_found_keeps_resource_and_id() {
        let err: HotelError = StoreError::not_found("Room", 7).into();
        assert_eq!(err, HotelError::NotFound { resource: "Room", id: 7 });
    }

    #[test]
    fn store_internal_failures_collapse_to_store_failure() {
        let err: HotelError = StoreError::backend("connection refused").into();
        assert!(matches!(err, HotelError::StoreFailure(msg) if msg.contains("connection refused")));

        let err: HotelError = StoreError::decode("bad row").into();
        assert!(matches!(err, HotelError::StoreFailure(_)));
    }

    #[test]
    fn constraint_violations_propagate_unchanged() {
        let err: HotelError = StoreError::constraint("bookings_room_id_fkey").into();
        assert_eq!(err, HotelError::ConstraintViolation("bookings_room_id_fkey".into()));
    }
}
