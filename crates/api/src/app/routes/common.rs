use axum::extract::{Path, rejection::PathRejection};

use crate::app::{dto, errors::ApiError};

/// Resource id from the path: an integer, strictly positive.
pub fn resource_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(id) = path?;
    Ok(dto::positive_id("id", id)?)
}
