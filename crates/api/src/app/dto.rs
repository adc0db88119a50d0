//! Request DTOs and boundary validation.
//!
//! Query strings are deserialized into flat structs (no `#[serde(flatten)]`: the urlencoded
//! deserializer loses numeric types through it) and validated into operation inputs.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde_json::json;

use hotelier_core::HotelError;
use hotelier_core::query::{DEFAULT_LIMIT, MAX_LIMIT};
use hotelier_operations::{BookingFilter, CustomerFilter, ListParams, RoomFilter};

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RoomsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub available: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl RoomsQuery {
    pub fn into_parts(self) -> Result<(RoomFilter, ListParams), HotelError> {
        let params = list_params(self.skip, self.limit, self.sort_by, self.order)?;
        let filter = RoomFilter {
            available: self.available,
            min_price: price_bound("min_price", self.min_price)?,
            max_price: price_bound("max_price", self.max_price)?,
        };
        Ok((filter, params))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl CustomersQuery {
    pub fn into_parts(self) -> Result<(CustomerFilter, ListParams), HotelError> {
        let params = list_params(self.skip, self.limit, self.sort_by, self.order)?;
        let filter = CustomerFilter {
            name: non_empty("name", self.name)?,
            email: non_empty("email", self.email)?,
        };
        Ok((filter, params))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub customer_id: Option<i64>,
    pub room_id: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl BookingsQuery {
    pub fn into_parts(self) -> Result<(BookingFilter, ListParams), HotelError> {
        let params = list_params(self.skip, self.limit, self.sort_by, self.order)?;
        let filter = BookingFilter {
            customer_id: self.customer_id.map(|v| positive_id("customer_id", v)).transpose()?,
            room_id: self.room_id.map(|v| positive_id("room_id", v)).transpose()?,
        };
        Ok((filter, params))
    }
}

// -------------------------
// Body DTOs
// -------------------------

/// Registration body; all three fields required and non-blank.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl CreateCustomerRequest {
    pub fn validate(self) -> Result<hotelier_operations::NewCustomer, HotelError> {
        Ok(hotelier_operations::NewCustomer {
            first_name: required("first_name", self.first_name)?,
            last_name: required("last_name", self.last_name)?,
            email_address: required("email_address", self.email_address)?,
        })
    }
}

/// Partial update body; explicit `null` and absent fields are both "leave as is".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn validate(self) -> Result<hotelier_operations::CustomerChanges, HotelError> {
        Ok(hotelier_operations::CustomerChanges {
            first_name: self.first_name.map(|v| required("first_name", v)).transpose()?,
            last_name: self.last_name.map(|v| required("last_name", v)).transpose()?,
            email_address: self.email_address.map(|v| required("email_address", v)).transpose()?,
        })
    }
}

/// Booking body. Any client-sent `price` is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: i64,
    pub customer_id: i64,
    pub from_date: chrono::NaiveDate,
    pub to_date: chrono::NaiveDate,
}

impl CreateBookingRequest {
    pub fn validate(self) -> Result<hotelier_operations::NewBooking, HotelError> {
        Ok(hotelier_operations::NewBooking {
            room_id: positive_id("room_id", self.room_id)?,
            customer_id: positive_id("customer_id", self.customer_id)?,
            from_date: self.from_date,
            to_date: self.to_date,
        })
    }
}

// -------------------------
// Validation helpers
// -------------------------

fn invalid(field: &str, constraint: &str, value: impl Into<serde_json::Value>) -> HotelError {
    HotelError::validation(
        format!("Invalid value for '{field}': {constraint}"),
        json!({ "field": field, "constraint": constraint, "value": value.into() }),
    )
}

fn list_params(
    skip: Option<i64>,
    limit: Option<i64>,
    sort_by: Option<String>,
    order: Option<String>,
) -> Result<ListParams, HotelError> {
    let skip = match skip {
        None => 0,
        Some(v) => u64::try_from(v).map_err(|_| invalid("skip", "must be >= 0", v))?,
    };
    let limit = match limit {
        None => DEFAULT_LIMIT,
        Some(v) => u64::try_from(v)
            .ok()
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .ok_or_else(|| invalid("limit", "must be between 1 and 1000", v))?,
    };
    let defaults = ListParams::default();
    Ok(ListParams {
        skip,
        limit,
        sort_by: sort_by.or(defaults.sort_by),
        order: order.or(defaults.order),
    })
}

/// Path ids and id filters are positive integers.
pub fn positive_id(field: &str, value: i64) -> Result<i64, HotelError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(invalid(field, "must be > 0", value))
    }
}

fn price_bound(field: &str, value: Option<f64>) -> Result<Option<Decimal>, HotelError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    if raw.is_nan() || raw < 0.0 {
        return Err(invalid(field, "must be >= 0", raw));
    }
    Decimal::from_f64(raw)
        .map(Some)
        .ok_or_else(|| invalid(field, "out of range", raw))
}

fn non_empty(field: &str, value: Option<String>) -> Result<Option<String>, HotelError> {
    value.map(|v| required(field, v)).transpose()
}

fn required(field: &str, value: String) -> Result<String, HotelError> {
    if value.trim().is_empty() {
        Err(invalid(field, "must not be empty", value))
    } else {
        Ok(value)
    }
}
