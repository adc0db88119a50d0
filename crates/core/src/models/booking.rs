use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Field};
use crate::error::StoreError;
use crate::value::{FieldKind, FieldMap, FieldValue};

/// A room reservation for one customer.
///
/// Invariants: `to_date > from_date`; `price` is the room's nightly price times the
/// number of nights, computed server-side at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub room_id: i64,
    pub customer_id: i64,
    /// Check-in date.
    pub from_date: NaiveDate,
    /// Check-out date.
    pub to_date: NaiveDate,
    pub price: Decimal,
}

impl Booking {
    /// Whole nights between check-in and check-out (may be zero or negative for bad input).
    pub fn nights(from_date: NaiveDate, to_date: NaiveDate) -> i64 {
        (to_date - from_date).num_days()
    }
}

impl Entity for Booking {
    const RESOURCE: &'static str = "Booking";
    const TABLE: &'static str = "bookings";
    const FIELDS: &'static [Field<Self>] = &[
        Field::new("id", FieldKind::Int, |b: &Booking| FieldValue::Int(b.id))
            .filterable()
            .sortable(),
        Field::new("room_id", FieldKind::Int, |b: &Booking| FieldValue::Int(b.room_id))
            .filterable()
            .references("rooms"),
        Field::new("customer_id", FieldKind::Int, |b: &Booking| FieldValue::Int(b.customer_id))
            .filterable()
            .references("customers"),
        Field::new("from_date", FieldKind::Date, |b: &Booking| FieldValue::Date(b.from_date))
            .filterable()
            .sortable()
            .aliases(&["check_in"]),
        Field::new("to_date", FieldKind::Date, |b: &Booking| FieldValue::Date(b.to_date))
            .filterable()
            .sortable()
            .aliases(&["check_out"]),
        Field::new("price", FieldKind::Decimal, |b: &Booking| FieldValue::Decimal(b.price)),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_fields(id: i64, fields: &FieldMap) -> Result<Self, StoreError> {
        let from_date = fields.date("from_date")?;
        let to_date = fields.date("to_date")?;
        if to_date <= from_date {
            return Err(StoreError::decode(format!(
                "booking {id}: check-out {to_date} not after check-in {from_date}"
            )));
        }

        Ok(Self {
            id,
            room_id: fields.int("room_id")?,
            customer_id: fields.int("customer_id")?,
            from_date,
            to_date,
            price: fields.decimal("price")?,
        })
    }
}
