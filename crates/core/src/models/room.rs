use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Field};
use crate::error::StoreError;
use crate::value::{FieldKind, FieldMap, FieldValue};

/// A bookable room. Invariant: `price >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub number: String,
    pub size: i64,
    /// Nightly price.
    pub price: Decimal,
    pub available: bool,
}

impl Entity for Room {
    const RESOURCE: &'static str = "Room";
    const TABLE: &'static str = "rooms";
    const FIELDS: &'static [Field<Self>] = &[
        Field::new("id", FieldKind::Int, |r: &Room| FieldValue::Int(r.id))
            .filterable()
            .sortable(),
        Field::new("number", FieldKind::Text, |r: &Room| FieldValue::Text(r.number.clone()))
            .filterable()
            .sortable()
            .aliases(&["room_number"]),
        Field::new("size", FieldKind::Int, |r: &Room| FieldValue::Int(r.size)),
        Field::new("price", FieldKind::Decimal, |r: &Room| FieldValue::Decimal(r.price))
            .filterable()
            .sortable(),
        Field::new("available", FieldKind::Bool, |r: &Room| FieldValue::Bool(r.available))
            .filterable(),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_fields(id: i64, fields: &FieldMap) -> Result<Self, StoreError> {
        let price = fields.decimal("price")?;
        if price < Decimal::ZERO {
            return Err(StoreError::decode(format!("room {id}: negative price {price}")));
        }

        Ok(Self {
            id,
            number: fields.text("number")?,
            size: fields.int("size")?,
            price,
            available: fields.bool("available")?,
        })
    }
}
