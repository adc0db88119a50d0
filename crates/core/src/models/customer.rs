use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Field};
use crate::error::StoreError;
use crate::value::{FieldKind, FieldMap, FieldValue};

/// A hotel guest. No uniqueness is enforced on any field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl Entity for Customer {
    const RESOURCE: &'static str = "Customer";
    const TABLE: &'static str = "customers";
    const FIELDS: &'static [Field<Self>] = &[
        Field::new("id", FieldKind::Int, |c: &Customer| FieldValue::Int(c.id))
            .filterable()
            .sortable(),
        Field::new("first_name", FieldKind::Text, |c: &Customer| {
            FieldValue::Text(c.first_name.clone())
        })
        .filterable()
        .sortable()
        .aliases(&["name"]),
        Field::new("last_name", FieldKind::Text, |c: &Customer| {
            FieldValue::Text(c.last_name.clone())
        })
        .filterable(),
        Field::new("email_address", FieldKind::Text, |c: &Customer| {
            FieldValue::Text(c.email_address.clone())
        })
        .filterable()
        .sortable()
        .aliases(&["email"]),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_fields(id: i64, fields: &FieldMap) -> Result<Self, StoreError> {
        Ok(Self {
            id,
            first_name: fields.text("first_name")?,
            last_name: fields.text("last_name")?,
            email_address: fields.text("email_address")?,
        })
    }
}
