//! Entity trait: identity plus a static field metadata table.
//!
//! Every persisted record type declares its addressable fields once, as a
//! `&'static [Field<Self>]`. Stores, the query builder and the HTTP layer resolve
//! field names against that table; nothing inspects types at runtime.

use crate::error::StoreError;
use crate::value::{FieldKind, FieldMap, FieldValue};

/// Name of the identity column shared by all entities.
pub const ID: &str = "id";

/// Metadata for one addressable entity field.
pub struct Field<T> {
    /// Column / canonical field name.
    pub name: &'static str,
    pub kind: FieldKind,
    pub filterable: bool,
    pub sortable: bool,
    /// Public names that resolve to this field (e.g. `check_in` for `from_date`).
    pub aliases: &'static [&'static str],
    /// Table this field references (foreign key), if any.
    pub references: Option<&'static str>,
    /// Typed accessor.
    pub get: fn(&T) -> FieldValue,
}

impl<T> Field<T> {
    pub const fn new(name: &'static str, kind: FieldKind, get: fn(&T) -> FieldValue) -> Self {
        Self {
            name,
            kind,
            filterable: false,
            sortable: false,
            aliases: &[],
            references: None,
            get,
        }
    }

    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }

    /// Whether `name` addresses this field, directly or through an alias.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// A persisted record with an integer identity and a static field table.
pub trait Entity: Clone + Send + Sync + Sized + 'static {
    /// Resource kind reported in errors ("Room", "Customer", "Booking").
    const RESOURCE: &'static str;

    /// Backing table name.
    const TABLE: &'static str;

    /// All addressable fields, `id` included.
    const FIELDS: &'static [Field<Self>];

    fn id(&self) -> i64;

    /// Rebuild a record from its id and stored field values, checking invariants.
    fn from_fields(id: i64, fields: &FieldMap) -> Result<Self, StoreError>;

    /// Resolve a public field name (or alias).
    fn field(name: &str) -> Option<&'static Field<Self>> {
        Self::FIELDS.iter().find(|f| f.answers_to(name))
    }

    /// Resolve a field by its canonical name only.
    fn column(name: &str) -> Option<&'static Field<Self>> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    /// Canonical names of every non-id field.
    fn data_columns() -> impl Iterator<Item = &'static Field<Self>> {
        Self::FIELDS.iter().filter(|f| f.name != ID)
    }

    /// The record's non-id fields.
    fn to_fields(&self) -> FieldMap {
        Self::data_columns()
            .map(|f| (f.name, (f.get)(self)))
            .collect()
    }

    /// Check that every key of `fields` is a declared, writable field with a value of the
    /// declared kind. Values are coerced (integer to decimal) where lossless.
    fn check_payload(fields: FieldMap) -> Result<FieldMap, StoreError> {
        fields
            .iter()
            .map(|(name, value)| -> Result<(&'static str, FieldValue), StoreError> {
                let field = Self::column(name)
                    .filter(|f| f.name != ID)
                    .ok_or_else(|| StoreError::UnknownField {
                        resource: Self::RESOURCE,
                        field: name.to_string(),
                    })?;
                let value = value.clone().coerce(field.kind).ok_or_else(|| {
                    StoreError::decode(format!(
                        "{}.{}: expected {:?}, found {:?}",
                        Self::RESOURCE,
                        name,
                        field.kind,
                        value.kind()
                    ))
                })?;
                Ok((field.name, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, Customer, Room};

    #[test]
    fn aliases_resolve_to_canonical_fields() {
        assert_eq!(Customer::field("name").map(|f| f.name), Some("first_name"));
        assert_eq!(Customer::field("email").map(|f| f.name), Some("email_address"));
        assert_eq!(Booking::field("check_in").map(|f| f.name), Some("from_date"));
        assert_eq!(Room::field("room_number").map(|f| f.name), Some("number"));
        assert!(Room::field("colour").is_none());
    }

    #[test]
    fn to_fields_excludes_identity() {
        let customer = Customer {
            id: 3,
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            email_address: "jane@example.com".into(),
        };
        let fields = customer.to_fields();
        assert!(!fields.contains(ID));
        assert_eq!(fields.len(), 3);
        assert_eq!(Customer::from_fields(3, &fields).unwrap(), customer);
    }

    #[test]
    fn check_payload_rejects_unknown_and_identity_fields() {
        let err = Customer::check_payload(FieldMap::new().with("nickname", "JJ")).unwrap_err();
        assert!(matches!(err, StoreError::UnknownField { field, .. } if field == "nickname"));

        let err = Customer::check_payload(FieldMap::new().with("id", 9)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownField { .. }));
    }

    #[test]
    fn check_payload_widens_integer_prices() {
        let checked = Booking::check_payload(FieldMap::new().with("price", 400)).unwrap();
        assert_eq!(
            checked.get("price"),
            Some(&FieldValue::Decimal(rust_decimal::Decimal::from(400)))
        );
    }
}
