//! Typed field values shared by entities, query specs and store adapters.

use core::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::StoreError;

/// Storage kind of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Text,
    Bool,
    Decimal,
    Date,
}

/// A single typed value read from (or written to) an entity field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Decimal(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Decimal(_) => FieldKind::Decimal,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }

    /// Convert the value into `kind`, widening integers to decimals.
    ///
    /// Returns `None` when no lossless conversion exists.
    pub fn coerce(self, kind: FieldKind) -> Option<FieldValue> {
        match (self, kind) {
            (v, k) if v.kind() == k => Some(v),
            (FieldValue::Int(i), FieldKind::Decimal) => Some(FieldValue::Decimal(Decimal::from(i))),
            (FieldValue::Decimal(d), FieldKind::Int) if d.fract().is_zero() => {
                i64::try_from(d).ok().map(FieldValue::Int)
            }
            _ => None,
        }
    }

    /// Ordering between two values of compatible kinds (`None` across kinds).
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (FieldValue::Decimal(a), FieldValue::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl core::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::Date(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// Named field values for one record (create payloads, partial updates, stored rows).
///
/// The `id` column is never part of a field map; stores assign and carry it separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<&'static str, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name, value.into());
        self
    }

    /// Insert `value` only when present; absent values leave the map untouched.
    pub fn with_opt<V: Into<FieldValue>>(mut self, name: &'static str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.0.insert(name, v.into());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Overwrite the fields present in `patch`; every other field keeps its value.
    pub fn merge(&mut self, patch: FieldMap) {
        self.0.extend(patch.0);
    }

    pub fn int(&self, name: &str) -> Result<i64, StoreError> {
        match self.require(name)? {
            FieldValue::Int(v) => Ok(*v),
            other => Err(mismatch(name, FieldKind::Int, other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<String, StoreError> {
        match self.require(name)? {
            FieldValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(name, FieldKind::Text, other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, StoreError> {
        match self.require(name)? {
            FieldValue::Bool(v) => Ok(*v),
            other => Err(mismatch(name, FieldKind::Bool, other)),
        }
    }

    pub fn decimal(&self, name: &str) -> Result<Decimal, StoreError> {
        match self.require(name)? {
            FieldValue::Decimal(v) => Ok(*v),
            FieldValue::Int(v) => Ok(Decimal::from(*v)),
            other => Err(mismatch(name, FieldKind::Decimal, other)),
        }
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, StoreError> {
        match self.require(name)? {
            FieldValue::Date(v) => Ok(*v),
            other => Err(mismatch(name, FieldKind::Date, other)),
        }
    }

    fn require(&self, name: &str) -> Result<&FieldValue, StoreError> {
        self.0
            .get(name)
            .ok_or_else(|| StoreError::decode(format!("missing field `{name}`")))
    }
}

impl FromIterator<(&'static str, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (&'static str, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn mismatch(name: &str, expected: FieldKind, found: &FieldValue) -> StoreError {
    StoreError::decode(format!(
        "field `{name}`: expected {expected:?}, found {:?}",
        found.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_to_decimals() {
        let v = FieldValue::Int(50).coerce(FieldKind::Decimal);
        assert_eq!(v, Some(FieldValue::Decimal(Decimal::from(50))));
    }

    #[test]
    fn fractional_decimals_do_not_narrow_to_integers() {
        let v = FieldValue::Decimal(Decimal::new(505, 1)).coerce(FieldKind::Int);
        assert_eq!(v, None);
    }

    #[test]
    fn compare_across_unrelated_kinds_is_undefined() {
        assert_eq!(FieldValue::Bool(true).compare(&FieldValue::Int(1)), None);
        assert_eq!(
            FieldValue::Int(2).compare(&FieldValue::Decimal(Decimal::new(15, 1))),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut row = FieldMap::new()
            .with("first_name", "Jane")
            .with("last_name", "Smith");
        row.merge(FieldMap::new().with("last_name", "Doe"));

        assert_eq!(row.text("first_name").unwrap(), "Jane");
        assert_eq!(row.text("last_name").unwrap(), "Doe");
    }

    #[test]
    fn with_opt_skips_absent_values() {
        let map = FieldMap::new().with_opt::<String>("email_address", None);
        assert!(map.is_empty());
    }

    #[test]
    fn typed_getters_report_missing_and_mismatched_fields() {
        let map = FieldMap::new().with("size", "large");
        assert!(matches!(map.int("size"), Err(StoreError::Decode(_))));
        assert!(matches!(map.int("price"), Err(StoreError::Decode(_))));
    }
}
