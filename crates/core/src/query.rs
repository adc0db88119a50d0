//! Generic query builder.
//!
//! Turns raw listing parameters into a [`QuerySpec`] resolved against an entity's static
//! field table. Policy:
//! - filters with an absent value are dropped (never turned into "IS NULL");
//! - filters or sort fields that are unknown to the entity are dropped, not rejected;
//! - only the literal `"desc"` selects descending order.
//!
//! Stores apply a spec in the fixed order filter → sort → skip/limit.

use core::cmp::Ordering;

use crate::entity::Entity;
use crate::value::{FieldMap, FieldValue};

/// Default page size when the caller gives none.
pub const DEFAULT_LIMIT: u64 = 100;
/// Largest page size accepted at the boundary.
pub const MAX_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// `"desc"` (case-sensitive) is descending; anything else, including nothing, ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }
}

/// Condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(FieldValue),
    /// Inclusive lower bound.
    AtLeast(FieldValue),
    /// Inclusive upper bound.
    AtMost(FieldValue),
    /// Case-insensitive substring match on text fields.
    Contains(String),
}

impl Predicate {
    pub fn equals(value: impl Into<FieldValue>) -> Self {
        Predicate::Equals(value.into())
    }

    pub fn at_least(value: impl Into<FieldValue>) -> Self {
        Predicate::AtLeast(value.into())
    }

    pub fn at_most(value: impl Into<FieldValue>) -> Self {
        Predicate::AtMost(value.into())
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Predicate::Contains(needle.into())
    }

    pub fn matches(&self, value: &FieldValue) -> bool {
        match self {
            Predicate::Equals(expected) => value.compare(expected) == Some(Ordering::Equal),
            Predicate::AtLeast(bound) => {
                matches!(value.compare(bound), Some(Ordering::Greater | Ordering::Equal))
            }
            Predicate::AtMost(bound) => {
                matches!(value.compare(bound), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::Contains(needle) => value
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        }
    }

    fn operand(&self) -> Option<&FieldValue> {
        match self {
            Predicate::Equals(v) | Predicate::AtLeast(v) | Predicate::AtMost(v) => Some(v),
            Predicate::Contains(_) => None,
        }
    }

    fn with_operand(self, value: FieldValue) -> Self {
        match self {
            Predicate::Equals(_) => Predicate::Equals(value),
            Predicate::AtLeast(_) => Predicate::AtLeast(value),
            Predicate::AtMost(_) => Predicate::AtMost(value),
            Predicate::Contains(s) => Predicate::Contains(s),
        }
    }
}

/// A predicate bound to a canonical field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub predicate: Predicate,
}

impl Filter {
    /// Evaluate against a stored row (`id` is passed separately).
    pub fn matches_row(&self, id: i64, row: &FieldMap) -> bool {
        if self.field == crate::entity::ID {
            return self.predicate.matches(&FieldValue::Int(id));
        }
        row.get(self.field).is_some_and(|v| self.predicate.matches(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Validated, normalized filter/sort/pagination parameters for one listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub skip: u64,
    pub limit: u64,
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
            filters: Vec::new(),
            sort: None,
        }
    }
}

/// Build a [`QuerySpec`] for entity `T`.
///
/// `skip` and `limit` are assumed to be range-checked by the boundary layer.
pub fn build_query<'a, T, I>(
    skip: u64,
    limit: u64,
    filters: I,
    sort_by: Option<&str>,
    order: Option<&str>,
) -> QuerySpec
where
    T: Entity,
    I: IntoIterator<Item = (&'a str, Option<Predicate>)>,
{
    let filters = filters
        .into_iter()
        .filter_map(|(name, predicate)| resolve_filter::<T>(name, predicate?))
        .collect();

    let sort = sort_by.and_then(|name| match T::field(name) {
        Some(field) if field.sortable => Some(Sort {
            field: field.name,
            direction: SortDirection::parse(order),
        }),
        _ => {
            tracing::debug!(resource = T::RESOURCE, sort_by = name, "unknown sort field; leaving unsorted");
            None
        }
    });

    QuerySpec {
        skip,
        limit,
        filters,
        sort,
    }
}

fn resolve_filter<T: Entity>(name: &str, predicate: Predicate) -> Option<Filter> {
    let Some(field) = T::field(name).filter(|f| f.filterable) else {
        tracing::debug!(resource = T::RESOURCE, field = name, "unknown filter field; dropped");
        return None;
    };

    let predicate = match predicate.operand().cloned() {
        Some(value) => match value.coerce(field.kind) {
            Some(value) => predicate.with_operand(value),
            None => {
                tracing::debug!(resource = T::RESOURCE, field = name, "filter value kind mismatch; dropped");
                return None;
            }
        },
        None => predicate,
    };

    Some(Filter {
        field: field.name,
        predicate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, Customer, Room};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    const NO_FILTERS: [(&str, Option<Predicate>); 0] = [];

    #[test]
    fn absent_filter_values_are_dropped() {
        let spec = build_query::<Booking, _>(
            0,
            100,
            [("customer_id", None), ("room_id", Some(Predicate::equals(3)))],
            None,
            None,
        );
        assert_eq!(
            spec.filters,
            vec![Filter {
                field: "room_id",
                predicate: Predicate::Equals(FieldValue::Int(3)),
            }]
        );
    }

    #[test]
    fn unknown_sort_field_yields_no_sort() {
        let spec = build_query::<Room, _>(0, 10, NO_FILTERS, Some("colour"), Some("desc"));
        assert_eq!(spec.sort, None);
    }

    #[test]
    fn non_sortable_field_yields_no_sort() {
        let spec = build_query::<Room, _>(0, 10, NO_FILTERS, Some("available"), None);
        assert_eq!(spec.sort, None);
    }

    #[test]
    fn sorting_is_limited_to_the_listing_vocabulary() {
        assert_eq!(build_query::<Room, _>(0, 10, NO_FILTERS, Some("size"), None).sort, None);
        assert_eq!(build_query::<Customer, _>(0, 10, NO_FILTERS, Some("last_name"), None).sort, None);
        assert_eq!(build_query::<Booking, _>(0, 10, NO_FILTERS, Some("price"), None).sort, None);

        for name in ["id", "price", "room_number"] {
            assert!(build_query::<Room, _>(0, 10, NO_FILTERS, Some(name), None).sort.is_some(), "{name}");
        }
        for name in ["id", "name", "email"] {
            assert!(build_query::<Customer, _>(0, 10, NO_FILTERS, Some(name), None).sort.is_some(), "{name}");
        }
        for name in ["id", "check_in", "check_out"] {
            assert!(build_query::<Booking, _>(0, 10, NO_FILTERS, Some(name), None).sort.is_some(), "{name}");
        }
    }

    #[test]
    fn sort_aliases_resolve_to_columns() {
        let spec = build_query::<Booking, _>(0, 10, NO_FILTERS, Some("check_out"), Some("desc"));
        assert_eq!(
            spec.sort,
            Some(Sort {
                field: "to_date",
                direction: SortDirection::Descending,
            })
        );
    }

    #[test]
    fn only_literal_desc_is_descending() {
        assert_eq!(SortDirection::parse(Some("desc")), SortDirection::Descending);
        assert_eq!(SortDirection::parse(Some("DESC")), SortDirection::Ascending);
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Ascending);
        assert_eq!(SortDirection::parse(None), SortDirection::Ascending);
    }

    #[test]
    fn range_bounds_are_coerced_to_field_kind() {
        let spec = build_query::<Room, _>(
            0,
            10,
            [
                ("price", Some(Predicate::at_least(50))),
                ("price", Some(Predicate::at_most(Decimal::new(200, 0)))),
            ],
            None,
            None,
        );
        assert_eq!(spec.filters.len(), 2);
        assert_eq!(
            spec.filters[0].predicate,
            Predicate::AtLeast(FieldValue::Decimal(Decimal::from(50)))
        );
    }

    #[test]
    fn range_predicates_are_inclusive() {
        let at_least = Predicate::at_least(Decimal::from(50));
        let at_most = Predicate::at_most(Decimal::from(200));
        for (price, expected) in [(49, false), (50, true), (120, true), (200, true), (201, false)] {
            let v = FieldValue::Decimal(Decimal::from(price));
            assert_eq!(at_least.matches(&v) && at_most.matches(&v), expected, "price {price}");
        }
    }

    #[test]
    fn contains_is_case_insensitive() {
        let p = Predicate::contains("SMI");
        assert!(p.matches(&FieldValue::from("jane.smith@example.com")));
        assert!(!p.matches(&FieldValue::from("doe@example.com")));
        assert!(!p.matches(&FieldValue::Int(5)));
    }

    #[test]
    fn unknown_filter_fields_are_dropped() {
        let spec = build_query::<Customer, _>(
            0,
            10,
            [("shoe_size", Some(Predicate::equals(44))), ("name", Some(Predicate::contains("ja")))],
            None,
            None,
        );
        assert_eq!(spec.filters.len(), 1);
        assert_eq!(spec.filters[0].field, "first_name");
    }

    #[test]
    fn id_filters_match_against_row_identity() {
        let filter = Filter {
            field: "id",
            predicate: Predicate::equals(7),
        };
        assert!(filter.matches_row(7, &FieldMap::new()));
        assert!(!filter.matches_row(8, &FieldMap::new()));
    }

    proptest! {
        /// A filter with no value builds the same spec as omitting the filter.
        #[test]
        fn null_filters_are_no_ops(
            room in proptest::option::of(1i64..1000),
            customer in proptest::option::of(1i64..1000),
            skip in 0u64..50,
            limit in 1u64..=MAX_LIMIT,
        ) {
            let with_nulls = build_query::<Booking, _>(
                skip,
                limit,
                [
                    ("room_id", room.map(Predicate::equals)),
                    ("customer_id", customer.map(Predicate::equals)),
                ],
                None,
                None,
            );
            let present: Vec<_> = [
                ("room_id", room.map(Predicate::equals)),
                ("customer_id", customer.map(Predicate::equals)),
            ]
            .into_iter()
            .filter(|(_, p)| p.is_some())
            .collect();
            let omitted = build_query::<Booking, _>(skip, limit, present, None, None);
            prop_assert_eq!(with_nulls, omitted);
        }

        /// Unknown sort names never produce a sort directive.
        #[test]
        fn unknown_sort_names_yield_no_sort(name in "[a-z]{1,10}", order in "(asc|desc)") {
            prop_assume!(Room::field(&name).is_none());
            let spec = build_query::<Room, _>(0, 10, NO_FILTERS, Some(&name), Some(&order));
            prop_assert_eq!(spec.sort, None);
        }
    }
}
