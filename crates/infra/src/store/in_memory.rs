use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use core::cmp::Ordering;

use hotelier_core::entity::ID;
use hotelier_core::{
    Entity, EntityStore, FieldMap, FieldValue, QuerySpec, SortDirection, StoreError, StoreHealth,
};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, FieldMap>,
}

/// Process-local database shared by every [`InMemoryStore`] built from it.
///
/// Tables are created lazily. Ids start at 1 and are never reused within a table.
/// Foreign keys declared in entity metadata are enforced on create and update.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A typed store over this database's table for `T`.
    pub fn store<T: Entity>(self: &Arc<Self>) -> InMemoryStore<T> {
        InMemoryStore {
            db: Arc::clone(self),
            _entity: PhantomData,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<&'static str, Table>>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::backend("in-memory database lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<&'static str, Table>>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::backend("in-memory database lock poisoned"))
    }
}

#[async_trait::async_trait]
impl StoreHealth for InMemoryDatabase {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

/// [`EntityStore`] over one table of an [`InMemoryDatabase`].
pub struct InMemoryStore<T> {
    db: Arc<InMemoryDatabase>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> InMemoryStore<T> {
    /// Standalone store with its own private database.
    pub fn new() -> Self {
        Arc::new(InMemoryDatabase::new()).store()
    }
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    async fn read_by_id(&self, id: i64) -> Result<T, StoreError> {
        let tables = self.db.read()?;
        let row = tables
            .get(T::TABLE)
            .and_then(|t| t.rows.get(&id))
            .ok_or(StoreError::not_found(T::RESOURCE, id))?;
        T::from_fields(id, row)
    }

    async fn read_all(&self, query: &QuerySpec) -> Result<Vec<T>, StoreError> {
        let tables = self.db.read()?;
        let Some(table) = tables.get(T::TABLE) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<(i64, &FieldMap)> = table
            .rows
            .iter()
            .filter(|(id, row)| query.filters.iter().all(|f| f.matches_row(**id, row)))
            .map(|(id, row)| (*id, row))
            .collect();

        // Stable sort: ties keep id order.
        if let Some(sort) = query.sort {
            rows.sort_by(|a, b| {
                let ord = match (sort_key(sort.field, a), sort_key(sort.field, b)) {
                    (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        rows.into_iter()
            .skip(usize::try_from(query.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .map(|(id, row)| T::from_fields(id, row))
            .collect()
    }

    async fn create(&self, fields: FieldMap) -> Result<T, StoreError> {
        let fields = T::check_payload(fields)?;
        if let Some(missing) = T::data_columns().find(|f| !fields.contains(f.name)) {
            return Err(StoreError::constraint(format!(
                "null value in column \"{}\" of relation \"{}\"",
                missing.name,
                T::TABLE
            )));
        }

        let mut tables = self.db.write()?;
        check_references::<T>(&tables, &fields)?;

        let table = tables.entry(T::TABLE).or_default();
        let id = table.next_id + 1;
        let entity = T::from_fields(id, &fields).map_err(as_check_violation)?;
        table.next_id = id;
        table.rows.insert(id, fields);
        Ok(entity)
    }

    async fn update(&self, id: i64, fields: FieldMap) -> Result<T, StoreError> {
        let patch = T::check_payload(fields)?;
        let mut tables = self.db.write()?;

        let mut merged = tables
            .get(T::TABLE)
            .and_then(|t| t.rows.get(&id))
            .cloned()
            .ok_or(StoreError::not_found(T::RESOURCE, id))?;
        if patch.is_empty() {
            return T::from_fields(id, &merged);
        }

        check_references::<T>(&tables, &patch)?;
        merged.merge(patch);
        let entity = T::from_fields(id, &merged).map_err(as_check_violation)?;

        if let Some(table) = tables.get_mut(T::TABLE) {
            table.rows.insert(id, merged);
        }
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<T, StoreError> {
        let mut tables = self.db.write()?;
        let row = tables
            .get_mut(T::TABLE)
            .and_then(|t| t.rows.remove(&id))
            .ok_or(StoreError::not_found(T::RESOURCE, id))?;
        T::from_fields(id, &row)
    }
}

fn sort_key(field: &str, (id, row): &(i64, &FieldMap)) -> Option<FieldValue> {
    if field == ID {
        Some(FieldValue::Int(*id))
    } else {
        row.get(field).cloned()
    }
}

fn check_references<T: Entity>(
    tables: &HashMap<&'static str, Table>,
    fields: &FieldMap,
) -> Result<(), StoreError> {
    for field in T::FIELDS {
        let (Some(target), Some(value)) = (field.references, fields.get(field.name)) else {
            continue;
        };
        let exists = value
            .as_i64()
            .is_some_and(|key| tables.get(target).is_some_and(|t| t.rows.contains_key(&key)));
        if !exists {
            return Err(StoreError::constraint(format!(
                "insert or update on table \"{}\" violates foreign key \"{}_{}_fkey\": key ({})=({}) is not present in table \"{}\"",
                T::TABLE,
                T::TABLE,
                field.name,
                field.name,
                value,
                target
            )));
        }
    }
    Ok(())
}

/// Invariant failures on write play the role of a table CHECK constraint.
fn as_check_violation(err: StoreError) -> StoreError {
    match err {
        StoreError::Decode(msg) => StoreError::ConstraintViolation(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hotelier_core::models::{Booking, Customer, Room};
    use hotelier_core::{Predicate, build_query};
    use rust_decimal::Decimal;

    fn room_fields(number: &str, price: i64, available: bool) -> FieldMap {
        FieldMap::new()
            .with("number", number)
            .with("size", 2)
            .with("price", Decimal::from(price))
            .with("available", available)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded() -> (Arc<InMemoryDatabase>, InMemoryStore<Room>) {
        let db = Arc::new(InMemoryDatabase::new());
        let rooms = db.store::<Room>();
        for (number, price, available) in [("101", 50, true), ("102", 120, false), ("201", 200, true), ("301", 300, true)] {
            rooms.create(room_fields(number, price, available)).await.unwrap();
        }
        (db, rooms)
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially_per_table() {
        let (db, rooms) = seeded().await;
        let all = rooms.read_all(&QuerySpec::default()).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        let customers = db.store::<Customer>();
        let c = customers
            .create(
                FieldMap::new()
                    .with("first_name", "Jane")
                    .with("last_name", "Smith")
                    .with("email_address", "jane.smith@example.com"),
            )
            .await
            .unwrap();
        assert_eq!(c.id, 1);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let (_db, rooms) = seeded().await;
        let err = rooms.read_by_id(999).await.unwrap_err();
        assert_eq!(err, StoreError::not_found("Room", 999));
        assert_eq!(rooms.delete(999).await.unwrap_err(), StoreError::not_found("Room", 999));
    }

    #[tokio::test]
    async fn price_range_filters_are_inclusive() {
        let (_db, rooms) = seeded().await;
        let query = build_query::<Room, _>(
            0,
            100,
            [
                ("min_price", None),
                ("price", Some(Predicate::at_least(50))),
                ("price", Some(Predicate::at_most(200))),
            ],
            None,
            None,
        );
        let found = rooms.read_all(&query).await.unwrap();
        let numbers: Vec<_> = found.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["101", "102", "201"]);
    }

    #[tokio::test]
    async fn sort_then_paginate() {
        let (_db, rooms) = seeded().await;
        let query = build_query::<Room, _>(1, 2, [("available", Some(Predicate::equals(true)))], Some("price"), Some("desc"));
        let found = rooms.read_all(&query).await.unwrap();
        let prices: Vec<_> = found.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![Decimal::from(200), Decimal::from(50)]);
    }

    #[tokio::test]
    async fn skip_beyond_matches_is_empty() {
        let (_db, rooms) = seeded().await;
        let query = QuerySpec {
            skip: 50,
            ..QuerySpec::default()
        };
        assert!(rooms.read_all(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_only_given_fields() {
        let db = Arc::new(InMemoryDatabase::new());
        let customers = db.store::<Customer>();
        let jane = customers
            .create(
                FieldMap::new()
                    .with("first_name", "Jane")
                    .with("last_name", "Smith")
                    .with("email_address", "jane.smith@example.com"),
            )
            .await
            .unwrap();

        let updated = customers
            .update(jane.id, FieldMap::new().with("email_address", "jane@example.org"))
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Jane");
        assert_eq!(updated.last_name, "Smith");
        assert_eq!(updated.email_address, "jane@example.org");

        let unchanged = customers.update(jane.id, FieldMap::new()).await.unwrap();
        assert_eq!(unchanged, updated);
    }

    #[tokio::test]
    async fn bookings_require_existing_room_and_customer() {
        let (db, _rooms) = seeded().await;
        let bookings = db.store::<Booking>();
        let err = bookings
            .create(
                FieldMap::new()
                    .with("room_id", 1)
                    .with("customer_id", 42)
                    .with("from_date", date(2024, 1, 1))
                    .with("to_date", date(2024, 1, 3))
                    .with("price", Decimal::from(100)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(msg) if msg.contains("customer_id")));
    }

    #[tokio::test]
    async fn delete_returns_snapshot_and_removes() {
        let (_db, rooms) = seeded().await;
        let removed = rooms.delete(2).await.unwrap();
        assert_eq!(removed.number, "102");
        assert!(matches!(rooms.read_by_id(2).await, Err(StoreError::NotFound { .. })));

        // Ids are not reused.
        let next = rooms.create(room_fields("401", 80, true)).await.unwrap();
        assert_eq!(next.id, 5);
    }

    #[tokio::test]
    async fn incomplete_create_is_a_constraint_violation() {
        let rooms = InMemoryStore::<Room>::new();
        let err = rooms
            .create(FieldMap::new().with("number", "101"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn ping_reports_healthy() {
        let db = InMemoryDatabase::new();
        assert!(db.ping().await.is_ok());
    }
}
