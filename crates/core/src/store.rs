//! Entity store boundary.
//!
//! One generic contract for the four CRUD primitives plus listing. Implementations must
//! acquire any backend session per call and release it on every exit path.

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::query::QuerySpec;
use crate::value::FieldMap;

/// CRUD + listing over one entity type.
#[async_trait::async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Fails with `NotFound` if no record has this id.
    async fn read_by_id(&self, id: i64) -> Result<T, StoreError>;

    /// Filter → sort → skip/limit. Zero matches is an empty vec, never an error.
    async fn read_all(&self, query: &QuerySpec) -> Result<Vec<T>, StoreError>;

    /// Insert a record built from `fields`; referential failures are `ConstraintViolation`.
    async fn create(&self, fields: FieldMap) -> Result<T, StoreError>;

    /// Overwrite only the fields present in `fields`. An empty map returns the record as is.
    async fn update(&self, id: i64, fields: FieldMap) -> Result<T, StoreError>;

    /// Remove the record and return its last snapshot.
    async fn delete(&self, id: i64) -> Result<T, StoreError>;
}

#[async_trait::async_trait]
impl<T, S> EntityStore<T> for Arc<S>
where
    T: Entity,
    S: EntityStore<T> + ?Sized,
{
    async fn read_by_id(&self, id: i64) -> Result<T, StoreError> {
        (**self).read_by_id(id).await
    }

    async fn read_all(&self, query: &QuerySpec) -> Result<Vec<T>, StoreError> {
        (**self).read_all(query).await
    }

    async fn create(&self, fields: FieldMap) -> Result<T, StoreError> {
        (**self).create(fields).await
    }

    async fn update(&self, id: i64, fields: FieldMap) -> Result<T, StoreError> {
        (**self).update(id, fields).await
    }

    async fn delete(&self, id: i64) -> Result<T, StoreError> {
        (**self).delete(id).await
    }
}

/// Connectivity probe used by readiness checks.
#[async_trait::async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}
