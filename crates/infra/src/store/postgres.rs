//! Postgres-backed entity stores.
//!
//! SQL is assembled from entity metadata with [`sqlx::QueryBuilder`]; every value is a bind
//! parameter and every identifier comes from a `&'static` field table, never from input.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (integrity constraint) | `23xxx` (`23503`, `23505`, `23514`, ...) | `ConstraintViolation` |
//! | Database (other) | Any other | `Backend` |
//! | PoolTimedOut / PoolClosed / Io / Tls | N/A | `Backend` |
//! | ColumnDecode / ColumnNotFound | N/A | `Decode` |
//!
//! ## Expected schema
//!
//! ```sql
//! CREATE TABLE rooms (
//!     id BIGSERIAL PRIMARY KEY,
//!     number TEXT NOT NULL,
//!     size BIGINT NOT NULL,
//!     price NUMERIC NOT NULL CHECK (price >= 0),
//!     available BOOLEAN NOT NULL
//! );
//! CREATE TABLE customers (
//!     id BIGSERIAL PRIMARY KEY,
//!     first_name TEXT NOT NULL,
//!     last_name TEXT NOT NULL,
//!     email_address TEXT NOT NULL
//! );
//! CREATE TABLE bookings (
//!     id BIGSERIAL PRIMARY KEY,
//!     room_id BIGINT NOT NULL REFERENCES rooms (id),
//!     customer_id BIGINT NOT NULL REFERENCES customers (id),
//!     from_date DATE NOT NULL,
//!     to_date DATE NOT NULL CHECK (to_date > from_date),
//!     price NUMERIC NOT NULL
//! );
//! ```

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use hotelier_core::entity::ID;
use hotelier_core::{
    Entity, EntityStore, FieldKind, FieldMap, FieldValue, Predicate, QuerySpec, SortDirection,
    StoreError, StoreHealth,
};

/// Shared connection pool plus a factory for typed stores.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: Arc<PgPool>,
}

impl PostgresDatabase {
    /// Open a pool against `url`; fails if the first connection cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn store<T: Entity>(&self) -> PostgresStore<T> {
        PostgresStore {
            pool: Arc::clone(&self.pool),
            _entity: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl StoreHealth for PostgresDatabase {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("ping", e))
    }
}

/// [`EntityStore`] over the table `T::TABLE`.
///
/// A pooled connection is acquired at the start of each call and returned to the pool
/// when the call finishes, on success and on failure.
pub struct PostgresStore<T> {
    pool: Arc<PgPool>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for PostgresStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> PostgresStore<T> {
    async fn session(&self, operation: &str) -> Result<PoolConnection<Postgres>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait::async_trait]
impl<T: Entity> EntityStore<T> for PostgresStore<T> {
    #[instrument(skip(self), fields(table = T::TABLE), err)]
    async fn read_by_id(&self, id: i64) -> Result<T, StoreError> {
        let mut conn = self.session("read_by_id").await?;

        let mut qb = select::<T>();
        qb.push(" WHERE id = ").push_bind(id);
        let row = qb
            .build()
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("read_by_id", e))?;

        match row {
            Some(row) => decode_row::<T>(&row),
            None => Err(StoreError::not_found(T::RESOURCE, id)),
        }
    }

    #[instrument(
        skip_all,
        fields(table = T::TABLE, offset = query.skip, limit = query.limit, rows = tracing::field::Empty),
        err
    )]
    async fn read_all(&self, query: &QuerySpec) -> Result<Vec<T>, StoreError> {
        let mut conn = self.session("read_all").await?;

        let rows = list_query::<T>(query)
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("read_all", e))?;

        tracing::Span::current().record("rows", rows.len());
        rows.iter().map(decode_row::<T>).collect()
    }

    #[instrument(skip_all, fields(table = T::TABLE), err)]
    async fn create(&self, fields: FieldMap) -> Result<T, StoreError> {
        let fields = T::check_payload(fields)?;
        let mut conn = self.session("create").await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("INSERT INTO {} (", T::TABLE));
        {
            let mut columns = qb.separated(", ");
            for (name, _) in fields.iter() {
                columns.push(name);
            }
        }
        qb.push(") VALUES (");
        for (i, (_, value)) in fields.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING ").push(column_list::<T>());

        let row = qb
            .build()
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("create", e))?;
        decode_row::<T>(&row)
    }

    #[instrument(skip(self, values), fields(table = T::TABLE), err)]
    async fn update(&self, id: i64, values: FieldMap) -> Result<T, StoreError> {
        let patch = T::check_payload(values)?;
        if patch.is_empty() {
            return self.read_by_id(id).await;
        }
        let mut conn = self.session("update").await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
        for (i, (name, value)) in patch.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(name).push(" = ");
            push_value(&mut qb, value);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(column_list::<T>());

        let row = qb
            .build()
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => decode_row::<T>(&row),
            None => Err(StoreError::not_found(T::RESOURCE, id)),
        }
    }

    #[instrument(skip(self), fields(table = T::TABLE), err)]
    async fn delete(&self, id: i64) -> Result<T, StoreError> {
        let mut conn = self.session("delete").await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", T::TABLE));
        qb.push_bind(id).push(" RETURNING ").push(column_list::<T>());

        let row = qb
            .build()
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        match row {
            Some(row) => decode_row::<T>(&row),
            None => Err(StoreError::not_found(T::RESOURCE, id)),
        }
    }
}

fn column_list<T: Entity>() -> String {
    T::FIELDS.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
}

fn select<T: Entity>() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!("SELECT {} FROM {}", column_list::<T>(), T::TABLE))
}

/// `SELECT ... [WHERE ...] [ORDER BY ...] LIMIT $n OFFSET $m`, filters joined with AND.
fn list_query<T: Entity>(query: &QuerySpec) -> QueryBuilder<'static, Postgres> {
    let mut qb = select::<T>();
    for (i, filter) in query.filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(filter.field);
        match &filter.predicate {
            Predicate::Equals(v) => {
                qb.push(" = ");
                push_value(&mut qb, v);
            }
            Predicate::AtLeast(v) => {
                qb.push(" >= ");
                push_value(&mut qb, v);
            }
            Predicate::AtMost(v) => {
                qb.push(" <= ");
                push_value(&mut qb, v);
            }
            Predicate::Contains(needle) => {
                qb.push(" ILIKE ").push_bind(format!("%{}%", escape_like(needle)));
            }
        }
    }

    if let Some(sort) = query.sort {
        qb.push(" ORDER BY ").push(sort.field).push(match sort.direction {
            SortDirection::Ascending => " ASC",
            SortDirection::Descending => " DESC",
        });
    }

    qb.push(" LIMIT ")
        .push_bind(clamp_i64(query.limit))
        .push(" OFFSET ")
        .push_bind(clamp_i64(query.skip));
    qb
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Int(v) => qb.push_bind(*v),
        FieldValue::Text(v) => qb.push_bind(v.clone()),
        FieldValue::Bool(v) => qb.push_bind(*v),
        FieldValue::Decimal(v) => qb.push_bind(*v),
        FieldValue::Date(v) => qb.push_bind(*v),
    };
}

fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Escape LIKE metacharacters so user text matches literally (backslash is the default escape).
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn decode_row<T: Entity>(row: &PgRow) -> Result<T, StoreError> {
    let id: i64 = row
        .try_get(ID)
        .map_err(|e| StoreError::decode(format!("{}.id: {e}", T::TABLE)))?;

    let fields = T::data_columns()
        .map(|f| {
            read_column(row, f.name, f.kind)
                .map(|v| (f.name, v))
                .map_err(|e| StoreError::decode(format!("{}.{}: {e}", T::TABLE, f.name)))
        })
        .collect::<Result<FieldMap, StoreError>>()?;

    T::from_fields(id, &fields)
}

fn read_column(row: &PgRow, name: &str, kind: FieldKind) -> Result<FieldValue, sqlx::Error> {
    Ok(match kind {
        FieldKind::Int => FieldValue::Int(row.try_get::<i64, _>(name)?),
        FieldKind::Text => FieldValue::Text(row.try_get::<String, _>(name)?),
        FieldKind::Bool => FieldValue::Bool(row.try_get::<bool, _>(name)?),
        FieldKind::Decimal => FieldValue::Decimal(row.try_get::<Decimal, _>(name)?),
        FieldKind::Date => FieldValue::Date(row.try_get::<NaiveDate, _>(name)?),
    })
}

/// Map SQLx errors to store errors.
///
/// Any SQLSTATE in class 23 (integrity constraint violation) becomes `ConstraintViolation`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code.starts_with("23") => StoreError::ConstraintViolation(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(format!("row decode failed in {}: {}", operation, err))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("timed out acquiring connection in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
