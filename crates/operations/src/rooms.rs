//! Room listing and lookup.

use std::sync::Arc;

use rust_decimal::Decimal;

use hotelier_core::models::Room;
use hotelier_core::{EntityStore, HotelResult, Predicate, build_query};

use crate::ListParams;

/// Optional room filters. Price bounds are inclusive and independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFilter {
    pub available: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct RoomService {
    store: Arc<dyn EntityStore<Room>>,
}

impl RoomService {
    pub fn new(store: Arc<dyn EntityStore<Room>>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &RoomFilter, params: &ListParams) -> HotelResult<Vec<Room>> {
        let query = build_query::<Room, _>(
            params.skip,
            params.limit,
            [
                ("available", filter.available.map(Predicate::equals)),
                ("price", filter.min_price.map(Predicate::at_least)),
                ("price", filter.max_price.map(Predicate::at_most)),
            ],
            params.sort_by.as_deref(),
            params.order.as_deref(),
        );
        Ok(self.store.read_all(&query).await?)
    }

    pub async fn get(&self, id: i64) -> HotelResult<Room> {
        Ok(self.store.read_by_id(id).await?)
    }
}
