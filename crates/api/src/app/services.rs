//! Service wiring: pick a store backend and assemble the domain services around it.

use std::sync::Arc;

use rust_decimal::Decimal;

use hotelier_core::models::{Booking, Customer, Room};
use hotelier_core::{EntityStore, FieldMap, StoreError, StoreHealth};
use hotelier_infra::{InMemoryDatabase, PostgresDatabase, RateAdmission, Settings};
use hotelier_operations::{BookingService, CustomerService, RoomService};

/// Everything a handler or middleware needs, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub rooms: RoomService,
    pub customers: CustomerService,
    pub bookings: BookingService,
    pub health: Arc<dyn StoreHealth>,
    pub admission: Arc<RateAdmission>,
}

impl AppServices {
    pub fn new(
        rooms: Arc<dyn EntityStore<Room>>,
        customers: Arc<dyn EntityStore<Customer>>,
        bookings: Arc<dyn EntityStore<Booking>>,
        health: Arc<dyn StoreHealth>,
        admission: Arc<RateAdmission>,
    ) -> Self {
        Self {
            rooms: RoomService::new(rooms.clone()),
            customers: CustomerService::new(customers),
            bookings: BookingService::new(rooms, bookings),
            health,
            admission,
        }
    }

    pub fn in_memory(db: Arc<InMemoryDatabase>, admission: Arc<RateAdmission>) -> Self {
        Self::new(
            Arc::new(db.store::<Room>()),
            Arc::new(db.store::<Customer>()),
            Arc::new(db.store::<Booking>()),
            db,
            admission,
        )
    }

    pub fn postgres(db: PostgresDatabase, admission: Arc<RateAdmission>) -> Self {
        Self::new(
            Arc::new(db.store::<Room>()),
            Arc::new(db.store::<Customer>()),
            Arc::new(db.store::<Booking>()),
            Arc::new(db),
            admission,
        )
    }
}

/// Admission controller as configured.
pub fn build_admission(settings: &Settings) -> RateAdmission {
    if settings.rate_limit_enabled {
        RateAdmission::new(settings.rate_limits, settings.rate_limit_whitelist.iter().copied())
    } else {
        tracing::warn!("rate limiting disabled by configuration");
        RateAdmission::disabled()
    }
}

/// Build services for the configured backend.
pub async fn build_services(settings: &Settings) -> anyhow::Result<AppServices> {
    let admission = Arc::new(build_admission(settings));

    if settings.use_persistent_stores {
        let url = settings
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true"))?;
        let db = PostgresDatabase::connect(url, settings.database_max_connections).await?;
        tracing::info!(max_connections = settings.database_max_connections, "using postgres stores");
        return Ok(AppServices::postgres(db, admission));
    }

    let db = Arc::new(InMemoryDatabase::new());
    if settings.seed_demo_rooms {
        seed_demo_rooms(&db).await?;
    }
    tracing::info!(seeded = settings.seed_demo_rooms, "using in-memory stores");
    Ok(AppServices::in_memory(db, admission))
}

/// A small room inventory so a fresh in-memory server has something to book.
pub async fn seed_demo_rooms(db: &Arc<InMemoryDatabase>) -> Result<Vec<Room>, StoreError> {
    let rooms = db.store::<Room>();
    let mut seeded = Vec::new();
    for (number, size, price, available) in [
        ("101", 1, Decimal::from(50), true),
        ("102", 2, Decimal::from(100), true),
        ("201", 2, Decimal::new(14950, 2), false),
        ("301", 4, Decimal::from(250), true),
    ] {
        let room = rooms
            .create(
                FieldMap::new()
                    .with("number", number)
                    .with("size", size)
                    .with("price", price)
                    .with("available", available),
            )
            .await?;
        seeded.push(room);
    }
    Ok(seeded)
}
