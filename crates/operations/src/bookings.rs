//! Booking listing, lookup, creation with server-side pricing, and cancellation.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use hotelier_core::models::{Booking, Room};
use hotelier_core::{EntityStore, FieldMap, HotelError, HotelResult, Predicate, build_query};

use crate::ListParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub customer_id: Option<i64>,
    pub room_id: Option<i64>,
}

/// Client request for a reservation. The price is never client-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBooking {
    pub room_id: i64,
    pub customer_id: i64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[derive(Clone)]
pub struct BookingService {
    rooms: Arc<dyn EntityStore<Room>>,
    bookings: Arc<dyn EntityStore<Booking>>,
}

impl BookingService {
    pub fn new(rooms: Arc<dyn EntityStore<Room>>, bookings: Arc<dyn EntityStore<Booking>>) -> Self {
        Self { rooms, bookings }
    }

    pub async fn list(&self, filter: &BookingFilter, params: &ListParams) -> HotelResult<Vec<Booking>> {
        let query = build_query::<Booking, _>(
            params.skip,
            params.limit,
            [
                ("customer_id", filter.customer_id.map(Predicate::equals)),
                ("room_id", filter.room_id.map(Predicate::equals)),
            ],
            params.sort_by.as_deref(),
            params.order.as_deref(),
        );
        Ok(self.bookings.read_all(&query).await?)
    }

    pub async fn get(&self, id: i64) -> HotelResult<Booking> {
        Ok(self.bookings.read_by_id(id).await?)
    }

    /// Price the stay from the room's nightly rate and persist it.
    ///
    /// The room is read first, so an unknown room is `NotFound` even when the dates are
    /// also invalid. An unknown customer surfaces as a constraint violation from the store.
    pub async fn create(&self, request: NewBooking) -> HotelResult<Booking> {
        let room = self.rooms.read_by_id(request.room_id).await?;

        let days = Booking::nights(request.from_date, request.to_date);
        if days <= 0 {
            return Err(HotelError::InvalidDateRange {
                check_in: request.from_date,
                check_out: request.to_date,
                days,
            });
        }

        let price = room.price.checked_mul(Decimal::from(days)).ok_or_else(|| {
            HotelError::validation(
                "Booking price exceeds the supported range",
                json!({ "room_id": room.id, "nightly_price": room.price.to_string(), "days": days }),
            )
        })?;
        let booking = self
            .bookings
            .create(
                FieldMap::new()
                    .with("room_id", request.room_id)
                    .with("customer_id", request.customer_id)
                    .with("from_date", request.from_date)
                    .with("to_date", request.to_date)
                    .with("price", price),
            )
            .await?;

        tracing::info!(
            booking_id = booking.id,
            room_id = booking.room_id,
            customer_id = booking.customer_id,
            days,
            price = %booking.price,
            "booking created"
        );
        Ok(booking)
    }

    pub async fn delete(&self, id: i64) -> HotelResult<Booking> {
        let removed = self.bookings.delete(id).await?;
        tracing::info!(booking_id = id, "booking cancelled");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_room, runtime};
    use chrono::Duration;
    use hotelier_core::models::Customer;
    use hotelier_infra::InMemoryDatabase;
    use proptest::prelude::*;

    struct Fixture {
        service: BookingService,
        room_id: i64,
        customer_id: i64,
    }

    async fn fixture(nightly: Decimal) -> Fixture {
        let db = Arc::new(InMemoryDatabase::new());
        let room = add_room(&db, "101", nightly, true).await;
        let customer = db
            .store::<Customer>()
            .create(
                FieldMap::new()
                    .with("first_name", "Jane")
                    .with("last_name", "Smith")
                    .with("email_address", "jane@example.com"),
            )
            .await
            .unwrap();
        Fixture {
            service: BookingService::new(Arc::new(db.store::<Room>()), Arc::new(db.store::<Booking>())),
            room_id: room.id,
            customer_id: customer.id,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn four_nights_at_100_costs_400() {
        let f = fixture(Decimal::from(100)).await;
        let booking = f
            .service
            .create(NewBooking {
                room_id: f.room_id,
                customer_id: f.customer_id,
                from_date: date(2025, 1, 1),
                to_date: date(2025, 1, 5),
            })
            .await
            .unwrap();
        assert_eq!(booking.price, Decimal::from(400));
        assert_eq!(f.service.get(booking.id).await.unwrap(), booking);
    }

    #[tokio::test]
    async fn same_day_stay_is_an_invalid_range_with_zero_days() {
        let f = fixture(Decimal::from(100)).await;
        let err = f
            .service
            .create(NewBooking {
                room_id: f.room_id,
                customer_id: f.customer_id,
                from_date: date(2025, 1, 5),
                to_date: date(2025, 1, 5),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HotelError::InvalidDateRange {
                check_in: date(2025, 1, 5),
                check_out: date(2025, 1, 5),
                days: 0,
            }
        );
    }

    #[tokio::test]
    async fn price_overflow_is_a_validation_error() {
        let f = fixture(Decimal::MAX).await;
        let err = f
            .service
            .create(NewBooking {
                room_id: f.room_id,
                customer_id: f.customer_id,
                from_date: date(2025, 1, 1),
                to_date: date(2025, 1, 3),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::Validation { ref details, .. } if details["days"] == 2));
    }

    #[tokio::test]
    async fn unknown_room_is_not_found_before_date_checks() {
        let f = fixture(Decimal::from(100)).await;
        let err = f
            .service
            .create(NewBooking {
                room_id: 404,
                customer_id: f.customer_id,
                from_date: date(2025, 1, 5),
                to_date: date(2025, 1, 1),
            })
            .await
            .unwrap_err();
        assert_eq!(err, HotelError::not_found("Room", 404));
    }

    #[tokio::test]
    async fn unknown_customer_is_a_constraint_violation() {
        let f = fixture(Decimal::from(100)).await;
        let err = f
            .service
            .create(NewBooking {
                room_id: f.room_id,
                customer_id: 999,
                from_date: date(2025, 1, 1),
                to_date: date(2025, 1, 2),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn list_filters_by_customer_and_room() {
        let f = fixture(Decimal::from(80)).await;
        for offset in 0..3 {
            f.service
                .create(NewBooking {
                    room_id: f.room_id,
                    customer_id: f.customer_id,
                    from_date: date(2025, 2, 1) + Duration::days(offset * 7),
                    to_date: date(2025, 2, 3) + Duration::days(offset * 7),
                })
                .await
                .unwrap();
        }

        let mine = BookingFilter {
            customer_id: Some(f.customer_id),
            room_id: None,
        };
        let params = ListParams {
            sort_by: Some("check_in".into()),
            order: Some("desc".into()),
            ..ListParams::default()
        };
        let found = f.service.list(&mine, &params).await.unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].from_date, date(2025, 2, 15));

        let other = BookingFilter {
            customer_id: None,
            room_id: Some(f.room_id + 1),
        };
        assert!(f.service.list(&other, &params).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_returns_snapshot_then_not_found() {
        let f = fixture(Decimal::from(100)).await;
        let booking = f
            .service
            .create(NewBooking {
                room_id: f.room_id,
                customer_id: f.customer_id,
                from_date: date(2025, 3, 1),
                to_date: date(2025, 3, 2),
            })
            .await
            .unwrap();
        assert_eq!(f.service.delete(booking.id).await.unwrap(), booking);
        assert_eq!(
            f.service.delete(booking.id).await.unwrap_err(),
            HotelError::not_found("Booking", booking.id)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Valid stays cost exactly nightly price times nights.
        #[test]
        fn price_is_nightly_rate_times_nights(
            cents in 0i64..100_000,
            start in 0i64..3650,
            nights in 1i64..60,
        ) {
            let nightly = Decimal::new(cents, 2);
            let from_date = date(2020, 1, 1) + Duration::days(start);
            let to_date = from_date + Duration::days(nights);
            let booking = runtime().block_on(async {
                let f = fixture(nightly).await;
                f.service
                    .create(NewBooking { room_id: f.room_id, customer_id: f.customer_id, from_date, to_date })
                    .await
                    .unwrap()
            });
            prop_assert_eq!(booking.price, nightly * Decimal::from(nights));
        }

        /// Non-positive stays fail and report the day difference.
        #[test]
        fn non_positive_stays_report_days(start in 0i64..3650, back in 0i64..60) {
            let from_date = date(2020, 1, 1) + Duration::days(start);
            let to_date = from_date - Duration::days(back);
            let err = runtime().block_on(async {
                let f = fixture(Decimal::from(100)).await;
                f.service
                    .create(NewBooking { room_id: f.room_id, customer_id: f.customer_id, from_date, to_date })
                    .await
                    .unwrap_err()
            });
            prop_assert_eq!(err, HotelError::InvalidDateRange { check_in: from_date, check_out: to_date, days: -back });
        }

        /// Absent ids are NotFound with the exact id and resource kind.
        #[test]
        fn absent_ids_are_not_found(id in 2i64..i64::MAX) {
            let (read, delete) = runtime().block_on(async {
                let f = fixture(Decimal::from(100)).await;
                (f.service.get(id).await.unwrap_err(), f.service.delete(id).await.unwrap_err())
            });
            prop_assert_eq!(read, HotelError::not_found("Booking", id));
            prop_assert_eq!(delete, HotelError::not_found("Booking", id));
        }
    }
}
