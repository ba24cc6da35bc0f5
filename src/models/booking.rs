//! # Booking Model
//!
//! A booking is created by the conversational flow once its required fields
//! are complete, then fanned out to drivers by the dispatch coordinator.
//!
//! ## Database Schema
//!
//! Maps to the `booking` table:
//! - `id`: Primary key (BIGINT)
//! - `identifier`: Customer-facing UUID
//! - `status`: `booking_status` enum (`pending`, `confirmed`, `failed`, `successful`)
//! - `driver_id`: Nullable until assignment; transitions null→value exactly once
//! - `pickup_location` / `destination` / `pickup_time`: trip fields as captured
//!   by the assistant (locations are geocoded JSON strings upstream)
//!
//! Once `driver_id` is set, `status` must be `confirmed` or later. The
//! null→value transition itself happens only inside the no-wait assignment
//! transaction (`dispatch::store`), never through this model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Assignment lifecycle of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Failed,
    Successful,
}

/// A customer trip request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    /// Customer-facing correlation UUID
    pub identifier: Uuid,
    pub status: BookingStatus,
    pub driver_id: Option<i64>,
    pub customer_channel: String,
    pub customer_channel_id: String,
    pub pickup_location: String,
    pub destination: String,
    pub pickup_time: String,
    pub passengers: i32,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// New booking for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer_channel: String,
    pub customer_channel_id: String,
    pub pickup_location: String,
    pub destination: String,
    pub pickup_time: String,
    pub passengers: i32,
    pub special_requests: Option<String>,
}

impl Booking {
    /// Create a new pending booking.
    pub async fn create(pool: &PgPool, new_booking: NewBooking) -> Result<Booking, sqlx::Error> {
        let query = r#"
            INSERT INTO booking (
                identifier, status, customer_channel, customer_channel_id,
                pickup_location, destination, pickup_time, passengers,
                special_requests, created_at
            )
            VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id, identifier, status, driver_id, customer_channel,
                      customer_channel_id, pickup_location, destination,
                      pickup_time, passengers, special_requests, created_at,
                      confirmed_at
        "#;

        sqlx::query_as::<_, Booking>(query)
            .bind(Uuid::new_v4())
            .bind(&new_booking.customer_channel)
            .bind(&new_booking.customer_channel_id)
            .bind(&new_booking.pickup_location)
            .bind(&new_booking.destination)
            .bind(&new_booking.pickup_time)
            .bind(new_booking.passengers)
            .bind(&new_booking.special_requests)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        let query = r#"
            SELECT id, identifier, status, driver_id, customer_channel,
                   customer_channel_id, pickup_location, destination,
                   pickup_time, passengers, special_requests, created_at,
                   confirmed_at
            FROM booking
            WHERE id = $1
        "#;

        sqlx::query_as::<_, Booking>(query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_identifier(
        pool: &PgPool,
        identifier: Uuid,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = r#"
            SELECT id, identifier, status, driver_id, customer_channel,
                   customer_channel_id, pickup_location, destination,
                   pickup_time, passengers, special_requests, created_at,
                   confirmed_at
            FROM booking
            WHERE identifier = $1
        "#;

        sqlx::query_as::<_, Booking>(query)
            .bind(identifier)
            .fetch_optional(pool)
            .await
    }

    /// Recent pending bookings, bounded to a freshness window so stale
    /// requests age out of re-dispatch sweeps.
    pub async fn list_recent_pending(
        pool: &PgPool,
        max_age: Duration,
        limit: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let cutoff = Utc::now() - max_age;
        let query = r#"
            SELECT id, identifier, status, driver_id, customer_channel,
                   customer_channel_id, pickup_location, destination,
                   pickup_time, passengers, special_requests, created_at,
                   confirmed_at
            FROM booking
            WHERE status = 'pending' AND created_at >= $1
            ORDER BY id
            LIMIT $2
        "#;

        sqlx::query_as::<_, Booking>(query)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// True once a driver has been bound to this booking.
    pub fn is_assigned(&self) -> bool {
        self.driver_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&BookingStatus::Successful).unwrap(),
            "\"successful\""
        );
    }

    #[test]
    fn test_is_assigned() {
        let booking = Booking {
            id: 1,
            identifier: Uuid::new_v4(),
            status: BookingStatus::Pending,
            driver_id: None,
            customer_channel: "TELEGRAM".to_string(),
            customer_channel_id: "cust-1".to_string(),
            pickup_location: "Old Square".to_string(),
            destination: "Airport".to_string(),
            pickup_time: "immediate".to_string(),
            passengers: 1,
            special_requests: None,
            created_at: Utc::now(),
            confirmed_at: None,
        };
        assert!(!booking.is_assigned());

        let assigned = Booking {
            driver_id: Some(7),
            status: BookingStatus::Confirmed,
            ..booking
        };
        assert!(assigned.is_assigned());
    }
}
