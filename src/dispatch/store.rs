//! # Dispatch Persistence Contract
//!
//! The narrow store interface consumed by the dispatch coordinator and the
//! assignment path. Keeping it a trait lets the concurrency-sensitive pieces
//! (skip-locked batches, no-wait assignment) be exercised in tests with an
//! in-memory fake whose locking is real, while production runs against
//! [`PgDispatchStore`].

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, RideflowError};
use crate::models::{Booking, Driver, Notification};

/// Result of one acceptance attempt.
///
/// Contention and predicate-miss are successful no-ops, never errors: a
/// blocked acceptance is indistinguishable in outcome from "too late", so the
/// store fails fast and reports [`AssignmentOutcome::AlreadyTaken`].
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentOutcome {
    /// This caller won the race; the booking now carries the driver.
    Assigned(Booking),
    /// Another caller holds or already won the assignment.
    AlreadyTaken,
    /// The correlation token resolves to no notification.
    NotFound,
}

/// Persistence operations required by dispatch and assignment.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn booking_by_id(&self, booking_id: i64) -> Result<Option<Booking>>;

    /// One batch of active drivers with `id > last_id`, ascending by id,
    /// limited to `batch_size`, read with skip-locked semantics.
    async fn active_drivers_batch(&self, last_id: i64, batch_size: i64) -> Result<Vec<Driver>>;

    async fn create_notification(
        &self,
        driver_id: i64,
        booking_id: i64,
        channel_send: &str,
    ) -> Result<Notification>;

    /// Atomically bind the notification's driver to its booking, provided the
    /// booking is still pending and unassigned, using a no-wait row lock.
    async fn assign_driver_nowait(&self, message_send_id: Uuid) -> Result<AssignmentOutcome>;
}

/// PostgreSQL SQLSTATE raised when `NOWAIT` cannot acquire a row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

fn is_lock_not_available(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(LOCK_NOT_AVAILABLE),
        _ => false,
    }
}

/// Postgres-backed dispatch store.
pub struct PgDispatchStore {
    pool: sqlx::PgPool,
}

impl PgDispatchStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchStore for PgDispatchStore {
    async fn booking_by_id(&self, booking_id: i64) -> Result<Option<Booking>> {
        Booking::find_by_id(&self.pool, booking_id)
            .await
            .map_err(|e| RideflowError::database("booking_by_id", e))
    }

    async fn active_drivers_batch(&self, last_id: i64, batch_size: i64) -> Result<Vec<Driver>> {
        let query = r#"
            SELECT id, name, rank, channel, channel_id, vehicle_type, active, city
            FROM driver
            WHERE active = true AND id > $1
            ORDER BY id ASC
            LIMIT $2
            FOR UPDATE SKIP LOCKED
        "#;

        sqlx::query_as::<_, Driver>(query)
            .bind(last_id)
            .bind(batch_size)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RideflowError::database("active_drivers_batch", e))
    }

    async fn create_notification(
        &self,
        driver_id: i64,
        booking_id: i64,
        channel_send: &str,
    ) -> Result<Notification> {
        Notification::create(&self.pool, driver_id, booking_id, channel_send)
            .await
            .map_err(|e| RideflowError::database("create_notification", e))
    }

    async fn assign_driver_nowait(&self, message_send_id: Uuid) -> Result<AssignmentOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RideflowError::database("assign_driver_nowait.begin", e))?;

        // Resolve the notification joined to its booking, locking only the
        // booking row. NOWAIT turns contention into an immediate error we map
        // to a no-op instead of a blocked transaction.
        let lock_query = r#"
            SELECT n.driver_id, b.id AS booking_id
            FROM notification n
            JOIN booking b ON b.id = n.booking_id
            WHERE n.message_send_id = $1
              AND b.driver_id IS NULL
              AND b.status = 'pending'
            FOR UPDATE OF b NOWAIT
        "#;

        let target: Option<(i64, i64)> = match sqlx::query_as(lock_query)
            .bind(message_send_id)
            .fetch_optional(&mut *tx)
            .await
        {
            Ok(row) => row,
            Err(e) if is_lock_not_available(&e) => {
                warn!(%message_send_id, "Booking row locked by a concurrent acceptance, skipping");
                tx.rollback()
                    .await
                    .map_err(|e| RideflowError::database("assign_driver_nowait.rollback", e))?;
                return Ok(AssignmentOutcome::AlreadyTaken);
            }
            Err(e) => return Err(RideflowError::database("assign_driver_nowait.lock", e)),
        };

        let Some((driver_id, booking_id)) = target else {
            tx.rollback()
                .await
                .map_err(|e| RideflowError::database("assign_driver_nowait.rollback", e))?;
            // Distinguish a stale token from a lost race for observability;
            // both are no-ops to the caller.
            let exists = Notification::find_by_message_send_id(&self.pool, message_send_id)
                .await
                .map_err(|e| RideflowError::database("assign_driver_nowait.resolve", e))?
                .is_some();
            return Ok(if exists {
                debug!(%message_send_id, "Booking already assigned by a prior transaction");
                AssignmentOutcome::AlreadyTaken
            } else {
                AssignmentOutcome::NotFound
            });
        };

        let update_query = r#"
            UPDATE booking
            SET driver_id = $2, status = 'confirmed', confirmed_at = NOW()
            WHERE id = $1
            RETURNING id, identifier, status, driver_id, customer_channel,
                      customer_channel_id, pickup_location, destination,
                      pickup_time, passengers, special_requests, created_at,
                      confirmed_at
        "#;

        let booking = sqlx::query_as::<_, Booking>(update_query)
            .bind(booking_id)
            .bind(driver_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RideflowError::database("assign_driver_nowait.update", e))?;

        tx.commit()
            .await
            .map_err(|e| RideflowError::database("assign_driver_nowait.commit", e))?;

        debug!(booking_id, driver_id, "Booking assigned");
        Ok(AssignmentOutcome::Assigned(booking))
    }
}
