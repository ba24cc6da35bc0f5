//! # Dispatch Coordinator
//!
//! Fans a newly created booking out to the population of active drivers so
//! any of them may accept it. This is a push, best-effort broadcast: no
//! acknowledgement is awaited before moving to the next driver or the next
//! batch, and a failure to notify one driver never aborts the run.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::store::DispatchStore;
use crate::config::DispatchConfig;
use crate::error::Result;
use crate::messaging::{JobQueue, JOB_NOTIFY_DRIVER};

/// Outcome counters for one fanout run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Notifications created and enqueued
    pub notified: usize,
    /// Drivers skipped due to notification or enqueue failures
    pub skipped: usize,
    /// Non-empty batches processed
    pub batches: usize,
}

/// Batch-enumerates eligible drivers and fans out notifications for a booking.
pub struct DispatchCoordinator {
    store: Arc<dyn DispatchStore>,
    jobs: Arc<dyn JobQueue>,
    config: DispatchConfig,
}

impl DispatchCoordinator {
    pub fn new(store: Arc<dyn DispatchStore>, jobs: Arc<dyn JobQueue>) -> Self {
        Self::with_config(store, jobs, DispatchConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DispatchStore>,
        jobs: Arc<dyn JobQueue>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            jobs,
            config,
        }
    }

    /// Notify every active driver about `booking_id`.
    ///
    /// Drivers are enumerated in ascending-id batches with skip-locked reads,
    /// so concurrent dispatch runs for other bookings never block each other.
    /// Repeated triggers for the same booking will notify drivers again;
    /// duplicates are tolerated downstream (at-least-once contract).
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn dispatch_booking(&self, booking_id: i64) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();

        let Some(booking) = self.store.booking_by_id(booking_id).await? else {
            warn!(booking_id, "Dispatch requested for unknown booking, nothing to do");
            return Ok(summary);
        };

        let mut last_id: i64 = 0;

        loop {
            let drivers = self
                .store
                .active_drivers_batch(last_id, self.config.batch_size)
                .await?;

            if drivers.is_empty() {
                break;
            }
            summary.batches += 1;

            for driver in &drivers {
                match self
                    .store
                    .create_notification(driver.id, booking.id, &driver.channel)
                    .await
                {
                    Ok(notification) => {
                        let payload = json!({
                            "message_send_id": notification.message_send_id,
                        });
                        match self.jobs.enqueue(JOB_NOTIFY_DRIVER, payload).await {
                            Ok(()) => summary.notified += 1,
                            Err(e) => {
                                // The notification row exists; a later sweep can
                                // still pick it up. Do not abort the batch.
                                warn!(
                                    driver_id = driver.id,
                                    booking_id = booking.id,
                                    error = %e,
                                    "Failed to enqueue driver notification job"
                                );
                                summary.skipped += 1;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            driver_id = driver.id,
                            booking_id = booking.id,
                            error = %e,
                            "Failed to create notification, skipping driver"
                        );
                        summary.skipped += 1;
                    }
                }
            }

            last_id = drivers.last().map(|d| d.id).unwrap_or(last_id);
            debug!(
                booking_id,
                last_id,
                batch_len = drivers.len(),
                "Processed driver batch"
            );
        }

        info!(
            booking_id,
            notified = summary.notified,
            skipped = summary.skipped,
            batches = summary.batches,
            "Dispatch fanout complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::store::testing::InMemoryDispatchStore;
    use crate::messaging::InMemoryJobQueue;

    fn coordinator(
        store: Arc<InMemoryDispatchStore>,
        queue: Arc<InMemoryJobQueue>,
        batch_size: i64,
    ) -> DispatchCoordinator {
        DispatchCoordinator::with_config(store, queue, DispatchConfig { batch_size })
    }

    #[tokio::test]
    async fn test_650_drivers_batch_300_yields_three_batches() {
        let store = Arc::new(InMemoryDispatchStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        for id in 1..=650 {
            store.seed_driver(id, true);
        }
        store.seed_booking(1);

        let summary = coordinator(store.clone(), queue.clone(), 300)
            .dispatch_booking(1)
            .await
            .unwrap();

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.notified, 650);
        assert_eq!(summary.skipped, 0);

        // Each driver touched exactly once.
        let notifications = store.notifications.lock();
        assert_eq!(notifications.len(), 650);
        let mut driver_ids: Vec<i64> = notifications.iter().map(|n| n.driver_id).collect();
        driver_ids.sort_unstable();
        driver_ids.dedup();
        assert_eq!(driver_ids.len(), 650);

        assert_eq!(queue.len(), 650);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_a_noop() {
        let store = Arc::new(InMemoryDispatchStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        store.seed_driver(1, true);

        let summary = coordinator(store.clone(), queue.clone(), 300)
            .dispatch_booking(42)
            .await
            .unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_drivers_are_not_notified() {
        let store = Arc::new(InMemoryDispatchStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        store.seed_driver(1, true);
        store.seed_driver(2, false);
        store.seed_driver(3, true);
        store.seed_booking(1);

        let summary = coordinator(store.clone(), queue, 300)
            .dispatch_booking(1)
            .await
            .unwrap();

        assert_eq!(summary.notified, 2);
        let notified: Vec<i64> = store
            .notifications
            .lock()
            .iter()
            .map(|n| n.driver_id)
            .collect();
        assert_eq!(notified, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_one_failing_driver_does_not_abort_the_batch() {
        let store = Arc::new(InMemoryDispatchStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        for id in 1..=5 {
            store.seed_driver(id, true);
        }
        store.failing_driver_ids.lock().insert(3);
        store.seed_booking(1);

        let summary = coordinator(store.clone(), queue.clone(), 300)
            .dispatch_booking(1)
            .await
            .unwrap();

        assert_eq!(summary.notified, 4);
        assert_eq!(summary.skipped, 1);
        assert_eq!(queue.len(), 4);
        let notified: Vec<i64> = store
            .notifications
            .lock()
            .iter()
            .map(|n| n.driver_id)
            .collect();
        assert_eq!(notified, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_job_payload_carries_correlation_token() {
        let store = Arc::new(InMemoryDispatchStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        store.seed_driver(1, true);
        store.seed_booking(1);

        coordinator(store.clone(), queue.clone(), 300)
            .dispatch_booking(1)
            .await
            .unwrap();

        let jobs = queue.take_all();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_name, JOB_NOTIFY_DRIVER);
        let token = jobs[0].payload["message_send_id"].as_str().unwrap();
        let expected = store.notifications.lock()[0].message_send_id.to_string();
        assert_eq!(token, expected);
    }
}
