//! # Assignment Service
//!
//! The race-free "first acceptor wins" transition for a booking. Any number
//! of drivers may act on their notifications concurrently; exactly one
//! acceptance binds a driver to the booking, and every other caller observes
//! a no-op rather than an error.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::store::DispatchStore;
use crate::error::Result;
use crate::messaging::{JobQueue, JOB_NOTIFY_CUSTOMER_ACCEPTANCE};

pub use super::store::AssignmentOutcome;

/// Handles driver acceptance of a notification.
pub struct AssignmentService {
    store: Arc<dyn DispatchStore>,
    jobs: Arc<dyn JobQueue>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn DispatchStore>, jobs: Arc<dyn JobQueue>) -> Self {
        Self { store, jobs }
    }

    /// Process a driver's "accept" for the notification identified by its
    /// external correlation token.
    ///
    /// Across any number of concurrent callers racing on the same booking,
    /// at most one observes [`AssignmentOutcome::Assigned`]; the rest get
    /// [`AssignmentOutcome::AlreadyTaken`]. On a win, the customer-acceptance
    /// job is enqueued; an enqueue failure is logged, not propagated, since
    /// the assignment itself has already committed.
    #[instrument(skip(self))]
    pub async fn accept(&self, message_send_id: Uuid) -> Result<AssignmentOutcome> {
        let outcome = self.store.assign_driver_nowait(message_send_id).await?;

        match &outcome {
            AssignmentOutcome::Assigned(booking) => {
                info!(
                    booking_id = booking.id,
                    driver_id = booking.driver_id,
                    "Driver won the assignment"
                );
                let payload = json!({ "message_send_id": message_send_id });
                if let Err(e) = self
                    .jobs
                    .enqueue(JOB_NOTIFY_CUSTOMER_ACCEPTANCE, payload)
                    .await
                {
                    warn!(
                        booking_id = booking.id,
                        error = %e,
                        "Assignment committed but acceptance notification could not be enqueued"
                    );
                }
            }
            AssignmentOutcome::AlreadyTaken => {
                info!(%message_send_id, "Acceptance lost the race, no-op");
            }
            AssignmentOutcome::NotFound => {
                warn!(%message_send_id, "Acceptance for unknown correlation token");
            }
        }

        Ok(outcome)
    }
}
