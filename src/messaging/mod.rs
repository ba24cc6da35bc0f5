//! # Messaging Contracts
//!
//! The dispatch path never talks to channel transports or a broker directly;
//! it goes through two narrow contracts:
//!
//! - [`JobQueue`]: an explicit outbox with fire-and-forget, at-least-once
//!   semantics. Handlers invoked by the queue must be idempotent because
//!   duplicate deliveries (and duplicate notifications for one booking) are
//!   possible by design.
//! - [`MessageSender`]: a channel-specific sender (WhatsApp/Telegram/...).
//!   Callers catch and log failures; a send failure never propagates into the
//!   workflow engine.
//!
//! [`InMemoryJobQueue`] is the in-process implementation used by tests and
//! single-node deployments.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Result, RideflowError};

/// Job dispatched for each driver notification; payload carries the
/// notification's `message_send_id` correlation token.
pub const JOB_NOTIFY_DRIVER: &str = "notify_driver";

/// Job dispatched after a successful assignment to inform the customer.
pub const JOB_NOTIFY_CUSTOMER_ACCEPTANCE: &str = "notify_customer_acceptance";

/// Fire-and-forget job enqueue with an at-least-once contract.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job_name: &str, payload: Value) -> Result<()>;
}

/// Channel-agnostic message sender contract.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient: &str, payload: Value) -> Result<()>;
}

/// An enqueued job as recorded by [`InMemoryJobQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub job_name: String,
    pub payload: Value,
}

/// In-process job queue. Records every enqueue in order; consumers drain via
/// [`InMemoryJobQueue::take_all`].
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<QueuedJob>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all queued jobs, oldest first.
    pub fn take_all(&self) -> Vec<QueuedJob> {
        std::mem::take(&mut *self.jobs.lock())
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job_name: &str, payload: Value) -> Result<()> {
        if job_name.is_empty() {
            return Err(RideflowError::Messaging {
                message: "job name must not be empty".to_string(),
            });
        }
        self.jobs.lock().push(QueuedJob {
            job_name: job_name.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_records_jobs_in_order() {
        let queue = InMemoryJobQueue::new();
        queue
            .enqueue(JOB_NOTIFY_DRIVER, json!({"message_send_id": "a"}))
            .await
            .unwrap();
        queue
            .enqueue(JOB_NOTIFY_DRIVER, json!({"message_send_id": "b"}))
            .await
            .unwrap();

        let jobs = queue.take_all();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].payload["message_send_id"], "a");
        assert_eq!(jobs[1].payload["message_send_id"], "b");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_empty_job_name_rejected() {
        let queue = InMemoryJobQueue::new();
        assert!(queue.enqueue("", json!({})).await.is_err());
    }

    struct RecordingSender {
        sent: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, recipient: &str, payload: Value) -> Result<()> {
            self.sent.lock().push((recipient.to_string(), payload));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sender_receives_recipient_and_payload() {
        let recorder = std::sync::Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        });
        let sender: std::sync::Arc<dyn MessageSender> = recorder.clone();
        sender
            .send("driver-7", json!({"text": "New trip available"}))
            .await
            .unwrap();

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "driver-7");
        assert_eq!(sent[0].1["text"], "New trip available");
    }
}
