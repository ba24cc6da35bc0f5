//! # Notification Model
//!
//! One row per (driver, booking) fanout attempt. The `message_send_id` UUID
//! is the external correlation token carried by the "notify driver" job and
//! presented back on acceptance; it is the only key the assignment path
//! needs. Many notifications exist per booking; at most one ever leads to an
//! assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Driver-side reply lifecycle of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reply_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Pending,
    Confirmed,
    Reply,
    OutDate,
    Successful,
}

/// A driver-notification record for one booking fanout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub driver_id: i64,
    pub booking_id: i64,
    pub channel_send: String,
    /// External correlation token handed to the job queue and message sender
    pub message_send_id: Uuid,
    pub reply_status: ReplyStatus,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a pending notification for one driver and booking.
    pub async fn create(
        pool: &PgPool,
        driver_id: i64,
        booking_id: i64,
        channel_send: &str,
    ) -> Result<Notification, sqlx::Error> {
        let query = r#"
            INSERT INTO notification (driver_id, booking_id, channel_send,
                                      message_send_id, reply_status, created_at)
            VALUES ($1, $2, $3, $4, 'pending', NOW())
            RETURNING id, driver_id, booking_id, channel_send, message_send_id,
                      reply_status, created_at
        "#;

        sqlx::query_as::<_, Notification>(query)
            .bind(driver_id)
            .bind(booking_id)
            .bind(channel_send)
            .bind(Uuid::new_v4())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_message_send_id(
        pool: &PgPool,
        message_send_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = r#"
            SELECT id, driver_id, booking_id, channel_send, message_send_id,
                   reply_status, created_at
            FROM notification
            WHERE message_send_id = $1
        "#;

        sqlx::query_as::<_, Notification>(query)
            .bind(message_send_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_reply_status(
        pool: &PgPool,
        message_send_id: Uuid,
        reply_status: ReplyStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notification SET reply_status = $2 WHERE message_send_id = $1",
        )
        .bind(message_send_id)
        .bind(reply_status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
