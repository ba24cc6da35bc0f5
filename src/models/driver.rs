//! # Driver Model
//!
//! The driver pool enumerated during dispatch fanout. Relational rows hold
//! channel identity and vehicle metadata; live positions are held out of the
//! relational store, in the geo index (`crate::geo`), and are continuously
//! upserted by a location-reporting channel independent of any booking.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Vehicle class used for pricing buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Standard,
    Comfort,
    Van,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Standard => "standard",
            VehicleType::Comfort => "comfort",
            VehicleType::Van => "van",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(VehicleType::Standard),
            "comfort" => Some(VehicleType::Comfort),
            "van" => Some(VehicleType::Van),
            _ => None,
        }
    }
}

/// A registered driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: i64,
    pub name: Option<String>,
    pub rank: i32,
    pub channel: String,
    /// Unique per-channel identity (phone number / chat id)
    pub channel_id: String,
    pub vehicle_type: VehicleType,
    pub active: bool,
    pub city: String,
}

/// New driver for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub name: Option<String>,
    pub channel: String,
    pub channel_id: String,
    pub vehicle_type: VehicleType,
    pub city: String,
}

impl Driver {
    pub async fn create(pool: &PgPool, new_driver: NewDriver) -> Result<Driver, sqlx::Error> {
        let query = r#"
            INSERT INTO driver (name, rank, channel, channel_id, vehicle_type, active, city)
            VALUES ($1, 0, $2, $3, $4, true, $5)
            RETURNING id, name, rank, channel, channel_id, vehicle_type, active, city
        "#;

        sqlx::query_as::<_, Driver>(query)
            .bind(&new_driver.name)
            .bind(&new_driver.channel)
            .bind(&new_driver.channel_id)
            .bind(new_driver.vehicle_type)
            .bind(&new_driver.city)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Driver>, sqlx::Error> {
        let query = r#"
            SELECT id, name, rank, channel, channel_id, vehicle_type, active, city
            FROM driver
            WHERE id = $1
        "#;

        sqlx::query_as::<_, Driver>(query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_channel_id(
        pool: &PgPool,
        channel_id: &str,
    ) -> Result<Option<Driver>, sqlx::Error> {
        let query = r#"
            SELECT id, name, rank, channel, channel_id, vehicle_type, active, city
            FROM driver
            WHERE channel_id = $1
        "#;

        sqlx::query_as::<_, Driver>(query)
            .bind(channel_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_rank(pool: &PgPool, id: i64, rank: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE driver SET rank = $2 WHERE id = $1")
            .bind(id)
            .bind(rank)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
