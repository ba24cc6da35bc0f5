//! # Driver Location Index
//!
//! Service over the geo store: idempotent location upserts that seed driver
//! metadata on first sight, nearest-driver queries annotated with metadata,
//! and per-vehicle-type price quotes.
//!
//! Position records are continuously upserted by a location-reporting
//! channel, independent of any booking lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use super::pricing::PricingTable;
use super::store::GeoStore;
use super::distance_km;
use crate::error::{Result, RideflowError};
use crate::models::{Driver, VehicleType};

/// Geo-set key holding all driver positions.
const DRIVER_GEO_KEY: &str = "drivers:geo";

fn driver_meta_key(driver_id: i64) -> String {
    format!("drivers:meta:{driver_id}")
}

/// Channel identity and vehicle metadata seeded from the relational store.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverMetadata {
    pub channel: String,
    pub channel_id: String,
    pub vehicle_type: VehicleType,
}

/// Source of driver metadata for first-sight seeding.
#[async_trait]
pub trait DriverMetadataSource: Send + Sync {
    async fn driver_metadata(&self, driver_id: i64) -> Result<Option<DriverMetadata>>;
}

/// Postgres-backed metadata source reading from the `driver` table.
pub struct PgDriverMetadataSource {
    pool: sqlx::PgPool,
}

impl PgDriverMetadataSource {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverMetadataSource for PgDriverMetadataSource {
    async fn driver_metadata(&self, driver_id: i64) -> Result<Option<DriverMetadata>> {
        let driver = Driver::find_by_id(&self.pool, driver_id)
            .await
            .map_err(|e| RideflowError::database("driver_metadata", e))?;
        Ok(driver.map(|d| DriverMetadata {
            channel: d.channel,
            channel_id: d.channel_id,
            vehicle_type: d.vehicle_type,
        }))
    }
}

/// A driver returned by a nearest query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyDriver {
    pub driver_id: i64,
    pub distance_km: f64,
    pub vehicle_type: VehicleType,
    pub channel: String,
    pub channel_id: String,
    pub last_update: Option<DateTime<Utc>>,
}

/// One price tier, bucketed by vehicle type.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleQuote {
    pub vehicle_type: VehicleType,
    /// Closest driver of this type
    pub driver_id: i64,
    pub pickup_distance_km: f64,
    pub trip_distance_km: f64,
    pub price: f64,
}

/// Spatial nearest-neighbor index plus pricing, consulted by dispatch.
pub struct DriverLocationIndex {
    geo: Arc<dyn GeoStore>,
    metadata_source: Arc<dyn DriverMetadataSource>,
    pricing: PricingTable,
}

impl DriverLocationIndex {
    pub fn new(geo: Arc<dyn GeoStore>, metadata_source: Arc<dyn DriverMetadataSource>) -> Self {
        Self::with_pricing(geo, metadata_source, PricingTable::default())
    }

    pub fn with_pricing(
        geo: Arc<dyn GeoStore>,
        metadata_source: Arc<dyn DriverMetadataSource>,
        pricing: PricingTable,
    ) -> Self {
        Self {
            geo,
            metadata_source,
            pricing,
        }
    }

    /// Record a driver's last known position.
    ///
    /// Idempotent: the first sighting seeds channel identity and vehicle
    /// metadata from the relational store in the same operation; later calls
    /// only advance the position and `last_update` timestamp.
    #[instrument(skip(self))]
    pub async fn upsert_location(&self, driver_id: i64, lon: f64, lat: f64) -> Result<()> {
        let meta_key = driver_meta_key(driver_id);

        if self.geo.hash_get_all(&meta_key).await?.is_none() {
            let Some(meta) = self.metadata_source.driver_metadata(driver_id).await? else {
                return Err(RideflowError::Geo {
                    message: format!("no metadata for driver {driver_id}"),
                });
            };
            debug!(driver_id, "Seeding driver metadata on first location report");
            self.geo
                .hash_upsert(
                    &meta_key,
                    HashMap::from([
                        ("channel".to_string(), meta.channel),
                        ("channel_id".to_string(), meta.channel_id),
                        (
                            "vehicle_type".to_string(),
                            meta.vehicle_type.as_str().to_string(),
                        ),
                    ]),
                )
                .await?;
        }

        self.geo
            .geo_upsert(DRIVER_GEO_KEY, &driver_id.to_string(), lon, lat)
            .await?;
        self.geo
            .hash_upsert(
                &meta_key,
                HashMap::from([("last_update".to_string(), Utc::now().to_rfc3339())]),
            )
            .await?;
        Ok(())
    }

    /// Up to `k` drivers within `max_radius_km` of `(lon, lat)`, ascending by
    /// distance, each annotated with metadata and vehicle-type bucket.
    #[instrument(skip(self))]
    pub async fn nearest(
        &self,
        lon: f64,
        lat: f64,
        k: usize,
        max_radius_km: f64,
    ) -> Result<Vec<NearbyDriver>> {
        let matches = self
            .geo
            .geo_nearest(DRIVER_GEO_KEY, lon, lat, max_radius_km, k)
            .await?;

        let mut drivers = Vec::with_capacity(matches.len());
        for m in matches {
            let Ok(driver_id) = m.member.parse::<i64>() else {
                warn!(member = %m.member, "Skipping non-numeric geo member");
                continue;
            };
            let Some(meta) = self.geo.hash_get_all(&driver_meta_key(driver_id)).await? else {
                warn!(driver_id, "Geo entry without metadata hash, skipping");
                continue;
            };
            let Some(vehicle_type) = meta.get("vehicle_type").and_then(|v| VehicleType::parse(v))
            else {
                warn!(driver_id, "Driver metadata lacks a vehicle type, skipping");
                continue;
            };
            drivers.push(NearbyDriver {
                driver_id,
                distance_km: m.distance_km,
                vehicle_type,
                channel: meta.get("channel").cloned().unwrap_or_default(),
                channel_id: meta.get("channel_id").cloned().unwrap_or_default(),
                last_update: meta
                    .get("last_update")
                    .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
            });
        }
        Ok(drivers)
    }

    /// One price tier per vehicle type present among the nearest drivers.
    ///
    /// Each bucket uses its closest driver's approach distance; the trip
    /// component is the great-circle pickup→destination distance shared by
    /// all buckets.
    #[instrument(skip(self))]
    pub async fn quote(
        &self,
        pickup: (f64, f64),
        destination: (f64, f64),
        k: usize,
        max_radius_km: f64,
    ) -> Result<Vec<VehicleQuote>> {
        let (pickup_lon, pickup_lat) = pickup;
        let (dest_lon, dest_lat) = destination;
        let trip_distance_km = distance_km(pickup_lon, pickup_lat, dest_lon, dest_lat);

        let nearby = self.nearest(pickup_lon, pickup_lat, k, max_radius_km).await?;

        let mut quotes: Vec<VehicleQuote> = Vec::new();
        for driver in nearby {
            // Results arrive ascending by distance, so the first driver seen
            // for a type is that bucket's closest.
            if quotes.iter().any(|q| q.vehicle_type == driver.vehicle_type) {
                continue;
            }
            quotes.push(VehicleQuote {
                vehicle_type: driver.vehicle_type,
                driver_id: driver.driver_id,
                pickup_distance_km: driver.distance_km,
                trip_distance_km,
                price: self.pricing.price(
                    driver.vehicle_type,
                    driver.distance_km,
                    trip_distance_km,
                ),
            });
        }
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::store::InMemoryGeoStore;
    use parking_lot::Mutex;

    struct FakeMetadataSource {
        drivers: HashMap<i64, DriverMetadata>,
        calls: Mutex<Vec<i64>>,
    }

    impl FakeMetadataSource {
        fn new(drivers: HashMap<i64, DriverMetadata>) -> Self {
            Self {
                drivers,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DriverMetadataSource for FakeMetadataSource {
        async fn driver_metadata(&self, driver_id: i64) -> Result<Option<DriverMetadata>> {
            self.calls.lock().push(driver_id);
            Ok(self.drivers.get(&driver_id).cloned())
        }
    }

    fn meta(vehicle_type: VehicleType) -> DriverMetadata {
        DriverMetadata {
            channel: "TELEGRAM".to_string(),
            channel_id: "chan".to_string(),
            vehicle_type,
        }
    }

    fn index_with(
        drivers: HashMap<i64, DriverMetadata>,
    ) -> (DriverLocationIndex, Arc<FakeMetadataSource>) {
        let source = Arc::new(FakeMetadataSource::new(drivers));
        let index = DriverLocationIndex::new(Arc::new(InMemoryGeoStore::new()), source.clone());
        (index, source)
    }

    #[tokio::test]
    async fn test_upsert_seeds_metadata_exactly_once() {
        let (index, source) =
            index_with(HashMap::from([(7, meta(VehicleType::Comfort))]));

        index.upsert_location(7, 0.0, 0.0).await.unwrap();
        index.upsert_location(7, 0.1, 0.1).await.unwrap();
        index.upsert_location(7, 0.2, 0.2).await.unwrap();

        // Relational store consulted only for the first sighting.
        assert_eq!(source.calls.lock().as_slice(), &[7]);

        let nearby = index.nearest(0.2, 0.2, 5, 100.0).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert!(nearby[0].distance_km < 1e-9);
        assert_eq!(nearby[0].vehicle_type, VehicleType::Comfort);
        assert!(nearby[0].last_update.is_some());
    }

    #[tokio::test]
    async fn test_upsert_for_unknown_driver_fails() {
        let (index, _) = index_with(HashMap::new());
        let err = index.upsert_location(99, 0.0, 0.0).await.unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[tokio::test]
    async fn test_nearest_five_seeded_capped_at_three_sorted_and_bucketed() {
        let (index, _) = index_with(HashMap::from([
            (1, meta(VehicleType::Standard)),
            (2, meta(VehicleType::Comfort)),
            (3, meta(VehicleType::Van)),
            (4, meta(VehicleType::Standard)),
            (5, meta(VehicleType::Comfort)),
        ]));

        for (id, lat) in [(1, 0.001), (2, 0.002), (3, 0.003), (4, 0.004), (5, 0.005)] {
            index.upsert_location(id, 0.0, lat).await.unwrap();
        }

        let nearby = index.nearest(0.0, 0.0, 3, 10.0).await.unwrap();
        assert_eq!(nearby.len(), 3);
        let ids: Vec<i64> = nearby.iter().map(|d| d.driver_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(nearby.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert_eq!(nearby[0].vehicle_type, VehicleType::Standard);
        assert_eq!(nearby[1].vehicle_type, VehicleType::Comfort);
        assert_eq!(nearby[2].vehicle_type, VehicleType::Van);
    }

    #[tokio::test]
    async fn test_quote_one_tier_per_vehicle_type() {
        let (index, _) = index_with(HashMap::from([
            (1, meta(VehicleType::Standard)),
            (2, meta(VehicleType::Standard)),
            (3, meta(VehicleType::Van)),
        ]));

        index.upsert_location(1, 0.0, 0.001).await.unwrap();
        index.upsert_location(2, 0.0, 0.002).await.unwrap();
        index.upsert_location(3, 0.0, 0.003).await.unwrap();

        let quotes = index
            .quote((0.0, 0.0), (0.0, 0.1), 10, 50.0)
            .await
            .unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].vehicle_type, VehicleType::Standard);
        assert_eq!(quotes[0].driver_id, 1); // closest standard wins the bucket
        assert_eq!(quotes[1].vehicle_type, VehicleType::Van);
        assert!(quotes[1].price > quotes[0].price);
        assert!(quotes.iter().all(|q| (q.trip_distance_km - quotes[0].trip_distance_km).abs() < 1e-9));
    }
}
