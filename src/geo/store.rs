//! # Geo Store Contract
//!
//! The external keyed store holding driver positions (geo sets) and driver
//! metadata (hashes). Production deployments back this with a geo-capable
//! keyed store; [`InMemoryGeoStore`] provides the same semantics in-process
//! for tests and single-node use.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::distance_km;
use crate::error::Result;

/// One member returned by a nearest query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    pub member: String,
    pub distance_km: f64,
    pub lon: f64,
    pub lat: f64,
}

/// Keyed geo-set and hash operations.
#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Insert or move `member` within the geo set at `key`.
    async fn geo_upsert(&self, key: &str, member: &str, lon: f64, lat: f64) -> Result<()>;

    /// Up to `k` members of the geo set at `key` within `radius_km` of the
    /// query point, ascending by distance.
    async fn geo_nearest(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius_km: f64,
        k: usize,
    ) -> Result<Vec<GeoMatch>>;

    /// Merge `fields` into the hash at `key` (existing fields not named are
    /// preserved).
    async fn hash_upsert(&self, key: &str, fields: HashMap<String, String>) -> Result<()>;

    /// All fields of the hash at `key`, or `None` if the hash does not exist.
    async fn hash_get_all(&self, key: &str) -> Result<Option<HashMap<String, String>>>;
}

/// Concurrent in-memory geo store.
#[derive(Debug, Default)]
pub struct InMemoryGeoStore {
    geo_sets: DashMap<String, HashMap<String, (f64, f64)>>,
    hashes: DashMap<String, HashMap<String, String>>,
}

impl InMemoryGeoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GeoStore for InMemoryGeoStore {
    async fn geo_upsert(&self, key: &str, member: &str, lon: f64, lat: f64) -> Result<()> {
        self.geo_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), (lon, lat));
        Ok(())
    }

    async fn geo_nearest(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius_km: f64,
        k: usize,
    ) -> Result<Vec<GeoMatch>> {
        let Some(set) = self.geo_sets.get(key) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<GeoMatch> = set
            .iter()
            .filter_map(|(member, &(m_lon, m_lat))| {
                let d = distance_km(lon, lat, m_lon, m_lat);
                (d <= radius_km).then(|| GeoMatch {
                    member: member.clone(),
                    distance_km: d,
                    lon: m_lon,
                    lat: m_lat,
                })
            })
            .collect();
        matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        matches.truncate(k);
        Ok(matches)
    }

    async fn hash_upsert(&self, key: &str, fields: HashMap<String, String>) -> Result<()> {
        self.hashes.entry(key.to_string()).or_default().extend(fields);
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        Ok(self.hashes.get(key).map(|h| h.clone()))
    }
}
