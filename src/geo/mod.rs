//! # Geo Driver Index & Pricing
//!
//! Maintains each active driver's last known position and answers
//! nearest-driver queries annotated with an estimated price per vehicle
//! type. The index tolerates eventual consistency: location upserts race
//! freely with nearest queries, and staleness is bounded only by the
//! `last_update` timestamp consumers may filter on.
//!
//! ## Module Organization
//!
//! - [`store`] - The external keyed geo/hash store contract and its in-memory implementation
//! - [`index`] - Location upserts with metadata seeding, nearest queries, quotes
//! - [`pricing`] - Per-vehicle-type tariff table and the price formula

pub mod index;
pub mod pricing;
pub mod store;

pub use index::{
    DriverLocationIndex, DriverMetadata, DriverMetadataSource, NearbyDriver, PgDriverMetadataSource,
    VehicleQuote,
};
pub use pricing::PricingTable;
pub use store::{GeoMatch, GeoStore, InMemoryGeoStore};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance between two `(lon, lat)` points, in
/// kilometers.
pub fn distance_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
