//! # Pricing
//!
//! Per-vehicle-type tariffs and the trip price formula:
//!
//! `price = base_fee(vehicle_type, pickup_distance) + trip_km × coefficient(vehicle_type) × price_per_km`
//!
//! where `trip_km` is the great-circle distance between pickup and
//! destination. Buckets are computed independently per vehicle type so a
//! caller can present one price tier per type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::VehicleType;

/// Tariff parameters for one vehicle type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTariff {
    /// Fixed per-type multiplier applied to the distance component
    pub coefficient: f64,
    /// Flat pickup fee
    pub base_flat: f64,
    /// Approach component charged per kilometer between driver and pickup
    pub base_per_km: f64,
}

/// The fixed per-vehicle-type tariff table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTable {
    pub price_per_km: f64,
    pub tariffs: HashMap<VehicleType, VehicleTariff>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let tariffs = HashMap::from([
            (
                VehicleType::Standard,
                VehicleTariff {
                    coefficient: 1.0,
                    base_flat: 2.0,
                    base_per_km: 0.3,
                },
            ),
            (
                VehicleType::Comfort,
                VehicleTariff {
                    coefficient: 1.35,
                    base_flat: 3.0,
                    base_per_km: 0.4,
                },
            ),
            (
                VehicleType::Van,
                VehicleTariff {
                    coefficient: 1.8,
                    base_flat: 4.5,
                    base_per_km: 0.5,
                },
            ),
        ]);
        Self {
            price_per_km: 1.2,
            tariffs,
        }
    }
}

impl PricingTable {
    /// Table with an overridden per-kilometer tariff (from configuration).
    pub fn with_price_per_km(price_per_km: f64) -> Self {
        Self {
            price_per_km,
            ..Self::default()
        }
    }

    pub fn coefficient(&self, vehicle_type: VehicleType) -> f64 {
        self.tariffs
            .get(&vehicle_type)
            .map(|t| t.coefficient)
            .unwrap_or(1.0)
    }

    /// Pickup fee: flat per-type component plus the approach distance share.
    pub fn base_fee(&self, vehicle_type: VehicleType, pickup_distance_km: f64) -> f64 {
        match self.tariffs.get(&vehicle_type) {
            Some(t) => t.base_flat + t.base_per_km * pickup_distance_km,
            None => 0.0,
        }
    }

    /// Estimated trip price for one vehicle type.
    pub fn price(
        &self,
        vehicle_type: VehicleType,
        pickup_distance_km: f64,
        trip_distance_km: f64,
    ) -> f64 {
        self.base_fee(vehicle_type, pickup_distance_km)
            + trip_distance_km * self.coefficient(vehicle_type) * self.price_per_km
    }
}
