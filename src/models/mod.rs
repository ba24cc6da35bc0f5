//! # Data Models
//!
//! Row types and query methods for the relational side of the system.
//!
//! ## Module Organization
//!
//! - [`booking`] - Customer trip requests and their assignment lifecycle
//! - [`driver`] - The driver pool notified on dispatch
//! - [`notification`] - Per-driver fanout records with external correlation tokens
//!
//! All SQL uses the runtime `sqlx::query_as` form; queries that participate in
//! the concurrency-sensitive dispatch path (skip-locked batches, no-wait
//! assignment) live behind the [`crate::dispatch::DispatchStore`] contract
//! instead, so they can be faked in tests.

pub mod booking;
pub mod driver;
pub mod notification;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use driver::{Driver, NewDriver, VehicleType};
pub use notification::{Notification, ReplyStatus};
