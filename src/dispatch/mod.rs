//! # Booking Dispatch
//!
//! Fans a new booking out to the active driver pool and binds exactly one
//! accepting driver to it, even under concurrent acceptance attempts.
//!
//! Mutual exclusion is delegated entirely to the backing relational store,
//! with no in-process locks, so correctness holds across multiple concurrently
//! running service instances:
//!
//! - batch driver enumeration uses `FOR UPDATE SKIP LOCKED`, so concurrent
//!   dispatch runs never block each other on overlapping driver rows;
//! - acceptance uses `FOR UPDATE ... NOWAIT`, so a contended booking degrades
//!   to an immediate no-op instead of a blocked transaction.
//!
//! ## Module Organization
//!
//! - [`store`] - The narrow persistence contract and its Postgres implementation
//! - [`coordinator`] - Batch fanout of notifications for a booking
//! - [`assignment`] - The race-free "first acceptor wins" transition

pub mod assignment;
pub mod coordinator;
pub mod store;

pub use assignment::{AssignmentOutcome, AssignmentService};
pub use coordinator::{DispatchCoordinator, DispatchSummary};
pub use store::{DispatchStore, PgDispatchStore};
