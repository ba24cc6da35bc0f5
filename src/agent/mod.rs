//! # Booking Assistant
//!
//! The conversational booking flow expressed as workflow pipelines: extract
//! booking fields from each user turn, loop on follow-up questions until the
//! user confirms, then hand off to dispatch.
//!
//! ## Module Organization
//!
//! - [`steps`] - Individual pipeline steps with injected collaborators
//! - [`workflows`] - Wiring of steps into the assistant's pipelines

pub mod steps;
pub mod workflows;

pub use steps::{ALLOWED_STATE_FIELDS, FOLLOW_UP_STEP, REQUIRED_BOOKING_FIELDS};
pub use workflows::{booking_assistant_workflow, follow_up_workflow, update_state_workflow};
