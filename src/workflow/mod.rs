//! # Workflow Engine
//!
//! A step-pipeline execution engine: an ordered, named list of steps is run
//! against an [`ExecutionContext`], with dynamic forward/backward transfer via
//! named jump targets. Each step receives a deep, independent copy of the
//! current context, so a step's partial mutation or failure can never leak
//! into the context observed by the caller or by concurrent runs.
//!
//! ## Module Organization
//!
//! - [`context`] - The per-run data envelope threaded through steps
//! - [`step`] - The unit-of-work contract and closure adapter
//! - [`engine`] - The registry-driven execution loop
//! - [`nested`] - Sub-workflow composition as a single step

pub mod context;
pub mod engine;
pub mod nested;
pub mod step;

pub use context::ExecutionContext;
pub use engine::Workflow;
pub use nested::SubWorkflow;
pub use step::{FnStep, Step, StepOutput};
