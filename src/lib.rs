#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Rideflow Core
//!
//! Core engine of a taxi-booking chat system: a step-pipeline workflow
//! engine driving the conversational booking assistant, and a
//! concurrency-safe dispatch subsystem that fans a confirmed booking out to
//! drivers and assigns it to the first acceptor.
//!
//! ## Architecture
//!
//! A booking moves through three planes:
//!
//! 1. **Conversation** ([`workflow`], [`agent`], [`llm`]) - each user turn
//!    runs a pipeline that extracts booking fields from model output and
//!    loops on follow-up questions until the user confirms.
//! 2. **Dispatch** ([`dispatch`], [`models`], [`messaging`]) - a confirmed
//!    booking is fanned out to the active driver pool in skip-locked batches;
//!    the first driver to accept wins the booking under a no-wait row lock,
//!    all later acceptors see a harmless already-taken outcome.
//! 3. **Geo** ([`geo`]) - driver positions are continuously upserted into a
//!    spatial index that answers nearest-driver queries with per-vehicle-type
//!    price quotes.
//!
//! ## Module Organization
//!
//! - [`workflow`] - Step-pipeline engine with named jump targets and per-step context isolation
//! - [`agent`] - Booking-assistant steps and wiring (exercises the engine)
//! - [`llm`] - Model client contract and the three-tier output parser
//! - [`models`] - Relational row types and query methods
//! - [`dispatch`] - Skip-locked fanout and first-acceptor-wins assignment
//! - [`geo`] - Driver location index and pricing
//! - [`messaging`] - Job-queue and message-sender contracts
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rideflow_core::agent::booking_assistant_workflow;
//! use rideflow_core::llm::LlmClient;
//! use rideflow_core::workflow::ExecutionContext;
//! use serde_json::json;
//!
//! # async fn example(llm: Arc<dyn LlmClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let assistant = booking_assistant_workflow(llm)?;
//!
//! let mut ctx = ExecutionContext::with_session("chat-42")
//!     .with_input(json!("I need a taxi to the airport"));
//! ctx.set_storage("prompt", json!("..."));
//!
//! let result = assistant.run(ctx).await?;
//! println!("assistant action: {}", result.output);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod llm;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod workflow;

pub use config::RideflowConfig;
pub use error::{Result, RideflowError, WorkflowError};
pub use workflow::{ExecutionContext, Step, StepOutput, SubWorkflow, Workflow};
