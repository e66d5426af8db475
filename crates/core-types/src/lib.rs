//! # Meridian Core Types
//!
//! The shared vocabulary of the workspace. Every other crate speaks in terms of
//! the rows, observations and period results defined here.

pub mod dataset;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use dataset::{Dataset, LabeledRow};
pub use error::CoreError;
pub use structs::{Observation, PeriodResult};
