#![forbid(unsafe_code)]

//! Core domain model and calculations for the Mate caffeine tracker.
//!
//! This crate provides:
//! - Domain types (consumption events, threshold states, summaries)
//! - The intake ledger and its decay calculations
//! - Configuration loading
//! - Logging setup shared by the binaries

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod calendar;
pub mod decay;
pub mod ledger;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, IntakeConfig};
pub use calendar::day_start;
pub use decay::remaining_dose;
pub use ledger::Ledger;
