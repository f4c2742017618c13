//! # Core Module
//!
//! Ambient pieces shared by every subsystem: the crate error type and the
//! serde-backed engine configuration.

pub mod config;
pub mod error;

pub use config::{EngineConfig, SchedulerConfig, WaterConfig, WorldConfig};
pub use error::{Error, Result};
