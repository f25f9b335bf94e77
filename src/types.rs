//! Core type-safe wrappers shared across the crate

pub mod config;
pub mod validated;

pub use config::{Port, ThreadCount, duration_serde};
pub use validated::{HostName, ValidationError};
