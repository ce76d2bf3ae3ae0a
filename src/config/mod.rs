//! Configuration module
//!
//! Settings for grid behavior, viewport measurement, the HTTP transport and
//! logging, stored as TOML.

pub mod config;

pub use config::{BehaviorConfig, Config, LoggingConfig, TransportConfig, ViewportConfig};
