//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the client core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other core crates
//! depend on. It establishes the logging conventions and the validated
//! configuration every remote call reads its endpoints, headers and
//! timeouts from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ClientConfig, ClientConfigBuilder, DeviceInfoConfig, RefererConfig};
pub use error::{Error, Result};
