//! Workspace umbrella crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `mytax-workspace`, enable
//! `desktop-shims`, and reach the client façade without wiring each crate
//! individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{
    Amount, AuthClient, ClientConfig, ClientConfigBuilder, CoreError, DeviceId, IncomeItem,
    IncomeRequest, Profile, Receipt, Result, SubmitHandle,
};
