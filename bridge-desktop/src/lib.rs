//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (HTTP/1.1, rustls, configurable connect timeout)
//!
//! The clock and logger sink defaults live in `bridge-traits` itself
//! (`SystemClock`, `ConsoleLogger`) because they need nothing platform specific.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::with_connect_timeout(Duration::from_secs(4))?;
//! ```

mod http;

pub use http::{ReqwestHttpClient, DEFAULT_CONNECT_TIMEOUT};
