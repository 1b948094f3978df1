//! # Nutrilens Layers
//!
//! Built-in layers wrapping an inference provider.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs each inference call with timing and token usage
//! - `TimeoutLayer`: Bounds a single inference call with a deadline
//!
//! Neither layer retries; a failed call surfaces to the caller as-is.
//!
//! ## Usage
//!
//! ```ignore
//! use nutrilens_core::Analyzer;
//! use nutrilens_layer::{LoggingLayer, TimeoutLayer};
//! use std::time::Duration;
//!
//! let analyzer = Analyzer::builder(provider)
//!     .layer(TimeoutLayer::new(Duration::from_secs(60)))
//!     .layer(LoggingLayer::new())
//!     .model("gemini-3-pro-preview")
//!     .finish()?;
//! ```

pub mod logging;
pub mod timeout;

// Re-exports
pub use logging::LoggingLayer;
pub use timeout::TimeoutLayer;
