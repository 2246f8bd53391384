//! HTTP server for the single-elimination bracket engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
