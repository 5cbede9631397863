//! Almanac HTTP server: routes, middleware and wiring.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod service_handler;
