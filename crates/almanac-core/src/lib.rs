//! Shared configuration, constants, errors and identity types for Almanac.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
