//! Persistence for series, exceptions, standalone events and notifications.

pub mod db;
pub mod error;
pub mod model;
