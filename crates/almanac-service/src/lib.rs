//! Scheduling services: the series mutation protocol, the event query
//! assembler, notifications and reminders.

pub mod error;
pub mod notify;
pub mod reminder;
pub mod schedule;
