//! Recurrence engine: rule evaluation, occurrence expansion, exception overlay
//! and event handles.
//!
//! Everything in this crate is pure and synchronous. Dates are naive local
//! calendar dates; no timezone math happens here.

pub mod error;
pub mod exception;
pub mod expand;
pub mod handle;
pub mod rule;

pub use error::{RecurError, RecurResult};
pub use exception::{CalendarDay, ExceptionOverlay};
pub use expand::{DateWindow, Occurrence, Occurrences, SeriesRule, expand};
pub use handle::EventHandle;
pub use rule::{Frequency, RecurrenceRule, next_occurrence};
