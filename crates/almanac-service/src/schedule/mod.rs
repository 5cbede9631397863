//! Recurring-event scheduling: planning, storage and listing.

pub mod assemble;
pub mod pg;
pub mod protocol;
pub mod request;
pub mod service;
pub mod store;
pub mod view;

pub use assemble::EventQueryAssembler;
pub use pg::PgScheduleStore;
pub use protocol::{Target, WriteOp, WritePlan};
pub use request::{DeleteScope, EventPatch, NewEvent, OccurrenceScope, RecurrenceInput, SeriesPatch};
pub use service::ScheduleService;
pub use store::{ReminderCandidates, ScheduleStore, StoreFuture, WindowSnapshot};
pub use view::EventView;
