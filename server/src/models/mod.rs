pub mod event;

pub use event::{Event, EventDefaults, EventId, NewEvent, ValidatedEvent};
