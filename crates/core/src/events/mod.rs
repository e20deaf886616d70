//! Domain events emitted after state changes, and the sinks that receive them.

mod domain_event;
mod event_sink;

pub use domain_event::*;
pub use event_sink::*;
