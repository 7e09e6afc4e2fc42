//! The `notify` module defines what admins are told and how it reaches them:
//! the event types, the wire envelope and the dispatcher behind `Notifier`.

pub mod dispatcher;
pub mod envelope;
pub mod event;

pub use dispatcher::{DispatchReport, Notifier, dispatch};
pub use envelope::Envelope;
pub use event::{EventType, GENERIC_MESSAGE};
