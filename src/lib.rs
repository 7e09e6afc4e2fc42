//! # LearnHub Notify
//!
//! `learnhub_notify` is the real-time layer of the LearnHub tutoring site. It keeps
//! track of which admins currently have a live WebSocket open and pushes typed
//! notifications to exactly those admins whenever a booking, contact, announcement,
//! tutor or subject changes.
//!
//! ## Core Modules
//!
//! - `registry`: tracks every open connection and the single live connection per admin.
//! - `notify`: event types, the notification envelope and the best-effort dispatcher.
//! - `transport`: the WebSocket server that feeds connection events into the registry.
//! - `agent`: the admin-side agent that connects, announces its identity, reacts to
//!   notifications and reconnects after loss.
//! - `persistence`: local credential storage used by the agent.
//! - `config`: layered configuration.
//! - `utils`: error types and logging.
//!
//! Request handlers that mutate data only ever touch one function:
//!
//! ```no_run
//! use learnhub_notify::notify::{EventType, Notifier};
//! use learnhub_notify::registry::{BindPolicy, ConnectionRegistry};
//!
//! let registry = ConnectionRegistry::shared(BindPolicy::Rebind);
//! let notifier = Notifier::new(registry.clone());
//! notifier.notify(EventType::Booking);
//! ```

pub mod agent;
pub mod config;
pub mod notify;
pub mod persistence;
pub mod registry;
pub mod transport;
pub mod utils;
