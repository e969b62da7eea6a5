//! Anonymized event aggregation for the key exchange service.
//!
//! The service reports operational events (mostly failures) tagged with the
//! caller's bearer token. This crate counts them per
//! `(originator, event type, device type, day)` and answers range queries
//! over the counts of server-originated events.
//!
//! # Write path
//!
//! [`save_event`] translates the originator to its storage id through an
//! [`OriginatorTranslator`](tally_identity::OriginatorTranslator) and adds
//! the event's count to its row with a single
//! `INSERT ... ON CONFLICT DO UPDATE` statement. Concurrent writers sharing
//! a key never race on a read-modify-write pair; the store resolves each
//! conflict atomically. Untrusted input goes through [`save_raw_event`],
//! which rejects unknown tags before touching the connection.
//!
//! # Read path
//!
//! [`query_server_events`] returns one [`EventSummary`] per stored row for
//! an event type reported by [`DeviceType::Server`](tally_types::DeviceType),
//! on a single day or over an inclusive date range.
//!
//! # Failure diagnostics
//!
//! When an event cannot be recorded, [`log_failed_event`] emits a warning
//! carrying the originator's display form, never its raw token.
//!
//! ```rust,ignore
//! use tally_events::{log_failed_event, save_event, Event};
//!
//! if let Err(e) = save_event(&conn, &translator, &event) {
//!     log_failed_event(&translator, &e, &event);
//! }
//! ```

mod diagnostics;
mod error;
mod event;
mod store;

pub use diagnostics::{log_failed_event, log_failed_raw_event};
pub use error::EventsError;
pub use event::{Event, EventSummary, RawEvent, DATE_FORMAT};
pub use store::{query_server_events, save_event, save_raw_event};
