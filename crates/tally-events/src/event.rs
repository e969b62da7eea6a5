//! Event input types and the read-path projection.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tally_types::{DeviceType, EventType};

use crate::error::EventsError;

/// Format of every calendar day stored or accepted by the event store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated event, ready to be counted.
///
/// Built per call and dropped once persisted. `originator` is the caller's
/// raw bearer token; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub identifier: EventType,
    /// Which component reported it.
    pub device_type: DeviceType,
    /// The day it happened on.
    pub date: NaiveDate,
    /// How many times it happened.
    pub count: u32,
    /// The raw bearer token of the caller that reported it.
    pub originator: String,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("identifier", &self.identifier)
            .field("device_type", &self.device_type)
            .field("date", &self.date)
            .field("count", &self.count)
            .field("originator", &"<redacted>")
            .finish()
    }
}

/// An event exactly as received from an untrusted caller.
///
/// Convert with [`RawEvent::validate`] before saving. `Debug` redacts the
/// originator.
#[derive(Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Event type label.
    pub identifier: String,
    /// Device type label.
    pub device_type: String,
    /// Day as `YYYY-MM-DD`.
    pub date: String,
    /// Occurrence count.
    pub count: i64,
    /// The raw bearer token of the caller that reported it.
    pub originator: String,
}

impl RawEvent {
    /// Checks every field and builds the typed [`Event`].
    ///
    /// The device type is checked first, then the event type, the date and
    /// the count. No I/O is performed.
    ///
    /// # Errors
    ///
    /// Returns `EventsError::InvalidEnum` for a label outside its closed
    /// set, `EventsError::InvalidDate` for a malformed day and
    /// `EventsError::InvalidCount` for a negative or oversized count.
    pub fn validate(&self) -> Result<Event, EventsError> {
        let device_type: DeviceType = self.device_type.parse()?;
        let identifier: EventType = self.identifier.parse()?;
        let date = parse_date("date", &self.date)?;
        let count = u32::try_from(self.count).map_err(|_| EventsError::InvalidCount(self.count))?;

        Ok(Event {
            identifier,
            device_type,
            date,
            count,
            originator: self.originator.clone(),
        })
    }
}

impl std::fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawEvent")
            .field("identifier", &self.identifier)
            .field("device_type", &self.device_type)
            .field("date", &self.date)
            .field("count", &self.count)
            .field("originator", &"<redacted>")
            .finish()
    }
}

/// One stored row matched by a server-event query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// The translated originator the row is counted under.
    pub source: String,
    /// The row's day as `YYYY-MM-DD`.
    pub date: String,
    /// The running total for the row.
    pub count: i64,
}

/// Parses a `YYYY-MM-DD` day, naming `field` in the error.
///
/// Only the zero-padded ten-character form with a year in `0001..=9999` is
/// accepted, so stored text sorts in calendar order.
pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, EventsError> {
    let invalid = || EventsError::InvalidDate {
        field,
        value: value.to_string(),
    };

    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())?;
    if !(1..=9999).contains(&date.year()) {
        return Err(invalid());
    }
    Ok(date)
}
