//! Diagnostic warnings for events that could not be recorded.
//!
//! These helpers never fail and never see a raw token in their output: the
//! originator is always rendered through
//! [`OriginatorTranslator::display`]. They log inside whatever `tracing`
//! span the caller is in, so request context is attached automatically.

use tally_identity::OriginatorTranslator;

use crate::event::{Event, RawEvent, DATE_FORMAT};

/// Stands in for the originator when the token is empty.
const EMPTY_ORIGINATOR: &str = "<empty>";

fn display_originator(translator: &OriginatorTranslator, token: &str) -> String {
    translator
        .display(token)
        .unwrap_or_else(|_| EMPTY_ORIGINATOR.to_string())
}

/// Logs a warning for a validated event that could not be saved.
///
/// `err` is whatever stopped the save: an [`EventsError`](crate::EventsError)
/// or a failure of the surrounding system, such as acquiring a pooled
/// connection.
pub fn log_failed_event(
    translator: &OriginatorTranslator,
    err: &dyn std::error::Error,
    event: &Event,
) {
    tracing::warn!(
        originator = %display_originator(translator, &event.originator),
        device_type = event.device_type.as_str(),
        identifier = event.identifier.as_str(),
        date = %event.date.format(DATE_FORMAT),
        count = event.count,
        error = %err,
        "unable to record event"
    );
}

/// Logs a warning for an untrusted event that failed validation or could
/// not be saved. Fields are logged as received.
pub fn log_failed_raw_event(
    translator: &OriginatorTranslator,
    err: &dyn std::error::Error,
    raw: &RawEvent,
) {
    tracing::warn!(
        originator = %display_originator(translator, &raw.originator),
        device_type = %raw.device_type,
        identifier = %raw.identifier,
        date = %raw.date,
        count = raw.count,
        error = %err,
        "unable to record event"
    );
}
