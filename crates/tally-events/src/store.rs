//! Persistence operations for aggregated event counts.
//!
//! Writes go through [`save_event`], which adds an event's count to its
//! `(source, identifier, device_type, date)` row in a single upsert
//! statement inside an immediate transaction.
//!
//! Reads go through [`query_server_events`], which reports rows for one
//! event type raised by the server on a day or an inclusive day range.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use tally_identity::OriginatorTranslator;
use tally_types::{DeviceType, EventType};

use crate::error::EventsError;
use crate::event::{parse_date, Event, EventSummary, RawEvent, DATE_FORMAT};

/// Inserts the row, or adds to its count if the key already exists. SQLite
/// resolves the conflict inside the statement, so concurrent writers never
/// lose an increment.
const UPSERT_SQL: &str = "INSERT INTO events (source, identifier, device_type, date, count)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (source, identifier, device_type, date)
     DO UPDATE SET count = count + excluded.count";

/// Adds an event's count to its aggregated row.
///
/// The originator is translated to its storage id first; the raw token is
/// only ever written when the token has no region. No retries are made:
/// store errors reach the caller as they are.
///
/// # Errors
///
/// Returns `EventsError::Database` if the transaction cannot begin, the
/// upsert fails (after a successful rollback) or the commit fails, and
/// `EventsError::RollbackFailed` if both the upsert and its rollback fail.
pub fn save_event(
    conn: &Connection,
    translator: &OriginatorTranslator,
    event: &Event,
) -> Result<(), EventsError> {
    let source = translator.storage_id(&event.originator);
    let date = event.date.format(DATE_FORMAT).to_string();

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let upserted = tx.execute(
        UPSERT_SQL,
        params![
            source,
            event.identifier.as_str(),
            event.device_type.as_str(),
            date,
            event.count,
        ],
    );

    if let Err(upsert) = upserted {
        return Err(match tx.rollback() {
            Ok(()) => EventsError::Database(upsert),
            Err(rollback) => EventsError::RollbackFailed {
                source: upsert,
                rollback,
            },
        });
    }

    tx.commit()?;

    tracing::debug!(
        identifier = event.identifier.as_str(),
        device_type = event.device_type.as_str(),
        date = %date,
        count = event.count,
        "recorded event"
    );

    Ok(())
}

/// Validates an untrusted event and saves it.
///
/// Invalid input is rejected before the connection is used, so it never
/// creates or changes a row.
///
/// # Errors
///
/// Returns the validation errors of [`RawEvent::validate`] or the store
/// errors of [`save_event`].
pub fn save_raw_event(
    conn: &Connection,
    translator: &OriginatorTranslator,
    raw: &RawEvent,
) -> Result<(), EventsError> {
    let event = raw.validate()?;
    save_event(conn, translator, &event)
}

/// Days matched by a query.
#[derive(Debug, Clone, Copy)]
enum DateSpan {
    Day(NaiveDate),
    Between(NaiveDate, NaiveDate),
}

impl DateSpan {
    fn parse(start_date: &str, end_date: Option<&str>) -> Result<Self, EventsError> {
        if start_date.is_empty() {
            return Err(EventsError::MissingParameter("start_date"));
        }
        let start = parse_date("start_date", start_date)?;

        match end_date.filter(|end| !end.is_empty()) {
            Some(end) => Ok(Self::Between(start, parse_date("end_date", end)?)),
            None => Ok(Self::Day(start)),
        }
    }
}

/// Returns the stored counts of `event_type` raised by the server.
///
/// With no `end_date` (or an empty one) only rows dated `start_date` match;
/// otherwise rows dated between `start_date` and `end_date`, both inclusive.
/// Results are ordered by date then source. When nothing matches the result
/// is an empty `Vec`.
///
/// # Errors
///
/// Returns `EventsError::MissingParameter` if `start_date` is empty and
/// `EventsError::InvalidDate` if either bound is not `YYYY-MM-DD`, both
/// before any query runs. Returns `EventsError::Database` if the query or
/// reading any row fails; partial results are discarded.
pub fn query_server_events(
    conn: &Connection,
    event_type: EventType,
    start_date: &str,
    end_date: Option<&str>,
) -> Result<Vec<EventSummary>, EventsError> {
    let span = DateSpan::parse(start_date, end_date)?;
    query_by_device(conn, event_type, DeviceType::Server, span)
}

fn query_by_device(
    conn: &Connection,
    event_type: EventType,
    device_type: DeviceType,
    span: DateSpan,
) -> Result<Vec<EventSummary>, EventsError> {
    let (date_clause, start, end) = match span {
        DateSpan::Day(day) => ("date = ?3", day, None),
        DateSpan::Between(start, end) => ("date BETWEEN ?3 AND ?4", start, Some(end)),
    };

    let sql = format!(
        "SELECT source, date, count
         FROM events
         WHERE identifier = ?1 AND device_type = ?2 AND {date_clause}
         ORDER BY date ASC, source ASC"
    );

    let start = start.format(DATE_FORMAT).to_string();
    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<EventSummary> {
        Ok(EventSummary {
            source: row.get(0)?,
            date: row.get(1)?,
            count: row.get(2)?,
        })
    };

    let rows = match end {
        Some(end) => stmt.query_map(
            params![
                event_type.as_str(),
                device_type.as_str(),
                start,
                end.format(DATE_FORMAT).to_string(),
            ],
            map_row,
        )?,
        None => stmt.query_map(
            params![event_type.as_str(), device_type.as_str(), start],
            map_row,
        )?,
    };

    let events = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}
