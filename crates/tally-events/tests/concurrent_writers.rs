//! Concurrent writers sharing a key must never lose an increment.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use tally_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use tally_events::{query_server_events, save_event, Event};
use tally_identity::{OriginatorTranslator, TokenTable};
use tally_types::{DeviceType, EventType};

const WRITERS: u32 = 8;
const SAVES_PER_WRITER: u32 = 25;

fn file_pool(dir: &tempfile::TempDir) -> DbPool {
    let path = dir.path().join("events.db");
    let pool = create_pool(
        path.to_str().expect("utf-8 path"),
        DbRuntimeSettings {
            busy_timeout_ms: 10_000,
            pool_max_size: WRITERS,
        },
    )
    .expect("pool should build");
    {
        let conn = pool.get().expect("connection");
        run_migrations(&conn).expect("migrations");
    }
    pool
}

fn translator() -> OriginatorTranslator {
    OriginatorTranslator::new(Arc::new(TokenTable::from_pairs([("token-ontario", "ON")])))
}

#[test]
fn concurrent_saves_to_one_key_are_all_counted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir);
    let translator = translator();
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let pool = pool.clone();
            let translator = translator.clone();
            thread::spawn(move || {
                let conn = pool.get().expect("connection");
                for i in 0..SAVES_PER_WRITER {
                    let event = Event {
                        identifier: EventType::OtkDuplicateSignature,
                        device_type: DeviceType::Server,
                        date,
                        count: writer + i,
                        originator: "token-ontario".to_string(),
                    };
                    save_event(&conn, &translator, &event).expect("every save should succeed");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let expected: i64 = (0..WRITERS)
        .flat_map(|w| (0..SAVES_PER_WRITER).map(move |i| i64::from(w + i)))
        .sum();

    let conn = pool.get().expect("connection");
    let events = query_server_events(&conn, EventType::OtkDuplicateSignature, "2024-01-01", None)
        .expect("query should succeed");

    assert_eq!(events.len(), 1, "all writers share one row");
    assert_eq!(events[0].source, "ON");
    assert_eq!(events[0].count, expected);
}

#[test]
fn concurrent_readers_see_complete_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir);
    let translator = translator();

    {
        let conn = pool.get().expect("connection");
        for day in 1..=3 {
            let event = Event {
                identifier: EventType::OtkExpired,
                device_type: DeviceType::Server,
                date: NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date"),
                count: 10,
                originator: "token-ontario".to_string(),
            };
            save_event(&conn, &translator, &event).expect("seed save");
        }
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                let conn = pool.get().expect("connection");
                query_server_events(&conn, EventType::OtkExpired, "2024-01-01", Some("2024-01-03"))
                    .expect("query should succeed")
            })
        })
        .collect();

    for handle in handles {
        let events = handle.join().expect("reader thread panicked");
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.count == 10));
    }
}
