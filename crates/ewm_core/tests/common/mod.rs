#![allow(dead_code)]

use rusqlite::{params, Connection};

/// Seeds three categories, one user and five events with ids 1..=5.
pub fn seed_catalog(conn: &Connection) {
    for name in ["travel", "sport", "party"] {
        conn.execute("INSERT INTO categories (name) VALUES (?1);", [name])
            .unwrap();
    }
    conn.execute(
        "INSERT INTO users (name, email) VALUES ('John', 'my@mail.com');",
        [],
    )
    .unwrap();

    let events = [
        ("title", 1),
        ("another title", 1),
        ("another one", 2),
        ("another title one", 2),
        ("the last one", 3),
    ];
    for (title, category_id) in events {
        conn.execute(
            "INSERT INTO events (title, annotation, category_id, initiator_id, event_date, paid)
             VALUES (?1, 'annotation', ?2, 1, '2030-01-01 10:00:00', 1);",
            params![title, category_id],
        )
        .unwrap();
    }
}

/// Seeds the catalog of `seed_catalog`, then bulk events `6..=last_id`.
pub fn seed_events_through(conn: &Connection, last_id: i64) {
    assert!(last_id > 5, "bulk events start after the base catalog");
    seed_catalog(conn);
    conn.execute(
        "WITH RECURSIVE seq(n) AS (
            SELECT 6
            UNION ALL
            SELECT n + 1 FROM seq WHERE n < ?1
         )
         INSERT INTO events (id, title, annotation, category_id, initiator_id, event_date, paid)
         SELECT n, 'bulk ' || n, 'annotation', 1, 1, '2030-01-01 10:00:00', 0 FROM seq;",
        [last_id],
    )
    .unwrap();
}

/// Deletes an event behind the compilation core's back.
pub fn delete_event(conn: &Connection, event_id: i64) {
    conn.execute("DELETE FROM events WHERE id = ?1;", [event_id])
        .unwrap();
}

pub fn membership_rows(conn: &Connection, compilation_id: i64) -> Vec<i64> {
    let mut stmt = conn
        .prepare(
            "SELECT event_id FROM compilation_events
             WHERE compilation_id = ?1
             ORDER BY event_id;",
        )
        .unwrap();
    let rows = stmt
        .query_map([compilation_id], |row| row.get(0))
        .unwrap();
    rows.map(|row| row.unwrap()).collect()
}
