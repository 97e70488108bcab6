//! Event lookup provider contracts and implementations.
//!
//! # Responsibility
//! - Resolve event ids into short-form projections for compilation views.
//! - Answer existence checks for write-time referential validation.
//!
//! # Invariants
//! - `resolve_many` issues one query per `RESOLVE_CHUNK_SIZE` ids, never one
//!   per id, and stays under SQLite's bound-parameter limit.
//! - Ids missing from the returned map are treated as non-existent.
//! - Lookups never write.

use crate::db::DbError;
use crate::model::event::{CategoryRef, EventId, EventShort, UserShort};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ids bound per `IN (...)` query in `SqliteEventLookup::resolve_many`.
pub const RESOLVE_CHUNK_SIZE: usize = 500;

pub type LookupResult<T> = Result<T, LookupError>;

/// Failure while reading the event catalog.
#[derive(Debug)]
pub enum LookupError {
    Db(DbError),
    /// A catalog row cannot be turned into a projection.
    InvalidData(String),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid event catalog row: {message}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for LookupError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-only view of the event catalog.
pub trait EventLookup {
    /// Resolves every id in `ids` that currently exists.
    fn resolve_many(&self, ids: &BTreeSet<EventId>) -> LookupResult<BTreeMap<EventId, EventShort>>;

    /// Returns whether `id` currently exists.
    fn exists(&self, id: EventId) -> LookupResult<bool> {
        let ids = BTreeSet::from([id]);
        Ok(self.resolve_many(&ids)?.contains_key(&id))
    }
}

impl<L: EventLookup + ?Sized> EventLookup for &L {
    fn resolve_many(&self, ids: &BTreeSet<EventId>) -> LookupResult<BTreeMap<EventId, EventShort>> {
        (**self).resolve_many(ids)
    }

    fn exists(&self, id: EventId) -> LookupResult<bool> {
        (**self).exists(id)
    }
}

const EVENT_SHORT_SELECT_SQL: &str = "SELECT
    e.id,
    e.title,
    e.annotation,
    e.event_date,
    e.paid,
    e.confirmed_requests,
    e.views,
    c.id AS category_id,
    c.name AS category_name,
    u.id AS initiator_id,
    u.name AS initiator_name
FROM events e
INNER JOIN categories c ON c.id = e.category_id
INNER JOIN users u ON u.id = e.initiator_id";

/// Event lookup over the catalog tables of the same SQLite database.
pub struct SqliteEventLookup<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventLookup<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventLookup for SqliteEventLookup<'_> {
    fn resolve_many(&self, ids: &BTreeSet<EventId>) -> LookupResult<BTreeMap<EventId, EventShort>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let ids: Vec<EventId> = ids.iter().copied().collect();
        let mut resolved = BTreeMap::new();
        for chunk in ids.chunks(RESOLVE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("{EVENT_SHORT_SELECT_SQL} WHERE e.id IN ({placeholders});");
            let bind_values = chunk.iter().map(|id| Value::Integer(*id));

            let mut stmt = self.conn.prepare_cached(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            while let Some(row) = rows.next()? {
                let event = parse_event_short_row(row)?;
                resolved.insert(event.id, event);
            }
        }

        Ok(resolved)
    }

    fn exists(&self, id: EventId) -> LookupResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_event_short_row(row: &Row<'_>) -> LookupResult<EventShort> {
    let id: EventId = row.get("id")?;
    let paid = match row.get::<_, i64>("paid")? {
        0 => false,
        1 => true,
        other => {
            return Err(LookupError::InvalidData(format!(
                "invalid paid value `{other}` for event {id}"
            )));
        }
    };

    Ok(EventShort {
        id,
        title: row.get("title")?,
        annotation: row.get("annotation")?,
        category: CategoryRef {
            id: row.get("category_id")?,
            name: row.get("category_name")?,
        },
        initiator: UserShort {
            id: row.get("initiator_id")?,
            name: row.get("initiator_name")?,
        },
        event_date: row.get("event_date")?,
        paid,
        confirmed_requests: row.get("confirmed_requests")?,
        views: row.get("views")?,
    })
}

/// Map-backed event lookup for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLookup {
    events: BTreeMap<EventId, EventShort>,
}

impl InMemoryEventLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one event projection.
    pub fn insert(&mut self, event: EventShort) {
        self.events.insert(event.id, event);
    }

    /// Removes one event, as an out-of-band deletion would.
    pub fn remove(&mut self, id: EventId) -> Option<EventShort> {
        self.events.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<EventShort> for InMemoryEventLookup {
    fn from_iter<I: IntoIterator<Item = EventShort>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().map(|event| (event.id, event)).collect(),
        }
    }
}

impl EventLookup for InMemoryEventLookup {
    fn resolve_many(&self, ids: &BTreeSet<EventId>) -> LookupResult<BTreeMap<EventId, EventShort>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.events.get(id).map(|event| (*id, event.clone())))
            .collect())
    }

    fn exists(&self, id: EventId) -> LookupResult<bool> {
        Ok(self.events.contains_key(&id))
    }
}
