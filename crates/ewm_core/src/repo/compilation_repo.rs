//! Compilation store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist compilation rows and their `(compilation_id, event_id)` edges.
//! - Own membership replacement with all-or-nothing semantics.
//!
//! # Invariants
//! - Every write runs in one `IMMEDIATE` transaction; writers serialize and a
//!   failed write leaves no trace.
//! - Reads fetch a record and its edges with one statement, so a concurrent
//!   reader sees a membership set either before or after a commit, in full.
//! - `(compilation_id, event_id)` is unique; edges are removed with their
//!   compilation and never point back from events.
//! - An edge is only written while its event row exists, checked inside the
//!   same transaction as the write.
//! - Listing order is `id ASC`.

use crate::db::DbError;
use crate::model::compilation::{
    validate_title, CompilationId, CompilationRecord, CompilationValidationError,
};
use crate::model::event::EventId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Rows, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const REQUIRED_TABLES: [&str; 3] = ["compilations", "compilation_events", "events"];

pub type StoreResult<T> = Result<T, StoreError>;

/// Compilation store failure.
#[derive(Debug)]
pub enum StoreError {
    NotFound(CompilationId),
    Validation(CompilationValidationError),
    /// Membership names events absent from the catalog; nothing was written.
    UnknownEvents(Vec<EventId>),
    Db(DbError),
    /// Persisted row cannot be decoded into a record.
    InvalidData(String),
    /// Connection was not migrated before the store was built.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "compilation not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnknownEvents(ids) => write!(f, "{}", missing_events_message(ids)),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted compilation: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::UnknownEvents(_)
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

/// Client-facing text for a membership that names unknown events.
pub fn missing_events_message(ids: &[EventId]) -> String {
    match ids {
        [only] => format!("Event with id={only} was not found"),
        _ => {
            let joined = ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("Events with ids={joined} were not found")
        }
    }
}

impl From<CompilationValidationError> for StoreError {
    fn from(value: CompilationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and page for listing compilations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilationListQuery {
    /// `None` lists pinned and unpinned compilations alike.
    pub pinned: Option<bool>,
    pub offset: u32,
    pub limit: u32,
}

/// Field changes applied together by `apply_changes`.
///
/// `None` leaves the stored value untouched. `event_ids: Some(set)` replaces
/// the whole membership set, including with an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilationChanges<'a> {
    pub title: Option<&'a str>,
    pub pinned: Option<bool>,
    pub event_ids: Option<&'a BTreeSet<EventId>>,
}

/// Persistence contract for compilations.
pub trait CompilationRepository {
    /// Inserts a compilation and its membership edges; returns the new id.
    ///
    /// # Errors
    /// - `Validation` for a blank or overlong title.
    /// - `UnknownEvents` when a member id has no event row at write time;
    ///   nothing is persisted.
    fn create_compilation(
        &self,
        title: &str,
        pinned: bool,
        event_ids: &BTreeSet<EventId>,
    ) -> StoreResult<CompilationId>;
    /// Loads one compilation with its raw membership set.
    fn get_compilation(&self, id: CompilationId) -> StoreResult<CompilationRecord>;
    /// Clears and re-inserts the membership set of `id` atomically.
    fn replace_membership(&self, id: CompilationId, event_ids: &BTreeSet<EventId>)
        -> StoreResult<()>;
    /// Updates only the supplied scalar fields of `id`.
    fn update_fields(
        &self,
        id: CompilationId,
        title: Option<&str>,
        pinned: Option<bool>,
    ) -> StoreResult<()>;
    /// Applies scalar and membership changes of `id` in one transaction.
    ///
    /// # Side effects
    /// - Supplied `event_ids` replace every stored edge of `id`.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    /// - `Validation` / `UnknownEvents` as for `create_compilation`; the
    ///   transaction is rolled back and no field changes.
    fn apply_changes(&self, id: CompilationId, changes: &CompilationChanges<'_>) -> StoreResult<()>;
    /// Removes `id` and all of its membership edges.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    fn delete_compilation(&self, id: CompilationId) -> StoreResult<()>;
    /// Lists compilations by `id ASC` with optional pinned filter.
    fn list_compilations(&self, query: &CompilationListQuery)
        -> StoreResult<Vec<CompilationRecord>>;
}

/// SQLite-backed compilation store.
///
/// Holds a shared connection borrow so the same connection can back an
/// `EventLookup` at the same time.
pub struct SqliteCompilationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompilationRepository<'conn> {
    /// Builds a store over a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the compilation or event catalog tables
    ///   are absent.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(StoreError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    fn write_tx(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl CompilationRepository for SqliteCompilationRepository<'_> {
    fn create_compilation(
        &self,
        title: &str,
        pinned: bool,
        event_ids: &BTreeSet<EventId>,
    ) -> StoreResult<CompilationId> {
        validate_title(title)?;

        let tx = self.write_tx()?;
        tx.execute(
            "INSERT INTO compilations (title, pinned) VALUES (?1, ?2);",
            params![title, bool_to_int(pinned)],
        )?;
        let id = tx.last_insert_rowid();
        insert_membership_in_tx(&tx, id, event_ids)?;
        tx.commit()?;

        Ok(id)
    }

    fn get_compilation(&self, id: CompilationId) -> StoreResult<CompilationRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.id,
                c.title,
                c.pinned,
                ce.event_id
             FROM compilations c
             LEFT JOIN compilation_events ce ON ce.compilation_id = c.id
             WHERE c.id = ?1
             ORDER BY ce.event_id ASC;",
        )?;
        let rows = stmt.query([id])?;
        collect_records(rows)?
            .pop()
            .ok_or(StoreError::NotFound(id))
    }

    fn replace_membership(
        &self,
        id: CompilationId,
        event_ids: &BTreeSet<EventId>,
    ) -> StoreResult<()> {
        self.apply_changes(
            id,
            &CompilationChanges {
                event_ids: Some(event_ids),
                ..CompilationChanges::default()
            },
        )
    }

    fn update_fields(
        &self,
        id: CompilationId,
        title: Option<&str>,
        pinned: Option<bool>,
    ) -> StoreResult<()> {
        self.apply_changes(
            id,
            &CompilationChanges {
                title,
                pinned,
                event_ids: None,
            },
        )
    }

    fn apply_changes(&self, id: CompilationId, changes: &CompilationChanges<'_>) -> StoreResult<()> {
        if let Some(title) = changes.title {
            validate_title(title)?;
        }

        let tx = self.write_tx()?;
        if !compilation_exists_in_tx(&tx, id)? {
            return Err(StoreError::NotFound(id));
        }

        update_scalars_in_tx(&tx, id, changes.title, changes.pinned)?;
        if let Some(event_ids) = changes.event_ids {
            tx.execute(
                "DELETE FROM compilation_events WHERE compilation_id = ?1;",
                [id],
            )?;
            insert_membership_in_tx(&tx, id, event_ids)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_compilation(&self, id: CompilationId) -> StoreResult<()> {
        let tx = self.write_tx()?;
        tx.execute(
            "DELETE FROM compilation_events WHERE compilation_id = ?1;",
            [id],
        )?;
        let changed = tx.execute("DELETE FROM compilations WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn list_compilations(
        &self,
        query: &CompilationListQuery,
    ) -> StoreResult<Vec<CompilationRecord>> {
        let mut page_sql = String::from("SELECT id, title, pinned FROM compilations");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(pinned) = query.pinned {
            page_sql.push_str(" WHERE pinned = ?");
            bind_values.push(Value::Integer(bool_to_int(pinned)));
        }

        page_sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let sql = format!(
            "WITH page AS ({page_sql})
             SELECT
                page.id,
                page.title,
                page.pinned,
                ce.event_id
             FROM page
             LEFT JOIN compilation_events ce ON ce.compilation_id = page.id
             ORDER BY page.id ASC, ce.event_id ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_records(rows)
    }
}

/// Folds `(id, title, pinned, event_id?)` rows ordered by `id` into records.
fn collect_records(mut rows: Rows<'_>) -> StoreResult<Vec<CompilationRecord>> {
    let mut records: Vec<CompilationRecord> = Vec::new();
    while let Some(row) = rows.next()? {
        let id: CompilationId = row.get("id")?;
        let event_id: Option<EventId> = row.get("event_id")?;

        let starts_new = records.last().map_or(true, |last| last.id != id);
        if starts_new {
            records.push(parse_compilation_row(row, id)?);
        }
        if let (Some(event_id), Some(record)) = (event_id, records.last_mut()) {
            record.event_ids.insert(event_id);
        }
    }
    Ok(records)
}

fn parse_compilation_row(row: &Row<'_>, id: CompilationId) -> StoreResult<CompilationRecord> {
    let pinned = match row.get::<_, i64>("pinned")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid pinned value `{other}` in compilations.pinned for id {id}"
            )));
        }
    };

    Ok(CompilationRecord {
        id,
        title: row.get("title")?,
        pinned,
        event_ids: BTreeSet::new(),
    })
}

fn insert_membership_in_tx(
    tx: &Transaction<'_>,
    id: CompilationId,
    event_ids: &BTreeSet<EventId>,
) -> StoreResult<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO compilation_events (compilation_id, event_id)
         SELECT ?1, id FROM events WHERE id = ?2;",
    )?;
    let mut missing = Vec::new();
    for event_id in event_ids {
        if stmt.execute(params![id, event_id])? == 0 {
            missing.push(*event_id);
        }
    }

    // Returning drops the transaction uncommitted, which rolls it back.
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::UnknownEvents(missing))
    }
}

fn update_scalars_in_tx(
    tx: &Transaction<'_>,
    id: CompilationId,
    title: Option<&str>,
    pinned: Option<bool>,
) -> StoreResult<()> {
    let mut assignments = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(title) = title {
        assignments.push("title = ?");
        bind_values.push(Value::Text(title.to_string()));
    }
    if let Some(pinned) = pinned {
        assignments.push("pinned = ?");
        bind_values.push(Value::Integer(bool_to_int(pinned)));
    }
    if assignments.is_empty() {
        return Ok(());
    }

    bind_values.push(Value::Integer(id));
    let sql = format!(
        "UPDATE compilations SET {} WHERE id = ?;",
        assignments.join(", ")
    );
    tx.execute(&sql, params_from_iter(bind_values))?;
    Ok(())
}

fn compilation_exists_in_tx(tx: &Transaction<'_>, id: CompilationId) -> StoreResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM compilations WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
