//! Compilation use-case service: create, update, delete and get.
//!
//! # Responsibility
//! - Enforce create/update/delete contracts on top of the compilation store.
//! - Check every written membership id against the event lookup; the store
//!   repeats the check inside its write transaction.
//! - Return freshly aggregated views after each successful call.
//!
//! # Invariants
//! - A call either fully succeeds or leaves stored state unchanged.
//! - `pinned` defaults to `false` and `events` to empty on create.
//! - On update, only supplied fields change; supplied `events` replace the
//!   whole membership set.
//! - Deleting an id twice fails the second time with `NotFound`.

use crate::model::compilation::{
    membership_set, validate_title, CompilationId, CompilationValidationError, CompilationView,
    NewCompilation, UpdateCompilation,
};
use crate::model::event::EventId;
use crate::repo::compilation_repo::{
    missing_events_message, CompilationChanges, CompilationRepository, StoreError,
};
use crate::repo::event_lookup::{EventLookup, LookupError};
use crate::service::aggregator::Aggregator;
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CompilationResult<T> = Result<T, CompilationError>;

/// Error surfaced by compilation use-cases.
#[derive(Debug)]
pub enum CompilationError {
    /// Addressed compilation does not exist.
    NotFound(CompilationId),
    /// Caller input breaks a data rule (unknown event, bad title, bad page).
    ConstraintViolation(String),
    /// Compilation store transport failure.
    Store(StoreError),
    /// Event lookup transport failure.
    Lookup(LookupError),
}

impl Display for CompilationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(_) => write!(f, "Compilation was not found"),
            Self::ConstraintViolation(message) => write!(f, "{message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Lookup(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CompilationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Lookup(err) => Some(err),
            Self::NotFound(_) | Self::ConstraintViolation(_) => None,
        }
    }
}

impl From<StoreError> for CompilationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Validation(err) => err.into(),
            StoreError::UnknownEvents(ids) => {
                Self::ConstraintViolation(missing_events_message(&ids))
            }
            other => Self::Store(other),
        }
    }
}

impl From<LookupError> for CompilationError {
    fn from(value: LookupError) -> Self {
        Self::Lookup(value)
    }
}

impl From<CompilationValidationError> for CompilationError {
    fn from(value: CompilationValidationError) -> Self {
        Self::ConstraintViolation(value.to_string())
    }
}

/// Compilation facade over a store and an event lookup.
pub struct CompilationService<R: CompilationRepository, L: EventLookup> {
    pub(crate) repo: R,
    pub(crate) lookup: L,
}

impl<R: CompilationRepository, L: EventLookup> CompilationService<R, L> {
    pub fn new(repo: R, lookup: L) -> Self {
        Self { repo, lookup }
    }

    /// Creates a compilation and returns its view.
    ///
    /// # Side effects
    /// - Inserts one compilation row and its membership edges.
    /// - Emits an `event=compilation_create` log line.
    ///
    /// # Errors
    /// - `ConstraintViolation` for a bad title or an unknown event id,
    ///   including an event deleted while the write was in flight.
    /// - `Store` / `Lookup` on storage failures.
    pub fn create_compilation(&self, request: NewCompilation) -> CompilationResult<CompilationView> {
        validate_title(&request.title)?;
        let pinned = request.pinned.unwrap_or(false);
        let event_ids = request
            .events
            .as_deref()
            .map(membership_set)
            .unwrap_or_default();
        self.ensure_events_exist(&event_ids)?;

        let id = self
            .repo
            .create_compilation(&request.title, pinned, &event_ids)?;
        info!(
            "event=compilation_create module=compilation status=ok compilation_id={id} pinned={pinned} event_count={}",
            event_ids.len()
        );
        self.get_compilation(id)
    }

    /// Applies a partial update and returns the resulting view.
    ///
    /// # Side effects
    /// - Rewrites the supplied scalar fields; supplied `events` replace the
    ///   whole membership set. All changes commit together.
    ///
    /// # Errors
    /// - `ConstraintViolation` for a bad title or an unknown event id; input
    ///   checks run before the existence check of `id`.
    /// - `NotFound` when `id` does not exist.
    pub fn update_compilation(
        &self,
        id: CompilationId,
        request: UpdateCompilation,
    ) -> CompilationResult<CompilationView> {
        if let Some(title) = request.title.as_set() {
            validate_title(title)?;
        }
        let event_ids: Option<BTreeSet<EventId>> =
            request.events.as_set().map(|ids| membership_set(ids));
        if let Some(event_ids) = event_ids.as_ref() {
            self.ensure_events_exist(event_ids)?;
        }

        let changes = CompilationChanges {
            title: request.title.as_set().map(String::as_str),
            pinned: request.pinned.as_set().copied(),
            event_ids: event_ids.as_ref(),
        };
        if let Err(err) = self.repo.apply_changes(id, &changes) {
            if matches!(err, StoreError::NotFound(_)) {
                warn!("event=compilation_update module=compilation status=error compilation_id={id} error_code=not_found");
            }
            return Err(err.into());
        }
        info!(
            "event=compilation_update module=compilation status=ok compilation_id={id} title_set={} pinned_set={} events_set={}",
            changes.title.is_some(),
            changes.pinned.is_some(),
            changes.event_ids.is_some()
        );
        self.get_compilation(id)
    }

    /// Deletes a compilation and its membership edges.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist, including a second delete.
    pub fn delete_compilation(&self, id: CompilationId) -> CompilationResult<()> {
        match self.repo.delete_compilation(id) {
            Ok(()) => {
                info!("event=compilation_delete module=compilation status=ok compilation_id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=compilation_delete module=compilation status=error compilation_id={id} error={err}");
                Err(err.into())
            }
        }
    }

    /// Gets one compilation view by id. Members whose event has disappeared
    /// are left out of the view.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    pub fn get_compilation(&self, id: CompilationId) -> CompilationResult<CompilationView> {
        let record = self.repo.get_compilation(id)?;
        Ok(Aggregator::new(&self.lookup).view_of(record)?)
    }

    fn ensure_events_exist(&self, event_ids: &BTreeSet<EventId>) -> CompilationResult<()> {
        let missing: Vec<EventId> = match event_ids.first() {
            None => return Ok(()),
            Some(&only) if event_ids.len() == 1 => {
                if self.lookup.exists(only)? {
                    Vec::new()
                } else {
                    vec![only]
                }
            }
            Some(_) => {
                let resolved = self.lookup.resolve_many(event_ids)?;
                event_ids
                    .iter()
                    .copied()
                    .filter(|id| !resolved.contains_key(id))
                    .collect()
            }
        };

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CompilationError::ConstraintViolation(
                missing_events_message(&missing),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CompilationError;
    use crate::model::compilation::CompilationValidationError;
    use crate::repo::compilation_repo::StoreError;

    #[test]
    fn store_errors_map_to_semantic_variants() {
        assert!(matches!(
            CompilationError::from(StoreError::NotFound(4)),
            CompilationError::NotFound(4)
        ));
        assert!(matches!(
            CompilationError::from(StoreError::Validation(CompilationValidationError::BlankTitle)),
            CompilationError::ConstraintViolation(_)
        ));
        match CompilationError::from(StoreError::UnknownEvents(vec![3, 7])) {
            CompilationError::ConstraintViolation(message) => {
                assert_eq!(message, "Events with ids=3,7 were not found")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            CompilationError::from(StoreError::MissingRequiredTable("compilations")),
            CompilationError::Store(_)
        ));
    }

    #[test]
    fn not_found_message_matches_contract() {
        assert_eq!(
            CompilationError::NotFound(100).to_string(),
            "Compilation was not found"
        );
    }
}
