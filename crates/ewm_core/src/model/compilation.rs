//! Compilation domain model.
//!
//! # Responsibility
//! - Define the stored record (`CompilationRecord`) and the read projection
//!   (`CompilationView`).
//! - Define create/update request shapes and title validation.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused after deletion.
//! - `title` is non-blank and at most `TITLE_MAX_CHARS` characters.
//! - `pinned` is always a concrete boolean.
//! - `event_ids` is duplicate-free and enumerates in ascending order.

use crate::model::event::{EventId, EventShort};
use crate::model::patch::Patch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier generated by the compilation store.
pub type CompilationId = i64;

/// Upper bound on title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Persisted compilation with its raw membership set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationRecord {
    pub id: CompilationId,
    pub title: String,
    pub pinned: bool,
    pub event_ids: BTreeSet<EventId>,
}

/// Read projection: a compilation with its members resolved to short-form
/// event projections, ordered by event id ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationView {
    pub id: CompilationId,
    pub title: String,
    pub pinned: bool,
    pub events: Vec<EventShort>,
}

impl CompilationView {
    /// Ids of the resolved events, in view order.
    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|event| event.id).collect()
    }
}

/// Create request. `pinned` defaults to `false` and `events` to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCompilation {
    pub title: String,
    #[serde(default)]
    pub pinned: Option<bool>,
    /// May contain duplicates; they collapse into one membership edge.
    #[serde(default)]
    pub events: Option<Vec<EventId>>,
}

impl NewCompilation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn events(mut self, events: impl IntoIterator<Item = EventId>) -> Self {
        self.events = Some(events.into_iter().collect());
        self
    }
}

/// Partial update request. Every field is independently omitted or set;
/// `events: Set(..)` replaces the membership set wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateCompilation {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub pinned: Patch<bool>,
    #[serde(default)]
    pub events: Patch<Vec<EventId>>,
}

impl UpdateCompilation {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Patch::Set(title.into());
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Patch::Set(pinned);
        self
    }

    pub fn events(mut self, events: impl IntoIterator<Item = EventId>) -> Self {
        self.events = Patch::Set(events.into_iter().collect());
        self
    }

    /// Returns whether the request changes nothing.
    pub fn is_empty(&self) -> bool {
        !self.title.is_set() && !self.pinned.is_set() && !self.events.is_set()
    }
}

/// Title rule violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationValidationError {
    BlankTitle,
    TitleTooLong { chars: usize, max: usize },
}

impl Display for CompilationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "compilation title must not be blank"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "compilation title has {chars} characters; at most {max} allowed")
            }
        }
    }
}

impl Error for CompilationValidationError {}

/// Checks a title against the compilation title rules.
pub fn validate_title(title: &str) -> Result<(), CompilationValidationError> {
    if title.trim().is_empty() {
        return Err(CompilationValidationError::BlankTitle);
    }
    let chars = title.chars().count();
    if chars > TITLE_MAX_CHARS {
        return Err(CompilationValidationError::TitleTooLong {
            chars,
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(())
}

/// Collapses caller-supplied ids into a membership set.
pub fn membership_set(ids: &[EventId]) -> BTreeSet<EventId> {
    ids.iter().copied().collect()
}
