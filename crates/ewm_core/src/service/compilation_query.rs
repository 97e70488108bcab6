//! Compilation listing with pinned filter and offset/limit paging.
//!
//! # Invariants
//! - Results are ordered by compilation id ascending (creation order).
//! - An offset past the last row yields an empty list, not an error.
//! - A zero limit is rejected.

use crate::model::compilation::CompilationView;
use crate::repo::compilation_repo::{CompilationListQuery, CompilationRepository};
use crate::repo::event_lookup::EventLookup;
use crate::service::aggregator::Aggregator;
use crate::service::compilation_service::{CompilationError, CompilationResult, CompilationService};

/// Page size used when callers do not pass one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Validated offset/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> CompilationResult<Self> {
        if limit == 0 {
            return Err(CompilationError::ConstraintViolation(
                "page limit must be greater than zero".to_string(),
            ));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl<R: CompilationRepository, L: EventLookup> CompilationService<R, L> {
    /// Lists compilation views, optionally only pinned or only unpinned.
    pub fn list_compilations(
        &self,
        pinned: Option<bool>,
        offset: u32,
        limit: u32,
    ) -> CompilationResult<Vec<CompilationView>> {
        self.list_page(pinned, PageRequest::new(offset, limit)?)
    }

    /// Same as `list_compilations` with an already validated page.
    pub fn list_page(
        &self,
        pinned: Option<bool>,
        page: PageRequest,
    ) -> CompilationResult<Vec<CompilationView>> {
        let records = self.repo.list_compilations(&CompilationListQuery {
            pinned,
            offset: page.offset,
            limit: page.limit,
        })?;
        Ok(Aggregator::new(&self.lookup).views_of(records)?)
    }
}
