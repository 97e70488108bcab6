//! Event compilations core.
//!
//! Stores curated compilations of events, keeps their membership sets
//! consistent under partial updates, and serves filtered, paginated views
//! with every member resolved to its short-form event projection.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use error::ApiError;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::compilation::{
    CompilationId, CompilationRecord, CompilationValidationError, CompilationView,
    NewCompilation, UpdateCompilation,
};
pub use model::event::{CategoryRef, EventId, EventShort, UserShort};
pub use model::patch::Patch;
pub use repo::compilation_repo::{
    CompilationChanges, CompilationListQuery, CompilationRepository, SqliteCompilationRepository,
    StoreError, StoreResult,
};
pub use repo::event_lookup::{
    EventLookup, InMemoryEventLookup, LookupError, LookupResult, SqliteEventLookup,
};
pub use service::aggregator::Aggregator;
pub use service::compilation_query::{PageRequest, DEFAULT_PAGE_LIMIT};
pub use service::compilation_service::{CompilationError, CompilationResult, CompilationService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
