//! Repository layer: the compilation store and the event lookup provider.
//!
//! # Responsibility
//! - Keep SQL inside the persistence boundary.
//! - Expose semantic errors (`NotFound`) next to transport errors.
//!
//! # Invariants
//! - Only the compilation service writes through `CompilationRepository`.
//! - `EventLookup` is read-only.

pub mod compilation_repo;
pub mod event_lookup;
