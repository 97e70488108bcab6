//! Domain model for compilations and the event projections they surface.
//!
//! # Responsibility
//! - Define the persisted compilation shape and its read projection.
//! - Define request shapes for create and partial update.
//!
//! # Invariants
//! - A compilation owns its membership set; events never point back.
//! - Membership is a set: duplicates cannot be represented.

pub mod compilation;
pub mod event;
pub mod patch;
