//! Compilation use-case services.
//!
//! # Responsibility
//! - Orchestrate store writes, event lookups and view aggregation.
//! - Keep callers (HTTP, CLI) away from storage details.

pub mod aggregator;
pub mod compilation_query;
pub mod compilation_service;
