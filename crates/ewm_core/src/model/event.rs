//! Short-form event projection.
//!
//! Events are owned by another part of the system. This core only ever sees
//! them through these read-only summaries.

use serde::{Deserialize, Serialize};

/// Identifier of an event in the external event catalog.
pub type EventId = i64;

/// Category summary embedded in an event projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Initiator summary embedded in an event projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShort {
    pub id: i64,
    pub name: String,
}

/// Lightweight event summary used inside compilation views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventShort {
    pub id: EventId,
    pub title: String,
    pub annotation: String,
    pub category: CategoryRef,
    pub initiator: UserShort,
    /// Local date-time, `yyyy-MM-dd HH:mm:ss`.
    pub event_date: String,
    pub paid: bool,
    pub confirmed_requests: i64,
    pub views: i64,
}
