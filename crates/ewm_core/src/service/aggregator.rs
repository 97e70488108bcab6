//! Read-side composition of compilation views.
//!
//! # Responsibility
//! - Turn stored records into `CompilationView`s by resolving member ids
//!   through an `EventLookup`.
//!
//! # Invariants
//! - One `resolve_many` call per `view_of`/`views_of` invocation.
//! - Member ids that no longer resolve are dropped from the view, not
//!   reported as errors.
//! - `events` are ordered by event id ascending.

use crate::model::compilation::{CompilationRecord, CompilationView};
use crate::model::event::{EventId, EventShort};
use crate::repo::event_lookup::{EventLookup, LookupResult};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Builds views over a borrowed event lookup.
pub struct Aggregator<'l, L: EventLookup + ?Sized> {
    lookup: &'l L,
}

impl<'l, L: EventLookup + ?Sized> Aggregator<'l, L> {
    pub fn new(lookup: &'l L) -> Self {
        Self { lookup }
    }

    /// Resolves one record into a view.
    pub fn view_of(&self, record: CompilationRecord) -> LookupResult<CompilationView> {
        let resolved = self.lookup.resolve_many(&record.event_ids)?;
        Ok(assemble(record, &resolved))
    }

    /// Resolves a page of records with a single lookup over all members.
    pub fn views_of(&self, records: Vec<CompilationRecord>) -> LookupResult<Vec<CompilationView>> {
        let all_ids: BTreeSet<EventId> = records
            .iter()
            .flat_map(|record| record.event_ids.iter().copied())
            .collect();
        let resolved = self.lookup.resolve_many(&all_ids)?;
        Ok(records
            .into_iter()
            .map(|record| assemble(record, &resolved))
            .collect())
    }
}

fn assemble(record: CompilationRecord, resolved: &BTreeMap<EventId, EventShort>) -> CompilationView {
    let events: Vec<EventShort> = record
        .event_ids
        .iter()
        .filter_map(|id| resolved.get(id).cloned())
        .collect();

    let stale = record.event_ids.len() - events.len();
    if stale > 0 {
        debug!(
            "event=compilation_stale_refs module=aggregator status=filtered compilation_id={} stale_count={}",
            record.id, stale
        );
    }

    CompilationView {
        id: record.id,
        title: record.title,
        pinned: record.pinned,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::Aggregator;
    use crate::model::compilation::CompilationRecord;
    use crate::model::event::{CategoryRef, EventId, EventShort, UserShort};
    use crate::repo::event_lookup::{EventLookup, InMemoryEventLookup, LookupResult};
    use std::cell::Cell;
    use std::collections::{BTreeMap, BTreeSet};

    struct CountingLookup {
        inner: InMemoryEventLookup,
        calls: Cell<usize>,
    }

    impl EventLookup for CountingLookup {
        fn resolve_many(
            &self,
            ids: &BTreeSet<EventId>,
        ) -> LookupResult<BTreeMap<EventId, EventShort>> {
            self.calls.set(self.calls.get() + 1);
            self.inner.resolve_many(ids)
        }
    }

    fn event(id: EventId) -> EventShort {
        EventShort {
            id,
            title: format!("event {id}"),
            annotation: "annotation".to_string(),
            category: CategoryRef {
                id: 1,
                name: "sport".to_string(),
            },
            initiator: UserShort {
                id: 1,
                name: "John".to_string(),
            },
            event_date: "2030-06-01 18:00:00".to_string(),
            paid: false,
            confirmed_requests: 3,
            views: 10,
        }
    }

    fn record(id: i64, event_ids: &[EventId]) -> CompilationRecord {
        CompilationRecord {
            id,
            title: format!("compilation {id}"),
            pinned: false,
            event_ids: event_ids.iter().copied().collect(),
        }
    }

    #[test]
    fn view_orders_events_by_id_and_drops_stale_members() {
        let lookup: InMemoryEventLookup = [event(3), event(1)].into_iter().collect();
        let view = Aggregator::new(&lookup)
            .view_of(record(7, &[3, 2, 1]))
            .unwrap();
        assert_eq!(view.id, 7);
        assert_eq!(view.event_ids(), vec![1, 3]);
    }

    #[test]
    fn page_of_views_resolves_with_one_lookup() {
        let lookup = CountingLookup {
            inner: [event(1), event(2), event(3), event(4)].into_iter().collect(),
            calls: Cell::new(0),
        };
        let views = Aggregator::new(&lookup)
            .views_of(vec![record(1, &[1, 2]), record(2, &[3, 4]), record(3, &[])])
            .unwrap();
        assert_eq!(lookup.calls.get(), 1);
        assert_eq!(views.len(), 3);
        assert_eq!(views[1].event_ids(), vec![3, 4]);
        assert!(views[2].events.is_empty());
    }
}
