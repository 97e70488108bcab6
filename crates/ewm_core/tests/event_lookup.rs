mod common;

use common::{delete_event, seed_catalog};
use ewm_core::db::open_db_in_memory;
use ewm_core::{EventLookup, SqliteEventLookup};
use std::collections::BTreeSet;

#[test]
fn resolve_many_returns_full_short_projections() {
    let conn = open_db_in_memory().unwrap();
    seed_catalog(&conn);
    let lookup = SqliteEventLookup::new(&conn);

    let resolved = lookup.resolve_many(&BTreeSet::from([1, 3])).unwrap();
    assert_eq!(resolved.len(), 2);

    let third = &resolved[&3];
    assert_eq!(third.title, "another one");
    assert_eq!(third.category.id, 2);
    assert_eq!(third.category.name, "sport");
    assert_eq!(third.initiator.name, "John");
    assert_eq!(third.event_date, "2030-01-01 10:00:00");
    assert!(third.paid);
}

#[test]
fn resolve_many_omits_unknown_and_deleted_ids() {
    let conn = open_db_in_memory().unwrap();
    seed_catalog(&conn);
    delete_event(&conn, 5);
    let lookup = SqliteEventLookup::new(&conn);

    let resolved = lookup
        .resolve_many(&BTreeSet::from([4, 5, 42]))
        .unwrap();
    assert_eq!(resolved.keys().copied().collect::<Vec<_>>(), vec![4]);
    assert!(lookup.resolve_many(&BTreeSet::new()).unwrap().is_empty());
}

#[test]
fn exists_reflects_catalog_state() {
    let conn = open_db_in_memory().unwrap();
    seed_catalog(&conn);
    let lookup = SqliteEventLookup::new(&conn);

    assert!(lookup.exists(2).unwrap());
    assert!(!lookup.exists(6).unwrap());
    delete_event(&conn, 2);
    assert!(!lookup.exists(2).unwrap());
}

#[test]
fn projection_serializes_with_camel_case_keys() {
    let conn = open_db_in_memory().unwrap();
    seed_catalog(&conn);
    let lookup = SqliteEventLookup::new(&conn);

    let resolved = lookup.resolve_many(&BTreeSet::from([1])).unwrap();
    let json = serde_json::to_value(&resolved[&1]).unwrap();
    assert_eq!(json["eventDate"], "2030-01-01 10:00:00");
    assert_eq!(json["confirmedRequests"], 0);
    assert_eq!(json["category"]["name"], "travel");
}

#[test]
fn resolve_many_spans_several_query_chunks() {
    let conn = open_db_in_memory().unwrap();
    common::seed_events_through(&conn, 1_200);
    let lookup = SqliteEventLookup::new(&conn);

    let mut wanted: BTreeSet<i64> = (1..=1_200).collect();
    wanted.insert(5_000);
    let resolved = lookup.resolve_many(&wanted).unwrap();
    assert_eq!(resolved.len(), 1_200);
    assert!(resolved.contains_key(&501));
    assert!(!resolved.contains_key(&5_000));
}
