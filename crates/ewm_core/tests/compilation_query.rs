mod common;

use common::{delete_event, seed_catalog, seed_events_through};
use ewm_core::db::open_db_in_memory;
use ewm_core::{
    CompilationError, CompilationService, NewCompilation, PageRequest,
    SqliteCompilationRepository, SqliteEventLookup,
};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    seed_catalog(&conn);
    conn
}

fn seed_three(
    service: &CompilationService<SqliteCompilationRepository<'_>, SqliteEventLookup<'_>>,
) -> (i64, i64, i64) {
    let first = service
        .create_compilation(NewCompilation::new("title").pinned(true).events([1, 2]))
        .unwrap();
    let second = service
        .create_compilation(NewCompilation::new("new title").pinned(false).events([3, 4]))
        .unwrap();
    let third = service
        .create_compilation(NewCompilation::new("another title").pinned(true).events([5]))
        .unwrap();
    (first.id, second.id, third.id)
}

#[test]
fn pinned_filter_returns_only_pinned_in_creation_order() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    let (first, _second, third) = seed_three(&service);

    let pinned = service.list_compilations(Some(true), 0, 10).unwrap();
    assert_eq!(pinned.len(), 2);
    assert_eq!(pinned[0].id, first);
    assert_eq!(pinned[0].title, "title");
    assert_eq!(pinned[0].event_ids(), vec![1, 2]);
    assert_eq!(pinned[1].id, third);
    assert_eq!(pinned[1].title, "another title");
    assert_eq!(pinned[1].event_ids(), vec![5]);
    assert!(pinned.iter().all(|view| view.pinned));
}

#[test]
fn unpinned_filter_and_no_filter() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    let (first, second, third) = seed_three(&service);

    let unpinned = service.list_compilations(Some(false), 0, 10).unwrap();
    assert_eq!(
        unpinned.iter().map(|view| view.id).collect::<Vec<_>>(),
        vec![second]
    );

    let all = service.list_compilations(None, 0, 10).unwrap();
    assert_eq!(
        all.iter().map(|view| view.id).collect::<Vec<_>>(),
        vec![first, second, third]
    );
}

#[test]
fn pages_are_sliced_by_offset_and_limit() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    let (_first, second, third) = seed_three(&service);

    let page = service.list_compilations(None, 1, 2).unwrap();
    assert_eq!(
        page.iter().map(|view| view.id).collect::<Vec<_>>(),
        vec![second, third]
    );
    assert_eq!(page[0].event_ids(), vec![3, 4]);

    let page = service
        .list_page(None, PageRequest::new(2, 5).unwrap())
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[test]
fn offset_past_end_yields_empty_page() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    seed_three(&service);

    assert!(service.list_compilations(None, 3, 10).unwrap().is_empty());
    assert!(service.list_compilations(Some(true), 500, 1).unwrap().is_empty());
}

#[test]
fn zero_limit_is_rejected() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );

    let err = service.list_compilations(None, 0, 0).unwrap_err();
    assert!(matches!(err, CompilationError::ConstraintViolation(_)));
}

#[test]
fn listing_tolerates_events_deleted_out_of_band() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    seed_three(&service);
    delete_event(&conn, 5);
    delete_event(&conn, 1);

    let all = service.list_compilations(None, 0, 10).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].event_ids(), vec![2]);
    assert_eq!(all[1].event_ids(), vec![3, 4]);
    assert!(all[2].events.is_empty());
}

#[test]
fn view_serializes_with_nested_event_projections() {
    let conn = setup();
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    seed_three(&service);

    let page = service.list_compilations(Some(true), 0, 1).unwrap();
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json[0]["title"], "title");
    assert_eq!(json[0]["pinned"], true);
    assert_eq!(json[0]["events"][1]["id"], 2);
    assert_eq!(json[0]["events"][1]["eventDate"], "2030-01-01 10:00:00");
}

#[test]
fn page_whose_member_union_exceeds_sqlite_variable_limit() {
    let conn = open_db_in_memory().unwrap();
    seed_events_through(&conn, 34_000);
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn).unwrap(),
        SqliteEventLookup::new(&conn),
    );
    for start in [1, 11_001, 22_001] {
        let events: Vec<i64> = (start..start + 11_000).collect();
        service
            .create_compilation(NewCompilation::new("slice").events(events))
            .unwrap();
    }

    let page = service.list_compilations(None, 0, 10).unwrap();
    assert_eq!(page.len(), 3);
    let total: usize = page.iter().map(|view| view.events.len()).sum();
    assert_eq!(total, 33_000);
    assert_eq!(page[2].events.last().map(|event| event.id), Some(33_000));
}
