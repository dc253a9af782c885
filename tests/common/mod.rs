//! Backend-agnostic changelog scenarios shared by the store integration tests.
//!
//! Every scenario expects an empty store and leaves whatever it created behind;
//! call [`clear`] between scenarios on shared servers.

#![allow(dead_code)]

use std::collections::HashSet;

use gramophone::ChangelogService;
use gramophone::changelog::group_by_repository;
use gramophone::changelog::timestamp::parse_timestamp;

pub const REPO: &str = "https://github.com/a/b";

/// Delete every stored record.
pub async fn clear(service: &ChangelogService) {
    for record in service.list_changelogs(None).await.expect("list") {
        service.delete_changelog(&record.id).await.expect("delete");
    }
}

/// One record in, the same record (plus id and createdAt) out, with
/// timestamps in fixed-width UTC text.
pub async fn single_record_round_trip(service: &ChangelogService) {
    let id = service
        .create_changelog(
            REPO,
            "## Features\n- added things",
            "2024-01-01T00:00:00Z",
            "2023-12-01",
            "2023-12-31 23:59:59.5",
        )
        .await
        .expect("create");
    assert!(!id.is_empty());

    let records = service.list_changelogs(None).await.expect("list");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, id);
    assert_eq!(record.repository_url, REPO);
    assert_eq!(record.content, "## Features\n- added things");
    assert_eq!(record.generated_at, "2024-01-01T00:00:00.000Z");
    assert_eq!(record.period_start, "2023-12-01T00:00:00.000Z");
    assert_eq!(record.period_end, "2023-12-31T23:59:59.500Z");
    assert!(parse_timestamp(&record.created_at).is_some());
}

/// Offsets, `T`/space separators and missing zones still list in time order.
pub async fn mixed_timestamp_shapes_list_in_time_order(service: &ChangelogService) {
    let noon = service
        .create_changelog(REPO, "noon", "2024-01-01 12:00:00", "2023-12-01", "2023-12-31")
        .await
        .expect("create naive");
    let six = service
        .create_changelog(REPO, "six", "2024-01-01T06:00:00Z", "2023-12-01", "2023-12-31")
        .await
        .expect("create utc");
    let one = service
        .create_changelog(REPO, "one", "2024-01-01T10:00:00+09:00", "2023-12-01", "2023-12-31")
        .await
        .expect("create offset");

    for records in [
        service.list_changelogs(None).await.expect("list"),
        service.list_changelogs(Some(REPO)).await.expect("list repo"),
    ] {
        let listed: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.id.as_str(), r.generated_at.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (noon.as_str(), "2024-01-01T12:00:00.000Z"),
                (six.as_str(), "2024-01-01T06:00:00.000Z"),
                (one.as_str(), "2024-01-01T01:00:00.000Z"),
            ]
        );
    }
}

/// Two records for one repository come back newest first.
pub async fn repository_listing_is_newest_first(service: &ChangelogService) {
    let older = service
        .create_changelog(REPO, "january", "2024-01-01", "2023-12-01", "2023-12-31")
        .await
        .expect("create older");
    let newer = service
        .create_changelog(REPO, "february", "2024-02-01", "2024-01-01", "2024-01-31")
        .await
        .expect("create newer");
    service
        .create_changelog("https://github.com/c/d", "other", "2024-03-01", "2024-02-01", "2024-02-29")
        .await
        .expect("create other repo");

    let records = service.list_changelogs(Some(REPO)).await.expect("list repo");
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![newer.as_str(), older.as_str()]);
}

/// Deleting twice: true, then false, never an error.
pub async fn second_delete_reports_false(service: &ChangelogService) {
    let id = service
        .create_changelog(REPO, "x", "2024-01-01", "2023-12-01", "2023-12-31")
        .await
        .expect("create");
    assert!(service.delete_changelog(&id).await.expect("first delete"));
    assert!(!service.delete_changelog(&id).await.expect("second delete"));
    assert!(!service
        .delete_changelog("00000000-0000-0000-0000-000000000000")
        .await
        .expect("delete unknown"));
    assert!(service.list_changelogs(None).await.expect("list").is_empty());
    assert!(service.list_changelogs(Some(REPO)).await.expect("list repo").is_empty());
}

/// An empty store lists as empty, filtered or not.
pub async fn empty_store_lists_nothing(service: &ChangelogService) {
    assert!(service.list_changelogs(None).await.expect("list").is_empty());
    assert!(service
        .list_changelogs(Some(REPO))
        .await
        .expect("list repo")
        .is_empty());
}

/// N creates, N distinct ids, listed in non-increasing generatedAt order,
/// and grouping accounts for every record.
pub async fn ids_unique_and_listing_ordered(service: &ChangelogService, n: usize) {
    let repos = ["https://github.com/a/b", "https://github.com/c/d", "https://gitlab.com/e/f"];
    let mut ids = HashSet::new();
    for i in 0..n {
        // Days deliberately out of insertion order.
        let day = (i * 7) % 28 + 1;
        let generated_at = format!("2024-03-{:02}T12:00:00Z", day);
        let id = service
            .create_changelog(repos[i % repos.len()], "body", &generated_at, "2024-01-01", "2024-01-31")
            .await
            .expect("create");
        assert!(ids.insert(id), "duplicate id");
    }
    assert_eq!(ids.len(), n);

    let records = service.list_changelogs(None).await.expect("list");
    assert_eq!(records.len(), n);
    for pair in records.windows(2) {
        let a = parse_timestamp(&pair[0].generated_at).expect("timestamp");
        let b = parse_timestamp(&pair[1].generated_at).expect("timestamp");
        assert!(a >= b, "{} listed before {}", pair[0].generated_at, pair[1].generated_at);
    }

    let groups = group_by_repository(&records);
    let total: usize = groups.values().map(Vec::len).sum();
    assert_eq!(total, n);
    assert_eq!(groups.len(), repos.len().min(n));
}
