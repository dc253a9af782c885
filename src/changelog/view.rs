//! Read-side views over a flat record set: repository grouping and display order.
//!
//! Everything here is a pure function of its input. Nothing touches storage.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::changelog::record::ChangelogRecord;
use crate::changelog::timestamp::parse_timestamp;

const GITHUB_PREFIX: &str = "https://github.com/";

/// Records partitioned by repository URL, keyed in lexical order.
pub type RepositoryGroups = BTreeMap<String, Vec<ChangelogRecord>>;

/// Partition records by `repository_url`.
///
/// Every input record lands in exactly one group. Within a group, input order
/// is preserved; use [`sorted_by_generated_desc`] or [`group_for_display`]
/// for display order.
pub fn group_by_repository(records: &[ChangelogRecord]) -> RepositoryGroups {
    let mut groups = RepositoryGroups::new();
    for record in records {
        groups
            .entry(record.repository_url.clone())
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Grouped, with each group newest first.
pub fn group_for_display(records: &[ChangelogRecord]) -> RepositoryGroups {
    let mut groups = group_by_repository(records);
    for group in groups.values_mut() {
        group.sort_by(compare_generated_desc);
    }
    groups
}

/// A copy of `records` ordered by `generated_at` descending. Input is untouched.
pub fn sorted_by_generated_desc(records: &[ChangelogRecord]) -> Vec<ChangelogRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(compare_generated_desc);
    sorted
}

/// Newest `generated_at` first; ties broken by id, descending.
///
/// Parsed time is compared when both sides parse; otherwise the raw text is.
pub fn compare_generated_desc(a: &ChangelogRecord, b: &ChangelogRecord) -> Ordering {
    let by_time = match (parse_timestamp(&a.generated_at), parse_timestamp(&b.generated_at)) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        _ => b.generated_at.cmp(&a.generated_at),
    };
    by_time.then_with(|| b.id.cmp(&a.id))
}

/// Short label for a repository: `owner/name` for GitHub URLs, the URL otherwise.
pub fn repository_display_name(url: &str) -> &str {
    url.strip_prefix(GITHUB_PREFIX)
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(url)
}
