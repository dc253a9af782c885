//! Changelog record model and the canonical/storage name mapping.
//!
//! Two surface forms exist for the same entity:
//!
//! - **canonical**: mixed-case names (`repositoryUrl`, `generatedAt`, ...),
//!   used by the service and every caller;
//! - **storage**: all-lowercase names (`repourl`, `generatedat`, ...),
//!   required by case-insensitive relational backends.
//!
//! [`FIELD_MAP`] is the single translation table between them. Nothing
//! outside this module spells a storage name by hand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Canonical name → storage name, for every field of a record.
pub const FIELD_MAP: [(&str, &str); 7] = [
    ("id", "id"),
    ("repositoryUrl", "repourl"),
    ("content", "content"),
    ("generatedAt", "generatedat"),
    ("periodStart", "periodstart"),
    ("periodEnd", "periodend"),
    ("createdAt", "createdat"),
];

/// Storage name for a canonical field name.
pub fn storage_name(canonical: &str) -> Option<&'static str> {
    FIELD_MAP
        .iter()
        .find(|(c, _)| *c == canonical)
        .map(|(_, s)| *s)
}

/// A persisted changelog entry, canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogRecord {
    pub id: String,
    #[serde(alias = "repoUrl")]
    pub repository_url: String,
    pub content: String,
    pub generated_at: String,
    pub period_start: String,
    pub period_end: String,
    pub created_at: String,
}

/// Everything the caller supplies for a new record (no id, no createdAt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChangelogInput {
    #[serde(alias = "repoUrl")]
    pub repository_url: String,
    pub content: String,
    pub generated_at: String,
    pub period_start: String,
    pub period_end: String,
}

impl NewChangelogInput {
    /// Complete the input into a full record.
    pub fn into_record(self, id: String, created_at: String) -> ChangelogRecord {
        ChangelogRecord {
            id,
            repository_url: self.repository_url,
            content: self.content,
            generated_at: self.generated_at,
            period_start: self.period_start,
            period_end: self.period_end,
            created_at,
        }
    }
}

/// A changelog entry in storage form. Field names are the lowercase column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StorageRecord {
    pub id: String,
    pub repourl: String,
    pub content: String,
    pub generatedat: String,
    pub periodstart: String,
    pub periodend: String,
    pub createdat: String,
}

impl StorageRecord {
    /// `(storage name, value)` pairs in [`FIELD_MAP`] order.
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            (FIELD_MAP[0].1, self.id.as_str()),
            (FIELD_MAP[1].1, self.repourl.as_str()),
            (FIELD_MAP[2].1, self.content.as_str()),
            (FIELD_MAP[3].1, self.generatedat.as_str()),
            (FIELD_MAP[4].1, self.periodstart.as_str()),
            (FIELD_MAP[5].1, self.periodend.as_str()),
            (FIELD_MAP[6].1, self.createdat.as_str()),
        ]
    }

    /// Rebuild a record from a loose string map, e.g. a key-value hash.
    ///
    /// Each field is looked up under its storage name first, then under its
    /// canonical name. Older key-value data was written with canonical names,
    /// and `repoUrl` is accepted for `repositoryUrl`.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, RecordError> {
        let take = |canonical: &'static str| -> Result<String, RecordError> {
            let storage = storage_name(canonical).unwrap_or(canonical);
            map.get(storage)
                .or_else(|| map.get(canonical))
                .or_else(|| {
                    (canonical == "repositoryUrl")
                        .then(|| map.get("repoUrl"))
                        .flatten()
                })
                .cloned()
                .ok_or(RecordError::MissingField(storage))
        };

        Ok(Self {
            id: take("id")?,
            repourl: take("repositoryUrl")?,
            content: take("content")?,
            generatedat: take("generatedAt")?,
            periodstart: take("periodStart")?,
            periodend: take("periodEnd")?,
            createdat: take("createdAt")?,
        })
    }
}

/// Canonical → storage form. Purely structural; values are not inspected.
pub fn to_storage_form(record: ChangelogRecord) -> StorageRecord {
    StorageRecord {
        id: record.id,
        repourl: record.repository_url,
        content: record.content,
        generatedat: record.generated_at,
        periodstart: record.period_start,
        periodend: record.period_end,
        createdat: record.created_at,
    }
}

/// Storage → canonical form. Timestamps pass through untouched.
pub fn to_canonical_form(record: StorageRecord) -> ChangelogRecord {
    ChangelogRecord {
        id: record.id,
        repository_url: record.repourl,
        content: record.content,
        generated_at: record.generatedat,
        period_start: record.periodstart,
        period_end: record.periodend,
        created_at: record.createdat,
    }
}

impl From<ChangelogRecord> for StorageRecord {
    fn from(record: ChangelogRecord) -> Self {
        to_storage_form(record)
    }
}

impl From<StorageRecord> for ChangelogRecord {
    fn from(record: StorageRecord) -> Self {
        to_canonical_form(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChangelogRecord {
        ChangelogRecord {
            id: "3f1c".to_string(),
            repository_url: "https://github.com/a/b".to_string(),
            content: "## Fixes\n- thing".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            period_start: "2023-12-01T00:00:00Z".to_string(),
            period_end: "2023-12-31T23:59:59Z".to_string(),
            created_at: "2024-01-01T00:00:05.123Z".to_string(),
        }
    }

    #[test]
    fn test_round_trip_both_directions() {
        let record = sample();
        assert_eq!(to_canonical_form(to_storage_form(record.clone())), record);

        let stored = to_storage_form(record);
        assert_eq!(to_storage_form(to_canonical_form(stored.clone())), stored);
    }

    #[test]
    fn test_field_map_is_exhaustive_and_bijective() {
        let stored = to_storage_form(sample());
        let names: Vec<&str> = stored.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, FIELD_MAP.iter().map(|(_, s)| *s).collect::<Vec<_>>());

        for (canonical, storage) in FIELD_MAP {
            assert_eq!(storage_name(canonical), Some(storage));
            assert_eq!(storage, storage.to_lowercase());
        }
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), FIELD_MAP.len());
        assert_eq!(storage_name("repoUrl"), None);
    }

    #[test]
    fn test_serde_names_follow_the_table() {
        let canonical = serde_json::to_value(sample()).unwrap();
        let stored = serde_json::to_value(to_storage_form(sample())).unwrap();
        for (c, s) in FIELD_MAP {
            assert_eq!(canonical[c], stored[s], "field {c}");
        }
    }

    #[test]
    fn test_canonical_accepts_repo_url_alias() {
        let json = serde_json::json!({
            "id": "x",
            "repoUrl": "https://github.com/a/b",
            "content": "c",
            "generatedAt": "2024-01-01",
            "periodStart": "2024-01-01",
            "periodEnd": "2024-01-02",
            "createdAt": "2024-01-03",
        });
        let record: ChangelogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.repository_url, "https://github.com/a/b");
    }

    #[test]
    fn test_from_map_accepts_either_naming() {
        let stored = to_storage_form(sample());
        let lower: HashMap<String, String> = stored
            .fields()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(StorageRecord::from_map(&lower).unwrap(), stored);

        let mixed: HashMap<String, String> = FIELD_MAP
            .iter()
            .zip(stored.fields())
            .map(|((c, _), (_, v))| {
                let key = if *c == "repositoryUrl" { "repoUrl" } else { *c };
                (key.to_string(), v.to_string())
            })
            .collect();
        assert_eq!(StorageRecord::from_map(&mixed).unwrap(), stored);
    }

    #[test]
    fn test_from_map_reports_missing_field() {
        let mut map: HashMap<String, String> = to_storage_form(sample())
            .fields()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.remove("periodend");
        assert_eq!(
            StorageRecord::from_map(&map),
            Err(RecordError::MissingField("periodend"))
        );
    }
}
