//! Changelog service: the facade callers use.
//!
//! Validates input, delegates to the single injected backend, and hands back
//! canonical records. Backend failures are logged and replaced by a stable,
//! operation-scoped [`ChangelogError`].

use std::sync::Arc;

use crate::changelog::timestamp::{parse_timestamp, to_utc_text};
use crate::changelog::{ChangelogRecord, NewChangelogInput, to_canonical_form};
use crate::config::DbKind;
use crate::error::{ChangelogError, DatabaseError, ValidationError};
use crate::history::ChangelogBackend;

/// Store summary for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub backend: DbKind,
    pub records: u64,
}

/// Changelog use cases over one storage backend.
pub struct ChangelogService {
    backend: Arc<dyn ChangelogBackend>,
}

impl ChangelogService {
    /// Wrap an already connected (and initialized) backend.
    pub fn new(backend: Arc<dyn ChangelogBackend>) -> Self {
        Self { backend }
    }

    /// The backend in use.
    pub fn backend(&self) -> &Arc<dyn ChangelogBackend> {
        &self.backend
    }

    /// Persist a new changelog and return its id.
    pub async fn create_changelog(
        &self,
        repository_url: &str,
        content: &str,
        generated_at: &str,
        period_start: &str,
        period_end: &str,
    ) -> Result<String, ChangelogError> {
        let input = NewChangelogInput {
            repository_url: repository_url.trim().to_string(),
            content: content.to_string(),
            generated_at: generated_at.trim().to_string(),
            period_start: period_start.trim().to_string(),
            period_end: period_end.trim().to_string(),
        };
        self.create(input).await
    }

    /// Persist a prepared input and return its id.
    ///
    /// Timestamps are stored as fixed-width UTC text (`2024-01-01T00:00:00.000Z`)
    /// whatever shape they arrived in, so stored text sorts in time order.
    pub async fn create(&self, input: NewChangelogInput) -> Result<String, ChangelogError> {
        let input = validate_input(input)?;

        self.backend.save(&input).await.map_err(|e| {
            log_backend_failure("create", &e);
            ChangelogError::CreateFailed
        })
    }

    /// All changelogs, or those of one repository, newest first.
    ///
    /// A blank `repository_url` counts as no filter.
    pub async fn list_changelogs(
        &self,
        repository_url: Option<&str>,
    ) -> Result<Vec<ChangelogRecord>, ChangelogError> {
        let filter = repository_url.map(str::trim).filter(|url| !url.is_empty());
        let rows = match filter {
            Some(url) => self.backend.list_by_repository(url).await,
            None => self.backend.list_all().await,
        }
        .map_err(|e| {
            log_backend_failure("list", &e);
            ChangelogError::ListFailed
        })?;

        Ok(rows.into_iter().map(to_canonical_form).collect())
    }

    /// Delete by id. `Ok(false)` means there was nothing to delete.
    pub async fn delete_changelog(&self, id: &str) -> Result<bool, ChangelogError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::Missing("id").into());
        }

        self.backend.delete_by_id(id).await.map_err(|e| {
            log_backend_failure("delete", &e);
            ChangelogError::DeleteFailed
        })
    }

    /// Backend kind and record count.
    pub async fn status(&self) -> Result<StoreStatus, ChangelogError> {
        let records = self.backend.count().await.map_err(|e| {
            log_backend_failure("status", &e);
            ChangelogError::ListFailed
        })?;
        Ok(StoreStatus {
            backend: self.backend.kind(),
            records,
        })
    }

    /// Release the backend's connections.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}

fn log_backend_failure(operation: &str, error: &DatabaseError) {
    tracing::error!(operation, error = %error, "Changelog storage operation failed");
}

/// Check required fields and rewrite the timestamps into UTC text.
fn validate_input(input: NewChangelogInput) -> Result<NewChangelogInput, ValidationError> {
    let repository_url = input.repository_url.trim();
    if repository_url.is_empty() {
        return Err(ValidationError::Missing("repositoryUrl"));
    }

    let generated = require_timestamp("generatedAt", &input.generated_at)?;
    let start = require_timestamp("periodStart", &input.period_start)?;
    let end = require_timestamp("periodEnd", &input.period_end)?;

    // Reversed windows are accepted as-is.
    if start > end {
        tracing::warn!(
            repository = %repository_url,
            period_start = %input.period_start,
            period_end = %input.period_end,
            "Changelog reporting window ends before it starts"
        );
    }

    Ok(NewChangelogInput {
        repository_url: repository_url.to_string(),
        content: input.content,
        generated_at: to_utc_text(generated),
        period_start: to_utc_text(start),
        period_end: to_utc_text(end),
    })
}

fn require_timestamp(
    field: &'static str,
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    parse_timestamp(value).ok_or_else(|| ValidationError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
