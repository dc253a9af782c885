//! Request/response contract offered to the presentation layer.
//!
//! Transport-agnostic: handlers take decoded (or raw JSON) requests and return
//! an [`ApiResponse`] holding a status code and a JSON body. Routing, CORS and
//! rendering belong to whoever embeds this.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::changelog::NewChangelogInput;
use crate::error::{ChangelogError, ValidationError};
use crate::service::ChangelogService;

/// Create request. Accepts the flat shape and the older nested shape:
///
/// ```json
/// { "repositoryUrl": "...", "content": "...", "generatedAt": "...",
///   "periodStart": "...", "periodEnd": "..." }
///
/// { "repoUrl": "...", "content": "...",
///   "metadata": { "generatedAt": "...", "period": { "start": "...", "end": "..." } } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreateChangelogRequest {
    Flat(NewChangelogInput),
    Nested(NestedCreateRequest),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedCreateRequest {
    #[serde(alias = "repositoryUrl")]
    pub repo_url: String,
    pub content: String,
    pub metadata: CreateMetadata,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetadata {
    pub generated_at: String,
    pub period: ReportingPeriod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingPeriod {
    pub start: String,
    pub end: String,
}

impl From<CreateChangelogRequest> for NewChangelogInput {
    fn from(request: CreateChangelogRequest) -> Self {
        match request {
            CreateChangelogRequest::Flat(input) => input,
            CreateChangelogRequest::Nested(n) => NewChangelogInput {
                repository_url: n.repo_url,
                content: n.content,
                generated_at: n.metadata.generated_at,
                period_start: n.metadata.period.start,
                period_end: n.metadata.period.end,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChangelogResponse {
    pub id: String,
}

/// Optional list filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChangelogsQuery {
    #[serde(default, alias = "repoUrl")]
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteChangelogRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteChangelogResponse {
    pub success: bool,
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status: 200, body },
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response body");
                Self {
                    status: 500,
                    body: json!({ "error": "Failed to encode response", "code": "ENCODE_FAILED" }),
                }
            }
        }
    }

    fn error(err: &ChangelogError) -> Self {
        let message = match err {
            ChangelogError::Validation(v) => v.to_string(),
            ChangelogError::CreateFailed => "Failed to create changelog".to_string(),
            ChangelogError::ListFailed => "Failed to fetch changelogs".to_string(),
            ChangelogError::DeleteFailed => "Failed to delete changelog".to_string(),
        };
        Self {
            status: err.status(),
            body: json!({ "error": message, "code": err.code() }),
        }
    }

    fn from_result<T: Serialize>(result: Result<T, ChangelogError>) -> Self {
        match result {
            Ok(value) => Self::ok(&value),
            Err(err) => Self::error(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handle a create request given as raw JSON.
pub async fn create_from_json(service: &ChangelogService, body: &str) -> ApiResponse {
    match serde_json::from_str::<CreateChangelogRequest>(body) {
        Ok(request) => create(service, request).await,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected create request body");
            ApiResponse::error(&ValidationError::MalformedBody(
                "expected repositoryUrl, content, generatedAt, periodStart, periodEnd".to_string(),
            )
            .into())
        }
    }
}

/// Handle a decoded create request.
pub async fn create(service: &ChangelogService, request: CreateChangelogRequest) -> ApiResponse {
    let result = service
        .create(request.into())
        .await
        .map(|id| CreateChangelogResponse { id });
    ApiResponse::from_result(result)
}

/// Handle a list request. The body is an array of canonical records.
pub async fn list(service: &ChangelogService, query: &ListChangelogsQuery) -> ApiResponse {
    let result = service
        .list_changelogs(query.repository_url.as_deref())
        .await;
    ApiResponse::from_result(result)
}

/// Handle a delete request. A missing id answers `success: false`.
pub async fn delete(service: &ChangelogService, request: &DeleteChangelogRequest) -> ApiResponse {
    let result = service
        .delete_changelog(&request.id)
        .await
        .map(|success| DeleteChangelogResponse { success });
    ApiResponse::from_result(result)
}
