//! Changelog CLI commands.
//!
//! Drives the changelog service directly: create, list, delete, status.

use std::io::Read;

use clap::Subcommand;

use crate::api::{self, DeleteChangelogRequest, ListChangelogsQuery};
use crate::changelog::{ChangelogRecord, group_for_display, repository_display_name};
use crate::service::ChangelogService;

#[derive(Subcommand, Debug, Clone)]
pub enum ChangelogCommand {
    /// Create the storage schema (safe to repeat)
    Init,

    /// Store a new changelog
    Create {
        /// Repository URL (e.g., "https://github.com/owner/repo")
        #[arg(short, long)]
        repo: String,

        /// When the changelog was generated (ISO-8601)
        #[arg(long)]
        generated_at: String,

        /// Start of the reporting window (ISO-8601)
        #[arg(long)]
        period_start: String,

        /// End of the reporting window (ISO-8601)
        #[arg(long)]
        period_end: String,

        /// Markdown content (omit to read from stdin)
        content: Option<String>,
    },

    /// Store a new changelog from a JSON request body on stdin
    Import,

    /// List changelogs, newest first
    List {
        /// Only this repository
        #[arg(short, long)]
        repo: Option<String>,

        /// Group by repository
        #[arg(short, long)]
        grouped: bool,

        /// Print the JSON response body instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a changelog by id
    Delete {
        /// Changelog id
        id: String,
    },

    /// Show backend and record count
    Status,
}

/// Run a changelog command against an initialized service.
pub async fn run_changelog_command(
    cmd: ChangelogCommand,
    service: &ChangelogService,
) -> anyhow::Result<()> {
    match cmd {
        // Bootstrap already initialized the backend.
        ChangelogCommand::Init => {
            println!("Schema ready ({})", service.backend().kind());
            Ok(())
        }
        ChangelogCommand::Create {
            repo,
            generated_at,
            period_start,
            period_end,
            content,
        } => create(service, &repo, &generated_at, &period_start, &period_end, content).await,
        ChangelogCommand::Import => import(service).await,
        ChangelogCommand::List {
            repo,
            grouped,
            json,
        } => list(service, repo, grouped, json).await,
        ChangelogCommand::Delete { id } => delete(service, &id).await,
        ChangelogCommand::Status => status(service).await,
    }
}

async fn create(
    service: &ChangelogService,
    repo: &str,
    generated_at: &str,
    period_start: &str,
    period_end: &str,
    content: Option<String>,
) -> anyhow::Result<()> {
    let content = match content {
        Some(c) => c,
        None => read_stdin()?,
    };

    let id = service
        .create_changelog(repo, &content, generated_at, period_start, period_end)
        .await?;
    println!("{}", id);
    Ok(())
}

async fn import(service: &ChangelogService) -> anyhow::Result<()> {
    let body = read_stdin()?;
    let response = api::create_from_json(service, &body).await;
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if !response.is_success() {
        anyhow::bail!("Import failed with status {}", response.status);
    }
    Ok(())
}

async fn list(
    service: &ChangelogService,
    repo: Option<String>,
    grouped: bool,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let query = ListChangelogsQuery {
            repository_url: repo,
        };
        let response = api::list(service, &query).await;
        println!("{}", serde_json::to_string_pretty(&response.body)?);
        if !response.is_success() {
            anyhow::bail!("List failed with status {}", response.status);
        }
        return Ok(());
    }

    let records = service.list_changelogs(repo.as_deref()).await?;
    if records.is_empty() {
        println!("No changelogs stored.");
        return Ok(());
    }

    if grouped {
        for (url, group) in group_for_display(&records) {
            println!("{} ({})", repository_display_name(&url), group.len());
            for record in &group {
                println!("  {}", summary_line(record));
            }
        }
    } else {
        for record in &records {
            println!(
                "{}  {}",
                summary_line(record),
                repository_display_name(&record.repository_url)
            );
        }
    }
    Ok(())
}

async fn delete(service: &ChangelogService, id: &str) -> anyhow::Result<()> {
    let response = api::delete(
        service,
        &DeleteChangelogRequest { id: id.to_string() },
    )
    .await;
    if !response.is_success() {
        anyhow::bail!("Delete failed with status {}", response.status);
    }
    if response.body["success"] == true {
        println!("Deleted {}", id);
    } else {
        println!("No changelog with id {}", id);
    }
    Ok(())
}

async fn status(service: &ChangelogService) -> anyhow::Result<()> {
    let status = service.status().await?;
    println!("Changelog Store");
    println!("  Backend: {}", status.backend);
    println!("  Records: {}", status.records);
    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// `<generatedAt>  <id>  <first content line>`
fn summary_line(record: &ChangelogRecord) -> String {
    let title = record
        .content
        .lines()
        .map(|l| l.trim().trim_start_matches('#').trim())
        .find(|l| !l.is_empty())
        .unwrap_or("(empty)");
    format!(
        "{}  {}  {}",
        record.generated_at,
        record.id,
        truncate_content(title, 60)
    )
}

fn truncate_content(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
