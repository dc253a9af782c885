//! Gramophone: changelog persistence for repository browsing.
//!
//! Changelog records are stored through one [`history::ChangelogBackend`]
//! (SQLite, Redis, or Postgres, picked by `DATABASE_URL`) and served through
//! [`service::ChangelogService`]. [`api`] is the request/response contract
//! for whatever presentation layer sits on top.

pub mod api;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod service;

pub use changelog::{ChangelogRecord, NewChangelogInput};
pub use error::{ChangelogError, DatabaseError};
pub use service::ChangelogService;
