//! Changelog persistence layer.
//!
//! One capability trait, [`ChangelogBackend`], with three implementations:
//! - [`SqliteStore`]: embedded file (or in-memory) database
//! - [`RedisStore`]: key-value store with a per-repository sorted index
//! - [`PostgresStore`]: remote relational database
//!
//! [`connect`] picks one from configuration.

mod backend;
mod kv;
mod postgres;
mod sqlite;
mod store;

pub use backend::ChangelogBackend;
pub use kv::RedisStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use store::connect;
