//! Changelog record model and read-side views.
//!
//! - [`record`]: canonical and storage forms plus the mapping between them
//! - [`view`]: repository grouping and display ordering
//! - [`timestamp`]: text timestamp parsing

pub mod record;
pub mod timestamp;
pub mod view;

pub use record::{
    ChangelogRecord, NewChangelogInput, StorageRecord, to_canonical_form, to_storage_form,
};
pub use view::{
    RepositoryGroups, group_by_repository, group_for_display, repository_display_name,
    sorted_by_generated_desc,
};
