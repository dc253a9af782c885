//! Command-line interface.

mod changelog;

pub use changelog::{ChangelogCommand, run_changelog_command};

use clap::Parser;

/// Store and browse generated repository changelogs.
#[derive(Parser, Debug)]
#[command(name = "gramophone", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: ChangelogCommand,
}
