use clap::{Parser, Subcommand, ValueEnum};
use shelf_catalog::{Namespace, Status};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Configuration file (defaults to `config.toml` in the platform config
    /// directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory of saved catalog responses, one `<isbn>.json` each, used to
    /// backfill book details.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a view of the reading list.
    List {
        #[arg(value_enum, default_value_t = View::ToRead)]
        view: View,
    },
    /// Add books by ISBN, to the end of the to-read list.
    Add {
        #[arg(required = true)]
        isbns: Vec<String>,
    },
    /// Add every entry of a Libby timeline export.
    Import { export: PathBuf },
    /// Remove a book.
    Remove { id: i64 },
    /// Move the book at one position to another (positions start at 0).
    Move {
        #[arg(value_enum)]
        view: Ranked,
        from: usize,
        to: usize,
    },
    /// Change a book's reading status.
    Status {
        id: i64,
        #[arg(value_enum)]
        status: StatusArg,
    },
    Favorite { id: i64 },
    Unfavorite { id: i64 },
    /// Pick a random book to read next.
    Spin {
        /// Make the pick reproducible.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Search the catalog.
    Search { query: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    ToRead,
    Favorites,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ranked {
    ToRead,
    Favorites,
}
impl From<Ranked> for Namespace {
    fn from(value: Ranked) -> Self {
        match value {
            Ranked::ToRead => Namespace::ToRead,
            Ranked::Favorites => Namespace::Favorites,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    ToRead,
    Reading,
    Read,
}
impl From<StatusArg> for Status {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::ToRead => Status::ToRead,
            StatusArg::Reading => Status::ReadingNow,
            StatusArg::Read => Status::AlreadyRead,
        }
    }
}
