mod cli;
mod logging;

use crate::cli::{Cli, Command, View};
use clap::Parser;
use derive_more::{Display, Error};
use exn::ResultExt;
use shelf_catalog::{Book, BookId, Namespace};
use shelf_config::Config;
use shelf_library::ReadingList;
use shelf_library::spin::RandomSelector;
use shelf_provider::ProviderHandle;
use shelf_provider::provider::DirectoryProvider;
use shelf_store::Database;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

type Result<T> = std::result::Result<T, exn::Exn<ErrorKind>>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the reading list database")]
    Database,
    #[display("could not read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    #[display("{_0} failed")]
    Command(#[error(not(source))] &'static str),
    #[display("no book with id {_0}")]
    NotFound(#[error(not(source))] BookId),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    logging::init(&config.log_level);
    tracing::debug!(?cli, "Parsed command line");

    if let Some(parent) = config.database.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
    }
    let db = Database::connect_with(&config.database.path, config.database.max_connections)
        .await
        .or_raise(|| ErrorKind::Database)?;

    // Without a catalog directory every lookup comes back "not found" and
    // books simply stay pending.
    let catalog = cli.catalog.clone().unwrap_or_else(|| default_catalog(&config));
    let provider: ProviderHandle = Arc::new(DirectoryProvider::new("directory", catalog));
    let mut list = ReadingList::new(&db, provider, &config);
    if let Command::Spin { seed: Some(seed) } = cli.command {
        list = list.with_selector(RandomSelector::from_seed(seed).with_rotations(config.spin.rotations()));
    }

    let result = execute(&list, cli.command).await;
    // Let backfills started by this command land before the pool goes away.
    list.settle().await;
    db.close().await;
    result
}

fn default_catalog(config: &Config) -> PathBuf {
    config
        .database
        .path
        .parent()
        .map_or_else(|| PathBuf::from("catalog"), |dir| dir.join("catalog"))
}

async fn execute(list: &ReadingList, command: Command) -> Result<()> {
    match command {
        Command::List { view } => {
            let books = match view {
                View::ToRead => list.view(Namespace::ToRead).await.map(|v| v.books),
                View::Favorites => list.view(Namespace::Favorites).await.map(|v| v.books),
                View::Read => list.read_view().await,
            }
            .or_raise(|| ErrorKind::Command("list"))?;
            if books.is_empty() {
                println!("(empty)");
            }
            for (position, book) in books.iter().enumerate() {
                println!("{position:>3}. {}", describe(book));
            }
        },
        Command::Add { isbns } => {
            let added = list.add_isbns(isbns).await.or_raise(|| ErrorKind::Command("add"))?;
            for book in &added {
                println!("added {}", describe(book));
            }
        },
        Command::Import { export } => {
            let body = tokio::fs::read(&export).await.or_raise(|| ErrorKind::Read(export.clone()))?;
            let added = list.import(body).await.or_raise(|| ErrorKind::Command("import"))?;
            println!("imported {} books", added.len());
        },
        Command::Remove { id } => {
            let id = BookId(id);
            if !list.delete(id).await.or_raise(|| ErrorKind::Command("remove"))? {
                exn::bail!(ErrorKind::NotFound(id));
            }
            println!("removed {id}");
        },
        Command::Move { view, from, to } => {
            let view = list.move_items(view.into(), &[from], to).await.or_raise(|| ErrorKind::Command("move"))?;
            for (position, book) in view.iter().enumerate() {
                println!("{position:>3}. {}", describe(book));
            }
        },
        Command::Status { id, status } => {
            let book = list.set_status(BookId(id), status.into()).await.or_raise(|| ErrorKind::Command("status"))?;
            println!("{}: {}", describe(&book), book.status);
        },
        Command::Favorite { id } => {
            let book = list.set_favorite(BookId(id), true).await.or_raise(|| ErrorKind::Command("favorite"))?;
            println!("favorited {}", describe(&book));
        },
        Command::Unfavorite { id } => {
            let book = list.set_favorite(BookId(id), false).await.or_raise(|| ErrorKind::Command("unfavorite"))?;
            println!("unfavorited {}", describe(&book));
        },
        Command::Spin { .. } => {
            let draw = list.spin().await.or_raise(|| ErrorKind::Command("spin"))?;
            let landed = draw.settle(draw.spin().stop_angle);
            println!(
                "the wheel turns {:.1} degrees over {} candidates and lands on {}",
                draw.spin().stop_angle,
                draw.candidates().len(),
                describe(landed)
            );
        },
        Command::Search { query } => {
            list.search(query.join(" "));
            list.searcher().settle().await;
            let snapshot = list.search_snapshot();
            if let Some(failure) = &snapshot.failure {
                println!("search failed: {}", failure.kind);
            }
            for details in &snapshot.results {
                println!("{details}");
            }
        },
    }
    Ok(())
}

fn describe(book: &Book) -> String {
    match &book.details {
        Some(details) if details.authors.is_empty() => format!("[{}] {}", book.id, details.title),
        Some(details) => format!("[{}] {} by {}", book.id, details.title, details.authors.join(", ")),
        None => format!("[{}] {} (details pending)", book.id, book.isbn),
    }
}
