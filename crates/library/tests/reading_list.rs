use futures::StreamExt;
use shelf_catalog::{Book, BookDetails, Namespace, Status, UNRANKED};
use shelf_config::Config;
use shelf_library::error::ErrorKind;
use shelf_library::ranking::{RankedView, is_contiguous};
use shelf_library::search::Phase;
use shelf_library::spin::RandomSelector;
use shelf_library::{ReadingList, enrich::Enrichment};
use shelf_provider::provider::MockProvider;
use shelf_store::{Change, Database};
use std::sync::Arc;

fn catalog() -> Vec<BookDetails> {
    vec![
        BookDetails::new("9780553897845", "A Game of Thrones").with_authors(["George R. R. Martin"]),
        BookDetails::new("9780553897876", "A Storm of Swords").with_authors(["George R. R. Martin"]),
        BookDetails::new("9780441013593", "Dune").with_authors(["Frank Herbert"]),
        BookDetails::new("9780261103344", "The Hobbit").with_authors(["J. R. R. Tolkien"]),
    ]
}

async fn reading_list() -> (Database, Arc<MockProvider>, ReadingList) {
    let db = Database::connect_in_memory().await.unwrap();
    let provider = Arc::new(MockProvider::with_books(catalog()));
    let mut config = Config::default();
    config.search.debounce_ms = 20;
    let list = ReadingList::new(&db, provider.clone(), &config).with_selector(RandomSelector::from_seed(2024));
    (db, provider, list)
}

fn titles(books: &[Book]) -> Vec<&str> {
    books.iter().map(Book::title).collect()
}

fn ranks(view: &RankedView) -> Vec<u32> {
    view.iter().map(|b| view.namespace.rank_of(b)).collect()
}

#[tokio::test]
async fn test_rankings_stay_contiguous_through_mixed_operations() {
    let (_db, _provider, list) = reading_list().await;
    let books = list.add_isbns(["a", "b", "c", "d", "e", "f"]).await.unwrap();
    for book in &books[1..5] {
        list.set_favorite(book.id, true).await.unwrap();
    }
    list.view(Namespace::Favorites).await.unwrap();

    list.delete(books[2].id).await.unwrap();
    list.move_items(Namespace::ToRead, &[4], 0).await.unwrap();
    list.move_items(Namespace::Favorites, &[0, 2], 3).await.unwrap();
    list.set_status(books[0].id, Status::AlreadyRead).await.unwrap();
    list.set_status(books[3].id, Status::ReadingNow).await.unwrap();
    list.set_favorite(books[4].id, false).await.unwrap();
    list.add_isbns(["g"]).await.unwrap();
    list.set_status(books[0].id, Status::ToRead).await.unwrap();

    for namespace in Namespace::ALL {
        let view = list.view(namespace).await.unwrap();
        assert!(is_contiguous(namespace, &view.books), "{namespace}: {:?}", ranks(&view));
        assert_eq!(view.last_ranking(), view.len().checked_sub(1).map(|n| n as u32));
    }
    let to_read = list.view(Namespace::ToRead).await.unwrap();
    assert_eq!(to_read.len(), 6);
    assert_eq!(to_read.books.last().unwrap().isbn, "a", "un-read book goes to the end");
    assert_eq!(list.view(Namespace::Favorites).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_marking_a_book_read_drops_it_from_to_read() {
    let (_db, _provider, list) = reading_list().await;
    let books = list.add_isbns(["A", "B", "C"]).await.unwrap();
    let view = list.view(Namespace::ToRead).await.unwrap();
    assert_eq!(ranks(&view), vec![0, 1, 2]);

    list.set_status(books[1].id, Status::AlreadyRead).await.unwrap();
    let view = list.view(Namespace::ToRead).await.unwrap();
    assert_eq!(view.iter().map(|b| b.isbn.as_str()).collect::<Vec<_>>(), vec!["A", "C"]);
    assert_eq!(ranks(&view), vec![0, 1]);
    let read = list.read_view().await.unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].isbn, "B");
}

#[tokio::test]
async fn test_first_favorite_is_unranked_until_the_next_pass() {
    let (_db, _provider, list) = reading_list().await;
    let a = list.add(catalog()[0].clone()).await.unwrap();
    let a = list.set_favorite(a.id, true).await.unwrap();
    assert_eq!(a.favorite_ranking, UNRANKED);
    let favorites = list.view(Namespace::Favorites).await.unwrap();
    assert_eq!(ranks(&favorites), vec![0]);
}

#[tokio::test]
async fn test_viewing_twice_writes_nothing_the_second_time() {
    let (db, _provider, list) = reading_list().await;
    let books = list.add_isbns(["a", "b", "c"]).await.unwrap();
    for book in &books {
        list.set_favorite(book.id, true).await.unwrap();
    }
    list.view(Namespace::Favorites).await.unwrap();
    list.settle().await;

    let mut changes = db.subscribe();
    let first = list.view(Namespace::Favorites).await.unwrap();
    let second = list.view(Namespace::Favorites).await.unwrap();
    assert_eq!(first.ids(), second.ids());
    list.settle().await;
    while let Ok(change) = changes.try_recv() {
        assert!(!matches!(change, Change::Reranked(_)), "unexpected {change:?}");
    }
}

#[tokio::test]
async fn test_viewing_backfills_missing_details() {
    let (_db, provider, list) = reading_list().await;
    let mut events = list.reconciler().subscribe();
    let books = list.add_isbns(["9780441013593", "9780261103344"]).await.unwrap();
    assert!(books.iter().all(Book::needs_details));

    list.view(Namespace::ToRead).await.unwrap();
    list.settle().await;
    let view = list.view(Namespace::ToRead).await.unwrap();
    assert_eq!(titles(&view.books), vec!["Dune", "The Hobbit"]);
    assert!(matches!(events.recv().await.unwrap(), Enrichment::Filled(_)));
    assert!(matches!(events.recv().await.unwrap(), Enrichment::Filled(_)));

    // Details present now: no further fetches.
    list.view(Namespace::ToRead).await.unwrap();
    list.settle().await;
    assert_eq!(provider.fetch_count("9780441013593"), 1);
    assert_eq!(provider.fetch_count("9780261103344"), 1);
}

#[tokio::test]
async fn test_books_added_from_search_are_never_fetched() {
    let (_db, provider, list) = reading_list().await;
    list.add(catalog()[2].clone()).await.unwrap();
    list.view(Namespace::ToRead).await.unwrap();
    list.read_view().await.unwrap();
    list.settle().await;
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_search_through_the_list() {
    let (_db, provider, list) = reading_list().await;
    list.search("du");
    list.settle().await;
    assert!(provider.searches().is_empty());

    list.search("dun");
    list.search("dune");
    list.settle().await;
    assert_eq!(provider.searches(), vec!["dune".to_string()]);
    let snapshot = list.search_snapshot();
    assert_eq!(snapshot.phase, Phase::Results);
    assert!(snapshot.is_searching());

    let picked = list.add(snapshot.results[0].clone()).await.unwrap();
    assert_eq!(picked.title(), "Dune");
    assert_eq!(picked.ranking, 0);
}

#[tokio::test]
async fn test_search_results_can_go_straight_to_read_or_favorites() {
    let (_db, _provider, list) = reading_list().await;
    list.add_isbns(["a"]).await.unwrap();
    let earlier = list.add_isbns(["b"]).await.unwrap().remove(0);
    list.set_status(earlier.id, Status::AlreadyRead).await.unwrap();

    let read = list.add_read(catalog()[2].clone()).await.unwrap();
    assert_eq!(read.status, Status::AlreadyRead);
    assert!(read.date_read.is_some());
    assert_eq!(titles(&list.read_view().await.unwrap()), vec!["b", "Dune"]);

    let favorite = list.add_favorite(catalog()[3].clone()).await.unwrap();
    assert!(favorite.is_favorite);
    assert_eq!(titles(&list.view(Namespace::Favorites).await.unwrap().books), vec!["The Hobbit"]);
    assert_eq!(titles(&list.view(Namespace::ToRead).await.unwrap().books), vec!["a", "The Hobbit"]);
}

#[tokio::test]
async fn test_spin_picks_from_to_read() {
    let (_db, _provider, list) = reading_list().await;
    let err = list.spin().await.unwrap_err();
    assert_eq!(&*err, &ErrorKind::Spin);

    let books = list.add_isbns(["a", "b", "c", "d", "e"]).await.unwrap();
    list.set_status(books[0].id, Status::AlreadyRead).await.unwrap();
    for _ in 0..25 {
        let draw = list.spin().await.unwrap();
        assert_eq!(draw.candidates().len(), 4);
        assert_eq!(draw.spin().wheel.count(), draw.candidates().len());
        assert_ne!(draw.target().id, books[0].id);
        assert_eq!(draw.settle(draw.spin().stop_angle).id, draw.target().id);
        assert_eq!(draw.settle(draw.spin().stop_angle_from(1234.5)).id, draw.target().id);
    }
}

#[tokio::test]
async fn test_seeded_spins_are_reproducible() {
    let (db, provider, list) = reading_list().await;
    list.add_isbns(["a", "b", "c", "d", "e", "f", "g"]).await.unwrap();
    let again = ReadingList::new(&db, provider, &Config::default()).with_selector(RandomSelector::from_seed(2024));
    for _ in 0..5 {
        assert_eq!(list.spin().await.unwrap().spin().target, again.spin().await.unwrap().spin().target);
    }
}

#[tokio::test]
async fn test_import_libby_export() {
    let (_db, provider, list) = reading_list().await;
    let export = r#"{
        "version": 1,
        "timeline": [
            {"cover": {"url": "https://img.example/got.jpg"}, "title": {"text": "A Game of Thrones"},
             "author": "George R. R. Martin", "isbn": "9780553897845", "timestamp": 1719705600000, "activity": "Borrowed"},
            {"cover": {"url": "https://img.example/got.jpg"}, "title": {"text": "A Game of Thrones"},
             "author": "George R. R. Martin", "isbn": "9780553897845", "timestamp": 1722384000000, "activity": "Borrowed"},
            {"cover": {"url": "https://img.example/dune.jpg"}, "title": {"text": "Dune"},
             "author": "Frank Herbert", "isbn": "9780441013593", "timestamp": 1725062400000, "activity": "Returned"}
        ]
    }"#;
    let added = list.import(export).await.unwrap();
    assert_eq!(added.len(), 3, "repeat borrows are kept");
    let view = list.view(Namespace::ToRead).await.unwrap();
    assert_eq!(titles(&view.books), vec!["A Game of Thrones", "A Game of Thrones", "Dune"]);
    assert_eq!(ranks(&view), vec![0, 1, 2]);
    assert_eq!(view.books[0].date_added.unix_timestamp(), 1_719_705_600);
    list.settle().await;
    assert!(provider.calls().is_empty(), "imported details are kept as they are");

    let err = list.import("not json").await.unwrap_err();
    assert_eq!(&*err, &ErrorKind::Import);
}

#[tokio::test]
async fn test_refused_operations() {
    let (_db, _provider, list) = reading_list().await;
    list.add_isbns(["a"]).await.unwrap();
    let err = list.move_items(Namespace::ToRead, &[3], 0).await.unwrap_err();
    assert_eq!(&*err, &ErrorKind::Ranking);
    assert!(!err.is_retryable());
    let err = list.set_status(shelf_catalog::BookId(99), Status::ToRead).await.unwrap_err();
    assert_eq!(&*err, &ErrorKind::Ranking);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_store_error() {
    let (db, _provider, list) = reading_list().await;
    db.close().await;
    let err = list.view(Namespace::ToRead).await.unwrap_err();
    assert_eq!(&*err, &ErrorKind::Store);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_views_follow_changes() {
    let (_db, _provider, list) = reading_list().await;
    let mut views = Box::pin(list.views(Namespace::ToRead));
    assert!(views.next().await.unwrap().unwrap().is_empty());

    list.add_isbns(["a"]).await.unwrap();
    let view = views.next().await.unwrap().unwrap();
    assert_eq!(view.len(), 1);
}
