//! Catalog provider backed by a directory of saved catalog responses.
//!
//! Each file in the directory is a Google Books `volumes` response named
//! after the ISBN it answers (`9780553897845.json`). Lookups read exactly one
//! file; searches decode every file and match on title and authors. Useful
//! offline, and as a way to pin metadata for books the catalog gets wrong.

use crate::MetadataProvider;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use shelf_catalog::BookDetails;
use shelf_catalog::google::decode_volumes;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Clone)]
pub struct DirectoryProvider {
    name: String,
    root: PathBuf,
}
impl DirectoryProvider {
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// ISBNs become file names, so anything that isn't plainly an ISBN is
    /// refused before it gets near the filesystem.
    fn path_for(&self, isbn: &str) -> Option<PathBuf> {
        let isbn = isbn.trim();
        let plausible = !isbn.is_empty() && isbn.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        plausible.then(|| self.root.join(format!("{isbn}.json")))
    }

    fn map_io_error(e: std::io::Error, isbn: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(isbn.to_string()),
            _ => ErrorKind::Unavailable(e.to_string()),
        }
    }

    fn matches(details: &BookDetails, needle: &str) -> bool {
        details.title.to_lowercase().contains(needle)
            || details.authors.iter().any(|a| a.to_lowercase().contains(needle))
    }
}

#[async_trait]
impl MetadataProvider for DirectoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_by_isbn(&self, isbn: &str) -> Result<BookDetails> {
        let path = self.path_for(isbn).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(isbn.to_string())))?;
        let body = fs::read(&path).await.map_err(|e| Self::map_io_error(e, isbn))?;
        let volumes = decode_volumes(&body).or_raise(|| ErrorKind::Decode)?;
        volumes.into_iter().next().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(isbn.to_string())))
    }

    async fn search(&self, query: &str) -> Result<Vec<BookDetails>> {
        let needle = query.trim().to_lowercase();
        let mut dir = fs::read_dir(&self.root).await.map_err(|e| ErrorKind::Unavailable(e.to_string()))?;
        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| ErrorKind::Unavailable(e.to_string()))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        // Directory iteration order is unspecified; keep results stable.
        paths.sort();
        let mut results = Vec::new();
        for path in paths {
            let body = fs::read(&path).await.map_err(|e| ErrorKind::Unavailable(e.to_string()))?;
            match decode_volumes(&body) {
                Ok(volumes) => results.extend(volumes.into_iter().filter(|d| Self::matches(d, &needle))),
                // One corrupt file shouldn't take the whole search down with it.
                Err(e) => tracing::warn!(path = %path.display(), error = ?e, "Skipping undecodable catalog file"),
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(isbn: &str, title: &str, author: &str) -> String {
        format!(
            r#"{{"items":[{{"volumeInfo":{{"title":"{title}","authors":["{author}"],"industryIdentifiers":[{{"type":"ISBN_13","identifier":"{isbn}"}}]}}}}]}}"#
        )
    }

    fn provider_with(files: &[(&str, String)]) -> (tempfile::TempDir, DirectoryProvider) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let provider = DirectoryProvider::new("directory", dir.path());
        (dir, provider)
    }

    #[tokio::test]
    async fn test_fetch_reads_named_file() {
        let (_dir, provider) = provider_with(&[(
            "9780553897845.json",
            volume("9780553897845", "A Game of Thrones", "George R. R. Martin"),
        )]);
        let details = provider.fetch_by_isbn("9780553897845").await.unwrap();
        assert_eq!(details.title, "A Game of Thrones");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_not_found() {
        let (_dir, provider) = provider_with(&[]);
        let err = provider.fetch_by_isbn("9780553385953").await.unwrap_err();
        assert_eq!(&*err, &ErrorKind::NotFound("9780553385953".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_refuses_path_like_isbn() {
        let (_dir, provider) = provider_with(&[]);
        let err = provider.fetch_by_isbn("../etc/passwd").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_garbage_is_decode_error() {
        let (_dir, provider) = provider_with(&[("1.json", "not json".to_string())]);
        let err = provider.fetch_by_isbn("1").await.unwrap_err();
        assert_eq!(&*err, &ErrorKind::Decode);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_matches_title_and_author() {
        let (_dir, provider) = provider_with(&[
            ("1.json", volume("1", "A Game of Thrones", "George R. R. Martin")),
            ("2.json", volume("2", "The Hobbit", "J. R. R. Tolkien")),
            ("3.json", "corrupt".to_string()),
        ]);
        let by_title = provider.search("hobbit").await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].isbn, "2");
        let by_author = provider.search("Martin").await.unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].isbn, "1");
    }
}
