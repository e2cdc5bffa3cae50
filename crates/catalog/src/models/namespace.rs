use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::{Book, sanitize};
use crate::error::{Error, ErrorKind};

/// An independent ordinal ordering domain.
///
/// Each namespace numbers its members `0..n` with no gaps, regardless of
/// what the other namespace is doing with the same books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Every book not yet read, ordered by `ranking`.
    ToRead,
    /// Every favorite whatever its status, ordered by `favorite_ranking`.
    Favorites,
}
impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::ToRead, Namespace::Favorites];

    /// Whether `book` passes this namespace's filter.
    pub fn contains(&self, book: &Book) -> bool {
        match self {
            Namespace::ToRead => book.status.is_unread(),
            Namespace::Favorites => book.is_favorite,
        }
    }

    /// The ranking field this namespace owns.
    pub fn rank_of(&self, book: &Book) -> u32 {
        match self {
            Namespace::ToRead => book.ranking,
            Namespace::Favorites => book.favorite_ranking,
        }
    }

    pub fn set_rank(&self, book: &mut Book, rank: u32) {
        match self {
            Namespace::ToRead => book.ranking = rank,
            Namespace::Favorites => book.favorite_ranking = rank,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::ToRead => "to-read",
            Namespace::Favorites => "favorites",
        }
    }
}
impl FromStr for Namespace {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "toread" | "tbr" | "tobereads" | "toberead" => Self::ToRead,
            "favorites" | "favourites" | "favs" | "fav" => Self::Favorites,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "namespace",
                value: s.to_string(),
            }),
        })
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookId, Status, UNRANKED};
    use time::UtcDateTime;

    fn book(status: Status, is_favorite: bool) -> Book {
        Book {
            id: BookId(1),
            isbn: "9780553897876".to_string(),
            details: None,
            status,
            ranking: 3,
            favorite_ranking: UNRANKED,
            is_favorite,
            date_added: UtcDateTime::now(),
            date_read: None,
        }
    }

    #[test]
    fn test_reading_now_stays_in_to_read() {
        assert!(Namespace::ToRead.contains(&book(Status::ReadingNow, false)));
        assert!(!Namespace::ToRead.contains(&book(Status::AlreadyRead, true)));
    }

    #[test]
    fn test_favorites_ignore_status() {
        assert!(Namespace::Favorites.contains(&book(Status::AlreadyRead, true)));
        assert!(!Namespace::Favorites.contains(&book(Status::ToRead, false)));
    }

    #[test]
    fn test_set_rank_touches_only_its_field() {
        let mut b = book(Status::ToRead, true);
        Namespace::Favorites.set_rank(&mut b, 0);
        assert_eq!(b.favorite_ranking, 0);
        assert_eq!(b.ranking, 3);
    }

    #[test]
    fn test_parse_round_trips_display() {
        for ns in Namespace::ALL {
            assert_eq!(ns.to_string().parse::<Namespace>().unwrap(), ns);
        }
    }
}
