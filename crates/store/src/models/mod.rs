mod book;

pub(crate) use self::book::{BookRow, details_to_json};
