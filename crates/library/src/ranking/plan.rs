//! Pure ranking arithmetic, free of any storage.

use crate::ranking::error::{ErrorKind, Result};
use shelf_catalog::{Book, BookId, Namespace};
use std::collections::HashMap;

/// Move the items at `from` so they sit, in their original relative order,
/// just before the item that was at `to`.
///
/// Offsets refer to `seq` as it was before anything is removed, and `to` may
/// equal `seq.len()` to move to the end. Repeated offsets count once. Every
/// item not being moved keeps its relative order.
///
/// ```
/// use shelf_library::ranking::move_offsets;
///
/// let mut seq = vec!['a', 'b', 'c', 'd'];
/// move_offsets(&mut seq, &[0], 3).unwrap();
/// assert_eq!(seq, ['b', 'c', 'a', 'd']);
/// ```
pub fn move_offsets<T>(seq: &mut Vec<T>, from: &[usize], to: usize) -> Result<()> {
    let len = seq.len();
    if let Some(&offset) = from.iter().find(|&&offset| offset >= len) {
        exn::bail!(ErrorKind::InvalidOffset { offset, len });
    }
    if to > len {
        exn::bail!(ErrorKind::InvalidOffset { offset: to, len });
    }
    let mut from = from.to_vec();
    from.sort_unstable();
    from.dedup();
    // Items removed from in front of the destination shift it left.
    let insert_at = to - from.iter().filter(|&&offset| offset < to).count();
    let mut moved = Vec::with_capacity(from.len());
    for offset in from.into_iter().rev() {
        moved.push(seq.remove(offset));
    }
    moved.reverse();
    seq.splice(insert_at..insert_at, moved);
    Ok(())
}

/// The ranking writes that make `seq` number itself `0..n` in order.
///
/// Books already holding their position are left out, so planning an
/// already-contiguous sequence yields nothing to write.
pub fn plan(namespace: Namespace, seq: &[Book]) -> Vec<(BookId, u32)> {
    seq.iter()
        .zip(0u32..)
        .filter(|(book, rank)| namespace.rank_of(book) != *rank)
        .map(|(book, rank)| (book.id, rank))
        .collect()
}

/// Line a caller's ordering up with what is actually stored.
///
/// Every book in `ordered` is replaced by its stored copy, so rankings are
/// planned against stored values rather than whatever the caller last saw.
/// Books no longer stored are dropped, repeats count once, and stored books
/// the caller left out keep their stored order after the rest.
pub fn align(ordered: &[Book], stored: Vec<Book>) -> Vec<Book> {
    let position: HashMap<BookId, usize> = stored.iter().enumerate().map(|(i, book)| (book.id, i)).collect();
    let mut stored: Vec<Option<Book>> = stored.into_iter().map(Some).collect();
    let mut aligned: Vec<Book> = ordered
        .iter()
        .filter_map(|book| position.get(&book.id))
        .filter_map(|&i| stored[i].take())
        .collect();
    aligned.extend(stored.into_iter().flatten());
    aligned
}

pub fn is_contiguous(namespace: Namespace, seq: &[Book]) -> bool {
    plan(namespace, seq).is_empty()
}
