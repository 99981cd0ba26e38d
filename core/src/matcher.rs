//! Key set operations between the old and new key indexes.

use crate::key_index::{IndexedRow, KeyIndex};

/// A key present in both datasets.
#[derive(Debug, Clone)]
pub struct CommonRow<'i, 'a> {
    pub old: &'i IndexedRow<'a>,
    pub new: &'i IndexedRow<'a>,
}

/// Partition of all valid keys.
///
/// - `added`: keys only in `new`, in `new`'s first-seen order
/// - `removed`: keys only in `old`, in `old`'s first-seen order
/// - `common`: keys in both, in `old`'s first-seen order
#[derive(Debug, Clone, Default)]
pub struct RowMatch<'i, 'a> {
    pub added: Vec<&'i IndexedRow<'a>>,
    pub removed: Vec<&'i IndexedRow<'a>>,
    pub common: Vec<CommonRow<'i, 'a>>,
}

/// Splits keys into added, removed and common in `O(|old| + |new|)`. Ordering comes from
/// the indexes' entry order, never from hash iteration.
pub fn match_rows<'i, 'a>(old: &'i KeyIndex<'a>, new: &'i KeyIndex<'a>) -> RowMatch<'i, 'a> {
    let mut result = RowMatch {
        added: Vec::new(),
        removed: Vec::new(),
        common: Vec::with_capacity(old.len().min(new.len())),
    };

    for old_entry in old.iter() {
        match new.get_canonical(&old_entry.canonical) {
            Some(new_entry) => result.common.push(CommonRow {
                old: old_entry,
                new: new_entry,
            }),
            None => result.removed.push(old_entry),
        }
    }

    result.added = new
        .iter()
        .filter(|entry| old.get_canonical(&entry.canonical).is_none())
        .collect();

    result
}
