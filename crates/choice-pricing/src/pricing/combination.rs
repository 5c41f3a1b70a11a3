//! Canonical, order-independent identities for a set of selected options.

use super::domain::Selection;

pub const KEY_DELIMITER: char = '+';

/// Build the combination key for a selection set.
///
/// Identifiers prefer the option key over the option id, are sorted lexicographically, and are
/// joined with [`KEY_DELIMITER`]. An empty selection set yields the empty key, which callers treat
/// as "no choice".
pub fn build_key(selections: &[Selection]) -> String {
    join_sorted(selections.iter().map(Selection::identity))
}

/// Build a key from option ids only, ignoring option keys.
pub fn build_id_key(selections: &[Selection]) -> String {
    join_sorted(selections.iter().map(|selection| selection.option_id.as_str()))
}

/// Re-sort the segments of an existing key.
pub fn canonicalize(key: &str) -> String {
    join_sorted(segments(key))
}

pub fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split(KEY_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

pub fn segment_count(key: &str) -> usize {
    segments(key).count()
}

fn join_sorted<'a, I>(identifiers: I) -> String
where
    I: Iterator<Item = &'a str>,
{
    let mut identifiers: Vec<&str> = identifiers.collect();
    identifiers.sort_unstable();

    let mut key = String::new();
    for (index, identifier) in identifiers.into_iter().enumerate() {
        if index > 0 {
            key.push(KEY_DELIMITER);
        }
        key.push_str(identifier);
    }
    key
}
