//! Dedup of freshly fetched messages against persisted history.

use std::collections::HashSet;

use shinbun_core::{Message, MessageTs};

/// Union of `fresh` and `persisted`, unique by timestamp.
///
/// The first occurrence wins and fresh messages come first, so a message
/// present in both keeps its fetched text and link. Relative order within
/// each input is preserved.
pub fn merge(fresh: Vec<Message>, persisted: Vec<Message>) -> Vec<Message> {
    let mut seen: HashSet<MessageTs> = HashSet::with_capacity(fresh.len() + persisted.len());
    fresh
        .into_iter()
        .chain(persisted)
        .filter(|m| seen.insert(m.ts.clone()))
        .collect()
}
