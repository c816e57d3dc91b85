//! Best-score reduction and ranking.
//!
//! One ordering is used everywhere: higher score first, then earlier
//! `created_at_ms`, then earlier insertion `seq`. The rank returned right
//! after a submission and the rank shown by a later listing are therefore
//! always the same number for the same history.

use core::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    pub player_name: String,
    pub score: u32,
    pub created_at_ms: i64,
    /// Insertion order in the store; breaks exact timestamp ties.
    pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub player_name: String,
    pub score: u32,
    pub created_at_ms: i64,
}

/// `Less` means `a` ranks above `b`.
pub fn canonical_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.created_at_ms.cmp(&b.created_at_ms))
        .then(a.seq.cmp(&b.seq))
}

/// Collapses history to one best entry per player name, in canonical order.
pub fn best_scores<'a, I>(history: I) -> Vec<ScoreEntry>
where
    I: IntoIterator<Item = &'a ScoreEntry>,
{
    let mut best: HashMap<&str, &ScoreEntry> = HashMap::new();
    for entry in history {
        best.entry(entry.player_name.as_str())
            .and_modify(|current| {
                if canonical_order(entry, *current) == Ordering::Less {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }

    let mut reduced: Vec<ScoreEntry> = best.into_values().cloned().collect();
    reduced.sort_by(canonical_order);
    reduced
}

/// One plus the number of best entries strictly ahead of `target`.
pub fn rank_of(best: &[ScoreEntry], target: &ScoreEntry) -> usize {
    1 + best
        .iter()
        .filter(|entry| canonical_order(entry, target) == Ordering::Less)
        .count()
}

/// First `limit` entries of an already reduced set, with 1-based ranks.
pub fn ranked_entries(best: &[ScoreEntry], limit: usize) -> Vec<RankedEntry> {
    best.iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| RankedEntry {
            rank: index + 1,
            player_name: entry.player_name.clone(),
            score: entry.score,
            created_at_ms: entry.created_at_ms,
        })
        .collect()
}
