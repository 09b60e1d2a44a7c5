//! Approximate phrase lookup over statement labels.
//!
//! A label matches a phrase when some substring of the label is within
//! `max_errors` Levenshtein edits (insertions, deletions, substitutions) of
//! the phrase. This tolerates typos and formatting drift between the
//! statements different firms produce.

use crate::error::{BreakdownError, Result};
use crate::normalizer::StatementRecord;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Smallest edit distance between `pattern` and any substring of `text`.
///
/// Standard approximate substring DP: the first row is all zeros so a match
/// may start anywhere in `text`, and the answer is the minimum of the last
/// row so it may end anywhere.
pub fn approximate_distance(pattern: &str, text: &str) -> usize {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    if pattern.is_empty() {
        return 0;
    }

    // prev[j]: distance of pattern[..i] against a substring ending at text[j]
    let mut prev = vec![0usize; text.len() + 1];
    let mut curr = vec![0usize; text.len() + 1];

    for (i, p) in pattern.iter().enumerate() {
        curr[0] = i + 1;
        for (j, t) in text.iter().enumerate() {
            let cost = if p == t { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev.into_iter().min().unwrap_or(pattern.len())
}

pub fn is_match(pattern: &str, text: &str, max_errors: usize) -> bool {
    approximate_distance(pattern, text) <= max_errors
}

/// Indices of every record whose label matches `phrase`, in document order.
pub fn find(records: &[StatementRecord], phrase: &str, max_errors: usize) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| is_match(phrase, &record.label, max_errors))
        .map(|(idx, _)| idx)
        .collect()
}

/// Outcome of a lookup that expects a single row.
///
/// All candidate rows are retained; `selected` is always the first one in
/// document order. Ambiguity is reported, never treated as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSelection {
    pub phrase: String,
    pub max_errors: usize,
    pub indices: Vec<usize>,
    pub selected: usize,
}

impl MatchSelection {
    pub fn is_ambiguous(&self) -> bool {
        self.indices.len() > 1
    }

    pub fn record<'a>(&self, records: &'a [StatementRecord]) -> &'a StatementRecord {
        &records[self.selected]
    }
}

pub fn find_unique(
    records: &[StatementRecord],
    phrase: &str,
    max_errors: usize,
) -> Result<MatchSelection> {
    let indices = find(records, phrase, max_errors);
    let selected = *indices.first().ok_or_else(|| BreakdownError::NotFound {
        phrase: phrase.to_string(),
        max_errors,
    })?;

    if indices.len() > 1 {
        warn!(
            "'{}' matched {} rows {:?}; using first match '{}'",
            phrase,
            indices.len(),
            indices,
            records[selected].label
        );
    } else {
        debug!("'{}' matched row {} '{}'", phrase, selected, records[selected].label);
    }

    Ok(MatchSelection {
        phrase: phrase.to_string(),
        max_errors,
        indices,
        selected,
    })
}
