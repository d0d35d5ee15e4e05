use crate::tally::Tally;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub domain: String,
    pub count: u64,
}

impl RankedEntry {
    pub fn new(domain: impl Into<String>, count: u64) -> Self {
        RankedEntry {
            domain: domain.into(),
            count,
        }
    }
}

// Highest count first, then domain ascending.
impl Ord for RankedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.domain.cmp(&other.domain))
    }
}

impl PartialOrd for RankedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.domain, self.count)
    }
}

/// Orders a finished tally by count descending, ties broken by domain.
pub fn rank(tally: &Tally) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = tally
        .iter()
        .map(|(domain, count)| RankedEntry::new(domain, count))
        .collect();
    entries.sort_unstable();
    entries
}
