use rustc_hash::FxHashMap;

/// Occurrence count per domain.
///
/// Used both for a single batch's partial counts and for the merged global
/// counts. The only way to combine two tallies is [`Tally::merge`], which adds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: FxHashMap<String, u64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &str, count: u64) {
        if let Some(existing) = self.counts.get_mut(key) {
            *existing += count;
        } else {
            self.counts.insert(key.to_string(), count);
        }
    }

    /// Folds `other` into `self`, summing counts of shared keys.
    pub fn merge(&mut self, other: Tally) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for (key, count) in iter {
            let key: String = key.into();
            tally.add(&key, count);
        }
        tally
    }
}
