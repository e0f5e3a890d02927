use std::collections::HashMap;

/// Co-occurrence counts keyed by repository full name.
///
/// Counters only ever grow. Entries remember the order in which each name was
/// first seen, which is what ranking uses to break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl StarCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `name`.
    pub fn increment(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), 1));
            }
        }
    }

    /// Add one occurrence for every name in `names`.
    pub fn record<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.increment(name.as_ref());
        }
    }

    pub fn get(&self, name: &str) -> usize {
        self.index.get(name).map_or(0, |&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }
}
