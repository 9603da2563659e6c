use std::collections::VecDeque;

pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Bounded log of the last entered command lines. The oldest entry falls out
/// once the ring is full.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    /// Newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_latest_entries() {
        let mut history = History::new(3);
        for line in ["a", "b", "  ", "c", "d"] {
            history.record(line);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.newest_first().collect::<Vec<_>>(), vec!["d", "c", "b"]);
    }

    #[test]
    fn zero_capacity_still_keeps_the_last_line() {
        let mut history = History::new(0);
        history.record("ls");
        history.record("pwd");
        assert_eq!(history.newest_first().collect::<Vec<_>>(), vec!["pwd"]);
    }
}
