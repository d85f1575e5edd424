use codecanvas_core::NodeId;
use serde::{Deserialize, Serialize};

/// Back/forward history of focused nodes.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FocusHistory {
    entries: Vec<NodeId>,
    current: usize,
}

impl FocusHistory {
    pub fn push(&mut self, id: NodeId) {
        // If we are not at the end of history, truncate it
        if !self.entries.is_empty() && self.current < self.entries.len() - 1 {
            self.entries.truncate(self.current + 1);
        }

        // Don't push duplicate consecutive entries
        if self.entries.last() == Some(&id) {
            return;
        }

        self.entries.push(id);
        self.current = self.entries.len() - 1;
    }

    pub fn current(&self) -> Option<NodeId> {
        self.entries.get(self.current).copied()
    }

    pub fn back(&mut self) -> Option<NodeId> {
        if self.current > 0 {
            self.current -= 1;
            Some(self.entries[self.current])
        } else {
            None
        }
    }

    pub fn forward(&mut self) -> Option<NodeId> {
        if self.current + 1 < self.entries.len() {
            self.current += 1;
            Some(self.entries[self.current])
        } else {
            None
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    pub fn can_go_forward(&self) -> bool {
        !self.entries.is_empty() && self.current < self.entries.len() - 1
    }

    /// Drops every entry for a node that no longer exists, then collapses the
    /// duplicates that leaves behind.
    pub fn remove(&mut self, id: NodeId) {
        let current = self.current();
        let mut kept: Vec<NodeId> = Vec::with_capacity(self.entries.len());
        let mut new_current = 0;
        for (index, entry) in self.entries.iter().enumerate() {
            if *entry == id || kept.last() == Some(entry) {
                if index == self.current {
                    new_current = kept.len().saturating_sub(1);
                }
                continue;
            }
            if index == self.current {
                new_current = kept.len();
            }
            kept.push(*entry);
        }
        self.entries = kept;
        self.current = if current.is_some() { new_current } else { 0 };
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = FocusHistory::default();
        history.push(NodeId(1));
        history.push(NodeId(2));
        history.push(NodeId(3));
        assert_eq!(history.back(), Some(NodeId(2)));

        history.push(NodeId(4));
        assert!(!history.can_go_forward());
        assert_eq!(history.back(), Some(NodeId(2)));
        assert_eq!(history.back(), Some(NodeId(1)));
        assert_eq!(history.back(), None);
    }

    #[test]
    fn test_remove_prunes_and_collapses() {
        let mut history = FocusHistory::default();
        for id in [1, 2, 1, 3] {
            history.push(NodeId(id));
        }
        history.remove(NodeId(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some(NodeId(3)));
        assert_eq!(history.back(), Some(NodeId(1)));
    }

    #[test]
    fn test_remove_current_entry_falls_back() {
        let mut history = FocusHistory::default();
        for id in [1, 2, 3] {
            history.push(NodeId(id));
        }
        history.remove(NodeId(3));
        assert_eq!(history.current(), Some(NodeId(2)));

        history.remove(NodeId(1));
        history.remove(NodeId(2));
        assert!(history.is_empty());
        assert_eq!(history.current(), None);
    }
}
