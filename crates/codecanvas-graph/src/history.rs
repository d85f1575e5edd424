//! Linear undo/redo log of scene deltas.

use crate::action::SceneDelta;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A sealed batch of deltas, undone and redone as one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    deltas: Vec<SceneDelta>,
}

impl Commit {
    pub fn deltas(&self) -> &[SceneDelta] {
        &self.deltas
    }

    /// Inverse deltas in the order they have to be applied.
    pub fn inverse(&self) -> Vec<SceneDelta> {
        self.deltas.iter().rev().map(SceneDelta::inverse).collect()
    }
}

#[derive(Debug)]
pub struct UndoHistory {
    pending: Vec<SceneDelta>,
    last_push: Option<Instant>,
    undo: VecDeque<Commit>,
    redo: Vec<Commit>,
    max_commits: usize,
    auto_commit: Option<Duration>,
}

impl UndoHistory {
    pub fn new(max_commits: usize, auto_commit: Option<Duration>) -> Self {
        Self {
            pending: Vec::new(),
            last_push: None,
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_commits: max_commits.max(1),
            auto_commit,
        }
    }

    /// Adds a delta to the pending batch. A batch left idle longer than the
    /// auto-commit window is sealed first. Any redo future is discarded.
    pub fn push(&mut self, delta: SceneDelta, now: Instant) {
        if let (Some(window), Some(last)) = (self.auto_commit, self.last_push)
            && now.saturating_duration_since(last) > window
        {
            self.commit();
        }
        self.pending.push(delta);
        self.last_push = Some(now);
        self.redo.clear();
    }

    /// Seals the pending batch. Returns false when there was nothing to seal.
    pub fn commit(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let deltas = std::mem::take(&mut self.pending);
        self.undo.push_back(Commit { deltas });
        while self.undo.len() > self.max_commits {
            self.undo.pop_front();
        }
        true
    }

    pub fn take_undo(&mut self) -> Option<Commit> {
        self.commit();
        self.undo.pop_back()
    }

    pub fn take_redo(&mut self) -> Option<Commit> {
        self.redo.pop()
    }

    pub fn push_redo(&mut self, commit: Commit) {
        self.redo.push(commit);
    }

    /// Returns a redone commit to the undo stack without touching redo.
    pub fn restore_undo(&mut self, commit: Commit) {
        self.undo.push_back(commit);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty() || !self.pending.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo.len() + usize::from(!self.pending.is_empty())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.last_push = None;
        self.undo.clear();
        self.redo.clear();
    }
}
