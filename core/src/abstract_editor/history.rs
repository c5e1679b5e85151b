//! Undo/redo action history.
//!
//! [`EditActionHistory`] keeps one linear list of [`EditAction`] trait
//! objects plus a count of how many of the newest entries are currently
//! undone. Executing a new action after undoing discards the undone tail
//! (standard editor behavior).

use std::collections::VecDeque;
use std::fmt;

use super::action::{EditAction, EditActionResult, Editable};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Identifier of a recorded history entry.
///
/// Ids are assigned in execution order and never reused by the same history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    /// Returns the raw sequence number.
    pub fn raw(self) -> u64 {
        self.0
    }
}

struct Entry<T: Editable> {
    id: EntryId,
    action: Box<dyn EditAction<T>>,
}

/// Manages a linear undo/redo history of editor actions.
///
/// Entries `0..len - undone` are applied to the target, the remaining
/// `undone` entries are available for redo. When the list exceeds
/// `max_undo`, the oldest entry is dropped from the front. A `max_undo` of
/// zero means no limit.
///
/// # Example
///
/// ```ignore
/// let mut history = EditActionHistory::new(50);
/// let mut state = MapState::new(document);
///
/// let id = history.execute(Box::new(transaction), &mut state)?;
/// history.undo(&mut state)?;
/// history.redo(&mut state)?;
/// ```
pub struct EditActionHistory<T: Editable> {
    entries: VecDeque<Entry<T>>,
    undone: usize,
    max_undo: usize,
    next_id: u64,
    /// Tracks distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)` where `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)` where `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: never reachable again (dropped by the limit, or the redo
    ///   tail holding it was discarded).
    save_distance: Option<i64>,
}

impl<T: Editable> EditActionHistory<T> {
    /// Creates a new empty history with the given maximum undo depth.
    pub fn new(max_undo: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            undone: 0,
            max_undo,
            next_id: 0,
            save_distance: Some(0),
        }
    }

    /// Applies an action to the target and records it.
    ///
    /// Returns `Ok(None)` without touching the target or the history when
    /// the action reports no [changes](EditAction::has_changes). Otherwise
    /// the undone tail is discarded, the action is appended and the oldest
    /// entries beyond `max_undo` are dropped.
    ///
    /// If applying fails, the history is left unchanged.
    pub fn execute(
        &mut self,
        mut action: Box<dyn EditAction<T>>,
        target: &mut T,
    ) -> EditActionResult<Option<EntryId>> {
        if !action.has_changes() {
            return Ok(None);
        }
        action.apply(target)?;

        if self.undone > 0 {
            let keep = self.entries.len() - self.undone;
            self.entries.truncate(keep);
            self.undone = 0;
            // A save point in the discarded tail is gone for good.
            if let Some(d) = self.save_distance
                && d < 0
            {
                self.save_distance = None;
            }
        }

        if action.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d += 1;
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push_back(Entry { id, action });
        self.enforce_limit();
        Ok(Some(id))
    }

    /// Undoes the newest applied entry.
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, target: &mut T) -> EditActionResult<bool> {
        let Some(index) = self.undo_index() else {
            return Ok(false);
        };
        let entry = &mut self.entries[index];
        entry.action.undo(target)?;
        let is_content = entry.action.modifies_content();
        self.undone += 1;
        if is_content && let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(true)
    }

    /// Undoes the newest applied entry only if it is `id`.
    ///
    /// Interactive tools use this to retract an in-flight preview before
    /// committing a fresh one. Returns `Ok(false)` if `id` is not the next
    /// undoable entry (already undone, dropped, or covered by newer edits).
    pub fn undo_entry(&mut self, id: EntryId, target: &mut T) -> EditActionResult<bool> {
        if self.next_undo_id() != Some(id) {
            return Ok(false);
        }
        self.undo(target)
    }

    /// Redoes the oldest undone entry.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, target: &mut T) -> EditActionResult<bool> {
        if self.undone == 0 {
            return Ok(false);
        }
        let index = self.entries.len() - self.undone;
        let entry = &mut self.entries[index];
        entry.action.apply(target)?;
        let is_content = entry.action.modifies_content();
        self.undone -= 1;
        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        Ok(true)
    }

    fn undo_index(&self) -> Option<usize> {
        (self.undone < self.entries.len()).then(|| self.entries.len() - self.undone - 1)
    }

    fn over_limit(&self) -> bool {
        self.max_undo > 0 && self.entries.len() > self.max_undo
    }

    fn enforce_limit(&mut self) {
        while self.over_limit() {
            if self.entries.pop_front().is_none() {
                break;
            }
            if let Some(d) = self.save_distance
                && d > self.undo_count() as i64
            {
                self.save_distance = None;
            }
        }
    }

    /// Id of the entry the next [`undo`](Self::undo) would revert.
    pub fn next_undo_id(&self) -> Option<EntryId> {
        self.undo_index().map(|i| self.entries[i].id)
    }

    /// Id of the entry the next [`redo`](Self::redo) would re-apply.
    pub fn next_redo_id(&self) -> Option<EntryId> {
        if self.undone == 0 {
            return None;
        }
        Some(self.entries[self.entries.len() - self.undone].id)
    }

    /// Returns `true` if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        self.undone < self.entries.len()
    }

    /// Returns `true` if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        self.undone > 0
    }

    /// Returns an iterator over undo action descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .take(self.undo_count())
            .rev()
            .map(|e| e.action.description())
    }

    /// Returns an iterator over redo action descriptions, next redo first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .skip(self.undo_count())
            .map(|e| e.action.description())
    }

    /// Every recorded action, oldest first, applied and undone alike.
    pub fn actions(&self) -> impl Iterator<Item = &dyn EditAction<T>> {
        self.entries.iter().map(|e| e.action.as_ref())
    }

    /// Returns the number of entries that can be undone.
    pub fn undo_count(&self) -> usize {
        self.entries.len() - self.undone
    }

    /// Returns the number of entries that can be redone.
    pub fn redo_count(&self) -> usize {
        self.undone
    }

    /// Returns the maximum undo depth.
    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Changes the maximum undo depth, dropping the oldest entries if needed.
    /// Zero lifts the limit.
    ///
    /// Undone entries are never dropped before applied ones are exhausted,
    /// matching what [`execute`](Self::execute) would do.
    pub fn set_max_undo(&mut self, max_undo: usize) {
        self.max_undo = max_undo;
        while self.over_limit() && self.undo_count() > 0 {
            self.entries.pop_front();
            if let Some(d) = self.save_distance
                && d > self.undo_count() as i64
            {
                self.save_distance = None;
            }
        }
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state.
    ///
    /// A fresh history counts as saved. Once the save point becomes
    /// unreachable this stays `true` until the next [`mark_saved`](Self::mark_saved).
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Drops every entry.
    ///
    /// If the current state was the saved state it remains so. Otherwise the
    /// save point is permanently lost.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.undone = 0;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<T: Editable> fmt::Debug for EditActionHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditActionHistory")
            .field("undo_count", &self.undo_count())
            .field("redo_count", &self.redo_count())
            .field("max_undo", &self.max_undo)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
