//! Editing session: document, selection, history, settings and view.

use std::fmt;

use mapwright_core::abstract_editor::{EditActionHistory, EditActionResult, Editable, EntryId};
use mapwright_core::settings::Settings;

use crate::document::{Document, NodeId};
use crate::edit::Transaction;
use crate::error::DanglingReference;
use crate::selection::Selection;
use crate::view::View;

/// What transactions edit: the document and the selection together.
pub struct MapState {
    pub document: Document,
    pub selection: Selection,
}

impl Editable for MapState {}

impl MapState {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: Selection::new(),
        }
    }

    /// Shows or hides `id`. Hiding drops nodes that are no longer shown
    /// from the selection. Not recorded in the history.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        if !self.document.set_visible(id, visible) {
            return false;
        }
        if !visible {
            let doc = &self.document;
            self.selection.retain(|n| doc.is_shown(n));
        }
        self.document.flush_changes();
        true
    }
}

impl fmt::Debug for MapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapState")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .finish()
    }
}

/// Outcome of [`MapEditor::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// History entry, `None` if the transaction changed nothing.
    pub entry: Option<EntryId>,
    /// References left pointing at detached nodes.
    pub dangling: Vec<DanglingReference>,
}

impl Commit {
    pub fn is_recorded(&self) -> bool {
        self.entry.is_some()
    }
}

/// One open map.
pub struct MapEditor {
    pub state: MapState,
    pub view: View,
    /// Layer that paste and drawing tools insert into.
    pub active_layer: Option<NodeId>,
    history: EditActionHistory<MapState>,
    settings: Settings,
}

impl MapEditor {
    pub fn new(document: Document, settings: Settings) -> Self {
        Self {
            state: MapState::new(document),
            view: View::default(),
            active_layer: None,
            history: EditActionHistory::new(settings.editor.undo_limit as usize),
            settings,
        }
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn history(&self) -> &EditActionHistory<MapState> {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the settings. The undo limit applies immediately.
    pub fn set_settings(&mut self, settings: Settings) {
        self.history.set_max_undo(settings.editor.undo_limit as usize);
        self.settings = settings;
    }

    /// Starts a transaction against the current selection.
    pub fn transaction(&self, description: impl Into<String>) -> Transaction {
        Transaction::new(&self.state, description)
    }

    /// Applies `tx` and records it.
    ///
    /// Afterwards every reference in the tree is checked; references to
    /// detached nodes are logged and returned, not treated as failure.
    pub fn commit(&mut self, tx: Transaction) -> EditActionResult<Commit> {
        let description = tx.description().to_string();
        let entry = self.history.execute(Box::new(tx), &mut self.state)?;
        let Some(id) = entry else {
            return Ok(Commit {
                entry: None,
                dangling: Vec::new(),
            });
        };
        log::debug!("Committed \"{description}\" as entry {}", id.raw());

        let dangling = self.state.document.dangling_references();
        for reference in &dangling {
            log::warn!("After \"{description}\": {reference}");
        }
        Ok(Commit { entry, dangling })
    }

    pub fn undo(&mut self) -> EditActionResult<bool> {
        let undone = self.history.undo(&mut self.state)?;
        if undone {
            log::debug!("Undo ({} left)", self.history.undo_count());
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> EditActionResult<bool> {
        let redone = self.history.redo(&mut self.state)?;
        if redone {
            log::debug!("Redo ({} left)", self.history.redo_count());
        }
        Ok(redone)
    }

    /// Undoes `id` only if it is the next entry to undo.
    pub fn undo_entry(&mut self, id: EntryId) -> EditActionResult<bool> {
        self.history.undo_entry(id, &mut self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        self.state.set_visible(id, visible)
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    /// Frees nodes that neither the tree, the history, the selection nor
    /// the active layer can reach any more.
    pub fn collect_garbage(&mut self) -> usize {
        let mut roots: Vec<NodeId> = self.state.selection.iter().collect();
        roots.extend(self.active_layer);
        for action in self.history.actions() {
            if let Some(tx) = action.as_any().downcast_ref::<Transaction>() {
                roots.extend(tx.referenced_nodes());
            }
        }
        self.state.document.collect_garbage(roots)
    }
}

impl fmt::Debug for MapEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEditor")
            .field("state", &self.state)
            .field("view", &self.view)
            .field("active_layer", &self.active_layer)
            .field("history", &self.history)
            .finish()
    }
}
