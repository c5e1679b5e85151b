//! Transactions: batches of reversible primitive edits.
//!
//! A [`Transaction`] records commands against the document without touching
//! it. Each command captures what it needs to be undone when it is
//! recorded, and commands that would change nothing are dropped on the spot.
//! Committing the transaction through the history applies it; undoing it
//! runs the inverse commands in reverse order.
//!
//! Selection is part of a transaction: it starts from the selection as it
//! was when the transaction was created, inserted subtrees are added to it
//! and removed subtrees are taken out of it.

use std::collections::HashSet;

use mapwright_core::abstract_editor::{EditAction, EditActionResult};

use crate::attribute::Value;
use crate::document::{Document, NodeId};
use crate::editor::MapState;
use crate::error::{DocumentError, InvalidOperation};
use crate::selection::NodeSet;

/// A primitive reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    SetAttribute {
        node: NodeId,
        key: String,
        new: Value,
        old: Value,
    },
    Insert {
        parent: NodeId,
        before: Option<NodeId>,
        node: NodeId,
    },
    Remove {
        parent: NodeId,
        before: Option<NodeId>,
        node: NodeId,
    },
    Relocate {
        new_path: String,
        old_path: String,
    },
}

/// An ordered batch of commands applied and undone as a unit.
#[derive(Debug)]
pub struct Transaction {
    description: String,
    selection: NodeSet,
    commands: Vec<EditCommand>,
}

impl Transaction {
    /// Starts an empty transaction, capturing the current selection.
    pub fn new(state: &MapState, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            selection: state.selection.snapshot(),
            commands: Vec::new(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_changes(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[EditCommand] {
        &self.commands
    }

    /// Records an attribute change.
    ///
    /// The value is validated now; an invalid value is rejected without
    /// being recorded. Returns `Ok(false)` if the value equals what the
    /// attribute will hold at this point of the transaction.
    pub fn set_attribute(
        &mut self,
        doc: &Document,
        node: NodeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<bool, DocumentError> {
        let value = value.into();
        doc.validate(node, key, &value)?;
        let (Some(current), Some(info)) = (self.pending_value(doc, node, key), doc.node_type(node)) else {
            return Err(InvalidOperation::UnknownNode(node).into());
        };
        let Some(schema) = info.schema(key) else {
            return Ok(false);
        };
        if schema.data_type.equals(&current, &value) {
            return Ok(false);
        }
        self.commands.push(EditCommand::SetAttribute {
            node,
            key: key.to_string(),
            new: value,
            old: current,
        });
        Ok(true)
    }

    /// Value of `node.key` after the commands recorded so far.
    fn pending_value(&self, doc: &Document, node: NodeId, key: &str) -> Option<Value> {
        self.commands
            .iter()
            .rev()
            .find_map(|cmd| match cmd {
                EditCommand::SetAttribute { node: n, key: k, new, .. } if *n == node && k == key => Some(new.clone()),
                _ => None,
            })
            .or_else(|| doc.get(node, key).cloned())
    }

    /// Records attaching `node` under `parent`, before `before` or at the end.
    ///
    /// Returns `false` if either node is not a live node of `doc`.
    pub fn insert(&mut self, doc: &Document, parent: NodeId, before: Option<NodeId>, node: NodeId) -> bool {
        if !doc.contains(parent) || !doc.contains(node) {
            return false;
        }
        self.commands.push(EditCommand::Insert { parent, before, node });
        true
    }

    /// Records detaching `node`. Its parent and next sibling are captured so
    /// undo can put it back.
    ///
    /// Returns `false` if the node has no parent.
    pub fn remove(&mut self, doc: &Document, node: NodeId) -> bool {
        let Some(parent) = doc.parent(node) else {
            return false;
        };
        let before = doc.next_sibling(node);
        self.commands.push(EditCommand::Remove { parent, before, node });
        true
    }

    /// Records a change of the document path.
    pub fn relocate(&mut self, doc: &Document, path: impl Into<String>) -> bool {
        let new_path = path.into();
        let old_path = self
            .commands
            .iter()
            .rev()
            .find_map(|cmd| match cmd {
                EditCommand::Relocate { new_path, .. } => Some(new_path.clone()),
                _ => None,
            })
            .unwrap_or_else(|| doc.path().to_string());
        if new_path == old_path {
            return false;
        }
        self.commands.push(EditCommand::Relocate { new_path, old_path });
        true
    }

    /// Every node the transaction mentions, for garbage collection roots.
    pub fn referenced_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let commands = self.commands.iter().flat_map(|cmd| {
            let ids: Vec<NodeId> = match cmd {
                EditCommand::SetAttribute { node, new, old, .. } => std::iter::once(*node)
                    .chain(new.as_node())
                    .chain(old.as_node())
                    .collect(),
                EditCommand::Insert { parent, before, node } | EditCommand::Remove { parent, before, node } => {
                    std::iter::once(*parent).chain(*before).chain(std::iter::once(*node)).collect()
                }
                EditCommand::Relocate { .. } => Vec::new(),
            };
            ids
        });
        self.selection.iter().chain(commands)
    }

    // ---- execution ----

    /// Resolves where a node goes back in: if the captured sibling has been
    /// moved out of `parent` by an earlier command of this transaction,
    /// follow that command's own captured position instead.
    fn chase(&self, doc: &Document, parent: NodeId, before: Option<NodeId>, inserting: bool) -> Option<NodeId> {
        let mut pos = before;
        for _ in 0..=self.commands.len() {
            let p = pos?;
            if doc.parent(p) == Some(parent) {
                return Some(p);
            }
            let next = self.commands.iter().find_map(|cmd| match cmd {
                EditCommand::Insert { node, before, .. } if inserting && *node == p => Some(*before),
                EditCommand::Remove { node, before, .. } if !inserting && *node == p => Some(*before),
                _ => None,
            });
            match next {
                Some(next) => pos = next,
                None => {
                    log::warn!("Sibling {p} left its parent outside this transaction, appending instead");
                    return None;
                }
            }
        }
        None
    }

    fn apply_command(&self, index: usize, doc: &mut Document, sel: &mut NodeSet) -> Result<(), DocumentError> {
        match &self.commands[index] {
            EditCommand::SetAttribute { node, key, new, .. } => {
                doc.set(*node, key, new.clone())?;
            }
            EditCommand::Insert { parent, before, node } => {
                let pos = self.chase(doc, *parent, *before, true);
                doc.insert(*parent, pos, *node)?;
                sel.extend(doc.tree(*node));
            }
            EditCommand::Remove { node, .. } => {
                doc.remove(*node)?;
                deselect_tree(doc, sel, *node);
            }
            EditCommand::Relocate { new_path, .. } => {
                doc.set_path(new_path.clone());
            }
        }
        Ok(())
    }

    fn undo_command(&self, index: usize, doc: &mut Document, sel: &mut NodeSet) -> Result<(), DocumentError> {
        match &self.commands[index] {
            EditCommand::SetAttribute { node, key, old, .. } => {
                doc.set(*node, key, old.clone())?;
            }
            EditCommand::Insert { node, .. } => {
                doc.remove(*node)?;
                deselect_tree(doc, sel, *node);
            }
            EditCommand::Remove { parent, before, node } => {
                let pos = self.chase(doc, *parent, *before, false);
                doc.insert(*parent, pos, *node)?;
                sel.extend(doc.tree(*node));
            }
            EditCommand::Relocate { old_path, .. } => {
                doc.set_path(old_path.clone());
            }
        }
        Ok(())
    }

    /// Runs every command forward. A failing command rolls back the ones
    /// before it and leaves the selection alone.
    fn run_forward(&self, state: &mut MapState) -> Result<(), DocumentError> {
        let mut sel = self.selection.clone();
        for i in 0..self.commands.len() {
            if let Err(e) = self.apply_command(i, &mut state.document, &mut sel) {
                let mut scratch = NodeSet::new();
                for j in (0..i).rev() {
                    if let Err(e) = self.undo_command(j, &mut state.document, &mut scratch) {
                        log::error!("Rollback of \"{}\" failed: {e}", self.description);
                    }
                }
                state.document.flush_changes();
                return Err(e);
            }
        }
        state.document.flush_changes();
        state.selection.replace(sel);
        Ok(())
    }

    fn run_backward(&self, state: &mut MapState) -> Result<(), DocumentError> {
        let mut sel = self.selection.clone();
        let count = self.commands.len();
        for i in (0..count).rev() {
            if let Err(e) = self.undo_command(i, &mut state.document, &mut sel) {
                let mut scratch = NodeSet::new();
                for j in i + 1..count {
                    if let Err(e) = self.apply_command(j, &mut state.document, &mut scratch) {
                        log::error!("Rollback of \"{}\" failed: {e}", self.description);
                    }
                }
                state.document.flush_changes();
                return Err(e);
            }
        }
        state.document.flush_changes();
        state.selection.replace(sel);
        Ok(())
    }
}

/// Takes `node` and its descendants out of `sel`.
fn deselect_tree(doc: &Document, sel: &mut NodeSet, node: NodeId) {
    let subtree: HashSet<NodeId> = doc.tree(node).collect();
    sel.retain(|id| !subtree.contains(&id));
}

impl EditAction<MapState> for Transaction {
    fn apply(&mut self, target: &mut MapState) -> EditActionResult {
        Ok(self.run_forward(target)?)
    }

    fn undo(&mut self, target: &mut MapState) -> EditActionResult {
        Ok(self.run_backward(target)?)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn has_changes(&self) -> bool {
        !self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use mapwright_core::settings::Settings;

    fn state() -> (MapState, NodeId) {
        let registry = catalog::registry(&Settings::default());
        let (document, layout) = catalog::default_document(registry).unwrap();
        let layer = layout.layer("polygons-back").unwrap();
        (MapState::new(document), layer)
    }

    #[test]
    fn no_op_commands_are_dropped() {
        let (state, layer) = state();
        let doc = &state.document;
        let mut tx = Transaction::new(&state, "noop");
        assert!(!tx.set_attribute(doc, layer, "text", "Background polygons").unwrap());
        assert!(!tx.remove(doc, doc.root()));
        assert!(!tx.relocate(doc, ""));
        assert!(!tx.has_changes());
    }

    #[test]
    fn invalid_value_is_not_recorded() {
        let (state, layer) = state();
        let mut tx = Transaction::new(&state, "bad");
        assert!(tx.set_attribute(&state.document, layer, "type", Value::Enum("nope".into())).is_err());
        assert!(tx.is_empty());
    }

    #[test]
    fn repeated_sets_chain_old_values() {
        let (mut state, layer) = state();
        let mut tx = Transaction::new(&state, "rename");
        assert!(tx.set_attribute(&state.document, layer, "text", "A").unwrap());
        assert!(tx.set_attribute(&state.document, layer, "text", "B").unwrap());
        assert!(!tx.set_attribute(&state.document, layer, "text", "B").unwrap());

        tx.apply(&mut state).unwrap();
        assert_eq!(state.document.get_str(layer, "text"), Some("B"));
        tx.undo(&mut state).unwrap();
        assert_eq!(state.document.get_str(layer, "text"), Some("Background polygons"));
    }

    #[test]
    fn insert_selects_and_undo_deselects() {
        let (mut state, layer) = state();
        let tri = catalog::triangle(&mut state.document, [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]).unwrap();

        let mut tx = Transaction::new(&state, "add");
        assert!(tx.insert(&state.document, layer, None, tri));
        tx.apply(&mut state).unwrap();
        assert!(state.selection.contains(tri));
        assert_eq!(state.selection.len(), 4);

        tx.undo(&mut state).unwrap();
        assert!(state.selection.is_empty());
        assert!(!state.document.is_attached(tri));
    }

    #[test]
    fn remove_deselects_only_the_subtree() {
        let (mut state, layer) = state();
        let doc = &mut state.document;
        let triangles: Vec<NodeId> = (0..50)
            .map(|i| {
                let x = i as f32 * 20.0;
                let t = catalog::triangle(doc, [(x, 0.0), (x + 10.0, 0.0), (x, 10.0)]).unwrap();
                doc.insert(layer, None, t).unwrap();
                t
            })
            .collect();
        doc.flush_changes();
        let everything: NodeSet = triangles.iter().flat_map(|&t| state.document.tree(t)).collect();
        state.selection.replace(everything);
        assert_eq!(state.selection.len(), 200);

        let mut tx = Transaction::new(&state, "remove");
        assert!(tx.remove(&state.document, triangles[10]));
        tx.apply(&mut state).unwrap();
        assert_eq!(state.selection.len(), 196);
        assert!(!state.selection.contains(triangles[10]));
        assert!(state.selection.contains(triangles[11]));

        tx.undo(&mut state).unwrap();
        assert_eq!(state.selection.len(), 200);
    }

    #[test]
    fn failed_command_rolls_back() {
        let (mut state, layer) = state();
        let mut tx = Transaction::new(&state, "broken");
        tx.set_attribute(&state.document, layer, "text", "Renamed").unwrap();
        // Inserting the layer into itself fails at apply time.
        assert!(tx.insert(&state.document, layer, None, layer));

        assert!(tx.apply(&mut state).is_err());
        assert_eq!(state.document.get_str(layer, "text"), Some("Background polygons"));
    }

    #[test]
    fn remove_and_reinsert_runs_chase_positions() {
        let (mut state, layer) = state();
        let doc = &mut state.document;
        let ids: Vec<NodeId> = (0..4)
            .map(|i| {
                let t = catalog::triangle(doc, [(0.0, 0.0), (1.0, 0.0), (0.0, i as f32 + 1.0)]).unwrap();
                doc.insert(layer, None, t).unwrap();
                t
            })
            .collect();

        // Move the run [a, b] to the back after d, as bring-to-front does.
        let mut tx = Transaction::new(&state, "front");
        for &id in &ids[..2] {
            tx.remove(&state.document, id);
        }
        for &id in &ids[..2] {
            tx.insert(&state.document, layer, None, id);
        }
        tx.apply(&mut state).unwrap();
        assert_eq!(state.document.child_slice(layer), [ids[2], ids[3], ids[0], ids[1]]);

        // Undoing re-inserts b before c, then a before b (b is back by then).
        tx.undo(&mut state).unwrap();
        assert_eq!(state.document.child_slice(layer), ids.as_slice());
    }

    #[test]
    fn referenced_nodes_cover_commands() {
        let (state, layer) = state();
        let mut tx = Transaction::new(&state, "refs");
        tx.set_attribute(&state.document, layer, "text", "x").unwrap();
        assert!(tx.referenced_nodes().any(|n| n == layer));
    }
}
