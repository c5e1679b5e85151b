//! Deleting the selection.

use std::collections::HashSet;

use mapwright_core::abstract_editor::EditActionResult;

use crate::attribute::Value;
use crate::document::{Document, NodeId};
use crate::editor::MapEditor;
use crate::registry::DanglingPolicy;
use crate::selection::NodeSet;

/// Whether deleting the selection would remove `node` itself.
///
/// The root and the top-level groups under it are never deleted, and a
/// node with a selected ancestor goes away with that ancestor.
pub fn is_deletable(doc: &Document, selection: &NodeSet, node: NodeId) -> bool {
    let root = doc.root();
    node != root
        && doc.parent(node).is_some_and(|p| p != root)
        && doc.ancestors(node).all(|a| !selection.contains(a))
}

pub fn can_delete(editor: &MapEditor) -> bool {
    let sel = editor.selection().nodes();
    sel.iter().any(|n| is_deletable(editor.document(), sel, n))
}

/// Removes the deletable selected nodes in one transaction.
///
/// Nodes left referencing a removed subtree are handled by their type's
/// [`DanglingPolicy`]: the reference is cleared, or the referring node is
/// removed as well, which may in turn orphan further references.
pub fn delete_selection(editor: &mut MapEditor) -> EditActionResult<bool> {
    let doc = editor.document();
    let sel = editor.selection().nodes();
    let roots: Vec<NodeId> = sel.iter().filter(|&n| is_deletable(doc, sel, n)).collect();
    if roots.is_empty() {
        return Ok(false);
    }

    let mut tx = editor.transaction("Delete");
    let mut removed: HashSet<NodeId> = HashSet::new();
    let mut tried: HashSet<NodeId> = HashSet::new();
    let mut pending = roots;
    while !pending.is_empty() {
        for node in pending.drain(..) {
            if !tried.insert(node) || removed.contains(&node) {
                continue;
            }
            if is_deletable(doc, &NodeSet::new(), node) && tx.remove(doc, node) {
                removed.extend(doc.tree(node));
            }
        }
        for reference in doc.referrers(&removed) {
            match doc.node_type(reference.node).map(|t| t.dangling_policy()) {
                Some(DanglingPolicy::Cascade) if !tried.contains(&reference.node) => pending.push(reference.node),
                _ => {
                    tx.set_attribute(doc, reference.node, &reference.key, Value::Node(None))?;
                }
            }
        }
    }
    log::debug!("Deleting {} nodes", removed.len());
    Ok(editor.commit(tx)?.is_recorded())
}
