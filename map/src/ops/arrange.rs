//! Z-order changes for objects inside layers.
//!
//! Selected direct children of layers are grouped by layer. Each group is
//! removed and re-inserted in one transaction, so undo restores the
//! original order through the transaction's position chasing.

use std::collections::HashSet;

use mapwright_core::abstract_editor::EditActionResult;

use crate::document::{Document, NodeId};
use crate::editor::MapEditor;
use crate::edit::Transaction;
use crate::selection::NodeSet;

/// Selected layer children grouped by layer, each group in child order.
fn groups(doc: &Document, selection: &NodeSet) -> Vec<(NodeId, Vec<NodeId>)> {
    let mut layers: Vec<NodeId> = Vec::new();
    for node in selection.iter() {
        if let Some(parent) = doc.parent(node)
            && doc.node_type(parent).is_some_and(|t| t.is_layer())
            && !layers.contains(&parent)
        {
            layers.push(parent);
        }
    }
    layers
        .into_iter()
        .map(|layer| {
            let nodes = doc.children(layer).filter(|&n| selection.contains(n)).collect();
            (layer, nodes)
        })
        .collect()
}

fn can_move_forward(doc: &Document, selection: &NodeSet, nodes: &[NodeId]) -> bool {
    nodes
        .iter()
        .any(|&n| doc.next_sibling(n).is_some_and(|s| !selection.contains(s)))
}

fn can_move_backward(doc: &Document, selection: &NodeSet, nodes: &[NodeId]) -> bool {
    nodes
        .iter()
        .any(|&n| doc.prev_sibling(n).is_some_and(|s| !selection.contains(s)))
}

/// Drops the selected run at the start of the layer from `nodes`, since it
/// is already at the back. Returns the first child after that run.
fn skip_leading(doc: &Document, layer: NodeId, nodes: &mut Vec<NodeId>) -> Option<NodeId> {
    let mut first = doc.child_slice(layer).first().copied();
    while first.is_some() && nodes.first().copied() == first {
        nodes.remove(0);
        first = first.and_then(|f| doc.next_sibling(f));
    }
    first
}

/// Drops the selected run at the end of the layer from `nodes`. Returns the
/// first node of that run, or `None` if the last child is not selected.
fn skip_trailing(doc: &Document, layer: NodeId, nodes: &mut Vec<NodeId>) -> Option<NodeId> {
    let mut last = doc.child_slice(layer).last().copied()?;
    if nodes.last() != Some(&last) {
        return None;
    }
    nodes.pop();
    while let Some(prev) = doc.prev_sibling(last)
        && nodes.last() == Some(&prev)
    {
        last = prev;
        nodes.pop();
    }
    Some(last)
}

/// First sibling after `node` that is not part of the moved group, stopping
/// at `end`.
fn next_unmoved(doc: &Document, moved: &HashSet<NodeId>, end: Option<NodeId>, node: Option<NodeId>) -> Option<NodeId> {
    let mut node = node?;
    if Some(node) == end {
        return end;
    }
    while let Some(next) = doc.next_sibling(node)
        && Some(next) != end
        && moved.contains(&next)
    {
        node = next;
    }
    doc.next_sibling(node)
}

fn prev_unmoved(doc: &Document, moved: &HashSet<NodeId>, start: Option<NodeId>, node: NodeId) -> Option<NodeId> {
    let mut node = node;
    if Some(node) == start {
        return start;
    }
    while let Some(prev) = doc.prev_sibling(node)
        && Some(prev) != start
        && moved.contains(&prev)
    {
        node = prev;
    }
    doc.prev_sibling(node)
}

fn arrange(
    editor: &mut MapEditor,
    description: &str,
    forward: bool,
    place: impl Fn(&Document, NodeId, &mut Vec<NodeId>, &mut Transaction),
) -> EditActionResult<bool> {
    let doc = editor.document();
    let selection = editor.selection().nodes();
    let mut tx = editor.transaction(description);
    for (layer, mut nodes) in groups(doc, selection) {
        let movable = if forward {
            can_move_forward(doc, selection, &nodes)
        } else {
            can_move_backward(doc, selection, &nodes)
        };
        if movable {
            place(doc, layer, &mut nodes, &mut tx);
        }
    }
    Ok(editor.commit(tx)?.is_recorded())
}

/// Moves selected objects above everything else in their layer.
pub fn bring_to_front(editor: &mut MapEditor) -> EditActionResult<bool> {
    arrange(editor, "Bring to front", true, |doc, layer, nodes, tx| {
        let last = skip_trailing(doc, layer, nodes);
        for &n in nodes.iter() {
            tx.remove(doc, n);
        }
        for &n in nodes.iter() {
            tx.insert(doc, layer, last, n);
        }
    })
}

/// Moves each selected object above the next unselected sibling.
pub fn bring_forward(editor: &mut MapEditor) -> EditActionResult<bool> {
    arrange(editor, "Bring forward", true, |doc, layer, nodes, tx| {
        let last = skip_trailing(doc, layer, nodes);
        let moved: HashSet<NodeId> = nodes.iter().copied().collect();
        for &n in nodes.iter() {
            tx.remove(doc, n);
        }
        for &n in nodes.iter() {
            let past = next_unmoved(doc, &moved, last, Some(n));
            let before = next_unmoved(doc, &moved, last, past);
            tx.insert(doc, layer, before, n);
        }
    })
}

/// Moves each selected object below the previous unselected sibling.
pub fn send_backward(editor: &mut MapEditor) -> EditActionResult<bool> {
    arrange(editor, "Send backward", false, |doc, layer, nodes, tx| {
        let first = skip_leading(doc, layer, nodes);
        let moved: HashSet<NodeId> = nodes.iter().copied().collect();
        for &n in nodes.iter() {
            tx.remove(doc, n);
        }
        for &n in nodes.iter() {
            tx.insert(doc, layer, prev_unmoved(doc, &moved, first, n), n);
        }
    })
}

/// Moves selected objects below everything else in their layer.
pub fn send_to_back(editor: &mut MapEditor) -> EditActionResult<bool> {
    arrange(editor, "Send to back", false, |doc, layer, nodes, tx| {
        let first = skip_leading(doc, layer, nodes);
        for &n in nodes.iter() {
            tx.remove(doc, n);
        }
        for &n in nodes.iter() {
            tx.insert(doc, layer, first, n);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::{editor_with_triangles, order};

    #[test]
    fn to_front_and_back() {
        let (mut editor, layer, t) = editor_with_triangles(4);
        editor.state.selection.replace(NodeSet::from_iter([t[0], t[1]]));

        assert!(bring_to_front(&mut editor).unwrap());
        assert_eq!(order(&editor, layer), [t[2], t[3], t[0], t[1]]);
        // Already in front.
        assert!(!bring_to_front(&mut editor).unwrap());

        assert!(send_to_back(&mut editor).unwrap());
        assert_eq!(order(&editor, layer), [t[0], t[1], t[2], t[3]]);

        editor.undo().unwrap();
        assert_eq!(order(&editor, layer), [t[2], t[3], t[0], t[1]]);
        editor.undo().unwrap();
        assert_eq!(order(&editor, layer), t);
    }

    #[test]
    fn trailing_run_stays_on_top() {
        let (mut editor, layer, t) = editor_with_triangles(4);
        editor.state.selection.replace(NodeSet::from_iter([t[1], t[3]]));

        assert!(bring_to_front(&mut editor).unwrap());
        assert_eq!(order(&editor, layer), [t[0], t[2], t[1], t[3]]);
    }

    #[test]
    fn forward_and_backward_by_one() {
        let (mut editor, layer, t) = editor_with_triangles(5);
        editor.state.selection.replace(NodeSet::from_iter([t[0], t[2]]));

        assert!(bring_forward(&mut editor).unwrap());
        assert_eq!(order(&editor, layer), [t[1], t[0], t[3], t[2], t[4]]);

        assert!(send_backward(&mut editor).unwrap());
        assert_eq!(order(&editor, layer), t);

        editor.undo().unwrap();
        editor.undo().unwrap();
        assert_eq!(order(&editor, layer), t);
    }

    #[test]
    fn only_layer_children_move() {
        let (mut editor, _, t) = editor_with_triangles(2);
        let vertex = editor.document().children(t[0]).next().unwrap();
        editor.state.selection.replace(NodeSet::from_iter([vertex]));
        assert!(!bring_to_front(&mut editor).unwrap());
        assert!(!send_to_back(&mut editor).unwrap());
    }
}
