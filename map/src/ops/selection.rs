//! Selection commands. These change only the selection and are not
//! recorded in the history.

use crate::catalog;
use crate::document::{Document, NodeId};
use crate::editor::MapEditor;
use crate::selection::NodeSet;

/// Selects every object in every shown layer. Returns `false` if the
/// selection did not change.
pub fn select_all(editor: &mut MapEditor) -> bool {
    let doc = &editor.state.document;
    let all: NodeSet = doc
        .children(doc.root())
        .filter(|&l| doc.node_type(l).is_some_and(|t| t.is_layer()) && doc.is_shown(l))
        .flat_map(|l| doc.children(l))
        .collect();
    editor.state.selection.replace(all)
}

fn is_vertex(doc: &Document, id: NodeId) -> bool {
    doc.is_type(id, catalog::VERTEX)
}

fn is_triangle(doc: &Document, id: NodeId) -> bool {
    doc.is_type(id, catalog::TRIANGLE)
}

/// Toggles between selecting triangles and selecting their vertices.
///
/// The first vertex or triangle in the selection decides the direction:
/// vertices are replaced by their triangles, or triangles by their
/// vertices. Other selected nodes stay selected.
pub fn switch_vertex_selection(editor: &mut MapEditor) -> bool {
    let doc = &editor.state.document;
    let selection = editor.state.selection.nodes();
    let Some(first) = selection.iter().find(|&n| is_vertex(doc, n) || is_triangle(doc, n)) else {
        return false;
    };
    let to_triangles = is_vertex(doc, first);

    let mut switched = NodeSet::new();
    for node in selection.iter() {
        if to_triangles && is_vertex(doc, node) {
            switched.extend(doc.parent(node).filter(|&p| is_triangle(doc, p)));
        } else if !to_triangles && is_triangle(doc, node) {
            switched.extend(doc.children_of_type(node, catalog::VERTEX));
        } else {
            switched.insert(node);
        }
    }
    editor.state.selection.replace(switched)
}
