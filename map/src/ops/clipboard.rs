//! Copy, cut and paste of layer objects.
//!
//! A [`Clipboard`] owns a private document holding detached copies of the
//! copied objects. Resources they use are copied along, and the clipboard
//! document takes the path of the map it was copied from, so relative
//! resource sources can still be resolved at paste time.

use std::collections::HashSet;
use std::fmt;

use mapwright_core::abstract_editor::EditActionResult;

use crate::attribute::Value;
use crate::catalog;
use crate::clone::{CloneExternal, ClonedNodes, MatchByKey};
use crate::document::{Document, NodeId};
use crate::editor::MapEditor;
use crate::error::DocumentError;
use crate::path;
use crate::registry::DanglingPolicy;

pub struct Clipboard {
    document: Document,
    roots: Vec<NodeId>,
}

impl Clipboard {
    /// Path of the map the contents were copied from.
    pub fn path(&self) -> &str {
        self.document.path()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Copied objects, detached, in selection order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clipboard")
            .field("path", &self.path())
            .field("roots", &self.roots)
            .finish()
    }
}

fn copyable(doc: &Document, node: NodeId) -> bool {
    doc.parent(node)
        .and_then(|p| doc.node_type(p))
        .is_some_and(|t| t.is_layer())
}

pub fn can_copy(editor: &MapEditor) -> bool {
    editor.selection().iter().any(|n| copyable(editor.document(), n))
}

/// Copies the selected layer objects.
///
/// Returns `None` when nothing copyable is selected. Nested nodes whose
/// type cascades on dangling references (waypoint connections) are left
/// out unless their target is copied too.
pub fn copy(editor: &MapEditor) -> Result<Option<Clipboard>, DocumentError> {
    let source = editor.document();
    let selected: Vec<NodeId> = editor
        .selection()
        .iter()
        .filter(|&n| copyable(source, n))
        .collect();
    if selected.is_empty() {
        return Ok(None);
    }

    let root_type = source.type_name(source.root()).unwrap_or(catalog::MAP);
    let mut document = Document::new(source.registry().clone(), root_type)?;
    document.set_path(source.path());

    let copied: HashSet<NodeId> = selected.iter().flat_map(|&n| source.tree(n)).collect();
    let mut cloned = ClonedNodes::new();
    let mut roots = Vec::with_capacity(selected.len());
    for &node in &selected {
        roots.push(cloned.clone_subtree(source, node, &mut document)?);
    }

    for &node in &copied {
        if selected.contains(&node) {
            continue;
        }
        let cascades = source
            .node_type(node)
            .is_some_and(|t| t.dangling_policy() == DanglingPolicy::Cascade);
        let outside: Vec<String> = source
            .references(node)
            .filter(|(_, target)| !copied.contains(target))
            .map(|(key, _)| key.to_string())
            .collect();
        if cascades
            && !outside.is_empty()
            && let Some(clone) = cloned.clone_of(node)
        {
            // Cleared so resolving does not copy the target along.
            for key in &outside {
                document.set(clone, key, Value::Node(None))?;
            }
            document.remove(clone)?;
        }
    }

    cloned.resolve_references(source, &mut document, &mut CloneExternal)?;
    document.flush_changes();
    log::debug!("Copied {} objects", roots.len());
    Ok(Some(Clipboard { document, roots }))
}

/// Copies the selection, then deletes it.
pub fn cut(editor: &mut MapEditor) -> EditActionResult<Option<Clipboard>> {
    let clipboard = copy(editor)?;
    if clipboard.is_some() {
        super::delete_selection(editor)?;
    }
    Ok(clipboard)
}

/// Inserts copies of the clipboard contents into the active layer.
///
/// Objects the layer does not accept are skipped. Resources are matched
/// against the map's resources by type and absolute location; unmatched
/// ones are added to the resources group with their source rewritten for
/// the map's location. Triangles get the layer's default polygon type if
/// theirs is not allowed there. The pasted objects end up selected.
pub fn paste(editor: &mut MapEditor, clipboard: &Clipboard) -> EditActionResult<bool> {
    let Some(layer) = editor.active_layer else {
        return Ok(false);
    };
    let roots: Vec<NodeId> = clipboard
        .roots
        .iter()
        .copied()
        .filter(|&n| {
            clipboard
                .document
                .type_name(n)
                .is_some_and(|t| editor.document().accepts(layer, t))
        })
        .collect();
    if roots.is_empty() {
        return Ok(false);
    }
    let Some(resources) = catalog::resources(editor.document()) else {
        return Ok(false);
    };

    let doc = &mut editor.state.document;
    let mut cloned = ClonedNodes::new();
    let mut clones = Vec::with_capacity(roots.len());
    for &root in &roots {
        clones.push(cloned.clone_subtree(&clipboard.document, root, doc)?);
    }
    let candidates: Vec<NodeId> = doc.children(resources).collect();
    let mut by_location = MatchByKey::new(doc, candidates, catalog::resource_location);
    cloned.resolve_references(&clipboard.document, doc, &mut by_location)?;

    let doc_dir = path::dir(doc.path()).to_string();
    let mut new_resources = Vec::new();
    for &res in cloned.external_clones() {
        let original = cloned.original_of(res);
        let location = original.and_then(|o| catalog::resource_location(&clipboard.document, o));
        if let Some(location) = location {
            doc.set(res, "src", path::rebase(&location, &doc_dir))?;
        }
        new_resources.push(res);
    }

    let poly_types = catalog::layer_type(doc, layer)
        .map(catalog::allowed_poly_types)
        .unwrap_or_default();
    if let Some(&default) = poly_types.first() {
        for &clone in &clones {
            let allowed = doc
                .get_str(clone, "poly-type")
                .is_none_or(|t| poly_types.iter().any(|&p| p == t));
            if !allowed {
                doc.set(clone, "poly-type", Value::Enum(default.to_string()))?;
            }
        }
    }
    doc.flush_changes();

    editor.state.selection.clear();
    let doc = editor.document();
    let mut tx = editor.transaction("Paste");
    for res in new_resources {
        tx.insert(doc, resources, None, res);
    }
    for clone in clones {
        tx.insert(doc, layer, None, clone);
    }
    Ok(editor.commit(tx)?.is_recorded())
}
