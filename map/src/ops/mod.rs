//! Editing functions built on [`Transaction`](crate::edit::Transaction).
//!
//! Each function reads the editor's document and selection, records one
//! transaction and commits it, so a single undo reverts the whole edit.
//! Functions return `Ok(false)` when there was nothing to do.

pub mod arrange;
pub mod clipboard;
pub mod delete;
pub mod relocate;
pub mod selection;
pub mod transform;

pub use arrange::{bring_forward, bring_to_front, send_backward, send_to_back};
pub use clipboard::{Clipboard, can_copy, copy, cut, paste};
pub use delete::{can_delete, delete_selection, is_deletable};
pub use relocate::relocate;
pub use selection::{select_all, switch_vertex_selection};
pub use transform::{Rotation, flip_horizontal, flip_vertical, rotate_90, translate};

#[cfg(test)]
pub(crate) mod tests {
    use mapwright_core::settings::Settings;

    use crate::catalog;
    use crate::document::NodeId;
    use crate::editor::MapEditor;

    /// Fresh map with `count` triangles in the back polygon layer, which is
    /// also the active layer. Nothing is selected or recorded.
    pub fn editor_with_triangles(count: usize) -> (MapEditor, NodeId, Vec<NodeId>) {
        let settings = Settings::default();
        let (mut document, layout) = catalog::default_document(catalog::registry(&settings)).unwrap();
        let layer = layout.layer("polygons-back").unwrap();
        let triangles = (0..count)
            .map(|i| {
                let x = i as f32 * 20.0;
                let t = catalog::triangle(&mut document, [(x, 0.0), (x + 10.0, 0.0), (x, 10.0)]).unwrap();
                document.insert(layer, None, t).unwrap();
                t
            })
            .collect();
        document.flush_changes();

        let mut editor = MapEditor::new(document, settings);
        editor.active_layer = Some(layer);
        (editor, layer, triangles)
    }

    pub fn order(editor: &MapEditor, layer: NodeId) -> Vec<NodeId> {
        editor.document().child_slice(layer).to_vec()
    }

    pub fn layer(editor: &MapEditor, layer_type: &str) -> NodeId {
        let doc = editor.document();
        doc.children_of_type(doc.root(), catalog::LAYER)
            .find(|&l| catalog::layer_type(doc, l) == Some(layer_type))
            .unwrap()
    }
}
