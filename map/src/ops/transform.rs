//! Moving, flipping and rotating the selection.
//!
//! Transforms act on positioned nodes. A selected node that has no position
//! of its own (a triangle) stands for its positioned descendants (its
//! vertices). The root and layers are ignored. Scenery sprites also get
//! their size sign and rotation adjusted so the picture flips or turns
//! with its position.

use std::collections::HashSet;

use mapwright_core::abstract_editor::{EditActionResult, EntryId};
use mapwright_core::math::{Vec2, normalize_angle};

use crate::catalog;
use crate::document::{Document, NodeId};
use crate::edit::Transaction;
use crate::editor::MapEditor;
use crate::error::DocumentError;
use crate::selection::NodeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Rotation angle in radians.
    pub fn angle(self) -> f32 {
        match self {
            Self::Clockwise => -std::f32::consts::FRAC_PI_2,
            Self::CounterClockwise => std::f32::consts::FRAC_PI_2,
        }
    }

    /// Exact sine and cosine, so quarter turns leave no rounding residue.
    fn sin_cos(self) -> (f32, f32) {
        match self {
            Self::Clockwise => (-1.0, 0.0),
            Self::CounterClockwise => (1.0, 0.0),
        }
    }
}

/// Positioned nodes affected by transforming `selection`, deduplicated, in
/// selection order.
pub fn transform_targets(doc: &Document, selection: &NodeSet) -> Vec<NodeId> {
    let root = doc.root();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for node in selection.iter() {
        if node == root || !doc.contains(node) || doc.node_type(node).is_some_and(|t| t.is_layer()) {
            continue;
        }
        if doc.position(node).is_some() {
            if seen.insert(node) {
                out.push(node);
            }
            continue;
        }
        for n in doc.descendants(node) {
            if doc.position(n).is_some() && seen.insert(n) {
                out.push(n);
            }
        }
    }
    out
}

/// Records moving every target to `map(position)`.
fn move_targets(
    doc: &Document,
    targets: &[NodeId],
    tx: &mut Transaction,
    map: impl Fn(Vec2) -> Vec2,
) -> Result<(), DocumentError> {
    for &node in targets {
        let Some(p) = doc.position(node) else {
            continue;
        };
        let q = map(p);
        tx.set_attribute(doc, node, "x", q.x)?;
        tx.set_attribute(doc, node, "y", q.y)?;
    }
    Ok(())
}

fn origin_of(doc: &Document, targets: &[NodeId], origin: Option<Vec2>) -> Option<Vec2> {
    origin.or_else(|| targets.first().and_then(|&n| doc.position(n)))
}

fn sprites<'a>(doc: &'a Document, targets: &'a [NodeId]) -> impl Iterator<Item = NodeId> + 'a {
    targets.iter().copied().filter(|&n| doc.is_type(n, catalog::SCENERY))
}

/// Moves the selection by `delta`.
///
/// `replace` is the entry returned by the previous call of the same drag;
/// it is undone first so the whole drag ends up as one entry. Returns the
/// new entry, or `None` if nothing moved.
pub fn translate(editor: &mut MapEditor, delta: Vec2, replace: Option<EntryId>) -> EditActionResult<Option<EntryId>> {
    if let Some(id) = replace {
        editor.undo_entry(id)?;
    }
    let doc = editor.document();
    let targets = transform_targets(doc, editor.selection().nodes());
    let mut tx = editor.transaction("Move");
    move_targets(doc, &targets, &mut tx, |p| p + delta)?;
    Ok(editor.commit(tx)?.entry)
}

fn flip(editor: &mut MapEditor, origin: Option<Vec2>, horizontal: bool) -> EditActionResult<bool> {
    let doc = editor.document();
    let targets = transform_targets(doc, editor.selection().nodes());
    let Some(o) = origin_of(doc, &targets, origin) else {
        return Ok(false);
    };
    let (description, size_key) = if horizontal {
        ("Flip horizontally", "width")
    } else {
        ("Flip vertically", "height")
    };
    let mut tx = editor.transaction(description);
    move_targets(doc, &targets, &mut tx, |p| {
        if horizontal {
            Vec2::new(2.0 * o.x - p.x, p.y)
        } else {
            Vec2::new(p.x, 2.0 * o.y - p.y)
        }
    })?;
    for n in sprites(doc, &targets) {
        let size = doc.get_f32(n, size_key).unwrap_or_default();
        let rotation = doc.get_f32(n, "rotation").unwrap_or_default();
        tx.set_attribute(doc, n, size_key, -size)?;
        tx.set_attribute(doc, n, "rotation", normalize_angle(-rotation))?;
    }
    Ok(editor.commit(tx)?.is_recorded())
}

/// Mirrors the selection about the vertical line through `origin`, or
/// through the first affected node when `origin` is `None`.
pub fn flip_horizontal(editor: &mut MapEditor, origin: Option<Vec2>) -> EditActionResult<bool> {
    flip(editor, origin, true)
}

/// Mirrors the selection about the horizontal line through `origin`.
pub fn flip_vertical(editor: &mut MapEditor, origin: Option<Vec2>) -> EditActionResult<bool> {
    flip(editor, origin, false)
}

/// Turns the selection a quarter turn about `origin`.
pub fn rotate_90(editor: &mut MapEditor, rotation: Rotation, origin: Option<Vec2>) -> EditActionResult<bool> {
    let doc = editor.document();
    let targets = transform_targets(doc, editor.selection().nodes());
    let Some(o) = origin_of(doc, &targets, origin) else {
        return Ok(false);
    };
    let (sin, cos) = rotation.sin_cos();
    let description = match rotation {
        Rotation::Clockwise => "Rotate clockwise",
        Rotation::CounterClockwise => "Rotate counterclockwise",
    };
    let mut tx = editor.transaction(description);
    move_targets(doc, &targets, &mut tx, |p| {
        let d = p - o;
        Vec2::new(o.x + d.x * cos - d.y * sin, o.y + d.x * sin + d.y * cos)
    })?;
    for n in sprites(doc, &targets) {
        let current = doc.get_f32(n, "rotation").unwrap_or_default();
        tx.set_attribute(doc, n, "rotation", normalize_angle(current + rotation.angle()))?;
    }
    Ok(editor.commit(tx)?.is_recorded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::{editor_with_triangles, layer};

    fn points(editor: &MapEditor, triangle: NodeId) -> Vec<(f32, f32)> {
        let doc = editor.document();
        doc.children(triangle)
            .map(|v| {
                let p = doc.position(v).unwrap();
                (p.x, p.y)
            })
            .collect()
    }

    #[test]
    fn triangles_move_through_their_vertices() {
        let (mut editor, _, t) = editor_with_triangles(2);
        let root = editor.document().root();
        editor.state.selection.replace(NodeSet::from_iter([root, t[0]]));
        let targets = transform_targets(editor.document(), editor.selection().nodes());
        assert_eq!(targets.len(), 3);

        let entry = translate(&mut editor, Vec2::new(5.0, -5.0), None).unwrap();
        assert!(entry.is_some());
        assert_eq!(points(&editor, t[0]), [(5.0, -5.0), (15.0, -5.0), (5.0, 5.0)]);
        assert_eq!(points(&editor, t[1]), [(20.0, 0.0), (30.0, 0.0), (20.0, 10.0)]);

        editor.undo().unwrap();
        assert_eq!(points(&editor, t[0]), [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
    }

    #[test]
    fn drag_replaces_its_previous_step() {
        let (mut editor, _, t) = editor_with_triangles(1);
        editor.state.selection.replace(NodeSet::from_iter([t[0]]));

        let first = translate(&mut editor, Vec2::new(1.0, 0.0), None).unwrap();
        let second = translate(&mut editor, Vec2::new(4.0, 0.0), first).unwrap();
        assert!(second.is_some());
        assert_eq!(points(&editor, t[0])[0], (4.0, 0.0));
        assert_eq!(editor.history().undo_count(), 1);

        // A zero step still drops the preview.
        assert_eq!(translate(&mut editor, Vec2::zeros(), second).unwrap(), None);
        assert_eq!(points(&editor, t[0])[0], (0.0, 0.0));
        assert!(!editor.can_undo());
    }

    #[test]
    fn flips_mirror_about_the_first_node() {
        let (mut editor, _, t) = editor_with_triangles(1);
        editor.state.selection.replace(NodeSet::from_iter([t[0]]));

        assert!(flip_horizontal(&mut editor, None).unwrap());
        assert_eq!(points(&editor, t[0]), [(0.0, 0.0), (-10.0, 0.0), (0.0, 10.0)]);

        assert!(flip_vertical(&mut editor, Some(Vec2::new(0.0, 5.0))).unwrap());
        assert_eq!(points(&editor, t[0]), [(0.0, 10.0), (-10.0, 10.0), (0.0, 0.0)]);

        editor.state.selection.clear();
        assert!(!flip_horizontal(&mut editor, None).unwrap());
    }

    #[test]
    fn quarter_turns() {
        let (mut editor, _, t) = editor_with_triangles(1);
        editor.state.selection.replace(NodeSet::from_iter([t[0]]));

        assert!(rotate_90(&mut editor, Rotation::Clockwise, Some(Vec2::zeros())).unwrap());
        assert_eq!(points(&editor, t[0]), [(0.0, 0.0), (0.0, -10.0), (10.0, 0.0)]);

        assert!(rotate_90(&mut editor, Rotation::CounterClockwise, None).unwrap());
        assert_eq!(points(&editor, t[0]), [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
    }

    #[test]
    fn sprites_flip_and_turn_with_their_position() {
        let (mut editor, _, _) = editor_with_triangles(0);
        let scenery_layer = layer(&editor, "scenery-back");
        let doc = &mut editor.state.document;
        let resources = catalog::resources(doc).unwrap();
        let image = catalog::image(doc, "tree.png", 16.0, 32.0).unwrap();
        doc.insert(resources, None, image).unwrap();
        let sprite = catalog::scenery(doc, image, 10.0, 0.0).unwrap();
        doc.set(sprite, "rotation", 0.5f32).unwrap();
        doc.insert(scenery_layer, None, sprite).unwrap();
        doc.flush_changes();
        editor.state.selection.replace(NodeSet::from_iter([sprite]));

        assert!(flip_horizontal(&mut editor, Some(Vec2::zeros())).unwrap());
        let doc = editor.document();
        assert_eq!(doc.position(sprite), Some(Vec2::new(-10.0, 0.0)));
        assert_eq!(doc.get_f32(sprite, "width"), Some(-16.0));
        assert_eq!(doc.get_f32(sprite, "height"), Some(32.0));
        assert_eq!(doc.get_f32(sprite, "rotation"), Some(-0.5));

        assert!(rotate_90(&mut editor, Rotation::CounterClockwise, None).unwrap());
        let rotation = editor.document().get_f32(sprite, "rotation").unwrap();
        assert!((rotation - (std::f32::consts::FRAC_PI_2 - 0.5)).abs() < 1e-5);
    }
}
