//! Snapping for interactive handles.
//!
//! A [`SnapHandle`] follows the cursor and, when it moves, looks for the
//! nearest snap target within `editor.snap-radius` screen pixels: positions
//! of nearby nodes (sprite nodes offer their four corners) and the corners
//! of the grid cell under the cursor. Candidates are collected sources
//! first, in source order, then grid corners; on equal distance the first
//! candidate wins.

use std::fmt;

use mapwright_core::math::{Vec2, distance2};
use mapwright_core::settings::Settings;

use crate::document::{Document, NodeId};
use crate::registry::Footprint;
use crate::view::{Grid, View};

type SourceFilter = Box<dyn Fn(&Document, NodeId) -> bool + Send>;

/// A subtree to look for snap targets in.
pub struct SnapSource {
    root: NodeId,
    filter: Option<SourceFilter>,
}

impl SnapSource {
    pub fn new(root: NodeId) -> Self {
        Self { root, filter: None }
    }

    /// Only nodes for which `filter` returns `true` are snapped to.
    pub fn with_filter(root: NodeId, filter: impl Fn(&Document, NodeId) -> bool + Send + 'static) -> Self {
        Self {
            root,
            filter: Some(Box::new(filter)),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn nodes_near(&self, doc: &Document, p: Vec2, r: f32, scale: f32) -> Vec<NodeId> {
        let mut nodes = doc.nodes_intersecting_rect(self.root, p.x - r, p.y - r, 2.0 * r, 2.0 * r, scale);
        if let Some(filter) = &self.filter {
            nodes.retain(|&n| filter(doc, n));
        }
        nodes
    }
}

impl fmt::Debug for SnapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapSource")
            .field("root", &self.root)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// A point a handle can snap to. `node` is `None` for grid corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    pub node: Option<NodeId>,
    pub position: Vec2,
    pub distance2: f32,
}

/// Everything snapping reads besides the handle itself.
#[derive(Debug, Clone, Copy)]
pub struct SnapContext<'a> {
    pub document: &'a Document,
    pub settings: &'a Settings,
    pub view: &'a View,
}

/// A cursor-following point that snaps to nearby geometry and the grid.
///
/// The position is stored relative to an optional reference node, so a
/// handle attached to a node follows it when the node moves.
#[derive(Debug, Default)]
pub struct SnapHandle {
    pub visible: bool,
    pub active: bool,
    reference: Option<NodeId>,
    offset: Vec2,
    sources: Vec<SnapSource>,
    snap_result: Option<SnapCandidate>,
    snap_to_objects: Option<bool>,
    snap_to_grid: Option<bool>,
}

impl SnapHandle {
    pub fn new() -> Self {
        Self {
            visible: true,
            ..Default::default()
        }
    }

    pub fn add_source(&mut self, source: SnapSource) {
        self.sources.push(source);
    }

    pub fn clear_sources(&mut self) {
        self.sources.clear();
    }

    pub fn sources(&self) -> &[SnapSource] {
        &self.sources
    }

    pub fn reference(&self) -> Option<NodeId> {
        self.reference
    }

    /// Result of the last [`move_to`](Self::move_to).
    pub fn snap_result(&self) -> Option<&SnapCandidate> {
        self.snap_result.as_ref()
    }

    /// Local override; `None` falls back to `editor.snap-to-objects`.
    pub fn set_snap_to_objects(&mut self, value: Option<bool>) {
        self.snap_to_objects = value;
    }

    /// Local override; `None` falls back to `view.grid && editor.snap-to-grid`.
    pub fn set_snap_to_grid(&mut self, value: Option<bool>) {
        self.snap_to_grid = value;
    }

    pub fn snaps_to_objects(&self, settings: &Settings) -> bool {
        self.snap_to_objects.unwrap_or(settings.editor.snap_to_objects)
    }

    pub fn snaps_to_grid(&self, settings: &Settings) -> bool {
        self.snap_to_grid
            .unwrap_or(settings.view.grid && settings.editor.snap_to_grid)
    }

    /// Absolute position.
    pub fn position(&self, doc: &Document) -> Vec2 {
        self.anchor(doc) + self.offset
    }

    fn anchor(&self, doc: &Document) -> Vec2 {
        self.reference
            .and_then(|r| doc.position(r))
            .unwrap_or_else(Vec2::zeros)
    }

    /// Places the handle at `(x, y)` without snapping and re-anchors it.
    pub fn reset(&mut self, doc: &Document, x: f32, y: f32, reference: Option<NodeId>) {
        self.reference = reference;
        self.offset = Vec2::new(x, y) - self.anchor(doc);
    }

    /// Moves to the snapped point near `(x, y)`, or to `(x, y)` itself when
    /// nothing is in range.
    pub fn move_to(&mut self, ctx: &SnapContext<'_>, x: f32, y: f32) {
        self.snap_result = self.snap(ctx, x, y);
        let target = self
            .snap_result
            .map_or(Vec2::new(x, y), |c| c.position);
        self.offset = target - self.anchor(ctx.document);
    }

    /// Nearest candidate within the snap radius.
    pub fn snap(&self, ctx: &SnapContext<'_>, x: f32, y: f32) -> Option<SnapCandidate> {
        let p = Vec2::new(x, y);
        let scale = ctx.view.scale();
        let r = ctx.settings.editor.snap_radius / scale;
        let doc = ctx.document;

        let mut candidates: Vec<SnapCandidate> = Vec::new();
        let mut push = |node: Option<NodeId>, position: Vec2| {
            candidates.push(SnapCandidate {
                node,
                position,
                distance2: distance2(p, position),
            })
        };

        if self.snaps_to_objects(ctx.settings) {
            for source in &self.sources {
                for node in source.nodes_near(doc, p, r, scale) {
                    let Some(position) = doc.position(node) else {
                        continue;
                    };
                    let is_sprite = doc
                        .node_type(node)
                        .is_some_and(|t| *t.get_footprint() == Footprint::Sprite);
                    match doc.sprite_vertices(node).filter(|_| is_sprite) {
                        Some(vertices) => vertices.into_iter().for_each(|v| push(Some(node), v)),
                        None => push(Some(node), position),
                    }
                }
            }
        }

        if self.snaps_to_grid(ctx.settings) {
            let grid = Grid::new(&ctx.settings.editor, scale);
            for corner in grid.cell_corners(p) {
                push(None, corner);
            }
        }

        candidates.into_iter().fold(None, |best: Option<SnapCandidate>, c| {
            let better = c.distance2 <= r * r && best.is_none_or(|b| c.distance2 < b.distance2);
            if better { Some(c) } else { best }
        })
    }

    /// Whether `p` is on the handle, within half of `editor.vertex-size`
    /// screen pixels on both axes.
    pub fn intersects_point(&self, ctx: &SnapContext<'_>, p: Vec2) -> bool {
        let d = 0.5 * ctx.settings.editor.vertex_size / ctx.view.scale();
        let pos = self.position(ctx.document);
        (p.x - pos.x).abs() <= d && (p.y - pos.y).abs() <= d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    struct Fixture {
        doc: Document,
        settings: Settings,
        view: View,
        layer: NodeId,
        front: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = Settings::default();
            let registry = catalog::registry(&settings);
            let (doc, layout) = catalog::default_document(registry).unwrap();
            let layer = layout.layer("polygons-back").unwrap();
            let front = layout.layer("polygons-front").unwrap();
            Self {
                doc,
                settings,
                view: View::new(800.0, 600.0),
                layer,
                front,
            }
        }

        fn ctx(&self) -> SnapContext<'_> {
            SnapContext {
                document: &self.doc,
                settings: &self.settings,
                view: &self.view,
            }
        }

        fn add_triangle(&mut self, pts: [(f32, f32); 3]) -> NodeId {
            self.add_triangle_to(self.layer, pts)
        }

        fn add_triangle_to(&mut self, layer: NodeId, pts: [(f32, f32); 3]) -> NodeId {
            let t = catalog::triangle(&mut self.doc, pts).unwrap();
            self.doc.insert(layer, None, t).unwrap();
            t
        }
    }

    fn vertices(root: NodeId) -> SnapSource {
        SnapSource::with_filter(root, |doc, n| doc.is_type(n, "vertex"))
    }

    #[test]
    fn snaps_to_nearest_vertex() {
        let mut f = Fixture::new();
        f.settings.editor.snap_to_grid = false;
        let tri = f.add_triangle([(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let mut handle = SnapHandle::new();
        handle.add_source(SnapSource::with_filter(f.layer, |doc, n| doc.is_type(n, "vertex")));

        let hit = handle.snap(&f.ctx(), 3.0, 1.0).unwrap();
        assert_eq!(hit.position, Vec2::new(0.0, 0.0));
        assert_eq!(hit.node, f.doc.children(tri).next());
        assert_eq!(hit.distance2, 10.0);

        // Out of the 5px radius.
        assert!(handle.snap(&f.ctx(), 50.0, 50.0).is_none());
    }

    #[test]
    fn radius_scales_with_zoom() {
        let mut f = Fixture::new();
        f.settings.editor.snap_to_grid = false;
        f.add_triangle([(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let mut handle = SnapHandle::new();
        handle.add_source(SnapSource::new(f.layer));

        assert!(handle.snap(&f.ctx(), 4.0, 0.0).is_some());
        f.view.set_scale(2.0);
        assert!(handle.snap(&f.ctx(), 4.0, 0.0).is_none());
    }

    #[test]
    fn grid_corners_and_overrides() {
        let f = Fixture::new();
        let mut handle = SnapHandle::new();
        let hit = handle.snap(&f.ctx(), 21.0, 38.0).unwrap();
        assert_eq!(hit.position, Vec2::new(20.0, 40.0));
        assert_eq!(hit.node, None);

        handle.set_snap_to_grid(Some(false));
        assert!(handle.snap(&f.ctx(), 21.0, 38.0).is_none());
    }

    #[test]
    fn ties_keep_first_candidate() {
        let mut f = Fixture::new();
        f.settings.editor.snap_to_grid = false;
        let a = f.add_triangle([(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let b = f.add_triangle([(4.0, 0.0), (100.0, 50.0), (50.0, 100.0)]);
        let mut handle = SnapHandle::new();
        handle.add_source(SnapSource::with_filter(f.layer, |doc, n| doc.is_type(n, "vertex")));

        // Equidistant from (0,0) and (4,0). The layer is walked topmost
        // first, so the vertex of `b` comes first.
        let hit = handle.snap(&f.ctx(), 2.0, 0.0).unwrap();
        assert_eq!(hit.node, f.doc.children(b).next());
        assert_ne!(hit.node, f.doc.children(a).next());
    }

    #[test]
    fn nearest_wins_within_radius() {
        let mut f = Fixture::new();
        f.settings.editor.snap_to_grid = false;
        f.settings.editor.snap_radius = 4.0;
        let near = f.add_triangle([(10.0, 8.0), (60.0, -40.0), (-40.0, -40.0)]);
        // Added last, so queried first.
        f.add_triangle([(13.0, 10.0), (60.0, 10.0), (13.0, 60.0)]);
        let mut handle = SnapHandle::new();
        handle.add_source(vertices(f.layer));

        let hit = handle.snap(&f.ctx(), 10.0, 10.0).unwrap();
        assert_eq!(hit.distance2, 4.0);
        assert_eq!(hit.node, f.doc.children(near).next());
    }

    #[test]
    fn objects_win_ties_against_grid() {
        let mut f = Fixture::new();
        let tri = f.add_triangle([(2.0, 0.0), (50.0, 0.0), (2.0, 50.0)]);
        let mut handle = SnapHandle::new();
        handle.add_source(vertices(f.layer));
        assert!(handle.snaps_to_grid(&f.settings));

        // (2,0) and the grid corner (0,0) are both one unit away.
        let hit = handle.snap(&f.ctx(), 1.0, 0.0).unwrap();
        assert_eq!(hit.distance2, 1.0);
        assert_eq!(hit.position, Vec2::new(2.0, 0.0));
        assert_eq!(hit.node, f.doc.children(tri).next());

        handle.set_snap_to_objects(Some(false));
        let hit = handle.snap(&f.ctx(), 1.0, 0.0).unwrap();
        assert_eq!(hit.position, Vec2::new(0.0, 0.0));
        assert_eq!(hit.node, None);
    }

    #[test]
    fn earlier_source_wins_ties() {
        let mut f = Fixture::new();
        f.settings.editor.snap_to_grid = false;
        let back = f.add_triangle([(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let front = f.add_triangle_to(f.front, [(4.0, 0.0), (100.0, 50.0), (50.0, 100.0)]);
        let back_vertex = f.doc.children(back).next();
        let front_vertex = f.doc.children(front).next();

        let mut handle = SnapHandle::new();
        handle.add_source(vertices(f.layer));
        handle.add_source(vertices(f.front));
        assert_eq!(handle.snap(&f.ctx(), 2.0, 0.0).unwrap().node, back_vertex);

        handle.clear_sources();
        handle.add_source(vertices(f.front));
        handle.add_source(vertices(f.layer));
        assert_eq!(handle.snap(&f.ctx(), 2.0, 0.0).unwrap().node, front_vertex);
    }

    #[test]
    fn move_to_follows_reference() {
        let mut f = Fixture::new();
        f.settings.editor.snap_to_grid = false;
        let tri = f.add_triangle([(10.0, 10.0), (100.0, 0.0), (0.0, 100.0)]);
        let v = f.doc.children(tri).next().unwrap();

        let mut handle = SnapHandle::new();
        handle.reset(&f.doc, 15.0, 10.0, Some(v));
        assert_eq!(handle.position(&f.doc), Vec2::new(15.0, 10.0));

        handle.move_to(&f.ctx(), 30.0, 30.0);
        assert!(handle.snap_result().is_none());
        assert_eq!(handle.position(&f.doc), Vec2::new(30.0, 30.0));

        f.doc.set(v, "x", 20.0).unwrap();
        assert_eq!(handle.position(&f.doc), Vec2::new(40.0, 30.0));
        assert!(handle.intersects_point(&f.ctx(), Vec2::new(42.0, 31.0)));
        assert!(!handle.intersects_point(&f.ctx(), Vec2::new(42.0, 40.0)));
    }
}
