use std::sync::{Arc, Mutex};

use mapwright_core::math::Vec2;
use mapwright_core::settings::Settings;
use mapwright_map::catalog::{self, MapLayout};
use mapwright_map::ops;
use mapwright_map::{ChangeEvent, ChangeKind, MapEditor, NodeId, NodeSet, SnapContext, SnapHandle, SnapSource};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn new_map(settings: Settings) -> (MapEditor, MapLayout) {
    init_logging();
    let registry = catalog::registry(&settings);
    let (document, layout) = catalog::default_document(registry).unwrap();
    let mut editor = MapEditor::new(document, settings);
    editor.active_layer = layout.layer("polygons-front");
    (editor, layout)
}

fn add_triangle(editor: &mut MapEditor, layer: NodeId, points: [(f32, f32); 3]) -> NodeId {
    let t = catalog::triangle(&mut editor.state.document, points).unwrap();
    let mut tx = editor.transaction("Add triangle");
    tx.insert(editor.document(), layer, None, t);
    assert!(editor.commit(tx).unwrap().is_recorded());
    t
}

fn add_waypoint(editor: &mut MapEditor, layer: NodeId, x: f32, y: f32) -> NodeId {
    let w = catalog::waypoint(&mut editor.state.document, x, y).unwrap();
    let mut tx = editor.transaction("Add waypoint");
    tx.insert(editor.document(), layer, None, w);
    editor.commit(tx).unwrap();
    w
}

fn connect(editor: &mut MapEditor, from: NodeId, to: NodeId) -> NodeId {
    let c = catalog::connection(&mut editor.state.document, to).unwrap();
    let mut tx = editor.transaction("Connect");
    tx.insert(editor.document(), from, None, c);
    editor.commit(tx).unwrap();
    c
}

// ---------------------------------------------------------------------------
// Settings and history
// ---------------------------------------------------------------------------

#[test]
fn settings_limit_the_history() {
    let settings = Settings::from_toml("[editor]\nundo-limit = 3\n").unwrap();
    let (mut editor, layout) = new_map(settings);
    let layer = layout.layer("polygons-front").unwrap();

    let triangles: Vec<NodeId> = (0..5)
        .map(|i| add_triangle(&mut editor, layer, [(i as f32, 0.0), (1.0, 0.0), (0.0, 1.0)]))
        .collect();
    assert_eq!(editor.history().undo_count(), 3);

    while editor.undo().unwrap() {}
    assert_eq!(editor.document().child_slice(layer), &triangles[..2]);

    while editor.redo().unwrap() {}
    assert_eq!(editor.document().child_slice(layer), triangles.as_slice());
}

#[test]
fn zero_undo_limit_means_unlimited() {
    let settings = Settings::from_toml("[editor]\nundo-limit = 0\n").unwrap();
    let (mut editor, layout) = new_map(settings);
    let layer = layout.layer("polygons-front").unwrap();
    let t = add_triangle(&mut editor, layer, [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
    assert!(editor.can_undo());
    assert_eq!(editor.history().undo_count(), 1);

    assert!(editor.undo().unwrap());
    assert!(editor.document().parent(t).is_none());
}

#[test]
fn save_point_tracks_undo() {
    let (mut editor, layout) = new_map(Settings::default());
    let layer = layout.layer("polygons-front").unwrap();
    add_triangle(&mut editor, layer, [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
    editor.mark_saved();
    assert!(!editor.has_unsaved_changes());

    editor.undo().unwrap();
    assert!(editor.has_unsaved_changes());
    editor.redo().unwrap();
    assert!(!editor.has_unsaved_changes());
}

// ---------------------------------------------------------------------------
// Change notification
// ---------------------------------------------------------------------------

#[test]
fn observers_see_committed_changes() {
    let (mut editor, layout) = new_map(Settings::default());
    let layer = layout.layer("polygons-front").unwrap();

    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::default();
    let sink = events.clone();
    editor
        .state
        .document
        .subscribe(move |e| sink.lock().unwrap().push(e.clone()));
    let selections: Arc<Mutex<Vec<usize>>> = Arc::default();
    let sink = selections.clone();
    editor
        .state
        .selection
        .subscribe(move |nodes: &NodeSet| sink.lock().unwrap().push(nodes.len()));

    let t = add_triangle(&mut editor, layer, [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
    let inserted = ChangeEvent {
        node: t,
        kind: ChangeKind::Insert,
    };
    assert!(events.lock().unwrap().contains(&inserted));
    assert_eq!(selections.lock().unwrap().last(), Some(&4));

    let mut tx = editor.transaction("Rename");
    tx.set_attribute(editor.document(), t, "text", "Floor").unwrap();
    editor.commit(tx).unwrap();
    let renamed = ChangeEvent {
        node: t,
        kind: ChangeKind::Attribute("text".into()),
    };
    assert_eq!(events.lock().unwrap().last(), Some(&renamed));

    editor.undo().unwrap();
    editor.undo().unwrap();
    let removed = ChangeEvent {
        node: t,
        kind: ChangeKind::Remove,
    };
    assert_eq!(events.lock().unwrap().last(), Some(&removed));
    assert_eq!(selections.lock().unwrap().last(), Some(&0));
}

// ---------------------------------------------------------------------------
// Clipboard across maps, then relocation
// ---------------------------------------------------------------------------

#[test]
fn paste_into_another_map_and_move_it() {
    let (mut source, layout) = new_map(Settings::default());
    source.state.document.set_path("/maps/ctf/ctf_Source.pms");
    let front = layout.layer("polygons-front").unwrap();
    let t = add_triangle(&mut source, front, [(0.0, 0.0), (64.0, 0.0), (0.0, 64.0)]);
    let texture = catalog::texture(&mut source.state.document, "../textures/rock.png").unwrap();
    let mut tx = source.transaction("Texture");
    tx.insert(source.document(), layout.resources, None, texture);
    tx.set_attribute(source.document(), t, "texture", texture).unwrap();
    let commit = source.commit(tx).unwrap();
    assert!(commit.dangling.is_empty());

    source.state.selection.replace(NodeSet::from_iter([t]));
    let clipboard = ops::copy(&source).unwrap().unwrap();

    let (mut target, target_layout) = new_map(Settings::default());
    target.state.document.set_path("/work/new.pms");
    assert!(ops::paste(&mut target, &clipboard).unwrap());

    let doc = target.document();
    let pasted = doc.child_slice(target_layout.layer("polygons-front").unwrap())[0];
    let pasted_texture = doc.get_node(pasted, "texture").unwrap();
    assert_eq!(doc.parent(pasted_texture), Some(target_layout.resources));
    assert_eq!(doc.get_str(pasted_texture, "src"), Some("/maps/textures/rock.png"));

    assert!(ops::relocate(&mut target, "/maps/dm/dm_New.pms").unwrap());
    assert_eq!(target.document().get_str(pasted_texture, "src"), Some("../textures/rock.png"));

    target.undo().unwrap();
    assert_eq!(target.document().path(), "/work/new.pms");
    assert_eq!(target.document().get_str(pasted_texture, "src"), Some("/maps/textures/rock.png"));

    // Pasting again reuses the resource added by the first paste.
    assert!(ops::paste(&mut target, &clipboard).unwrap());
    assert_eq!(target.document().child_slice(target_layout.resources).len(), 1);
}

// ---------------------------------------------------------------------------
// Waypoint graph editing
// ---------------------------------------------------------------------------

#[test]
fn cut_and_paste_keeps_connections_between_copied_waypoints() {
    let (mut editor, layout) = new_map(Settings::default());
    let waypoints = layout.layer("waypoints").unwrap();
    let a = add_waypoint(&mut editor, waypoints, 0.0, 0.0);
    let b = add_waypoint(&mut editor, waypoints, 100.0, 0.0);
    let c = add_waypoint(&mut editor, waypoints, 200.0, 0.0);
    connect(&mut editor, a, b);
    connect(&mut editor, b, a);
    let b_to_c = connect(&mut editor, b, c);

    editor.state.selection.replace(NodeSet::from_iter([a, b]));
    let clipboard = ops::cut(&mut editor).unwrap().unwrap();
    assert_eq!(editor.document().child_slice(waypoints), [c]);
    assert!(editor.document().dangling_references().is_empty());

    editor.active_layer = Some(waypoints);
    assert!(ops::paste(&mut editor, &clipboard).unwrap());
    let doc = editor.document();
    let pasted = &doc.child_slice(waypoints)[1..];
    assert_eq!(pasted.len(), 2);
    let link = doc.children(pasted[0]).next().unwrap();
    assert_eq!(doc.get_node(link, "waypoint"), Some(pasted[1]));
    // b -> c pointed outside the copy and was left behind.
    assert_eq!(doc.children(pasted[1]).count(), 1);

    editor.undo().unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.document().child_slice(waypoints), [a, b, c]);
    assert_eq!(editor.document().get_node(b_to_c, "waypoint"), Some(c));
}

// ---------------------------------------------------------------------------
// Snapping
// ---------------------------------------------------------------------------

#[test]
fn handle_snaps_to_a_vertex_and_follows_it() {
    let (mut editor, layout) = new_map(Settings::default());
    let front = layout.layer("polygons-front").unwrap();
    let t = add_triangle(&mut editor, front, [(12.0, 1.0), (80.0, 0.0), (0.0, 80.0)]);
    let vertex = editor.document().children(t).next().unwrap();

    let mut handle = SnapHandle::new();
    handle.set_snap_to_grid(Some(false));
    handle.add_source(SnapSource::new(front));
    {
        let ctx = SnapContext {
            document: editor.document(),
            settings: editor.settings(),
            view: &editor.view,
        };
        handle.move_to(&ctx, 10.0, 0.0);
        assert_eq!(handle.position(ctx.document), Vec2::new(12.0, 1.0));
        assert_eq!(handle.snap_result().and_then(|c| c.node), Some(vertex));
        assert!(handle.intersects_point(&ctx, Vec2::new(14.0, 2.0)));

        // Out of range: the handle goes where the cursor is.
        handle.move_to(&ctx, 40.0, 40.0);
        assert!(handle.snap_result().is_none());
        assert_eq!(handle.position(ctx.document), Vec2::new(40.0, 40.0));

        handle.reset(ctx.document, 12.0, 1.0, Some(vertex));
    }

    editor.state.selection.replace(NodeSet::from_iter([vertex]));
    ops::translate(&mut editor, Vec2::new(5.0, 0.0), None).unwrap();
    assert_eq!(handle.position(editor.document()), Vec2::new(17.0, 1.0));
}

// ---------------------------------------------------------------------------
// Garbage collection
// ---------------------------------------------------------------------------

#[test]
fn garbage_outlives_only_the_history() {
    let settings = Settings::from_toml("[editor]\nundo-limit = 1\n").unwrap();
    let (mut editor, layout) = new_map(settings);
    let front = layout.layer("polygons-front").unwrap();
    let first = add_triangle(&mut editor, front, [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);

    editor.state.selection.replace(NodeSet::from_iter([first]));
    ops::delete_selection(&mut editor).unwrap();
    editor.state.selection.clear();
    // Deleted but still undoable.
    assert_eq!(editor.collect_garbage(), 0);

    add_triangle(&mut editor, front, [(5.0, 5.0), (6.0, 5.0), (5.0, 6.0)]);
    editor.state.selection.clear();
    // The delete dropped out of the history: the triangle and its vertices go.
    assert_eq!(editor.collect_garbage(), 4);
    assert!(!editor.document().contains(first));
}
