//! Node types of a polygon/scenery map and helpers to build content.
//!
//! This is the wiring the editing functions in [`crate::ops`] are written
//! against: a `map` root holding one `resources` group followed by the
//! layers, each layer accepting one kind of object.

use std::sync::Arc;

use mapwright_core::settings::Settings;

use crate::attribute::{Color, DataType, EnumType, IntWidth, Value};
use crate::document::{Document, NodeId};
use crate::error::DocumentError;
use crate::path;
use crate::registry::{DanglingPolicy, Footprint, NodeTypeInfo, NodeTypeRegistry};

pub const MAP: &str = "map";
pub const RESOURCES: &str = "resources";
pub const LAYER: &str = "layer";
pub const TEXTURE: &str = "texture";
pub const IMAGE: &str = "image";
pub const TRIANGLE: &str = "triangle";
pub const VERTEX: &str = "vertex";
pub const SCENERY: &str = "scenery";
pub const COLLIDER: &str = "collider";
pub const SPAWN: &str = "spawn";
pub const WAYPOINT: &str = "waypoint";
pub const CONNECTION: &str = "connection";

/// Layer types in default stacking order, with their default names.
pub const DEFAULT_LAYERS: [(&str, &str); 8] = [
    ("polygons-back", "Background polygons"),
    ("scenery-back", "Background scenery"),
    ("scenery-middle", "Middle scenery"),
    ("polygons-front", "Front polygons"),
    ("scenery-front", "Front scenery"),
    ("colliders", "Colliders"),
    ("waypoints", "Waypoints"),
    ("spawns", "Spawns"),
];

const POLY_TYPES: [&str; 26] = [
    "normal",
    "only-bullets-collide",
    "only-players-collide",
    "no-collide",
    "ice",
    "deadly",
    "bloody-deadly",
    "hurts",
    "regenerates",
    "lava",
    "alpha-bullets",
    "alpha-players",
    "bravo-bullets",
    "bravo-players",
    "charlie-bullets",
    "charlie-players",
    "delta-bullets",
    "delta-players",
    "bouncy",
    "explosive",
    "hurts-flaggers",
    "flagger-collides",
    "non-flagger-collides",
    "flag-collides",
    "background",
    "background-transition",
];

const BACKGROUND_POLY_TYPES: [&str; 2] = ["background", "background-transition"];

const SPAWN_TEAMS: [&str; 17] = [
    "general",
    "alpha",
    "bravo",
    "charlie",
    "delta",
    "alpha-flag",
    "bravo-flag",
    "grenades",
    "medikits",
    "clusters",
    "vest",
    "flamer",
    "berserker",
    "predator",
    "yellow-flag",
    "rambo-bow",
    "stat-gun",
];

/// Object type a layer of `layer_type` holds.
pub fn layer_content(layer_type: &str) -> Option<&'static str> {
    match layer_type {
        "polygons-back" | "polygons-front" => Some(TRIANGLE),
        "scenery-back" | "scenery-middle" | "scenery-front" => Some(SCENERY),
        "colliders" => Some(COLLIDER),
        "waypoints" => Some(WAYPOINT),
        "spawns" => Some(SPAWN),
        _ => None,
    }
}

/// Polygon types allowed in a layer, default first. Empty for layers
/// without polygons.
pub fn allowed_poly_types(layer_type: &str) -> Vec<&'static str> {
    match layer_type {
        "polygons-back" => BACKGROUND_POLY_TYPES.to_vec(),
        "polygons-front" => POLY_TYPES
            .iter()
            .copied()
            .filter(|t| !BACKGROUND_POLY_TYPES.contains(t))
            .collect(),
        _ => Vec::new(),
    }
}

fn layer_accepts(doc: &Document, layer: NodeId, child_type: &str) -> bool {
    doc.get_str(layer, "type")
        .and_then(layer_content)
        .is_some_and(|t| t == child_type)
}

fn white() -> Value {
    Value::Color(Color::rgb(255, 255, 255))
}

fn resource(name: &str) -> NodeTypeInfo {
    NodeTypeInfo::new(name)
        .attribute("text", DataType::String)
        .attribute("src", DataType::String)
        .attribute("export-name", DataType::String)
        .attribute("color-key", DataType::Color)
        .attribute("width", DataType::Float)
        .attribute("height", DataType::Float)
}

fn text(default: &str) -> (DataType, Value) {
    (DataType::String, Value::String(default.to_string()))
}

/// Builds the registry. Handle sizes and the collider radius come from
/// `settings`.
pub fn registry(settings: &Settings) -> Arc<NodeTypeRegistry> {
    let editor = &settings.editor;
    let layer_types: Vec<&str> = DEFAULT_LAYERS.iter().map(|(t, _)| *t).collect();
    let poly_type = EnumType::new("poly-type", &POLY_TYPES);
    let (string, map_name) = text("Map");

    let mut r = NodeTypeRegistry::new();
    r.register(
        NodeTypeInfo::new(MAP)
            .attribute_with_default("text", string, map_name)
            .attribute("description", DataType::String)
            .attribute_with_default("color-top", DataType::Color, Value::Color(Color::rgb(0, 0, 0)))
            .attribute_with_default("color-bottom", DataType::Color, Value::Color(Color::rgb(0, 0, 0)))
            .attribute_with_default("jet", DataType::Integer(IntWidth::I16), Value::Int(190))
            .attribute_with_default("grenades", DataType::Integer(IntWidth::U8), Value::Int(5))
            .attribute_with_default("medikits", DataType::Integer(IntWidth::U8), Value::Int(5))
            .attribute(
                "weather",
                DataType::Enum(EnumType::new("weather", &["none", "rain", "sandstorm", "snow"])),
            )
            .attribute(
                "steps",
                DataType::Enum(EnumType::new("steps", &["hard-ground", "soft-ground", "none"])),
            )
            .accepts(RESOURCES)
            .accepts(LAYER),
    )
    .register({
        let (t, v) = text("Resources");
        NodeTypeInfo::new(RESOURCES)
            .attribute_with_default("text", t, v)
            .accepts(TEXTURE)
            .accepts(IMAGE)
    })
    .register(
        NodeTypeInfo::new(LAYER)
            .attribute("text", DataType::String)
            .attribute("type", DataType::Enum(EnumType::new("layer-type", &layer_types)))
            .accepts(TRIANGLE)
            .accepts(SCENERY)
            .accepts(COLLIDER)
            .accepts(WAYPOINT)
            .accepts(SPAWN)
            .child_filter(layer_accepts)
            .layer(),
    )
    .register(resource(TEXTURE))
    .register(resource(IMAGE))
    .register({
        let (t, v) = text("Triangle");
        NodeTypeInfo::new(TRIANGLE)
            .attribute_with_default("text", t, v)
            .attribute("poly-type", DataType::Enum(poly_type))
            .attribute("bounciness", DataType::Float)
            .attribute("texture", DataType::Node)
            .accepts(VERTEX)
            .footprint(Footprint::Triangle)
    })
    .register(
        NodeTypeInfo::new(VERTEX)
            .attribute("text", DataType::String)
            .positioned()
            .attribute("u", DataType::Float)
            .attribute("v", DataType::Float)
            .attribute_with_default("color", DataType::Color, white())
            .footprint(Footprint::Handle {
                size: editor.vertex_size,
            }),
    )
    .register({
        let (t, v) = text("Scenery");
        NodeTypeInfo::new(SCENERY)
            .attribute_with_default("text", t, v)
            .attribute("image", DataType::Node)
            .positioned()
            .attribute("width", DataType::Float)
            .attribute("height", DataType::Float)
            .attribute("center-x", DataType::Float)
            .attribute("center-y", DataType::Float)
            .attribute_with_default("scale-x", DataType::Float, Value::Float(1.0))
            .attribute_with_default("scale-y", DataType::Float, Value::Float(1.0))
            .attribute("rotation", DataType::Angle)
            .attribute_with_default("color", DataType::Color, white())
            .footprint(Footprint::Sprite)
            .dangling(DanglingPolicy::Cascade)
    })
    .register({
        let (t, v) = text("Collider");
        NodeTypeInfo::new(COLLIDER)
            .attribute_with_default("text", t, v)
            .positioned()
            .attribute_with_default("radius", DataType::Float, Value::Float(settings.map.collider_radius))
            .footprint(Footprint::Circle {
                radius_key: "radius".into(),
            })
    })
    .register({
        let (t, v) = text("Spawn");
        NodeTypeInfo::new(SPAWN)
            .attribute_with_default("text", t, v)
            .positioned()
            .attribute("type", DataType::Enum(EnumType::new("spawn-team", &SPAWN_TEAMS)))
            .footprint(Footprint::Handle {
                size: editor.waypoint_size,
            })
    })
    .register({
        let (t, v) = text("Waypoint");
        NodeTypeInfo::new(WAYPOINT)
            .attribute_with_default("text", t, v)
            .positioned()
            .attribute("left", DataType::Boolean)
            .attribute("right", DataType::Boolean)
            .attribute("up", DataType::Boolean)
            .attribute("down", DataType::Boolean)
            .attribute("jet", DataType::Boolean)
            .attribute("path", DataType::Enum(EnumType::new("path", &["path-1", "path-2"])))
            .attribute(
                "action",
                DataType::Enum(EnumType::new(
                    "action",
                    &[
                        "none",
                        "stop-and-camp",
                        "wait-1-second",
                        "wait-5-seconds",
                        "wait-10-seconds",
                        "wait-15-seconds",
                        "wait-20-seconds",
                    ],
                )),
            )
            .accepts(CONNECTION)
            .footprint(Footprint::Handle {
                size: editor.waypoint_size,
            })
    })
    .register({
        let (t, v) = text("Connection");
        NodeTypeInfo::new(CONNECTION)
            .attribute_with_default("text", t, v)
            .attribute("waypoint", DataType::Node)
            .footprint(Footprint::Segment {
                target_key: "waypoint".into(),
                size: editor.vertex_size,
            })
            .dangling(DanglingPolicy::Cascade)
    });
    Arc::new(r)
}

/// Where the top-level groups of a default document live.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayout {
    pub resources: NodeId,
    layers: Vec<(&'static str, NodeId)>,
}

impl MapLayout {
    /// First layer of the given type.
    pub fn layer(&self, layer_type: &str) -> Option<NodeId> {
        self.layers
            .iter()
            .find_map(|&(t, id)| (t == layer_type).then_some(id))
    }

    pub fn layers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.layers.iter().map(|&(_, id)| id)
    }
}

/// An empty map with the resources group and one layer of every type.
pub fn default_document(registry: Arc<NodeTypeRegistry>) -> Result<(Document, MapLayout), DocumentError> {
    let mut doc = Document::new(registry, MAP)?;
    let root = doc.root();
    let resources = doc.create(RESOURCES)?;
    doc.insert(root, None, resources)?;

    let mut layers = Vec::with_capacity(DEFAULT_LAYERS.len());
    for (layer_type, name) in DEFAULT_LAYERS {
        let layer = doc.create(LAYER)?;
        doc.set(layer, "text", name)?;
        doc.set(layer, "type", Value::Enum(layer_type.to_string()))?;
        doc.insert(root, None, layer)?;
        layers.push((layer_type, layer));
    }
    // A fresh document has nothing to report.
    doc.flush_changes();
    Ok((doc, MapLayout { resources, layers }))
}

/// The resources group of `doc`, if it has one.
pub fn resources(doc: &Document) -> Option<NodeId> {
    doc.children_of_type(doc.root(), RESOURCES).next()
}

/// Type of a layer node.
pub fn layer_type(doc: &Document, layer: NodeId) -> Option<&str> {
    doc.is_type(layer, LAYER).then(|| doc.get_str(layer, "type")).flatten()
}

/// Absolute file location of a resource, resolved against the directory
/// of the document it belongs to. `None` when it cannot be determined.
pub fn resource_location(doc: &Document, id: NodeId) -> Option<String> {
    let src = doc.get_str(id, "src")?;
    let location = path::resource_path(src, path::dir(doc.path()));
    (!location.is_empty()).then_some(location)
}

// ---- content helpers; every node is created detached ----

pub fn vertex(doc: &mut Document, x: f32, y: f32) -> Result<NodeId, DocumentError> {
    let v = doc.create(VERTEX)?;
    doc.set(v, "x", x)?;
    doc.set(v, "y", y)?;
    Ok(v)
}

/// A triangle with its three vertices.
pub fn triangle(doc: &mut Document, points: [(f32, f32); 3]) -> Result<NodeId, DocumentError> {
    let t = doc.create(TRIANGLE)?;
    for (x, y) in points {
        let v = vertex(doc, x, y)?;
        doc.insert(t, None, v)?;
    }
    Ok(t)
}

fn resource_node(doc: &mut Document, type_name: &str, src: &str) -> Result<NodeId, DocumentError> {
    let n = doc.create(type_name)?;
    doc.set(n, "src", src)?;
    doc.set(n, "text", path::filename(src))?;
    Ok(n)
}

pub fn texture(doc: &mut Document, src: &str) -> Result<NodeId, DocumentError> {
    resource_node(doc, TEXTURE, src)
}

pub fn image(doc: &mut Document, src: &str, width: f32, height: f32) -> Result<NodeId, DocumentError> {
    let n = resource_node(doc, IMAGE, src)?;
    doc.set(n, "width", width)?;
    doc.set(n, "height", height)?;
    Ok(n)
}

/// A scenery sprite showing `image`, sized like the image.
pub fn scenery(doc: &mut Document, image: NodeId, x: f32, y: f32) -> Result<NodeId, DocumentError> {
    let width = doc.get_f32(image, "width").unwrap_or_default();
    let height = doc.get_f32(image, "height").unwrap_or_default();
    let n = doc.create(SCENERY)?;
    doc.set(n, "image", image)?;
    doc.set(n, "x", x)?;
    doc.set(n, "y", y)?;
    doc.set(n, "width", width)?;
    doc.set(n, "height", height)?;
    Ok(n)
}

pub fn collider(doc: &mut Document, x: f32, y: f32) -> Result<NodeId, DocumentError> {
    let n = doc.create(COLLIDER)?;
    doc.set(n, "x", x)?;
    doc.set(n, "y", y)?;
    Ok(n)
}

pub fn spawn(doc: &mut Document, x: f32, y: f32, team: &str) -> Result<NodeId, DocumentError> {
    let n = doc.create(SPAWN)?;
    doc.set(n, "x", x)?;
    doc.set(n, "y", y)?;
    doc.set(n, "type", Value::Enum(team.to_string()))?;
    Ok(n)
}

pub fn waypoint(doc: &mut Document, x: f32, y: f32) -> Result<NodeId, DocumentError> {
    let n = doc.create(WAYPOINT)?;
    doc.set(n, "x", x)?;
    doc.set(n, "y", y)?;
    Ok(n)
}

/// A connection to `target`. Insert it under the waypoint it starts from.
pub fn connection(doc: &mut Document, target: NodeId) -> Result<NodeId, DocumentError> {
    let n = doc.create(CONNECTION)?;
    doc.set(n, "waypoint", target)?;
    Ok(n)
}
