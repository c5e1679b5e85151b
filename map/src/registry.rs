//! Node type registry.
//!
//! A [`NodeTypeRegistry`] is built once at startup and shared through an
//! `Arc`. Each [`NodeTypeInfo`] describes what a node of that type can do:
//! its attribute schema, whether it has a position, which children it
//! accepts, how it is hit by spatial queries and what happens to it when a
//! node it references is deleted.

use std::collections::HashMap;
use std::sync::Arc;

use crate::attribute::{DataType, Value};
use crate::document::{Document, NodeId};

/// One entry of a node type's attribute schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub key: String,
    pub data_type: DataType,
    pub default: Value,
}

/// How a node is hit by spatial queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    /// Not hit.
    None,
    /// Square handle of `size` screen pixels centered on the node position.
    Handle { size: f32 },
    /// World-space circle around the node position; the radius is read from
    /// the named float attribute.
    Circle { radius_key: String },
    /// Triangle spanned by the node's first three positioned children.
    Triangle,
    /// Segment from the parent's position to the node referenced by the
    /// named attribute, hit within `size` screen pixels.
    Segment { target_key: String, size: f32 },
    /// Transformed rectangle built from the `width`, `height`, `center-x`,
    /// `center-y`, `scale-x`, `scale-y` and `rotation` attributes.
    Sprite,
}

/// What happens to a node when a node it references is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingPolicy {
    /// Set the reference to null.
    #[default]
    Nullify,
    /// Delete the referring node as well.
    Cascade,
}

/// Extra acceptance test run after the static child type list matched.
///
/// Receives the document, the prospective parent and the child's type name.
pub type ChildFilter = fn(&Document, NodeId, &str) -> bool;

/// Capabilities of one node type.
#[derive(Debug, Clone)]
pub struct NodeTypeInfo {
    name: String,
    attributes: Vec<AttributeSchema>,
    positioned: bool,
    accepts: Vec<String>,
    child_filter: Option<ChildFilter>,
    footprint: Footprint,
    dangling: DanglingPolicy,
    layer: bool,
}

impl NodeTypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            positioned: false,
            accepts: Vec::new(),
            child_filter: None,
            footprint: Footprint::None,
            dangling: DanglingPolicy::default(),
            layer: false,
        }
    }

    /// Adds an attribute whose default is the data type's default.
    pub fn attribute(self, key: &str, data_type: DataType) -> Self {
        let default = data_type.default_value();
        self.attribute_with_default(key, data_type, default)
    }

    /// Adds an attribute with an explicit default.
    ///
    /// A key that is already present is replaced in place, keeping its
    /// position in the schema.
    pub fn attribute_with_default(mut self, key: &str, data_type: DataType, default: Value) -> Self {
        let schema = AttributeSchema {
            key: key.to_string(),
            data_type,
            default,
        };
        match self.attributes.iter_mut().find(|a| a.key == key) {
            Some(existing) => *existing = schema,
            None => self.attributes.push(schema),
        }
        self
    }

    /// Declares a position, stored in float attributes `x` and `y`.
    pub fn positioned(mut self) -> Self {
        self.positioned = true;
        self.attribute("x", DataType::Float).attribute("y", DataType::Float)
    }

    pub fn accepts(mut self, child_type: &str) -> Self {
        self.accepts.push(child_type.to_string());
        self
    }

    pub fn child_filter(mut self, filter: ChildFilter) -> Self {
        self.child_filter = Some(filter);
        self
    }

    pub fn footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn dangling(mut self, policy: DanglingPolicy) -> Self {
        self.dangling = policy;
        self
    }

    /// Marks the type as a layer: a container whose children can be
    /// arranged and which can be hidden.
    pub fn layer(mut self) -> Self {
        self.layer = true;
        self
    }

    // ---- accessors ----

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema in declaration order.
    pub fn attributes(&self) -> &[AttributeSchema] {
        &self.attributes
    }

    pub fn attribute_index(&self, key: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.key == key)
    }

    pub fn schema(&self, key: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.key == key)
    }

    pub fn is_positioned(&self) -> bool {
        self.positioned
    }

    /// Whether the static child list names `child_type`. See
    /// [`Document::accepts`] for the full check including the filter.
    pub fn lists_child(&self, child_type: &str) -> bool {
        self.accepts.iter().any(|t| t == child_type)
    }

    pub(crate) fn filter(&self) -> Option<ChildFilter> {
        self.child_filter
    }

    pub fn get_footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn dangling_policy(&self) -> DanglingPolicy {
        self.dangling
    }

    pub fn is_layer(&self) -> bool {
        self.layer
    }

    /// Keys of node-reference attributes.
    pub fn reference_keys(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|a| a.data_type == DataType::Node)
            .map(|a| a.key.as_str())
    }
}

/// Registry of node types keyed by type name.
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    types: HashMap<String, Arc<NodeTypeInfo>>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any earlier type of the same name.
    pub fn register(&mut self, info: NodeTypeInfo) -> &mut Self {
        if self.types.contains_key(info.name()) {
            log::warn!("Node type \"{}\" registered twice, replacing", info.name());
        }
        self.types.insert(info.name().to_string(), Arc::new(info));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<NodeTypeInfo>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::IntWidth;

    #[test]
    fn schema_keeps_declaration_order() {
        let info = NodeTypeInfo::new("marker")
            .attribute("text", DataType::String)
            .positioned()
            .attribute_with_default("weight", DataType::Integer(IntWidth::U8), Value::Int(3));

        let keys: Vec<_> = info.attributes().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["text", "x", "y", "weight"]);
        assert!(info.is_positioned());
        assert_eq!(info.schema("weight").unwrap().default, Value::Int(3));
        assert_eq!(info.attribute_index("y"), Some(2));
    }

    #[test]
    fn redeclared_attribute_keeps_position() {
        let info = NodeTypeInfo::new("n")
            .attribute("a", DataType::Float)
            .attribute("b", DataType::Float)
            .attribute_with_default("a", DataType::Float, Value::Float(2.0));
        assert_eq!(info.attribute_index("a"), Some(0));
        assert_eq!(info.attributes().len(), 2);
    }

    #[test]
    fn reference_keys() {
        let info = NodeTypeInfo::new("link")
            .attribute("text", DataType::String)
            .attribute("target", DataType::Node)
            .attribute("image", DataType::Node);
        assert_eq!(info.reference_keys().collect::<Vec<_>>(), ["target", "image"]);
    }

    #[test]
    fn register_replaces() {
        let mut registry = NodeTypeRegistry::new();
        registry
            .register(NodeTypeInfo::new("a"))
            .register(NodeTypeInfo::new("a").accepts("b"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").unwrap().lists_child("b"));
        assert!(registry.get("missing").is_none());
    }
}
