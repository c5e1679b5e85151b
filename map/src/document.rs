//! The map document: an arena of typed nodes arranged in a single tree.
//!
//! Nodes are created detached and stay in the arena after they are removed
//! from the tree, because the edit history may attach them again. Slots are
//! only reused after [`Document::collect_garbage`], and every reuse bumps
//! the slot generation so stale [`NodeId`]s never alias a new node.
//!
//! Mutations queue [`ChangeEvent`]s. Subscribers see them only when
//! [`Document::flush_changes`] runs, which the transaction code does once
//! per applied transaction.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use mapwright_core::math::{
    Rect, Vec2, point_to_segment_distance2, sprite_transform, transform_point,
    triangle_contains_point,
};

use crate::attribute::Value;
use crate::error::{DanglingReference, DocumentError, InvalidOperation, ValidationError};
use crate::registry::{AttributeSchema, Footprint, NodeTypeInfo, NodeTypeRegistry};

// ---------------------------------------------------------------------------
// Ids and events
// ---------------------------------------------------------------------------

/// Stable handle to a node in a [`Document`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index in the arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The named attribute changed value.
    Attribute(String),
    /// The node was attached to a parent.
    Insert,
    /// The node was detached from its parent.
    Remove,
    /// The document path changed. Reported on the root.
    Relocate,
    /// The node was shown or hidden.
    Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub node: NodeId,
    pub kind: ChangeKind,
}

/// Handle returned by [`Document::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ChangeEvent) + Send>;

/// A node reference found while scanning the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub node: NodeId,
    pub key: String,
    pub target: NodeId,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Node {
    info: Arc<NodeTypeInfo>,
    values: Vec<Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visible: bool,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A tree of typed nodes plus the arena that owns them.
pub struct Document {
    registry: Arc<NodeTypeRegistry>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    path: String,
    pending: Vec<ChangeEvent>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Document {
    /// Creates a document whose root node has type `root_type`.
    pub fn new(registry: Arc<NodeTypeRegistry>, root_type: &str) -> Result<Self, DocumentError> {
        let mut doc = Self {
            registry,
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            path: String::new(),
            pending: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        doc.root = doc.create(root_type)?;
        Ok(doc)
    }

    pub fn registry(&self) -> &Arc<NodeTypeRegistry> {
        &self.registry
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a detached node with every attribute at its default.
    pub fn create(&mut self, type_name: &str) -> Result<NodeId, DocumentError> {
        let info = self
            .registry
            .get(type_name)
            .cloned()
            .ok_or_else(|| InvalidOperation::UnknownType(type_name.to_string()))?;
        let values = info.attributes().iter().map(|a| a.default.clone()).collect();
        let node = Node {
            info,
            values,
            parent: None,
            children: Vec::new(),
            visible: true,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            Ok(NodeId {
                index,
                generation: slot.generation,
            })
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            Ok(NodeId {
                index,
                generation: 0,
            })
        }
    }

    /// Whether `id` names a live node of this arena, attached or not.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn live(&self, id: NodeId) -> Result<&Node, InvalidOperation> {
        self.node(id).ok_or(InvalidOperation::UnknownNode(id))
    }

    pub fn node_type(&self, id: NodeId) -> Option<&Arc<NodeTypeInfo>> {
        self.node(id).map(|n| &n.info)
    }

    pub fn type_name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.info.name())
    }

    pub fn is_type(&self, id: NodeId, type_name: &str) -> bool {
        self.type_name(id) == Some(type_name)
    }

    // ---- path ----

    /// Location the document is saved under. Empty for a new document.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `false` if the path is unchanged.
    pub fn set_path(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.path == path {
            return false;
        }
        self.path = path;
        self.queue(self.root, ChangeKind::Relocate);
        true
    }

    // ---------------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------------

    pub fn get(&self, id: NodeId, key: &str) -> Option<&Value> {
        let node = self.node(id)?;
        let index = node.info.attribute_index(key)?;
        node.values.get(index)
    }

    pub fn get_f32(&self, id: NodeId, key: &str) -> Option<f32> {
        self.get(id, key).and_then(Value::as_f32)
    }

    pub fn get_str(&self, id: NodeId, key: &str) -> Option<&str> {
        self.get(id, key).and_then(Value::as_str)
    }

    /// Target of a node-reference attribute, `None` if unset or not a reference.
    pub fn get_node(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.get(id, key).and_then(Value::as_node)
    }

    /// Schema and value of every attribute, in schema order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&AttributeSchema, &Value)> {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.info.attributes().iter().zip(n.values.iter()))
    }

    /// Checks whether `value` could be stored in `id.key`.
    pub fn validate(&self, id: NodeId, key: &str, value: &Value) -> Result<(), DocumentError> {
        let node = self.live(id)?;
        let schema = node
            .info
            .schema(key)
            .ok_or_else(|| ValidationError::UnknownAttribute {
                node_type: node.info.name().to_string(),
                key: key.to_string(),
            })?;
        schema.data_type.check(value)?;
        if let Value::Node(Some(target)) = value
            && !self.contains(*target)
        {
            return Err(ValidationError::MissingTarget(*target).into());
        }
        Ok(())
    }

    /// Stores an attribute value.
    ///
    /// Returns `Ok(false)` without queuing an event if the value equals the
    /// current one. Invalid values are rejected and leave the attribute
    /// untouched.
    pub fn set(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> Result<bool, DocumentError> {
        let value = value.into();
        self.validate(id, key, &value)?;

        let node = self.node_mut(id).ok_or(InvalidOperation::UnknownNode(id))?;
        let Some(index) = node.info.attribute_index(key) else {
            return Ok(false);
        };
        let data_type = &node.info.attributes()[index].data_type;
        if data_type.equals(&node.values[index], &value) {
            return Ok(false);
        }
        node.values[index] = value;
        self.queue(id, ChangeKind::Attribute(key.to_string()));
        Ok(true)
    }

    /// Position of a positioned node.
    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        let node = self.node(id)?;
        if !node.info.is_positioned() {
            return None;
        }
        Some(Vec2::new(self.get_f32(id, "x")?, self.get_f32(id, "y")?))
    }

    // ---------------------------------------------------------------------------
    // Tree structure
    // ---------------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children in order; empty for unknown ids.
    pub fn child_slice(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.child_slice(id).iter().copied()
    }

    pub fn children_of_type<'a>(&'a self, id: NodeId, type_name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |&c| self.is_type(c, type_name))
    }

    fn child_index(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.child_slice(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.child_index(id)?;
        self.child_slice(parent).get(index + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.child_index(id)?;
        index.checked_sub(1).map(|i| self.child_slice(parent)[i])
    }

    /// `id` followed by all its descendants in pre-order.
    pub fn tree(&self, id: NodeId) -> Tree<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Tree { doc: self, stack }
    }

    /// All descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.tree(id).skip(1)
    }

    /// Parent, grandparent and so on up to the top of the tree.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Whether `id` is `root` or lies below it.
    pub fn contains_node(&self, root: NodeId, id: NodeId) -> bool {
        root == id || self.is_ancestor(root, id)
    }

    /// Whether `id` is the document root or reachable from it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.contains_node(self.root, id)
    }

    /// Whether `parent` accepts children of type `child_type`.
    pub fn accepts(&self, parent: NodeId, child_type: &str) -> bool {
        let Some(info) = self.node_type(parent) else {
            return false;
        };
        info.lists_child(child_type) && info.filter().is_none_or(|filter| filter(self, parent, child_type))
    }

    /// Attaches `node` and its subtree under `parent`, before `before` or
    /// at the end.
    ///
    /// A node that already has a parent is detached from it first.
    pub fn insert(&mut self, parent: NodeId, before: Option<NodeId>, node: NodeId) -> Result<(), DocumentError> {
        self.live(parent)?;
        self.live(node)?;
        if node == parent || node == self.root || self.is_ancestor(node, parent) {
            return Err(InvalidOperation::Cycle { parent, node }.into());
        }
        if let Some(before) = before {
            self.live(before)?;
            if self.parent(before) != Some(parent) {
                return Err(InvalidOperation::NotAChild { parent, before }.into());
            }
            if before == node {
                return Ok(());
            }
        }

        self.detach(node);

        let index = match before {
            Some(before) => self
                .child_slice(parent)
                .iter()
                .position(|&c| c == before)
                .ok_or(InvalidOperation::NotAChild { parent, before })?,
            None => self.child_slice(parent).len(),
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.insert(index, node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = Some(parent);
        }
        self.queue(node, ChangeKind::Insert);
        Ok(())
    }

    /// Detaches `node` with its subtree.
    ///
    /// Returns `Ok(false)` if it had no parent. References into the removed
    /// subtree are left as they are.
    pub fn remove(&mut self, node: NodeId) -> Result<bool, DocumentError> {
        self.live(node)?;
        Ok(self.detach(node))
    }

    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.parent(node) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
        self.queue(node, ChangeKind::Remove);
        true
    }

    // ---- raw construction for detached clones ----

    pub(crate) fn set_value_unchecked(&mut self, id: NodeId, index: usize, value: Value) {
        if let Some(node) = self.node_mut(id)
            && let Some(slot) = node.values.get_mut(index)
        {
            *slot = value;
        }
    }

    pub(crate) fn values(&self, id: NodeId) -> &[Value] {
        self.node(id).map_or(&[], |n| n.values.as_slice())
    }

    /// Appends a freshly created node to a detached parent without events.
    pub(crate) fn append_detached(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    // ---------------------------------------------------------------------------
    // Visibility
    // ---------------------------------------------------------------------------

    /// Shows or hides a node in the editor view. Not part of the content and
    /// not undoable. Returns `false` if nothing changed.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.visible == visible {
            return false;
        }
        node.visible = visible;
        self.queue(id, ChangeKind::Visibility);
        true
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.visible)
    }

    /// Visible itself and through all of its ancestors.
    pub fn is_shown(&self, id: NodeId) -> bool {
        self.is_visible(id) && self.ancestors(id).all(|a| self.is_visible(a))
    }

    // ---------------------------------------------------------------------------
    // Change notification
    // ---------------------------------------------------------------------------

    fn queue(&mut self, node: NodeId, kind: ChangeKind) {
        self.pending.push(ChangeEvent { node, kind });
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&ChangeEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != id);
        self.subscribers.len() != before
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Publishes queued events to subscribers in order. Returns how many
    /// events were published.
    pub fn flush_changes(&mut self) -> usize {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for (_, callback) in &mut self.subscribers {
                callback(event);
            }
        }
        events.len()
    }

    // ---------------------------------------------------------------------------
    // Spatial queries
    // ---------------------------------------------------------------------------

    /// Nodes below `root` whose footprint contains the point.
    ///
    /// Topmost children come first within each parent, and a node is
    /// reported before the hits inside it. Hidden subtrees are skipped.
    pub fn nodes_at(&self, root: NodeId, x: f32, y: f32, scale: f32) -> Vec<NodeId> {
        let p = Vec2::new(x, y);
        self.query(root, |doc, id| doc.shape(id, scale).is_some_and(|s| s.contains_point(p)))
    }

    /// Nodes below `root` whose footprint intersects the rectangle.
    pub fn nodes_intersecting_rect(&self, root: NodeId, x: f32, y: f32, w: f32, h: f32, scale: f32) -> Vec<NodeId> {
        let rect = Rect::new(x, y, w, h);
        self.query(root, |doc, id| doc.shape(id, scale).is_some_and(|s| s.intersects(&rect)))
    }

    /// Nodes below `root` whose footprint lies entirely inside the rectangle.
    pub fn nodes_contained_by_rect(&self, root: NodeId, x: f32, y: f32, w: f32, h: f32, scale: f32) -> Vec<NodeId> {
        let rect = Rect::new(x, y, w, h);
        self.query(root, |doc, id| doc.shape(id, scale).is_some_and(|s| s.contained_by(&rect)))
    }

    fn query(&self, root: NodeId, hit: impl Fn(&Document, NodeId) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_slice(root).to_vec();
        // Popping from the end visits the last (topmost) child first.
        while let Some(id) = stack.pop() {
            if !self.is_visible(id) {
                continue;
            }
            if hit(self, id) {
                out.push(id);
            }
            stack.extend(self.child_slice(id).iter().copied());
        }
        out
    }

    /// The four corners of a sprite node in world space.
    pub fn sprite_vertices(&self, id: NodeId) -> Option<[Vec2; 4]> {
        let get = |key| self.get_f32(id, key);
        let (w, h) = (get("width")?, get("height")?);
        let m = sprite_transform(
            self.position(id)?,
            Vec2::new(get("center-x")?, get("center-y")?),
            Vec2::new(get("scale-x")?, get("scale-y")?),
            get("rotation")?,
        );
        Some(
            [
                Vec2::new(0.0, 0.0),
                Vec2::new(w, 0.0),
                Vec2::new(w, h),
                Vec2::new(0.0, h),
            ]
            .map(|p| transform_point(&m, p)),
        )
    }

    /// Corners of a triangle node, taken from its positioned children.
    /// `None` unless there are exactly three.
    pub fn triangle(&self, id: NodeId) -> Option<[Vec2; 3]> {
        let points: Vec<Vec2> = self.children(id).filter_map(|c| self.position(c)).collect();
        <[Vec2; 3]>::try_from(points).ok()
    }

    fn shape(&self, id: NodeId, scale: f32) -> Option<Shape> {
        let info = self.node_type(id)?;
        match info.get_footprint() {
            Footprint::None => None,
            Footprint::Handle { size } => Some(Shape::Square(Rect::around(self.position(id)?, 0.5 * size / scale))),
            Footprint::Circle { radius_key } => Some(Shape::Circle(self.position(id)?, self.get_f32(id, radius_key)?)),
            Footprint::Triangle => self.triangle(id).map(Shape::Triangle),
            Footprint::Segment { target_key, size } => {
                let a = self.position(self.parent(id)?)?;
                let b = self.position(self.get_node(id, target_key)?)?;
                Some(Shape::Segment(a, b, 0.5 * size / scale))
            }
            Footprint::Sprite => self.sprite_vertices(id).map(Shape::Quad),
        }
    }

    // ---------------------------------------------------------------------------
    // References and garbage collection
    // ---------------------------------------------------------------------------

    /// Non-null references held by `id`.
    pub fn references(&self, id: NodeId) -> impl Iterator<Item = (&str, NodeId)> {
        self.attributes(id)
            .filter_map(|(schema, value)| Some((schema.key.as_str(), value.as_node()?)))
    }

    /// Attached nodes outside `targets` that reference a node in `targets`.
    pub fn referrers(&self, targets: &HashSet<NodeId>) -> Vec<Reference> {
        self.tree(self.root)
            .filter(|id| !targets.contains(id))
            .flat_map(|id| {
                self.references(id)
                    .filter(|(_, target)| targets.contains(target))
                    .map(move |(key, target)| Reference {
                        node: id,
                        key: key.to_string(),
                        target,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// References from attached nodes to nodes that are not attached.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        self.tree(self.root)
            .flat_map(|id| {
                self.references(id)
                    .filter(|(_, target)| !self.is_attached(*target))
                    .map(move |(key, target)| DanglingReference {
                        node: id,
                        key: key.to_string(),
                        target,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn top(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Frees every node that cannot be reached from the root or `extra_roots`.
    ///
    /// A reachable node keeps its whole tree alive (from its topmost
    /// ancestor down) together with everything it references. Returns the
    /// number of freed nodes. Ids of freed nodes become stale.
    pub fn collect_garbage(&mut self, extra_roots: impl IntoIterator<Item = NodeId>) -> usize {
        let mut marked: HashSet<NodeId> = HashSet::new();
        let mut work: Vec<NodeId> = std::iter::once(self.root)
            .chain(extra_roots)
            .filter(|&id| self.contains(id))
            .collect();

        while let Some(id) = work.pop() {
            let top = self.top(id);
            if marked.contains(&top) {
                continue;
            }
            for member in self.tree(top) {
                marked.insert(member);
                work.extend(self.references(member).map(|(_, t)| t).filter(|&t| self.contains(t)));
            }
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let id = NodeId {
                index: index as u32,
                generation: slot.generation,
            };
            if slot.node.is_some() && !marked.contains(&id) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        if freed > 0 {
            log::debug!("Collected {freed} unreachable nodes");
        }
        freed
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("path", &self.path)
            .field("nodes", &self.node_count())
            .field("pending", &self.pending.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Pre-order walk returned by [`Document::tree`].
pub struct Tree<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Tree<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.child_slice(id).iter().rev().copied());
        Some(id)
    }
}

/// Walk up the parent chain returned by [`Document::ancestors`].
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

// ---------------------------------------------------------------------------
// Footprint shapes
// ---------------------------------------------------------------------------

enum Shape {
    Square(Rect),
    Circle(Vec2, f32),
    Triangle([Vec2; 3]),
    /// Endpoints and hit tolerance.
    Segment(Vec2, Vec2, f32),
    Quad([Vec2; 4]),
}

impl Shape {
    fn contains_point(&self, p: Vec2) -> bool {
        match self {
            Self::Square(r) => r.contains_point(p),
            Self::Circle(c, r) => (p - c).norm_squared() <= r * r,
            Self::Triangle(t) => triangle_contains_point(t, p),
            Self::Segment(a, b, d) => point_to_segment_distance2(p, *a, *b) <= d * d,
            Self::Quad(q) => {
                triangle_contains_point(&[q[0], q[1], q[2]], p) || triangle_contains_point(&[q[2], q[3], q[0]], p)
            }
        }
    }

    fn intersects(&self, rect: &Rect) -> bool {
        match self {
            Self::Square(r) => rect.intersects_rect(r),
            Self::Circle(c, r) => rect.intersects_circle(*c, *r),
            Self::Triangle(t) => rect.intersects_triangle(t),
            Self::Segment(a, b, _) => rect.intersects_segment(*a, *b),
            Self::Quad(q) => rect.intersects_triangle(&[q[0], q[1], q[2]]) || rect.intersects_triangle(&[q[2], q[3], q[0]]),
        }
    }

    fn contained_by(&self, rect: &Rect) -> bool {
        match self {
            Self::Square(r) => rect.contains_rect(r),
            Self::Circle(c, r) => rect.contains_rect(&Rect::around(*c, *r)),
            Self::Triangle(t) => rect.contains_triangle(t),
            Self::Segment(a, b, _) => rect.contains_point(*a) && rect.contains_point(*b),
            Self::Quad(q) => q.iter().all(|&p| rect.contains_point(p)),
        }
    }
}
