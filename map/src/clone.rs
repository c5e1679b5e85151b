//! Deep copies of subtrees with reference fix-up.
//!
//! Cloning happens in two steps. [`ClonedNodes::clone_subtree`] copies
//! nodes, child order and attribute values into a detached tree, recording
//! which clone belongs to which original. Node references in the copies
//! still name the originals at that point. [`ClonedNodes::resolve_references`]
//! then repoints them: references to nodes that were cloned go to their
//! clones, everything else is handed to an [`ExternalReferences`] strategy.
//!
//! The second step has to wait for the first, since a reference target may
//! be cloned after the node that refers to it.

use std::collections::HashMap;

use crate::attribute::Value;
use crate::document::{Document, NodeId};
use crate::error::{DocumentError, InvalidOperation};

/// Decides what a reference to a node outside the cloned set points to in
/// the target document.
pub trait ExternalReferences {
    /// Returns the node in `target` to reference instead of `original`, or
    /// `None` to have a fresh copy of `original` made in `target`.
    fn resolve(&mut self, source: &Document, original: NodeId, target: &Document) -> Option<NodeId>;
}

/// Keeps external references as they are. Only meaningful when cloning
/// within one document.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepExternal;

impl ExternalReferences for KeepExternal {
    fn resolve(&mut self, _source: &Document, original: NodeId, target: &Document) -> Option<NodeId> {
        target.contains(original).then_some(original)
    }
}

/// Copies every external target.
#[derive(Debug, Default, Clone, Copy)]
pub struct CloneExternal;

impl ExternalReferences for CloneExternal {
    fn resolve(&mut self, _source: &Document, _original: NodeId, _target: &Document) -> Option<NodeId> {
        None
    }
}

type KeyFn = Box<dyn Fn(&Document, NodeId) -> Option<String>>;

/// Matches external targets against candidates in the target document by
/// node type and a case-insensitive key, e.g. a resource file path.
///
/// Unmatched targets are copied.
pub struct MatchByKey {
    key: KeyFn,
    candidates: HashMap<(String, String), NodeId>,
}

impl MatchByKey {
    /// Indexes `candidates` of `target` by type and key. The first
    /// candidate wins when several share a key.
    pub fn new(
        target: &Document,
        candidates: impl IntoIterator<Item = NodeId>,
        key: impl Fn(&Document, NodeId) -> Option<String> + 'static,
    ) -> Self {
        let mut index = HashMap::new();
        for id in candidates {
            if let (Some(type_name), Some(k)) = (target.type_name(id), key(target, id)) {
                index
                    .entry((type_name.to_string(), k.to_lowercase()))
                    .or_insert(id);
            }
        }
        Self {
            key: Box::new(key),
            candidates: index,
        }
    }
}

impl ExternalReferences for MatchByKey {
    fn resolve(&mut self, source: &Document, original: NodeId, _target: &Document) -> Option<NodeId> {
        let type_name = source.type_name(original)?;
        let key = (self.key)(source, original)?.to_lowercase();
        self.candidates.get(&(type_name.to_string(), key)).copied()
    }
}

impl std::fmt::Debug for MatchByKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchByKey")
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

/// Owned copy of one node, independent of the source document borrow.
struct NodeSnapshot {
    original: NodeId,
    type_name: String,
    attributes: Vec<(String, Value)>,
    /// Index of the parent within the same snapshot list.
    parent: Option<usize>,
}

fn snapshot(doc: &Document, root: NodeId, with_children: bool) -> Vec<NodeSnapshot> {
    let ids: Vec<NodeId> = if with_children {
        doc.tree(root).collect()
    } else {
        doc.contains(root).then_some(root).into_iter().collect()
    };
    let position: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    ids.iter()
        .map(|&id| NodeSnapshot {
            original: id,
            type_name: doc.type_name(id).unwrap_or_default().to_string(),
            attributes: doc
                .attributes(id)
                .map(|(schema, value)| (schema.key.clone(), value.clone()))
                .collect(),
            parent: if id == root {
                None
            } else {
                doc.parent(id).and_then(|p| position.get(&p).copied())
            },
        })
        .collect()
}

enum Resolution {
    Node(NodeId),
    /// Copy the external original, then reference the copy.
    Copy(NodeId),
}

/// Bookkeeping for one clone operation, possibly spanning several subtrees.
#[derive(Debug, Default)]
pub struct ClonedNodes {
    original_to_clone: HashMap<NodeId, NodeId>,
    clone_to_original: HashMap<NodeId, NodeId>,
    /// Clones in creation order.
    order: Vec<NodeId>,
    /// Clones made for external references.
    external: Vec<NodeId>,
    /// Clones before this index already had their references resolved.
    resolved: usize,
}

impl ClonedNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clone_of(&self, original: NodeId) -> Option<NodeId> {
        self.original_to_clone.get(&original).copied()
    }

    pub fn original_of(&self, clone: NodeId) -> Option<NodeId> {
        self.clone_to_original.get(&clone).copied()
    }

    /// Every clone made so far, in creation order.
    pub fn clones(&self) -> &[NodeId] {
        &self.order
    }

    /// Copies made by [`resolve_references`](Self::resolve_references) for
    /// external targets the strategy could not match. They are detached.
    pub fn external_clones(&self) -> &[NodeId] {
        &self.external
    }

    /// Deep copies `root` from `source` into `target` as a detached tree.
    pub fn clone_subtree(&mut self, source: &Document, root: NodeId, target: &mut Document) -> Result<NodeId, DocumentError> {
        let nodes = snapshot(source, root, true);
        self.instantiate(root, nodes, target, false)
    }

    /// Deep copies `root` within one document.
    pub fn clone_within(&mut self, doc: &mut Document, root: NodeId) -> Result<NodeId, DocumentError> {
        let nodes = snapshot(doc, root, true);
        self.instantiate(root, nodes, doc, false)
    }

    fn instantiate(
        &mut self,
        root: NodeId,
        nodes: Vec<NodeSnapshot>,
        target: &mut Document,
        external: bool,
    ) -> Result<NodeId, DocumentError> {
        let mut created: Vec<NodeId> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let clone = target.create(&node.type_name)?;
            let info = target
                .node_type(clone)
                .cloned()
                .ok_or(InvalidOperation::UnknownNode(clone))?;
            for (key, value) in node.attributes {
                let Some(index) = info.attribute_index(&key) else {
                    continue;
                };
                // External copies drop their own references; they would
                // point into the source document.
                let value = match value {
                    Value::Node(_) if external => Value::Node(None),
                    v => v,
                };
                if info.attributes()[index].data_type.check(&value).is_ok() {
                    target.set_value_unchecked(clone, index, value);
                }
            }
            if let Some(parent) = node.parent.and_then(|i| created.get(i).copied()) {
                target.append_detached(parent, clone);
            }
            self.original_to_clone.insert(node.original, clone);
            self.clone_to_original.insert(clone, node.original);
            self.order.push(clone);
            if external {
                self.external.push(clone);
            }
            created.push(clone);
        }
        created
            .first()
            .copied()
            .ok_or_else(|| InvalidOperation::UnknownNode(root).into())
    }

    fn plan(
        &self,
        source: &Document,
        target: &Document,
        external: &mut dyn ExternalReferences,
    ) -> Vec<(NodeId, usize, Resolution)> {
        let mut plan = Vec::new();
        for &clone in &self.order[self.resolved..] {
            if self.external.contains(&clone) {
                continue;
            }
            for (index, value) in target.values(clone).iter().enumerate() {
                let Some(original) = value.as_node() else {
                    continue;
                };
                let resolution = match self.clone_of(original) {
                    Some(c) => Resolution::Node(c),
                    None => match external.resolve(source, original, target) {
                        Some(n) => Resolution::Node(n),
                        None => Resolution::Copy(original),
                    },
                };
                plan.push((clone, index, resolution));
            }
        }
        plan
    }

    fn execute(
        &mut self,
        plan: Vec<(NodeId, usize, Resolution)>,
        mut source: impl FnMut(NodeId) -> Vec<NodeSnapshot>,
        target: &mut Document,
    ) -> Result<(), DocumentError> {
        for (clone, index, resolution) in plan {
            let node = match resolution {
                Resolution::Node(n) => n,
                Resolution::Copy(original) => match self.clone_of(original) {
                    Some(c) => c,
                    None => self.instantiate(original, source(original), target, true)?,
                },
            };
            target.set_value_unchecked(clone, index, Value::Node(Some(node)));
        }
        self.resolved = self.order.len();
        Ok(())
    }

    /// Repoints node references of the clones made from `source` into
    /// `target` since the last call.
    pub fn resolve_references(
        &mut self,
        source: &Document,
        target: &mut Document,
        external: &mut dyn ExternalReferences,
    ) -> Result<(), DocumentError> {
        let plan = self.plan(source, target, external);
        self.execute(plan, |original| snapshot(source, original, false), target)
    }

    /// [`resolve_references`](Self::resolve_references) for clones made with
    /// [`clone_within`](Self::clone_within).
    pub fn resolve_within(&mut self, doc: &mut Document, external: &mut dyn ExternalReferences) -> Result<(), DocumentError> {
        let plan = self.plan(&*doc, &*doc, external);
        let mut copies: HashMap<NodeId, Vec<NodeSnapshot>> = plan
            .iter()
            .filter_map(|(_, _, r)| match r {
                Resolution::Copy(original) => Some((*original, snapshot(doc, *original, false))),
                Resolution::Node(_) => None,
            })
            .collect();
        let source = move |original: NodeId| copies.remove(&original).unwrap_or_default();
        self.execute(plan, source, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DataType;
    use crate::registry::{NodeTypeInfo, NodeTypeRegistry};
    use std::sync::Arc;

    fn registry() -> Arc<NodeTypeRegistry> {
        let mut r = NodeTypeRegistry::new();
        r.register(NodeTypeInfo::new("root").accepts("item").accepts("res"))
            .register(
                NodeTypeInfo::new("item")
                    .attribute("text", DataType::String)
                    .attribute("peer", DataType::Node)
                    .attribute("res", DataType::Node)
                    .accepts("item"),
            )
            .register(NodeTypeInfo::new("res").attribute("src", DataType::String));
        Arc::new(r)
    }

    fn item(doc: &mut Document, parent: NodeId, text: &str) -> NodeId {
        let n = doc.create("item").unwrap();
        doc.set(n, "text", text).unwrap();
        doc.insert(parent, None, n).unwrap();
        n
    }

    fn res(doc: &mut Document, src: &str) -> NodeId {
        let n = doc.create("res").unwrap();
        doc.set(n, "src", src).unwrap();
        let root = doc.root();
        doc.insert(root, None, n).unwrap();
        n
    }

    #[test]
    fn deep_copy_preserves_order_and_values() {
        let mut source = Document::new(registry(), "root").unwrap();
        let root = source.root();
        let a = item(&mut source, root, "a");
        let b = item(&mut source, a, "b");
        let c = item(&mut source, a, "c");

        let mut target = Document::new(registry(), "root").unwrap();
        let mut cloned = ClonedNodes::new();
        let copy = cloned.clone_subtree(&source, a, &mut target).unwrap();

        assert!(!target.is_attached(copy));
        let kids: Vec<_> = target.children(copy).map(|k| target.get_str(k, "text").unwrap().to_string()).collect();
        assert_eq!(kids, ["b", "c"]);
        assert_eq!(cloned.original_of(copy), Some(a));
        assert_eq!(cloned.clone_of(b).map(|n| target.parent(n)), Some(Some(copy)));
        assert!(cloned.clone_of(c).is_some());
    }

    #[test]
    fn internal_references_follow_clones() {
        let mut doc = Document::new(registry(), "root").unwrap();
        let root = doc.root();
        let a = item(&mut doc, root, "a");
        let b = item(&mut doc, a, "b");
        let c = item(&mut doc, a, "c");
        // b refers forward to c, which is cloned after it.
        doc.set(b, "peer", c).unwrap();

        let mut cloned = ClonedNodes::new();
        cloned.clone_within(&mut doc, a).unwrap();
        cloned.resolve_within(&mut doc, &mut KeepExternal).unwrap();

        let b2 = cloned.clone_of(b).unwrap();
        assert_eq!(doc.get_node(b2, "peer"), cloned.clone_of(c));
    }

    #[test]
    fn keep_external_within_a_document() {
        let mut doc = Document::new(registry(), "root").unwrap();
        let root = doc.root();
        let r = res(&mut doc, "a.png");
        let a = item(&mut doc, root, "a");
        doc.set(a, "res", r).unwrap();

        let mut cloned = ClonedNodes::new();
        let a2 = cloned.clone_within(&mut doc, a).unwrap();
        cloned.resolve_within(&mut doc, &mut KeepExternal).unwrap();
        assert_eq!(doc.get_node(a2, "res"), Some(r));
        assert!(cloned.external_clones().is_empty());
    }

    #[test]
    fn clone_external_copies_once() {
        let mut source = Document::new(registry(), "root").unwrap();
        let root = source.root();
        let r = res(&mut source, "a.png");
        let a = item(&mut source, root, "a");
        let b = item(&mut source, root, "b");
        source.set(a, "res", r).unwrap();
        source.set(b, "res", r).unwrap();

        let mut target = Document::new(registry(), "root").unwrap();
        let mut cloned = ClonedNodes::new();
        let a2 = cloned.clone_subtree(&source, a, &mut target).unwrap();
        let b2 = cloned.clone_subtree(&source, b, &mut target).unwrap();
        cloned.resolve_references(&source, &mut target, &mut CloneExternal).unwrap();

        assert_eq!(cloned.external_clones().len(), 1);
        let r2 = cloned.external_clones()[0];
        assert_eq!(target.get_node(a2, "res"), Some(r2));
        assert_eq!(target.get_node(b2, "res"), Some(r2));
        assert_eq!(target.get_str(r2, "src"), Some("a.png"));
    }

    #[test]
    fn match_by_key_is_case_insensitive() {
        let mut source = Document::new(registry(), "root").unwrap();
        let root = source.root();
        let r = res(&mut source, "Textures/Rock.PNG");
        let a = item(&mut source, root, "a");
        source.set(a, "res", r).unwrap();

        let mut target = Document::new(registry(), "root").unwrap();
        let existing = res(&mut target, "textures/rock.png");
        let candidates: Vec<_> = target.children_of_type(target.root(), "res").collect();
        let mut strategy = MatchByKey::new(&target, candidates, |doc, id| doc.get_str(id, "src").map(str::to_string));

        let mut cloned = ClonedNodes::new();
        let a2 = cloned.clone_subtree(&source, a, &mut target).unwrap();
        cloned.resolve_references(&source, &mut target, &mut strategy).unwrap();
        assert_eq!(target.get_node(a2, "res"), Some(existing));
        assert!(cloned.external_clones().is_empty());
    }
}
