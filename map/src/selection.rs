//! Observable selection.

use std::collections::HashSet;
use std::fmt;

use crate::document::NodeId;

/// Insertion-ordered set of node ids.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    order: Vec<NodeId>,
    members: HashSet<NodeId>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Returns `false` if already present.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        if self.members.remove(&id) {
            self.order.retain(|&n| n != id);
            true
        } else {
            false
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        let members = &mut self.members;
        self.order.retain(|&id| {
            let kept = keep(id);
            if !kept {
                members.remove(&id);
            }
            kept
        });
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Same members regardless of order.
    pub fn same_members(&self, other: &NodeSet) -> bool {
        self.members == other.members
    }
}

impl PartialEq for NodeSet {
    fn eq(&self, other: &Self) -> bool {
        self.same_members(other)
    }
}

impl Eq for NodeSet {}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<NodeId> for NodeSet {
    fn extend<I: IntoIterator<Item = NodeId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

/// Handle returned by [`Selection::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionSubscription(u64);

type Listener = Box<dyn FnMut(&NodeSet) + Send>;

/// The set of selected nodes.
///
/// Every method that changes membership notifies subscribers once with the
/// new contents and returns `true`; calls that change nothing return
/// `false` and stay silent.
#[derive(Default)]
pub struct Selection {
    nodes: NodeSet,
    listeners: Vec<(SelectionSubscription, Listener)>,
    next_subscription: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> NodeSet {
        self.nodes.clone()
    }

    pub fn add(&mut self, ids: impl IntoIterator<Item = NodeId>) -> bool {
        let mut changed = false;
        for id in ids {
            changed |= self.nodes.insert(id);
        }
        self.changed(changed)
    }

    pub fn delete(&mut self, ids: impl IntoIterator<Item = NodeId>) -> bool {
        let gone: HashSet<NodeId> = ids.into_iter().collect();
        let before = self.nodes.len();
        self.nodes.retain(|id| !gone.contains(&id));
        let changed = self.nodes.len() != before;
        self.changed(changed)
    }

    /// Replaces the contents. Order differences alone are not a change.
    pub fn replace(&mut self, nodes: NodeSet) -> bool {
        if self.nodes.same_members(&nodes) {
            return false;
        }
        self.nodes = nodes;
        self.changed(true)
    }

    pub fn clear(&mut self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.nodes.clear();
        self.changed(true)
    }

    /// Keeps only the nodes for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(NodeId) -> bool) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(keep);
        let changed = self.nodes.len() != before;
        self.changed(changed)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&NodeSet) + Send + 'static) -> SelectionSubscription {
        let id = SelectionSubscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SelectionSubscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != id);
        self.listeners.len() != before
    }

    fn changed(&mut self, changed: bool) -> bool {
        if changed {
            for (_, listener) in &mut self.listeners {
                listener(&self.nodes);
            }
        }
        changed
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("nodes", &self.nodes)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
