//! Outline tree of scenes and folders derived from the flat document.
//!
//! Nodes live in an arena and are addressed by [`NodeId`] handles. A handle
//! carries the slot generation, so handles to removed nodes stay invalid even
//! after their slot is reused.

mod builder;
mod node;

pub use builder::{rebuild, sync_incremental, SceneNumbering};
pub use node::{Counter, ElementKind, OutlineNode};

/// Handle to a node in an [`OutlineTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Entry {
    node: OutlineNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Hierarchical outline with the scenario element at its root.
#[derive(Debug, Clone)]
pub struct OutlineTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for OutlineTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineTree {
    pub fn new() -> Self {
        let root_entry = Entry {
            node: OutlineNode::new(ElementKind::Scenario),
            parent: None,
            children: Vec::new(),
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                entry: Some(root_entry),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_children(self.root)
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&OutlineNode> {
        self.entry(id).map(|entry| &entry.node)
    }

    /// Mutable access for plain property setters. Duration and counter go
    /// through [`OutlineTree::set_duration`] and [`OutlineTree::set_counter`].
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut OutlineNode> {
        self.entry_mut(id).map(|entry| &mut entry.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|entry| entry.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map_or(&[], |entry| entry.children.as_slice())
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    pub fn child_at(&self, parent: NodeId, row: usize) -> Option<NodeId> {
        self.children(parent).get(row).copied()
    }

    /// Index of `child` among its parent's children.
    pub fn row_of(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|id| *id == child)
    }

    /// `true` when `ancestor` is a strict ancestor of `id`.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Insert `node` as child `row` of `parent` (clamped to the child count).
    ///
    /// # Returns
    /// The new node's handle, or `None` when `parent` is not a live node.
    pub fn insert(&mut self, parent: NodeId, row: usize, node: OutlineNode) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let duration = node.duration;
        let counter = node.counter;
        let entry = Entry {
            node,
            parent: Some(parent),
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation = slot.generation.wrapping_add(1);
                slot.entry = Some(entry);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        if let Some(parent_entry) = self.entry_mut(parent) {
            let row = row.min(parent_entry.children.len());
            parent_entry.children.insert(row, id);
        }
        self.propagate(Some(parent), duration, Counter::default(), counter);
        Some(id)
    }

    pub fn append(&mut self, parent: NodeId, node: OutlineNode) -> Option<NodeId> {
        let row = self.child_count(parent);
        self.insert(parent, row, node)
    }

    pub fn prepend(&mut self, parent: NodeId, node: OutlineNode) -> Option<NodeId> {
        self.insert(parent, 0, node)
    }

    /// Remove `id` and its whole subtree. The root cannot be removed.
    ///
    /// # Returns
    /// The removed node, or `None` when `id` is the root or not live.
    pub fn remove(&mut self, id: NodeId) -> Option<OutlineNode> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        let parent = self.parent(id);
        let (duration, counter) = {
            let node = self.get(id)?;
            (node.duration, node.counter)
        };
        self.propagate(parent, -duration, counter, Counter::default());
        if let Some(parent_entry) = parent.and_then(|parent| self.entry_mut(parent)) {
            parent_entry.children.retain(|child| *child != id);
        }
        self.release(id)
    }

    fn release(&mut self, id: NodeId) -> Option<OutlineNode> {
        let entry = self.slots.get_mut(id.index)?.entry.take()?;
        self.free.push(id.index);
        for child in entry.children {
            self.release(child);
        }
        Some(entry.node)
    }

    /// Drop every node below the root and zero the root's totals.
    pub fn clear(&mut self) {
        let children = self.children(self.root).to_vec();
        for child in children {
            self.remove(child);
        }
        let root = self.root;
        if let Some(entry) = self.entry_mut(root) {
            entry.node.duration = 0.0;
            entry.node.counter = Counter::default();
        }
    }

    fn propagate(&mut self, from: Option<NodeId>, duration_delta: f64, old: Counter, new: Counter) {
        let mut current = from;
        while let Some(id) = current {
            let Some(entry) = self.entry_mut(id) else {
                break;
            };
            entry.node.duration = (entry.node.duration + duration_delta).max(0.0);
            entry.node.counter = entry.node.counter.replaced(old, new);
            current = entry.parent;
        }
    }

    /// Set a node's duration, adjusting every ancestor by the difference.
    pub fn set_duration(&mut self, id: NodeId, duration: f64) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.duration == duration {
            return false;
        }
        let delta = duration - node.duration;
        node.duration = duration;
        let parent = self.parent(id);
        self.propagate(parent, delta, Counter::default(), Counter::default());
        true
    }

    /// Set a node's counter, adjusting every ancestor by the difference.
    pub fn set_counter(&mut self, id: NodeId, counter: Counter) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.counter == counter {
            return false;
        }
        let old = node.counter;
        node.counter = counter;
        let parent = self.parent(id);
        self.propagate(parent, 0.0, old, counter);
        true
    }

    /// Account for `delta` characters changed at `position`: later nodes
    /// move, nodes containing the position grow or shrink.
    pub fn shift(&mut self, position: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for slot in &mut self.slots {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            let node = &mut entry.node;
            if node.position() > position {
                let moved = node.position().saturating_add_signed(delta);
                node.set_position(moved);
            } else if position <= node.end_position() {
                let resized = node.length().saturating_add_signed(delta);
                node.set_length(resized);
            }
        }
    }

    /// Deepest node whose span contains `position`.
    pub fn innermost_at(&self, position: usize) -> NodeId {
        let mut current = self.root;
        'descend: loop {
            for child in self.children(current) {
                if let Some(node) = self.get(*child) {
                    if node.position() <= position && position <= node.end_position() {
                        current = *child;
                        continue 'descend;
                    }
                }
            }
            return current;
        }
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.get(*id).is_some_and(|node| node.uuid() == uuid))
    }

    /// Pre-order list of the nodes below `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}
