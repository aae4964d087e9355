//! AST arena allocator for efficient node management.
//!
//! This module provides the core AST arena that manages memory allocation
//! for all AST nodes using a bump allocator with generation-based safety.
//!
//! Only the arena link (parent -> child) is an owning edge; every other
//! cross-node reference (back-pointers, record base/override chains, import
//! targets) is a bare [`NodeID`] copy with no ownership implications, tying
//! generation-checked indices to the places the original design called for
//! `Rc`/`Weak`.

use std::any::type_name;

use bumpalo::Bump;
use oberonc_source::types::Span;

use crate::nodes::{ASTNode, AnyNode, NodeID, NodeKind};
use crate::visitor::{Visitor, VisitorError, VisitorResult};

/// Metadata for a single slot in the node arena.
///
/// Tracks the generation counter and occupancy status for each slot.
/// The generation counter is incremented each time a slot is reused,
/// preventing use-after-free bugs when old `NodeID`s reference removed nodes.
#[derive(Debug, Clone, Copy)]
struct SlotMetadata {
    generation: u32,
    occupied: bool,
}

impl SlotMetadata {
    const fn new(occupied: bool) -> Self { Self { generation: 1, occupied } }

    const fn increment_generation(&mut self) { self.generation = self.generation.wrapping_add(1); }
}

/// An arena for allocating AST nodes.
///
/// Manages memory allocation for all AST nodes using a bump allocator plus a
/// slot vector with generation-based safety to prevent use-after-free bugs.
#[derive(Debug)]
pub struct AST {
    /// The bump allocator backing string interning (`alloc_str`).
    allocator: Bump,
    /// Storage for nodes, indexed by `NodeID::index`.
    nodes: Vec<Option<AnyNode>>,
    /// Metadata for each slot (generation counter and occupancy status).
    metadata: Vec<SlotMetadata>,
    /// Free list for O(1) slot reuse (indices of freed slots).
    free_list: Vec<u32>,
    /// The module node at the root of this arena, if set.
    root: Option<NodeID>,
}

impl AST {
    /// Creates a new empty AST arena.
    #[must_use]
    pub fn new() -> Self {
        Self { allocator: Bump::new(), nodes: Vec::new(), metadata: Vec::new(), free_list: Vec::new(), root: None }
    }

    /// Creates a new AST arena with the given initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            allocator: Bump::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            metadata: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            root: None,
        }
    }

    /// Sets the root (module) node of this arena.
    pub const fn set_root(&mut self, root: NodeID) { self.root = Some(root); }

    /// Returns the root (module) node of this arena, if set.
    #[must_use]
    pub const fn root(&self) -> Option<NodeID> { self.root }

    /// Allocates a new node in the arena with O(1) slot allocation.
    ///
    /// Uses a free list to achieve constant-time allocation by reusing freed
    /// slots. Generation counters prevent use-after-free bugs.
    pub fn alloc_node(&mut self, node: AnyNode) -> NodeID {
        let (index, generation) = if let Some(free_index) = self.free_list.pop() {
            let metadata = &self.metadata[free_index as usize];
            (free_index, metadata.generation)
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(None);
            self.metadata.push(SlotMetadata::new(true));
            (index, 1)
        };

        self.nodes[index as usize] = Some(node);
        self.metadata[index as usize].occupied = true;

        NodeID::new(index, generation)
    }

    /// Gets a reference to a node by its ID with generation validation.
    ///
    /// Returns `None` if the node doesn't exist or the generation doesn't
    /// match, preventing access to stale nodes that have been removed and
    /// reused.
    #[must_use]
    pub fn get_node(&self, id: NodeID) -> Option<&AnyNode> {
        let index = id.index() as usize;
        if index >= self.nodes.len() || self.metadata[index].generation != id.generation() {
            return None;
        }
        self.nodes[index].as_ref()
    }

    /// Gets a mutable reference to a node by its ID with generation validation.
    pub fn get_node_mut(&mut self, id: NodeID) -> Option<&mut AnyNode> {
        let index = id.index() as usize;
        if index >= self.nodes.len() || self.metadata[index].generation != id.generation() {
            return None;
        }
        self.nodes[index].as_mut()
    }

    /// Checks if a node exists in the arena (bounds + generation + occupancy).
    #[must_use]
    pub fn node_exists(&self, id: NodeID) -> bool { self.get_node(id).is_some() }

    /// Sets the parent of a node, returning `false` if the node doesn't exist.
    pub fn set_parent(&mut self, child: NodeID, parent: NodeID) -> bool {
        let Some(node) = self.get_node_mut(child) else { return false };
        let taken = std::mem::replace(node, placeholder_base_type());
        *node = taken.with_parent(parent);
        true
    }

    /// Gets the parent of a node, if any.
    #[must_use]
    pub fn get_parent(&self, id: NodeID) -> Option<NodeID> { self.get_node(id)?.parent() }

    /// Allocates (interns) a string in the arena's bump allocator.
    pub fn alloc_str(&self, s: &str) -> &str { self.allocator.alloc_str(s) }

    /// Returns the number of live nodes currently stored in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize { self.nodes.iter().filter(|n| n.is_some()).count() }

    /// Removes a node from the arena with proper generation handling.
    ///
    /// Increments the generation counter and adds the slot to the free list,
    /// preventing old `NodeID`s from accessing the reused slot.
    pub fn remove(&mut self, id: NodeID) -> bool {
        let index = id.index() as usize;
        if index >= self.nodes.len() || self.metadata[index].generation != id.generation() || self.nodes[index].is_none() {
            return false;
        }

        self.nodes[index] = None;
        self.metadata[index].increment_generation();
        self.metadata[index].occupied = false;
        self.free_list.push(id.index());

        true
    }

    /// Helper method for the visitor pattern: dispatches to `Visitor<T>::visit`.
    pub fn visit_as<T>(&mut self, node_id: NodeID) -> Option<T>
    where Self: Visitor<T> {
        <Self as Visitor<T>>::visit(self, node_id)
    }

    /// Performs a pre-order traversal of the AST starting from `node_id`.
    ///
    /// Returns `true` if the traversal completed, `false` if `visit_fn`
    /// returned `false` somewhere and aborted it early.
    pub fn traverse_pre_order<F>(&self, node_id: NodeID, visit_fn: &mut F) -> bool
    where F: FnMut(NodeID) -> bool {
        if !visit_fn(node_id) {
            return false;
        }

        let Some(node) = self.get_node(node_id) else { return false };
        for child_id in node.children() {
            if !self.traverse_pre_order(child_id, visit_fn) {
                return false;
            }
        }

        true
    }

    /// Performs a post-order traversal of the AST starting from `node_id`.
    pub fn traverse_post_order<F>(&self, node_id: NodeID, visit_fn: &mut F) -> bool
    where F: FnMut(NodeID) -> bool {
        let Some(node) = self.get_node(node_id) else { return false };
        for child_id in node.children() {
            if !self.traverse_post_order(child_id, visit_fn) {
                return false;
            }
        }

        visit_fn(node_id)
    }

    /// Finds all nodes of a specific kind reachable from `start_node`.
    #[must_use]
    pub fn find_nodes_of_kind(&self, start_node: NodeID, node_kind: NodeKind) -> Vec<NodeID> {
        let mut result = Vec::new();
        let _ = self.traverse_pre_order(start_node, &mut |node_id| {
            if let Some(node) = self.get_node(node_id)
                && node.kind() == node_kind
            {
                result.push(node_id);
            }
            true
        });
        result
    }

    /// Collects every node reachable from `start_node` in pre-order.
    #[must_use]
    pub fn collect_nodes_pre_order(&self, start_node: NodeID) -> Vec<NodeID> {
        let mut result = Vec::new();
        let _ = self.traverse_pre_order(start_node, &mut |node_id| {
            result.push(node_id);
            true
        });
        result
    }

    /// Collects every node reachable from `start_node` in post-order.
    #[must_use]
    pub fn collect_nodes_post_order(&self, start_node: NodeID) -> Vec<NodeID> {
        let mut result = Vec::new();
        let _ = self.traverse_post_order(start_node, &mut |node_id| {
            result.push(node_id);
            true
        });
        result
    }

    /// Maps `f` over every node reachable from `start_node` in pre-order.
    pub fn map_pre_order<F, T>(&self, start_node: NodeID, mut f: F) -> Vec<T>
    where F: FnMut(NodeID) -> T {
        let mut results = Vec::new();
        let _ = self.traverse_pre_order(start_node, &mut |node_id| {
            results.push(f(node_id));
            true
        });
        results
    }

    /// Maps `f` over every node reachable from `start_node` in post-order.
    pub fn map_post_order<F, T>(&self, start_node: NodeID, mut f: F) -> Vec<T>
    where F: FnMut(NodeID) -> T {
        let mut results = Vec::new();
        let _ = self.traverse_post_order(start_node, &mut |node_id| {
            results.push(f(node_id));
            true
        });
        results
    }

    /// Filters nodes reachable from `start_node` that satisfy `pred`.
    pub fn filter_nodes<F>(&self, start_node: NodeID, mut pred: F) -> Vec<NodeID>
    where F: FnMut(NodeID) -> bool {
        let mut results = Vec::new();
        let _ = self.traverse_pre_order(start_node, &mut |node_id| {
            if pred(node_id) {
                results.push(node_id);
            }
            true
        });
        results
    }

    /// Finds the first node reachable from `start_node` that satisfies `pred`.
    pub fn find_node<F>(&self, start_node: NodeID, mut pred: F) -> Option<NodeID>
    where F: FnMut(NodeID) -> bool {
        let mut result = None;
        let _ = self.traverse_pre_order(start_node, &mut |node_id| {
            if pred(node_id) {
                result = Some(node_id);
                false
            } else {
                true
            }
        });
        result
    }

    /// Visits `node_id` and all its descendants in pre-order, stopping early
    /// if `visitor` returns `false`.
    pub fn visit_with<F>(&self, node_id: NodeID, mut visitor: F) -> bool
    where F: FnMut(&AnyNode) -> bool {
        let Some(node) = self.get_node(node_id) else { return false };
        if !visitor(node) {
            return false;
        }
        for child_id in node.children() {
            if !self.visit_with(child_id, &mut visitor) {
                return false;
            }
        }
        true
    }

    /// Gets a specific node type from the AST by id via the [`Visitor<T>`] impl.
    ///
    /// ## Errors
    ///
    /// Returns [`VisitorError::NodeNotFound`] if `node_id` is absent, or
    /// [`VisitorError::TypeMismatch`] if it exists but is of a different kind.
    pub fn get_node_as<T>(&mut self, node_id: NodeID) -> VisitorResult<T>
    where
        Self: Visitor<T>,
        T: 'static,
    {
        let node = self.get_node(node_id).ok_or(VisitorError::NodeNotFound(node_id))?;
        let expected = type_name::<T>().to_string();
        let actual = format!("{:?}", node.kind());

        <Self as Visitor<T>>::visit(self, node_id).ok_or(VisitorError::TypeMismatch { node_id, expected, actual })
    }

    /// Gets a strongly-typed reference to a node's inner data by id.
    ///
    /// ## Errors
    ///
    /// Same as [`AST::get_node_as`].
    pub fn get_as<T: 'static>(&self, node_id: NodeID) -> VisitorResult<&T> {
        let node = self.get_node(node_id).ok_or(VisitorError::NodeNotFound(node_id))?;
        node.get_as::<T>().map_err(|_| VisitorError::TypeMismatch {
            node_id,
            expected: type_name::<T>().to_string(),
            actual: format!("{:?}", node.kind()),
        })
    }
}

/// A throwaway value used only as the "old" side of a `mem::replace` inside
/// [`AST::set_parent`]; never observable outside that function.
fn placeholder_base_type() -> AnyNode {
    AnyNode::BaseType(crate::nodes::BaseType::new(
        crate::nodes::BaseTypeKind::Integer,
        NodeID::placeholder(),
        Span::default(),
    ))
}

impl Clone for AST {
    fn clone(&self) -> Self {
        Self { allocator: Bump::new(), nodes: self.nodes.clone(), metadata: self.metadata.clone(), free_list: self.free_list.clone(), root: self.root }
    }
}

impl Default for AST {
    fn default() -> Self { Self::new() }
}

impl Drop for AST {
    fn drop(&mut self) {
        for node in &mut self.nodes {
            *node = None;
        }
    }
}
