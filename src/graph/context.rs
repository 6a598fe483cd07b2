//! Graph arena for structured compute IR
//!
//! `Graph` owns every node and value. Matchers only borrow it for the
//! duration of a match attempt.

use smallvec::SmallVec;

use crate::error::{TransformError, TransformResult};

use super::maps::{NameMap, NodeData, OpOperand, RegionMap, UseMap, ValueData, ValueDef};
use super::types::{NodeId, OpKind, ValueId};

/// Graph of nodes and values with O(1) handle lookups
#[derive(Debug, Default)]
pub struct Graph {
    /// Node arena
    pub(crate) nodes: Vec<NodeData>,

    /// Value arena
    pub(crate) values: Vec<ValueData>,

    /// Maps value → uses (consumer edges)
    pub(crate) use_map: UseMap,

    /// Maps container → nested nodes
    pub(crate) region_map: RegionMap,

    /// Maps node name → node (preserves insertion order)
    pub(crate) name_map: NameMap,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node record
    ///
    /// Panics on a handle minted by another graph.
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Get a node record, checking the handle
    pub fn try_node(&self, id: NodeId) -> TransformResult<&NodeData> {
        self.nodes
            .get(id.index())
            .ok_or(TransformError::UnknownNode(id.0))
    }

    /// Get a node by name
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_map.get(name).copied()
    }

    /// Op kind of a node
    pub fn kind(&self, id: NodeId) -> OpKind {
        self.node(id).kind
    }

    /// Name of a node
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// Operands of a node
    pub fn operands(&self, id: NodeId) -> &[ValueId] {
        &self.node(id).operands
    }

    /// Results of a node
    pub fn results(&self, id: NodeId) -> &[ValueId] {
        &self.node(id).results
    }

    /// Region entry arguments of a container
    pub fn region_args(&self, id: NodeId) -> &[ValueId] {
        &self.node(id).region_args
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Whether the node exposes the tilable capability
    pub fn is_tilable(&self, id: NodeId) -> bool {
        self.kind(id).is_tilable()
    }

    // ========================================================================
    // Value accessors
    // ========================================================================

    /// Get a value record
    ///
    /// Panics on a handle minted by another graph.
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    /// Get a value record, checking the handle
    pub fn try_value(&self, id: ValueId) -> TransformResult<&ValueData> {
        self.values
            .get(id.index())
            .ok_or(TransformError::UnknownValue(id.0))
    }

    /// Producer of a value
    pub fn value_def(&self, id: ValueId) -> ValueDef {
        self.value(id).def
    }

    /// Defining node, absent for block arguments
    pub fn defining_node(&self, id: ValueId) -> Option<NodeId> {
        match self.value_def(id) {
            ValueDef::OpResult { node, .. } => Some(node),
            ValueDef::BlockArgument { .. } => None,
        }
    }

    /// Uses of a value in insertion order
    pub fn uses(&self, id: ValueId) -> &[OpOperand] {
        self.use_map.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Consumers of a value in use order (a node using it twice appears twice)
    pub fn users(&self, id: ValueId) -> impl Iterator<Item = NodeId> + '_ {
        self.uses(id).iter().map(|u| u.owner)
    }

    /// Check if a value has exactly one use
    pub fn is_single_use(&self, id: ValueId) -> bool {
        self.uses(id).len() == 1
    }

    // ========================================================================
    // Region structure
    // ========================================================================

    /// Enclosing container of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Closest enclosing container of the given kind
    pub fn parent_of_kind(&self, id: NodeId, kind: OpKind) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if self.kind(parent) == kind {
                return Some(parent);
            }
            current = self.parent(parent);
        }
        None
    }

    /// Nodes directly nested in a container
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.region_map
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Pre-order walk of `scope` and everything nested in it
    pub fn walk(&self, scope: NodeId) -> Walk<'_> {
        let mut stack = SmallVec::new();
        stack.push(scope);
        Walk { graph: self, stack }
    }
}

/// Pre-order iterator over a container and its nested nodes
pub struct Walk<'a> {
    graph: &'a Graph,
    stack: SmallVec<[NodeId; 16]>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Reverse so children come out in program order
        self.stack
            .extend(self.graph.children(id).iter().rev().copied());
        Some(id)
    }
}
