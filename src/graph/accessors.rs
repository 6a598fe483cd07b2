//! Structured-op view and pass-through accessors
//!
//! High-level queries used by the matchers.

use smallvec::SmallVec;

use super::affine::{IndexingMap, MapExpr};
use super::context::Graph;
use super::maps::{NodeData, StructuredInfo};
use super::types::{CombinerKind, ElementType, Extent, IteratorType, NodeId, OpKind, ValueId};

/// Borrowed view of a node exposing the structured-compute capability
#[derive(Debug, Clone, Copy)]
pub struct StructuredOp<'g> {
    graph: &'g Graph,
    id: NodeId,
    node: &'g NodeData,
    info: &'g StructuredInfo,
}

impl<'g> StructuredOp<'g> {
    /// Underlying node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Graph the node lives in
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Concrete op kind
    pub fn kind(&self) -> OpKind {
        self.node.kind
    }

    /// Node name
    pub fn name(&self) -> &'g str {
        &self.node.name
    }

    /// Number of loops in the iteration space
    pub fn num_loops(&self) -> usize {
        self.info.iterator_types.len()
    }

    /// Iterator kind per loop
    pub fn iterator_types(&self) -> &'g [IteratorType] {
        &self.info.iterator_types
    }

    /// Static extent of every loop
    ///
    /// A loop takes the size of the first operand dimension its index maps
    /// to; loops not mapped to any operand dimension are dynamic.
    pub fn static_loop_ranges(&self) -> SmallVec<[Extent; 4]> {
        let mut ranges: SmallVec<[Option<Extent>; 4]> =
            SmallVec::from_elem(None, self.num_loops());
        for (value, map) in self.node.operands.iter().zip(&self.info.indexing_maps) {
            let shape = &self.graph.value(*value).shape;
            for (position, expr) in map.results().iter().enumerate() {
                if let MapExpr::Dim(d) = *expr {
                    if d < ranges.len() && ranges[d].is_none() {
                        ranges[d] = shape.get(position).copied();
                    }
                }
            }
        }
        ranges
            .into_iter()
            .map(|r| r.unwrap_or(Extent::Dynamic))
            .collect()
    }

    /// Number of input operands
    pub fn num_inputs(&self) -> usize {
        self.node.inputs().len()
    }

    /// Number of init (output) operands
    pub fn num_inits(&self) -> usize {
        self.node.num_inits
    }

    /// Input operands
    pub fn inputs(&self) -> &'g [ValueId] {
        self.node.inputs()
    }

    /// Init operands
    pub fn inits(&self) -> &'g [ValueId] {
        self.node.inits()
    }

    /// Results
    pub fn results(&self) -> &'g [ValueId] {
        &self.node.results
    }

    /// Indexing map of input `position`
    pub fn input_map(&self, position: usize) -> &'g IndexingMap {
        &self.info.indexing_maps[position]
    }

    /// Indexing map of init `position`
    pub fn init_map(&self, position: usize) -> &'g IndexingMap {
        &self.info.indexing_maps[self.num_inputs() + position]
    }

    /// Element type of init `position`
    pub fn init_element_type(&self, position: usize) -> ElementType {
        self.graph.value(self.inits()[position]).element_type
    }

    /// Combining ops reducing into init `position`
    pub fn combiners(&self, position: usize) -> &'g [CombinerKind] {
        self.info
            .combiners
            .get(position)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }
}

impl Graph {
    /// Structured view of a node, `None` when it lacks the capability
    pub fn structured(&self, id: NodeId) -> Option<StructuredOp<'_>> {
        let node = self.nodes.get(id.index())?;
        if !node.kind.is_structured() {
            return None;
        }
        let info = node.structured.as_ref()?;
        Some(StructuredOp {
            graph: self,
            id,
            node,
            info,
        })
    }

    /// Operand of a parallel loop tied to its region argument `index`
    pub fn tied_operand(&self, loop_op: NodeId, index: usize) -> Option<ValueId> {
        let node = self.node(loop_op);
        if node.kind != OpKind::ForeachThread {
            return None;
        }
        node.operands.get(index).copied()
    }

    /// Region argument of a parallel loop tied to its operand `operand_number`
    pub fn tied_region_arg(&self, loop_op: NodeId, operand_number: usize) -> Option<ValueId> {
        let node = self.node(loop_op);
        if node.kind != OpKind::ForeachThread {
            return None;
        }
        node.region_args.get(operand_number).copied()
    }

    /// Tilable nodes in `scope`, the scope itself included
    pub fn tilable_ops(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.walk(scope).filter(move |id| self.is_tilable(*id))
    }
}
