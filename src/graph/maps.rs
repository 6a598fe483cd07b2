//! Graph records and map types
//!
//! Defines the arena records and the side maps used for traversal.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::affine::IndexingMap;
use super::types::{CombinerKind, ElementType, Extent, IteratorType, NodeId, OpKind, ValueId};

/// Where a value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    /// Result `index` of `node`
    OpResult {
        /// Defining node
        node: NodeId,
        /// Result number
        index: usize,
    },
    /// Entry argument `index` of the region owned by `owner`
    BlockArgument {
        /// Container owning the region
        owner: NodeId,
        /// Argument number
        index: usize,
    },
}

/// Arena record for a value
#[derive(Debug, Clone)]
pub struct ValueData {
    /// Producer of the value
    pub def: ValueDef,
    /// Element type
    pub element_type: ElementType,
    /// Static shape, empty for scalars
    pub shape: SmallVec<[Extent; 4]>,
}

/// Structured-compute description of a node
#[derive(Debug, Clone)]
pub struct StructuredInfo {
    /// Iterator kind per loop
    pub iterator_types: SmallVec<[IteratorType; 4]>,
    /// One indexing map per operand (inputs, then inits)
    pub indexing_maps: Vec<IndexingMap>,
    /// Combining ops reducing into each init, empty when the init is not reduced
    pub combiners: Vec<SmallVec<[CombinerKind; 2]>>,
}

/// Arena record for a node
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Unique node name
    pub name: String,
    /// Op kind
    pub kind: OpKind,
    /// Operands; the trailing `num_inits` are outputs/inits
    pub operands: SmallVec<[ValueId; 4]>,
    /// Number of trailing init operands
    pub num_inits: usize,
    /// Results
    pub results: SmallVec<[ValueId; 2]>,
    /// Region entry arguments (containers only)
    pub region_args: SmallVec<[ValueId; 2]>,
    /// Enclosing container
    pub parent: Option<NodeId>,
    /// Present for structured ops
    pub structured: Option<StructuredInfo>,
}

impl NodeData {
    /// Input operands
    pub fn inputs(&self) -> &[ValueId] {
        &self.operands[..self.operands.len() - self.num_inits]
    }

    /// Init (output) operands
    pub fn inits(&self) -> &[ValueId] {
        &self.operands[self.operands.len() - self.num_inits..]
    }
}

/// A use of a value: operand `operand_number` of `owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpOperand {
    /// Consuming node
    pub owner: NodeId,
    /// Operand position in the consumer
    pub operand_number: usize,
}

/// Type alias for use map: value → uses, in insertion order
/// SmallVec optimized for common case of 1-4 consumers
pub type UseMap = FxHashMap<ValueId, SmallVec<[OpOperand; 4]>>;

/// Type alias for region map: container → nested nodes, in insertion order
pub type RegionMap = FxHashMap<NodeId, SmallVec<[NodeId; 8]>>;

/// Type alias for name map: node name → node (order preserved)
pub type NameMap = IndexMap<String, NodeId>;

/// Record every operand of `owner` as a use
pub fn record_uses(map: &mut UseMap, owner: NodeId, operands: &[ValueId]) {
    for (operand_number, value) in operands.iter().enumerate() {
        map.entry(*value).or_default().push(OpOperand {
            owner,
            operand_number,
        });
    }
}
