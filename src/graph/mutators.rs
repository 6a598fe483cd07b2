//! Graph construction
//!
//! Methods for building a graph. Every builder validates the handles it is
//! given, so a graph built through this API is always well-formed.

use smallvec::SmallVec;

use crate::error::{TransformError, TransformResult};

use super::affine::IndexingMap;
use super::context::Graph;
use super::maps::{record_uses, NodeData, StructuredInfo, ValueData, ValueDef};
use super::types::{CombinerKind, ElementType, Extent, IteratorType, NodeId, OpKind, ValueId};

/// Operands, maps and iteration space of a generic op under construction
#[derive(Debug, Clone, Default)]
pub struct GenericOpSpec {
    inputs: Vec<ValueId>,
    inits: Vec<ValueId>,
    iterator_types: SmallVec<[IteratorType; 4]>,
    input_maps: Vec<IndexingMap>,
    init_maps: Vec<IndexingMap>,
    combiners: Vec<SmallVec<[CombinerKind; 2]>>,
}

impl GenericOpSpec {
    /// Start a generic op with the given loop iterator kinds
    pub fn new(iterator_types: &[IteratorType]) -> Self {
        Self {
            iterator_types: SmallVec::from_slice(iterator_types),
            ..Default::default()
        }
    }

    /// Add an input operand
    pub fn input(mut self, value: ValueId, map: IndexingMap) -> Self {
        self.inputs.push(value);
        self.input_maps.push(map);
        self
    }

    /// Add an init operand written elementwise
    pub fn init(self, value: ValueId, map: IndexingMap) -> Self {
        self.reduced_init(value, map, &[])
    }

    /// Add an init operand folded through the given combining ops
    pub fn reduced_init(
        mut self,
        value: ValueId,
        map: IndexingMap,
        combiners: &[CombinerKind],
    ) -> Self {
        self.inits.push(value);
        self.init_maps.push(map);
        self.combiners.push(SmallVec::from_slice(combiners));
        self
    }
}

impl Graph {
    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn push_value(&mut self, def: ValueDef, element_type: ElementType, shape: &[Extent]) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData {
            def,
            element_type,
            shape: SmallVec::from_slice(shape),
        });
        id
    }

    fn check_container(&self, id: NodeId) -> TransformResult<()> {
        let node = self.try_node(id)?;
        if !node.kind.is_container() {
            return Err(TransformError::InvalidNode(format!(
                "{} ({}) cannot hold nested nodes",
                node.name, node.kind
            )));
        }
        Ok(())
    }

    fn push_node(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        kind: OpKind,
        operands: &[ValueId],
        num_inits: usize,
        structured: Option<StructuredInfo>,
    ) -> TransformResult<NodeId> {
        if self.name_map.contains_key(name) {
            return Err(TransformError::InvalidNode(format!(
                "duplicate node name {name}"
            )));
        }
        if let Some(parent) = parent {
            self.check_container(parent)?;
        }
        for operand in operands {
            self.try_value(*operand)?;
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            name: name.to_string(),
            kind,
            operands: SmallVec::from_slice(operands),
            num_inits,
            results: SmallVec::new(),
            region_args: SmallVec::new(),
            parent,
            structured,
        });
        record_uses(&mut self.use_map, id, operands);
        if let Some(parent) = parent {
            self.region_map.entry(parent).or_default().push(id);
        }
        self.name_map.insert(name.to_string(), id);
        Ok(id)
    }

    fn push_result(&mut self, node: NodeId, element_type: ElementType, shape: &[Extent]) -> ValueId {
        let index = self.nodes[node.index()].results.len();
        let value = self.push_value(ValueDef::OpResult { node, index }, element_type, shape);
        self.nodes[node.index()].results.push(value);
        value
    }

    fn push_region_arg(
        &mut self,
        owner: NodeId,
        element_type: ElementType,
        shape: &[Extent],
    ) -> ValueId {
        let index = self.nodes[owner.index()].region_args.len();
        let value = self.push_value(
            ValueDef::BlockArgument { owner, index },
            element_type,
            shape,
        );
        self.nodes[owner.index()].region_args.push(value);
        value
    }

    fn value_type(&self, value: ValueId) -> TransformResult<(ElementType, SmallVec<[Extent; 4]>)> {
        let data = self.try_value(value)?;
        Ok((data.element_type, data.shape.clone()))
    }

    // ========================================================================
    // Containers
    // ========================================================================

    /// Add a top-level function
    pub fn add_func(&mut self, name: &str) -> TransformResult<NodeId> {
        self.push_node(None, name, OpKind::Func, &[], 0, None)
    }

    /// Add an entry argument to a function
    pub fn add_argument(
        &mut self,
        func: NodeId,
        element_type: ElementType,
        shape: &[Extent],
    ) -> TransformResult<ValueId> {
        let node = self.try_node(func)?;
        if node.kind != OpKind::Func {
            return Err(TransformError::InvalidNode(format!(
                "{} is not a function",
                node.name
            )));
        }
        Ok(self.push_region_arg(func, element_type, shape))
    }

    /// Add a parallel loop whose region arguments and results are tied to
    /// `shared_outs`, position by position
    pub fn add_foreach_thread(
        &mut self,
        parent: NodeId,
        name: &str,
        shared_outs: &[ValueId],
    ) -> TransformResult<NodeId> {
        let id = self.push_node(
            Some(parent),
            name,
            OpKind::ForeachThread,
            shared_outs,
            shared_outs.len(),
            None,
        )?;
        for out in shared_outs {
            let (element_type, shape) = self.value_type(*out)?;
            self.push_region_arg(id, element_type, &shape);
            self.push_result(id, element_type, &shape);
        }
        Ok(id)
    }

    // ========================================================================
    // Plain producers
    // ========================================================================

    /// Add an uninitialized tensor
    pub fn add_empty(
        &mut self,
        parent: NodeId,
        name: &str,
        element_type: ElementType,
        shape: &[Extent],
    ) -> TransformResult<NodeId> {
        let id = self.push_node(Some(parent), name, OpKind::Empty, &[], 0, None)?;
        self.push_result(id, element_type, shape);
        Ok(id)
    }

    /// Add a constant (scalar when `shape` is empty)
    pub fn add_constant(
        &mut self,
        parent: NodeId,
        name: &str,
        element_type: ElementType,
        shape: &[Extent],
    ) -> TransformResult<NodeId> {
        let id = self.push_node(Some(parent), name, OpKind::Constant, &[], 0, None)?;
        self.push_result(id, element_type, shape);
        Ok(id)
    }

    // ========================================================================
    // Pass-through and tilable non-structured ops
    // ========================================================================

    /// Add a slice of `source` with the given result shape
    pub fn add_extract_slice(
        &mut self,
        parent: NodeId,
        name: &str,
        source: ValueId,
        shape: &[Extent],
    ) -> TransformResult<NodeId> {
        let (element_type, _) = self.value_type(source)?;
        let id = self.push_node(Some(parent), name, OpKind::ExtractSlice, &[source], 0, None)?;
        self.push_result(id, element_type, shape);
        Ok(id)
    }

    /// Add a padding of `source` to the given result shape
    pub fn add_pad(
        &mut self,
        parent: NodeId,
        name: &str,
        source: ValueId,
        shape: &[Extent],
    ) -> TransformResult<NodeId> {
        let (element_type, _) = self.value_type(source)?;
        let id = self.push_node(Some(parent), name, OpKind::Pad, &[source], 0, None)?;
        self.push_result(id, element_type, shape);
        Ok(id)
    }

    // ========================================================================
    // Structured ops
    // ========================================================================

    /// Add a fill of `init` with the scalar `value`
    pub fn add_fill(
        &mut self,
        parent: NodeId,
        name: &str,
        value: ValueId,
        init: ValueId,
    ) -> TransformResult<NodeId> {
        let (_, scalar_shape) = self.value_type(value)?;
        if !scalar_shape.is_empty() {
            return Err(TransformError::InvalidNode(format!(
                "{name}: fill value must be a scalar"
            )));
        }
        let (element_type, shape) = self.value_type(init)?;
        let rank = shape.len();
        let info = StructuredInfo {
            iterator_types: SmallVec::from_elem(IteratorType::Parallel, rank),
            indexing_maps: vec![
                IndexingMap::projection(rank, &[]),
                IndexingMap::identity(rank),
            ],
            combiners: vec![SmallVec::new()],
        };
        let id = self.push_node(Some(parent), name, OpKind::Fill, &[value, init], 1, Some(info))?;
        self.push_result(id, element_type, &shape);
        Ok(id)
    }

    /// Add a generic op; it gets one result per init, typed like the init
    pub fn add_generic(
        &mut self,
        parent: NodeId,
        name: &str,
        spec: GenericOpSpec,
    ) -> TransformResult<NodeId> {
        let rank = spec.iterator_types.len();
        let operands: Vec<ValueId> = spec.inputs.iter().chain(&spec.inits).copied().collect();
        let maps: Vec<IndexingMap> = spec
            .input_maps
            .into_iter()
            .chain(spec.init_maps)
            .collect();

        for (value, map) in operands.iter().zip(&maps) {
            let (_, shape) = self.value_type(*value)?;
            if map.num_dims() != rank {
                return Err(TransformError::InvalidIndexingMap {
                    node: name.to_string(),
                    reason: format!("map has {} dims, op has {rank} loops", map.num_dims()),
                });
            }
            if map.num_results() != shape.len() {
                return Err(TransformError::InvalidIndexingMap {
                    node: name.to_string(),
                    reason: format!(
                        "map has {} results for operand {value} of rank {}",
                        map.num_results(),
                        shape.len()
                    ),
                });
            }
        }

        let num_inits = spec.inits.len();
        let info = StructuredInfo {
            iterator_types: spec.iterator_types,
            indexing_maps: maps,
            combiners: spec.combiners,
        };
        let id = self.push_node(Some(parent), name, OpKind::Generic, &operands, num_inits, Some(info))?;
        for init in &spec.inits {
            let (element_type, shape) = self.value_type(*init)?;
            self.push_result(id, element_type, &shape);
        }
        Ok(id)
    }
}

/// Fully static shape from sizes
pub fn static_shape(sizes: &[i64]) -> SmallVec<[Extent; 4]> {
    sizes.iter().map(|s| Extent::Static(*s)).collect()
}
