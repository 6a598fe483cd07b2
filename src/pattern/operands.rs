//! Predicates on operands and results
//!
//! These predicates look at the producers of a structured op's operands
//! and at the consumers of its results, usually by running an embedded
//! matcher on them. Embedded matchers are recorded so the completeness
//! check can enumerate the whole match tree.

use std::rc::Rc;

use log::debug;

use crate::graph::{Graph, NodeId, StructuredOp};

use super::matcher::{resolve_index, StructuredOpMatcher};
use super::traversal::{traverse_subsets_backwards, traverse_subsets_forward_any_use};

/// Whether a failed nested match fails the enclosing predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Optionality {
    /// Nested match must succeed
    #[default]
    Required,
    /// Nested match may fail; it still runs so its captures happen
    Optional,
}

impl Optionality {
    fn is_optional(self) -> bool {
        self == Optionality::Optional
    }
}

/// Indexing map property required of every operand in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingMapKind {
    /// Permutation of all loop dimensions
    Permutation,
    /// Permutation of a subset of loop dimensions
    ProjectedPermutation,
}

impl IndexingMapKind {
    fn holds(self, map: &crate::graph::IndexingMap) -> bool {
        match self {
            IndexingMapKind::Permutation => map.is_permutation(),
            IndexingMapKind::ProjectedPermutation => map.is_projected_permutation(),
        }
    }
}

/// Nested check applied to a producer or consumer node
type NestedCheck = Box<dyn Fn(&Graph, NodeId) -> bool>;

fn run_nested(check: &NestedCheck, graph: &Graph, node: NodeId) -> bool {
    debug!("start recursive match {{");
    let result = check(graph, node);
    debug!("}} end recursive match");
    result
}

fn nested_check(nested: &Rc<StructuredOpMatcher>) -> NestedCheck {
    let nested = Rc::clone(nested);
    Box::new(move |graph, node| nested.match_op(graph, node))
}

/// Shared tail of the operand-producer predicates
///
/// A block-argument operand yields exactly `optional`. Otherwise the
/// nested check always runs, even when optional, so its captures happen.
fn producer_matches(
    op: &StructuredOp<'_>,
    operand: crate::graph::ValueId,
    check: &NestedCheck,
    optional: Optionality,
) -> bool {
    let graph = op.graph();
    match graph.defining_node(operand) {
        None => optional.is_optional(),
        Some(producer) => run_nested(check, graph, producer) || optional.is_optional(),
    }
}

impl StructuredOpMatcher {
    // ========================================================================
    // Inputs
    // ========================================================================

    fn add_input_matcher(self, position: i64, check: NestedCheck, optional: Optionality) -> Self {
        self.with_predicate(move |op| {
            debug!("input operand #{position} ({optional:?}) produced by");
            let Some(index) = resolve_index(position, op.num_inputs()) else {
                return false;
            };
            producer_matches(op, op.inputs()[index], &check, optional)
        })
    }

    /// Input `position` is produced by a node accepted by `nested`
    pub fn input_produced_by(
        mut self,
        position: i64,
        nested: &Rc<StructuredOpMatcher>,
        optional: Optionality,
    ) -> Self {
        self.record_nested(nested);
        self.add_input_matcher(position, nested_check(nested), optional)
    }

    /// Input `position` is produced by a node accepted by `check`
    ///
    /// The check is not a registered matcher and takes no part in the
    /// completeness check.
    pub fn input_satisfies<F>(self, position: i64, check: F, optional: Optionality) -> Self
    where
        F: Fn(&Graph, NodeId) -> bool + 'static,
    {
        self.add_input_matcher(position, Box::new(check), optional)
    }

    /// Every input has an indexing map of the given kind
    pub fn all_inputs(self, kind: IndexingMapKind) -> Self {
        self.with_predicate(move |op| {
            let result = (0..op.num_inputs()).all(|i| kind.holds(op.input_map(i)));
            debug!("all input operands have {kind:?} maps: {result}");
            result
        })
    }

    /// Op has exactly `count` inputs
    pub fn input_count(self, count: usize) -> Self {
        self.with_predicate(move |op| {
            let result = op.num_inputs() == count;
            debug!("number of input operands == {count}: {result}");
            result
        })
    }

    /// Input `position`, looking through subset ops, comes from a node
    /// accepted by `nested`
    pub fn input_subset_of(mut self, position: i64, nested: &Rc<StructuredOpMatcher>) -> Self {
        self.record_nested(nested);
        let nested = Rc::clone(nested);
        self.with_predicate(move |op| {
            debug!("input operand #{position} is a subset of");
            let Some(index) = resolve_index(position, op.num_inputs()) else {
                return false;
            };
            let graph = op.graph();
            let producer = traverse_subsets_backwards(graph, op.inputs()[index]);
            debug!("start recursive match {{");
            let result = nested.match_op(graph, producer);
            debug!("}} end recursive match");
            result
        })
    }

    // ========================================================================
    // Outputs (inits)
    // ========================================================================

    fn add_output_matcher(self, position: i64, check: NestedCheck, optional: Optionality) -> Self {
        self.with_predicate(move |op| {
            debug!("output operand #{position} ({optional:?}) is produced by");
            let Some(index) = resolve_index(position, op.num_inits()) else {
                return false;
            };
            producer_matches(op, op.inits()[index], &check, optional)
        })
    }

    /// Init `position` is produced by a node accepted by `nested`
    pub fn output_produced_by(
        mut self,
        position: i64,
        nested: &Rc<StructuredOpMatcher>,
        optional: Optionality,
    ) -> Self {
        self.record_nested(nested);
        self.add_output_matcher(position, nested_check(nested), optional)
    }

    /// Every init has an indexing map of the given kind
    pub fn all_outputs(self, kind: IndexingMapKind) -> Self {
        self.with_predicate(move |op| {
            let result = (0..op.num_inits()).all(|i| kind.holds(op.init_map(i)));
            debug!("all output operands have {kind:?} maps: {result}");
            result
        })
    }

    /// Op has exactly `count` inits
    pub fn output_count(self, count: usize) -> Self {
        self.with_predicate(move |op| {
            let result = op.num_inits() == count;
            debug!("number of output operands == {count}: {result}");
            result
        })
    }

    /// Init `position` has an integer or float element type of `width` bits
    pub fn output_element_bit_width(self, position: i64, width: u32) -> Self {
        self.with_predicate(move |op| {
            let result = resolve_index(position, op.num_inits())
                .and_then(|i| op.init_element_type(i).int_or_float_bit_width())
                == Some(width);
            debug!("output operand #{position} has elemental type with bit width {width}: {result}");
            result
        })
    }

    /// Init `position` is populated by a reduction with exactly one combiner
    pub fn output_single_combiner_reduction(self, position: i64) -> Self {
        self.with_predicate(move |op| {
            let result = resolve_index(position, op.num_inits())
                .is_some_and(|i| op.combiners(i).len() == 1);
            debug!("output operand #{position} is populated by a single-combiner reduction: {result}");
            result
        })
    }

    /// Init `position`, looking through subset ops, comes from a node
    /// accepted by `nested`
    pub fn output_subset_of(mut self, position: i64, nested: &Rc<StructuredOpMatcher>) -> Self {
        self.record_nested(nested);
        let nested = Rc::clone(nested);
        self.with_predicate(move |op| {
            debug!("output operand #{position} is produced by a subset of");
            let Some(index) = resolve_index(position, op.num_inits()) else {
                return false;
            };
            let graph = op.graph();
            let producer = traverse_subsets_backwards(graph, op.inits()[index]);
            debug!("start recursive match {{");
            let result = nested.match_op(graph, producer);
            debug!("}} end recursive match");
            result
        })
    }

    // ========================================================================
    // Results
    // ========================================================================

    fn add_result_matcher(self, position: i64, check: NestedCheck, optional: Optionality) -> Self {
        self.with_predicate(move |op| {
            debug!("result #{position} ({optional:?}) has a use");
            let Some(index) = resolve_index(position, op.results().len()) else {
                return false;
            };
            let graph = op.graph();
            let any_use = graph
                .users(op.results()[index])
                .any(|user| run_nested(&check, graph, user));
            any_use || optional.is_optional()
        })
    }

    /// Some consumer of result `position` is accepted by `nested`
    pub fn result_any_use(
        mut self,
        position: i64,
        nested: &Rc<StructuredOpMatcher>,
        optional: Optionality,
    ) -> Self {
        self.record_nested(nested);
        self.add_result_matcher(position, nested_check(nested), optional)
    }

    /// The use of result `position` reached by looking through subset ops
    /// is accepted by `nested`
    pub fn result_any_use_subset_of(
        mut self,
        position: i64,
        nested: &Rc<StructuredOpMatcher>,
        optional: Optionality,
    ) -> Self {
        self.record_nested(nested);
        let nested = Rc::clone(nested);
        self.with_predicate(move |op| {
            debug!("result #{position} has a use that is a subset of");
            let Some(index) = resolve_index(position, op.results().len()) else {
                return false;
            };
            let graph = op.graph();
            debug!("start recursive match {{");
            let matched = traverse_subsets_forward_any_use(graph, op.results()[index])
                .is_some_and(|user| nested.match_op(graph, user));
            debug!("}} end recursive match");
            matched || optional.is_optional()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        static_shape, CombinerKind, ElementType, GenericOpSpec, IndexingMap, IteratorType, OpKind,
    };
    use crate::pattern::capture::CaptureSlot;
    use crate::pattern::fixtures::{reduction_chain, ChainOptions, F32};
    use crate::pattern::matcher::m_structured_op;

    #[test]
    fn test_counts_and_maps() {
        let chain = reduction_chain(&ChainOptions::default());
        let g = &chain.graph;

        assert!(m_structured_op()
            .input_count(1)
            .output_count(1)
            .all_inputs(IndexingMapKind::ProjectedPermutation)
            .all_inputs(IndexingMapKind::Permutation)
            .all_outputs(IndexingMapKind::ProjectedPermutation)
            .match_op(g, chain.reduction));
        // (d0, d1, d2) -> (d0, d1) is not a full permutation
        assert!(!m_structured_op()
            .all_outputs(IndexingMapKind::Permutation)
            .match_op(g, chain.reduction));
        assert!(!m_structured_op().input_count(2).match_op(g, chain.reduction));
    }

    #[test]
    fn test_output_bit_width_and_combiner() {
        let chain = reduction_chain(&ChainOptions::default());
        let g = &chain.graph;

        assert!(m_structured_op()
            .output_element_bit_width(0, 32)
            .output_element_bit_width(-1, 32)
            .output_single_combiner_reduction(0)
            .match_op(g, chain.reduction));
        assert!(!m_structured_op()
            .output_element_bit_width(0, 16)
            .match_op(g, chain.reduction));
        assert!(!m_structured_op()
            .output_element_bit_width(1, 32)
            .match_op(g, chain.reduction));
        // Elementwise ops do not reduce
        assert!(!m_structured_op()
            .output_single_combiner_reduction(0)
            .match_op(g, chain.trailing.unwrap()));

        let two_combiners = reduction_chain(&ChainOptions {
            combiners: vec![CombinerKind::MulF, CombinerKind::AddF],
            ..Default::default()
        });
        assert!(!m_structured_op()
            .output_single_combiner_reduction(0)
            .match_op(&two_combiners.graph, two_combiners.reduction));

        let half = reduction_chain(&ChainOptions {
            element_type: ElementType::Float(16),
            ..Default::default()
        });
        assert!(!m_structured_op()
            .output_element_bit_width(0, 32)
            .match_op(&half.graph, half.reduction));
    }

    #[test]
    fn test_input_produced_by() {
        let chain = reduction_chain(&ChainOptions::default());
        let g = &chain.graph;
        let leading = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Generic]));
        let matcher = m_structured_op().input_produced_by(0, &leading, Optionality::Required);

        assert!(matcher.match_op(g, chain.reduction));
        assert_eq!(leading.captured(), chain.leading);
        assert_eq!(matcher.nested_matchers().len(), 1);

        // Out of range position
        let leading = Rc::new(m_structured_op());
        let matcher = m_structured_op().input_produced_by(1, &leading, Optionality::Optional);
        assert!(!matcher.match_op(g, chain.reduction));
        let matcher = m_structured_op().input_produced_by(-2, &leading, Optionality::Optional);
        assert!(!matcher.match_op(g, chain.reduction));
    }

    #[test]
    fn test_block_argument_operand_yields_optional_flag() {
        let chain = reduction_chain(&ChainOptions {
            leading: false,
            ..Default::default()
        });
        let g = &chain.graph;
        let leading = Rc::new(m_structured_op());

        let required = m_structured_op().input_produced_by(0, &leading, Optionality::Required);
        assert!(!required.match_op(g, chain.reduction));

        let optional = m_structured_op().input_produced_by(0, &leading, Optionality::Optional);
        assert!(optional.match_op(g, chain.reduction));
        assert_eq!(leading.captured(), None);
    }

    #[test]
    fn test_optional_nested_still_captures() {
        let chain = reduction_chain(&ChainOptions::default());
        let g = &chain.graph;
        let rank = CaptureSlot::new();
        // Captures the leading rank, then rejects it
        let leading = Rc::new(m_structured_op().capture_rank(&rank).rank_at_least(10));

        let optional = m_structured_op().input_produced_by(0, &leading, Optionality::Optional);
        assert!(optional.match_op(g, chain.reduction));
        assert_eq!(rank.get(), Some(3));
        assert_eq!(leading.captured(), None);

        let required = m_structured_op().input_produced_by(0, &leading, Optionality::Required);
        assert!(!required.match_op(g, chain.reduction));
    }

    #[test]
    fn test_input_satisfies() {
        let chain = reduction_chain(&ChainOptions::default());
        let g = &chain.graph;
        let matcher = m_structured_op().input_satisfies(
            0,
            |graph, node| graph.name(node) == "broadcast",
            Optionality::Required,
        );
        assert!(matcher.match_op(g, chain.reduction));
        assert!(matcher.nested_matchers().is_empty());
    }

    #[test]
    fn test_output_produced_by_fill() {
        let with_fill = reduction_chain(&ChainOptions::default());
        let fill = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Fill]));
        let matcher = m_structured_op().output_produced_by(0, &fill, Optionality::Required);
        assert!(matcher.match_op(&with_fill.graph, with_fill.reduction));
        assert_eq!(fill.captured(), with_fill.fill);

        let without_fill = reduction_chain(&ChainOptions {
            fill: false,
            ..Default::default()
        });
        let fill = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Fill]));
        let matcher = m_structured_op().output_produced_by(0, &fill, Optionality::Required);
        assert!(!matcher.match_op(&without_fill.graph, without_fill.reduction));
    }

    #[test]
    fn test_result_any_use() {
        let chain = reduction_chain(&ChainOptions::default());
        let g = &chain.graph;
        let trailing = Rc::new(m_structured_op().all_dims_iterator(IteratorType::Parallel));
        let matcher = m_structured_op().result_any_use(0, &trailing, Optionality::Required);

        assert!(matcher.match_op(g, chain.reduction));
        assert_eq!(trailing.captured(), chain.trailing);

        let matcher = m_structured_op().result_any_use(1, &trailing, Optionality::Optional);
        assert!(!matcher.match_op(g, chain.reduction));
    }

    #[test]
    fn test_result_without_use() {
        let chain = reduction_chain(&ChainOptions {
            trailing: false,
            ..Default::default()
        });
        let g = &chain.graph;
        let trailing = Rc::new(m_structured_op());

        let required = m_structured_op().result_any_use(0, &trailing, Optionality::Required);
        assert!(!required.match_op(g, chain.reduction));
        let optional = m_structured_op().result_any_use(0, &trailing, Optionality::Optional);
        assert!(optional.match_op(g, chain.reduction));
        let subset = m_structured_op().result_any_use_subset_of(0, &trailing, Optionality::Optional);
        assert!(subset.match_op(g, chain.reduction));
    }

    #[test]
    fn test_result_any_use_picks_matching_consumer() {
        let mut g = Graph::new();
        let func = g.add_func("f").unwrap();
        let arg = g.add_argument(func, F32, &static_shape(&[8])).unwrap();
        let init = g.add_empty(func, "init", F32, &static_shape(&[8])).unwrap();
        let init = g.results(init)[0];
        let producer = g
            .add_generic(
                func,
                "producer",
                GenericOpSpec::new(&[IteratorType::Parallel])
                    .input(arg, IndexingMap::identity(1))
                    .init(init, IndexingMap::identity(1)),
            )
            .unwrap();
        let out = g.results(producer)[0];
        g.add_pad(func, "pad", out, &static_shape(&[10])).unwrap();
        let consumer = g
            .add_generic(
                func,
                "consumer",
                GenericOpSpec::new(&[IteratorType::Parallel])
                    .input(out, IndexingMap::identity(1))
                    .init(init, IndexingMap::identity(1)),
            )
            .unwrap();

        let nested = Rc::new(m_structured_op());
        let matcher = m_structured_op().result_any_use(0, &nested, Optionality::Required);
        assert!(matcher.match_op(&g, producer));
        assert_eq!(nested.captured(), Some(consumer));
    }

    #[test]
    fn test_nested_registry_is_transitive() {
        let inner = Rc::new(m_structured_op());
        let middle = Rc::new(m_structured_op().input_produced_by(0, &inner, Optionality::Optional));
        let outer = m_structured_op().output_produced_by(0, &middle, Optionality::Optional);

        let nested = outer.nested_matchers();
        assert_eq!(nested.len(), 2);
        assert!(Rc::ptr_eq(&nested[0], &middle));
        assert!(Rc::ptr_eq(&nested[1], &inner));
    }
}
