//! Pre-defined patterns
//!
//! Compositions of the matcher primitives recognizing reduction kernels,
//! possibly preceded and followed by elementwise ops.

use std::rc::Rc;

use crate::graph::{Extent, IteratorType, OpKind, ShapeKind};

use super::capture::CaptureSlot;
use super::matcher::{m_structured_op, StructuredOpMatcher};
use super::operands::{IndexingMapKind, Optionality};

/// Reduction pattern configuration
#[derive(Debug, Clone)]
pub struct ReductionMatcherConfig {
    /// Minimum number of loops of the reduction
    pub min_rank: usize,
    /// Maximum number of loops of the reduction
    pub max_rank: usize,
    /// Required element bit width of the reduction output
    pub element_bit_width: u32,
}

impl Default for ReductionMatcherConfig {
    fn default() -> Self {
        Self {
            min_rank: 2,
            max_rank: 4,
            element_bit_width: 32,
        }
    }
}

impl ReductionMatcherConfig {
    /// Set the accepted rank range
    pub fn with_rank_range(mut self, min_rank: usize, max_rank: usize) -> Self {
        self.min_rank = min_rank;
        self.max_rank = max_rank;
        self
    }

    /// Set the required output bit width
    pub fn with_element_bit_width(mut self, width: u32) -> Self {
        self.element_bit_width = width;
        self
    }
}

/// Split-reduction pattern configuration
#[derive(Debug, Clone)]
pub struct SplitReductionMatcherConfig {
    /// Required element bit width of the combiner output
    pub element_bit_width: u32,
}

impl Default for SplitReductionMatcherConfig {
    fn default() -> Self {
        Self {
            element_bit_width: 32,
        }
    }
}

/// Slots written while matching the reduction pattern
#[derive(Debug, Clone, Default)]
pub struct ReductionCaptureSlots {
    /// Number of loops of the reduction
    pub reduction_rank: CaptureSlot<usize>,
    /// Extent of the most-minor parallel dimension
    pub most_minor_parallel_dimension_size: CaptureSlot<Extent>,
    /// Extent of the reduction dimension
    pub reduction_dimension_size: CaptureSlot<Extent>,
    /// Number of loops of the leading op, if it was examined
    pub maybe_leading_rank: CaptureSlot<usize>,
    /// Number of loops of the trailing op, if it was examined
    pub maybe_trailing_rank: CaptureSlot<usize>,
}

/// Facts captured by the reduction pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchedReductionCaptures {
    /// Number of loops of the reduction
    pub reduction_rank: Option<usize>,
    /// Extent of the most-minor parallel dimension
    pub most_minor_parallel_dimension_size: Option<Extent>,
    /// Extent of the reduction dimension
    pub reduction_dimension_size: Option<Extent>,
    /// Number of loops of the leading op
    pub maybe_leading_rank: Option<usize>,
    /// Number of loops of the trailing op
    pub maybe_trailing_rank: Option<usize>,
}

impl ReductionCaptureSlots {
    /// Current contents of every slot
    pub fn snapshot(&self) -> MatchedReductionCaptures {
        MatchedReductionCaptures {
            reduction_rank: self.reduction_rank.get(),
            most_minor_parallel_dimension_size: self.most_minor_parallel_dimension_size.get(),
            reduction_dimension_size: self.reduction_dimension_size.get(),
            maybe_leading_rank: self.maybe_leading_rank.get(),
            maybe_trailing_rank: self.maybe_trailing_rank.get(),
        }
    }

    /// Empty every slot
    pub fn clear(&self) {
        self.reduction_rank.clear();
        self.most_minor_parallel_dimension_size.clear();
        self.reduction_dimension_size.clear();
        self.maybe_leading_rank.clear();
        self.maybe_trailing_rank.clear();
    }
}

/// Matchers of the reduction pattern
#[derive(Debug, Clone)]
pub struct ReductionMatchers {
    /// Root matcher, anchored on the reduction
    pub reduction: Rc<StructuredOpMatcher>,
    /// Fill initializing the reduction output
    pub fill: Rc<StructuredOpMatcher>,
    /// Optional elementwise producer of the reduction input
    pub leading: Rc<StructuredOpMatcher>,
    /// Optional elementwise consumer of the reduction result
    pub trailing: Rc<StructuredOpMatcher>,
    /// Capture slots
    pub captures: ReductionCaptureSlots,
}

/// Matchers of the split-reduction pattern
#[derive(Debug, Clone)]
pub struct SplitReductionMatchers {
    /// Partial reduction producing the split result
    pub parallel_reduction: Rc<StructuredOpMatcher>,
    /// Root matcher, anchored on the reduction combining partial results
    pub combiner_reduction: Rc<StructuredOpMatcher>,
    /// Fill initializing the partial reduction
    pub parallel_fill: Rc<StructuredOpMatcher>,
    /// Fill initializing the final result
    pub original_fill: Rc<StructuredOpMatcher>,
    /// Optional elementwise producer of the partial reduction input
    pub leading: Rc<StructuredOpMatcher>,
    /// Optional elementwise consumer of the final result
    pub trailing: Rc<StructuredOpMatcher>,
}

/// Reduction pattern with default configuration
pub fn make_reduction_matcher() -> ReductionMatchers {
    make_reduction_matcher_with_config(&ReductionMatcherConfig::default())
}

/// Reduction pattern
///
/// Anchored on a reduction whose single most-minor dimension reduces and
/// whose other dimensions are parallel, with one input and one output
/// initialized by a fill. An elementwise op may produce the input and an
/// elementwise op may consume the result. The match must cover every
/// tilable op of the enclosing function.
pub fn make_reduction_matcher_with_config(config: &ReductionMatcherConfig) -> ReductionMatchers {
    let captures = ReductionCaptureSlots::default();

    let reduction = m_structured_op()
        .rank_at_least(config.min_rank)
        .rank_at_most(config.max_rank)
        .capture_rank(&captures.reduction_rank)
        // Single most-minor reduction dimension, captured
        .dims_iterator(&[-1], IteratorType::Reduction)
        .capture_dim(-2, &captures.most_minor_parallel_dimension_size)
        .capture_dim(-1, &captures.reduction_dimension_size)
        .all_dims_except_iterator(&[-1], IteratorType::Parallel)
        .input_count(1)
        .all_inputs(IndexingMapKind::ProjectedPermutation)
        .output_count(1)
        .all_outputs(IndexingMapKind::ProjectedPermutation)
        .output_element_bit_width(0, config.element_bit_width)
        .output_single_combiner_reduction(0);

    // The fill must create the unique output of the reduction
    let fill = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Fill]));
    let reduction = reduction
        .output_count(1)
        .output_produced_by(0, &fill, Optionality::Required);

    let common_leading_or_trailing = StructuredOpMatcher::of_kinds(&[OpKind::Generic])
        .all_dims_iterator(IteratorType::Parallel)
        .all_inputs(IndexingMapKind::ProjectedPermutation)
        .all_outputs(IndexingMapKind::Permutation)
        .output_count(1);

    let leading = Rc::new(
        common_leading_or_trailing
            .clone()
            .capture_rank(&captures.maybe_leading_rank),
    );
    let reduction = reduction.input_produced_by(0, &leading, Optionality::Optional);

    let trailing = Rc::new(common_leading_or_trailing.capture_rank(&captures.maybe_trailing_rank));
    let reduction = reduction
        .result_any_use(0, &trailing, Optionality::Optional)
        .all_tilable_ops_captured(OpKind::Func);

    ReductionMatchers {
        reduction: Rc::new(reduction),
        fill,
        leading,
        trailing,
        captures,
    }
}

/// Split-reduction pattern with default configuration
pub fn make_split_reduction_matcher() -> SplitReductionMatchers {
    make_split_reduction_matcher_with_config(&SplitReductionMatcherConfig::default())
}

/// Split-reduction pattern
///
/// Anchored on the reduction combining the partial results of a parallel
/// reduction, each initialized by its own fill. Slices and parallel loops
/// between the two reductions are looked through.
pub fn make_split_reduction_matcher_with_config(
    config: &SplitReductionMatcherConfig,
) -> SplitReductionMatchers {
    let original_fill = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Fill]));
    let parallel_fill = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Fill]));
    let elementwise = || {
        StructuredOpMatcher::of_kinds(&[OpKind::Generic])
            .all_inputs(IndexingMapKind::Permutation)
            .all_outputs(IndexingMapKind::Permutation)
            .input_count(1)
            .output_count(1)
    };
    let trailing = Rc::new(elementwise());
    let leading = Rc::new(elementwise());

    let parallel_reduction = Rc::new(
        m_structured_op()
            .all_dims_shape(ShapeKind::Static)
            .dims_iterator(&[-1], IteratorType::Reduction)
            .all_inputs(IndexingMapKind::Permutation)
            .input_produced_by(0, &leading, Optionality::Optional)
            .output_count(1)
            .output_produced_by(0, &parallel_fill, Optionality::Required),
    );

    let combiner_reduction = Rc::new(
        m_structured_op()
            .all_dims_shape(ShapeKind::Static)
            .dims_iterator(&[-1], IteratorType::Reduction)
            .all_inputs(IndexingMapKind::Permutation)
            .input_subset_of(0, &parallel_reduction)
            .output_count(1)
            .output_subset_of(0, &original_fill)
            .output_element_bit_width(0, config.element_bit_width)
            .output_single_combiner_reduction(0)
            .result_any_use_subset_of(0, &trailing, Optionality::Optional)
            .all_tilable_ops_captured(OpKind::Func),
    );

    SplitReductionMatchers {
        parallel_reduction,
        combiner_reduction,
        parallel_fill,
        original_fill,
        leading,
        trailing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{static_shape, Graph};
    use crate::pattern::fixtures::{
        reduction_chain, split_reduction, ChainOptions, SplitOptions, F32,
    };

    #[test]
    fn test_reduction_end_to_end() {
        let chain = reduction_chain(&ChainOptions::default());
        let matchers = make_reduction_matcher();

        assert!(matchers.reduction.match_op(&chain.graph, chain.reduction));
        assert_eq!(matchers.reduction.captured(), Some(chain.reduction));
        assert_eq!(matchers.fill.captured(), chain.fill);
        assert_eq!(matchers.leading.captured(), chain.leading);
        assert_eq!(matchers.trailing.captured(), chain.trailing);

        let captures = matchers.captures.snapshot();
        assert_eq!(captures.reduction_rank, Some(3));
        assert_eq!(
            captures.most_minor_parallel_dimension_size,
            Some(Extent::Static(8))
        );
        assert_eq!(captures.reduction_dimension_size, Some(Extent::Static(16)));
        assert_eq!(captures.maybe_leading_rank, Some(3));
        assert_eq!(captures.maybe_trailing_rank, Some(2));
    }

    #[test]
    fn test_reduction_requires_fill() {
        let chain = reduction_chain(&ChainOptions {
            fill: false,
            ..Default::default()
        });
        let matchers = make_reduction_matcher();
        assert!(!matchers.reduction.match_op(&chain.graph, chain.reduction));
        assert_eq!(matchers.reduction.captured(), None);
    }

    #[test]
    fn test_reduction_without_optionals() {
        let chain = reduction_chain(&ChainOptions {
            leading: false,
            trailing: false,
            ..Default::default()
        });
        let matchers = make_reduction_matcher();

        assert!(matchers.reduction.match_op(&chain.graph, chain.reduction));
        assert_eq!(matchers.leading.captured(), None);
        assert_eq!(matchers.trailing.captured(), None);
        assert_eq!(matchers.captures.snapshot().maybe_leading_rank, None);
    }

    #[test]
    fn test_reduction_rejects_extra_tilable_op() {
        let mut chain = reduction_chain(&ChainOptions::default());
        let arg = chain
            .graph
            .add_argument(chain.func, F32, &static_shape(&[4]))
            .unwrap();
        chain
            .graph
            .add_pad(chain.func, "unrelated", arg, &static_shape(&[6]))
            .unwrap();

        let matchers = make_reduction_matcher();
        assert!(!matchers.reduction.match_op(&chain.graph, chain.reduction));
        // Predicates before the completeness check still ran
        assert_eq!(matchers.captures.snapshot().reduction_rank, Some(3));
    }

    #[test]
    fn test_reduction_config() {
        let chain = reduction_chain(&ChainOptions {
            element_type: crate::graph::ElementType::Float(16),
            ..Default::default()
        });
        assert!(!make_reduction_matcher()
            .reduction
            .match_op(&chain.graph, chain.reduction));

        let half = ReductionMatcherConfig::default().with_element_bit_width(16);
        assert!(make_reduction_matcher_with_config(&half)
            .reduction
            .match_op(&chain.graph, chain.reduction));

        let narrow = ReductionMatcherConfig::default().with_rank_range(2, 2);
        assert!(!make_reduction_matcher_with_config(&narrow)
            .reduction
            .match_op(&chain.graph, chain.reduction));
    }

    #[test]
    fn test_split_reduction_direct() {
        let split = split_reduction(&SplitOptions::default());
        let matchers = make_split_reduction_matcher();

        assert!(matchers
            .combiner_reduction
            .match_op(&split.graph, split.combiner_reduction));
        assert_eq!(
            matchers.parallel_reduction.captured(),
            Some(split.parallel_reduction)
        );
        assert_eq!(matchers.parallel_fill.captured(), Some(split.parallel_fill));
        assert_eq!(matchers.original_fill.captured(), Some(split.original_fill));
        assert_eq!(matchers.trailing.captured(), split.trailing);
        assert_eq!(matchers.leading.captured(), None);
    }

    #[test]
    fn test_split_reduction_through_loop() {
        let split = split_reduction(&SplitOptions {
            tiled: true,
            trailing: false,
        });
        let matchers = make_split_reduction_matcher();

        assert!(matchers
            .combiner_reduction
            .match_op(&split.graph, split.combiner_reduction));
        assert_eq!(
            matchers.parallel_reduction.captured(),
            Some(split.parallel_reduction)
        );
        assert_eq!(matchers.original_fill.captured(), Some(split.original_fill));
        assert_eq!(matchers.trailing.captured(), None);
    }

    #[test]
    fn test_split_reduction_rejects_plain_reduction() {
        let chain = reduction_chain(&ChainOptions::default());
        let matchers = make_split_reduction_matcher();
        assert!(!matchers
            .combiner_reduction
            .match_op(&chain.graph, chain.reduction));
    }

    #[test]
    fn test_empty_graph_scope() {
        let mut g = Graph::new();
        let func = g.add_func("f").unwrap();
        let matchers = make_reduction_matcher();
        assert!(!matchers.reduction.match_op(&g, func));
    }
}
