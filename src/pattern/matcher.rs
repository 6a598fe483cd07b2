//! Structured op matcher
//!
//! A matcher is an ordered list of predicates over a structured op.
//! Predicates run in registration order and evaluation stops at the first
//! one returning `false`; predicates that already ran are not undone, so
//! their captures stay written. A node is recorded as captured only when
//! every predicate accepts it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::graph::{Extent, Graph, IteratorType, NodeId, OpKind, ShapeKind, StructuredOp};

use super::capture::CaptureSlot;

/// Predicate over a structured op
pub(crate) type PredicateFn = Rc<dyn Fn(&StructuredOp<'_>) -> bool>;

/// Resolve a possibly negative index against `count`
///
/// Negative indices count from the end. Returns `None` when the resolved
/// index falls outside `[0, count)`.
pub fn resolve_index(index: i64, count: usize) -> Option<usize> {
    let count = count as i64;
    let resolved = if index >= 0 { index } else { count + index };
    (0..count).contains(&resolved).then_some(resolved as usize)
}

/// Matcher for structured ops built from chained predicates
///
/// Matchers that other matchers embed are shared through `Rc` so the
/// caller can inspect what they captured after the enclosing match.
pub struct StructuredOpMatcher {
    predicates: Vec<PredicateFn>,
    captured: Cell<Option<NodeId>>,
    nested: Vec<Rc<StructuredOpMatcher>>,
}

/// Create a matcher accepting any structured op
pub fn m_structured_op() -> StructuredOpMatcher {
    StructuredOpMatcher::new()
}

impl StructuredOpMatcher {
    /// Create a matcher with no predicates
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            captured: Cell::new(None),
            nested: Vec::new(),
        }
    }

    /// Create a matcher restricted to the given op kinds
    pub fn of_kinds(kinds: &[OpKind]) -> Self {
        let kinds: SmallVec<[OpKind; 2]> = SmallVec::from_slice(kinds);
        Self::new().with_predicate(move |op| {
            let result = kinds.contains(&op.kind());
            debug!("operation type is one of {kinds:?}: {result}");
            result
        })
    }

    /// Append a predicate
    pub(crate) fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&StructuredOp<'_>) -> bool + 'static,
    {
        self.predicates.push(Rc::new(predicate));
        self
    }

    /// Register an embedded matcher and everything it embeds
    pub(crate) fn record_nested(&mut self, nested: &Rc<StructuredOpMatcher>) {
        self.nested.push(Rc::clone(nested));
        self.nested.extend(nested.nested.iter().cloned());
    }

    /// Match `node` against every predicate
    ///
    /// Returns `false` for nodes lacking the structured-compute capability.
    /// On success the node becomes this matcher's captured node.
    pub fn match_op(&self, graph: &Graph, node: NodeId) -> bool {
        debug!("matching: {} ({})", graph.name(node), graph.kind(node));
        let result = match graph.structured(node) {
            Some(op) => self.predicates.iter().all(|predicate| predicate(&op)),
            None => {
                debug!("not a structured op");
                false
            }
        };
        if result {
            self.captured.set(Some(node));
        }
        debug!("-------");
        result
    }

    /// Node captured by the last successful match
    pub fn captured(&self) -> Option<NodeId> {
        self.captured.get()
    }

    /// Forget the captured node of this matcher and of every embedded one
    pub fn reset_captures(&self) {
        self.captured.set(None);
        for nested in &self.nested {
            nested.captured.set(None);
        }
    }

    /// Matchers embedded through operand and result predicates, transitively
    pub fn nested_matchers(&self) -> &[Rc<StructuredOpMatcher>] {
        &self.nested
    }

    /// Number of registered predicates
    pub fn num_predicates(&self) -> usize {
        self.predicates.len()
    }

    // ========================================================================
    // Rank
    // ========================================================================

    /// Op has at least `min_rank` loops
    pub fn rank_at_least(self, min_rank: usize) -> Self {
        self.with_predicate(move |op| {
            let result = op.num_loops() >= min_rank;
            debug!("rank >= {min_rank}: {result}");
            result
        })
    }

    /// Op has at most `max_rank` loops
    pub fn rank_at_most(self, max_rank: usize) -> Self {
        self.with_predicate(move |op| {
            let result = op.num_loops() <= max_rank;
            debug!("rank <= {max_rank}: {result}");
            result
        })
    }

    /// Capture the number of loops; never filters
    pub fn capture_rank(self, slot: &CaptureSlot<usize>) -> Self {
        let slot = slot.clone();
        self.with_predicate(move |op| {
            debug!("capture rank: {}", op.num_loops());
            slot.set(op.num_loops());
            true
        })
    }

    // ========================================================================
    // Dimensions
    // ========================================================================

    /// Listed dimensions have extents of the given kind
    pub fn dims_shape(self, dims: &[i64], kind: ShapeKind) -> Self {
        let dims: SmallVec<[i64; 4]> = SmallVec::from_slice(dims);
        self.with_predicate(move |op| {
            let shape = op.static_loop_ranges();
            let result = dims.iter().all(|dim| {
                resolve_index(*dim, shape.len()).is_some_and(|d| shape[d].is_kind(kind))
            });
            debug!("dimensions {dims:?} are {kind}: {result}");
            result
        })
    }

    /// Every dimension has an extent of the given kind
    pub fn all_dims_shape(self, kind: ShapeKind) -> Self {
        self.with_predicate(move |op| {
            let result = op.static_loop_ranges().iter().all(|e| e.is_kind(kind));
            debug!("all dimensions are {kind}: {result}");
            result
        })
    }

    /// Listed dimensions have the given iterator kind
    pub fn dims_iterator(self, dims: &[i64], kind: IteratorType) -> Self {
        let dims: SmallVec<[i64; 4]> = SmallVec::from_slice(dims);
        self.with_predicate(move |op| {
            let iterators = op.iterator_types();
            let result = dims.iter().all(|dim| {
                resolve_index(*dim, iterators.len()).is_some_and(|d| iterators[d] == kind)
            });
            debug!("dimensions {dims:?} are {kind}: {result}");
            result
        })
    }

    /// Every dimension has the given iterator kind
    pub fn all_dims_iterator(self, kind: IteratorType) -> Self {
        self.all_dims_except_iterator(&[], kind)
    }

    /// Every dimension not listed in `excluded` has the given iterator kind
    pub fn all_dims_except_iterator(self, excluded: &[i64], kind: IteratorType) -> Self {
        let excluded: SmallVec<[i64; 4]> = SmallVec::from_slice(excluded);
        self.with_predicate(move |op| {
            let rank = op.num_loops() as i64;
            let skipped: FxHashSet<i64> = excluded
                .iter()
                .map(|d| if *d >= 0 { *d } else { rank + d })
                .collect();
            let result = op
                .iterator_types()
                .iter()
                .enumerate()
                .all(|(index, ty)| skipped.contains(&(index as i64)) || *ty == kind);
            debug!("all dimensions except {excluded:?} are {kind}: {result}");
            result
        })
    }

    /// Dimension has a static extent divisible by `divisor`
    pub fn dim_divisible_by(self, dim: i64, divisor: i64) -> Self {
        self.with_predicate(move |op| {
            let shape = op.static_loop_ranges();
            let result = resolve_index(dim, shape.len())
                .and_then(|d| shape[d].as_static())
                .and_then(|size| size.checked_rem(divisor))
                == Some(0);
            debug!("dimension {dim} is divisible by {divisor}: {result}");
            result
        })
    }

    /// Capture the extent of a dimension; fails only on an unresolvable index
    pub fn capture_dim(self, dim: i64, slot: &CaptureSlot<Extent>) -> Self {
        let slot = slot.clone();
        self.with_predicate(move |op| {
            let shape = op.static_loop_ranges();
            match resolve_index(dim, shape.len()) {
                Some(d) => {
                    debug!("capture dimension {dim}: {}", shape[d]);
                    slot.set(shape[d]);
                    true
                }
                None => {
                    debug!("capture dimension {dim}: out of range");
                    false
                }
            }
        })
    }
}

impl Default for StructuredOpMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies predicates and the nested registry; the copy starts with nothing captured
impl Clone for StructuredOpMatcher {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            captured: Cell::new(None),
            nested: self.nested.clone(),
        }
    }
}

impl fmt::Debug for StructuredOpMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredOpMatcher")
            .field("predicates", &self.predicates.len())
            .field("captured", &self.captured.get())
            .field("nested", &self.nested.len())
            .finish()
    }
}
