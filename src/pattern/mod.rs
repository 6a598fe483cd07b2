//! Structural pattern matching over structured compute graphs
//!
//! This module provides combinators for describing a structured op by its
//! properties and by the ops around it, so that a whole subgraph can be
//! recognized from a single root.
//!
//! # Overview
//!
//! The matching system works by:
//! 1. Building a [`StructuredOpMatcher`] from an empty predicate list
//! 2. Chaining predicates on rank, dims, operands and results
//! 3. Embedding other matchers to constrain producers and consumers
//! 4. Running [`StructuredOpMatcher::match_op`] on a candidate root
//!
//! A successful match records the matched node in every matcher that took
//! part, and writes extracted values into [`CaptureSlot`]s.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use structured_matchers::graph::{IteratorType, OpKind};
//! use structured_matchers::pattern::{m_structured_op, CaptureSlot, Optionality, StructuredOpMatcher};
//!
//! let rank = CaptureSlot::new();
//! let fill = Rc::new(StructuredOpMatcher::of_kinds(&[OpKind::Fill]));
//! let reduction = m_structured_op()
//!     .rank_at_least(2)
//!     .capture_rank(&rank)
//!     .dims_iterator(&[-1], IteratorType::Reduction)
//!     .output_produced_by(0, &fill, Optionality::Required);
//!
//! assert_eq!(reduction.nested_matchers().len(), 1);
//! ```
//!
//! # Traversal
//!
//! Producers and consumers are found by looking through subset ops:
//!
//! ```ignore
//! use structured_matchers::pattern::{traverse_subsets_backwards, traverse_subsets_forward_any_use};
//!
//! let producer = traverse_subsets_backwards(&graph, operand);
//! let consumer = traverse_subsets_forward_any_use(&graph, result);
//! ```

pub mod callback;
pub mod capture;
pub mod completeness;
pub mod matcher;
pub mod operands;
pub mod ops;
pub mod traversal;

#[cfg(test)]
mod fixtures;

// Re-export main types
pub use callback::{reduction_callback, split_reduction_callback, MatchCallbackResult};
pub use capture::CaptureSlot;
pub use completeness::check_all_tilable_matched;
pub use matcher::{m_structured_op, resolve_index, StructuredOpMatcher};
pub use operands::{IndexingMapKind, Optionality};
pub use ops::{
    make_reduction_matcher, make_reduction_matcher_with_config, make_split_reduction_matcher,
    make_split_reduction_matcher_with_config, MatchedReductionCaptures, ReductionCaptureSlots,
    ReductionMatcherConfig, ReductionMatchers, SplitReductionMatcherConfig,
    SplitReductionMatchers,
};
pub use traversal::{traverse_subsets_backwards, traverse_subsets_forward_any_use};
