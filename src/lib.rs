//! # Structured Matchers
//!
//! Combinator-based structural pattern matchers for structured compute graphs.
//!
//! This crate provides a small tensor-program IR and a family of matchers
//! that recognize subgraphs of structured ops, such as a reduction together
//! with its init fill and the elementwise ops around it.
//!
//! ## Features
//!
//! - **Host IR**: Arena graph with structured-op views, indexing maps and containers
//! - **Predicate Combinators**: Rank, dim, iterator, operand and result constraints
//! - **Nested Matching**: Producer and consumer matchers, with subset traversal
//! - **Callbacks**: Reduction and split-reduction patterns reported as payload groups
//!
//! ## Example
//!
//! ```ignore
//! use structured_matchers::prelude::*;
//!
//! let result = reduction_callback(&graph, func).expect("no reduction");
//! let fill = result.get_payload_group(1)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod error;
pub mod graph;
pub mod pattern;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use structured_matchers::prelude::*`
pub mod prelude {
    pub use crate::error::{TransformError, TransformResult};
    pub use crate::graph::{
        static_shape, ElementType, Extent, GenericOpSpec, Graph, IndexingMap, IteratorType, NodeId,
        OpKind, ShapeKind, StructuredOp, ValueId,
    };
    pub use crate::pattern::{
        m_structured_op, make_reduction_matcher, make_split_reduction_matcher, reduction_callback,
        split_reduction_callback, CaptureSlot, IndexingMapKind, MatchCallbackResult, Optionality,
        StructuredOpMatcher,
    };
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{TransformError, TransformResult};

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
