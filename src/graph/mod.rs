//! Host IR for structured compute graphs
//!
//! This module provides the graph the matchers inspect:
//!
//! - [`Graph`]: arena of nodes and values with O(1) handle lookups
//! - [`StructuredOp`]: view of a node exposing the structured-compute capability
//! - [`maps`]: arena records and the use/region/name maps
//!
//! # Overview
//!
//! Nodes consume operand values and produce result values. Containers
//! (functions and parallel loops) own a region of nested nodes and a list
//! of region entry arguments. Structured ops additionally describe their
//! iteration space: one iterator kind per loop, one indexing map per
//! operand, and the combining ops of each reduced init.
//!
//! # Example
//!
//! ```
//! use structured_matchers::graph::{static_shape, ElementType, Graph, OpKind};
//!
//! let mut graph = Graph::new();
//! let func = graph.add_func("main").unwrap();
//! let cst = graph.add_constant(func, "cst", ElementType::Float(32), &[]).unwrap();
//! let empty = graph
//!     .add_empty(func, "empty", ElementType::Float(32), &static_shape(&[4, 8]))
//!     .unwrap();
//! let fill = graph
//!     .add_fill(func, "fill", graph.results(cst)[0], graph.results(empty)[0])
//!     .unwrap();
//!
//! assert!(graph.structured(fill).is_some());
//! assert_eq!(graph.parent_of_kind(fill, OpKind::Func), Some(func));
//! ```
//!
//! # Maps
//!
//! | Map | Description |
//! |-----|-------------|
//! | `use_map` | value → uses, in insertion order |
//! | `region_map` | container → nested nodes |
//! | `name_map` | node name → node (order preserved) |

pub mod accessors;
pub mod affine;
pub mod context;
pub mod maps;
pub mod mutators;
pub mod types;

// Re-export main types
pub use accessors::StructuredOp;
pub use affine::{IndexingMap, MapExpr};
pub use context::{Graph, Walk};
pub use maps::{NodeData, OpOperand, StructuredInfo, ValueData, ValueDef};
pub use mutators::{static_shape, GenericOpSpec};
pub use types::{
    CombinerKind, ElementType, Extent, IteratorType, NodeId, OpKind, ShapeKind, ValueId,
};
