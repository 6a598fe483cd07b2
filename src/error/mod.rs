//! Error types for structured-matchers
//!
//! Matching itself never fails with an error: predicates answer `true` or
//! `false`. Errors only come from building the IR and from addressing
//! payload groups of a callback result.

use thiserror::Error;

/// Main error type for IR construction and match-result access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Invalid node configuration
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// A node handle that was not minted by this graph
    #[error("Unknown node: #{0}")]
    UnknownNode(u32),

    /// A value handle that was not minted by this graph
    #[error("Unknown value: %{0}")]
    UnknownValue(u32),

    /// Indexing maps inconsistent with the node they describe
    #[error("Invalid indexing map on {node}: {reason}")]
    InvalidIndexingMap {
        /// Node name
        node: String,
        /// What is wrong with the maps
        reason: String,
    },

    /// Payload group index past the last group
    #[error("Payload group {position} out of range ({groups} groups)")]
    PayloadGroupOutOfRange {
        /// Requested group
        position: usize,
        /// Number of groups available
        groups: usize,
    },

    /// Group lengths do not partition the payload list
    #[error("Payload group lengths cover {actual} operations, expected {expected}")]
    InvalidPayloadGroups {
        /// Number of payload operations
        expected: usize,
        /// Sum of the group lengths
        actual: usize,
    },
}

/// Result type alias for fallible operations
pub type TransformResult<T> = Result<T, TransformError>;
