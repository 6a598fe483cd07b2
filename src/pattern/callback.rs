//! Match callback results
//!
//! A callback runs a pattern over a scope and reports the matched nodes as
//! a flat list partitioned into payload groups, one group per role in the
//! pattern. Optional roles that were not matched produce empty groups.

use log::debug;

use crate::error::{TransformError, TransformResult};
use crate::graph::{Graph, NodeId};

use super::ops::{make_reduction_matcher, make_split_reduction_matcher};

/// Flat list of matched nodes partitioned into contiguous groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCallbackResult {
    payload_operations: Vec<NodeId>,
    payload_group_lengths: Vec<usize>,
}

impl MatchCallbackResult {
    /// Create a result from a flat list and the length of each group
    pub fn new(
        payload_operations: Vec<NodeId>,
        payload_group_lengths: Vec<usize>,
    ) -> TransformResult<Self> {
        let covered: usize = payload_group_lengths.iter().sum();
        if covered != payload_operations.len() {
            return Err(TransformError::InvalidPayloadGroups {
                expected: payload_operations.len(),
                actual: covered,
            });
        }
        Ok(Self {
            payload_operations,
            payload_group_lengths,
        })
    }

    /// Append a group
    pub fn add_payload_group(&mut self, ops: impl IntoIterator<Item = NodeId>) {
        let before = self.payload_operations.len();
        self.payload_operations.extend(ops);
        self.payload_group_lengths
            .push(self.payload_operations.len() - before);
    }

    /// Append a group holding `op` if present, an empty group otherwise
    pub fn add_potentially_empty_payload_group(&mut self, op: Option<NodeId>) {
        self.add_payload_group(op);
    }

    /// Nodes of group `position`
    pub fn get_payload_group(&self, position: usize) -> TransformResult<&[NodeId]> {
        let length = *self.payload_group_lengths.get(position).ok_or(
            TransformError::PayloadGroupOutOfRange {
                position,
                groups: self.payload_group_lengths.len(),
            },
        )?;
        let start: usize = self.payload_group_lengths[..position].iter().sum();
        Ok(&self.payload_operations[start..start + length])
    }

    /// Number of groups
    pub fn num_payload_groups(&self) -> usize {
        self.payload_group_lengths.len()
    }

    /// All matched nodes in group order
    pub fn payload_operations(&self) -> &[NodeId] {
        &self.payload_operations
    }
}

/// Find the first reduction pattern in `scope`
///
/// Groups: `[leading?] [fill] [reduction] [trailing?]`.
pub fn reduction_callback(graph: &Graph, scope: NodeId) -> Option<MatchCallbackResult> {
    let matchers = make_reduction_matcher();
    for node in graph.walk(scope) {
        matchers.reduction.reset_captures();
        matchers.captures.clear();
        if !matchers.reduction.match_op(graph, node) {
            continue;
        }
        debug!("reduction pattern matched at {}", graph.name(node));
        let mut result = MatchCallbackResult::default();
        result.add_potentially_empty_payload_group(matchers.leading.captured());
        result.add_payload_group(matchers.fill.captured());
        result.add_payload_group([node]);
        result.add_potentially_empty_payload_group(matchers.trailing.captured());
        return Some(result);
    }
    None
}

/// Find the first split-reduction pattern in `scope`
///
/// Groups: `[leading?] [original fill] [parallel fill] [parallel reduction]
/// [combiner reduction] [trailing?]`.
pub fn split_reduction_callback(graph: &Graph, scope: NodeId) -> Option<MatchCallbackResult> {
    let matchers = make_split_reduction_matcher();
    for node in graph.walk(scope) {
        matchers.combiner_reduction.reset_captures();
        if !matchers.combiner_reduction.match_op(graph, node) {
            continue;
        }
        debug!("split reduction pattern matched at {}", graph.name(node));
        let mut result = MatchCallbackResult::default();
        result.add_potentially_empty_payload_group(matchers.leading.captured());
        result.add_payload_group(matchers.original_fill.captured());
        result.add_payload_group(matchers.parallel_fill.captured());
        result.add_payload_group(matchers.parallel_reduction.captured());
        result.add_payload_group([node]);
        result.add_potentially_empty_payload_group(matchers.trailing.captured());
        return Some(result);
    }
    None
}
