//! Completeness check
//!
//! A match is complete when the root and the nodes captured by its nested
//! matchers account for every tilable node in the enclosing scope.

use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashSet;

use crate::graph::{Graph, NodeId, OpKind};

use super::matcher::StructuredOpMatcher;

/// Check that `root` and the captures of `matchers` are exactly the
/// tilable nodes of `scope`
///
/// Matchers that captured nothing are ignored. An absent scope never
/// passes.
pub fn check_all_tilable_matched(
    graph: &Graph,
    scope: Option<NodeId>,
    root: NodeId,
    matchers: &[Rc<StructuredOpMatcher>],
) -> bool {
    let Some(scope) = scope else {
        debug!("all tilable ops captured: no enclosing scope");
        return false;
    };
    let num_tilable = graph.tilable_ops(scope).count();

    let mut matched: FxHashSet<NodeId> = matchers.iter().filter_map(|m| m.captured()).collect();
    matched.insert(root);

    let result = num_tilable == matched.len();
    debug!(
        "all tilable ops captured: {} tilable, {} matched: {result}",
        num_tilable,
        matched.len()
    );
    result
}

impl StructuredOpMatcher {
    /// Every tilable node in the closest enclosing `container` is the root
    /// or was captured by a matcher nested so far
    ///
    /// Only matchers registered before this call take part, so this is
    /// usually the last predicate of a pattern.
    pub fn all_tilable_ops_captured(self, container: OpKind) -> Self {
        let nested = self.nested_matchers().to_vec();
        self.with_predicate(move |op| {
            let graph = op.graph();
            let scope = graph.parent_of_kind(op.id(), container);
            check_all_tilable_matched(graph, scope, op.id(), &nested)
        })
    }
}
