//! Subset traversal
//!
//! Walks through pass-through ops (slice extraction and the shared outputs
//! of parallel loops) to find the node that really produces or consumes a
//! value. The set of pass-through ops is closed, so both walks are plain
//! loops over [`OpKind`] rather than open-ended dispatch.

use log::debug;

use crate::graph::{Graph, NodeId, OpKind, ValueDef, ValueId};

/// Follow `value` back to its producer, looking through subset ops
///
/// Slices continue at their source; region arguments of a parallel loop
/// continue at the tied loop operand. Any other producer is returned, and
/// a region argument of any other container yields that container.
/// Terminates because data dependencies form an acyclic graph.
pub fn traverse_subsets_backwards(graph: &Graph, mut value: ValueId) -> NodeId {
    loop {
        match graph.value_def(value) {
            ValueDef::BlockArgument { owner, index } => {
                match graph.tied_operand(owner, index) {
                    Some(tied) => value = tied,
                    None => return owner,
                }
            }
            ValueDef::OpResult { node, .. } => {
                if graph.kind(node) != OpKind::ExtractSlice {
                    return node;
                }
                value = graph.operands(node)[0];
            }
        }
    }
}

/// Follow `value` forward to a consumer, looking through subset ops
///
/// Uses are scanned in insertion order and the first one decides: a shared
/// output of a parallel loop continues at the tied region argument, a
/// slice continues at its result, anything else is the terminal consumer.
/// Returns `None` when the walk reaches a value without uses.
pub fn traverse_subsets_forward_any_use(graph: &Graph, mut value: ValueId) -> Option<NodeId> {
    loop {
        let first = graph.uses(value).first()?;
        let user = first.owner;
        match graph.kind(user) {
            OpKind::ForeachThread => match graph.tied_region_arg(user, first.operand_number) {
                Some(arg) => value = arg,
                None => return Some(user),
            },
            OpKind::ExtractSlice => value = graph.results(user)[0],
            _ => {
                debug!("terminal use: {}", graph.name(user));
                return Some(user);
            }
        }
    }
}
