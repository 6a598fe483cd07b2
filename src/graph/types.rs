//! Core IR types: handles, op kinds, iteration-space descriptors

use std::fmt;

/// Handle to a node (operation) in a [`Graph`](super::Graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in the graph arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a value (op result or block argument)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    /// Position of the value in the graph arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Kind of operation
///
/// Category checks are capability queries on the kind rather than a type
/// hierarchy: see [`OpKind::is_structured`] and [`OpKind::is_tilable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Function-like container
    Func,
    /// Generic structured op with explicit maps and iterator kinds
    Generic,
    /// Structured op broadcasting a scalar into its init
    Fill,
    /// Tilable padding op (not structured)
    Pad,
    /// Slice extraction (pass-through)
    ExtractSlice,
    /// Parallel loop over shared outputs (pass-through)
    ForeachThread,
    /// Uninitialized tensor
    Empty,
    /// Constant value
    Constant,
}

impl OpKind {
    /// Whether nodes of this kind expose the structured-compute capability
    pub fn is_structured(self) -> bool {
        matches!(self, OpKind::Generic | OpKind::Fill)
    }

    /// Whether nodes of this kind expose the tilable capability
    pub fn is_tilable(self) -> bool {
        self.is_structured() || matches!(self, OpKind::Pad)
    }

    /// Whether nodes of this kind own a region with nested nodes
    pub fn is_container(self) -> bool {
        matches!(self, OpKind::Func | OpKind::ForeachThread)
    }

    /// Printable op name
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Func => "func.func",
            OpKind::Generic => "linalg.generic",
            OpKind::Fill => "linalg.fill",
            OpKind::Pad => "tensor.pad",
            OpKind::ExtractSlice => "tensor.extract_slice",
            OpKind::ForeachThread => "scf.foreach_thread",
            OpKind::Empty => "tensor.empty",
            OpKind::Constant => "arith.constant",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iterator kind of one loop dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorType {
    /// Independent iterations
    Parallel,
    /// Iterations folded by a combiner
    Reduction,
}

impl fmt::Display for IteratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IteratorType::Parallel => f.write_str("parallel"),
            IteratorType::Reduction => f.write_str("reduction"),
        }
    }
}

/// Static extent of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    /// Known at compile time
    Static(i64),
    /// Only known at run time
    Dynamic,
}

impl Extent {
    /// Check if the extent is dynamic
    pub fn is_dynamic(self) -> bool {
        matches!(self, Extent::Dynamic)
    }

    /// Static size, if known
    pub fn as_static(self) -> Option<i64> {
        match self {
            Extent::Static(size) => Some(size),
            Extent::Dynamic => None,
        }
    }

    /// Whether the extent has the given shape kind
    pub fn is_kind(self, kind: ShapeKind) -> bool {
        self.is_dynamic() ^ (kind == ShapeKind::Static)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Static(size) => write!(f, "{size}"),
            Extent::Dynamic => f.write_str("?"),
        }
    }
}

/// Static/dynamic classification of extents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Statically known extent
    Static,
    /// Dynamic extent
    Dynamic,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Static => f.write_str("static"),
            ShapeKind::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Element type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Signless integer of the given width
    Int(u32),
    /// Floating point of the given width
    Float(u32),
    /// Target-dependent index type
    Index,
}

impl ElementType {
    /// Bit width for integer and floating-point types
    pub fn int_or_float_bit_width(self) -> Option<u32> {
        match self {
            ElementType::Int(bits) | ElementType::Float(bits) => Some(bits),
            ElementType::Index => None,
        }
    }
}

/// Combining operation in the body of a reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinerKind {
    /// Floating-point addition
    AddF,
    /// Integer addition
    AddI,
    /// Floating-point multiplication
    MulF,
    /// Integer multiplication
    MulI,
    /// Floating-point maximum
    MaxF,
    /// Floating-point minimum
    MinF,
}
