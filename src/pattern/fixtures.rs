//! Graph fixtures shared by the pattern tests

use crate::graph::{
    static_shape, CombinerKind, ElementType, Extent, GenericOpSpec, Graph, IndexingMap,
    IteratorType, NodeId,
};

pub(crate) const F32: ElementType = ElementType::Float(32);

const P: IteratorType = IteratorType::Parallel;
const R: IteratorType = IteratorType::Reduction;

/// Shape of the `broadcast -> reduction -> transpose` fixture
pub(crate) struct ChainOptions {
    pub leading: bool,
    pub fill: bool,
    pub trailing: bool,
    pub element_type: ElementType,
    pub combiners: Vec<CombinerKind>,
    pub dynamic_reduction: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            leading: true,
            fill: true,
            trailing: true,
            element_type: F32,
            combiners: vec![CombinerKind::AddF],
            dynamic_reduction: false,
        }
    }
}

pub(crate) struct ReductionChain {
    pub graph: Graph,
    pub func: NodeId,
    pub leading: Option<NodeId>,
    pub fill: Option<NodeId>,
    pub reduction: NodeId,
    pub trailing: Option<NodeId>,
}

/// `broadcast(8x16 -> 4x8x16) -> reduce(-1) -> transpose(4x8 -> 8x4)`
pub(crate) fn reduction_chain(opts: &ChainOptions) -> ReductionChain {
    let et = opts.element_type;
    let minor = if opts.dynamic_reduction {
        Extent::Dynamic
    } else {
        Extent::Static(16)
    };
    let full = [Extent::Static(4), Extent::Static(8), minor];

    let mut g = Graph::new();
    let func = g.add_func("func").unwrap();

    let (input, leading) = if opts.leading {
        let arg = g.add_argument(func, et, &full[1..]).unwrap();
        let init = g.add_empty(func, "broadcast_init", et, &full).unwrap();
        let spec = GenericOpSpec::new(&[P, P, P])
            .input(arg, IndexingMap::projection(3, &[1, 2]))
            .init(g.results(init)[0], IndexingMap::identity(3));
        let broadcast = g.add_generic(func, "broadcast", spec).unwrap();
        (g.results(broadcast)[0], Some(broadcast))
    } else {
        (g.add_argument(func, et, &full).unwrap(), None)
    };

    let empty = g
        .add_empty(func, "reduction_init", et, &static_shape(&[4, 8]))
        .unwrap();
    let (init, fill) = if opts.fill {
        let zero = g.add_constant(func, "zero", et, &[]).unwrap();
        let fill = g
            .add_fill(func, "fill", g.results(zero)[0], g.results(empty)[0])
            .unwrap();
        (g.results(fill)[0], Some(fill))
    } else {
        (g.results(empty)[0], None)
    };

    let spec = GenericOpSpec::new(&[P, P, R])
        .input(input, IndexingMap::identity(3))
        .reduced_init(init, IndexingMap::projection(3, &[0, 1]), &opts.combiners);
    let reduction = g.add_generic(func, "reduction", spec).unwrap();

    let trailing = if opts.trailing {
        let init = g
            .add_empty(func, "transpose_init", et, &static_shape(&[8, 4]))
            .unwrap();
        let spec = GenericOpSpec::new(&[P, P])
            .input(g.results(reduction)[0], IndexingMap::permutation(&[1, 0]))
            .init(g.results(init)[0], IndexingMap::identity(2));
        Some(g.add_generic(func, "transpose", spec).unwrap())
    } else {
        None
    };

    ReductionChain {
        graph: g,
        func,
        leading,
        fill,
        reduction,
        trailing,
    }
}

/// Shape of the split-reduction fixture
pub(crate) struct SplitOptions {
    /// Combine partial results inside a parallel loop over slices
    pub tiled: bool,
    pub trailing: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            tiled: false,
            trailing: true,
        }
    }
}

pub(crate) struct SplitReduction {
    pub graph: Graph,
    pub func: NodeId,
    pub parallel_fill: NodeId,
    pub parallel_reduction: NodeId,
    pub original_fill: NodeId,
    pub combiner_reduction: NodeId,
    pub trailing: Option<NodeId>,
}

/// `8x32x32 -> partial 8x32 -> combined 8 (-> elementwise 8)`
pub(crate) fn split_reduction(opts: &SplitOptions) -> SplitReduction {
    let mut g = Graph::new();
    let func = g.add_func("func").unwrap();
    let arg = g.add_argument(func, F32, &static_shape(&[8, 32, 32])).unwrap();
    let zero = g.add_constant(func, "zero", F32, &[]).unwrap();
    let zero = g.results(zero)[0];

    let partial_init = g
        .add_empty(func, "partial_init", F32, &static_shape(&[8, 32]))
        .unwrap();
    let parallel_fill = g
        .add_fill(func, "parallel_fill", zero, g.results(partial_init)[0])
        .unwrap();
    let spec = GenericOpSpec::new(&[P, P, R])
        .input(arg, IndexingMap::identity(3))
        .reduced_init(
            g.results(parallel_fill)[0],
            IndexingMap::projection(3, &[0, 1]),
            &[CombinerKind::AddF],
        );
    let parallel_reduction = g.add_generic(func, "parallel_reduction", spec).unwrap();
    let partial = g.results(parallel_reduction)[0];

    let final_init = g
        .add_empty(func, "final_init", F32, &static_shape(&[8]))
        .unwrap();
    let original_fill = g
        .add_fill(func, "original_fill", zero, g.results(final_init)[0])
        .unwrap();
    let filled = g.results(original_fill)[0];

    let combiner_reduction = if opts.tiled {
        let loop_op = g.add_foreach_thread(func, "loop", &[filled]).unwrap();
        let shared = g.region_args(loop_op)[0];
        let in_tile = g
            .add_extract_slice(loop_op, "in_tile", partial, &static_shape(&[4, 32]))
            .unwrap();
        let out_tile = g
            .add_extract_slice(loop_op, "out_tile", shared, &static_shape(&[4]))
            .unwrap();
        let spec = GenericOpSpec::new(&[P, R])
            .input(g.results(in_tile)[0], IndexingMap::identity(2))
            .reduced_init(
                g.results(out_tile)[0],
                IndexingMap::projection(2, &[0]),
                &[CombinerKind::AddF],
            );
        g.add_generic(loop_op, "combiner_reduction", spec).unwrap()
    } else {
        let spec = GenericOpSpec::new(&[P, R])
            .input(partial, IndexingMap::identity(2))
            .reduced_init(filled, IndexingMap::projection(2, &[0]), &[CombinerKind::AddF]);
        g.add_generic(func, "combiner_reduction", spec).unwrap()
    };

    let trailing = if opts.trailing && !opts.tiled {
        let init = g
            .add_empty(func, "trailing_init", F32, &static_shape(&[8]))
            .unwrap();
        let spec = GenericOpSpec::new(&[P])
            .input(g.results(combiner_reduction)[0], IndexingMap::identity(1))
            .init(g.results(init)[0], IndexingMap::identity(1));
        Some(g.add_generic(func, "trailing", spec).unwrap())
    } else {
        None
    };

    SplitReduction {
        graph: g,
        func,
        parallel_fill,
        parallel_reduction,
        original_fill,
        combiner_reduction,
        trailing,
    }
}
