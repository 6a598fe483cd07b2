//! Indexing maps from loop dimensions to operand dimensions

use smallvec::SmallVec;

/// One result of an indexing map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapExpr {
    /// A loop dimension
    Dim(usize),
    /// A constant index
    Constant(i64),
    /// Any other expression (sums, strides, ...)
    Compound,
}

/// Indexing map `(d0, ..., dN-1) -> (e0, ..., eM-1)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexingMap {
    num_dims: usize,
    results: SmallVec<[MapExpr; 4]>,
}

impl IndexingMap {
    /// Create a map from its results
    pub fn new(num_dims: usize, results: impl IntoIterator<Item = MapExpr>) -> Self {
        Self {
            num_dims,
            results: results.into_iter().collect(),
        }
    }

    /// `(d0, ..., dN-1) -> (d0, ..., dN-1)`
    pub fn identity(num_dims: usize) -> Self {
        Self::new(num_dims, (0..num_dims).map(MapExpr::Dim))
    }

    /// Map selecting the given loop dimensions, in order
    pub fn projection(num_dims: usize, dims: &[usize]) -> Self {
        Self::new(num_dims, dims.iter().copied().map(MapExpr::Dim))
    }

    /// `(d0, ..., dN-1) -> (d_perm[0], ..., d_perm[N-1])`
    pub fn permutation(perm: &[usize]) -> Self {
        Self::projection(perm.len(), perm)
    }

    /// Number of loop dimensions
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Number of results
    pub fn num_results(&self) -> usize {
        self.results.len()
    }

    /// Map results
    pub fn results(&self) -> &[MapExpr] {
        &self.results
    }

    /// Every result is a distinct loop dimension
    pub fn is_projected_permutation(&self) -> bool {
        if self.results.len() > self.num_dims {
            return false;
        }
        let mut seen: SmallVec<[bool; 8]> = SmallVec::from_elem(false, self.num_dims);
        for expr in &self.results {
            match *expr {
                MapExpr::Dim(d) if d < self.num_dims && !seen[d] => seen[d] = true,
                _ => return false,
            }
        }
        true
    }

    /// Projected permutation covering every loop dimension
    pub fn is_permutation(&self) -> bool {
        self.num_dims == self.results.len() && self.is_projected_permutation()
    }
}
