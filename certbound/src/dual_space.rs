//! The extended dual space.
//!
//! Every finite side of every row and column gets its own nonnegative dual
//! multiplier. For a relaxation with `m` rows and `n` columns the dual system
//! reads
//!
//! ```text
//! A^T (y_lhs - y_rhs) + (y_lb - y_ub) = c,    y >= 0
//! ```
//!
//! with dual objective `lhs.y_lhs - rhs.y_rhs + lb.y_lb - ub.y_ub`. A
//! coordinate is named by [`DualCoord`]; the only place that turns a
//! coordinate into a storage offset is [`DualSpace::index`].

use certbound_math::lp::SparseColumn;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::relaxation::ExactRelaxation;

/// One coordinate of the extended dual space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DualCoord {
    /// Multiplier of row `i` at its left-hand side
    RowLhs(usize),
    /// Multiplier of row `i` at its right-hand side
    RowRhs(usize),
    /// Multiplier of column `j` at its lower bound
    ColLb(usize),
    /// Multiplier of column `j` at its upper bound
    ColUb(usize),
}

impl DualCoord {
    /// The coordinate on the opposite side of the same row or column.
    pub fn partner(self) -> Self {
        match self {
            DualCoord::RowLhs(i) => DualCoord::RowRhs(i),
            DualCoord::RowRhs(i) => DualCoord::RowLhs(i),
            DualCoord::ColLb(j) => DualCoord::ColUb(j),
            DualCoord::ColUb(j) => DualCoord::ColLb(j),
        }
    }

    /// Whether the coordinate sits on the lower side (lhs or lb).
    pub fn is_lower_side(self) -> bool {
        matches!(self, DualCoord::RowLhs(_) | DualCoord::ColLb(_))
    }

    /// Whether the coordinate belongs to a row.
    pub fn is_row(self) -> bool {
        matches!(self, DualCoord::RowLhs(_) | DualCoord::RowRhs(_))
    }

    /// The paired bound, `None` when it is infinite.
    pub fn bound(self, relax: &ExactRelaxation) -> Option<&BigRational> {
        match self {
            DualCoord::RowLhs(i) => relax.row(i).lhs.as_ref(),
            DualCoord::RowRhs(i) => relax.row(i).rhs.as_ref(),
            DualCoord::ColLb(j) => relax.column(j).lower.as_ref(),
            DualCoord::ColUb(j) => relax.column(j).upper.as_ref(),
        }
    }

    /// Whether the paired bound is finite.
    pub fn has_finite_bound(self, relax: &ExactRelaxation) -> bool {
        self.bound(relax).is_some()
    }

    /// Dual objective coefficient: `lhs`, `-rhs`, `lb` or `-ub`.
    pub fn cost(self, relax: &ExactRelaxation) -> Option<BigRational> {
        let bound = self.bound(relax)?;
        Some(if self.is_lower_side() {
            bound.clone()
        } else {
            -bound
        })
    }

    /// Column of `[A^T, -A^T, I, -I]` for this coordinate, indexed by primal column.
    pub fn column(self, relax: &ExactRelaxation) -> SparseColumn {
        match self {
            DualCoord::RowLhs(i) => relax
                .row(i)
                .coeffs
                .iter()
                .filter(|(_, a)| !a.is_zero())
                .cloned()
                .collect(),
            DualCoord::RowRhs(i) => relax
                .row(i)
                .coeffs
                .iter()
                .filter(|(_, a)| !a.is_zero())
                .map(|(j, a)| (*j, -a))
                .collect(),
            DualCoord::ColLb(j) => std::iter::once((j, BigRational::one())).collect(),
            DualCoord::ColUb(j) => std::iter::once((j, -BigRational::one())).collect(),
        }
    }
}

/// Shape of an extended dual space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualSpace {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
}

impl DualSpace {
    /// Create a space of the given shape.
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self { num_rows, num_cols }
    }

    /// The space of a relaxation's current shape.
    pub fn of(relax: &ExactRelaxation) -> Self {
        Self::new(relax.num_rows(), relax.num_cols())
    }

    /// Number of coordinates.
    pub fn dim(&self) -> usize {
        2 * (self.num_rows + self.num_cols)
    }

    /// Whether the coordinate exists in this space.
    pub fn contains(&self, coord: DualCoord) -> bool {
        match coord {
            DualCoord::RowLhs(i) | DualCoord::RowRhs(i) => i < self.num_rows,
            DualCoord::ColLb(j) | DualCoord::ColUb(j) => j < self.num_cols,
        }
    }

    /// Storage offset of a coordinate.
    ///
    /// Layout: all `RowLhs`, all `RowRhs`, all `ColLb`, all `ColUb`.
    pub fn index(&self, coord: DualCoord) -> usize {
        debug_assert!(self.contains(coord), "{coord:?} outside {self:?}");
        let (m, n) = (self.num_rows, self.num_cols);
        match coord {
            DualCoord::RowLhs(i) => i,
            DualCoord::RowRhs(i) => m + i,
            DualCoord::ColLb(j) => 2 * m + j,
            DualCoord::ColUb(j) => 2 * m + n + j,
        }
    }

    /// Coordinate stored at an offset.
    pub fn coord(&self, index: usize) -> DualCoord {
        let (m, n) = (self.num_rows, self.num_cols);
        debug_assert!(index < self.dim());
        if index < m {
            DualCoord::RowLhs(index)
        } else if index < 2 * m {
            DualCoord::RowRhs(index - m)
        } else if index < 2 * m + n {
            DualCoord::ColLb(index - 2 * m)
        } else {
            DualCoord::ColUb(index - 2 * m - n)
        }
    }

    /// All coordinates in storage order.
    pub fn coords(&self) -> impl Iterator<Item = DualCoord> + '_ {
        (0..self.dim()).map(|k| self.coord(k))
    }
}

/// A rational vector over an extended dual space.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedDual {
    space: DualSpace,
    values: Vec<BigRational>,
}

impl ExtendedDual {
    /// The zero vector.
    pub fn zeros(space: DualSpace) -> Self {
        Self {
            space,
            values: vec![BigRational::zero(); space.dim()],
        }
    }

    /// Shape of the vector.
    pub fn space(&self) -> DualSpace {
        self.space
    }

    /// Value at a coordinate; coordinates outside the space read as zero.
    pub fn get(&self, coord: DualCoord) -> BigRational {
        if self.space.contains(coord) {
            self.values[self.space.index(coord)].clone()
        } else {
            BigRational::zero()
        }
    }

    /// Value at a coordinate inside the space.
    pub fn value(&self, coord: DualCoord) -> &BigRational {
        &self.values[self.space.index(coord)]
    }

    /// Overwrite a coordinate.
    pub fn set(&mut self, coord: DualCoord, value: BigRational) {
        let k = self.space.index(coord);
        self.values[k] = value;
    }

    /// Add to a coordinate.
    pub fn add_to(&mut self, coord: DualCoord, delta: &BigRational) {
        let k = self.space.index(coord);
        self.values[k] += delta;
    }

    /// Iterate `(coordinate, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DualCoord, &BigRational)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(k, v)| (self.space.coord(k), v))
    }

    /// Iterate nonzero entries only.
    pub fn nonzeros(&self) -> impl Iterator<Item = (DualCoord, &BigRational)> + '_ {
        self.iter().filter(|(_, v)| !v.is_zero())
    }

    /// `y_lhs - y_rhs` of row `i`.
    pub fn row_net(&self, i: usize) -> BigRational {
        self.value(DualCoord::RowLhs(i)) - self.value(DualCoord::RowRhs(i))
    }

    /// `y_lb - y_ub` of column `j`.
    pub fn col_net(&self, j: usize) -> BigRational {
        self.value(DualCoord::ColLb(j)) - self.value(DualCoord::ColUb(j))
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: &BigRational) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    /// `self += factor * other`, over the coordinates of `other`.
    ///
    /// `other` may live in a smaller space (fewer rows); its coordinates must
    /// all exist in `self`.
    pub fn add_scaled(&mut self, factor: &BigRational, other: &ExtendedDual) {
        for (coord, v) in other.nonzeros() {
            let k = self.space.index(coord);
            self.values[k] += factor * v;
        }
    }

    /// Smallest entry, `None` for the empty space.
    pub fn min_entry(&self) -> Option<&BigRational> {
        self.values.iter().min()
    }

    /// Whether every entry is nonnegative.
    pub fn is_nonnegative(&self) -> bool {
        !self.values.iter().any(Signed::is_negative)
    }
}
