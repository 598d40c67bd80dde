//! Shared problem data and the per-problem design view.

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::data::{Dataset, DatasetError};

/// Feature block of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Block {
    /// Features available at prediction time.
    Regular,
    /// LUPI features, only available during training.
    Privileged,
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::Regular => f.write_str("regular"),
            Block::Privileged => f.write_str("privileged"),
        }
    }
}

/// Column inside a feature block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureRef {
    pub block: Block,
    pub index: usize,
}

impl FeatureRef {
    pub const fn regular(index: usize) -> Self {
        Self {
            block: Block::Regular,
            index,
        }
    }

    pub const fn privileged(index: usize) -> Self {
        Self {
            block: Block::Privileged,
            index,
        }
    }
}

/// A synthetic, non-informative column appended to one feature block.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeFeature {
    /// Block the probe is appended to.
    pub block: Block,
    /// Block column the probe was derived from.
    pub source: usize,
    /// Column values, length = n_samples.
    pub values: Array1<f64>,
}

// =============================================================================
// ProblemData
// =============================================================================

/// Read-only design shared by every bound problem of a fit.
///
/// Cloning is cheap: both matrices are reference counted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemData {
    regular: Arc<Array2<f64>>,
    privileged: Option<Arc<Array2<f64>>>,
}

impl ProblemData {
    pub fn new(regular: Array2<f64>, privileged: Option<Array2<f64>>) -> Self {
        Self {
            regular: Arc::new(regular),
            privileged: privileged.map(Arc::new),
        }
    }

    /// Split a dataset's columns: the last `n_privileged` become the privileged block.
    ///
    /// With `n_privileged == 0` there is no privileged block.
    pub fn from_dataset(dataset: &Dataset, n_privileged: usize) -> Result<Self, DatasetError> {
        if n_privileged == 0 {
            return Ok(Self::new(dataset.features().to_owned(), None));
        }
        let (regular, privileged) = dataset.split_privileged(n_privileged)?;
        Ok(Self::new(regular.to_owned(), Some(privileged.to_owned())))
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.regular.nrows()
    }

    #[inline]
    pub fn n_regular(&self) -> usize {
        self.regular.ncols()
    }

    #[inline]
    pub fn n_privileged(&self) -> usize {
        self.privileged.as_ref().map_or(0, |p| p.ncols())
    }

    /// Total number of dataset columns.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_regular() + self.n_privileged()
    }

    pub fn regular(&self) -> ArrayView2<'_, f64> {
        self.regular.view()
    }

    pub fn privileged(&self) -> Option<ArrayView2<'_, f64>> {
        self.privileged.as_ref().map(|p| p.view())
    }

    /// Matrix of one block.
    pub fn block(&self, block: Block) -> Option<ArrayView2<'_, f64>> {
        match block {
            Block::Regular => Some(self.regular()),
            Block::Privileged => self.privileged(),
        }
    }

    /// Map a dataset column to its block reference.
    pub fn feature_ref(&self, column: usize) -> Option<FeatureRef> {
        if column < self.n_regular() {
            Some(FeatureRef::regular(column))
        } else if column < self.n_features() {
            Some(FeatureRef::privileged(column - self.n_regular()))
        } else {
            None
        }
    }

    /// Map a block reference back to its dataset column.
    pub fn column(&self, feature: FeatureRef) -> usize {
        match feature.block {
            Block::Regular => feature.index,
            Block::Privileged => self.n_regular() + feature.index,
        }
    }

    /// Every real feature, regular block first.
    pub fn features(&self) -> impl Iterator<Item = FeatureRef> + '_ {
        (0..self.n_regular())
            .map(FeatureRef::regular)
            .chain((0..self.n_privileged()).map(FeatureRef::privileged))
    }

    /// Design seen by one problem: the shared blocks plus an optional probe column.
    pub fn design<'a>(&'a self, probe: Option<&'a ProbeFeature>) -> Design<'a> {
        let probe_for = |block: Block| {
            probe
                .filter(|p| p.block == block)
                .map(|p| p.values.view())
        };
        Design {
            regular: BlockView {
                base: self.regular(),
                probe: probe_for(Block::Regular),
            },
            privileged: self.privileged().map(|base| BlockView {
                base,
                probe: probe_for(Block::Privileged),
            }),
        }
    }
}

// =============================================================================
// Design views
// =============================================================================

/// One feature block, optionally extended by a probe column at index `base.ncols()`.
#[derive(Debug, Clone, Copy)]
pub struct BlockView<'a> {
    base: ArrayView2<'a, f64>,
    probe: Option<ArrayView1<'a, f64>>,
}

impl<'a> BlockView<'a> {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.base.nrows()
    }

    /// Columns including the probe.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.base.ncols() + usize::from(self.probe.is_some())
    }

    /// Column index of the probe, if one is appended.
    pub fn probe_index(&self) -> Option<usize> {
        self.probe.map(|_| self.base.ncols())
    }

    /// Non-zero entries `(column, value)` of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let probe = self.probe.map(|p| (self.base.ncols(), p[i]));
        self.base
            .row(i)
            .into_iter()
            .copied()
            .enumerate()
            .chain(probe)
            .filter(|(_, v)| *v != 0.0)
    }
}

/// Design matrix blocks of one bound problem.
#[derive(Debug, Clone, Copy)]
pub struct Design<'a> {
    pub regular: BlockView<'a>,
    pub privileged: Option<BlockView<'a>>,
}

impl Design<'_> {
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.regular.n_rows()
    }
}
