//! Probe features: synthetic columns that calibrate the noise floor.
//!
//! A probe is derived from a randomly chosen column of a feature block so it
//! has a realistic marginal distribution but no relation to the target:
//!
//! - `Permutation`: the column's values, shuffled
//! - `Resample`: values drawn from the column with replacement
//! - `Noise`: uniform noise over the column's range
//!
//! Probes are generated sequentially from one seeded
//! [`Xoshiro256PlusPlus`] stream, so the set of probes depends only on the
//! seed and never on how many workers solve them.

use ndarray::{Array1, ArrayView2};
use rand::SeedableRng;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::formulation::{Block, ProbeFeature};

/// How probe columns are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ProbeStrategy {
    /// Shuffle an existing column.
    #[default]
    Permutation,
    /// Resample an existing column with replacement.
    Resample,
    /// Uniform noise over an existing column's range.
    Noise,
}

/// Seeded generator of probe columns.
#[derive(Debug, Clone)]
pub struct ProbeGenerator {
    strategy: ProbeStrategy,
    rng: Xoshiro256PlusPlus,
}

impl ProbeGenerator {
    pub fn new(strategy: ProbeStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    pub fn strategy(&self) -> ProbeStrategy {
        self.strategy
    }

    /// Draw `n_probes` probes for one feature block.
    ///
    /// # Arguments
    ///
    /// * `block` - Block the probes are appended to
    /// * `matrix` - The block's columns `[n_samples, n_cols]`
    /// * `n_probes` - Number of probes
    ///
    /// Returns no probes for a block without columns.
    pub fn generate(
        &mut self,
        block: Block,
        matrix: ArrayView2<'_, f64>,
        n_probes: usize,
    ) -> Vec<ProbeFeature> {
        let (n_samples, n_cols) = matrix.dim();
        if n_cols == 0 || n_samples == 0 {
            return Vec::new();
        }

        (0..n_probes)
            .map(|_| {
                let source = self.rng.gen_range(0..n_cols);
                let column = matrix.column(source);
                let values = match self.strategy {
                    ProbeStrategy::Permutation => {
                        let mut values = column.to_vec();
                        values.shuffle(&mut self.rng);
                        Array1::from(values)
                    }
                    ProbeStrategy::Resample => {
                        Array1::from_shape_fn(n_samples, |_| column[self.rng.gen_range(0..n_samples)])
                    }
                    ProbeStrategy::Noise => {
                        let (low, high) = column
                            .iter()
                            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                                (lo.min(v), hi.max(v))
                            });
                        if low < high {
                            Array1::from_shape_fn(n_samples, |_| self.rng.gen_range(low..high))
                        } else {
                            Array1::from_elem(n_samples, low)
                        }
                    }
                };
                ProbeFeature {
                    block,
                    source,
                    values,
                }
            })
            .collect()
    }
}
