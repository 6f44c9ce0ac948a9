//! Likelihood table — response probabilities over the full stimulus ×
//! parameter grid.
//!
//! Purpose
//! -------
//! Evaluate the psychometric function once for every stimulus level and
//! every joint parameter-grid point, and store both response probabilities
//! in a single n-dimensional array that the posterior engine reads on every
//! trial.
//!
//! Key behaviors
//! -------------
//! - [`LikelihoodTable::build`] iterates the Cartesian product of all
//!   parameter grids explicitly for each stimulus level (no broadcasting
//!   tricks), so any function honoring the [`PsychometricFunction`] contract
//!   can be used.
//! - [`LikelihoodTable::from_success`] accepts a precomputed success array
//!   for hand-built or pathological tables and applies the same checks.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shape is `[2, S, L_1, ..., L_n]`. Index 0 on the first axis is the
//!   failure probability `1 − p`; index 1 is the success probability `p`.
//! - Every stored `p` lies in `[0, 1]`; out-of-range values and NaN are
//!   rejected, never clamped.
//! - The table is immutable after construction. `reset` reuses it.
//!
//! Performance
//! -----------
//! - Construction costs `S · Π L_p` function evaluations and stores
//!   `2 · S · Π L_p` doubles.
use crate::{
    psi::{
        core::{params::ParameterSpace, stimulus::StimulusGrid, validation::validate_probability},
        errors::{PsiError, PsiResult},
    },
    psychometric::PsychometricFunction,
};
use ndarray::{ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

/// Response index for a failure ("no") response.
pub const FAILURE: usize = 0;
/// Response index for a success ("yes") response.
pub const SUCCESS: usize = 1;

/// Precomputed `P(response | stimulus, θ)` for both responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodTable {
    table: ArrayD<f64>,
}

impl LikelihoodTable {
    /// Evaluate `pf` over every stimulus level and joint grid point.
    ///
    /// # Errors
    /// - [`PsiError::MissingParameter`] if `pf` declares a required parameter
    ///   that `space` does not define.
    /// - [`PsiError::InvalidProbability`] for the first evaluation outside
    ///   `[0, 1]` (including NaN).
    pub fn build<P>(space: &ParameterSpace, grid: &StimulusGrid, pf: &P) -> PsiResult<Self>
    where
        P: PsychometricFunction + ?Sized,
    {
        for &name in pf.required_params() {
            if space.index_of(name).is_none() {
                return Err(PsiError::MissingParameter { name: name.to_string() });
            }
        }

        let dims = space.dims();
        let n_points = space.n_points();
        let n_stim = grid.len();
        let mut success = Vec::with_capacity(n_stim * n_points);
        let mut values = vec![0.0; space.len()];

        for (stim_index, &x) in grid.levels().iter().enumerate() {
            for idx in ndarray::indices(IxDyn(&dims)) {
                space.fill_values(idx.slice(), &mut values);
                let theta = space.theta_at(&values);
                success.push(validate_probability(pf.probability(x, &theta), stim_index)?);
            }
        }

        let mut data: Vec<f64> = success.iter().map(|p| 1.0 - p).collect();
        data.extend_from_slice(&success);
        let shape = table_shape(space, grid);
        let table = ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|_| {
            PsiError::LikelihoodShapeMismatch { expected: shape.clone(), actual: vec![2 * success.len()] }
        })?;
        Ok(LikelihoodTable { table })
    }

    /// Build a table from a precomputed success array of shape
    /// `[S, L_1, ..., L_n]`.
    ///
    /// # Errors
    /// - [`PsiError::LikelihoodShapeMismatch`] if `success` has the wrong shape.
    /// - [`PsiError::InvalidProbability`] for the first entry outside `[0, 1]`.
    pub fn from_success(
        space: &ParameterSpace, grid: &StimulusGrid, success: ArrayD<f64>,
    ) -> PsiResult<Self> {
        let mut expected = vec![grid.len()];
        expected.extend(space.dims());
        if success.shape() != expected.as_slice() {
            return Err(PsiError::LikelihoodShapeMismatch {
                expected,
                actual: success.shape().to_vec(),
            });
        }
        for (idx, &p) in success.indexed_iter() {
            validate_probability(p, idx[0])?;
        }
        let failure = success.mapv(|p| 1.0 - p);
        let table = ndarray::stack(Axis(0), &[failure.view(), success.view()]).map_err(|_| {
            PsiError::LikelihoodShapeMismatch { expected, actual: success.shape().to_vec() }
        })?;
        Ok(LikelihoodTable { table })
    }

    /// Likelihood over the parameter grid for one response and stimulus.
    ///
    /// Panics if `response > 1` or `stim_index >= n_stimuli()`.
    #[inline]
    pub fn slice(&self, response: usize, stim_index: usize) -> ArrayViewD<'_, f64> {
        self.table.index_axis(Axis(0), response).index_axis_move(Axis(0), stim_index)
    }

    pub fn table(&self) -> &ArrayD<f64> {
        &self.table
    }

    pub fn shape(&self) -> &[usize] {
        self.table.shape()
    }

    pub fn n_stimuli(&self) -> usize {
        self.table.shape()[1]
    }

    /// Parameter-grid dimensions `[L_1, ..., L_n]`.
    pub fn param_dims(&self) -> &[usize] {
        &self.table.shape()[2..]
    }

    /// Check that this table matches `space` and `grid`.
    ///
    /// # Errors
    /// - [`PsiError::LikelihoodShapeMismatch`] on any dimension disagreement.
    pub fn check_shape(&self, space: &ParameterSpace, grid: &StimulusGrid) -> PsiResult<()> {
        let expected = table_shape(space, grid);
        if self.table.shape() != expected.as_slice() {
            return Err(PsiError::LikelihoodShapeMismatch {
                expected,
                actual: self.table.shape().to_vec(),
            });
        }
        Ok(())
    }
}

fn table_shape(space: &ParameterSpace, grid: &StimulusGrid) -> Vec<usize> {
    let mut shape = vec![2, grid.len()];
    shape.extend(space.dims());
    shape
}
