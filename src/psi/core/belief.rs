//! Belief — the estimator's joint density over the parameter grid.
use crate::psi::{
    core::{
        params::ParameterSpace,
        posterior::{entropy_bits, marginalise_axes},
    },
    errors::{PsiError, PsiResult},
};
use ndarray::{ArrayD, Axis, Dimension};
use serde::{Deserialize, Serialize};

/// Joint probability density of shape `[L_1, ..., L_n]`.
///
/// Invariant: after [`Belief::normalize`] the entries are non-negative and
/// sum to one (up to floating-point error). Updates replace the density
/// wholesale; it is never edited cell by cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    density: ArrayD<f64>,
}

impl Belief {
    /// Belief equal to the joint prior of `space`.
    pub fn from_prior(space: &ParameterSpace) -> Self {
        Belief { density: space.joint_prior() }
    }

    /// Wrap a density array as-is; call [`Belief::normalize`] before use.
    pub fn from_array(density: ArrayD<f64>) -> Self {
        Belief { density }
    }

    pub fn density(&self) -> &ArrayD<f64> {
        &self.density
    }

    pub fn shape(&self) -> &[usize] {
        self.density.shape()
    }

    /// Replace the density with `density` (same shape expected).
    pub fn replace(&mut self, density: ArrayD<f64>) {
        self.density = density;
    }

    pub fn sum(&self) -> f64 {
        self.density.sum()
    }

    /// Rescale to unit mass and return the mass before rescaling.
    ///
    /// # Errors
    /// - [`PsiError::DegenerateBelief`] if the mass is zero, negative, or
    ///   non-finite. The density is left untouched in that case.
    pub fn normalize(&mut self) -> PsiResult<f64> {
        let mass = self.density.sum();
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PsiError::DegenerateBelief { mass });
        }
        self.density.mapv_inplace(|p| p / mass);
        Ok(mass)
    }

    /// Marginal distribution along `axis` (all other axes summed out).
    ///
    /// Panics if `axis` is out of range.
    pub fn marginal(&self, axis: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.density.shape()[axis]];
        for (lane, slot) in self.density.axis_iter(Axis(axis)).zip(out.iter_mut()) {
            *slot = lane.sum();
        }
        out
    }

    /// Posterior mean of the parameter on `axis` with grid `levels`.
    pub fn mean(&self, axis: usize, levels: &[f64]) -> f64 {
        let marginal = self.marginal(axis);
        let mass: f64 = marginal.iter().sum();
        marginal.iter().zip(levels).map(|(w, l)| w * l).sum::<f64>() / mass
    }

    /// Multi-index of the highest-density grid point; ties go to the first
    /// in row-major order.
    pub fn mode_index(&self) -> Vec<usize> {
        let mut best: Option<(Vec<usize>, f64)> = None;
        for (idx, &p) in self.density.indexed_iter() {
            if best.as_ref().is_none_or(|(_, b)| p > *b) {
                best = Some((idx.slice().to_vec(), p));
            }
        }
        best.map(|(idx, _)| idx).unwrap_or_default()
    }

    /// Entropy in bits with the listed axes summed out first.
    pub fn entropy(&self, epsilon: f64, marginalised_axes: &[usize]) -> f64 {
        let reduced = marginalise_axes(self.density.view(), marginalised_axes);
        let mass = reduced.sum();
        entropy_bits(reduced.mapv(|p| p / mass).iter(), epsilon)
    }
}
