//! Stimulus selection from expected posterior entropy.
//!
//! Purpose
//! -------
//! Choose the next stimulus index: the minimiser of expected entropy, with
//! near-ties broken uniformly at random.
//!
//! Key behaviors
//! -------------
//! - `min_E` is taken over finite entries only; `+∞` entries are never
//!   candidates.
//! - Candidates are `{ s : |E[s] − min_E| <= r · |min_E| }`. The absolute
//!   value keeps the true minimiser in the set when ε pushes `min_E` a hair
//!   below zero.
//! - Exactly one `f64` is drawn from the generator per selection, even with
//!   a single candidate, so the RNG stream depends only on the number of
//!   selections made.
use crate::psi::{
    core::validation::validate_tolerance_ratio,
    errors::{PsiError, PsiResult},
};
use ndarray::Array1;
use rand::Rng;

/// Tie-tolerant arg-min selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusSelector {
    tolerance_ratio: f64,
}

impl StimulusSelector {
    /// # Errors
    /// - [`PsiError::InvalidToleranceRatio`] unless `tolerance_ratio` is finite
    ///   and `>= 0`.
    pub fn new(tolerance_ratio: f64) -> PsiResult<Self> {
        Ok(StimulusSelector { tolerance_ratio: validate_tolerance_ratio(tolerance_ratio)? })
    }

    pub fn tolerance_ratio(&self) -> f64 {
        self.tolerance_ratio
    }

    /// Indices within tolerance of the finite minimum, ascending.
    ///
    /// # Errors
    /// - [`PsiError::NoSelectableStimulus`] if no entry is finite.
    pub fn candidates(&self, expected_entropy: &Array1<f64>) -> PsiResult<Vec<usize>> {
        let min = expected_entropy
            .iter()
            .copied()
            .filter(|e| e.is_finite())
            .fold(f64::INFINITY, f64::min);
        if !min.is_finite() {
            return Err(PsiError::NoSelectableStimulus);
        }
        let tol = self.tolerance_ratio * min.abs();
        Ok(expected_entropy
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_finite() && (**e - min).abs() <= tol)
            .map(|(i, _)| i)
            .collect())
    }

    /// Pick one candidate uniformly using a single draw from `rng`.
    ///
    /// # Errors
    /// - [`PsiError::NoSelectableStimulus`] if no entry is finite.
    pub fn select<R: Rng + ?Sized>(
        &self, expected_entropy: &Array1<f64>, rng: &mut R,
    ) -> PsiResult<usize> {
        let candidates = self.candidates(expected_entropy)?;
        let u: f64 = rng.r#gen();
        let n = candidates.len();
        let k = ((u * n as f64) as usize).min(n - 1);
        Ok(candidates[k])
    }
}
