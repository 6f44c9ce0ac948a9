//! Psi options — configuration for seeding and entropy evaluation.
//!
//! Purpose
//! -------
//! Collect the estimator-wide knobs that are fixed at construction time:
//! the RNG seed that makes stimulus tie-breaking reproducible, and the
//! epsilon guarding `log2(p + ε)` in the entropy computation.
//!
//! Invariants & assumptions
//! ------------------------
//! - `entropy_epsilon` is finite and strictly positive.
//! - `seed == None` means "draw a seed from system entropy once"; the drawn
//!   seed is stored on the estimator so `reset` stays reproducible.
//!
//! Conventions
//! -----------
//! - The per-step tie-break tolerance ratio is *not* an option; it is passed
//!   to each `step` call because callers legitimately vary it across trials.
use crate::psi::{core::validation::validate_entropy_epsilon, errors::PsiResult};
use serde::{Deserialize, Serialize};

/// Default epsilon added inside `log2(p + ε)`.
pub const DEFAULT_ENTROPY_EPSILON: f64 = 1e-10;

/// Estimator configuration.
///
/// Fields
/// ------
/// - `seed`: `Option<u64>`
///   Seed for the estimator-owned RNG used only for tie-breaking among
///   near-optimal stimuli.
/// - `entropy_epsilon`: `f64`
///   Guard added to every probability before taking `log2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsiOptions {
    pub seed: Option<u64>,
    pub entropy_epsilon: f64,
}

impl PsiOptions {
    /// Construct validated options.
    ///
    /// # Errors
    /// - [`PsiError::InvalidEntropyEpsilon`](crate::psi::errors::PsiError::InvalidEntropyEpsilon)
    ///   unless `entropy_epsilon` is finite and `> 0`.
    pub fn new(seed: Option<u64>, entropy_epsilon: f64) -> PsiResult<Self> {
        let entropy_epsilon = validate_entropy_epsilon(entropy_epsilon)?;
        Ok(PsiOptions { seed, entropy_epsilon })
    }

    /// Default epsilon with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        PsiOptions { seed: Some(seed), entropy_epsilon: DEFAULT_ENTROPY_EPSILON }
    }
}

impl Default for PsiOptions {
    fn default() -> Self {
        PsiOptions { seed: None, entropy_epsilon: DEFAULT_ENTROPY_EPSILON }
    }
}
