//! psi — adaptive Bayesian estimation of psychometric-function parameters.
//!
//! Purpose
//! -------
//! Bundle the Psi method (Kontsevich & Tyler, 1999) and its psi-marginal
//! extension (Prins, 2013) under one namespace: grids and priors, the
//! likelihood table, per-trial posterior numerics, stimulus selection, the
//! stateful estimator, snapshots, and the shared error type.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds the grid types and per-trial numerics.
//! - [`models`] exposes [`PsiEstimator`] and [`PsiSnapshot`].
//! - [`errors`] defines [`PsiError`] / [`PsiResult`], converted to `PyErr`
//!   at the Python boundary.
//!
//! Invariants & assumptions
//! ------------------------
//! - All grids are finite; priors are non-negative with positive mass.
//! - Psychometric functions return probabilities in `[0, 1]`; anything else
//!   is a configuration error raised while building the likelihood table.
//! - At least one parameter is not marginalised.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based. Joint arrays use the parameter order of the
//!   [`ParameterSpace`].
//! - The core performs no I/O except through [`PsiSnapshot`]; it logs through
//!   `tracing` and never installs a subscriber.
//!
//! Downstream usage
//! ----------------
//! 1. Build [`Parameter`]s (flag nuisance parameters with `.marginalised()`)
//!    and a [`ParameterSpace`].
//! 2. Build a [`StimulusGrid`] and pick a psychometric function.
//! 3. Construct a [`PsiEstimator`] with [`PsiOptions`].
//! 4. Loop `step` → present → `update`, then read `get_estimates`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule.
//! - Integration tests under `tests/` run full simulated sessions on the
//!   reference grid and check convergence, determinism, reset, and
//!   snapshot round-trips.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Belief, LikelihoodTable, Parameter, ParameterSpace, PosteriorEngine, PsiOptions,
    StimulusGrid, StimulusSelector, TrialSelection, linspace,
};

pub use self::errors::{PsiError, PsiResult};

pub use self::models::{PsiEstimator, PsiSnapshot, TrialRecord};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::{
        Parameter, ParameterSpace, PsiError, PsiEstimator, PsiOptions, PsiResult, PsiSnapshot,
        StimulusGrid, TrialRecord, linspace,
    };
}
