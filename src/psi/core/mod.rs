//! psi::core — grids, tables, and the per-trial numerics of the estimator.
//!
//! Purpose
//! -------
//! Hold the building blocks the estimator composes: parameter and stimulus
//! grids, the precomputed likelihood table, the belief over the parameter
//! grid, the one-step-ahead posterior engine, and the stimulus selector.
//!
//! Conventions
//! -----------
//! - Joint arrays put the response axis first (when present), then the
//!   stimulus axis, then one axis per parameter in [`ParameterSpace`] order.
//! - Nothing here owns an RNG; the selector borrows the estimator's.

pub mod belief;
pub mod likelihood;
pub mod options;
pub mod params;
pub mod posterior;
pub mod selector;
pub mod stimulus;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::belief::Belief;
pub use self::likelihood::{FAILURE, LikelihoodTable, SUCCESS};
pub use self::options::{DEFAULT_ENTROPY_EPSILON, PsiOptions};
pub use self::params::{Parameter, ParameterSpace};
pub use self::posterior::{
    PosteriorEngine, PosteriorTable, TrialSelection, entropy_bits, marginalise_axes,
};
pub use self::selector::StimulusSelector;
pub use self::stimulus::{StimulusGrid, linspace};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_psychophysics::psi::core::prelude::*;
//
// to import the main core surface in a single line.

pub mod prelude {
    pub use super::belief::Belief;
    pub use super::likelihood::LikelihoodTable;
    pub use super::options::PsiOptions;
    pub use super::params::{Parameter, ParameterSpace};
    pub use super::posterior::{PosteriorEngine, TrialSelection};
    pub use super::selector::StimulusSelector;
    pub use super::stimulus::StimulusGrid;
}
