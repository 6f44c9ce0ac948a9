//! psi::models — the user-facing estimator and its persistence layer.

pub mod estimator;
pub mod snapshot;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::estimator::{PsiEstimator, TrialRecord};
pub use self::snapshot::PsiSnapshot;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_psychophysics::psi::models::prelude::*;
//
// to import the estimator surface in a single line.

pub mod prelude {
    pub use super::estimator::{PsiEstimator, TrialRecord};
    pub use super::snapshot::PsiSnapshot;
}
