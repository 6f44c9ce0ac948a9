//! Errors for the Psi adaptive estimator (configuration checks, trial
//! protocol violations, numerical failures, and snapshot persistence).
//!
//! This module defines the estimator error type, [`PsiError`], used across
//! the Python-facing API and the internal Rust core. It implements
//! `Display`/`Error` and converts to `PyErr` when the `python-bindings`
//! feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** (stimulus indices and parameter axes).
//! - Configuration errors are raised at construction time and are fatal;
//!   nothing is clamped or silently repaired.
//! - Protocol errors are raised at call time (`update` without a pending
//!   `step`, outcomes outside `{0, 1}`, outcomes the model deems impossible
//!   at an overridden stimulus).
//! - Numerical degeneracy inside the posterior computation (0/0) is *not*
//!   an error; it is mapped to `+∞` expected entropy by the engine.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for estimator operations that may produce [`PsiError`].
pub type PsiResult<T> = Result<T, PsiError>;

/// Unified error type for the Psi estimator.
///
/// Covers parameter-space and stimulus-grid validation, psychometric-function
/// contract violations, trial-protocol misuse, and persistence failures.
#[derive(Debug, Clone, PartialEq)]
pub enum PsiError {
    // ---- Parameter space ----
    /// The parameter space has no parameters.
    EmptyParameterSpace,

    /// Parameter names must be non-empty.
    EmptyParameterName,

    /// Two parameters share the same name.
    DuplicateParameter { name: String },

    /// A parameter has no grid levels.
    EmptyLevels { name: String },

    /// Grid and prior lengths differ.
    PriorLengthMismatch { name: String, levels: usize, prior: usize },

    /// A grid level is NaN/±inf.
    NonFiniteLevel { name: String, index: usize, value: f64 },

    /// A prior weight is negative or non-finite.
    InvalidPriorWeight { name: String, index: usize, value: f64 },

    /// A prior has zero total mass.
    ZeroPriorMass { name: String },

    /// A marginalisation flag names a parameter that does not exist.
    UnknownParameter { name: String },

    /// Every parameter is flagged for marginalisation.
    AllParametersMarginalised,

    // ---- Stimulus grid ----
    /// The stimulus grid is empty.
    EmptyStimulusGrid,

    /// A stimulus level is NaN/±inf.
    NonFiniteStimulus { index: usize, value: f64 },

    /// Requested stimulus index is outside the grid.
    StimulusIndexOutOfRange { index: usize, len: usize },

    /// A requested stimulus level (override) is NaN/±inf.
    InvalidStimulusLevel { value: f64 },

    // ---- Psychometric function / likelihood ----
    /// The psychometric function needs a parameter the space does not define.
    MissingParameter { name: String },

    /// The psychometric function returned a value outside [0, 1] (or NaN).
    InvalidProbability { stim_index: usize, value: f64 },

    /// A precomputed table does not match the expected shape.
    LikelihoodShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    /// A simulated observer's function returned a value outside [0, 1].
    InvalidObserverProbability { level: f64, value: f64 },

    /// A fixed guess or lapse rate is outside [0, 1], or their sum exceeds 1.
    InvalidResponseRate { name: &'static str, value: f64 },

    // ---- Options ----
    /// The entropy epsilon must be finite and > 0.
    InvalidEntropyEpsilon { value: f64 },

    /// The tie-break tolerance ratio must be finite and >= 0.
    InvalidToleranceRatio { value: f64 },

    // ---- Trial protocol ----
    /// `update` was called without a pending `step` result.
    NoPendingTrial,

    /// Trial outcomes must be 0 (failure) or 1 (success).
    InvalidOutcome { outcome: i64 },

    /// The observed outcome has zero predicted probability at the pending
    /// stimulus, so no posterior exists for it.
    ImpossibleOutcome { stim_index: usize, outcome: u8 },

    // ---- Numerical ----
    /// The belief has zero or non-finite total mass.
    DegenerateBelief { mass: f64 },

    /// Every candidate stimulus has infinite expected entropy.
    NoSelectableStimulus,

    // ---- Persistence ----
    /// Snapshot could not be written, read, or decoded.
    Persistence { reason: String },
}

impl std::error::Error for PsiError {}

impl std::fmt::Display for PsiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Parameter space ----
            PsiError::EmptyParameterSpace => {
                write!(f, "Parameter space must contain at least one parameter.")
            }
            PsiError::EmptyParameterName => {
                write!(f, "Parameter names must be non-empty.")
            }
            PsiError::DuplicateParameter { name } => {
                write!(f, "Parameter '{name}' is defined more than once.")
            }
            PsiError::EmptyLevels { name } => {
                write!(f, "Parameter '{name}' must have at least one grid level.")
            }
            PsiError::PriorLengthMismatch { name, levels, prior } => {
                write!(
                    f,
                    "Parameter '{name}' has {levels} levels but a prior of length {prior}; lengths must match."
                )
            }
            PsiError::NonFiniteLevel { name, index, value } => {
                write!(f, "Parameter '{name}' level at index {index} is non-finite: {value}")
            }
            PsiError::InvalidPriorWeight { name, index, value } => {
                write!(
                    f,
                    "Parameter '{name}' prior weight at index {index} must be finite and >= 0; got {value}"
                )
            }
            PsiError::ZeroPriorMass { name } => {
                write!(f, "Parameter '{name}' prior sums to zero.")
            }
            PsiError::UnknownParameter { name } => {
                write!(f, "Unknown parameter '{name}' in marginalisation flags.")
            }
            PsiError::AllParametersMarginalised => {
                write!(f, "At least one parameter must not be marginalised.")
            }
            // ---- Stimulus grid ----
            PsiError::EmptyStimulusGrid => {
                write!(f, "Stimulus grid must contain at least one level.")
            }
            PsiError::NonFiniteStimulus { index, value } => {
                write!(f, "Stimulus level at index {index} is non-finite: {value}")
            }
            PsiError::StimulusIndexOutOfRange { index, len } => {
                write!(f, "Stimulus index {index} is out of range for a grid of {len} levels.")
            }
            PsiError::InvalidStimulusLevel { value } => {
                write!(f, "Requested stimulus level must be finite; got {value}")
            }
            // ---- Psychometric function / likelihood ----
            PsiError::MissingParameter { name } => {
                write!(f, "Psychometric function requires parameter '{name}', which is not defined.")
            }
            PsiError::InvalidProbability { stim_index, value } => {
                write!(
                    f,
                    "Psychometric function returned {value} at stimulus index {stim_index}; probabilities must lie in [0, 1]."
                )
            }
            PsiError::LikelihoodShapeMismatch { expected, actual } => {
                write!(f, "Likelihood table shape mismatch: expected {expected:?}, got {actual:?}")
            }
            PsiError::InvalidObserverProbability { level, value } => {
                write!(
                    f,
                    "Simulated observer returned {value} at stimulus level {level}; probabilities must lie in [0, 1]."
                )
            }
            PsiError::InvalidResponseRate { name, value } => {
                write!(f, "Response rate '{name}' must lie in [0, 1]; got {value}")
            }
            // ---- Options ----
            PsiError::InvalidEntropyEpsilon { value } => {
                write!(f, "Entropy epsilon must be finite and > 0; got {value}")
            }
            PsiError::InvalidToleranceRatio { value } => {
                write!(f, "Tolerance ratio must be finite and >= 0; got {value}")
            }
            // ---- Trial protocol ----
            PsiError::NoPendingTrial => {
                write!(f, "No pending trial: call step() before update().")
            }
            PsiError::InvalidOutcome { outcome } => {
                write!(f, "Trial outcome must be 0 or 1; got {outcome}")
            }
            PsiError::ImpossibleOutcome { stim_index, outcome } => {
                write!(
                    f,
                    "Outcome {outcome} has zero probability at stimulus index {stim_index}; the belief was left unchanged."
                )
            }
            // ---- Numerical ----
            PsiError::DegenerateBelief { mass } => {
                write!(f, "Belief has degenerate total mass: {mass}")
            }
            PsiError::NoSelectableStimulus => {
                write!(f, "Every stimulus level has infinite expected entropy.")
            }
            // ---- Persistence ----
            PsiError::Persistence { reason } => {
                write!(f, "Snapshot persistence failed: {reason}")
            }
        }
    }
}

/// Convert a [`PsiError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<PsiError> for PyErr {
    fn from(err: PsiError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<serde_json::Error> for PsiError {
    fn from(err: serde_json::Error) -> PsiError {
        PsiError::Persistence { reason: err.to_string() }
    }
}

impl From<std::io::Error> for PsiError {
    fn from(err: std::io::Error) -> PsiError {
        PsiError::Persistence { reason: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Verify that `Display` messages embed the offending payload so callers
    // can diagnose configuration errors without extra context.
    //
    // Given
    // -----
    // - A `PriorLengthMismatch` and an `InvalidProbability` error.
    //
    // Expect
    // ------
    // - Both rendered messages contain the parameter name / offending value.
    fn psierror_display_embeds_payload() {
        // Arrange
        let mismatch = PsiError::PriorLengthMismatch { name: "alpha".into(), levels: 3, prior: 2 };
        let bad_p = PsiError::InvalidProbability { stim_index: 4, value: 1.5 };

        // Act
        let m1 = mismatch.to_string();
        let m2 = bad_p.to_string();

        // Assert
        assert!(m1.contains("alpha") && m1.contains('3') && m1.contains('2'));
        assert!(m2.contains("1.5") && m2.contains('4'));
    }

    #[test]
    // Purpose
    // -------
    // Ensure serde_json failures are normalized into `PsiError::Persistence`.
    fn psierror_from_serde_json_maps_to_persistence() {
        let err = serde_json::from_str::<Vec<f64>>("not json").unwrap_err();
        match PsiError::from(err) {
            PsiError::Persistence { reason } => assert!(!reason.is_empty()),
            other => panic!("expected Persistence, got {other:?}"),
        }
    }
}
