//! Validation helpers for Psi parameter grids, priors, and stimulus levels.
//!
//! Purpose
//! -------
//! Centralize the input guards that every construction path of the estimator
//! relies on, so that [`Parameter`](super::params::Parameter),
//! [`StimulusGrid`](super::stimulus::StimulusGrid), the likelihood table, and
//! the option structs report the same typed errors for the same problems.
//!
//! Key behaviors
//! -------------
//! - Check grid levels for emptiness and finiteness.
//! - Check priors for length agreement with their grid, non-negativity,
//!   finiteness, and non-zero total mass.
//! - Check psychometric-function outputs against the `[0, 1]` contract.
//! - Check scalar tuning knobs (entropy epsilon, tolerance ratio).
//!
//! Invariants & assumptions
//! ------------------------
//! - Validation never clamps or repairs input. An out-of-range probability is
//!   a contract violation of the caller-supplied function and is rejected.
//! - The first offending element determines the error payload.
//!
//! Conventions
//! -----------
//! - All functions are pure and O(n) in their input length.
//! - Errors are [`PsiError`] values; no function here panics.
//!
//! Testing notes
//! -------------
//! - Unit tests below cover each error branch and a happy path.
use crate::psi::errors::{PsiError, PsiResult};

/// Validate a parameter's grid levels and prior weights.
///
/// Returns the total prior mass on success so callers can normalize without
/// a second pass.
///
/// # Errors
/// - [`PsiError::EmptyParameterName`] if `name` is empty.
/// - [`PsiError::EmptyLevels`] if `levels` is empty.
/// - [`PsiError::PriorLengthMismatch`] if `levels.len() != prior.len()`.
/// - [`PsiError::NonFiniteLevel`] for the first NaN/±inf level.
/// - [`PsiError::InvalidPriorWeight`] for the first negative or non-finite weight.
/// - [`PsiError::ZeroPriorMass`] if the prior sums to zero.
pub fn validate_parameter(name: &str, levels: &[f64], prior: &[f64]) -> PsiResult<f64> {
    if name.is_empty() {
        return Err(PsiError::EmptyParameterName);
    }
    if levels.is_empty() {
        return Err(PsiError::EmptyLevels { name: name.to_string() });
    }
    if levels.len() != prior.len() {
        return Err(PsiError::PriorLengthMismatch {
            name: name.to_string(),
            levels: levels.len(),
            prior: prior.len(),
        });
    }
    if let Some((index, &value)) = levels.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PsiError::NonFiniteLevel { name: name.to_string(), index, value });
    }
    let mut mass = 0.0;
    for (index, &value) in prior.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(PsiError::InvalidPriorWeight { name: name.to_string(), index, value });
        }
        mass += value;
    }
    if mass <= 0.0 {
        return Err(PsiError::ZeroPriorMass { name: name.to_string() });
    }
    Ok(mass)
}

/// Validate that a stimulus grid is non-empty and finite.
///
/// # Errors
/// - [`PsiError::EmptyStimulusGrid`] if `levels` is empty.
/// - [`PsiError::NonFiniteStimulus`] for the first NaN/±inf level.
pub fn validate_stimulus_levels(levels: &[f64]) -> PsiResult<()> {
    if levels.is_empty() {
        return Err(PsiError::EmptyStimulusGrid);
    }
    match levels.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(PsiError::NonFiniteStimulus { index, value }),
        None => Ok(()),
    }
}

/// Validate a single psychometric-function output.
///
/// NaN fails the range test as well, so a function that cannot be evaluated
/// at some grid point is rejected instead of poisoning the posterior.
///
/// # Errors
/// - [`PsiError::InvalidProbability`] if `p` is not in `[0, 1]`.
#[inline]
pub fn validate_probability(p: f64, stim_index: usize) -> PsiResult<f64> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(PsiError::InvalidProbability { stim_index, value: p })
    }
}

/// Validate the entropy epsilon (`log2(p + ε)` guard).
///
/// # Errors
/// - [`PsiError::InvalidEntropyEpsilon`] unless `0 < ε < ∞`.
pub fn validate_entropy_epsilon(value: f64) -> PsiResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PsiError::InvalidEntropyEpsilon { value })
    }
}

/// Validate the tie-break tolerance ratio used by stimulus selection.
///
/// # Errors
/// - [`PsiError::InvalidToleranceRatio`] unless `0 <= r < ∞`.
pub fn validate_tolerance_ratio(value: f64) -> PsiResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PsiError::InvalidToleranceRatio { value })
    }
}

/// Validate a trial outcome and narrow it to `0` or `1`.
///
/// # Errors
/// - [`PsiError::InvalidOutcome`] for anything other than 0 or 1.
pub fn validate_outcome(outcome: i64) -> PsiResult<usize> {
    match outcome {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(PsiError::InvalidOutcome { outcome: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the error branches of each validator and one happy
    // path. How the validators are wired into constructors is covered in
    // `params`, `stimulus`, and `likelihood`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that a well-formed parameter passes and returns its prior mass.
    fn validate_parameter_returns_prior_mass() {
        let mass = validate_parameter("alpha", &[1.0, 2.0, 3.0], &[0.5, 1.0, 0.5]).unwrap();
        assert_eq!(mass, 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a length mismatch between levels and prior is a configuration error.
    //
    // Given
    // -----
    // - Three levels and a two-element prior.
    //
    // Expect
    // ------
    // - `PriorLengthMismatch { levels: 3, prior: 2 }`.
    fn validate_parameter_rejects_length_mismatch() {
        let err = validate_parameter("beta", &[1.0, 2.0, 3.0], &[1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            PsiError::PriorLengthMismatch { name: "beta".into(), levels: 3, prior: 2 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Ensure negative weights, NaN levels, empty grids, and zero-mass priors
    // are each rejected with their own variant.
    fn validate_parameter_rejects_bad_values() {
        assert!(matches!(
            validate_parameter("a", &[1.0, 2.0], &[1.0, -0.1]),
            Err(PsiError::InvalidPriorWeight { index: 1, .. })
        ));
        assert!(matches!(
            validate_parameter("a", &[f64::NAN], &[1.0]),
            Err(PsiError::NonFiniteLevel { index: 0, .. })
        ));
        assert!(matches!(validate_parameter("a", &[], &[]), Err(PsiError::EmptyLevels { .. })));
        assert!(matches!(
            validate_parameter("a", &[1.0, 2.0], &[0.0, 0.0]),
            Err(PsiError::ZeroPriorMass { .. })
        ));
        assert_eq!(validate_parameter("", &[1.0], &[1.0]), Err(PsiError::EmptyParameterName));
    }

    #[test]
    // Purpose
    // -------
    // Ensure probabilities outside [0, 1], including NaN, are rejected while
    // the closed endpoints are accepted.
    fn validate_probability_enforces_unit_interval() {
        assert_eq!(validate_probability(0.0, 0), Ok(0.0));
        assert_eq!(validate_probability(1.0, 0), Ok(1.0));
        assert!(matches!(
            validate_probability(1.0 + 1e-9, 7),
            Err(PsiError::InvalidProbability { stim_index: 7, .. })
        ));
        assert!(validate_probability(-0.1, 0).is_err());
        assert!(validate_probability(f64::NAN, 0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Cover the scalar knob validators and the outcome narrowing.
    fn scalar_validators_accept_and_reject() {
        assert!(validate_entropy_epsilon(1e-10).is_ok());
        assert!(validate_entropy_epsilon(0.0).is_err());
        assert!(validate_tolerance_ratio(0.0).is_ok());
        assert!(validate_tolerance_ratio(-1e-3).is_err());
        assert!(validate_tolerance_ratio(f64::INFINITY).is_err());
        assert_eq!(validate_outcome(1), Ok(1));
        assert_eq!(validate_outcome(2), Err(PsiError::InvalidOutcome { outcome: 2 }));
        assert!(validate_stimulus_levels(&[]).is_err());
        assert!(matches!(
            validate_stimulus_levels(&[0.0, f64::INFINITY]),
            Err(PsiError::NonFiniteStimulus { index: 1, .. })
        ));
    }
}
