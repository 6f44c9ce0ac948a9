//! simulation — simulated observers for offline validation runs.
//!
//! Purpose
//! -------
//! Stand in for a human observer: respond to presented stimuli by drawing
//! Bernoulli outcomes from a psychometric function at fixed "true"
//! parameters, and drive an estimator through a full session.
//!
//! Key behaviors
//! -------------
//! - [`SimulatedObserver`] owns its own seeded RNG, independent of the
//!   estimator's, so observer noise and stimulus tie-breaking never share a
//!   stream.
//! - [`run_simulation`] runs the `step → respond → update` loop and reports
//!   the presented stimuli, outcomes, and final posterior-mean estimates.
//!
//! Invariants & assumptions
//! ------------------------
//! - One `f64` is drawn per response; outcome is `1` when the draw is below
//!   the response probability.
use crate::{
    psi::{
        errors::{PsiError, PsiResult},
        models::estimator::PsiEstimator,
    },
    psychometric::{PsychometricFunction, Theta},
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;
use tracing::info;

/// Observer answering from a psychometric function at fixed parameters.
#[derive(Debug, Clone)]
pub struct SimulatedObserver<P> {
    pf: P,
    names: Vec<String>,
    values: Vec<f64>,
    rng: Xoshiro256PlusPlus,
}

impl<P: PsychometricFunction> SimulatedObserver<P> {
    /// Observer with true parameters `true_theta` and its own RNG seed.
    pub fn new<I, S>(pf: P, true_theta: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<f64>) =
            true_theta.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        SimulatedObserver { pf, names, values, rng: Xoshiro256PlusPlus::seed_from_u64(seed) }
    }

    /// True parameters keyed by name.
    pub fn true_theta(&self) -> BTreeMap<String, f64> {
        self.names.iter().cloned().zip(self.values.iter().copied()).collect()
    }

    /// Probability of a success response at `level`.
    pub fn probability(&self, level: f64) -> f64 {
        self.pf.probability(level, &Theta::new(&self.names, &self.values))
    }

    /// Draw one response (0 or 1) at `level`.
    ///
    /// # Errors
    /// - [`PsiError::InvalidObserverProbability`] if the function value is
    ///   outside `[0, 1]` or NaN.
    pub fn respond(&mut self, level: f64) -> PsiResult<u8> {
        let p = self.probability(level);
        if !(0.0..=1.0).contains(&p) {
            return Err(PsiError::InvalidObserverProbability { level, value: p });
        }
        let u: f64 = self.rng.r#gen();
        Ok(u8::from(u < p))
    }
}

/// Record of a simulated session.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub stimuli: Vec<f64>,
    pub outcomes: Vec<u8>,
    /// Posterior means after the last trial.
    pub estimates: BTreeMap<String, f64>,
}

/// Run `n_trials` of `step → respond → update`.
///
/// # Errors
/// Any error from [`PsiEstimator::step`], [`PsiEstimator::update`], or
/// [`SimulatedObserver::respond`].
pub fn run_simulation<P: PsychometricFunction>(
    estimator: &mut PsiEstimator, observer: &mut SimulatedObserver<P>, n_trials: usize,
    tolerance_ratio: f64,
) -> PsiResult<SimulationOutcome> {
    let mut stimuli = Vec::with_capacity(n_trials);
    let mut outcomes = Vec::with_capacity(n_trials);
    for _ in 0..n_trials {
        let level = estimator.step(tolerance_ratio)?;
        let outcome = observer.respond(level)?;
        estimator.update(outcome)?;
        stimuli.push(level);
        outcomes.push(outcome);
    }
    let estimates = estimator.get_estimates();
    info!(n_trials, estimates = %estimator, "simulated session finished");
    Ok(SimulationOutcome { stimuli, outcomes, estimates })
}
