//! Psi estimator — adaptive stimulus placement and Bayesian parameter
//! estimation for a single psychophysical observer.
//!
//! Purpose
//! -------
//! Drive the trial loop of the Psi method (Kontsevich & Tyler, 1999) with
//! the psi-marginal extension (Prins, 2013): propose the stimulus that
//! minimises expected posterior entropy over the parameters of interest,
//! then fold the observed response into the belief.
//!
//! Key behaviors
//! -------------
//! - [`PsiEstimator::new`] validates the grids, builds the likelihood table
//!   once, and initialises the belief to the joint prior.
//! - [`PsiEstimator::step`] evaluates every candidate stimulus, selects one,
//!   and caches the resulting [`TrialSelection`] as the pending trial.
//! - [`PsiEstimator::update`] installs the cached posterior for the observed
//!   response and clears the pending trial.
//! - Overrides let the caller present a stimulus of their choosing; the
//!   pending trial is retargeted (or computed without an RNG draw).
//! - [`PsiEstimator::reset`] restores the prior and re-seeds the RNG so a
//!   replayed run is bit-for-bit identical.
//!
//! Invariants & assumptions
//! ------------------------
//! - `update` is only valid after `step` or an override; a second `update`
//!   without a new `step` fails with `NoPendingTrial`.
//! - The RNG is consulted only by `step`, exactly once per call. Calling
//!   `step` repeatedly without `update` advances the stream each time.
//! - Single-owner and not thread-safe; one estimator per observer.
//!
//! Conventions
//! -----------
//! - Outcomes: `0` = failure / "no", `1` = success / "yes".
//! - [`PsiEstimator::get_estimates`] reports the posterior *mean* of each
//!   parameter; [`PsiEstimator::posterior_mode`] reports the grid point of
//!   highest joint density.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! use rust_psychophysics::prelude::*;
//!
//! let space = ParameterSpace::new(vec![
//!     Parameter::uniform("alpha", linspace(-2.0, 2.0, 21))?,
//!     Parameter::uniform("beta", linspace(0.5, 4.0, 8))?.marginalised(),
//! ])?;
//! let grid = StimulusGrid::linspace(-3.0, 3.0, 31)?;
//! let mut psi = PsiEstimator::new(space, grid, &Logistic::new(), PsiOptions::seeded(1))?;
//!
//! let x = psi.step(0.0)?;
//! psi.update(u8::from(x > 0.0))?;
//! let estimates = psi.get_estimates();
//! assert!(estimates.contains_key("alpha"));
//! # Ok::<(), rust_psychophysics::psi::PsiError>(())
//! ```
use crate::{
    psi::{
        core::{
            belief::Belief,
            likelihood::LikelihoodTable,
            options::PsiOptions,
            params::ParameterSpace,
            posterior::{PosteriorEngine, TrialSelection},
            selector::StimulusSelector,
            stimulus::StimulusGrid,
            validation::validate_outcome,
        },
        errors::{PsiError, PsiResult},
    },
    psychometric::PsychometricFunction,
};
use ndarray::ArrayD;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::{debug, info, warn};

/// One completed trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub stim_index: usize,
    pub stim_level: f64,
    pub outcome: u8,
}

/// Adaptive Psi / psi-marginal estimator.
///
/// Owns the parameter space, stimulus grid, likelihood table, joint prior,
/// current belief, seeded RNG, the pending trial (if any), and the trial
/// history.
#[derive(Debug, Clone)]
pub struct PsiEstimator {
    pub(crate) space: ParameterSpace,
    pub(crate) grid: StimulusGrid,
    pub(crate) likelihood: LikelihoodTable,
    pub(crate) prior: ArrayD<f64>,
    pub(crate) belief: Belief,
    pub(crate) engine: PosteriorEngine,
    pub(crate) options: PsiOptions,
    pub(crate) seed: u64,
    pub(crate) rng: Xoshiro256PlusPlus,
    pub(crate) pending: Option<TrialSelection>,
    pub(crate) current_stimulus_index: Option<usize>,
    pub(crate) last_expected_entropy: Option<f64>,
    pub(crate) history: Vec<TrialRecord>,
}

impl PsiEstimator {
    /// Build an estimator over `space × grid` for psychometric function `pf`.
    ///
    /// # Errors
    /// - [`PsiError::InvalidEntropyEpsilon`] for bad options.
    /// - Any likelihood-table error: [`PsiError::MissingParameter`] or
    ///   [`PsiError::InvalidProbability`].
    pub fn new<P>(
        space: ParameterSpace, grid: StimulusGrid, pf: &P, options: PsiOptions,
    ) -> PsiResult<Self>
    where
        P: PsychometricFunction + ?Sized,
    {
        let options = PsiOptions::new(options.seed, options.entropy_epsilon)?;
        let likelihood = LikelihoodTable::build(&space, &grid, pf)?;
        let seed = options.seed.unwrap_or_else(rand::random::<u64>);
        let prior = space.joint_prior();
        let engine = PosteriorEngine::new(options.entropy_epsilon, space.marginalised_axes());
        debug!(
            n_stimuli = grid.len(),
            n_points = space.n_points(),
            seed,
            "psi estimator initialised"
        );
        Ok(PsiEstimator {
            belief: Belief::from_array(prior.clone()),
            space,
            grid,
            likelihood,
            prior,
            engine,
            options,
            seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            pending: None,
            current_stimulus_index: None,
            last_expected_entropy: None,
            history: Vec::new(),
        })
    }

    /// Choose the next stimulus and return its level.
    ///
    /// Candidates within `tolerance_ratio · |min E|` of the minimum expected
    /// entropy are treated as ties and one is picked uniformly at random.
    ///
    /// # Errors
    /// - [`PsiError::InvalidToleranceRatio`] for a negative or non-finite ratio.
    /// - [`PsiError::DegenerateBelief`] if the belief has lost all mass.
    /// - [`PsiError::NoSelectableStimulus`] if every stimulus has infinite
    ///   expected entropy.
    pub fn step(&mut self, tolerance_ratio: f64) -> PsiResult<f64> {
        let selector = StimulusSelector::new(tolerance_ratio)?;
        let table = self.engine.evaluate(&mut self.belief, &self.likelihood)?;
        let index = selector.select(table.expected_entropy(), &mut self.rng)?;
        let level = self.grid.level(index)?;
        let selection = TrialSelection::new(table, index, level);
        debug!(
            trial = self.history.len(),
            stim_index = index,
            stim_level = level,
            expected_entropy = selection.expected_entropy,
            "psi step"
        );
        Ok(self.install(selection))
    }

    /// Fold the observed `outcome` (0 or 1) into the belief.
    ///
    /// # Errors
    /// - [`PsiError::InvalidOutcome`] unless `outcome` is 0 or 1; the pending
    ///   trial is kept in that case.
    /// - [`PsiError::NoPendingTrial`] if no `step` or override preceded it.
    /// - [`PsiError::ImpossibleOutcome`] if `outcome` has zero predicted
    ///   probability at the pending stimulus (reachable only through an
    ///   override). Belief and pending trial are left untouched.
    pub fn update(&mut self, outcome: u8) -> PsiResult<()> {
        let response = validate_outcome(i64::from(outcome))?;
        let pending = self.pending.as_ref().ok_or(PsiError::NoPendingTrial)?;
        let p = pending.response_probability[response];
        if !(p > 0.0 && p.is_finite()) {
            return Err(PsiError::ImpossibleOutcome { stim_index: pending.stim_index, outcome });
        }
        let selection = self.pending.take().ok_or(PsiError::NoPendingTrial)?;
        self.belief.replace(selection.posterior_for(response).to_owned());
        self.history.push(TrialRecord {
            stim_index: selection.stim_index,
            stim_level: selection.stim_level,
            outcome,
        });
        debug!(
            trial = self.history.len(),
            stim_index = selection.stim_index,
            outcome,
            "psi update"
        );
        Ok(())
    }

    /// [`PsiEstimator::update`] with a boolean response.
    pub fn update_bool(&mut self, success: bool) -> PsiResult<()> {
        self.update(u8::from(success))
    }

    /// Present the stimulus at `index` on the next trial.
    ///
    /// Retargets the pending trial when there is one; otherwise the posterior
    /// table is computed without consuming an RNG draw.
    ///
    /// # Errors
    /// - [`PsiError::StimulusIndexOutOfRange`] if `index` is outside the grid.
    /// - [`PsiError::DegenerateBelief`] if a fresh posterior is needed and the
    ///   belief has lost all mass.
    pub fn override_stimulus_index(&mut self, index: usize) -> PsiResult<f64> {
        let level = self.grid.level(index)?;
        let selection = match self.pending.take() {
            Some(mut selection) => {
                selection.retarget(index, level);
                selection
            }
            None => {
                let table = self.engine.evaluate(&mut self.belief, &self.likelihood)?;
                TrialSelection::new(table, index, level)
            }
        };
        debug!(stim_index = index, stim_level = level, "psi stimulus override");
        Ok(self.install(selection))
    }

    /// Present the grid level nearest to `level` on the next trial.
    ///
    /// Returns the level actually used. A warning is logged when `level` is
    /// not exactly on the grid.
    ///
    /// # Errors
    /// - [`PsiError::InvalidStimulusLevel`] if `level` is NaN/±inf.
    /// - Otherwise the same as [`PsiEstimator::override_stimulus_index`].
    pub fn override_stimulus_level(&mut self, level: f64) -> PsiResult<f64> {
        let (index, exact) = self.grid.nearest(level)?;
        if !exact {
            warn!(
                requested = level,
                used = self.grid.levels()[index],
                "stimulus level not on the grid; using the nearest level"
            );
        }
        self.override_stimulus_index(index)
    }

    fn install(&mut self, selection: TrialSelection) -> f64 {
        let level = selection.stim_level;
        self.current_stimulus_index = Some(selection.stim_index);
        self.last_expected_entropy = Some(selection.expected_entropy);
        self.pending = Some(selection);
        level
    }

    /// Posterior mean of every parameter, keyed by name.
    pub fn get_estimates(&self) -> BTreeMap<String, f64> {
        self.space
            .parameters()
            .iter()
            .enumerate()
            .map(|(axis, p)| (p.name().to_string(), self.belief.mean(axis, p.levels())))
            .collect()
    }

    /// Parameter values at the grid point of highest joint density.
    pub fn posterior_mode(&self) -> BTreeMap<String, f64> {
        let mode = self.belief.mode_index();
        self.space
            .parameters()
            .iter()
            .zip(mode)
            .map(|(p, i)| (p.name().to_string(), p.levels()[i]))
            .collect()
    }

    /// Marginal posterior of the parameter called `name`.
    ///
    /// # Errors
    /// - [`PsiError::UnknownParameter`] if no parameter has that name.
    pub fn marginal(&self, name: &str) -> PsiResult<Vec<f64>> {
        let axis = self
            .space
            .index_of(name)
            .ok_or_else(|| PsiError::UnknownParameter { name: name.to_string() })?;
        let mut marginal = self.belief.marginal(axis);
        let mass: f64 = marginal.iter().sum();
        marginal.iter_mut().for_each(|p| *p /= mass);
        Ok(marginal)
    }

    /// Entropy (bits) of the current belief over the parameters of interest.
    pub fn entropy(&self) -> f64 {
        self.belief.entropy(self.options.entropy_epsilon, self.engine.marginalised_axes())
    }

    /// Return to the state right after construction.
    ///
    /// The belief is set back to the joint prior, the RNG is re-seeded with
    /// the stored seed, and pending state and history are cleared. The
    /// likelihood table is reused.
    pub fn reset(&mut self) {
        self.belief = Belief::from_array(self.prior.clone());
        self.rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        self.pending = None;
        self.current_stimulus_index = None;
        self.last_expected_entropy = None;
        self.history.clear();
        info!(seed = self.seed, "psi estimator reset");
    }

    pub fn has_pending_trial(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_trial(&self) -> Option<&TrialSelection> {
        self.pending.as_ref()
    }

    pub fn current_stimulus_index(&self) -> Option<usize> {
        self.current_stimulus_index
    }

    pub fn current_stimulus_level(&self) -> Option<f64> {
        self.current_stimulus_index.map(|i| self.grid.levels()[i])
    }

    pub fn last_expected_entropy(&self) -> Option<f64> {
        self.last_expected_entropy
    }

    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    pub fn prior(&self) -> &ArrayD<f64> {
        &self.prior
    }

    pub fn parameter_space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn stimulus_grid(&self) -> &StimulusGrid {
        &self.grid
    }

    pub fn likelihood(&self) -> &LikelihoodTable {
        &self.likelihood
    }

    pub fn options(&self) -> &PsiOptions {
        &self.options
    }

    /// Seed in effect, including one drawn from system entropy.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn history(&self) -> &[TrialRecord] {
        &self.history
    }
}

impl fmt::Display for PsiEstimator {
    /// `name: value` pairs of the posterior means in parameter order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let estimates = self.get_estimates();
        let parts: Vec<String> = self
            .space
            .names()
            .iter()
            .map(|name| format!("{name}: {:.5}", estimates.get(name).copied().unwrap_or(f64::NAN)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
