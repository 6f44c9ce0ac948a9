//! Estimator snapshots — save and resume a Psi session as JSON.
//!
//! A [`PsiSnapshot`] holds everything needed to continue a run exactly where
//! it stopped: grids, likelihood table, prior, belief, options, seed, RNG
//! state, history, and the last presented stimulus. The pending trial is not
//! captured; a restored estimator must `step` (or override) before `update`.
use crate::psi::{
    core::{
        belief::Belief,
        likelihood::LikelihoodTable,
        options::PsiOptions,
        params::{Parameter, ParameterSpace},
        posterior::PosteriorEngine,
        stimulus::StimulusGrid,
    },
    errors::{PsiError, PsiResult},
    models::estimator::{PsiEstimator, TrialRecord},
};
use ndarray::ArrayD;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PsiSnapshot {
    pub space: ParameterSpace,
    pub grid: StimulusGrid,
    pub likelihood: LikelihoodTable,
    pub prior: ArrayD<f64>,
    pub belief: Belief,
    pub options: PsiOptions,
    pub seed: u64,
    pub rng: Xoshiro256PlusPlus,
    pub history: Vec<TrialRecord>,
    pub current_stimulus_index: Option<usize>,
    pub last_expected_entropy: Option<f64>,
}

impl PsiSnapshot {
    pub fn capture(psi: &PsiEstimator) -> Self {
        PsiSnapshot {
            space: psi.space.clone(),
            grid: psi.grid.clone(),
            likelihood: psi.likelihood.clone(),
            prior: psi.prior.clone(),
            belief: psi.belief.clone(),
            options: psi.options,
            seed: psi.seed,
            rng: psi.rng.clone(),
            history: psi.history.clone(),
            current_stimulus_index: psi.current_stimulus_index,
            last_expected_entropy: psi.last_expected_entropy,
        }
    }

    /// Rebuild an estimator from this snapshot.
    ///
    /// # Errors
    /// - [`PsiError::Persistence`] if the pieces disagree on shape (for
    ///   example a hand-edited file), or any validation error re-raised by
    ///   the grids and options.
    pub fn restore(self) -> PsiResult<PsiEstimator> {
        let parameters = self
            .space
            .parameters()
            .iter()
            .map(|p| {
                let fresh = Parameter::new(p.name(), p.levels().to_vec(), p.prior().to_vec())?;
                Ok(if p.is_marginalised() { fresh.marginalised() } else { fresh })
            })
            .collect::<PsiResult<Vec<_>>>()?;
        let space = ParameterSpace::new(parameters)?;
        let grid = StimulusGrid::new(self.grid.levels().to_vec())?;
        let options = PsiOptions::new(self.options.seed, self.options.entropy_epsilon)?;
        self.likelihood
            .check_shape(&space, &grid)
            .map_err(|e| PsiError::Persistence { reason: e.to_string() })?;
        let dims = space.dims();
        for (what, shape) in [("prior", self.prior.shape()), ("belief", self.belief.shape())] {
            if shape != dims.as_slice() {
                return Err(PsiError::Persistence {
                    reason: format!("{what} shape {shape:?} does not match grid {dims:?}"),
                });
            }
        }
        if let Some(index) = self.current_stimulus_index {
            grid.level(index).map_err(|e| PsiError::Persistence { reason: e.to_string() })?;
        }

        info!(seed = self.seed, trials = self.history.len(), "psi estimator restored");
        Ok(PsiEstimator {
            engine: PosteriorEngine::new(options.entropy_epsilon, space.marginalised_axes()),
            space,
            grid,
            likelihood: self.likelihood,
            prior: self.prior,
            belief: self.belief,
            options,
            seed: self.seed,
            rng: self.rng,
            pending: None,
            current_stimulus_index: self.current_stimulus_index,
            last_expected_entropy: self.last_expected_entropy,
            history: self.history,
        })
    }

    pub fn to_json(psi: &PsiEstimator) -> PsiResult<String> {
        Ok(serde_json::to_string(&Self::capture(psi))?)
    }

    pub fn from_json(json: &str) -> PsiResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write `psi` to `path` as JSON.
    pub fn save(psi: &PsiEstimator, path: impl AsRef<Path>) -> PsiResult<()> {
        fs::write(path, Self::to_json(psi)?)?;
        Ok(())
    }

    /// Read a snapshot from `path` and restore it.
    pub fn load(path: impl AsRef<Path>) -> PsiResult<PsiEstimator> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)?.restore()
    }
}

impl PsiEstimator {
    /// Capture a [`PsiSnapshot`] of this estimator.
    pub fn snapshot(&self) -> PsiSnapshot {
        PsiSnapshot::capture(self)
    }
}
