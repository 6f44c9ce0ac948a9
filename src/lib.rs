//! rust_psychophysics — adaptive psychometric estimation with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the Psi / psi-marginal estimator to Python via the
//! `_rust_psychophysics` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`psi`] (estimator, grids, numerics,
//!   snapshots), [`psychometric`] (function contract and standard families),
//!   and [`simulation`] (simulated observers).
//! - Define the `Psi` `#[pyclass]` and the `#[pymodule]` initializer when
//!   the `python-bindings` feature is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - Python callables used as psychometric functions are called with the
//!   stimulus level positionally and every grid parameter as a keyword.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_psychophysics.psi`.
//! - Errors from the core are [`psi::PsiError`] values internally and become
//!   `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on the inner modules (or [`prelude`])
//!   and can ignore the PyO3 items.
//!
//! Testing notes
//! -------------
//! - Unit tests live in the inner modules; `tests/` runs full simulated
//!   sessions through the public API.

pub mod psi;
pub mod psychometric;
pub mod simulation;
pub mod utils;

/// Everyday imports for Rust callers: `use rust_psychophysics::prelude::*;`.
pub mod prelude {
    pub use crate::psi::prelude::*;
    pub use crate::psychometric::{
        CumulativeNormal, CumulativeNormalAlt, Logistic, PsychometricFunction, Theta, Weibull,
        WrappedCumulativeNormal, from_fn, try_from_fn,
    };
    pub use crate::simulation::{SimulatedObserver, SimulationOutcome, run_simulation};
}

#[cfg(feature = "python-bindings")]
use pyo3::{
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use crate::{
    psi::{
        core::{options::PsiOptions, stimulus::StimulusGrid},
        errors::PsiError,
        models::{estimator::PsiEstimator, snapshot::PsiSnapshot},
    },
    utils::{extract_f64_vec, extract_parameter_space, py_psychometric},
};

/// Psi — Python-facing wrapper for [`PsiEstimator`].
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `Psi(params, stim_levels, pf, seed=None, entropy_epsilon=1e-10)`:
/// - `params`: `dict[str, array-like | dict]`
///   Parameter grids in axis order. A dict value may carry `levels`,
///   `prior`, and `marginalise`.
/// - `stim_levels`: array-like of candidate stimulus levels.
/// - `pf`: callable `pf(x, **params) -> float` returning a probability. An
///   exception raised by `pf` while the likelihood table is built propagates
///   unchanged.
/// - `seed`: optional RNG seed for tie-breaking.
///
/// Notes
/// -----
/// - Native Rust callers should use [`PsiEstimator`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_psychophysics.psi", unsendable)]
pub struct Psi {
    inner: PsiEstimator,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Psi {
    #[new]
    #[pyo3(
        signature = (params, stim_levels, pf, seed = None, entropy_epsilon = 1e-10),
        text_signature = "(params, stim_levels, pf, /, seed=None, entropy_epsilon=1e-10)"
    )]
    pub fn new<'py>(
        py: Python<'py>, params: &Bound<'py, PyDict>, stim_levels: &Bound<'py, PyAny>,
        pf: &Bound<'py, PyAny>, seed: Option<u64>, entropy_epsilon: f64,
    ) -> PyResult<Self> {
        let space = extract_parameter_space(py, params)?;
        let grid = StimulusGrid::new(extract_f64_vec(py, stim_levels)?)?;
        let pf = py_psychometric(pf)?;
        let options = PsiOptions::new(seed, entropy_epsilon)?;
        // An exception raised inside `pf` takes precedence over the
        // resulting `InvalidProbability`.
        let inner = PsiEstimator::new(space, grid, &pf, options)
            .map_err(|err| pf.take_error().unwrap_or_else(|| err.into()))?;
        Ok(Psi { inner })
    }

    /// Select the next stimulus level.
    #[pyo3(signature = (tolerance_ratio = 0.0))]
    pub fn step(&mut self, tolerance_ratio: f64) -> PyResult<f64> {
        Ok(self.inner.step(tolerance_ratio)?)
    }

    /// Record the outcome (0 or 1, or a bool) of the pending trial.
    pub fn update(&mut self, outcome: i64) -> PyResult<()> {
        let outcome = u8::try_from(outcome)
            .ok()
            .filter(|o| *o <= 1)
            .ok_or(PsiError::InvalidOutcome { outcome })?;
        Ok(self.inner.update(outcome)?)
    }

    /// Posterior mean of every parameter.
    pub fn get_estimates(&self) -> BTreeMap<String, f64> {
        self.inner.get_estimates()
    }

    pub fn posterior_mode(&self) -> BTreeMap<String, f64> {
        self.inner.posterior_mode()
    }

    pub fn marginal(&self, name: &str) -> PyResult<Vec<f64>> {
        Ok(self.inner.marginal(name)?)
    }

    pub fn entropy(&self) -> f64 {
        self.inner.entropy()
    }

    pub fn override_stimulus_index(&mut self, index: usize) -> PyResult<f64> {
        Ok(self.inner.override_stimulus_index(index)?)
    }

    pub fn override_stimulus_level(&mut self, level: f64) -> PyResult<f64> {
        Ok(self.inner.override_stimulus_level(level)?)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    pub fn current_stimulus_index(&self) -> Option<usize> {
        self.inner.current_stimulus_index()
    }

    #[getter]
    pub fn current_stimulus_level(&self) -> Option<f64> {
        self.inner.current_stimulus_level()
    }

    #[getter]
    pub fn seed(&self) -> u64 {
        self.inner.seed()
    }

    /// Completed trials as `(stim_index, stim_level, outcome)` tuples.
    #[getter]
    pub fn history(&self) -> Vec<(usize, f64, u8)> {
        self.inner.history().iter().map(|t| (t.stim_index, t.stim_level, t.outcome)).collect()
    }

    pub fn save(&self, path: &str) -> PyResult<()> {
        Ok(PsiSnapshot::save(&self.inner, path)?)
    }

    #[staticmethod]
    pub fn load(path: &str) -> PyResult<Self> {
        Ok(Psi { inner: PsiSnapshot::load(path)? })
    }

    pub fn __str__(&self) -> String {
        self.inner.to_string()
    }

    pub fn __repr__(&self) -> String {
        format!("Psi({})", self.inner)
    }
}

/// _rust_psychophysics — PyO3 module initializer for the Python extension.
///
/// Creates the `psi` submodule, attaches it to the parent module, and
/// registers it in `sys.modules` so `rust_psychophysics.psi` imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_psychophysics<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let psi_mod = PyModule::new(py, "psi")?;
    psi_mod.add_class::<Psi>()?;
    m.add_submodule(&psi_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    py.import("sys")?.getattr("modules")?.set_item("rust_psychophysics.psi", psi_mod)?;
    Ok(())
}
