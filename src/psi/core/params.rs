//! Parameter grids and the joint parameter space of the Psi estimator.
//!
//! Purpose
//! -------
//! Represent the unknown psychophysical parameters (threshold, slope, lapse
//! rate, ...) as explicit grids with prior weights, and combine them into an
//! ordered [`ParameterSpace`] whose order fixes the axis layout of every joint
//! table used by the estimator.
//!
//! Key behaviors
//! -------------
//! - [`Parameter`] stores a name, ordered grid levels, a prior over those
//!   levels (not necessarily normalized), and a `marginalise` flag.
//! - [`ParameterSpace`] validates name uniqueness and the psi-marginal
//!   configuration, and derives the joint prior as the outer product of the
//!   normalized per-parameter priors.
//! - [`ParameterSpace::theta_at`] decodes a multi-index into a [`Theta`]
//!   view for evaluating a psychometric function at one grid point.
//!
//! Invariants & assumptions
//! ------------------------
//! - `levels.len() == prior.len() > 0`, every level is finite, every prior
//!   weight is finite and `>= 0`, and each prior has positive mass.
//! - At least one parameter is *not* marginalised; otherwise the selection
//!   entropy would be identically zero.
//! - Names are unique and non-empty.
//!
//! Conventions
//! -----------
//! - Axis `i` of every joint array corresponds to `parameters()[i]`.
//! - Priors are normalized at use time (`joint_prior`), never in place.
//!
//! Downstream usage
//! ----------------
//! - Build a space once, then hand it to `PsiEstimator::new`; the space is
//!   immutable afterwards.
use crate::{
    psi::{
        core::validation::validate_parameter,
        errors::{PsiError, PsiResult},
    },
    psychometric::Theta,
};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// One named parameter grid with its prior and marginalisation flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    levels: Vec<f64>,
    prior: Vec<f64>,
    marginalise: bool,
}

impl Parameter {
    /// Construct a validated parameter from explicit levels and prior weights.
    ///
    /// # Errors
    /// Any error from [`validate_parameter`]: empty name or grid, length
    /// mismatch, non-finite levels, invalid weights, or zero prior mass.
    pub fn new(name: impl Into<String>, levels: Vec<f64>, prior: Vec<f64>) -> PsiResult<Self> {
        let name = name.into();
        validate_parameter(&name, &levels, &prior)?;
        Ok(Parameter { name, levels, prior, marginalise: false })
    }

    /// Construct a parameter with a flat prior over `levels`.
    pub fn uniform(name: impl Into<String>, levels: Vec<f64>) -> PsiResult<Self> {
        let prior = vec![1.0; levels.len()];
        Parameter::new(name, levels, prior)
    }

    /// Flag this parameter as a nuisance parameter (psi-marginal).
    pub fn marginalised(mut self) -> Self {
        self.marginalise = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Raw prior weights as supplied (not normalized).
    pub fn prior(&self) -> &[f64] {
        &self.prior
    }

    pub fn is_marginalised(&self) -> bool {
        self.marginalise
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Prior weights rescaled to sum to one.
    pub fn normalized_prior(&self) -> Vec<f64> {
        let mass: f64 = self.prior.iter().sum();
        self.prior.iter().map(|w| w / mass).collect()
    }
}

/// Ordered collection of parameters defining the joint grid.
///
/// Fields
/// ------
/// - `parameters`: axis-ordered parameters.
/// - `names`: cached parameter names, in axis order, for [`Theta`] views.
///
/// Invariants
/// ----------
/// - Non-empty, unique names, at least one un-marginalised parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
    names: Vec<String>,
}

impl ParameterSpace {
    /// Construct a validated parameter space.
    ///
    /// # Errors
    /// - [`PsiError::EmptyParameterSpace`] if `parameters` is empty.
    /// - [`PsiError::DuplicateParameter`] if two parameters share a name.
    /// - [`PsiError::AllParametersMarginalised`] if every parameter is flagged.
    pub fn new(parameters: Vec<Parameter>) -> PsiResult<Self> {
        if parameters.is_empty() {
            return Err(PsiError::EmptyParameterSpace);
        }
        let mut names: Vec<String> = Vec::with_capacity(parameters.len());
        for param in &parameters {
            if names.iter().any(|n| n == param.name()) {
                return Err(PsiError::DuplicateParameter { name: param.name().to_string() });
            }
            names.push(param.name().to_string());
        }
        let space = ParameterSpace { parameters, names };
        space.check_marginalisation()?;
        Ok(space)
    }

    /// Flag the parameter called `name` for marginalisation.
    ///
    /// # Errors
    /// - [`PsiError::UnknownParameter`] if no parameter has that name.
    /// - [`PsiError::AllParametersMarginalised`] if this would flag every
    ///   parameter; the space is left unchanged in that case.
    pub fn marginalise(&mut self, name: &str) -> PsiResult<()> {
        let axis = self.index_of(name).ok_or_else(|| PsiError::UnknownParameter {
            name: name.to_string(),
        })?;
        let previous = self.parameters[axis].marginalise;
        self.parameters[axis].marginalise = true;
        if let Err(err) = self.check_marginalisation() {
            self.parameters[axis].marginalise = previous;
            return Err(err);
        }
        Ok(())
    }

    fn check_marginalisation(&self) -> PsiResult<()> {
        if self.parameters.iter().all(Parameter::is_marginalised) {
            return Err(PsiError::AllParametersMarginalised);
        }
        Ok(())
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Axis index of the parameter called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index_of(name).map(|i| &self.parameters[i])
    }

    /// Grid sizes `[L_1, ..., L_n]` in axis order.
    pub fn dims(&self) -> Vec<usize> {
        self.parameters.iter().map(Parameter::len).collect()
    }

    /// Number of joint grid points `Π L_p`.
    pub fn n_points(&self) -> usize {
        self.parameters.iter().map(Parameter::len).product()
    }

    /// Axes flagged for marginalisation, ascending.
    pub fn marginalised_axes(&self) -> Vec<usize> {
        self.parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_marginalised())
            .map(|(i, _)| i)
            .collect()
    }

    /// Joint prior: outer product of the normalized per-parameter priors.
    ///
    /// The result has one axis per parameter and sums to one.
    pub fn joint_prior(&self) -> ArrayD<f64> {
        let priors: Vec<Vec<f64>> = self.parameters.iter().map(Parameter::normalized_prior).collect();
        ArrayD::from_shape_fn(IxDyn(&self.dims()), |idx| {
            priors.iter().enumerate().map(|(axis, prior)| prior[idx[axis]]).product()
        })
    }

    /// Fill `values` with the grid values at a joint multi-index.
    ///
    /// `values` must have length `self.len()`.
    #[inline]
    pub fn fill_values(&self, index: &[usize], values: &mut [f64]) {
        for ((value, param), &i) in values.iter_mut().zip(&self.parameters).zip(index) {
            *value = param.levels[i];
        }
    }

    /// [`Theta`] view over caller-owned `values` for this space's names.
    #[inline]
    pub fn theta_at<'a>(&'a self, values: &'a [f64]) -> Theta<'a> {
        Theta::new(&self.names, values)
    }
}
