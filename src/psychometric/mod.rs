//! psychometric — psychometric functions consumed by the Psi estimator.
//!
//! Purpose
//! -------
//! Define the caller-facing contract for psychometric functions (stimulus
//! level + named parameters → response probability) and ship the standard
//! families used in psychophysics: logistic, Weibull, cumulative normal, the
//! logistic approximation to the cumulative normal, and the wrapped
//! cumulative normal for circular (orientation) stimuli.
//!
//! Key behaviors
//! -------------
//! - [`Theta`] is a zero-copy view of one point of the parameter grid,
//!   addressable by parameter name or axis position.
//! - [`PsychometricFunction`] is implemented by the built-in families in
//!   [`functions`]; plain closures `Fn(f64, &Theta) -> f64` are adapted with
//!   [`from_fn`], fallible ones with [`try_from_fn`].
//! - Built-ins declare the parameters they need through
//!   [`PsychometricFunction::required_params`], which the likelihood table
//!   checks once before evaluating the grid.
//!
//! Invariants & assumptions
//! ------------------------
//! - Functions are pure and stateless; the estimator may evaluate them in
//!   any order and any number of times.
//! - Outputs are expected in `[0, 1]`. Values outside that range (or NaN)
//!   are rejected by the likelihood table as configuration errors.
//!
//! Conventions
//! -----------
//! - `alpha` is the threshold / location, `beta` the slope / spread.
//! - Guess and lapse rates enter as `y ← γ + (1 − γ − λ)·y`. Fixed rates are
//!   carried on the function; a grid parameter named `guess_rate` or
//!   `lapse_rate` takes precedence when present.
pub mod functions;

use std::cell::RefCell;

pub use self::functions::{
    CumulativeNormal, CumulativeNormalAlt, Logistic, Weibull, WrappedCumulativeNormal,
};

/// Read-only view of one joint parameter-grid point.
///
/// `names[i]` labels `values[i]`; both follow the parameter-space axis order.
#[derive(Debug, Clone, Copy)]
pub struct Theta<'a> {
    names: &'a [String],
    values: &'a [f64],
}

impl<'a> Theta<'a> {
    /// Pair parameter names with values. Extra names or values beyond the
    /// shorter slice are ignored.
    pub fn new(names: &'a [String], values: &'a [f64]) -> Self {
        Theta { names, values }
    }

    /// Value of the parameter called `name`, if present.
    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().zip(self.values).find(|(n, _)| n.as_str() == name).map(|(_, &v)| v)
    }

    /// Value at axis position `i`, if present.
    #[inline]
    pub fn value(&self, i: usize) -> Option<f64> {
        if i < self.len() { self.values.get(i).copied() } else { None }
    }

    pub fn names(&self) -> &'a [String] {
        self.names
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len().min(self.names.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A psychometric function `p = f(x; θ)`.
pub trait PsychometricFunction {
    /// Probability of a "success" response at stimulus level `x` given `theta`.
    fn probability(&self, x: f64, theta: &Theta) -> f64;

    /// Parameter names this function reads from `theta`.
    fn required_params(&self) -> &[&str] {
        &[]
    }
}

/// Psychometric function backed by a closure; see [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

impl<F> PsychometricFunction for FromFn<F>
where
    F: Fn(f64, &Theta) -> f64,
{
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        (self.0)(x, theta)
    }
}

/// Wrap a plain callable as a [`PsychometricFunction`].
///
/// ```rust
/// # use rust_psychophysics::psychometric::from_fn;
/// let step = from_fn(|x, theta| {
///     if x >= theta.get("alpha").unwrap_or(0.0) { 1.0 } else { 0.0 }
/// });
/// # let _ = step;
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(f64, &Theta) -> f64,
{
    FromFn(f)
}

/// Psychometric function backed by a fallible closure; see [`try_from_fn`].
///
/// A failed evaluation yields NaN, which the likelihood table rejects. The
/// first error is kept and can be retrieved with [`TryFromFn::take_error`].
pub struct TryFromFn<F, E> {
    func: F,
    error: RefCell<Option<E>>,
}

impl<F, E> TryFromFn<F, E> {
    /// Remove and return the first error raised since the last call.
    pub fn take_error(&self) -> Option<E> {
        self.error.borrow_mut().take()
    }
}

impl<F, E> PsychometricFunction for TryFromFn<F, E>
where
    F: Fn(f64, &Theta) -> Result<f64, E>,
{
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        match (self.func)(x, theta) {
            Ok(p) => p,
            Err(err) => {
                let mut slot = self.error.borrow_mut();
                if slot.is_none() {
                    *slot = Some(err);
                }
                f64::NAN
            }
        }
    }
}

/// Wrap a fallible callable as a [`PsychometricFunction`].
pub fn try_from_fn<F, E>(f: F) -> TryFromFn<F, E>
where
    F: Fn(f64, &Theta) -> Result<f64, E>,
{
    TryFromFn { func: f, error: RefCell::new(None) }
}
