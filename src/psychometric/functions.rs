//! Standard psychometric function families.
//!
//! Each family carries fixed guess (γ) and lapse (λ) rates and reads `alpha`
//! and `beta` from the grid point. A grid parameter named `guess_rate` or
//! `lapse_rate` overrides the fixed value, which lets either rate be
//! estimated (or marginalised) like any other parameter.
//!
//! ## Families
//! - [`Logistic`]: `1 / (1 + exp(−β(x − α)))`, 0.5 at `x = α`.
//! - [`Weibull`]: `1 − exp(−(x/α)^β)`, ≈ 0.632 at `x = α`.
//! - [`CumulativeNormal`]: Φ((x − α)/β).
//! - [`CumulativeNormalAlt`]: logistic with slope `π / (β√3)`, a close
//!   approximation to the cumulative normal with standard deviation β.
//! - [`WrappedCumulativeNormal`]: cumulative normal wrapped onto the circle
//!   for angular stimuli in radians (Dakin et al., 2005, Appendix B).
use crate::{
    psi::errors::{PsiError, PsiResult},
    psychometric::{PsychometricFunction, Theta},
};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

const REQUIRED: [&str; 2] = ["alpha", "beta"];

// Coefficients (highest power first) remapping β for the high-spread branch
// of the wrapped cumulative normal.
const WRAP_POLY: [f64; 6] = [-3.546, 39.131, -158.724, 309.646, -292.966, 109.1288];
const WRAP_SWITCH: f64 = 1.4;

/// Fixed guess / lapse rates applied as `γ + (1 − γ − λ)·y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseRates {
    pub guess_rate: f64,
    pub lapse_rate: f64,
}

impl ResponseRates {
    /// Validated rates: both finite, in `[0, 1]`, and `γ + λ <= 1`.
    ///
    /// # Errors
    /// - [`PsiError::InvalidResponseRate`] naming the offending rate.
    pub fn new(guess_rate: f64, lapse_rate: f64) -> PsiResult<Self> {
        for (name, value) in [("guess_rate", guess_rate), ("lapse_rate", lapse_rate)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PsiError::InvalidResponseRate { name, value });
            }
        }
        if guess_rate + lapse_rate > 1.0 {
            return Err(PsiError::InvalidResponseRate {
                name: "guess_rate + lapse_rate",
                value: guess_rate + lapse_rate,
            });
        }
        Ok(ResponseRates { guess_rate, lapse_rate })
    }

    /// Apply the rates to a core probability `y`, preferring grid values.
    #[inline]
    fn apply(&self, y: f64, theta: &Theta) -> f64 {
        let guess = theta.get("guess_rate").unwrap_or(self.guess_rate);
        let lapse = theta.get("lapse_rate").unwrap_or(self.lapse_rate);
        guess + (1.0 - guess - lapse) * y
    }
}

impl Default for ResponseRates {
    fn default() -> Self {
        ResponseRates { guess_rate: 0.0, lapse_rate: 0.0 }
    }
}

/// Read `(alpha, beta)` from a grid point; NaN when absent so the table
/// rejects the evaluation instead of guessing a value.
#[inline]
fn alpha_beta(theta: &Theta) -> (f64, f64) {
    (theta.get("alpha").unwrap_or(f64::NAN), theta.get("beta").unwrap_or(f64::NAN))
}

#[inline]
fn logistic_core(x: f64, alpha: f64, beta: f64) -> f64 {
    1.0 / (1.0 + (-beta * (x - alpha)).exp())
}

/// Normal CDF with location `mu` and scale `sigma`; NaN for an invalid scale.
#[inline]
fn normal_cdf(x: f64, mu: f64, sigma: f64) -> f64 {
    match Normal::new(mu, sigma) {
        Ok(dist) => dist.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Horner evaluation of a polynomial given highest-power-first coefficients.
#[inline]
fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

macro_rules! rate_constructors {
    ($ty:ident) => {
        impl $ty {
            /// Family with zero guess and lapse rates.
            pub fn new() -> Self {
                $ty { rates: ResponseRates::default() }
            }

            /// Family with fixed guess and lapse rates.
            ///
            /// # Errors
            /// - [`PsiError::InvalidResponseRate`] for rates outside `[0, 1]`
            ///   or summing above one.
            pub fn with_rates(guess_rate: f64, lapse_rate: f64) -> PsiResult<Self> {
                Ok($ty { rates: ResponseRates::new(guess_rate, lapse_rate)? })
            }

            pub fn rates(&self) -> ResponseRates {
                self.rates
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                $ty::new()
            }
        }
    };
}

/// Logistic psychometric function; threshold α is the 50% point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Logistic {
    rates: ResponseRates,
}

rate_constructors!(Logistic);

impl PsychometricFunction for Logistic {
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        let (alpha, beta) = alpha_beta(theta);
        self.rates.apply(logistic_core(x, alpha, beta), theta)
    }

    fn required_params(&self) -> &[&str] {
        &REQUIRED
    }
}

/// Weibull psychometric function; intended for non-negative stimuli.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weibull {
    rates: ResponseRates,
}

rate_constructors!(Weibull);

impl PsychometricFunction for Weibull {
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        let (alpha, beta) = alpha_beta(theta);
        let y = 1.0 - (-(x / alpha).powf(beta)).exp();
        self.rates.apply(y, theta)
    }

    fn required_params(&self) -> &[&str] {
        &REQUIRED
    }
}

/// Cumulative normal psychometric function (mean α, standard deviation β).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CumulativeNormal {
    rates: ResponseRates,
}

rate_constructors!(CumulativeNormal);

impl PsychometricFunction for CumulativeNormal {
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        let (alpha, beta) = alpha_beta(theta);
        self.rates.apply(normal_cdf(x, alpha, beta), theta)
    }

    fn required_params(&self) -> &[&str] {
        &REQUIRED
    }
}

/// Logistic stand-in for the cumulative normal.
///
/// β is a normal-style spread; the logistic slope used is `1 / (β·√3/π)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CumulativeNormalAlt {
    rates: ResponseRates,
}

rate_constructors!(CumulativeNormalAlt);

impl PsychometricFunction for CumulativeNormalAlt {
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        let (alpha, beta) = alpha_beta(theta);
        let slope = 1.0 / (beta * (3.0_f64.sqrt() / PI));
        self.rates.apply(logistic_core(x, alpha, slope), theta)
    }

    fn required_params(&self) -> &[&str] {
        &REQUIRED
    }
}

/// Wrapped cumulative normal for angular stimuli in radians `[-π, π]`.
///
/// For `β < 1.4` the normal with scale `β²` is wrapped by adding its mass
/// shifted by ±π; for larger β the spread is remapped through a fitted
/// polynomial and applied to `sin(x − α)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrappedCumulativeNormal {
    rates: ResponseRates,
}

rate_constructors!(WrappedCumulativeNormal);

impl WrappedCumulativeNormal {
    fn core(x: f64, alpha: f64, beta: f64) -> f64 {
        let d = x - alpha;
        if beta < WRAP_SWITCH {
            let scale = beta * beta;
            normal_cdf(d, 0.0, scale) - normal_cdf(d - PI, 0.0, scale)
                + (1.0 - normal_cdf(d + PI, 0.0, scale))
        } else {
            let remapped = polyval(&WRAP_POLY, beta);
            normal_cdf(d.sin(), 0.0, remapped * remapped)
        }
    }
}

impl PsychometricFunction for WrappedCumulativeNormal {
    fn probability(&self, x: f64, theta: &Theta) -> f64 {
        let (alpha, beta) = alpha_beta(theta);
        self.rates.apply(WrappedCumulativeNormal::core(x, alpha, beta), theta)
    }

    fn required_params(&self) -> &[&str] {
        &REQUIRED
    }
}
