//! Candidate stimulus intensities presentable on a trial.
use crate::psi::{
    core::validation::validate_stimulus_levels,
    errors::{PsiError, PsiResult},
};
use serde::{Deserialize, Serialize};

/// Ordered, non-empty grid of finite stimulus levels (length S).
///
/// Invariant: every level is finite and the grid is non-empty. Levels are
/// kept in the order supplied; they need not be sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusGrid {
    levels: Vec<f64>,
}

impl StimulusGrid {
    /// Construct a validated stimulus grid.
    ///
    /// # Errors
    /// - [`PsiError::EmptyStimulusGrid`] if `levels` is empty.
    /// - [`PsiError::NonFiniteStimulus`] for the first NaN/±inf level.
    pub fn new(levels: Vec<f64>) -> PsiResult<Self> {
        validate_stimulus_levels(&levels)?;
        Ok(StimulusGrid { levels })
    }

    /// `n` evenly spaced levels from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, n: usize) -> PsiResult<Self> {
        StimulusGrid::new(linspace(start, stop, n))
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at `index`.
    ///
    /// # Errors
    /// - [`PsiError::StimulusIndexOutOfRange`] if `index >= len()`.
    pub fn level(&self, index: usize) -> PsiResult<f64> {
        self.levels
            .get(index)
            .copied()
            .ok_or(PsiError::StimulusIndexOutOfRange { index, len: self.levels.len() })
    }

    /// Index of the level closest to `level`, and whether it matched exactly.
    ///
    /// Ties on distance resolve to the lower index.
    ///
    /// # Errors
    /// - [`PsiError::InvalidStimulusLevel`] if `level` is NaN/±inf.
    pub fn nearest(&self, level: f64) -> PsiResult<(usize, bool)> {
        if !level.is_finite() {
            return Err(PsiError::InvalidStimulusLevel { value: level });
        }
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &l) in self.levels.iter().enumerate() {
            let dist = (l - level).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        Ok((best, best_dist == 0.0))
    }
}

/// `n` evenly spaced values over `[start, stop]`, endpoints included.
///
/// Mirrors the usual `linspace` convention: `n == 1` yields `[start]`,
/// `n == 0` yields an empty vector, and the last value is exactly `stop`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}
