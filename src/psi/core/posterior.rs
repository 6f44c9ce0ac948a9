//! Posterior engine — one-step-ahead posteriors and expected entropy.
//!
//! Purpose
//! -------
//! For the current belief, compute for every candidate stimulus and both
//! possible responses the posterior that would follow, the predictive
//! response probability, and the expected posterior entropy that drives
//! stimulus selection.
//!
//! Key behaviors
//! -------------
//! For each response `r` and stimulus `s`:
//! 1. Normalise the belief.
//! 2. `J = belief · L[r, s]` over the parameter grid.
//! 3. `P(r | s) = Σ J`.
//! 4. `posterior[r, s] = J / P(r | s)`.
//! 5. Sum out the marginalised axes (psi-marginal).
//! 6. `H[r, s] = −Σ p · log2(p + ε)`.
//! 7. `E[s] = Σ_r H[r, s] · P(r | s)`; NaN maps to `+∞`.
//!
//! Invariants & assumptions
//! ------------------------
//! - When `P(r | s)` is zero or non-finite the pair contributes `+∞`
//!   entropy and the stored posterior slice is left at zero; the stimulus
//!   can then never be selected, so that slice is never applied.
//! - Entropy is always measured on the *reduced* posterior (marginalised
//!   axes summed out), but the full posterior is what `update` installs.
//!
//! Performance
//! -----------
//! - Each evaluation costs `O(2 · S · Π L_p)` and allocates one full
//!   posterior table of the same size as the likelihood table.
use crate::psi::{
    core::{belief::Belief, likelihood::LikelihoodTable},
    errors::PsiResult,
};
use ndarray::{Array1, Array2, ArrayD, ArrayViewD, Axis, IxDyn};

/// Shannon entropy in bits, `−Σ p · log2(p + ε)`.
///
/// `ε` keeps `log2(0)` finite; it also biases every term slightly, which is
/// why it is configurable.
pub fn entropy_bits<'a, I>(values: I, epsilon: f64) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    -values.into_iter().map(|&p| p * (p + epsilon).log2()).sum::<f64>()
}

/// Sum `array` over every axis in `axes`.
///
/// Axes are removed from the highest index down so the remaining indices
/// stay valid. An empty `axes` returns an owned copy.
pub fn marginalise_axes(array: ArrayViewD<'_, f64>, axes: &[usize]) -> ArrayD<f64> {
    let mut sorted = axes.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    let mut out = array.to_owned();
    for axis in sorted {
        out = out.sum_axis(Axis(axis));
    }
    out
}

/// All one-step-ahead quantities for the current belief.
///
/// Fields
/// ------
/// - `posterior`: shape `[2, S, L_1, ..., L_n]`, normalised per `(r, s)`.
/// - `response_probability`: shape `[2, S]`, `P(r | s)`.
/// - `expected_entropy`: length `S`, `E[s]` with NaN already mapped to `+∞`.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorTable {
    posterior: ArrayD<f64>,
    response_probability: Array2<f64>,
    expected_entropy: Array1<f64>,
}

impl PosteriorTable {
    /// Posterior over the full parameter grid after response `r` to stimulus `s`.
    #[inline]
    pub fn posterior(&self, response: usize, stim_index: usize) -> ArrayViewD<'_, f64> {
        self.posterior.index_axis(Axis(0), response).index_axis_move(Axis(0), stim_index)
    }

    pub fn response_probability(&self) -> &Array2<f64> {
        &self.response_probability
    }

    pub fn expected_entropy(&self) -> &Array1<f64> {
        &self.expected_entropy
    }

    pub fn n_stimuli(&self) -> usize {
        self.expected_entropy.len()
    }
}

/// Pending trial: the chosen stimulus plus the posterior table it came from.
///
/// Keeping the whole table lets a manual override retarget the trial to a
/// different stimulus without recomputing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSelection {
    pub stim_index: usize,
    pub stim_level: f64,
    pub expected_entropy: f64,
    /// `[P(failure | s), P(success | s)]` at the chosen stimulus.
    pub response_probability: [f64; 2],
    pub posterior: PosteriorTable,
}

impl TrialSelection {
    /// Select `stim_index` (with level `stim_level`) from `posterior`.
    pub fn new(posterior: PosteriorTable, stim_index: usize, stim_level: f64) -> Self {
        let mut selection = TrialSelection {
            stim_index,
            stim_level,
            expected_entropy: f64::INFINITY,
            response_probability: [0.0; 2],
            posterior,
        };
        selection.retarget(stim_index, stim_level);
        selection
    }

    /// Point this selection at another stimulus of the same table.
    pub fn retarget(&mut self, stim_index: usize, stim_level: f64) {
        self.stim_index = stim_index;
        self.stim_level = stim_level;
        self.expected_entropy = self.posterior.expected_entropy[stim_index];
        self.response_probability = [
            self.posterior.response_probability[[0, stim_index]],
            self.posterior.response_probability[[1, stim_index]],
        ];
    }

    /// Posterior to install after observing `response` at the chosen stimulus.
    pub fn posterior_for(&self, response: usize) -> ArrayViewD<'_, f64> {
        self.posterior.posterior(response, self.stim_index)
    }
}

/// Stateless evaluator for the one-step-ahead posterior.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorEngine {
    entropy_epsilon: f64,
    marginalised_axes: Vec<usize>,
}

impl PosteriorEngine {
    pub fn new(entropy_epsilon: f64, marginalised_axes: Vec<usize>) -> Self {
        PosteriorEngine { entropy_epsilon, marginalised_axes }
    }

    pub fn entropy_epsilon(&self) -> f64 {
        self.entropy_epsilon
    }

    pub fn marginalised_axes(&self) -> &[usize] {
        &self.marginalised_axes
    }

    /// Compute the posterior table for `belief` against `likelihood`.
    ///
    /// The belief is normalised in place first.
    ///
    /// # Errors
    /// - [`PsiError::DegenerateBelief`](crate::psi::errors::PsiError::DegenerateBelief)
    ///   if the belief has zero or non-finite mass.
    pub fn evaluate(
        &self, belief: &mut Belief, likelihood: &LikelihoodTable,
    ) -> PsiResult<PosteriorTable> {
        belief.normalize()?;
        let prior = belief.density();
        let n_stim = likelihood.n_stimuli();

        let mut posterior = ArrayD::<f64>::zeros(IxDyn(likelihood.shape()));
        let mut response_probability = Array2::<f64>::zeros((2, n_stim));
        let mut expected_entropy = Array1::<f64>::zeros(n_stim);

        for s in 0..n_stim {
            let mut e = 0.0;
            for r in 0..2 {
                let joint = prior * &likelihood.slice(r, s);
                let p_r = joint.sum();
                response_probability[[r, s]] = p_r;

                let h = if p_r > 0.0 && p_r.is_finite() {
                    let post = joint / p_r;
                    let reduced = marginalise_axes(post.view(), &self.marginalised_axes);
                    let h = entropy_bits(reduced.iter(), self.entropy_epsilon);
                    posterior.index_axis_mut(Axis(0), r).index_axis_move(Axis(0), s).assign(&post);
                    h
                } else {
                    f64::INFINITY
                };
                e += h * p_r;
            }
            expected_entropy[s] = if e.is_nan() { f64::INFINITY } else { e };
        }

        Ok(PosteriorTable { posterior, response_probability, expected_entropy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::{
        core::{params::Parameter, params::ParameterSpace, stimulus::StimulusGrid},
        errors::PsiError,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Entropy helper, axis marginalisation, and the engine against hand
    // computations on tiny grids, including a zero-probability response.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify entropy of uniform and point-mass distributions.
    fn entropy_bits_uniform_and_point_mass() {
        let uniform = [0.25; 4];
        assert!((entropy_bits(uniform.iter(), 1e-10) - 2.0).abs() < 1e-8);
        let point = [0.0, 1.0, 0.0];
        assert!(entropy_bits(point.iter(), 1e-10).abs() < 1e-8);
    }

    #[test]
    // Purpose
    // -------
    // Verify that marginalising removes exactly the listed axes regardless
    // of their order.
    fn marginalise_axes_sums_listed_axes() {
        let a = ArrayD::from_shape_fn(IxDyn(&[2, 3, 4]), |i| (i[0] * 12 + i[1] * 4 + i[2]) as f64);
        let out = marginalise_axes(a.view(), &[0, 2]);
        assert_eq!(out.shape(), &[3]);
        // Σ over i0 ∈ {0,1}, i2 ∈ {0..3} of 12·i0 + 4·i1 + i2 = 48 + 32·i1 + 12.
        assert_eq!(out.as_slice().unwrap(), &[60.0, 92.0, 124.0]);
        assert_eq!(marginalise_axes(a.view(), &[]).shape(), &[2, 3, 4]);
    }

    #[test]
    // Purpose
    // -------
    // Verify the engine on a two-point grid against a hand computation.
    //
    // Given
    // -----
    // - alpha ∈ {0, 1} with uniform prior, one stimulus with success
    //   probabilities [0.2, 0.8].
    //
    // Expect
    // ------
    // - P(success) = 0.5, posterior after success = [0.2, 0.8].
    // - E = H([0.2, 0.8]) ≈ 0.7219 bits.
    fn evaluate_matches_hand_computation() {
        let space =
            ParameterSpace::new(vec![Parameter::uniform("alpha", vec![0.0, 1.0]).unwrap()]).unwrap();
        let grid = StimulusGrid::new(vec![0.0]).unwrap();
        let lik = LikelihoodTable::from_success(&space, &grid, array![[0.2, 0.8]].into_dyn()).unwrap();
        let mut belief = Belief::from_prior(&space);
        let engine = PosteriorEngine::new(1e-10, vec![]);

        let table = engine.evaluate(&mut belief, &lik).unwrap();

        assert!((table.response_probability()[[1, 0]] - 0.5).abs() < 1e-12);
        let post = table.posterior(1, 0);
        assert!((post[[0]] - 0.2).abs() < 1e-12 && (post[[1]] - 0.8).abs() < 1e-12);
        let h = -(0.2_f64 * 0.2_f64.log2() + 0.8 * 0.8_f64.log2());
        assert!((table.expected_entropy()[0] - h).abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a stimulus with a zero-probability response gets infinite
    // expected entropy while others stay finite.
    fn zero_probability_response_maps_to_infinity() {
        let space =
            ParameterSpace::new(vec![Parameter::uniform("alpha", vec![0.0, 1.0]).unwrap()]).unwrap();
        let grid = StimulusGrid::new(vec![0.0, 1.0]).unwrap();
        let success = array![[1.0, 1.0], [0.3, 0.6]].into_dyn();
        let lik = LikelihoodTable::from_success(&space, &grid, success).unwrap();
        let mut belief = Belief::from_prior(&space);

        let table = PosteriorEngine::new(1e-10, vec![]).evaluate(&mut belief, &lik).unwrap();

        assert_eq!(table.expected_entropy()[0], f64::INFINITY);
        assert!(table.expected_entropy()[1].is_finite());
        assert_eq!(table.response_probability()[[0, 0]], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a degenerate belief is reported instead of producing NaNs.
    fn evaluate_rejects_zero_mass_belief() {
        let space =
            ParameterSpace::new(vec![Parameter::uniform("alpha", vec![0.0, 1.0]).unwrap()]).unwrap();
        let grid = StimulusGrid::new(vec![0.0]).unwrap();
        let lik = LikelihoodTable::from_success(&space, &grid, array![[0.5, 0.5]].into_dyn()).unwrap();
        let mut belief = Belief::from_array(ArrayD::zeros(IxDyn(&[2])));

        let err = PosteriorEngine::new(1e-10, vec![]).evaluate(&mut belief, &lik).unwrap_err();

        assert_eq!(err, PsiError::DegenerateBelief { mass: 0.0 });
    }

    #[test]
    // Purpose
    // -------
    // Verify retargeting a selection reads the other stimulus's quantities.
    fn trial_selection_retarget_reads_table() {
        let space =
            ParameterSpace::new(vec![Parameter::uniform("alpha", vec![0.0, 1.0]).unwrap()]).unwrap();
        let grid = StimulusGrid::new(vec![0.0, 1.0]).unwrap();
        let success = array![[0.5, 0.5], [0.3, 0.6]].into_dyn();
        let lik = LikelihoodTable::from_success(&space, &grid, success).unwrap();
        let mut belief = Belief::from_prior(&space);
        let table = PosteriorEngine::new(1e-10, vec![]).evaluate(&mut belief, &lik).unwrap();

        let mut sel = TrialSelection::new(table, 0, 0.0);
        assert!((sel.response_probability[1] - 0.5).abs() < 1e-12);
        sel.retarget(1, 1.0);

        assert_eq!(sel.stim_index, 1);
        assert!((sel.response_probability[1] - 0.45).abs() < 1e-12);
        assert!((sel.posterior_for(1).sum() - 1.0).abs() < 1e-12);
    }
}
