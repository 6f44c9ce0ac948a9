//! Integration tests for the Psi / psi-marginal estimator.
//!
//! Purpose
//! -------
//! - Validate the end-to-end session: parameter space and stimulus grid
//!   construction, likelihood table, step/update loop against a simulated
//!   observer, and final estimates.
//! - Check the properties a caller relies on: normalisation, posterior
//!   validity, determinism under a fixed seed, idempotent reset, correct
//!   marginalisation, and snapshot round-trips.
//! - Pin one reference session to recorded values.
//!
//! Coverage
//! --------
//! - `psi::models::estimator::PsiEstimator`: step, update, overrides, reset,
//!   estimates.
//! - `psi::core::posterior::PosteriorEngine`: expected entropy with a
//!   marginalised axis, checked against an independent computation.
//! - `psi::models::snapshot::PsiSnapshot`: save/load through a temp file.
//! - `simulation`: simulated observer and `run_simulation`.
//!
//! Exclusions
//! ----------
//! - Python bindings.
//! - Per-module error branches; those are covered by unit tests.
use ndarray::{ArrayD, IxDyn};
use rust_psychophysics::{
    prelude::*,
    psi::{Belief, LikelihoodTable, PosteriorEngine, StimulusSelector},
};

/// Reference configuration: 100 stimulus levels on [0, 10], alpha on
/// [2.5, 7.5] (100 levels), beta on (0, 10] (99 levels, marginalised),
/// logistic function.
fn reference_estimator(seed: u64) -> PsiEstimator {
    let beta_levels = linspace(0.0, 10.0, 100)[1..].to_vec();
    let space = ParameterSpace::new(vec![
        Parameter::uniform("alpha", linspace(2.5, 7.5, 100)).unwrap(),
        Parameter::uniform("beta", beta_levels).unwrap().marginalised(),
    ])
    .unwrap();
    let grid = StimulusGrid::linspace(0.0, 10.0, 100).unwrap();
    PsiEstimator::new(space, grid, &Logistic::new(), PsiOptions::seeded(seed)).unwrap()
}

/// Smaller configuration with the same structure for repeated runs.
fn small_estimator(seed: u64) -> PsiEstimator {
    let space = ParameterSpace::new(vec![
        Parameter::uniform("alpha", linspace(2.5, 7.5, 21)).unwrap(),
        Parameter::uniform("beta", linspace(0.25, 4.0, 16)).unwrap().marginalised(),
    ])
    .unwrap();
    let grid = StimulusGrid::linspace(0.0, 10.0, 41).unwrap();
    PsiEstimator::new(space, grid, &Logistic::new(), PsiOptions::seeded(seed)).unwrap()
}

fn observer(seed: u64) -> SimulatedObserver<Logistic> {
    SimulatedObserver::new(Logistic::new(), [("alpha", 5.0), ("beta", 1.0)], seed)
}

#[test]
// Purpose
// -------
// Verify convergence on the reference grid.
//
// Given
// -----
// - True alpha = 5, beta = 1; estimator seed 28513; 150 greedy trials.
//
// Expect
// ------
// - Posterior-mean alpha within 0.6 of 5.
// - Posterior-mean beta in a broad band around 1 (beta is a nuisance
//   parameter and is only weakly constrained by design).
fn converges_on_reference_grid() {
    let mut psi = reference_estimator(28513);
    let mut obs = observer(28513);

    let outcome = run_simulation(&mut psi, &mut obs, 150, 0.0).unwrap();

    let alpha = outcome.estimates["alpha"];
    let beta = outcome.estimates["beta"];
    assert!((alpha - 5.0).abs() < 0.6, "alpha estimate {alpha}");
    assert!(beta > 0.4 && beta < 3.5, "beta estimate {beta}");
    assert_eq!(psi.history().len(), 150);
    assert!((psi.belief().sum() - 1.0).abs() < 1e-9);
}

#[test]
// Purpose
// -------
// Pin the reference session so that any numerical change in likelihood,
// posterior, entropy, or selection is caught.
//
// Given
// -----
// - Reference grid; estimator and observer seeds 28513; 150 greedy trials
//   (tolerance ratio 0).
//
// Expect
// ------
// - First five stimuli at grid indices 49, 37, 43, 39, 42 with outcomes
//   1, 0, 1, 0, 0.
// - Posterior means alpha = 4.737885377389986 and beta = 1.7510976273989518
//   to within 1e-12.
fn reference_session_reproduces_recorded_values() {
    let mut psi = reference_estimator(28513);
    let mut obs = observer(28513);

    let outcome = run_simulation(&mut psi, &mut obs, 150, 0.0).unwrap();

    let levels = linspace(0.0, 10.0, 100);
    let first_indices: Vec<usize> = psi.history()[..5].iter().map(|t| t.stim_index).collect();
    assert_eq!(first_indices, vec![49, 37, 43, 39, 42]);
    let first_levels: Vec<f64> = first_indices.iter().map(|&i| levels[i]).collect();
    assert_eq!(&outcome.stimuli[..5], first_levels.as_slice());
    assert_eq!(outcome.outcomes[..5], [1, 0, 1, 0, 0]);

    let alpha = outcome.estimates["alpha"];
    let beta = outcome.estimates["beta"];
    assert!((alpha - 4.737885377389986).abs() < 1e-12, "alpha estimate {alpha}");
    assert!((beta - 1.7510976273989518).abs() < 1e-12, "beta estimate {beta}");
}

#[test]
// Purpose
// -------
// Verify determinism: two runs with identical seeds agree exactly.
fn identical_seeds_reproduce_the_session() {
    let mut a = small_estimator(28513);
    let mut b = small_estimator(28513);

    let ra = run_simulation(&mut a, &mut observer(7), 60, 0.05).unwrap();
    let rb = run_simulation(&mut b, &mut observer(7), 60, 0.05).unwrap();

    assert_eq!(ra, rb);
}

#[test]
// Purpose
// -------
// Verify that reset yields a session identical to a fresh estimator.
fn reset_is_idempotent() {
    let mut psi = small_estimator(99);
    let first = run_simulation(&mut psi, &mut observer(3), 40, 0.05).unwrap();

    psi.reset();
    psi.reset();
    let second = run_simulation(&mut psi, &mut observer(3), 40, 0.05).unwrap();

    assert_eq!(first, second);
}

#[test]
// Purpose
// -------
// Verify the normalisation invariant and posterior validity throughout a
// session.
//
// Expect
// ------
// - After every step the belief sums to 1.
// - Both candidate posteriors of the pending trial are non-negative and
//   sum to 1 whenever their response probability is positive.
// - Response probabilities of the pending trial sum to 1.
fn belief_and_posteriors_stay_normalised() {
    let mut psi = small_estimator(5);
    let mut obs = observer(11);

    for _ in 0..30 {
        let level = psi.step(0.0).unwrap();
        assert!((psi.belief().sum() - 1.0).abs() < 1e-9);

        let pending = psi.pending_trial().unwrap();
        let [p0, p1] = pending.response_probability;
        assert!((p0 + p1 - 1.0).abs() < 1e-9);
        for (r, p) in [(0, p0), (1, p1)] {
            if p > 0.0 {
                let post = pending.posterior_for(r);
                assert!(post.iter().all(|&v| v >= 0.0));
                assert!((post.sum() - 1.0).abs() < 1e-9);
            }
        }

        psi.update(obs.respond(level).unwrap()).unwrap();
    }
}

#[test]
// Purpose
// -------
// Verify psi-marginal entropy against an independent loop-based
// computation on a tiny grid.
//
// Given
// -----
// - alpha ∈ {1, 2, 3} (prior 1:2:1), beta ∈ {0.5, 2} (uniform, nuisance),
//   three stimuli, logistic function.
//
// Expect
// ------
// - Engine expected entropy matches `Σ_r P(r|s) · H(marginal over alpha)`
//   to 1e-12 for every stimulus.
fn marginalised_entropy_matches_direct_computation() {
    let alphas = [1.0, 2.0, 3.0];
    let alpha_prior = [0.25, 0.5, 0.25];
    let betas = [0.5, 2.0];
    let stims = [1.0, 2.0, 3.5];
    let eps = 1e-10;

    let space = ParameterSpace::new(vec![
        Parameter::new("alpha", alphas.to_vec(), vec![1.0, 2.0, 1.0]).unwrap(),
        Parameter::uniform("beta", betas.to_vec()).unwrap().marginalised(),
    ])
    .unwrap();
    let grid = StimulusGrid::new(stims.to_vec()).unwrap();
    let lik = LikelihoodTable::build(&space, &grid, &Logistic::new()).unwrap();
    let mut belief = Belief::from_prior(&space);
    let table = PosteriorEngine::new(eps, space.marginalised_axes())
        .evaluate(&mut belief, &lik)
        .unwrap();

    let logistic = |x: f64, a: f64, b: f64| 1.0 / (1.0 + (-b * (x - a)).exp());
    for (s, &x) in stims.iter().enumerate() {
        let mut expected = 0.0;
        for r in 0..2 {
            let mut joint = [[0.0; 2]; 3];
            let mut total = 0.0;
            for (i, &a) in alphas.iter().enumerate() {
                for (j, &b) in betas.iter().enumerate() {
                    let p = logistic(x, a, b);
                    let l = if r == 1 { p } else { 1.0 - p };
                    joint[i][j] = alpha_prior[i] * 0.5 * l;
                    total += joint[i][j];
                }
            }
            let h: f64 = joint
                .iter()
                .map(|row| (row[0] + row[1]) / total)
                .map(|m| -m * (m + eps).log2())
                .sum();
            expected += h * total;
        }
        let got = table.expected_entropy()[s];
        assert!((got - expected).abs() < 1e-12, "stimulus {s}: {got} vs {expected}");
    }
}

#[test]
// Purpose
// -------
// Verify boundary behaviour with a guaranteed-zero likelihood cell.
//
// Given
// -----
// - Stimulus 0 always succeeds for every grid point (failure probability
//   zero), stimuli 1 and 2 are informative.
//
// Expect
// ------
// - Stimulus 0 is never selected; no NaN reaches the belief.
// - A table where every stimulus is degenerate is unselectable.
fn zero_likelihood_stimulus_is_never_selected() {
    let space =
        ParameterSpace::new(vec![Parameter::uniform("alpha", vec![0.0, 1.0, 2.0]).unwrap()])
            .unwrap();
    let grid = StimulusGrid::new(vec![0.0, 1.0, 2.0]).unwrap();
    let success = ArrayD::from_shape_vec(
        IxDyn(&[3, 3]),
        vec![1.0, 1.0, 1.0, 0.9, 0.5, 0.1, 0.95, 0.8, 0.3],
    )
    .unwrap();
    let lik = LikelihoodTable::from_success(&space, &grid, success).unwrap();
    let engine = PosteriorEngine::new(1e-10, vec![]);
    let mut belief = Belief::from_prior(&space);

    let table = engine.evaluate(&mut belief, &lik).unwrap();
    assert_eq!(table.expected_entropy()[0], f64::INFINITY);

    let selector = StimulusSelector::new(0.5).unwrap();
    let mut rng = <rand_xoshiro::Xoshiro256PlusPlus as rand::SeedableRng>::seed_from_u64(1);
    for _ in 0..50 {
        let idx = selector.select(table.expected_entropy(), &mut rng).unwrap();
        assert_ne!(idx, 0);
    }
    assert!(belief.density().iter().all(|v| v.is_finite()));

    let all_one = ArrayD::from_elem(IxDyn(&[3, 3]), 1.0);
    let degenerate = LikelihoodTable::from_success(&space, &grid, all_one).unwrap();
    let table = engine.evaluate(&mut belief, &degenerate).unwrap();
    assert_eq!(
        selector.select(table.expected_entropy(), &mut rng),
        Err(PsiError::NoSelectableStimulus)
    );
}

#[test]
// Purpose
// -------
// Verify that a session saved to disk mid-run resumes identically.
fn snapshot_file_round_trip_resumes_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("psi.json");
    let mut psi = small_estimator(21);
    let mut obs = observer(4);
    run_simulation(&mut psi, &mut obs, 10, 0.05).unwrap();

    PsiSnapshot::save(&psi, &path).unwrap();
    let mut restored = PsiSnapshot::load(&path).unwrap();
    let mut obs_restored = obs.clone();

    let a = run_simulation(&mut psi, &mut obs, 10, 0.05).unwrap();
    let b = run_simulation(&mut restored, &mut obs_restored, 10, 0.05).unwrap();
    assert_eq!(a, b);
    assert_eq!(restored.history().len(), 20);
    assert_eq!(restored.seed(), 21);
}

#[test]
// Purpose
// -------
// Verify manual overrides through the public API.
//
// Expect
// ------
// - Overriding by level snaps to the nearest grid level and the next
//   update records that stimulus.
// - Without an intervening `step`, a second `update` is rejected.
fn overrides_drive_the_next_update() {
    let mut psi = small_estimator(8);

    let used = psi.override_stimulus_level(3.1).unwrap();
    assert_eq!(used, 3.0);
    assert_eq!(psi.current_stimulus_level(), Some(3.0));
    psi.update(0).unwrap();
    assert_eq!(psi.history()[0].stim_level, 3.0);
    assert_eq!(psi.update(1), Err(PsiError::NoPendingTrial));

    psi.step(0.0).unwrap();
    psi.override_stimulus_index(40).unwrap();
    psi.update_bool(true).unwrap();
    assert_eq!(psi.history()[1].stim_level, 10.0);
}

#[test]
// Purpose
// -------
// Verify that an estimator built from a closure and from the equivalent
// built-in produces the same likelihood table.
fn closure_and_builtin_functions_agree() {
    let space = ParameterSpace::new(vec![
        Parameter::uniform("alpha", linspace(0.0, 2.0, 5)).unwrap(),
        Parameter::uniform("beta", vec![1.0, 3.0]).unwrap(),
    ])
    .unwrap();
    let grid = StimulusGrid::linspace(-1.0, 3.0, 9).unwrap();
    let closure = from_fn(|x, t| {
        let a = t.get("alpha").unwrap_or(f64::NAN);
        let b = t.get("beta").unwrap_or(f64::NAN);
        1.0 / (1.0 + (-b * (x - a)).exp())
    });

    let a = LikelihoodTable::build(&space, &grid, &closure).unwrap();
    let b = LikelihoodTable::build(&space, &grid, &Logistic::new()).unwrap();

    assert_eq!(a, b);
}
