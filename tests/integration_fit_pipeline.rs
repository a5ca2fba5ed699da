//! Integration tests for thermal parameter identification.
//!
//! Purpose
//! -------
//! - Validate the end-to-end fitting pipeline: from synthetic series,
//!   through error-functional binding and bounded minimization, to fitted
//!   parameters, state-space matrices and post-fit diagnostics.
//! - Exercise both built-in backends and the simulation-engine contract
//!   with realistic cell parameters.
//!
//! Coverage
//! --------
//! - `thermal`: closed-form response, state-space builder, observability.
//! - `estimation::driver`: `fit` with L-BFGS and Nelder–Mead, fixed
//!   parameters, convergence reporting.
//! - `estimation::error_fn`: squared error on closed-form and simulated
//!   responses.
//! - `estimation::evaluation`: post-fit MSE.
//!
//! Exclusions
//! ----------
//! - Low-level building blocks (bound maps, option validation, merge
//!   order, likelihood branches) are covered by unit tests.
//! - Real simulation engines; a closed-form stub stands in for one.
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ndarray::{Array1, Array2, ArrayView1, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use thermal_estimation::{
    estimation::{
        data::FitData,
        driver::{FitOptions, fit},
        error_fn::{ErrorFunctional, ErrorKind, SquaredError},
        evaluation::Evaluator,
        simulation::{ModelId, NamedValues, SimulationConfig, SimulationEngine, SimulationHandle},
    },
    optimization::minimizer::{
        LbfgsOptions, LineSearcher, NelderMeadOptions, OptimizerBackend, Tolerances,
    },
    thermal::{
        errors::{ThermalError, ThermalResult},
        merge::FixedParams,
        params::{ParamName, TargetParams},
        response::target_response,
        state_space::{OutputMode, StateSpace},
        synthetic::{NoiseSpec, target_response_noisy},
    },
};

/// Cell parameters used to generate every synthetic series.
const P0: TargetParams = TargetParams::new(2288.8, 40.69, 0.0562, 0.2915, 0.0954);

/// Purpose
/// -------
/// Build `n` one-second samples of inputs that excite both time constants.
///
/// Returns
/// -------
/// - `t = 0, 1, …, n − 1`.
/// - `u[:, 0]`: ambient temperature, a 120 s sinusoid around 25 °C plus a
///   3 °C step every 200 s.
/// - `u[:, 1]`: generated heat, a square wave cycling through
///   (5, 0, 2, 0, 8, 0) W every 75 s.
fn excitation(n: usize) -> (Array1<f64>, Array2<f64>) {
    let levels = [5.0, 0.0, 2.0, 0.0, 8.0, 0.0];
    let t = Array1::range(0.0, n as f64, 1.0);
    let u = Array2::from_shape_fn((n, 2), |(k, j)| match j {
        0 => {
            let step = if (k / 200) % 2 == 1 { 3.0 } else { 0.0 };
            25.0 + 2.0 * (2.0 * std::f64::consts::PI * k as f64 / 120.0).sin() + step
        }
        _ => levels[(k / 75) % levels.len()],
    });
    (t, u)
}

/// Purpose
/// -------
/// Noise-free synthetic data from [`P0`] for the given output mode, with
/// both states starting at 25 °C.
fn synthetic(n: usize, mode: OutputMode) -> FitData {
    let (t, u) = excitation(n);
    let x0 = Array1::from_elem(2, 25.0);
    let y = target_response(&P0, mode, u.view(), t.view(), x0.view())
        .expect("response of valid parameters should succeed")
        .outputs;
    FitData::new(t, u, y, x0).expect("synthetic data should be valid")
}

fn assert_within(fitted: &TargetParams, truth: &TargetParams, rel: f64) {
    for name in ParamName::ALL {
        let (f, t) = (fitted.get(name), truth.get(name));
        assert!(((f - t) / t).abs() < rel, "{name}: fitted {f}, true {t}");
    }
}

/// Simulation engine backed by the closed-form response.
///
/// Like a real engine it reports rows after the initial condition only, so
/// its output is one row shorter than the loaded series.
#[derive(Default)]
struct ClosedFormEngine {
    loaded: Mutex<Vec<(Array1<f64>, Array2<f64>)>>,
    evaluations: AtomicUsize,
}

impl SimulationEngine for ClosedFormEngine {
    fn load_model(
        &self, _model: &ModelId, _time_step: f64, _end_time: f64, t: ArrayView1<'_, f64>,
        power: ArrayView1<'_, f64>, ambient: ArrayView1<'_, f64>,
    ) -> ThermalResult<SimulationHandle> {
        let mut u = Array2::zeros((t.len(), 2));
        u.column_mut(0).assign(&ambient);
        u.column_mut(1).assign(&power);
        let mut loaded = self.loaded.lock().expect("engine lock poisoned");
        loaded.push((t.to_owned(), u));
        Ok(SimulationHandle(loaded.len() as u64 - 1))
    }

    fn evaluate_model(
        &self, _model: &ModelId, handle: SimulationHandle, params: &NamedValues,
        initial_conditions: &NamedValues, _constants: &NamedValues,
    ) -> ThermalResult<Array2<f64>> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let loaded = self.loaded.lock().expect("engine lock poisoned");
        let (t, u) = loaded
            .get(handle.0 as usize)
            .ok_or(ThermalError::SimulationFailed { reason: "unknown handle".into() })?;
        let p = TargetParams::new(
            params["cp"],
            params["cair"],
            params["rair"],
            params["rin"],
            params["rout"],
        );
        let x0 = ndarray::array![
            initial_conditions["initial_in_temp"],
            initial_conditions["initial_air_temp"]
        ];
        let response = target_response(&p, OutputMode::Both, u.view(), t.view(), x0.view())
            .map_err(|e| ThermalError::SimulationFailed { reason: e.to_string() })?;
        let surface = response.outputs.channel(0).expect("both mode has a surface channel");

        let n = t.len();
        let mut table = Array2::zeros((n - 1, 3));
        table.column_mut(0).assign(&t.slice(s![1..]));
        table.column_mut(1).assign(&response.states.slice(s![1.., 0]));
        table.column_mut(2).assign(&surface.slice(s![1..]));
        Ok(table)
    }
}

#[test]
// Purpose
// -------
// The squared-error functional vanishes at the generating parameters.
//
// Given
// -----
// - 1000 noise-free samples from P0, for two-channel and surface-only
//   outputs.
//
// Expect
// ------
// - Cost at P0 below 1e-9 in both layouts.
fn squared_error_vanishes_at_generating_params() {
    for mode in [OutputMode::Both, OutputMode::Surface] {
        let data = synthetic(1000, mode);
        let functional = SquaredError::new(&data, mode).expect("layout matches mode");
        let cost = functional.evaluate(&P0).expect("evaluation should succeed");
        assert!(cost < 1e-9, "{mode:?}: {cost}");
    }
}

#[test]
// Purpose
// -------
// L-BFGS with finite-difference gradients recovers all five parameters
// from noise-free two-channel data.
//
// Given
// -----
// - 1000 one-second samples from P0, both outputs.
// - Initial guess 10–15% away from P0 in alternating directions.
// - L-BFGS (More–Thuente), tol_grad 1e-10, tol_cost 1e-14, 1000 iterations.
//
// Expect
// ------
// - Every fitted field within 5% of P0.
// - Post-fit MSE below 1e-3 and an observable fitted system.
fn lbfgs_recovers_parameters_from_synthetic_data() {
    // Arrange
    let data = synthetic(1000, OutputMode::Both);
    let tols = Tolerances::new(Some(1e-10), Some(1e-14), Some(1000)).expect("valid tolerances");
    let options = FitOptions {
        initial_guess: TargetParams::new(
            P0.cp * 1.15,
            P0.cair * 0.9,
            P0.rair * 1.1,
            P0.rin * 0.88,
            P0.rout * 1.12,
        ),
        backend: OptimizerBackend::Lbfgs(
            LbfgsOptions::new(tols, LineSearcher::MoreThuente, None, false)
                .expect("valid L-BFGS options"),
        ),
        ..FitOptions::default()
    };

    // Act
    let outcome = fit(&data, &options).expect("fit should succeed");

    // Assert
    assert_within(&outcome.params, &P0, 0.05);
    let report = Evaluator::new(&data, OutputMode::Both)
        .and_then(|e| e.evaluate(&outcome.params))
        .expect("evaluation should succeed");
    assert!(report.mse() < 1e-3, "mse = {}", report.mse());
    assert!(outcome.state_space.is_observable());
    assert!(outcome.iterations > 0);
    assert_eq!(outcome.state_space, StateSpace::new(&outcome.params, OutputMode::Both).unwrap());
}

#[test]
// Purpose
// -------
// Fixed parameters come back exactly as given, even when they differ from
// the values that generated the data.
//
// Given
// -----
// - Data from P0; `cair = 40.0` and `rair = 0.05` fixed.
// - Nelder–Mead capped at 200 iterations.
//
// Expect
// ------
// - `cair == 40.0` and `rair == 0.05` bit for bit.
// - Free parameters strictly positive; a finite cost.
fn fixed_parameters_are_preserved_exactly() {
    let data = synthetic(600, OutputMode::Both);
    let options = FitOptions {
        fixed: FixedParams::new().with(ParamName::Cair, 40.0).with(ParamName::Rair, 0.05),
        backend: OptimizerBackend::NelderMead(NelderMeadOptions {
            max_iter: 200,
            ..NelderMeadOptions::default()
        }),
        ..FitOptions::default()
    };

    let outcome = fit(&data, &options).expect("fit should succeed");

    assert_eq!(outcome.params.cair, 40.0);
    assert_eq!(outcome.params.rair, 0.05);
    assert!(outcome.params.cp > 0.0 && outcome.params.rin > 0.0 && outcome.params.rout > 0.0);
    assert!(outcome.cost.is_finite());
}

#[test]
// Purpose
// -------
// Nelder–Mead recovers the three resistances from noisy measurements when
// both capacitances are held at their true values.
//
// Given
// -----
// - 800 samples from P0 with 0.01 °C sensor noise (seeded).
// - `cp` and `cair` fixed at P0; guess 15% off; default Nelder–Mead.
//
// Expect
// ------
// - `rair`, `rin`, `rout` within 5% of P0.
// - Post-fit MSE close to the noise variance, well below 1e-3.
fn nelder_mead_recovers_resistances_from_noisy_data() {
    // Arrange
    let (t, u) = excitation(800);
    let x0 = Array1::from_elem(2, 25.0);
    let mut rng = StdRng::seed_from_u64(42);
    let noise = NoiseSpec::new(0.0, 0.01).expect("valid noise levels");
    let y = target_response_noisy(
        &P0,
        OutputMode::Both,
        u.view(),
        t.view(),
        x0.view(),
        &noise,
        &mut rng,
    )
    .expect("noisy response should succeed")
    .outputs;
    let data = FitData::new(t, u, y, x0).expect("synthetic data should be valid");
    let options = FitOptions {
        initial_guess: TargetParams::new(
            P0.cp,
            P0.cair,
            P0.rair * 0.85,
            P0.rin * 1.15,
            P0.rout * 0.85,
        ),
        fixed: FixedParams::new().with(ParamName::Cp, P0.cp).with(ParamName::Cair, P0.cair),
        backend: OptimizerBackend::NelderMead(NelderMeadOptions::default()),
        ..FitOptions::default()
    };

    // Act
    let outcome = fit(&data, &options).expect("fit should succeed");

    // Assert
    assert_within(&outcome.params, &P0, 0.05);
    let report = Evaluator::new(&data, OutputMode::Both)
        .and_then(|e| e.evaluate(&outcome.params))
        .expect("evaluation should succeed");
    assert!(report.mse() < 1e-3, "mse = {}", report.mse());
}

#[test]
// Purpose
// -------
// The simulation-backed functional fits through the engine contract,
// aligning the engine's shorter output with the measured series.
//
// Given
// -----
// - 300 samples from P0; a closed-form stub engine loaded from the data.
// - `cp`, `cair`, `rair` fixed; `rin`, `rout` free from a 10% off guess.
//
// Expect
// ------
// - Zero cost at P0, the engine called on every evaluation, and `rin`,
//   `rout` within 5% of P0.
fn simulation_backed_fit_uses_engine() {
    // Arrange
    let data = synthetic(300, OutputMode::Both);
    let engine = Arc::new(ClosedFormEngine::default());
    let config = SimulationConfig::load(engine.clone(), ModelId::from("cell"), &data, 0.5)
        .expect("loading should succeed");
    let kind = ErrorKind::SquaredSimulation(config);
    let at_truth = kind
        .bind(&data, OutputMode::Both)
        .and_then(|f| f.evaluate(&P0))
        .expect("evaluation should succeed");
    let options = FitOptions {
        initial_guess: TargetParams::new(P0.cp, P0.cair, P0.rair, P0.rin * 1.1, P0.rout * 0.9),
        fixed: FixedParams::new()
            .with(ParamName::Cp, P0.cp)
            .with(ParamName::Cair, P0.cair)
            .with(ParamName::Rair, P0.rair),
        error_kind: kind,
        backend: OptimizerBackend::NelderMead(NelderMeadOptions::default()),
        ..FitOptions::default()
    };

    // Act
    let outcome = fit(&data, &options).expect("fit should succeed");

    // Assert
    assert!(at_truth < 1e-12, "{at_truth}");
    assert!(engine.evaluations.load(Ordering::Relaxed) > 10);
    assert_within(&outcome.params, &P0, 0.05);
}

#[test]
// Purpose
// -------
// Every strictly positive parameter set gives an observable two-output
// system.
//
// Given
// -----
// - 200 random parameter sets: capacitances in [1, 5000], resistances in
//   [0.01, 1], seeded RNG.
//
// Expect
// ------
// - `rank([C; C·A]) == 2` for all of them; `D` is all zeros.
fn both_mode_is_always_observable() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let params = TargetParams::new(
            rng.gen_range(1.0..5000.0),
            rng.gen_range(1.0..5000.0),
            rng.gen_range(0.01..1.0),
            rng.gen_range(0.01..1.0),
            rng.gen_range(0.01..1.0),
        );
        let ss = StateSpace::new(&params, OutputMode::Both).expect("positive parameters");
        assert_eq!(ss.observability_rank(), 2, "{params:?}");
        assert!(ss.d.iter().all(|&v| v == 0.0));
    }
}
