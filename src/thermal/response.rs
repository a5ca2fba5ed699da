//! Time-domain response of the thermal network.
//!
//! Purpose
//! -------
//! Simulate the continuous LTI system built by
//! [`StateSpace`](crate::thermal::state_space::StateSpace) on an equally
//! spaced time grid and return the modeled outputs together with the state
//! trajectory.
//!
//! Key behaviors
//! -------------
//! - Discretization treats inputs as piecewise linear between samples
//!   (first-order hold). With step `dt` the 6×6 block matrix
//!   `M = [[A·dt, B·dt, 0], [0, 0, I], [0, 0, 0]]` is exponentiated once and
//!   `Φ = E₀₀`, `Γ₁ = E₀₂`, `Γ₀ = E₀₁ − Γ₁` give the exact recursion
//!   `x[k] = Φ·x[k−1] + Γ₀·u[k−1] + Γ₁·u[k]`.
//! - Outputs are `y[k] = C·x[k] + D·u[k]`, returned as a vector for
//!   single-output modes and an `N × 2` matrix for `Both`.
//! - A one-element initial state is broadcast to both states.
//!
//! Invariants & assumptions
//! ------------------------
//! - `t` must pass [`uniform_step`]; `u` must be `N × N_INPUTS`.
//! - Pure function: no state is kept between calls.
use crate::thermal::{
    errors::{ThermalError, ThermalResult},
    params::{TargetParams, TargetParamsExtended},
    series::{OutputSeries, uniform_step},
    state_space::{N_INPUTS, N_STATES, OutputMode, StateSpace},
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Modeled outputs plus the simulated state trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct LtiResponse {
    /// `y[k] = C·x[k] + D·u[k]`.
    pub outputs: OutputSeries,
    /// State trajectory, `N × N_STATES` (core, air).
    pub states: Array2<f64>,
}

/// First-order-hold discretization for a fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretized {
    pub phi: Array2<f64>,
    pub gamma0: Array2<f64>,
    pub gamma1: Array2<f64>,
}

/// Discretize `(A, B)` for step `dt` under a first-order hold on the inputs.
pub fn discretize(ss: &StateSpace, dt: f64) -> Discretized {
    let n = N_STATES;
    let m = N_INPUTS;
    let size = n + 2 * m;
    let mut block = DMatrix::<f64>::zeros(size, size);
    for i in 0..n {
        for j in 0..n {
            block[(i, j)] = ss.a[[i, j]] * dt;
        }
        for j in 0..m {
            block[(i, n + j)] = ss.b[[i, j]] * dt;
        }
    }
    for j in 0..m {
        block[(n + j, n + m + j)] = 1.0;
    }
    let e = block.exp();

    let phi = Array2::from_shape_fn((n, n), |(i, j)| e[(i, j)]);
    let gamma1 = Array2::from_shape_fn((n, m), |(i, j)| e[(i, n + m + j)]);
    let gamma0 = Array2::from_shape_fn((n, m), |(i, j)| e[(i, n + j)] - gamma1[[i, j]]);
    Discretized { phi, gamma0, gamma1 }
}

/// Expand a one- or two-element initial state to `N_STATES` entries.
///
/// # Errors
/// - [`ThermalError::InvalidInitialState`] for any other length.
/// - [`ThermalError::NonFiniteData`] for NaN/±inf entries.
pub fn initial_state(x0: ArrayView1<'_, f64>) -> ThermalResult<Array1<f64>> {
    if let Some((index, &value)) = x0.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ThermalError::NonFiniteData { what: "x0", index, value });
    }
    match x0.len() {
        1 => Ok(Array1::from_elem(N_STATES, x0[0])),
        N_STATES => Ok(x0.to_owned()),
        len => Err(ThermalError::InvalidInitialState { len }),
    }
}

/// Simulate a prebuilt system.
///
/// Parameters
/// ----------
/// - `ss`: continuous-time system.
/// - `u`: inputs, `N × 2` (ambient temperature, generated heat).
/// - `t`: equally spaced sample times, length `N ≥ 2`.
/// - `x0`: initial state, length 1 (broadcast) or 2.
///
/// # Errors
/// Time-grid, initial-state, and shape errors from the checks above.
pub fn simulate(
    ss: &StateSpace, u: ArrayView2<'_, f64>, t: ArrayView1<'_, f64>, x0: ArrayView1<'_, f64>,
) -> ThermalResult<LtiResponse> {
    let dt = uniform_step(t)?;
    let n = t.len();
    if u.dim() != (n, N_INPUTS) {
        return Err(ThermalError::ShapeMismatch {
            what: "inputs u",
            expected: format!("({n}, {N_INPUTS})"),
            found: format!("({}, {})", u.nrows(), u.ncols()),
        });
    }
    let x0 = initial_state(x0)?;
    let disc = discretize(ss, dt);

    let mut states = Array2::<f64>::zeros((n, N_STATES));
    states.row_mut(0).assign(&x0);
    for k in 1..n {
        let next = disc.phi.dot(&states.row(k - 1))
            + disc.gamma0.dot(&u.row(k - 1))
            + disc.gamma1.dot(&u.row(k));
        states.row_mut(k).assign(&next);
    }

    let y = states.dot(&ss.c.t()) + u.dot(&ss.d.t());
    let outputs = match ss.mode {
        OutputMode::Both => OutputSeries::Matrix(y),
        OutputMode::Surface | OutputMode::Air => {
            OutputSeries::Vector(y.index_axis_move(Axis(1), 0))
        }
    };
    Ok(LtiResponse { outputs, states })
}

/// Build the system for `params`/`mode` and simulate it.
///
/// # Errors
/// Parameter validation errors from the builder, then the errors of
/// [`simulate`].
pub fn target_response(
    params: &TargetParams, mode: OutputMode, u: ArrayView2<'_, f64>, t: ArrayView1<'_, f64>,
    x0: ArrayView1<'_, f64>,
) -> ThermalResult<LtiResponse> {
    let ss = StateSpace::new(params, mode)?;
    simulate(&ss, u, t, x0)
}

/// As [`target_response`], with every output shifted by the offset `k`.
///
/// The state trajectory is unaffected by the offset.
pub fn target_response_with_offset(
    params: &TargetParamsExtended, mode: OutputMode, u: ArrayView2<'_, f64>,
    t: ArrayView1<'_, f64>, x0: ArrayView1<'_, f64>,
) -> ThermalResult<LtiResponse> {
    params.validate()?;
    let mut response = target_response(&params.base, mode, u, t, x0)?;
    response.outputs = response.outputs.offset(params.k);
    Ok(response)
}
