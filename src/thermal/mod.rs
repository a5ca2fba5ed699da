//! thermal — physical model of a battery cell in a climate chamber.
//!
//! Purpose
//! -------
//! Provide the two-state lumped RC thermal network: its parameter records,
//! the fixed/free parameter merger, the state-space builder, and the
//! time-domain response (clean, offset, and noisy).
//!
//! Key behaviors
//! -------------
//! - `params`: [`TargetParams`](params::TargetParams),
//!   [`TargetParamsExtended`](params::TargetParamsExtended), canonical
//!   names and defaults.
//! - `merge`: rebuild a full record from an optimizer's free vector.
//! - `state_space`: `(A, B, C, D)` per output selector, observability.
//! - `series` / `response`: output containers and first-order-hold
//!   simulation on equally spaced grids.
//! - `synthetic`: chamber and sensor noise for identification experiments.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything here is a pure function of its inputs; failures are
//!   [`ThermalError`](errors::ThermalError) values, never panics.
//!
//! Downstream usage
//! ----------------
//! - The estimation layer builds error functionals on top of
//!   [`target_response`](response::target_response) and
//!   [`merge_params`](merge::merge_params).

pub mod errors;
pub mod merge;
pub mod params;
pub mod response;
pub mod series;
pub mod state_space;
pub mod synthetic;

pub mod prelude {
    pub use super::errors::{ThermalError, ThermalResult};
    pub use super::merge::{FixedParams, free_projection, merge_params};
    pub use super::params::{
        DEFAULT_PARAMS, PARAM_COUNT, ParamName, TargetParams, TargetParamsExtended,
    };
    pub use super::response::{
        LtiResponse, simulate, target_response, target_response_with_offset,
    };
    pub use super::series::{OutputSeries, uniform_step};
    pub use super::state_space::{N_INPUTS, N_STATES, OutputMode, StateSpace, build_state_space};
    pub use super::synthetic::{
        NoiseSpec, target_response_noisy, target_response_noisy_with_offset,
    };
}
