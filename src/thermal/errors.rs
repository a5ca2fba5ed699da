//! Errors for the thermal RC model (parameter validation, series shapes,
//! time-grid checks, and simulation collaborator failures).
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Physical parameters must be **strictly positive and finite**; the
//!   state-space builder divides by every one of them.
//! - Collaborator failures (external simulation engines) are normalized to
//!   [`ThermalError::SimulationFailed`] with the engine's message preserved.
use thiserror::Error;

/// Result alias for thermal-model operations that may produce [`ThermalError`].
pub type ThermalResult<T> = Result<T, ThermalError>;

/// Unified error type for the thermal model and its data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThermalError {
    // ---- Parameters ----
    /// A physical parameter is ≤ 0 or non-finite.
    #[error("Parameter '{name}' must be finite and > 0; got: {value}")]
    NonPositiveParam { name: &'static str, value: f64 },

    /// A fixed-parameter key is not one of the canonical field names.
    #[error("Unknown parameter name '{name}'; expected one of cp, cair, rair, rin, rout")]
    UnknownParam { name: String },

    /// Free and fixed parameters do not add up to the record size.
    #[error("Parameter dimension mismatch: {free} free + {fixed} fixed != {expected}")]
    ParamDimMismatch { free: usize, fixed: usize, expected: usize },

    // ---- Series / shapes ----
    /// Two series (or a series and an output mode) disagree on shape.
    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch { what: &'static str, expected: String, found: String },

    /// The time vector is too short to define a step.
    #[error("Time vector must contain at least 2 samples; got {len}")]
    TooFewSamples { len: usize },

    /// The time grid is not strictly increasing with a constant step.
    #[error(
        "Time steps must be equally spaced and increasing: step {index} is {step}, \
         expected {expected}"
    )]
    NonUniformTimeStep { index: usize, step: f64, expected: f64 },

    /// A data point is NaN/±inf.
    #[error("Non-finite value in {what} at index {index}: {value}")]
    NonFiniteData { what: &'static str, index: usize, value: f64 },

    /// Initial state must hold one (broadcast) or two entries.
    #[error("Initial state must have 1 or 2 entries; got {len}")]
    InvalidInitialState { len: usize },

    // ---- Error functionals ----
    /// Sensor noise (variance or covariance) is unusable.
    #[error("Invalid sensor noise: {reason}")]
    InvalidSensorNoise { reason: &'static str },

    /// Simulation-backed configuration is missing or inconsistent.
    #[error("Invalid simulation configuration: {reason}")]
    InvalidSimulationConfig { reason: &'static str },

    /// The external simulation engine reported a failure.
    #[error("Simulation engine failed: {reason}")]
    SimulationFailed { reason: String },

    // ---- Synthetic data ----
    /// Noise standard deviations must be finite and ≥ 0.
    #[error("Invalid noise standard deviation for {what}: {value}")]
    InvalidNoise { what: &'static str, value: f64 },
}
