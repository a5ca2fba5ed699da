//! thermal_estimation — reduced-order thermal model identification for
//! battery cells.
//!
//! Purpose
//! -------
//! Fit the five parameters of a two-state thermal RC network (core and
//! air-gap capacitances, air, internal and surface resistances) to measured
//! temperature, ambient and heat series by minimizing a configurable error
//! functional with an Argmin-backed optimizer.
//!
//! Key behaviors
//! -------------
//! - `thermal`: parameter records, fixed/free merging, the state-space
//!   builder, and closed-form (and noisy) time-domain responses.
//! - `estimation`: the error-functional family, the simulation-engine
//!   contract, the fitting driver and post-fit evaluation.
//! - `optimization`: bounded L-BFGS and Nelder–Mead minimizers, numerically
//!   stable transforms, and the optimizer error surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs arrive as plain `ndarray` arrays; there is no file-format
//!   dependency.
//! - Failures are typed errors, never panics on user input.
//! - The library installs no `tracing` subscriber; hosts choose one.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use thermal_estimation::estimation::prelude::*;
//! use ndarray::{Array1, Array2};
//!
//! # fn load() -> (Array1<f64>, Array2<f64>, Array2<f64>) { unimplemented!() }
//! let (t, u, y) = load();
//! let data = FitData::new(t, u, y, Array1::from_elem(2, 25.0))?;
//! let outcome = fit(&data, &FitOptions::default())?;
//! println!("{:?} converged={}", outcome.params, outcome.converged);
//! # Ok::<(), thermal_estimation::optimization::errors::OptError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code; end-to-end recovery from synthetic
//!   data is covered in `tests/integration_fit_pipeline.rs`.

pub mod estimation;
pub mod optimization;
pub mod thermal;
