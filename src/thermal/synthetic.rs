//! Noisy synthetic responses for identification experiments.
//!
//! Chamber noise perturbs the *inputs* before simulation (model noise);
//! cell noise is added to the simulated *outputs* (sensor noise). Both are
//! zero-mean Gaussian with the configured standard deviations and drawn from
//! a caller-supplied RNG, so seeded runs are reproducible.
use crate::thermal::{
    errors::{ThermalError, ThermalResult},
    params::{TargetParams, TargetParamsExtended},
    response::{LtiResponse, target_response, target_response_with_offset},
    series::OutputSeries,
    state_space::OutputMode,
};
use ndarray::{Array, ArrayView1, ArrayView2, Dimension};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Standard deviations of the chamber (input) and cell (sensor) noise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoiseSpec {
    pub chamber_std: f64,
    pub cell_std: f64,
}

impl NoiseSpec {
    /// Validated constructor; both deviations must be finite and ≥ 0.
    pub fn new(chamber_std: f64, cell_std: f64) -> ThermalResult<Self> {
        let spec = Self { chamber_std, cell_std };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> ThermalResult<()> {
        for (what, value) in [("chamber_std", self.chamber_std), ("cell_std", self.cell_std)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ThermalError::InvalidNoise { what, value });
            }
        }
        Ok(())
    }
}

fn add_noise<D: Dimension, R: Rng + ?Sized>(
    values: &mut Array<f64, D>, std: f64, what: &'static str, rng: &mut R,
) -> ThermalResult<()> {
    if std == 0.0 {
        return Ok(());
    }
    let normal =
        Normal::new(0.0, std).map_err(|_| ThermalError::InvalidNoise { what, value: std })?;
    values.mapv_inplace(|v| v + normal.sample(rng));
    Ok(())
}

fn add_sensor_noise<R: Rng + ?Sized>(
    outputs: &mut OutputSeries, std: f64, rng: &mut R,
) -> ThermalResult<()> {
    match outputs {
        OutputSeries::Vector(v) => add_noise(v, std, "cell_std", rng),
        OutputSeries::Matrix(m) => add_noise(m, std, "cell_std", rng),
    }
}

/// Simulate `params` on inputs perturbed by chamber noise, then add sensor
/// noise to the outputs.
///
/// # Errors
/// [`ThermalError::InvalidNoise`] for a bad [`NoiseSpec`], then the errors of
/// [`target_response`].
pub fn target_response_noisy<R: Rng + ?Sized>(
    params: &TargetParams, mode: OutputMode, u: ArrayView2<'_, f64>, t: ArrayView1<'_, f64>,
    x0: ArrayView1<'_, f64>, noise: &NoiseSpec, rng: &mut R,
) -> ThermalResult<LtiResponse> {
    noise.validate()?;
    let mut u_noisy = u.to_owned();
    add_noise(&mut u_noisy, noise.chamber_std, "chamber_std", rng)?;
    let mut response = target_response(params, mode, u_noisy.view(), t, x0)?;
    add_sensor_noise(&mut response.outputs, noise.cell_std, rng)?;
    Ok(response)
}

/// Offset variant of [`target_response_noisy`]; `k` is applied before the
/// sensor noise.
pub fn target_response_noisy_with_offset<R: Rng + ?Sized>(
    params: &TargetParamsExtended, mode: OutputMode, u: ArrayView2<'_, f64>,
    t: ArrayView1<'_, f64>, x0: ArrayView1<'_, f64>, noise: &NoiseSpec, rng: &mut R,
) -> ThermalResult<LtiResponse> {
    noise.validate()?;
    let mut u_noisy = u.to_owned();
    add_noise(&mut u_noisy, noise.chamber_std, "chamber_std", rng)?;
    let mut response = target_response_with_offset(params, mode, u_noisy.view(), t, x0)?;
    add_sensor_noise(&mut response.outputs, noise.cell_std, rng)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::params::DEFAULT_PARAMS;
    use ndarray::{Array1, Array2, array};
    use rand::{SeedableRng, rngs::StdRng};

    fn inputs(n: usize) -> (Array1<f64>, Array2<f64>) {
        let t = Array1::from_iter((0..n).map(|k| k as f64));
        let mut u = Array2::zeros((n, 2));
        u.column_mut(0).fill(25.0);
        u.column_mut(1).fill(2.0);
        (t, u)
    }

    #[test]
    // Purpose
    // -------
    // Zero deviations reproduce the noiseless response exactly.
    fn zero_noise_matches_clean_response() {
        let (t, u) = inputs(30);
        let x0 = array![25.0];
        let mut rng = StdRng::seed_from_u64(1);
        let noisy = target_response_noisy(
            &DEFAULT_PARAMS,
            OutputMode::Both,
            u.view(),
            t.view(),
            x0.view(),
            &NoiseSpec::default(),
            &mut rng,
        )
        .unwrap();
        let clean =
            target_response(&DEFAULT_PARAMS, OutputMode::Both, u.view(), t.view(), x0.view())
                .unwrap();
        assert_eq!(noisy, clean);
    }

    #[test]
    // Purpose
    // -------
    // Equal seeds give equal draws; sensor noise has roughly the requested
    // spread around the clean outputs.
    fn seeded_noise_is_reproducible_and_scaled() {
        let (t, u) = inputs(2000);
        let x0 = array![25.0];
        let noise = NoiseSpec::new(0.0, 0.5).unwrap();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            target_response_noisy(
                &DEFAULT_PARAMS,
                OutputMode::Surface,
                u.view(),
                t.view(),
                x0.view(),
                &noise,
                &mut rng,
            )
            .unwrap()
        };
        assert_eq!(run(42), run(42));

        let clean =
            target_response(&DEFAULT_PARAMS, OutputMode::Surface, u.view(), t.view(), x0.view())
                .unwrap();
        let noisy = run(42);
        let resid = clean.outputs.residual(&noisy.outputs).unwrap();
        let n = resid.len() as f64;
        let var = resid.iter().map(|e| e * e).sum::<f64>() / n;
        assert!((var.sqrt() - 0.5).abs() < 0.05, "sample std {}", var.sqrt());
    }

    #[test]
    // Purpose
    // -------
    // Negative or non-finite deviations are rejected.
    fn invalid_noise_spec_is_rejected() {
        assert_eq!(
            NoiseSpec::new(-1.0, 0.0),
            Err(ThermalError::InvalidNoise { what: "chamber_std", value: -1.0 })
        );
        assert!(NoiseSpec::new(0.0, f64::NAN).is_err());
    }
}
