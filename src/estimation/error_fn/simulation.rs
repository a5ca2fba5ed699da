//! Squared error against an external simulation engine.
//!
//! Each evaluation is one blocking round trip to the engine held by the
//! [`SimulationConfig`]; the closed-form response is not used. The engine's
//! surface-temperature column is compared with the surface channel of `y`.
use crate::{
    estimation::{
        data::FitData,
        error_fn::ErrorFunctional,
        simulation::{NamedValues, SURFACE_TEMPERATURE_COLUMN, SimulationConfig, named_params},
    },
    thermal::{
        errors::{ThermalError, ThermalResult},
        params::TargetParams,
        response::initial_state,
        state_space::OutputMode,
    },
};
use ndarray::{Array1, s};
use tracing::debug;

pub struct SimulationSquaredError<'a> {
    config: &'a SimulationConfig,
    expected: Array1<f64>,
    n_samples: usize,
    initial_conditions: NamedValues,
    constants: NamedValues,
}

impl<'a> SimulationSquaredError<'a> {
    /// Bind the functional.
    ///
    /// Initial conditions are `initial_soc` and the core temperature
    /// `initial_in_temp`; two-output fits add `initial_air_temp`.
    ///
    /// # Errors
    /// - [`ThermalError::InvalidSimulationConfig`] for invalid settings or an
    ///   air-only fit (the engine reports surface temperature).
    /// - `ShapeMismatch` if `y` does not have the layout of `mode`.
    pub fn new(
        data: &'a FitData, mode: OutputMode, config: &'a SimulationConfig,
    ) -> ThermalResult<Self> {
        config.validate()?;
        if mode == OutputMode::Air {
            return Err(ThermalError::InvalidSimulationConfig {
                reason: "the simulation engine reports surface temperature; \
                         use 'surface' or 'both'",
            });
        }
        data.check_mode(mode)?;
        let expected = data
            .y
            .channel(0)
            .map(|c| c.to_owned())
            .ok_or(ThermalError::InvalidSimulationConfig { reason: "no surface channel in y" })?;

        let x0 = initial_state(data.x0.view())?;
        let mut initial_conditions = NamedValues::new();
        initial_conditions.insert("initial_soc".to_string(), config.initial_soc);
        initial_conditions.insert("initial_in_temp".to_string(), x0[0]);
        if mode == OutputMode::Both {
            initial_conditions.insert("initial_air_temp".to_string(), x0[1]);
        }

        Ok(Self {
            config,
            expected,
            n_samples: data.len(),
            initial_conditions,
            constants: config.constants(),
        })
    }
}

impl ErrorFunctional for SimulationSquaredError<'_> {
    /// `gain · Σ(y_surface − ŷ_surface)² / N`.
    ///
    /// When the engine returns one row fewer than `N`, its first row is
    /// matched with the second expected sample.
    fn evaluate(&self, params: &TargetParams) -> ThermalResult<f64> {
        debug!(model = %self.config.model.0, "calling simulation engine");
        let output = self.config.engine.evaluate_model(
            &self.config.model,
            self.config.handle,
            &named_params(params),
            &self.initial_conditions,
            &self.constants,
        )?;
        if output.ncols() <= SURFACE_TEMPERATURE_COLUMN {
            return Err(ThermalError::ShapeMismatch {
                what: "simulation output",
                expected: format!("at least {} columns", SURFACE_TEMPERATURE_COLUMN + 1),
                found: format!("({}, {})", output.nrows(), output.ncols()),
            });
        }
        let obtained = output.column(SURFACE_TEMPERATURE_COLUMN);
        let expected = if obtained.len() == self.expected.len() {
            self.expected.view()
        } else if obtained.len() + 1 == self.expected.len() {
            self.expected.slice(s![1..])
        } else {
            return Err(ThermalError::ShapeMismatch {
                what: "simulation output",
                expected: format!("{} or {} rows", self.expected.len(), self.expected.len() - 1),
                found: format!("{} rows", obtained.len()),
            });
        };
        let error = &expected - &obtained;
        let mse = error.dot(&error) / self.n_samples as f64;
        debug!(mse, "simulation error");
        Ok(self.config.gain * mse)
    }

    fn name(&self) -> &'static str {
        "squared_simulation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::simulation::{ModelId, SimulationEngine, SimulationHandle};
    use approx::assert_relative_eq;
    use ndarray::{Array2, ArrayView1, array};
    use std::sync::{Arc, Mutex};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Cost value, gain and first-sample alignment.
    // - Initial conditions per output mode.
    // - Rejection of air-only fits and malformed engine output.
    // -------------------------------------------------------------------------

    /// Engine that returns a fixed table and records the initial conditions.
    struct Fixed {
        table: Array2<f64>,
        seen: Mutex<Vec<NamedValues>>,
    }

    impl SimulationEngine for Fixed {
        fn load_model(
            &self, _model: &ModelId, _time_step: f64, _end_time: f64, _t: ArrayView1<'_, f64>,
            _power: ArrayView1<'_, f64>, _ambient: ArrayView1<'_, f64>,
        ) -> ThermalResult<SimulationHandle> {
            Ok(SimulationHandle(7))
        }

        fn evaluate_model(
            &self, _model: &ModelId, handle: SimulationHandle, params: &NamedValues,
            initial_conditions: &NamedValues, _constants: &NamedValues,
        ) -> ThermalResult<Array2<f64>> {
            assert_eq!(handle, SimulationHandle(7));
            assert_eq!(params.len(), 5);
            self.seen.lock().unwrap().push(initial_conditions.clone());
            Ok(self.table.clone())
        }
    }

    fn engine_config(table: Array2<f64>) -> (Arc<Fixed>, SimulationConfig) {
        let engine = Arc::new(Fixed { table, seen: Mutex::new(Vec::new()) });
        let config =
            SimulationConfig::new(engine.clone(), ModelId::from("cell"), SimulationHandle(7), 0.9)
                .unwrap();
        (engine, config)
    }

    fn data() -> FitData {
        FitData::new(
            array![0.0, 1.0, 2.0, 3.0],
            Array2::from_elem((4, 2), 20.0),
            array![[20.0, 19.0], [21.0, 19.5], [22.0, 20.0], [23.0, 20.5]],
            array![20.0, 19.0],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // An engine returning one row fewer is aligned from the second sample,
    // and the sum of squares is averaged over all N samples then scaled.
    //
    // Given
    // -----
    // - Expected surface (20, 21, 22, 23); engine surface (21.5, 22, 22).
    // - gain = 2.
    //
    // Expect
    // ------
    // - Cost = 2 · (0.25 + 0 + 1) / 4 = 0.625.
    fn shorter_engine_output_is_aligned() {
        // Arrange
        let table = array![[1.0, 0.0, 21.5], [2.0, 0.0, 22.0], [3.0, 0.0, 22.0]];
        let (engine, config) = engine_config(table);
        let config = config.with_gain(2.0).unwrap();
        let data = data();
        let functional = SimulationSquaredError::new(&data, OutputMode::Both, &config).unwrap();

        // Act
        let cost = functional.evaluate(&TargetParams::default()).unwrap();

        // Assert
        assert_relative_eq!(cost, 0.625, max_relative = 1e-12);
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen[0]["initial_soc"], 0.9);
        assert_eq!(seen[0]["initial_in_temp"], 20.0);
        assert_eq!(seen[0]["initial_air_temp"], 19.0);
    }

    #[test]
    // Purpose
    // -------
    // A surface-only fit sends no air temperature, and engine output of the
    // wrong length or width is a shape error.
    fn surface_mode_and_bad_outputs() {
        let data = FitData::new(
            array![0.0, 1.0, 2.0],
            Array2::from_elem((3, 2), 20.0),
            array![20.0, 20.0, 20.0],
            array![20.0],
        )
        .unwrap();

        let (engine, config) = engine_config(Array2::from_elem((3, 3), 20.0));
        let functional = SimulationSquaredError::new(&data, OutputMode::Surface, &config).unwrap();
        assert_relative_eq!(functional.evaluate(&TargetParams::default()).unwrap(), 0.0);
        assert!(!engine.seen.lock().unwrap()[0].contains_key("initial_air_temp"));

        let (_, config) = engine_config(Array2::from_elem((1, 3), 20.0));
        let functional = SimulationSquaredError::new(&data, OutputMode::Surface, &config).unwrap();
        assert!(matches!(
            functional.evaluate(&TargetParams::default()),
            Err(ThermalError::ShapeMismatch { what: "simulation output", .. })
        ));

        let (_, config) = engine_config(Array2::from_elem((3, 2), 20.0));
        let functional = SimulationSquaredError::new(&data, OutputMode::Surface, &config).unwrap();
        assert!(functional.evaluate(&TargetParams::default()).is_err());

        assert!(matches!(
            SimulationSquaredError::new(&data, OutputMode::Air, &config),
            Err(ThermalError::InvalidSimulationConfig { .. })
        ));
    }
}
