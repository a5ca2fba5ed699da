//! Physical parameter records for the two-state thermal RC network.
//!
//! Purpose
//! -------
//! Define the canonical five-field parameter record [`TargetParams`]
//! (thermal capacitances and resistances), its offset-carrying variant
//! [`TargetParamsExtended`], and the typed field names [`ParamName`] used by
//! the fixed/free merger and by serialization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Canonical field order is `cp, cair, rair, rin, rout`. Every flat
//!   representation (arrays, named pairs, serialized maps) follows it.
//! - A physically valid record has every field finite and strictly positive
//!   ([`TargetParams::validate`]). Records are plain values: nothing in the
//!   crate mutates one in place, they are always replaced wholesale.
//!
//! Conventions
//! -----------
//! - Capacitances are in J/K, resistances in K/W.
//! - [`DEFAULT_PARAMS`] is the literature-derived "known good" starting
//!   point for fits; callers override it per run through the fit options.
use crate::thermal::errors::{ThermalError, ThermalResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Number of fields in a [`TargetParams`] record.
pub const PARAM_COUNT: usize = 5;

/// Known-good parameter set used as the default initial guess.
pub const DEFAULT_PARAMS: TargetParams = TargetParams::new(
    2288.8086878520617,
    40.68543129463231,
    0.05622811486407936,
    0.29153746960754423,
    0.09544187302807855,
);

/// Canonical names of the five physical parameters, in record order.
///
/// Parsing accepts the lowercase field names only; anything else returns
/// [`ThermalError::UnknownParam`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamName {
    /// Core thermal capacitance.
    Cp,
    /// Air-gap thermal capacitance.
    Cair,
    /// Air-to-ambient thermal resistance.
    Rair,
    /// Internal thermal resistance.
    Rin,
    /// Surface-to-ambient thermal resistance.
    Rout,
}

impl ParamName {
    /// All names in canonical order.
    pub const ALL: [ParamName; PARAM_COUNT] =
        [ParamName::Cp, ParamName::Cair, ParamName::Rair, ParamName::Rin, ParamName::Rout];

    /// Field name as used in serialized output and collaborator maps.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Cp => "cp",
            ParamName::Cair => "cair",
            ParamName::Rair => "rair",
            ParamName::Rin => "rin",
            ParamName::Rout => "rout",
        }
    }

    /// Position of the field in canonical order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = ThermalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ThermalError::UnknownParam { name: s.to_string() })
    }
}

/// Five-field physical parameter vector of the thermal RC network.
///
/// Fields
/// ------
/// - `cp`: core thermal capacitance.
/// - `cair`: air-gap thermal capacitance.
/// - `rair`: air-to-ambient thermal resistance.
/// - `rin`: internal (core-to-surface) thermal resistance.
/// - `rout`: surface-to-ambient thermal resistance.
///
/// Serializes as a name→float map in canonical field order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetParams {
    pub cp: f64,
    pub cair: f64,
    pub rair: f64,
    pub rin: f64,
    pub rout: f64,
}

impl TargetParams {
    pub const fn new(cp: f64, cair: f64, rair: f64, rin: f64, rout: f64) -> Self {
        Self { cp, cair, rair, rin, rout }
    }

    /// Build a record from values in canonical order.
    pub fn from_array(values: [f64; PARAM_COUNT]) -> Self {
        let [cp, cair, rair, rin, rout] = values;
        Self { cp, cair, rair, rin, rout }
    }

    /// Flatten into canonical order.
    pub fn to_array(&self) -> [f64; PARAM_COUNT] {
        [self.cp, self.cair, self.rair, self.rin, self.rout]
    }

    /// Read one field by name.
    pub fn get(&self, name: ParamName) -> f64 {
        self.to_array()[name.index()]
    }

    /// Name/value pairs in canonical order, as handed to collaborators.
    pub fn named(&self) -> [(&'static str, f64); PARAM_COUNT] {
        let values = self.to_array();
        ParamName::ALL.map(|name| (name.as_str(), values[name.index()]))
    }

    /// Series resistance `rin + rout` between core and ambient.
    pub fn total_resistance(&self) -> f64 {
        self.rin + self.rout
    }

    /// Check that every field is finite and strictly positive.
    ///
    /// # Errors
    /// [`ThermalError::NonPositiveParam`] naming the first offending field.
    pub fn validate(&self) -> ThermalResult<()> {
        for (name, value) in self.named() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ThermalError::NonPositiveParam { name, value });
            }
        }
        Ok(())
    }
}

impl Default for TargetParams {
    fn default() -> Self {
        DEFAULT_PARAMS
    }
}

/// [`TargetParams`] plus a constant output offset `k`.
///
/// Only the offset response path uses this record: every modeled output is
/// shifted by `k`. `k` may take any finite sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetParamsExtended {
    #[serde(flatten)]
    pub base: TargetParams,
    pub k: f64,
}

impl TargetParamsExtended {
    pub const fn new(base: TargetParams, k: f64) -> Self {
        Self { base, k }
    }

    /// Name/value pairs in canonical order with `k` appended.
    pub fn named(&self) -> [(&'static str, f64); PARAM_COUNT + 1] {
        let [a, b, c, d, e] = self.base.named();
        [a, b, c, d, e, ("k", self.k)]
    }

    /// Validate the base record and require a finite offset.
    pub fn validate(&self) -> ThermalResult<()> {
        self.base.validate()?;
        if !self.k.is_finite() {
            return Err(ThermalError::NonFiniteData { what: "offset k", index: 0, value: self.k });
        }
        Ok(())
    }
}
