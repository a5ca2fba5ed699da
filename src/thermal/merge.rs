//! Fixed/free parameter merging.
//!
//! The optimizer searches over a flat vector containing only the *free*
//! parameters. [`merge_params`] is the single place where that vector is
//! reinterpreted as a named [`TargetParams`]: it walks the canonical field
//! order, taking held-constant values from [`FixedParams`] and consuming
//! free-vector entries in order for every other field.
//! [`free_projection`] is its inverse on the free coordinates.
//!
//! ## Invariants
//! - `free.len() + fixed.len() == PARAM_COUNT`; a violation is a caller error
//!   reported as [`ThermalError::ParamDimMismatch`], never padded or truncated.
//! - Keys of [`FixedParams`] are typed [`ParamName`]s, so unknown names are
//!   rejected when the map is built from strings.
use crate::thermal::{
    errors::{ThermalError, ThermalResult},
    params::{PARAM_COUNT, ParamName, TargetParams},
};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partial map from parameter name to a held-constant value.
///
/// Built once per fit by the caller and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedParams(BTreeMap<ParamName, f64>);

impl FixedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: ParamName, value: f64) -> Self {
        self.0.insert(name, value);
        self
    }

    /// Insert or replace a fixed value, returning the previous one.
    pub fn insert(&mut self, name: ParamName, value: f64) -> Option<f64> {
        self.0.insert(name, value)
    }

    /// Build from string-keyed pairs, e.g. `[("cair", 40.0), ("rair", 0.05)]`.
    ///
    /// # Errors
    /// [`ThermalError::UnknownParam`] for any key outside the five field names.
    pub fn from_pairs<'a, I>(pairs: I) -> ThermalResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            map.insert(key.parse::<ParamName>()?, value);
        }
        Ok(Self(map))
    }

    pub fn get(&self, name: ParamName) -> Option<f64> {
        self.0.get(&name).copied()
    }

    pub fn contains(&self, name: ParamName) -> bool {
        self.0.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names left free for the optimizer, in canonical order.
    pub fn free_names(&self) -> Vec<ParamName> {
        ParamName::ALL.into_iter().filter(|name| !self.contains(*name)).collect()
    }

    /// Reject fixed values that are non-finite or ≤ 0.
    pub fn validate(&self) -> ThermalResult<()> {
        for (name, &value) in &self.0 {
            if !value.is_finite() || value <= 0.0 {
                return Err(ThermalError::NonPositiveParam { name: name.as_str(), value });
            }
        }
        Ok(())
    }
}

/// Merge a free-parameter vector with fixed values into a full record.
///
/// Iterates `cp, cair, rair, rin, rout`; each name present in `fixed` takes
/// its fixed value, every other name consumes the next entry of `free`.
///
/// # Errors
/// [`ThermalError::ParamDimMismatch`] when
/// `free.len() + fixed.len() != PARAM_COUNT`.
pub fn merge_params(free: ArrayView1<'_, f64>, fixed: &FixedParams) -> ThermalResult<TargetParams> {
    if free.len() + fixed.len() != PARAM_COUNT {
        return Err(ThermalError::ParamDimMismatch {
            free: free.len(),
            fixed: fixed.len(),
            expected: PARAM_COUNT,
        });
    }
    let mut values = [0.0; PARAM_COUNT];
    let mut free_iter = free.iter();
    for name in ParamName::ALL {
        values[name.index()] = match fixed.get(name) {
            Some(v) => v,
            // Length check above guarantees an entry is left.
            None => free_iter.next().copied().unwrap_or(f64::NAN),
        };
    }
    Ok(TargetParams::from_array(values))
}

/// Project a full record onto its free coordinates (entries not in `fixed`),
/// in canonical order.
pub fn free_projection(params: &TargetParams, fixed: &FixedParams) -> Array1<f64> {
    fixed.free_names().into_iter().map(|name| params.get(name)).collect()
}
