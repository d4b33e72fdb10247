//! Parameter descriptors and live parameter values.
//!
//! A [`ParamDef`] describes one slider-able value of a model: its id, label,
//! bounds, default and step. A [`ParameterSet`] holds the current values keyed
//! by id. Typed parameter structs bridge the two through [`ModelParams`],
//! which is normally derived:
//!
//! ```ignore
//! #[derive(ModelParams, Clone, Copy, Debug)]
//! pub struct Schnakenberg {
//!     #[param(label = "a (source u)", min = 0.01, max = 0.5, default = 0.1, step = 0.01)]
//!     pub a: f32,
//! }
//! ```

use std::collections::BTreeMap;

/// Description of one model parameter, as consumed by a control layer to
/// build sliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDef {
    pub id: &'static str,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub step: f32,
}

impl ParamDef {
    /// Map a normalized position in `[0, 1]` onto this parameter's range.
    pub fn denormalize(&self, t: f32) -> f32 {
        self.min + t * (self.max - self.min)
    }

    /// Map a value onto `[0, 1]` relative to this parameter's range.
    ///
    /// A zero-width range maps everything to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span.abs() < f32::EPSILON {
            0.0
        } else {
            (value - self.min) / span
        }
    }
}

/// Current values of a model's parameters, keyed by parameter id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, f32>,
}

impl ParameterSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding every parameter's default.
    pub fn from_defs(defs: &[ParamDef]) -> Self {
        let mut set = Self::new();
        for def in defs {
            set.insert(def.id, def.default);
        }
        set
    }

    /// Build a set from `(id, value)` pairs.
    pub fn from_pairs(pairs: &[(&str, f32)]) -> Self {
        let mut set = Self::new();
        for (id, value) in pairs {
            set.insert(id, *value);
        }
        set
    }

    pub fn get(&self, id: &str) -> Option<f32> {
        self.values.get(id).copied()
    }

    pub fn insert(&mut self, id: &str, value: f32) {
        self.values.insert(id.to_string(), value);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Overwrite this set's entries with every entry of `other`.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (id, value) in other.iter() {
            self.insert(id, value);
        }
    }

    /// Linear interpolation over the keys both sets share.
    ///
    /// Keys present in only one of the sets are left out of the result.
    pub fn lerp_shared(a: &ParameterSet, b: &ParameterSet, t: f32) -> ParameterSet {
        let mut out = ParameterSet::new();
        for (id, va) in a.iter() {
            if let Some(vb) = b.get(id) {
                out.insert(id, va * (1.0 - t) + vb * t);
            }
        }
        out
    }
}

/// A typed block of model parameters.
///
/// Implemented by `#[derive(ModelParams)]`; see the crate-level docs of
/// `morphogen-derive` for the attribute syntax.
pub trait ModelParams: Sized + Copy + Default {
    /// Parameter descriptors in field order.
    const PARAMS: &'static [ParamDef];

    /// WGSL `let` statements unpacking [`gpu_words`](Self::gpu_words) from
    /// `sim.params` under the field names.
    const WGSL_BINDINGS: &'static str;

    /// Read values from a set, falling back to defaults for missing ids.
    fn from_set(set: &ParameterSet) -> Self;

    /// Write every field into a new set.
    fn to_set(&self) -> ParameterSet;

    /// Pack fields into the eight uniform slots, in field order.
    fn gpu_words(&self) -> [f32; 8];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_defs_uses_defaults() {
        let defs = [
            ParamDef { id: "feed", label: "Feed", min: 0.0, max: 0.1, default: 0.055, step: 0.001 },
            ParamDef { id: "kill", label: "Kill", min: 0.0, max: 0.1, default: 0.062, step: 0.001 },
        ];
        let set = ParameterSet::from_defs(&defs);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("feed"), Some(0.055));
        assert_eq!(set.get("kill"), Some(0.062));
        assert_eq!(set.get("dt"), None);
    }

    #[test]
    fn test_merge_overrides() {
        let mut set = ParameterSet::from_pairs(&[("feed", 0.055), ("kill", 0.062)]);
        set.merge(&ParameterSet::from_pairs(&[("kill", 0.06)]));
        assert_eq!(set.get("feed"), Some(0.055));
        assert_eq!(set.get("kill"), Some(0.06));
    }

    #[test]
    fn test_lerp_shared_keys_only() {
        let a = ParameterSet::from_pairs(&[("feed", 0.02), ("kill", 0.05), ("dt", 1.0)]);
        let b = ParameterSet::from_pairs(&[("feed", 0.04), ("kill", 0.07)]);
        let mid = ParameterSet::lerp_shared(&a, &b, 0.5);
        assert!((mid.get("feed").unwrap() - 0.03).abs() < 1e-6);
        assert!((mid.get("kill").unwrap() - 0.06).abs() < 1e-6);
        assert!(!mid.contains("dt"));
    }

    #[test]
    fn test_param_def_normalize_roundtrip() {
        let def = ParamDef { id: "a0", label: "a0", min: -0.5, max: 0.5, default: -0.03, step: 0.01 };
        assert!((def.denormalize(0.25) - -0.25).abs() < 1e-6);
        assert!((def.normalize(-0.25) - 0.25).abs() < 1e-6);

        let flat = ParamDef { min: 1.0, max: 1.0, ..def };
        assert_eq!(flat.normalize(3.0), 0.0);
    }
}
