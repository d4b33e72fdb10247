//! The reaction-diffusion model catalog.
//!
//! Every model is a typed parameter struct implementing
//! [`Reaction`](crate::kernel::Reaction), plus a static [`ModelDefinition`]
//! describing its parameters, display normalization, presets and built-in
//! journeys. Lookups by string id go through [`get_definition`]:
//!
//! ```ignore
//! use morphogen::model;
//!
//! let def = model::get_definition("gray-scott")?;
//! assert_eq!(def.display_name, "Gray-Scott");
//!
//! let params = model::default_parameters("brusselator")?;
//! assert_eq!(params.get("B"), Some(3.0));
//!
//! assert!(model::get_definition("bogus").is_err());
//! ```

pub mod brusselator;
pub mod fitzhugh_nagumo;
pub mod gierer_meinhardt;
pub mod gray_scott;
pub mod schnakenberg;

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::journey::JourneyDef;
use crate::params::{ModelParams, ParamDef, ParameterSet};

pub use brusselator::Brusselator;
pub use fitzhugh_nagumo::FitzHughNagumo;
pub use gierer_meinhardt::GiererMeinhardt;
pub use gray_scott::GrayScott;
pub use schnakenberg::Schnakenberg;

/// Identifier of a reaction-diffusion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelId {
    #[default]
    GrayScott,
    FitzHughNagumo,
    GiererMeinhardt,
    Brusselator,
    Schnakenberg,
}

impl ModelId {
    /// All models in catalog order.
    pub const ALL: [ModelId; 5] = [
        ModelId::GrayScott,
        ModelId::FitzHughNagumo,
        ModelId::GiererMeinhardt,
        ModelId::Brusselator,
        ModelId::Schnakenberg,
    ];

    /// The string id used by [`get_definition`].
    pub fn key(self) -> &'static str {
        self.definition().key
    }

    pub fn definition(self) -> &'static ModelDefinition {
        &MODELS[self as usize]
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModelId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        get_definition(s).map(|def| def.id)
    }
}

/// A named parameter override, e.g. "Coral" for Gray-Scott.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub overrides: &'static [(&'static str, f32)],
}

impl Preset {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        overrides: &'static [(&'static str, f32)],
    ) -> Self {
        Self { name, description, overrides }
    }

    /// The overrides as a partial parameter set.
    pub fn parameters(&self) -> ParameterSet {
        ParameterSet::from_pairs(self.overrides)
    }
}

/// Static description of one model.
#[derive(Debug)]
pub struct ModelDefinition {
    pub id: ModelId,
    pub key: &'static str,
    pub display_name: &'static str,
    pub params: &'static [ParamDef],
    /// Value range mapped onto the color map, per channel.
    pub normalization: [(f32, f32); 2],
    pub channel_names: [&'static str; 2],
    pub presets: &'static [Preset],
    pub journeys: &'static [JourneyDef],
}

impl ModelDefinition {
    pub fn param(&self, id: &str) -> Option<&'static ParamDef> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn default_parameters(&self) -> ParameterSet {
        ParameterSet::from_defs(self.params)
    }

    pub fn preset(&self, name: &str) -> Result<&'static Preset, ModelError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ModelError::UnknownPreset {
                model: self.key.to_string(),
                preset: name.to_string(),
            })
    }

    pub fn journey(&self, name: &str) -> Result<&'static JourneyDef, ModelError> {
        self.journeys
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| ModelError::UnknownJourney {
                model: self.key.to_string(),
                journey: name.to_string(),
            })
    }
}

/// The catalog, indexed by `ModelId as usize`.
pub static MODELS: [ModelDefinition; 5] = [
    ModelDefinition {
        id: ModelId::GrayScott,
        key: "gray-scott",
        display_name: "Gray-Scott",
        params: GrayScott::PARAMS,
        normalization: [(0.0, 1.0), (0.0, 1.0)],
        channel_names: ["U", "V"],
        presets: gray_scott::PRESETS,
        journeys: gray_scott::JOURNEYS,
    },
    ModelDefinition {
        id: ModelId::FitzHughNagumo,
        key: "fitzhugh-nagumo",
        display_name: "FitzHugh-Nagumo",
        params: FitzHughNagumo::PARAMS,
        normalization: [(-1.5, 1.5), (-1.5, 1.5)],
        channel_names: ["v", "w"],
        presets: fitzhugh_nagumo::PRESETS,
        journeys: fitzhugh_nagumo::JOURNEYS,
    },
    ModelDefinition {
        id: ModelId::GiererMeinhardt,
        key: "gierer-meinhardt",
        display_name: "Gierer-Meinhardt",
        params: GiererMeinhardt::PARAMS,
        normalization: [(0.0, 5.0), (0.0, 10.0)],
        channel_names: ["a", "h"],
        presets: gierer_meinhardt::PRESETS,
        journeys: gierer_meinhardt::JOURNEYS,
    },
    ModelDefinition {
        id: ModelId::Brusselator,
        key: "brusselator",
        display_name: "Brusselator",
        params: Brusselator::PARAMS,
        normalization: [(0.0, 5.0), (0.0, 5.0)],
        channel_names: ["u", "v"],
        presets: brusselator::PRESETS,
        journeys: brusselator::JOURNEYS,
    },
    ModelDefinition {
        id: ModelId::Schnakenberg,
        key: "schnakenberg",
        display_name: "Schnakenberg",
        params: Schnakenberg::PARAMS,
        normalization: [(0.0, 3.0), (0.0, 3.0)],
        channel_names: ["u", "v"],
        presets: schnakenberg::PRESETS,
        journeys: schnakenberg::JOURNEYS,
    },
];

/// Every registered model definition.
pub fn all() -> &'static [ModelDefinition] {
    &MODELS
}

/// Look up a model by its string id.
pub fn get_definition(model_id: &str) -> Result<&'static ModelDefinition, ModelError> {
    MODELS
        .iter()
        .find(|def| def.key == model_id)
        .ok_or_else(|| ModelError::UnknownModel(model_id.to_string()))
}

/// Defaults of every parameter of a model.
pub fn default_parameters(model_id: &str) -> Result<ParameterSet, ModelError> {
    get_definition(model_id).map(ModelDefinition::default_parameters)
}

pub fn presets(model_id: &str) -> Result<&'static [Preset], ModelError> {
    get_definition(model_id).map(|def| def.presets)
}

pub fn journeys(model_id: &str) -> Result<&'static [JourneyDef], ModelError> {
    get_definition(model_id).map(|def| def.journeys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_ids() {
        for id in ModelId::ALL {
            assert_eq!(id.definition().id, id);
        }
    }

    #[test]
    fn test_lookup_by_key() {
        let def = get_definition("fitzhugh-nagumo").unwrap();
        assert_eq!(def.display_name, "FitzHugh-Nagumo");
        assert_eq!(def.params.len(), 7);
        assert_eq!("schnakenberg".parse::<ModelId>(), Ok(ModelId::Schnakenberg));
    }

    #[test]
    fn test_unknown_model() {
        assert_eq!(
            get_definition("bogus").unwrap_err(),
            ModelError::UnknownModel("bogus".into())
        );
        assert!(default_parameters("bogus").is_err());
        assert!(presets("bogus").is_err());
    }

    #[test]
    fn test_default_parameters() {
        let params = default_parameters("gierer-meinhardt").unwrap();
        assert_eq!(params.get("mu_a"), Some(1.0));
        assert_eq!(params.get("rho_a"), Some(0.01));
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn test_presets_reference_declared_params() {
        for def in all() {
            assert!(!def.presets.is_empty());
            for preset in def.presets {
                for (id, _) in preset.overrides {
                    assert!(def.param(id).is_some(), "{} preset {} uses unknown {}", def.key, preset.name, id);
                }
            }
        }
    }

    #[test]
    fn test_journeys_reference_declared_params() {
        for def in all() {
            for journey in def.journeys {
                assert!(journey.waypoints.len() >= 2);
                for wp in journey.waypoints {
                    for (id, _) in wp.params {
                        assert!(def.param(id).is_some());
                    }
                }
            }
        }
    }

    #[test]
    fn test_preset_lookup() {
        let def = ModelId::GrayScott.definition();
        let coral = def.preset("Coral").unwrap();
        assert_eq!(coral.parameters().get("feed"), Some(0.0545));
        assert!(matches!(def.preset("Nope"), Err(ModelError::UnknownPreset { .. })));
    }

    #[test]
    fn test_defaults_within_bounds() {
        for def in all() {
            for p in def.params {
                assert!(p.min <= p.default && p.default <= p.max, "{}.{}", def.key, p.id);
            }
        }
    }
}
