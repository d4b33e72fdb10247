//! Configuration for the pattern lab and the fractal explorer.
//!
//! [`LabConfig`] and [`ExplorerConfig`] are the typed, builder-style configs
//! the controllers take. [`Config`] is the on-disk JSON form: names instead
//! of enums, every field optional, resolved against the catalogs with
//! [`Config::lab_config`] and [`Config::explorer_config`].
//!
//! ```ignore
//! let config = Config::load("morphogen.json")?;
//! let lab = PatternLab::new(config.lab_config()?.with_steps_per_frame(20))?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::brush::{DEFAULT_INTENSITY, DEFAULT_RADIUS_PX};
use crate::colormap::ColorMap;
use crate::error::{ConfigError, ModelError};
use crate::fractal::{FractalKind, DEFAULT_MAX_ITER};
use crate::model::ModelId;
use crate::stepper::Backend;

/// Default simulation grid edge, in cells.
pub const DEFAULT_GRID_SIZE: u32 = 512;
/// Default number of steps per frame.
pub const DEFAULT_STEPS_PER_FRAME: u32 = 10;
/// Default fractal render size.
pub const DEFAULT_VIEW_SIZE: (u32, u32) = (800, 600);

/// Settings for a [`PatternLab`](crate::lab::PatternLab).
#[derive(Debug, Clone, PartialEq)]
pub struct LabConfig {
    pub width: u32,
    pub height: u32,
    pub model: ModelId,
    pub colormap: ColorMap,
    /// Displayed channel, 0 or 1.
    pub channel: usize,
    pub steps_per_frame: u32,
    pub backend: Backend,
    /// RNG seed for initial conditions; `None` draws from entropy.
    pub seed: Option<u64>,
    pub comparison: bool,
    pub brush_radius: f32,
    pub brush_intensity: f32,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_SIZE,
            height: DEFAULT_GRID_SIZE,
            model: ModelId::GrayScott,
            colormap: ColorMap::Heat,
            channel: 0,
            steps_per_frame: DEFAULT_STEPS_PER_FRAME,
            backend: Backend::Cpu,
            seed: None,
            comparison: false,
            brush_radius: DEFAULT_RADIUS_PX,
            brush_intensity: DEFAULT_INTENSITY,
        }
    }
}

impl LabConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Square grid of `size` cells per edge.
    pub fn with_size(mut self, size: u32) -> Self {
        self.width = size.max(1);
        self.height = size.max(1);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    pub fn with_colormap(mut self, colormap: ColorMap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel.min(1);
        self
    }

    pub fn with_steps_per_frame(mut self, steps: u32) -> Self {
        self.steps_per_frame = steps;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_comparison(mut self, comparison: bool) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_brush(mut self, radius_px: f32, intensity: f32) -> Self {
        self.brush_radius = radius_px;
        self.brush_intensity = intensity;
        self
    }
}

/// Settings for a [`FractalExplorer`](crate::explorer::FractalExplorer).
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub width: u32,
    pub height: u32,
    pub kind: FractalKind,
    pub max_iter: u32,
    pub palette: ColorMap,
    pub linked: bool,
    pub infinite_zoom: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEW_SIZE.0,
            height: DEFAULT_VIEW_SIZE.1,
            kind: FractalKind::Julia,
            max_iter: DEFAULT_MAX_ITER,
            palette: ColorMap::Classic,
            linked: false,
            infinite_zoom: false,
        }
    }
}

impl ExplorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_kind(mut self, kind: FractalKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn with_palette(mut self, palette: ColorMap) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_linked(mut self, linked: bool) -> Self {
        self.linked = linked;
        self
    }

    pub fn with_infinite_zoom(mut self, enabled: bool) -> Self {
        self.infinite_zoom = enabled;
        self
    }
}

/// `patterns` section of the JSON config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternsFile {
    pub model: Option<String>,
    pub size: Option<u32>,
    pub steps_per_frame: Option<u32>,
    pub colormap: Option<String>,
    pub channel: Option<usize>,
    pub backend: Option<Backend>,
    pub seed: Option<u64>,
    pub comparison: Option<bool>,
    pub brush_radius: Option<f32>,
    pub brush_intensity: Option<f32>,
}

/// `fractals` section of the JSON config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FractalsFile {
    pub kind: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_iter: Option<u32>,
    pub palette: Option<String>,
    pub linked: Option<bool>,
    pub infinite_zoom: Option<bool>,
}

/// Top-level JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub patterns: PatternsFile,
    pub fractals: FractalsFile,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the `patterns` section over [`LabConfig::default`].
    pub fn lab_config(&self) -> Result<LabConfig, ConfigError> {
        let p = &self.patterns;
        let mut config = LabConfig::default();
        if let Some(model) = &p.model {
            config = config.with_model(model.parse::<ModelId>()?);
        }
        if let Some(size) = p.size {
            config = config.with_size(size);
        }
        if let Some(steps) = p.steps_per_frame {
            config = config.with_steps_per_frame(steps);
        }
        if let Some(name) = &p.colormap {
            config = config.with_colormap(parse_colormap(name)?);
        }
        if let Some(channel) = p.channel {
            config = config.with_channel(channel);
        }
        if let Some(backend) = p.backend {
            config = config.with_backend(backend);
        }
        if let Some(seed) = p.seed {
            config = config.with_seed(seed);
        }
        if let Some(comparison) = p.comparison {
            config = config.with_comparison(comparison);
        }
        config.brush_radius = p.brush_radius.unwrap_or(config.brush_radius);
        config.brush_intensity = p.brush_intensity.unwrap_or(config.brush_intensity);
        Ok(config)
    }

    /// Resolve the `fractals` section over [`ExplorerConfig::default`].
    pub fn explorer_config(&self) -> Result<ExplorerConfig, ConfigError> {
        let f = &self.fractals;
        let mut config = ExplorerConfig::default();
        if let Some(kind) = &f.kind {
            config = config.with_kind(kind.parse::<FractalKind>()?);
        }
        if f.width.is_some() || f.height.is_some() {
            let width = f.width.unwrap_or(config.width);
            let height = f.height.unwrap_or(config.height);
            config = config.with_dimensions(width, height);
        }
        if let Some(max_iter) = f.max_iter {
            config = config.with_max_iter(max_iter);
        }
        if let Some(name) = &f.palette {
            config = config.with_palette(parse_colormap(name)?);
        }
        if let Some(linked) = f.linked {
            config = config.with_linked(linked);
        }
        if let Some(enabled) = f.infinite_zoom {
            config = config.with_infinite_zoom(enabled);
        }
        Ok(config)
    }
}

fn parse_colormap(name: &str) -> Result<ColorMap, ModelError> {
    name.parse::<ColorMap>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.lab_config().unwrap(), LabConfig::default());
        assert_eq!(config.explorer_config().unwrap(), ExplorerConfig::default());
    }

    #[test]
    fn test_patterns_section() {
        let config = Config::from_json(
            r#"{ "patterns": { "model": "brusselator", "size": 128, "colormap": "viridis",
                 "backend": "gpu", "seed": 42, "comparison": true } }"#,
        )
        .unwrap();
        let lab = config.lab_config().unwrap();
        assert_eq!(lab.model, ModelId::Brusselator);
        assert_eq!((lab.width, lab.height), (128, 128));
        assert_eq!(lab.colormap, ColorMap::Viridis);
        assert_eq!(lab.backend, Backend::Gpu);
        assert_eq!(lab.seed, Some(42));
        assert!(lab.comparison);
        assert_eq!(lab.steps_per_frame, DEFAULT_STEPS_PER_FRAME);
    }

    #[test]
    fn test_fractals_section() {
        let config = Config::from_json(
            r#"{ "fractals": { "kind": "burning-ship", "max_iter": 500, "width": 320 } }"#,
        )
        .unwrap();
        let explorer = config.explorer_config().unwrap();
        assert_eq!(explorer.kind, FractalKind::BurningShip);
        assert_eq!(explorer.max_iter, 500);
        assert_eq!((explorer.width, explorer.height), (320, DEFAULT_VIEW_SIZE.1));
    }

    #[test]
    fn test_fractals_height_only_keeps_width() {
        let config = Config::from_json(r#"{ "fractals": { "height": 200 } }"#).unwrap();
        let explorer = config.explorer_config().unwrap();
        assert_eq!((explorer.width, explorer.height), (DEFAULT_VIEW_SIZE.0, 200));
    }

    #[test]
    fn test_unknown_names_fail() {
        let config = Config::from_json(r#"{ "patterns": { "model": "bogus" } }"#).unwrap();
        assert!(matches!(
            config.lab_config(),
            Err(ConfigError::Catalog(ModelError::UnknownModel(_)))
        ));

        let config = Config::from_json(r#"{ "fractals": { "palette": "sepia" } }"#).unwrap();
        assert!(matches!(
            config.explorer_config(),
            Err(ConfigError::Catalog(ModelError::UnknownColorMap(_)))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Config::from_json("{ nope"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::from_json(r#"{ "patterns": { "speed": 3 } }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/morphogen.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_builders_clamp() {
        let lab = LabConfig::new().with_size(0).with_channel(7);
        assert_eq!((lab.width, lab.height), (1, 1));
        assert_eq!(lab.channel, 1);
        assert_eq!(ExplorerConfig::new().with_max_iter(0).max_iter, 1);
    }
}
