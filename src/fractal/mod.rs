//! Escape-time fractals for the explorer.
//!
//! Five kinds share one pipeline: map each pixel to the complex plane
//! through the current [`View`], iterate, and color the smooth iteration
//! count through a [`Lut`]. Newton is the odd one out; it colors by the root
//! a point converges to.
//!
//! Like the reaction-diffusion models, each kind has a static
//! [`FractalDefinition`] with typed parameters, presets and journeys, looked
//! up by string id.

pub mod animation;

use std::f64::consts::{LN_2, PI};
use std::fmt;
use std::str::FromStr;

use glam::DVec2;
use image::RgbaImage;
use rayon::prelude::*;

use crate::colormap::Lut;
use crate::error::ModelError;
use crate::journey::{JourneyDef, WaypointDef};
use crate::params::{ModelParams, ParamDef, ParameterSet};
use crate::viewport::View;
use morphogen_derive::ModelParams;

pub use animation::AnimationController;

/// Squared magnitude past which a point has escaped.
pub const BAILOUT: f64 = 4.0;
/// Newton iteration stops once a step is shorter than this.
pub const NEWTON_TOLERANCE: f64 = 1e-4;
/// Default iteration cap.
pub const DEFAULT_MAX_ITER: u32 = 256;

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct JuliaParams {
    #[param(id = "cReal", label = "c (real)", min = -2.0, max = 2.0, default = -0.7269, step = 0.001)]
    pub c_real: f32,
    #[param(id = "cImag", label = "c (imag)", min = -2.0, max = 2.0, default = 0.1889, step = 0.001)]
    pub c_imag: f32,
}

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct NewtonParams {
    #[param(label = "Degree", min = 3.0, max = 8.0, default = 3.0, step = 1.0)]
    pub degree: f32,
    #[param(label = "Relaxation", min = 0.5, max = 2.0, default = 1.0, step = 0.01)]
    pub relaxation: f32,
}

impl NewtonParams {
    /// Polynomial degree; fractional values from a journey round to the
    /// nearest integer.
    pub fn degree(&self) -> i32 {
        (self.degree.round() as i32).clamp(3, 8)
    }
}

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct PhoenixParams {
    #[param(id = "cReal", label = "c (real)", min = -2.0, max = 2.0, default = 0.5667, step = 0.001)]
    pub c_real: f32,
    #[param(id = "cImag", label = "c (imag)", min = -2.0, max = 2.0, default = 0.0, step = 0.001)]
    pub c_imag: f32,
    #[param(id = "pReal", label = "p (real)", min = -2.0, max = 2.0, default = -0.5, step = 0.001)]
    pub p_real: f32,
    #[param(id = "pImag", label = "p (imag)", min = -2.0, max = 2.0, default = 0.0, step = 0.001)]
    pub p_imag: f32,
}

/// Identifier of a fractal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FractalKind {
    #[default]
    Julia,
    Mandelbrot,
    BurningShip,
    Newton,
    Phoenix,
}

impl FractalKind {
    pub const ALL: [FractalKind; 5] = [
        FractalKind::Julia,
        FractalKind::Mandelbrot,
        FractalKind::BurningShip,
        FractalKind::Newton,
        FractalKind::Phoenix,
    ];

    pub fn key(self) -> &'static str {
        self.definition().key
    }

    pub fn definition(self) -> &'static FractalDefinition {
        &FRACTALS[self as usize]
    }

    /// Next kind in catalog order, wrapping.
    pub fn next(self) -> FractalKind {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> FractalKind {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for FractalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FractalKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        get_definition(s).map(|def| def.kind)
    }
}

/// A named parameter set and/or view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalPreset {
    pub name: &'static str,
    pub params: &'static [(&'static str, f32)],
    pub view: Option<View>,
}

impl FractalPreset {
    const fn params(name: &'static str, params: &'static [(&'static str, f32)]) -> Self {
        Self { name, params, view: None }
    }

    const fn view(name: &'static str, view: View) -> Self {
        Self { name, params: &[], view: Some(view) }
    }

    pub fn parameters(&self) -> ParameterSet {
        ParameterSet::from_pairs(self.params)
    }
}

/// Static description of one fractal kind.
#[derive(Debug)]
pub struct FractalDefinition {
    pub kind: FractalKind,
    pub key: &'static str,
    pub display_name: &'static str,
    pub params: &'static [ParamDef],
    pub default_view: View,
    pub presets: &'static [FractalPreset],
    pub journeys: &'static [JourneyDef],
}

impl FractalDefinition {
    pub fn param(&self, id: &str) -> Option<&'static ParamDef> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn default_parameters(&self) -> ParameterSet {
        ParameterSet::from_defs(self.params)
    }

    pub fn preset(&self, name: &str) -> Result<&'static FractalPreset, ModelError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ModelError::UnknownPreset {
                model: self.key.to_string(),
                preset: name.to_string(),
            })
    }
}

const JULIA_PRESETS: &[FractalPreset] = &[
    FractalPreset::params("Spiral", &[("cReal", -0.7269), ("cImag", 0.1889)]),
    FractalPreset::params("Dendrite", &[("cReal", -0.1), ("cImag", 0.651)]),
    FractalPreset::params("Douady Rabbit", &[("cReal", -0.123), ("cImag", 0.745)]),
    FractalPreset::params("San Marco", &[("cReal", -0.75), ("cImag", 0.0)]),
    FractalPreset::params("Siegel Disk", &[("cReal", -0.391), ("cImag", -0.587)]),
    FractalPreset::params("Lightning", &[("cReal", -0.4), ("cImag", -0.59)]),
    FractalPreset::params("Starfish", &[("cReal", -0.54), ("cImag", 0.54)]),
    FractalPreset::params("Galaxy", &[("cReal", 0.355), ("cImag", 0.355)]),
];

const MANDELBROT_PRESETS: &[FractalPreset] = &[
    FractalPreset::view("Full View", View::new(-0.5, 0.0, 1.5)),
    FractalPreset::view("Seahorse Valley", View::new(-0.747, 0.1, 0.01)),
    FractalPreset::view("Elephant Valley", View::new(0.28, 0.008, 0.01)),
    FractalPreset::view("Mini Brot", View::new(-1.768, 0.001, 0.0003)),
    FractalPreset::view("Spiral Arm", View::new(-0.1011, 0.9563, 0.02)),
];

const BURNING_SHIP_PRESETS: &[FractalPreset] = &[
    FractalPreset::view("Full View", View::new(-0.4, -0.5, 2.0)),
    FractalPreset::view("Ship Hull", View::new(-1.755, -0.028, 0.02)),
    FractalPreset::view("Antenna", View::new(-1.862, -0.003, 0.006)),
];

const NEWTON_PRESETS: &[FractalPreset] = &[
    FractalPreset::params("Cubic", &[("degree", 3.0), ("relaxation", 1.0)]),
    FractalPreset::params("Quartic", &[("degree", 4.0), ("relaxation", 1.0)]),
    FractalPreset::params("Quintic", &[("degree", 5.0), ("relaxation", 1.0)]),
    FractalPreset::params("Over-relaxed", &[("degree", 3.0), ("relaxation", 1.5)]),
    FractalPreset::params("Under-relaxed", &[("degree", 3.0), ("relaxation", 0.7)]),
];

const PHOENIX_PRESETS: &[FractalPreset] = &[
    FractalPreset::params("Classic", &[("cReal", 0.5667), ("cImag", 0.0), ("pReal", -0.5), ("pImag", 0.0)]),
    FractalPreset::params("Feathered", &[("cReal", 0.2), ("cImag", 0.0), ("pReal", -0.6), ("pImag", 0.0)]),
    FractalPreset::params("Spiral", &[("cReal", 0.35), ("cImag", 0.1), ("pReal", -0.4), ("pImag", 0.2)]),
];

const JULIA_JOURNEYS: &[JourneyDef] = &[
    JourneyDef {
        name: "Classic Tour",
        description: "The best-known Julia sets, one after another",
        param_x: Some("cReal"),
        param_y: Some("cImag"),
        waypoints: &[
            WaypointDef::labelled("Spiral", &[("cReal", -0.7269), ("cImag", 0.1889)], 3.0),
            WaypointDef::labelled("Dendrite", &[("cReal", -0.1), ("cImag", 0.651)], 3.0),
            WaypointDef::labelled("Douady Rabbit", &[("cReal", -0.123), ("cImag", 0.745)], 3.0),
            WaypointDef::labelled("San Marco", &[("cReal", -0.75), ("cImag", 0.0)], 3.0),
            WaypointDef::labelled("Siegel Disk", &[("cReal", -0.391), ("cImag", -0.587)], 3.0),
            WaypointDef::labelled("Lightning", &[("cReal", -0.4), ("cImag", -0.59)], 3.0),
            WaypointDef::labelled("Starfish", &[("cReal", -0.54), ("cImag", 0.54)], 3.0),
            WaypointDef::labelled("Galaxy", &[("cReal", 0.355), ("cImag", 0.355)], 3.0),
        ],
    },
    // c on the circle |c| = 0.7885 in 30° steps
    JourneyDef {
        name: "C-Orbit Circle",
        description: "Walk c once around a circle through the connectedness boundary",
        param_x: Some("cReal"),
        param_y: Some("cImag"),
        waypoints: &[
            WaypointDef::labelled("0°", &[("cReal", 0.7885), ("cImag", 0.0)], 2.0),
            WaypointDef::labelled("30°", &[("cReal", 0.6829), ("cImag", 0.3943)], 2.0),
            WaypointDef::labelled("60°", &[("cReal", 0.3943), ("cImag", 0.6829)], 2.0),
            WaypointDef::labelled("90°", &[("cReal", 0.0), ("cImag", 0.7885)], 2.0),
            WaypointDef::labelled("120°", &[("cReal", -0.3943), ("cImag", 0.6829)], 2.0),
            WaypointDef::labelled("150°", &[("cReal", -0.6829), ("cImag", 0.3943)], 2.0),
            WaypointDef::labelled("180°", &[("cReal", -0.7885), ("cImag", 0.0)], 2.0),
            WaypointDef::labelled("210°", &[("cReal", -0.6829), ("cImag", -0.3943)], 2.0),
            WaypointDef::labelled("240°", &[("cReal", -0.3943), ("cImag", -0.6829)], 2.0),
            WaypointDef::labelled("270°", &[("cReal", 0.0), ("cImag", -0.7885)], 2.0),
            WaypointDef::labelled("300°", &[("cReal", 0.3943), ("cImag", -0.6829)], 2.0),
            WaypointDef::labelled("330°", &[("cReal", 0.6829), ("cImag", -0.3943)], 2.0),
            WaypointDef::labelled("360°", &[("cReal", 0.7885), ("cImag", 0.0)], 2.0),
        ],
    },
];

const MANDELBROT_JOURNEYS: &[JourneyDef] = &[JourneyDef {
    name: "Famous Locations",
    description: "Dive into the classic landmarks and back out",
    param_x: None,
    param_y: None,
    waypoints: &[
        WaypointDef::view("Overview", View::new(-0.5, 0.0, 1.5), 3.0),
        WaypointDef::view("Seahorse Valley", View::new(-0.747, 0.1, 0.01), 5.0),
        WaypointDef::view("Overview", View::new(-0.5, 0.0, 1.5), 3.0),
        WaypointDef::view("Elephant Valley", View::new(0.28, 0.008, 0.01), 5.0),
        WaypointDef::view("Overview", View::new(-0.5, 0.0, 1.5), 3.0),
        WaypointDef::view("Mini Brot", View::new(-1.768, 0.001, 0.0003), 6.0),
        WaypointDef::view("Overview", View::new(-0.5, 0.0, 1.5), 3.0),
    ],
}];

const BURNING_SHIP_JOURNEYS: &[JourneyDef] = &[JourneyDef {
    name: "Ship Tour",
    description: "Hull and antenna close-ups",
    param_x: None,
    param_y: None,
    waypoints: &[
        WaypointDef::view("Full View", View::new(-0.4, -0.5, 2.0), 3.0),
        WaypointDef::view("Ship Hull", View::new(-1.755, -0.028, 0.02), 5.0),
        WaypointDef::view("Full View", View::new(-0.4, -0.5, 2.0), 3.0),
        WaypointDef::view("Antenna", View::new(-1.862, -0.003, 0.006), 5.0),
        WaypointDef::view("Full View", View::new(-0.4, -0.5, 2.0), 3.0),
    ],
}];

const NEWTON_JOURNEYS: &[JourneyDef] = &[
    JourneyDef {
        name: "Degree Ladder",
        description: "Add one root at a time",
        param_x: Some("degree"),
        param_y: Some("relaxation"),
        waypoints: &[
            WaypointDef::labelled("Cubic", &[("degree", 3.0), ("relaxation", 1.0)], 3.0),
            WaypointDef::labelled("Quartic", &[("degree", 4.0), ("relaxation", 1.0)], 3.0),
            WaypointDef::labelled("Quintic", &[("degree", 5.0), ("relaxation", 1.0)], 3.0),
            WaypointDef::labelled("Sextic", &[("degree", 6.0), ("relaxation", 1.0)], 3.0),
            WaypointDef::labelled("Septic", &[("degree", 7.0), ("relaxation", 1.0)], 3.0),
            WaypointDef::labelled("Octic", &[("degree", 8.0), ("relaxation", 1.0)], 3.0),
        ],
    },
    JourneyDef {
        name: "Relaxation Sweep",
        description: "From damped to overshooting Newton steps",
        param_x: Some("degree"),
        param_y: Some("relaxation"),
        waypoints: &[
            WaypointDef::labelled("Under-relaxed", &[("degree", 3.0), ("relaxation", 0.5)], 3.0),
            WaypointDef::labelled("Standard", &[("degree", 3.0), ("relaxation", 1.0)], 3.0),
            WaypointDef::labelled("Over-relaxed", &[("degree", 3.0), ("relaxation", 1.5)], 3.0),
            WaypointDef::labelled("Extreme", &[("degree", 3.0), ("relaxation", 2.0)], 3.0),
        ],
    },
];

const PHOENIX_JOURNEYS: &[JourneyDef] = &[JourneyDef {
    name: "Parameter Sweep",
    description: "Through the phoenix presets and back",
    param_x: Some("cReal"),
    param_y: Some("pReal"),
    waypoints: &[
        WaypointDef::labelled("Classic", &[("cReal", 0.5667), ("cImag", 0.0), ("pReal", -0.5), ("pImag", 0.0)], 3.0),
        WaypointDef::labelled("Feathered", &[("cReal", 0.2), ("cImag", 0.0), ("pReal", -0.6), ("pImag", 0.0)], 3.0),
        WaypointDef::labelled("Spiral", &[("cReal", 0.35), ("cImag", 0.1), ("pReal", -0.4), ("pImag", 0.2)], 3.0),
        WaypointDef::labelled("Classic", &[("cReal", 0.5667), ("cImag", 0.0), ("pReal", -0.5), ("pImag", 0.0)], 3.0),
    ],
}];

/// The catalog, indexed by `FractalKind as usize`.
pub static FRACTALS: [FractalDefinition; 5] = [
    FractalDefinition {
        kind: FractalKind::Julia,
        key: "julia",
        display_name: "Julia Set",
        params: JuliaParams::PARAMS,
        default_view: View::new(0.0, 0.0, 1.5),
        presets: JULIA_PRESETS,
        journeys: JULIA_JOURNEYS,
    },
    FractalDefinition {
        kind: FractalKind::Mandelbrot,
        key: "mandelbrot",
        display_name: "Mandelbrot Set",
        params: &[],
        default_view: View::new(-0.5, 0.0, 1.5),
        presets: MANDELBROT_PRESETS,
        journeys: MANDELBROT_JOURNEYS,
    },
    FractalDefinition {
        kind: FractalKind::BurningShip,
        key: "burning-ship",
        display_name: "Burning Ship",
        params: &[],
        default_view: View::new(-0.4, -0.5, 2.0),
        presets: BURNING_SHIP_PRESETS,
        journeys: BURNING_SHIP_JOURNEYS,
    },
    FractalDefinition {
        kind: FractalKind::Newton,
        key: "newton",
        display_name: "Newton Fractal",
        params: NewtonParams::PARAMS,
        default_view: View::new(0.0, 0.0, 1.5),
        presets: NEWTON_PRESETS,
        journeys: NEWTON_JOURNEYS,
    },
    FractalDefinition {
        kind: FractalKind::Phoenix,
        key: "phoenix",
        display_name: "Phoenix Fractal",
        params: PhoenixParams::PARAMS,
        default_view: View::new(0.0, 0.0, 1.5),
        presets: PHOENIX_PRESETS,
        journeys: PHOENIX_JOURNEYS,
    },
];

pub fn all() -> &'static [FractalDefinition] {
    &FRACTALS
}

/// Look up a fractal kind by its string id.
pub fn get_definition(kind: &str) -> Result<&'static FractalDefinition, ModelError> {
    FRACTALS
        .iter()
        .find(|def| def.key == kind)
        .ok_or_else(|| ModelError::UnknownModel(kind.to_string()))
}

pub fn default_parameters(kind: &str) -> Result<ParameterSet, ModelError> {
    get_definition(kind).map(FractalDefinition::default_parameters)
}

pub fn presets(kind: &str) -> Result<&'static [FractalPreset], ModelError> {
    get_definition(kind).map(|def| def.presets)
}

pub fn journeys(kind: &str) -> Result<&'static [JourneyDef], ModelError> {
    get_definition(kind).map(|def| def.journeys)
}

/// Result of iterating one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Escaped; carries the smooth iteration count.
    Escaped(f64),
    /// Never escaped within the iteration cap.
    Interior,
    /// Newton: converged toward root `root` after `iterations` steps.
    Root { root: u32, degree: u32, iterations: u32 },
}

/// A fractal kind with its current parameter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fractal {
    Julia(JuliaParams),
    Mandelbrot,
    BurningShip,
    Newton(NewtonParams),
    Phoenix(PhoenixParams),
}

#[inline]
fn cmul(a: DVec2, b: DVec2) -> DVec2 {
    DVec2::new(a.x * b.x - a.y * b.y, a.x * b.y + a.y * b.x)
}

#[inline]
fn cdiv(a: DVec2, b: DVec2) -> DVec2 {
    let denom = b.length_squared();
    DVec2::new(a.x * b.x + a.y * b.y, a.y * b.x - a.x * b.y) / denom
}

#[inline]
fn cpow(z: DVec2, n: i32) -> DVec2 {
    (0..n).fold(DVec2::X, |acc, _| cmul(acc, z))
}

/// `i + 1 - log2(log2 |z|)`, the continuous escape count.
#[inline]
fn smooth_count(i: u32, z: DVec2) -> f64 {
    let log_zn = z.length_squared().ln() / 2.0;
    let nu = (log_zn / LN_2).log2();
    i as f64 + 1.0 - nu
}

/// Iterate `z ← step(z)` until escape or `max_iter`.
#[inline]
fn escape_time(mut z: DVec2, max_iter: u32, mut step: impl FnMut(DVec2) -> DVec2) -> Sample {
    for i in 0..max_iter {
        if z.length_squared() > BAILOUT {
            return Sample::Escaped(smooth_count(i, z));
        }
        z = step(z);
    }
    Sample::Interior
}

impl Fractal {
    /// Build from a parameter set; missing ids fall back to defaults.
    pub fn new(kind: FractalKind, params: &ParameterSet) -> Self {
        match kind {
            FractalKind::Julia => Fractal::Julia(JuliaParams::from_set(params)),
            FractalKind::Mandelbrot => Fractal::Mandelbrot,
            FractalKind::BurningShip => Fractal::BurningShip,
            FractalKind::Newton => Fractal::Newton(NewtonParams::from_set(params)),
            FractalKind::Phoenix => Fractal::Phoenix(PhoenixParams::from_set(params)),
        }
    }

    pub fn kind(&self) -> FractalKind {
        match self {
            Fractal::Julia(_) => FractalKind::Julia,
            Fractal::Mandelbrot => FractalKind::Mandelbrot,
            Fractal::BurningShip => FractalKind::BurningShip,
            Fractal::Newton(_) => FractalKind::Newton,
            Fractal::Phoenix(_) => FractalKind::Phoenix,
        }
    }

    /// Iterate the point `p` of the complex plane.
    pub fn sample(&self, p: DVec2, max_iter: u32) -> Sample {
        match *self {
            Fractal::Julia(j) => {
                let c = DVec2::new(j.c_real as f64, j.c_imag as f64);
                escape_time(p, max_iter, |z| cmul(z, z) + c)
            }
            Fractal::Mandelbrot => escape_time(DVec2::ZERO, max_iter, |z| cmul(z, z) + p),
            Fractal::BurningShip => {
                // Flipped so the ship sits upright
                let c = DVec2::new(p.x, -p.y);
                escape_time(DVec2::ZERO, max_iter, |z| {
                    let z = z.abs();
                    cmul(z, z) + c
                })
            }
            Fractal::Phoenix(ph) => {
                let c = DVec2::new(ph.c_real as f64, ph.c_imag as f64);
                let k = DVec2::new(ph.p_real as f64, ph.p_imag as f64);
                let mut prev = DVec2::ZERO;
                escape_time(p, max_iter, |z| {
                    let next = cmul(z, z) + c + cmul(k, prev);
                    prev = z;
                    next
                })
            }
            Fractal::Newton(n) => newton(p, n, max_iter),
        }
    }

    /// Color of `p`: black inside, otherwise the LUT at
    /// `fract(count / max_iter + offset)`.
    pub fn color(&self, p: DVec2, max_iter: u32, lut: &Lut, offset: f32) -> [u8; 3] {
        match self.sample(p, max_iter) {
            Sample::Interior => [0, 0, 0],
            Sample::Escaped(count) => {
                let t = (count / max_iter.max(1) as f64 + offset as f64).rem_euclid(1.0);
                lut.sample(t as f32)
            }
            Sample::Root { root, degree, iterations } => {
                let t = ((root as f64 + 0.5) / degree as f64 + offset as f64).rem_euclid(1.0);
                let shade = (1.0 - iterations as f64 / max_iter.max(1) as f64).max(0.0).sqrt();
                let [r, g, b] = lut.sample(t as f32);
                let scale = |c: u8| (c as f64 * shade).round() as u8;
                [scale(r), scale(g), scale(b)]
            }
        }
    }
}

fn newton(mut z: DVec2, params: NewtonParams, max_iter: u32) -> Sample {
    let degree = params.degree();
    let relaxation = params.relaxation as f64;
    let mut iterations = max_iter;
    for i in 0..max_iter {
        let fz = cpow(z, degree) - DVec2::X;
        let dfz = cpow(z, degree - 1) * degree as f64;
        if dfz.length_squared() < 1e-12 {
            iterations = i;
            break;
        }
        let delta = cdiv(fz, dfz);
        z -= delta * relaxation;
        if delta.length_squared() < NEWTON_TOLERANCE * NEWTON_TOLERANCE {
            iterations = i;
            break;
        }
    }
    let angle = z.y.atan2(z.x);
    let n = degree as f64;
    // Root k of z^n = 1 sits at angle 2πk/n
    let root = (angle / (2.0 * PI) * n).round().rem_euclid(n) as u32;
    Sample::Root {
        root,
        degree: degree as u32,
        iterations,
    }
}

/// Per-frame rendering settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub max_iter: u32,
    /// Added to the normalized count before the LUT lookup; wraps at 1.
    pub color_offset: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            color_offset: 0.0,
        }
    }
}

/// Complex coordinate at the center of pixel `(x, y)`.
#[inline]
pub fn pixel_center(view: &View, x: u32, y: u32, width: u32, height: u32) -> DVec2 {
    let aspect = width as f64 / height as f64;
    let nx = (x as f64 + 0.5) / width as f64 - 0.5;
    let ny = (y as f64 + 0.5) / height as f64 - 0.5;
    DVec2::new(
        view.center.x + nx * 2.0 * view.zoom * aspect,
        view.center.y - ny * 2.0 * view.zoom,
    )
}

/// Render `fractal` at `view` into a `width × height` image.
///
/// # Panics
///
/// Panics if either dimension is zero.
pub fn render_fractal(
    fractal: &Fractal,
    view: &View,
    settings: &RenderSettings,
    lut: &Lut,
    (width, height): (u32, u32),
) -> RgbaImage {
    assert!(width > 0 && height > 0, "image dimensions must be non-zero");
    let mut image = RgbaImage::new(width, height);
    image
        .par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let p = pixel_center(view, x as u32, y as u32, width, height);
                let [r, g, b] = fractal.color(p, settings.max_iter, lut, settings.color_offset);
                px.copy_from_slice(&[r, g, b, 255]);
            }
        });
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::ColorMap;

    // ========== Catalog ==========

    #[test]
    fn test_catalog_lookup() {
        for kind in FractalKind::ALL {
            assert_eq!(kind.definition().kind, kind);
            assert_eq!(kind.key().parse::<FractalKind>(), Ok(kind));
        }
        assert_eq!(
            get_definition("bogus").unwrap_err(),
            ModelError::UnknownModel("bogus".into())
        );
        let julia = default_parameters("julia").unwrap();
        assert_eq!(julia.get("cReal"), Some(-0.7269));
        assert!(default_parameters("mandelbrot").unwrap().is_empty());
    }

    #[test]
    fn test_presets_and_journeys_are_consistent() {
        for def in all() {
            assert!(!def.presets.is_empty());
            for preset in def.presets {
                for (id, _) in preset.params {
                    assert!(def.param(id).is_some(), "{} {}", def.key, id);
                }
            }
            for journey in def.journeys {
                assert!(journey.waypoints.len() >= 2);
            }
        }
        assert_eq!(journeys("julia").unwrap()[1].waypoints.len(), 13);
    }

    #[test]
    fn test_kind_cycling() {
        assert_eq!(FractalKind::Julia.next(), FractalKind::Mandelbrot);
        assert_eq!(FractalKind::Phoenix.next(), FractalKind::Julia);
        assert_eq!(FractalKind::Julia.previous(), FractalKind::Phoenix);
    }

    // ========== Iteration ==========

    #[test]
    fn test_mandelbrot_interior_and_exterior() {
        let m = Fractal::Mandelbrot;
        assert_eq!(m.sample(DVec2::new(-0.5, 0.0), 256), Sample::Interior);
        assert_eq!(m.sample(DVec2::new(-1.0, 0.0), 256), Sample::Interior);
        match m.sample(DVec2::new(1.0, 1.0), 256) {
            Sample::Escaped(count) => assert!(count > 0.0 && count < 4.0),
            other => panic!("expected escape, got {:?}", other),
        }
    }

    #[test]
    fn test_julia_uses_c() {
        let a = Fractal::new(FractalKind::Julia, &ParameterSet::from_pairs(&[("cReal", 0.0), ("cImag", 0.0)]));
        // c = 0: the unit disk is the filled set
        assert_eq!(a.sample(DVec2::new(0.5, 0.5), 100), Sample::Interior);
        assert!(matches!(a.sample(DVec2::new(1.1, 0.0), 100), Sample::Escaped(_)));
    }

    #[test]
    fn test_burning_ship_escapes_far_out() {
        let s = Fractal::BurningShip;
        assert!(matches!(s.sample(DVec2::new(3.0, 3.0), 64), Sample::Escaped(_)));
        assert_eq!(s.sample(DVec2::ZERO, 64), Sample::Interior);
    }

    #[test]
    fn test_newton_finds_cubic_roots() {
        let n = Fractal::new(FractalKind::Newton, &ParameterSet::new());
        let near_one = n.sample(DVec2::new(1.1, 0.05), 64);
        let near_minus_one_third = n.sample(DVec2::new(-0.5, -0.9), 64);
        match (near_one, near_minus_one_third) {
            (
                Sample::Root { root: a, degree: 3, iterations: ia },
                Sample::Root { root: b, degree: 3, .. },
            ) => {
                assert_ne!(a, b);
                assert!(ia < 10);
            }
            other => panic!("unexpected samples {:?}", other),
        }
    }

    #[test]
    fn test_newton_degree_rounds_and_clamps() {
        let p = NewtonParams { degree: 4.6, relaxation: 1.0 };
        assert_eq!(p.degree(), 5);
        let p = NewtonParams { degree: 12.0, relaxation: 1.0 };
        assert_eq!(p.degree(), 8);
    }

    #[test]
    fn test_phoenix_defaults() {
        let p = Fractal::new(FractalKind::Phoenix, &ParameterSet::new());
        assert_eq!(p, Fractal::Phoenix(PhoenixParams::default()));
        assert!(matches!(p.sample(DVec2::new(1.8, 1.8), 64), Sample::Escaped(_)));
    }

    // ========== Rendering ==========

    #[test]
    fn test_render_mandelbrot_center_is_black() {
        let lut = ColorMap::Classic.lut();
        let view = FractalKind::Mandelbrot.definition().default_view;
        let img = render_fractal(&Fractal::Mandelbrot, &view, &RenderSettings::default(), &lut, (64, 48));
        assert_eq!(img.dimensions(), (64, 48));
        assert_eq!(img.get_pixel(32, 24).0, [0, 0, 0, 255]);
        // Top-left corner is far outside the set
        assert_ne!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_color_offset_wraps() {
        let lut = ColorMap::Rainbow.lut();
        let p = DVec2::new(1.0, 1.0);
        let a = Fractal::Mandelbrot.color(p, 256, &lut, 0.25);
        let b = Fractal::Mandelbrot.color(p, 256, &lut, 1.25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pixel_center_mapping() {
        let view = View::new(1.0, -1.0, 2.0);
        let p = pixel_center(&view, 0, 0, 2, 2);
        // Pixel (0,0) covers the top-left quadrant; its center is half-way out
        assert!((p - DVec2::new(0.0, 0.0)).length() < 1e-12);
    }
}
