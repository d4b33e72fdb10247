//! # morphogen
//!
//! A reaction-diffusion laboratory and fractal explorer.
//!
//! Five two-species reaction-diffusion models (Gray-Scott, FitzHugh-Nagumo,
//! Gierer-Meinhardt, Brusselator, Schnakenberg) step on a toroidal grid,
//! on the CPU with rayon or on the GPU with generated WGSL compute shaders.
//! Five escape-time and root-finding fractals render on the CPU at `f64`
//! precision. Both modes share color maps, journeys (eased waypoint paths
//! through parameter space) and PNG snapshots.
//!
//! ## Quick Start
//!
//! ```ignore
//! use morphogen::prelude::*;
//!
//! let mut lab = PatternLab::new(LabConfig::new().with_size(256).with_seed(7))?;
//! lab.apply_preset("Mitosis")?;
//! for _ in 0..600 {
//!     lab.tick(1.0 / 60.0);
//! }
//! lab.save_snapshot("mitosis.png")?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Models
//!
//! A model is a struct of named parameters with `#[derive(ModelParams)]` and
//! an implementation of [`Reaction`](kernel::Reaction): the per-cell
//! reaction term in Rust and the same term as a WGSL snippet. The
//! [`Kernel`](kernel::Kernel) enum dispatches over the five models and
//! assembles each model's compute shader.
//!
//! ### Buffers and steppers
//!
//! State lives in a [`PingPong`](buffer::PingPong) pair of grids. A
//! [`Stepper`](stepper::Stepper) runs batches of strictly sequential steps:
//! [`CpuStepper`](stepper::CpuStepper) or the wgpu-backed
//! [`GpuStepper`](gpu::GpuStepper).
//!
//! ### Controllers
//!
//! [`PatternLab`](lab::PatternLab) and
//! [`FractalExplorer`](explorer::FractalExplorer) own all mode state; every
//! write goes through a method and `tick(dt)` reports what changed.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`model`] | Model catalog, presets, journeys |
//! | [`fractal`] | Fractal kinds, sampling, rendering, animation |
//! | [`journey`] | Waypoint interpolation, playback, path recording |
//! | [`viewport`] | Pan, zoom, inertia, gestures, infinite zoom |
//! | [`colormap`] | Color maps and lookup tables |
//! | [`viewer`] | winit window presenting either controller |

extern crate self as morphogen;

pub mod brush;
pub mod buffer;
pub mod colormap;
pub mod config;
pub mod error;
pub mod explorer;
pub mod fractal;
pub mod gpu;
pub mod input;
pub mod journey;
pub mod kernel;
pub mod lab;
pub mod model;
pub mod params;
pub mod render;
pub mod stepper;
pub mod time;
pub mod viewer;
pub mod viewport;

pub use glam::{DVec2, Vec2};
pub use morphogen_derive::ModelParams;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use morphogen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colormap::ColorMap;
    pub use crate::config::{Config, ExplorerConfig, LabConfig};
    pub use crate::error::{ConfigError, GpuError, ModelError, SnapshotError};
    pub use crate::explorer::FractalExplorer;
    pub use crate::fractal::FractalKind;
    pub use crate::journey::{Journey, JourneyPlayer, PlaybackState, Waypoint};
    pub use crate::kernel::{Kernel, Reaction};
    pub use crate::lab::{PatternLab, SimSlot};
    pub use crate::model::ModelId;
    pub use crate::params::{ModelParams, ParameterSet};
    pub use crate::stepper::{Backend, Stepper};
    pub use crate::viewport::View;
    pub use crate::{DVec2, Vec2};
    pub use morphogen_derive::ModelParams;
}
