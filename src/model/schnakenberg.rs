//! Schnakenberg: a two-species substrate-depletion model.

use rand::Rng;

use crate::buffer::Grid;
use crate::journey::JourneyDef;
use crate::kernel::{fill_with_noise, Reaction, UNBOUNDED};
use crate::model::Preset;
use morphogen_derive::ModelParams;

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct Schnakenberg {
    #[param(label = "a", min = 0.01, max = 0.5, default = 0.1, step = 0.01)]
    pub a: f32,
    #[param(label = "b", min = 0.5, max = 2.0, default = 0.9, step = 0.01)]
    pub b: f32,
    #[param(id = "Du", label = "Diffusion u", min = 0.5, max = 5.0, default = 1.0, step = 0.1)]
    pub du: f32,
    #[param(id = "Dv", label = "Diffusion v", min = 5.0, max = 50.0, default = 20.0, step = 1.0)]
    pub dv: f32,
    #[param(label = "Time Step", min = 0.001, max = 0.05, default = 0.01, step = 0.001)]
    pub dt: f32,
}

impl Schnakenberg {
    /// Homogeneous steady state `(a + b, b / (a + b)²)`.
    pub fn steady_state(&self) -> [f32; 2] {
        let u = self.a + self.b;
        let u_safe = u.max(f32::EPSILON);
        [u, self.b / (u_safe * u_safe)]
    }
}

impl Reaction for Schnakenberg {
    const CHANNEL_RANGE: [(f32, f32); 2] = [(0.0, UNBOUNDED), (0.0, UNBOUNDED)];
    const BRUSH_CHANNEL: usize = 0;
    const WGSL_REACTION: &'static str = "
    let uuv = s0 * s0 * s1;
    let r0 = du * lap.x + a - s0 + uuv;
    let r1 = dv * lap.y + b - uuv;
";

    #[inline]
    fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    fn rates(&self, [u, v]: [f32; 2], [lap_u, lap_v]: [f32; 2]) -> [f32; 2] {
        let uuv = u * u * v;
        [self.du * lap_u + self.a - u + uuv, self.dv * lap_v + self.b - uuv]
    }

    fn seed<G: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut G) {
        fill_with_noise(grid, self.steady_state(), 0.1, rng);
    }
}

pub const PRESETS: &[Preset] = &[
    Preset::new("Spots", "Round spot array formation", &[("a", 0.1), ("b", 0.9), ("Du", 1.0), ("Dv", 20.0), ("dt", 0.01)]),
    Preset::new("Mixed Mode", "Mixture of spots and short stripes", &[("a", 0.05), ("b", 1.0), ("Du", 1.0), ("Dv", 30.0), ("dt", 0.008)]),
    Preset::new("Oscillating", "Slowly oscillating concentration waves", &[("a", 0.2), ("b", 0.8), ("Du", 1.0), ("Dv", 15.0), ("dt", 0.01)]),
];

pub const JOURNEYS: &[JourneyDef] = &[];
