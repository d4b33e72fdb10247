//! Brusselator: the classic autocatalytic oscillator.

use rand::Rng;

use crate::buffer::Grid;
use crate::journey::{JourneyDef, WaypointDef};
use crate::kernel::{fill_with_noise, Reaction, UNBOUNDED};
use crate::model::Preset;
use morphogen_derive::ModelParams;

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct Brusselator {
    #[param(id = "A", label = "A", min = 0.5, max = 5.0, default = 1.0, step = 0.1)]
    pub a: f32,
    #[param(id = "B", label = "B", min = 1.0, max = 5.0, default = 3.0, step = 0.1)]
    pub b: f32,
    #[param(id = "Du", label = "Diffusion u", min = 0.5, max = 5.0, default = 1.0, step = 0.1)]
    pub du: f32,
    #[param(id = "Dv", label = "Diffusion v", min = 2.0, max = 20.0, default = 8.0, step = 0.5)]
    pub dv: f32,
    #[param(label = "Time Step", min = 0.001, max = 0.02, default = 0.005, step = 0.001)]
    pub dt: f32,
}

impl Brusselator {
    /// Homogeneous steady state `(A, B/A)`.
    pub fn steady_state(&self) -> [f32; 2] {
        let a = self.a.max(f32::EPSILON);
        [self.a, self.b / a]
    }
}

impl Reaction for Brusselator {
    const CHANNEL_RANGE: [(f32, f32); 2] = [(0.0, UNBOUNDED), (0.0, UNBOUNDED)];
    const BRUSH_CHANNEL: usize = 0;
    const WGSL_REACTION: &'static str = "
    let uuv = s0 * s0 * s1;
    let r0 = du * lap.x + a - (b + 1.0) * s0 + uuv;
    let r1 = dv * lap.y + b * s0 - uuv;
";

    #[inline]
    fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    fn rates(&self, [u, v]: [f32; 2], [lap_u, lap_v]: [f32; 2]) -> [f32; 2] {
        let uuv = u * u * v;
        [
            self.du * lap_u + self.a - (self.b + 1.0) * u + uuv,
            self.dv * lap_v + self.b * u - uuv,
        ]
    }

    fn seed<G: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut G) {
        fill_with_noise(grid, self.steady_state(), 0.1, rng);
    }
}

pub const PRESETS: &[Preset] = &[
    Preset::new("Hex Spots", "Hexagonally arranged spot patterns", &[("A", 1.0), ("B", 3.0), ("Du", 1.0), ("Dv", 8.0), ("dt", 0.005)]),
    Preset::new("Traveling Waves", "Propagating wavefronts", &[("A", 1.0), ("B", 2.5), ("Du", 1.0), ("Dv", 12.0), ("dt", 0.005)]),
    Preset::new("Turing Stripes", "Classic Turing instability stripes", &[("A", 1.5), ("B", 3.5), ("Du", 1.0), ("Dv", 10.0), ("dt", 0.004)]),
];

pub const JOURNEYS: &[JourneyDef] = &[JourneyDef {
    name: "Instability Onset",
    description: "Cross the Turing instability threshold",
    param_x: Some("B"),
    param_y: Some("Dv"),
    waypoints: &[
        WaypointDef::params(&[("A", 1.0), ("B", 2.0), ("Dv", 8.0)]),
        WaypointDef::params(&[("A", 1.0), ("B", 2.5), ("Dv", 8.0)]),
        WaypointDef::params(&[("A", 1.0), ("B", 3.0), ("Dv", 8.0)]),
        WaypointDef::params(&[("A", 1.0), ("B", 3.5), ("Dv", 10.0)]),
    ],
}];
