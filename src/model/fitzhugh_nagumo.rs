//! FitzHugh-Nagumo: an excitable medium with a fast activator `v` and a
//! slow recovery variable `w`. Produces spirals and target waves.

use rand::Rng;

use crate::buffer::Grid;
use crate::journey::{JourneyDef, WaypointDef};
use crate::kernel::{fill_with_noise, Reaction};
use crate::model::Preset;
use morphogen_derive::ModelParams;

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct FitzHughNagumo {
    #[param(label = "Epsilon", min = 0.001, max = 0.1, default = 0.02, step = 0.001)]
    pub epsilon: f32,
    #[param(label = "a0", min = -0.5, max = 0.5, default = -0.03, step = 0.01)]
    pub a0: f32,
    #[param(label = "a1", min = 0.5, max = 5.0, default = 2.0, step = 0.1)]
    pub a1: f32,
    #[param(label = "Stimulus (I)", min = -0.5, max = 0.5, default = 0.0, step = 0.01)]
    pub stimulus: f32,
    #[param(id = "Dv", label = "Diffusion v", min = 0.1, max = 3.0, default = 1.0, step = 0.1)]
    pub dv: f32,
    #[param(id = "Dw", label = "Diffusion w", min = 0.0, max = 2.0, default = 0.5, step = 0.05)]
    pub dw: f32,
    #[param(label = "Time Step", min = 0.005, max = 0.05, default = 0.015, step = 0.001)]
    pub dt: f32,
}

impl Reaction for FitzHughNagumo {
    const CHANNEL_RANGE: [(f32, f32); 2] = [(-2.0, 2.0), (-2.0, 2.0)];
    const BRUSH_CHANNEL: usize = 0;
    const WGSL_REACTION: &'static str = "
    let r0 = dv * lap.x + s0 - s0 * s0 * s0 - s1 + stimulus;
    let r1 = dw * lap.y + epsilon * (s0 - a1 * s1 - a0);
";

    #[inline]
    fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    fn rates(&self, [v, w]: [f32; 2], [lap_v, lap_w]: [f32; 2]) -> [f32; 2] {
        [
            self.dv * lap_v + v - v * v * v - w + self.stimulus,
            self.dw * lap_w + self.epsilon * (v - self.a1 * w - self.a0),
        ]
    }

    fn seed<G: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut G) {
        fill_with_noise(grid, [0.0, 0.0], 0.2, rng);
    }
}

pub const PRESETS: &[Preset] = &[
    Preset::new("Spiral Waves", "Rotating spiral wave patterns", &[("Dv", 1.0), ("Dw", 0.5), ("epsilon", 0.02), ("a0", -0.03), ("a1", 2.0), ("stimulus", 0.0), ("dt", 0.015)]),
    Preset::new("Target Waves", "Expanding concentric ring waves", &[("Dv", 1.0), ("Dw", 0.0), ("epsilon", 0.02), ("a0", 0.1), ("a1", 2.0), ("stimulus", 0.0), ("dt", 0.015)]),
    Preset::new("Chaos", "Turbulent chaotic excitation", &[("Dv", 1.0), ("Dw", 0.1), ("epsilon", 0.05), ("a0", -0.1), ("a1", 1.5), ("stimulus", 0.0), ("dt", 0.01)]),
    Preset::new("Breathing", "Oscillating breathing pulses", &[("Dv", 1.0), ("Dw", 0.5), ("epsilon", 0.01), ("a0", 0.0), ("a1", 2.5), ("stimulus", 0.1), ("dt", 0.015)]),
];

pub const JOURNEYS: &[JourneyDef] = &[JourneyDef {
    name: "Spiral Evolution",
    description: "Watch spirals form and evolve",
    param_x: Some("epsilon"),
    param_y: Some("a0"),
    waypoints: &[
        WaypointDef::params(&[("epsilon", 0.01), ("a0", 0.0)]),
        WaypointDef::params(&[("epsilon", 0.02), ("a0", -0.03)]),
        WaypointDef::params(&[("epsilon", 0.03), ("a0", -0.05)]),
        WaypointDef::params(&[("epsilon", 0.05), ("a0", -0.1)]),
    ],
}];
