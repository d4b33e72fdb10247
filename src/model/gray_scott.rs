//! Gray-Scott: `U + 2V → 3V`, `V → P`, with U fed in and V killed off.

use rand::Rng;

use crate::buffer::Grid;
use crate::journey::{JourneyDef, WaypointDef};
use crate::kernel::{stamp_disc, Reaction};
use crate::model::Preset;
use morphogen_derive::ModelParams;

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct GrayScott {
    #[param(label = "Feed Rate (f)", min = 0.0, max = 0.1, default = 0.055, step = 0.001)]
    pub feed: f32,
    #[param(label = "Kill Rate (k)", min = 0.0, max = 0.1, default = 0.062, step = 0.001)]
    pub kill: f32,
    #[param(id = "Du", label = "Diffusion U", min = 0.05, max = 0.5, default = 0.2097, step = 0.001)]
    pub du: f32,
    #[param(id = "Dv", label = "Diffusion V", min = 0.01, max = 0.3, default = 0.105, step = 0.001)]
    pub dv: f32,
    #[param(label = "Time Step", min = 0.2, max = 2.0, default = 1.0, step = 0.1)]
    pub dt: f32,
}

/// Number of seed discs dropped into the uniform `U = 1` field.
const SEED_DISCS: usize = 12;

impl Reaction for GrayScott {
    const CHANNEL_RANGE: [(f32, f32); 2] = [(0.0, 1.0), (0.0, 1.0)];
    const BRUSH_CHANNEL: usize = 1;
    const WGSL_REACTION: &'static str = "
    let uvv = s0 * s1 * s1;
    let r0 = du * lap.x - uvv + feed * (1.0 - s0);
    let r1 = dv * lap.y + uvv - (feed + kill) * s1;
";

    #[inline]
    fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    fn rates(&self, [u, v]: [f32; 2], [lap_u, lap_v]: [f32; 2]) -> [f32; 2] {
        let uvv = u * v * v;
        [
            self.du * lap_u - uvv + self.feed * (1.0 - u),
            self.dv * lap_v + uvv - (self.feed + self.kill) * v,
        ]
    }

    fn seed<G: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut G) {
        grid.fill([1.0, 0.0, 0.0, 0.0]);
        let (w, h) = grid.size();
        for _ in 0..SEED_DISCS {
            let cx = rng.gen::<f32>() * w as f32;
            let cy = rng.gen::<f32>() * h as f32;
            let r = 5.0 + rng.gen::<f32>() * 10.0;
            stamp_disc(grid, cx, cy, r, [0.5, 0.25, 0.0, 0.0]);
        }
    }
}

pub const PRESETS: &[Preset] = &[
    Preset::new("Coral", "Branching coral-like growth patterns", &[("feed", 0.0545), ("kill", 0.062), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Mitosis", "Splitting cell-like blobs", &[("feed", 0.0367), ("kill", 0.0649), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Fingerprint", "Winding labyrinthine ridges", &[("feed", 0.055), ("kill", 0.062), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Zebra", "Bold parallel stripe patterns", &[("feed", 0.04), ("kill", 0.06), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Spots", "Evenly spaced circular dots", &[("feed", 0.03), ("kill", 0.063), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Worms", "Writhing worm-like structures", &[("feed", 0.078), ("kill", 0.061), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Maze", "Dense interconnected maze pathways", &[("feed", 0.029), ("kill", 0.057), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
    Preset::new("Holes", "Swiss cheese void patterns", &[("feed", 0.039), ("kill", 0.058), ("Du", 0.2097), ("Dv", 0.105), ("dt", 1.0)]),
];

pub const JOURNEYS: &[JourneyDef] = &[
    JourneyDef {
        name: "Spots to Stripes",
        description: "Transition from spots through mixed mode to stripe patterns",
        param_x: Some("feed"),
        param_y: Some("kill"),
        waypoints: &[
            WaypointDef::params(&[("feed", 0.03), ("kill", 0.063)]),
            WaypointDef::params(&[("feed", 0.035), ("kill", 0.063)]),
            WaypointDef::params(&[("feed", 0.04), ("kill", 0.062)]),
            WaypointDef::params(&[("feed", 0.045), ("kill", 0.061)]),
            WaypointDef::params(&[("feed", 0.055), ("kill", 0.062)]),
        ],
    },
    JourneyDef {
        name: "Calm to Chaos",
        description: "From stable patterns into chaotic turbulence",
        param_x: Some("feed"),
        param_y: Some("kill"),
        waypoints: &[
            WaypointDef::params(&[("feed", 0.03), ("kill", 0.063)]),
            WaypointDef::params(&[("feed", 0.04), ("kill", 0.06)]),
            WaypointDef::params(&[("feed", 0.05), ("kill", 0.065)]),
            WaypointDef::params(&[("feed", 0.06), ("kill", 0.062)]),
            WaypointDef::params(&[("feed", 0.078), ("kill", 0.061)]),
        ],
    },
    JourneyDef {
        name: "Morphogenesis",
        description: "Explore the full range of Gray-Scott pattern formation",
        param_x: Some("feed"),
        param_y: Some("kill"),
        waypoints: &[
            WaypointDef::params(&[("feed", 0.029), ("kill", 0.057)]),
            WaypointDef::params(&[("feed", 0.0367), ("kill", 0.0649)]),
            WaypointDef::params(&[("feed", 0.0545), ("kill", 0.062)]),
            WaypointDef::params(&[("feed", 0.039), ("kill", 0.058)]),
            WaypointDef::params(&[("feed", 0.03), ("kill", 0.063)]),
        ],
    },
];
