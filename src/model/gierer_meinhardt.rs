//! Gierer-Meinhardt: short-range activator `a`, long-range inhibitor `h`.

use rand::Rng;

use crate::buffer::Grid;
use crate::journey::JourneyDef;
use crate::kernel::{fill_with_noise, Reaction, UNBOUNDED};
use crate::model::Preset;
use morphogen_derive::ModelParams;

/// Floor applied to the inhibitor before it is used as a divisor.
pub const INHIBITOR_FLOOR: f32 = 0.001;

#[derive(ModelParams, Debug, Clone, Copy, PartialEq)]
pub struct GiererMeinhardt {
    #[param(id = "Da", label = "Diffusion a", min = 0.001, max = 0.1, default = 0.01, step = 0.001)]
    pub da: f32,
    #[param(id = "Dh", label = "Diffusion h", min = 0.1, max = 2.0, default = 0.5, step = 0.01)]
    pub dh: f32,
    #[param(label = "Production (rho)", min = 0.1, max = 5.0, default = 1.0, step = 0.1)]
    pub rho: f32,
    #[param(label = "Decay a", min = 0.1, max = 3.0, default = 1.0, step = 0.1)]
    pub mu_a: f32,
    #[param(label = "Decay h", min = 0.1, max = 3.0, default = 1.0, step = 0.1)]
    pub mu_h: f32,
    #[param(label = "Base prod a", min = 0.0, max = 0.1, default = 0.01, step = 0.001)]
    pub rho_a: f32,
    #[param(label = "Time Step", min = 0.1, max = 2.0, default = 0.5, step = 0.05)]
    pub dt: f32,
}

impl Reaction for GiererMeinhardt {
    const CHANNEL_RANGE: [(f32, f32); 2] = [(0.0, UNBOUNDED), (0.0, UNBOUNDED)];
    const BRUSH_CHANNEL: usize = 0;
    const WGSL_REACTION: &'static str = "
    let h_safe = max(s1, 0.001);
    let r0 = da * lap.x + rho * (s0 * s0 / h_safe) - mu_a * s0 + rho_a;
    let r1 = dh * lap.y + rho * s0 * s0 - mu_h * s1;
";

    #[inline]
    fn dt(&self) -> f32 {
        self.dt
    }

    #[inline]
    fn rates(&self, [a, h]: [f32; 2], [lap_a, lap_h]: [f32; 2]) -> [f32; 2] {
        let h_safe = h.max(INHIBITOR_FLOOR);
        [
            self.da * lap_a + self.rho * (a * a / h_safe) - self.mu_a * a + self.rho_a,
            self.dh * lap_h + self.rho * a * a - self.mu_h * h,
        ]
    }

    fn seed<G: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut G) {
        fill_with_noise(grid, [1.0, 1.0], 0.1, rng);
    }
}

pub const PRESETS: &[Preset] = &[
    Preset::new("Spots", "Isolated activator peaks", &[("Da", 0.01), ("Dh", 0.5), ("rho", 1.0), ("mu_a", 1.0), ("mu_h", 1.0), ("rho_a", 0.01), ("dt", 0.5)]),
    Preset::new("Stripes", "Elongated stripe formations", &[("Da", 0.02), ("Dh", 0.8), ("rho", 1.5), ("mu_a", 1.2), ("mu_h", 0.8), ("rho_a", 0.02), ("dt", 0.5)]),
    Preset::new("Labyrinth", "Complex branching labyrinth", &[("Da", 0.03), ("Dh", 1.0), ("rho", 2.0), ("mu_a", 1.0), ("mu_h", 1.5), ("rho_a", 0.005), ("dt", 0.3)]),
    Preset::new("Dense Dots", "Tightly packed small dot patterns", &[("Da", 0.005), ("Dh", 0.3), ("rho", 0.8), ("mu_a", 0.8), ("mu_h", 1.2), ("rho_a", 0.02), ("dt", 0.5)]),
];

pub const JOURNEYS: &[JourneyDef] = &[];
