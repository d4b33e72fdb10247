//! Parameter oscillation and color cycling for the fractal explorer.

use super::FractalKind;
use crate::params::ParameterSet;

/// Radius of the circle Julia's `c` travels while animating.
pub const JULIA_ORBIT_RADIUS: f32 = 0.7885;
/// Color offset added per frame at cycle speed 1.
pub const COLOR_CYCLE_STEP: f32 = 0.001;

/// Drives animated parameters from an internal clock.
#[derive(Debug, Clone)]
pub struct AnimationController {
    active: bool,
    speed: f32,
    elapsed: f32,
    color_cycling: bool,
    color_cycle_speed: f32,
}

impl AnimationController {
    pub fn new() -> Self {
        Self {
            active: false,
            speed: 1.0,
            elapsed: 0.0,
            color_cycling: false,
            color_cycle_speed: 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start or stop parameter animation. Starting rewinds the clock.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        if self.active {
            self.elapsed = 0.0;
        }
        self.active
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn is_color_cycling(&self) -> bool {
        self.color_cycling
    }

    pub fn set_color_cycling(&mut self, on: bool) {
        self.color_cycling = on;
    }

    pub fn set_color_cycle_speed(&mut self, speed: f32) {
        self.color_cycle_speed = speed;
    }

    /// Advance one frame. Writes animated parameters into `params` and the
    /// color offset into `color_offset`. Returns whether anything changed.
    pub fn update(
        &mut self,
        kind: FractalKind,
        params: &mut ParameterSet,
        color_offset: &mut f32,
        dt: f32,
    ) -> bool {
        let mut changed = false;
        if self.color_cycling {
            *color_offset = (*color_offset + COLOR_CYCLE_STEP * self.color_cycle_speed).rem_euclid(1.0);
            changed = true;
        }

        if !self.active {
            return changed;
        }
        self.elapsed += dt * self.speed;
        let t = self.elapsed;

        match kind {
            FractalKind::Julia => {
                params.insert("cReal", JULIA_ORBIT_RADIUS * t.cos());
                params.insert("cImag", JULIA_ORBIT_RADIUS * t.sin());
                true
            }
            FractalKind::Phoenix => {
                params.insert("pReal", -0.5 + 0.3 * t.sin());
                true
            }
            FractalKind::Newton => {
                params.insert("relaxation", 1.0 + 0.3 * (t * 0.5).sin());
                true
            }
            FractalKind::Mandelbrot | FractalKind::BurningShip => changed,
        }
    }
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}
