//! Brush input: pointer position to a simulation-space perturbation.
//!
//! [`BrushInput`] follows press/drag/release on the canvas and turns the
//! pointer into a [`BrushUniform`], the small struct the stepper consumes
//! once per step. Positions are normalized to `[0, 1]²` with x to the right
//! and y down, matching grid row order. An inactive brush sits at the
//! `(-1, -1)` sentinel and contributes exactly nothing.

use glam::Vec2;

/// Default brush radius, in simulation cells.
pub const DEFAULT_RADIUS_PX: f32 = 20.0;
/// Default amount added at the brush center per step.
pub const DEFAULT_INTENSITY: f32 = 0.5;

/// Brush parameters as seen by one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushUniform {
    /// Normalized position, or `(-1, -1)` when inactive.
    pub position: Vec2,
    /// Radius as a fraction of the grid width.
    pub radius: f32,
    pub intensity: f32,
}

impl BrushUniform {
    pub const INACTIVE_POSITION: Vec2 = Vec2::new(-1.0, -1.0);

    pub fn inactive() -> Self {
        Self {
            position: Self::INACTIVE_POSITION,
            radius: 0.0,
            intensity: 0.0,
        }
    }

    pub fn at(position: Vec2, radius: f32, intensity: f32) -> Self {
        Self { position, radius, intensity }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.position.x >= 0.0 && self.radius > 0.0
    }

    /// Amount added at normalized point `uv`: `intensity * smoothstep(radius, 0, d)`.
    #[inline]
    pub fn amount_at(&self, uv: Vec2) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        let t = (1.0 - uv.distance(self.position) / self.radius).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t) * self.intensity
    }
}

impl Default for BrushUniform {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Where the simulation is drawn inside the window, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl CanvasRect {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// A canvas covering a whole `width × height` window.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width as f32, height as f32))
    }

    /// Pointer position relative to the canvas, in `[0, 1]²` when inside.
    pub fn normalize(&self, pointer: Vec2) -> Vec2 {
        (pointer - self.origin) / self.size.max(Vec2::ONE)
    }

    pub fn contains(&self, pointer: Vec2) -> bool {
        let n = self.normalize(pointer);
        (0.0..=1.0).contains(&n.x) && (0.0..=1.0).contains(&n.y)
    }
}

/// Press/drag/release tracker producing the per-frame brush state.
#[derive(Debug, Clone)]
pub struct BrushInput {
    radius_px: f32,
    intensity: f32,
    sim_width: u32,
    canvas: CanvasRect,
    position: Option<Vec2>,
}

impl BrushInput {
    /// Brush for a grid `sim_width` cells wide, drawn on an 800×800 canvas
    /// until [`set_canvas`](Self::set_canvas) says otherwise.
    pub fn new(sim_width: u32) -> Self {
        Self {
            radius_px: DEFAULT_RADIUS_PX,
            intensity: DEFAULT_INTENSITY,
            sim_width: sim_width.max(1),
            canvas: CanvasRect::full(800, 800),
            position: None,
        }
    }

    pub fn with_radius(mut self, radius_px: f32) -> Self {
        self.radius_px = radius_px.max(0.0);
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn set_radius(&mut self, radius_px: f32) {
        self.radius_px = radius_px.max(0.0);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    pub fn set_canvas(&mut self, canvas: CanvasRect) {
        self.canvas = canvas;
    }

    pub fn canvas(&self) -> CanvasRect {
        self.canvas
    }

    pub fn radius_px(&self) -> f32 {
        self.radius_px
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Start painting. Presses outside the canvas are ignored; returns whether
    /// the brush became active.
    pub fn press(&mut self, pointer: Vec2) -> bool {
        if !self.canvas.contains(pointer) {
            return false;
        }
        self.position = Some(self.canvas.normalize(pointer));
        true
    }

    /// Move the brush while pressed. No-op when not painting.
    pub fn drag(&mut self, pointer: Vec2) {
        if self.position.is_some() {
            self.position = Some(self.canvas.normalize(pointer));
        }
    }

    pub fn release(&mut self) {
        self.position = None;
    }

    /// The pointer left the canvas.
    pub fn leave(&mut self) {
        self.position = None;
    }

    pub fn is_active(&self) -> bool {
        self.position.is_some()
    }

    /// Normalized brush position while painting.
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Brush radius in canvas pixels, for drawing a cursor outline.
    pub fn display_radius(&self) -> f32 {
        self.radius_px / self.sim_width as f32 * self.canvas.size.x
    }

    /// Brush state for the next step.
    pub fn uniform(&self) -> BrushUniform {
        match self.position {
            Some(position) => BrushUniform::at(
                position,
                self.radius_px / self.sim_width as f32,
                self.intensity,
            ),
            None => BrushUniform::inactive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falloff_peak_and_edge() {
        let brush = BrushUniform::at(Vec2::new(0.5, 0.5), 0.1, 0.5);
        assert!((brush.amount_at(Vec2::new(0.5, 0.5)) - 0.5).abs() < 1e-6);
        assert_eq!(brush.amount_at(Vec2::new(0.6, 0.5)), 0.0);
        assert_eq!(brush.amount_at(Vec2::new(0.9, 0.9)), 0.0);

        let half = brush.amount_at(Vec2::new(0.55, 0.5));
        assert!((half - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_inactive_is_exactly_zero() {
        let brush = BrushUniform::inactive();
        assert!(!brush.is_active());
        assert_eq!(brush.amount_at(Vec2::new(0.0, 0.0)), 0.0);
        assert_eq!(brush.amount_at(Vec2::new(-1.0, -1.0)), 0.0);
    }

    #[test]
    fn test_zero_radius_is_inert() {
        let brush = BrushUniform::at(Vec2::new(0.5, 0.5), 0.0, 1.0);
        assert_eq!(brush.amount_at(Vec2::new(0.5, 0.5)), 0.0);
    }

    #[test]
    fn test_press_drag_release() {
        let mut input = BrushInput::new(512);
        input.set_canvas(CanvasRect::new(Vec2::new(100.0, 0.0), Vec2::new(400.0, 400.0)));

        assert!(!input.press(Vec2::new(50.0, 50.0)));
        assert_eq!(input.uniform(), BrushUniform::inactive());

        assert!(input.press(Vec2::new(300.0, 100.0)));
        let u = input.uniform();
        assert_eq!(u.position, Vec2::new(0.5, 0.25));
        assert!((u.radius - 20.0 / 512.0).abs() < 1e-7);
        assert_eq!(u.intensity, DEFAULT_INTENSITY);

        input.drag(Vec2::new(500.0, 400.0));
        assert_eq!(input.uniform().position, Vec2::new(1.0, 1.0));

        input.release();
        assert_eq!(input.uniform().position, BrushUniform::INACTIVE_POSITION);
        input.drag(Vec2::new(300.0, 100.0));
        assert!(!input.is_active());
    }

    #[test]
    fn test_display_radius_scales_with_canvas() {
        let mut input = BrushInput::new(512).with_radius(32.0);
        input.set_canvas(CanvasRect::full(1024, 1024));
        assert!((input.display_radius() - 64.0).abs() < 1e-4);
    }
}
