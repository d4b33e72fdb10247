//! The fractal explorer controller.
//!
//! [`FractalExplorer`] owns fractal-mode state: kind, parameters, the
//! interactive [`Viewport`], infinite zoom, parameter animation, journey
//! playback and the last rendered frame. Pointer and keyboard events come in
//! through methods; [`FractalExplorer::tick`] runs, in order, animation,
//! journey, inertia and infinite zoom, then re-renders if anything changed.

use std::path::Path;

use glam::DVec2;
use image::RgbaImage;

use crate::colormap::{ColorMap, Lut};
use crate::config::ExplorerConfig;
use crate::error::{ModelError, SnapshotError};
use crate::fractal::{
    render_fractal, AnimationController, Fractal, FractalDefinition, FractalKind, RenderSettings,
};
use crate::journey::{Journey, JourneyFrame, JourneyPlayer, PlaybackState};
use crate::params::ParameterSet;
use crate::viewport::{InfiniteZoom, SwipeDirection, View, Viewport};

/// Iteration cap for the linked-mode Julia preview.
pub const PREVIEW_MAX_ITER: u32 = 150;
/// Edge of the linked-mode Julia preview, in pixels.
pub const PREVIEW_SIZE: u32 = 200;
/// Fixed view the Julia preview is drawn at.
pub const PREVIEW_VIEW: View = View::new(0.0, 0.0, 1.5);

/// What one [`FractalExplorer::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExplorerReport {
    /// Animation, journey, inertia or infinite zoom changed the state.
    pub changed: bool,
    pub rendered: bool,
}

/// Controller for fractal mode.
pub struct FractalExplorer {
    kind: FractalKind,
    params: ParameterSet,
    viewport: Viewport,
    infinite_zoom: InfiniteZoom,
    animation: AnimationController,
    player: JourneyPlayer,
    max_iter: u32,
    palette: ColorMap,
    lut: Lut,
    color_offset: f32,
    linked: bool,
    hover: Option<DVec2>,
    frame: Option<RgbaImage>,
    version: u64,
    dirty: bool,
}

impl FractalExplorer {
    pub fn new(config: ExplorerConfig) -> Self {
        let def = config.kind.definition();
        let mut infinite_zoom = InfiniteZoom::new();
        infinite_zoom.set_enabled(config.infinite_zoom);
        log::info!(
            "Fractal explorer: {} at {}x{}",
            def.display_name,
            config.width,
            config.height
        );
        Self {
            kind: config.kind,
            params: def.default_parameters(),
            viewport: Viewport::new(def.default_view, config.width, config.height),
            infinite_zoom,
            animation: AnimationController::new(),
            player: JourneyPlayer::new(),
            max_iter: config.max_iter.max(1),
            palette: config.palette,
            lut: config.palette.lut(),
            color_offset: 0.0,
            linked: config.linked,
            hover: None,
            frame: None,
            version: 0,
            dirty: true,
        }
    }

    pub fn kind(&self) -> FractalKind {
        self.kind
    }

    pub fn definition(&self) -> &'static FractalDefinition {
        self.kind.definition()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn view(&self) -> View {
        self.viewport.view()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    pub fn palette(&self) -> ColorMap {
        self.palette
    }

    pub fn color_offset(&self) -> f32 {
        self.color_offset
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    pub fn infinite_zoom(&self) -> &InfiniteZoom {
        &self.infinite_zoom
    }

    pub fn player(&self) -> &JourneyPlayer {
        &self.player
    }

    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn touch(&mut self) {
        self.version += 1;
        self.dirty = true;
    }

    // ========== Kind & parameters ==========

    /// Switch kinds: parameters and view go back to the kind's defaults and
    /// any journey is dropped.
    pub fn set_kind(&mut self, kind: FractalKind) {
        if kind == self.kind {
            return;
        }
        let def = kind.definition();
        log::info!("Switching fractal to {}", def.display_name);
        self.kind = kind;
        self.params = def.default_parameters();
        self.viewport.set_view(def.default_view);
        self.player.unload();
        self.touch();
    }

    pub fn next_kind(&mut self) {
        self.set_kind(self.kind.next());
    }

    pub fn previous_kind(&mut self) {
        self.set_kind(self.kind.previous());
    }

    pub fn set_param(&mut self, id: &str, value: f32) -> Result<(), ModelError> {
        let def = self.definition();
        let param = def.param(id).ok_or_else(|| ModelError::UnknownParameter {
            model: def.key.to_string(),
            param: id.to_string(),
        })?;
        self.params.insert(param.id, value);
        self.touch();
        Ok(())
    }

    /// Apply a preset by name: listed parameters are overwritten and the
    /// view jumps if the preset carries one.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), ModelError> {
        let preset = self.definition().preset(name)?;
        self.params.merge(&preset.parameters());
        if let Some(view) = preset.view {
            self.viewport.set_view(view);
        }
        log::debug!("Applied preset '{}'", preset.name);
        self.touch();
        Ok(())
    }

    pub fn apply_preset_index(&mut self, index: usize) -> Result<(), ModelError> {
        let def = self.definition();
        let preset = def.presets.get(index).ok_or_else(|| ModelError::UnknownPreset {
            model: def.key.to_string(),
            preset: format!("#{}", index + 1),
        })?;
        self.apply_preset(preset.name)
    }

    pub fn reset_view(&mut self) {
        self.viewport.set_view(self.definition().default_view);
        self.touch();
    }

    pub fn set_max_iter(&mut self, max_iter: u32) {
        self.max_iter = max_iter.max(1);
        self.touch();
    }

    pub fn set_palette(&mut self, palette: ColorMap) {
        self.palette = palette;
        self.lut = palette.lut();
        self.touch();
    }

    pub fn cycle_palette(&mut self) -> ColorMap {
        let next = self.palette.next();
        self.set_palette(next);
        next
    }

    pub fn set_linked(&mut self, linked: bool) {
        self.linked = linked;
        if !linked {
            self.hover = None;
        }
    }

    pub fn toggle_animation(&mut self) -> bool {
        self.animation.toggle()
    }

    pub fn set_animation_speed(&mut self, speed: f32) {
        self.animation.set_speed(speed);
    }

    pub fn toggle_color_cycling(&mut self) -> bool {
        let on = !self.animation.is_color_cycling();
        self.animation.set_color_cycling(on);
        on
    }

    pub fn set_color_cycle_speed(&mut self, speed: f32) {
        self.animation.set_color_cycle_speed(speed);
    }

    pub fn toggle_infinite_zoom(&mut self) -> bool {
        let on = !self.infinite_zoom.is_enabled();
        self.infinite_zoom.set_enabled(on);
        log::info!("Infinite zoom {}", if on { "on" } else { "off" });
        on
    }

    // ========== Viewport input ==========

    /// The window was resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height);
        self.touch();
    }

    fn accepts_input(&self) -> bool {
        !self.infinite_zoom.is_transitioning()
    }

    fn interacted(&mut self) {
        self.player.pause_for_interaction();
        self.touch();
    }

    /// Primary pointer pressed at `pixel` at `time` seconds. A second press
    /// in quick succession zooms in; otherwise a drag starts.
    pub fn pointer_pressed(&mut self, pixel: DVec2, time: f64) {
        if !self.accepts_input() {
            return;
        }
        if self.viewport.tap(pixel, time) {
            self.interacted();
        } else {
            self.viewport.begin_drag(pixel, time);
        }
    }

    /// Pointer moved. Drags pan the view; in linked mode the hovered point
    /// feeds the Julia preview.
    pub fn pointer_moved(&mut self, pixel: DVec2, time: f64) {
        if self.linked && self.kind == FractalKind::Mandelbrot {
            self.hover = Some(self.viewport.pixel_to_complex(pixel));
        }
        if self.accepts_input() && self.viewport.drag_to(pixel, time) {
            self.interacted();
        }
    }

    pub fn pointer_released(&mut self) {
        self.viewport.end_drag();
    }

    pub fn pointer_left(&mut self) {
        self.viewport.end_drag();
        self.hover = None;
    }

    /// A click that did not turn into a drag. In linked mode on the
    /// Mandelbrot set it opens the Julia set for the clicked point.
    /// Returns whether it did.
    pub fn click(&mut self, pixel: DVec2) -> bool {
        if !self.linked || self.kind != FractalKind::Mandelbrot {
            return false;
        }
        let c = self.viewport.pixel_to_complex(pixel);
        self.set_kind(FractalKind::Julia);
        self.params.insert("cReal", c.x as f32);
        self.params.insert("cImag", c.y as f32);
        self.hover = None;
        log::info!("Linked: Julia set at c = {:.5} + {:.5}i", c.x, c.y);
        self.touch();
        true
    }

    pub fn wheel(&mut self, pixel: DVec2, delta_y: f64) {
        if !self.accepts_input() || delta_y == 0.0 {
            return;
        }
        self.viewport.wheel(pixel, delta_y);
        self.interacted();
    }

    /// Two touch points moved.
    pub fn pinch(&mut self, a: DVec2, b: DVec2) {
        if self.accepts_input() && self.viewport.pinch(a, b) {
            self.interacted();
        }
    }

    pub fn end_pinch(&mut self) {
        self.viewport.end_pinch();
    }

    pub fn begin_swipe(&mut self, x: f64) {
        self.viewport.begin_swipe(x);
    }

    /// Three-finger swipe update; switches kinds once the swipe is long
    /// enough.
    pub fn swipe_to(&mut self, x: f64) {
        match self.viewport.swipe_to(x) {
            Some(SwipeDirection::Next) => self.next_kind(),
            Some(SwipeDirection::Previous) => self.previous_kind(),
            None => {}
        }
    }

    pub fn cancel_gestures(&mut self) {
        self.viewport.cancel_gestures();
    }

    /// Keyboard pan; `(1, 0)` moves right, `(0, 1)` up.
    pub fn pan(&mut self, steps: DVec2) {
        if !self.accepts_input() {
            return;
        }
        self.viewport.pan_steps(steps);
        self.interacted();
    }

    pub fn zoom_in(&mut self) {
        if !self.accepts_input() {
            return;
        }
        self.viewport.zoom_in();
        self.interacted();
    }

    pub fn zoom_out(&mut self) {
        if !self.accepts_input() {
            return;
        }
        self.viewport.zoom_out();
        self.interacted();
    }

    // ========== Journeys ==========

    pub fn play_journey(&mut self, name: &str) -> Result<bool, ModelError> {
        let def = self.definition();
        let journey = def
            .journeys
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| ModelError::UnknownJourney {
                model: def.key.to_string(),
                journey: name.to_string(),
            })?;
        Ok(self.play(Journey::from_def(journey)))
    }

    pub fn play(&mut self, journey: Journey) -> bool {
        self.player.play(journey)
    }

    /// Pause or resume the loaded journey, or start the kind's first
    /// journey when nothing is loaded.
    pub fn toggle_journey(&mut self) -> PlaybackState {
        if self.player.journey().is_none() {
            if let Some(def) = self.definition().journeys.first() {
                self.player.play(Journey::from_def(def));
            }
            return self.player.state();
        }
        self.player.toggle()
    }

    pub fn stop_journey(&mut self) {
        self.player.stop();
    }

    pub fn set_journey_looping(&mut self, looping: bool) {
        self.player.set_looping(looping);
    }

    pub fn skip_forward(&mut self) {
        if let Some(frame) = self.player.skip_forward() {
            self.apply_journey_frame(frame);
        }
    }

    pub fn skip_back(&mut self) {
        if let Some(frame) = self.player.skip_back() {
            self.apply_journey_frame(frame);
        }
    }

    fn apply_journey_frame(&mut self, frame: JourneyFrame) {
        self.params.merge(&frame.params);
        if let Some(view) = frame.view {
            self.viewport.set_view(view);
        }
        self.touch();
    }

    // ========== Frame ==========

    /// Advance one frame by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> ExplorerReport {
        let mut report = ExplorerReport::default();

        if self
            .animation
            .update(self.kind, &mut self.params, &mut self.color_offset, dt)
        {
            report.changed = true;
        }

        if let Some(frame) = self.player.update(dt) {
            self.apply_journey_frame(frame);
            report.changed = true;
        }

        if self.viewport.update_inertia(dt as f64) {
            report.changed = true;
        }

        let home = self.definition().default_view;
        if self.infinite_zoom.update(&mut self.viewport, home, dt as f64) {
            report.changed = true;
        }

        if report.changed {
            self.touch();
        }
        if self.dirty {
            self.frame = Some(self.render_frame());
            self.dirty = false;
            report.rendered = true;
        }
        report
    }

    fn settings(&self) -> RenderSettings {
        RenderSettings {
            max_iter: self.max_iter,
            color_offset: self.color_offset,
        }
    }

    /// Render the current state at the viewport's size.
    pub fn render_frame(&self) -> RgbaImage {
        let fractal = Fractal::new(self.kind, &self.params);
        let size = self.viewport.screen_size();
        render_fractal(
            &fractal,
            &self.viewport.view(),
            &self.settings(),
            &self.lut,
            (size.x as u32, size.y as u32),
        )
    }

    /// Julia set for the hovered point, while linked mode is on over the
    /// Mandelbrot set.
    pub fn julia_preview(&self) -> Option<RgbaImage> {
        if !self.linked || self.kind != FractalKind::Mandelbrot {
            return None;
        }
        let c = self.hover?;
        let params = ParameterSet::from_pairs(&[("cReal", c.x as f32), ("cImag", c.y as f32)]);
        let settings = RenderSettings {
            max_iter: self.max_iter.min(PREVIEW_MAX_ITER),
            color_offset: self.color_offset,
        };
        Some(render_fractal(
            &Fractal::new(FractalKind::Julia, &params),
            &PREVIEW_VIEW,
            &settings,
            &self.lut,
            (PREVIEW_SIZE, PREVIEW_SIZE),
        ))
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let frame = self.frame.as_ref().ok_or(SnapshotError::NoFrame)?;
        frame.save(path.as_ref())?;
        log::info!("Saved snapshot to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::Waypoint;

    fn explorer(kind: FractalKind) -> FractalExplorer {
        FractalExplorer::new(
            ExplorerConfig::new()
                .with_kind(kind)
                .with_dimensions(64, 48)
                .with_max_iter(64),
        )
    }

    // ========== Tick ordering ==========

    #[test]
    fn test_first_tick_renders_then_idles() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        assert_eq!(ex.tick(0.016), ExplorerReport { changed: false, rendered: true });
        assert_eq!(ex.frame().unwrap().dimensions(), (64, 48));
        assert_eq!(ex.tick(0.016), ExplorerReport { changed: false, rendered: false });
    }

    #[test]
    fn test_animation_marks_dirty() {
        let mut ex = explorer(FractalKind::Julia);
        ex.tick(0.016);
        ex.toggle_animation();
        let report = ex.tick(0.5);
        assert!(report.changed && report.rendered);
        let re = ex.params().get("cReal").unwrap();
        assert!((re - 0.7885 * 0.5f32.cos()).abs() < 1e-5);
    }

    #[test]
    fn test_journey_overrides_animation_in_same_tick() {
        let mut ex = explorer(FractalKind::Julia);
        ex.toggle_animation();
        let journey = Journey::new(
            "hold",
            vec![
                Waypoint::new(ParameterSet::from_pairs(&[("cReal", 0.25)])),
                Waypoint::new(ParameterSet::from_pairs(&[("cReal", 0.25)])),
            ],
        );
        assert!(ex.play(journey));
        ex.tick(0.5);
        assert!((ex.params().get("cReal").unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_inertia_glides_after_drag() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        ex.tick(0.016);
        ex.pointer_pressed(DVec2::new(32.0, 24.0), 0.0);
        ex.pointer_moved(DVec2::new(22.0, 24.0), 0.016);
        ex.pointer_released();
        let after_drag = ex.view().center;

        let report = ex.tick(0.016);
        assert!(report.changed);
        assert!(ex.view().center.x > after_drag.x);
    }

    #[test]
    fn test_infinite_zoom_returns_home() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        ex.toggle_infinite_zoom();
        ex.viewport.set_view(View::new(-0.75, 0.1, 1e-7));
        ex.tick(0.016);
        assert!(ex.infinite_zoom().is_transitioning());

        // Input is ignored while gliding home
        let before = ex.view();
        ex.wheel(DVec2::new(10.0, 10.0), 1.0);
        assert_eq!(ex.view(), before);

        for _ in 0..200 {
            ex.tick(0.016);
        }
        assert_eq!(ex.view(), ex.definition().default_view);
    }

    // ========== Input ==========

    #[test]
    fn test_interaction_pauses_journey() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        assert_eq!(ex.toggle_journey(), PlaybackState::Playing);
        ex.zoom_in();
        assert_eq!(ex.player().state(), PlaybackState::Paused);
    }

    #[test]
    fn test_swipe_switches_kind() {
        let mut ex = explorer(FractalKind::Julia);
        ex.begin_swipe(100.0);
        ex.swipe_to(150.0);
        assert_eq!(ex.kind(), FractalKind::Julia);
        ex.swipe_to(250.0);
        assert_eq!(ex.kind(), FractalKind::Julia.next());
        assert_eq!(ex.view(), ex.definition().default_view);
    }

    #[test]
    fn test_presets_by_index() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        let preset = ex.definition().presets[0];
        ex.apply_preset_index(0).unwrap();
        if let Some(view) = preset.view {
            assert_eq!(ex.view(), view);
        }
        assert!(matches!(
            ex.apply_preset_index(99),
            Err(ModelError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_unknown_parameter() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        assert!(matches!(
            ex.set_param("cReal", 0.1),
            Err(ModelError::UnknownParameter { .. })
        ));
    }

    // ========== Linked mode ==========

    #[test]
    fn test_linked_click_opens_julia() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        ex.set_linked(true);
        let pixel = DVec2::new(16.0, 12.0);
        let c = ex.viewport().pixel_to_complex(pixel);

        ex.pointer_moved(pixel, 0.0);
        let preview = ex.julia_preview().unwrap();
        assert_eq!(preview.dimensions(), (PREVIEW_SIZE, PREVIEW_SIZE));

        assert!(ex.click(pixel));
        assert_eq!(ex.kind(), FractalKind::Julia);
        assert_eq!(ex.params().get("cReal"), Some(c.x as f32));
        assert_eq!(ex.params().get("cImag"), Some(c.y as f32));
        assert!(ex.julia_preview().is_none());
        assert!(!ex.click(pixel));
    }

    #[test]
    fn test_unlinked_click_does_nothing() {
        let mut ex = explorer(FractalKind::Mandelbrot);
        assert!(!ex.click(DVec2::new(1.0, 1.0)));
        assert_eq!(ex.kind(), FractalKind::Mandelbrot);
    }
}
