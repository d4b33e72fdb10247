//! The reaction-diffusion lab controller.
//!
//! [`PatternLab`] owns the application state for pattern mode: the versioned
//! [`LabState`], one or two simulations, the brush, the journey player and
//! the last rendered frame. Every write goes through a method that bumps
//! [`LabState::version`] and marks the frame dirty. A scheduler (the viewer,
//! a test, a benchmark) calls [`PatternLab::tick`] once per frame:
//!
//! 1. advance the journey and write its parameters,
//! 2. unless paused, run `steps_per_frame` steps on A (with the brush) and,
//!    in comparison mode, on B (with B's parameters and no brush),
//! 3. re-render if anything changed.

use std::path::Path;

use glam::Vec2;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::brush::{BrushInput, BrushUniform, CanvasRect};
use crate::buffer::PingPong;
use crate::colormap::{ColorMap, Lut};
use crate::config::LabConfig;
use crate::error::{GpuError, ModelError, SnapshotError};
use crate::journey::{Journey, JourneyFrame, JourneyPlayer, PathRecorder, PlaybackState};
use crate::kernel::Kernel;
use crate::model::{ModelDefinition, ModelId};
use crate::params::ParameterSet;
use crate::render::{render, render_split, SplitView};
use crate::stepper::{Stepper, StepperFactory};

/// Which simulation parameter edits target in comparison mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimSlot {
    #[default]
    A,
    B,
}

/// Pattern-mode application state. Read it through
/// [`PatternLab::state`]; change it through the lab's methods.
#[derive(Debug, Clone, PartialEq)]
pub struct LabState {
    pub model: ModelId,
    pub params_a: ParameterSet,
    pub params_b: ParameterSet,
    pub comparison: bool,
    pub selected: SimSlot,
    pub divider: f32,
    pub channel: usize,
    pub colormap: ColorMap,
    pub steps_per_frame: u32,
    pub paused: bool,
    /// Bumped on every write.
    pub version: u64,
}

/// What one [`PatternLab::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub stepped: bool,
    pub rendered: bool,
}

/// One simulation: its buffers, kernel and stepper.
pub struct Simulation {
    pair: PingPong,
    kernel: Kernel,
    stepper: Box<dyn Stepper>,
}

impl Simulation {
    fn new(width: u32, height: u32, kernel: Kernel, stepper: Box<dyn Stepper>) -> Self {
        Self {
            pair: PingPong::allocate(width, height),
            kernel,
            stepper,
        }
    }

    pub fn pair(&self) -> &PingPong {
        &self.pair
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn advance(&mut self, brush: &BrushUniform, steps: u32) -> Result<(), GpuError> {
        self.stepper.advance(&mut self.pair, &self.kernel, brush, steps)
    }
}

/// Controller for pattern mode.
pub struct PatternLab {
    state: LabState,
    width: u32,
    height: u32,
    factory: StepperFactory,
    sim_a: Simulation,
    sim_b: Option<Simulation>,
    brush: BrushInput,
    player: JourneyPlayer,
    recorder: Option<PathRecorder>,
    rng: StdRng,
    lut: Lut,
    frame: Option<RgbaImage>,
    dirty: bool,
}

impl PatternLab {
    /// Build a lab and seed it. Fails only when the configured backend
    /// cannot be opened.
    pub fn new(config: LabConfig) -> Result<Self, GpuError> {
        let factory = StepperFactory::new(config.backend)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let params = config.model.definition().default_parameters();
        let kernel = Kernel::new(config.model, &params);
        let sim_a = Simulation::new(config.width, config.height, kernel, factory.create());

        let mut brush = BrushInput::new(config.width)
            .with_radius(config.brush_radius)
            .with_intensity(config.brush_intensity);
        brush.set_canvas(CanvasRect::full(config.width, config.height));

        log::info!(
            "Pattern lab: {} on {}x{} ({} backend)",
            config.model.definition().display_name,
            config.width,
            config.height,
            factory.backend()
        );

        let mut lab = Self {
            state: LabState {
                model: config.model,
                params_a: params.clone(),
                params_b: params,
                comparison: false,
                selected: SimSlot::A,
                divider: 0.5,
                channel: config.channel.min(1),
                colormap: config.colormap,
                steps_per_frame: config.steps_per_frame,
                paused: false,
                version: 0,
            },
            width: config.width,
            height: config.height,
            factory,
            sim_a,
            sim_b: None,
            brush,
            player: JourneyPlayer::new(),
            recorder: None,
            rng,
            lut: config.colormap.lut(),
            frame: None,
            dirty: true,
        };
        lab.reset_a();
        if config.comparison {
            lab.set_comparison(true);
        }
        Ok(lab)
    }

    pub fn state(&self) -> &LabState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.state.version
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn definition(&self) -> &'static ModelDefinition {
        self.state.model.definition()
    }

    pub fn sim_a(&self) -> &Simulation {
        &self.sim_a
    }

    pub fn sim_b(&self) -> Option<&Simulation> {
        self.sim_b.as_ref()
    }

    /// The last rendered frame.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn player(&self) -> &JourneyPlayer {
        &self.player
    }

    pub fn brush(&self) -> &BrushInput {
        &self.brush
    }

    fn touch(&mut self) {
        self.state.version += 1;
        self.dirty = true;
    }

    fn targets_b(&self) -> bool {
        self.state.comparison && self.state.selected == SimSlot::B
    }

    fn rebuild_kernels(&mut self) {
        self.sim_a.kernel = Kernel::new(self.state.model, &self.state.params_a);
        if let Some(sim_b) = &mut self.sim_b {
            sim_b.kernel = Kernel::new(self.state.model, &self.state.params_b);
        }
    }

    // ========== Model & parameters ==========

    /// Switch models: parameters go back to defaults, both simulations are
    /// reseeded and any journey stops.
    pub fn set_model(&mut self, model: ModelId) {
        log::info!("Switching model to {}", model.definition().display_name);
        self.player.unload();
        self.recorder = None;
        self.state.model = model;
        self.state.params_a = model.definition().default_parameters();
        self.state.params_b = self.state.params_a.clone();
        self.rebuild_kernels();
        self.reset();
    }

    /// Current value of `id` on the active simulation.
    pub fn param(&self, id: &str) -> Option<f32> {
        if self.targets_b() {
            self.state.params_b.get(id)
        } else {
            self.state.params_a.get(id)
        }
    }

    /// Set one parameter on the active simulation.
    pub fn set_param(&mut self, id: &str, value: f32) -> Result<(), ModelError> {
        let def = self.definition();
        let param = def.param(id).ok_or_else(|| ModelError::UnknownParameter {
            model: def.key.to_string(),
            param: id.to_string(),
        })?;
        if self.targets_b() {
            self.state.params_b.insert(param.id, value);
        } else {
            self.state.params_a.insert(param.id, value);
        }
        self.rebuild_kernels();
        self.touch();
        Ok(())
    }

    /// Apply a named preset to the active simulation. Listed keys are
    /// overwritten; the buffers are left alone.
    pub fn apply_preset(&mut self, name: &str) -> Result<(), ModelError> {
        let preset = self.definition().preset(name)?;
        log::debug!("Applying preset '{}'", preset.name);
        let overrides = preset.parameters();
        if self.targets_b() {
            self.state.params_b.merge(&overrides);
        } else {
            self.state.params_a.merge(&overrides);
        }
        self.rebuild_kernels();
        self.touch();
        Ok(())
    }

    /// Apply the preset at `index` in the model's preset list.
    pub fn apply_preset_index(&mut self, index: usize) -> Result<(), ModelError> {
        let def = self.definition();
        let preset = def.presets.get(index).ok_or_else(|| ModelError::UnknownPreset {
            model: def.key.to_string(),
            preset: format!("#{}", index + 1),
        })?;
        self.apply_preset(preset.name)
    }

    // ========== Seeding ==========

    /// Reseed A. In comparison mode B receives the same initial data.
    pub fn reset(&mut self) {
        let grid = self.sim_a.kernel.seed(self.width, self.height, &mut self.rng);
        if let Some(sim_b) = &mut self.sim_b {
            sim_b.pair.seed_with(grid.clone());
        }
        self.sim_a.pair.seed_with(grid);
        log::debug!("Reseeded {}", self.state.model);
        self.touch();
    }

    /// Reseed A only.
    pub fn reset_a(&mut self) {
        let grid = self.sim_a.kernel.seed(self.width, self.height, &mut self.rng);
        self.sim_a.pair.seed_with(grid);
        self.touch();
    }

    /// Reseed B only. No-op outside comparison mode.
    pub fn reset_b(&mut self) {
        if let Some(sim_b) = &mut self.sim_b {
            let grid = sim_b.kernel.seed(self.width, self.height, &mut self.rng);
            sim_b.pair.seed_with(grid);
            self.touch();
        }
    }

    // ========== Display ==========

    /// Turn comparison mode on or off. Turning it on copies A's parameters
    /// to B, seeds B fresh and centers the divider.
    pub fn set_comparison(&mut self, on: bool) {
        if on == self.state.comparison {
            return;
        }
        self.state.comparison = on;
        self.state.divider = 0.5;
        if on {
            self.state.params_b = self.state.params_a.clone();
            let kernel = Kernel::new(self.state.model, &self.state.params_b);
            let mut sim_b = Simulation::new(self.width, self.height, kernel, self.factory.create());
            let grid = sim_b.kernel.seed(self.width, self.height, &mut self.rng);
            sim_b.pair.seed_with(grid);
            self.sim_b = Some(sim_b);
        } else {
            self.sim_b = None;
            self.state.selected = SimSlot::A;
        }
        log::info!("Comparison mode {}", if on { "on" } else { "off" });
        self.touch();
    }

    /// Choose which simulation parameter edits target.
    pub fn select(&mut self, slot: SimSlot) {
        self.state.selected = slot;
        self.touch();
    }

    pub fn set_divider(&mut self, divider: f32) {
        self.state.divider = divider.clamp(0.0, 1.0);
        self.touch();
    }

    pub fn set_channel(&mut self, channel: usize) {
        self.state.channel = channel.min(1);
        self.touch();
    }

    pub fn set_colormap(&mut self, colormap: ColorMap) {
        self.state.colormap = colormap;
        self.lut = colormap.lut();
        self.touch();
    }

    pub fn cycle_colormap(&mut self) -> ColorMap {
        let next = self.state.colormap.next();
        self.set_colormap(next);
        next
    }

    pub fn set_steps_per_frame(&mut self, steps: u32) {
        self.state.steps_per_frame = steps;
        self.touch();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
        self.touch();
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.set_paused(!self.state.paused);
        self.state.paused
    }

    // ========== Brush ==========

    pub fn set_canvas(&mut self, canvas: CanvasRect) {
        self.brush.set_canvas(canvas);
    }

    pub fn set_brush_radius(&mut self, radius_px: f32) {
        self.brush.set_radius(radius_px);
    }

    pub fn set_brush_intensity(&mut self, intensity: f32) {
        self.brush.set_intensity(intensity);
    }

    /// Pointer pressed at window coordinates. A hit on the canvas starts
    /// painting and pauses a playing journey.
    pub fn press_brush(&mut self, pointer: Vec2) -> bool {
        let hit = self.brush.press(pointer);
        if hit {
            self.player.pause_for_interaction();
        }
        hit
    }

    pub fn drag_brush(&mut self, pointer: Vec2) {
        self.brush.drag(pointer);
    }

    pub fn release_brush(&mut self) {
        self.brush.release();
    }

    pub fn leave_brush(&mut self) {
        self.brush.leave();
    }

    // ========== Journeys ==========

    /// Play one of the model's built-in journeys by name.
    pub fn play_journey(&mut self, name: &str) -> Result<bool, ModelError> {
        let def = self.definition().journey(name)?;
        Ok(self.play(Journey::from_def(def)))
    }

    /// Play an arbitrary journey. Returns false if it has fewer than two
    /// waypoints.
    pub fn play(&mut self, journey: Journey) -> bool {
        self.player.play(journey)
    }

    /// Pause or resume the loaded journey, or start the model's first
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

    pub fn set_journey_speed(&mut self, speed: f32) {
        self.player.set_speed(speed);
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

    /// Start recording a custom path over the `x`/`y` parameter map.
    pub fn start_recording(&mut self, x: &str, y: &str) -> Result<(), ModelError> {
        let def = self.definition();
        let lookup = |id: &str| {
            def.param(id).ok_or_else(|| ModelError::UnknownParameter {
                model: def.key.to_string(),
                param: id.to_string(),
            })
        };
        let (px, py) = (*lookup(x)?, *lookup(y)?);
        self.recorder = Some(PathRecorder::new(px, py));
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Add a point to the path being recorded, `(nx, ny)` in map space with
    /// y measured from the top.
    pub fn record_point(&mut self, nx: f32, ny: f32) {
        if let Some(recorder) = &mut self.recorder {
            recorder.add_point(nx, ny, &self.state.params_a);
        }
    }

    /// Record a pointer position on the canvas. Presses outside it are
    /// ignored.
    pub fn record_pointer(&mut self, pointer: Vec2) -> bool {
        let canvas = self.brush.canvas();
        if self.recorder.is_none() || !canvas.contains(pointer) {
            return false;
        }
        let n = canvas.normalize(pointer);
        self.record_point(n.x, n.y);
        true
    }

    /// Parameters mapped by a recorded path: the axes of the model's first
    /// journey that names both, else its first two parameters.
    pub fn map_axes(&self) -> (&'static str, &'static str) {
        let def = self.definition();
        def.journeys
            .iter()
            .find_map(|j| j.param_x.zip(j.param_y))
            .unwrap_or((def.params[0].id, def.params[1].id))
    }

    /// Start recording over [`map_axes`](Self::map_axes), or finish and play
    /// the recorded path. Returns whether a recording is now in progress.
    pub fn toggle_recording(&mut self) -> bool {
        if self.is_recording() {
            if !self.finish_recording() {
                log::info!("Custom path needs at least two points");
            }
            return false;
        }
        let (x, y) = self.map_axes();
        match self.start_recording(x, y) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Stop recording and play the path. Returns false if fewer than two
    /// points were recorded.
    pub fn finish_recording(&mut self) -> bool {
        match self.recorder.take().and_then(|r| r.finish("Custom path")) {
            Some(journey) => self.player.play(journey),
            None => false,
        }
    }

    fn apply_journey_frame(&mut self, frame: JourneyFrame) {
        self.state.params_a.merge(&frame.params);
        self.rebuild_kernels();
        self.touch();
    }

    // ========== Frame ==========

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) -> FrameReport {
        let mut report = FrameReport::default();

        if let Some(frame) = self.player.update(dt) {
            self.apply_journey_frame(frame);
        }

        let steps = self.state.steps_per_frame;
        if !self.state.paused && steps > 0 {
            let brush = self.brush.uniform();
            match self.sim_a.advance(&brush, steps) {
                Ok(()) => report.stepped = true,
                Err(e) => log::warn!("Simulation A step failed: {}", e),
            }
            if let Some(sim_b) = &mut self.sim_b {
                match sim_b.advance(&BrushUniform::inactive(), steps) {
                    Ok(()) => report.stepped = true,
                    Err(e) => log::warn!("Simulation B step failed: {}", e),
                }
            }
        }

        if self.dirty || report.stepped {
            self.frame = Some(self.render_frame());
            self.dirty = false;
            report.rendered = true;
        }
        report
    }

    /// Render the current state without stepping.
    pub fn render_frame(&self) -> RgbaImage {
        let channel = self.state.channel;
        let range = self.definition().normalization[channel];
        match &self.sim_b {
            Some(sim_b) if self.state.comparison => render_split(
                self.sim_a.pair.current(),
                sim_b.pair.current(),
                SplitView::new(self.state.divider),
                channel,
                &self.lut,
                range,
            ),
            _ => render(self.sim_a.pair.current(), channel, &self.lut, range),
        }
    }

    /// Write the last rendered frame as a PNG.
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

    fn lab(model: ModelId) -> PatternLab {
        PatternLab::new(
            LabConfig::new()
                .with_size(32)
                .with_model(model)
                .with_seed(11)
                .with_steps_per_frame(2),
        )
        .unwrap()
    }

    // ========== Construction ==========

    #[test]
    fn test_new_lab_is_seeded_and_dirty() {
        let lab = lab(ModelId::GrayScott);
        assert_eq!(lab.sim_a().pair().generation(), 1);
        assert!(lab.is_dirty());
        assert!(lab.frame().is_none());
        assert_eq!(lab.state().params_a, lab.definition().default_parameters());
    }

    #[test]
    fn test_same_seed_same_state() {
        let a = lab(ModelId::Schnakenberg);
        let b = lab(ModelId::Schnakenberg);
        assert_eq!(a.sim_a().pair().current(), b.sim_a().pair().current());
    }

    // ========== Tick ==========

    #[test]
    fn test_tick_steps_and_renders() {
        let mut lab = lab(ModelId::GrayScott);
        let report = lab.tick(0.016);
        assert_eq!(report, FrameReport { stepped: true, rendered: true });
        assert_eq!(lab.frame().unwrap().dimensions(), (32, 32));
        assert!(!lab.is_dirty());
    }

    #[test]
    fn test_paused_tick_renders_only_when_dirty() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_paused(true);
        let before = lab.sim_a().pair().current().clone();

        assert_eq!(lab.tick(0.016), FrameReport { stepped: false, rendered: true });
        assert_eq!(lab.tick(0.016), FrameReport { stepped: false, rendered: false });
        assert_eq!(lab.sim_a().pair().current(), &before);

        lab.set_colormap(ColorMap::Ocean);
        assert!(lab.tick(0.016).rendered);
    }

    #[test]
    fn test_zero_steps_per_frame() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_steps_per_frame(0);
        assert!(!lab.tick(0.016).stepped);
    }

    // ========== State writes ==========

    #[test]
    fn test_writes_bump_version() {
        let mut lab = lab(ModelId::GrayScott);
        let v = lab.version();
        lab.set_param("feed", 0.03).unwrap();
        lab.set_channel(1);
        lab.set_divider(2.0);
        assert_eq!(lab.version(), v + 3);
        assert_eq!(lab.state().divider, 1.0);
        assert_eq!(lab.param("feed"), Some(0.03));
    }

    #[test]
    fn test_unknown_parameter() {
        let mut lab = lab(ModelId::GrayScott);
        let v = lab.version();
        assert!(matches!(
            lab.set_param("nope", 1.0),
            Err(ModelError::UnknownParameter { .. })
        ));
        assert_eq!(lab.version(), v);
    }

    #[test]
    fn test_preset_keeps_buffers() {
        let mut lab = lab(ModelId::GrayScott);
        let name = lab.definition().presets[0].name;
        let before = lab.sim_a().pair().current().clone();
        let generation = lab.sim_a().pair().generation();

        lab.apply_preset(name).unwrap();

        assert_eq!(lab.sim_a().pair().current(), &before);
        assert_eq!(lab.sim_a().pair().generation(), generation);
        for (id, value) in lab.definition().presets[0].overrides {
            assert_eq!(lab.param(id), Some(*value));
        }
        assert!(matches!(
            lab.apply_preset("Nonexistent"),
            Err(ModelError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_set_model_resets_everything() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_param("feed", 0.01).unwrap();
        let journey = Journey::new(
            "two",
            vec![
                Waypoint::new(ParameterSet::from_pairs(&[("feed", 0.02)])),
                Waypoint::new(ParameterSet::from_pairs(&[("feed", 0.05)])),
            ],
        );
        assert!(lab.play(journey));

        lab.set_model(ModelId::Brusselator);

        assert_eq!(lab.state().model, ModelId::Brusselator);
        assert_eq!(lab.state().params_a, ModelId::Brusselator.definition().default_parameters());
        assert_eq!(lab.sim_a().kernel().model(), ModelId::Brusselator);
        assert_eq!(lab.player().state(), PlaybackState::Stopped);
        assert!(lab.player().journey().is_none());
        assert_eq!(lab.sim_a().pair().generation(), 2);
    }

    // ========== Comparison ==========

    #[test]
    fn test_comparison_copies_params_and_targets_selection() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_param("feed", 0.04).unwrap();
        lab.set_comparison(true);
        assert_eq!(lab.state().params_b.get("feed"), Some(0.04));
        assert_eq!(lab.state().divider, 0.5);

        lab.select(SimSlot::B);
        lab.set_param("feed", 0.02).unwrap();
        assert_eq!(lab.state().params_b.get("feed"), Some(0.02));
        assert_eq!(lab.state().params_a.get("feed"), Some(0.04));

        lab.set_comparison(false);
        assert!(lab.sim_b().is_none());
        assert_eq!(lab.state().selected, SimSlot::A);
    }

    #[test]
    fn test_reset_a_leaves_b() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_comparison(true);
        lab.tick(0.016);
        let b_before = lab.sim_b().unwrap().pair().current().clone();

        lab.reset_a();

        assert_eq!(lab.sim_b().unwrap().pair().current(), &b_before);
    }

    #[test]
    fn test_reset_shares_seed_with_b() {
        let mut lab = lab(ModelId::FitzHughNagumo);
        lab.set_comparison(true);
        lab.reset();
        assert_eq!(lab.sim_a().pair().current(), lab.sim_b().unwrap().pair().current());
    }

    #[test]
    fn test_brush_only_reaches_a() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_comparison(true);
        lab.reset();
        lab.set_brush_radius(8.0);
        lab.set_brush_intensity(1.0);
        assert!(lab.press_brush(Vec2::new(16.0, 16.0)));
        lab.tick(0.016);

        let ch = lab.sim_a().kernel().brush_channel();
        let a = lab.sim_a().pair().current().get(16, 16)[ch];
        let b = lab.sim_b().unwrap().pair().current().get(16, 16)[ch];
        assert!(a > b);
    }

    // ========== Journeys ==========

    #[test]
    fn test_journey_drives_params_a() {
        let mut lab = lab(ModelId::GrayScott);
        let journey = Journey::new(
            "sweep",
            vec![
                Waypoint::new(ParameterSet::from_pairs(&[("feed", 0.02)])).with_duration(2.0),
                Waypoint::new(ParameterSet::from_pairs(&[("feed", 0.06)])),
            ],
        );
        assert!(lab.play(journey));
        let v = lab.version();
        lab.tick(1.0);
        assert!((lab.state().params_a.get("feed").unwrap() - 0.04).abs() < 1e-6);
        assert!(lab.version() > v);
    }

    #[test]
    fn test_brush_press_pauses_journey() {
        let mut lab = lab(ModelId::GrayScott);
        assert_eq!(lab.toggle_journey(), PlaybackState::Playing);
        assert!(lab.press_brush(Vec2::new(4.0, 4.0)));
        assert_eq!(lab.player().state(), PlaybackState::Paused);
    }

    #[test]
    fn test_custom_path() {
        let mut lab = lab(ModelId::GrayScott);
        lab.start_recording("feed", "kill").unwrap();
        lab.record_point(0.0, 1.0);
        assert!(!lab.finish_recording());

        lab.start_recording("feed", "kill").unwrap();
        lab.record_point(0.0, 1.0);
        lab.record_point(1.0, 0.0);
        assert!(lab.finish_recording());
        assert!(!lab.is_recording());
        assert_eq!(lab.player().state(), PlaybackState::Playing);

        assert!(lab.start_recording("feed", "bogus").is_err());
    }

    #[test]
    fn test_toggle_recording_plays_pointer_path() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_canvas(CanvasRect::full(100, 100));
        assert_eq!(lab.map_axes(), ("feed", "kill"));
        assert!(!lab.record_pointer(Vec2::new(10.0, 10.0)));

        assert!(lab.toggle_recording());
        assert!(lab.record_pointer(Vec2::new(0.0, 100.0)));
        assert!(!lab.record_pointer(Vec2::new(150.0, 10.0)));
        assert!(lab.record_pointer(Vec2::new(100.0, 0.0)));
        assert!(!lab.toggle_recording());
        assert!(!lab.is_recording());
        assert_eq!(lab.player().state(), PlaybackState::Playing);
    }

    // ========== Step failures ==========

    struct FailingStepper;

    impl Stepper for FailingStepper {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn advance(
            &mut self,
            _pair: &mut PingPong,
            _kernel: &Kernel,
            _brush: &BrushUniform,
            _steps: u32,
        ) -> Result<(), GpuError> {
            Err(GpuError::BufferMapping("device lost".into()))
        }
    }

    #[test]
    fn test_failed_a_still_renders_b() {
        let mut lab = lab(ModelId::GrayScott);
        lab.set_comparison(true);
        lab.tick(1.0 / 60.0);
        lab.sim_a.stepper = Box::new(FailingStepper);

        let b_before = lab.sim_b().unwrap().pair().current().clone();
        let report = lab.tick(1.0 / 60.0);
        assert!(report.stepped);
        assert!(report.rendered);
        assert_ne!(lab.sim_b().unwrap().pair().current(), &b_before);
    }

    // ========== Snapshot ==========

    #[test]
    fn test_snapshot_requires_frame() {
        let lab = lab(ModelId::GrayScott);
        let path = std::env::temp_dir().join("morphogen-lab-noframe.png");
        assert!(matches!(lab.save_snapshot(&path), Err(SnapshotError::NoFrame)));
    }

    #[test]
    fn test_snapshot_writes_png() {
        let mut lab = lab(ModelId::GrayScott);
        lab.tick(0.016);
        let path = std::env::temp_dir().join("morphogen-lab-snapshot.png");
        lab.save_snapshot(&path).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (32, 32));
        let _ = std::fs::remove_file(&path);
    }
}
