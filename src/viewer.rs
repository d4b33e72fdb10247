//! Interactive window for both modes.
//!
//! The controllers render into CPU images; the viewer forwards winit events
//! to them, ticks them once per redraw with a [`FrameClock`], and hands the
//! resulting frame to the [`Presenter`].

use std::sync::Arc;

use glam::DVec2;
use image::RgbaImage;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::brush::CanvasRect;
use crate::config::{ExplorerConfig, LabConfig};
use crate::error::ViewerError;
use crate::explorer::FractalExplorer;
use crate::gpu::{GpuContext, Presenter};
use crate::input::{explorer_action, lab_action, ExplorerAction, Gesture, KeyCode, LabAction, Touches};
use crate::lab::{PatternLab, SimSlot};
use crate::model::ModelId;
use crate::time::FrameClock;

/// Pointer travel, in pixels, below which a press and release is a click.
const CLICK_SLOP: f64 = 4.0;
const MAX_STEPS_PER_FRAME: u32 = 200;
const JOURNEY_SPEED_STEP: f32 = 1.25;

/// Which controller the window drives.
#[derive(Debug, Clone)]
pub enum Mode {
    Patterns(LabConfig),
    Fractals(ExplorerConfig),
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Patterns(_) => "patterns",
            Mode::Fractals(_) => "fractals",
        }
    }

    fn window_size(&self) -> (u32, u32) {
        match self {
            Mode::Patterns(c) => (c.width.max(256), c.height.max(256)),
            Mode::Fractals(c) => (c.width, c.height),
        }
    }
}

enum Controller {
    Lab(PatternLab),
    Explorer(FractalExplorer),
}

/// Open a window in `mode` and run until it is closed.
pub fn run(mode: Mode) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(mode);
    event_loop.run_app(&mut viewer)?;
    match viewer.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Viewer {
    mode: Mode,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    controller: Option<Controller>,
    clock: FrameClock,
    touches: Touches,
    cursor: DVec2,
    press_origin: Option<DVec2>,
    dragging_divider: bool,
    shift: bool,
    error: Option<ViewerError>,
}

impl Viewer {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            window: None,
            presenter: None,
            controller: None,
            clock: FrameClock::new(),
            touches: Touches::new(),
            cursor: DVec2::ZERO,
            press_origin: None,
            dragging_divider: false,
            shift: false,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let (w, h) = self.mode.window_size();
        let attrs = Window::default_attributes()
            .with_title(format!("morphogen - {}", self.mode.name()))
            .with_inner_size(LogicalSize::new(w, h));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let (context, surface, config) = pollster::block_on(GpuContext::with_window(window.clone()))?;
        let size = window.inner_size();
        let presenter = Presenter::new(context.into_shared(), surface, config);

        let controller = match &self.mode {
            Mode::Patterns(config) => {
                let mut lab = PatternLab::new(config.clone())?;
                lab.set_canvas(CanvasRect::full(size.width, size.height));
                Controller::Lab(lab)
            }
            Mode::Fractals(config) => {
                let mut explorer = FractalExplorer::new(config.clone());
                explorer.resize(size.width.max(1), size.height.max(1));
                Controller::Explorer(explorer)
            }
        };

        self.window = Some(window);
        self.presenter = Some(presenter);
        self.controller = Some(controller);
        self.clock.resync();
        self.update_title();
        Ok(())
    }

    fn update_title(&self) {
        let (Some(window), Some(controller)) = (&self.window, &self.controller) else {
            return;
        };
        let title = match controller {
            Controller::Lab(lab) => {
                let state = lab.state();
                format!(
                    "morphogen - {}{}{}",
                    lab.definition().display_name,
                    if state.comparison { " [compare]" } else { "" },
                    if state.paused { " [paused]" } else { "" },
                )
            }
            Controller::Explorer(explorer) => format!(
                "morphogen - {}{}",
                explorer.definition().display_name,
                if explorer.is_linked() { " [linked]" } else { "" },
            ),
        };
        window.set_title(&title);
    }

    fn snapshot_path(&self) -> String {
        format!("morphogen-{}-{:06}.png", self.mode.name(), self.clock.frame())
    }

    // ========== Keys ==========

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, repeat: bool) {
        let path = self.snapshot_path();
        let Some(controller) = &mut self.controller else {
            return;
        };
        match controller {
            Controller::Lab(lab) => {
                if repeat {
                    return;
                }
                let Some(action) = lab_action(key, self.shift) else {
                    return;
                };
                match action {
                    LabAction::TogglePause => {
                        lab.toggle_pause();
                    }
                    LabAction::Reset => lab.reset(),
                    LabAction::ToggleComparison => {
                        let on = !lab.state().comparison;
                        lab.set_comparison(on);
                    }
                    LabAction::SwapSelection => {
                        let next = match lab.state().selected {
                            SimSlot::A => SimSlot::B,
                            SimSlot::B => SimSlot::A,
                        };
                        lab.select(next);
                    }
                    LabAction::SelectModel(i) => {
                        if let Some(&model) = ModelId::ALL.get(i) {
                            lab.set_model(model);
                        }
                    }
                    LabAction::CycleColorMap => {
                        let map = lab.cycle_colormap();
                        log::info!("Color map: {}", map);
                    }
                    LabAction::ToggleChannel => {
                        let channel = 1 - lab.state().channel;
                        lab.set_channel(channel);
                    }
                    LabAction::ToggleJourney => {
                        let state = lab.toggle_journey();
                        log::info!("Journey: {:?}", state);
                    }
                    LabAction::ToggleLoop => {
                        let looping = !lab.player().is_looping();
                        lab.set_journey_looping(looping);
                    }
                    LabAction::SkipForward => lab.skip_forward(),
                    LabAction::SkipBack => lab.skip_back(),
                    LabAction::ToggleRecording => {
                        if lab.toggle_recording() {
                            let (x, y) = lab.map_axes();
                            log::info!("Recording path over {} / {}", x, y);
                        }
                    }
                    LabAction::FasterJourney => {
                        let speed = (lab.player().speed() * JOURNEY_SPEED_STEP).min(8.0);
                        lab.set_journey_speed(speed);
                    }
                    LabAction::SlowerJourney => {
                        let speed = (lab.player().speed() / JOURNEY_SPEED_STEP).max(0.125);
                        lab.set_journey_speed(speed);
                    }
                    LabAction::MoreSteps => {
                        let steps = (lab.state().steps_per_frame + 1).min(MAX_STEPS_PER_FRAME);
                        lab.set_steps_per_frame(steps);
                    }
                    LabAction::FewerSteps => {
                        let steps = lab.state().steps_per_frame.saturating_sub(1).max(1);
                        lab.set_steps_per_frame(steps);
                    }
                    LabAction::Snapshot => {
                        if let Err(e) = lab.save_snapshot(&path) {
                            log::warn!("{}", e);
                        }
                    }
                    LabAction::Quit => event_loop.exit(),
                }
            }
            Controller::Explorer(explorer) => {
                let Some(action) = explorer_action(key, self.shift) else {
                    return;
                };
                if repeat && !matches!(
                    action,
                    ExplorerAction::Pan(_) | ExplorerAction::ZoomIn | ExplorerAction::ZoomOut
                ) {
                    return;
                }
                match action {
                    ExplorerAction::Pan(steps) => explorer.pan(steps),
                    ExplorerAction::ZoomIn => explorer.zoom_in(),
                    ExplorerAction::ZoomOut => explorer.zoom_out(),
                    ExplorerAction::ToggleAnimation => {
                        explorer.toggle_animation();
                    }
                    ExplorerAction::ToggleColorCycling => {
                        explorer.toggle_color_cycling();
                    }
                    ExplorerAction::ToggleInfiniteZoom => {
                        explorer.toggle_infinite_zoom();
                    }
                    ExplorerAction::ToggleLinked => {
                        let linked = !explorer.is_linked();
                        explorer.set_linked(linked);
                    }
                    ExplorerAction::CyclePalette => {
                        let palette = explorer.cycle_palette();
                        log::info!("Palette: {}", palette);
                    }
                    ExplorerAction::NextKind => explorer.next_kind(),
                    ExplorerAction::PreviousKind => explorer.previous_kind(),
                    ExplorerAction::Preset(i) => {
                        if let Err(e) = explorer.apply_preset_index(i) {
                            log::debug!("{}", e);
                        }
                    }
                    ExplorerAction::ToggleJourney => {
                        let state = explorer.toggle_journey();
                        log::info!("Journey: {:?}", state);
                    }
                    ExplorerAction::ResetView => explorer.reset_view(),
                    ExplorerAction::Snapshot => {
                        if let Err(e) = explorer.save_snapshot(&path) {
                            log::warn!("{}", e);
                        }
                    }
                    ExplorerAction::Quit => event_loop.exit(),
                }
            }
        }
        self.update_title();
    }

    // ========== Pointer ==========

    fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let time = self.clock.elapsed();
        let cursor = self.cursor;
        let Some(controller) = &mut self.controller else {
            return;
        };
        let pressed = state == ElementState::Pressed;
        match (controller, button) {
            (Controller::Lab(lab), MouseButton::Left) => {
                if pressed && lab.is_recording() {
                    lab.record_pointer(cursor.as_vec2());
                } else if pressed {
                    lab.press_brush(cursor.as_vec2());
                } else {
                    lab.release_brush();
                }
            }
            (Controller::Lab(lab), MouseButton::Right) => {
                self.dragging_divider = pressed && lab.state().comparison;
            }
            (Controller::Explorer(explorer), MouseButton::Left) => {
                if pressed {
                    self.press_origin = Some(cursor);
                    explorer.pointer_pressed(cursor, time);
                } else {
                    explorer.pointer_released();
                    if let Some(origin) = self.press_origin.take() {
                        if origin.distance(cursor) < CLICK_SLOP && explorer.click(cursor) {
                            self.update_title();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = DVec2::new(position.x, position.y);
        let time = self.clock.elapsed();
        let width = self
            .presenter
            .as_ref()
            .map_or(1, |p| p.surface_size().0.max(1));
        match &mut self.controller {
            Some(Controller::Lab(lab)) => {
                if self.dragging_divider {
                    lab.set_divider(self.cursor.x as f32 / width as f32);
                } else {
                    lab.drag_brush(self.cursor.as_vec2());
                }
            }
            Some(Controller::Explorer(explorer)) => explorer.pointer_moved(self.cursor, time),
            None => {}
        }
    }

    fn cursor_left(&mut self) {
        self.press_origin = None;
        self.dragging_divider = false;
        match &mut self.controller {
            Some(Controller::Lab(lab)) => lab.leave_brush(),
            Some(Controller::Explorer(explorer)) => explorer.pointer_left(),
            None => {}
        }
    }

    fn wheel(&mut self, delta: MouseScrollDelta) {
        // winit reports scrolling up as positive
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -(y as f64),
            MouseScrollDelta::PixelDelta(pos) => -pos.y,
        };
        if let Some(Controller::Explorer(explorer)) = &mut self.controller {
            explorer.wheel(self.cursor, delta_y);
        }
    }

    fn touch(&mut self, touch: Touch) {
        let position = DVec2::new(touch.location.x, touch.location.y);
        let before = self.touches.count();
        let gesture = self.touches.update(touch.id, touch.phase, position);
        let time = self.clock.elapsed();
        let Some(controller) = &mut self.controller else {
            return;
        };
        match controller {
            Controller::Lab(lab) => match (gesture, touch.phase) {
                (Gesture::Single(p), TouchPhase::Started) => {
                    lab.press_brush(p.as_vec2());
                }
                (Gesture::Single(p), _) => lab.drag_brush(p.as_vec2()),
                _ => lab.release_brush(),
            },
            Controller::Explorer(explorer) => match gesture {
                Gesture::Single(p) if touch.phase == TouchPhase::Started && before == 0 => {
                    explorer.pointer_pressed(p, time);
                }
                Gesture::Single(p) => explorer.pointer_moved(p, time),
                Gesture::Pinch(a, b) => explorer.pinch(a, b),
                Gesture::Swipe(x) if touch.phase == TouchPhase::Started => explorer.begin_swipe(x),
                Gesture::Swipe(x) => {
                    explorer.swipe_to(x);
                    self.update_title();
                }
                Gesture::None => {
                    explorer.pointer_released();
                    explorer.end_pinch();
                    explorer.cancel_gestures();
                }
            },
        }
    }

    fn resized(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(width, height);
        }
        match &mut self.controller {
            Some(Controller::Lab(lab)) => lab.set_canvas(CanvasRect::full(width, height)),
            Some(Controller::Explorer(explorer)) => explorer.resize(width, height),
            None => {}
        }
    }

    // ========== Frame ==========

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        let (Some(controller), Some(presenter)) = (&mut self.controller, &mut self.presenter) else {
            return;
        };

        let overlaid;
        let frame: Option<&RgbaImage> = match controller {
            Controller::Lab(lab) => {
                lab.tick(dt);
                lab.frame()
            }
            Controller::Explorer(explorer) => {
                explorer.tick(dt);
                match (explorer.frame(), explorer.julia_preview()) {
                    (Some(frame), Some(preview)) => {
                        overlaid = with_inset(frame, &preview);
                        Some(&overlaid)
                    }
                    (frame, _) => frame,
                }
            }
        };
        let Some(frame) = frame else {
            return;
        };

        match presenter.present(frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => presenter.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory; exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Dropped frame: {}", e),
        }
    }
}

/// `frame` with `inset` drawn in its top-right corner.
fn with_inset(frame: &RgbaImage, inset: &RgbaImage) -> RgbaImage {
    let mut out = frame.clone();
    let margin = 10i64;
    let x = frame.width() as i64 - inset.width() as i64 - margin;
    image::imageops::overlay(&mut out, inset, x.max(0), margin);
    out
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resized(size.width, size.height),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.handle_key(event_loop, KeyCode::from(code), event.repeat);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse_button(button, state),
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position),
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => self.wheel(delta),
            WindowEvent::Touch(touch) => self.touch(touch),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_inset_lands_top_right() {
        let frame = RgbaImage::from_pixel(100, 80, Rgba([0, 0, 0, 255]));
        let inset = RgbaImage::from_pixel(20, 20, Rgba([255, 0, 0, 255]));
        let out = with_inset(&frame, &inset);
        assert_eq!(out.get_pixel(75, 15), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(95, 15), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(75, 50), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_mode_window_size() {
        let mode = Mode::Patterns(LabConfig::new().with_size(64));
        assert_eq!(mode.window_size(), (256, 256));
        let mode = Mode::Fractals(ExplorerConfig::new().with_dimensions(640, 480));
        assert_eq!(mode.window_size(), (640, 480));
    }
}
