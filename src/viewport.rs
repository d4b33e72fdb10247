//! Pan/zoom state over the complex plane.
//!
//! A [`View`] is a center plus a zoom, where zoom is the half-height of the
//! visible region in complex units. [`Viewport`] owns the current view and
//! the transient gesture state (drag, pinch, double tap, three-finger swipe,
//! inertia). [`InfiniteZoom`] glides the view back home once zooming runs
//! into `f64` precision.
//!
//! All gesture methods take screen positions in physical pixels relative to
//! the canvas, and timestamps in seconds. The caller decides where time comes
//! from, which keeps the state machine deterministic under test.

use glam::DVec2;

/// Zoom factor per wheel notch.
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;
/// Zoom factor per keyboard zoom step.
pub const KEY_ZOOM_FACTOR: f64 = 1.2;
/// Fraction of the visible extent moved per arrow-key press.
pub const KEY_PAN_FRACTION: f64 = 0.1;
/// Two taps closer than this in time form a double tap.
pub const DOUBLE_TAP_WINDOW: f64 = 0.3;
/// Two taps closer than this in pixels form a double tap.
pub const DOUBLE_TAP_DISTANCE: f64 = 30.0;
/// Zoom applied by a double tap.
pub const DOUBLE_TAP_ZOOM: f64 = 1.0 / 3.0;
/// Per-frame velocity decay after release.
pub const INERTIA_DECAY: f64 = 0.92;
/// Velocity components below this snap to zero.
pub const INERTIA_EPSILON: f64 = 1e-4;
/// Weight of the newest sample in the drag velocity average.
pub const VELOCITY_SMOOTHING: f64 = 0.5;
/// Horizontal travel of a three-finger swipe before it triggers.
pub const SWIPE_THRESHOLD: f64 = 100.0;

/// Smoothstep easing `t² (3 − 2t)` on `[0, 1]`.
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// A point of view on the complex plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: DVec2,
    /// Half-height of the visible region.
    pub zoom: f64,
}

impl View {
    pub const fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self {
            center: DVec2::new(x, y),
            zoom,
        }
    }

    /// Blend toward `other` at `s ∈ [0, 1]`: the center linearly, the zoom
    /// in log space so that the midpoint is the geometric mean.
    pub fn interpolate(&self, other: &View, s: f64) -> View {
        if s <= 0.0 {
            return *self;
        }
        if s >= 1.0 {
            return *other;
        }
        let center = self.center * (1.0 - s) + other.center * s;
        let zoom = (self.zoom.ln() * (1.0 - s) + other.zoom.ln() * s).exp();
        View { center, zoom }
    }
}

impl Default for View {
    fn default() -> Self {
        View::new(0.0, 0.0, 1.5)
    }
}

/// Direction of a three-finger swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Fingers moved right.
    Next,
    /// Fingers moved left.
    Previous,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: DVec2,
    start_center: DVec2,
    last: DVec2,
    last_time: f64,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    distance: f64,
    midpoint: DVec2,
}

/// Interactive pan/zoom state.
#[derive(Debug, Clone)]
pub struct Viewport {
    view: View,
    screen: DVec2,
    velocity: DVec2,
    drag: Option<Drag>,
    pinch: Option<Pinch>,
    last_tap: Option<(f64, DVec2)>,
    swipe_start: Option<f64>,
}

impl Viewport {
    /// A viewport showing `view` on a `width × height` canvas.
    pub fn new(view: View, width: u32, height: u32) -> Self {
        Self {
            view,
            screen: DVec2::new(width.max(1) as f64, height.max(1) as f64),
            velocity: DVec2::ZERO,
            drag: None,
            pinch: None,
            last_tap: None,
            swipe_start: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Jump to `view`, cancelling any glide.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.velocity = DVec2::ZERO;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen = DVec2::new(width.max(1) as f64, height.max(1) as f64);
    }

    pub fn screen_size(&self) -> DVec2 {
        self.screen
    }

    pub fn aspect(&self) -> f64 {
        self.screen.x / self.screen.y
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Whether a drag or pinch is in progress.
    pub fn is_interacting(&self) -> bool {
        self.drag.is_some() || self.pinch.is_some()
    }

    /// Complex coordinate under screen pixel `pixel`. Screen y grows down,
    /// imaginary y grows up.
    pub fn pixel_to_complex(&self, pixel: DVec2) -> DVec2 {
        let n = pixel / self.screen - DVec2::splat(0.5);
        DVec2::new(
            self.view.center.x + n.x * 2.0 * self.view.zoom * self.aspect(),
            self.view.center.y - n.y * 2.0 * self.view.zoom,
        )
    }

    /// Complex-plane displacement corresponding to a screen displacement.
    fn screen_delta(&self, delta: DVec2) -> DVec2 {
        DVec2::new(
            delta.x / self.screen.x * 2.0 * self.view.zoom * self.aspect(),
            -delta.y / self.screen.y * 2.0 * self.view.zoom,
        )
    }

    /// Scale the zoom by `factor` keeping `anchor` (complex) fixed on screen.
    pub fn zoom_about(&mut self, anchor: DVec2, factor: f64) {
        self.view.zoom *= factor;
        self.view.center = anchor + (self.view.center - anchor) * factor;
    }

    /// Wheel zoom at `pixel`; positive `delta_y` (scroll down) zooms out.
    pub fn wheel(&mut self, pixel: DVec2, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_FACTOR
        } else {
            1.0 / WHEEL_ZOOM_FACTOR
        };
        let anchor = self.pixel_to_complex(pixel);
        self.zoom_about(anchor, factor);
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom /= KEY_ZOOM_FACTOR;
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom *= KEY_ZOOM_FACTOR;
    }

    /// Keyboard pan by whole steps; `(1, 0)` moves the view right, `(0, 1)` up.
    pub fn pan_steps(&mut self, steps: DVec2) {
        let extent = DVec2::new(2.0 * self.view.zoom * self.aspect(), 2.0 * self.view.zoom);
        self.view.center += steps * extent * KEY_PAN_FRACTION;
    }

    /// A single-finger tap. Returns true when it completed a double tap and
    /// zoomed in; the caller should then not start a drag.
    pub fn tap(&mut self, pixel: DVec2, time: f64) -> bool {
        self.velocity = DVec2::ZERO;
        if let Some((t0, p0)) = self.last_tap {
            if time - t0 < DOUBLE_TAP_WINDOW && pixel.distance(p0) < DOUBLE_TAP_DISTANCE {
                self.last_tap = None;
                let anchor = self.pixel_to_complex(pixel);
                self.zoom_about(anchor, DOUBLE_TAP_ZOOM);
                return true;
            }
        }
        self.last_tap = Some((time, pixel));
        false
    }

    pub fn begin_drag(&mut self, pixel: DVec2, time: f64) {
        self.velocity = DVec2::ZERO;
        self.pinch = None;
        self.drag = Some(Drag {
            start: pixel,
            start_center: self.view.center,
            last: pixel,
            last_time: time,
        });
    }

    /// Move an active drag. Returns whether the view changed.
    pub fn drag_to(&mut self, pixel: DVec2, time: f64) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        self.view.center = drag.start_center - self.screen_delta(pixel - drag.start);

        let elapsed = time - drag.last_time;
        if elapsed > 0.0 {
            let sample = -self.screen_delta(pixel - drag.last) / elapsed;
            self.velocity = self.velocity * (1.0 - VELOCITY_SMOOTHING) + sample * VELOCITY_SMOOTHING;
        }
        self.drag = Some(Drag {
            last: pixel,
            last_time: time,
            ..drag
        });
        true
    }

    /// Release the drag; the averaged velocity keeps gliding.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Two-finger update. The first call only records the gesture.
    pub fn pinch(&mut self, a: DVec2, b: DVec2) -> bool {
        self.drag = None;
        self.velocity = DVec2::ZERO;
        let current = Pinch {
            distance: a.distance(b),
            midpoint: (a + b) * 0.5,
        };
        let changed = match self.pinch {
            Some(prev) if current.distance > 0.0 => {
                let scale = prev.distance / current.distance;
                self.view.center -= self.screen_delta(current.midpoint - prev.midpoint);
                let anchor = self.pixel_to_complex(current.midpoint);
                self.zoom_about(anchor, scale);
                true
            }
            _ => false,
        };
        self.pinch = Some(current);
        changed
    }

    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    /// Start tracking a three-finger swipe at mean x `x`.
    pub fn begin_swipe(&mut self, x: f64) {
        self.drag = None;
        self.pinch = None;
        self.swipe_start = Some(x);
    }

    /// Update the swipe; fires at most once per gesture.
    pub fn swipe_to(&mut self, x: f64) -> Option<SwipeDirection> {
        let start = self.swipe_start?;
        let travel = x - start;
        if travel.abs() <= SWIPE_THRESHOLD {
            return None;
        }
        self.swipe_start = None;
        Some(if travel > 0.0 {
            SwipeDirection::Next
        } else {
            SwipeDirection::Previous
        })
    }

    /// Drop all gesture state, e.g. when every finger lifts.
    pub fn cancel_gestures(&mut self) {
        self.drag = None;
        self.pinch = None;
        self.swipe_start = None;
    }

    /// Apply one frame of inertial glide. Returns whether the view moved.
    pub fn update_inertia(&mut self, dt: f64) -> bool {
        if self.drag.is_some() {
            return false;
        }
        if self.velocity.x.abs() < INERTIA_EPSILON && self.velocity.y.abs() < INERTIA_EPSILON {
            self.velocity = DVec2::ZERO;
            return false;
        }
        self.view.center += self.velocity * dt;
        self.velocity *= INERTIA_DECAY;
        if self.velocity.x.abs() < INERTIA_EPSILON {
            self.velocity.x = 0.0;
        }
        if self.velocity.y.abs() < INERTIA_EPSILON {
            self.velocity.y = 0.0;
        }
        true
    }
}

/// Glides the view home once zooming passes the precision limit.
#[derive(Debug, Clone)]
pub struct InfiniteZoom {
    enabled: bool,
    precision_limit: f64,
    duration: f64,
    transition: Option<(View, View, f64)>,
}

impl InfiniteZoom {
    pub const DEFAULT_PRECISION_LIMIT: f64 = 5e-7;
    pub const DEFAULT_DURATION: f64 = 2.0;

    pub fn new() -> Self {
        Self {
            enabled: false,
            precision_limit: Self::DEFAULT_PRECISION_LIMIT,
            duration: Self::DEFAULT_DURATION,
            transition: None,
        }
    }

    pub fn with_precision_limit(mut self, limit: f64) -> Self {
        self.precision_limit = limit;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds.max(f64::EPSILON);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning it off abandons a running transition where it stands.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.transition = None;
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Advance by `dt`, moving the viewport toward `home` when needed.
    /// Returns whether the view changed.
    pub fn update(&mut self, viewport: &mut Viewport, home: View, dt: f64) -> bool {
        if !self.enabled {
            return false;
        }
        let Some((from, to, progress)) = self.transition else {
            if viewport.view().zoom < self.precision_limit {
                log::debug!("infinite zoom: returning home from zoom {:e}", viewport.view().zoom);
                self.transition = Some((viewport.view(), home, 0.0));
                return true;
            }
            return false;
        };

        let progress = progress + dt / self.duration;
        if progress >= 1.0 {
            self.transition = None;
            viewport.set_view(to);
        } else {
            self.transition = Some((from, to, progress));
            viewport.set_view(from.interpolate(&to, smoothstep(progress)));
        }
        true
    }
}

impl Default for InfiniteZoom {
    fn default() -> Self {
        Self::new()
    }
}
