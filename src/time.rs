//! Frame timing for the viewer loop.
//!
//! [`FrameClock`] turns wall-clock instants into the `dt` the controllers
//! tick with. Deltas are clamped so a stall (window drag, breakpoint,
//! suspended laptop) does not fling a journey or inertia across the screen.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let dt = clock.tick();
//!     lab.tick(dt);
//! }
//! ```

use std::time::{Duration, Instant};

/// Largest delta [`FrameClock::tick`] reports, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.1;

#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    delta_secs: f32,
    max_delta: f32,
    fixed_delta: Option<f32>,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            max_delta: MAX_FRAME_DELTA,
            fixed_delta: None,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Report `delta` every frame regardless of wall time.
    pub fn with_fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta = Some(delta.max(0.0));
        self
    }

    pub fn with_max_delta(mut self, max: f32) -> Self {
        self.max_delta = max.max(0.0);
        self
    }

    /// Start a frame. Returns the clamped seconds since the previous one.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// [`tick`](Self::tick) with an explicit "now".
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let raw = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw).min(self.max_delta);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }
        self.delta_secs
    }

    /// Last reported delta, in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Seconds since the clock started.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Forget the gap since the last frame, e.g. after the window was
    /// hidden.
    pub fn resync(&mut self) {
        self.last_frame = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.delta(), 0.0);
    }

    #[test]
    fn test_tick_measures_delta() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-4);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(dt, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::new().with_fixed_delta(1.0 / 60.0);
        let start = clock.last_frame;
        clock.tick_at(start + Duration::from_millis(90));
        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_fps_refresh() {
        let mut clock = FrameClock::new();
        let start = clock.last_frame;
        for i in 1..=30 {
            clock.tick_at(start + Duration::from_millis(20 * i));
        }
        // 25 frames had passed at the 500 ms refresh
        assert!((clock.fps() - 50.0).abs() < 0.5);
    }
}
