//! Journeys: timed sweeps through parameter space and fractal views.
//!
//! A journey is an ordered list of waypoints. Segment `i` runs from waypoint
//! `i` to `i + 1` over `waypoints[i].duration` seconds, eased with
//! smoothstep. Shared parameter keys are lerped; views lerp their center
//! and interpolate zoom in log space.
//!
//! Built-in journeys are `'static` [`JourneyDef`]s in the model and fractal
//! catalogs. [`Journey`] is the owned form that [`JourneyPlayer`] plays and
//! that [`PathRecorder`] produces from clicks on a 2D parameter map.
//!
//! ```ignore
//! let mut player = JourneyPlayer::new();
//! player.play(Journey::from_def(&gray_scott::JOURNEYS[0]));
//! if let Some(frame) = player.update(dt) {
//!     params.merge(&frame.params);
//! }
//! ```

use crate::params::{ParamDef, ParameterSet};
use crate::viewport::{smoothstep, View};

/// Segment length when a waypoint does not give one.
pub const DEFAULT_SEGMENT_DURATION: f32 = 3.0;

/// A waypoint in a built-in journey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointDef {
    pub label: Option<&'static str>,
    pub params: &'static [(&'static str, f32)],
    pub view: Option<View>,
    /// Seconds to the next waypoint.
    pub duration: Option<f32>,
}

impl WaypointDef {
    /// Unlabelled parameter waypoint with the default duration.
    pub const fn params(params: &'static [(&'static str, f32)]) -> Self {
        Self {
            label: None,
            params,
            view: None,
            duration: None,
        }
    }

    pub const fn labelled(label: &'static str, params: &'static [(&'static str, f32)], duration: f32) -> Self {
        Self {
            label: Some(label),
            params,
            view: None,
            duration: Some(duration),
        }
    }

    /// A view-only waypoint.
    pub const fn view(label: &'static str, view: View, duration: f32) -> Self {
        Self {
            label: Some(label),
            params: &[],
            view: Some(view),
            duration: Some(duration),
        }
    }
}

/// A built-in journey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JourneyDef {
    pub name: &'static str,
    pub description: &'static str,
    /// Parameter shown on the x axis of a parameter map.
    pub param_x: Option<&'static str>,
    pub param_y: Option<&'static str>,
    pub waypoints: &'static [WaypointDef],
}

/// One stop on a journey.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub label: Option<String>,
    pub params: ParameterSet,
    pub view: Option<View>,
    pub duration: f32,
}

impl Waypoint {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            label: None,
            params,
            view: None,
            duration: DEFAULT_SEGMENT_DURATION,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds;
        self
    }
}

impl From<&WaypointDef> for Waypoint {
    fn from(def: &WaypointDef) -> Self {
        Self {
            label: def.label.map(str::to_string),
            params: ParameterSet::from_pairs(def.params),
            view: def.view,
            duration: def.duration.unwrap_or(DEFAULT_SEGMENT_DURATION),
        }
    }
}

/// An owned, playable journey.
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    pub name: String,
    pub description: String,
    pub param_x: Option<String>,
    pub param_y: Option<String>,
    pub waypoints: Vec<Waypoint>,
}

impl Journey {
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            param_x: None,
            param_y: None,
            waypoints,
        }
    }

    pub fn from_def(def: &JourneyDef) -> Self {
        Self {
            name: def.name.to_string(),
            description: def.description.to_string(),
            param_x: def.param_x.map(str::to_string),
            param_y: def.param_y.map(str::to_string),
            waypoints: def.waypoints.iter().map(Waypoint::from).collect(),
        }
    }

    /// Whether it has the two waypoints needed to play.
    pub fn is_playable(&self) -> bool {
        self.waypoints.len() >= 2 && self.total_duration() > 0.0
    }

    /// Sum of segment durations. The last waypoint starts no segment, so its
    /// duration does not count.
    pub fn total_duration(&self) -> f32 {
        match self.waypoints.split_last() {
            Some((_, head)) => head.iter().map(|w| w.duration.max(0.0)).sum(),
            None => 0.0,
        }
    }

    /// Progress at which waypoint `index` is reached.
    fn progress_of(&self, index: usize) -> f32 {
        let total = self.total_duration();
        if total <= 0.0 {
            return 0.0;
        }
        let elapsed: f32 = self.waypoints[..index].iter().map(|w| w.duration.max(0.0)).sum();
        (elapsed / total).min(1.0)
    }

    /// Index of the waypoint the segment containing `progress` starts at.
    fn segment_at(&self, progress: f32) -> usize {
        let target = progress * self.total_duration();
        let mut elapsed = 0.0;
        for (i, wp) in self.waypoints.iter().enumerate().take(self.waypoints.len().saturating_sub(1)) {
            elapsed += wp.duration.max(0.0);
            if target < elapsed {
                return i;
            }
        }
        self.waypoints.len().saturating_sub(1)
    }

    /// The journey state at `progress ∈ [0, 1]`. `None` for journeys with
    /// no waypoints.
    pub fn interpolate_at(&self, progress: f32) -> Option<JourneyFrame> {
        let last = self.waypoints.last()?;
        let total = self.total_duration();
        let target = progress.clamp(0.0, 1.0) * total;

        let mut elapsed = 0.0;
        for pair in self.waypoints.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let duration = a.duration.max(0.0);
            if duration > 0.0 && target <= elapsed + duration {
                let s = smoothstep(((target - elapsed) / duration) as f64);
                return Some(JourneyFrame {
                    params: ParameterSet::lerp_shared(&a.params, &b.params, s as f32),
                    view: match (a.view, b.view) {
                        (Some(va), Some(vb)) => Some(va.interpolate(&vb, s)),
                        _ => None,
                    },
                    label: if s < 0.5 { a.label.clone() } else { b.label.clone() },
                    progress,
                });
            }
            elapsed += duration;
        }

        Some(JourneyFrame {
            params: last.params.clone(),
            view: last.view,
            label: last.label.clone(),
            progress,
        })
    }
}

/// Interpolated journey state for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyFrame {
    /// Values to write into the live parameter set.
    pub params: ParameterSet,
    pub view: Option<View>,
    pub label: Option<String>,
    pub progress: f32,
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Plays a [`Journey`] in real time.
#[derive(Debug, Clone)]
pub struct JourneyPlayer {
    state: PlaybackState,
    journey: Option<Journey>,
    progress: f32,
    speed: f32,
    looping: bool,
}

impl JourneyPlayer {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            journey: None,
            progress: 0.0,
            speed: 1.0,
            looping: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// The loaded journey, kept after it stops so it can be replayed.
    pub fn journey(&self) -> Option<&Journey> {
        self.journey.as_ref()
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Load and start `journey` from the beginning. Journeys with fewer than
    /// two waypoints are refused and leave the player untouched.
    pub fn play(&mut self, journey: Journey) -> bool {
        if !journey.is_playable() {
            log::debug!("refusing to play '{}': needs at least two waypoints", journey.name);
            return false;
        }
        log::info!("journey '{}' started ({:.1}s)", journey.name, journey.total_duration());
        self.journey = Some(journey);
        self.progress = 0.0;
        self.state = PlaybackState::Playing;
        true
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            log::info!("journey stopped");
        }
        self.state = PlaybackState::Stopped;
        self.progress = 0.0;
    }

    /// Stop and forget the loaded journey.
    pub fn unload(&mut self) {
        self.stop();
        self.journey = None;
    }

    /// Playing ⇄ Paused; from Stopped, replays the loaded journey.
    pub fn toggle(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopped => {
                if let Some(journey) = self.journey.take() {
                    if !self.play(journey.clone()) {
                        self.journey = Some(journey);
                    }
                }
            }
        }
        self.state
    }

    /// Pause because the user grabbed the view. Returns whether it paused.
    pub fn pause_for_interaction(&mut self) -> bool {
        if self.state == PlaybackState::Playing {
            log::debug!("journey paused by user interaction");
            self.state = PlaybackState::Paused;
            true
        } else {
            false
        }
    }

    /// Advance by `dt` seconds. Returns the frame to apply, or `None` when
    /// not playing. Past the end it wraps when looping; otherwise it returns
    /// the final waypoint and stops.
    pub fn update(&mut self, dt: f32) -> Option<JourneyFrame> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let journey = self.journey.as_ref()?;
        let total = journey.total_duration();
        self.progress += dt * self.speed / total;

        if self.progress >= 1.0 {
            if self.looping {
                self.progress = 0.0;
            } else {
                let frame = journey.interpolate_at(1.0);
                log::info!("journey '{}' finished", journey.name);
                self.state = PlaybackState::Stopped;
                self.progress = 0.0;
                return frame;
            }
        }
        journey.interpolate_at(self.progress)
    }

    /// State of the loaded journey at `progress`, without touching playback.
    pub fn interpolate_at(&self, progress: f32) -> Option<JourneyFrame> {
        self.journey.as_ref()?.interpolate_at(progress)
    }

    pub fn skip_forward(&mut self) -> Option<JourneyFrame> {
        self.skip(1)
    }

    pub fn skip_back(&mut self) -> Option<JourneyFrame> {
        self.skip(-1)
    }

    /// Jump to the start of a neighbouring waypoint and keep playing.
    fn skip(&mut self, direction: isize) -> Option<JourneyFrame> {
        let journey = self.journey.as_ref()?;
        if !journey.is_playable() {
            return None;
        }
        let current = journey.segment_at(self.progress) as isize;
        let last = journey.waypoints.len() as isize - 1;
        let target = (current + direction).clamp(0, last) as usize;
        self.progress = journey.progress_of(target);
        self.state = PlaybackState::Playing;
        journey.interpolate_at(self.progress)
    }
}

impl Default for JourneyPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a custom journey from clicks on a 2D parameter map.
#[derive(Debug, Clone)]
pub struct PathRecorder {
    x: ParamDef,
    y: ParamDef,
    points: Vec<Waypoint>,
}

impl PathRecorder {
    /// Record over the map spanned by `x` (left to right) and `y` (bottom
    /// to top).
    pub fn new(x: ParamDef, y: ParamDef) -> Self {
        Self { x, y, points: Vec::new() }
    }

    pub fn axes(&self) -> (&ParamDef, &ParamDef) {
        (&self.x, &self.y)
    }

    /// Add a waypoint at map position `(nx, ny)`, where `ny` is measured
    /// from the top of the map. Unmapped parameters keep their `current`
    /// values.
    pub fn add_point(&mut self, nx: f32, ny: f32, current: &ParameterSet) {
        let mut params = current.clone();
        params.insert(self.x.id, self.x.denormalize(nx.clamp(0.0, 1.0)));
        params.insert(self.y.id, self.y.denormalize(1.0 - ny.clamp(0.0, 1.0)));
        self.points.push(Waypoint::new(params));
    }

    pub fn points(&self) -> &[Waypoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// The recorded path as a journey; `None` with fewer than two points.
    pub fn finish(self, name: impl Into<String>) -> Option<Journey> {
        if self.points.len() < 2 {
            return None;
        }
        Some(Journey {
            name: name.into(),
            description: String::from("Custom path"),
            param_x: Some(self.x.id.to_string()),
            param_y: Some(self.y.id.to_string()),
            waypoints: self.points,
        })
    }
}
