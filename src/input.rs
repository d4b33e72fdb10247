//! Keyboard and touch input for the viewer.
//!
//! Raw winit key codes are narrowed to [`KeyCode`], then mapped to a
//! [`LabAction`] or [`ExplorerAction`] depending on the mode. [`Touches`]
//! tracks active touch points so the viewer can tell a drag from a pinch or
//! a three-finger swipe.

use std::collections::BTreeMap;

use glam::DVec2;
use winit::event::TouchPhase;
use winit::keyboard::KeyCode as WinitKeyCode;

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    // Letters
    C, I, J, L, M, N, P, R, S, V,

    /// Digit row or numpad, 0-9.
    Digit(u8),

    // Arrows
    Up, Down, Left, Right,

    Space, Tab, Escape,
    Plus, Minus,
    BracketLeft, BracketRight,

    Other,
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyI => KeyCode::I,
            WinitKeyCode::KeyJ => KeyCode::J,
            WinitKeyCode::KeyL => KeyCode::L,
            WinitKeyCode::KeyM => KeyCode::M,
            WinitKeyCode::KeyN => KeyCode::N,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyV => KeyCode::V,

            WinitKeyCode::Digit0 | WinitKeyCode::Numpad0 => KeyCode::Digit(0),
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Digit(1),
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Digit(2),
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Digit(3),
            WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => KeyCode::Digit(4),
            WinitKeyCode::Digit5 | WinitKeyCode::Numpad5 => KeyCode::Digit(5),
            WinitKeyCode::Digit6 | WinitKeyCode::Numpad6 => KeyCode::Digit(6),
            WinitKeyCode::Digit7 | WinitKeyCode::Numpad7 => KeyCode::Digit(7),
            WinitKeyCode::Digit8 | WinitKeyCode::Numpad8 => KeyCode::Digit(8),
            WinitKeyCode::Digit9 | WinitKeyCode::Numpad9 => KeyCode::Digit(9),

            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,

            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Equal | WinitKeyCode::NumpadAdd => KeyCode::Plus,
            WinitKeyCode::Minus | WinitKeyCode::NumpadSubtract => KeyCode::Minus,
            WinitKeyCode::BracketLeft => KeyCode::BracketLeft,
            WinitKeyCode::BracketRight => KeyCode::BracketRight,

            _ => KeyCode::Other,
        }
    }
}

/// A pattern-lab command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabAction {
    TogglePause,
    Reset,
    ToggleComparison,
    /// Switch the selected simulation while comparing.
    SwapSelection,
    /// Zero-based index into the model catalog.
    SelectModel(usize),
    CycleColorMap,
    ToggleChannel,
    ToggleJourney,
    ToggleLoop,
    SkipForward,
    SkipBack,
    /// Start recording a custom path, or play the one being recorded.
    ToggleRecording,
    FasterJourney,
    SlowerJourney,
    MoreSteps,
    FewerSteps,
    Snapshot,
    Quit,
}

/// A fractal-explorer command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerAction {
    /// Pan by whole steps; `(1, 0)` is right, `(0, 1)` up.
    Pan(DVec2),
    ZoomIn,
    ZoomOut,
    ToggleAnimation,
    ToggleColorCycling,
    ToggleInfiniteZoom,
    ToggleLinked,
    CyclePalette,
    NextKind,
    PreviousKind,
    /// Zero-based preset index.
    Preset(usize),
    ToggleJourney,
    ResetView,
    Snapshot,
    Quit,
}

/// Key binding in pattern mode.
pub fn lab_action(key: KeyCode, shift: bool) -> Option<LabAction> {
    Some(match key {
        KeyCode::Space => LabAction::TogglePause,
        KeyCode::R => LabAction::Reset,
        KeyCode::C => LabAction::ToggleComparison,
        KeyCode::Tab => LabAction::SwapSelection,
        KeyCode::Digit(d @ 1..=5) => LabAction::SelectModel(d as usize - 1),
        KeyCode::M => LabAction::CycleColorMap,
        KeyCode::V => LabAction::ToggleChannel,
        KeyCode::J => LabAction::ToggleJourney,
        KeyCode::L => LabAction::ToggleLoop,
        KeyCode::Right if shift => LabAction::SkipForward,
        KeyCode::Left if shift => LabAction::SkipBack,
        KeyCode::P => LabAction::ToggleRecording,
        KeyCode::Plus => LabAction::FasterJourney,
        KeyCode::Minus => LabAction::SlowerJourney,
        KeyCode::BracketRight => LabAction::MoreSteps,
        KeyCode::BracketLeft => LabAction::FewerSteps,
        KeyCode::S => LabAction::Snapshot,
        KeyCode::Escape => LabAction::Quit,
        _ => return None,
    })
}

/// Key binding in fractal mode.
pub fn explorer_action(key: KeyCode, shift: bool) -> Option<ExplorerAction> {
    Some(match key {
        KeyCode::Up if shift => ExplorerAction::ZoomIn,
        KeyCode::Down if shift => ExplorerAction::ZoomOut,
        KeyCode::Up => ExplorerAction::Pan(DVec2::Y),
        KeyCode::Down => ExplorerAction::Pan(DVec2::NEG_Y),
        KeyCode::Left => ExplorerAction::Pan(DVec2::NEG_X),
        KeyCode::Right => ExplorerAction::Pan(DVec2::X),
        KeyCode::Plus => ExplorerAction::ZoomIn,
        KeyCode::Minus => ExplorerAction::ZoomOut,
        KeyCode::Space => ExplorerAction::ToggleAnimation,
        KeyCode::C => ExplorerAction::ToggleColorCycling,
        KeyCode::I => ExplorerAction::ToggleInfiniteZoom,
        KeyCode::L => ExplorerAction::ToggleLinked,
        KeyCode::M => ExplorerAction::CyclePalette,
        KeyCode::N => ExplorerAction::NextKind,
        KeyCode::P => ExplorerAction::PreviousKind,
        KeyCode::Digit(d @ 1..=9) => ExplorerAction::Preset(d as usize - 1),
        KeyCode::J => ExplorerAction::ToggleJourney,
        KeyCode::R => ExplorerAction::ResetView,
        KeyCode::S => ExplorerAction::Snapshot,
        KeyCode::Escape => ExplorerAction::Quit,
        _ => return None,
    })
}

/// What the set of active touches amounts to after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    None,
    /// One finger at this position.
    Single(DVec2),
    Pinch(DVec2, DVec2),
    /// Three or more fingers; mean x position.
    Swipe(f64),
}

/// Active touch points by id.
#[derive(Debug, Default, Clone)]
pub struct Touches {
    points: BTreeMap<u64, DVec2>,
}

impl Touches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Apply one touch event and return the resulting gesture.
    pub fn update(&mut self, id: u64, phase: TouchPhase, position: DVec2) -> Gesture {
        match phase {
            TouchPhase::Started | TouchPhase::Moved => {
                self.points.insert(id, position);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.points.remove(&id);
            }
        }
        self.gesture()
    }

    pub fn gesture(&self) -> Gesture {
        let mut points = self.points.values().copied();
        match self.points.len() {
            0 => Gesture::None,
            1 => points.next().map_or(Gesture::None, Gesture::Single),
            2 => match (points.next(), points.next()) {
                (Some(a), Some(b)) => Gesture::Pinch(a, b),
                _ => Gesture::None,
            },
            n => Gesture::Swipe(points.map(|p| p.x).sum::<f64>() / n as f64),
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Key mapping ==========

    #[test]
    fn test_winit_translation() {
        assert_eq!(KeyCode::from(WinitKeyCode::KeyR), KeyCode::R);
        assert_eq!(KeyCode::from(WinitKeyCode::Numpad3), KeyCode::Digit(3));
        assert_eq!(KeyCode::from(WinitKeyCode::Equal), KeyCode::Plus);
        assert_eq!(KeyCode::from(WinitKeyCode::F5), KeyCode::Other);
    }

    #[test]
    fn test_lab_bindings() {
        assert_eq!(lab_action(KeyCode::Space, false), Some(LabAction::TogglePause));
        assert_eq!(lab_action(KeyCode::Digit(1), false), Some(LabAction::SelectModel(0)));
        assert_eq!(lab_action(KeyCode::Digit(5), false), Some(LabAction::SelectModel(4)));
        assert_eq!(lab_action(KeyCode::Digit(6), false), None);
        assert_eq!(lab_action(KeyCode::Right, true), Some(LabAction::SkipForward));
        assert_eq!(lab_action(KeyCode::Right, false), None);
        assert_eq!(lab_action(KeyCode::P, false), Some(LabAction::ToggleRecording));
    }

    #[test]
    fn test_explorer_bindings() {
        assert_eq!(explorer_action(KeyCode::Up, false), Some(ExplorerAction::Pan(DVec2::Y)));
        assert_eq!(explorer_action(KeyCode::Up, true), Some(ExplorerAction::ZoomIn));
        assert_eq!(explorer_action(KeyCode::Minus, false), Some(ExplorerAction::ZoomOut));
        assert_eq!(explorer_action(KeyCode::Digit(9), false), Some(ExplorerAction::Preset(8)));
        assert_eq!(explorer_action(KeyCode::Digit(0), false), None);
    }

    // ========== Touches ==========

    #[test]
    fn test_touch_gestures() {
        let mut touches = Touches::new();
        let a = DVec2::new(10.0, 10.0);
        let b = DVec2::new(50.0, 10.0);
        let c = DVec2::new(90.0, 10.0);

        assert_eq!(touches.update(1, TouchPhase::Started, a), Gesture::Single(a));
        assert_eq!(touches.update(2, TouchPhase::Started, b), Gesture::Pinch(a, b));
        assert_eq!(touches.update(3, TouchPhase::Started, c), Gesture::Swipe(50.0));
        assert_eq!(touches.update(1, TouchPhase::Ended, a), Gesture::Pinch(b, c));
        touches.update(2, TouchPhase::Cancelled, b);
        touches.update(3, TouchPhase::Ended, c);
        assert_eq!(touches.gesture(), Gesture::None);
    }
}
