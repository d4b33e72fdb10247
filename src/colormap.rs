//! Color maps for turning scalar fields into pixels.
//!
//! Each [`ColorMap`] is a short list of `(stop, rgb)` pairs. Before use it
//! is resolved into a 256-entry [`Lut`]; rendering samples the table with
//! linear interpolation between neighbouring entries.
//!
//! # Example
//!
//! ```ignore
//! use morphogen::colormap::ColorMap;
//!
//! let lut = ColorMap::Viridis.lut();
//! assert_eq!(lut.entry(0), [68, 1, 84]);
//! let mid = lut.sample(0.5);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Number of entries in a resolved lookup table.
pub const LUT_SIZE: usize = 256;

/// Built-in color maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMap {
    /// Black through purple and red to white. The default for patterns.
    #[default]
    Heat,
    /// Deep navy to pale cyan.
    Ocean,
    /// Black to white.
    Grayscale,
    /// Black, violet, green, sky blue, white.
    Neon,
    /// Perceptually uniform purple → teal → yellow.
    Viridis,
    /// Perceptually uniform black → magenta → cream.
    Magma,
    /// Blue, white, gold, black and back to blue; the usual escape-time look.
    Classic,
    /// Black, red, orange, yellow, white.
    Fire,
    /// Full hue wheel, wrapping back to red.
    Rainbow,
    /// White through pale blue to navy.
    Ice,
}

impl ColorMap {
    pub const ALL: [ColorMap; 10] = [
        ColorMap::Heat,
        ColorMap::Ocean,
        ColorMap::Grayscale,
        ColorMap::Neon,
        ColorMap::Viridis,
        ColorMap::Magma,
        ColorMap::Classic,
        ColorMap::Fire,
        ColorMap::Rainbow,
        ColorMap::Ice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorMap::Heat => "heat",
            ColorMap::Ocean => "ocean",
            ColorMap::Grayscale => "grayscale",
            ColorMap::Neon => "neon",
            ColorMap::Viridis => "viridis",
            ColorMap::Magma => "magma",
            ColorMap::Classic => "classic",
            ColorMap::Fire => "fire",
            ColorMap::Rainbow => "rainbow",
            ColorMap::Ice => "ice",
        }
    }

    /// Ordered `(stop, [r, g, b])` pairs, stops ascending from 0 to 1.
    pub fn stops(self) -> &'static [(f32, [u8; 3])] {
        match self {
            ColorMap::Heat => &[
                (0.0, [0, 0, 0]),
                (0.2, [30, 0, 80]),
                (0.4, [180, 0, 30]),
                (0.6, [255, 120, 0]),
                (0.8, [255, 230, 50]),
                (1.0, [255, 255, 255]),
            ],
            ColorMap::Ocean => &[
                (0.0, [5, 5, 30]),
                (0.25, [0, 40, 100]),
                (0.5, [0, 120, 180]),
                (0.75, [79, 195, 247]),
                (1.0, [200, 240, 255]),
            ],
            ColorMap::Grayscale => &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
            ColorMap::Neon => &[
                (0.0, [0, 0, 0]),
                (0.25, [139, 92, 246]),
                (0.5, [0, 255, 128]),
                (0.75, [79, 195, 247]),
                (1.0, [255, 255, 255]),
            ],
            ColorMap::Viridis => &[
                (0.0, [68, 1, 84]),
                (0.25, [59, 82, 139]),
                (0.5, [33, 145, 140]),
                (0.75, [94, 201, 98]),
                (1.0, [253, 231, 37]),
            ],
            ColorMap::Magma => &[
                (0.0, [0, 0, 4]),
                (0.25, [81, 18, 124]),
                (0.5, [183, 55, 121]),
                (0.75, [254, 159, 109]),
                (1.0, [252, 253, 191]),
            ],
            ColorMap::Classic => &[
                (0.0, [0, 7, 100]),
                (0.16, [32, 107, 203]),
                (0.42, [237, 255, 255]),
                (0.6425, [255, 170, 0]),
                (0.8575, [0, 2, 0]),
                (1.0, [0, 7, 100]),
            ],
            ColorMap::Fire => &[
                (0.0, [0, 0, 0]),
                (0.25, [128, 0, 0]),
                (0.5, [255, 128, 0]),
                (0.75, [255, 255, 0]),
                (1.0, [255, 255, 255]),
            ],
            ColorMap::Rainbow => &[
                (0.0, [255, 0, 0]),
                (0.167, [255, 255, 0]),
                (0.333, [0, 255, 0]),
                (0.5, [0, 255, 255]),
                (0.667, [0, 0, 255]),
                (0.833, [255, 0, 255]),
                (1.0, [255, 0, 0]),
            ],
            ColorMap::Ice => &[
                (0.0, [255, 255, 255]),
                (0.33, [180, 220, 255]),
                (0.67, [80, 120, 200]),
                (1.0, [20, 20, 80]),
            ],
        }
    }

    /// Color at `t` straight from the stops, rounded per channel.
    pub fn eval(self, t: f32) -> [u8; 3] {
        let stops = self.stops();
        let first = stops[0];
        let last = stops[stops.len() - 1];
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for pair in stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t >= t0 && t <= t1 {
                let f = (t - t0) / (t1 - t0);
                let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
                return [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])];
            }
        }
        [0, 0, 0]
    }

    /// Resolve into a 256-entry table.
    pub fn lut(self) -> Lut {
        let mut entries = [[0u8; 3]; LUT_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = self.eval(i as f32 / (LUT_SIZE - 1) as f32);
        }
        Lut { map: self, entries }
    }

    /// The next map in [`ALL`](Self::ALL) order, wrapping around.
    pub fn next(self) -> ColorMap {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMap {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| ModelError::UnknownColorMap(s.to_string()))
    }
}

/// A resolved 256-entry lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut {
    map: ColorMap,
    entries: [[u8; 3]; LUT_SIZE],
}

impl Lut {
    /// Which map this table was built from.
    pub fn map(&self) -> ColorMap {
        self.map
    }

    #[inline]
    pub fn entry(&self, index: usize) -> [u8; 3] {
        self.entries[index.min(LUT_SIZE - 1)]
    }

    /// Color at `t ∈ [0, 1]`, interpolated between the two nearest entries.
    /// `t` is clamped; NaN maps to the first entry.
    #[inline]
    pub fn sample(&self, t: f32) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (LUT_SIZE - 1) as f32;
        let i = pos.floor() as usize;
        if i >= LUT_SIZE - 1 {
            return self.entries[LUT_SIZE - 1];
        }
        let f = pos - i as f32;
        let a = self.entries[i];
        let b = self.entries[i + 1];
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
        [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lut_endpoints_match_stops() {
        for map in ColorMap::ALL {
            let lut = map.lut();
            let stops = map.stops();
            assert_eq!(lut.entry(0), stops[0].1, "{}", map);
            assert_eq!(lut.entry(255), stops[stops.len() - 1].1, "{}", map);
        }
    }

    #[test]
    fn test_grayscale_is_identity() {
        let lut = ColorMap::Grayscale.lut();
        for i in 0..LUT_SIZE {
            let v = i as u8;
            assert_eq!(lut.entry(i), [v, v, v]);
        }
    }

    #[test]
    fn test_eval_rounds_half_up() {
        // Heat from [0,0,0] to [30,0,80] over 0..0.2; at 0.1 it is [15,0,40]
        assert_eq!(ColorMap::Heat.eval(0.1), [15, 0, 40]);
        assert_eq!(ColorMap::Viridis.eval(0.25), [59, 82, 139]);
    }

    #[test]
    fn test_sample_clamps_and_handles_nan() {
        let lut = ColorMap::Fire.lut();
        assert_eq!(lut.sample(-3.0), [0, 0, 0]);
        assert_eq!(lut.sample(7.0), [255, 255, 255]);
        assert_eq!(lut.sample(f32::NAN), [0, 0, 0]);
    }

    #[test]
    fn test_sample_hits_entries_exactly() {
        let lut = ColorMap::Magma.lut();
        assert_eq!(lut.sample(128.0 / 255.0), lut.entry(128));
    }

    #[test]
    fn test_names_roundtrip() {
        for map in ColorMap::ALL {
            assert_eq!(map.name().parse::<ColorMap>(), Ok(map));
        }
        assert_eq!(
            "sepia".parse::<ColorMap>(),
            Err(ModelError::UnknownColorMap("sepia".into()))
        );
    }

    #[test]
    fn test_next_cycles() {
        assert_eq!(ColorMap::Heat.next(), ColorMap::Ocean);
        assert_eq!(ColorMap::Ice.next(), ColorMap::Heat);
    }
}
