//! Colorizing simulation grids into RGBA images.
//!
//! Rendering is a pure read of the grid: one output pixel per cell, value
//! normalized against the model's range and looked up in a [`Lut`].
//! [`render_split`] composes two grids side by side for comparison mode.

use image::RgbaImage;
use rayon::prelude::*;

use crate::buffer::Grid;
use crate::colormap::Lut;

/// Color the divider line is pulled toward.
pub const DIVIDER_COLOR: [f32; 3] = [0.31, 0.76, 0.97];
/// How far divider pixels are pulled toward [`DIVIDER_COLOR`].
pub const DIVIDER_MIX: f32 = 0.8;
/// Default half-width of the divider line, in normalized x.
pub const DIVIDER_LINE_WIDTH: f32 = 0.003;

/// Map `value` from `(min, max)` onto `[0, 1]`, clamped. A zero-width range
/// maps everything to 0.
#[inline]
pub fn normalize(value: f32, (min, max): (f32, f32)) -> f32 {
    let span = max - min;
    if span.abs() < f32::EPSILON {
        return 0.0;
    }
    ((value - min) / span).clamp(0.0, 1.0)
}

/// Which side of a split view a pixel column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// Split-view layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitView {
    /// Normalized x of the boundary. Columns left of it show A.
    pub divider: f32,
    /// Half-width of the drawn divider line; 0 disables it.
    pub line_width: f32,
}

impl SplitView {
    pub fn new(divider: f32) -> Self {
        Self {
            divider: divider.clamp(0.0, 1.0),
            line_width: DIVIDER_LINE_WIDTH,
        }
    }

    pub fn with_line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width.max(0.0);
        self
    }

    /// Side of the pixel whose center sits at normalized `x`.
    #[inline]
    pub fn side(&self, x: f32) -> Side {
        if x < self.divider {
            Side::A
        } else {
            Side::B
        }
    }

    #[inline]
    pub fn on_line(&self, x: f32) -> bool {
        (x - self.divider).abs() < self.line_width
    }
}

impl Default for SplitView {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[inline]
fn shade(grid: &Grid, x: u32, y: u32, channel: usize, lut: &Lut, range: (f32, f32)) -> [u8; 3] {
    lut.sample(normalize(grid.get(x, y)[channel], range))
}

fn tint_divider(rgb: [u8; 3]) -> [u8; 3] {
    let mut out = [0u8; 3];
    for (i, c) in out.iter_mut().enumerate() {
        let base = rgb[i] as f32 / 255.0;
        let mixed = base + (DIVIDER_COLOR[i] - base) * DIVIDER_MIX;
        *c = (mixed * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Color one channel of a grid.
///
/// # Panics
///
/// Panics if `channel` is not 0..4.
pub fn render(grid: &Grid, channel: usize, lut: &Lut, range: (f32, f32)) -> RgbaImage {
    assert!(channel < 4, "channel index out of range");
    let (w, h) = grid.size();
    let mut image = RgbaImage::new(w, h);
    image
        .par_chunks_mut(w as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let [r, g, b] = shade(grid, x as u32, y as u32, channel, lut, range);
                px.copy_from_slice(&[r, g, b, 255]);
            }
        });
    image
}

/// Color two grids side by side: columns left of the divider come from `a`,
/// the rest from `b`.
///
/// # Panics
///
/// Panics if the grids differ in size or `channel` is not 0..4.
pub fn render_split(
    a: &Grid,
    b: &Grid,
    view: SplitView,
    channel: usize,
    lut: &Lut,
    range: (f32, f32),
) -> RgbaImage {
    assert_eq!(a.size(), b.size(), "split grids must be the same size");
    assert!(channel < 4, "channel index out of range");
    let (w, h) = a.size();
    let mut image = RgbaImage::new(w, h);
    image
        .par_chunks_mut(w as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let nx = (x as f32 + 0.5) / w as f32;
                let source = match view.side(nx) {
                    Side::A => a,
                    Side::B => b,
                };
                let mut rgb = shade(source, x as u32, y as u32, channel, lut, range);
                if view.on_line(nx) {
                    rgb = tint_divider(rgb);
                }
                px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        });
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::ColorMap;

    fn flat(value: f32) -> Grid {
        let mut grid = Grid::new(64, 8);
        grid.fill([value, 1.0 - value, 0.0, 0.0]);
        grid
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0.5, (0.0, 1.0)), 0.5);
        assert_eq!(normalize(-4.0, (0.0, 1.0)), 0.0);
        assert_eq!(normalize(4.0, (0.0, 1.0)), 1.0);
        assert_eq!(normalize(0.0, (-1.5, 1.5)), 0.5);
        assert_eq!(normalize(3.0, (2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_render_maps_through_lut() {
        let lut = ColorMap::Grayscale.lut();
        let img = render(&flat(1.0), 0, &lut, (0.0, 1.0));
        assert_eq!(img.dimensions(), (64, 8));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));

        let img = render(&flat(1.0), 1, &lut, (0.0, 1.0));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_render_does_not_touch_grid() {
        let grid = flat(0.3);
        let before = grid.clone();
        let _ = render(&grid, 0, &ColorMap::Heat.lut(), (0.0, 1.0));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_split_sides() {
        let lut = ColorMap::Grayscale.lut();
        let a = flat(1.0);
        let b = flat(0.0);
        for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let view = SplitView::new(p).with_line_width(0.0);
            let img = render_split(&a, &b, view, 0, &lut, (0.0, 1.0));
            for (x, _, px) in img.enumerate_pixels() {
                let nx = (x as f32 + 0.5) / 64.0;
                let expected = if nx < p { 255 } else { 0 };
                assert_eq!(px.0[0], expected, "divider {} column {}", p, x);
            }
        }
    }

    #[test]
    fn test_split_draws_divider() {
        let lut = ColorMap::Grayscale.lut();
        let a = flat(0.0);
        let view = SplitView::new(0.5).with_line_width(0.02);
        let img = render_split(&a, &a, view, 0, &lut, (0.0, 1.0));
        // Column 31 has its center at 0.492, inside the line
        let line = img.get_pixel(31, 0).0;
        assert_eq!(line, [63, 155, 198, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}
