//! The reaction-diffusion compute kernel.
//!
//! Every model implements [`Reaction`]: a rate function over the two species
//! and their Laplacians, a valid range per channel, the channel the brush
//! perturbs, an initial-condition recipe, and the same rate function as a
//! WGSL snippet. [`Kernel`] is the tagged union over all models that the
//! steppers dispatch on.
//!
//! One step, per cell:
//!
//! 1. `lap = 9-point Laplacian` (center −1, axis 0.2, diagonal 0.05, wrapping edges)
//! 2. `s += rates(s, lap) * dt`
//! 3. `s[brush_channel] += intensity * smoothstep(radius, 0, |uv - brush|)`
//! 4. non-finite values become 0, then `s` is clamped to the model range
//!
//! The CPU path here runs rows in parallel with rayon. The GPU path
//! ([`crate::gpu::GpuStepper`]) runs the shader produced by [`Kernel::wgsl`].

use glam::Vec2;
use rand::Rng;
use rayon::prelude::*;

use crate::brush::BrushUniform;
use crate::buffer::Grid;
use crate::model::{
    Brusselator, FitzHughNagumo, GiererMeinhardt, GrayScott, ModelId, Schnakenberg,
};
use crate::params::{ModelParams, ParameterSet};

/// Laplacian weight of the cell itself.
pub const LAPLACIAN_CENTER: f32 = -1.0;
/// Laplacian weight of each of the four axis neighbours.
pub const LAPLACIAN_AXIS: f32 = 0.2;
/// Laplacian weight of each of the four diagonal neighbours.
pub const LAPLACIAN_DIAGONAL: f32 = 0.05;

/// Stand-in for "no upper bound" that still survives a trip through WGSL.
pub const UNBOUNDED: f32 = 1.0e30;

/// Workgroup edge length of the generated compute shader.
pub const WORKGROUP_SIZE: u32 = 8;

/// Per-model reaction terms.
pub trait Reaction: ModelParams + Send + Sync {
    /// Valid `(min, max)` per channel; values are clamped after every step.
    const CHANNEL_RANGE: [(f32, f32); 2];
    /// Channel the brush adds to.
    const BRUSH_CHANNEL: usize;
    /// WGSL statements defining `r0` and `r1` from `s0`, `s1`, `lap` and the
    /// parameter bindings.
    const WGSL_REACTION: &'static str;

    fn dt(&self) -> f32;

    /// Rate of change of both channels, diffusion included.
    fn rates(&self, state: [f32; 2], laplacian: [f32; 2]) -> [f32; 2];

    /// Fill a grid with this model's initial condition.
    fn seed<G: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut G);
}

/// A model with its current parameter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    GrayScott(GrayScott),
    FitzHughNagumo(FitzHughNagumo),
    GiererMeinhardt(GiererMeinhardt),
    Brusselator(Brusselator),
    Schnakenberg(Schnakenberg),
}

macro_rules! dispatch {
    ($kernel:expr, $r:ident => $body:expr) => {
        match $kernel {
            Kernel::GrayScott($r) => $body,
            Kernel::FitzHughNagumo($r) => $body,
            Kernel::GiererMeinhardt($r) => $body,
            Kernel::Brusselator($r) => $body,
            Kernel::Schnakenberg($r) => $body,
        }
    };
}

macro_rules! dispatch_type {
    ($kernel:expr, $t:ident => $body:expr) => {
        match $kernel {
            Kernel::GrayScott(_) => {
                type $t = GrayScott;
                $body
            }
            Kernel::FitzHughNagumo(_) => {
                type $t = FitzHughNagumo;
                $body
            }
            Kernel::GiererMeinhardt(_) => {
                type $t = GiererMeinhardt;
                $body
            }
            Kernel::Brusselator(_) => {
                type $t = Brusselator;
                $body
            }
            Kernel::Schnakenberg(_) => {
                type $t = Schnakenberg;
                $body
            }
        }
    };
}

impl Kernel {
    /// Build the kernel for `model` from a parameter set. Missing ids fall
    /// back to their defaults.
    pub fn new(model: ModelId, params: &ParameterSet) -> Self {
        match model {
            ModelId::GrayScott => Kernel::GrayScott(GrayScott::from_set(params)),
            ModelId::FitzHughNagumo => Kernel::FitzHughNagumo(FitzHughNagumo::from_set(params)),
            ModelId::GiererMeinhardt => Kernel::GiererMeinhardt(GiererMeinhardt::from_set(params)),
            ModelId::Brusselator => Kernel::Brusselator(Brusselator::from_set(params)),
            ModelId::Schnakenberg => Kernel::Schnakenberg(Schnakenberg::from_set(params)),
        }
    }

    /// Kernel with every parameter at its default.
    pub fn with_defaults(model: ModelId) -> Self {
        Self::new(model, &ParameterSet::new())
    }

    pub fn model(&self) -> ModelId {
        match self {
            Kernel::GrayScott(_) => ModelId::GrayScott,
            Kernel::FitzHughNagumo(_) => ModelId::FitzHughNagumo,
            Kernel::GiererMeinhardt(_) => ModelId::GiererMeinhardt,
            Kernel::Brusselator(_) => ModelId::Brusselator,
            Kernel::Schnakenberg(_) => ModelId::Schnakenberg,
        }
    }

    pub fn parameters(&self) -> ParameterSet {
        dispatch!(self, r => r.to_set())
    }

    pub fn brush_channel(&self) -> usize {
        dispatch_type!(self, R => R::BRUSH_CHANNEL)
    }

    /// Parameters packed for the GPU uniform block.
    pub fn gpu_words(&self) -> [f32; 8] {
        dispatch!(self, r => r.gpu_words())
    }

    /// A freshly seeded grid.
    pub fn seed<G: Rng + ?Sized>(&self, width: u32, height: u32, rng: &mut G) -> Grid {
        let mut grid = Grid::new(width, height);
        dispatch!(self, r => r.seed(&mut grid, rng));
        grid
    }

    /// One step from `src` into `dst`. Both grids must be the same size.
    pub fn step(&self, src: &Grid, dst: &mut Grid, brush: &BrushUniform) {
        dispatch!(self, r => step_grid(r, src, dst, brush))
    }

    /// Complete compute shader for this model.
    pub fn wgsl(&self) -> String {
        dispatch_type!(self, R => generate_wgsl::<R>())
    }
}

/// 9-point Laplacian of channels 0 and 1 at `(x, y)`, wrapping at the edges.
#[inline]
pub fn laplacian(grid: &Grid, x: u32, y: u32) -> [f32; 2] {
    let (w, h) = grid.size();
    let xl = if x == 0 { w - 1 } else { x - 1 };
    let xr = if x + 1 == w { 0 } else { x + 1 };
    let yu = if y == 0 { h - 1 } else { y - 1 };
    let yd = if y + 1 == h { 0 } else { y + 1 };

    let c = grid.get(x, y);
    let axis = [grid.get(xl, y), grid.get(xr, y), grid.get(x, yu), grid.get(x, yd)];
    let diag = [grid.get(xl, yu), grid.get(xr, yu), grid.get(xl, yd), grid.get(xr, yd)];

    let mut out = [0.0f32; 2];
    for (ch, value) in out.iter_mut().enumerate() {
        let axis_sum: f32 = axis.iter().map(|n| n[ch]).sum();
        let diag_sum: f32 = diag.iter().map(|n| n[ch]).sum();
        *value = LAPLACIAN_CENTER * c[ch] + LAPLACIAN_AXIS * axis_sum + LAPLACIAN_DIAGONAL * diag_sum;
    }
    out
}

fn step_grid<R: Reaction>(r: &R, src: &Grid, dst: &mut Grid, brush: &BrushUniform) {
    assert_eq!(src.size(), dst.size(), "step source and target must match");
    let (w, h) = src.size();
    let dt = r.dt();
    let texel = Vec2::new(1.0 / w as f32, 1.0 / h as f32);

    dst.cells_mut()
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (x, out) in row.iter_mut().enumerate() {
                let x = x as u32;
                let cell = src.get(x, y);
                let lap = laplacian(src, x, y);
                let rate = r.rates([cell[0], cell[1]], lap);

                let mut next = [cell[0] + rate[0] * dt, cell[1] + rate[1] * dt];

                let uv = Vec2::new((x as f32 + 0.5) * texel.x, (y as f32 + 0.5) * texel.y);
                next[R::BRUSH_CHANNEL] += brush.amount_at(uv);

                for (value, (lo, hi)) in next.iter_mut().zip(R::CHANNEL_RANGE) {
                    let v = if value.is_finite() { *value } else { 0.0 };
                    *value = v.clamp(lo, hi);
                }

                *out = [next[0], next[1], cell[2], cell[3]];
            }
        });
}

/// Set every cell within `radius` of `(cx, cy)` (cell units) to `value`.
/// Discs are clipped at the grid edge.
pub fn stamp_disc(grid: &mut Grid, cx: f32, cy: f32, radius: f32, value: [f32; 4]) {
    let (w, h) = grid.size();
    let r2 = radius * radius;
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(w - 1);
    let y1 = ((cy + radius).ceil() as u32).min(h - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy < r2 {
                grid.set(x, y, value);
            }
        }
    }
}

/// Fill channels 0 and 1 with `base + (r - 0.5) * scale`, with independent
/// uniform `r` per channel and cell.
pub fn fill_with_noise<G: Rng + ?Sized>(grid: &mut Grid, base: [f32; 2], scale: f32, rng: &mut G) {
    for cell in grid.cells_mut() {
        cell[0] = base[0] + (rng.gen::<f32>() - 0.5) * scale;
        cell[1] = base[1] + (rng.gen::<f32>() - 0.5) * scale;
        cell[2] = 0.0;
        cell[3] = 0.0;
    }
}

fn wgsl_float(value: f32) -> String {
    let s = format!("{:?}", value);
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

fn generate_wgsl<R: Reaction>() -> String {
    let component = ["x", "y"][R::BRUSH_CHANNEL];
    let [(lo0, hi0), (lo1, hi1)] = R::CHANNEL_RANGE;
    format!(
        r#"struct SimUniforms {{
    size: vec2<u32>,
    brush_pos: vec2<f32>,
    brush_radius: f32,
    brush_intensity: f32,
    _pad: vec2<f32>,
    params: array<vec4<f32>, 2>,
}};

@group(0) @binding(0) var<storage, read> src: array<vec4<f32>>;
@group(0) @binding(1) var<storage, read_write> dst: array<vec4<f32>>;
@group(0) @binding(2) var<uniform> sim: SimUniforms;

fn fetch(x: i32, y: i32) -> vec4<f32> {{
    let w = i32(sim.size.x);
    let h = i32(sim.size.y);
    let xw = ((x % w) + w) % w;
    let yw = ((y % h) + h) % h;
    return src[u32(yw * w + xw)];
}}

fn laplacian(x: i32, y: i32) -> vec2<f32> {{
    let c = fetch(x, y).xy;
    let axis = fetch(x - 1, y).xy + fetch(x + 1, y).xy + fetch(x, y - 1).xy + fetch(x, y + 1).xy;
    let diag = fetch(x - 1, y - 1).xy + fetch(x + 1, y - 1).xy + fetch(x - 1, y + 1).xy + fetch(x + 1, y + 1).xy;
    return {center} * c + {axis_w} * axis + {diag_w} * diag;
}}

fn brush_amount(uv: vec2<f32>) -> f32 {{
    if (sim.brush_pos.x < 0.0 || sim.brush_radius <= 0.0) {{
        return 0.0;
    }}
    let t = clamp(1.0 - distance(uv, sim.brush_pos) / sim.brush_radius, 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t) * sim.brush_intensity;
}}

@compute @workgroup_size({wg}, {wg})
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
    if (gid.x >= sim.size.x || gid.y >= sim.size.y) {{
        return;
    }}
    let x = i32(gid.x);
    let y = i32(gid.y);
    let cell = fetch(x, y);
    let s0 = cell.x;
    let s1 = cell.y;
    let lap = laplacian(x, y);

{bindings}{reaction}
    var next = vec2<f32>(s0, s1) + vec2<f32>(r0, r1) * dt;
    let uv = (vec2<f32>(f32(gid.x), f32(gid.y)) + vec2<f32>(0.5, 0.5)) / vec2<f32>(sim.size);
    next.{component} = next.{component} + brush_amount(uv);
    next = select(next, vec2<f32>(0.0), (next != next) | (abs(next) > vec2<f32>(3.4e38)));
    next = clamp(next, vec2<f32>({lo0}, {lo1}), vec2<f32>({hi0}, {hi1}));
    dst[gid.y * sim.size.x + gid.x] = vec4<f32>(next, cell.z, cell.w);
}}
"#,
        center = wgsl_float(LAPLACIAN_CENTER),
        axis_w = wgsl_float(LAPLACIAN_AXIS),
        diag_w = wgsl_float(LAPLACIAN_DIAGONAL),
        wg = WORKGROUP_SIZE,
        bindings = R::WGSL_BINDINGS,
        reaction = R::WGSL_REACTION,
        component = component,
        lo0 = wgsl_float(lo0),
        lo1 = wgsl_float(lo1),
        hi0 = wgsl_float(hi0),
        hi1 = wgsl_float(hi1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(model: ModelId, size: u32) -> (Kernel, Grid) {
        let kernel = Kernel::with_defaults(model);
        let grid = kernel.seed(size, size, &mut StdRng::seed_from_u64(7));
        (kernel, grid)
    }

    #[test]
    fn test_laplacian_of_constant_is_zero() {
        let mut grid = Grid::new(5, 4);
        grid.fill([0.7, -1.3, 0.0, 0.0]);
        for y in 0..4 {
            for x in 0..5 {
                let [a, b] = laplacian(&grid, x, y);
                assert!(a.abs() < 1e-6 && b.abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_laplacian_weights_and_wrap() {
        let mut grid = Grid::new(4, 4);
        grid.set(0, 0, [1.0, 0.0, 0.0, 0.0]);
        // The spike itself
        assert!((laplacian(&grid, 0, 0)[0] - -1.0).abs() < 1e-6);
        // Axis neighbour across the left edge
        assert!((laplacian(&grid, 3, 0)[0] - 0.2).abs() < 1e-6);
        // Diagonal neighbour across both edges
        assert!((laplacian(&grid, 3, 3)[0] - 0.05).abs() < 1e-6);
        assert_eq!(laplacian(&grid, 2, 2)[0], 0.0);
    }

    #[test]
    fn test_step_is_deterministic() {
        for model in ModelId::ALL {
            let (kernel, grid) = seeded(model, 32);
            let brush = BrushUniform::at(Vec2::new(0.5, 0.5), 0.1, 0.5);
            let mut a = Grid::new(32, 32);
            let mut b = Grid::new(32, 32);
            kernel.step(&grid, &mut a, &brush);
            kernel.step(&grid, &mut b, &brush);
            assert_eq!(a, b, "{}", model);
        }
    }

    #[test]
    fn test_inactive_brush_contributes_nothing() {
        let (kernel, grid) = seeded(ModelId::GrayScott, 32);
        let mut with_sentinel = Grid::new(32, 32);
        let mut zero_intensity = Grid::new(32, 32);
        kernel.step(&grid, &mut with_sentinel, &BrushUniform::inactive());
        kernel.step(
            &grid,
            &mut zero_intensity,
            &BrushUniform::at(Vec2::new(0.5, 0.5), 0.2, 0.0),
        );
        assert_eq!(with_sentinel, zero_intensity);
    }

    #[test]
    fn test_brush_adds_to_designated_channel() {
        let kernel = Kernel::with_defaults(ModelId::Brusselator);
        let mut grid = Grid::new(16, 16);
        grid.fill([1.0, 3.0, 0.0, 0.0]);
        let mut plain = Grid::new(16, 16);
        let mut brushed = Grid::new(16, 16);
        kernel.step(&grid, &mut plain, &BrushUniform::inactive());
        kernel.step(&grid, &mut brushed, &BrushUniform::at(Vec2::new(0.5, 0.5), 0.2, 0.5));

        let before = plain.get(8, 8);
        let after = brushed.get(8, 8);
        assert!(after[0] > before[0]);
        assert_eq!(after[1], before[1]);
        // Far corner is outside the radius
        assert_eq!(plain.get(0, 0), brushed.get(0, 0));
    }

    #[test]
    fn test_step_respects_channel_range() {
        let (kernel, grid) = seeded(ModelId::GrayScott, 16);
        let mut out = Grid::new(16, 16);
        kernel.step(&grid, &mut out, &BrushUniform::at(Vec2::new(0.5, 0.5), 1.0, 100.0));
        assert!(out.cells().iter().all(|c| (0.0..=1.0).contains(&c[0]) && (0.0..=1.0).contains(&c[1])));
    }

    #[test]
    fn test_degenerate_params_stay_finite() {
        let mut params = ParameterSet::new();
        params.insert("dt", 1.0e6);
        params.insert("Du", 0.0);
        params.insert("Dv", 0.0);
        let kernel = Kernel::new(ModelId::Brusselator, &params);
        let mut grid = kernel.seed(8, 8, &mut StdRng::seed_from_u64(1));
        let mut scratch = Grid::new(8, 8);
        for _ in 0..20 {
            kernel.step(&grid, &mut scratch, &BrushUniform::inactive());
            std::mem::swap(&mut grid, &mut scratch);
        }
        assert!(grid.cells().iter().all(|c| c[0].is_finite() && c[1].is_finite()));
    }

    #[test]
    fn test_reserved_channels_pass_through() {
        let kernel = Kernel::with_defaults(ModelId::FitzHughNagumo);
        let mut grid = Grid::new(4, 4);
        grid.fill([0.1, 0.1, 0.25, 0.75]);
        let mut out = Grid::new(4, 4);
        kernel.step(&grid, &mut out, &BrushUniform::inactive());
        assert!(out.cells().iter().all(|c| c[2] == 0.25 && c[3] == 0.75));
    }

    #[test]
    fn test_kernel_params_roundtrip() {
        let mut params = ParameterSet::new();
        params.insert("feed", 0.03);
        let kernel = Kernel::new(ModelId::GrayScott, &params);
        let back = kernel.parameters();
        assert_eq!(back.get("feed"), Some(0.03));
        assert_eq!(back.get("kill"), Some(0.062));
        assert_eq!(kernel.gpu_words()[0], 0.03);
        assert_eq!(kernel.gpu_words()[5], 0.0);
    }

    #[test]
    fn test_wgsl_float_literals() {
        assert_eq!(wgsl_float(-1.0), "-1.0");
        assert_eq!(wgsl_float(0.05), "0.05");
        assert_eq!(wgsl_float(UNBOUNDED), "1e30");
    }

    #[test]
    fn test_wgsl_mentions_bindings() {
        let src = Kernel::with_defaults(ModelId::GiererMeinhardt).wgsl();
        assert!(src.contains("let mu_a = sim.params[0].w;"));
        assert!(src.contains("let dt = sim.params[1].z;"));
        assert!(src.contains("next.x = next.x + brush_amount(uv);"));
    }

    #[test]
    fn test_wgsl_scrubs_non_finite_before_clamp() {
        for &id in &ModelId::ALL {
            let src = Kernel::with_defaults(id).wgsl();
            let guard = src
                .find("select(next, vec2<f32>(0.0), (next != next)")
                .unwrap_or_else(|| panic!("{} kernel has no non-finite guard", id));
            let clamp = src.find("next = clamp(next").unwrap();
            assert!(guard < clamp, "{} clamps before scrubbing", id);
        }
    }
}
