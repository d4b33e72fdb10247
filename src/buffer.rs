//! Simulation grids and the ping-pong pair.
//!
//! A [`Grid`] is a row-major `width × height` array of 4-channel `f32`
//! cells. Row 0 is the top of the image. Channels 0 and 1 hold the two
//! species; 2 and 3 are reserved and carried through untouched.
//!
//! [`PingPong`] is an arena of exactly two grids plus the index of the one
//! holding the latest state. The other grid is scratch space for the next
//! step.

/// One simulation cell.
pub type Cell = [f32; 4];

/// A 2D grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a zero-filled grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        Self {
            width,
            height,
            cells: vec![[0.0; 4]; (width * height) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Cell {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, cell: Cell) {
        let i = self.index(x, y);
        self.cells[i] = cell;
    }

    /// Set every cell to the same value.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Raw bytes, laid out the way the GPU storage buffer expects.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Mean of one channel over the whole grid.
    pub fn channel_mean(&self, channel: usize) -> f32 {
        let sum: f64 = self.cells.iter().map(|c| c[channel] as f64).sum();
        (sum / self.cells.len() as f64) as f32
    }

    /// Population variance of one channel over the whole grid.
    pub fn channel_variance(&self, channel: usize) -> f32 {
        let mean = self.channel_mean(channel) as f64;
        let sum: f64 = self
            .cells
            .iter()
            .map(|c| {
                let d = c[channel] as f64 - mean;
                d * d
            })
            .sum();
        (sum / self.cells.len() as f64) as f32
    }
}

/// Double buffer with an explicit active index.
#[derive(Debug, Clone)]
pub struct PingPong {
    grids: [Grid; 2],
    current: usize,
    generation: u64,
}

impl PingPong {
    /// Allocate two zero-filled grids of equal size. `current` starts at 0.
    ///
    /// The contents are meaningless until [`seed_with`](Self::seed_with) or a
    /// model seed has run.
    pub fn allocate(width: u32, height: u32) -> Self {
        Self {
            grids: [Grid::new(width, height), Grid::new(width, height)],
            current: 0,
            generation: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.grids[0].width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.grids[0].height()
    }

    /// Index (0 or 1) of the grid holding the latest state.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Counter bumped whenever the contents are replaced from outside a
    /// stepper. Device-side mirrors compare it to decide when to re-upload.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The latest state.
    pub fn current(&self) -> &Grid {
        &self.grids[self.current]
    }

    /// Direct access to grid 0 or 1, regardless of which is current.
    pub fn grid(&self, index: usize) -> &Grid {
        &self.grids[index]
    }

    /// Split into (current, next) for one step: read from the first, write
    /// the second.
    pub fn split(&mut self) -> (&Grid, &mut Grid) {
        let [a, b] = &mut self.grids;
        if self.current == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Mark the grid written by the last step as current.
    #[inline]
    pub fn flip(&mut self) {
        self.current ^= 1;
    }

    /// Write `grid` into both buffers and make buffer 0 current.
    ///
    /// # Panics
    ///
    /// Panics if `grid` is not the same size as the pair.
    pub fn seed_with(&mut self, grid: Grid) {
        assert_eq!(
            grid.size(),
            self.grids[0].size(),
            "seed grid does not match the pair's dimensions"
        );
        self.grids[1] = grid.clone();
        self.grids[0] = grid;
        self.current = 0;
        self.generation += 1;
    }

    /// Overwrite the next (non-current) grid and make it current, without
    /// bumping the generation. Used by device-side steppers after readback.
    pub fn publish(&mut self, cells: &[Cell]) {
        let (_, next) = self.split();
        next.cells_mut().copy_from_slice(cells);
        self.flip();
    }
}
