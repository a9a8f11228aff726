use rand::Rng;

/// Lattice cell size in output pixels. Per-pixel independent noise reads as
/// static; a coarse lattice interpolated bilinearly gives the slow, wave-like
/// drift the wiggle effect needs.
pub const CELL_SIZE: u32 = 20;

/// A dense scalar displacement field over the output pixel grid, each value
/// in [-1, 1], bilinearly interpolated from a coarse random lattice.
///
/// Every call to [`NoiseField::generate`] draws a fresh lattice from the
/// supplied RNG; fields are never cached or reused across frames.
#[derive(Clone, Debug)]
pub struct NoiseField {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl NoiseField {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> Self {
        Self::generate_with_cell(rng, width, height, CELL_SIZE)
    }

    pub fn generate_with_cell<R: Rng + ?Sized>(
        rng: &mut R,
        width: u32,
        height: u32,
        cell: u32,
    ) -> Self {
        let cell = cell.max(1) as usize;
        let w = width as usize;
        let h = height as usize;

        // One extra column/row so the last partial cell always has four corners.
        let cols = w.div_ceil(cell) + 1;
        let rows = h.div_ceil(cell) + 1;
        let lattice: Vec<f32> = (0..cols * rows)
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect();

        let mut values = vec![0.0f32; w * h];
        for y in 0..h {
            let gy = y as f32 / cell as f32;
            let y0 = gy.floor() as usize;
            let ty = gy - y0 as f32;
            for x in 0..w {
                let gx = x as f32 / cell as f32;
                let x0 = gx.floor() as usize;
                let tx = gx - x0 as f32;

                let c00 = lattice[y0 * cols + x0];
                let c10 = lattice[y0 * cols + x0 + 1];
                let c01 = lattice[(y0 + 1) * cols + x0];
                let c11 = lattice[(y0 + 1) * cols + x0 + 1];

                let top = lerp(c00, c10, tx);
                let bottom = lerp(c01, c11, tx);
                values[y * w + x] = lerp(top, bottom, ty);
            }
        }

        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sampled displacement at (x, y). Panics when out of bounds.
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
