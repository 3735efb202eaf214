//! Occupancy Grid: coarse raster mask of canvas regions already covered by glyphs.
//!
//! The canvas is divided into square cells of `cell_size` pixels. A probe maps a
//! pixel rectangle onto every cell it touches, so occupancy is conservative: two
//! rectangles that both pass a probe-then-commit sequence can never share a pixel.
//!
//! A summed-area table over the cell mask makes `probe` O(1). `commit` only
//! rebuilds the rows at or below the committed rectangle.

/// Boolean cell mask plus its summed-area table.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cell_size: u32,
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
    /// `(rows + 1) × (cols + 1)`; `integral[r][c]` = occupied cells in `[0,r) × [0,c)`.
    integral: Vec<u32>,
}

impl OccupancyGrid {
    /// Creates an empty grid. `width`, `height` and `cell_size` must be positive.
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        let cols = width.div_ceil(cell_size) as usize;
        let rows = height.div_ceil(cell_size) as usize;
        Self {
            width,
            height,
            cell_size,
            cols,
            rows,
            cells: vec![false; cols * rows],
            integral: vec![0; (cols + 1) * (rows + 1)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// True if the rectangle lies inside the canvas and touches no occupied cell.
    pub fn probe(&self, x: i64, y: i64, width: u32, height: u32) -> bool {
        match self.cell_span(x, y, width, height) {
            Some((c0, r0, c1, r1)) => self.occupied_in(c0, r0, c1, r1) == 0,
            None => false,
        }
    }

    /// Marks every cell the rectangle touches as occupied.
    ///
    /// Callers must probe first; out-of-canvas parts are clipped.
    pub fn commit(&mut self, x: i64, y: i64, width: u32, height: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(width)).min(i64::from(self.width));
        let y1 = (y + i64::from(height)).min(i64::from(self.height));
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let cs = i64::from(self.cell_size);
        let (c0, r0) = ((x0 / cs) as usize, (y0 / cs) as usize);
        let (c1, r1) = (((x1 + cs - 1) / cs) as usize, ((y1 + cs - 1) / cs) as usize);

        for r in r0..r1 {
            let row = r * self.cols;
            self.cells[row + c0..row + c1].fill(true);
        }
        self.rebuild_from_row(r0);
    }

    /// Fraction of cells currently occupied (0.0 – 1.0).
    pub fn fill_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        let total = self.integral[self.rows * (self.cols + 1) + self.cols];
        f64::from(total) / self.cells.len() as f64
    }

    /// Converts a pixel rectangle into a half-open cell span, or `None` if it
    /// leaves the canvas or is empty.
    fn cell_span(&self, x: i64, y: i64, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
        if width == 0 || height == 0 || x < 0 || y < 0 {
            return None;
        }
        let x1 = x + i64::from(width);
        let y1 = y + i64::from(height);
        if x1 > i64::from(self.width) || y1 > i64::from(self.height) {
            return None;
        }
        let cs = i64::from(self.cell_size);
        Some((
            (x / cs) as usize,
            (y / cs) as usize,
            ((x1 + cs - 1) / cs) as usize,
            ((y1 + cs - 1) / cs) as usize,
        ))
    }

    fn occupied_in(&self, c0: usize, r0: usize, c1: usize, r1: usize) -> u32 {
        let stride = self.cols + 1;
        let at = |r: usize, c: usize| self.integral[r * stride + c];
        at(r1, c1) + at(r0, c0) - at(r0, c1) - at(r1, c0)
    }

    fn rebuild_from_row(&mut self, first_row: usize) {
        let stride = self.cols + 1;
        for r in first_row..self.rows {
            let mut running = 0u32;
            for c in 0..self.cols {
                running += u32::from(self.cells[r * self.cols + c]);
                self.integral[(r + 1) * stride + c + 1] = self.integral[r * stride + c + 1] + running;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid_accepts_in_bounds_rect() {
        let grid = OccupancyGrid::new(100, 50, 4);
        assert!(grid.probe(0, 0, 100, 50));
        assert!(grid.probe(10, 10, 20, 20));
    }

    #[test]
    fn test_probe_rejects_out_of_bounds() {
        let grid = OccupancyGrid::new(100, 50, 4);
        assert!(!grid.probe(-1, 0, 10, 10));
        assert!(!grid.probe(0, -1, 10, 10));
        assert!(!grid.probe(95, 0, 10, 10));
        assert!(!grid.probe(0, 45, 10, 10));
        assert!(!grid.probe(0, 0, 0, 10));
    }

    #[test]
    fn test_commit_blocks_overlapping_probe() {
        let mut grid = OccupancyGrid::new(100, 100, 4);
        grid.commit(20, 20, 30, 10);
        assert!(!grid.probe(25, 25, 5, 5));
        assert!(!grid.probe(0, 0, 24, 24), "touches the cell holding (20,20)");
        assert!(grid.probe(0, 0, 20, 20));
        assert!(grid.probe(52, 20, 10, 10));
    }

    #[test]
    fn test_commit_is_cell_conservative() {
        let mut grid = OccupancyGrid::new(64, 64, 8);
        // Occupies pixels 9..10, but the whole cell 8..16 becomes occupied.
        grid.commit(9, 9, 1, 1);
        assert!(!grid.probe(14, 14, 1, 1));
        assert!(grid.probe(16, 16, 1, 1));
    }

    #[test]
    fn test_commit_updates_rows_below() {
        let mut grid = OccupancyGrid::new(40, 40, 4);
        grid.commit(0, 32, 8, 8);
        grid.commit(0, 0, 8, 8);
        // Summed-area rows below the second commit must still see the first one.
        assert!(!grid.probe(0, 30, 8, 8));
        assert!(grid.probe(8, 30, 8, 8));
    }

    #[test]
    fn test_fill_ratio() {
        let mut grid = OccupancyGrid::new(40, 40, 4);
        assert_eq!(grid.fill_ratio(), 0.0);
        grid.commit(0, 0, 40, 20);
        assert!((grid.fill_ratio() - 0.5).abs() < 1e-9);
        grid.commit(0, 20, 40, 20);
        assert!((grid.fill_ratio() - 1.0).abs() < 1e-9);
        assert!(!grid.probe(0, 0, 1, 1));
    }

    #[test]
    fn test_canvas_not_multiple_of_cell() {
        let mut grid = OccupancyGrid::new(50, 50, 4);
        assert!(grid.probe(46, 46, 4, 4));
        grid.commit(46, 46, 4, 4);
        assert!(!grid.probe(44, 44, 4, 4));
    }

    #[test]
    fn test_commit_clips_outside_canvas() {
        let mut grid = OccupancyGrid::new(20, 20, 4);
        grid.commit(-10, -10, 100, 100);
        assert!((grid.fill_ratio() - 1.0).abs() < 1e-9);
    }
}
