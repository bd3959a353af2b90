/// Dot bit for each (x % 2, y % 4) position inside a Braille cell.
///
/// ```text
/// (0,0) (1,0)   bits: 0x01 0x08
/// (0,1) (1,1)   bits: 0x02 0x10
/// (0,2) (1,2)   bits: 0x04 0x20
/// (0,3) (1,3)   bits: 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Empty Braille pattern (U+2800)
pub const BLANK: char = '\u{2800}';

/// Braille Unicode surface used as the globe's drawing target.
/// Each character cell holds a 2x4 dot grid, so the pixel resolution is
/// `cols * 2` by `rows * 4`.
pub struct BrailleCanvas {
    cols: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    /// Character dimensions (cols, rows)
    pub fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Pixel dimensions (width, height)
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.cols * 2, self.rows * 4)
    }

    /// Resize to the given character dimensions. Returns true if the size changed.
    /// Contents are cleared either way.
    pub fn resize(&mut self, cols: usize, rows: usize) -> bool {
        let changed = cols != self.cols || rows != self.rows;
        if changed {
            self.cols = cols;
            self.rows = rows;
            self.cells = vec![0; cols * rows];
        } else {
            self.clear();
        }
        changed
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.cols || cy >= self.rows {
            return;
        }
        self.cells[cy * self.cols + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Braille character at a cell, `BLANK` when empty or out of range
    pub fn char_at(&self, col: usize, row: usize) -> char {
        if col >= self.cols || row >= self.rows {
            return BLANK;
        }
        char::from_u32(0x2800 + self.cells[row * self.cols + col] as u32).unwrap_or(BLANK)
    }

    /// Get a specific row as a string
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        (0..self.cols).map(|col| self.char_at(col, row)).collect()
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.rows)
            .map(|row| self.row_to_string(row))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
