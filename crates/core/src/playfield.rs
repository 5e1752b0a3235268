//! Playfield module - the grid of locked cells
//!
//! The grid is `rows + BUFFER_ROWS` tall and `cols` wide, stored as a flat
//! row-major vector. Row 0 is the bottom row.
//!
//! Collision rules:
//! - a cell left of column 0, right of the last column or below row 0 collides
//! - an occupied cell collides
//! - there is no ceiling: cells at or above the top row never collide

use crate::pieces::Tetromino;
use crate::types::{Cell, PieceKind, Point, BUFFER_ROWS};

/// The locked cells of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playfield {
    cols: usize,
    rows: usize,
    /// Flat array of cells, row-major order (y * cols + x)
    cells: Vec<Cell>,
}

impl Playfield {
    /// Create an empty field with `rows` visible rows plus the spawn buffer
    pub fn new(cols: u8, rows: u8) -> Self {
        let cols = cols as usize;
        let rows = rows as usize;
        let height = rows + BUFFER_ROWS as usize;
        Self {
            cols,
            rows,
            cells: vec![None; cols * height],
        }
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.cols as i32 || y < 0 || y >= self.height() as i32 {
            return None;
        }
        Some(y as usize * self.cols + x as usize)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Visible rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Visible rows plus buffer rows
    pub fn height(&self) -> usize {
        self.cells.len() / self.cols.max(1)
    }

    /// Cell at (x, y), `None` outside the grid
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Set the cell at (x, y); returns false outside the grid
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// A single cell blocks a piece: outside the walls, below the floor, or filled
    pub fn blocked(&self, at: Point) -> bool {
        let (x, y) = (at.x as i32, at.y as i32);
        if x < 0 || x >= self.cols as i32 || y < 0 {
            return true;
        }
        self.is_occupied(x, y)
    }

    /// Whether `piece` anchored at `at` overlaps a wall, the floor or a locked cell
    pub fn collides(&self, piece: &Tetromino, at: Point) -> bool {
        piece.cells_at(at).any(|c| self.blocked(c))
    }

    /// One row of cells
    pub fn row(&self, y: usize) -> &[Cell] {
        let start = y * self.cols;
        &self.cells[start..start + self.cols]
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height() && self.row(y).iter().all(|c| c.is_some())
    }

    pub fn is_row_empty(&self, y: usize) -> bool {
        y >= self.height() || self.row(y).iter().all(|c| c.is_none())
    }

    /// Write the piece into the grid. Cells above the top row are dropped.
    pub fn merge(&mut self, piece: &Tetromino, at: Point) {
        for c in piece.cells_at(at) {
            self.set(c.x as i32, c.y as i32, Some(piece.kind));
        }
    }

    /// Clear complete rows and compact the stack
    ///
    /// Rows are scanned bottom-up until the first entirely empty row. Returns
    /// the cleared row indices in ascending order. Surviving rows keep their
    /// order and move down by the number of cleared rows beneath them; the
    /// freed rows at the top of the scanned region are emptied.
    pub fn clear_lines(&mut self) -> Vec<usize> {
        let height = self.height();
        let mut lines = Vec::new();
        let mut limit = height;
        for y in 0..height {
            if self.is_row_full(y) {
                lines.push(y);
            } else if self.is_row_empty(y) {
                limit = y;
                break;
            }
        }
        let Some(&lowest) = lines.first() else {
            return lines;
        };

        let cols = self.cols;
        let mut write = lowest;
        let mut next_cleared = 0;
        for read in lowest..limit {
            if lines.get(next_cleared) == Some(&read) {
                next_cleared += 1;
                continue;
            }
            if write != read {
                self.cells
                    .copy_within(read * cols..(read + 1) * cols, write * cols);
            }
            write += 1;
        }
        for cell in &mut self.cells[write * cols..limit * cols] {
            *cell = None;
        }
        lines
    }

    /// Empty the whole grid
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// All cells, row-major from the bottom row
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Build a field from text rows, top row first
    ///
    /// Each character is a column: `.` or space is empty, a piece letter fills
    /// the cell with that kind and any other character fills it with `Z`. The
    /// last string is row 0; missing rows are empty.
    pub fn from_rows_top_down(cols: u8, rows: u8, lines: &[&str]) -> Self {
        let mut field = Self::new(cols, rows);
        for (y, line) in lines.iter().rev().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' | ' ' => None,
                    other => Some(PieceKind::from_str(&other.to_string()).unwrap_or(PieceKind::Z)),
                };
                field.set(x as i32, y as i32, cell);
            }
        }
        field
    }

    /// Render rows top-down in the format accepted by [`Playfield::from_rows_top_down`]
    pub fn to_rows_top_down(&self, rows: usize) -> Vec<String> {
        (0..rows.min(self.height()))
            .rev()
            .map(|y| {
                self.row(y)
                    .iter()
                    .map(|c| c.map_or('.', |k| k.as_str().chars().next().unwrap_or('#')))
                    .collect()
            })
            .collect()
    }
}
