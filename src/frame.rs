// Copyright (c) 2026 rezky_nightky

use crate::color::Rgb;

/// Cells dimmer than this are treated as fully faded.
pub const MIN_ALPHA: f32 = 0.06;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub rgb: Rgb,
    pub alpha: f32,
    pub bold: bool,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        rgb: Rgb::BLACK,
        alpha: 0.0,
        bold: false,
    };

    pub fn is_blank(&self) -> bool {
        self.ch == ' ' || self.alpha < MIN_ALPHA
    }

    /// The color actually shown: the glyph color dimmed by its remaining alpha.
    pub fn shade(&self) -> Rgb {
        self.rgb.scale(self.alpha)
    }
}

/// A glyph grid that behaves like a canvas repeatedly painted with a
/// translucent black rectangle: every `fade` dims all lit cells.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    lit: Vec<usize>,
    lit_map: Vec<bool>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; len],
            lit: Vec::new(),
            lit_map: vec![false; len],
        }
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(Cell::BLANK)
    }

    /// Paints a glyph; off-screen positions are ignored.
    pub fn put(&mut self, x: i32, y: i32, ch: char, rgb: Rgb, alpha: f32, bold: bool) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        self.cells[i] = Cell {
            ch,
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
            bold,
        };
        if !self.lit_map[i] {
            self.lit_map[i] = true;
            self.lit.push(i);
        }
    }

    pub fn put_f(&mut self, x: f32, y: f32, ch: char, rgb: Rgb, alpha: f32, bold: bool) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.put(x.floor() as i32, y.floor() as i32, ch, rgb, alpha, bold);
    }

    /// Dims every lit cell by `opacity`; cells that fall below `MIN_ALPHA`
    /// become blank and stop being tracked.
    pub fn fade(&mut self, opacity: f32) {
        let keep = 1.0 - opacity.clamp(0.0, 1.0);
        let cells = &mut self.cells;
        let lit_map = &mut self.lit_map;
        self.lit.retain(|&i| {
            let c = &mut cells[i];
            c.alpha *= keep;
            if c.alpha < MIN_ALPHA {
                *c = Cell::BLANK;
                lit_map[i] = false;
                false
            } else {
                c.bold = c.bold && c.alpha > 0.5;
                true
            }
        });
    }

    pub fn lit_count(&self) -> usize {
        self.lit.len()
    }
}
