// Copyright (c) 2026 rezky_nightky

use rand::{rngs::StdRng, Rng};

use crate::color::Rgb;
use crate::frame::Frame;
use crate::glyphs::Glyphs;

pub const BASE_STEP: f32 = 1.0;
pub const FAST_STEP: f32 = 2.5;
/// Per-tick chance that a column past the bottom edge starts over.
pub const RESPAWN_CHANCE: f32 = 0.025;

/// Lets a pattern claim a column's glyph before it is drawn.
pub trait ColumnHook {
    /// Returns true when the glyph at `*drop` was caught. The hook may move
    /// `*drop` whether or not it caught anything.
    fn intercept(&mut self, col: usize, drop: &mut f32, rng: &mut StdRng) -> bool;

    /// Columns that still have cells to fill fall faster.
    fn fast_column(&self, col: usize) -> bool;
}

pub struct NoHook;

impl ColumnHook for NoHook {
    fn intercept(&mut self, _col: usize, _drop: &mut f32, _rng: &mut StdRng) -> bool {
        false
    }

    fn fast_column(&self, _col: usize) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainStyle {
    pub alpha: f32,
    /// Draw every glyph in this color instead of a random palette entry.
    pub uniform: Option<Rgb>,
}

impl Default for RainStyle {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            uniform: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// Scattered over the whole height, so the screen is full at once.
    Scattered,
    /// Every column begins at the first row.
    Top,
    /// Staggered a little above the screen.
    Above,
}

#[derive(Clone, Debug)]
pub struct GlyphStream {
    drops: Vec<f32>,
    rows: u16,
    respawn_depth: f32,
}

impl GlyphStream {
    pub fn new(cols: u16, rows: u16, start: StartMode, respawn_depth: f32, rng: &mut StdRng) -> Self {
        let drops = (0..cols)
            .map(|_| match start {
                StartMode::Scattered => (rng.random::<f32>() * rows as f32).floor(),
                StartMode::Top => 1.0,
                StartMode::Above => -(rng.random::<f32>() * 20.0).floor(),
            })
            .collect();
        Self {
            drops,
            rows,
            respawn_depth: respawn_depth.max(1.0),
        }
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    pub fn drops(&self) -> &[f32] {
        &self.drops
    }

    pub fn drop_mut(&mut self, col: usize) -> Option<&mut f32> {
        self.drops.get_mut(col)
    }

    /// Keeps existing columns where they are; new columns start just above
    /// the screen.
    pub fn resize(&mut self, cols: u16, rows: u16, rng: &mut StdRng) {
        let cols = cols as usize;
        while self.drops.len() < cols {
            self.drops.push(-(rng.random::<f32>() * 10.0).floor());
        }
        self.drops.truncate(cols);
        self.rows = rows;
    }

    pub fn respawn(&mut self, col: usize, depth: f32, rng: &mut StdRng) {
        if let Some(d) = self.drops.get_mut(col) {
            *d = -(rng.random::<f32>() * depth).floor();
        }
    }

    /// One tick: draw a glyph per column (unless the hook caught it), then
    /// advance and maybe respawn.
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &mut self,
        frame: &mut Frame,
        glyphs: &Glyphs,
        palette: &[Rgb],
        style: RainStyle,
        hook: &mut dyn ColumnHook,
        rng: &mut StdRng,
    ) {
        let bottom = self.rows as f32;
        for col in 0..self.drops.len() {
            let y = self.drops[col];
            let caught = hook.intercept(col, &mut self.drops[col], rng);

            if !caught && y >= 0.0 {
                let color = match style.uniform {
                    Some(c) => c,
                    None if palette.is_empty() => crate::palette::FALLBACK_PRIMARY,
                    None => palette[rng.random_range(0..palette.len())],
                };
                frame.put_f(col as f32, y, glyphs.pick(rng), color, style.alpha, false);
            }

            self.drops[col] += if hook.fast_column(col) {
                FAST_STEP
            } else {
                BASE_STEP
            };

            if y > bottom && rng.random::<f32>() < RESPAWN_CHANCE {
                self.drops[col] = -(rng.random::<f32>() * self.respawn_depth).floor();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn one_stream_per_column() {
        let mut r = rng();
        let s = GlyphStream::new(80, 24, StartMode::Top, 1.0, &mut r);
        assert_eq!(s.columns(), 80);
        assert!(s.drops().iter().all(|&d| d == 1.0));
    }

    #[test]
    fn scattered_start_stays_on_screen() {
        let mut r = rng();
        let s = GlyphStream::new(200, 30, StartMode::Scattered, 1.0, &mut r);
        assert!(s.drops().iter().all(|&d| (0.0..30.0).contains(&d)));
    }

    #[test]
    fn advance_draws_and_steps_each_column() {
        let mut r = rng();
        let mut s = GlyphStream::new(10, 20, StartMode::Top, 1.0, &mut r);
        let mut frame = Frame::new(10, 20);
        s.advance(
            &mut frame,
            &Glyphs::default(),
            &[Rgb::WHITE],
            RainStyle::default(),
            &mut NoHook,
            &mut r,
        );
        assert_eq!(frame.lit_count(), 10);
        assert!(s.drops().iter().all(|&d| d == 2.0));
    }

    #[test]
    fn columns_past_the_bottom_eventually_respawn() {
        let mut r = rng();
        let mut s = GlyphStream::new(32, 10, StartMode::Top, 10.0, &mut r);
        for d in 0..32 {
            *s.drop_mut(d).unwrap() = 11.0;
        }
        let mut frame = Frame::new(32, 10);
        // 0.975^600 is ~2.5e-7 per column.
        for _ in 0..600 {
            s.advance(
                &mut frame,
                &Glyphs::default(),
                &[Rgb::WHITE],
                RainStyle::default(),
                &mut NoHook,
                &mut r,
            );
        }
        assert!(s.drops().iter().all(|&d| d < 600.0));
    }

    #[test]
    fn respawn_is_not_immediate() {
        let mut r = rng();
        let mut s = GlyphStream::new(400, 10, StartMode::Top, 10.0, &mut r);
        for d in 0..400 {
            *s.drop_mut(d).unwrap() = 11.0;
        }
        let mut frame = Frame::new(400, 10);
        s.advance(
            &mut frame,
            &Glyphs::default(),
            &[Rgb::WHITE],
            RainStyle::default(),
            &mut NoHook,
            &mut r,
        );
        let kept = s.drops().iter().filter(|&&d| d == 12.0).count();
        assert!(kept > 300, "only {kept} of 400 columns kept falling");
    }

    #[test]
    fn resize_extends_and_truncates() {
        let mut r = rng();
        let mut s = GlyphStream::new(10, 20, StartMode::Top, 1.0, &mut r);
        s.resize(15, 20, &mut r);
        assert_eq!(s.columns(), 15);
        assert!(s.drops()[..10].iter().all(|&d| d == 1.0));
        assert!(s.drops()[10..].iter().all(|&d| d <= 0.0));
        s.resize(4, 20, &mut r);
        assert_eq!(s.columns(), 4);
    }
}
