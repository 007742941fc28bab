// Copyright (c) 2026 rezky_nightky

use std::collections::BTreeMap;

use rand::{rngs::StdRng, Rng};

use crate::color::Rgb;
use crate::frame::Frame;
use crate::glyphs::Glyphs;
use crate::pattern::Pattern;
use crate::stream::ColumnHook;

/// Share of body cells after which the remainder is filled directly.
pub const FILL_THRESHOLD: f32 = 0.8;
pub const FORCE_FILL_PER_TICK: usize = 3;
/// Drops further than this above their column's next target jump ahead.
pub const JUMP_ROWS: f32 = 15.0;
pub const STAR_DELAY_MS: f64 = 400.0;
pub const COMPLETE_DELAY_MS: f64 = 300.0;

const BRIGHTNESS_START: f32 = 0.5;
const BRIGHTNESS_STEP: f32 = 0.1;
/// Pulse phase advances by this many pixels per cell, as on a 20px canvas grid.
const PULSE_PX: f32 = 20.0;

#[derive(Clone, Debug, PartialEq)]
pub struct GridCell {
    pub glyph: char,
    pub filled: bool,
    pub brightness: f32,
    pub row: i32,
    pub col_offset: i32,
    pub special: bool,
}

impl GridCell {
    fn fill(&mut self, glyphs: &Glyphs, rng: &mut StdRng) {
        if !self.special {
            self.glyph = glyphs.pick(rng);
        }
        self.filled = true;
        self.brightness = self.brightness.max(BRIGHTNESS_START);
    }
}

/// Reserved left margin on wide screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sidebar {
    pub width: u16,
    /// Screens narrower than this reserve nothing.
    pub breakpoint: u16,
}

impl Sidebar {
    pub const NONE: Sidebar = Sidebar {
        width: 0,
        breakpoint: u16::MAX,
    };

    pub fn reserved(&self, cols: u16) -> u16 {
        if cols >= self.breakpoint {
            self.width.min(cols)
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub center_x: i32,
    pub top_y: i32,
    pub cols: u16,
    pub rows: u16,
}

impl Layout {
    pub fn compute(cols: u16, rows: u16, top_frac: f32, sidebar: Sidebar) -> Self {
        let reserved = sidebar.reserved(cols) as i32;
        let available = (cols as i32 - reserved).max(0);
        Self {
            center_x: reserved + available / 2,
            top_y: (rows as f32 * top_frac).floor() as i32,
            cols,
            rows,
        }
    }

    pub fn position(&self, cell: &GridCell) -> (i32, i32) {
        (self.center_x + cell.col_offset, self.top_y + cell.row)
    }

    /// Whether a falling glyph can ever land on this position.
    pub fn reachable(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.cols as i32 && y < self.rows as i32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub y: i32,
    pub cell: usize,
}

/// Column → body cells in that column, top to bottom. Holds cell indices
/// only, so rebuilding it never touches fill progress.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    columns: BTreeMap<i32, Vec<IndexEntry>>,
}

impl SpatialIndex {
    pub fn build(cells: &[GridCell], layout: &Layout) -> Self {
        let mut columns: BTreeMap<i32, Vec<IndexEntry>> = BTreeMap::new();
        for (i, cell) in cells.iter().enumerate() {
            if cell.special {
                continue;
            }
            let (x, y) = layout.position(cell);
            columns.entry(x).or_default().push(IndexEntry { y, cell: i });
        }
        for entries in columns.values_mut() {
            entries.sort_by_key(|e| e.y);
        }
        Self { columns }
    }

    pub fn column(&self, col: i32) -> Option<&[IndexEntry]> {
        self.columns.get(&col).map(Vec::as_slice)
    }

    pub fn cell_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .columns
            .values()
            .flat_map(|v| v.iter().map(|e| e.cell))
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillState {
    Building,
    BodyComplete,
    FullyComplete,
}

/// One-shot completion signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Signal {
    Idle,
    Armed { due_ms: f64 },
    Fired,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub body_completed: bool,
    pub fully_completed: bool,
    /// True on exactly one tick per overlay: time to run the completion callback.
    pub fire: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillStyle {
    pub fill: Rgb,
    pub glow: Rgb,
    pub special: Rgb,
    pub pulse_base: f32,
    pub pulse_amp: f32,
    pub pulse_period_ms: f32,
}

pub struct Overlay {
    cells: Vec<GridCell>,
    index: SpatialIndex,
    layout: Layout,
    top_frac: f32,
    sidebar: Sidebar,
    glyphs: Glyphs,
    style: FillStyle,
    state: FillState,
    star_due_ms: Option<f64>,
    signal: Signal,
    completed: bool,
}

impl Overlay {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pattern: &Pattern,
        style: FillStyle,
        glyphs: Glyphs,
        cols: u16,
        rows: u16,
        sidebar: Sidebar,
        rng: &mut StdRng,
    ) -> Self {
        let cells: Vec<GridCell> = pattern
            .cells
            .iter()
            .map(|pc| GridCell {
                glyph: pc.special.unwrap_or_else(|| glyphs.pick(rng)),
                filled: false,
                brightness: 0.0,
                row: pc.row,
                col_offset: pc.col_offset,
                special: pc.special.is_some(),
            })
            .collect();
        let layout = Layout::compute(cols, rows, pattern.top_frac, sidebar);
        let index = SpatialIndex::build(&cells, &layout);
        Self {
            cells,
            index,
            layout,
            top_frac: pattern.top_frac,
            sidebar,
            glyphs,
            style,
            state: FillState::Building,
            star_due_ms: None,
            signal: Signal::Idle,
            completed: false,
        }
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn state(&self) -> FillState {
        self.state
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.filled).count()
    }

    /// (filled, total) over the non-special cells.
    pub fn body_progress(&self) -> (usize, usize) {
        self.cells
            .iter()
            .filter(|c| !c.special)
            .fold((0, 0), |(f, t), c| (f + c.filled as usize, t + 1))
    }

    /// Bottom row of the shape on screen, for placing things under it.
    pub fn bottom_y(&self) -> i32 {
        self.cells
            .iter()
            .map(|c| self.layout.position(c).1)
            .max()
            .unwrap_or(self.layout.top_y)
    }

    /// Re-centers the shape for a new screen size. Fill state is untouched.
    pub fn relayout(&mut self, cols: u16, rows: u16) {
        self.layout = Layout::compute(cols, rows, self.top_frac, self.sidebar);
        self.index = SpatialIndex::build(&self.cells, &self.layout);
    }

    fn reachable_unfilled(&self) -> bool {
        self.cells.iter().any(|c| {
            if c.special || c.filled {
                return false;
            }
            let (x, y) = self.layout.position(c);
            self.layout.reachable(x, y)
        })
    }

    /// Per-tick bookkeeping after the rain has run: forced filling near the
    /// end, the star delay, and the completion latch.
    pub fn update(&mut self, now_ms: f64, rng: &mut StdRng) -> TickOutcome {
        let mut out = TickOutcome::default();

        if self.state != FillState::FullyComplete {
            let (filled, total) = self.body_progress();
            let unfilled = total - filled;
            if unfilled > 0 {
                let pct = filled as f32 / total as f32;
                if pct >= FILL_THRESHOLD || !self.reachable_unfilled() {
                    let glyphs = &self.glyphs;
                    self.cells
                        .iter_mut()
                        .filter(|c| !c.special && !c.filled)
                        .take(FORCE_FILL_PER_TICK)
                        .for_each(|c| c.fill(glyphs, rng));
                }
            }
        }

        if self.state == FillState::Building {
            let (filled, total) = self.body_progress();
            if filled == total {
                out.body_completed = true;
                self.state = FillState::BodyComplete;
                if self.cells.iter().any(|c| c.special && !c.filled) {
                    self.star_due_ms = Some(now_ms + STAR_DELAY_MS);
                }
                tracing::debug!(cells = total, "pattern body complete");
            }
        }

        if self.state == FillState::BodyComplete {
            if self.star_due_ms.is_some_and(|due| now_ms >= due) {
                self.star_due_ms = None;
                let glyphs = &self.glyphs;
                self.cells
                    .iter_mut()
                    .filter(|c| c.special)
                    .for_each(|c| c.fill(glyphs, rng));
            }
            if self.cells.iter().all(|c| c.filled) {
                out.fully_completed = true;
                self.state = FillState::FullyComplete;
                self.completed = true;
                if self.signal == Signal::Idle {
                    self.signal = Signal::Armed {
                        due_ms: now_ms + COMPLETE_DELAY_MS,
                    };
                }
            }
        }

        if let Signal::Armed { due_ms } = self.signal {
            if now_ms >= due_ms {
                self.signal = Signal::Fired;
                out.fire = true;
            }
        }

        out
    }

    /// Draws every filled cell with a slow pulse, then brightens cells that
    /// are still fading in.
    pub fn draw(&mut self, frame: &mut Frame, now_ms: f64) {
        let s = self.style;
        let amp = s.pulse_amp.max(f32::EPSILON);
        let t = now_ms as f32 / s.pulse_period_ms.max(1.0);
        for cell in self.cells.iter_mut().filter(|c| c.filled) {
            let (x, y) = self.layout.position(cell);
            let phase = t + (x as f32 * PULSE_PX * 0.1) + (y as f32 * PULSE_PX * 0.1);
            let pulse = s.pulse_base + s.pulse_amp * phase.sin();
            let level = ((pulse - s.pulse_base + amp) / (2.0 * amp)).clamp(0.0, 1.0);
            let color = if cell.special {
                s.special
            } else {
                s.glow.lerp(s.fill, 0.5 + 0.5 * level)
            };
            frame.put(
                x,
                y,
                cell.glyph,
                color,
                cell.brightness.min(1.0) * pulse.min(1.0),
                cell.special || level > 0.5,
            );
            if cell.brightness < 1.0 {
                cell.brightness = (cell.brightness + BRIGHTNESS_STEP).min(1.0);
            }
        }
    }
}

impl ColumnHook for Overlay {
    fn intercept(&mut self, col: usize, drop: &mut f32, rng: &mut StdRng) -> bool {
        if self.completed {
            return false;
        }
        let Some(entries) = self.index.columns.get(&(col as i32)) else {
            return false;
        };
        let cells = &mut self.cells;
        let y = *drop;

        let first_unfilled = entries.iter().find(|e| !cells[e.cell].filled).map(|e| e.y);

        let hit = entries.iter().find(|e| {
            let top = e.y as f32;
            !cells[e.cell].filled && y >= top && y < top + 1.0
        });

        if let Some(hit) = hit {
            cells[hit.cell].fill(&self.glyphs, rng);
            *drop = match entries.iter().find(|e| !cells[e.cell].filled) {
                Some(next) => next.y as f32 - 5.0 - rng.random::<f32>() * 10.0,
                None => -(rng.random::<f32>() * 10.0).floor(),
            };
            return true;
        }

        if let Some(first) = first_unfilled {
            if y < first as f32 - JUMP_ROWS {
                *drop = first as f32 - 8.0 - rng.random::<f32>() * 5.0;
            }
        }
        false
    }

    fn fast_column(&self, col: usize) -> bool {
        !self.completed
            && self
                .index
                .column(col as i32)
                .is_some_and(|entries| entries.iter().any(|e| !self.cells[e.cell].filled))
    }
}
