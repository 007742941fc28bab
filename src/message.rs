// Copyright (c) 2026 rezky_nightky

//! A greeting revealed "decoder style" inside a box over the rain.

use rand::rngs::StdRng;

use crate::color::Rgb;
use crate::frame::Frame;
use crate::glyphs::Glyphs;

pub const SCRAMBLE_MS: f64 = 1000.0;
pub const SCRAMBLE_EVERY_MS: f64 = 100.0;
pub const DEFAULT_REVEAL_MS: f64 = 150.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    Scramble,
    /// Characters outside `left..right` already show the real text.
    Reveal { left: usize, right: usize },
    Done,
}

#[derive(Clone, Debug)]
pub struct Reveal {
    text: Vec<char>,
    shown: Vec<char>,
    phase: RevealPhase,
    interval_ms: f64,
    started_ms: f64,
    last_ms: f64,
}

impl Reveal {
    pub fn new(
        text: &str,
        interval_ms: f64,
        now_ms: f64,
        glyphs: &Glyphs,
        rng: &mut StdRng,
    ) -> Self {
        let text: Vec<char> = text.chars().collect();
        let mut r = Self {
            shown: text.clone(),
            text,
            phase: RevealPhase::Scramble,
            interval_ms: interval_ms.max(1.0),
            started_ms: now_ms,
            last_ms: now_ms,
        };
        r.scramble(0, r.text.len(), glyphs, rng);
        r
    }

    /// Line breaks stay put so the box keeps its shape while scrambling.
    fn scramble(&mut self, from: usize, to: usize, glyphs: &Glyphs, rng: &mut StdRng) {
        for (c, t) in self.shown[from..to].iter_mut().zip(&self.text[from..to]) {
            if *t != '\n' {
                *c = glyphs.pick(rng);
            }
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == RevealPhase::Done
    }

    pub fn shown(&self) -> String {
        self.shown.iter().collect()
    }

    /// Advances the animation to `now_ms`. Returns true if the shown text
    /// changed.
    pub fn update(&mut self, now_ms: f64, glyphs: &Glyphs, rng: &mut StdRng) -> bool {
        match self.phase {
            RevealPhase::Done => false,
            RevealPhase::Scramble => {
                if now_ms - self.started_ms >= SCRAMBLE_MS {
                    self.phase = RevealPhase::Reveal {
                        left: 0,
                        right: self.text.len(),
                    };
                    self.step(glyphs, rng);
                    self.last_ms = now_ms;
                    true
                } else if now_ms - self.last_ms >= SCRAMBLE_EVERY_MS {
                    self.scramble(0, self.text.len(), glyphs, rng);
                    self.last_ms = now_ms;
                    true
                } else {
                    false
                }
            }
            RevealPhase::Reveal { .. } => {
                if now_ms - self.last_ms < self.interval_ms {
                    return false;
                }
                self.step(glyphs, rng);
                self.last_ms = now_ms;
                true
            }
        }
    }

    fn step(&mut self, glyphs: &Glyphs, rng: &mut StdRng) {
        let RevealPhase::Reveal { left, right } = self.phase else {
            return;
        };
        if left >= right {
            self.shown.clone_from(&self.text);
            self.phase = RevealPhase::Done;
            return;
        }
        self.shown.clone_from(&self.text);
        self.scramble(left, right, glyphs, rng);
        self.shown[left] = self.text[left];
        self.shown[right - 1] = self.text[right - 1];
        self.phase = RevealPhase::Reveal {
            left: left + 1,
            right: right - 1,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgChr {
    pub line: u16,
    pub col: u16,
    pub val: char,
    pub edge: bool,
}

/// Where the box may go: a horizontal band and the line it centers on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxArea {
    pub left: u16,
    pub width: u16,
    pub rows: u16,
    pub center_line: u16,
}

#[derive(Clone, Debug)]
pub struct MessageBox {
    cells: Vec<MsgChr>,
    border: bool,
    color: Rgb,
    border_color: Rgb,
}

impl MessageBox {
    pub fn new(border: bool, color: Rgb) -> Self {
        Self {
            cells: Vec::new(),
            border,
            color,
            border_color: color,
        }
    }

    pub fn with_border_color(mut self, color: Rgb) -> Self {
        self.border_color = color;
        self
    }

    pub fn cells(&self) -> &[MsgChr] {
        &self.cells
    }

    /// Lays `text` out centered in `area`, wrapping long lines. Screens too
    /// small for the box get no box at all.
    pub fn layout(&mut self, text: &str, area: BoxArea) {
        let pad_x: u16 = 2;
        let pad_y: u16 = 1;
        let border: u16 = if self.border { 1 } else { 0 };
        let right = area.left.saturating_add(area.width);

        let min_box_w = (2 * border + 2 * pad_x).max(1);
        let min_box_h = (2 * border + 2 * pad_y).max(1);
        self.cells.clear();
        if area.width < min_box_w || area.rows < min_box_h {
            return;
        }

        let max_content_w = area
            .width
            .saturating_sub(2 * border)
            .saturating_sub(2 * pad_x)
            .max(1);
        let max_content_h = area
            .rows
            .saturating_sub(2 * border)
            .saturating_sub(2 * pad_y)
            .max(1);

        let mut content_lines: Vec<Vec<char>> = Vec::new();
        for raw_line in text.split('\n') {
            if content_lines.len() as u16 >= max_content_h {
                break;
            }
            let chars: Vec<char> = raw_line.chars().collect();
            if chars.is_empty() {
                content_lines.push(Vec::new());
                continue;
            }
            for chunk in chars.chunks(max_content_w as usize) {
                if content_lines.len() as u16 >= max_content_h {
                    break;
                }
                content_lines.push(chunk.to_vec());
            }
        }

        let content_w = content_lines
            .iter()
            .map(|l| l.len().min(max_content_w as usize) as u16)
            .max()
            .unwrap_or(0)
            .max(1);
        let content_h = (content_lines.len() as u16).clamp(1, max_content_h);

        let box_w = content_w + 2 * border + 2 * pad_x;
        let box_h = content_h + 2 * border + 2 * pad_y;

        let start_col = (area.left + area.width / 2).saturating_sub(box_w / 2);
        let start_line = area
            .center_line
            .saturating_sub(box_h / 2)
            .min(area.rows.saturating_sub(box_h));

        let content_y = border + pad_y;
        let content_x = border + pad_x;

        for y in 0..box_h {
            let line = start_line.saturating_add(y);
            if line >= area.rows {
                continue;
            }
            for x in 0..box_w {
                let col = start_col.saturating_add(x);
                if col >= right {
                    continue;
                }

                let mut ch = ' ';
                let is_edge_y = y == 0 || y + 1 == box_h;
                let is_edge_x = x == 0 || x + 1 == box_w;
                let edge = border == 1 && (is_edge_y || is_edge_x);
                if border == 1 {
                    ch = match (is_edge_y, is_edge_x) {
                        (true, true) => '+',
                        (true, false) => '-',
                        (false, true) => '|',
                        (false, false) => ' ',
                    };
                }

                let inside = y >= content_y
                    && y < content_y + content_h
                    && x >= content_x
                    && x < content_x + content_w;
                if inside {
                    if let Some(line_chars) = content_lines.get((y - content_y) as usize) {
                        let line_len = line_chars.len().min(content_w as usize);
                        let left_pad = (content_w as usize - line_len) / 2;
                        let ix = (x - content_x) as usize;
                        if ix >= left_pad && ix < left_pad + line_len {
                            ch = line_chars[ix - left_pad];
                        }
                    }
                }

                self.cells.push(MsgChr {
                    line,
                    col,
                    val: ch,
                    edge,
                });
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        for mc in &self.cells {
            frame.put(
                mc.col as i32,
                mc.line as i32,
                mc.val,
                if mc.edge {
                    self.border_color
                } else {
                    self.color
                },
                1.0,
                mc.val != ' ',
            );
        }
    }
}

/// A reveal animation and the box it is shown in.
#[derive(Clone, Debug)]
pub struct Message {
    reveal: Reveal,
    layout: MessageBox,
    area: BoxArea,
}

impl Message {
    pub fn new(reveal: Reveal, layout: MessageBox, area: BoxArea) -> Self {
        let mut m = Self {
            reveal,
            layout,
            area,
        };
        m.relayout();
        m
    }

    pub fn reveal(&self) -> &Reveal {
        &self.reveal
    }

    pub fn message_box(&self) -> &MessageBox {
        &self.layout
    }

    pub fn resize(&mut self, area: BoxArea) {
        self.area = area;
        self.relayout();
    }

    fn relayout(&mut self) {
        let text = self.reveal.shown();
        self.layout.layout(&text, self.area);
    }

    pub fn update(&mut self, now_ms: f64, glyphs: &Glyphs, rng: &mut StdRng) {
        if self.reveal.update(now_ms, glyphs, rng) {
            self.relayout();
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        self.layout.draw(frame);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::glyphs::Charset;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn area(cols: u16, rows: u16) -> BoxArea {
        BoxArea {
            left: 0,
            width: cols,
            rows,
            center_line: rows / 2,
        }
    }

    #[test]
    fn reveal_ends_on_the_exact_text() {
        let mut r = rng();
        let g = Glyphs::default();
        let text = "Wesołych Świąt";
        let mut rv = Reveal::new(text, DEFAULT_REVEAL_MS, 0.0, &g, &mut r);
        assert_eq!(rv.shown().chars().count(), text.chars().count());

        let mut now = 0.0;
        while !rv.is_done() {
            now += 50.0;
            rv.update(now, &g, &mut r);
            assert_eq!(rv.shown().chars().count(), text.chars().count());
            assert!(now < 10_000.0);
        }
        assert_eq!(rv.shown(), text);
        assert!(!rv.update(now + 1_000.0, &g, &mut r));
    }

    #[test]
    fn scramble_lasts_one_second() {
        let mut r = rng();
        let g = Glyphs::default();
        let mut rv = Reveal::new("abc", DEFAULT_REVEAL_MS, 0.0, &g, &mut r);
        assert!(!rv.update(50.0, &g, &mut r));
        assert!(rv.update(100.0, &g, &mut r));
        assert!(rv.update(999.0, &g, &mut r));
        assert_eq!(rv.phase(), RevealPhase::Scramble);
        rv.update(1000.0, &g, &mut r);
        assert_eq!(rv.phase(), RevealPhase::Reveal { left: 1, right: 2 });
    }

    #[test]
    fn reveal_uncovers_both_ends_first() {
        let mut r = rng();
        // Digits never collide with the letters of the text.
        let g = Glyphs::new(Charset::DIGITS);
        let mut rv = Reveal::new("abcdef", 100.0, 0.0, &g, &mut r);
        rv.update(1000.0, &g, &mut r);
        let s: Vec<char> = rv.shown().chars().collect();
        assert_eq!((s[0], s[5]), ('a', 'f'));
        assert!(s[1..5].iter().all(char::is_ascii_digit));

        rv.update(1100.0, &g, &mut r);
        let s: Vec<char> = rv.shown().chars().collect();
        assert_eq!(&s[..2], &['a', 'b']);
        assert_eq!(&s[4..], &['e', 'f']);
    }

    #[test]
    fn line_breaks_survive_the_scramble() {
        let mut r = rng();
        let g = Glyphs::default();
        let mut rv = Reveal::new("ab\ncd", 100.0, 0.0, &g, &mut r);
        assert_eq!(rv.shown().chars().nth(2), Some('\n'));
        rv.update(500.0, &g, &mut r);
        assert_eq!(rv.shown().lines().count(), 2);
    }

    #[test]
    fn empty_text_finishes() {
        let mut r = rng();
        let g = Glyphs::default();
        let mut rv = Reveal::new("", 100.0, 0.0, &g, &mut r);
        rv.update(1000.0, &g, &mut r);
        rv.update(1100.0, &g, &mut r);
        assert!(rv.is_done());
        assert_eq!(rv.shown(), "");
    }

    #[test]
    fn box_is_centered_with_border() {
        let mut b = MessageBox::new(true, Rgb::WHITE);
        b.layout("hi", area(20, 11));
        // 2 chars + 2*2 pad + 2 border = 8 wide, 1 + 2*1 pad + 2 border = 5 high
        assert_eq!(b.cells().len(), 8 * 5);
        let first = &b.cells()[0];
        assert_eq!((first.col, first.line, first.val), (6, 3, '+'));
        let text: String = b
            .cells()
            .iter()
            .filter(|c| c.val.is_alphabetic())
            .map(|c| c.val)
            .collect();
        assert_eq!(text, "hi");
        assert_eq!(b.cells().iter().filter(|c| c.edge).count(), 8 * 5 - 6 * 3);
    }

    #[test]
    fn box_without_border_has_no_frame_glyphs() {
        let mut b = MessageBox::new(false, Rgb::WHITE);
        b.layout("hi", area(20, 11));
        assert!(b.cells().iter().all(|c| !matches!(c.val, '+' | '-' | '|')));
        assert_eq!(b.cells().len(), 6 * 3);
    }

    #[test]
    fn box_respects_the_sidebar_and_anchor() {
        let mut b = MessageBox::new(true, Rgb::WHITE);
        let a = BoxArea {
            left: 28,
            width: 92,
            rows: 40,
            center_line: 30,
        };
        b.layout("Happy New Year 2027!", a);
        assert!(b.cells().iter().all(|c| c.col >= 28 && c.col < 120));
        let top = b.cells().iter().map(|c| c.line).min().unwrap();
        assert_eq!(top, 30 - 5 / 2);
    }

    #[test]
    fn long_text_wraps_and_tiny_screens_get_nothing() {
        let mut b = MessageBox::new(true, Rgb::WHITE);
        b.layout("abcdefghij", area(10, 20));
        let lines: std::collections::BTreeSet<u16> = b.cells().iter().map(|c| c.line).collect();
        assert_eq!(lines.len(), 2 + 2 + 3);

        b.layout("abc", area(3, 2));
        assert!(b.cells().is_empty());
    }

    #[test]
    fn message_relayouts_as_the_reveal_progresses() {
        let mut r = rng();
        let g = Glyphs::default();
        let rv = Reveal::new("ok", 100.0, 0.0, &g, &mut r);
        let mut m = Message::new(rv, MessageBox::new(false, Rgb::WHITE), area(40, 10));
        for t in 1..40 {
            m.update(t as f64 * 100.0, &g, &mut r);
        }
        assert!(m.reveal().is_done());
        let text: String = m
            .message_box()
            .cells()
            .iter()
            .filter(|c| c.val != ' ')
            .map(|c| c.val)
            .collect();
        assert_eq!(text, "ok");

        let mut frame = Frame::new(40, 10);
        m.draw(&mut frame);
        assert_eq!(frame.lit_count(), m.message_box().cells().len());
    }
}
