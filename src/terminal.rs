// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};
use crate::runtime::ColorMode;

/// Below this alpha a mono terminal shows nothing; above `MONO_BOLD` it bolds.
const MONO_VISIBLE: f32 = 0.25;
const MONO_BOLD: f32 = 0.7;

/// What one terminal cell ends up showing after color quantization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Styled {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Styled {
    fn blank(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }
}

pub fn style_cell(cell: &Cell, mode: ColorMode, bg: Option<Color>) -> Styled {
    if cell.is_blank() {
        return Styled::blank(bg);
    }
    if mode == ColorMode::Mono {
        if cell.alpha < MONO_VISIBLE {
            return Styled::blank(bg);
        }
        return Styled {
            ch: cell.ch,
            fg: None,
            bg,
            bold: cell.bold || cell.alpha > MONO_BOLD,
        };
    }
    Styled {
        ch: cell.ch,
        fg: cell.shade().to_color(mode),
        bg,
        bold: cell.bold,
    }
}

pub fn background_color(mode: ColorMode, default_background: bool) -> Option<Color> {
    if default_background {
        return None;
    }
    Some(match mode {
        ColorMode::TrueColor => Color::Rgb { r: 0, g: 0, b: 0 },
        ColorMode::Color256 => Color::AnsiValue(16),
        _ => Color::Black,
    })
}

pub struct Terminal {
    stdout: Stdout,
    mode: ColorMode,
    bg: Option<Color>,
    width: u16,
    height: u16,
    last: Vec<Styled>,
    next: Vec<Styled>,
    run_buf: String,
    full_redraw: bool,
}

impl Terminal {
    pub fn new(mode: ColorMode, bg: Option<Color>) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            mode,
            bg,
            width: 0,
            height: 0,
            last: Vec::new(),
            next: Vec::new(),
            run_buf: String::with_capacity(64),
            full_redraw: true,
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn force_redraw(&mut self) {
        self.full_redraw = true;
    }

    /// Writes the frame, emitting only runs of cells that changed since the
    /// previous call.
    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        let len = frame.width as usize * frame.height as usize;
        if frame.width != self.width || frame.height != self.height {
            self.width = frame.width;
            self.height = frame.height;
            self.last = vec![Styled::blank(self.bg); len];
            self.full_redraw = true;
        }

        self.next.clear();
        self.next
            .extend((0..len).map(|i| style_cell(&frame.cell_at_index(i), self.mode, self.bg)));

        if self.full_redraw {
            self.stdout.queue(SetBackgroundColor(self.bg.unwrap_or(Color::Reset)))?;
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
        }

        let mut cur_fg: Option<Option<Color>> = None;
        let mut cur_bg: Option<Option<Color>> = None;
        let mut cur_bold: Option<bool> = None;
        let mut cur_pos: Option<(u16, u16)> = None;
        let width = frame.width as usize;

        for y in 0..frame.height {
            let row = y as usize * width;
            let mut x = 0usize;
            while x < width {
                let idx = row + x;
                let cell = self.next[idx];
                if !self.full_redraw && self.last[idx] == cell {
                    x += 1;
                    continue;
                }

                self.run_buf.clear();
                self.run_buf.push(cell.ch);
                self.last[idx] = cell;
                let mut end = x + 1;
                while end < width {
                    let other = self.next[row + end];
                    if other.fg != cell.fg || other.bg != cell.bg || other.bold != cell.bold {
                        break;
                    }
                    if !self.full_redraw && self.last[row + end] == other {
                        break;
                    }
                    self.run_buf.push(other.ch);
                    self.last[row + end] = other;
                    end += 1;
                }

                let x0 = x as u16;
                if cur_pos != Some((x0, y)) {
                    self.stdout.queue(cursor::MoveTo(x0, y))?;
                }
                if cur_fg != Some(cell.fg) {
                    self.stdout
                        .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
                    cur_fg = Some(cell.fg);
                }
                if cur_bg != Some(cell.bg) {
                    self.stdout
                        .queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
                    cur_bg = Some(cell.bg);
                }
                if cur_bold != Some(cell.bold) {
                    self.stdout.queue(SetAttribute(if cell.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    }))?;
                    cur_bold = Some(cell.bold);
                }

                self.stdout.queue(Print(self.run_buf.as_str()))?;
                cur_pos = if end < width {
                    Some((end as u16, y))
                } else {
                    None
                };
                x = end;
            }
        }

        self.full_redraw = false;
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
