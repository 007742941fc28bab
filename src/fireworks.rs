// Copyright (c) 2026 rezky_nightky

//! Fireworks launched from the rain once a pattern is complete.

use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng};

use crate::color::Rgb;
use crate::frame::Frame;
use crate::glyphs::Glyphs;
use crate::palette::CELEBRATION_COLORS;
use crate::stream::GlyphStream;

/// Glyph size the motion constants were tuned for.
pub const PX: f32 = 20.0;
/// Terminal cells are about twice as tall as they are wide.
pub const ASPECT: f32 = 2.0;
pub const GRAVITY: f32 = 0.1 / PX;
pub const LIFE_DECAY: f32 = 0.018;
pub const DRAG: f32 = 0.98;
pub const INITIAL_BURST: usize = 5;
pub const SPAWN_INTERVAL_MS: f64 = 350.0;

const FLICKER_CHANCE: f32 = 0.15;
const OWN_COLOR_CHANCE: f32 = 0.7;
const TRAIL_ALPHA: f32 = 0.6;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub glyph: char,
    pub color: Rgb,
}

impl Particle {
    pub fn alive(&self) -> bool {
        self.life > 0.0
    }

    fn step(&mut self, glyphs: &Glyphs, rng: &mut StdRng) {
        self.vy += GRAVITY;
        self.x += self.vx;
        self.y += self.vy;
        self.life -= LIFE_DECAY;
        self.vx *= DRAG;
        if rng.random::<f32>() < FLICKER_CHANCE {
            self.glyph = glyphs.pick(rng);
        }
    }
}

/// A rising glyph that bursts into particles at `target_y`.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub x: f32,
    pub y: f32,
    pub target_y: f32,
    /// Rows per tick.
    pub speed: f32,
    pub color: Rgb,
    pub exploded: bool,
    pub glyph: char,
    pub particles: Vec<Particle>,
}

impl Marker {
    pub fn new(x: f32, y: f32, target_y: f32, speed: f32, color: Rgb, glyph: char) -> Self {
        Self {
            x,
            y,
            target_y,
            speed,
            color,
            exploded: false,
            glyph,
            particles: Vec::new(),
        }
    }

    pub fn finished(&self) -> bool {
        self.exploded && !self.particles.iter().any(Particle::alive)
    }

    fn explode(&mut self, glyphs: &Glyphs, rng: &mut StdRng) {
        self.exploded = true;
        let n = 50 + (rng.random::<f32>() * 30.0).floor() as usize;
        self.particles = (0..n)
            .map(|j| {
                let angle = TAU * j as f32 / n as f32 + (rng.random::<f32>() - 0.5) * 0.5;
                let speed = (2.0 + rng.random::<f32>() * 5.0) / PX;
                let color = if rng.random::<f32>() < OWN_COLOR_CHANCE {
                    self.color
                } else {
                    random_color(rng)
                };
                Particle {
                    x: self.x,
                    y: self.y,
                    vx: angle.cos() * speed * ASPECT,
                    vy: angle.sin() * speed,
                    life: 1.0,
                    glyph: glyphs.pick(rng),
                    color,
                }
            })
            .collect();
    }
}

fn random_color(rng: &mut StdRng) -> Rgb {
    CELEBRATION_COLORS[rng.random_range(0..CELEBRATION_COLORS.len())]
}

/// Screen area markers may launch from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arena {
    pub cols: u16,
    pub rows: u16,
    /// First column right of the sidebar.
    pub min_col: u16,
}

impl Arena {
    fn pick_column(&self, rng: &mut StdRng) -> Option<usize> {
        if self.cols == 0 {
            return None;
        }
        let lo = self.min_col as usize;
        let hi = self.cols as usize - 1;
        Some(if hi > lo {
            rng.random_range(lo..hi)
        } else {
            lo.min(hi)
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct Fireworks {
    markers: Vec<Marker>,
    started: bool,
    last_spawn_ms: Option<f64>,
    launched: u64,
}

impl Fireworks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn launched(&self) -> u64 {
        self.launched
    }

    pub fn push(&mut self, marker: Marker) {
        self.launched += 1;
        self.markers.push(marker);
    }

    /// Launches the opening burst on the first call, then one or two markers
    /// every `SPAWN_INTERVAL_MS`. Each continuous launch restarts the rain
    /// column it rises from.
    pub fn spawn(
        &mut self,
        now_ms: f64,
        arena: Arena,
        stream: &mut GlyphStream,
        glyphs: &Glyphs,
        rng: &mut StdRng,
    ) {
        let h = arena.rows as f32;
        if !self.started {
            self.started = true;
            tracing::info!(cols = arena.cols, rows = arena.rows, "fireworks started");
            for _ in 0..INITIAL_BURST {
                let Some(col) = arena.pick_column(rng) else {
                    break;
                };
                let y = h * (0.7 + rng.random::<f32>() * 0.2);
                let target = h * (0.08 + rng.random::<f32>() * 0.2);
                let speed = (12.0 + rng.random::<f32>() * 6.0) / PX;
                let marker = Marker::new(
                    col as f32,
                    y,
                    target,
                    speed,
                    random_color(rng),
                    glyphs.pick(rng),
                );
                self.push(marker);
            }
        }

        if self
            .last_spawn_ms
            .is_some_and(|last| now_ms - last <= SPAWN_INTERVAL_MS)
        {
            return;
        }
        let count = if rng.random::<f32>() < 0.5 { 2 } else { 1 };
        for _ in 0..count {
            let Some(col) = arena.pick_column(rng) else {
                break;
            };
            let y = h * (0.75 + rng.random::<f32>() * 0.2);
            let target = h * (0.05 + rng.random::<f32>() * 0.25);
            let speed = (10.0 + rng.random::<f32>() * 8.0) / PX;
            let marker = Marker::new(
                col as f32,
                y,
                target,
                speed,
                random_color(rng),
                glyphs.pick(rng),
            );
            self.push(marker);
            stream.respawn(col, 15.0, rng);
        }
        self.last_spawn_ms = Some(now_ms);
    }

    /// Draws every marker and particle, then moves them one tick. Markers
    /// whose particles have all burnt out are dropped.
    pub fn update(&mut self, frame: &mut Frame, glyphs: &Glyphs, rng: &mut StdRng) {
        for m in self.markers.iter_mut() {
            if !m.exploded {
                frame.put_f(m.x, m.y + 1.0, m.glyph, m.color, TRAIL_ALPHA, false);
                frame.put_f(m.x, m.y + 2.0, m.glyph, m.color, TRAIL_ALPHA, false);
                frame.put_f(m.x, m.y, m.glyph, Rgb::WHITE, 1.0, true);

                m.y -= m.speed;
                m.glyph = glyphs.pick(rng);
                if m.y <= m.target_y {
                    m.explode(glyphs, rng);
                }
                continue;
            }

            for p in m.particles.iter_mut().filter(|p| p.alive()) {
                p.step(glyphs, rng);
                if p.alive() {
                    frame.put_f(p.x, p.y, p.glyph, p.color, p.life, p.life > 0.7);
                }
            }
        }
        self.markers.retain(|m| !m.finished());
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;
    use crate::stream::StartMode;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2026)
    }

    fn arena() -> Arena {
        Arena {
            cols: 120,
            rows: 40,
            min_col: 28,
        }
    }

    #[test]
    fn marker_rises_explodes_and_burns_out() {
        let mut r = rng();
        let glyphs = Glyphs::default();
        let mut fw = Fireworks::new();
        fw.push(Marker::new(10.0, 30.0, 29.0, 0.5, Rgb::GOLD, 'A'));
        let mut frame = Frame::new(40, 40);

        fw.update(&mut frame, &glyphs, &mut r);
        assert!(!fw.markers()[0].exploded);
        fw.update(&mut frame, &glyphs, &mut r);
        let m = &fw.markers()[0];
        assert!(m.exploded);
        assert!((50..=79).contains(&m.particles.len()));
        assert!(m.particles.iter().all(|p| p.life == 1.0));

        let mut ticks = 0;
        while !fw.markers().is_empty() {
            fw.update(&mut frame, &glyphs, &mut r);
            ticks += 1;
            assert!(ticks <= 56);
        }
    }

    #[test]
    fn fast_marker_explodes_on_its_first_tick() {
        let mut r = rng();
        let glyphs = Glyphs::default();
        let mut fw = Fireworks::new();
        fw.push(Marker::new(3.0, 150.0, 50.0, 100.0, Rgb::GOLD, 'A'));
        fw.update(&mut Frame::new(10, 10), &glyphs, &mut r);
        let m = &fw.markers()[0];
        assert!(m.exploded);
        assert!(m.y <= m.target_y);
        assert!((50..80).contains(&m.particles.len()));
    }

    #[test]
    fn particles_fall_and_slow_down() {
        let mut r = rng();
        let glyphs = Glyphs::default();
        let mut p = Particle {
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: 0.0,
            life: 1.0,
            glyph: 'x',
            color: Rgb::WHITE,
        };
        p.step(&glyphs, &mut r);
        assert!((p.vy - GRAVITY).abs() < 1e-6);
        assert!((p.vx - DRAG).abs() < 1e-6);
        assert!((p.life - (1.0 - LIFE_DECAY)).abs() < 1e-6);
    }

    #[test]
    fn first_spawn_launches_the_burst_and_a_wave() {
        let mut r = rng();
        let glyphs = Glyphs::default();
        let mut stream = GlyphStream::new(120, 40, StartMode::Top, 1.0, &mut r);
        let mut fw = Fireworks::new();
        fw.spawn(0.0, arena(), &mut stream, &glyphs, &mut r);
        assert!(fw.started());
        let n = fw.markers().len();
        assert!((INITIAL_BURST + 1..=INITIAL_BURST + 2).contains(&n), "{n}");
        for m in fw.markers() {
            assert!((28.0..119.0).contains(&m.x));
            assert!(m.target_y < m.y);
        }

        fw.spawn(SPAWN_INTERVAL_MS, arena(), &mut stream, &glyphs, &mut r);
        assert_eq!(fw.markers().len(), n);
        fw.spawn(SPAWN_INTERVAL_MS + 1.0, arena(), &mut stream, &glyphs, &mut r);
        assert!(fw.markers().len() > n);
    }

    #[test]
    fn launches_restart_their_rain_column() {
        let mut r = rng();
        let glyphs = Glyphs::default();
        let mut stream = GlyphStream::new(120, 40, StartMode::Top, 1.0, &mut r);
        for c in 0..120 {
            *stream.drop_mut(c).unwrap() = 20.0;
        }
        let mut fw = Fireworks::new();
        fw.spawn(0.0, arena(), &mut stream, &glyphs, &mut r);
        let reset = stream.drops().iter().filter(|&&d| d <= 0.0).count();
        assert!(reset >= 1);
    }

    #[test]
    fn empty_arena_launches_nothing() {
        let mut r = rng();
        let glyphs = Glyphs::default();
        let mut stream = GlyphStream::new(0, 0, StartMode::Top, 1.0, &mut r);
        let mut fw = Fireworks::new();
        let empty = Arena {
            cols: 0,
            rows: 0,
            min_col: 0,
        };
        fw.spawn(0.0, empty, &mut stream, &glyphs, &mut r);
        assert!(fw.markers().is_empty());
    }

    proptest! {
        #[test]
        fn every_burst_burns_out(seed in any::<u64>(), y in 5.0f32..40.0) {
            let mut r = StdRng::seed_from_u64(seed);
            let glyphs = Glyphs::default();
            let mut fw = Fireworks::new();
            fw.push(Marker::new(5.0, y, 0.0, 1.0, Rgb::GOLD, 'A'));
            let mut frame = Frame::new(20, 20);
            let mut ticks = 0;
            while !fw.markers().is_empty() {
                fw.update(&mut frame, &glyphs, &mut r);
                ticks += 1;
                prop_assert!(ticks <= 41 + 56);
            }
        }
    }
}
