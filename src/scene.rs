// Copyright (c) 2026 rezky_nightky

//! One engine for every mode: rain, an optional pattern caught from it, and
//! optional fireworks and greeting once the pattern is complete.

use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};

use crate::color::Rgb;
use crate::fireworks::{Arena, Fireworks};
use crate::frame::Frame;
use crate::glyphs::Glyphs;
use crate::message::{BoxArea, Message, MessageBox, Reveal};
use crate::overlay::{FillState, FillStyle, Overlay, Sidebar, TickOutcome};
use crate::palette::MatrixColors;
use crate::pattern::Pattern;
use crate::runtime::Lang;
use crate::season::SeasonalMode;
use crate::stream::{ColumnHook, GlyphStream, NoHook, RainStyle, StartMode};

pub const DEFAULT_BG_OPACITY: f32 = 0.05;
const TREE_BG_RAMP: f32 = 0.0003;
const TREE_BG_MAX_FACTOR: f32 = 1.5;
const TREE_RAIN_ALPHA: f32 = 0.5;
const YEAR_RAIN_ALPHA: f32 = 0.7;
const OVERLAY_RESPAWN_DEPTH: f32 = 10.0;
const RAIN_RESPAWN_DEPTH: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Rain,
    Tree,
    Year(i32),
}

impl Variant {
    pub fn for_mode(mode: SeasonalMode, year: i32) -> Variant {
        match mode {
            SeasonalMode::Christmas => Variant::Tree,
            SeasonalMode::NewYearEve | SeasonalMode::NewYear => Variant::Year(year),
            SeasonalMode::Normal => Variant::Rain,
        }
    }

    pub fn frame_interval(self) -> Duration {
        match self {
            Variant::Year(_) => Duration::from_millis(33),
            Variant::Rain | Variant::Tree => Duration::from_millis(50),
        }
    }

    pub fn label(self) -> String {
        match self {
            Variant::Rain => "rain".to_string(),
            Variant::Tree => "tree".to_string(),
            Variant::Year(y) => format!("year {y}"),
        }
    }

    fn pattern(self) -> Option<Pattern> {
        match self {
            Variant::Rain => None,
            Variant::Tree => Some(Pattern::tree()),
            Variant::Year(y) => Some(Pattern::year(y)),
        }
    }

    fn fill_style(self, colors: &MatrixColors) -> FillStyle {
        match self {
            Variant::Year(_) => FillStyle {
                fill: Rgb::WHITE,
                glow: colors.hover,
                special: Rgb::GOLD,
                pulse_base: 0.85,
                pulse_amp: 0.15,
                pulse_period_ms: 300.0,
            },
            _ => FillStyle {
                fill: colors.light,
                glow: colors.primary,
                special: Rgb::GOLD,
                pulse_base: 0.8,
                pulse_amp: 0.2,
                pulse_period_ms: 400.0,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageSpec {
    pub text: String,
    pub border: bool,
    pub interval_ms: f64,
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub variant: Variant,
    pub colors: MatrixColors,
    /// Rain colors, already resolved.
    pub palette: Vec<Rgb>,
    pub bg_opacity: f32,
    pub immediate: bool,
    pub sidebar: Sidebar,
    pub glyphs: Glyphs,
    pub message: Option<MessageSpec>,
    pub seed: Option<u64>,
}

impl SceneConfig {
    /// Picks the variant for `mode` and, unless a message was given, the
    /// seasonal greeting.
    pub fn for_mode(
        mut self,
        mode: SeasonalMode,
        year: i32,
        lang: Lang,
        border: bool,
    ) -> Self {
        self.variant = Variant::for_mode(mode, year);
        if self.message.is_none() {
            self.message = mode.greeting(lang, year).map(|text| MessageSpec {
                text,
                border,
                interval_ms: crate::message::DEFAULT_REVEAL_MS,
            });
        }
        self
    }
}

pub type CompletionCallback = Box<dyn FnMut()>;

pub struct Scene {
    cfg: SceneConfig,
    rng: StdRng,
    frame: Frame,
    stream: GlyphStream,
    overlay: Option<Overlay>,
    fireworks: Option<Fireworks>,
    message: Option<Message>,
    message_pending: bool,
    bg_opacity: f32,
    ticks: u64,
    on_complete: Option<CompletionCallback>,
}

impl Scene {
    pub fn new(
        cfg: SceneConfig,
        width: u16,
        height: u16,
        on_complete: CompletionCallback,
    ) -> Self {
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let pattern = cfg.variant.pattern();
        let start = match (cfg.immediate, pattern.is_some()) {
            (true, _) => StartMode::Scattered,
            (false, true) => StartMode::Above,
            (false, false) => StartMode::Top,
        };
        let depth = if pattern.is_some() {
            OVERLAY_RESPAWN_DEPTH
        } else {
            RAIN_RESPAWN_DEPTH
        };
        let stream = GlyphStream::new(width, height, start, depth, &mut rng);

        let overlay = pattern.map(|p| {
            Overlay::new(
                &p,
                cfg.variant.fill_style(&cfg.colors),
                cfg.glyphs.clone(),
                width,
                height,
                cfg.sidebar,
                &mut rng,
            )
        });
        let fireworks = matches!(cfg.variant, Variant::Year(_)).then(Fireworks::new);

        tracing::info!(
            variant = %cfg.variant.label(),
            width,
            height,
            cells = overlay.as_ref().map_or(0, |o| o.cells().len()),
            "scene started"
        );

        Self {
            // Plain rain has nothing to wait for.
            message_pending: overlay.is_none(),
            bg_opacity: cfg.bg_opacity,
            cfg,
            rng,
            frame: Frame::new(width, height),
            stream,
            overlay,
            fireworks,
            message: None,
            ticks: 0,
            on_complete: Some(on_complete),
        }
    }

    pub fn variant(&self) -> Variant {
        self.cfg.variant
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn fireworks(&self) -> Option<&Fireworks> {
        self.fireworks.as_ref()
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn stream(&self) -> &GlyphStream {
        &self.stream
    }

    pub fn bg_opacity(&self) -> f32 {
        self.bg_opacity
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn completed(&self) -> bool {
        self.overlay.as_ref().is_some_and(Overlay::completed)
    }

    fn sidebar_cols(&self) -> u16 {
        self.cfg.sidebar.reserved(self.frame.width)
    }

    fn message_area(&self) -> BoxArea {
        let left = self.sidebar_cols();
        let rows = self.frame.height;
        let center_line = match &self.overlay {
            None => rows / 2,
            Some(o) => {
                let below = (o.bottom_y() + 4).clamp(0, u16::MAX as i32) as u16;
                ((rows as f32 * 0.75).floor() as u16).max(below)
            }
        };
        BoxArea {
            left,
            width: self.frame.width - left,
            rows,
            center_line,
        }
    }

    fn start_message(&mut self, now_ms: f64) {
        let Some(spec) = self.cfg.message.clone() else {
            return;
        };
        let color = self.cfg.colors.primary;
        let reveal = Reveal::new(
            &spec.text,
            spec.interval_ms,
            now_ms,
            &self.cfg.glyphs,
            &mut self.rng,
        );
        let area = self.message_area();
        let layout = MessageBox::new(spec.border, color).with_border_color(self.cfg.colors.dark);
        self.message = Some(Message::new(reveal, layout, area));
    }

    fn rain_style(&self) -> RainStyle {
        if !self.completed() {
            return RainStyle::default();
        }
        match self.cfg.variant {
            Variant::Tree => RainStyle {
                alpha: TREE_RAIN_ALPHA,
                uniform: Some(self.cfg.colors.primary),
            },
            Variant::Year(_) => RainStyle {
                alpha: YEAR_RAIN_ALPHA,
                uniform: None,
            },
            Variant::Rain => RainStyle::default(),
        }
    }

    /// One animation step at `now_ms` on the scene clock.
    pub fn tick(&mut self, now_ms: f64) {
        self.ticks += 1;
        self.frame.fade(self.bg_opacity);
        if self.message_pending {
            self.message_pending = false;
            self.start_message(now_ms);
        }

        let completed = self.completed();
        if completed {
            if let Some(fw) = self.fireworks.as_mut() {
                let arena = Arena {
                    cols: self.frame.width,
                    rows: self.frame.height,
                    min_col: self.cfg.sidebar.reserved(self.frame.width),
                };
                fw.spawn(now_ms, arena, &mut self.stream, &self.cfg.glyphs, &mut self.rng);
            }
        }

        let style = self.rain_style();
        let mut no_hook = NoHook;
        let hook: &mut dyn ColumnHook = match self.overlay.as_mut() {
            Some(o) => o,
            None => &mut no_hook,
        };
        self.stream.advance(
            &mut self.frame,
            &self.cfg.glyphs,
            &self.cfg.palette,
            style,
            hook,
            &mut self.rng,
        );

        let out = match self.overlay.as_mut() {
            Some(o) => o.update(now_ms, &mut self.rng),
            None => TickOutcome::default(),
        };
        if out.fully_completed {
            tracing::info!(
                variant = %self.cfg.variant.label(),
                ticks = self.ticks,
                "pattern complete"
            );
        }
        if out.fire {
            if let Some(mut cb) = self.on_complete.take() {
                cb();
            }
            self.start_message(now_ms);
        }
        if let Some(o) = self.overlay.as_mut() {
            o.draw(&mut self.frame, now_ms);
        }

        if completed && self.cfg.variant == Variant::Tree {
            let max = self.cfg.bg_opacity * TREE_BG_MAX_FACTOR;
            self.bg_opacity = (self.bg_opacity + TREE_BG_RAMP).min(max);
        }

        if let Some(fw) = self.fireworks.as_mut() {
            fw.update(&mut self.frame, &self.cfg.glyphs, &mut self.rng);
        }

        if let Some(msg) = self.message.as_mut() {
            msg.update(now_ms, &self.cfg.glyphs, &mut self.rng);
            msg.draw(&mut self.frame);
        }
    }

    /// Adapts to a new screen size. Fill progress and fireworks in flight are
    /// kept; the frame starts blank.
    pub fn resize(&mut self, width: u16, height: u16) {
        tracing::debug!(width, height, "scene resized");
        self.frame = Frame::new(width, height);
        self.stream.resize(width, height, &mut self.rng);
        if let Some(o) = self.overlay.as_mut() {
            o.relayout(width, height);
        }
        let area = self.message_area();
        if let Some(m) = self.message.as_mut() {
            m.resize(area);
        }
    }

    pub fn fill_state(&self) -> Option<FillState> {
        self.overlay.as_ref().map(Overlay::state)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::palette::{
        resolve_palette, ThemeTokens, FALLBACK_DARK, FALLBACK_HOVER, FALLBACK_LIGHT,
        FALLBACK_PRIMARY,
    };

    const TICK_MS: f64 = 50.0;

    fn config(variant: Variant) -> SceneConfig {
        let tokens = ThemeTokens::default();
        SceneConfig {
            variant,
            colors: MatrixColors::from_tokens(&tokens),
            palette: resolve_palette(&tokens, None, &[]),
            bg_opacity: DEFAULT_BG_OPACITY,
            immediate: false,
            sidebar: Sidebar {
                width: 28,
                breakpoint: 100,
            },
            glyphs: Glyphs::default(),
            message: None,
            seed: Some(99),
        }
    }

    fn counter() -> (Rc<Cell<u32>>, CompletionCallback) {
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        (calls, Box::new(move || c.set(c.get() + 1)))
    }

    fn run(scene: &mut Scene, ticks: u64) {
        let start = scene.ticks();
        for i in start..start + ticks {
            scene.tick(i as f64 * TICK_MS);
        }
    }

    #[test]
    fn modes_map_to_variants() {
        assert_eq!(Variant::for_mode(SeasonalMode::Christmas, 2025), Variant::Tree);
        assert_eq!(Variant::for_mode(SeasonalMode::NewYearEve, 2026), Variant::Year(2026));
        assert_eq!(Variant::for_mode(SeasonalMode::NewYear, 2026), Variant::Year(2026));
        assert_eq!(Variant::for_mode(SeasonalMode::Normal, 2026), Variant::Rain);
        assert_eq!(Variant::Year(2026).frame_interval(), Duration::from_millis(33));
        assert_eq!(Variant::Tree.frame_interval(), Duration::from_millis(50));
    }

    #[test]
    fn tree_completes_and_calls_back_exactly_once() {
        let (calls, cb) = counter();
        let mut scene = Scene::new(config(Variant::Tree), 120, 40, cb);
        run(&mut scene, 3000);
        assert_eq!(scene.fill_state(), Some(FillState::FullyComplete));
        assert_eq!(calls.get(), 1);
        run(&mut scene, 200);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn tree_rain_uses_every_fallback_tone() {
        let (_, cb) = counter();
        let mut cfg = config(Variant::Tree);
        cfg.palette = cfg.colors.as_palette();
        let mut scene = Scene::new(cfg, 120, 40, cb);

        let mut seen = std::collections::HashSet::new();
        for i in 0..30 {
            scene.tick(i as f64 * TICK_MS);
            let f = scene.frame();
            for idx in 0..f.width as usize * f.height as usize {
                let c = f.cell_at_index(idx);
                if c.alpha >= 0.999 && !c.bold {
                    seen.insert(c.rgb);
                }
            }
        }
        for tone in [FALLBACK_DARK, FALLBACK_PRIMARY, FALLBACK_LIGHT, FALLBACK_HOVER] {
            assert!(seen.contains(&tone), "{tone:?} missing from {seen:?}");
        }
    }

    #[test]
    fn tree_darkens_the_trail_after_completion() {
        let (_, cb) = counter();
        let mut scene = Scene::new(config(Variant::Tree), 120, 40, cb);
        run(&mut scene, 3000);
        assert!(scene.completed());
        let max = DEFAULT_BG_OPACITY * TREE_BG_MAX_FACTOR;
        assert!(scene.bg_opacity() > DEFAULT_BG_OPACITY);
        assert!(scene.bg_opacity() <= max + 1e-6);
    }

    #[test]
    fn year_launches_fireworks_and_greets_after_completion() {
        let (calls, cb) = counter();
        let cfg = config(Variant::Rain).for_mode(SeasonalMode::NewYear, 2026, Lang::En, true);
        let mut scene = Scene::new(cfg, 120, 40, cb);
        assert!(scene.message().is_none());
        assert!(scene.fireworks().is_some_and(|f| !f.started()));

        run(&mut scene, 1500);
        assert!(scene.completed());
        assert_eq!(calls.get(), 1);
        assert!(scene.fireworks().is_some_and(|f| f.started() && f.launched() >= 5));
        let msg = scene.message().unwrap();
        assert!(msg.reveal().is_done());
        assert_eq!(msg.reveal().shown(), "Happy New Year 2026!");
    }

    #[test]
    fn plain_rain_never_completes_and_shows_its_message_at_once() {
        let (calls, cb) = counter();
        let mut cfg = config(Variant::Rain);
        cfg.message = Some(MessageSpec {
            text: "hello".into(),
            border: true,
            interval_ms: 100.0,
        });
        let mut scene = Scene::new(cfg, 80, 24, cb);
        run(&mut scene, 1);
        assert!(scene.message().is_some());
        run(&mut scene, 100);
        assert!(!scene.completed());
        assert_eq!(scene.fill_state(), None);
        assert_eq!(calls.get(), 0);
        assert!(scene.frame().lit_count() > 0);
    }

    #[test]
    fn resize_mid_fill_keeps_progress() {
        let (_, cb) = counter();
        let mut scene = Scene::new(config(Variant::Tree), 128, 48, cb);
        run(&mut scene, 60);
        let filled = scene.overlay().unwrap().filled_count();

        scene.resize(47, 33);
        assert_eq!(scene.stream().columns(), 47);
        assert!(scene.overlay().unwrap().filled_count() >= filled);
        let after_shrink = scene.overlay().unwrap().filled_count();

        scene.resize(128, 48);
        assert_eq!(scene.overlay().unwrap().filled_count(), after_shrink);
        assert_eq!(scene.stream().columns(), 128);
    }

    #[test]
    fn zero_sized_screens_do_not_panic() {
        let (_, cb) = counter();
        let mut scene = Scene::new(config(Variant::Year(2026)), 0, 0, cb);
        run(&mut scene, 50);
        scene.resize(10, 3);
        run(&mut scene, 50);
        scene.resize(0, 0);
        run(&mut scene, 50);
    }

    #[test]
    fn same_seed_same_frames() {
        let (_, a_cb) = counter();
        let (_, b_cb) = counter();
        let mut a = Scene::new(config(Variant::Tree), 100, 40, a_cb);
        let mut b = Scene::new(config(Variant::Tree), 100, 40, b_cb);
        run(&mut a, 40);
        run(&mut b, 40);
        assert_eq!(a.stream().drops(), b.stream().drops());
        assert_eq!(
            a.overlay().unwrap().filled_count(),
            b.overlay().unwrap().filled_count()
        );
    }
}
