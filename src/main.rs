// Copyright (c) 2026 rezky_nightky

mod color;
mod config;
mod error;
mod fireworks;
mod frame;
mod glyphs;
mod message;
mod overlay;
mod palette;
mod pattern;
mod runtime;
mod scene;
mod scheduler;
mod season;
mod stream;
mod terminal;

use std::env;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use anyhow::Context;
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_list_charsets, print_list_modes,
    Args, Settings,
};
use crate::runtime::ColorMode;
use crate::scene::Scene;
use crate::scheduler::{Clock, FrameGate};
use crate::season::{select_mode, SeasonalMode};
use crate::terminal::{background_color, restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

const LOG_ENV: &str = "GLYPHFALL_LOG";

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

/// The terminal owns stdout and stderr while running, so logs only go
/// somewhere when a file is given.
fn init_logging(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color256
}

fn print_bitcolor(forced: Option<ColorMode>) {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let auto = detect_color_mode_auto();
    let effective = forced.unwrap_or(auto);

    println!("BITCOLOR CHECK:");
    println!(
        "  COLORTERM: {}",
        if colorterm.is_empty() {
            "(unset)"
        } else {
            &colorterm
        }
    );
    println!(
        "  TERM: {}",
        if term.is_empty() { "(unset)" } else { &term }
    );
    println!("  auto_detected: {}", auto.label());
    if let Some(f) = forced {
        println!("  forced: {}", f.label());
    }
    println!("  effective: {}", effective.label());
}

fn print_info() {
    println!("Version: v{}", env!("CARGO_PKG_VERSION"));
    println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
}

fn parse_args() -> Args {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let mut argv: Vec<std::ffi::OsString> = env::args_os().collect();
    for arg in argv.iter_mut().skip(1) {
        if arg == "-mB" || arg == "-mb" {
            *arg = "--message-no-border".into();
        }
    }

    let matches = cmd.get_matches_from(argv);
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn install_signal_handlers() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn build_scene(settings: &Settings, mode: SeasonalMode, w: u16, h: u16) -> (Scene, FrameGate) {
    let cfg = settings.scene_config(mode);
    let gate = settings.frame_gate(cfg.variant);
    let label = cfg.variant.label();
    let scene = Scene::new(
        cfg,
        w,
        h,
        Box::new(move || tracing::info!(variant = %label, "celebration")),
    );
    (scene, gate)
}

/// Where a key press sends the run loop.
enum KeyAction {
    None,
    Quit,
    Pause,
    Restart(SeasonalMode),
}

fn key_action(code: KeyCode, current: SeasonalMode) -> KeyAction {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Char('p') => KeyAction::Pause,
        KeyCode::Char(' ') => KeyAction::Restart(current),
        KeyCode::Char('n') => KeyAction::Restart(SeasonalMode::Normal),
        KeyCode::Char('t') => KeyAction::Restart(SeasonalMode::Christmas),
        KeyCode::Char('y') => KeyAction::Restart(SeasonalMode::NewYear),
        KeyCode::Char('e') => KeyAction::Restart(SeasonalMode::NewYearEve),
        _ => KeyAction::None,
    }
}

/// What one pass of the run loop does with the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameStep {
    Skip,
    /// Nothing advances, but the resized frame still has to reach the screen.
    Redraw,
    Tick,
}

fn frame_step(due: bool, resized: bool) -> FrameStep {
    match (due, resized) {
        (true, _) => FrameStep::Tick,
        (false, true) => FrameStep::Redraw,
        (false, false) => FrameStep::Skip,
    }
}

#[derive(Default)]
struct PerfStats {
    frames: u64,
    work_sum_s: f64,
    work_max_s: f64,
    late_frames: u64,
}

impl PerfStats {
    fn record(&mut self, work: Duration, interval: Duration) {
        let s = work.as_secs_f64();
        self.frames = self.frames.saturating_add(1);
        self.work_sum_s += s;
        self.work_max_s = self.work_max_s.max(s);
        if work > interval {
            self.late_frames = self.late_frames.saturating_add(1);
        }
    }

    fn print(&self, elapsed: Duration, interval: Duration) {
        let elapsed_s = elapsed.as_secs_f64().max(0.000_001);
        let frames = self.frames.max(1) as f64;
        let target_fps = 1.0 / interval.as_secs_f64().max(0.000_001);
        let avg_fps = self.frames as f64 / elapsed_s;
        let avg_work_ms = self.work_sum_s / frames * 1000.0;

        tracing::info!(
            frames = self.frames,
            avg_fps,
            avg_work_ms,
            late_frames = self.late_frames,
            "perf summary"
        );
        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", target_fps);
        println!("  avg_fps: {:.3}", avg_fps);
        println!("  frames: {}", self.frames);
        println!("  avg_work_ms: {:.3}", avg_work_ms);
        println!("  max_work_ms: {:.3}", self.work_max_s * 1000.0);
        println!(
            "  late_frames: {} ({:.1}%)",
            self.late_frames,
            self.late_frames as f64 / frames * 100.0
        );
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.list_charsets {
        print_list_charsets();
        return Ok(());
    }
    if args.list_modes {
        print_list_modes();
        return Ok(());
    }

    let settings = args.settings()?;

    if args.check_bitcolor {
        print_bitcolor(settings.color_mode);
        return Ok(());
    }
    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if args.info {
        print_info();
        return Ok(());
    }

    init_logging(args.log_file.as_deref())?;

    let color_mode = settings.color_mode.unwrap_or_else(detect_color_mode_auto);
    let mut mode = select_mode(settings.date, settings.mode_override, settings.seasonal);
    tracing::info!(
        mode = mode.label(),
        date = %settings.date,
        color_mode = color_mode.label(),
        "starting"
    );

    let mut term = Terminal::new(
        color_mode,
        background_color(color_mode, settings.default_background),
    )
    .context("failed to initialize terminal")?;
    let (w, h) = term.size()?;

    let (mut scene, mut gate) = build_scene(&settings, mode, w, h);
    let start_time = Instant::now();
    let mut clock = Clock::new(start_time);
    let end_time = settings.duration.map(|d| start_time + d);
    let mut perf = PerfStats::default();
    let mut running = true;

    while running {
        let now = Instant::now();
        if end_time.is_some_and(|end| now >= end) {
            break;
        }

        let mut timeout = if clock.is_paused() {
            gate.interval()
        } else {
            gate.until_next(now)
        };
        if let Some(end) = end_time {
            timeout = timeout.min(end.saturating_duration_since(now));
        }

        let mut pending_resize: Option<(u16, u16)> = None;
        let mut restart: Option<SeasonalMode> = None;
        if Terminal::poll_event(timeout)? {
            loop {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if settings.screensaver {
                            running = false;
                        } else {
                            match key_action(k.code, mode) {
                                KeyAction::Quit => running = false,
                                KeyAction::Pause => {
                                    clock.toggle_pause(Instant::now());
                                    tracing::debug!(paused = clock.is_paused(), "pause toggled");
                                }
                                KeyAction::Restart(m) => restart = Some(m),
                                KeyAction::None => {}
                            }
                        }
                    }
                    _ => {}
                }
                if !running || !Terminal::poll_event(Duration::ZERO)? {
                    break;
                }
            }
        }
        if !running {
            break;
        }

        let resized = pending_resize.is_some();
        if let Some((nw, nh)) = pending_resize {
            scene.resize(nw, nh);
            term.force_redraw();
        }

        if let Some(m) = restart {
            mode = m;
            tracing::info!(mode = mode.label(), "restarting scene");
            let (nw, nh) = (scene.frame().width, scene.frame().height);
            (scene, gate) = build_scene(&settings, mode, nw, nh);
            clock = Clock::new(Instant::now());
            term.force_redraw();
        }

        let now = Instant::now();
        let due = !clock.is_paused() && gate.ready(now);
        match frame_step(due, resized) {
            FrameStep::Skip => {}
            FrameStep::Redraw => term.draw(scene.frame())?,
            FrameStep::Tick => {
                let work_start = Instant::now();
                scene.tick(clock.elapsed_ms(now));
                term.draw(scene.frame())?;
                if settings.perf_stats {
                    perf.record(work_start.elapsed(), gate.interval());
                }
            }
        }
    }

    drop(term);
    tracing::info!(ticks = scene.ticks(), "stopped");
    if settings.perf_stats {
        perf.print(start_time.elapsed(), gate.interval());
    }
    Ok(())
}

fn main() {
    install_signal_handlers();
    let args = parse_args();
    if let Err(e) = run(args) {
        restore_terminal_best_effort();
        eprintln!("glyphfall: {e:#}");
        std::process::exit(1);
    }
}
