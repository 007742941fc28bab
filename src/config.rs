// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use time::Date;

use crate::color::{parse_color_list, Rgb};
use crate::error::{Error, Result};
use crate::glyphs::{charset_from_str, Glyphs};
use crate::message::DEFAULT_REVEAL_MS;
use crate::overlay::Sidebar;
use crate::palette::{resolve_palette, MatrixColors, ThemeTokens};
use crate::runtime::{ColorMode, Lang};
use crate::scene::{MessageSpec, SceneConfig, Variant, DEFAULT_BG_OPACITY};
use crate::scheduler::FrameGate;
use crate::season::{parse_date, today, SeasonalMode};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  glyphfall --mode auto --bg-opacity 0.05 --charset matrix --sidebar 28 --sidebar-breakpoint 100 --color-bg black --duration 0";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_listing(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("  glyphfall") {
            out.push_str("  \x1b[1;34mglyphfall\x1b[0m");
            out.push_str(rest);
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_listing(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
}

/// `--mode`: `auto` lets the calendar decide.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Auto,
    Christmas,
    NewYearEve,
    NewYear,
    Normal,
}

impl ModeArg {
    pub fn to_override(self) -> Option<SeasonalMode> {
        match self {
            ModeArg::Auto => None,
            ModeArg::Christmas => Some(SeasonalMode::Christmas),
            ModeArg::NewYearEve => Some(SeasonalMode::NewYearEve),
            ModeArg::NewYear => Some(SeasonalMode::NewYear),
            ModeArg::Normal => Some(SeasonalMode::Normal),
        }
    }
}

/// A hex color given on the command line or through the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexColor(pub Rgb);

impl FromStr for HexColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(HexColor)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "glyphfall",
    version,
    disable_version_flag = true,
    about = "Matrix rain with seasonal patterns caught from the falling glyphs"
)]
pub struct Args {
    #[arg(
        long = "mode",
        default_value_t = ModeArg::Auto,
        value_enum,
        help_heading = "SEASON",
        help = "Scene to show (auto picks by date: Dec 1-30 tree, Dec 31 and Jan 1-7 year)"
    )]
    pub mode: ModeArg,

    #[arg(
        long = "no-seasonal",
        help_heading = "SEASON",
        help = "Ignore the calendar; plain rain unless --mode forces a scene"
    )]
    pub no_seasonal: bool,

    #[arg(
        long = "date",
        value_name = "YYYY-MM-DD",
        help_heading = "SEASON",
        help = "Pretend today is this date"
    )]
    pub date: Option<String>,

    #[arg(
        long = "year",
        help_heading = "SEASON",
        help = "Year shown by the digit scenes (min 0 max 9999)"
    )]
    pub year: Option<i32>,

    #[arg(
        short = 'c',
        long = "color",
        value_name = "#HEX",
        help_heading = "APPEARANCE",
        help = "Base rain color, listed before the theme colors"
    )]
    pub color: Option<HexColor>,

    #[arg(
        long = "colors",
        value_name = "#HEX,#HEX,...",
        help_heading = "APPEARANCE",
        help = "Replace the rain palette entirely"
    )]
    pub colors: Option<String>,

    #[arg(
        long = "theme-dark",
        env = "GLYPHFALL_MATRIX_DARK",
        value_name = "#HEX",
        help_heading = "THEME",
        help = "Dark theme color (fallback #204829)"
    )]
    pub theme_dark: Option<HexColor>,

    #[arg(
        long = "theme-primary",
        env = "GLYPHFALL_MATRIX_PRIMARY",
        value_name = "#HEX",
        help_heading = "THEME",
        help = "Primary theme color (fallback #22b455)"
    )]
    pub theme_primary: Option<HexColor>,

    #[arg(
        long = "theme-light",
        env = "GLYPHFALL_MATRIX_LIGHT",
        value_name = "#HEX",
        help_heading = "THEME",
        help = "Light theme color (fallback #80ce87)"
    )]
    pub theme_light: Option<HexColor>,

    #[arg(
        long = "theme-hover",
        env = "GLYPHFALL_MATRIX_HOVER",
        value_name = "#HEX",
        help_heading = "THEME",
        help = "Hover theme color (fallback #92e5a1)"
    )]
    pub theme_hover: Option<HexColor>,

    #[arg(
        long = "bg-opacity",
        default_value_t = DEFAULT_BG_OPACITY,
        help_heading = "APPEARANCE",
        help = "Trail fade per frame (min 0.005 max 1); lower leaves longer trails"
    )]
    pub bg_opacity: f32,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        short = 'i',
        long = "immediate",
        help_heading = "GENERAL",
        help = "Start with the screen already full of rain"
    )]
    pub immediate: bool,

    #[arg(
        short = 'f',
        long = "fps",
        help_heading = "PERFORMANCE",
        help = "Frame rate override (min 1 max 240); default 20, or 30 for the year scenes"
    )]
    pub fps: Option<f64>,

    #[arg(
        long = "sidebar",
        default_value_t = 28,
        help_heading = "LAYOUT",
        help = "Columns kept clear on the left of wide screens"
    )]
    pub sidebar: u16,

    #[arg(
        long = "sidebar-breakpoint",
        default_value_t = 100,
        help_heading = "LAYOUT",
        help = "Screens at least this wide reserve the sidebar"
    )]
    pub sidebar_breakpoint: u16,

    #[arg(
        long = "charset",
        default_value = "matrix",
        help_heading = "CHARSET",
        help = "Charset preset (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        short = 'm',
        long = "message",
        help_heading = "MESSAGE",
        help = "Message revealed in a box (replaces the seasonal greeting)"
    )]
    pub message: Option<String>,

    #[arg(
        long = "message-no-border",
        help_heading = "MESSAGE",
        help = "Draw the message box without border (shorthand: -mB)"
    )]
    pub message_no_border: bool,

    #[arg(
        long = "lang",
        value_enum,
        help_heading = "MESSAGE",
        help = "Greeting language (default from LANG)"
    )]
    pub lang: Option<Lang>,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random generator for a repeatable show"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Write logs here (filter with GLYPHFALL_LOG, default info)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print performance statistics summary on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "list-modes",
        help_heading = "HELP",
        help = "List scenes and exit"
    )]
    pub list_modes: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(long = "info", help_heading = "HELP", help = "Print version info and exit")]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn require_f64_range(name: &'static str, v: f64, min: f64, max: f64) -> Result<f64> {
    if !v.is_finite() {
        return Err(Error::invalid_option(name, format!("{v} (must be a finite number)")));
    }
    if v < min || v > max {
        return Err(Error::out_of_range(name, v, min, max));
    }
    Ok(v)
}

pub fn require_f32_range(name: &'static str, v: f32, min: f32, max: f32) -> Result<f32> {
    if !v.is_finite() {
        return Err(Error::invalid_option(name, format!("{v} (must be a finite number)")));
    }
    if v < min || v > max {
        return Err(Error::out_of_range(name, v, min, max));
    }
    Ok(v)
}

pub fn require_i32_range(name: &'static str, v: i32, min: i32, max: i32) -> Result<i32> {
    if v < min || v > max {
        return Err(Error::out_of_range(name, v, min, max));
    }
    Ok(v)
}

pub fn parse_color_mode(m: u16) -> Result<ColorMode> {
    match m {
        0 => Ok(ColorMode::Mono),
        16 => Ok(ColorMode::Color16),
        8 | 256 => Ok(ColorMode::Color256),
        24 | 32 => Ok(ColorMode::TrueColor),
        _ => Err(Error::invalid_option(
            "--colormode",
            format!("{m} (allowed: 0,16,8/256,24/32)"),
        )),
    }
}

/// Everything the run loop needs, validated.
#[derive(Clone, Debug)]
pub struct Settings {
    pub mode_override: Option<SeasonalMode>,
    pub seasonal: bool,
    pub date: Date,
    pub year: Option<i32>,
    pub colors: MatrixColors,
    pub palette: Vec<Rgb>,
    /// `--colors` was given and wins over the theme in every scene.
    pub palette_overridden: bool,
    pub bg_opacity: f32,
    pub immediate: bool,
    pub fps: Option<f64>,
    pub sidebar: Sidebar,
    pub glyphs: Glyphs,
    pub message: Option<String>,
    pub message_border: bool,
    pub lang: Lang,
    pub color_mode: Option<ColorMode>,
    pub default_background: bool,
    pub duration: Option<Duration>,
    pub screensaver: bool,
    pub seed: Option<u64>,
    pub perf_stats: bool,
}

impl Args {
    pub fn theme_tokens(&self) -> ThemeTokens {
        ThemeTokens {
            dark: self.theme_dark.map(|c| c.0),
            primary: self.theme_primary.map(|c| c.0),
            light: self.theme_light.map(|c| c.0),
            hover: self.theme_hover.map(|c| c.0),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        let bg_opacity = require_f32_range("--bg-opacity", self.bg_opacity, 0.005, 1.0)?;
        let fps = self
            .fps
            .map(|f| require_f64_range("--fps", f, 1.0, 240.0))
            .transpose()?;
        let year = self
            .year
            .map(|y| require_i32_range("--year", y, 0, 9999))
            .transpose()?;
        let duration = match self.duration {
            Some(s) if !s.is_finite() => {
                return Err(Error::invalid_option(
                    "--duration",
                    format!("{s} (must be a finite number)"),
                ))
            }
            Some(s) if s > 0.0 => Some(Duration::from_secs_f64(require_f64_range(
                "--duration",
                s,
                0.1,
                86400.0,
            )?)),
            _ => None,
        };
        let date = match self.date.as_deref() {
            Some(d) => parse_date(d)?,
            None => today(),
        };
        let overrides = match self.colors.as_deref() {
            Some(list) => parse_color_list(list)?,
            None => Vec::new(),
        };
        let tokens = self.theme_tokens();
        let lang = self.lang.unwrap_or_else(|| {
            Lang::from_locale(&std::env::var("LANG").unwrap_or_default())
        });

        Ok(Settings {
            mode_override: self.mode.to_override(),
            seasonal: !self.no_seasonal,
            date,
            year,
            colors: MatrixColors::from_tokens(&tokens),
            palette: resolve_palette(&tokens, self.color.map(|c| c.0), &overrides),
            palette_overridden: !overrides.is_empty(),
            bg_opacity,
            immediate: self.immediate,
            fps,
            sidebar: Sidebar {
                width: self.sidebar,
                breakpoint: self.sidebar_breakpoint,
            },
            glyphs: Glyphs::new(charset_from_str(&self.charset)?),
            message: self.message.clone(),
            message_border: !self.message_no_border,
            lang,
            color_mode: self.colormode.map(parse_color_mode).transpose()?,
            default_background: self.color_bg == ColorBg::DefaultBackground,
            duration,
            screensaver: self.screensaver,
            seed: self.seed,
            perf_stats: self.perf_stats,
        })
    }
}

impl Settings {
    /// The year the digit scenes show for `mode`.
    pub fn year_for(&self, mode: SeasonalMode) -> i32 {
        self.year.unwrap_or_else(|| mode.celebrated_year(self.date))
    }

    pub fn scene_config(&self, mode: SeasonalMode) -> SceneConfig {
        let message = self.message.clone().map(|text| MessageSpec {
            text,
            border: self.message_border,
            interval_ms: DEFAULT_REVEAL_MS,
        });
        let mut cfg = SceneConfig {
            variant: Variant::Rain,
            colors: self.colors,
            palette: self.palette.clone(),
            bg_opacity: self.bg_opacity,
            immediate: self.immediate,
            sidebar: self.sidebar,
            glyphs: self.glyphs.clone(),
            message,
            seed: self.seed,
        }
        .for_mode(mode, self.year_for(mode), self.lang, self.message_border);
        if cfg.variant != Variant::Rain && !self.palette_overridden {
            cfg.palette = self.colors.as_palette();
        }
        cfg
    }

    pub fn frame_gate(&self, variant: Variant) -> FrameGate {
        match self.fps {
            Some(fps) => FrameGate::from_fps(fps),
            None => FrameGate::new(variant.frame_interval()),
        }
    }
}

pub fn print_list_modes() {
    let mut block = String::from("AVAILABLE MODES:\nNOTE: Use only the VALUE (left side) with --mode.\n\nVALUE          DESCRIPTION\nauto           Pick by date (see below)\n");
    for m in SeasonalMode::ALL {
        block.push_str(&format!("{:<14} {}\n", m.label(), m.describe()));
    }
    if color_enabled_stdout() {
        print!("{}", colorize_listing(&block));
    } else {
        print!("{}", block);
    }
}

pub fn print_list_charsets() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE CHARSET PRESETS:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --charset.\x1b[0m");
    } else {
        println!("AVAILABLE CHARSET PRESETS:");
        println!("NOTE: Use only the VALUE (left side) with --charset.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("matrix       Letters + digits + half-width katakana");
    println!("ascii        Letters + digits + punctuation");
    println!("katakana     Half-width katakana");
    println!("digits       Digits only (aliases: dec, decimal)");
    println!("binary       0 and 1 (aliases: bin, 01)");
    println!("hex          0-9 and A-F (alias: hexadecimal)");
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["glyphfall"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let s = parse(&["--date", "2026-07-01"]).settings().unwrap();
        assert_eq!(s.mode_override, None);
        assert!(s.seasonal);
        assert_eq!(s.bg_opacity, DEFAULT_BG_OPACITY);
        assert_eq!(s.sidebar, Sidebar { width: 28, breakpoint: 100 });
        assert_eq!(s.date, date!(2026 - 07 - 01));
        assert_eq!(s.duration, None);
        assert!(s.message_border);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let e = parse(&["--fps", "500"]).settings().unwrap_err();
        assert_eq!(e.to_string(), "failed to apply --fps 500 (min 1 max 240)");
        assert!(parse(&["--bg-opacity", "0"]).settings().is_err());
        assert!(parse(&["--duration", "0.01"]).settings().is_err());
        assert!(parse(&["--year=-5"]).settings().is_err());
    }

    #[test]
    fn non_positive_duration_disables_the_timer() {
        let s = parse(&["--duration", "0", "--date", "2026-07-01"]).settings().unwrap();
        assert_eq!(s.duration, None);
        let s = parse(&["--duration", "2.5", "--date", "2026-07-01"]).settings().unwrap();
        assert_eq!(s.duration, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn bad_inputs_surface_typed_errors() {
        assert!(matches!(
            parse(&["--date", "tomorrow"]).settings(),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            parse(&["--colors", "#fff,oops"]).settings(),
            Err(Error::InvalidColor(_))
        ));
        assert!(matches!(
            parse(&["--charset", "klingon"]).settings(),
            Err(Error::InvalidOption { .. })
        ));
        assert!(Args::try_parse_from(["glyphfall", "--color", "green"]).is_err());
    }

    #[test]
    fn colormode_values() {
        assert_eq!(parse_color_mode(0).unwrap(), ColorMode::Mono);
        assert_eq!(parse_color_mode(256).unwrap(), ColorMode::Color256);
        assert_eq!(parse_color_mode(32).unwrap(), ColorMode::TrueColor);
        assert!(parse_color_mode(12).is_err());
    }

    #[test]
    fn palette_follows_flags() {
        let s = parse(&["--date", "2026-07-01", "--colors", "#ff0000,#00ff00"])
            .settings()
            .unwrap();
        assert_eq!(s.palette, vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]);

        let s = parse(&["--date", "2026-07-01", "-c", "#fff", "--theme-dark", "#000"])
            .settings()
            .unwrap();
        assert_eq!(s.palette, vec![Rgb::WHITE, Rgb::BLACK]);
    }

    #[test]
    fn pattern_scenes_rain_in_every_theme_tone() {
        let s = parse(&["--date", "2025-12-24", "--seed", "1"]).settings().unwrap();
        for mode in [SeasonalMode::Christmas, SeasonalMode::NewYear] {
            let cfg = s.scene_config(mode);
            assert_eq!(cfg.palette, s.colors.as_palette());
            assert_eq!(cfg.palette.len(), 4);
        }
        assert_eq!(s.scene_config(SeasonalMode::Normal).palette, s.palette);

        let s = parse(&["--date", "2025-12-24", "--colors", "#ff0000"])
            .settings()
            .unwrap();
        let cfg = s.scene_config(SeasonalMode::Christmas);
        assert_eq!(cfg.palette, vec![Rgb::new(255, 0, 0)]);
    }

    #[test]
    fn scene_config_carries_the_greeting() {
        let s = parse(&["--date", "2025-12-31", "--lang", "en"]).settings().unwrap();
        let cfg = s.scene_config(SeasonalMode::NewYearEve);
        assert_eq!(cfg.variant, Variant::Year(2026));
        assert_eq!(cfg.message.unwrap().text, "See you in 2026!");

        let s = parse(&["--date", "2025-12-31", "-m", "hi", "--year", "1999"])
            .settings()
            .unwrap();
        let cfg = s.scene_config(SeasonalMode::NewYear);
        assert_eq!(cfg.variant, Variant::Year(1999));
        assert_eq!(cfg.message.unwrap().text, "hi");
    }

    #[test]
    fn fps_overrides_the_scene_interval() {
        let s = parse(&["--date", "2026-07-01"]).settings().unwrap();
        assert_eq!(s.frame_gate(Variant::Tree).interval(), Duration::from_millis(50));
        let s = parse(&["--date", "2026-07-01", "-f", "10"]).settings().unwrap();
        assert_eq!(s.frame_gate(Variant::Tree).interval(), Duration::from_millis(100));
    }
}
