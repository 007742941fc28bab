// Copyright (c) 2026 rezky_nightky

use time::{macros::format_description, Date, Month, OffsetDateTime};

use crate::error::{Error, Result};
use crate::runtime::Lang;

/// Last day of the New Year greeting window (January).
const NEW_YEAR_LAST_DAY: u8 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SeasonalMode {
    Christmas,
    NewYearEve,
    NewYear,
    Normal,
}

impl SeasonalMode {
    pub const ALL: [SeasonalMode; 4] = [
        SeasonalMode::Christmas,
        SeasonalMode::NewYearEve,
        SeasonalMode::NewYear,
        SeasonalMode::Normal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SeasonalMode::Christmas => "christmas",
            SeasonalMode::NewYearEve => "new-year-eve",
            SeasonalMode::NewYear => "new-year",
            SeasonalMode::Normal => "normal",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            SeasonalMode::Christmas => "tree caught from the rain, Dec 1-30",
            SeasonalMode::NewYearEve => "next year's digits and fireworks, Dec 31",
            SeasonalMode::NewYear => "this year's digits and fireworks, Jan 1-7",
            SeasonalMode::Normal => "plain rain",
        }
    }

    /// The year the digits show: on New Year's Eve that is the coming one.
    pub fn celebrated_year(self, date: Date) -> i32 {
        match self {
            SeasonalMode::NewYearEve => date.year() + 1,
            _ => date.year(),
        }
    }

    pub fn greeting(self, lang: Lang, year: i32) -> Option<String> {
        let text = match (self, lang) {
            (SeasonalMode::Christmas, Lang::En) => "Merry Christmas\nAnd Happy Holidays!".to_string(),
            (SeasonalMode::Christmas, Lang::Pl) => "Wesołych Świąt\nBożego Narodzenia!".to_string(),
            (SeasonalMode::NewYear, Lang::En) => format!("Happy New Year {year}!"),
            (SeasonalMode::NewYear, Lang::Pl) => format!("Szczęśliwego Nowego Roku {year}!"),
            (SeasonalMode::NewYearEve, Lang::En) => format!("See you in {year}!"),
            (SeasonalMode::NewYearEve, Lang::Pl) => format!("Do zobaczenia w {year}!"),
            (SeasonalMode::Normal, _) => return None,
        };
        Some(text)
    }
}

/// Picks the mode for a run. An override always wins; otherwise a disabled
/// switch means plain rain, and the calendar decides.
pub fn select_mode(
    date: Date,
    override_mode: Option<SeasonalMode>,
    enabled: bool,
) -> SeasonalMode {
    if let Some(mode) = override_mode {
        return mode;
    }
    if !enabled {
        return SeasonalMode::Normal;
    }
    match (date.month(), date.day()) {
        (Month::December, 31) => SeasonalMode::NewYearEve,
        (Month::December, _) => SeasonalMode::Christmas,
        (Month::January, d) if d <= NEW_YEAR_LAST_DAY => SeasonalMode::NewYear,
        _ => SeasonalMode::Normal,
    }
}

/// Local date, or the UTC date when the local offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn parse_date(s: &str) -> Result<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(s.trim(), &format).map_err(|_| Error::InvalidDate(s.to_string()))
}
