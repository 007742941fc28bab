// Copyright (c) 2026 rezky_nightky

use crate::color::Rgb;

pub const FALLBACK_DARK: Rgb = Rgb::new(0x20, 0x48, 0x29);
pub const FALLBACK_PRIMARY: Rgb = Rgb::new(0x22, 0xb4, 0x55);
pub const FALLBACK_LIGHT: Rgb = Rgb::new(0x80, 0xce, 0x87);
pub const FALLBACK_HOVER: Rgb = Rgb::new(0x92, 0xe5, 0xa1);

pub const CELEBRATION_COLORS: [Rgb; 8] = [
    Rgb::GOLD,
    Rgb::new(0xFF, 0x6B, 0x6B),
    Rgb::new(0x4E, 0xCD, 0xC4),
    Rgb::new(0x95, 0xE1, 0xD3),
    Rgb::new(0xF3, 0x81, 0x81),
    FALLBACK_PRIMARY,
    FALLBACK_LIGHT,
    Rgb::new(0xFF, 0x9F, 0x43),
];

/// Named theme colors, any of which may be missing from the environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThemeTokens {
    pub dark: Option<Rgb>,
    pub primary: Option<Rgb>,
    pub light: Option<Rgb>,
    pub hover: Option<Rgb>,
}

impl ThemeTokens {
    fn present(&self) -> impl Iterator<Item = Rgb> + '_ {
        [self.dark, self.primary, self.light, self.hover]
            .into_iter()
            .flatten()
    }
}

/// Theme tokens with every gap filled by its documented fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixColors {
    pub dark: Rgb,
    pub primary: Rgb,
    pub light: Rgb,
    pub hover: Rgb,
}

impl MatrixColors {
    pub fn from_tokens(tokens: &ThemeTokens) -> Self {
        Self {
            dark: tokens.dark.unwrap_or(FALLBACK_DARK),
            primary: tokens.primary.unwrap_or(FALLBACK_PRIMARY),
            light: tokens.light.unwrap_or(FALLBACK_LIGHT),
            hover: tokens.hover.unwrap_or(FALLBACK_HOVER),
        }
    }

    /// Rain colors for the pattern scenes: every tone, fallbacks included.
    pub fn as_palette(&self) -> Vec<Rgb> {
        vec![self.dark, self.primary, self.light, self.hover]
    }
}

/// Rain colors: explicit overrides win, then the base color followed by
/// whichever theme tokens are set, then matrix green.
pub fn resolve_palette(tokens: &ThemeTokens, base: Option<Rgb>, overrides: &[Rgb]) -> Vec<Rgb> {
    if !overrides.is_empty() {
        return overrides.to_vec();
    }
    let palette: Vec<Rgb> = base.into_iter().chain(tokens.present()).collect();
    if palette.is_empty() {
        vec![FALLBACK_PRIMARY]
    } else {
        palette
    }
}
