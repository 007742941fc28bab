// Copyright (c) 2026 rezky_nightky

use std::char;

use rand::Rng;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(u32);

impl Charset {
    pub const LETTERS: Charset = Charset(0x1);
    pub const DIGITS: Charset = Charset(0x2);
    pub const PUNCTUATION: Charset = Charset(0x4);
    pub const KATAKANA: Charset = Charset(0x8);
    pub const BINARY: Charset = Charset(0x10);
    pub const HEX: Charset = Charset(0x20);

    pub const MATRIX: Charset = Charset(0xB);
    pub const ASCII: Charset = Charset(0x7);

    pub fn contains(self, other: Charset) -> bool {
        (self.0 & other.0) != 0
    }
}

pub fn charset_from_str(spec: &str) -> Result<Charset, Error> {
    match spec.trim().to_ascii_lowercase().as_str() {
        "matrix" => Ok(Charset::MATRIX),
        "ascii" => Ok(Charset::ASCII),
        "katakana" => Ok(Charset::KATAKANA),
        "digits" | "dec" | "decimal" => Ok(Charset::DIGITS),
        "bin" | "binary" | "01" => Ok(Charset::BINARY),
        "hex" | "hexadecimal" => Ok(Charset::HEX),
        other => Err(Error::invalid_option(
            "--charset",
            format!("unsupported charset {} (see --list-charsets)", other),
        )),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    out.extend((start..=end).filter_map(char::from_u32));
}

/// The falling alphabet. Kana are the half-width forms so every glyph fills
/// exactly one terminal cell.
#[derive(Clone, Debug)]
pub struct Glyphs {
    chars: Vec<char>,
}

impl Glyphs {
    pub fn new(charset: Charset) -> Self {
        let mut out: Vec<char> = Vec::new();

        if charset.contains(Charset::KATAKANA) {
            push_range(&mut out, 0xFF66, 0xFF9D);
        }
        if charset.contains(Charset::LETTERS) {
            push_range(&mut out, 0x41, 0x5A);
        }
        if charset.contains(Charset::DIGITS) {
            push_range(&mut out, 0x30, 0x39);
        }
        if charset.contains(Charset::PUNCTUATION) {
            push_range(&mut out, 0x21, 0x2F);
            push_range(&mut out, 0x3A, 0x40);
        }
        if charset.contains(Charset::BINARY) {
            push_range(&mut out, 0x30, 0x31);
        }
        if charset.contains(Charset::HEX) {
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0x41, 0x46);
        }

        if out.is_empty() {
            out.extend(['0', '1']);
        }
        Self { chars: out }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.chars[rng.random_range(0..self.chars.len())]
    }
}

impl Default for Glyphs {
    fn default() -> Self {
        Self::new(Charset::MATRIX)
    }
}
