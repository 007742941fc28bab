// Copyright (c) 2026 rezky_nightky

//! Glyph shapes that the rain fills in: the Christmas tree and 5x7 digits.

/// Plain ASCII so the star row keeps one cell per glyph on terminals that
/// render ambiguous-width symbols double wide.
pub const STAR: char = '*';

const DIGIT_WIDTH: i32 = 5;
const DIGIT_SPACING: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternCell {
    pub row: i32,
    pub col_offset: i32,
    /// Special cells (the tree's star) are not caught from the rain; they
    /// appear a moment after the rest of the shape is done.
    pub special: Option<char>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub name: String,
    pub cells: Vec<PatternCell>,
    /// Top of the shape as a fraction of the screen height.
    pub top_frac: f32,
}

impl Pattern {
    /// Builds a pattern from rows of signed offsets around the center column.
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<i32>], top_frac: f32) -> Self {
        let cells = rows
            .iter()
            .enumerate()
            .flat_map(|(row, offsets)| {
                offsets.iter().map(move |&col_offset| PatternCell {
                    row: row as i32,
                    col_offset,
                    special: None,
                })
            })
            .collect();
        Self {
            name: name.into(),
            cells,
            top_frac,
        }
    }

    pub fn tree() -> Self {
        let mut rows: Vec<Vec<i32>> = vec![Vec::new(), span(0)];
        // Four tiers, each wider than the one above it.
        for (narrow, wide) in [(1, 4), (2, 6), (3, 8), (4, 10)] {
            for half in narrow..=wide {
                rows.push(span(half));
            }
        }
        for _ in 0..3 {
            rows.push(span(1));
        }

        let mut pattern = Pattern::from_rows("tree", &rows, 0.06);
        pattern.cells.insert(
            0,
            PatternCell {
                row: 0,
                col_offset: 0,
                special: Some(STAR),
            },
        );
        pattern
    }

    /// The digits of `year` side by side, centered as a group.
    pub fn year(year: i32) -> Self {
        let digits: Vec<u32> = year
            .unsigned_abs()
            .to_string()
            .chars()
            .filter_map(|c| c.to_digit(10))
            .collect();

        let n = digits.len() as i32;
        let total_width = n * DIGIT_WIDTH + (n - 1).max(0) * DIGIT_SPACING;
        let start_offset = -(total_width / 2);

        let mut cells = Vec::new();
        for (i, &d) in digits.iter().enumerate() {
            let center =
                start_offset + i as i32 * (DIGIT_WIDTH + DIGIT_SPACING) + DIGIT_WIDTH / 2;
            for (row, offsets) in digit_rows(d).iter().enumerate() {
                cells.extend(offsets.iter().map(|&o| PatternCell {
                    row: row as i32,
                    col_offset: o + center,
                    special: None,
                }));
            }
        }

        Self {
            name: year.to_string(),
            cells,
            top_frac: 0.15,
        }
    }
}

fn span(half: i32) -> Vec<i32> {
    (-half..=half).collect()
}

fn digit_rows(d: u32) -> [&'static [i32]; 7] {
    const FULL: &[i32] = &[-2, -1, 0, 1, 2];
    const MID: &[i32] = &[-1, 0, 1];
    const SIDES: &[i32] = &[-2, 2];
    const L: &[i32] = &[-2];
    const R: &[i32] = &[2];
    const C: &[i32] = &[0];

    match d {
        0 => [MID, SIDES, SIDES, SIDES, SIDES, SIDES, MID],
        1 => [C, &[-1, 0], C, C, C, C, MID],
        2 => [FULL, R, R, FULL, L, L, FULL],
        3 => [FULL, R, R, &[-1, 0, 1, 2], R, R, FULL],
        4 => [SIDES, SIDES, SIDES, FULL, R, R, R],
        5 => [FULL, L, L, &[-2, -1, 0, 1], R, R, &[-2, -1, 0, 1]],
        6 => [&[-1, 0, 1, 2], L, L, &[-2, -1, 0, 1], SIDES, SIDES, MID],
        7 => [FULL, R, &[1], C, C, C, C],
        8 => [MID, SIDES, SIDES, MID, SIDES, SIDES, MID],
        _ => [MID, SIDES, SIDES, &[-1, 0, 1, 2], R, R, &[-2, -1, 0, 1]],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn height(p: &Pattern) -> i32 {
        p.cells.iter().map(|c| c.row + 1).max().unwrap_or(0)
    }

    #[test]
    fn star_is_a_single_cell_glyph() {
        assert!(STAR.is_ascii());
    }

    #[test]
    fn tree_has_star_body_and_trunk() {
        let t = Pattern::tree();
        assert_eq!(height(&t), 27);
        let specials: Vec<_> = t.cells.iter().filter(|c| c.special.is_some()).collect();
        assert_eq!(specials.len(), 1);
        assert_eq!(specials[0].row, 0);
        assert_eq!(specials[0].special, Some(STAR));
        // widest row is the bottom of the last tier
        let widest = t.cells.iter().filter(|c| c.row == 23).count();
        assert_eq!(widest, 21);
        let trunk = t.cells.iter().filter(|c| c.row >= 24).count();
        assert_eq!(trunk, 9);
    }

    #[test]
    fn tree_cells_are_unique() {
        let t = Pattern::tree();
        let set: HashSet<_> = t.cells.iter().map(|c| (c.row, c.col_offset)).collect();
        assert_eq!(set.len(), t.cells.len());
    }

    #[test]
    fn year_2026_is_centered_and_spaced() {
        let p = Pattern::year(2026);
        assert_eq!(height(&p), 7);
        let min = p.cells.iter().map(|c| c.col_offset).min().unwrap();
        let max = p.cells.iter().map(|c| c.col_offset).max().unwrap();
        assert_eq!((min, max), (-13, 12));
        assert!(p.cells.iter().all(|c| c.special.is_none()));
    }

    #[test]
    fn every_digit_fits_the_5x7_box() {
        for d in 0..10 {
            for row in digit_rows(d) {
                assert!(!row.is_empty());
                assert!(row.iter().all(|o| (-2..=2).contains(o)));
            }
        }
    }
}
