//! ASCII Font Engine - Block Letters
//!
//! One 5-row bitmap glyph set drives every ASCII font style and the PNG
//! title rasterizer, so the two formats always spell text the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const GLYPH_HEIGHT: usize = 5;

/// Columns between adjacent glyphs.
const LETTER_SPACING: usize = 1;

/// Glyph bitmaps, `#` marks a filled cell.
fn glyph_rows(c: char) -> Option<[&'static str; GLYPH_HEIGHT]> {
    let rows = match c {
        'A' => [" ### ", "#   #", "#####", "#   #", "#   #"],
        'B' => ["#### ", "#   #", "#### ", "#   #", "#### "],
        'C' => [" ####", "#    ", "#    ", "#    ", " ####"],
        'D' => ["#### ", "#   #", "#   #", "#   #", "#### "],
        'E' => ["#####", "#    ", "#### ", "#    ", "#####"],
        'F' => ["#####", "#    ", "#### ", "#    ", "#    "],
        'G' => [" ####", "#    ", "#  ##", "#   #", " ### "],
        'H' => ["#   #", "#   #", "#####", "#   #", "#   #"],
        'I' => ["###", " # ", " # ", " # ", "###"],
        'J' => ["  ###", "   # ", "   # ", "#  # ", " ##  "],
        'K' => ["#   #", "#  # ", "###  ", "#  # ", "#   #"],
        'L' => ["#    ", "#    ", "#    ", "#    ", "#####"],
        'M' => ["#   #", "## ##", "# # #", "#   #", "#   #"],
        'N' => ["#   #", "##  #", "# # #", "#  ##", "#   #"],
        'O' => [" ### ", "#   #", "#   #", "#   #", " ### "],
        'P' => ["#### ", "#   #", "#### ", "#    ", "#    "],
        'Q' => [" ### ", "#   #", "# # #", "#  # ", " ## #"],
        'R' => ["#### ", "#   #", "#### ", "#  # ", "#   #"],
        'S' => [" ####", "#    ", " ### ", "    #", "#### "],
        'T' => ["#####", "  #  ", "  #  ", "  #  ", "  #  "],
        'U' => ["#   #", "#   #", "#   #", "#   #", " ### "],
        'V' => ["#   #", "#   #", "#   #", " # # ", "  #  "],
        'W' => ["#   #", "#   #", "# # #", "## ##", "#   #"],
        'X' => ["#   #", " # # ", "  #  ", " # # ", "#   #"],
        'Y' => ["#   #", " # # ", "  #  ", "  #  ", "  #  "],
        'Z' => ["#####", "   # ", "  #  ", " #   ", "#####"],
        '0' => [" ### ", "#  ##", "# # #", "##  #", " ### "],
        '1' => [" # ", "## ", " # ", " # ", "###"],
        '2' => [" ### ", "#   #", "  ## ", " #   ", "#####"],
        '3' => ["#### ", "    #", " ### ", "    #", "#### "],
        '4' => ["#   #", "#   #", "#####", "    #", "    #"],
        '5' => ["#####", "#    ", "#### ", "    #", "#### "],
        '6' => [" ### ", "#    ", "#### ", "#   #", " ### "],
        '7' => ["#####", "   # ", "  #  ", " #   ", " #   "],
        '8' => [" ### ", "#   #", " ### ", "#   #", " ### "],
        '9' => [" ### ", "#   #", " ####", "    #", " ### "],
        ' ' => ["   ", "   ", "   ", "   ", "   "],
        '.' => [" ", " ", " ", " ", "#"],
        ',' => ["  ", "  ", "  ", " #", "# "],
        '!' => ["#", "#", "#", " ", "#"],
        '?' => [" ### ", "#   #", "  ## ", "     ", "  #  "],
        ':' => [" ", "#", " ", "#", " "],
        ';' => ["  ", " #", "  ", " #", "# "],
        '\'' => ["#", "#", " ", " ", " "],
        '"' => ["# #", "# #", "   ", "   ", "   "],
        '-' => ["    ", "    ", "####", "    ", "    "],
        '_' => ["    ", "    ", "    ", "    ", "####"],
        '+' => ["     ", "  #  ", "#####", "  #  ", "     "],
        '=' => ["    ", "####", "    ", "####", "    "],
        '/' => ["    #", "   # ", "  #  ", " #   ", "#    "],
        '(' => [" #", "# ", "# ", "# ", " #"],
        ')' => ["# ", " #", " #", " #", "# "],
        '&' => [" ##  ", "#  # ", " ## #", "#  # ", " ## #"],
        '@' => [" ### ", "# ###", "# # #", "# ###", " ### "],
        '#' => [" # # ", "#####", " # # ", "#####", " # # "],
        '*' => ["     ", "# # #", " ### ", "# # #", "     "],
        '<' => ["  #", " # ", "#  ", " # ", "  #"],
        '>' => ["#  ", " # ", "  #", " # ", "#  "],
        _ => return None,
    };
    Some(rows)
}

/// A boolean cell grid holding rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphGrid {
    width: usize,
    cells: Vec<bool>,
}

impl GlyphGrid {
    /// Lay out `text` as block letters; unsupported characters become `?`.
    pub fn layout(text: &str) -> Self {
        let mut columns: Vec<[bool; GLYPH_HEIGHT]> = Vec::new();

        for (i, c) in text.chars().flat_map(char::to_uppercase).enumerate() {
            let rows = glyph_rows(c).unwrap_or_else(|| {
                warn!(character = %c, "no glyph for character, substituting '?'");
                glyph_rows('?').unwrap_or([""; GLYPH_HEIGHT])
            });

            if i > 0 {
                columns.extend(std::iter::repeat([false; GLYPH_HEIGHT]).take(LETTER_SPACING));
            }

            let glyph_width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
            for x in 0..glyph_width {
                let mut column = [false; GLYPH_HEIGHT];
                for (y, row) in rows.iter().enumerate() {
                    column[y] = row.as_bytes().get(x) == Some(&b'#');
                }
                columns.push(column);
            }
        }

        let width = columns.len();
        let mut cells = vec![false; width * GLYPH_HEIGHT];
        for (x, column) in columns.iter().enumerate() {
            for (y, filled) in column.iter().enumerate() {
                cells[y * width + x] = *filled;
            }
        }
        Self { width, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        GLYPH_HEIGHT
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.width && y < GLYPH_HEIGHT && self.cells[y * self.width + x]
    }

    /// Iterate `(x, y)` of every filled cell, row-major.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..GLYPH_HEIGHT)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.is_filled(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// `#` cells
    Standard,
    /// Full block cells
    Block,
    /// Dark shade cells on a light shade field
    Shade,
    /// Full blocks with a one-cell drop shadow
    Shadow,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [Self::Standard, Self::Block, Self::Shade, Self::Shadow];

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Block => "block",
            Self::Shade => "shade",
            Self::Shadow => "shadow",
        }
    }

    /// Render a laid-out grid into lines of text, trailing spaces trimmed.
    pub fn draw(self, grid: &GlyphGrid) -> Vec<String> {
        let (fill, empty) = match self {
            Self::Standard => ('#', ' '),
            Self::Block => ('█', ' '),
            Self::Shade => ('▓', '░'),
            Self::Shadow => return draw_with_shadow(grid),
        };

        (0..grid.height())
            .map(|y| {
                let line: String = (0..grid.width())
                    .map(|x| if grid.is_filled(x, y) { fill } else { empty })
                    .collect();
                line.trim_end().to_string()
            })
            .collect()
    }
}

fn draw_with_shadow(grid: &GlyphGrid) -> Vec<String> {
    (0..=grid.height())
        .map(|y| {
            let line: String = (0..=grid.width())
                .map(|x| {
                    if grid.is_filled(x, y) {
                        '█'
                    } else if x > 0 && y > 0 && grid.is_filled(x - 1, y - 1) {
                        '░'
                    } else {
                        ' '
                    }
                })
                .collect();
            line.trim_end().to_string()
        })
        .collect()
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Render `text` as a block-letter banner with an optional plain subtitle line.
pub fn banner(text: &str, subtitle: Option<&str>, style: FontStyle) -> String {
    let grid = GlyphGrid::layout(text);
    let mut out = String::new();
    for line in style.draw(&grid) {
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(subtitle) = subtitle {
        out.push('\n');
        out.push_str(subtitle);
        out.push('\n');
    }
    out
}

/// Terminal colors for previewing ASCII banners on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnsiColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl AnsiColor {
    fn code(self) -> &'static str {
        match self {
            Self::Red => "\x1b[91m",
            Self::Green => "\x1b[92m",
            Self::Yellow => "\x1b[93m",
            Self::Blue => "\x1b[94m",
            Self::Magenta => "\x1b[95m",
            Self::Cyan => "\x1b[96m",
            Self::White => "\x1b[97m",
        }
    }

    pub fn paint(self, banner: &str) -> String {
        format!("{}{}\x1b[0m", self.code(), banner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_rows_consistent() {
        let chars = ('A'..='Z').chain('0'..='9').chain(" .,!?:;'\"-_+=/()&@#*<>".chars());
        for c in chars {
            let rows = glyph_rows(c).unwrap_or_else(|| panic!("missing glyph {:?}", c));
            let width = rows[0].len();
            assert!(rows.iter().all(|r| r.len() == width), "ragged glyph {:?}", c);
        }
    }

    #[test]
    fn test_layout_width() {
        // H (5) + spacing (1) + I (3)
        let grid = GlyphGrid::layout("hi");
        assert_eq!(grid.width(), 9);
        assert!(grid.is_filled(0, 0));
        assert!(!grid.is_filled(5, 2));
    }

    #[test]
    fn test_unknown_char_uses_question_glyph() {
        assert_eq!(GlyphGrid::layout("~"), GlyphGrid::layout("?"));
    }

    #[test]
    fn test_standard_banner() {
        let out = banner("I", Some("tagline"), FontStyle::Standard);
        assert_eq!(out, "###\n #\n #\n #\n###\n\ntagline\n");
    }

    #[test]
    fn test_shadow_adds_row() {
        let lines = FontStyle::Shadow.draw(&GlyphGrid::layout("L"));
        assert_eq!(lines.len(), GLYPH_HEIGHT + 1);
        assert_eq!(lines[5], " ░░░░░");
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in FontStyle::ALL {
            assert_eq!(style.name().parse::<FontStyle>().unwrap(), style);
        }
        assert!("comic".parse::<FontStyle>().is_err());
    }
}
