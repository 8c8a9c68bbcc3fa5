//! Plain-text board snapshots.
//!
//! One row per line. Blank lines and lines starting with `#` are skipped,
//! whitespace inside a row is ignored.
//!
//! | glyph | cell |
//! |---|---|
//! | `.` | hidden, safe |
//! | `*` | hidden mine |
//! | `o` or `0`-`8` | revealed (a digit must match the real neighbor count) |
//! | `F` | flagged mine |
//! | `x` | flagged, but safe |

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use ndarray::Array2;
use sweeptutor_core::{Board, Coord, MineLayout};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Glyph {
    Hidden,
    Mine,
    Revealed(Option<u8>),
    FlaggedMine,
    FlaggedSafe,
}

impl Glyph {
    fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '.' => Self::Hidden,
            '*' => Self::Mine,
            'o' => Self::Revealed(None),
            '0'..='8' => Self::Revealed(ch.to_digit(10).map(|digit| digit as u8)),
            'F' => Self::FlaggedMine,
            'x' => Self::FlaggedSafe,
            _ => return None,
        })
    }

    fn is_mine(self) -> bool {
        matches!(self, Self::Mine | Self::FlaggedMine)
    }

    fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }

    fn is_flagged(self) -> bool {
        matches!(self, Self::FlaggedMine | Self::FlaggedSafe)
    }
}

pub fn parse(text: &str) -> Result<Board> {
    let mut rows: Vec<Vec<Glyph>> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .enumerate()
            .map(|(col, ch)| {
                Glyph::from_char(ch).with_context(|| {
                    format!("line {}: unknown cell {ch:?} in column {col}", line_no + 1)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    let Some(cols) = rows.first().map(Vec::len) else {
        bail!("fixture has no rows");
    };
    for (row_no, row) in rows.iter().enumerate() {
        ensure!(
            row.len() == cols,
            "row {row_no} has {} cells, expected {cols}",
            row.len()
        );
    }
    let max_side = usize::from(Coord::MAX);
    ensure!(
        rows.len() <= max_side && cols <= max_side,
        "fixture is {}x{cols}, sides are limited to {max_side}",
        rows.len()
    );

    let shape = [rows.len(), cols];
    let mask = |keep: fn(Glyph) -> bool| {
        Array2::from_shape_fn(shape, |(row, col)| keep(rows[row][col]))
    };
    let layout =
        MineLayout::from_mine_mask(mask(Glyph::is_mine)).context("invalid mine layout")?;
    let board = Board::restore(layout, &mask(Glyph::is_revealed), &mask(Glyph::is_flagged))
        .context("inconsistent fixture")?;

    for (row_no, row) in rows.iter().enumerate() {
        for (col_no, glyph) in row.iter().enumerate() {
            let Glyph::Revealed(Some(shown)) = *glyph else {
                continue;
            };
            let actual = board.cell((row_no as Coord, col_no as Coord)).neighbor_mines();
            ensure!(
                shown == actual,
                "cell ({row_no}, {col_no}) shows {shown} but touches {actual} mines"
            );
        }
    }
    Ok(board)
}

/// Reads a fixture from `path`, or from stdin when `path` is `-`.
pub fn read(path: &Path) -> Result<Board> {
    let text = if path == Path::new("-") {
        io::read_to_string(io::stdin()).context("reading fixture from stdin")?
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    parse(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Formats `board` so that [`parse`] gives it back, revealed cells as digits.
///
/// A lost board shows its revealed mines as `*` and does not parse back.
pub fn write(board: &Board) -> String {
    let (rows, cols) = board.size();
    let mut out = String::with_capacity(usize::from(rows) * (usize::from(cols) + 1));
    for row in 0..rows {
        for col in 0..cols {
            let cell = board.cell((row, col));
            out.push(match (cell.is_mine(), cell.is_flagged(), cell.is_revealed()) {
                (true, true, _) => 'F',
                (false, true, _) => 'x',
                (true, false, _) => '*',
                (false, false, false) => '.',
                (false, false, true) => char::from(b'0' + cell.neighbor_mines()),
            });
        }
        out.push('\n');
    }
    out
}
