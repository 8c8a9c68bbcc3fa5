use std::fmt::Write;

use ndarray::Array2;
use sweeptutor_core::{Assessment, Board, CellTag, CellView, Coord2, Metrics, ToNdIndex};

pub const LEGEND: &str = "r reveal, f flag, c chord, ? guess";

fn glyph(view: CellView) -> char {
    match view {
        CellView::Hidden => '.',
        CellView::Revealed(0) => ' ',
        CellView::Revealed(count) => char::from(b'0' + count),
        CellView::Flagged => 'F',
        CellView::Exploded => 'X',
        CellView::Mine => '*',
        CellView::WrongFlag => 'x',
    }
}

fn tag_glyph(tag: CellTag) -> Option<char> {
    match tag {
        CellTag::None => None,
        CellTag::Reveal => Some('r'),
        CellTag::Flag => Some('f'),
        CellTag::Chord => Some('c'),
        CellTag::Guess => Some('?'),
    }
}

/// Draws the board with row and column labels, tagged cells replaced by their tag letter.
pub fn board(board: &Board, tags: Option<&Array2<CellTag>>) -> String {
    let (rows, cols) = board.size();
    let mut out = String::from("   ");
    for col in 0..cols {
        let _ = write!(out, "{col:>3}");
    }
    out.push('\n');

    for row in 0..rows {
        let _ = write!(out, "{row:>3}");
        for col in 0..cols {
            let coords = (row, col);
            let tag = tags.and_then(|tags| tag_glyph(tags[coords.to_nd_index()]));
            let ch = tag.unwrap_or_else(|| glyph(board.cell(coords).view()));
            let _ = write!(out, "  {ch}");
        }
        out.push('\n');
    }
    out
}

/// Grid form of a gate highlight list.
pub fn highlight(size: Coord2, cells: &[(Coord2, CellTag)]) -> Array2<CellTag> {
    let mut tags = Array2::default(size.to_nd_index());
    for &(coords, tag) in cells {
        tags[coords.to_nd_index()] = tag;
    }
    tags
}

/// Cells an oracle proved safe or mined, in row-major order.
pub fn proofs(grid: &Array2<Option<Assessment>>) -> String {
    let mut safe = Vec::new();
    let mut mines = Vec::new();
    for ((row, col), assessment) in grid.indexed_iter() {
        match assessment {
            Some(Assessment::Safe) => safe.push((row, col)),
            Some(Assessment::Mine) => mines.push((row, col)),
            _ => {}
        }
    }
    format!("proven safe: {safe:?}\nproven mines: {mines:?}")
}

pub fn metrics(metrics: &Metrics) -> String {
    let mut out = format!(
        "value {}/{} in {} actions, {:.1}s, {}% cleared, {} mines left",
        metrics.value_progress,
        metrics.value_total,
        metrics.actions,
        metrics.elapsed_ms as f64 / 1000.0,
        metrics.completion_percent,
        metrics.mines_remaining,
    );
    if let Some(efficiency) = metrics.efficiency_percent {
        let _ = write!(out, ", efficiency {efficiency:.0}%");
    }
    if let Some(rate) = metrics.value_per_second {
        let _ = write!(out, ", {rate:.2} value/s");
    }
    if let Some(rate) = metrics.clicks_per_second {
        let _ = write!(out, ", {rate:.2} clicks/s");
    }
    if let Some(estimate) = metrics.estimated_total_ms {
        let _ = write!(out, ", est. {:.0}s total", estimate as f64 / 1000.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeptutor_core::MineLayout;

    #[test]
    fn draws_labels_and_tags() {
        let layout = MineLayout::from_mine_coords((2, 3), &[(0, 0)]).unwrap();
        let mut board = Board::new(layout);
        board.reveal((1, 2)).unwrap();
        let tags = highlight((2, 3), &[((0, 0), CellTag::Flag)]);

        let text = super::board(&board, Some(&tags));

        assert_eq!(text, "     0  1  2\n  0  f  1   \n  1  .  1   \n");
    }

    #[test]
    fn lists_proven_cells() {
        let mut grid = Array2::from_elem([2, 2], None);
        grid[[0, 1]] = Some(Assessment::Mine);
        grid[[1, 0]] = Some(Assessment::Safe);
        grid[[1, 1]] = Some(Assessment::Probability(0.5));

        assert_eq!(
            proofs(&grid),
            "proven safe: [(1, 0)]\nproven mines: [(0, 1)]"
        );
    }
}
