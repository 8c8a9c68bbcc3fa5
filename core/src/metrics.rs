use serde::{Deserialize, Serialize};

use crate::*;

/// Speed and efficiency figures for the current game.
///
/// Rates are `None` until there is something to divide by. Value progress
/// uses the any-member-revealed rule, which is what players see counted.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub actions: u32,
    pub value_progress: CellCount,
    pub value_total: CellCount,
    pub elapsed_ms: u64,
    pub value_per_second: Option<f64>,
    pub clicks_per_second: Option<f64>,
    /// `100 * value_progress / actions`.
    pub efficiency_percent: Option<f64>,
    /// Time the whole board would take at the current value rate.
    pub estimated_total_ms: Option<u64>,
    /// Revealed safe cells, rounded to whole percent.
    pub completion_percent: u8,
    /// Never below zero, even when over-flagged.
    pub mines_remaining: CellCount,
}

impl Metrics {
    pub fn compute(board: &Board, actions: u32, elapsed_ms: u64) -> Self {
        let units = segment(board);
        let value_progress = progress_with(board, &units, ProgressRule::AnyRevealed);
        let value_total = units.total();

        let seconds = elapsed_ms as f64 / 1000.0;
        let per_second = |count: f64| (elapsed_ms > 0).then(|| count / seconds);
        let value_per_second = per_second(f64::from(value_progress));
        let clicks_per_second = per_second(f64::from(actions));

        let efficiency_percent =
            (actions > 0).then(|| 100.0 * f64::from(value_progress) / f64::from(actions));
        let estimated_total_ms = (elapsed_ms > 0 && value_progress > 0 && value_total > 0)
            .then(|| elapsed_ms * u64::from(value_total) / u64::from(value_progress));

        let safe = u32::from(board.safe_cell_count());
        let revealed = u32::from(board.revealed_count());
        let completion_percent = if safe == 0 {
            0
        } else {
            ((revealed * 100 + safe / 2) / safe) as u8
        };

        Self {
            actions,
            value_progress,
            value_total,
            elapsed_ms,
            value_per_second,
            clicks_per_second,
            efficiency_percent,
            estimated_total_ms,
            completion_percent,
            mines_remaining: board.total_mines().saturating_sub(board.flagged_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::board;

    #[test]
    fn fresh_board_has_no_rates() {
        let board = board((3, 5), &[(1, 2)]);
        let metrics = Metrics::compute(&board, 0, 0);

        assert_eq!(metrics.value_total, 4);
        assert_eq!(metrics.value_progress, 0);
        assert_eq!(metrics.value_per_second, None);
        assert_eq!(metrics.clicks_per_second, None);
        assert_eq!(metrics.efficiency_percent, None);
        assert_eq!(metrics.estimated_total_ms, None);
        assert_eq!(metrics.completion_percent, 0);
        assert_eq!(metrics.mines_remaining, 1);
    }

    #[test]
    fn rates_follow_progress_and_time() {
        let mut board = board((3, 5), &[(1, 2)]);
        board.reveal((2, 0)).unwrap();
        board.reveal((0, 2)).unwrap();

        let metrics = Metrics::compute(&board, 4, 2000);

        assert_eq!(metrics.value_progress, 2);
        assert_eq!(metrics.value_per_second, Some(1.0));
        assert_eq!(metrics.clicks_per_second, Some(2.0));
        assert_eq!(metrics.efficiency_percent, Some(50.0));
        assert_eq!(metrics.estimated_total_ms, Some(4000));
        // 7 of 14 safe cells
        assert_eq!(metrics.completion_percent, 50);
    }

    #[test]
    fn border_opening_counts_for_display() {
        let mut board = board((3, 5), &[(1, 2)]);
        board.reveal((0, 3)).unwrap();

        let metrics = Metrics::compute(&board, 1, 500);

        assert_eq!(metrics.value_progress, 1);
        assert_eq!(metrics.efficiency_percent, Some(100.0));
    }

    #[test]
    fn over_flagging_saturates_remaining_mines() {
        let mut board = board((3, 5), &[(1, 2)]);
        board.toggle_flag((0, 0)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        assert_eq!(board.mines_left(), -1);
        assert_eq!(Metrics::compute(&board, 2, 0).mines_remaining, 0);
    }
}
