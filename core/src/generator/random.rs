use alloc::vec::Vec;
use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use super::*;

/// Purely random placement, optionally keeping one protected cell free of mines.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    safe_cell: Option<Coord2>,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, safe_cell: Option<Coord2>) -> Self {
        Self { seed, safe_cell }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        place_mines(config, self.safe_cell, &mut rng)
    }
}

/// Places `config.mines` mines on a uniformly random subset of the cells, never on `safe_cell`.
///
/// Fails before touching anything when the configuration is out of range.
pub fn place_mines<R: Rng + ?Sized>(
    config: GameConfig,
    safe_cell: Option<Coord2>,
    rng: &mut R,
) -> Result<MineLayout> {
    config.validate()?;
    let size = config.size();
    if let Some(safe_cell) = safe_cell {
        if safe_cell.0 >= size.0 || safe_cell.1 >= size.1 {
            return Err(GameError::InvalidCoords);
        }
    }

    let cols = usize::from(config.cols);
    let safe_index = safe_cell.map(|(row, col)| usize::from(row) * cols + usize::from(col));
    let mut available: Vec<usize> = (0..usize::from(config.total_cells()))
        .filter(|&index| Some(index) != safe_index)
        .collect();

    let (chosen, _) = available.partial_shuffle(rng, config.mines.into());

    let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
    for &index in chosen.iter() {
        mine_mask[[index / cols, index % cols]] = true;
    }

    let layout = MineLayout::from_mine_mask(mine_mask)?;
    if layout.mine_count() != config.mines {
        log::warn!(
            "Generated layout count mismatch, actual: {}, requested: {}",
            layout.mine_count(),
            config.mines
        );
    }
    log::debug!(
        "Placed {} mines on a {}x{} board, safe cell: {:?}",
        layout.mine_count(),
        config.rows,
        config.cols,
        safe_cell
    );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_exact_mine_count() {
        let config = GameConfig::expert();
        let layout = RandomLayoutGenerator::new(7, None).generate(config).unwrap();

        assert_eq!(layout.mine_count(), 99);
        assert_eq!(layout.size(), (16, 30));
    }

    #[test]
    fn never_mines_the_safe_cell() {
        // densest allowed board, only the safe cell is left free
        let config = GameConfig::new(6, 6, 35).unwrap();
        for seed in 0..20 {
            let layout = RandomLayoutGenerator::new(seed, Some((3, 4)))
                .generate(config)
                .unwrap();
            assert!(!layout.contains_mine((3, 4)));
            assert_eq!(layout.mine_count(), 35);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let config = GameConfig::intermediate();
        let a = RandomLayoutGenerator::new(42, Some((0, 0))).generate(config);
        let b = RandomLayoutGenerator::new(42, Some((0, 0))).generate(config);

        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_config_and_safe_cell() {
        let too_small = GameConfig::new_unchecked(3, 3, 1);
        assert_eq!(
            RandomLayoutGenerator::new(0, None).generate(too_small),
            Err(GameError::Config(ConfigError::InvalidDimensions { rows: 3, cols: 3 }))
        );

        let full = GameConfig::new_unchecked(6, 6, 36);
        assert_eq!(
            RandomLayoutGenerator::new(0, None).generate(full),
            Err(GameError::Config(ConfigError::TooManyMines { mines: 36, max: 35 }))
        );

        assert_eq!(
            RandomLayoutGenerator::new(0, Some((9, 0))).generate(GameConfig::beginner()),
            Err(GameError::InvalidCoords)
        );
    }
}
