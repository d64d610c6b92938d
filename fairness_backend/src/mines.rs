use candid::{CandidType, Deserialize};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::MinesTable;
use crate::error::{ConfigError, Result};
use crate::payout::{mines_multiplier, validate_house_edge};
use crate::rng::mine_positions;
use crate::types::{MinesConfig, MinesPlay, Position, SeedPair, MIN_TILES_FOR_CASHOUT};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinesPlayError {
    #[error("tile ({x},{y}) is outside the {width}x{height} board")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("tile ({x},{y}) already revealed")]
    AlreadyRevealed { x: u32, y: u32 },
    #[error("round is over")]
    RoundOver,
    #[error("must reveal at least {min} tile(s) before cashing out")]
    NothingRevealed { min: u32 },
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub enum Reveal {
    Safe { cleared_tiles: u32, multiplier: f64 },
    Mine,
}

/// A mines round in progress, tracking what the player has actually cleared.
#[derive(Clone, Debug)]
pub struct MinesBoard {
    config: MinesConfig,
    // Cash-out multiplier indexed by cleared tiles, 0..=safe_tiles
    multipliers: Vec<f64>,
    mines: Vec<bool>,    // true = mine, false = safe
    revealed: Vec<bool>, // true = revealed
    cleared_tiles: u32,
    hit_mine: bool,
    cashed_out: bool,
    is_active: bool,
}

impl MinesBoard {
    pub fn from_round(
        seeds: &SeedPair,
        nonce: u64,
        config: MinesConfig,
        table: MinesTable,
    ) -> Result<Self> {
        table.curve.validate()?;
        validate_house_edge(table.house_edge)?;
        let positions = mine_positions(seeds, nonce, &config)?;
        Ok(Self::with_positions(config, table, &positions)?)
    }

    // Positions must come from mine_positions, so they are unique and in bounds
    fn with_positions(
        config: MinesConfig,
        table: MinesTable,
        positions: &[Position],
    ) -> std::result::Result<Self, ConfigError> {
        let multipliers = (0..=config.safe_tiles())
            .map(|cleared| mines_multiplier(&config, cleared, &table.curve, table.house_edge))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let cells = config.cell_count() as usize;
        let mut mines = vec![false; cells];
        for position in positions {
            mines[position.cell_index(config.width) as usize] = true;
        }
        Ok(Self {
            config,
            multipliers,
            mines,
            revealed: vec![false; cells],
            cleared_tiles: 0,
            hit_mine: false,
            cashed_out: false,
            is_active: true,
        })
    }

    pub fn config(&self) -> &MinesConfig {
        &self.config
    }

    pub fn cleared_tiles(&self) -> u32 {
        self.cleared_tiles
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_revealed(&self, x: u32, y: u32) -> bool {
        self.cell(x, y)
            .map(|cell| self.revealed[cell])
            .unwrap_or(false)
    }

    fn cell(&self, x: u32, y: u32) -> std::result::Result<usize, MinesPlayError> {
        if x >= self.config.width || y >= self.config.height {
            return Err(MinesPlayError::OutOfBounds {
                x,
                y,
                width: self.config.width,
                height: self.config.height,
            });
        }
        Ok(Position { x, y }.cell_index(self.config.width) as usize)
    }

    // cleared_tiles never exceeds safe_tiles, the last index
    fn current_multiplier(&self) -> f64 {
        self.multipliers[self.cleared_tiles as usize]
    }

    pub fn reveal(&mut self, x: u32, y: u32) -> std::result::Result<Reveal, MinesPlayError> {
        if !self.is_active {
            return Err(MinesPlayError::RoundOver);
        }
        let cell = self.cell(x, y)?;
        if self.revealed[cell] {
            return Err(MinesPlayError::AlreadyRevealed { x, y });
        }
        self.revealed[cell] = true;

        if self.mines[cell] {
            self.hit_mine = true;
            self.is_active = false;
            debug!(x, y, cleared = self.cleared_tiles, "mine hit");
            return Ok(Reveal::Mine);
        }

        self.cleared_tiles += 1;
        if self.cleared_tiles == self.config.safe_tiles() {
            // Nothing left to clear
            self.is_active = false;
        }
        Ok(Reveal::Safe {
            cleared_tiles: self.cleared_tiles,
            multiplier: self.current_multiplier(),
        })
    }

    /// Ends the round and returns the play summary for settlement.
    pub fn cash_out(&mut self, amount: f64) -> std::result::Result<MinesPlay, MinesPlayError> {
        if self.hit_mine || self.cashed_out {
            return Err(MinesPlayError::RoundOver);
        }
        if self.cleared_tiles < MIN_TILES_FOR_CASHOUT {
            return Err(MinesPlayError::NothingRevealed {
                min: MIN_TILES_FOR_CASHOUT,
            });
        }
        self.cashed_out = true;
        self.is_active = false;
        Ok(self.play(amount))
    }

    /// Summary of play so far; after a bust this is the losing play.
    pub fn play(&self, amount: f64) -> MinesPlay {
        MinesPlay {
            amount,
            cleared_tiles: self.cleared_tiles,
            hit_mine: self.hit_mine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> MinesBoard {
        // Mines down the first column of a 3x3 board
        let positions = [
            Position { x: 0, y: 0 },
            Position { x: 0, y: 1 },
            Position { x: 0, y: 2 },
        ];
        MinesBoard::with_positions(MinesConfig::new(3, 3, 3), MinesTable::default(), &positions)
            .unwrap()
    }

    #[test]
    fn test_reveal_reports_settlement_multiplier() {
        let mut board = board();
        let table = MinesTable::default();
        for (step, x) in [(1, 1), (2, 2)] {
            let Reveal::Safe { cleared_tiles, multiplier } = board.reveal(x, 0).unwrap() else {
                panic!("({},0) is safe", x);
            };
            assert_eq!(cleared_tiles, step);
            let expected =
                mines_multiplier(board.config(), step, &table.curve, table.house_edge).unwrap();
            assert_eq!(multiplier, expected);
        }
    }

    #[test]
    fn test_invalid_table_rejected_up_front() {
        let mut table = MinesTable::default();
        table.curve.bonus_factor = 0.0;
        let err = MinesBoard::with_positions(MinesConfig::new(3, 3, 3), table, &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCurve { field: "bonus_factor", .. }));

        let seeds = SeedPair::new(
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
            "client",
        );
        let table = MinesTable {
            house_edge: 1.0,
            ..MinesTable::default()
        };
        assert!(MinesBoard::from_round(&seeds, 0, MinesConfig::default(), table).is_err());
    }

    #[test]
    fn test_reveal_safe_tiles() {
        let mut board = board();
        match board.reveal(1, 0).unwrap() {
            Reveal::Safe { cleared_tiles, multiplier } => {
                assert_eq!(cleared_tiles, 1);
                assert!(multiplier > 0.0);
            }
            Reveal::Mine => panic!("(1,0) is safe"),
        }
        assert!(board.is_revealed(1, 0));
        assert_eq!(board.cleared_tiles(), 1);
        assert!(board.is_active());
    }

    #[test]
    fn test_hit_mine_ends_round() {
        let mut board = board();
        board.reveal(2, 2).unwrap();
        assert_eq!(board.reveal(0, 1).unwrap(), Reveal::Mine);
        assert!(!board.is_active());
        assert_eq!(board.reveal(1, 1), Err(MinesPlayError::RoundOver));
        assert_eq!(board.cash_out(1.0), Err(MinesPlayError::RoundOver));

        let play = board.play(1.0);
        assert!(play.hit_mine);
        assert_eq!(play.cleared_tiles, 1);
    }

    #[test]
    fn test_reveal_errors() {
        let mut board = board();
        assert_eq!(
            board.reveal(3, 0),
            Err(MinesPlayError::OutOfBounds { x: 3, y: 0, width: 3, height: 3 })
        );
        board.reveal(1, 1).unwrap();
        assert_eq!(
            board.reveal(1, 1),
            Err(MinesPlayError::AlreadyRevealed { x: 1, y: 1 })
        );
    }

    #[test]
    fn test_cash_out() {
        let mut board = board();
        assert_eq!(
            board.cash_out(5.0),
            Err(MinesPlayError::NothingRevealed { min: 1 })
        );
        board.reveal(1, 0).unwrap();
        board.reveal(2, 0).unwrap();
        let play = board.cash_out(5.0).unwrap();
        assert_eq!(
            play,
            MinesPlay {
                amount: 5.0,
                cleared_tiles: 2,
                hit_mine: false
            }
        );
        assert!(!board.is_active());
        assert_eq!(board.cash_out(5.0), Err(MinesPlayError::RoundOver));
    }

    #[test]
    fn test_clearing_every_safe_tile_ends_round() {
        let mut board = board();
        for y in 0..3 {
            for x in 1..3 {
                board.reveal(x, y).unwrap();
            }
        }
        assert_eq!(board.cleared_tiles(), 6);
        assert!(!board.is_active());
        assert!(board.cash_out(1.0).is_ok());
    }

    #[test]
    fn test_from_round_matches_derived_positions() {
        let seeds = SeedPair::new(
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
            "client",
        );
        let config = MinesConfig::new(5, 5, 5);
        let positions = mine_positions(&seeds, 4, &config).unwrap();
        let mut board = MinesBoard::from_round(&seeds, 4, config, MinesTable::default()).unwrap();
        let first = positions[0];
        assert_eq!(board.reveal(first.x, first.y).unwrap(), Reveal::Mine);
    }
}
