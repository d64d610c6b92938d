use tracing::debug;

use crate::config::TableConfig;
use crate::error::Result;
use crate::hash::result_hash;
use crate::payout::{settle_dice_bet, settle_mines_play, validate_bet_amount, validate_target};
use crate::rng::{dice_roll, mine_positions};
use crate::types::{
    DiceBet, DiceSettlement, GameConfig, MinesConfig, MinesPlay, MinesSettlement, Outcome, SeedPair,
};

// =============================================================================
// MAIN GAME LOGIC
// =============================================================================
//
// Both entry points validate every input before hashing anything and return
// either a complete settlement or an error, never partial state. Persisting the
// round and issuing the next nonce is the caller's job.

/// Settle a dice bet for the round identified by `(seeds, nonce)`.
pub fn settle_dice(
    seeds: &SeedPair,
    nonce: u64,
    bet: &DiceBet,
    table: &TableConfig,
) -> Result<DiceSettlement> {
    // 1. Validate table and bet before touching the seeds
    table.validate()?;
    validate_bet_amount(bet.amount)?;
    validate_target(bet.target)?;

    // 2. Derive the roll
    let rolled_number = dice_roll(seeds, nonce)?;

    // 3. Settle
    let settlement = settle_dice_bet(rolled_number, bet, table.dice.house_edge)?;

    // 4. Audit trail
    let server_seed_hash = seeds.server_seed_hash();
    let result_hash = result_hash(
        &server_seed_hash,
        &seeds.client_seed,
        nonce,
        &GameConfig::Dice,
        &Outcome::Dice {
            roll: rolled_number,
        },
    )?;

    debug!(
        nonce,
        roll = rolled_number,
        target = bet.target,
        direction = %bet.direction,
        won = settlement.won,
        payout = settlement.payout,
        "dice round settled"
    );

    Ok(DiceSettlement {
        rolled_number,
        target: bet.target,
        direction: bet.direction,
        is_win: settlement.won,
        multiplier: settlement.multiplier,
        payout: settlement.payout,
        server_seed_hash,
        client_seed: seeds.client_seed.clone(),
        nonce,
        result_hash,
    })
}

/// Settle a finished mines round from what the player actually cleared.
pub fn settle_mines(
    seeds: &SeedPair,
    nonce: u64,
    board: &MinesConfig,
    play: &MinesPlay,
    table: &TableConfig,
) -> Result<MinesSettlement> {
    // 1. Validate table, board and play
    table.validate()?;
    let settlement = settle_mines_play(board, play, &table.mines.curve, table.mines.house_edge)?;

    // 2. Derive the board
    let mine_positions = mine_positions(seeds, nonce, board)?;

    // 3. Audit trail
    let server_seed_hash = seeds.server_seed_hash();
    let outcome = Outcome::Mines {
        positions: mine_positions.clone(),
    };
    let result_hash = result_hash(
        &server_seed_hash,
        &seeds.client_seed,
        nonce,
        &GameConfig::Mines(*board),
        &outcome,
    )?;

    debug!(
        nonce,
        cleared = play.cleared_tiles,
        hit_mine = play.hit_mine,
        won = settlement.won,
        payout = settlement.payout,
        "mines round settled"
    );

    Ok(MinesSettlement {
        board: *board,
        mine_positions,
        cleared_tiles: play.cleared_tiles,
        hit_mine: play.hit_mine,
        is_win: settlement.won,
        multiplier: settlement.multiplier,
        payout: settlement.payout,
        server_seed_hash,
        client_seed: seeds.client_seed.clone(),
        nonce,
        result_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, FairnessError};
    use crate::hash::hash_server_seed;
    use crate::types::RollDirection;

    const SERVER: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn seeds() -> SeedPair {
        SeedPair::new(SERVER, "client-seed")
    }

    #[test]
    fn test_settle_dice_consistent_with_roll() {
        let seeds = seeds();
        let bet = DiceBet {
            amount: 10.0,
            target: 50.0,
            direction: RollDirection::Under,
        };
        let result = settle_dice(&seeds, 1, &bet, &TableConfig::default()).unwrap();
        let roll = dice_roll(&seeds, 1).unwrap();
        assert_eq!(result.rolled_number, roll);
        assert_eq!(result.is_win, roll < 50.0);
        if result.is_win {
            assert_eq!(result.multiplier, 1.98);
            assert_eq!(result.payout, 19.8);
        } else {
            assert_eq!(result.payout, 0.0);
        }
        assert_eq!(result.server_seed_hash, hash_server_seed(SERVER));
        assert_eq!(result.result_hash.len(), 64);
    }

    #[test]
    fn test_settle_dice_validates_before_hashing() {
        let bad_seeds = SeedPair::new("nope", "client");
        let bet = DiceBet {
            amount: 10.0,
            target: 100.0,
            direction: RollDirection::Under,
        };
        // Target error wins over the malformed seed: config is checked first
        assert!(matches!(
            settle_dice(&bad_seeds, 1, &bet, &TableConfig::default()),
            Err(FairnessError::Config(ConfigError::TargetOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_house_edge_comes_from_table() {
        let bet = DiceBet {
            amount: 1.0,
            target: 99.99,
            direction: RollDirection::Under,
        };
        let table = TableConfig::with_house_edge(0.05).unwrap();
        // Find a nonce that wins so the multiplier is reported
        let result = (0..100)
            .map(|nonce| settle_dice(&seeds(), nonce, &bet, &table).unwrap())
            .find(|r| r.is_win)
            .unwrap();
        assert_eq!(result.multiplier, 0.9501);
    }

    #[test]
    fn test_settle_mines_cash_out() {
        let board = MinesConfig::new(5, 5, 5);
        let play = MinesPlay {
            amount: 10.0,
            cleared_tiles: 10,
            hit_mine: false,
        };
        let result = settle_mines(&seeds(), 7, &board, &play, &TableConfig::default()).unwrap();
        assert!(result.is_win);
        assert_eq!(result.multiplier, 8.91);
        assert_eq!(result.payout, 89.1);
        assert_eq!(result.mine_positions, mine_positions(&seeds(), 7, &board).unwrap());
    }

    #[test]
    fn test_settle_mines_bust() {
        let board = MinesConfig::new(5, 5, 5);
        let play = MinesPlay {
            amount: 10.0,
            cleared_tiles: 3,
            hit_mine: true,
        };
        let result = settle_mines(&seeds(), 7, &board, &play, &TableConfig::default()).unwrap();
        assert!(!result.is_win);
        assert_eq!(result.payout, 0.0);
    }

    #[test]
    fn test_settle_mines_rejects_full_board() {
        let board = MinesConfig::new(5, 5, 25);
        let play = MinesPlay {
            amount: 10.0,
            cleared_tiles: 0,
            hit_mine: true,
        };
        assert!(matches!(
            settle_mines(&seeds(), 7, &board, &play, &TableConfig::default()),
            Err(FairnessError::Config(ConfigError::InvalidMineCount { .. }))
        ));
    }

    #[test]
    fn test_disclosure_carries_commitment_only() {
        let bet = DiceBet {
            amount: 10.0,
            target: 50.0,
            direction: RollDirection::Over,
        };
        let result = settle_dice(&seeds(), 3, &bet, &TableConfig::default()).unwrap();
        let record = result.disclosure();
        assert_eq!(record.server_seed, None);
        assert_eq!(record.hashed_server_seed, hash_server_seed(SERVER));
        assert_eq!(record.result_hash, result.result_hash);
    }
}
