use candid::{CandidType, Deserialize};
use serde::Serialize;

use crate::error::ConfigError;
use crate::types::{
    DiceBet, MinesConfig, MinesPlay, RollDirection, Settlement, DICE_RANGE, MAX_TARGET, MIN_TARGET,
    MIN_TILES_FOR_CASHOUT, MULTIPLIER_DECIMALS, PAYOUT_DECIMALS,
};

// =============================================================================
// CONSTANTS
// =============================================================================

// Mines payout curve, tunable per table
pub const DEFAULT_CLEARED_WEIGHT: f64 = 10.0; // 1 + 10x cleared fraction
pub const DEFAULT_BONUS_FACTOR: f64 = 1.5; // once cleared tiles exceed mine count
// Only used for display previews; settlement always takes real cleared tiles
pub const REFERENCE_CLEARED_FRACTION: f64 = 0.5;

// =============================================================================
// ROUNDING AND VALIDATION
// =============================================================================

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round_multiplier(value: f64) -> f64 {
    round_to(value, MULTIPLIER_DECIMALS)
}

pub fn round_payout(value: f64) -> f64 {
    round_to(value, PAYOUT_DECIMALS)
}

pub fn validate_house_edge(edge: f64) -> Result<(), ConfigError> {
    if !edge.is_finite() || !(0.0..1.0).contains(&edge) {
        return Err(ConfigError::InvalidHouseEdge { edge });
    }
    Ok(())
}

// Keeps the win chance at 0.01% or more either way, so multipliers stay finite
pub fn validate_target(target: f64) -> Result<(), ConfigError> {
    if !target.is_finite() || !(MIN_TARGET..=MAX_TARGET).contains(&target) {
        return Err(ConfigError::TargetOutOfRange { target });
    }
    Ok(())
}

pub fn validate_bet_amount(amount: f64) -> Result<(), ConfigError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ConfigError::InvalidBetAmount { amount });
    }
    Ok(())
}

// =============================================================================
// DICE
// =============================================================================

// Win chance as a fraction: Under wins on [0, target), Over on (target, 100)
pub fn win_chance(target: f64, direction: RollDirection) -> Result<f64, ConfigError> {
    validate_target(target)?;
    let chance = match direction {
        RollDirection::Under => target / DICE_RANGE,
        RollDirection::Over => (DICE_RANGE - target) / DICE_RANGE,
    };
    Ok(chance)
}

/// `(1 - edge) / win_chance`, rounded to 4 decimal places.
pub fn dice_multiplier(
    target: f64,
    direction: RollDirection,
    house_edge: f64,
) -> Result<f64, ConfigError> {
    validate_house_edge(house_edge)?;
    let chance = win_chance(target, direction)?;
    Ok(round_multiplier((1.0 - house_edge) / chance))
}

// Exact hit on the target is always a loss
pub fn is_dice_win(roll: f64, target: f64, direction: RollDirection) -> bool {
    match direction {
        RollDirection::Under => roll < target,
        RollDirection::Over => roll > target,
    }
}

pub fn settle_dice_bet(roll: f64, bet: &DiceBet, house_edge: f64) -> Result<Settlement, ConfigError> {
    validate_bet_amount(bet.amount)?;
    let multiplier = dice_multiplier(bet.target, bet.direction, house_edge)?;

    if !is_dice_win(roll, bet.target, bet.direction) {
        return Ok(Settlement::loss());
    }
    Ok(Settlement {
        won: true,
        multiplier,
        payout: round_payout(bet.amount * multiplier),
    })
}

// =============================================================================
// MINES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MinesPayoutCurve {
    pub cleared_weight: f64,
    pub bonus_factor: f64,
}

impl Default for MinesPayoutCurve {
    fn default() -> Self {
        Self {
            cleared_weight: DEFAULT_CLEARED_WEIGHT,
            bonus_factor: DEFAULT_BONUS_FACTOR,
        }
    }
}

impl MinesPayoutCurve {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cleared_weight.is_finite() || self.cleared_weight <= 0.0 {
            return Err(ConfigError::InvalidCurve {
                field: "cleared_weight",
                value: self.cleared_weight,
            });
        }
        if !self.bonus_factor.is_finite() || self.bonus_factor <= 0.0 {
            return Err(ConfigError::InvalidCurve {
                field: "bonus_factor",
                value: self.bonus_factor,
            });
        }
        Ok(())
    }

    /// Multiplier shown before play, assuming half the safe tiles get cleared.
    pub fn reference_multiplier(&self, board: &MinesConfig, house_edge: f64) -> Result<f64, ConfigError> {
        board.validate()?;
        let assumed = (board.safe_tiles() as f64 * REFERENCE_CLEARED_FRACTION).floor() as u32;
        mines_multiplier(board, assumed, self, house_edge)
    }
}

/// Cash-out multiplier after clearing `cleared_tiles` safe tiles.
pub fn mines_multiplier(
    board: &MinesConfig,
    cleared_tiles: u32,
    curve: &MinesPayoutCurve,
    house_edge: f64,
) -> Result<f64, ConfigError> {
    board.validate()?;
    curve.validate()?;
    validate_house_edge(house_edge)?;

    let safe_tiles = board.safe_tiles();
    if cleared_tiles > safe_tiles {
        return Err(ConfigError::ClearedTilesOutOfRange {
            cleared: cleared_tiles,
            safe_tiles,
        });
    }

    let cleared_fraction = cleared_tiles as f64 / safe_tiles as f64;
    let mut multiplier = 1.0 + curve.cleared_weight * cleared_fraction;
    if cleared_tiles > board.mine_count {
        multiplier *= curve.bonus_factor;
    }
    Ok(round_multiplier(multiplier * (1.0 - house_edge)))
}

pub fn settle_mines_play(
    board: &MinesConfig,
    play: &MinesPlay,
    curve: &MinesPayoutCurve,
    house_edge: f64,
) -> Result<Settlement, ConfigError> {
    validate_bet_amount(play.amount)?;
    // Validates board, curve, edge and the cleared count even on a bust
    let multiplier = mines_multiplier(board, play.cleared_tiles, curve, house_edge)?;

    if play.hit_mine {
        return Ok(Settlement::loss());
    }
    if play.cleared_tiles < MIN_TILES_FOR_CASHOUT {
        return Err(ConfigError::NothingCleared {
            min: MIN_TILES_FOR_CASHOUT,
        });
    }
    Ok(Settlement {
        won: true,
        multiplier,
        payout: round_payout(play.amount * multiplier),
    })
}

// =============================================================================
// LOOKUP TABLES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DiceTableRow {
    pub target: u32,
    pub win_chance: f64,
    pub under_multiplier: f64,
    pub over_multiplier: f64,
}

// Get multiplier table for frontend display, integer targets 1..=99
pub fn dice_multiplier_table(house_edge: f64) -> Result<Vec<DiceTableRow>, ConfigError> {
    (1..DICE_RANGE as u32)
        .map(|target| {
            let t = target as f64;
            Ok(DiceTableRow {
                target,
                win_chance: round_multiplier(win_chance(t, RollDirection::Under)?),
                under_multiplier: dice_multiplier(t, RollDirection::Under, house_edge)?,
                over_multiplier: dice_multiplier(t, RollDirection::Over, house_edge)?,
            })
        })
        .collect()
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MinesTableRow {
    pub cleared_tiles: u32,
    pub multiplier: f64,
}

pub fn mines_multiplier_table(
    board: &MinesConfig,
    curve: &MinesPayoutCurve,
    house_edge: f64,
) -> Result<Vec<MinesTableRow>, ConfigError> {
    board.validate()?;
    (1..=board.safe_tiles())
        .map(|cleared_tiles| {
            Ok(MinesTableRow {
                cleared_tiles,
                multiplier: mines_multiplier(board, cleared_tiles, curve, house_edge)?,
            })
        })
        .collect()
}
