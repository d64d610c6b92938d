use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::{GameConfig, MinesConfig, Outcome, Position, RoundInput, SeedPair, DICE_RANGE};

const FLOAT_DIVISOR: f64 = u32::MAX as f64;
// Largest f64 below 1.0; only an all-ones first word lands here
const MAX_UNIT_FLOAT: f64 = 1.0 - f64::EPSILON / 2.0;

// =============================================================================
// RAW DRAWS
// =============================================================================

pub fn round_message(server_seed: &str, client_seed: &str, nonce: u64) -> String {
    format!("{}:{}:{}", server_seed, client_seed, nonce)
}

pub fn round_digest(server_seed: &str, client_seed: &str, nonce: u64) -> [u8; 32] {
    Sha256::digest(round_message(server_seed, client_seed, nonce).as_bytes()).into()
}

/// First 8 hex characters of the digest as a big-endian u32, divided by
/// `0xFFFFFFFF`.
///
/// The single value `0xFFFFFFFF` would give exactly 1.0 and is mapped to the
/// largest float below 1.0 instead, so results always stay in [0, 1).
pub fn float_from_digest(digest: &[u8; 32]) -> f64 {
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    if value == u32::MAX {
        return MAX_UNIT_FLOAT;
    }
    value as f64 / FLOAT_DIVISOR
}

pub fn round_float(seeds: &SeedPair, nonce: u64) -> f64 {
    float_from_digest(&round_digest(&seeds.server_seed, &seeds.client_seed, nonce))
}

// =============================================================================
// GAME OUTCOMES
// =============================================================================

/// Dice roll in [0, 100). A roll of exactly 100 is impossible.
pub fn dice_roll(seeds: &SeedPair, nonce: u64) -> Result<f64> {
    seeds.validate()?;
    let roll = round_float(seeds, nonce) * DICE_RANGE;
    debug!(nonce, roll, "dice roll derived");
    Ok(roll)
}

/// Unique mine positions in draw order.
///
/// Mine `i` is drawn from `nonce + i`, picking `floor(f * remaining)` out of the
/// cells not yet mined. Removal keeps the remaining cells in ascending order,
/// which every verifier must reproduce.
pub fn mine_positions(seeds: &SeedPair, nonce: u64, config: &MinesConfig) -> Result<Vec<Position>> {
    config.validate()?;
    // Last draw uses nonce + mine_count - 1
    nonce
        .checked_add(config.mine_count as u64 - 1)
        .ok_or(ConfigError::NonceOverflow {
            nonce,
            draws: config.mine_count,
        })?;
    seeds.validate()?;

    let mut available: Vec<u32> = (0..config.cell_count()).collect();
    let mut positions = Vec::with_capacity(config.mine_count as usize);

    for i in 0..config.mine_count as u64 {
        let random = round_float(seeds, nonce + i);
        // random < 1, so the product stays below the pool size
        let index = ((random * available.len() as f64).floor() as usize).min(available.len() - 1);
        let cell = available.remove(index);
        positions.push(Position::from_cell(cell, config.width));
    }

    debug!(
        nonce,
        width = config.width,
        height = config.height,
        mines = config.mine_count,
        "mine positions derived"
    );
    Ok(positions)
}

pub fn derive_outcome(input: &RoundInput) -> Result<Outcome> {
    match &input.game {
        GameConfig::Dice => Ok(Outcome::Dice {
            roll: dice_roll(&input.seeds, input.nonce)?,
        }),
        GameConfig::Mines(config) => Ok(Outcome::Mines {
            positions: mine_positions(&input.seeds, input.nonce, config)?,
        }),
    }
}
