use candid::{CandidType, Deserialize};
use serde::Serialize;
use std::fmt;

use crate::error::ConfigError;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const SERVER_SEED_BYTES: usize = 32; // 64 hex chars
pub const CLIENT_SEED_BYTES: usize = 16; // 32 hex chars
pub const MAX_CLIENT_SEED_LEN: usize = 256; // DoS protection for user-supplied seeds
pub const DICE_RANGE: f64 = 100.0; // Rolls land in [0, 100)
pub const MIN_TARGET: f64 = 0.01; // Smallest win chance the 4-decimal multiplier can express
pub const MAX_TARGET: f64 = DICE_RANGE - MIN_TARGET;
pub const DEFAULT_HOUSE_EDGE: f64 = 0.01; // 1%
pub const MULTIPLIER_DECIMALS: i32 = 4;
pub const PAYOUT_DECIMALS: i32 = 2;
pub const MAX_BOARD_SIDE: u32 = 64;
pub const DEFAULT_BOARD_SIDE: u32 = 5; // 5x5
pub const DEFAULT_MINE_COUNT: u32 = 5;
pub const MIN_TILES_FOR_CASHOUT: u32 = 1;

// =============================================================================
// ENUMS
// =============================================================================

// Direction to predict
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollDirection {
    Over,  // Roll will be greater than target
    Under, // Roll will be less than target
}

impl fmt::Display for RollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollDirection::Over => f.write_str("over"),
            RollDirection::Under => f.write_str("under"),
        }
    }
}

// =============================================================================
// ROUND INPUT
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SeedPair {
    pub server_seed: String,
    pub client_seed: String,
}

/// Board layout for a mines round.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinesConfig {
    pub width: u32,
    pub height: u32,
    pub mine_count: u32,
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_SIDE,
            height: DEFAULT_BOARD_SIDE,
            mine_count: DEFAULT_MINE_COUNT,
        }
    }
}

impl MinesConfig {
    pub fn new(width: u32, height: u32, mine_count: u32) -> Self {
        Self { width, height, mine_count }
    }

    pub fn cell_count(&self) -> u32 {
        self.width * self.height
    }

    pub fn safe_tiles(&self) -> u32 {
        self.cell_count() - self.mine_count
    }

    /// Rejects empty or oversized boards and mine counts outside `1..cells`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_BOARD_SIDE
            || self.height > MAX_BOARD_SIDE
        {
            return Err(ConfigError::InvalidBoard {
                width: self.width,
                height: self.height,
                max: MAX_BOARD_SIDE,
            });
        }
        let cells = self.cell_count();
        if self.mine_count == 0 || self.mine_count >= cells {
            return Err(ConfigError::InvalidMineCount {
                mine_count: self.mine_count,
                cells,
            });
        }
        Ok(())
    }
}

// Dice needs nothing beyond the seeds; target and direction only matter at settlement
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameConfig {
    Dice,
    Mines(MinesConfig),
}

impl GameConfig {
    pub fn name(&self) -> &'static str {
        match self {
            GameConfig::Dice => "dice",
            GameConfig::Mines(_) => "mines",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            GameConfig::Dice => Ok(()),
            GameConfig::Mines(config) => config.validate(),
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct RoundInput {
    pub seeds: SeedPair,
    pub nonce: u64,
    pub game: GameConfig,
}

// =============================================================================
// OUTCOMES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn from_cell(cell: u32, width: u32) -> Self {
        Self {
            x: cell % width,
            y: cell / width,
        }
    }

    /// Row-major index; only for positions already known to be on a validated board.
    pub fn cell_index(&self, width: u32) -> u32 {
        self.y * width + self.x
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub enum Outcome {
    Dice { roll: f64 },
    // Draw order; canonical order (by cell index) is applied when hashing
    Mines { positions: Vec<Position> },
}

impl Outcome {
    pub fn game_name(&self) -> &'static str {
        match self {
            Outcome::Dice { .. } => "dice",
            Outcome::Mines { .. } => "mines",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Dice { roll } => write!(f, "roll {}", roll),
            Outcome::Mines { positions } => {
                let mut sorted = positions.clone();
                sorted.sort_by_key(|p| (p.y, p.x));
                let cells: Vec<String> = sorted.iter().map(Position::to_string).collect();
                write!(f, "mines [{}]", cells.join(" "))
            }
        }
    }
}

// =============================================================================
// BETS AND SETTLEMENT
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct DiceBet {
    pub amount: f64,
    pub target: f64,
    pub direction: RollDirection,
}

/// Result of actual play on a mines board, supplied by the caller.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MinesPlay {
    pub amount: f64,
    pub cleared_tiles: u32,
    pub hit_mine: bool,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Settlement {
    pub won: bool,
    pub multiplier: f64,
    pub payout: f64,
}

impl Settlement {
    pub fn loss() -> Self {
        Self {
            won: false,
            multiplier: 0.0,
            payout: 0.0,
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DiceSettlement {
    pub rolled_number: f64,
    pub target: f64,
    pub direction: RollDirection,
    pub is_win: bool,
    pub multiplier: f64,
    pub payout: f64,
    // Provably fair verification data
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub result_hash: String,
}

impl DiceSettlement {
    /// Disclosure record for this round; the server seed stays hidden until retired.
    pub fn disclosure(&self) -> DisclosureRecord {
        DisclosureRecord {
            hashed_server_seed: self.server_seed_hash.clone(),
            server_seed: None,
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            game: GameConfig::Dice,
            outcome: Outcome::Dice {
                roll: self.rolled_number,
            },
            result_hash: self.result_hash.clone(),
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MinesSettlement {
    pub board: MinesConfig,
    pub mine_positions: Vec<Position>,
    pub cleared_tiles: u32,
    pub hit_mine: bool,
    pub is_win: bool,
    pub multiplier: f64,
    pub payout: f64,
    // Provably fair verification data
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub result_hash: String,
}

impl MinesSettlement {
    pub fn disclosure(&self) -> DisclosureRecord {
        DisclosureRecord {
            hashed_server_seed: self.server_seed_hash.clone(),
            server_seed: None,
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            game: GameConfig::Mines(self.board),
            outcome: Outcome::Mines {
                positions: self.mine_positions.clone(),
            },
            result_hash: self.result_hash.clone(),
        }
    }
}

// =============================================================================
// DISCLOSURE
// =============================================================================

/// What a player or auditor needs to check a past round.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DisclosureRecord {
    pub hashed_server_seed: String,
    // None until the seed is retired
    pub server_seed: Option<String>,
    pub client_seed: String,
    pub nonce: u64,
    pub game: GameConfig,
    pub outcome: Outcome,
    pub result_hash: String,
}

impl DisclosureRecord {
    pub fn reveal(mut self, server_seed: impl Into<String>) -> Self {
        self.server_seed = Some(server_seed.into());
        self
    }
}
