use std::path::PathBuf;

use thiserror::Error;

/// Invalid game or table parameters. Raised before any hashing, never clamped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("board must be between 1x1 and {max}x{max} (got {width}x{height})")]
    InvalidBoard { width: u32, height: u32, max: u32 },
    #[error("mine_count must be at least 1 and less than {cells} cells (got {mine_count})")]
    InvalidMineCount { mine_count: u32, cells: u32 },
    #[error("target must be between 0.01 and 99.99 (got {target})")]
    TargetOutOfRange { target: f64 },
    #[error("house edge must be in [0, 1) (got {edge})")]
    InvalidHouseEdge { edge: f64 },
    #[error("bet amount must be positive and finite (got {amount})")]
    InvalidBetAmount { amount: f64 },
    #[error("cleared_tiles must be at most {safe_tiles} (got {cleared})")]
    ClearedTilesOutOfRange { cleared: u32, safe_tiles: u32 },
    #[error("must clear at least {min} tile(s) before cashing out")]
    NothingCleared { min: u32 },
    #[error("nonce {nonce} cannot cover {draws} draws without overflowing")]
    NonceOverflow { nonce: u64, draws: u32 },
    #[error("{field} must be positive and finite (got {value})")]
    InvalidCurve { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum FairnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("secure randomness unavailable")]
    Entropy(#[source] rand::Error),
    #[error("{field} is malformed: {reason}")]
    MalformedSeed { field: &'static str, reason: String },
    #[error("result hash must be 64 hex characters (got {value:?})")]
    MalformedHash { value: String },
    #[error("server seed has not been revealed yet")]
    SeedNotRevealed,
    #[error("{claimed} outcome supplied for a {expected} round")]
    GameMismatch {
        expected: &'static str,
        claimed: &'static str,
    },
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FairnessError>;
