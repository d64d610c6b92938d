//! Provably-Fair Outcome Engine for Dice and Mines
//!
//! **Design Philosophy:**
//! Every round outcome is a pure function of `(server_seed, client_seed, nonce)`
//! plus the game's board configuration. The operator commits to the server seed
//! by publishing `sha256(server_seed)` before play and reveals the seed once it
//! is rotated out, so anyone can recompute past rounds without trusting the house.
//!
//! **Protocol:**
//! - Round message: `"{server_seed}:{client_seed}:{nonce}"`, hashed with SHA-256
//! - Float draw: first 4 digest bytes (big endian u32) divided by `0xFFFFFFFF`;
//!   the all-ones word maps to the largest float below 1, so draws stay in [0, 1)
//! - Dice: `float * 100`, in [0, 100)
//! - Mines: one draw per mine using `nonce + i`, removing from a shrinking cell list
//! - Result hash: SHA-256 of canonical JSON (see [`hash`])
//!
//! **House Edge:**
//! - Configured per table ([`TableConfig`]), 1% by default
//! - Dice multiplier: `(1 - edge) / win_chance`, exact hits always lose
//! - Mines multiplier: `(1 + 10 * cleared_fraction) * [1.5 bonus] * (1 - edge)`
//!
//! Nonce issuance is owned by the caller. This crate never stores or
//! increments nonces.

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod error;
pub mod game;
pub mod hash;
pub mod mines;
pub mod payout;
pub mod rng;
pub mod seed;
pub mod types;
pub mod verify;

pub use config::{DiceTable, MinesTable, TableConfig};
pub use error::{ConfigError, FairnessError, Result};
pub use game::{settle_dice, settle_mines};
pub use hash::{hash_server_seed, result_hash, sha256_hex};
pub use mines::{MinesBoard, MinesPlayError, Reveal};
pub use payout::{
    dice_multiplier, dice_multiplier_table, mines_multiplier, mines_multiplier_table,
    MinesPayoutCurve,
};
pub use rng::{derive_outcome, dice_roll, mine_positions};
pub use seed::{generate_client_seed, generate_server_seed, ActiveSeed, RevealedSeed, RotationPolicy};
pub use types::*;
pub use verify::{audit_batch, verify, verify_disclosure, AuditSummary, Claim, VerificationReport};
