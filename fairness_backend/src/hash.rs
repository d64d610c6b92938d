//! Commitment and result hashing.
//!
//! Result hashes cover the canonical JSON encoding of a round's outcome. The
//! encoding is part of the protocol and must be reproduced exactly by any
//! independent verifier:
//!
//! ```text
//! dice:  {"game":"dice","hashedServerSeed":"..","clientSeed":"..","nonce":7,"roll":42.17}
//! mines: {"game":"mines","hashedServerSeed":"..","clientSeed":"..","nonce":7,
//!         "width":5,"height":5,"mineCount":5,"minePositions":[{"x":0,"y":1},..]}
//! ```
//!
//! Fields appear in exactly this order with no whitespace. Numbers use the
//! shortest representation that round-trips. Mine positions are sorted by row
//! then column, which is cell index order (`y * width + x`) on the board,
//! regardless of draw order. Bet parameters are not hashed, so a verifier only
//! needs the seeds, nonce and board.
//!
//! The dice `roll` is the float draw times 100, where the draw is the first
//! four digest bytes divided by `0xFFFFFFFF` (see [`crate::rng`]). An all-ones
//! first word is the one exception: it maps to the largest float below 1.0, so
//! a roll of exactly 100 never appears in a hash.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{FairnessError, Result};
use crate::types::{GameConfig, Outcome, Position};

pub fn sha256_hex(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}

/// The commitment published before play.
pub fn hash_server_seed(server_seed: &str) -> String {
    sha256_hex(server_seed)
}

pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiceResultPayload<'a> {
    game: &'static str,
    hashed_server_seed: &'a str,
    client_seed: &'a str,
    nonce: u64,
    roll: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MinesResultPayload<'a> {
    game: &'static str,
    hashed_server_seed: &'a str,
    client_seed: &'a str,
    nonce: u64,
    width: u32,
    height: u32,
    mine_count: u32,
    mine_positions: Vec<Position>,
}

pub fn canonical_result_json(
    hashed_server_seed: &str,
    client_seed: &str,
    nonce: u64,
    game: &GameConfig,
    outcome: &Outcome,
) -> Result<String> {
    let json = match (game, outcome) {
        (GameConfig::Dice, Outcome::Dice { roll }) => serde_json::to_string(&DiceResultPayload {
            game: "dice",
            hashed_server_seed,
            client_seed,
            nonce,
            roll: *roll,
        })?,
        (GameConfig::Mines(board), Outcome::Mines { positions }) => {
            let mut mine_positions = positions.clone();
            mine_positions.sort_by_key(|p| (p.y, p.x));
            serde_json::to_string(&MinesResultPayload {
                game: "mines",
                hashed_server_seed,
                client_seed,
                nonce,
                width: board.width,
                height: board.height,
                mine_count: board.mine_count,
                mine_positions,
            })?
        }
        _ => {
            return Err(FairnessError::GameMismatch {
                expected: game.name(),
                claimed: outcome.game_name(),
            })
        }
    };
    Ok(json)
}

/// SHA-256 of the canonical JSON for a settled round.
pub fn result_hash(
    hashed_server_seed: &str,
    client_seed: &str,
    nonce: u64,
    game: &GameConfig,
    outcome: &Outcome,
) -> Result<String> {
    let json = canonical_result_json(hashed_server_seed, client_seed, nonce, game, outcome)?;
    Ok(sha256_hex(&json))
}
