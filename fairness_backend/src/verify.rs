//! Independent verification of past rounds.
//!
//! Nothing here touches operator state: a report is recomputed from the
//! revealed seeds, the nonce and the board alone. A mismatch is an ordinary
//! `Ok(report)` with `matched == false`; errors mean the inputs themselves
//! were malformed.

use std::fmt;

use candid::{CandidType, Deserialize};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FairnessError, Result};
use crate::hash::{hash_server_seed, is_sha256_hex, result_hash};
use crate::rng::derive_outcome;
use crate::types::{DisclosureRecord, GameConfig, Outcome, RoundInput, SeedPair};

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub enum Claim {
    Outcome(Outcome),
    ResultHash(String),
    OutcomeAndHash { outcome: Outcome, result_hash: String },
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct VerificationReport {
    pub matched: bool,
    pub claim: Claim,
    pub recomputed_outcome: Outcome,
    pub recomputed_hash: String,
    pub server_seed_hash: String,
    // Only set when a published commitment was checked
    pub commitment_matched: Option<bool>,
}

// Mine positions are a set; draw order is not part of the claim
fn outcomes_match(claimed: &Outcome, recomputed: &Outcome) -> bool {
    match (claimed, recomputed) {
        (Outcome::Dice { roll: a }, Outcome::Dice { roll: b }) => a.to_bits() == b.to_bits(),
        (Outcome::Mines { positions: a }, Outcome::Mines { positions: b }) => {
            let mut a = a.clone();
            let mut b = b.clone();
            a.sort();
            b.sort();
            a == b
        }
        _ => false,
    }
}

fn hashes_match(claimed: &str, recomputed: &str) -> bool {
    claimed.eq_ignore_ascii_case(recomputed)
}

fn check_claim(game: &GameConfig, claim: &Claim) -> Result<()> {
    let (outcome, hash) = match claim {
        Claim::Outcome(outcome) => (Some(outcome), None),
        Claim::ResultHash(hash) => (None, Some(hash)),
        Claim::OutcomeAndHash {
            outcome,
            result_hash,
        } => (Some(outcome), Some(result_hash)),
    };
    if let Some(outcome) = outcome {
        if outcome.game_name() != game.name() {
            return Err(FairnessError::GameMismatch {
                expected: game.name(),
                claimed: outcome.game_name(),
            });
        }
    }
    if let Some(hash) = hash {
        if !is_sha256_hex(hash) {
            return Err(FairnessError::MalformedHash {
                value: hash.clone(),
            });
        }
    }
    Ok(())
}

/// Recompute a round from its revealed inputs and compare against a claim.
pub fn verify(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    game: &GameConfig,
    claim: Claim,
) -> Result<VerificationReport> {
    let input = RoundInput {
        seeds: SeedPair::new(server_seed, client_seed),
        nonce,
        game: *game,
    };
    verify_round(&input, claim)
}

pub fn verify_round(input: &RoundInput, claim: Claim) -> Result<VerificationReport> {
    input.game.validate()?;
    input.seeds.validate()?;
    check_claim(&input.game, &claim)?;

    let recomputed_outcome = derive_outcome(input)?;
    let server_seed_hash = input.seeds.server_seed_hash();
    let recomputed_hash = result_hash(
        &server_seed_hash,
        &input.seeds.client_seed,
        input.nonce,
        &input.game,
        &recomputed_outcome,
    )?;

    let matched = match &claim {
        Claim::Outcome(outcome) => outcomes_match(outcome, &recomputed_outcome),
        Claim::ResultHash(hash) => hashes_match(hash, &recomputed_hash),
        Claim::OutcomeAndHash {
            outcome,
            result_hash,
        } => {
            outcomes_match(outcome, &recomputed_outcome)
                && hashes_match(result_hash, &recomputed_hash)
        }
    };

    let report = VerificationReport {
        matched,
        claim,
        recomputed_outcome,
        recomputed_hash,
        server_seed_hash,
        commitment_matched: None,
    };
    log_report(input.nonce, &report);
    Ok(report)
}

/// Check a disclosed round end to end: commitment, outcome and result hash.
pub fn verify_disclosure(record: &DisclosureRecord) -> Result<VerificationReport> {
    let server_seed = record
        .server_seed
        .as_deref()
        .ok_or(FairnessError::SeedNotRevealed)?;
    if !is_sha256_hex(&record.hashed_server_seed) {
        return Err(FairnessError::MalformedHash {
            value: record.hashed_server_seed.clone(),
        });
    }

    let claim = Claim::OutcomeAndHash {
        outcome: record.outcome.clone(),
        result_hash: record.result_hash.clone(),
    };
    let input = RoundInput {
        seeds: SeedPair::new(server_seed, record.client_seed.clone()),
        nonce: record.nonce,
        game: record.game,
    };
    let mut report = verify_round(&input, claim)?;

    let commitment_matched = hashes_match(&record.hashed_server_seed, &hash_server_seed(server_seed));
    report.commitment_matched = Some(commitment_matched);
    report.matched &= commitment_matched;
    if !commitment_matched {
        warn!(
            nonce = record.nonce,
            published = %record.hashed_server_seed,
            recomputed = %report.server_seed_hash,
            "revealed server seed does not match its commitment"
        );
    }
    Ok(report)
}

/// Verify many disclosed rounds in parallel, one result per record.
pub fn audit_batch(records: &[DisclosureRecord]) -> Vec<Result<VerificationReport>> {
    records.par_iter().map(verify_disclosure).collect()
}

fn log_report(nonce: u64, report: &VerificationReport) {
    if report.matched {
        debug!(nonce, "round verified");
    } else {
        warn!(
            nonce,
            recomputed_outcome = %report.recomputed_outcome,
            recomputed_hash = %report.recomputed_hash,
            "verification mismatch"
        );
    }
}

// =============================================================================
// REPORTING
// =============================================================================

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "verdict:            {}", if self.matched { "MATCH" } else { "MISMATCH" })?;
        writeln!(f, "server seed hash:   {}", self.server_seed_hash)?;
        if let Some(commitment_matched) = self.commitment_matched {
            writeln!(
                f,
                "commitment:         {}",
                if commitment_matched { "ok" } else { "does not match revealed seed" }
            )?;
        }
        match &self.claim {
            Claim::Outcome(outcome) => {
                writeln!(f, "claimed outcome:    {}", outcome)?;
                writeln!(f, "recomputed outcome: {}", self.recomputed_outcome)?;
            }
            Claim::ResultHash(hash) => {
                writeln!(f, "claimed hash:       {}", hash)?;
                writeln!(f, "recomputed hash:    {}", self.recomputed_hash)?;
            }
            Claim::OutcomeAndHash {
                outcome,
                result_hash,
            } => {
                writeln!(f, "claimed outcome:    {}", outcome)?;
                writeln!(f, "recomputed outcome: {}", self.recomputed_outcome)?;
                writeln!(f, "claimed hash:       {}", result_hash)?;
                writeln!(f, "recomputed hash:    {}", self.recomputed_hash)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub errors: usize,
}

impl AuditSummary {
    pub fn from_results(results: &[Result<VerificationReport>]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut summary, result| {
                match result {
                    Ok(report) if report.matched => summary.matched += 1,
                    Ok(_) => summary.mismatched += 1,
                    Err(_) => summary.errors += 1,
                }
                summary
            },
        )
    }

    pub fn all_matched(&self) -> bool {
        self.matched == self.total
    }
}
