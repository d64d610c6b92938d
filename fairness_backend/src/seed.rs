use std::fmt;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::info;

use crate::error::{FairnessError, Result};
use crate::hash::hash_server_seed;
use crate::types::{SeedPair, CLIENT_SEED_BYTES, MAX_CLIENT_SEED_LEN, SERVER_SEED_BYTES};

// =============================================================================
// CONSTANTS
// =============================================================================

pub const SEED_ROTATION_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes
pub const MAX_ROUNDS_PER_SEED: u64 = 10_000; // Rotate after 10k rounds

// =============================================================================
// GENERATION
// =============================================================================

// OS CSPRNG only; a failure here is fatal, there is no weaker fallback
fn random_hex(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(FairnessError::Entropy)?;
    Ok(hex::encode(bytes))
}

/// 32 bytes of secure randomness, hex encoded (64 chars).
pub fn generate_server_seed() -> Result<String> {
    random_hex(SERVER_SEED_BYTES)
}

/// 16 bytes of secure randomness, hex encoded (32 chars).
pub fn generate_client_seed() -> Result<String> {
    random_hex(CLIENT_SEED_BYTES)
}

// =============================================================================
// VALIDATION
// =============================================================================

pub fn validate_server_seed(server_seed: &str) -> Result<()> {
    let expected = SERVER_SEED_BYTES * 2;
    if server_seed.len() != expected {
        return Err(FairnessError::MalformedSeed {
            field: "server_seed",
            reason: format!("expected {} hex characters, got {}", expected, server_seed.len()),
        });
    }
    if !server_seed.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FairnessError::MalformedSeed {
            field: "server_seed",
            reason: "contains non-hex characters".to_string(),
        });
    }
    Ok(())
}

// Client seeds may be anything the player picks, within length bounds
pub fn validate_client_seed(client_seed: &str) -> Result<()> {
    if client_seed.is_empty() {
        return Err(FairnessError::MalformedSeed {
            field: "client_seed",
            reason: "must not be empty".to_string(),
        });
    }
    if client_seed.len() > MAX_CLIENT_SEED_LEN {
        return Err(FairnessError::MalformedSeed {
            field: "client_seed",
            reason: format!("too long (max {} bytes)", MAX_CLIENT_SEED_LEN),
        });
    }
    Ok(())
}

impl SeedPair {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
        }
    }

    pub fn generate() -> Result<Self> {
        Ok(Self::new(generate_server_seed()?, generate_client_seed()?))
    }

    /// Replace the generated client seed with one the player picked.
    pub fn with_client_seed(self, client_seed: impl Into<String>) -> Result<Self> {
        let client_seed = client_seed.into();
        validate_client_seed(&client_seed)?;
        Ok(Self {
            server_seed: self.server_seed,
            client_seed,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_server_seed(&self.server_seed)?;
        validate_client_seed(&self.client_seed)
    }

    pub fn server_seed_hash(&self) -> String {
        hash_server_seed(&self.server_seed)
    }
}

// =============================================================================
// COMMITMENT LIFECYCLE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_rounds: u64,
    pub max_age: Duration,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS_PER_SEED,
            max_age: SEED_ROTATION_INTERVAL,
        }
    }
}

impl RotationPolicy {
    // Rotate if: too many rounds OR too much time
    pub fn should_rotate(&self, rounds_used: u64, age: Duration) -> bool {
        rounds_used >= self.max_rounds || age >= self.max_age
    }
}

/// A committed server seed that is still in play.
///
/// The seed cannot be replaced once its commitment exists; the only way to
/// get at the secret is [`ActiveSeed::retire`], which consumes the seed.
pub struct ActiveSeed {
    server_seed: String,
    commitment: String,
}

impl ActiveSeed {
    pub fn new(server_seed: impl Into<String>) -> Result<Self> {
        let server_seed = server_seed.into();
        validate_server_seed(&server_seed)?;
        let commitment = hash_server_seed(&server_seed);
        info!(commitment = %commitment, "server seed committed");
        Ok(Self {
            server_seed,
            commitment,
        })
    }

    pub fn generate() -> Result<Self> {
        Self::new(generate_server_seed()?)
    }

    /// `sha256(server_seed)`, safe to publish before play.
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// Seed pair for settling rounds against this commitment.
    pub fn pair_with(&self, client_seed: impl Into<String>) -> Result<SeedPair> {
        let client_seed = client_seed.into();
        validate_client_seed(&client_seed)?;
        Ok(SeedPair::new(self.server_seed.clone(), client_seed))
    }

    pub fn retire(self) -> RevealedSeed {
        info!(commitment = %self.commitment, "server seed retired and revealed");
        RevealedSeed {
            server_seed: self.server_seed,
            commitment: self.commitment,
        }
    }
}

impl fmt::Debug for ActiveSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSeed")
            .field("server_seed", &"<redacted>")
            .field("commitment", &self.commitment)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealedSeed {
    server_seed: String,
    commitment: String,
}

impl RevealedSeed {
    pub fn server_seed(&self) -> &str {
        &self.server_seed
    }

    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    pub fn matches_commitment(&self) -> bool {
        hash_server_seed(&self.server_seed) == self.commitment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn test_generated_seed_lengths() {
        let server = generate_server_seed().unwrap();
        let client = generate_client_seed().unwrap();
        assert_eq!(server.len(), 64);
        assert_eq!(client.len(), 32);
        assert!(server.bytes().all(|b| b.is_ascii_hexdigit()));
        assert!(client.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_seeds_differ() {
        let a = SeedPair::generate().unwrap();
        let b = SeedPair::generate().unwrap();
        assert_ne!(a.server_seed, b.server_seed);
        assert_ne!(a.client_seed, b.client_seed);
    }

    #[test]
    fn test_server_seed_validation() {
        assert!(validate_server_seed(SERVER).is_ok());
        assert!(validate_server_seed(&SERVER.to_uppercase()).is_ok());
        assert!(matches!(
            validate_server_seed("abc"),
            Err(FairnessError::MalformedSeed { field: "server_seed", .. })
        ));
        let bad = format!("{}zz", &SERVER[..62]);
        assert!(matches!(
            validate_server_seed(&bad),
            Err(FairnessError::MalformedSeed { field: "server_seed", .. })
        ));
    }

    #[test]
    fn test_client_seed_validation() {
        assert!(validate_client_seed("lucky-seven").is_ok());
        assert!(validate_client_seed("").is_err());
        assert!(validate_client_seed(&"a".repeat(MAX_CLIENT_SEED_LEN)).is_ok());
        assert!(validate_client_seed(&"a".repeat(MAX_CLIENT_SEED_LEN + 1)).is_err());
    }

    #[test]
    fn test_player_supplied_client_seed() {
        let pair = SeedPair::generate().unwrap().with_client_seed("my own seed").unwrap();
        assert_eq!(pair.client_seed, "my own seed");
        assert!(pair.validate().is_ok());
    }

    #[test]
    fn test_rotation_policy() {
        let policy = RotationPolicy::default();
        assert!(!policy.should_rotate(0, Duration::ZERO));
        assert!(!policy.should_rotate(MAX_ROUNDS_PER_SEED - 1, Duration::from_secs(299)));
        assert!(policy.should_rotate(MAX_ROUNDS_PER_SEED, Duration::ZERO));
        assert!(policy.should_rotate(1, SEED_ROTATION_INTERVAL));
    }

    #[test]
    fn test_commit_then_reveal() {
        let active = ActiveSeed::new(SERVER).unwrap();
        let commitment = active.commitment().to_string();
        assert_eq!(commitment, hash_server_seed(SERVER));

        let pair = active.pair_with("client").unwrap();
        assert_eq!(pair.server_seed, SERVER);

        let revealed = active.retire();
        assert_eq!(revealed.server_seed(), SERVER);
        assert_eq!(revealed.commitment(), commitment);
        assert!(revealed.matches_commitment());
    }

    #[test]
    fn test_active_seed_debug_is_redacted() {
        let active = ActiveSeed::new(SERVER).unwrap();
        let printed = format!("{:?}", active);
        assert!(!printed.contains(SERVER));
        assert!(printed.contains("<redacted>"));
    }
}
