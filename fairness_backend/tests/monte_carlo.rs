//! Distribution Tests
//!
//! These tests check that hash-derived outcomes are uniform over their
//! outcome space and that the configured house edge is what players actually
//! pay over many rounds.

use fairness_backend::payout::settle_dice_bet;
use fairness_backend::{dice_roll, mine_positions, DiceBet, MinesConfig, RollDirection, SeedPair};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TRIALS: u64 = 100_000;
const DECILES: usize = 10;
// Chi-square critical value for 9 degrees of freedom at p = 0.001
const CHI_SQUARE_CRITICAL_9DF: f64 = 27.877;

fn random_seeds(rng: &mut ChaCha8Rng) -> SeedPair {
    let server: [u8; 32] = rng.gen();
    let client: [u8; 16] = rng.gen();
    SeedPair::new(hex::encode(server), hex::encode(client))
}

#[test]
fn test_dice_deciles_chi_square() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let seeds = random_seeds(&mut rng);

    let mut counts = [0u64; DECILES];
    for nonce in 0..TRIALS {
        let roll = dice_roll(&seeds, nonce).unwrap();
        assert!((0.0..100.0).contains(&roll));
        counts[(roll / 10.0) as usize] += 1;
    }

    let expected = TRIALS as f64 / DECILES as f64;
    let chi_square: f64 = counts
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    println!("Decile counts: {:?}", counts);
    println!("Chi-square: {:.3}", chi_square);
    assert!(
        chi_square < CHI_SQUARE_CRITICAL_9DF,
        "dice rolls not uniform: chi-square {} over {:?}",
        chi_square,
        counts
    );
}

#[test]
fn test_dice_return_to_player() {
    // Even-money bets over 100k rounds should return ~99% of stake
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let seeds = random_seeds(&mut rng);
    let bet = DiceBet {
        amount: 1.0,
        target: 50.0,
        direction: RollDirection::Under,
    };

    let total_paid: f64 = (0..TRIALS)
        .map(|nonce| {
            let roll = dice_roll(&seeds, nonce).unwrap();
            settle_dice_bet(roll, &bet, 0.01).unwrap().payout
        })
        .sum();
    let rtp = total_paid / TRIALS as f64;

    println!("Observed RTP: {:.4}", rtp);
    // Std dev of the mean is ~0.0031 here; allow about 5 sigma
    assert!((rtp - 0.99).abs() < 0.016, "RTP {} too far from 0.99", rtp);
}

#[test]
fn test_mine_cells_equally_likely() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let seeds = random_seeds(&mut rng);
    let config = MinesConfig::new(5, 5, 5);
    let rounds = 20_000u64;

    let mut hits = [0u64; 25];
    // Step the nonce by mine_count so rounds never share a draw
    for round in 0..rounds {
        let nonce = round * config.mine_count as u64;
        for p in mine_positions(&seeds, nonce, &config).unwrap() {
            hits[p.cell_index(config.width) as usize] += 1;
        }
    }

    // Each cell holds a mine with probability 5/25
    for (cell, &count) in hits.iter().enumerate() {
        let frequency = count as f64 / rounds as f64;
        assert!(
            (frequency - 0.2).abs() < 0.02,
            "cell {} mined in {:.4} of rounds",
            cell,
            frequency
        );
    }
}
