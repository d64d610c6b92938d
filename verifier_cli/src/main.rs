use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fairness_backend::{
    audit_batch, dice_multiplier_table, dice_roll, hash_server_seed, mine_positions,
    mines_multiplier_table, result_hash, verify, AuditSummary, Claim, DisclosureRecord, GameConfig,
    MinesConfig, Outcome, Position, SeedPair, TableConfig, DEFAULT_BOARD_SIDE, DEFAULT_MINE_COUNT,
};
use serde_json::json;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "fair-verify", about = "Recompute and audit provably fair dice and mines rounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Table config JSON (house edge, mines curve); defaults to a 1% edge
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,
}

#[derive(Args, Debug)]
struct RoundArgs {
    #[arg(long)]
    server_seed: String,
    #[arg(long)]
    client_seed: String,
    #[arg(long)]
    nonce: u64,
}

impl RoundArgs {
    fn seeds(&self) -> SeedPair {
        SeedPair::new(self.server_seed.clone(), self.client_seed.clone())
    }
}

#[derive(Args, Debug)]
struct BoardArgs {
    #[arg(long, default_value_t = DEFAULT_BOARD_SIDE)]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_BOARD_SIDE)]
    height: u32,
    #[arg(long, default_value_t = DEFAULT_MINE_COUNT)]
    mines: u32,
}

impl BoardArgs {
    fn config(&self) -> MinesConfig {
        MinesConfig::new(self.width, self.height, self.mines)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TableKind {
    Dice,
    Mines,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a fresh seed pair and the commitment to publish
    Seed {
        /// Use this client seed instead of a random one
        #[arg(long)]
        client_seed: Option<String>,
    },
    /// Derive a dice roll
    Roll {
        #[command(flatten)]
        round: RoundArgs,
    },
    /// Derive mine positions
    Mines {
        #[command(flatten)]
        round: RoundArgs,
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Check a claimed dice roll or result hash
    VerifyDice {
        #[command(flatten)]
        round: RoundArgs,
        #[arg(long, conflicts_with = "hash", required_unless_present = "hash")]
        roll: Option<f64>,
        #[arg(long)]
        hash: Option<String>,
    },
    /// Check claimed mine positions ("x,y;x,y;...") or result hash
    VerifyMines {
        #[command(flatten)]
        round: RoundArgs,
        #[command(flatten)]
        board: BoardArgs,
        #[arg(long, conflicts_with = "hash", required_unless_present = "hash")]
        positions: Option<String>,
        #[arg(long)]
        hash: Option<String>,
    },
    /// Audit a JSON array of disclosure records
    Audit { file: PathBuf },
    /// Print multiplier lookup tables
    Table {
        #[arg(value_enum)]
        game: TableKind,
        #[command(flatten)]
        board: BoardArgs,
    },
}

fn parse_positions(value: &str) -> Result<Vec<Position>> {
    value
        .split(';')
        .filter(|s| !s.trim().is_empty())
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| anyhow!("position {:?} must be \"x,y\"", pair))?;
            Ok(Position {
                x: x.trim().parse().with_context(|| format!("bad x in {:?}", pair))?,
                y: y.trim().parse().with_context(|| format!("bad y in {:?}", pair))?,
            })
        })
        .collect()
}

fn claim_from(outcome: Option<Outcome>, hash: Option<String>) -> Result<Claim> {
    match (outcome, hash) {
        (Some(outcome), None) => Ok(Claim::Outcome(outcome)),
        (None, Some(hash)) => Ok(Claim::ResultHash(hash)),
        _ => bail!("pass exactly one of an outcome or --hash"),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// Ok(true) when everything checked out
fn run(cli: Cli) -> Result<bool> {
    let table = match &cli.config {
        Some(path) => TableConfig::from_path(path)
            .with_context(|| format!("loading table config {}", path.display()))?,
        None => TableConfig::default(),
    };

    match cli.command {
        Commands::Seed { client_seed } => {
            let mut seeds = SeedPair::generate()?;
            if let Some(client_seed) = client_seed {
                seeds = seeds.with_client_seed(client_seed)?;
            }
            print_json(&json!({
                "server_seed": seeds.server_seed,
                "hashed_server_seed": seeds.server_seed_hash(),
                "client_seed": seeds.client_seed,
            }))?;
        }
        Commands::Roll { round } => {
            let seeds = round.seeds();
            let roll = dice_roll(&seeds, round.nonce)?;
            let hashed_server_seed = hash_server_seed(&seeds.server_seed);
            let outcome = Outcome::Dice { roll };
            let hash = result_hash(
                &hashed_server_seed,
                &seeds.client_seed,
                round.nonce,
                &GameConfig::Dice,
                &outcome,
            )?;
            print_json(&json!({
                "roll": roll,
                "hashed_server_seed": hashed_server_seed,
                "result_hash": hash,
            }))?;
        }
        Commands::Mines { round, board } => {
            let seeds = round.seeds();
            let config = board.config();
            let positions = mine_positions(&seeds, round.nonce, &config)?;
            let hashed_server_seed = hash_server_seed(&seeds.server_seed);
            let outcome = Outcome::Mines {
                positions: positions.clone(),
            };
            let hash = result_hash(
                &hashed_server_seed,
                &seeds.client_seed,
                round.nonce,
                &GameConfig::Mines(config),
                &outcome,
            )?;
            print_json(&json!({
                "mine_positions": positions,
                "hashed_server_seed": hashed_server_seed,
                "result_hash": hash,
            }))?;
        }
        Commands::VerifyDice { round, roll, hash } => {
            let claim = claim_from(roll.map(|roll| Outcome::Dice { roll }), hash)?;
            let report = verify(
                &round.server_seed,
                &round.client_seed,
                round.nonce,
                &GameConfig::Dice,
                claim,
            )?;
            print!("{}", report);
            return Ok(report.matched);
        }
        Commands::VerifyMines {
            round,
            board,
            positions,
            hash,
        } => {
            let outcome = positions
                .as_deref()
                .map(parse_positions)
                .transpose()?
                .map(|positions| Outcome::Mines { positions });
            let claim = claim_from(outcome, hash)?;
            let game = GameConfig::Mines(board.config());
            let report = verify(&round.server_seed, &round.client_seed, round.nonce, &game, claim)?;
            print!("{}", report);
            return Ok(report.matched);
        }
        Commands::Audit { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let records: Vec<DisclosureRecord> =
                serde_json::from_str(&json).context("parsing disclosure records")?;
            let results = audit_batch(&records);
            for (record, result) in records.iter().zip(&results) {
                match result {
                    Ok(report) if report.matched => println!("nonce {}: MATCH", record.nonce),
                    Ok(report) => println!("nonce {}:\n{}", record.nonce, report),
                    Err(e) => println!("nonce {}: ERROR {}", record.nonce, e),
                }
            }
            let summary = AuditSummary::from_results(&results);
            info!(?summary, "audit finished");
            println!(
                "{} rounds: {} matched, {} mismatched, {} errors",
                summary.total, summary.matched, summary.mismatched, summary.errors
            );
            return Ok(summary.all_matched());
        }
        Commands::Table { game, board } => match game {
            TableKind::Dice => print_json(&dice_multiplier_table(table.dice.house_edge)?)?,
            TableKind::Mines => print_json(&mines_multiplier_table(
                &board.config(),
                &table.mines.curve,
                table.mines.house_edge,
            )?)?,
        },
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
