//! GAVEL — sealed-bid dice auction arena
//!
//! Entry point. Loads configuration, initialises structured logging, and
//! plays a full game with graceful shutdown. With `--replay <log>` it
//! instead re-resolves every round of a saved game and checks the records.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use gavel::config::{self, AppConfig};
use gavel::dashboard::{self, BoardState};
use gavel::engine::runner::GameRunner;
use gavel::storage;
use gavel::types::AgentAccount;

const BANNER: &str = r#"
   ____    ___     _______ _
  / ___|  / \ \   / / ____| |
 | |  _  / _ \ \ / /|  _| | |
 | |_| |/ ___ \ V / | |___| |___
  \____/_/   \_\_/  |_____|_____|

  Sealed-bid dice auctions with pool settlement
  v0.1.0
"#;

enum Mode {
    Play { config: String },
    Replay { log: String },
}

fn parse_args() -> Result<Mode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, log] if flag == "--replay" => Ok(Mode::Replay { log: log.clone() }),
        [flag] if flag == "--replay" => bail!("--replay needs a log file"),
        [path] => Ok(Mode::Play { config: path.clone() }),
        [] => Ok(Mode::Play {
            config: std::env::var("GAVEL_CONFIG").unwrap_or_else(|_| config::DEFAULT_CONFIG_FILE.into()),
        }),
        _ => bail!("usage: gavel [config.toml] | gavel --replay <game.json>"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();
    let mode = parse_args()?;

    println!("{BANNER}");

    match mode {
        Mode::Replay { log } => replay(&log),
        Mode::Play { config } => play(&config).await,
    }
}

async fn play(path: &str) -> Result<()> {
    let cfg = AppConfig::load(path)?;
    info!(
        game = %cfg.game.name,
        seed = cfg.game.seed,
        rounds = cfg.game.rounds,
        agents = cfg.roster().len(),
        overdraft = ?cfg.settlement.overdraft_policy,
        rewards = ?cfg.settlement.reward_mode,
        "GAVEL starting up"
    );

    let mut runner = GameRunner::from_config(&cfg)?;

    if cfg.dashboard.enabled {
        let board = Arc::new(BoardState::new(cfg.game.name.clone(), runner.house()));
        dashboard::spawn_dashboard(board.clone(), cfg.dashboard.port);
        runner = runner.with_board(board);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    let outcome = runner.run(shutdown).await;

    print_standings(&runner.house().standings());
    info!(
        rounds = runner.log().len(),
        pool_gold = runner.house().gold_in_pool(),
        finished = runner.house().is_finished(),
        "GAVEL shut down cleanly."
    );

    if let Some(log_path) = cfg.game.log_path.as_deref() {
        storage::save_log(runner.log(), Some(log_path))?;
        info!(path = log_path, "Game log written");
    }

    outcome
}

fn replay(path: &str) -> Result<()> {
    let Some(log) = storage::load_log(Some(path))? else {
        bail!("No game log at {path}");
    };

    let mismatched = log.verify();
    if mismatched.is_empty() {
        info!(game_id = %log.game_id, rounds = log.len(), "Replay matches every recorded round");
        Ok(())
    } else {
        warn!(game_id = %log.game_id, rounds = ?mismatched, "Replay mismatch");
        bail!("{} of {} rounds did not replay identically", mismatched.len(), log.len())
    }
}

fn print_standings(standings: &[AgentAccount]) {
    println!("{:<4} {:<20} {:>10} {:>10}", "#", "agent", "points", "gold");
    for (i, account) in standings.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:>10} {:>10}",
            i + 1,
            account.agent_id,
            account.points,
            account.gold
        );
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gavel=info"));

    let json_logging = std::env::var("GAVEL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
