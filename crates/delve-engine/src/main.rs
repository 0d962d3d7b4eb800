//! Command-line runner for the Delve simulation.
//!
//! Plays one or more seeded games with the reference [`Prospector`] policy
//! and reports every score plus the session average.
//!
//! # Startup Sequence
//!
//! 1. Parse arguments (malformed numbers abort here, before any game)
//! 2. Load configuration from `--config` or `delve-config.yaml`
//! 3. Initialize structured logging (tracing)
//! 4. Run the session
//! 5. Print the per-run scores and the average, or the JSON summary

mod error;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use delve_agents::Prospector;
use delve_core::observer::shared;
use delve_core::{
    AgentPolicy, GameConfig, NoOpObserver, SessionSummary, SharedObserver, TracingObserver,
    run_session,
};

use crate::error::EngineError;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "delve-config.yaml";

/// Command-line arguments for the `delve` binary.
#[derive(Parser, Debug)]
#[command(name = "delve", version, about = "Locate the hidden target, then escape with the loot")]
struct Cli {
    /// Seed for the first game; 0 draws a fresh seed for every game.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Number of games to play.
    #[arg(
        short = 'n',
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    repeat: u32,

    /// Log every move, reward, and bonus change.
    #[arg(long)]
    interactive: bool,

    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the session summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Application entry point for the `delve` binary.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or a game cannot
/// be set up.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(&cli).await?;
    Ok(())
}

async fn run(cli: &Cli) -> Result<(), EngineError> {
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config)?;

    info!(
        seed = cli.seed,
        repeat = cli.repeat,
        interactive = cli.interactive,
        locate_timeout_ms = config.deadlines.locate_timeout_ms,
        escape_timeout_ms = config.deadlines.escape_timeout_ms,
        "delve starting"
    );

    let policies = || -> Box<dyn AgentPolicy> { Box::new(Prospector::new()) };
    let summary = if cli.interactive {
        let observers = || -> SharedObserver { shared(TracingObserver) };
        run_session(&config, cli.seed, cli.repeat, &policies, &observers).await?
    } else {
        let observers = || -> SharedObserver { shared(NoOpObserver) };
        run_session(&config, cli.seed, cli.repeat, &policies, &observers).await?
    };

    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Load the explicit config file, else `delve-config.yaml` if present, else
/// the defaults.
fn load_config(explicit: Option<&Path>) -> Result<GameConfig, EngineError> {
    if let Some(path) = explicit {
        return Ok(GameConfig::from_file(path)?);
    }
    let fallback = Path::new(DEFAULT_CONFIG);
    if fallback.exists() {
        Ok(GameConfig::from_file(fallback)?)
    } else {
        Ok(GameConfig::default())
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &GameConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log level {:?}: {e}", config.logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    for (run, record) in (1_u32..).zip(&summary.runs) {
        let report = &record.report;
        let escape = report
            .flee
            .as_ref()
            .map_or_else(|| "skipped".to_owned(), |flee| flee.outcome.to_string());
        println!(
            "run {run}: seed {} | locate {} in {} steps (optimal {}) | escape {escape} | reward {} x {:.3} = score {}",
            record.seed,
            report.find.outcome,
            report.find.steps,
            report.find.optimal_distance,
            report.reward_collected,
            report.bonus_factor,
            report.score,
        );
    }
    println!(
        "games {} | total score {} | average score {:.2}",
        summary.runs.len(),
        summary.total_score,
        summary.average_score
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_play_one_fresh_game() {
        let cli = Cli::try_parse_from(["delve"]).unwrap();
        assert_eq!(cli.seed, 0);
        assert_eq!(cli.repeat, 1);
        assert!(!cli.interactive);
        assert!(!cli.json);
        assert!(cli.config.is_none());
    }

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from(["delve", "-s", "42", "-n", "3", "--json"]).unwrap();
        assert_eq!(cli.seed, 42);
        assert_eq!(cli.repeat, 3);
        assert!(cli.json);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(Cli::try_parse_from(["delve", "--seed", "forty-two"]).is_err());
        assert!(Cli::try_parse_from(["delve", "--seed", "-1"]).is_err());
        assert!(Cli::try_parse_from(["delve", "--repeat", "0"]).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let missing = Path::new("/nonexistent/delve-config.yaml");
        assert!(matches!(
            load_config(Some(missing)),
            Err(EngineError::Config { .. })
        ));
    }
}
