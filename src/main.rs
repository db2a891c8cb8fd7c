//! Fireline -- battle odds from a JSON scenario.
//!
//! Loads a scenario, fights it many times and prints an `OddsReport` as
//! JSON on stdout. Logging goes to stderr, filtered by `RUST_LOG`.
//!
//! Usage:
//!   fireline --scenario FILE [OPTIONS]
//!
//! Options:
//!   --trials N      Battles to fight (default: 1000)
//!   --threads N     Worker threads, 0 for all cores (default: 0)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --low-luck      Force low-luck dice
//!   --max-rounds N  Call a draw after N rounds
//!   --history       Fight once instead, logging history at info level

use std::env;
use std::path::PathBuf;
use std::process;

use fireline::battle::{fight, Bridge, StandardActions, StepRegistry};
use fireline::change::ChangeLog;
use fireline::dice::SeededRandom;
use fireline::display::NullDisplay;
use fireline::history::TracingHistory;
use fireline::odds::{self, OddsConfig};
use fireline::scenario;

struct Args {
    scenario: PathBuf,
    config: OddsConfig,
    history: bool,
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = scenario::load(&args.scenario)?;
    let (mut game, mut battle) = scenario.build()?;
    if args.history {
        if let Some(low_luck) = args.config.low_luck {
            battle.rules.low_luck = low_luck;
        }
        if let Some(max_rounds) = args.config.max_rounds {
            battle.rules.max_rounds = max_rounds;
        }
        let mut random = if args.config.seed != 0 {
            SeededRandom::new(args.config.seed)
        } else {
            SeededRandom::from_entropy()
        };
        let mut log = ChangeLog::new();
        let mut bridge = Bridge {
            state: &mut game,
            log: &mut log,
            random: &mut random,
            history: &mut TracingHistory,
            display: &mut NullDisplay,
        };
        let outcome = fight(&mut battle, &mut bridge, &mut StandardActions, &StepRegistry::new())?;
        println!("{}", serde_json::json!({ "outcome": outcome, "rounds": battle.round, "changes": log.len() }));
        return Ok(());
    }
    let report = odds::simulate(&game, &battle, &args.config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<Args>, String> {
    let mut scenario = None;
    let mut config = OddsConfig::default();
    let mut history = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--scenario" => scenario = Some(PathBuf::from(value(&mut iter, &arg)?)),
            "--trials" => config.trials = parse(&mut iter, &arg)?,
            "--threads" => config.threads = parse(&mut iter, &arg)?,
            "--seed" => config.seed = parse(&mut iter, &arg)?,
            "--max-rounds" => config.max_rounds = Some(parse(&mut iter, &arg)?),
            "--low-luck" => config.low_luck = Some(true),
            "--history" => history = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    let scenario = scenario.ok_or_else(|| "missing --scenario".to_string())?;
    Ok(Some(Args {
        scenario,
        config,
        history,
    }))
}

fn value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next().ok_or_else(|| format!("missing value for {}", flag))
}

fn parse<T: std::str::FromStr>(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<T, String> {
    let raw = value(iter, flag)?;
    raw.parse().map_err(|_| format!("invalid {} value: {}", flag, raw))
}

fn print_usage() {
    eprintln!("Usage: fireline --scenario FILE [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --trials N       Battles to fight (default: 1000)");
    eprintln!("  --threads N      Worker threads, 0 for all cores (default: 0)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --low-luck       Force low-luck dice");
    eprintln!("  --max-rounds N   Call a draw after N rounds");
    eprintln!("  --history        Fight once, logging history at info level");
    eprintln!("  --help           Show this help");
}
