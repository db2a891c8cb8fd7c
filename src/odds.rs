//! Battle odds by repeated simulation.
//!
//! Each trial fights a fresh copy of the battle with its own seeded random
//! source. Trials run in parallel on a rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::{fight, Battle, BattleError, Bridge, Outcome, Side, StandardActions, StepRegistry, UnitFilter};
use crate::board::GameState;
use crate::change::ChangeLog;
use crate::dice::SeededRandom;
use crate::display::NullDisplay;
use crate::history::NullHistory;

/// Configuration for an odds run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OddsConfig {
    /// Number of battles to fight.
    pub trials: u64,
    /// Worker threads; 0 lets rayon decide.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Overrides the scenario's low-luck flag.
    pub low_luck: Option<bool>,
    /// Overrides the scenario's round limit.
    pub max_rounds: Option<u32>,
}

impl Default for OddsConfig {
    fn default() -> Self {
        OddsConfig {
            trials: 1000,
            threads: 0,
            seed: 0,
            low_luck: None,
            max_rounds: None,
        }
    }
}

/// Aggregated results of an odds run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsReport {
    pub trials: u64,
    pub attacker_wins: u64,
    pub defender_wins: u64,
    pub draws: u64,
    pub attacker_win_rate: f64,
    pub defender_win_rate: f64,
    pub draw_rate: f64,
    pub average_rounds: f64,
    pub average_attacker_survivors: f64,
    pub average_defender_survivors: f64,
}

#[derive(Debug, Clone, Copy)]
struct Trial {
    outcome: Outcome,
    rounds: u32,
    attacker_survivors: usize,
    defender_survivors: usize,
}

/// Fights `config.trials` copies of `battle` and reports how they ended.
pub fn simulate(game: &GameState, battle: &Battle, config: &OddsConfig) -> Result<OddsReport, BattleError> {
    let mut template = battle.clone();
    if let Some(low_luck) = config.low_luck {
        template.rules.low_luck = low_luck;
    }
    if let Some(max_rounds) = config.max_rounds {
        template.rules.max_rounds = max_rounds;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| BattleError::ThreadPool(e.to_string()))?;
    debug!(trials = config.trials, threads = pool.current_num_threads(), "simulating battle");

    let trials: Vec<Trial> = pool.install(|| {
        (0..config.trials)
            .into_par_iter()
            .map(|i| {
                let mut random = if config.seed != 0 {
                    SeededRandom::new(config.seed.wrapping_add(i))
                } else {
                    SeededRandom::from_entropy()
                };
                run_trial(game, &template, &mut random)
            })
            .collect::<Result<Vec<Trial>, BattleError>>()
    })?;

    let report = aggregate(&trials);
    info!(
        trials = report.trials,
        attacker = report.attacker_win_rate,
        defender = report.defender_win_rate,
        draw = report.draw_rate,
        "odds computed"
    );
    Ok(report)
}

fn run_trial(game: &GameState, template: &Battle, random: &mut SeededRandom) -> Result<Trial, BattleError> {
    let mut state = game.clone();
    let mut battle = template.clone();
    let mut log = ChangeLog::new();
    let mut bridge = Bridge {
        state: &mut state,
        log: &mut log,
        random,
        history: &mut NullHistory,
        display: &mut NullDisplay,
    };
    let registry = StepRegistry::new();
    let outcome = fight(&mut battle, &mut bridge, &mut StandardActions, &registry)?;
    let view = battle.view(&state);
    Ok(Trial {
        outcome,
        rounds: battle.round,
        attacker_survivors: view.filter_units(UnitFilter::Alive, Side::Offense)?.len(),
        defender_survivors: view.filter_units(UnitFilter::Alive, Side::Defense)?.len(),
    })
}

fn aggregate(trials: &[Trial]) -> OddsReport {
    let mut report = OddsReport {
        trials: trials.len() as u64,
        ..OddsReport::default()
    };
    if trials.is_empty() {
        return report;
    }
    let mut rounds = 0u64;
    let mut attacker_survivors = 0u64;
    let mut defender_survivors = 0u64;
    for trial in trials {
        match trial.outcome {
            Outcome::AttackerWon => report.attacker_wins += 1,
            Outcome::DefenderWon => report.defender_wins += 1,
            Outcome::Draw => report.draws += 1,
        }
        rounds += trial.rounds as u64;
        attacker_survivors += trial.attacker_survivors as u64;
        defender_survivors += trial.defender_survivors as u64;
    }
    let n = trials.len() as f64;
    report.attacker_win_rate = report.attacker_wins as f64 / n;
    report.defender_win_rate = report.defender_wins as f64 / n;
    report.draw_rate = report.draws as f64 / n;
    report.average_rounds = rounds as f64 / n;
    report.average_attacker_survivors = attacker_survivors as f64 / n;
    report.average_defender_survivors = defender_survivors as f64 / n;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{generate, BattleId, BattleRules};
    use crate::board::{BattleSite, Player, UnitType};

    fn lopsided() -> (GameState, Battle) {
        let mut game = GameState::new();
        let attacker = game.add_player(Player::new("Germans"));
        let defender = game.add_player(Player::new("Russians"));
        let site = game.add_site(BattleSite::new("Karelia", false));
        let tank = game.add_unit_type(UnitType::new("tank", 3, 3));
        let inf = game.add_unit_type(UnitType::new("infantry", 1, 2));
        let offense = game.create_units(tank, attacker, 10, site).unwrap();
        let defense = game.create_units(inf, defender, 1, site).unwrap();
        let rules = BattleRules::default();
        let phases = generate(&game, &[attacker, defender], &rules).unwrap();
        let battle = Battle::new(BattleId(1), site, attacker, defender, offense, defense, phases, rules).unwrap();
        (game, battle)
    }

    #[test]
    fn overwhelming_attack_usually_wins() {
        let (game, battle) = lopsided();
        let config = OddsConfig {
            trials: 200,
            threads: 2,
            seed: 7,
            ..OddsConfig::default()
        };
        let report = simulate(&game, &battle, &config).unwrap();
        assert_eq!(report.trials, 200);
        assert_eq!(report.attacker_wins + report.defender_wins + report.draws, 200);
        assert!(report.attacker_win_rate > 0.95, "{report:?}");
        assert!(report.average_rounds >= 1.0);
        assert!(report.average_defender_survivors < 0.05);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let (game, battle) = lopsided();
        let config = OddsConfig {
            trials: 50,
            threads: 3,
            seed: 99,
            ..OddsConfig::default()
        };
        let a = simulate(&game, &battle, &config).unwrap();
        let b = simulate(&game, &battle, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn low_luck_override_removes_variance() {
        let (game, battle) = lopsided();
        let config = OddsConfig {
            trials: 20,
            threads: 1,
            seed: 3,
            low_luck: Some(true),
            ..OddsConfig::default()
        };
        // Ten tanks at 3/6 score exactly five hits in the first round.
        let report = simulate(&game, &battle, &config).unwrap();
        assert_eq!(report.attacker_wins, 20);
        assert_eq!(report.average_rounds, 1.0);
    }

    #[test]
    fn zero_trials_is_an_empty_report() {
        let (game, battle) = lopsided();
        let config = OddsConfig {
            trials: 0,
            seed: 1,
            ..OddsConfig::default()
        };
        let report = simulate(&game, &battle, &config).unwrap();
        assert_eq!(report, OddsReport::default());
    }
}
