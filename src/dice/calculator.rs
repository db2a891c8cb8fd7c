//! Direct and low-luck rolling behind one entry point.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::power::{TotalPowerAndRolls, UnitPower};
use super::random::{draw_checked, DiceCategory, RandomSource};
use super::roll::{DiceRoll, Die, DieKind};
use super::DiceError;
use crate::battle::BattleRules;
use crate::board::PlayerId;
use crate::history::{HistoryPayload, HistorySink};

/// How hits are resolved from power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollStrategy {
    /// One independent die per roll.
    Direct,
    /// `power / sides` guaranteed hits plus one die for the remainder.
    LowLuck,
}

impl RollStrategy {
    pub fn for_combat(rules: &BattleRules) -> Self {
        if rules.low_luck {
            RollStrategy::LowLuck
        } else {
            RollStrategy::Direct
        }
    }

    pub fn for_aa(rules: &BattleRules) -> Self {
        if rules.low_luck || rules.low_luck_aa_only {
            RollStrategy::LowLuck
        } else {
            RollStrategy::Direct
        }
    }
}

/// Who is rolling and how the roll is described.
#[derive(Debug, Clone, Copy)]
pub struct RollContext<'a> {
    pub dice_sides: u32,
    pub player: PlayerId,
    pub annotation: &'a str,
}

/// Rolls for a firing group and reports the result to the history sink.
///
/// Dice are drawn in a single batch. A group whose units have no strength or
/// no dice returns an empty roll without touching the random source.
pub fn roll_dice(
    strategy: RollStrategy,
    powers: &[UnitPower],
    ctx: RollContext<'_>,
    random: &mut dyn RandomSource,
    history: &mut dyn HistorySink,
) -> Result<DiceRoll, DiceError> {
    if powers.is_empty() {
        return Err(DiceError::NoFiringUnits);
    }
    if ctx.dice_sides == 0 {
        return Err(DiceError::ZeroSides);
    }
    let total = TotalPowerAndRolls::of(powers, ctx.dice_sides);
    if total.total_rolls == 0 || total.total_power == 0 {
        return Ok(DiceRoll::empty());
    }

    let roll = match strategy {
        RollStrategy::Direct => roll_direct(powers, total, ctx, random)?,
        RollStrategy::LowLuck => roll_low_luck(total, ctx, random)?,
    };
    debug!(
        ?strategy,
        power = total.total_power,
        rolls = total.total_rolls,
        hits = roll.hits,
        "rolled dice"
    );
    history.record_event(
        &format!("{} : {}", ctx.annotation, roll),
        HistoryPayload::Dice(roll.clone()),
    );
    Ok(roll)
}

fn roll_direct(
    powers: &[UnitPower],
    total: TotalPowerAndRolls,
    ctx: RollContext<'_>,
    random: &mut dyn RandomSource,
) -> Result<DiceRoll, DiceError> {
    let values = draw_checked(
        random,
        ctx.dice_sides,
        total.total_rolls,
        ctx.player,
        DiceCategory::Combat,
        ctx.annotation,
    )?;

    let mut dice = Vec::with_capacity(values.len());
    let mut faces = values.into_iter();
    for p in TotalPowerAndRolls::active(powers) {
        let unit_faces: Vec<u32> = faces.by_ref().take(p.rolls as usize).collect();
        if p.choose_best_roll && unit_faces.len() > 1 {
            let best = unit_faces
                .iter()
                .enumerate()
                .min_by_key(|&(_, &v)| v)
                .map(|(i, _)| i);
            for (i, &value) in unit_faces.iter().enumerate() {
                if Some(i) == best {
                    dice.push(Die::scored(value, p.strength));
                } else {
                    dice.push(Die {
                        value,
                        rolled_at: p.strength,
                        kind: DieKind::Ignored,
                    });
                }
            }
        } else {
            dice.extend(unit_faces.into_iter().map(|v| Die::scored(v, p.strength)));
        }
    }

    let hits = dice.iter().filter(|d| d.kind == DieKind::Hit).count() as u32;
    Ok(DiceRoll {
        dice,
        hits,
        total_rolls: total.total_rolls,
        expected_hits: total.total_power as f64 / ctx.dice_sides as f64,
    })
}

fn roll_low_luck(
    total: TotalPowerAndRolls,
    ctx: RollContext<'_>,
    random: &mut dyn RandomSource,
) -> Result<DiceRoll, DiceError> {
    let sides = ctx.dice_sides;
    let mut hits = total.total_power / sides;
    let remainder = total.total_power % sides;
    let mut dice = Vec::new();
    if remainder > 0 {
        let values = draw_checked(random, sides, 1, ctx.player, DiceCategory::Combat, ctx.annotation)?;
        for value in values {
            let die = Die::scored(value, remainder);
            if die.kind == DieKind::Hit {
                hits += 1;
            }
            dice.push(die);
        }
    }
    Ok(DiceRoll {
        dice,
        hits,
        total_rolls: total.total_rolls,
        expected_hits: total.total_power as f64 / sides as f64,
    })
}

/// Rolls `count` plain dice that are not scored against any strength.
pub fn roll_n_dice(
    random: &mut dyn RandomSource,
    count: u32,
    dice_sides: u32,
    player: PlayerId,
    category: DiceCategory,
    annotation: &str,
) -> Result<DiceRoll, DiceError> {
    let values = draw_checked(random, dice_sides, count, player, category, annotation)?;
    Ok(DiceRoll {
        dice: values
            .into_iter()
            .map(|value| Die {
                value,
                rolled_at: 0,
                kind: DieKind::Ignored,
            })
            .collect(),
        hits: 0,
        total_rolls: count,
        expected_hits: 0.0,
    })
}

/// Describes an ordinary roll, e.g.
/// `Germans roll dice for 2 infantry, 1 tank in Karelia, round 2`.
pub fn roll_annotation(player: &str, units: &str, site: &str, round: u32) -> String {
    format!("{player} roll dice for {units} in {site}, round {round}")
}

/// Describes an anti-air roll, e.g. `Germans roll AA dice in Berlin`.
pub fn aa_annotation(player: &str, type_aa: &str, site: &str) -> String {
    format!("{player} roll {type_aa} dice in {site}")
}
