//! Full battles driven through the public API with scripted dice.

use fireline::battle::phase::GENERAL;
use fireline::battle::{
    fight, generate, resume, start, Battle, BattleActions, BattleError, BattleId, BattleRules, BattleState,
    BattleStep, Bridge, ExecutionStack, Outcome, Side, StandardActions, StepContext, StepRegistry, UnitFilter,
};
use fireline::board::{BattleSite, GameState, Player, PlayerId, SiteId, UnitId, UnitType, UnitTypeId};
use fireline::change::ChangeLog;
use fireline::dice::ScriptedRandom;
use fireline::display::RecordingDisplay;
use fireline::history::{HistoryPayload, HistorySink, MemoryHistory};

struct World {
    game: GameState,
    germans: PlayerId,
    russians: PlayerId,
    karelia: SiteId,
    archangel: SiteId,
}

impl World {
    fn new() -> Self {
        let mut game = GameState::new();
        let germans = game.add_player(Player::new("Germans"));
        let russians = game.add_player(Player::new("Russians"));
        let karelia = game.add_site(BattleSite::new("Karelia", false));
        let archangel = game.add_site(BattleSite::new("Archangel", false));
        World {
            game,
            germans,
            russians,
            karelia,
            archangel,
        }
    }

    fn unit_type(&mut self, unit_type: UnitType) -> UnitTypeId {
        self.game.add_unit_type(unit_type)
    }

    fn attackers(&mut self, unit_type: UnitTypeId, count: usize) -> Vec<UnitId> {
        self.game
            .create_units(unit_type, self.germans, count, self.karelia)
            .unwrap()
    }

    fn defenders(&mut self, unit_type: UnitTypeId, count: usize) -> Vec<UnitId> {
        self.game
            .create_units(unit_type, self.russians, count, self.karelia)
            .unwrap()
    }

    fn battle(&self, offense: Vec<UnitId>, defense: Vec<UnitId>, rules: BattleRules) -> Battle {
        let phases = generate(&self.game, &[self.germans, self.russians], &rules).unwrap();
        Battle::new(
            BattleId(1),
            self.karelia,
            self.germans,
            self.russians,
            offense,
            defense,
            phases,
            rules,
        )
        .unwrap()
    }
}

/// Everything a battle writes to besides the game state.
#[derive(Default)]
struct Outputs {
    log: ChangeLog,
    history: MemoryHistory,
    display: RecordingDisplay,
}

fn run(
    game: &mut GameState,
    battle: &mut Battle,
    random: &mut ScriptedRandom,
    out: &mut Outputs,
    actions: &mut dyn BattleActions,
    registry: &StepRegistry,
) -> Result<Outcome, BattleError> {
    let mut bridge = Bridge {
        state: game,
        log: &mut out.log,
        random,
        history: &mut out.history,
        display: &mut out.display,
    };
    fight(battle, &mut bridge, actions, registry)
}

fn infantry() -> UnitType {
    let mut t = UnitType::new("infantry", 1, 2);
    t.cost = 3;
    t
}

fn submarine() -> UnitType {
    let mut sub = UnitType::new("submarine", 2, 1);
    sub.first_strike = true;
    sub.is_sea = true;
    sub
}

#[test]
fn infantry_battle_resolves_in_one_round() {
    let mut w = World::new();
    let inf = w.unit_type(infantry());
    let offense = w.attackers(inf, 2);
    let defense = w.defenders(inf, 1);
    let mut battle = w.battle(offense.clone(), defense.clone(), BattleRules::default());
    let initial = w.game.clone();

    // Attack: 1 hit of 2 dice. Defense: 1 hit, fired back before removal.
    let mut random = ScriptedRandom::new(vec![0, 5, 1]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();

    assert_eq!(outcome, Outcome::AttackerWon);
    assert_eq!(battle.round, 1);
    assert_eq!(random.calls(), 2);
    assert_eq!(random.remaining(), 0);
    assert!(!w.game.unit(offense[0]).unwrap().alive);
    assert!(w.game.unit(offense[1]).unwrap().alive);
    assert!(!w.game.unit(defense[0]).unwrap().alive);

    // Casualties are cleared offense first.
    assert_eq!(out.display.removals.len(), 2);
    assert_eq!(out.display.removals[0].units, vec![offense[0]]);
    assert_eq!(out.display.removals[1].units, vec![defense[0]]);
    assert_eq!(out.display.endings, vec![(BattleId(1), Outcome::AttackerWon)]);

    let texts = out.history.texts();
    assert!(texts.contains(&"Germans roll dice for 2 infantry in Karelia, round 1 : 1,6"));
    assert!(texts.contains(&"Russians casualties: 1 infantry"));
    assert!(texts.contains(&"Germans lose 1 infantry in Karelia"));
    assert_eq!(texts.last(), Some(&"Battle in Karelia: attacker won"));

    // Undoing the whole log restores every unit.
    while !out.log.is_empty() {
        out.log.undo_last(&mut w.game).unwrap();
    }
    assert_eq!(w.game.units, initial.units);
    assert_eq!(w.game.site(w.karelia).unwrap().units, initial.site(w.karelia).unwrap().units);
}

#[test]
fn round_limit_ends_in_a_draw() {
    let mut w = World::new();
    let inf = w.unit_type(infantry());
    let offense = w.attackers(inf, 1);
    let defense = w.defenders(inf, 1);
    let rules = BattleRules {
        max_rounds: 2,
        ..BattleRules::default()
    };
    let mut battle = w.battle(offense, defense, rules);
    let mut random = ScriptedRandom::new(vec![5, 5, 5, 5]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(battle.round, 2);
    assert_eq!(random.calls(), 4);
    assert!(out.log.is_empty());
}

#[test]
fn first_strike_kills_before_return_fire() {
    let mut w = World::new();
    let sub = w.unit_type(submarine());
    let mut cruiser = UnitType::new("cruiser", 3, 3);
    cruiser.is_sea = true;
    let cruiser = w.unit_type(cruiser);
    let offense = w.attackers(sub, 1);
    let defense = w.defenders(cruiser, 1);
    let mut battle = w.battle(offense.clone(), defense.clone(), BattleRules::default());

    let mut random = ScriptedRandom::new(vec![0]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::AttackerWon);
    assert_eq!(random.calls(), 1);
    assert!(w.game.unit(offense[0]).unwrap().alive);
    assert!(!w.game.unit(defense[0]).unwrap().alive);
}

#[test]
fn destroyer_lets_the_target_fire_back() {
    let mut w = World::new();
    let mut sub = UnitType::new("submarine", 2, 1);
    sub.first_strike = true;
    let sub = w.unit_type(sub);
    let mut destroyer = UnitType::new("destroyer", 2, 2);
    destroyer.is_destroyer = true;
    let destroyer = w.unit_type(destroyer);
    let offense = w.attackers(sub, 1);
    let defense = w.defenders(destroyer, 1);
    let mut battle = w.battle(offense.clone(), defense.clone(), BattleRules::default());

    let mut random = ScriptedRandom::new(vec![0, 0]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(random.calls(), 2);
    assert!(!w.game.unit(offense[0]).unwrap().alive);
    assert!(!w.game.unit(defense[0]).unwrap().alive);
}

/// One attacking submarine against one defending submarine, both hitting.
fn sub_duel(rules: BattleRules) -> (Outcome, usize, Vec<UnitId>, Vec<UnitId>, Outputs, GameState) {
    let mut w = World::new();
    let sub = w.unit_type(submarine());
    let offense = w.attackers(sub, 1);
    let defense = w.defenders(sub, 1);
    let mut battle = w.battle(offense.clone(), defense.clone(), rules);
    let mut random = ScriptedRandom::new(vec![0, 0]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    (outcome, random.calls(), offense, defense, out, w.game)
}

#[test]
fn first_strike_casualties_fire_back_before_removal() {
    let (outcome, calls, offense, defense, out, game) = sub_duel(BattleRules::default());
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(calls, 2);
    assert!(!game.unit(offense[0]).unwrap().alive);
    assert!(!game.unit(defense[0]).unwrap().alive);

    let texts = out.history.texts();
    assert!(texts.iter().any(|t| t.starts_with("Russians roll dice for 1 submarine")));
    assert!(texts.contains(&"Russians casualties: 1 submarine"));
    // Both sides are cleared together once the first-strike phase is over.
    assert_eq!(out.display.removals.len(), 2);
    assert_eq!(out.display.removals[0].units, offense);
    assert_eq!(out.display.removals[1].units, defense);
}

#[test]
fn first_strike_victims_without_sneak_attack_die_at_once() {
    let rules = BattleRules {
        defending_subs_sneak_attack: false,
        ..BattleRules::default()
    };
    let (outcome, calls, offense, defense, _, game) = sub_duel(rules);
    assert_eq!(outcome, Outcome::AttackerWon);
    assert_eq!(calls, 1);
    assert!(game.unit(offense[0]).unwrap().alive);
    assert!(!game.unit(defense[0]).unwrap().alive);
}

#[test]
fn ww2v2_defending_first_strike_fires_back() {
    let rules = BattleRules {
        defending_subs_sneak_attack: false,
        ww2v2: true,
        ..BattleRules::default()
    };
    let (outcome, calls, offense, defense, out, _) = sub_duel(rules);
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(calls, 2);
    // The defending submarine goes with the first-strike casualties, the
    // attacker's only at the end of the round.
    assert_eq!(out.display.removals.len(), 2);
    assert_eq!(out.display.removals[0].units, defense);
    assert_eq!(out.display.removals[1].units, offense);
}

#[test]
fn neutralized_suicide_first_strike_fires_before_removal() {
    let mut w = World::new();
    let mut kaiten = UnitType::new("kaiten", 6, 0);
    kaiten.first_strike = true;
    kaiten.suicide_on_attack = true;
    let kaiten = w.unit_type(kaiten);
    let mut destroyer = UnitType::new("destroyer", 2, 2);
    destroyer.is_destroyer = true;
    let destroyer = w.unit_type(destroyer);
    let offense = w.attackers(kaiten, 1);
    let defense = w.defenders(destroyer, 1);
    let mut battle = w.battle(offense.clone(), defense.clone(), BattleRules::default());

    // Kaiten hits in the general phase; the destroyer misses.
    let mut random = ScriptedRandom::new(vec![0, 5]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(random.calls(), 2);
    assert!(!w.game.unit(offense[0]).unwrap().alive);
    assert!(!w.game.unit(defense[0]).unwrap().alive);
    let texts = out.history.texts();
    let rolled = texts
        .iter()
        .position(|t| t.starts_with("Germans roll dice for 1 kaiten"))
        .unwrap();
    let lost = texts
        .iter()
        .position(|t| t.starts_with("Germans lose 1 kaiten"))
        .unwrap();
    assert!(rolled < lost);
}

#[test]
fn anti_air_fires_first_and_kills_immediately() {
    let mut w = World::new();
    let inf = w.unit_type(infantry());
    let mut fighter = UnitType::new("fighter", 3, 4);
    fighter.is_air = true;
    let fighter = w.unit_type(fighter);
    let mut gun = UnitType::new("aaGun", 0, 0);
    gun.is_aa = true;
    gun.is_infrastructure = true;
    gun.type_aa = "AA".to_string();
    gun.attack_aa = 1;
    gun.max_aa_attacks = None;
    gun.targets_aa = [fighter].into();
    let gun = w.unit_type(gun);

    let mut offense = w.attackers(inf, 1);
    let fighters = w.attackers(fighter, 2);
    offense.extend(fighters.iter().copied());
    let mut defense = w.defenders(gun, 1);
    let defending_inf = w.defenders(inf, 1);
    defense.extend(defending_inf.iter().copied());
    let mut battle = w.battle(offense.clone(), defense, BattleRules::default());

    // AA: two dice, one hit. Attack: infantry miss, fighter hit. Defense: miss.
    let mut random = ScriptedRandom::new(vec![0, 3, 5, 0, 5]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();

    assert_eq!(outcome, Outcome::AttackerWon);
    assert_eq!(random.calls(), 3);
    assert!(!w.game.unit(fighters[0]).unwrap().alive);
    assert!(w.game.unit(fighters[1]).unwrap().alive);
    assert!(!w.game.unit(defending_inf[0]).unwrap().alive);
    assert_eq!(out.display.removals[0].units, vec![fighters[0]]);
    assert!(out.history.texts().contains(&"Russians roll AA dice in Karelia : 1,4"));
}

#[test]
fn low_luck_resolves_whole_hits_without_dice() {
    let mut w = World::new();
    let tank = w.unit_type(UnitType::new("tank", 3, 3));
    let inf = w.unit_type(infantry());
    let offense = w.attackers(tank, 3);
    let defense = w.defenders(inf, 2);
    let rules = BattleRules {
        low_luck: true,
        ..BattleRules::default()
    };
    let mut battle = w.battle(offense, defense.clone(), rules);

    // Nine power: one sure hit, one die at 3 for the rest. Defense: one die at 4.
    let mut random = ScriptedRandom::new(vec![2, 4]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::AttackerWon);
    assert_eq!(random.calls(), 2);
    assert!(defense.iter().all(|&d| !w.game.unit(d).unwrap().alive));
}

#[test]
fn suicide_on_hit_units_die_one_per_hit() {
    let mut w = World::new();
    let inf = w.unit_type(infantry());
    let mut kamikaze = UnitType::new("kamikaze", 2, 1);
    kamikaze.suicide_on_hit = true;
    let kamikaze = w.unit_type(kamikaze);
    let kamikazes = w.attackers(kamikaze, 2);
    let mut offense = kamikazes.clone();
    offense.extend(w.attackers(inf, 1));
    let defense = w.defenders(inf, 3);
    let rules = BattleRules {
        max_rounds: 1,
        ..BattleRules::default()
    };
    let mut battle = w.battle(offense, defense.clone(), rules);

    // Kamikaze group: one hit. Infantry group: miss. Defense: three misses.
    let mut random = ScriptedRandom::new(vec![0, 5, 5, 5, 5, 5]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(random.calls(), 3);
    let dead_kamikazes = kamikazes
        .iter()
        .filter(|&&k| !w.game.unit(k).unwrap().alive)
        .count();
    assert_eq!(dead_kamikazes, 1);
    let dead_defenders = defense.iter().filter(|&&d| !w.game.unit(d).unwrap().alive).count();
    assert_eq!(dead_defenders, 1);
}

#[test]
fn custom_step_runs_after_phase_fire() {
    let mut w = World::new();
    let inf = w.unit_type(infantry());
    let offense = w.attackers(inf, 2);
    let defense = w.defenders(inf, 1);
    let mut battle = w.battle(offense, defense, BattleRules::default());
    battle.phases.add_custom_step(GENERAL, "air raid").unwrap();

    let mut registry = StepRegistry::new();
    registry
        .register("air raid", |_, ctx| {
            let text = format!("air raid in round {}", ctx.battle.round);
            ctx.bridge.history.record_event(&text, HistoryPayload::None);
            Ok(())
        })
        .unwrap();

    let mut random = ScriptedRandom::new(vec![0, 5, 1]);
    let mut out = Outputs::default();
    run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &registry,
    )
    .unwrap();

    let texts = out.history.texts();
    let raid = texts.iter().position(|t| *t == "air raid in round 1").unwrap();
    let defense_roll = texts
        .iter()
        .position(|t| t.starts_with("Russians roll dice"))
        .unwrap();
    let cleared = texts.iter().position(|t| t.starts_with("Germans lose")).unwrap();
    assert!(defense_roll < raid && raid < cleared);
}

#[test]
fn unregistered_custom_step_is_an_error() {
    let mut w = World::new();
    let inf = w.unit_type(infantry());
    let offense = w.attackers(inf, 1);
    let defense = w.defenders(inf, 1);
    let mut battle = w.battle(offense, defense, BattleRules::default());
    battle.phases.add_custom_step(GENERAL, "air raid").unwrap();

    let mut random = ScriptedRandom::new(vec![5, 5]);
    let mut out = Outputs::default();
    let err = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap_err();
    assert_eq!(err, BattleError::UnknownStep("air raid".to_string()));
}

#[test]
fn interrupted_battle_resumes_from_persisted_stack() {
    let script = vec![5, 5, 0, 5];
    let setup = || {
        let mut w = World::new();
        let inf = w.unit_type(infantry());
        let offense = w.attackers(inf, 1);
        let defense = w.defenders(inf, 1);
        let battle = w.battle(offense, defense, BattleRules::default());
        (w, battle)
    };

    // Uninterrupted reference run.
    let (mut w, mut battle) = setup();
    let mut random = ScriptedRandom::new(script.clone());
    let mut out = Outputs::default();
    let expected = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut StandardActions,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(expected, Outcome::AttackerWon);
    assert_eq!(battle.round, 2);

    // Same battle, stopped after the first fire step and persisted.
    let (mut w2, mut battle2) = setup();
    let mut random2 = ScriptedRandom::new(script);
    let mut out2 = Outputs::default();
    let registry = StepRegistry::new();
    let mut stack = start(&battle2, &w2.game).unwrap();
    assert_eq!(stack.peek(), Some(&BattleStep::RemoveFirstStrikeSuicide));
    {
        let mut bridge = Bridge {
            state: &mut w2.game,
            log: &mut out2.log,
            random: &mut random2,
            history: &mut out2.history,
            display: &mut out2.display,
        };
        let mut ctx = StepContext {
            battle: &mut battle2,
            bridge: &mut bridge,
            actions: &mut StandardActions,
            registry: &registry,
        };
        let step = stack.pop().unwrap();
        step.execute(&mut stack, &mut ctx).unwrap();
        let step = stack.pop().unwrap();
        assert_eq!(
            step,
            BattleStep::Fire {
                phase: GENERAL.to_string(),
                side: Side::Offense
            }
        );
        step.execute(&mut stack, &mut ctx).unwrap();
    }
    assert_eq!(random2.calls(), 1);
    let saved = serde_json::to_string(&(&stack, &battle2, &w2.game)).unwrap();
    let (mut stack, mut battle2, mut game2): (ExecutionStack, Battle, GameState) =
        serde_json::from_str(&saved).unwrap();

    let mut bridge = Bridge {
        state: &mut game2,
        log: &mut out2.log,
        random: &mut random2,
        history: &mut out2.history,
        display: &mut out2.display,
    };
    let outcome = resume(&mut stack, &mut battle2, &mut bridge, &mut StandardActions, &registry).unwrap();
    assert_eq!(outcome, Some(expected));
    assert!(stack.is_empty());
    assert_eq!(battle2.round, 2);
    assert_eq!(game2.units, w.game.units);
}

/// Retreats at the first chance, to a site it picks itself.
struct Retreating(Option<SiteId>);

impl BattleActions for Retreating {
    fn remove_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        site: SiteId,
        side: Side,
    ) -> Result<(), BattleError> {
        StandardActions.remove_units(units, bridge, site, side)
    }

    fn submerge_units(
        &mut self,
        units: &[UnitId],
        side: Side,
        bridge: &mut Bridge<'_>,
        site: SiteId,
    ) -> Result<(), BattleError> {
        StandardActions.submerge_units(units, side, bridge, site)
    }

    fn retreat_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        from: SiteId,
        to: SiteId,
    ) -> Result<(), BattleError> {
        StandardActions.retreat_units(units, bridge, from, to)
    }

    fn query_retreat(&mut self, _: &BattleState<'_>, _: Side, options: &[SiteId]) -> Option<SiteId> {
        self.0.or_else(|| options.first().copied())
    }
}

#[test]
fn attacker_retreats_after_first_round() {
    let mut w = World::new();
    let tank = w.unit_type(UnitType::new("tank", 3, 3));
    let inf = w.unit_type(infantry());
    let offense = w.attackers(tank, 1);
    let defense = w.defenders(inf, 2);
    let mut battle = w
        .battle(offense.clone(), defense, BattleRules::default())
        .with_retreat_sites(vec![w.archangel]);

    let mut random = ScriptedRandom::new(vec![5, 5, 5]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut Retreating(None),
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::DefenderWon);
    assert_eq!(battle.round, 1);
    assert!(w.game.site(w.archangel).unwrap().units.contains(&offense[0]));
    assert!(out.history.texts().contains(&"Germans retreat to Archangel"));
}

#[test]
fn retreat_to_a_site_not_offered_is_rejected() {
    let mut w = World::new();
    let tank = w.unit_type(UnitType::new("tank", 3, 3));
    let inf = w.unit_type(infantry());
    let offense = w.attackers(tank, 1);
    let defense = w.defenders(inf, 2);
    let mut battle = w
        .battle(offense, defense, BattleRules::default())
        .with_retreat_sites(vec![w.archangel]);

    let mut random = ScriptedRandom::new(vec![5, 5, 5]);
    let mut out = Outputs::default();
    let err = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut Retreating(Some(SiteId(99))),
        &StepRegistry::new(),
    )
    .unwrap_err();
    assert_eq!(err, BattleError::InvalidRetreat(SiteId(99)));
}

/// Submerges every unit that may.
struct Submerging;

impl BattleActions for Submerging {
    fn remove_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        site: SiteId,
        side: Side,
    ) -> Result<(), BattleError> {
        StandardActions.remove_units(units, bridge, site, side)
    }

    fn submerge_units(
        &mut self,
        units: &[UnitId],
        side: Side,
        bridge: &mut Bridge<'_>,
        site: SiteId,
    ) -> Result<(), BattleError> {
        StandardActions.submerge_units(units, side, bridge, site)
    }

    fn retreat_units(
        &mut self,
        units: &[UnitId],
        bridge: &mut Bridge<'_>,
        from: SiteId,
        to: SiteId,
    ) -> Result<(), BattleError> {
        StandardActions.retreat_units(units, bridge, from, to)
    }

    fn query_submerge(&mut self, _: &BattleState<'_>, _: Side, candidates: &[UnitId]) -> Vec<UnitId> {
        candidates.to_vec()
    }
}

#[test]
fn submerged_attackers_leave_combat_and_resurface() {
    let mut w = World::new();
    let mut sub = UnitType::new("submarine", 2, 1);
    sub.first_strike = true;
    sub.can_evade = true;
    let sub = w.unit_type(sub);
    let cruiser = w.unit_type(UnitType::new("cruiser", 3, 3));
    let offense = w.attackers(sub, 1);
    let defense = w.defenders(cruiser, 1);
    let mut battle = w.battle(offense.clone(), defense, BattleRules::default());

    let mut random = ScriptedRandom::default();
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut Submerging,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::DefenderWon);
    assert_eq!(random.calls(), 0);
    let unit = w.game.unit(offense[0]).unwrap();
    assert!(unit.alive);
    assert!(!unit.submerged);
    assert!(out.history.texts().contains(&"Germans submerge 1 submarine"));
    // Submerge, then resurface.
    assert_eq!(out.log.len(), 2);
}

#[test]
fn destroyer_prevents_submerging() {
    let mut w = World::new();
    let mut sub = UnitType::new("submarine", 2, 1);
    sub.first_strike = true;
    sub.can_evade = true;
    let sub = w.unit_type(sub);
    let mut destroyer = UnitType::new("destroyer", 2, 2);
    destroyer.is_destroyer = true;
    let destroyer = w.unit_type(destroyer);
    let offense = w.attackers(sub, 1);
    let defense = w.defenders(destroyer, 1);
    let mut battle = w.battle(offense.clone(), defense, BattleRules::default());

    // Both hit in the general phase.
    let mut random = ScriptedRandom::new(vec![0, 0]);
    let mut out = Outputs::default();
    let outcome = run(
        &mut w.game,
        &mut battle,
        &mut random,
        &mut out,
        &mut Submerging,
        &StepRegistry::new(),
    )
    .unwrap();
    assert_eq!(outcome, Outcome::Draw);
    assert!(!out.history.texts().iter().any(|t| t.contains("submerge")));
    assert!(
        battle
            .view(&w.game)
            .filter_units(UnitFilter::Submerged, Side::Offense)
            .unwrap()
            .is_empty()
    );
}
