//! The decision cycle
//!
//! context -> tune -> unit candidates -> tune -> best unit -> action
//! candidates -> tune -> sort -> beam rerank -> hard constraints -> move
//! streak -> feint -> dispatch
//!
//! `AiCommander` owns the seeded RNG and the settings. Everything that must
//! survive between decisions (opponent model, last feint, recent actions,
//! an externally chosen opening plan) lives in `CommanderMemory`, which the
//! caller keeps.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::config::EngineConfig;
use crate::core::types::PlayerId;
use crate::game::state::{GameMode, GameState, Phase};

use super::constraints::{apply_hard_constraints, diversify_move_streak};
use super::context::build_planning_context;
use super::diagnostics::{collect_rejection_summary, summarize_buckets, summarize_top_candidates};
use super::difficulty::Difficulty;
use super::executor::{action_applied, execute_action, AiActions};
use super::generator::{generate_action_candidates, generate_unit_candidates};
use super::lookahead::rerank_with_lookahead;
use super::opponent_model;
use super::selector::{select_best_unit, sort_actions};
use super::tuning::{ProfileTuning, TuningProfile};
use super::types::{
    ActionType, CandidateAction, DecisionInfo, EndgameMode, OpeningPlan, OpponentModel, PlanningContext,
};

/// Applied action kinds remembered for streak detection
const RECENT_ACTION_WINDOW: usize = 6;
/// Only ranks 2 to 4 may be promoted by a feint
const FEINT_POOL_END: usize = 4;

/// State carried from one decision to the next
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommanderMemory {
    pub opponent_model: OpponentModel,
    /// Turn of the most recent feint
    #[serde(default)]
    pub last_feint_turn: Option<u32>,
    /// Kinds of the last applied actions, oldest first
    #[serde(default)]
    pub recent_actions: Vec<ActionType>,
    /// Overrides the opening book's own choice
    #[serde(default)]
    pub opening_plan: Option<OpeningPlan>,
    /// Turn counter at the last observation; a drop means a new match
    #[serde(default)]
    pub last_turn: u32,
}

impl CommanderMemory {
    fn remember(&mut self, kind: ActionType) {
        self.recent_actions.push(kind);
        let excess = self.recent_actions.len().saturating_sub(RECENT_ACTION_WINDOW);
        self.recent_actions.drain(..excess);
    }

    fn feint_on_cooldown(&self, turn: u32, cooldown: u32) -> bool {
        self.last_feint_turn
            .map_or(false, |last| turn.saturating_sub(last) < cooldown)
    }
}

/// The chosen action and the reasoning behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: CandidateAction,
    pub info: DecisionInfo,
    /// The final ranking, `action` first; later entries are retry fallbacks
    pub ranked: Vec<CandidateAction>,
}

impl Decision {
    /// Make the candidate at `index` the decided action
    fn promote(mut self, index: usize) -> Self {
        let Some(action) = self.ranked.get(index).filter(|_| index > 0).cloned() else {
            return self;
        };
        self.info.unit_id = action.unit_id;
        self.info.action = action.kind;
        self.info.target = action.target;
        self.info.mine_type = action.mine_type;
        self.info.score = action.score;
        self.info.lookahead_score = action.lookahead_score;
        self.info.is_feint = action.is_feint;
        self.info.source_rank = action.source_rank;
        self.info.breakdown = action.breakdown.clone();
        self.action = action;
        self
    }
}

/// True when the AI side should act on this state
pub fn should_take_turn(state: &GameState, ai_player: PlayerId) -> bool {
    state.mode == GameMode::Pve
        && state.current_player == ai_player
        && state.phase == Phase::Action
        && !state.game_over
        && !state.is_paused
}

pub struct AiCommander {
    difficulty: Difficulty,
    ai_player: PlayerId,
    tuning: ProfileTuning,
    config: EngineConfig,
    rng: ChaCha8Rng,
}

impl AiCommander {
    pub fn new(difficulty: Difficulty, profile: TuningProfile, ai_player: PlayerId) -> Self {
        Self::from_rng(difficulty, profile, ai_player, ChaCha8Rng::from_entropy())
    }

    /// Reproducible commander; the same seed replays the same decisions
    pub fn with_seed(difficulty: Difficulty, profile: TuningProfile, ai_player: PlayerId, seed: u64) -> Self {
        Self::from_rng(difficulty, profile, ai_player, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(difficulty: Difficulty, profile: TuningProfile, ai_player: PlayerId, rng: ChaCha8Rng) -> Self {
        Self {
            difficulty,
            ai_player,
            tuning: ProfileTuning::builtin(profile),
            config: EngineConfig::default(),
            rng,
        }
    }

    pub fn with_tuning(mut self, tuning: ProfileTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn ai_player(&self) -> PlayerId {
        self.ai_player
    }

    pub fn tuning(&self) -> &ProfileTuning {
        &self.tuning
    }

    /// Fold the transition `prev -> next` into the remembered opponent model
    ///
    /// A turn counter lower than the last one seen means a new match: the
    /// memory starts over and `prev` is ignored.
    pub fn observe(&self, memory: &mut CommanderMemory, prev: Option<&GameState>, next: &GameState) {
        let prev = if next.turn_count < memory.last_turn {
            debug!(turn = next.turn_count, last = memory.last_turn, "new match, memory reset");
            *memory = CommanderMemory::default();
            None
        } else {
            prev
        };
        memory.last_turn = next.turn_count;
        memory.opponent_model = opponent_model::update(&memory.opponent_model, prev, next, self.ai_player);
    }

    /// Run the pipeline; `None` when no unit can act
    pub fn decide(&mut self, state: &GameState, memory: &mut CommanderMemory) -> Option<Decision> {
        let context = build_planning_context(
            state,
            self.difficulty,
            self.ai_player,
            &memory.opponent_model,
            memory.opening_plan,
            self.tuning.profile,
        );
        let context = self.tuning.apply_to_context(context);

        let units = generate_unit_candidates(state, self.difficulty, Some(&context), self.ai_player, &mut self.rng);
        let units = self.tuning.apply_to_units(units);
        let best_unit = select_best_unit(&units)?;
        let unit = best_unit.unit;
        debug!(unit = %unit.id.kind, score = best_unit.score, "unit selected");

        let actions = generate_action_candidates(state, &unit, self.difficulty, Some(&context));
        let sorted = sort_actions(&self.tuning.apply_to_actions(actions));
        let raw_top_candidates = summarize_top_candidates(&sorted, self.config.candidate_view_limit);

        let ranked =
            rerank_with_lookahead(state, sorted, self.difficulty, self.ai_player, &self.tuning, &mut self.rng);
        let ranked = apply_hard_constraints(state, &unit, ranked, &context);
        let ranked = diversify_move_streak(ranked, self.difficulty, &memory.recent_actions);
        let ranked = self.apply_feint(state.turn_count, &context, ranked, memory);

        let action = ranked.first()?.clone();
        let rejected_reasons = collect_rejection_summary(state, &unit, &context, self.config.rejection_limit);

        info!(
            player = %self.ai_player,
            unit = %unit.id.kind,
            action = %action.kind,
            score = action.score,
            lookahead = ?action.lookahead_score,
            feint = action.is_feint,
            "AI decision"
        );

        let info = DecisionInfo {
            unit_id: unit.id,
            action: action.kind,
            target: action.target,
            mine_type: action.mine_type,
            score: action.score,
            lookahead_score: action.lookahead_score,
            intent: context.intent,
            role: context.role_of(unit.id),
            tuning_profile: self.tuning.profile,
            opening_plan: context.opening.plan,
            endgame_mode: context.endgame.mode,
            endgame_urgency: context.endgame.urgency,
            opponent_aggression: context.opponent_model.aggression,
            opponent_flag_rush: context.opponent_model.flag_rush,
            opponent_mine_pressure: context.opponent_model.mine_pressure,
            is_feint: action.is_feint,
            source_rank: action.source_rank,
            breakdown: action.breakdown.clone(),
            raw_top_candidates,
            final_top_candidates: summarize_top_candidates(&ranked, self.config.candidate_view_limit),
            rejected_summary: summarize_buckets(&rejected_reasons),
            rejected_reasons,
        };

        Some(Decision { action, info, ranked })
    }

    /// Offer the ranked candidates to `apply` until one is accepted
    ///
    /// `apply` dispatches a candidate and reports whether the game took it.
    /// At most `max_retries` candidates are tried, and none once the
    /// decision budget has run out. Returns the decision retargeted at the
    /// accepted candidate, or `None` when every attempt was refused.
    pub fn dispatch<F>(&self, decision: Decision, memory: &mut CommanderMemory, mut apply: F) -> Option<Decision>
    where
        F: FnMut(&CandidateAction) -> bool,
    {
        let started = Instant::now();
        let budget = Duration::from_millis(self.config.decision_budget_ms);
        let accepted = decision
            .ranked
            .iter()
            .take(self.config.max_retries as usize)
            .enumerate()
            .find_map(|(index, action)| {
                if started.elapsed() > budget {
                    return Some(Err(index));
                }
                if apply(action) {
                    return Some(Ok((index, action.kind)));
                }
                debug!(action = %action.kind, rank = index + 1, "action refused");
                None
            });

        match accepted {
            Some(Ok((index, kind))) => {
                memory.remember(kind);
                Some(decision.promote(index))
            }
            Some(Err(tried)) => {
                warn!(tried, budget_ms = self.config.decision_budget_ms, "decision budget exhausted");
                None
            }
            None => None,
        }
    }

    /// Decide and dispatch; passes the turn when nothing can act
    ///
    /// When the sink exposes its state, a refused action falls through to
    /// the next ranked candidate. If all of them are refused the unit's
    /// action is closed.
    pub fn take_turn<A: AiActions + ?Sized>(
        &mut self,
        state: &GameState,
        memory: &mut CommanderMemory,
        actions: &mut A,
    ) -> Option<Decision> {
        let Some(decision) = self.decide(state, memory) else {
            actions.handle_action_complete(None);
            return None;
        };
        let unit_id = decision.action.unit_id;

        let applied = self.dispatch(decision, memory, |action| {
            let before = actions.observed_state().cloned();
            execute_action(action, before.as_ref().unwrap_or(state), &mut *actions);
            match (&before, actions.observed_state()) {
                (Some(before), Some(after)) => action_applied(before, after, action.unit_id),
                _ => true,
            }
        });
        if applied.is_none() {
            actions.handle_action_complete(Some(unit_id));
        }
        applied
    }

    /// Chance of a feint this decision, damped when the endgame is tight
    fn feint_chance(&self, context: &PlanningContext) -> f32 {
        let mut chance = self.difficulty.feint_chance() * self.tuning.multipliers.feint_chance;
        match context.endgame.mode {
            EndgameMode::Defense if context.endgame.urgency >= 2.2 => chance *= 0.35,
            EndgameMode::Race if context.endgame.urgency >= 2.6 => chance *= 0.5,
            _ => {}
        }
        chance
    }

    /// Occasionally promote a close runner-up (rank 2 to 4) to the top slot
    fn apply_feint(
        &mut self,
        turn: u32,
        context: &PlanningContext,
        mut ranked: Vec<CandidateAction>,
        memory: &mut CommanderMemory,
    ) -> Vec<CandidateAction> {
        let chance = self.feint_chance(context);
        if chance <= 0.0 || ranked.len() < 2 {
            return ranked;
        }
        if memory.feint_on_cooldown(turn, self.config.feint_cooldown) {
            return ranked;
        }
        let top = &ranked[0];
        if top.kind == ActionType::EndTurn {
            return ranked;
        }

        let max_delta = self.difficulty.feint_max_delta() * self.tuning.multipliers.feint_max_delta;
        let top_score = top.ranked_score();
        let top_safety = top.breakdown.safety_or_zero();
        let top_attack = top.breakdown.attack_or_zero();
        let guard_attack = top.kind == ActionType::Attack && top_attack >= 10.0;

        let eligible: Vec<usize> = (1..ranked.len().min(FEINT_POOL_END))
            .filter(|&idx| {
                let candidate = &ranked[idx];
                candidate.kind != ActionType::EndTurn
                    && top_score - candidate.ranked_score() <= max_delta
                    && candidate.breakdown.safety_or_zero() + 2.0 >= top_safety
                    && !(guard_attack && candidate.breakdown.attack_or_zero() + 5.0 < top_attack)
            })
            .collect();
        if eligible.is_empty() || self.rng.gen::<f32>() >= chance {
            return ranked;
        }

        let idx = eligible[self.rng.gen_range(0..eligible.len())];
        memory.last_feint_turn = Some(turn);
        let mut feint = ranked.remove(idx);
        feint.is_feint = true;
        feint.source_rank = Some(idx + 1);
        ranked[0].is_feint = false;
        ranked[0].source_rank = Some(1);
        debug!(action = %feint.kind, rank = idx + 1, "feint");
        ranked.insert(0, feint);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::executor::RangerAction;
    use crate::ai::tuning::Multipliers;
    use crate::core::types::{Position, UnitId, UnitType};
    use crate::game::board::{MineType, Variant};
    use crate::game::state::Branch;
    use crate::game::units::Unit;

    fn ai_turn() -> GameState {
        let mut state = GameState::new_match(GameMode::Pve);
        state.current_player = PlayerId::P2;
        state.turn_count = 2;
        let energy = state.p2.energy;
        for unit in &mut state.p2.units {
            unit.start_of_action_energy = energy;
        }
        state
    }

    #[test]
    fn test_turn_gating() {
        let mut state = ai_turn();
        assert!(should_take_turn(&state, PlayerId::P2));
        assert!(!should_take_turn(&state, PlayerId::P1));
        state.is_paused = true;
        assert!(!should_take_turn(&state, PlayerId::P2));
        state.is_paused = false;
        state.mode = GameMode::Pvp;
        assert!(!should_take_turn(&state, PlayerId::P2));
        state.mode = GameMode::Pve;
        state.phase = Phase::Placement;
        assert!(!should_take_turn(&state, PlayerId::P2));
    }

    #[test]
    fn test_same_seed_same_decision() {
        let state = ai_turn();
        let mut a = AiCommander::with_seed(Difficulty::Normal, TuningProfile::Balanced, PlayerId::P2, 7);
        let mut b = AiCommander::with_seed(Difficulty::Normal, TuningProfile::Balanced, PlayerId::P2, 7);
        let first = a.decide(&state, &mut CommanderMemory::default()).unwrap();
        let second = b.decide(&state, &mut CommanderMemory::default()).unwrap();
        assert_eq!(first.action, second.action);
        assert_eq!(first.info.final_top_candidates, second.info.final_top_candidates);
    }

    #[test]
    fn test_no_idle_units_yields_none() {
        let mut state = ai_turn();
        for unit in &mut state.p2.units {
            unit.has_acted_this_round = true;
        }
        let mut commander = AiCommander::with_seed(Difficulty::Easy, TuningProfile::Balanced, PlayerId::P2, 1);
        assert!(commander.decide(&state, &mut CommanderMemory::default()).is_none());
    }

    #[test]
    fn test_decision_info_mirrors_action() {
        let state = ai_turn();
        let mut commander = AiCommander::with_seed(Difficulty::Hard, TuningProfile::Aggressive, PlayerId::P2, 3);
        let decision = commander.decide(&state, &mut CommanderMemory::default()).unwrap();
        assert_eq!(decision.info.action, decision.action.kind);
        assert_eq!(decision.info.unit_id, decision.action.unit_id);
        assert_eq!(decision.info.tuning_profile, TuningProfile::Aggressive);
        assert!(decision.info.raw_top_candidates.len() <= 5);
        assert_eq!(decision.info.final_top_candidates[0].rank, 1);
        assert!(decision.info.opening_plan.is_some());
    }

    fn eager_feinter(seed: u64) -> AiCommander {
        let mut tuning = ProfileTuning::builtin(TuningProfile::Balanced);
        tuning.multipliers = Multipliers {
            feint_chance: 20.0,
            feint_max_delta: 100.0,
            ..Multipliers::default()
        };
        AiCommander::with_seed(Difficulty::Normal, TuningProfile::Balanced, PlayerId::P2, seed).with_tuning(tuning)
    }

    fn quiet_context(state: &GameState) -> PlanningContext {
        let mut context = build_planning_context(
            state,
            Difficulty::Normal,
            PlayerId::P2,
            &OpponentModel::initial(),
            None,
            TuningProfile::Balanced,
        );
        context.endgame.mode = EndgameMode::None;
        context.endgame.urgency = 0.0;
        context
    }

    fn candidate(kind: ActionType, score: f32) -> CandidateAction {
        let mut action = CandidateAction::new(UnitId::new(PlayerId::P2, UnitType::Maker), kind, None, 0);
        action.score = score;
        action
    }

    #[test]
    fn test_feint_promotes_runner_up_then_cools_down() {
        let state = ai_turn();
        let context = quiet_context(&state);
        let mut commander = eager_feinter(11);
        let mut memory = CommanderMemory::default();
        let ranked = vec![
            candidate(ActionType::Move, 10.0),
            candidate(ActionType::Scan, 9.5),
            candidate(ActionType::PlaceMine, 9.0),
        ];

        let feinted = commander.apply_feint(5, &context, ranked.clone(), &mut memory);
        assert!(feinted[0].is_feint);
        assert!(matches!(feinted[0].source_rank, Some(2) | Some(3)));
        assert_eq!(feinted[1].kind, ActionType::Move);
        assert!(!feinted[1].is_feint);
        assert_eq!(feinted[1].source_rank, Some(1));
        assert_eq!(memory.last_feint_turn, Some(5));

        // cooldown counts turns, not decisions
        assert_eq!(commander.apply_feint(5, &context, ranked.clone(), &mut memory), ranked);
        assert_eq!(commander.apply_feint(6, &context, ranked.clone(), &mut memory), ranked);
        assert!(commander.apply_feint(7, &context, ranked, &mut memory)[0].is_feint);
        assert_eq!(memory.last_feint_turn, Some(7));
    }

    #[test]
    fn test_no_feint_away_from_end_turn() {
        let state = ai_turn();
        let context = quiet_context(&state);
        let mut commander = eager_feinter(11);
        let mut memory = CommanderMemory::default();
        let ranked = vec![candidate(ActionType::EndTurn, 10.0), candidate(ActionType::Move, 9.9)];
        assert_eq!(commander.apply_feint(5, &context, ranked.clone(), &mut memory), ranked);
        assert_eq!(memory.last_feint_turn, None);
    }

    #[test]
    fn test_feint_pool_stops_at_rank_four() {
        let state = ai_turn();
        let context = quiet_context(&state);
        let mut commander = eager_feinter(11);
        let mut memory = CommanderMemory::default();
        let ranked = vec![
            candidate(ActionType::Move, 10.0),
            candidate(ActionType::EndTurn, 9.9),
            candidate(ActionType::EndTurn, 9.8),
            candidate(ActionType::EndTurn, 9.7),
            candidate(ActionType::Scan, 9.6),
        ];
        assert_eq!(commander.apply_feint(5, &context, ranked.clone(), &mut memory), ranked);
        assert_eq!(memory.last_feint_turn, None);
    }

    #[test]
    fn test_feint_guards_safety_and_attack() {
        let state = ai_turn();
        let context = quiet_context(&state);
        let mut commander = eager_feinter(11);
        let mut memory = CommanderMemory::default();

        let mut safe = candidate(ActionType::Move, 10.0);
        safe.breakdown.safety = Some(6.0);
        let mut exposed = candidate(ActionType::Scan, 9.0);
        exposed.breakdown.safety = Some(3.0);
        let ranked = vec![safe, exposed];
        assert_eq!(commander.apply_feint(5, &context, ranked.clone(), &mut memory), ranked);

        let mut strike = candidate(ActionType::Attack, 12.0);
        strike.breakdown.attack = Some(12.0);
        let mut stroll = candidate(ActionType::Move, 11.0);
        stroll.breakdown.attack = Some(0.0);
        let ranked = vec![strike, stroll];
        assert_eq!(commander.apply_feint(5, &context, ranked.clone(), &mut memory), ranked);
        assert_eq!(memory.last_feint_turn, None);
    }

    #[test]
    fn test_feint_chance_damped_in_tight_endgames() {
        let state = ai_turn();
        let commander = AiCommander::with_seed(Difficulty::Normal, TuningProfile::Balanced, PlayerId::P2, 1);
        let mut context = quiet_context(&state);
        assert!((commander.feint_chance(&context) - 0.1).abs() < 1e-6);

        context.endgame.mode = EndgameMode::Defense;
        context.endgame.urgency = 2.2;
        assert!((commander.feint_chance(&context) - 0.035).abs() < 1e-6);

        context.endgame.mode = EndgameMode::Race;
        assert!((commander.feint_chance(&context) - 0.1).abs() < 1e-6);
        context.endgame.urgency = 2.6;
        assert!((commander.feint_chance(&context) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_dispatch_falls_through_refusals() {
        let state = ai_turn();
        let mut commander = AiCommander::with_seed(Difficulty::Hard, TuningProfile::Balanced, PlayerId::P2, 3);
        let mut memory = CommanderMemory::default();
        let decision = commander.decide(&state, &mut memory).unwrap();
        assert!(decision.ranked.len() >= 3);
        let third = decision.ranked[2].clone();

        let mut attempts = 0;
        let applied = commander
            .dispatch(decision, &mut memory, |_| {
                attempts += 1;
                attempts == 3
            })
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(applied.action, third);
        assert_eq!(applied.info.action, third.kind);
        assert_eq!(applied.info.target, third.target);
        assert_eq!(memory.recent_actions, vec![third.kind]);
    }

    #[test]
    fn test_dispatch_gives_up_after_max_retries() {
        let state = ai_turn();
        let config = EngineConfig {
            max_retries: 2,
            ..EngineConfig::default()
        };
        let mut commander =
            AiCommander::with_seed(Difficulty::Hard, TuningProfile::Balanced, PlayerId::P2, 3).with_config(config);
        let mut memory = CommanderMemory::default();
        let decision = commander.decide(&state, &mut memory).unwrap();

        let mut attempts = 0;
        let applied = commander.dispatch(decision, &mut memory, |_| {
            attempts += 1;
            false
        });
        assert!(applied.is_none());
        assert_eq!(attempts, 2);
        assert!(memory.recent_actions.is_empty());
    }

    #[test]
    fn test_recent_actions_window() {
        let mut memory = CommanderMemory::default();
        for _ in 0..RECENT_ACTION_WINDOW {
            memory.remember(ActionType::Move);
        }
        memory.remember(ActionType::Scan);
        assert_eq!(memory.recent_actions.len(), RECENT_ACTION_WINDOW);
        assert_eq!(memory.recent_actions.last(), Some(&ActionType::Scan));
    }

    #[test]
    fn test_observe_resets_on_new_match() {
        let commander = AiCommander::with_seed(Difficulty::Normal, TuningProfile::Balanced, PlayerId::P2, 1);
        let mut memory = CommanderMemory {
            last_feint_turn: Some(18),
            recent_actions: vec![ActionType::Move; 3],
            last_turn: 20,
            ..Default::default()
        };
        let state = ai_turn();
        commander.observe(&mut memory, None, &state);
        assert_eq!(memory.last_turn, state.turn_count);
        assert_eq!(memory.last_feint_turn, None);
        assert!(memory.recent_actions.is_empty());
    }

    #[test]
    fn test_take_turn_passes_when_idle() {
        struct PassOnly(Vec<Option<UnitId>>);
        impl AiActions for PassOnly {
            fn select_unit(&mut self, _: UnitId) {}
            fn attempt_move(&mut self, _: UnitId, _: Position, _: i32) {}
            fn handle_attack(&mut self, _: UnitId, _: UnitId) {}
            fn handle_scan(&mut self, _: &Unit, _: Position) {}
            fn handle_sensor_scan(&mut self, _: UnitId, _: Position) {}
            fn handle_mine_placement(&mut self, _: &Unit, _: Position, _: MineType) {}
            fn handle_place_tower(&mut self, _: &Unit, _: Position) {}
            fn handle_place_factory(&mut self, _: &Unit, _: Position) {}
            fn handle_place_hub(&mut self, _: &Unit, _: Position) {}
            fn handle_teleport_to_hub(&mut self, _: &Unit) {}
            fn handle_detonate_tower(&mut self, _: &Unit) {}
            fn handle_throw_mine(&mut self, _: &Unit, _: Position) {}
            fn handle_pickup_mine_at(&mut self, _: &Unit, _: Position) {}
            fn handle_ranger_action(&mut self, _: RangerAction) {}
            fn handle_move_enemy_mine(&mut self, _: &Unit, _: Position, _: Position) {}
            fn handle_convert_enemy_mine(&mut self, _: &Unit, _: Position) {}
            fn handle_disarm(&mut self, _: &Unit, _: Position) {}
            fn handle_pickup_flag(&mut self) {}
            fn handle_drop_flag(&mut self) {}
            fn handle_evolution(&mut self, _: UnitType, _: Branch, _: Option<Variant>) {}
            fn handle_action_complete(&mut self, id: Option<UnitId>) {
                self.0.push(id);
            }
        }

        let mut state = ai_turn();
        for unit in &mut state.p2.units {
            unit.is_dead = true;
        }
        let mut commander = AiCommander::with_seed(Difficulty::Normal, TuningProfile::Balanced, PlayerId::P2, 5);
        let mut recorder = PassOnly(Vec::new());
        let decision = commander.take_turn(&state, &mut CommanderMemory::default(), &mut recorder);
        assert!(decision.is_none());
        assert_eq!(recorder.0, vec![None]);
    }
}
