//! Commander + executor against a recording action sink

use flagfront::ai::{should_take_turn, AiActions, AiCommander, CommanderMemory, Difficulty, RangerAction, TuningProfile};
use flagfront::core::{EngineConfig, PlayerId, Position, UnitId, UnitType};
use flagfront::game::{Branch, GameMode, GameState, MineType, Phase, Unit, Variant};

/// Counts dispatches; `select_unit` is tracked separately
///
/// With `state` set the sink plays a strict rule engine: only the
/// `accept_on`-th attempt (1-based) changes the state, so every other one
/// reads as refused.
#[derive(Default)]
struct Sink {
    selected: Vec<UnitId>,
    dispatched: Vec<&'static str>,
    completed: Vec<Option<UnitId>>,
    state: Option<GameState>,
    accept_on: Option<usize>,
}

impl Sink {
    fn strict(state: &GameState, accept_on: Option<usize>) -> Self {
        Self { state: Some(state.clone()), accept_on, ..Default::default() }
    }
}

impl AiActions for Sink {
    fn observed_state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }
    fn select_unit(&mut self, id: UnitId) {
        self.selected.push(id);
        if self.accept_on == Some(self.selected.len()) {
            if let Some(unit) = self.state.as_mut().and_then(|s| s.unit_mut(id)) {
                unit.has_acted_this_round = true;
            }
        }
    }
    fn attempt_move(&mut self, _: UnitId, _: Position, _: i32) {
        self.dispatched.push("move");
    }
    fn handle_attack(&mut self, _: UnitId, _: UnitId) {
        self.dispatched.push("attack");
    }
    fn handle_scan(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("scan");
    }
    fn handle_sensor_scan(&mut self, _: UnitId, _: Position) {
        self.dispatched.push("sensor_scan");
    }
    fn handle_mine_placement(&mut self, _: &Unit, _: Position, _: MineType) {
        self.dispatched.push("place_mine");
    }
    fn handle_place_tower(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("place_tower");
    }
    fn handle_place_factory(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("place_factory");
    }
    fn handle_place_hub(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("place_hub");
    }
    fn handle_teleport_to_hub(&mut self, _: &Unit) {
        self.dispatched.push("teleport");
    }
    fn handle_detonate_tower(&mut self, _: &Unit) {
        self.dispatched.push("detonate_tower");
    }
    fn handle_throw_mine(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("throw_mine");
    }
    fn handle_pickup_mine_at(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("pickup_mine");
    }
    fn handle_ranger_action(&mut self, _: RangerAction) {
        self.dispatched.push("ranger_action");
    }
    fn handle_move_enemy_mine(&mut self, _: &Unit, _: Position, _: Position) {
        self.dispatched.push("move_mine");
    }
    fn handle_convert_enemy_mine(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("convert_mine");
    }
    fn handle_disarm(&mut self, _: &Unit, _: Position) {
        self.dispatched.push("disarm");
    }
    fn handle_pickup_flag(&mut self) {
        self.dispatched.push("pickup_flag");
    }
    fn handle_drop_flag(&mut self) {
        self.dispatched.push("drop_flag");
    }
    fn handle_evolution(&mut self, _: UnitType, _: Branch, _: Option<Variant>) {
        self.dispatched.push("evolve");
    }
    fn handle_action_complete(&mut self, id: Option<UnitId>) {
        self.completed.push(id);
    }
}

fn ai_turn() -> GameState {
    let mut state = GameState::new_match(GameMode::Pve);
    state.current_player = PlayerId::P2;
    state.phase = Phase::Action;
    state.turn_count = 3;
    state
}

#[test]
fn test_one_dispatch_per_decision() {
    let state = ai_turn();
    assert!(should_take_turn(&state, PlayerId::P2));

    for difficulty in Difficulty::ALL {
        let mut commander = AiCommander::with_seed(difficulty, TuningProfile::Balanced, PlayerId::P2, 42);
        let mut sink = Sink::default();
        let decision = commander
            .take_turn(&state, &mut CommanderMemory::default(), &mut sink)
            .expect("a fresh side can act");

        assert_eq!(sink.selected, vec![decision.action.unit_id]);
        assert_eq!(sink.dispatched.len() + sink.completed.len(), 1);
    }
}

#[test]
fn test_pass_when_everyone_acted() {
    let mut state = ai_turn();
    for unit in &mut state.p2.units {
        unit.has_acted_this_round = true;
    }
    let mut commander = AiCommander::with_seed(Difficulty::Hard, TuningProfile::Conservative, PlayerId::P2, 42);
    let mut sink = Sink::default();
    assert!(commander.take_turn(&state, &mut CommanderMemory::default(), &mut sink).is_none());
    assert!(sink.selected.is_empty());
    assert!(sink.dispatched.is_empty());
    assert_eq!(sink.completed, vec![None]);
}

#[test]
fn test_decision_json_round_trip() {
    let state = ai_turn();
    let mut commander = AiCommander::with_seed(Difficulty::Normal, TuningProfile::Aggressive, PlayerId::P2, 9);
    let decision = commander.decide(&state, &mut CommanderMemory::default()).unwrap();
    let json = serde_json::to_string(&decision.info).unwrap();
    assert!(json.contains("\"tuning_profile\":\"aggressive\""));
    assert!(json.contains("\"raw_top_candidates\""));
}

#[test]
fn test_refused_actions_fall_through() {
    let state = ai_turn();
    let mut commander = AiCommander::with_seed(Difficulty::Hard, TuningProfile::Balanced, PlayerId::P2, 42);
    let mut memory = CommanderMemory::default();
    let mut sink = Sink::strict(&state, Some(2));

    let decision = commander.take_turn(&state, &mut memory, &mut sink).expect("second candidate is accepted");
    assert_eq!(sink.selected.len(), 2);
    assert_eq!(decision.action, decision.ranked[1]);
    assert_eq!(memory.recent_actions, vec![decision.action.kind]);
}

#[test]
fn test_all_refused_closes_the_unit() {
    let state = ai_turn();
    let mut commander = AiCommander::with_seed(Difficulty::Hard, TuningProfile::Balanced, PlayerId::P2, 42)
        .with_config(EngineConfig { max_retries: 3, ..EngineConfig::default() });
    let mut memory = CommanderMemory::default();
    let mut sink = Sink::strict(&state, None);

    assert!(commander.take_turn(&state, &mut memory, &mut sink).is_none());
    assert_eq!(sink.selected.len(), 3);
    let unit = sink.selected[0];
    assert_eq!(sink.completed.last(), Some(&Some(unit)));
    assert!(memory.recent_actions.is_empty());
}

#[test]
fn test_memory_tracks_applied_actions() {
    let mut state = ai_turn();
    let mut commander = AiCommander::with_seed(Difficulty::Easy, TuningProfile::Balanced, PlayerId::P2, 9);
    let mut memory = CommanderMemory::default();

    for _ in 0..8 {
        let mut sink = Sink::default();
        let Some(decision) = commander.take_turn(&state, &mut memory, &mut sink) else {
            break;
        };
        state.turn_count += 1;
        assert_eq!(memory.recent_actions.last(), Some(&decision.action.kind));
    }
    assert!(!memory.recent_actions.is_empty());
    assert!(memory.recent_actions.len() <= 6);
    // easy never feints
    assert_eq!(memory.last_feint_turn, None);
}
