//! Beam lookahead over real candidate lists

use flagfront::ai::generator::generate_action_candidates;
use flagfront::ai::lookahead::{project_action, rerank_with_lookahead};
use flagfront::ai::selector::sort_actions;
use flagfront::ai::{ActionType, CandidateAction, Difficulty, ProfileTuning, Target, TuningProfile};
use flagfront::core::{PlayerId, Position, UnitId, UnitType};
use flagfront::game::{GameMode, GameState};
use rand::rngs::mock::StepRng;

fn ai_state() -> GameState {
    let mut state = GameState::new_match(GameMode::Pve);
    state.current_player = PlayerId::P2;
    state.turn_count = 9;
    state.p2.energy = 60;
    for unit in &mut state.p2.units {
        unit.start_of_action_energy = 60;
    }
    state
}

fn scored(kind: UnitType, action: ActionType, target: Option<Target>, score: f32) -> CandidateAction {
    let mut candidate = CandidateAction::new(UnitId::new(PlayerId::P2, kind), action, target, 0);
    candidate.score = score;
    candidate
}

fn five_actions() -> Vec<CandidateAction> {
    vec![
        scored(UnitType::Maker, ActionType::Move, Some(Target::cell(Position::new(4, 21))), 9.0),
        scored(UnitType::Maker, ActionType::Move, Some(Target::cell(Position::new(4, 23))), 8.0),
        scored(UnitType::Ranger, ActionType::Move, Some(Target::cell(Position::new(3, 21))), 7.0),
        scored(UnitType::Defuser, ActionType::Move, Some(Target::cell(Position::new(5, 21))), 6.0),
        scored(UnitType::Maker, ActionType::EndTurn, None, 5.0),
    ]
}

#[test]
fn test_hard_beam_scores_top_four() {
    let state = ai_state();
    let tuning = ProfileTuning::builtin(TuningProfile::Balanced);
    let ranked = rerank_with_lookahead(
        &state,
        five_actions(),
        Difficulty::Hard,
        PlayerId::P2,
        &tuning,
        &mut StepRng::new(1 << 31, 0),
    );

    assert_eq!(ranked.len(), 5);
    assert_eq!(ranked.iter().filter(|a| a.lookahead_score.is_some()).count(), 4);
    let untouched = ranked.iter().find(|a| a.lookahead_score.is_none()).unwrap();
    assert_eq!(untouched.kind, ActionType::EndTurn);
}

#[test]
fn test_normal_beam_scores_top_two() {
    let state = ai_state();
    let tuning = ProfileTuning::builtin(TuningProfile::Conservative);
    let ranked = rerank_with_lookahead(
        &state,
        five_actions(),
        Difficulty::Normal,
        PlayerId::P2,
        &tuning,
        &mut StepRng::new(1 << 31, 0),
    );
    assert_eq!(ranked.iter().filter(|a| a.lookahead_score.is_some()).count(), 2);
}

#[test]
fn test_ranking_uses_lookahead_then_score() {
    let state = ai_state();
    let tuning = ProfileTuning::builtin(TuningProfile::Aggressive);
    let ranked = rerank_with_lookahead(
        &state,
        five_actions(),
        Difficulty::Hard,
        PlayerId::P2,
        &tuning,
        &mut StepRng::new(1 << 31, 0),
    );
    for pair in ranked.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.ranked_score() > b.ranked_score() || (a.ranked_score() == b.ranked_score() && a.score >= b.score));
    }
}

#[test]
fn test_projection_leaves_input_alone() {
    let state = ai_state();
    let snapshot = state.clone();
    let maker = state.unit(UnitId::new(PlayerId::P2, UnitType::Maker)).cloned().unwrap();
    let actions = generate_action_candidates(&state, &maker, Difficulty::Hard, None);
    for action in &actions {
        let _ = project_action(&state, action);
    }
    assert_eq!(state, snapshot);
}

#[test]
fn test_real_candidates_rerank_on_hard() {
    let state = ai_state();
    let general = state.unit(UnitId::new(PlayerId::P2, UnitType::General)).cloned().unwrap();
    let tuning = ProfileTuning::builtin(TuningProfile::Balanced);
    let sorted = sort_actions(&generate_action_candidates(&state, &general, Difficulty::Hard, None));
    let count = sorted.len();
    let ranked = rerank_with_lookahead(&state, sorted, Difficulty::Hard, PlayerId::P2, &tuning, &mut StepRng::new(1 << 31, 0));
    assert_eq!(ranked.len(), count);
    assert_eq!(ranked.iter().filter(|a| a.lookahead_score.is_some()).count(), count.min(4));
}
