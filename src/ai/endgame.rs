//! Endgame phase detection

use crate::core::types::PlayerId;
use crate::game::state::GameState;

use super::types::{EndgameMode, EndgameState};

/// Classify the match from `ai_player`'s side
pub fn evaluate_endgame(state: &GameState, ai_player: PlayerId) -> EndgameState {
    let enemy = ai_player.opponent();
    let own_alive = state.player(ai_player).living_units().count();
    let enemy_alive = state.player(enemy).living_units().count();
    let own_carrier = state.any_flag_carrier(ai_player);
    let enemy_carrier = state.any_flag_carrier(enemy);

    let low_population = own_alive + enemy_alive <= 5;
    let late_turn = state.turn_count >= 18;
    let carrier_pressure = own_carrier.is_some() || enemy_carrier.is_some();

    let build = |mode: EndgameMode, urgency: f32| EndgameState {
        is_endgame: mode != EndgameMode::None,
        mode,
        urgency,
        own_alive,
        enemy_alive,
    };

    if !(low_population || late_turn || carrier_pressure) {
        return build(EndgameMode::None, 0.0);
    }

    if let Some(carrier) = own_carrier {
        let dist = carrier.pos.manhattan(&state.player(enemy).flag_position);
        let finish = if enemy_alive <= 2 { 0.45 } else { 0.0 };
        let urgency = (1.2 + (11 - dist) as f32 * 0.22 + finish).clamp(1.0, 4.2);
        return build(EndgameMode::Race, urgency);
    }

    if let Some(carrier) = enemy_carrier {
        let dist = carrier.pos.manhattan(&state.player(ai_player).flag_position);
        let desperate = if own_alive <= 2 { 0.55 } else { 0.0 };
        let urgency = (1.4 + (10 - dist) as f32 * 0.24 + desperate).clamp(1.0, 4.6);
        return build(EndgameMode::Defense, urgency);
    }

    let thin = if low_population { 0.5 } else { 0.0 };
    let urgency = (0.9 + (state.turn_count as f32 - 14.0) * 0.12 + thin).clamp(0.9, 3.5);
    build(EndgameMode::Attrition, urgency)
}
