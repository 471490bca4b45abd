//! Picking the unit to act and the action it takes

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use super::types::{ActionType, CandidateAction, CandidateUnit};

/// Tie-break rank among equally scored actions; higher wins
pub fn action_priority(kind: ActionType) -> u8 {
    use ActionType::*;
    match kind {
        Attack => 90,
        PickupFlag => 80,
        DetonateTower => 79,
        EvolveA1 | EvolveA2 => 78,
        EvolveB1 | EvolveB2 => 76,
        EvolveA => 74,
        EvolveB => 72,
        ConvertMine => 71,
        MoveMine => 69,
        Teleport => 67,
        ThrowMine => 66,
        PlaceTower => 64,
        PlaceFactory => 63,
        PlaceHub => 62,
        PickupMine => 61,
        DropMine | PlaceMine => 60,
        Disarm => 55,
        SensorScan => 50,
        Scan => 45,
        Move => 35,
        DropFlag => 20,
        EndTurn => 0,
    }
}

/// Highest scoring unit; earlier entries win ties
pub fn select_best_unit(candidates: &[CandidateUnit]) -> Option<CandidateUnit> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(|c| Reverse(OrderedFloat(c.score)));
    sorted.into_iter().next()
}

/// Score descending, then action priority descending
pub fn sort_actions(actions: &[CandidateAction]) -> Vec<CandidateAction> {
    let mut sorted = actions.to_vec();
    sorted.sort_by_key(|a| (Reverse(OrderedFloat(a.score)), Reverse(action_priority(a.kind))));
    sorted
}

pub fn select_best_action(actions: &[CandidateAction]) -> Option<CandidateAction> {
    sort_actions(actions).into_iter().next()
}
