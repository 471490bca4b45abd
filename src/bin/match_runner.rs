//! Headless Match Runner
//!
//! Plays AI vs AI on a generated (or loaded) board and prints every
//! decision as JSON. Actions are applied with the lookahead projection, so
//! the run shows what the engine believes, not what a full rule engine does.
//! A projection that changes nothing counts as refused and the next ranked
//! candidate is tried.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use flagfront::ai::lookahead::project_action;
use flagfront::ai::difficulty::dispatch_delay_ms;
use flagfront::ai::{
    action_applied, AiCommander, CommanderMemory, DecisionInfo, Difficulty, ProfileTuning, TuningProfile,
};
use flagfront::core::{EngineConfig, EngineError, PlayerId, Result};
use flagfront::game::{GameMode, GameState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless Match Runner - AI vs AI decisions as JSON
#[derive(Parser, Debug)]
#[command(name = "match_runner")]
#[command(about = "Run AI vs AI and print each decision as JSON")]
struct Args {
    /// easy, normal or hard
    #[arg(long, default_value = "normal", value_parser = parse_difficulty)]
    difficulty: Difficulty,

    /// Tuning profile for P1 (loaded from data/ai_profiles/)
    #[arg(long, default_value = "balanced")]
    p1_profile: String,

    /// Tuning profile for P2 (loaded from data/ai_profiles/)
    #[arg(long, default_value = "balanced")]
    p2_profile: String,

    /// Start from a JSON game state instead of a generated board
    #[arg(long)]
    state: Option<PathBuf>,

    /// Obstacles scattered across the middle columns
    #[arg(long, default_value_t = 10)]
    obstacles: usize,

    /// Ore cells scattered across the middle columns
    #[arg(long, default_value_t = 4)]
    ore: usize,

    /// Energy each side gains when its turn starts
    #[arg(long, default_value_t = 10)]
    income: i32,

    /// Stop after this many decisions
    #[arg(long, default_value_t = 60)]
    max_decisions: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Pause like a human player before deciding and before acting
    #[arg(long)]
    realtime: bool,
}

fn parse_difficulty(name: &str) -> std::result::Result<Difficulty, String> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| format!("unknown difficulty '{}', expected easy, normal or hard", name))
}

#[derive(Serialize)]
struct DecisionRecord<'a> {
    step: usize,
    turn: u32,
    player: PlayerId,
    info: &'a DecisionInfo,
}

#[derive(Serialize)]
struct MatchSummary {
    seed: u64,
    difficulty: Difficulty,
    decisions: usize,
    turns: u32,
    p1_alive: usize,
    p2_alive: usize,
    p1_energy: i32,
    p2_energy: i32,
}

struct Side {
    commander: AiCommander,
    memory: CommanderMemory,
    /// State at this side's previous decision, for the opponent model
    last_seen: Option<GameState>,
}

fn load_side(difficulty: Difficulty, profile: &str, player: PlayerId, seed: u64) -> Result<Side> {
    let profile = TuningProfile::from_name(profile)?;
    let commander =
        AiCommander::with_seed(difficulty, profile, player, seed).with_tuning(ProfileTuning::load_or_builtin(profile));
    Ok(Side { commander, memory: CommanderMemory::default(), last_seen: None })
}

/// Hand the turn to the other side and refresh its units
fn pass_turn(state: &mut GameState, income: i32) {
    let next = state.current_player.opponent();
    state.current_player = next;
    state.turn_count += 1;
    let player = state.player_mut(next);
    player.energy += income;
    player.quest_stats.sweeper_scans_this_round = 0;
    let energy = player.energy;
    for unit in &mut player.units {
        unit.has_acted_this_round = false;
        unit.energy_used_this_turn = 0;
        unit.start_of_action_energy = energy;
    }
}

fn pause(enabled: bool, ms: u64) {
    if enabled {
        thread::sleep(Duration::from_millis(ms));
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let line = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", line);
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut state: GameState = match &args.state {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => GameState::generate(GameMode::Sandbox, args.obstacles, args.ore, &mut rng),
    };
    state.validate()?;

    let config = EngineConfig::default();
    config.validate().map_err(EngineError::InvalidConfig)?;

    let mut p1 = load_side(args.difficulty, &args.p1_profile, PlayerId::P1, seed)?;
    let mut p2 = load_side(args.difficulty, &args.p2_profile, PlayerId::P2, seed.wrapping_add(1))?;

    info!(seed, difficulty = %args.difficulty, "match started");

    let mut decisions = 0;
    let mut passes_in_a_row = 0;
    while decisions < args.max_decisions && !state.game_over {
        let side = match state.current_player {
            PlayerId::P1 => &mut p1,
            PlayerId::P2 => &mut p2,
        };
        side.commander.observe(&mut side.memory, side.last_seen.as_ref(), &state);
        side.last_seen = Some(state.clone());

        pause(args.realtime, args.difficulty.think_delay_ms());
        let Some(decision) = side.commander.decide(&state, &mut side.memory) else {
            passes_in_a_row += 1;
            if passes_in_a_row > 2 {
                warn!("neither side can act, stopping");
                break;
            }
            pass_turn(&mut state, args.income);
            continue;
        };
        pause(args.realtime, dispatch_delay_ms(decision.action.kind, decision.ranked.len()));

        let mut projected = None;
        let applied = side.commander.dispatch(decision, &mut side.memory, |action| {
            let next = project_action(&state, action);
            let ok = action_applied(&state, &next, action.unit_id);
            if ok {
                projected = Some(next);
            }
            ok
        });
        let (Some(decision), Some(next)) = (applied, projected) else {
            warn!(player = %state.current_player, "every candidate was refused, passing");
            passes_in_a_row += 1;
            if passes_in_a_row > 2 {
                warn!("neither side can act, stopping");
                break;
            }
            pass_turn(&mut state, args.income);
            continue;
        };
        passes_in_a_row = 0;

        emit(
            &DecisionRecord {
                step: decisions,
                turn: state.turn_count,
                player: state.current_player,
                info: &decision.info,
            },
            args.pretty,
        )?;
        state = next;
        decisions += 1;
    }

    let summary = MatchSummary {
        seed,
        difficulty: args.difficulty,
        decisions,
        turns: state.turn_count,
        p1_alive: state.p1.living_units().count(),
        p2_alive: state.p2.living_units().count(),
        p1_energy: state.p1.energy,
        p2_energy: state.p2.energy,
    };
    emit(&summary, args.pretty)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("match_runner: {}", e);
        std::process::exit(1);
    }
}
