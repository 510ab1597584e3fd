//! Headless session driver wiring the pure systems around `apply`.

use std::time::Duration;

use clap::ValueEnum;
use quiz_defence_core::{
    ChallengeBuff, Command, Event, QuestionId, QuizQuestion, ScoreBundle, SpeedMultiplier,
    TowerKind, TowerTarget, Viewport, WorldPoint,
};
use quiz_defence_session::{apply, query, Session};
use quiz_defence_system_question_selection::QuestionSelection;
use quiz_defence_system_spawning::{Config as SpawnConfig, Spawning};
use quiz_defence_system_tower_combat::TowerCombat;
use quiz_defence_system_tower_targeting::TowerTargeting;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fixed simulation step used by the headless loop.
const STEP: Duration = Duration::from_millis(100);

/// Spawn cadence handed to the spawning system.
const SPAWN_INTERVAL: Duration = Duration::from_millis(900);

/// Safety cap on ticks per wave so a stalled field cannot hang the binary.
const MAX_TICKS_PER_WAVE: u32 = 4_000;

/// Play-area dimensions used by the headless session.
const VIEWPORT: (f32, f32) = (800.0, 600.0);

/// Candidate build spots, kept clear of the early stage paths.
const BUILD_SPOTS: [(f32, f32); 6] = [
    (120.0, 30.0),
    (280.0, 30.0),
    (440.0, 30.0),
    (120.0, 570.0),
    (280.0, 570.0),
    (440.0, 570.0),
];

/// Scripted policy deciding how quiz questions are answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum AnswerPolicy {
    /// Always pick the correct option.
    AlwaysRight,
    /// Always pick an incorrect option.
    AlwaysWrong,
    /// Pick a uniformly random option.
    Random,
}

/// Parameters of a scripted headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Config {
    /// Seed shared by the deterministic systems and the answer policy.
    pub(crate) seed: u64,
    /// Number of waves to play before stopping.
    pub(crate) waves: u32,
    /// Answer policy applied to every question.
    pub(crate) policy: AnswerPolicy,
    /// Simulation speed multiplier for the whole run.
    pub(crate) speed: SpeedMultiplier,
}

/// Runs a scripted session to completion and returns the final score.
pub(crate) fn run(questions: Vec<QuizQuestion>, config: Config) -> ScoreBundle {
    let viewport = Viewport::new(VIEWPORT.0, VIEWPORT.1);
    let mut session = Session::new(questions, viewport);
    let mut spawning = Spawning::new(SpawnConfig::new(SPAWN_INTERVAL, config.seed));
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();
    let selection = QuestionSelection::new(config.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut targets: Vec<TowerTarget> = Vec::new();

    let mut spot = 0usize;
    for _ in 0..config.waves {
        if query::game_over(&session) {
            break;
        }

        // Stage swaps lock input for a moment; wait it out before building.
        let mut lock_guard = 0;
        while query::input_locked(&session) && lock_guard < 100 {
            step(
                &mut session,
                &mut spawning,
                &mut targeting,
                &mut combat,
                &selection,
                config.policy,
                &mut rng,
                &mut targets,
            );
            lock_guard += 1;
        }

        build(
            &mut session,
            &selection,
            config.policy,
            &mut rng,
            &mut spot,
        );

        let mut events = Vec::new();
        apply(&mut session, Command::StartWave, &mut events);
        // The speed toggle is only live during a wave; re-assert it here.
        apply(
            &mut session,
            Command::SetSpeedMultiplier {
                multiplier: config.speed,
            },
            &mut events,
        );
        pump(&mut session, &selection, config.policy, &mut rng, events);

        let mut tick_guard = 0;
        while query::wave_active(&session) && !query::game_over(&session) {
            step(
                &mut session,
                &mut spawning,
                &mut targeting,
                &mut combat,
                &selection,
                config.policy,
                &mut rng,
                &mut targets,
            );
            tick_guard += 1;
            if tick_guard > MAX_TICKS_PER_WAVE {
                break;
            }
        }
    }

    query::score(&session)
}

/// Proposes one affordable tower placement before the wave starts.
fn build(
    session: &mut Session,
    selection: &QuestionSelection,
    policy: AnswerPolicy,
    rng: &mut ChaCha8Rng,
    spot: &mut usize,
) {
    let kind = TowerKind::Archer;
    if query::gold(session) < query::tower_price(session, kind) {
        return;
    }
    let (x, y) = BUILD_SPOTS[*spot % BUILD_SPOTS.len()];
    *spot += 1;

    let mut events = Vec::new();
    apply(
        session,
        Command::ProposeTower {
            kind,
            position: WorldPoint::new(x, y),
        },
        &mut events,
    );
    pump(session, selection, policy, rng, events);
}

/// Advances the session one step, wiring system output back into `apply`.
#[allow(clippy::too_many_arguments)]
fn step(
    session: &mut Session,
    spawning: &mut Spawning,
    targeting: &mut TowerTargeting,
    combat: &mut TowerCombat,
    selection: &QuestionSelection,
    policy: AnswerPolicy,
    rng: &mut ChaCha8Rng,
    targets: &mut Vec<TowerTarget>,
) {
    let mut events = Vec::new();
    apply(session, Command::Tick { dt: STEP }, &mut events);

    let mut commands = Vec::new();
    spawning.handle(
        &events,
        query::wave(session),
        query::remaining_to_spawn(session),
        query::wave_active(session),
        &mut commands,
    );

    {
        let towers = query::tower_view(session);
        let enemies = query::enemy_view(session);
        targeting.handle(&towers, &enemies, targets);
    }
    combat.handle(query::tower_cooldown_view(session), targets, &mut commands);

    for command in commands {
        apply(session, command, &mut events);
    }
    pump(session, selection, policy, rng, events);
}

/// Resolves question requests, open questions and buff menus until quiet.
fn pump(
    session: &mut Session,
    selection: &QuestionSelection,
    policy: AnswerPolicy,
    rng: &mut ChaCha8Rng,
    mut events: Vec<Event>,
) {
    loop {
        let mut commands = Vec::new();
        selection.handle(&events, query::question_bank(session), &mut commands);
        events.clear();

        let mut progressed = false;
        for command in commands {
            progressed = true;
            apply(session, command, &mut events);
        }

        if let Some((question, _purpose)) = query::open_question(session) {
            let choice = choose(session, question, policy, rng);
            progressed = true;
            apply(session, Command::AnswerQuestion { choice }, &mut events);
        }

        if query::awaiting_buff_choice(session) {
            progressed = true;
            apply(
                session,
                Command::ChooseChallengeBuff {
                    buff: ChallengeBuff::GoldRush,
                },
                &mut events,
            );
        }

        if !progressed {
            return;
        }
    }
}

fn choose(
    session: &Session,
    question: QuestionId,
    policy: AnswerPolicy,
    rng: &mut ChaCha8Rng,
) -> usize {
    let bank = query::question_bank(session);
    let entry = &bank.questions()[question.get() as usize];
    let options = entry.options().len();
    match policy {
        AnswerPolicy::AlwaysRight => (0..options)
            .find(|&choice| entry.is_correct_choice(choice))
            .unwrap_or(0),
        AnswerPolicy::AlwaysWrong => (0..options)
            .find(|&choice| !entry.is_correct_choice(choice))
            .unwrap_or(0),
        AnswerPolicy::Random => rng.gen_range(0..options),
    }
}
