use std::time::Duration;

use quiz_defence_core::{
    AbilityKind, ChallengeBuff, ChallengeReward, Command, EnemyKind, Event, ProposalError,
    QuestionId, QuestionPurpose, QuestionRequest, QuizQuestion, SpeedMultiplier, TowerKind,
    Viewport, WorldPoint, BOSS_COUNTDOWN, PATH_CLEARANCE,
};
use quiz_defence_session::{apply, query, Session};

fn bank() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion::new(
            "What is 2 + 2?".to_owned(),
            vec![
                "3".to_owned(),
                "4".to_owned(),
                "5".to_owned(),
                "6".to_owned(),
            ],
            "4".to_owned(),
            None,
        ),
        QuizQuestion::new(
            "Largest planet?".to_owned(),
            vec![
                "Mars".to_owned(),
                "Venus".to_owned(),
                "Jupiter".to_owned(),
                "Saturn".to_owned(),
            ],
            "Jupiter".to_owned(),
            None,
        ),
    ]
}

const CORRECT_CHOICE: usize = 1;

fn new_session() -> Session {
    Session::new(bank(), Viewport::new(800.0, 600.0))
}

fn submit(session: &mut Session, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(session, command, &mut events);
    events
}

fn tick(session: &mut Session, dt: Duration) -> Vec<Event> {
    submit(session, Command::Tick { dt })
}

fn requested(events: &[Event]) -> QuestionRequest {
    events
        .iter()
        .find_map(|event| match event {
            Event::QuestionRequested { request } => Some(*request),
            _ => None,
        })
        .expect("a question request")
}

fn answer(session: &mut Session, request: QuestionRequest, choice: usize) -> Vec<Event> {
    let mut events = submit(
        session,
        Command::PresentQuestion {
            request,
            question: QuestionId::new(0),
        },
    );
    events.extend(submit(session, Command::AnswerQuestion { choice }));
    events
}

/// Answers every challenge question of an open round incorrectly.
fn dismiss_challenge(session: &mut Session, mut events: Vec<Event>) {
    for _ in 0..3 {
        let request = requested(&events);
        let _ = submit(
            session,
            Command::PresentQuestion {
                request,
                question: QuestionId::new(0),
            },
        );
        events = submit(session, Command::CancelQuestion);
    }
}

/// Starts the next wave, spawns its full quota of scouts at the path head
/// and wipes it with a gated strike, returning all events seen.
fn clear_wave_with_strike(session: &mut Session) -> Vec<Event> {
    // Refresh the strike cooldown left over from the previous wave.
    let _ = tick(session, AbilityKind::Strike.cooldown());

    let mut all = submit(session, Command::StartWave);
    assert!(
        all.iter()
            .any(|event| matches!(event, Event::WaveStarted { .. })),
        "wave should start",
    );

    let mut first_enemy = None;
    while query::remaining_to_spawn(session) > 0 {
        let events = submit(
            session,
            Command::SpawnEnemy {
                kind: EnemyKind::Scout,
            },
        );
        if first_enemy.is_none() {
            first_enemy = events.iter().find_map(|event| match event {
                Event::EnemySpawned { enemy, .. } => Some(*enemy),
                _ => None,
            });
        }
        all.extend(events);
    }

    let events = submit(
        session,
        Command::ProposeAbility {
            ability: AbilityKind::Strike,
        },
    );
    let request = requested(&events);
    let _ = answer(session, request, CORRECT_CHOICE);
    all.extend(submit(
        session,
        Command::SelectStrikeTarget {
            enemy: first_enemy.expect("spawned enemy"),
        },
    ));

    // One short tick latches the wave completion.
    all.extend(tick(session, Duration::from_millis(10)));
    let completions = all
        .iter()
        .filter(|event| matches!(event, Event::WaveCompleted { .. }))
        .count();
    assert_eq!(completions, 1, "exactly one completion per wave");
    all
}

#[test]
fn escaped_enemies_cost_lives_and_the_session_ends_once() {
    let mut session = new_session();
    let mut game_overs = 0;

    'waves: loop {
        let _ = submit(&mut session, Command::StartWave);
        while query::remaining_to_spawn(&session) > 0 {
            let _ = submit(
                &mut session,
                Command::SpawnEnemy {
                    kind: EnemyKind::Scout,
                },
            );
        }
        for _ in 0..60 {
            let events = tick(&mut session, Duration::from_secs(1));
            game_overs += events
                .iter()
                .filter(|event| matches!(event, Event::GameOver { .. }))
                .count();
            if query::game_over(&session) {
                break 'waves;
            }
            if !query::wave_active(&session) {
                break;
            }
        }
    }

    assert_eq!(game_overs, 1, "game over must be emitted exactly once");
    assert_eq!(query::lives(&session), 0);

    // The simulation halts: further ticks produce no events at all.
    assert!(tick(&mut session, Duration::from_secs(1)).is_empty());
}

#[test]
fn lives_decrement_by_one_per_escape() {
    let mut session = new_session();
    let _ = submit(&mut session, Command::StartWave);
    let _ = submit(
        &mut session,
        Command::SpawnEnemy {
            kind: EnemyKind::Scout,
        },
    );

    let mut escapes = Vec::new();
    for _ in 0..60 {
        let events = tick(&mut session, Duration::from_secs(1));
        escapes.extend(events.into_iter().filter_map(|event| match event {
            Event::EnemyEscaped {
                lives_remaining, ..
            } => Some(lives_remaining),
            _ => None,
        }));
        if !escapes.is_empty() {
            break;
        }
    }

    assert_eq!(escapes, vec![9]);
    assert_eq!(query::lives(&session), 9);
}

#[test]
fn wave_completion_side_effects_do_not_re_trigger() {
    let mut session = new_session();
    let _ = clear_wave_with_strike(&mut session);

    // The wave is long done; repeated ticks stay quiet.
    for _ in 0..5 {
        let events = tick(&mut session, Duration::from_secs(1));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::WaveCompleted { .. })));
    }
}

#[test]
fn a_correct_boss_answer_weakens_by_a_tenth_and_buffs_towers() {
    let mut session = new_session();
    let _ = submit(&mut session, Command::StartWave);
    let events = submit(
        &mut session,
        Command::SpawnEnemy {
            kind: EnemyKind::Boss,
        },
    );
    let boss = events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("boss spawned");
    let request = requested(&events);

    let events = answer(&mut session, request, CORRECT_CHOICE);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::BossQuestionOpened { deadline, .. } if *deadline == BOSS_COUNTDOWN
    )));
    let reduction = events
        .iter()
        .find_map(|event| match event {
            Event::BossWeakened {
                health_reduction, ..
            } => Some(*health_reduction),
            _ => None,
        })
        .expect("boss weakened");
    assert_eq!(reduction, EnemyKind::boss_health(query::wave(&session)) / 10);
    assert!(query::boss_buff_active(&session));

    let view = query::enemy_view(&session);
    let snapshot = view
        .iter()
        .find(|snapshot| snapshot.id == boss)
        .expect("boss alive");
    assert_eq!(snapshot.health, snapshot.max_health);
    assert_eq!(
        snapshot.max_health,
        EnemyKind::boss_health(query::wave(&session)) - reduction,
    );
}

#[test]
fn a_boss_timeout_resolves_as_incorrect_and_enrages() {
    let mut session = new_session();
    let _ = submit(&mut session, Command::StartWave);
    let events = submit(
        &mut session,
        Command::SpawnEnemy {
            kind: EnemyKind::Boss,
        },
    );
    let request = requested(&events);
    let base_health = EnemyKind::boss_health(query::wave(&session));

    let _ = submit(
        &mut session,
        Command::PresentQuestion {
            request,
            question: QuestionId::new(0),
        },
    );
    let events = tick(&mut session, BOSS_COUNTDOWN);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::BossEnraged { .. })));

    let view = query::enemy_view(&session);
    let snapshot = view.iter().next().expect("boss alive");
    assert_eq!(snapshot.max_health, base_health * 5 / 4);
    assert!(!query::boss_buff_active(&session));
}

#[test]
fn the_boss_buff_expires_with_its_wave() {
    let mut session = new_session();
    let _ = submit(&mut session, Command::StartWave);
    let events = submit(
        &mut session,
        Command::SpawnEnemy {
            kind: EnemyKind::Boss,
        },
    );
    let boss = events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("boss spawned");
    let request = requested(&events);
    let _ = answer(&mut session, request, CORRECT_CHOICE);
    assert!(query::boss_buff_active(&session));

    // Drain the quota with scouts; the strike's splash wipes them while
    // the weakened boss survives and eventually walks off the path.
    while query::remaining_to_spawn(&session) > 0 {
        let _ = submit(
            &mut session,
            Command::SpawnEnemy {
                kind: EnemyKind::Scout,
            },
        );
    }
    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Strike,
        },
    );
    let request = requested(&events);
    let _ = answer(&mut session, request, CORRECT_CHOICE);
    let _ = submit(&mut session, Command::SelectStrikeTarget { enemy: boss });
    assert_eq!(query::enemy_view(&session).iter().count(), 1);

    let mut completed = false;
    for _ in 0..120 {
        let events = tick(&mut session, Duration::from_secs(1));
        if events
            .iter()
            .any(|event| matches!(event, Event::WaveCompleted { .. }))
        {
            completed = true;
            break;
        }
    }

    assert!(completed, "the wave should complete once the boss escapes");
    assert_eq!(query::lives(&session), 9);
    assert!(!query::boss_buff_active(&session));
}

#[test]
fn a_perfect_challenge_round_grants_a_chosen_buff() {
    let mut session = new_session();
    let mut challenge_events = None;
    for wave in 1..=10u32 {
        let events = clear_wave_with_strike(&mut session);
        if wave == 10 {
            assert!(events
                .iter()
                .any(|event| matches!(event, Event::ChallengeStarted { .. })));
            challenge_events = Some(events);
        }
    }
    let mut events = challenge_events.expect("challenge round");

    for index in 0..3u8 {
        let request = requested(&events);
        assert_eq!(request.purpose, QuestionPurpose::Challenge { index });
        events = answer(&mut session, request, CORRECT_CHOICE);
    }
    let reward = events
        .iter()
        .find_map(|event| match event {
            Event::ChallengeScored {
                correct, reward, ..
            } => Some((*correct, reward.clone())),
            _ => None,
        })
        .expect("challenge scored");
    assert_eq!(reward, (3, ChallengeReward::BuffChoice));
    assert!(query::awaiting_buff_choice(&session));

    let events = submit(
        &mut session,
        Command::ChooseChallengeBuff {
            buff: ChallengeBuff::GoldRush,
        },
    );
    assert_eq!(
        events,
        vec![Event::ChallengeBuffChosen {
            buff: ChallengeBuff::GoldRush,
        }],
    );
    assert_eq!(
        query::active_buff(&session),
        Some((ChallengeBuff::GoldRush, 10)),
    );

    // Every kill now awards one extra gold unit.
    let _ = tick(&mut session, AbilityKind::Strike.cooldown());
    let _ = submit(&mut session, Command::StartWave);
    let events = submit(
        &mut session,
        Command::SpawnEnemy {
            kind: EnemyKind::Scout,
        },
    );
    let enemy = events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("scout spawned");
    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Strike,
        },
    );
    let request = requested(&events);
    let _ = answer(&mut session, request, CORRECT_CHOICE);
    let events = submit(&mut session, Command::SelectStrikeTarget { enemy });
    let bounty = events
        .iter()
        .find_map(|event| match event {
            Event::EnemyDied { bounty, .. } => Some(*bounty),
            _ => None,
        })
        .expect("kill recorded");
    assert_eq!(bounty, EnemyKind::Scout.stats().bounty + 1);
}

#[test]
fn stage_transitions_swap_paths_and_evict_violating_towers() {
    let mut session = new_session();

    // Valid against the stage-0 serpentine, but right on top of a
    // stage-1 lane.
    let doomed_position = WorldPoint::new(400.0, 200.0);
    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: doomed_position,
        },
    );
    let doomed = events
        .iter()
        .find_map(|event| match event {
            Event::TowerPlaced { tower, .. } => Some(*tower),
            _ => None,
        })
        .expect("tower placed");

    let mut stage_events = None;
    for wave in 1..=12u32 {
        let events = clear_wave_with_strike(&mut session);
        if wave == 10 {
            dismiss_challenge(&mut session, events);
        } else if wave == 12 {
            stage_events = Some(events);
        }
    }
    let events = stage_events.expect("stage milestone");

    assert!(events.iter().any(|event| matches!(
        event,
        Event::StageAdvanced { stage: 1, removed_towers } if removed_towers == &vec![doomed]
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::TowerRemoved { tower, .. } if *tower == doomed
    )));

    // The clearance invariant holds against the new path set.
    let towers = query::tower_view(&session);
    for (_, waypoints) in query::path_waypoints(&session) {
        for pair in waypoints.windows(2) {
            for tower in towers.iter() {
                assert!(tower.position.distance_to_segment(pair[0], pair[1]) >= PATH_CLEARANCE);
            }
        }
    }
}

#[test]
fn input_stays_locked_for_the_stage_swap_window() {
    let mut session = new_session();
    for wave in 1..=12u32 {
        let events = clear_wave_with_strike(&mut session);
        if wave == 10 {
            dismiss_challenge(&mut session, events);
        }
    }
    assert!(query::input_locked(&session));

    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: WorldPoint::new(400.0, 400.0),
        },
    );
    assert_eq!(
        events,
        vec![Event::ProposalRejected {
            reason: ProposalError::InputLocked,
        }],
    );

    let _ = tick(&mut session, Duration::from_secs(2));
    assert!(!query::input_locked(&session));
}

#[test]
fn the_speed_multiplier_scales_battlefield_time_only() {
    let mut session = new_session();

    // The toggle is inert while no wave is running.
    let events = submit(
        &mut session,
        Command::SetSpeedMultiplier {
            multiplier: SpeedMultiplier::Double,
        },
    );
    assert!(events.is_empty());

    let _ = submit(&mut session, Command::StartWave);
    let events = submit(
        &mut session,
        Command::SetSpeedMultiplier {
            multiplier: SpeedMultiplier::Double,
        },
    );
    assert_eq!(
        events,
        vec![Event::SpeedChanged {
            multiplier: SpeedMultiplier::Double,
        }],
    );

    let events = tick(&mut session, Duration::from_secs(1));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::TimeAdvanced { dt } if *dt == Duration::from_secs(2)
    )));
}
