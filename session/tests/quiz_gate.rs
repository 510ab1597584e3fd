use quiz_defence_core::{
    AbilityKind, Command, Event, ProposalError, ProposedAction, QuestionId, QuestionRequest,
    QuizQuestion, TowerKind, UpgradeKind, Viewport, WorldPoint, START_GOLD,
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
const WRONG_CHOICE: usize = 0;

fn new_session() -> Session {
    Session::new(bank(), Viewport::new(800.0, 600.0))
}

fn submit(session: &mut Session, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(session, command, &mut events);
    events
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

/// Opens the pending question and submits the given choice.
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

fn clear_spot(index: u32) -> WorldPoint {
    WorldPoint::new(300.0 + 100.0 * index as f32, 400.0)
}

#[test]
fn first_two_placements_skip_the_gate_and_charge_base_price() {
    let mut session = new_session();
    let price = TowerKind::Cannon.stats().base_cost;

    for index in 0..2 {
        let events = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Cannon,
                position: clear_spot(index),
            },
        );
        assert!(
            matches!(events[0], Event::TowerPlaced { .. }),
            "placement #{} should bypass the quiz gate",
            index + 1,
        );
    }
    assert_eq!(query::gold(&session), START_GOLD - 2 * price);
}

#[test]
fn third_placement_is_gated_and_commits_on_a_correct_answer() {
    let mut session = new_session();
    for index in 0..2 {
        let _ = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
    }
    let gold_before = query::gold(&session);

    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(2),
        },
    );
    assert!(
        matches!(events[0], Event::ProposalOpened { .. }),
        "third placement should open a proposal",
    );
    assert_eq!(
        query::gold(&session),
        gold_before,
        "towers must not pre-deduct gold",
    );

    let request = requested(&events);
    let events = answer(&mut session, request, CORRECT_CHOICE);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProposalCommitted { .. })));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TowerPlaced { .. })));
    assert_eq!(
        query::gold(&session),
        gold_before - TowerKind::Archer.stats().base_cost,
    );
    assert_eq!(query::tower_view(&session).iter().count(), 3);
}

#[test]
fn failed_placements_inflate_the_price_without_touching_gold() {
    let mut session = new_session();
    for index in 0..2 {
        let _ = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
    }
    let gold_before = query::gold(&session);

    let mut expected_price = TowerKind::Archer.stats().base_cost;
    for _ in 0..2 {
        let events = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(2),
            },
        );
        let request = requested(&events);
        let events = answer(&mut session, request, WRONG_CHOICE);

        expected_price = (expected_price * 5 + 3) / 4;
        let rolled_back = events.iter().find_map(|event| match event {
            Event::ProposalRolledBack {
                refunded,
                new_price,
                ..
            } => Some((*refunded, *new_price)),
            _ => None,
        });
        assert_eq!(rolled_back, Some((0, expected_price)));
    }

    assert_eq!(query::gold(&session), gold_before);
    assert_eq!(query::tower_price(&session, TowerKind::Archer), 188);
    assert_eq!(query::tower_view(&session).iter().count(), 2);
}

#[test]
fn a_success_resets_an_inflated_price_to_base() {
    let mut session = new_session();
    for index in 0..2 {
        let _ = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
    }

    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(2),
        },
    );
    let request = requested(&events);
    let _ = answer(&mut session, request, WRONG_CHOICE);
    assert_eq!(query::tower_price(&session, TowerKind::Archer), 150);

    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(2),
        },
    );
    let request = requested(&events);
    let _ = answer(&mut session, request, CORRECT_CHOICE);
    assert_eq!(
        query::tower_price(&session, TowerKind::Archer),
        TowerKind::Archer.stats().base_cost,
    );
}

#[test]
fn upgrade_gates_pre_deduct_and_refund_exactly_on_failure() {
    let mut session = new_session();
    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(0),
        },
    );
    let tower = events
        .iter()
        .find_map(|event| match event {
            Event::TowerPlaced { tower, .. } => Some(*tower),
            _ => None,
        })
        .expect("tower placed");
    let gold_before = query::gold(&session);
    let price = UpgradeKind::Toxin.base_cost();

    let events = submit(
        &mut session,
        Command::ProposeUpgrade {
            tower,
            upgrade: UpgradeKind::Toxin,
        },
    );
    assert_eq!(
        query::gold(&session),
        gold_before - price,
        "upgrade gold is pre-deducted while the question is open",
    );

    let request = requested(&events);
    let events = answer(&mut session, request, WRONG_CHOICE);
    let rolled_back = events.iter().find_map(|event| match event {
        Event::ProposalRolledBack { refunded, .. } => Some(*refunded),
        _ => None,
    });
    assert_eq!(rolled_back, Some(price));
    assert_eq!(
        query::gold(&session),
        gold_before,
        "a rollback must never leave net gold lower than before the proposal",
    );
    assert_eq!(query::upgrade_price(&session, UpgradeKind::Toxin), 175);
}

#[test]
fn an_unlocked_upgrade_is_purchased_directly_on_other_towers() {
    let mut session = new_session();
    let mut towers = Vec::new();
    for index in 0..2 {
        let events = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
        towers.push(
            events
                .iter()
                .find_map(|event| match event {
                    Event::TowerPlaced { tower, .. } => Some(*tower),
                    _ => None,
                })
                .expect("tower placed"),
        );
    }

    let events = submit(
        &mut session,
        Command::ProposeUpgrade {
            tower: towers[0],
            upgrade: UpgradeKind::Splash,
        },
    );
    let request = requested(&events);
    let events = answer(&mut session, request, CORRECT_CHOICE);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::UpgradeInstalled { .. })));

    // Second install of the same path: no proposal, gold charged directly.
    let events = submit(
        &mut session,
        Command::ProposeUpgrade {
            tower: towers[1],
            upgrade: UpgradeKind::Splash,
        },
    );
    assert!(
        matches!(events[0], Event::UpgradeInstalled { .. }),
        "an unlocked upgrade must bypass the quiz",
    );
}

#[test]
fn a_second_proposal_is_rejected_while_the_gate_is_busy() {
    let mut session = new_session();
    for index in 0..2 {
        let _ = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
    }
    let _ = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(2),
        },
    );

    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Freeze,
        },
    );
    assert_eq!(
        events,
        vec![Event::ProposalRejected {
            reason: ProposalError::GateBusy,
        }],
    );
}

#[test]
fn elemental_towers_stay_locked_below_the_answer_threshold() {
    let mut session = new_session();
    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Elemental,
            position: clear_spot(0),
        },
    );
    assert_eq!(
        events,
        vec![Event::ProposalRejected {
            reason: ProposalError::ElementalLocked,
        }],
    );
}

#[test]
fn ability_gates_pre_deduct_and_commit_into_a_selection_mode() {
    let mut session = new_session();
    let price = AbilityKind::Strike.base_cost();

    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Strike,
        },
    );
    assert!(matches!(
        events[0],
        Event::ProposalOpened {
            action: ProposedAction::ActivateAbility {
                ability: AbilityKind::Strike,
                ..
            },
        }
    ));
    assert_eq!(query::gold(&session), START_GOLD - price);

    let request = requested(&events);
    let _ = answer(&mut session, request, CORRECT_CHOICE);
    assert!(
        query::awaiting_strike_target(&session),
        "a committed strike waits for an enemy selection",
    );
}

#[test]
fn a_pending_strike_target_blocks_a_second_purchase() {
    let mut session = new_session();
    let price = AbilityKind::Strike.base_cost();
    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Strike,
        },
    );
    let request = requested(&events);
    let _ = answer(&mut session, request, CORRECT_CHOICE);
    assert!(query::awaiting_strike_target(&session));

    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Strike,
        },
    );
    assert_eq!(
        events,
        vec![Event::ProposalRejected {
            reason: ProposalError::TargetSelectionPending,
        }],
    );
    assert_eq!(
        query::gold(&session),
        START_GOLD - price,
        "only the first purchase charges gold",
    );
}

#[test]
fn a_failed_placement_revalidation_keeps_the_inflated_price() {
    let mut session = new_session();
    for index in 0..2 {
        let _ = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
    }
    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(2),
        },
    );
    let request = requested(&events);
    let _ = answer(&mut session, request, WRONG_CHOICE);
    let inflated = query::tower_price(&session, TowerKind::Archer);
    assert!(inflated > TowerKind::Archer.stats().base_cost);

    // Shrink the viewport while the question is up so the ghost lands in
    // the side panel when the correct answer tries to commit it.
    let events = submit(
        &mut session,
        Command::ProposeTower {
            kind: TowerKind::Archer,
            position: clear_spot(2),
        },
    );
    let request = requested(&events);
    let _ = submit(
        &mut session,
        Command::ConfigureViewport {
            width: 400.0,
            height: 600.0,
        },
    );
    let events = answer(&mut session, request, CORRECT_CHOICE);

    let rolled_back = events.iter().find_map(|event| match event {
        Event::ProposalRolledBack {
            refunded,
            new_price,
            ..
        } => Some((*refunded, *new_price)),
        _ => None,
    });
    assert_eq!(rolled_back, Some((0, inflated)));
    assert_eq!(query::tower_price(&session, TowerKind::Archer), inflated);
    assert_eq!(query::tower_view(&session).iter().count(), 2);
}

#[test]
fn cancelling_a_question_resolves_as_an_incorrect_answer() {
    let mut session = new_session();
    let events = submit(
        &mut session,
        Command::ProposeAbility {
            ability: AbilityKind::Freeze,
        },
    );
    let request = requested(&events);
    let _ = submit(
        &mut session,
        Command::PresentQuestion {
            request,
            question: QuestionId::new(0),
        },
    );
    let events = submit(&mut session, Command::CancelQuestion);

    let rolled_back = events.iter().find_map(|event| match event {
        Event::ProposalRolledBack { refunded, .. } => Some(*refunded),
        _ => None,
    });
    assert_eq!(rolled_back, Some(AbilityKind::Freeze.base_cost()));
    assert_eq!(query::gold(&session), START_GOLD);
}

#[test]
fn an_empty_bank_lets_every_gate_commit_immediately() {
    let mut session = Session::new(Vec::new(), Viewport::new(800.0, 600.0));
    for index in 0..3 {
        let events = submit(
            &mut session,
            Command::ProposeTower {
                kind: TowerKind::Archer,
                position: clear_spot(index),
            },
        );
        assert!(
            matches!(events[0], Event::TowerPlaced { .. }),
            "placement #{} should commit without a question",
            index + 1,
        );
    }
    assert_eq!(query::correct_answers(&session), 0);
}
