#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Quiz Defence.
//!
//! Adapters submit [`Command`] values through [`apply`] and observe the
//! results as [`Event`] values; pure systems read the session through
//! [`query`] and never touch it directly.

use std::time::Duration;

use quiz_defence_core::{
    AbilityKind, ChallengeBuff, ChallengeReward, Command, EnemyId, EnemyKind, Event,
    ProposalError, ProposedAction, QuestionId, QuestionPurpose, QuestionRequest, QuizQuestion,
    RemovalReason, ScoreBundle, SpeedMultiplier, TowerId, TowerKind, UpgradeKind, Viewport,
    WaveNumber, WorldPoint, BOSS_COUNTDOWN, CHALLENGE_BUFF_WAVES,
};

mod abilities;
mod combat;
mod economy;
mod enemies;
mod paths;
mod projectiles;
mod quiz;
mod towers;
mod waves;

use abilities::{AbilityState, SelectionMode, ABILITY_FREEZE_DURATION, BOOST_DURATION};
use combat::KillRecord;
use economy::{EconomyState, PopupFlow};
use enemies::{EnemyArena, EnemyFate};
use paths::StageState;
use projectiles::{ProjectileArena, ProjectileOutcome};
use quiz::QuizState;
use towers::{CombatModifiers, TowerRegistry};
use waves::WaveState;

/// Fraction of the question-open health a correct boss answer removes.
const BOSS_WEAKEN_DIVISOR: u32 = 10;

/// Flat gold bonus for a two-of-three challenge round.
const CHALLENGE_GOLD_REWARD: u32 = 75;

/// Free upgrade credits for a one-of-three challenge round.
const CHALLENGE_UPGRADE_CREDITS: u32 = 1;

/// Authoritative state of one defence session.
#[derive(Debug)]
pub struct Session {
    viewport: Viewport,
    speed: SpeedMultiplier,
    stage: StageState,
    enemies: EnemyArena,
    towers: TowerRegistry,
    projectiles: ProjectileArena,
    waves: WaveState,
    economy: EconomyState,
    abilities: AbilityState,
    quiz: QuizState,
    popup: PopupFlow,
    queued_boss: Option<EnemyId>,
    queued_challenge: Option<WaveNumber>,
    game_over: bool,
}

impl Session {
    /// Creates a fresh session around an externally validated question bank.
    #[must_use]
    pub fn new(questions: Vec<QuizQuestion>, viewport: Viewport) -> Self {
        Self {
            viewport,
            speed: SpeedMultiplier::Single,
            stage: StageState::new(viewport),
            enemies: EnemyArena::default(),
            towers: TowerRegistry::new(),
            projectiles: ProjectileArena::new(),
            waves: WaveState::new(),
            economy: EconomyState::new(),
            abilities: AbilityState::new(),
            quiz: QuizState::new(questions),
            popup: PopupFlow::Idle,
            queued_boss: None,
            queued_challenge: None,
            game_over: false,
        }
    }
}

/// Applies a command to the session and records the resulting events.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureViewport { width, height } => {
            session.viewport = Viewport::new(width, height);
            session.stage.rescale(session.viewport);
        }
        Command::Tick { dt } => tick(session, dt, out_events),
        Command::StartWave => start_wave(session, out_events),
        Command::SetSpeedMultiplier { multiplier } => {
            // The toggle is only live while a wave runs.
            if !session.game_over && session.waves.active() && session.speed != multiplier {
                session.speed = multiplier;
                out_events.push(Event::SpeedChanged { multiplier });
            }
        }
        Command::SpawnEnemy { kind } => spawn_enemy(session, kind, out_events),
        Command::FireProjectile { tower, target } => {
            fire_projectile(session, tower, target, out_events);
        }
        Command::MeleeStrike { tower, target } => {
            melee_strike(session, tower, target, out_events);
        }
        Command::ProposeTower { kind, position } => {
            propose_tower(session, kind, position, out_events);
        }
        Command::ProposeUpgrade { tower, upgrade } => {
            propose_upgrade(session, tower, upgrade, out_events);
        }
        Command::ProposeAbility { ability } => propose_ability(session, ability, out_events),
        Command::PresentQuestion { request, question } => {
            present_question(session, request, question, out_events);
        }
        Command::AnswerQuestion { choice } => answer_question(session, Some(choice), out_events),
        Command::CancelQuestion => answer_question(session, None, out_events),
        Command::SelectStrikeTarget { enemy } => select_strike_target(session, enemy, out_events),
        Command::SelectBoostTower { tower } => select_boost_tower(session, tower, out_events),
        Command::RemoveTower { tower } => remove_tower(session, tower, out_events),
        Command::ChooseChallengeBuff { buff } => choose_buff(session, buff, out_events),
    }
}

fn modifiers(session: &Session) -> CombatModifiers {
    CombatModifiers {
        boss_buff: session.economy.boss_buff,
        rapid_fire: session.economy.buff_active(ChallengeBuff::RapidFire),
    }
}

fn tick(session: &mut Session, dt: Duration, out_events: &mut Vec<Event>) {
    if session.game_over {
        return;
    }

    // Real-time concerns first: input lock, ability cooldowns, the boss
    // countdown. Everything on the battlefield runs on scaled time.
    session.stage.advance_lock(dt);
    session.abilities.advance(dt, session.waves.active());
    tick_boss_countdown(session, dt, out_events);

    let scaled = dt * session.speed.factor();
    out_events.push(Event::TimeAdvanced { dt: scaled });

    session.towers.advance(scaled, dt);

    let mut fates = Vec::new();
    session.enemies.advance(scaled, &session.stage, &mut fates);
    for fate in fates {
        match fate {
            EnemyFate::Died { enemy, bounty } => {
                let awarded = session.economy.kill_bounty(bounty);
                session.economy.credit(awarded);
                clear_boss_question(session, enemy);
                out_events.push(Event::EnemyDied {
                    enemy,
                    bounty: awarded,
                });
            }
            EnemyFate::Escaped { enemy } => {
                session.economy.lives -= 1;
                clear_boss_question(session, enemy);
                out_events.push(Event::EnemyEscaped {
                    enemy,
                    lives_remaining: session.economy.lives,
                });
                if session.economy.lives <= 0 {
                    finish(session, out_events);
                    return;
                }
            }
        }
    }

    let mut outcomes = Vec::new();
    session
        .projectiles
        .advance(scaled, &session.enemies, &mut outcomes);
    let mut kills = Vec::new();
    for outcome in outcomes {
        match outcome {
            ProjectileOutcome::Hit {
                target,
                damage,
                upgrades,
                element,
                ..
            } => {
                let area = session.economy.buff_active(ChallengeBuff::AreaDamage);
                combat::resolve_hit(
                    &mut session.enemies,
                    target,
                    damage,
                    upgrades,
                    element,
                    area,
                    &mut kills,
                );
            }
            ProjectileOutcome::Expired { projectile } => {
                out_events.push(Event::ProjectileExpired { projectile });
            }
        }
    }
    credit_kills(session, kills, out_events);

    if let Some(wave) = session.waves.try_complete(session.enemies.len()) {
        complete_wave(session, wave, out_events);
    }
}

fn tick_boss_countdown(session: &mut Session, dt: Duration, out_events: &mut Vec<Event>) {
    let timed_out = match &mut session.popup {
        PopupFlow::BossOpen { remaining, .. } => {
            *remaining = remaining.saturating_sub(dt);
            remaining.is_zero()
        }
        _ => false,
    };
    if timed_out {
        // Timeout resolves exactly like an incorrect answer.
        answer_question(session, None, out_events);
    }
}

fn credit_kills(session: &mut Session, kills: Vec<KillRecord>, out_events: &mut Vec<Event>) {
    for kill in kills {
        let awarded = session.economy.kill_bounty(kill.bounty);
        session.economy.credit(awarded);
        clear_boss_question(session, kill.enemy);
        out_events.push(Event::EnemyDied {
            enemy: kill.enemy,
            bounty: awarded,
        });
    }
}

fn clear_boss_question(session: &mut Session, enemy: EnemyId) {
    if session.queued_boss == Some(enemy) {
        session.queued_boss = None;
    }
    let concerns_enemy = matches!(
        &session.popup,
        PopupFlow::BossAwaiting { enemy: e, .. } | PopupFlow::BossOpen { enemy: e, .. }
            if *e == enemy
    );
    if concerns_enemy {
        session.popup = PopupFlow::Idle;
    }
}

fn start_wave(session: &mut Session, out_events: &mut Vec<Event>) {
    if session.game_over || session.stage.input_locked() {
        return;
    }
    if let Some((wave, quota)) = session.waves.start_next() {
        out_events.push(Event::WaveStarted { wave, quota });
    }
}

fn spawn_enemy(session: &mut Session, kind: EnemyKind, out_events: &mut Vec<Event>) {
    if session.game_over || !session.waves.active() || session.waves.remaining_to_spawn() == 0 {
        return;
    }
    let Some((enemy, path)) = session
        .enemies
        .spawn(kind, session.waves.wave(), &session.stage)
    else {
        return;
    };
    session.waves.record_spawn();
    out_events.push(Event::EnemySpawned { enemy, kind, path });

    if kind == EnemyKind::Boss && !session.quiz.is_empty() {
        if session.popup.is_idle() {
            open_boss_question(session, enemy, out_events);
        } else {
            session.queued_boss = Some(enemy);
        }
    }
}

fn open_boss_question(
    session: &mut Session,
    enemy: EnemyId,
    out_events: &mut Vec<Event>,
) {
    let request = session
        .quiz
        .next_request(QuestionPurpose::Boss, session.waves.wave());
    session.popup = PopupFlow::BossAwaiting { enemy, request };
    out_events.push(Event::QuestionRequested { request });
}

fn fire_projectile(
    session: &mut Session,
    tower: TowerId,
    target: EnemyId,
    out_events: &mut Vec<Event>,
) {
    if session.game_over {
        return;
    }
    let Some((damage, cooldown)) = session.towers.effective_attack(tower, modifiers(session))
    else {
        return;
    };
    let ready_and_ranged = session
        .towers
        .get(tower)
        .map_or(false, |entry| entry.kind.is_ranged() && entry.ready());
    if !ready_and_ranged || session.enemies.get(target).is_none() {
        return;
    }

    let Some(entry) = session.towers.get_mut(tower) else {
        return;
    };
    let element = if entry.kind == TowerKind::Elemental {
        Some(entry.rotate_element())
    } else {
        None
    };
    let origin = entry.position;
    let upgrades = entry.upgrades;
    entry.start_cooldown(cooldown);

    let projectile = session
        .projectiles
        .launch(tower, target, origin, damage, upgrades, element);
    out_events.push(Event::ProjectileLaunched {
        projectile,
        tower,
        target,
    });
}

fn melee_strike(
    session: &mut Session,
    tower: TowerId,
    target: EnemyId,
    out_events: &mut Vec<Event>,
) {
    if session.game_over {
        return;
    }
    let Some((damage, cooldown)) = session.towers.effective_attack(tower, modifiers(session))
    else {
        return;
    };
    let valid = session
        .towers
        .get(tower)
        .map_or(false, |entry| entry.kind == TowerKind::Melee && entry.ready());
    if !valid || session.enemies.get(target).is_none() {
        return;
    }

    let upgrades = session
        .towers
        .get(tower)
        .map(|entry| entry.upgrades)
        .unwrap_or_default();
    let area = session.economy.buff_active(ChallengeBuff::AreaDamage);
    let mut kills = Vec::new();
    combat::resolve_hit(
        &mut session.enemies,
        target,
        damage,
        upgrades,
        None,
        area,
        &mut kills,
    );
    if let Some(entry) = session.towers.get_mut(tower) {
        entry.start_cooldown(cooldown);
    }
    credit_kills(session, kills, out_events);
}

fn reject(out_events: &mut Vec<Event>, reason: ProposalError) {
    out_events.push(Event::ProposalRejected { reason });
}

/// Common guards shared by all three proposal entry points.
fn proposal_guard(session: &Session) -> Option<ProposalError> {
    if session.game_over {
        return Some(ProposalError::SessionOver);
    }
    if session.stage.input_locked() {
        return Some(ProposalError::InputLocked);
    }
    if !session.popup.is_idle() {
        return Some(ProposalError::GateBusy);
    }
    None
}

fn propose_tower(
    session: &mut Session,
    kind: TowerKind,
    position: WorldPoint,
    out_events: &mut Vec<Event>,
) {
    if let Some(reason) = proposal_guard(session) {
        reject(out_events, reason);
        return;
    }
    if kind == TowerKind::Elemental && !session.economy.elemental_unlocked() {
        reject(out_events, ProposalError::ElementalLocked);
        return;
    }
    if let Err(reason) =
        session
            .towers
            .validate_position(kind, position, session.viewport, &session.stage)
    {
        reject(out_events, reason);
        return;
    }
    let price = session.economy.prices.tower(kind);
    if !session.economy.can_afford(price) {
        reject(out_events, ProposalError::InsufficientGold);
        return;
    }

    if session.economy.placement_ungated() || session.quiz.is_empty() {
        place_tower(session, kind, position, price, out_events);
        return;
    }

    let action = ProposedAction::PlaceTower {
        kind,
        position,
        price,
    };
    let request = session
        .quiz
        .next_request(QuestionPurpose::Gate, session.waves.wave());
    session.popup = PopupFlow::ProposalAwaiting {
        action: action.clone(),
        request,
    };
    out_events.push(Event::ProposalOpened { action });
    out_events.push(Event::QuestionRequested { request });
}

fn place_tower(
    session: &mut Session,
    kind: TowerKind,
    position: WorldPoint,
    price: u32,
    out_events: &mut Vec<Event>,
) {
    session.economy.deduct(price);
    let tower = session.towers.insert(kind, position);
    session.economy.towers_placed += 1;
    out_events.push(Event::TowerPlaced {
        tower,
        kind,
        position,
        price,
    });
}

fn propose_upgrade(
    session: &mut Session,
    tower: TowerId,
    upgrade: UpgradeKind,
    out_events: &mut Vec<Event>,
) {
    if let Some(reason) = proposal_guard(session) {
        reject(out_events, reason);
        return;
    }
    let Some(entry) = session.towers.get(tower) else {
        reject(out_events, ProposalError::UnknownTower);
        return;
    };
    if entry.upgrades.has(upgrade) {
        reject(out_events, ProposalError::AlreadyInstalled);
        return;
    }
    // One upgrade per tower, and the splash path is ranged-only.
    if entry.upgrades.any() || (upgrade == UpgradeKind::Splash && !entry.kind.is_ranged()) {
        reject(out_events, ProposalError::UpgradeConflict);
        return;
    }

    if session.economy.upgrade_unlocked(upgrade) {
        let price = if session.economy.upgrade_credits > 0 {
            session.economy.upgrade_credits -= 1;
            0
        } else {
            let price = session.economy.prices.upgrade(upgrade);
            if !session.economy.can_afford(price) {
                reject(out_events, ProposalError::InsufficientGold);
                return;
            }
            session.economy.deduct(price);
            price
        };
        install_upgrade(session, tower, upgrade);
        out_events.push(Event::UpgradeInstalled {
            tower,
            upgrade,
            price,
        });
        return;
    }

    let price = session.economy.prices.upgrade(upgrade);
    if !session.economy.can_afford(price) {
        reject(out_events, ProposalError::InsufficientGold);
        return;
    }
    // Upgrade gold is pre-deducted and refunded on rollback.
    session.economy.deduct(price);

    if session.quiz.is_empty() {
        session.economy.unlock_upgrade(upgrade);
        install_upgrade(session, tower, upgrade);
        out_events.push(Event::UpgradeInstalled {
            tower,
            upgrade,
            price,
        });
        return;
    }

    let action = ProposedAction::InstallUpgrade {
        tower,
        upgrade,
        price,
    };
    let request = session
        .quiz
        .next_request(QuestionPurpose::Gate, session.waves.wave());
    session.popup = PopupFlow::ProposalAwaiting {
        action: action.clone(),
        request,
    };
    out_events.push(Event::ProposalOpened { action });
    out_events.push(Event::QuestionRequested { request });
}

fn install_upgrade(session: &mut Session, tower: TowerId, upgrade: UpgradeKind) {
    if let Some(entry) = session.towers.get_mut(tower) {
        entry.upgrades = entry.upgrades.with(upgrade);
    }
}

fn propose_ability(session: &mut Session, ability: AbilityKind, out_events: &mut Vec<Event>) {
    if let Some(reason) = proposal_guard(session) {
        reject(out_events, reason);
        return;
    }
    // A Strike or Boost purchase only starts its cooldown once the target is
    // picked, so a pending selection must also block a second purchase.
    if session.abilities.selection != SelectionMode::None {
        reject(out_events, ProposalError::TargetSelectionPending);
        return;
    }
    if !session.abilities.ready(ability) {
        reject(out_events, ProposalError::AbilityOnCooldown);
        return;
    }
    if ability == AbilityKind::Boost && !session.towers.has_support_tower() {
        reject(out_events, ProposalError::SupportTowerRequired);
        return;
    }
    let price = session.economy.prices.ability(ability);
    if !session.economy.can_afford(price) {
        reject(out_events, ProposalError::InsufficientGold);
        return;
    }
    // Ability gold is pre-deducted and refunded on rollback.
    session.economy.deduct(price);

    if session.quiz.is_empty() {
        execute_ability(session, ability, out_events);
        return;
    }

    let action = ProposedAction::ActivateAbility { ability, price };
    let request = session
        .quiz
        .next_request(QuestionPurpose::Gate, session.waves.wave());
    session.popup = PopupFlow::ProposalAwaiting {
        action: action.clone(),
        request,
    };
    out_events.push(Event::ProposalOpened { action });
    out_events.push(Event::QuestionRequested { request });
}

fn execute_ability(session: &mut Session, ability: AbilityKind, out_events: &mut Vec<Event>) {
    match ability {
        AbilityKind::Strike => {
            session.abilities.selection = SelectionMode::StrikeTarget;
        }
        AbilityKind::Freeze => {
            for enemy in session.enemies.iter_mut() {
                enemy.freeze(ABILITY_FREEZE_DURATION);
            }
            session.abilities.start_cooldown(AbilityKind::Freeze);
            out_events.push(Event::AbilityActivated {
                ability: AbilityKind::Freeze,
            });
        }
        AbilityKind::Boost => {
            session.abilities.selection = SelectionMode::BoostTower;
        }
    }
}

fn present_question(
    session: &mut Session,
    request: QuestionRequest,
    question: QuestionId,
    out_events: &mut Vec<Event>,
) {
    if session.quiz.question(question).is_none() {
        return;
    }
    match session.popup.clone() {
        PopupFlow::ProposalAwaiting {
            action,
            request: expected,
        } if expected == request => {
            session.quiz.record_presented(question);
            session.popup = PopupFlow::ProposalOpen { action, question };
            out_events.push(Event::QuestionPresented {
                question,
                purpose: QuestionPurpose::Gate,
            });
        }
        PopupFlow::BossAwaiting {
            enemy,
            request: expected,
        } if expected == request => {
            let Some(boss) = session.enemies.get(enemy) else {
                session.popup = PopupFlow::Idle;
                drain_popup_queue(session, out_events);
                return;
            };
            let health_basis = boss.health;
            session.quiz.record_presented(question);
            session.popup = PopupFlow::BossOpen {
                enemy,
                question,
                remaining: BOSS_COUNTDOWN,
                health_basis,
            };
            out_events.push(Event::QuestionPresented {
                question,
                purpose: QuestionPurpose::Boss,
            });
            out_events.push(Event::BossQuestionOpened {
                enemy,
                deadline: BOSS_COUNTDOWN,
            });
        }
        PopupFlow::ChallengeAwaiting {
            wave,
            index,
            correct,
            request: expected,
        } if expected == request => {
            session.quiz.record_presented(question);
            session.popup = PopupFlow::ChallengeOpen {
                wave,
                index,
                correct,
                question,
            };
            out_events.push(Event::QuestionPresented {
                question,
                purpose: QuestionPurpose::Challenge { index },
            });
        }
        _ => {}
    }
}

/// Resolves the open question; `None` stands for cancellation or timeout.
fn answer_question(session: &mut Session, choice: Option<usize>, out_events: &mut Vec<Event>) {
    let flow = std::mem::replace(&mut session.popup, PopupFlow::Idle);
    match flow {
        PopupFlow::ProposalOpen { action, question } => {
            let correct = is_correct(session, question, choice);
            if correct {
                commit_proposal(session, action, out_events);
            } else {
                session.quiz.record_missed(question);
                rollback_proposal(session, action, out_events);
            }
            drain_popup_queue(session, out_events);
        }
        PopupFlow::BossOpen {
            enemy,
            question,
            health_basis,
            ..
        } => {
            let correct = is_correct(session, question, choice);
            resolve_boss_answer(session, enemy, question, health_basis, correct, out_events);
            drain_popup_queue(session, out_events);
        }
        PopupFlow::ChallengeOpen {
            wave,
            index,
            correct,
            question,
        } => {
            let right = is_correct(session, question, choice);
            let correct = if right {
                session.economy.correct_answers += 1;
                correct + 1
            } else {
                session.quiz.record_missed(question);
                correct
            };
            advance_challenge(session, wave, index, correct, out_events);
            drain_popup_queue(session, out_events);
        }
        // The buff menu has no wrong answer; only a choice closes it.
        PopupFlow::ChallengeChoice { wave } => {
            session.popup = PopupFlow::ChallengeChoice { wave };
        }
        other => {
            session.popup = other;
        }
    }
}

fn is_correct(session: &Session, question: QuestionId, choice: Option<usize>) -> bool {
    match choice {
        Some(choice) => session
            .quiz
            .question(question)
            .map_or(false, |entry| entry.is_correct_choice(choice)),
        None => false,
    }
}

fn commit_proposal(session: &mut Session, action: ProposedAction, out_events: &mut Vec<Event>) {
    session.economy.correct_answers += 1;
    match action {
        ProposedAction::PlaceTower {
            kind,
            position,
            price,
        } => {
            // The battlefield kept running while the question was open; a
            // stage swap or purchase may have invalidated the ghost.
            let still_valid = session
                .towers
                .validate_position(kind, position, session.viewport, &session.stage)
                .is_ok()
                && session.economy.can_afford(price);
            if !still_valid {
                out_events.push(Event::ProposalRolledBack {
                    action: ProposedAction::PlaceTower {
                        kind,
                        position,
                        price,
                    },
                    refunded: 0,
                    new_price: session.economy.prices.tower(kind),
                });
                return;
            }
            session.economy.prices.reset_tower(kind);
            out_events.push(Event::ProposalCommitted {
                action: ProposedAction::PlaceTower {
                    kind,
                    position,
                    price,
                },
                correct_answers: session.economy.correct_answers,
            });
            place_tower(session, kind, position, price, out_events);
        }
        ProposedAction::InstallUpgrade {
            tower,
            upgrade,
            price,
        } => {
            session.economy.unlock_upgrade(upgrade);
            session.economy.prices.reset_upgrade(upgrade);
            out_events.push(Event::ProposalCommitted {
                action: ProposedAction::InstallUpgrade {
                    tower,
                    upgrade,
                    price,
                },
                correct_answers: session.economy.correct_answers,
            });
            if session.towers.get(tower).is_some() {
                install_upgrade(session, tower, upgrade);
                out_events.push(Event::UpgradeInstalled {
                    tower,
                    upgrade,
                    price,
                });
            } else {
                // The tower vanished mid-question; the unlock stands.
                session.economy.credit(price);
            }
        }
        ProposedAction::ActivateAbility { ability, price } => {
            session.economy.prices.reset_ability(ability);
            out_events.push(Event::ProposalCommitted {
                action: ProposedAction::ActivateAbility { ability, price },
                correct_answers: session.economy.correct_answers,
            });
            execute_ability(session, ability, out_events);
        }
    }
}

fn rollback_proposal(session: &mut Session, action: ProposedAction, out_events: &mut Vec<Event>) {
    let (refunded, new_price) = match &action {
        ProposedAction::PlaceTower { kind, .. } => (0, session.economy.prices.inflate_tower(*kind)),
        ProposedAction::InstallUpgrade { upgrade, price, .. } => {
            session.economy.credit(*price);
            (*price, session.economy.prices.inflate_upgrade(*upgrade))
        }
        ProposedAction::ActivateAbility { ability, price } => {
            session.economy.credit(*price);
            (*price, session.economy.prices.inflate_ability(*ability))
        }
    };
    out_events.push(Event::ProposalRolledBack {
        action,
        refunded,
        new_price,
    });
}

fn resolve_boss_answer(
    session: &mut Session,
    enemy: EnemyId,
    question: QuestionId,
    health_basis: u32,
    correct: bool,
    out_events: &mut Vec<Event>,
) {
    if correct {
        session.economy.correct_answers += 1;
        let health_reduction = health_basis / BOSS_WEAKEN_DIVISOR;
        if let Some(boss) = session.enemies.get_mut(enemy) {
            boss.weaken(health_reduction);
            out_events.push(Event::BossWeakened {
                enemy,
                health_reduction,
            });
        }
        // The reward buff holds for the remainder of the wave.
        session.economy.boss_buff = true;
    } else {
        session.quiz.record_missed(question);
        if let Some(boss) = session.enemies.get_mut(enemy) {
            boss.enrage();
            out_events.push(Event::BossEnraged { enemy });
        }
    }
}

fn start_challenge(session: &mut Session, wave: WaveNumber, out_events: &mut Vec<Event>) {
    if session.quiz.is_empty() {
        return;
    }
    out_events.push(Event::ChallengeStarted { wave });
    let request = session
        .quiz
        .next_request(QuestionPurpose::Challenge { index: 0 }, wave);
    session.popup = PopupFlow::ChallengeAwaiting {
        wave,
        index: 0,
        correct: 0,
        request,
    };
    out_events.push(Event::QuestionRequested { request });
}

fn advance_challenge(
    session: &mut Session,
    wave: WaveNumber,
    index: u8,
    correct: u8,
    out_events: &mut Vec<Event>,
) {
    if index < 2 {
        let next = index + 1;
        let request = session
            .quiz
            .next_request(QuestionPurpose::Challenge { index: next }, wave);
        session.popup = PopupFlow::ChallengeAwaiting {
            wave,
            index: next,
            correct,
            request,
        };
        out_events.push(Event::QuestionRequested { request });
        return;
    }

    let reward = match correct {
        3 => ChallengeReward::BuffChoice,
        2 => {
            session.economy.credit(CHALLENGE_GOLD_REWARD);
            ChallengeReward::Gold(CHALLENGE_GOLD_REWARD)
        }
        1 => {
            session.economy.upgrade_credits += CHALLENGE_UPGRADE_CREDITS;
            ChallengeReward::UpgradeCredits(CHALLENGE_UPGRADE_CREDITS)
        }
        _ => ChallengeReward::Nothing,
    };
    out_events.push(Event::ChallengeScored {
        wave,
        correct,
        reward,
    });
    if correct == 3 {
        session.popup = PopupFlow::ChallengeChoice { wave };
    }
}

fn drain_popup_queue(session: &mut Session, out_events: &mut Vec<Event>) {
    if !session.popup.is_idle() {
        return;
    }
    while let Some(enemy) = session.queued_boss.take() {
        if session.enemies.get(enemy).is_some() {
            open_boss_question(session, enemy, out_events);
            return;
        }
    }
    if let Some(wave) = session.queued_challenge.take() {
        start_challenge(session, wave, out_events);
    }
}

fn select_strike_target(
    session: &mut Session,
    enemy: EnemyId,
    out_events: &mut Vec<Event>,
) {
    if session.game_over || session.abilities.selection != SelectionMode::StrikeTarget {
        return;
    }
    if session.enemies.get(enemy).is_none() {
        return;
    }
    let mut kills = Vec::new();
    combat::resolve_strike(&mut session.enemies, enemy, &mut kills);
    session.abilities.selection = SelectionMode::None;
    session.abilities.start_cooldown(AbilityKind::Strike);
    out_events.push(Event::AbilityActivated {
        ability: AbilityKind::Strike,
    });
    credit_kills(session, kills, out_events);
}

fn select_boost_tower(session: &mut Session, tower: TowerId, out_events: &mut Vec<Event>) {
    if session.game_over || session.abilities.selection != SelectionMode::BoostTower {
        return;
    }
    let is_support = session
        .towers
        .get(tower)
        .map_or(false, |entry| entry.kind == TowerKind::Support);
    if !is_support {
        return;
    }
    if let Some(entry) = session.towers.get_mut(tower) {
        entry.start_boost(BOOST_DURATION);
    }
    session.abilities.selection = SelectionMode::None;
    session.abilities.start_cooldown(AbilityKind::Boost);
    out_events.push(Event::AbilityActivated {
        ability: AbilityKind::Boost,
    });
}

fn remove_tower(session: &mut Session, tower: TowerId, out_events: &mut Vec<Event>) {
    if session.game_over || session.stage.input_locked() {
        return;
    }
    if session.towers.remove(tower) {
        out_events.push(Event::TowerRemoved {
            tower,
            reason: RemovalReason::PlayerRequest,
        });
    } else {
        reject(out_events, ProposalError::UnknownTower);
    }
}

fn choose_buff(
    session: &mut Session,
    buff: ChallengeBuff,
    out_events: &mut Vec<Event>,
) {
    if !matches!(session.popup, PopupFlow::ChallengeChoice { .. }) {
        return;
    }
    session.economy.set_buff(buff, CHALLENGE_BUFF_WAVES);
    session.popup = PopupFlow::Idle;
    out_events.push(Event::ChallengeBuffChosen { buff });
    drain_popup_queue(session, out_events);
}

fn complete_wave(session: &mut Session, wave: WaveNumber, out_events: &mut Vec<Event>) {
    out_events.push(Event::WaveCompleted { wave });

    // The boss reward buff never outlives its wave.
    session.economy.boss_buff = false;
    session.economy.decay_buff();

    if wave.is_stage_milestone() {
        session.stage.advance(session.viewport);
        let removed_towers = session.towers.clearance_violators(&session.stage);
        for &tower in &removed_towers {
            let _ = session.towers.remove(tower);
            out_events.push(Event::TowerRemoved {
                tower,
                reason: RemovalReason::StagePathConflict,
            });
        }
        out_events.push(Event::StageAdvanced {
            stage: session.stage.index(),
            removed_towers,
        });
    }

    if wave.is_challenge_wave() && !session.quiz.is_empty() {
        if session.popup.is_idle() {
            start_challenge(session, wave, out_events);
        } else {
            session.queued_challenge = Some(wave);
        }
    }
}

fn finish(session: &mut Session, out_events: &mut Vec<Event>) {
    if session.game_over {
        return;
    }
    session.game_over = true;
    session.popup = PopupFlow::Idle;
    session.queued_boss = None;
    session.queued_challenge = None;
    out_events.push(Event::GameOver {
        score: ScoreBundle {
            wave: session.waves.wave(),
            gold: session.economy.gold,
            correct_answers: session.economy.correct_answers,
            towers_placed: session.economy.towers_placed,
        },
    });
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use super::{PopupFlow, Session};
    use quiz_defence_core::{
        AbilitySnapshot, ChallengeBuff, EnemyView, PathId, ProjectileView, QuestionBankView,
        QuestionId, QuestionPurpose, ScoreBundle, SpeedMultiplier, TowerCooldownView, TowerKind,
        TowerView, UpgradeKind, Viewport, WaveNumber, WorldPoint,
    };

    /// Gold currently held by the player.
    #[must_use]
    pub fn gold(session: &Session) -> u32 {
        session.economy.gold
    }

    /// Lives remaining before the session ends.
    #[must_use]
    pub fn lives(session: &Session) -> i32 {
        session.economy.lives
    }

    /// Number of the current wave; zero before the first start.
    #[must_use]
    pub fn wave(session: &Session) -> WaveNumber {
        session.waves.wave()
    }

    /// Reports whether a wave is currently in progress.
    #[must_use]
    pub fn wave_active(session: &Session) -> bool {
        session.waves.active()
    }

    /// Enemies the active wave has yet to spawn.
    #[must_use]
    pub fn remaining_to_spawn(session: &Session) -> u32 {
        session.waves.remaining_to_spawn()
    }

    /// Active simulation speed multiplier.
    #[must_use]
    pub fn speed(session: &Session) -> SpeedMultiplier {
        session.speed
    }

    /// Zero-based index of the active stage.
    #[must_use]
    pub fn stage_index(session: &Session) -> u32 {
        session.stage.index()
    }

    /// Reports whether player input is locked by a stage swap.
    #[must_use]
    pub fn input_locked(session: &Session) -> bool {
        session.stage.input_locked()
    }

    /// Reports whether the session reached its terminal state.
    #[must_use]
    pub fn game_over(session: &Session) -> bool {
        session.game_over
    }

    /// Play-area dimensions the session was configured with.
    #[must_use]
    pub fn viewport(session: &Session) -> Viewport {
        session.viewport
    }

    /// Current, possibly inflated, price of placing a tower kind.
    #[must_use]
    pub fn tower_price(session: &Session, kind: TowerKind) -> u32 {
        session.economy.prices.tower(kind)
    }

    /// Current, possibly inflated, price of an upgrade path.
    #[must_use]
    pub fn upgrade_price(session: &Session, kind: UpgradeKind) -> u32 {
        session.economy.prices.upgrade(kind)
    }

    /// Free upgrade credits earned from challenge rounds.
    #[must_use]
    pub fn upgrade_credits(session: &Session) -> u32 {
        session.economy.upgrade_credits
    }

    /// Cumulative correct quiz answers across all question purposes.
    #[must_use]
    pub fn correct_answers(session: &Session) -> u32 {
        session.economy.correct_answers
    }

    /// Snapshot of the three abilities: readiness, price and unlock state.
    #[must_use]
    pub fn ability_snapshots(session: &Session) -> Vec<AbilitySnapshot> {
        session
            .abilities
            .snapshots(session.towers.has_support_tower(), &session.economy.prices)
    }

    /// Reports whether the strike ability awaits an enemy selection.
    #[must_use]
    pub fn awaiting_strike_target(session: &Session) -> bool {
        session.abilities.selection == super::SelectionMode::StrikeTarget
    }

    /// Reports whether the boost ability awaits a support-tower selection.
    #[must_use]
    pub fn awaiting_boost_tower(session: &Session) -> bool {
        session.abilities.selection == super::SelectionMode::BoostTower
    }

    /// Active challenge buff with its remaining wave allowance.
    #[must_use]
    pub fn active_buff(session: &Session) -> Option<(ChallengeBuff, u32)> {
        session
            .economy
            .active_buff()
            .map(|active| (active.buff, active.waves_remaining))
    }

    /// Reports whether the boss reward buff is active this wave.
    #[must_use]
    pub fn boss_buff_active(session: &Session) -> bool {
        session.economy.boss_buff
    }

    /// Captures a read-only view of every living enemy.
    #[must_use]
    pub fn enemy_view(session: &Session) -> EnemyView {
        EnemyView::from_snapshots(session.enemies.snapshots())
    }

    /// Captures a read-only view of every placed tower.
    #[must_use]
    pub fn tower_view(session: &Session) -> TowerView {
        TowerView::from_snapshots(session.towers.snapshots())
    }

    /// Captures a read-only view of every in-flight projectile.
    #[must_use]
    pub fn projectile_view(session: &Session) -> ProjectileView {
        ProjectileView::from_snapshots(session.projectiles.snapshots())
    }

    /// Captures cooldown snapshots for every attacking tower.
    #[must_use]
    pub fn tower_cooldown_view(session: &Session) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(session.towers.cooldown_snapshots())
    }

    /// Read-only view of the question bank and its answer history.
    #[must_use]
    pub fn question_bank(session: &Session) -> QuestionBankView<'_> {
        session.quiz.view()
    }

    /// The question currently on screen, if any.
    #[must_use]
    pub fn open_question(session: &Session) -> Option<(QuestionId, QuestionPurpose)> {
        match &session.popup {
            PopupFlow::ProposalOpen { question, .. } => {
                Some((*question, QuestionPurpose::Gate))
            }
            PopupFlow::BossOpen { question, .. } => Some((*question, QuestionPurpose::Boss)),
            PopupFlow::ChallengeOpen {
                question, index, ..
            } => Some((*question, QuestionPurpose::Challenge { index: *index })),
            _ => None,
        }
    }

    /// Real time left on the boss countdown, while it is on screen.
    #[must_use]
    pub fn boss_countdown(session: &Session) -> Option<Duration> {
        match &session.popup {
            PopupFlow::BossOpen { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    /// Reports whether the perfect-round buff menu is on screen.
    #[must_use]
    pub fn awaiting_buff_choice(session: &Session) -> bool {
        matches!(session.popup, PopupFlow::ChallengeChoice { .. })
    }

    /// Waypoints of every active path, for adapters that draw the field.
    #[must_use]
    pub fn path_waypoints(session: &Session) -> Vec<(PathId, Vec<WorldPoint>)> {
        session
            .stage
            .paths()
            .iter()
            .map(|path| (path.id(), path.waypoints().to_vec()))
            .collect()
    }

    /// Live score preview with the session's current totals.
    #[must_use]
    pub fn score(session: &Session) -> ScoreBundle {
        ScoreBundle {
            wave: session.waves.wave(),
            gold: session.economy.gold,
            correct_answers: session.economy.correct_answers,
            towers_placed: session.economy.towers_placed,
        }
    }
}
