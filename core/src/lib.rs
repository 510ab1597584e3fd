#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Quiz Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the session executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values for
//! systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Width of the fixed side panel excluded from the play area.
pub const SIDE_PANEL_WIDTH: f32 = 280.0;

/// Minimum clearance between a tower centre and any path segment.
pub const PATH_CLEARANCE: f32 = 40.0;

/// Gold granted to the player at session start.
pub const START_GOLD: u32 = 1_000;

/// Lives granted to the player at session start.
pub const START_LIVES: i32 = 10;

/// Every wave whose number is a multiple of this ends with a boss spawn.
pub const BOSS_WAVE_INTERVAL: u32 = 5;

/// Every wave whose number is a multiple of this triggers a challenge round.
pub const CHALLENGE_WAVE_INTERVAL: u32 = 10;

/// Every wave whose number is a multiple of this swaps the active stage.
pub const STAGE_WAVE_INTERVAL: u32 = 12;

/// Number of tower placements that bypass the quiz gate at session start.
pub const UNGATED_PLACEMENTS: u32 = 2;

/// Cumulative correct answers required before elemental towers unlock.
pub const ELEMENTAL_UNLOCK_THRESHOLD: u32 = 10;

/// Number of waves a challenge-round buff remains active.
pub const CHALLENGE_BUFF_WAVES: u32 = 10;

/// Countdown applied to the timed boss question.
pub const BOSS_COUNTDOWN: Duration = Duration::from_secs(15);

/// RNG stream label used when deriving quiz-gate draw seeds.
pub const RNG_STREAM_GATE: &str = "gate";

/// RNG stream label used when deriving spaced-repetition draw seeds.
pub const RNG_STREAM_REVIEW: &str = "review";

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the play-area dimensions, rebuilding path geometry.
    ConfigureViewport {
        /// Width of the play area in world units, excluding the side panel.
        width: f32,
        /// Height of the play area in world units.
        height: f32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of real time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the next wave begin spawning.
    StartWave,
    /// Requests a change of the discrete simulation speed multiplier.
    SetSpeedMultiplier {
        /// Multiplier the session should activate.
        multiplier: SpeedMultiplier,
    },
    /// Requests that an enemy of the provided kind enter the battlefield.
    SpawnEnemy {
        /// Tier of the enemy to spawn.
        kind: EnemyKind,
    },
    /// Requests that a ranged tower launch a projectile at a target.
    FireProjectile {
        /// Identifier of the tower attempting to fire.
        tower: TowerId,
        /// Identifier of the enemy being targeted.
        target: EnemyId,
    },
    /// Requests that a melee tower strike a target directly.
    MeleeStrike {
        /// Identifier of the tower attempting to strike.
        tower: TowerId,
        /// Identifier of the enemy being struck.
        target: EnemyId,
    },
    /// Proposes placement of a tower at the provided position.
    ProposeTower {
        /// Kind of tower requested for placement.
        kind: TowerKind,
        /// Centre of the proposed tower footprint.
        position: WorldPoint,
    },
    /// Proposes installation of an upgrade on an existing tower.
    ProposeUpgrade {
        /// Identifier of the tower receiving the upgrade.
        tower: TowerId,
        /// Upgrade path requested for installation.
        upgrade: UpgradeKind,
    },
    /// Proposes activation of an active ability.
    ProposeAbility {
        /// Ability requested for activation.
        ability: AbilityKind,
    },
    /// Presents the selected question for the outstanding request.
    PresentQuestion {
        /// Request the presented question answers.
        request: QuestionRequest,
        /// Index of the selected question within the session bank.
        question: QuestionId,
    },
    /// Submits the player's chosen option for the open question.
    AnswerQuestion {
        /// Zero-based index of the chosen option.
        choice: usize,
    },
    /// Dismisses the open question, resolving it as an incorrect answer.
    CancelQuestion,
    /// Selects the enemy struck by a committed strike ability.
    SelectStrikeTarget {
        /// Identifier of the enemy to strike.
        enemy: EnemyId,
    },
    /// Selects the support tower boosted by a committed boost ability.
    SelectBoostTower {
        /// Identifier of the support tower to boost.
        tower: TowerId,
    },
    /// Requests removal of an existing tower.
    RemoveTower {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Chooses the buff granted by a perfect challenge round.
    ChooseChallengeBuff {
        /// Buff the player selected.
        buff: ChallengeBuff,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the scaled simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Number of the wave that started.
        wave: WaveNumber,
        /// Total enemies the wave will spawn, boss included.
        quota: u32,
    },
    /// Announces that a wave's quota was cleared and no enemies remain.
    WaveCompleted {
        /// Number of the wave that completed.
        wave: WaveNumber,
    },
    /// Confirms that an enemy entered the battlefield.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Tier of the spawned enemy.
        kind: EnemyKind,
        /// Path the enemy will traverse.
        path: PathId,
    },
    /// Reports that an enemy's health reached zero.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Gold awarded for the kill, buffs included.
        bounty: u32,
    },
    /// Reports that an enemy reached the final waypoint of its path.
    EnemyEscaped {
        /// Identifier of the enemy that escaped.
        enemy: EnemyId,
        /// Lives remaining after the escape.
        lives_remaining: i32,
    },
    /// Confirms that a tower was placed into the session.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Kind of tower that was placed.
        kind: TowerKind,
        /// Centre of the tower footprint.
        position: WorldPoint,
        /// Gold deducted for the placement.
        price: u32,
    },
    /// Confirms that a tower was removed from the session.
    TowerRemoved {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Cause of the removal.
        reason: RemovalReason,
    },
    /// Reports that a placement or proposal request was rejected.
    ProposalRejected {
        /// Specific reason the request failed.
        reason: ProposalError,
    },
    /// Announces that a proposal was created and awaits its question.
    ProposalOpened {
        /// Action held in the pending transaction.
        action: ProposedAction,
    },
    /// Asks the question-selection system to draw a question.
    QuestionRequested {
        /// Parameters of the requested draw.
        request: QuestionRequest,
    },
    /// Announces that a question popup opened for the player.
    QuestionPresented {
        /// Index of the presented question within the session bank.
        question: QuestionId,
        /// Purpose of the presentation.
        purpose: QuestionPurpose,
    },
    /// Confirms that a proposal's question was answered correctly.
    ProposalCommitted {
        /// Action that was committed.
        action: ProposedAction,
        /// Cumulative correct-answer count after the commit.
        correct_answers: u32,
    },
    /// Reports that a proposal was rolled back after a failed answer.
    ProposalRolledBack {
        /// Action that was discarded.
        action: ProposedAction,
        /// Gold refunded to the player, zero when nothing was pre-deducted.
        refunded: u32,
        /// Inflated price now charged for that action.
        new_price: u32,
    },
    /// Confirms that an already-unlocked upgrade was purchased directly.
    UpgradeInstalled {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Upgrade path that was installed.
        upgrade: UpgradeKind,
        /// Gold deducted, zero when a free credit was consumed.
        price: u32,
    },
    /// Confirms that a projectile was launched at a target.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired the projectile.
        tower: TowerId,
        /// Enemy the projectile homes toward.
        target: EnemyId,
    },
    /// Reports that a projectile was discarded without impact.
    ProjectileExpired {
        /// Identifier of the discarded projectile.
        projectile: ProjectileId,
    },
    /// Confirms that an ability finished executing and began cooling down.
    AbilityActivated {
        /// Ability that executed.
        ability: AbilityKind,
    },
    /// Announces that the timed boss question opened.
    BossQuestionOpened {
        /// Identifier of the boss the question concerns.
        enemy: EnemyId,
        /// Real-time countdown before the question times out.
        deadline: Duration,
    },
    /// Reports that a correct boss answer weakened the boss.
    BossWeakened {
        /// Identifier of the weakened boss.
        enemy: EnemyId,
        /// Health removed from both current and maximum health.
        health_reduction: u32,
    },
    /// Reports that a failed boss answer permanently empowered the boss.
    BossEnraged {
        /// Identifier of the empowered boss.
        enemy: EnemyId,
    },
    /// Announces that a challenge round began.
    ChallengeStarted {
        /// Wave whose completion triggered the challenge.
        wave: WaveNumber,
    },
    /// Reports the outcome of a finished challenge round.
    ChallengeScored {
        /// Wave whose completion triggered the challenge.
        wave: WaveNumber,
        /// Number of correctly answered challenge questions.
        correct: u8,
        /// Reward granted for the score.
        reward: ChallengeReward,
    },
    /// Confirms the buff chosen after a perfect challenge round.
    ChallengeBuffChosen {
        /// Buff now active for the coming waves.
        buff: ChallengeBuff,
    },
    /// Announces that the active stage changed and paths were swapped.
    StageAdvanced {
        /// Zero-based index of the stage that became active.
        stage: u32,
        /// Towers forcibly removed because the new paths ran under them.
        removed_towers: Vec<TowerId>,
    },
    /// Confirms that the simulation speed multiplier changed.
    SpeedChanged {
        /// Multiplier that became active.
        multiplier: SpeedMultiplier,
    },
    /// Terminal event carrying the final score; emitted exactly once.
    GameOver {
        /// Final score bundle for session-result persistence.
        score: ScoreBundle,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a question within the session's immutable bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(u32);

impl QuestionId {
    /// Creates a new question identifier with the provided bank index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the bank index of the question.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of one waypoint path within the active stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathId(u32);

impl PathId {
    /// Creates a new path identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-indexed wave counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a new wave number wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying wave index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the wave that follows this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Reports whether this wave ends with a boss spawn.
    #[must_use]
    pub const fn is_boss_wave(&self) -> bool {
        self.0 > 0 && self.0 % BOSS_WAVE_INTERVAL == 0
    }

    /// Reports whether completing this wave triggers a challenge round.
    #[must_use]
    pub const fn is_challenge_wave(&self) -> bool {
        self.0 > 0 && self.0 % CHALLENGE_WAVE_INTERVAL == 0
    }

    /// Reports whether completing this wave advances the stage.
    #[must_use]
    pub const fn is_stage_milestone(&self) -> bool {
        self.0 > 0 && self.0 % STAGE_WAVE_INTERVAL == 0
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new point from explicit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Computes the Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Computes the shortest distance from this point to a line segment.
    #[must_use]
    pub fn distance_to_segment(&self, start: WorldPoint, end: WorldPoint) -> f32 {
        let seg_x = end.x - start.x;
        let seg_y = end.y - start.y;
        let length_sq = seg_x * seg_x + seg_y * seg_y;
        if length_sq <= f32::EPSILON {
            return self.distance_to(start);
        }

        let t = ((self.x - start.x) * seg_x + (self.y - start.y) * seg_y) / length_sq;
        let t = t.clamp(0.0, 1.0);
        let closest = WorldPoint::new(start.x + seg_x * t, start.y + seg_y * t);
        self.distance_to(closest)
    }
}

/// Dimensions of the play area, excluding the fixed side panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: f32,
    height: f32,
}

impl Viewport {
    /// Creates a new viewport description.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width of the play area in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of the play area in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether the point lies inside the playable region.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x() >= 0.0 && point.x() <= self.width && point.y() >= 0.0 && point.y() <= self.height
    }
}

/// Discrete simulation speed multiplier, user-toggleable during waves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedMultiplier {
    /// Real-time simulation speed.
    Single,
    /// Double simulation speed.
    Double,
    /// Triple simulation speed.
    Triple,
}

impl SpeedMultiplier {
    /// Numeric factor applied to wave, enemy, tower and projectile time.
    #[must_use]
    pub const fn factor(&self) -> u32 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Returns the next multiplier in the 1x -> 2x -> 3x -> 1x cycle.
    #[must_use]
    pub const fn toggled(&self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Triple,
            Self::Triple => Self::Single,
        }
    }
}

/// Enemy tiers available to the spawn tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Weakest tier, the only kind spawned during early waves.
    Scout,
    /// Mid tier with more health and moderate speed.
    Soldier,
    /// Heavy tier with high health and low speed.
    Brute,
    /// Elevated tier closing every fifth wave; health scales with the wave.
    Boss,
}

/// Static combat statistics associated with an enemy tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Health the enemy spawns with.
    pub max_health: u32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Gold awarded when the enemy dies.
    pub bounty: u32,
}

impl EnemyKind {
    /// Returns the static statistics for the tier.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Scout => EnemyStats {
                max_health: 30,
                speed: 60.0,
                bounty: 8,
            },
            Self::Soldier => EnemyStats {
                max_health: 70,
                speed: 45.0,
                bounty: 14,
            },
            Self::Brute => EnemyStats {
                max_health: 150,
                speed: 30.0,
                bounty: 25,
            },
            Self::Boss => EnemyStats {
                max_health: 400,
                speed: 25.0,
                bounty: 100,
            },
        }
    }

    /// Health assigned to a boss spawned on the provided wave.
    ///
    /// Bosses gain half their base health again for every boss interval that
    /// has elapsed, so a wave-10 boss is strictly tougher than a wave-5 one.
    #[must_use]
    pub fn boss_health(wave: WaveNumber) -> u32 {
        let base = Self::Boss.stats().max_health;
        let intervals = wave.get() / BOSS_WAVE_INTERVAL;
        let bonus = base / 2;
        base.saturating_add(bonus.saturating_mul(intervals.saturating_sub(1)))
    }

    /// Spawn-probability weights for the standard tiers on the given wave.
    ///
    /// Early waves carry all mass on `Scout`; the mass shifts toward the
    /// higher tiers as the wave number grows. Weights are integer and the
    /// `Boss` tier never appears here because bosses spawn by schedule, not
    /// by probability.
    #[must_use]
    pub fn spawn_weights(wave: WaveNumber) -> [(EnemyKind, u32); 3] {
        let wave = wave.get();
        let scout = 60u32.saturating_sub(wave.saturating_mul(4)).max(10);
        let soldier = if wave >= 3 {
            (wave - 2).saturating_mul(6).min(50)
        } else {
            0
        };
        let brute = if wave >= 6 {
            (wave - 5).saturating_mul(4).min(40)
        } else {
            0
        };
        [
            (EnemyKind::Scout, scout),
            (EnemyKind::Soldier, soldier),
            (EnemyKind::Brute, brute),
        ]
    }
}

/// Tower variants available for placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Cheap ranged tower with a quick cadence and modest range.
    Archer,
    /// Expensive ranged tower with long range and heavy, slow shots.
    Cannon,
    /// Short-range tower that strikes directly without projectiles.
    Melee,
    /// Non-attacking tower that buffs nearby towers' damage and fire rate.
    Support,
    /// Late-game tower that rotates elemental effects; quiz-unlocked.
    Elemental,
}

/// Static statistics associated with a tower kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Gold price before any quiz-failure inflation.
    pub base_cost: u32,
    /// Targeting range in world units; zero for non-attacking kinds.
    pub range: f32,
    /// Base delay between consecutive attacks.
    pub cooldown: Duration,
    /// Base damage per attack.
    pub damage: u32,
    /// Visual footprint radius used for placement clearance.
    pub footprint_radius: f32,
}

impl TowerKind {
    /// Returns the static statistics for the kind.
    #[must_use]
    pub const fn stats(self) -> TowerStats {
        match self {
            Self::Archer => TowerStats {
                base_cost: 120,
                range: 140.0,
                cooldown: Duration::from_millis(850),
                damage: 12,
                footprint_radius: 18.0,
            },
            Self::Cannon => TowerStats {
                base_cost: 220,
                range: 200.0,
                cooldown: Duration::from_millis(1_800),
                damage: 34,
                footprint_radius: 22.0,
            },
            Self::Melee => TowerStats {
                base_cost: 90,
                range: 50.0,
                cooldown: Duration::from_millis(400),
                damage: 6,
                footprint_radius: 16.0,
            },
            Self::Support => TowerStats {
                base_cost: 180,
                range: 0.0,
                cooldown: Duration::from_secs(1),
                damage: 0,
                footprint_radius: 20.0,
            },
            Self::Elemental => TowerStats {
                base_cost: 320,
                range: 160.0,
                cooldown: Duration::from_millis(1_000),
                damage: 20,
                footprint_radius: 20.0,
            },
        }
    }

    /// Reports whether the kind attacks by launching homing projectiles.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Archer | Self::Cannon | Self::Elemental)
    }

    /// Reports whether the kind attacks at all.
    #[must_use]
    pub const fn attacks(self) -> bool {
        !matches!(self, Self::Support)
    }

    /// Enumerates every tower kind in a stable order.
    #[must_use]
    pub const fn all() -> [TowerKind; 5] {
        [
            Self::Archer,
            Self::Cannon,
            Self::Melee,
            Self::Support,
            Self::Elemental,
        ]
    }
}

/// Damage-type upgrade paths; a tower holds at most one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Attacks splash to every enemy near the impact point.
    Splash,
    /// Attacks attach a damage-over-time status to the target.
    Toxin,
}

impl UpgradeKind {
    /// Gold price of the upgrade before any quiz-failure inflation.
    #[must_use]
    pub const fn base_cost(self) -> u32 {
        match self {
            Self::Splash => 160,
            Self::Toxin => 140,
        }
    }

    /// Enumerates every upgrade kind in a stable order.
    #[must_use]
    pub const fn all() -> [UpgradeKind; 2] {
        [Self::Splash, Self::Toxin]
    }
}

/// Upgrade flags carried by a placed tower.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeFlags {
    splash: bool,
    toxin: bool,
}

impl UpgradeFlags {
    /// Creates a flag set with no upgrades installed.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            splash: false,
            toxin: false,
        }
    }

    /// Reports whether the provided upgrade is installed.
    #[must_use]
    pub const fn has(&self, upgrade: UpgradeKind) -> bool {
        match upgrade {
            UpgradeKind::Splash => self.splash,
            UpgradeKind::Toxin => self.toxin,
        }
    }

    /// Reports whether any damage-type upgrade is installed.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.splash || self.toxin
    }

    /// Returns a copy with the provided upgrade marked installed.
    #[must_use]
    pub const fn with(self, upgrade: UpgradeKind) -> Self {
        match upgrade {
            UpgradeKind::Splash => Self {
                splash: true,
                ..self
            },
            UpgradeKind::Toxin => Self {
                toxin: true,
                ..self
            },
        }
    }
}

/// Elemental effects the elemental tower rotates through per shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Attaches a damage-over-time burn.
    Ember,
    /// Applies a brief movement slow.
    Frost,
    /// Splashes damage around the impact point.
    Storm,
}

impl ElementKind {
    /// Returns the element that follows this one in the rotation.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Ember => Self::Frost,
            Self::Frost => Self::Storm,
            Self::Storm => Self::Ember,
        }
    }
}

/// Active abilities available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Burst damage strike against a selected enemy plus nearby splash.
    Strike,
    /// Crowd-control freeze applied to every living enemy.
    Freeze,
    /// Temporary boost of a selected support tower's aura.
    Boost,
}

impl AbilityKind {
    /// Gold price of the ability before any quiz-failure inflation.
    #[must_use]
    pub const fn base_cost(self) -> u32 {
        match self {
            Self::Strike => 150,
            Self::Freeze => 130,
            Self::Boost => 0,
        }
    }

    /// Cooldown started after a successful activation.
    #[must_use]
    pub const fn cooldown(self) -> Duration {
        match self {
            Self::Strike => Duration::from_secs(45),
            Self::Freeze => Duration::from_secs(60),
            Self::Boost => Duration::from_secs(90),
        }
    }

    /// Enumerates every ability in a stable order.
    #[must_use]
    pub const fn all() -> [AbilityKind; 3] {
        [Self::Strike, Self::Freeze, Self::Boost]
    }
}

/// Session-long buffs granted by a perfect challenge round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeBuff {
    /// Every enemy death awards one extra gold unit.
    GoldRush,
    /// Every attack, melee included, splashes in a small radius.
    AreaDamage,
    /// Every tower fires faster.
    RapidFire,
}

/// Reward granted for a finished challenge round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeReward {
    /// Perfect score: the player chooses one of three buffs.
    BuffChoice,
    /// Two correct answers: a flat gold bonus.
    Gold(u32),
    /// One correct answer: free upgrade credits.
    UpgradeCredits(u32),
    /// No correct answers: nothing.
    Nothing,
}

/// Reasons a placement, upgrade or ability request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalError {
    /// The position lies inside the non-game side panel region.
    InsideSidePanel,
    /// The position violates the minimum clearance to a path segment.
    TooCloseToPath,
    /// The position violates the clearance to an existing tower.
    TooCloseToTower,
    /// The player cannot afford the current, possibly inflated, price.
    InsufficientGold,
    /// Another proposal or mini-game question is already in flight.
    GateBusy,
    /// The elemental tower's correct-answer precondition is unmet.
    ElementalLocked,
    /// The referenced tower does not exist.
    UnknownTower,
    /// The tower already carries a damage-type upgrade.
    UpgradeConflict,
    /// The requested upgrade is already installed on that tower.
    AlreadyInstalled,
    /// The ability has not finished cooling down.
    AbilityOnCooldown,
    /// A previously purchased ability still awaits its target selection.
    TargetSelectionPending,
    /// Boost requires at least one placed support tower.
    SupportTowerRequired,
    /// Player input is locked during a stage transition.
    InputLocked,
    /// The session already ended.
    SessionOver,
}

/// Cause of a tower's removal from the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// The player explicitly deleted the tower.
    PlayerRequest,
    /// A stage transition relocated a path under the tower.
    StagePathConflict,
}

/// Tentative economic action held by the pending transaction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProposedAction {
    /// A tower placement awaiting its quiz answer.
    PlaceTower {
        /// Kind of tower proposed.
        kind: TowerKind,
        /// Centre of the proposed footprint.
        position: WorldPoint,
        /// Price that will be charged on commit.
        price: u32,
    },
    /// A first-time upgrade unlock awaiting its quiz answer.
    InstallUpgrade {
        /// Tower receiving the upgrade.
        tower: TowerId,
        /// Upgrade path proposed.
        upgrade: UpgradeKind,
        /// Gold pre-deducted, refunded on rollback.
        price: u32,
    },
    /// An ability activation awaiting its quiz answer.
    ActivateAbility {
        /// Ability proposed.
        ability: AbilityKind,
        /// Gold pre-deducted, refunded on rollback.
        price: u32,
    },
}

/// Purpose of a question draw, controlling its selection policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionPurpose {
    /// Uniform draw gating a pending proposal.
    Gate,
    /// Spaced-repetition draw for the timed boss question.
    Boss,
    /// Spaced-repetition draw for one of the three challenge questions.
    Challenge {
        /// Zero-based index of the question within the round.
        index: u8,
    },
}

/// Parameters of a question draw requested from the selection system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// Purpose of the draw.
    pub purpose: QuestionPurpose,
    /// Wave active when the draw was requested.
    pub wave: WaveNumber,
    /// Monotonic draw counter making every request's seed unique.
    pub draw: u64,
}

/// Immutable quiz question drawn from the externally supplied bank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    prompt: String,
    options: Vec<String>,
    correct: String,
    explanation: Option<String>,
}

impl QuizQuestion {
    /// Creates a new question record.
    #[must_use]
    pub fn new(
        prompt: String,
        options: Vec<String>,
        correct: String,
        explanation: Option<String>,
    ) -> Self {
        Self {
            prompt,
            options,
            correct,
            explanation,
        }
    }

    /// Question text shown to the player.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Answer options presented alongside the question.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The option text that counts as the correct answer.
    #[must_use]
    pub fn correct(&self) -> &str {
        &self.correct
    }

    /// Optional explanation revealed after answering.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Reports whether the option at `choice` is the correct answer.
    #[must_use]
    pub fn is_correct_choice(&self, choice: usize) -> bool {
        self.options
            .get(choice)
            .map_or(false, |option| option == &self.correct)
    }
}

/// Final score bundle handed to session-result persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBundle {
    /// Wave reached when the session ended.
    pub wave: WaveNumber,
    /// Gold held when the session ended.
    pub gold: u32,
    /// Cumulative correct quiz answers.
    pub correct_answers: u32,
    /// Towers placed over the whole session.
    pub towers_placed: u32,
}

impl ScoreBundle {
    /// Computes the final score from the bundle's components.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.wave.get() as u64 * 100
            + self.gold as u64 * 2
            + self.correct_answers as u64 * 50
            + self.towers_placed as u64 * 10
    }
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Tier of the enemy.
    pub kind: EnemyKind,
    /// Current position in world units.
    pub position: WorldPoint,
    /// Current health.
    pub health: u32,
    /// Maximum health, including boss scaling and penalties.
    pub max_health: u32,
    /// Path the enemy traverses.
    pub path: PathId,
    /// Indicates whether a freeze status is active.
    pub frozen: bool,
}

impl EnemySnapshot {
    /// Fraction of health remaining, in `0.0..=1.0`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }
}

/// Read-only snapshot describing all living enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the session.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Centre of the tower footprint.
    pub position: WorldPoint,
    /// Effective targeting range in world units.
    pub range: f32,
    /// Upgrade flags purchased for the tower.
    pub upgrades: UpgradeFlags,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of one in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier assigned to the projectile.
    pub id: ProjectileId,
    /// Current position in world units.
    pub position: WorldPoint,
    /// Enemy the projectile homes toward.
    pub target: EnemyId,
}

/// Read-only snapshot describing all in-flight projectiles.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Cooldown readiness captured for a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Identifier of the tower.
    pub tower: TowerId,
    /// Kind of the tower.
    pub kind: TowerKind,
    /// Remaining time before the tower may attack again.
    pub ready_in: Duration,
}

/// Read-only view over tower cooldown snapshots, sorted by tower id.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Availability captured for a single active ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilitySnapshot {
    /// Ability the snapshot describes.
    pub ability: AbilityKind,
    /// Indicates whether the ability's standing precondition is satisfied.
    pub unlocked: bool,
    /// Remaining cooldown; zero when the ability is ready.
    pub ready_in: Duration,
    /// Current, possibly inflated, activation price.
    pub price: u32,
}

/// Per-question answer history used by spaced-repetition draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuestionHistory {
    /// Number of times the question was presented.
    pub asked: u32,
    /// Number of times the question was answered incorrectly.
    pub missed: u32,
}

/// Read-only view over the session's question bank and answer history.
#[derive(Clone, Copy, Debug)]
pub struct QuestionBankView<'a> {
    questions: &'a [QuizQuestion],
    history: &'a [QuestionHistory],
}

impl<'a> QuestionBankView<'a> {
    /// Captures a new view backed by the provided bank and history slices.
    ///
    /// Both slices share indexing: `history[i]` describes `questions[i]`.
    #[must_use]
    pub const fn new(questions: &'a [QuizQuestion], history: &'a [QuestionHistory]) -> Self {
        Self { questions, history }
    }

    /// Questions supplied at session start.
    #[must_use]
    pub const fn questions(&self) -> &'a [QuizQuestion] {
        self.questions
    }

    /// Answer history aligned with [`Self::questions`].
    #[must_use]
    pub const fn history(&self) -> &'a [QuestionHistory] {
        self.history
    }

    /// Number of questions in the bank.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.questions.len()
    }

    /// Reports whether the bank is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Target assignment computed by the tower targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower the assignment belongs to.
    pub tower: TowerId,
    /// Enemy selected as the tower's target.
    pub enemy: EnemyId,
    /// Distance between tower and enemy at selection time.
    pub distance: f32,
}
