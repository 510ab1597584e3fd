//! Authoritative enemy state: spawning, movement, status effects, lifecycle.

use std::time::Duration;

use quiz_defence_core::{EnemyId, EnemyKind, EnemySnapshot, PathId, WaveNumber, WorldPoint};

use crate::paths::StageState;

/// Distance at which an enemy counts as having reached a waypoint.
const WAYPOINT_TOLERANCE: f32 = 4.0;

/// Freeze speed factor applied to standard tiers.
const FREEZE_FACTOR_STANDARD: f32 = 0.0;

/// Freeze speed factor applied to bosses, which are only slowed.
const FREEZE_FACTOR_BOSS: f32 = 0.5;

/// Speed factor applied by the frost element's brief slow.
const SLOW_FACTOR: f32 = 0.5;

/// Interval between consecutive damage-over-time ticks.
pub(crate) const DOT_TICK_INTERVAL: Duration = Duration::from_millis(600);

/// Multiplier applied to a boss's health after a failed boss question.
const BOSS_ENRAGE_HEALTH_NUM: u32 = 5;
const BOSS_ENRAGE_HEALTH_DEN: u32 = 4;

/// Multiplier applied to a boss's speed after a failed boss question.
const BOSS_ENRAGE_SPEED: f32 = 1.2;

/// One stacked damage-over-time status attached to an enemy.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DotStack {
    per_tick: u32,
    remaining_ticks: u32,
    until_next: Duration,
}

impl DotStack {
    /// Creates a new stack applying `per_tick` damage `ticks` times.
    pub(crate) fn new(per_tick: u32, ticks: u32) -> Self {
        Self {
            per_tick,
            remaining_ticks: ticks,
            until_next: DOT_TICK_INTERVAL,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) path: PathId,
    waypoint_index: usize,
    pub(crate) position: WorldPoint,
    speed: f32,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    frozen_remaining: Duration,
    slow_remaining: Duration,
    dots: Vec<DotStack>,
}

impl Enemy {
    /// Applies direct damage, clamping at zero.
    pub(crate) fn apply_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Attaches a damage-over-time stack.
    pub(crate) fn attach_dot(&mut self, stack: DotStack) {
        self.dots.push(stack);
    }

    /// Applies a freeze for the provided duration; stacking extends it.
    pub(crate) fn freeze(&mut self, duration: Duration) {
        self.frozen_remaining = self.frozen_remaining.max(duration);
    }

    /// Applies the frost slow for the provided duration.
    pub(crate) fn slow(&mut self, duration: Duration) {
        self.slow_remaining = self.slow_remaining.max(duration);
    }

    /// Permanently raises health and speed after a failed boss question.
    pub(crate) fn enrage(&mut self) {
        self.max_health = self
            .max_health
            .saturating_mul(BOSS_ENRAGE_HEALTH_NUM)
            .checked_div(BOSS_ENRAGE_HEALTH_DEN)
            .unwrap_or(self.max_health);
        self.health = self
            .health
            .saturating_mul(BOSS_ENRAGE_HEALTH_NUM)
            .checked_div(BOSS_ENRAGE_HEALTH_DEN)
            .unwrap_or(self.health);
        self.speed *= BOSS_ENRAGE_SPEED;
    }

    /// Removes health from both current and maximum pools.
    pub(crate) fn weaken(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
        self.max_health = self.max_health.saturating_sub(amount).max(1);
    }

    /// Reports whether a freeze status is currently active.
    pub(crate) fn is_frozen(&self) -> bool {
        !self.frozen_remaining.is_zero()
    }

    fn effective_speed(&self) -> f32 {
        let mut speed = self.speed;
        if self.is_frozen() {
            speed *= match self.kind {
                EnemyKind::Boss => FREEZE_FACTOR_BOSS,
                _ => FREEZE_FACTOR_STANDARD,
            };
        }
        if !self.slow_remaining.is_zero() {
            speed *= SLOW_FACTOR;
        }
        speed
    }
}

/// Outcome of one enemy tick, reported back to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnemyFate {
    /// The enemy's health reached zero.
    Died {
        /// Identifier of the dead enemy.
        enemy: EnemyId,
        /// Raw bounty of the enemy's kind, before any buff.
        bounty: u32,
    },
    /// The enemy reached the final waypoint of its path.
    Escaped {
        /// Identifier of the escaped enemy.
        enemy: EnemyId,
    },
}

/// Arena storing living enemies addressed by stable identifiers.
#[derive(Debug, Default)]
pub(crate) struct EnemyArena {
    entries: Vec<Enemy>,
    next_id: u32,
    spawn_serial: u64,
}

impl EnemyArena {
    /// Creates an enemy of the provided kind at the head of a path.
    ///
    /// Paths are assigned round-robin in spawn order. Boss health scales
    /// with the wave the boss spawns on.
    pub(crate) fn spawn(
        &mut self,
        kind: EnemyKind,
        wave: WaveNumber,
        stage: &StageState,
    ) -> Option<(EnemyId, PathId)> {
        let paths = stage.paths();
        if paths.is_empty() {
            return None;
        }

        let path = &paths[(self.spawn_serial % paths.len() as u64) as usize];
        let start = *path.waypoints().first()?;
        self.spawn_serial = self.spawn_serial.wrapping_add(1);

        let stats = kind.stats();
        let max_health = if kind == EnemyKind::Boss {
            EnemyKind::boss_health(wave)
        } else {
            stats.max_health
        };

        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Enemy {
            id,
            kind,
            path: path.id(),
            waypoint_index: 1,
            position: start,
            speed: stats.speed,
            health: max_health,
            max_health,
            frozen_remaining: Duration::ZERO,
            slow_remaining: Duration::ZERO,
            dots: Vec::new(),
        });
        Some((id, path.id()))
    }

    /// Advances movement and status effects, reporting deaths and escapes.
    ///
    /// Escaped and dead enemies are removed from the arena; the caller maps
    /// fates onto lives, bounties and events.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        stage: &StageState,
        out_fates: &mut Vec<EnemyFate>,
    ) {
        let seconds = dt.as_secs_f32();

        for enemy in &mut self.entries {
            enemy.frozen_remaining = enemy.frozen_remaining.saturating_sub(dt);
            enemy.slow_remaining = enemy.slow_remaining.saturating_sub(dt);

            tick_dots(enemy, dt);
            if enemy.health == 0 {
                out_fates.push(EnemyFate::Died {
                    enemy: enemy.id,
                    bounty: enemy.kind.stats().bounty,
                });
                continue;
            }

            let Some(path) = stage.path(enemy.path) else {
                continue;
            };

            let mut budget = enemy.effective_speed() * seconds;
            while budget > 0.0 {
                let Some(&target) = path.waypoints().get(enemy.waypoint_index) else {
                    out_fates.push(EnemyFate::Escaped { enemy: enemy.id });
                    break;
                };

                let distance = enemy.position.distance_to(target);
                if distance <= WAYPOINT_TOLERANCE {
                    enemy.waypoint_index += 1;
                    if enemy.waypoint_index >= path.waypoints().len() {
                        out_fates.push(EnemyFate::Escaped { enemy: enemy.id });
                        break;
                    }
                    continue;
                }

                if budget >= distance {
                    enemy.position = target;
                    budget -= distance;
                    enemy.waypoint_index += 1;
                    if enemy.waypoint_index >= path.waypoints().len() {
                        out_fates.push(EnemyFate::Escaped { enemy: enemy.id });
                        break;
                    }
                } else {
                    let step = budget / distance;
                    enemy.position = WorldPoint::new(
                        enemy.position.x() + (target.x() - enemy.position.x()) * step,
                        enemy.position.y() + (target.y() - enemy.position.y()) * step,
                    );
                    budget = 0.0;
                }
            }
        }

        for fate in out_fates.iter() {
            let id = match fate {
                EnemyFate::Died { enemy, .. } | EnemyFate::Escaped { enemy } => *enemy,
            };
            if let Some(index) = self.entries.iter().position(|enemy| enemy.id == id) {
                let _ = self.entries.remove(index);
            }
        }
    }

    /// Returns the living enemy with the provided identifier, if any.
    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.iter().find(|enemy| enemy.id == id)
    }

    /// Returns mutable access to the enemy with the provided identifier.
    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.iter_mut().find(|enemy| enemy.id == id)
    }

    /// Removes the enemy with the provided identifier, if present.
    pub(crate) fn remove(&mut self, id: EnemyId) {
        if let Some(index) = self.entries.iter().position(|enemy| enemy.id == id) {
            let _ = self.entries.remove(index);
        }
    }

    /// Iterator over all living enemies.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.iter()
    }

    /// Mutable iterator over all living enemies.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.iter_mut()
    }

    /// Number of living enemies.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Captures query snapshots for every living enemy.
    pub(crate) fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.entries
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                health: enemy.health,
                max_health: enemy.max_health,
                path: enemy.path,
                frozen: enemy.is_frozen(),
            })
            .collect()
    }
}

fn tick_dots(enemy: &mut Enemy, dt: Duration) {
    let mut total_damage = 0u32;
    for dot in &mut enemy.dots {
        let mut elapsed = dt;
        while dot.remaining_ticks > 0 {
            if dot.until_next > elapsed {
                dot.until_next -= elapsed;
                break;
            }
            elapsed -= dot.until_next;
            dot.until_next = DOT_TICK_INTERVAL;
            dot.remaining_ticks -= 1;
            total_damage = total_damage.saturating_add(dot.per_tick);
        }
    }
    enemy.dots.retain(|dot| dot.remaining_ticks > 0);
    enemy.apply_damage(total_damage);
}
