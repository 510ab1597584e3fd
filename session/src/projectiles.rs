//! Homing projectiles launched by ranged towers.

use std::time::Duration;

use quiz_defence_core::{
    ElementKind, EnemyId, ProjectileId, ProjectileSnapshot, TowerId, UpgradeFlags, WorldPoint,
};

use crate::enemies::EnemyArena;

/// Travel speed of every projectile in world units per second.
pub(crate) const PROJECTILE_SPEED: f32 = 320.0;

/// Distance at which a projectile counts as having hit its target.
pub(crate) const HIT_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) damage: u32,
    pub(crate) upgrades: UpgradeFlags,
    pub(crate) element: Option<ElementKind>,
    pub(crate) position: WorldPoint,
}

/// Outcome of advancing one projectile for a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProjectileOutcome {
    /// The projectile reached its target this tick.
    Hit {
        /// Identifier of the finished projectile.
        projectile: ProjectileId,
        /// Tower that launched it, for damage attribution.
        tower: TowerId,
        /// Enemy the payload lands on.
        target: EnemyId,
        /// Damage captured at launch time.
        damage: u32,
        /// Upgrades of the launching tower, captured at launch time.
        upgrades: UpgradeFlags,
        /// Elemental charge the shot carried, if any.
        element: Option<ElementKind>,
    },
    /// The target disappeared before impact.
    Expired {
        /// Identifier of the finished projectile.
        projectile: ProjectileId,
    },
}

/// Arena owning every in-flight projectile.
#[derive(Debug)]
pub(crate) struct ProjectileArena {
    entries: Vec<Projectile>,
    next_id: u32,
}

impl ProjectileArena {
    /// Creates an empty projectile arena.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Launches a projectile from a tower position toward a target.
    pub(crate) fn launch(
        &mut self,
        tower: TowerId,
        target: EnemyId,
        origin: WorldPoint,
        damage: u32,
        upgrades: UpgradeFlags,
        element: Option<ElementKind>,
    ) -> ProjectileId {
        let id = ProjectileId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Projectile {
            id,
            tower,
            target,
            damage,
            upgrades,
            element,
            position: origin,
        });
        id
    }

    /// Advances every projectile toward its target's current position.
    ///
    /// Projectiles re-aim each tick, so a moving target stays tracked.
    /// Finished projectiles are removed and reported through `out`.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        enemies: &EnemyArena,
        out: &mut Vec<ProjectileOutcome>,
    ) {
        let budget = PROJECTILE_SPEED * dt.as_secs_f32();
        let mut index = 0;
        while index < self.entries.len() {
            let projectile = &mut self.entries[index];
            let Some(target) = enemies.get(projectile.target) else {
                out.push(ProjectileOutcome::Expired {
                    projectile: projectile.id,
                });
                let _ = self.entries.swap_remove(index);
                continue;
            };

            let destination = target.position;
            let distance = projectile.position.distance_to(destination);
            if distance <= HIT_RADIUS + budget {
                out.push(ProjectileOutcome::Hit {
                    projectile: projectile.id,
                    tower: projectile.tower,
                    target: projectile.target,
                    damage: projectile.damage,
                    upgrades: projectile.upgrades,
                    element: projectile.element,
                });
                let _ = self.entries.swap_remove(index);
                continue;
            }

            let step = budget / distance;
            projectile.position = WorldPoint::new(
                projectile.position.x() + (destination.x() - projectile.position.x()) * step,
                projectile.position.y() + (destination.y() - projectile.position.y()) * step,
            );
            index += 1;
        }
    }

    /// Number of projectiles currently in flight.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Captures query snapshots for every in-flight projectile.
    pub(crate) fn snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.entries
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                position: projectile.position,
                target: projectile.target,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{EnemyKind, Viewport, WaveNumber};

    use crate::paths::StageState;

    fn arena_with_enemy() -> (EnemyArena, EnemyId, StageState) {
        let stage = StageState::new(Viewport::new(800.0, 600.0));
        let mut enemies = EnemyArena::default();
        let (enemy, _) = enemies
            .spawn(EnemyKind::Scout, WaveNumber::new(1), &stage)
            .expect("spawn");
        (enemies, enemy, stage)
    }

    #[test]
    fn projectile_closes_on_its_target_and_hits() {
        let (enemies, enemy, _stage) = arena_with_enemy();
        let origin = WorldPoint::new(100.0, 300.0);
        let mut projectiles = ProjectileArena::new();
        let id = projectiles.launch(
            TowerId::new(0),
            enemy,
            origin,
            12,
            UpgradeFlags::none(),
            None,
        );

        let mut outcomes = Vec::new();
        for _ in 0..40 {
            projectiles.advance(Duration::from_millis(100), &enemies, &mut outcomes);
            if !outcomes.is_empty() {
                break;
            }
        }

        assert_eq!(
            outcomes,
            vec![ProjectileOutcome::Hit {
                projectile: id,
                tower: TowerId::new(0),
                target: enemy,
                damage: 12,
                upgrades: UpgradeFlags::none(),
                element: None,
            }]
        );
        assert_eq!(projectiles.len(), 0);
    }

    #[test]
    fn projectile_expires_when_the_target_is_gone() {
        let (mut enemies, enemy, _stage) = arena_with_enemy();
        let mut projectiles = ProjectileArena::new();
        let id = projectiles.launch(
            TowerId::new(0),
            enemy,
            WorldPoint::new(100.0, 300.0),
            12,
            UpgradeFlags::none(),
            None,
        );

        enemies.remove(enemy);
        let mut outcomes = Vec::new();
        projectiles.advance(Duration::from_millis(16), &enemies, &mut outcomes);

        assert_eq!(outcomes, vec![ProjectileOutcome::Expired { projectile: id }]);
        assert_eq!(projectiles.len(), 0);
    }
}
