#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits attack commands from targeting data.

use quiz_defence_core::{Command, TowerCooldownSnapshot, TowerCooldownView, TowerId, TowerTarget};

/// Tower combat system that queues attack commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits attack commands for towers whose cooldown has elapsed.
    ///
    /// Ranged towers fire projectiles; melee towers strike their target
    /// directly.
    pub fn handle(
        &mut self,
        tower_cooldowns: TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() {
            return;
        }

        let cooldowns = tower_cooldowns.into_vec();
        if cooldowns.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(snapshot) = find_cooldown(&cooldowns, target.tower) else {
                continue;
            };
            if !snapshot.ready_in.is_zero() {
                continue;
            }
            let command = if snapshot.kind.is_ranged() {
                Command::FireProjectile {
                    tower: target.tower,
                    target: target.enemy,
                }
            } else {
                Command::MeleeStrike {
                    tower: target.tower,
                    target: target.enemy,
                }
            };
            self.scratch.push(command);
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_cooldown(
    cooldowns: &[TowerCooldownSnapshot],
    tower: TowerId,
) -> Option<&TowerCooldownSnapshot> {
    cooldowns
        .binary_search_by_key(&tower, |snapshot| snapshot.tower)
        .ok()
        .map(|index| &cooldowns[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{EnemyId, TowerKind};
    use std::time::Duration;

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(2, TowerKind::Archer, Duration::ZERO),
            snapshot(5, TowerKind::Cannon, Duration::ZERO),
        ]);
        let targets = vec![target(2, 4), target(5, 1)];
        let mut out = Vec::new();

        system.handle(cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: EnemyId::new(4),
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: EnemyId::new(1),
                },
            ],
        );
    }

    #[test]
    fn melee_towers_strike_instead_of_firing() {
        let mut system = TowerCombat::new();
        let cooldowns =
            TowerCooldownView::from_snapshots(vec![snapshot(3, TowerKind::Melee, Duration::ZERO)]);
        let targets = vec![target(3, 6)];
        let mut out = Vec::new();

        system.handle(cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::MeleeStrike {
                tower: TowerId::new(3),
                target: EnemyId::new(6),
            }],
        );
    }

    #[test]
    fn non_ready_or_missing_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(3, TowerKind::Archer, Duration::from_millis(250)),
            snapshot(8, TowerKind::Archer, Duration::ZERO),
        ]);
        let targets = vec![target(3, 9), target(8, 2), target(42, 3)];
        let mut out = Vec::new();

        system.handle(cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireProjectile {
                tower: TowerId::new(8),
                target: EnemyId::new(2),
            }],
        );
    }

    fn snapshot(tower: u32, kind: TowerKind, ready_in: Duration) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: TowerId::new(tower),
            kind,
            ready_in,
        }
    }

    fn target(tower: u32, enemy: u32) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemy: EnemyId::new(enemy),
            distance: 0.0,
        }
    }
}
