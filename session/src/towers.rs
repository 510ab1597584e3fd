//! Authoritative tower state: registry, placement validation, cooldowns.

use std::collections::BTreeMap;
use std::time::Duration;

use quiz_defence_core::{
    ElementKind, ProposalError, TowerCooldownSnapshot, TowerId, TowerKind, TowerSnapshot,
    UpgradeFlags, Viewport, WorldPoint,
};

use crate::paths::StageState;

/// Radius of a support tower's buff aura before any boost.
pub(crate) const SUPPORT_AURA_RADIUS: f32 = 120.0;

/// Damage and fire-rate bonus granted by an unboosted support aura.
const SUPPORT_AURA_BONUS: f32 = 0.25;

/// Additional aura bonus while the boost ability is active, in points.
const BOOST_BONUS: f32 = 0.15;

/// Aura radius multiplier while the boost ability is active.
const BOOST_RADIUS_FACTOR: f32 = 1.5;

/// Damage and fire-rate bonus of the boss-question global buff.
const BOSS_BUFF_BONUS: f32 = 0.30;

/// Fire-rate bonus of the rapid-fire challenge buff.
const RAPID_FIRE_BONUS: f32 = 0.25;

#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) position: WorldPoint,
    pub(crate) upgrades: UpgradeFlags,
    ready_in: Duration,
    element: ElementKind,
    boost_remaining: Duration,
}

impl Tower {
    /// Reports whether the tower may attack this tick.
    pub(crate) fn ready(&self) -> bool {
        self.ready_in.is_zero()
    }

    /// Starts the cooldown after an attack.
    pub(crate) fn start_cooldown(&mut self, cooldown: Duration) {
        self.ready_in = cooldown;
    }

    /// Returns the current elemental charge and rotates to the next one.
    pub(crate) fn rotate_element(&mut self) -> ElementKind {
        let current = self.element;
        self.element = self.element.next();
        current
    }

    /// Activates the boost ability's aura enhancement.
    pub(crate) fn start_boost(&mut self, duration: Duration) {
        self.boost_remaining = self.boost_remaining.max(duration);
    }

    /// Reports whether the boost enhancement is active.
    pub(crate) fn boosted(&self) -> bool {
        !self.boost_remaining.is_zero()
    }

    /// Effective aura radius, support towers only.
    pub(crate) fn aura_radius(&self) -> f32 {
        if self.boosted() {
            SUPPORT_AURA_RADIUS * BOOST_RADIUS_FACTOR
        } else {
            SUPPORT_AURA_RADIUS
        }
    }

    fn aura_bonus(&self) -> f32 {
        if self.boosted() {
            SUPPORT_AURA_BONUS + BOOST_BONUS
        } else {
            SUPPORT_AURA_BONUS
        }
    }
}

/// Global modifiers folded into every effective-stat computation.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CombatModifiers {
    /// Boss-question reward buff is active for the rest of the wave.
    pub(crate) boss_buff: bool,
    /// Rapid-fire challenge buff is active.
    pub(crate) rapid_fire: bool,
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: u32,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: 0,
        }
    }

    /// Validates a placement's geometry; affordability is the caller's
    /// concern. Checks play-area containment, path clearance, then tower
    /// clearance, in that order.
    pub(crate) fn validate_position(
        &self,
        kind: TowerKind,
        position: WorldPoint,
        viewport: Viewport,
        stage: &StageState,
    ) -> Result<(), ProposalError> {
        if !viewport.contains(position) {
            return Err(ProposalError::InsideSidePanel);
        }

        if stage.violates_clearance(position) {
            return Err(ProposalError::TooCloseToPath);
        }

        let footprint = kind.stats().footprint_radius;
        for tower in self.entries.values() {
            let clearance = footprint + tower.kind.stats().footprint_radius;
            if position.distance_to(tower.position) < clearance {
                return Err(ProposalError::TooCloseToTower);
            }
        }

        Ok(())
    }

    /// Inserts a new tower and returns its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, position: WorldPoint) -> TowerId {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id = self.next_tower_id.wrapping_add(1);
        let _ = self.entries.insert(
            id,
            Tower {
                id,
                kind,
                position,
                upgrades: UpgradeFlags::none(),
                ready_in: Duration::ZERO,
                element: ElementKind::Ember,
                boost_remaining: Duration::ZERO,
            },
        );
        id
    }

    /// Removes the tower with the provided identifier.
    pub(crate) fn remove(&mut self, id: TowerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Returns the tower with the provided identifier, if any.
    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    /// Returns mutable access to the tower with the provided identifier.
    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    /// Reports whether any support tower is placed.
    pub(crate) fn has_support_tower(&self) -> bool {
        self.entries
            .values()
            .any(|tower| tower.kind == TowerKind::Support)
    }

    /// Advances cooldown and boost timers.
    pub(crate) fn advance(&mut self, scaled_dt: Duration, real_dt: Duration) {
        for tower in self.entries.values_mut() {
            tower.ready_in = tower.ready_in.saturating_sub(scaled_dt);
            tower.boost_remaining = tower.boost_remaining.saturating_sub(real_dt);
        }
    }

    /// Identifiers of towers now violating clearance against the new paths.
    pub(crate) fn clearance_violators(&self, stage: &StageState) -> Vec<TowerId> {
        self.entries
            .values()
            .filter(|tower| stage.violates_clearance(tower.position))
            .map(|tower| tower.id)
            .collect()
    }

    /// Computes the effective damage and cooldown for an attacking tower.
    ///
    /// Folds in the strongest overlapping support aura, the boss-wave
    /// global buff and the rapid-fire challenge buff. Returns `None` for
    /// unknown towers and for the support kind, which never attacks.
    pub(crate) fn effective_attack(
        &self,
        id: TowerId,
        modifiers: CombatModifiers,
    ) -> Option<(u32, Duration)> {
        let tower = self.entries.get(&id)?;
        if !tower.kind.attacks() {
            return None;
        }

        let stats = tower.kind.stats();
        let mut damage_factor = 1.0f32;
        let mut rate_factor = 1.0f32;

        let aura = self
            .entries
            .values()
            .filter(|candidate| {
                candidate.kind == TowerKind::Support
                    && candidate.position.distance_to(tower.position) <= candidate.aura_radius()
            })
            .map(|candidate| candidate.aura_bonus())
            .fold(None::<f32>, |best, bonus| {
                Some(best.map_or(bonus, |value| value.max(bonus)))
            });
        if let Some(bonus) = aura {
            damage_factor += bonus;
            rate_factor += bonus;
        }

        if modifiers.boss_buff {
            damage_factor += BOSS_BUFF_BONUS;
            rate_factor += BOSS_BUFF_BONUS;
        }
        if modifiers.rapid_fire {
            rate_factor += RAPID_FIRE_BONUS;
        }

        let damage = ((stats.damage as f32) * damage_factor).round() as u32;
        // div_f32 goes through f32 seconds and perturbs an unbuffed cooldown.
        let cooldown = if rate_factor > 1.0 {
            stats.cooldown.div_f64(f64::from(rate_factor))
        } else {
            stats.cooldown
        };
        Some((damage.max(1), cooldown))
    }

    /// Captures query snapshots for every placed tower.
    pub(crate) fn snapshots(&self) -> Vec<TowerSnapshot> {
        self.entries
            .values()
            .map(|tower| TowerSnapshot {
                id: tower.id,
                kind: tower.kind,
                position: tower.position,
                range: tower.kind.stats().range,
                upgrades: tower.upgrades,
            })
            .collect()
    }

    /// Captures cooldown snapshots for every attacking tower.
    pub(crate) fn cooldown_snapshots(&self) -> Vec<TowerCooldownSnapshot> {
        self.entries
            .values()
            .filter(|tower| tower.kind.attacks())
            .map(|tower| TowerCooldownSnapshot {
                tower: tower.id,
                kind: tower.kind,
                ready_in: tower.ready_in,
            })
            .collect()
    }
}
