//! Ability cooldown machines and the post-commit selection modes.

use std::time::Duration;

use quiz_defence_core::{AbilityKind, AbilitySnapshot};

use crate::economy::PriceTable;

/// Duration of the freeze status the freeze ability applies.
pub(crate) const ABILITY_FREEZE_DURATION: Duration = Duration::from_secs(4);

/// Duration of the aura enhancement the boost ability applies.
pub(crate) const BOOST_DURATION: Duration = Duration::from_secs(12);

/// Click mode the session enters after committing a targeted ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SelectionMode {
    /// No targeted ability is awaiting a selection.
    None,
    /// The strike ability waits for an enemy click.
    StrikeTarget,
    /// The boost ability waits for a support-tower click.
    BoostTower,
}

/// Cooldown state of the three abilities plus the active selection mode.
#[derive(Debug)]
pub(crate) struct AbilityState {
    cooldowns: [Duration; 3],
    pub(crate) selection: SelectionMode,
}

impl AbilityState {
    /// Creates the initial state with every ability ready.
    pub(crate) fn new() -> Self {
        Self {
            cooldowns: [Duration::ZERO; 3],
            selection: SelectionMode::None,
        }
    }

    const fn index(kind: AbilityKind) -> usize {
        match kind {
            AbilityKind::Strike => 0,
            AbilityKind::Freeze => 1,
            AbilityKind::Boost => 2,
        }
    }

    /// Reports whether the provided ability is off cooldown.
    pub(crate) fn ready(&self, kind: AbilityKind) -> bool {
        self.cooldowns[Self::index(kind)].is_zero()
    }

    /// Remaining cooldown of the provided ability.
    pub(crate) fn ready_in(&self, kind: AbilityKind) -> Duration {
        self.cooldowns[Self::index(kind)]
    }

    /// Starts an ability's full cooldown after it executed.
    pub(crate) fn start_cooldown(&mut self, kind: AbilityKind) {
        self.cooldowns[Self::index(kind)] = kind.cooldown();
    }

    /// Advances cooldowns by real elapsed time.
    ///
    /// The boost cooldown is paused between waves and only advances while
    /// a wave is active.
    pub(crate) fn advance(&mut self, dt: Duration, wave_active: bool) {
        for kind in AbilityKind::all() {
            if kind == AbilityKind::Boost && !wave_active {
                continue;
            }
            let slot = &mut self.cooldowns[Self::index(kind)];
            *slot = slot.saturating_sub(dt);
        }
    }

    /// Captures the query snapshot for every ability.
    pub(crate) fn snapshots(&self, has_support: bool, prices: &PriceTable) -> Vec<AbilitySnapshot> {
        AbilityKind::all()
            .into_iter()
            .map(|kind| AbilitySnapshot {
                ability: kind,
                unlocked: kind != AbilityKind::Boost || has_support,
                ready_in: self.ready_in(kind),
                price: prices.ability(kind),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_blocks_until_it_elapses() {
        let mut abilities = AbilityState::new();
        assert!(abilities.ready(AbilityKind::Strike));

        abilities.start_cooldown(AbilityKind::Strike);
        assert!(!abilities.ready(AbilityKind::Strike));

        abilities.advance(AbilityKind::Strike.cooldown(), true);
        assert!(abilities.ready(AbilityKind::Strike));
    }

    #[test]
    fn boost_cooldown_pauses_between_waves() {
        let mut abilities = AbilityState::new();
        abilities.start_cooldown(AbilityKind::Boost);
        abilities.start_cooldown(AbilityKind::Freeze);

        abilities.advance(Duration::from_secs(120), false);
        assert!(abilities.ready(AbilityKind::Freeze));
        assert!(!abilities.ready(AbilityKind::Boost));

        abilities.advance(AbilityKind::Boost.cooldown(), true);
        assert!(abilities.ready(AbilityKind::Boost));
    }

    #[test]
    fn boost_stays_locked_without_a_support_tower() {
        let abilities = AbilityState::new();
        let prices = PriceTable::at_base();
        let snapshots = abilities.snapshots(false, &prices);
        let boost = snapshots
            .iter()
            .find(|snapshot| snapshot.ability == AbilityKind::Boost)
            .expect("boost snapshot");
        assert!(!boost.unlocked);
        assert!(snapshots
            .iter()
            .filter(|snapshot| snapshot.ability != AbilityKind::Boost)
            .all(|snapshot| snapshot.unlocked));
    }
}
