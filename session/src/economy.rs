//! Gold, lives, prices, unlocks and the quiz-gate popup state machine.

use std::time::Duration;

use quiz_defence_core::{
    AbilityKind, ChallengeBuff, EnemyId, ProposedAction, QuestionId, QuestionRequest, TowerKind,
    UpgradeFlags, UpgradeKind, WaveNumber, ELEMENTAL_UNLOCK_THRESHOLD, START_GOLD, START_LIVES,
    UNGATED_PLACEMENTS,
};

/// Applies the compounding failure penalty to a price, rounding up.
fn inflate(price: u32) -> u32 {
    (price.saturating_mul(5).saturating_add(3)) / 4
}

/// Current prices per purchasable action, inflated by failed gates.
#[derive(Clone, Debug)]
pub(crate) struct PriceTable {
    towers: [u32; 5],
    upgrades: [u32; 2],
    abilities: [u32; 3],
}

impl PriceTable {
    pub(crate) fn at_base() -> Self {
        let mut towers = [0; 5];
        for (slot, kind) in towers.iter_mut().zip(TowerKind::all()) {
            *slot = kind.stats().base_cost;
        }
        let mut upgrades = [0; 2];
        for (slot, kind) in upgrades.iter_mut().zip(UpgradeKind::all()) {
            *slot = kind.base_cost();
        }
        let mut abilities = [0; 3];
        for (slot, kind) in abilities.iter_mut().zip(AbilityKind::all()) {
            *slot = kind.base_cost();
        }
        Self {
            towers,
            upgrades,
            abilities,
        }
    }

    const fn tower_index(kind: TowerKind) -> usize {
        match kind {
            TowerKind::Archer => 0,
            TowerKind::Cannon => 1,
            TowerKind::Melee => 2,
            TowerKind::Support => 3,
            TowerKind::Elemental => 4,
        }
    }

    const fn upgrade_index(kind: UpgradeKind) -> usize {
        match kind {
            UpgradeKind::Splash => 0,
            UpgradeKind::Toxin => 1,
        }
    }

    const fn ability_index(kind: AbilityKind) -> usize {
        match kind {
            AbilityKind::Strike => 0,
            AbilityKind::Freeze => 1,
            AbilityKind::Boost => 2,
        }
    }

    /// Current price of placing a tower of the provided kind.
    pub(crate) fn tower(&self, kind: TowerKind) -> u32 {
        self.towers[Self::tower_index(kind)]
    }

    /// Current price of unlocking or installing the provided upgrade.
    pub(crate) fn upgrade(&self, kind: UpgradeKind) -> u32 {
        self.upgrades[Self::upgrade_index(kind)]
    }

    /// Current price of activating the provided ability.
    pub(crate) fn ability(&self, kind: AbilityKind) -> u32 {
        self.abilities[Self::ability_index(kind)]
    }

    /// Inflates a tower price after a failed gate; returns the new price.
    pub(crate) fn inflate_tower(&mut self, kind: TowerKind) -> u32 {
        let slot = &mut self.towers[Self::tower_index(kind)];
        *slot = inflate(*slot);
        *slot
    }

    /// Inflates an upgrade price after a failed gate; returns the new price.
    pub(crate) fn inflate_upgrade(&mut self, kind: UpgradeKind) -> u32 {
        let slot = &mut self.upgrades[Self::upgrade_index(kind)];
        *slot = inflate(*slot);
        *slot
    }

    /// Inflates an ability price after a failed gate; returns the new price.
    pub(crate) fn inflate_ability(&mut self, kind: AbilityKind) -> u32 {
        let slot = &mut self.abilities[Self::ability_index(kind)];
        *slot = inflate(*slot);
        *slot
    }

    /// Resets a tower price to base after a successful gate.
    pub(crate) fn reset_tower(&mut self, kind: TowerKind) {
        self.towers[Self::tower_index(kind)] = kind.stats().base_cost;
    }

    /// Resets an upgrade price to base after a successful gate.
    pub(crate) fn reset_upgrade(&mut self, kind: UpgradeKind) {
        self.upgrades[Self::upgrade_index(kind)] = kind.base_cost();
    }

    /// Resets an ability price to base after a successful gate.
    pub(crate) fn reset_ability(&mut self, kind: AbilityKind) {
        self.abilities[Self::ability_index(kind)] = kind.base_cost();
    }
}

/// Challenge buff with the number of wave completions it still survives.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ActiveBuff {
    pub(crate) buff: ChallengeBuff,
    pub(crate) waves_remaining: u32,
}

/// Mutable economic state of the session.
#[derive(Debug)]
pub(crate) struct EconomyState {
    pub(crate) gold: u32,
    pub(crate) lives: i32,
    pub(crate) correct_answers: u32,
    pub(crate) towers_placed: u32,
    pub(crate) upgrade_credits: u32,
    unlocked_upgrades: UpgradeFlags,
    pub(crate) prices: PriceTable,
    active_buff: Option<ActiveBuff>,
    pub(crate) boss_buff: bool,
}

impl EconomyState {
    /// Opening balance of a fresh session.
    pub(crate) fn new() -> Self {
        Self {
            gold: START_GOLD,
            lives: START_LIVES,
            correct_answers: 0,
            towers_placed: 0,
            upgrade_credits: 0,
            unlocked_upgrades: UpgradeFlags::none(),
            prices: PriceTable::at_base(),
            active_buff: None,
            boss_buff: false,
        }
    }

    /// Reports whether the purse covers a price.
    pub(crate) fn can_afford(&self, price: u32) -> bool {
        self.gold >= price
    }

    /// Deducts gold; the caller has already checked affordability.
    pub(crate) fn deduct(&mut self, price: u32) {
        self.gold = self.gold.saturating_sub(price);
    }

    /// Credits gold to the purse.
    pub(crate) fn credit(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Gold awarded for a kill, with the gold-rush buff folded in.
    pub(crate) fn kill_bounty(&self, raw: u32) -> u32 {
        if self.buff_active(ChallengeBuff::GoldRush) {
            raw.saturating_add(1)
        } else {
            raw
        }
    }

    /// Reports whether the next tower placement bypasses the quiz gate.
    pub(crate) fn placement_ungated(&self) -> bool {
        self.towers_placed < UNGATED_PLACEMENTS
    }

    /// Reports whether the elemental tower kind is available yet.
    pub(crate) fn elemental_unlocked(&self) -> bool {
        self.correct_answers >= ELEMENTAL_UNLOCK_THRESHOLD
    }

    /// Reports whether an upgrade path was globally unlocked already.
    pub(crate) fn upgrade_unlocked(&self, kind: UpgradeKind) -> bool {
        self.unlocked_upgrades.has(kind)
    }

    /// Marks an upgrade path as globally unlocked.
    pub(crate) fn unlock_upgrade(&mut self, kind: UpgradeKind) {
        self.unlocked_upgrades = self.unlocked_upgrades.with(kind);
    }

    /// Reports whether the provided challenge buff is currently active.
    pub(crate) fn buff_active(&self, buff: ChallengeBuff) -> bool {
        self.active_buff
            .map_or(false, |active| active.buff == buff)
    }

    /// Installs a freshly chosen challenge buff.
    pub(crate) fn set_buff(&mut self, buff: ChallengeBuff, waves: u32) {
        self.active_buff = Some(ActiveBuff {
            buff,
            waves_remaining: waves,
        });
    }

    /// Burns one wave off the active buff; expires it at zero.
    pub(crate) fn decay_buff(&mut self) {
        if let Some(active) = self.active_buff.as_mut() {
            active.waves_remaining = active.waves_remaining.saturating_sub(1);
            if active.waves_remaining == 0 {
                self.active_buff = None;
            }
        }
    }

    /// Currently active challenge buff, if any.
    pub(crate) fn active_buff(&self) -> Option<ActiveBuff> {
        self.active_buff
    }
}

/// The single popup slot: at most one question or menu is open at a time.
///
/// `Awaiting` states cover the gap between a `QuestionRequested` event and
/// the selection system's `PresentQuestion` command; `Open` states cover a
/// question visible to the player.
#[derive(Clone, Debug)]
pub(crate) enum PopupFlow {
    /// No pending transaction and no open popup.
    Idle,
    /// A proposal exists and its gate question is being drawn.
    ProposalAwaiting {
        /// Action held in the pending transaction.
        action: ProposedAction,
        /// Draw request the selection system must answer.
        request: QuestionRequest,
    },
    /// A proposal's gate question is on screen.
    ProposalOpen {
        /// Action held in the pending transaction.
        action: ProposedAction,
        /// Bank index of the presented question.
        question: QuestionId,
    },
    /// A boss spawned and its timed question is being drawn.
    BossAwaiting {
        /// Boss the question concerns.
        enemy: EnemyId,
        /// Draw request the selection system must answer.
        request: QuestionRequest,
    },
    /// The timed boss question is on screen and counting down.
    BossOpen {
        /// Boss the question concerns.
        enemy: EnemyId,
        /// Bank index of the presented question.
        question: QuestionId,
        /// Real time left before the question resolves as incorrect.
        remaining: Duration,
        /// Boss health captured when the question opened.
        health_basis: u32,
    },
    /// A challenge round is drawing its next question.
    ChallengeAwaiting {
        /// Wave whose completion started the round.
        wave: WaveNumber,
        /// Zero-based index of the question within the round.
        index: u8,
        /// Correct answers so far in the round.
        correct: u8,
        /// Draw request the selection system must answer.
        request: QuestionRequest,
    },
    /// A challenge question is on screen.
    ChallengeOpen {
        /// Wave whose completion started the round.
        wave: WaveNumber,
        /// Zero-based index of the question within the round.
        index: u8,
        /// Correct answers so far in the round.
        correct: u8,
        /// Bank index of the presented question.
        question: QuestionId,
    },
    /// The perfect-round buff menu is on screen.
    ChallengeChoice {
        /// Wave whose completion started the round.
        wave: WaveNumber,
    },
}

impl PopupFlow {
    /// Reports whether the popup slot is free.
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, PopupFlow::Idle)
    }
}
