//! Wave numbering, spawn quotas and the completion latch.

use quiz_defence_core::WaveNumber;

/// Constant term of the quota formula.
const QUOTA_BASE: u32 = 4;

/// Quota growth per wave number.
const QUOTA_PER_WAVE: u32 = 2;

/// Upper bound on any wave's quota.
const QUOTA_CAP: u32 = 30;

/// Total enemies a wave spawns, boss included on boss waves.
pub(crate) fn quota(wave: WaveNumber) -> u32 {
    QUOTA_BASE
        .saturating_add(QUOTA_PER_WAVE.saturating_mul(wave.get()))
        .min(QUOTA_CAP)
}

/// Wave progression state.
///
/// Completion is a latch: once a wave completes, repeated ticks with the
/// same conditions do not re-trigger the completion side effects.
#[derive(Debug)]
pub(crate) struct WaveState {
    wave: WaveNumber,
    remaining_to_spawn: u32,
    wave_active: bool,
}

impl WaveState {
    /// Creates the pre-game state before the first wave starts.
    pub(crate) fn new() -> Self {
        Self {
            wave: WaveNumber::new(0),
            remaining_to_spawn: 0,
            wave_active: false,
        }
    }

    /// Number of the current wave; zero before the first start.
    pub(crate) fn wave(&self) -> WaveNumber {
        self.wave
    }

    /// Enemies the active wave has yet to spawn.
    pub(crate) fn remaining_to_spawn(&self) -> u32 {
        self.remaining_to_spawn
    }

    /// Reports whether a wave is currently in progress.
    pub(crate) fn active(&self) -> bool {
        self.wave_active
    }

    /// Starts the next wave and returns its number and quota.
    ///
    /// Returns `None` while a wave is still in progress.
    pub(crate) fn start_next(&mut self) -> Option<(WaveNumber, u32)> {
        if self.wave_active {
            return None;
        }
        self.wave = self.wave.next();
        self.remaining_to_spawn = quota(self.wave);
        self.wave_active = true;
        Some((self.wave, self.remaining_to_spawn))
    }

    /// Records one spawn against the active wave's quota.
    pub(crate) fn record_spawn(&mut self) {
        self.remaining_to_spawn = self.remaining_to_spawn.saturating_sub(1);
    }

    /// Latches completion when the quota is spent and the field is clear.
    pub(crate) fn try_complete(&mut self, enemies_alive: usize) -> Option<WaveNumber> {
        if self.wave_active && self.remaining_to_spawn == 0 && enemies_alive == 0 {
            self.wave_active = false;
            return Some(self.wave);
        }
        None
    }
}
