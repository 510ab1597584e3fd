#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use std::time::Duration;

use quiz_defence_core::{Command, EnemyKind, Event, WaveNumber};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence and seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            rng_seed,
        }
    }
}

/// Pure system that deterministically emits spawn commands while a wave runs.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    rng_state: u64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            rng_state: config.rng_seed,
        }
    }

    /// Consumes events and wave bookkeeping to emit spawn commands.
    ///
    /// `remaining_to_spawn` is the session's unspawned quota for the active
    /// wave; the system never emits more spawn commands than it covers. On a
    /// boss wave the final slot of the quota is reserved for the boss.
    pub fn handle(
        &mut self,
        events: &[Event],
        wave: WaveNumber,
        remaining_to_spawn: u32,
        wave_active: bool,
        out: &mut Vec<Command>,
    ) {
        if !wave_active {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.spawn_interval.is_zero() || remaining_to_spawn == 0 {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                // A fresh wave starts its cadence from zero.
                Event::WaveStarted { .. } => {
                    self.accumulator = Duration::ZERO;
                    accumulated = Duration::ZERO;
                }
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let attempts = self.resolve_spawn_attempts().min(remaining_to_spawn as usize);

        let mut remaining = remaining_to_spawn;
        for _ in 0..attempts {
            let kind = if wave.is_boss_wave() && remaining == 1 {
                EnemyKind::Boss
            } else {
                self.select_kind(wave)
            };
            out.push(Command::SpawnEnemy { kind });
            remaining -= 1;
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn select_kind(&mut self, wave: WaveNumber) -> EnemyKind {
        let weights = EnemyKind::spawn_weights(wave);
        let total: u64 = weights.iter().map(|&(_, weight)| u64::from(weight)).sum();
        debug_assert!(total > 0, "spawn weights must not all be zero");
        let mut roll = self.advance_rng() % total;
        for &(kind, weight) in &weights {
            let weight = u64::from(weight);
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        EnemyKind::Scout
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}
