//! Damage resolution: direct hits, splash, status effects, the strike ability.

use std::time::Duration;

use quiz_defence_core::{ElementKind, EnemyId, UpgradeFlags, UpgradeKind, WorldPoint};

use crate::enemies::{DotStack, EnemyArena};

/// Splash radius of the splash upgrade and the storm elemental charge.
pub(crate) const SPLASH_RADIUS: f32 = 45.0;

/// Splash radius the area-damage challenge buff grants to every attack.
pub(crate) const AREA_BUFF_RADIUS: f32 = 35.0;

/// Direct damage of the strike ability.
pub(crate) const STRIKE_DAMAGE: u32 = 120;

/// Splash damage the strike ability deals around its target.
pub(crate) const STRIKE_SPLASH_DAMAGE: u32 = 40;

/// Splash radius of the strike ability.
pub(crate) const STRIKE_RADIUS: f32 = 60.0;

/// Slow duration a frost elemental charge applies.
const FROST_SLOW_DURATION: Duration = Duration::from_secs(3);

/// Damage per tick of the toxin upgrade and the ember elemental charge.
const DOT_DAMAGE_PER_TICK: u32 = 4;

/// Tick count of the toxin upgrade and the ember elemental charge.
const DOT_TICKS: u32 = 5;

/// An enemy killed while resolving damage, with its raw bounty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KillRecord {
    pub(crate) enemy: EnemyId,
    pub(crate) bounty: u32,
}

/// Resolves one attack landing on a target enemy.
///
/// Applies direct damage, then any splash around the impact point, then
/// status effects from the toxin upgrade or an elemental charge. Killed
/// enemies are removed from the arena and reported through `kills`.
pub(crate) fn resolve_hit(
    enemies: &mut EnemyArena,
    target: EnemyId,
    damage: u32,
    upgrades: UpgradeFlags,
    element: Option<ElementKind>,
    area_damage_buff: bool,
    kills: &mut Vec<KillRecord>,
) {
    let Some(enemy) = enemies.get_mut(target) else {
        return;
    };
    let impact = enemy.position;
    enemy.apply_damage(damage);

    if upgrades.has(UpgradeKind::Toxin) || element == Some(ElementKind::Ember) {
        enemy.attach_dot(DotStack::new(DOT_DAMAGE_PER_TICK, DOT_TICKS));
    }
    if element == Some(ElementKind::Frost) {
        enemy.slow(FROST_SLOW_DURATION);
    }

    let splash_radius = splash_radius(upgrades, element, area_damage_buff);
    if let Some(radius) = splash_radius {
        splash(enemies, impact, target, radius, damage);
    }

    reap(enemies, kills);
}

/// Resolves the strike ability on a selected enemy.
pub(crate) fn resolve_strike(
    enemies: &mut EnemyArena,
    target: EnemyId,
    kills: &mut Vec<KillRecord>,
) {
    let Some(enemy) = enemies.get_mut(target) else {
        return;
    };
    let impact = enemy.position;
    enemy.apply_damage(STRIKE_DAMAGE);
    splash(enemies, impact, target, STRIKE_RADIUS, STRIKE_SPLASH_DAMAGE);
    reap(enemies, kills);
}

fn splash_radius(
    upgrades: UpgradeFlags,
    element: Option<ElementKind>,
    area_damage_buff: bool,
) -> Option<f32> {
    let upgraded = upgrades.has(UpgradeKind::Splash) || element == Some(ElementKind::Storm);
    match (upgraded, area_damage_buff) {
        (true, _) => Some(SPLASH_RADIUS),
        (false, true) => Some(AREA_BUFF_RADIUS),
        (false, false) => None,
    }
}

fn splash(
    enemies: &mut EnemyArena,
    impact: WorldPoint,
    direct_target: EnemyId,
    radius: f32,
    damage: u32,
) {
    for enemy in enemies.iter_mut() {
        if enemy.id == direct_target {
            continue;
        }
        if enemy.position.distance_to(impact) <= radius {
            enemy.apply_damage(damage);
        }
    }
}

/// Removes enemies whose health reached zero and records their bounties.
pub(crate) fn reap(enemies: &mut EnemyArena, kills: &mut Vec<KillRecord>) {
    let dead: Vec<(EnemyId, u32)> = enemies
        .iter()
        .filter(|enemy| enemy.health == 0)
        .map(|enemy| (enemy.id, enemy.kind.stats().bounty))
        .collect();
    for (enemy, bounty) in dead {
        enemies.remove(enemy);
        kills.push(KillRecord { enemy, bounty });
    }
}
