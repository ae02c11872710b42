//! Ability gating and per-type effects.

use std::f64::consts::TAU;

use gloomhold_protocol::{ParticipantId, Vec3};
use rand::Rng;
use tracing::{debug, trace};

use crate::{AbilityType, BossAbility, EffectTarget, EncounterHost};

/// Hostile mobs within this radius of the boss count toward the summon cap.
const SUMMON_CROWD_RADIUS: f64 = 15.0;
/// A summon is refused when more than this many hostile mobs are nearby.
const SUMMON_CROWD_LIMIT: usize = 20;
/// Upward lift added to a grab so the target clears the floor.
const GRAB_LIFT: f64 = 0.3;

/// The boss, as seen by an ability at the moment it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CasterView {
    pub position: Vec3,
    pub alive: bool,
    pub on_ground: bool,
    pub invulnerable: bool,
}

/// A participant an ability may aim at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub participant: ParticipantId,
    pub position: Vec3,
    /// Direction the participant is looking.
    pub facing: Vec3,
    pub alive: bool,
    pub flying: bool,
}

/// Whether `ability` may fire: the caster is alive and, when a target is
/// given and the ability has a positive range, the target is within it.
pub fn can_use(
    ability: &BossAbility,
    caster_alive: bool,
    caster_position: Vec3,
    target_position: Option<Vec3>,
) -> bool {
    if !caster_alive {
        return false;
    }
    match target_position {
        Some(target) if ability.range() > 0.0 => {
            caster_position.distance(target) <= ability.range()
        }
        _ => true,
    }
}

/// Fires `ability` from `caster` at `target`, applying its effect through
/// `host`. Returns `true` only if the effect was applied.
pub fn execute<H>(
    ability: &BossAbility,
    caster: &CasterView,
    target: Option<&TargetView>,
    host: &mut H,
) -> bool
where
    H: EncounterHost + ?Sized,
{
    if !can_use(ability, caster.alive, caster.position, target.map(|t| t.position)) {
        return false;
    }
    let live_target = target.filter(|t| t.alive);

    let applied = match ability.ability_type() {
        AbilityType::Projectile => live_target.is_some_and(|t| projectile(ability, caster, t, host)),
        AbilityType::Aoe => caster.on_ground && area_slam(ability, caster, host),
        AbilityType::Summon => summon(ability, caster, host),
        AbilityType::Buff => {
            apply_status(ability, EffectTarget::Boss, "RESISTANCE", host);
            true
        }
        AbilityType::Debuff => live_target.is_some_and(|t| {
            apply_status(ability, EffectTarget::Participant(t.participant), "SLOWNESS", host);
            true
        }),
        AbilityType::Teleport => {
            !caster.invulnerable && live_target.is_some_and(|t| blink(ability, t, host))
        }
        AbilityType::Grab => live_target.is_some_and(|t| grab(ability, caster, t, host)),
    };

    trace!(
        ability = ability.id(),
        kind = %ability.ability_type(),
        applied,
        "ability executed"
    );
    applied
}

fn projectile<H: EncounterHost + ?Sized>(
    ability: &BossAbility,
    caster: &CasterView,
    target: &TargetView,
    host: &mut H,
) -> bool {
    let speed = ability.param_f64("projectileSpeed", 1.5);
    let direction = (target.position - caster.position).normalized();
    host.launch_projectile(caster.position + direction.scale(0.5), direction.scale(speed));
    true
}

fn area_slam<H: EncounterHost + ?Sized>(
    ability: &BossAbility,
    caster: &CasterView,
    host: &mut H,
) -> bool {
    let strength = ability.param_f64("knockbackStrength", 2.0);
    let lift = ability.param_f64("verticalKnockback", 0.5);

    let victims = host.participants_within(caster.position, ability.range());
    for victim in victims.iter().filter(|v| v.alive) {
        let mut knockback = (victim.position - caster.position).normalized().scale(strength);
        knockback.y = lift;
        host.push(victim.participant, knockback);
        host.damage(victim.participant, ability.damage());
    }
    true
}

fn summon<H: EncounterHost + ?Sized>(
    ability: &BossAbility,
    caster: &CasterView,
    host: &mut H,
) -> bool {
    let crowd = host.hostile_mobs_near(caster.position, SUMMON_CROWD_RADIUS);
    if crowd > SUMMON_CROWD_LIMIT {
        debug!(ability = ability.id(), crowd, "summon refused, area crowded");
        return false;
    }

    let kind = ability.param_str("minionType", "ZOMBIE");
    let count = ability.param_u64("minionCount", 3);
    let radius = ability.param_f64("spawnRadius", 5.0).max(0.0);

    let mut rng = rand::rng();
    let mut spawned = 0u64;
    for _ in 0..count {
        let angle = rng.random_range(0.0..TAU);
        let distance = if radius > 0.0 {
            rng.random_range(0.0..radius)
        } else {
            0.0
        };
        let spot = caster.position + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);
        let Some(ground) = host.find_ground(spot) else {
            continue;
        };
        if host.spawn_mob(kind, ground).is_some() {
            spawned += 1;
        }
    }
    debug!(ability = ability.id(), kind, spawned, requested = count, "minions summoned");
    spawned > 0
}

fn apply_status<H: EncounterHost + ?Sized>(
    ability: &BossAbility,
    target: EffectTarget,
    default_effect: &str,
    host: &mut H,
) {
    let effect = ability.param_str("effect", default_effect);
    let duration = ability.param_u64("durationTicks", 100);
    let amplifier = ability.param_u64("amplifier", 0).min(u32::MAX as u64) as u32;
    host.apply_effect(target, effect, duration, amplifier);
}

fn blink<H: EncounterHost + ?Sized>(ability: &BossAbility, target: &TargetView, host: &mut H) -> bool {
    let behind = ability.param_f64("behindDistance", 3.0);
    let spot = target.position - target.facing.normalized().scale(behind);
    let landing = host.find_ground(spot).unwrap_or(spot);
    host.teleport_boss(landing)
}

fn grab<H: EncounterHost + ?Sized>(
    ability: &BossAbility,
    caster: &CasterView,
    target: &TargetView,
    host: &mut H,
) -> bool {
    if target.flying {
        return false;
    }
    let stop = ability.param_f64("stopDistance", 3.0);
    if caster.position.distance(target.position) <= stop {
        return false;
    }

    let strength = ability.param_f64("pullStrength", 2.5);
    let mut pull = (caster.position - target.position).normalized().scale(strength);
    pull.y += GRAB_LIFT;
    host.push(target.participant, pull);
    host.damage(target.participant, ability.damage());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_use_range_gate() {
        let a = BossAbility::new("bolt", AbilityType::Projectile).with_range(10.0);
        let origin = Vec3::ZERO;
        assert!(!can_use(&a, true, origin, Some(Vec3::new(15.0, 0.0, 0.0))));
        assert!(can_use(&a, true, origin, Some(Vec3::new(9.0, 0.0, 0.0))));
        assert!(can_use(&a, true, origin, Some(Vec3::new(10.0, 0.0, 0.0))));
        assert!(can_use(&a, true, origin, None));
    }

    #[test]
    fn test_can_use_requires_live_caster() {
        let a = BossAbility::new("bolt", AbilityType::Projectile);
        assert!(!can_use(&a, false, Vec3::ZERO, None));
    }

    #[test]
    fn test_zero_range_ignores_distance() {
        let a = BossAbility::new("nova", AbilityType::Aoe).with_range(0.0);
        assert!(can_use(&a, true, Vec3::ZERO, Some(Vec3::new(500.0, 0.0, 0.0))));
    }
}
