//! The stock abilities every catalog can be seeded with.

use crate::{AbilityType, BossAbility};

pub(crate) fn soul_bolt() -> BossAbility {
    BossAbility::new("soul_bolt", AbilityType::Projectile)
        .with_display_name("Soul Bolt")
        .with_cooldown(60)
        .with_damage(15.0)
        .with_range(30.0)
        .with_param("projectileSpeed", 1.5)
}

pub(crate) fn ground_slam() -> BossAbility {
    BossAbility::new("ground_slam", AbilityType::Aoe)
        .with_display_name("Ground Slam")
        .with_cooldown(100)
        .with_damage(20.0)
        .with_range(8.0)
        .with_param("knockbackStrength", 2.0)
        .with_param("verticalKnockback", 0.5)
}

pub(crate) fn summon_minions() -> BossAbility {
    BossAbility::new("summon_minions", AbilityType::Summon)
        .with_display_name("Summon Minions")
        .with_cooldown(200)
        .with_range(15.0)
        .with_param("minionType", "ZOMBIE")
        .with_param("minionCount", 3)
        .with_param("spawnRadius", 5.0)
}

pub(crate) fn blink() -> BossAbility {
    BossAbility::new("blink", AbilityType::Teleport)
        .with_display_name("Blink")
        .with_cooldown(120)
        .with_range(25.0)
        .with_param("behindDistance", 3.0)
}

pub(crate) fn death_grip() -> BossAbility {
    BossAbility::new("death_grip", AbilityType::Grab)
        .with_display_name("Death Grip")
        .with_cooldown(140)
        .with_damage(10.0)
        .with_range(20.0)
        .with_param("pullStrength", 2.5)
        .with_param("stopDistance", 3.0)
}

pub(crate) fn all() -> [BossAbility; 5] {
    [
        soul_bolt(),
        ground_slam(),
        summon_minions(),
        blink(),
        death_grip(),
    ]
}
