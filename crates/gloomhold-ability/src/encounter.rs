use gloomhold_protocol::{EntityId, Vec3};
use gloomhold_tick::Tick;
use tracing::{debug, info};

use crate::{
    AbilityCatalog, BossAbility, BossPhase, CasterView, CooldownTracker, EncounterHost, TargetView,
    execute, phase_for_health,
};

/// Reported by [`BossEncounter::tick`] when the boss moves to a new phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseEntered {
    pub number: u32,
    pub message: Option<String>,
    pub invulnerability_ticks: u64,
}

/// The boss of one run.
///
/// Owned by the run's instance; the boss AI driver reads it to pick an
/// ability and calls [`use_ability`](Self::use_ability) to fire it.
#[derive(Debug, Clone)]
pub struct BossEncounter {
    boss_id: String,
    entity: EntityId,
    phases: Vec<BossPhase>,
    phase_index: usize,
    health: f64,
    position: Vec3,
    on_ground: bool,
    alive: bool,
    invulnerable_ticks: u64,
    cooldowns: CooldownTracker,
    now: Tick,
}

impl BossEncounter {
    /// A boss at full health, alive, on the ground at the origin, in its
    /// first phase.
    pub fn new(boss_id: impl Into<String>, entity: EntityId, phases: Vec<BossPhase>) -> Self {
        let phases: Vec<BossPhase> = phases.into_iter().map(BossPhase::validated).collect();
        let phase_index = phase_for_health(&phases, 1.0).unwrap_or(0);
        Self {
            boss_id: boss_id.into(),
            entity,
            phases,
            phase_index,
            health: 1.0,
            position: Vec3::ZERO,
            on_ground: true,
            alive: true,
            invulnerable_ticks: 0,
            cooldowns: CooldownTracker::new(),
            now: 0,
        }
    }

    /// Starts the encounter's clock at `now` instead of 0.
    pub fn starting_at(mut self, now: Tick) -> Self {
        self.now = now;
        self
    }

    pub fn boss_id(&self) -> &str {
        &self.boss_id
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    /// Sets the remaining health fraction, clamped to `[0, 1]`. Zero
    /// health kills the boss.
    pub fn set_health(&mut self, health: f64) {
        if !self.alive {
            return;
        }
        self.health = health.clamp(0.0, 1.0);
        if self.health <= 0.0 {
            self.mark_dead();
        }
    }

    pub fn set_position(&mut self, position: Vec3, on_ground: bool) {
        self.position = position;
        self.on_ground = on_ground;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn mark_dead(&mut self) {
        if self.alive {
            self.alive = false;
            self.health = 0.0;
            info!(boss = %self.boss_id, entity = %self.entity, "boss died");
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    pub fn invulnerable_ticks(&self) -> u64 {
        self.invulnerable_ticks
    }

    pub fn phases(&self) -> &[BossPhase] {
        &self.phases
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn current_phase(&self) -> Option<&BossPhase> {
        self.phases.get(self.phase_index)
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Ticks until `ability` is off cooldown.
    pub fn cooldown_remaining(&self, ability: &str) -> u64 {
        self.cooldowns.remaining(ability, self.now)
    }

    /// The boss as an ability sees it.
    pub fn caster(&self) -> CasterView {
        CasterView {
            position: self.position,
            alive: self.alive,
            on_ground: self.on_ground,
            invulnerable: self.is_invulnerable(),
        }
    }

    /// Advances the encounter to `now`: counts down invulnerability by the
    /// ticks elapsed and re-evaluates the phase for the current health.
    pub fn tick(&mut self, now: Tick) -> Option<PhaseEntered> {
        if !self.alive {
            return None;
        }
        let elapsed = now.saturating_sub(self.now);
        self.now = self.now.max(now);
        self.invulnerable_ticks = self.invulnerable_ticks.saturating_sub(elapsed);

        let next = phase_for_health(&self.phases, self.health)?;
        if next == self.phase_index {
            return None;
        }
        self.phase_index = next;
        let phase = &self.phases[next];
        if phase.invulnerability_ticks > 0 {
            self.invulnerable_ticks = phase.invulnerability_ticks;
        }
        info!(
            boss = %self.boss_id,
            phase = phase.number,
            health = self.health,
            invulnerable_ticks = phase.invulnerability_ticks,
            "boss entered phase"
        );
        Some(PhaseEntered {
            number: phase.number,
            message: phase.enter_message.clone(),
            invulnerability_ticks: phase.invulnerability_ticks,
        })
    }

    /// Tries to fire `ability` at `target`.
    ///
    /// Refused if the boss is dead or invulnerable, the ability is on
    /// cooldown, or [`can_use`](crate::can_use) fails. The cooldown starts
    /// only when the effect was actually applied.
    pub fn use_ability<H>(
        &mut self,
        ability: &BossAbility,
        target: Option<&TargetView>,
        host: &mut H,
    ) -> bool
    where
        H: EncounterHost + ?Sized,
    {
        if !self.alive || self.is_invulnerable() {
            return false;
        }
        if !self.cooldowns.is_ready(ability.id(), self.now) {
            return false;
        }
        if !execute(ability, &self.caster(), target, host) {
            return false;
        }
        self.cooldowns
            .start(ability.id(), ability.cooldown_ticks(), self.now);
        debug!(
            boss = %self.boss_id,
            ability = ability.id(),
            ready_at = self.now + ability.cooldown_ticks(),
            "boss used ability"
        );
        true
    }

    /// Abilities of the current phase that are off cooldown, in the
    /// phase's order. Ids missing from the catalog are skipped.
    pub fn usable_abilities<'c>(&self, catalog: &'c AbilityCatalog) -> Vec<&'c BossAbility> {
        if !self.alive {
            return Vec::new();
        }
        let Some(phase) = self.current_phase() else {
            return Vec::new();
        };
        phase
            .abilities
            .iter()
            .filter(|id| self.cooldowns.is_ready(id, self.now))
            .filter_map(|id| catalog.get(id))
            .collect()
    }
}
