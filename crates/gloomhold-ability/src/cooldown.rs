use std::collections::HashMap;

use gloomhold_tick::Tick;

/// Per-ability cooldowns, stored as the tick at which each ability is
/// ready again.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    ready_at: HashMap<String, Tick>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// An ability never used is always ready.
    pub fn is_ready(&self, ability: &str, now: Tick) -> bool {
        self.ready_at.get(ability).is_none_or(|&at| now >= at)
    }

    /// Starts `ability`'s cooldown at `now`.
    pub fn start(&mut self, ability: &str, cooldown_ticks: u64, now: Tick) {
        self.ready_at
            .insert(ability.to_string(), now.saturating_add(cooldown_ticks));
    }

    /// Ticks until `ability` is ready; 0 when it already is.
    pub fn remaining(&self, ability: &str, now: Tick) -> u64 {
        self.ready_at
            .get(ability)
            .map_or(0, |&at| at.saturating_sub(now))
    }

    pub fn clear(&mut self) {
        self.ready_at.clear();
    }
}
