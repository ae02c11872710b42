use serde::{Deserialize, Serialize};

fn default_phase_number() -> u32 {
    1
}

fn default_threshold() -> f64 {
    1.0
}

/// One stage of a boss fight, active below a health threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossPhase {
    #[serde(default = "default_phase_number", alias = "phaseNumber")]
    pub number: u32,
    /// Health fraction at or below which this phase applies.
    #[serde(default = "default_threshold", alias = "healthThreshold")]
    pub health_threshold: f64,
    /// Ability ids the boss may use in this phase.
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default, alias = "onEnterMessage")]
    pub enter_message: Option<String>,
    /// Ticks of invulnerability granted on entering the phase.
    #[serde(default, alias = "invulnerabilityDuration")]
    pub invulnerability_ticks: u64,
    #[serde(default, alias = "isFlying")]
    pub flying: bool,
}

impl BossPhase {
    /// `health_threshold` is clamped to `[0, 1]`.
    pub fn new(number: u32, health_threshold: f64, abilities: Vec<String>) -> Self {
        Self {
            number,
            health_threshold: health_threshold.clamp(0.0, 1.0),
            abilities,
            enter_message: None,
            invulnerability_ticks: 0,
            flying: false,
        }
    }

    pub fn with_enter_message(mut self, message: impl Into<String>) -> Self {
        self.enter_message = Some(message.into());
        self
    }

    pub fn with_invulnerability(mut self, ticks: u64) -> Self {
        self.invulnerability_ticks = ticks;
        self
    }

    pub fn flying(mut self) -> Self {
        self.flying = true;
        self
    }

    /// Re-applies the threshold clamp to a phase built field by field
    /// (e.g. deserialized).
    pub fn validated(mut self) -> Self {
        self.health_threshold = self.health_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn applies_at(&self, health: f64) -> bool {
        health <= self.health_threshold
    }
}

/// Index of the phase active at `health`: the one with the lowest
/// threshold still at or above `health`, or the first phase if none is.
/// `None` only for an empty phase list.
pub fn phase_for_health(phases: &[BossPhase], health: f64) -> Option<usize> {
    if phases.is_empty() {
        return None;
    }
    let best = phases
        .iter()
        .enumerate()
        .filter(|(_, p)| p.applies_at(health))
        .min_by(|(_, a), (_, b)| a.health_threshold.total_cmp(&b.health_threshold))
        .map(|(i, _)| i);
    Some(best.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases() -> Vec<BossPhase> {
        vec![
            BossPhase::new(1, 1.0, vec!["soul_bolt".into()]),
            BossPhase::new(2, 0.6, vec!["ground_slam".into()]),
            BossPhase::new(3, 0.25, vec!["death_grip".into()]).with_invulnerability(40),
        ]
    }

    #[test]
    fn test_phase_selection_by_health() {
        let p = phases();
        assert_eq!(phase_for_health(&p, 1.0), Some(0));
        assert_eq!(phase_for_health(&p, 0.61), Some(0));
        assert_eq!(phase_for_health(&p, 0.6), Some(1));
        assert_eq!(phase_for_health(&p, 0.3), Some(1));
        assert_eq!(phase_for_health(&p, 0.1), Some(2));
        assert_eq!(phase_for_health(&p, 0.0), Some(2));
    }

    #[test]
    fn test_selection_ignores_list_order() {
        let mut p = phases();
        p.reverse();
        assert_eq!(p[phase_for_health(&p, 0.5).unwrap()].number, 2);
    }

    #[test]
    fn test_falls_back_to_first_phase() {
        let p = vec![BossPhase::new(1, 0.5, vec![]), BossPhase::new(2, 0.2, vec![])];
        assert_eq!(phase_for_health(&p, 0.9), Some(0));
        assert_eq!(phase_for_health(&[], 0.9), None);
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(BossPhase::new(1, 3.0, vec![]).health_threshold, 1.0);
        assert_eq!(BossPhase::new(1, -1.0, vec![]).health_threshold, 0.0);
    }

    #[test]
    fn test_deserialize_accepts_camel_case_keys() {
        let phase: BossPhase = serde_json::from_str(
            r#"{"phaseNumber":2,"healthThreshold":0.5,"abilities":["blink"],"invulnerabilityDuration":20,"isFlying":true}"#,
        )
        .unwrap();
        assert_eq!(phase.number, 2);
        assert_eq!(phase.invulnerability_ticks, 20);
        assert!(phase.flying);
    }
}
