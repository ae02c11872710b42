use serde::{Deserialize, Serialize};
use tracing::warn;

/// World rules applied to the area every time it is (re)created.
///
/// The defaults are the dungeon baseline: permanent midnight, no weather
/// or daylight cycle, hostile mobs only and only where the run spawns
/// them, nothing saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaSettings {
    /// Fixed time of day in game ticks (18000 = midnight).
    pub time_of_day: u64,
    pub daylight_cycle: bool,
    pub weather_cycle: bool,
    /// The world's own mob spawning. Runs spawn their mobs explicitly.
    pub natural_mob_spawning: bool,
    pub hostile_spawning: bool,
    pub passive_spawning: bool,
    pub mob_griefing: bool,
    pub autosave: bool,
}

impl Default for AreaSettings {
    fn default() -> Self {
        Self {
            time_of_day: 18_000,
            daylight_cycle: false,
            weather_cycle: false,
            natural_mob_spawning: false,
            hostile_spawning: true,
            passive_spawning: false,
            mob_griefing: false,
            autosave: false,
        }
    }
}

/// Instance space configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Name of the shared area in the backend.
    pub area_name: String,
    /// Cells per grid row; the grid holds `grid_width²` runs.
    pub grid_width: u32,
    /// Distance between neighbouring cell origins.
    pub cell_spacing: f64,
    /// Height of every cell origin.
    pub base_height: f64,
    pub settings: AreaSettings,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            area_name: "dungeon_world".to_string(),
            grid_width: 10,
            cell_spacing: 100.0,
            base_height: 64.0,
            settings: AreaSettings::default(),
        }
    }
}

impl SpaceConfig {
    /// Clamps out-of-range values. Called by
    /// [`InstanceSpace::new`](crate::InstanceSpace::new).
    pub fn validated(mut self) -> Self {
        if self.grid_width == 0 {
            warn!("grid_width must be at least 1, using 1");
            self.grid_width = 1;
        }
        if !(self.cell_spacing > 0.0) {
            warn!(spacing = self.cell_spacing, "cell_spacing must be positive, using 100");
            self.cell_spacing = 100.0;
        }
        self
    }

    /// Number of runs the grid can hold at once.
    pub fn capacity(&self) -> usize {
        (self.grid_width as usize) * (self.grid_width as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_settings() {
        let s = AreaSettings::default();
        assert_eq!(s.time_of_day, 18_000);
        assert!(s.hostile_spawning);
        assert!(!s.natural_mob_spawning);
        assert!(!s.weather_cycle);
        assert!(!s.daylight_cycle);
        assert!(!s.autosave);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: SpaceConfig = serde_json::from_str(r#"{"grid_width": 4}"#).unwrap();
        assert_eq!(cfg.grid_width, 4);
        assert_eq!(cfg.cell_spacing, 100.0);
        assert_eq!(cfg.area_name, "dungeon_world");
        assert_eq!(cfg.capacity(), 16);
    }

    #[test]
    fn test_validated_fixes_degenerate_grid() {
        let cfg = SpaceConfig {
            grid_width: 0,
            cell_spacing: -5.0,
            ..SpaceConfig::default()
        }
        .validated();
        assert_eq!(cfg.grid_width, 1);
        assert_eq!(cfg.cell_spacing, 100.0);
    }
}
