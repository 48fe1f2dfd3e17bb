use serde::{Deserialize, Serialize};

use crate::behavior::VisionShape;
use crate::error::{SimError, SimResult};
use crate::grid::BoundaryMode;
use crate::landscape::LandscapeMode;

/// Inclusive range an attribute is drawn from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AttrRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy> AttrRange<T> {
    pub const fn new(min: T, max: T) -> Self {
        AttrRange { min, max }
    }

    pub const fn fixed(value: T) -> Self {
        AttrRange {
            min: value,
            max: value,
        }
    }
}

impl AttrRange<u32> {
    fn check(&self, name: &str) -> SimResult<()> {
        if self.min > self.max {
            return Err(SimError::invalid(format!(
                "{name} range is inverted ({}..={})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Half-open rectangle `[x_min, x_max) x [y_min, y_max)` agents are placed in.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpawnBounds {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl SpawnBounds {
    pub fn area(&self) -> usize {
        self.x_max.saturating_sub(self.x_min) * self.y_max.saturating_sub(self.y_min)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Agents placed at initialization.
    pub count: usize,
    pub metabolism: AttrRange<u32>,
    pub vision: AttrRange<u32>,
    pub starting_reserve: AttrRange<u32>,
    pub male_fertility_start: AttrRange<u32>,
    pub male_fertility_end: AttrRange<u32>,
    pub female_fertility_start: AttrRange<u32>,
    pub female_fertility_end: AttrRange<u32>,
    /// Age at which an agent dies regardless of reserve.
    pub max_age: u32,
    /// Reserve an agent must exceed before it may reproduce.
    pub reproduction_min_reserve: f64,
    /// Share of its reserve each parent hands to a child.
    pub donation_fraction: f64,
    pub vision_shape: VisionShape,
    pub spawn_bounds: Option<SpawnBounds>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            count: 200,
            metabolism: AttrRange::new(1, 4),
            vision: AttrRange::fixed(6),
            starting_reserve: AttrRange::new(20, 40),
            male_fertility_start: AttrRange::fixed(15),
            male_fertility_end: AttrRange::new(50, 60),
            female_fertility_start: AttrRange::fixed(15),
            female_fertility_end: AttrRange::new(40, 50),
            max_age: 100,
            reproduction_min_reserve: 10.0,
            donation_fraction: 0.5,
            vision_shape: VisionShape::Axial,
            spawn_bounds: Some(SpawnBounds {
                x_min: 15,
                x_max: 35,
                y_min: 15,
                y_max: 35,
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutomatonConfig {
    /// Upper bound of every cell value (V_MAX).
    pub max_value: f64,
    pub growth_per_tick: f64,
    /// Regrowth happens every `growth_period` ticks; 0 disables it.
    pub growth_period: u64,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            max_value: 4.0,
            growth_per_tick: 1.0,
            growth_period: 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for landscape generation and agent placement.
    pub seed: u64,
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    pub boundary: BoundaryMode,
    pub landscape: LandscapeMode,
    /// Side of one cell on screen, in pixels.
    pub cell_size: f64,
    pub agents: AgentConfig,
    pub automaton: AutomatonConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::sugarscape()
    }
}

impl SimConfig {
    /// Resource-foraging model.
    pub fn sugarscape() -> Self {
        Self {
            seed: 42,
            width: 50,
            height: 50,
            boundary: BoundaryMode::Bounded,
            landscape: LandscapeMode::Procedural,
            cell_size: 15.0,
            agents: AgentConfig::default(),
            automaton: AutomatonConfig::default(),
        }
    }

    /// Heat-diffusion automaton without agents.
    pub fn thermal() -> Self {
        Self {
            seed: 42,
            width: 80,
            height: 80,
            boundary: BoundaryMode::Bounded,
            landscape: LandscapeMode::Cold,
            cell_size: 10.0,
            agents: AgentConfig {
                count: 0,
                spawn_bounds: None,
                ..AgentConfig::default()
            },
            automaton: AutomatonConfig {
                max_value: 100.0,
                growth_per_tick: 0.0,
                growth_period: 0,
            },
        }
    }

    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(json)
            .map_err(|e| SimError::invalid(format!("cannot parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Cells agents may be placed on at initialization.
    pub fn spawn_area(&self) -> SpawnBounds {
        let full = SpawnBounds {
            x_min: 0,
            x_max: self.width,
            y_min: 0,
            y_max: self.height,
        };
        match self.agents.spawn_bounds {
            Some(b) => SpawnBounds {
                x_min: b.x_min.min(self.width),
                x_max: b.x_max.min(self.width),
                y_min: b.y_min.min(self.height),
                y_max: b.y_max.min(self.height),
            },
            None => full,
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::invalid(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(SimError::invalid("cell_size must be positive"));
        }

        let automaton = &self.automaton;
        if !(automaton.max_value.is_finite() && automaton.max_value >= 0.0) {
            return Err(SimError::invalid("automaton.max_value must be non-negative"));
        }
        if !(automaton.growth_per_tick.is_finite() && automaton.growth_per_tick >= 0.0) {
            return Err(SimError::invalid(
                "automaton.growth_per_tick must be non-negative",
            ));
        }

        let agents = &self.agents;
        agents.metabolism.check("agents.metabolism")?;
        agents.vision.check("agents.vision")?;
        agents.starting_reserve.check("agents.starting_reserve")?;
        agents.male_fertility_start.check("agents.male_fertility_start")?;
        agents.male_fertility_end.check("agents.male_fertility_end")?;
        agents.female_fertility_start.check("agents.female_fertility_start")?;
        agents.female_fertility_end.check("agents.female_fertility_end")?;

        if agents.vision.min == 0 {
            return Err(SimError::invalid("agents.vision must be positive"));
        }
        if agents.male_fertility_end.min <= agents.male_fertility_start.max {
            return Err(SimError::invalid(
                "male fertility end must come after fertility start",
            ));
        }
        if agents.female_fertility_end.min <= agents.female_fertility_start.max {
            return Err(SimError::invalid(
                "female fertility end must come after fertility start",
            ));
        }
        if agents.max_age == 0 {
            return Err(SimError::invalid("agents.max_age must be positive"));
        }
        if !(agents.donation_fraction > 0.0 && agents.donation_fraction <= 1.0) {
            return Err(SimError::invalid(format!(
                "agents.donation_fraction must lie in (0, 1], got {}",
                agents.donation_fraction
            )));
        }
        let min_reserve = agents.reproduction_min_reserve;
        if !(min_reserve.is_finite() && min_reserve >= 0.0) {
            return Err(SimError::invalid(
                "agents.reproduction_min_reserve must be non-negative",
            ));
        }

        if let Some(b) = agents.spawn_bounds {
            if b.x_min >= b.x_max || b.y_min >= b.y_max {
                return Err(SimError::invalid("agents.spawn_bounds is empty"));
            }
        }
        let room = self.spawn_area().area();
        if agents.count > room {
            return Err(SimError::invalid(format!(
                "{} agents do not fit into {room} spawn cells",
                agents.count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        SimConfig::sugarscape().validate().unwrap();
        SimConfig::thermal().validate().unwrap();
    }

    #[test]
    fn rejects_zero_dimensions() {
        let config = SimConfig {
            width: 0,
            ..SimConfig::sugarscape()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_fertility_window_that_ends_before_it_starts() {
        let mut config = SimConfig::sugarscape();
        config.agents.female_fertility_end = AttrRange::fixed(15);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_vision() {
        let mut config = SimConfig::sugarscape();
        config.agents.vision = AttrRange::new(0, 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_more_agents_than_spawn_cells() {
        let mut config = SimConfig::sugarscape();
        config.agents.count = 401;
        assert!(config.validate().is_err());
        config.agents.spawn_bounds = None;
        config.validate().unwrap();
    }

    #[test]
    fn json_fills_missing_fields_from_defaults() {
        let config = SimConfig::from_json_str(
            r#"{
                "width": 20,
                "height": 10,
                "boundary": "toroidal",
                "agents": { "count": 5, "spawn_bounds": null }
            }"#,
        )
        .unwrap();
        assert_eq!(config.width, 20);
        assert_eq!(config.boundary, BoundaryMode::Toroidal);
        assert_eq!(config.agents.count, 5);
        assert_eq!(config.agents.max_age, 100);
        assert_eq!(config.automaton.max_value, 4.0);
    }

    #[test]
    fn json_errors_are_configuration_errors() {
        assert!(matches!(
            SimConfig::from_json_str("{ \"width\": -1 }"),
            Err(SimError::InvalidConfiguration(_))
        ));
    }
}
