use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::automaton::CellularAutomaton;
use crate::behavior::{AgentBehavior, Forager};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::grid::{Coord, Grid};
use crate::landscape::{self, LandscapeMode};
use crate::population::Population;
use crate::rule::{CellRule, HeatRegulation, SugarRegrowth};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Paused,
    Running,
}

/// External commands fed to the clock by an input source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ToggleRun,
    Reset,
    /// Force a cell to a value, e.g. a heat source. Only honoured while running.
    Stimulate { coord: Coord, value: f64 },
    Quit,
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Number of the tick that just ran, starting at 0.
    pub tick: u64,
    pub births: usize,
    pub deaths: usize,
    pub consumed: f64,
    pub alive: usize,
    pub total_resource: f64,
    pub total_reserve: f64,
}

/// Cell as seen by a renderer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSnapshot {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub value: f64,
}

/// Agent as seen by a renderer: centre and side length in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub alive: bool,
}

/// Validates `config` and builds the construction-time grid and population.
pub fn initialize(config: &SimConfig, rng: &mut StdRng) -> SimResult<(Grid, Population)> {
    config.validate()?;
    let grid = landscape::generate(config, rng)?;
    let population = Population::seed(config, &grid, rng)?;
    Ok((grid, population))
}

/// Construction-time world, restored by `reset`.
struct Origin {
    grid: Grid,
    population: Population,
    rng: StdRng,
}

/// Heat regulation on cold landscapes, sugar regrowth everywhere else.
fn default_rule(config: &SimConfig) -> Box<dyn CellRule> {
    match config.landscape {
        LandscapeMode::Cold => Box::new(HeatRegulation::new(config.automaton.max_value)),
        _ => Box::new(SugarRegrowth::from(&config.automaton)),
    }
}

pub struct SimulationClockBuilder {
    config: SimConfig,
    rule: Option<Box<dyn CellRule>>,
    behavior: Option<Box<dyn AgentBehavior>>,
    start: Option<(Grid, Population)>,
}

impl SimulationClockBuilder {
    pub fn rule(mut self, rule: impl CellRule + 'static) -> Self {
        self.rule = Some(Box::new(rule));
        self
    }

    pub fn behavior(mut self, behavior: impl AgentBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Start from a hand-built world instead of generating one. `reset`
    /// returns to exactly this state.
    pub fn world(mut self, grid: Grid, population: Population) -> Self {
        self.start = Some((grid, population));
        self
    }

    pub fn build(self) -> SimResult<SimulationClock> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let (grid, population) = match self.start {
            Some(world) => {
                self.config.validate()?;
                world
            }
            None => initialize(&self.config, &mut rng)?,
        };
        let origin = Origin {
            grid: grid.clone(),
            population: population.clone(),
            rng: rng.clone(),
        };

        let rule = self.rule.unwrap_or_else(|| default_rule(&self.config));
        let behavior = self
            .behavior
            .unwrap_or_else(|| Box::new(Forager::from(&self.config.agents)));

        info!(
            width = grid.width(),
            height = grid.height(),
            agents = population.len(),
            rule = rule.name(),
            behavior = behavior.name(),
            "simulation initialized"
        );

        Ok(SimulationClock {
            config: self.config,
            automaton: CellularAutomaton::new(grid, rule),
            population,
            behavior,
            rng,
            origin,
            state: RunState::Paused,
            tick: 0,
        })
    }
}

/// Drives the population and the automaton in lock-step ticks.
pub struct SimulationClock {
    config: SimConfig,
    automaton: CellularAutomaton,
    population: Population,
    behavior: Box<dyn AgentBehavior>,
    rng: StdRng,
    origin: Origin,
    state: RunState,
    tick: u64,
}

impl SimulationClock {
    pub fn builder(config: SimConfig) -> SimulationClockBuilder {
        SimulationClockBuilder {
            config,
            rule: None,
            behavior: None,
            start: None,
        }
    }

    /// Generated world with the default behaviour and the rule the landscape
    /// implies: heat regulation for `LandscapeMode::Cold`, sugar regrowth otherwise.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        SimulationClock::builder(config).build()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Ticks completed since construction or the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        self.automaton.grid()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn toggle_run(&mut self) {
        self.state = match self.state {
            RunState::Paused => RunState::Running,
            RunState::Running => RunState::Paused,
        };
        info!(tick = self.tick, state = ?self.state, "run state toggled");
    }

    /// Back to the construction-time world, tick 0, paused.
    pub fn reset(&mut self) {
        self.automaton.replace_grid(self.origin.grid.clone());
        self.population = self.origin.population.clone();
        self.rng = self.origin.rng.clone();
        self.tick = 0;
        self.state = RunState::Paused;
        info!(agents = self.population.len(), "simulation reset");
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::ToggleRun => self.toggle_run(),
            Command::Reset => self.reset(),
            Command::Stimulate { coord, value } => {
                if !self.is_running() {
                    debug!(?coord, "stimulus ignored while paused");
                    return;
                }
                if let Err(err) = self.automaton.grid_mut().stimulate(coord, value) {
                    debug!(%err, "stimulus ignored");
                }
            }
            Command::Quit => {}
        }
    }

    /// Advances one tick when running: agents act first, then the automaton
    /// regulates. Returns `None` while paused.
    pub fn step(&mut self) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }

        let tick = self.tick;
        let agents = self
            .population
            .step(self.automaton.grid_mut(), self.behavior.as_ref(), &mut self.rng);
        self.automaton.step(tick);
        self.tick += 1;

        let report = TickReport {
            tick,
            births: agents.births,
            deaths: agents.deaths,
            consumed: agents.consumed,
            alive: self.population.len(),
            total_resource: self.grid().total_value(),
            total_reserve: self.population.total_reserve(),
        };
        debug!(
            tick,
            agents = report.alive,
            births = report.births,
            deaths = report.deaths,
            "tick complete"
        );
        Some(report)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellSnapshot> + '_ {
        let side = self.config.cell_size;
        self.grid().cells().map(move |cell| CellSnapshot {
            x: cell.coord().x as f64 * side,
            y: cell.coord().y as f64 * side,
            w: side,
            h: side,
            value: cell.value(),
        })
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentSnapshot> + '_ {
        let side = self.config.cell_size;
        self.population.agents().map(move |agent| AgentSnapshot {
            x: (agent.position.x as f64 + 0.5) * side,
            y: (agent.position.y as f64 + 0.5) * side,
            size: agent.size() * side,
            alive: agent.alive,
        })
    }
}
