//! Lock-step co-simulation of a cellular automaton and an agent population
//! on a shared 2-D grid.
//!
//! Each tick the [`Population`] moves, feeds, ages, culls and breeds its
//! agents against the current [`Grid`], then the [`CellularAutomaton`]
//! updates every cell from its neighbours. [`SimulationClock`] ties the two
//! together and owns the pause/run/reset state machine.

pub mod agent;
pub mod automaton;
pub mod behavior;
pub mod clock;
pub mod config;
pub mod error;
pub mod genetics;
pub mod grid;
pub mod landscape;
pub mod observer;
pub mod population;
pub mod rule;
pub mod stats;

pub use agent::{Agent, AgentId, Sex};
pub use automaton::CellularAutomaton;
pub use behavior::{AgentBehavior, Forager, VisionShape};
pub use clock::{
    AgentSnapshot, CellSnapshot, Command, RunState, SimulationClock, SimulationClockBuilder,
    TickReport, initialize,
};
pub use config::{AgentConfig, AttrRange, AutomatonConfig, SimConfig, SpawnBounds};
pub use error::{SimError, SimResult};
pub use genetics::Genetics;
pub use grid::{Aggregate, BoundaryMode, Cell, CellState, Coord, Grid, Topology};
pub use landscape::LandscapeMode;
pub use observer::{CommandQueue, Driver, InputSink, NullRender, RenderSink};
pub use population::{Occupancy, Population, PopulationReport};
pub use rule::{CellRule, HeatRegulation, Inert, SugarRegrowth};
pub use stats::SimulationStats;
