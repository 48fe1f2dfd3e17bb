use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{trace, warn};

use crate::agent::{Agent, AgentId};
use crate::behavior::AgentBehavior;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::genetics::Genetics;
use crate::grid::{Coord, Grid};

/// Which agent stands on which cell. At most one agent per coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occupancy {
    cells: HashMap<Coord, AgentId>,
}

impl Occupancy {
    pub fn get(&self, coord: Coord) -> Option<AgentId> {
        self.cells.get(&coord).copied()
    }

    pub fn is_free(&self, coord: Coord) -> bool {
        !self.cells.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn claim(&mut self, id: AgentId, coord: Coord) -> SimResult<()> {
        match self.cells.get(&coord) {
            Some(&holder) if holder != id => Err(SimError::OccupancyConflict {
                x: coord.x,
                y: coord.y,
            }),
            _ => {
                self.cells.insert(coord, id);
                Ok(())
            }
        }
    }

    /// Frees `coord` if `id` holds it.
    pub fn vacate(&mut self, id: AgentId, coord: Coord) {
        if self.cells.get(&coord) == Some(&id) {
            self.cells.remove(&coord);
        }
    }

    /// Moves `id` from `from` to `to`; nothing changes when `to` is taken.
    pub fn relocate(&mut self, id: AgentId, from: Coord, to: Coord) -> SimResult<()> {
        if from == to {
            return Ok(());
        }
        self.claim(id, to)?;
        self.vacate(id, from);
        Ok(())
    }
}

/// What one population step did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopulationReport {
    pub births: usize,
    pub deaths: usize,
    /// Resource harvested from the grid this tick.
    pub consumed: f64,
}

/// All agents plus the occupancy index. Agents are kept in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    agents: Vec<Agent>,
    occupancy: Occupancy,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Population::default()
    }

    /// Places `config.agents.count` agents on distinct random cells of the spawn area.
    pub fn seed(config: &SimConfig, grid: &Grid, rng: &mut impl Rng) -> SimResult<Self> {
        let area = config.spawn_area();
        let mut spots: Vec<Coord> = (area.y_min..area.y_max)
            .flat_map(|y| (area.x_min..area.x_max).map(move |x| Coord::new(x, y)))
            .collect();
        if spots.len() < config.agents.count {
            return Err(SimError::invalid(format!(
                "{} agents do not fit into {} spawn cells",
                config.agents.count,
                spots.len()
            )));
        }
        spots.shuffle(rng);

        let mut population = Population::new();
        for &position in spots.iter().take(config.agents.count) {
            let genetics = Genetics::new_random(&config.agents, rng);
            let reserve = config.agents.starting_reserve;
            let reserve = rng.random_range(reserve.min..=reserve.max) as f64;
            population.spawn(grid, position, genetics, reserve, config.agents.max_age)?;
        }
        Ok(population)
    }

    /// Adds an agent on a free in-grid cell.
    pub fn spawn(
        &mut self,
        grid: &Grid,
        position: Coord,
        genetics: Genetics,
        reserve: f64,
        max_age: u32,
    ) -> SimResult<AgentId> {
        grid.cell_at(position.x as i64, position.y as i64)?;
        let id = AgentId(self.next_id);
        self.occupancy.claim(id, position)?;
        self.next_id += 1;
        self.agents.push(Agent::new(id, position, genetics, reserve, max_age));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index_of(id).map(|i| &self.agents[i])
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn total_reserve(&self) -> f64 {
        self.agents.iter().map(|a| a.reserve).sum()
    }

    /// Every agent on a distinct cell and the index holding exactly those cells.
    pub fn is_consistent(&self) -> bool {
        self.agents.len() == self.occupancy.len()
            && self
                .agents
                .iter()
                .all(|a| a.alive && self.occupancy.get(a.position) == Some(a.id))
    }

    fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.binary_search_by_key(&id, |a| a.id).ok()
    }

    /// One tick for every agent alive at its start, in id order: move,
    /// harvest, metabolize, age, cull, reproduce. Newborns wait for the next tick.
    pub fn step(
        &mut self,
        grid: &mut Grid,
        behavior: &dyn AgentBehavior,
        rng: &mut impl Rng,
    ) -> PopulationReport {
        let mut report = PopulationReport::default();
        let mut mated = HashSet::new();
        let roster = self.agents.len();

        for idx in 0..roster {
            if !self.agents[idx].alive {
                continue;
            }

            let target = behavior.choose_destination(&self.agents[idx], grid, &self.occupancy);
            self.move_agent(idx, target, grid);

            let agent = &mut self.agents[idx];
            let harvested = grid.take(agent.position);
            agent.live(harvested);
            report.consumed += harvested;

            if agent.should_die() {
                agent.alive = false;
                self.occupancy.vacate(agent.id, agent.position);
                report.deaths += 1;
                trace!(id = %agent.id, age = agent.age, reserve = agent.reserve, "agent died");
                continue;
            }

            if !mated.contains(&agent.id) && self.reproduce(idx, grid, behavior, rng, &mut mated) {
                report.births += 1;
            }
        }

        self.agents.retain(|a| a.alive);
        report
    }

    fn move_agent(&mut self, idx: usize, target: Coord, grid: &Grid) {
        let agent = &mut self.agents[idx];
        let (id, from) = (agent.id, agent.position);
        let result = grid
            .cell_at(target.x as i64, target.y as i64)
            .and_then(|_| self.occupancy.relocate(id, from, target));

        match result {
            Ok(()) => agent.position = target,
            Err(err) => warn!(id = %agent.id, %err, "move rejected, agent stays"),
        }
    }

    /// Free Moore neighbours of `coord`, lowest coordinate first.
    fn free_neighbors(&self, grid: &Grid, coord: Coord) -> Vec<Coord> {
        let mut free: Vec<Coord> = grid
            .neighbors(coord)
            .filter(|&c| self.occupancy.is_free(c))
            .collect();
        free.sort();
        free.dedup();
        free
    }

    /// First unmated, opposite-sex Moore neighbour that may reproduce and
    /// has a free cell of its own.
    fn find_partner(
        &self,
        idx: usize,
        grid: &Grid,
        behavior: &dyn AgentBehavior,
        mated: &HashSet<AgentId>,
    ) -> Option<usize> {
        let agent = &self.agents[idx];
        let mut around: Vec<Coord> = grid.neighbors(agent.position).collect();
        around.sort();
        around.dedup();

        around
            .into_iter()
            .filter_map(|c| self.occupancy.get(c))
            .filter(|id| *id != agent.id && !mated.contains(id))
            .filter_map(|id| self.index_of(id))
            .find(|&p| {
                let partner = &self.agents[p];
                partner.sex() == agent.sex().opposite()
                    && behavior.can_reproduce(partner)
                    && !self.free_neighbors(grid, partner.position).is_empty()
            })
    }

    fn reproduce(
        &mut self,
        idx: usize,
        grid: &Grid,
        behavior: &dyn AgentBehavior,
        rng: &mut impl Rng,
        mated: &mut HashSet<AgentId>,
    ) -> bool {
        if !behavior.can_reproduce(&self.agents[idx]) {
            return false;
        }
        // The child is born next to the initiator.
        let Some(&spot) = self.free_neighbors(grid, self.agents[idx].position).first() else {
            return false;
        };
        let Some(p) = self.find_partner(idx, grid, behavior, mated) else {
            return false;
        };

        let fraction = behavior.donation_fraction();
        let genetics = self.agents[idx].genetics.cross(&self.agents[p].genetics, rng);
        let reserve = self.agents[idx].donate(fraction) + self.agents[p].donate(fraction);
        let max_age = self.agents[idx].max_age;
        let parents = (self.agents[idx].id, self.agents[p].id);

        match self.spawn(grid, spot, genetics, reserve, max_age) {
            Ok(child) => {
                mated.insert(parents.0);
                mated.insert(parents.1);
                trace!(%child, parent = %parents.0, partner = %parents.1, reserve, "agent born");
                true
            }
            Err(err) => {
                warn!(%err, "birth failed");
                false
            }
        }
    }
}
