use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::grid::{Coord, Grid};
use crate::population::Occupancy;

/// Which cells an agent can see.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisionShape {
    /// Straight lines along the four axes, `vision` steps each.
    #[default]
    Axial,
    /// Every cell within Chebyshev distance `vision`.
    Moore,
}

/// Movement and mating strategy of agents.
pub trait AgentBehavior: Send + Sync {
    /// Cells the agent can see, its own cell excluded. Cells outside the grid
    /// are dropped by `choose_destination`.
    fn sense(&self, agent: &Agent, grid: &Grid) -> BTreeSet<Coord>;

    fn can_reproduce(&self, agent: &Agent) -> bool;

    /// Share of its reserve each parent hands to a child.
    fn donation_fraction(&self) -> f64;

    fn name(&self) -> &'static str;

    /// Richest free cell in sight. Ties go to the nearest, then the lowest
    /// coordinate. The agent stays put only if its own cell is strictly richer.
    fn choose_destination(&self, agent: &Agent, grid: &Grid, occupancy: &Occupancy) -> Coord {
        let here = agent.position;
        let best = self
            .sense(agent, grid)
            .into_iter()
            .filter(|&c| {
                let inside = grid.cell_at(c.x as i64, c.y as i64).is_ok();
                if !inside {
                    warn!(id = %agent.id, cell = ?c, "sensed cell outside the grid ignored");
                }
                inside && occupancy.is_free(c)
            })
            .min_by(|&a, &b| rank(grid, here, a, b));

        match best {
            Some(target) if grid.value(target) >= grid.value(here) => target,
            _ => here,
        }
    }
}

fn rank(grid: &Grid, here: Coord, a: Coord, b: Coord) -> Ordering {
    grid.value(b)
        .total_cmp(&grid.value(a))
        .then_with(|| grid.distance(here, a).cmp(&grid.distance(here, b)))
        .then_with(|| a.cmp(&b))
}

/// Vision-guided resource forager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forager {
    pub shape: VisionShape,
    pub reproduction_min_reserve: f64,
    pub donation_fraction: f64,
}

impl From<&AgentConfig> for Forager {
    fn from(config: &AgentConfig) -> Self {
        Forager {
            shape: config.vision_shape,
            reproduction_min_reserve: config.reproduction_min_reserve,
            donation_fraction: config.donation_fraction,
        }
    }
}

impl Default for Forager {
    fn default() -> Self {
        Forager::from(&AgentConfig::default())
    }
}

impl AgentBehavior for Forager {
    fn sense(&self, agent: &Agent, grid: &Grid) -> BTreeSet<Coord> {
        let here = agent.position;
        let reach = agent.vision() as i64;
        let mut seen = BTreeSet::new();

        match self.shape {
            VisionShape::Axial => {
                for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
                    for step in 1..=reach {
                        // Off the edge of a bounded grid, or back at the start on a torus.
                        match grid.offset(here, dx * step, dy * step) {
                            Some(c) if c != here => {
                                seen.insert(c);
                            }
                            _ => break,
                        }
                    }
                }
            }
            VisionShape::Moore => {
                for dy in -reach..=reach {
                    for dx in -reach..=reach {
                        if let Some(c) = grid.offset(here, dx, dy) {
                            if c != here {
                                seen.insert(c);
                            }
                        }
                    }
                }
            }
        }
        seen
    }

    fn can_reproduce(&self, agent: &Agent) -> bool {
        agent.alive && agent.is_fertile() && agent.reserve > self.reproduction_min_reserve
    }

    fn donation_fraction(&self) -> f64 {
        self.donation_fraction
    }

    fn name(&self) -> &'static str {
        "forager"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentId, Sex};
    use crate::genetics::Genetics;
    use crate::grid::{BoundaryMode, CellState};

    fn forager(shape: VisionShape) -> Forager {
        Forager {
            shape,
            reproduction_min_reserve: 10.0,
            donation_fraction: 0.5,
        }
    }

    fn agent_at(x: usize, y: usize, vision: u32) -> Agent {
        let genetics = Genetics {
            sex: Sex::Male,
            vision,
            metabolism: 1.0,
            fertility_start: 1,
            fertility_end: 5,
        };
        Agent::new(AgentId(0), Coord::new(x, y), genetics, 20.0, 100)
    }

    fn grid_with<F: Fn(Coord) -> f64>(w: usize, h: usize, boundary: BoundaryMode, f: F) -> Grid {
        Grid::from_fn(w, h, boundary, 10.0, |c| CellState {
            value: f(c),
            capacity: 10.0,
        })
        .unwrap()
    }

    #[test]
    fn axial_vision_stops_at_bounded_edge() {
        let grid = grid_with(5, 5, BoundaryMode::Bounded, |_| 1.0);
        let seen = forager(VisionShape::Axial).sense(&agent_at(0, 0, 3), &grid);
        let expected: BTreeSet<_> = [(1, 0), (2, 0), (3, 0), (0, 1), (0, 2), (0, 3)]
            .into_iter()
            .map(|(x, y)| Coord::new(x, y))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn axial_vision_wraps_once_on_torus() {
        let grid = grid_with(4, 4, BoundaryMode::Toroidal, |_| 1.0);
        let seen = forager(VisionShape::Axial).sense(&agent_at(1, 1, 10), &grid);
        // Whole row and column except the agent's own cell.
        assert_eq!(seen.len(), 6);
        assert!(!seen.contains(&Coord::new(1, 1)));
        assert!(seen.contains(&Coord::new(1, 3)));
    }

    #[test]
    fn moore_vision_covers_the_square() {
        let grid = grid_with(5, 5, BoundaryMode::Bounded, |_| 1.0);
        let seen = forager(VisionShape::Moore).sense(&agent_at(2, 2, 1), &grid);
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn picks_richest_free_cell() {
        let grid = grid_with(5, 1, BoundaryMode::Bounded, |c| c.x as f64);
        let agent = agent_at(0, 0, 4);
        let mut occupancy = Occupancy::default();
        occupancy.claim(AgentId(0), Coord::new(0, 0)).unwrap();
        let behavior = forager(VisionShape::Axial);
        assert_eq!(
            behavior.choose_destination(&agent, &grid, &occupancy),
            Coord::new(4, 0)
        );

        occupancy.claim(AgentId(9), Coord::new(4, 0)).unwrap();
        assert_eq!(
            behavior.choose_destination(&agent, &grid, &occupancy),
            Coord::new(3, 0)
        );
    }

    #[test]
    fn ties_go_to_nearest_then_lowest_coordinate() {
        let grid = grid_with(7, 7, BoundaryMode::Bounded, |c| {
            if c == Coord::new(3, 1) || c == Coord::new(5, 3) || c == Coord::new(1, 3) {
                5.0
            } else {
                0.0
            }
        });
        let agent = agent_at(3, 3, 3);
        let occupancy = Occupancy::default();
        let choice = forager(VisionShape::Axial).choose_destination(&agent, &grid, &occupancy);
        assert_eq!(choice, Coord::new(1, 3));
    }

    #[test]
    fn stays_when_own_cell_is_strictly_richer() {
        let grid = grid_with(3, 3, BoundaryMode::Bounded, |c| {
            if c == Coord::new(1, 1) { 3.0 } else { 2.0 }
        });
        let agent = agent_at(1, 1, 1);
        let occupancy = Occupancy::default();
        assert_eq!(
            forager(VisionShape::Moore).choose_destination(&agent, &grid, &occupancy),
            Coord::new(1, 1)
        );
    }

    /// Reports one cell below a 3x3 grid plus its own neighbour to the right.
    struct Stray;

    impl AgentBehavior for Stray {
        fn sense(&self, agent: &Agent, _grid: &Grid) -> BTreeSet<Coord> {
            [Coord::new(0, 5), Coord::new(agent.position.x + 1, agent.position.y)]
                .into_iter()
                .collect()
        }

        fn can_reproduce(&self, _agent: &Agent) -> bool {
            false
        }

        fn donation_fraction(&self) -> f64 {
            0.5
        }

        fn name(&self) -> &'static str {
            "stray"
        }
    }

    #[test]
    fn cells_outside_the_grid_are_never_chosen() {
        let grid = grid_with(3, 3, BoundaryMode::Bounded, |c| c.x as f64);
        let occupancy = Occupancy::default();

        let agent = agent_at(0, 0, 1);
        assert_eq!(Stray.choose_destination(&agent, &grid, &occupancy), Coord::new(1, 0));

        // Only (3, 2) and (0, 5) are offered, both off the grid.
        let agent = agent_at(2, 2, 1);
        assert_eq!(Stray.choose_destination(&agent, &grid, &occupancy), Coord::new(2, 2));
    }

    #[test]
    fn reproduction_needs_fertility_and_reserve() {
        let behavior = forager(VisionShape::Axial);
        let mut agent = agent_at(0, 0, 1);
        agent.age = 2;
        assert!(behavior.can_reproduce(&agent));
        agent.reserve = 10.0;
        assert!(!behavior.can_reproduce(&agent));
        agent.reserve = 20.0;
        agent.age = 5;
        assert!(!behavior.can_reproduce(&agent));
    }
}
