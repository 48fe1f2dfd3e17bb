use rayon::prelude::*;

use crate::grid::{Aggregate, Coord, Grid, clamp_value};
use crate::rule::CellRule;

/// Owns the grid and advances every cell once per tick.
///
/// A tick is two passes over the whole grid. Aggregation resets each cell's
/// buffer and folds in the neighbours' pre-tick values; only then does the
/// apply pass turn buffers into new values. No cell ever sees another cell's
/// post-tick value, so visiting order cannot change the outcome.
pub struct CellularAutomaton {
    grid: Grid,
    rule: Box<dyn CellRule>,
}

impl CellularAutomaton {
    pub fn new(grid: Grid, rule: Box<dyn CellRule>) -> Self {
        CellularAutomaton { grid, rule }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn rule(&self) -> &dyn CellRule {
        self.rule.as_ref()
    }

    pub fn replace_grid(&mut self, grid: Grid) {
        self.grid = grid;
    }

    /// Both phases, cells processed in parallel.
    pub fn step(&mut self, tick: u64) {
        self.aggregate();
        self.apply(tick);
    }

    fn aggregate(&mut self) {
        let topology = self.grid.topology();
        let rule = self.rule.as_ref();
        let values: Vec<f64> = self.grid.cells().map(|c| c.value()).collect();

        self.grid.cells_mut().par_iter_mut().for_each(|cell| {
            cell.aggregate.reset();
            for n in topology.neighbors(cell.coord()) {
                rule.fold(&mut cell.aggregate, values[topology.index_of(n)]);
            }
        });
    }

    fn apply(&mut self, tick: u64) {
        let max_value = self.grid.max_value();
        let rule = self.rule.as_ref();

        self.grid.cells_mut().par_iter_mut().for_each(|cell| {
            let next = rule.next(cell.state, &cell.aggregate, tick);
            cell.state.value = clamp_value(next, max_value);
        });
    }

    /// Sequential tick visiting cells in `order` (indices into the row-major
    /// cell array) during both phases. Indices outside the grid are skipped.
    pub fn step_in_order(&mut self, tick: u64, order: &[usize]) {
        let topology = self.grid.topology();
        let max_value = self.grid.max_value();
        let len = self.grid.len();

        for &i in order.iter().filter(|&&i| i < len) {
            let coord = Coord::new(i % topology.width, i / topology.width);
            let mut aggregate = Aggregate::default();
            for n in topology.neighbors(coord) {
                self.rule.fold(&mut aggregate, self.grid.value(n));
            }
            self.grid.cells_mut()[i].aggregate = aggregate;
        }

        for &i in order.iter().filter(|&&i| i < len) {
            let cell = &mut self.grid.cells_mut()[i];
            let next = self.rule.next(cell.state, &cell.aggregate, tick);
            cell.state.value = clamp_value(next, max_value);
        }
    }
}

impl std::fmt::Debug for CellularAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellularAutomaton")
            .field("rule", &self.rule.name())
            .field("width", &self.grid.width())
            .field("height", &self.grid.height())
            .finish()
    }
}
