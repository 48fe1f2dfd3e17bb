use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Moore neighbourhood offsets in row-major order.
const MOORE_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

pub const MAX_NEIGHBORS: usize = MOORE_OFFSETS.len();

/// A grid coordinate. Ordering is `x` first, then `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    #[default]
    Bounded,
    Toroidal,
}

/// Local state of one cell: its current value and the ceiling the landscape
/// gave it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    pub value: f64,
    pub capacity: f64,
}

/// Per-tick neighbour signal of a cell.
///
/// `sum` folds every neighbour reading, `sensed` keeps the readings a rule
/// chose to record so threshold counts can be taken against the final sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    sum: f64,
    sensed: [f64; MAX_NEIGHBORS],
    len: usize,
}

impl Default for Aggregate {
    fn default() -> Self {
        Aggregate {
            sum: 0.0,
            sensed: [0.0; MAX_NEIGHBORS],
            len: 0,
        }
    }
}

impl Aggregate {
    /// Back to the identity value. Called at the start of every aggregation phase.
    pub fn reset(&mut self) {
        *self = Aggregate::default();
    }

    pub fn add(&mut self, value: f64) {
        self.sum += value;
    }

    pub fn record(&mut self, value: f64) {
        // Toroidal grids narrower than 3 can revisit a neighbour, but never more than 8 times.
        if self.len < MAX_NEIGHBORS {
            self.sensed[self.len] = value;
            self.len += 1;
        }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sensed(&self) -> &[f64] {
        &self.sensed[..self.len]
    }

    pub fn count_above(&self, threshold: f64) -> usize {
        self.sensed().iter().filter(|&&v| v > threshold).count()
    }
}

/// Shape of the grid: dimensions plus boundary handling. Cheap to copy, so
/// parallel passes can hold it while the cells are borrowed mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub width: usize,
    pub height: usize,
    pub boundary: BoundaryMode,
}

impl Topology {
    pub fn index_of(&self, coord: Coord) -> usize {
        coord.y * self.width + coord.x
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Applies a signed offset. Bounded grids reject positions past the edge,
    /// toroidal grids wrap modulo width/height.
    pub fn offset(&self, coord: Coord, dx: i64, dy: i64) -> Option<Coord> {
        let x = coord.x as i64 + dx;
        let y = coord.y as i64 + dy;
        match self.boundary {
            BoundaryMode::Bounded => self
                .contains(x, y)
                .then(|| Coord::new(x as usize, y as usize)),
            BoundaryMode::Toroidal => Some(Coord::new(
                x.rem_euclid(self.width as i64) as usize,
                y.rem_euclid(self.height as i64) as usize,
            )),
        }
    }

    /// Moore neighbourhood: 3, 5 or 8 coordinates on a bounded grid, always 8 on a torus.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        MOORE_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.offset(coord, dx, dy))
    }

    /// Chebyshev distance, measured the short way round on a torus.
    pub fn distance(&self, a: Coord, b: Coord) -> usize {
        let dx = a.x.abs_diff(b.x);
        let dy = a.y.abs_diff(b.y);
        match self.boundary {
            BoundaryMode::Bounded => dx.max(dy),
            BoundaryMode::Toroidal => dx.min(self.width - dx).max(dy.min(self.height - dy)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    coord: Coord,
    pub(crate) state: CellState,
    pub(crate) aggregate: Aggregate,
}

impl Cell {
    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn value(&self) -> f64 {
        self.state.value
    }

    pub fn capacity(&self) -> f64 {
        self.state.capacity
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }
}

/// Fixed-size 2-D array of cells, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    topology: Topology,
    max_value: f64,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid with every value and capacity at zero.
    pub fn new(
        width: usize,
        height: usize,
        boundary: BoundaryMode,
        max_value: f64,
    ) -> SimResult<Self> {
        Grid::from_fn(width, height, boundary, max_value, |_| CellState {
            value: 0.0,
            capacity: 0.0,
        })
    }

    /// Builds every cell from `init`. Values and capacities are clamped to `[0, max_value]`.
    pub fn from_fn<F>(
        width: usize,
        height: usize,
        boundary: BoundaryMode,
        max_value: f64,
        mut init: F,
    ) -> SimResult<Self>
    where
        F: FnMut(Coord) -> CellState,
    {
        if width == 0 || height == 0 {
            return Err(SimError::invalid(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        if !max_value.is_finite() || max_value < 0.0 {
            return Err(SimError::invalid(format!(
                "max cell value must be a non-negative number, got {max_value}"
            )));
        }

        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let coord = Coord::new(x, y);
                let state = init(coord);
                let capacity = clamp_value(state.capacity, max_value);
                cells.push(Cell {
                    coord,
                    state: CellState {
                        value: clamp_value(state.value, capacity),
                        capacity,
                    },
                    aggregate: Aggregate::default(),
                });
            }
        }

        Ok(Grid {
            topology: Topology {
                width,
                height,
                boundary,
            },
            max_value,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.topology.width
    }

    pub fn height(&self) -> usize {
        self.topology.height
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.topology.boundary
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index_of(&self, coord: Coord) -> usize {
        self.topology.index_of(coord)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.topology.contains(x, y)
    }

    /// Strict lookup: no wrapping, even on a torus.
    pub fn cell_at(&self, x: i64, y: i64) -> SimResult<&Cell> {
        if !self.contains(x, y) {
            return Err(SimError::OutOfBounds { x, y });
        }
        Ok(&self.cells[y as usize * self.topology.width + x as usize])
    }

    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.index_of(coord)]
    }

    pub fn value(&self, coord: Coord) -> f64 {
        self.cell(coord).state.value
    }

    pub fn offset(&self, coord: Coord, dx: i64, dy: i64) -> Option<Coord> {
        self.topology.offset(coord, dx, dy)
    }

    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.topology.neighbors(coord)
    }

    pub fn distance(&self, a: Coord, b: Coord) -> usize {
        self.topology.distance(a, b)
    }

    /// Removes the whole resource of a cell and returns it.
    pub fn take(&mut self, coord: Coord) -> f64 {
        let index = self.index_of(coord);
        std::mem::replace(&mut self.cells[index].state.value, 0.0)
    }

    /// Sets a cell's value from outside a tick, e.g. a heat source.
    pub fn stimulate(&mut self, coord: Coord, value: f64) -> SimResult<()> {
        self.cell_at(coord.x as i64, coord.y as i64)?;
        let index = self.index_of(coord);
        let max_value = self.max_value;
        let state = &mut self.cells[index].state;
        state.value = clamp_value(value, max_value);
        state.capacity = state.capacity.max(state.value);
        Ok(())
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn total_value(&self) -> f64 {
        self.cells.iter().map(|c| c.state.value).sum()
    }
}

pub(crate) fn clamp_value(value: f64, max_value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(boundary: BoundaryMode) -> Grid {
        Grid::new(5, 4, boundary, 10.0).unwrap()
    }

    #[test]
    fn bounded_neighbor_counts() {
        let g = grid(BoundaryMode::Bounded);
        assert_eq!(g.neighbors(Coord::new(0, 0)).count(), 3);
        assert_eq!(g.neighbors(Coord::new(4, 3)).count(), 3);
        assert_eq!(g.neighbors(Coord::new(2, 0)).count(), 5);
        assert_eq!(g.neighbors(Coord::new(0, 2)).count(), 5);
        assert_eq!(g.neighbors(Coord::new(2, 2)).count(), 8);
    }

    #[test]
    fn toroidal_always_has_eight_neighbors() {
        let g = grid(BoundaryMode::Toroidal);
        for cell in g.cells() {
            assert_eq!(g.neighbors(cell.coord()).count(), 8);
        }
        let wrapped: Vec<_> = g.neighbors(Coord::new(0, 0)).collect();
        assert!(wrapped.contains(&Coord::new(4, 3)));
        assert!(wrapped.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn cell_at_rejects_outside_coordinates() {
        let g = grid(BoundaryMode::Toroidal);
        assert_eq!(
            g.cell_at(5, 0).unwrap_err(),
            SimError::OutOfBounds { x: 5, y: 0 }
        );
        assert!(g.cell_at(-1, 2).is_err());
        assert_eq!(g.cell_at(4, 3).unwrap().coord(), Coord::new(4, 3));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            Grid::new(0, 3, BoundaryMode::Bounded, 1.0),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn toroidal_distance_takes_short_way() {
        let g = grid(BoundaryMode::Toroidal);
        assert_eq!(g.distance(Coord::new(0, 0), Coord::new(4, 0)), 1);
        let b = grid(BoundaryMode::Bounded);
        assert_eq!(b.distance(Coord::new(0, 0), Coord::new(4, 0)), 4);
    }

    #[test]
    fn take_zeroes_the_cell() {
        let mut g = Grid::from_fn(2, 2, BoundaryMode::Bounded, 4.0, |_| CellState {
            value: 3.0,
            capacity: 4.0,
        })
        .unwrap();
        assert_eq!(g.take(Coord::new(1, 1)), 3.0);
        assert_eq!(g.value(Coord::new(1, 1)), 0.0);
        assert_eq!(g.total_value(), 9.0);
    }

    #[test]
    fn values_are_clamped_on_construction_and_stimulus() {
        let mut g = Grid::from_fn(2, 1, BoundaryMode::Bounded, 4.0, |_| CellState {
            value: 9.0,
            capacity: 9.0,
        })
        .unwrap();
        assert_eq!(g.value(Coord::new(0, 0)), 4.0);
        g.stimulate(Coord::new(1, 0), -3.0).unwrap();
        assert_eq!(g.value(Coord::new(1, 0)), 0.0);
        assert!(g.stimulate(Coord::new(2, 0), 1.0).is_err());
    }

    #[test]
    fn aggregate_counts_against_threshold() {
        let mut agg = Aggregate::default();
        for v in [1.0, 5.0, 7.0] {
            agg.add(v);
            agg.record(v);
        }
        assert_eq!(agg.sum(), 13.0);
        assert_eq!(agg.count_above(4.0), 2);
        agg.reset();
        assert_eq!(agg.sum(), 0.0);
        assert!(agg.sensed().is_empty());
    }
}
