use crate::config::AutomatonConfig;
use crate::grid::{Aggregate, CellState};

/// Local update rule of the automaton.
///
/// `fold` sees each neighbour's pre-tick value during aggregation, `next`
/// turns a cell's state and its finished aggregate into the new value. Both
/// must be pure: the automaton runs them on many cells at once.
pub trait CellRule: Send + Sync {
    fn fold(&self, aggregate: &mut Aggregate, neighbor: f64) {
        aggregate.add(neighbor);
        aggregate.record(neighbor);
    }

    fn next(&self, cell: CellState, aggregate: &Aggregate, tick: u64) -> f64;

    fn name(&self) -> &'static str;
}

/// Leaves every cell as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl CellRule for Inert {
    fn next(&self, cell: CellState, _aggregate: &Aggregate, _tick: u64) -> f64 {
        cell.value
    }

    fn name(&self) -> &'static str {
        "inert"
    }
}

/// Sugar regrowth: `growth` units every `period` ticks up to the cell's capacity.
/// Neighbours play no part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SugarRegrowth {
    pub growth: f64,
    pub period: u64,
}

impl SugarRegrowth {
    pub fn new(growth: f64, period: u64) -> Self {
        SugarRegrowth { growth, period }
    }

    fn grows_on(&self, tick: u64) -> bool {
        self.period > 0 && (tick + 1) % self.period == 0
    }
}

impl From<&AutomatonConfig> for SugarRegrowth {
    fn from(config: &AutomatonConfig) -> Self {
        SugarRegrowth::new(config.growth_per_tick, config.growth_period)
    }
}

impl CellRule for SugarRegrowth {
    fn fold(&self, _aggregate: &mut Aggregate, _neighbor: f64) {}

    fn next(&self, cell: CellState, _aggregate: &Aggregate, tick: u64) -> f64 {
        if !self.grows_on(tick) || cell.value >= cell.capacity {
            return cell.value;
        }
        (cell.value + self.growth).min(cell.capacity)
    }

    fn name(&self) -> &'static str {
        "sugar-regrowth"
    }
}

/// Heat regulation: warm up by one when at least two sensed neighbours run
/// hotter than the summed neighbour balance, otherwise cool by one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatRegulation {
    pub max_temperature: f64,
}

impl HeatRegulation {
    pub fn new(max_temperature: f64) -> Self {
        HeatRegulation { max_temperature }
    }
}

impl CellRule for HeatRegulation {
    fn fold(&self, aggregate: &mut Aggregate, neighbor: f64) {
        aggregate.add(neighbor);
        if neighbor > 0.0 {
            aggregate.record(neighbor);
        }
    }

    fn next(&self, cell: CellState, aggregate: &Aggregate, _tick: u64) -> f64 {
        let hotter = aggregate.count_above(aggregate.sum());
        if hotter >= 2 && cell.value < self.max_temperature {
            cell.value + 1.0
        } else if cell.value > 0.0 {
            cell.value - 1.0
        } else {
            cell.value
        }
    }

    fn name(&self) -> &'static str {
        "heat-regulation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(value: f64, capacity: f64) -> CellState {
        CellState { value, capacity }
    }

    fn aggregate_of(rule: &dyn CellRule, readings: &[f64]) -> Aggregate {
        let mut agg = Aggregate::default();
        for &r in readings {
            rule.fold(&mut agg, r);
        }
        agg
    }

    #[test]
    fn regrowth_caps_at_capacity() {
        let rule = SugarRegrowth::new(1.0, 1);
        let agg = Aggregate::default();
        assert_eq!(rule.next(state(2.0, 4.0), &agg, 0), 3.0);
        assert_eq!(rule.next(state(3.5, 4.0), &agg, 0), 4.0);
        assert_eq!(rule.next(state(4.0, 4.0), &agg, 0), 4.0);
    }

    #[test]
    fn regrowth_respects_period() {
        let rule = SugarRegrowth::new(1.0, 3);
        let agg = Aggregate::default();
        assert_eq!(rule.next(state(0.0, 4.0), &agg, 0), 0.0);
        assert_eq!(rule.next(state(0.0, 4.0), &agg, 1), 0.0);
        assert_eq!(rule.next(state(0.0, 4.0), &agg, 2), 1.0);
        let off = SugarRegrowth::new(1.0, 0);
        assert_eq!(off.next(state(0.0, 4.0), &agg, 2), 0.0);
    }

    #[test]
    fn regrowth_ignores_neighbors() {
        let rule = SugarRegrowth::new(1.0, 1);
        let agg = aggregate_of(&rule, &[4.0, 4.0, 4.0]);
        assert_eq!(agg.sum(), 0.0);
    }

    #[test]
    fn heat_records_only_positive_readings() {
        let rule = HeatRegulation::new(100.0);
        let agg = aggregate_of(&rule, &[0.0, 3.0, 0.0, 5.0]);
        assert_eq!(agg.sum(), 8.0);
        assert_eq!(agg.sensed(), &[3.0, 5.0]);
    }

    #[test]
    fn heat_cools_when_no_neighbor_beats_balance() {
        let rule = HeatRegulation::new(100.0);
        let agg = aggregate_of(&rule, &[10.0, 10.0, 10.0]);
        assert_eq!(rule.next(state(5.0, 100.0), &agg, 0), 4.0);
        assert_eq!(rule.next(state(0.0, 100.0), &agg, 0), 0.0);
    }

    #[test]
    fn heat_warms_with_two_readings_above_balance() {
        let rule = HeatRegulation::new(100.0);
        let mut agg = Aggregate::default();
        // Negative readings lower the balance without being recorded.
        agg.add(-20.0);
        rule.fold(&mut agg, 4.0);
        rule.fold(&mut agg, 6.0);
        assert_eq!(rule.next(state(5.0, 100.0), &agg, 0), 6.0);
        assert_eq!(rule.next(state(100.0, 100.0), &agg, 0), 99.0);
    }
}
