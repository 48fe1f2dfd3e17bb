use std::collections::VecDeque;

use crate::clock::TickReport;

/// Entries kept in each rolling history.
pub const HISTORY_LEN: usize = 1000;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub total_births: usize,
    pub total_deaths: usize,
    pub max_population: usize,
    pub resource_consumed: f64,
    pub reserve_history: VecDeque<f64>,
    pub population_history: VecDeque<usize>,
}

impl SimulationStats {
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.total_births += report.births;
        self.total_deaths += report.deaths;
        self.max_population = self.max_population.max(report.alive);
        self.resource_consumed += report.consumed;

        let mean_reserve = if report.alive == 0 {
            0.0
        } else {
            report.total_reserve / report.alive as f64
        };
        push_bounded(&mut self.reserve_history, mean_reserve);
        push_bounded(&mut self.population_history, report.alive);
    }

    pub fn current_population(&self) -> usize {
        self.population_history.back().copied().unwrap_or(0)
    }

    pub fn mean_reserve(&self) -> f64 {
        self.reserve_history.back().copied().unwrap_or(0.0)
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, value: T) {
    if history.len() == HISTORY_LEN {
        history.pop_front();
    }
    history.push_back(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(alive: usize, births: usize, deaths: usize) -> TickReport {
        TickReport {
            births,
            deaths,
            alive,
            consumed: 2.0,
            total_reserve: alive as f64 * 10.0,
            ..TickReport::default()
        }
    }

    #[test]
    fn accumulates_totals() {
        let mut stats = SimulationStats::default();
        stats.record(&report(5, 1, 0));
        stats.record(&report(3, 0, 3));
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.total_births, 1);
        assert_eq!(stats.total_deaths, 3);
        assert_eq!(stats.max_population, 5);
        assert_eq!(stats.resource_consumed, 4.0);
        assert_eq!(stats.current_population(), 3);
        assert_eq!(stats.mean_reserve(), 10.0);
    }

    #[test]
    fn histories_are_bounded() {
        let mut stats = SimulationStats::default();
        for i in 0..HISTORY_LEN + 10 {
            stats.record(&report(i, 0, 0));
        }
        assert_eq!(stats.population_history.len(), HISTORY_LEN);
        assert_eq!(stats.population_history.front(), Some(&10));
    }

    #[test]
    fn empty_population_has_zero_mean() {
        let mut stats = SimulationStats::default();
        stats.record(&report(0, 0, 0));
        assert_eq!(stats.mean_reserve(), 0.0);
    }
}
