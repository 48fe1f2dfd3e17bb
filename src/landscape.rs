use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::grid::{CellState, Coord, Grid};

/// Initial resource landscape.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LandscapeMode {
    /// Every cell at full capacity.
    Flat,
    /// Uniform integer capacity in `0..=max`.
    Random,
    /// A handful of random smooth hills.
    #[default]
    Procedural,
    /// Concentric rings around two peaks.
    TwoPeak,
    /// All zero, capacity at max. Used for temperature fields.
    Cold,
}

const HILL_COUNT: usize = 6;

/// Builds the construction-time grid for `config`. Cells start full, cold grids at zero.
pub fn generate(config: &SimConfig, rng: &mut impl Rng) -> SimResult<Grid> {
    let max = config.automaton.max_value;
    let (width, height) = (config.width, config.height);

    let capacities: Vec<f64> = match config.landscape {
        LandscapeMode::Flat | LandscapeMode::Cold => vec![max; width * height],
        LandscapeMode::Random => (0..width * height)
            .map(|_| rng.random_range(0..=max.floor() as u64) as f64)
            .collect(),
        LandscapeMode::Procedural => procedural(width, height, max, rng),
        LandscapeMode::TwoPeak => two_peak(width, height, max),
    };

    let cold = config.landscape == LandscapeMode::Cold;
    Grid::from_fn(width, height, config.boundary, max, |coord| {
        let capacity = capacities[coord.y * width + coord.x];
        CellState {
            value: if cold { 0.0 } else { capacity },
            capacity,
        }
    })
}

fn procedural(width: usize, height: usize, max: f64, rng: &mut impl Rng) -> Vec<f64> {
    let span = width.max(height) as f64;
    let hills: Vec<(f64, f64, f64)> = (0..HILL_COUNT)
        .map(|_| {
            let cx = rng.random_range(0.0..width as f64);
            let cy = rng.random_range(0.0..height as f64);
            let radius = rng.random_range(0.1..0.35) * span;
            (cx, cy, radius.max(1.0))
        })
        .collect();

    let raw: Vec<f64> = (0..width * height)
        .map(|i| {
            let (x, y) = ((i % width) as f64, (i / width) as f64);
            hills
                .iter()
                .map(|&(cx, cy, r)| {
                    let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                    (-d2 / (2.0 * r * r)).exp()
                })
                .sum()
        })
        .collect();

    let peak = raw.iter().copied().fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        return vec![0.0; width * height];
    }
    raw.into_iter().map(|v| (v / peak * max).round()).collect()
}

fn two_peak(width: usize, height: usize, max: f64) -> Vec<f64> {
    let peaks = [
        (width as f64 * 0.3, height as f64 * 0.3),
        (width as f64 * 0.7, height as f64 * 0.7),
    ];
    // One capacity level lost per ring.
    let ring = (width.min(height) as f64 * 0.4 / (max + 1.0)).max(1.0);

    (0..width * height)
        .map(|i| {
            let coord = Coord::new(i % width, i / width);
            let nearest = peaks
                .iter()
                .map(|&(px, py)| (coord.x as f64 - px).hypot(coord.y as f64 - py))
                .fold(f64::INFINITY, f64::min);
            (max - (nearest / ring).floor()).max(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(mode: LandscapeMode) -> SimConfig {
        SimConfig {
            width: 30,
            height: 20,
            landscape: mode,
            ..SimConfig::sugarscape()
        }
    }

    #[test]
    fn every_mode_stays_within_bounds() {
        for mode in [
            LandscapeMode::Flat,
            LandscapeMode::Random,
            LandscapeMode::Procedural,
            LandscapeMode::TwoPeak,
            LandscapeMode::Cold,
        ] {
            let mut rng = StdRng::seed_from_u64(7);
            let grid = generate(&config(mode), &mut rng).unwrap();
            assert_eq!(grid.len(), 600);
            for cell in grid.cells() {
                assert!((0.0..=4.0).contains(&cell.value()), "{mode:?}");
                assert!(cell.value() <= cell.capacity());
            }
        }
    }

    #[test]
    fn cold_grid_starts_at_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = generate(&config(LandscapeMode::Cold), &mut rng).unwrap();
        assert_eq!(grid.total_value(), 0.0);
    }

    #[test]
    fn two_peak_is_highest_at_peaks() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = generate(&config(LandscapeMode::TwoPeak), &mut rng).unwrap();
        assert_eq!(grid.value(Coord::new(9, 6)), 4.0);
        assert_eq!(grid.value(Coord::new(21, 14)), 4.0);
        assert!(grid.value(Coord::new(29, 0)) < 4.0);
    }

    #[test]
    fn same_seed_same_landscape() {
        let procedural = config(LandscapeMode::Procedural);
        let a = generate(&procedural, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = generate(&procedural, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }
}
