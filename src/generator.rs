//! Synthetic instance generator.
//!
//! Cities are scattered uniformly over a 100 x 100 square. Windows are drawn
//! so that a tour of roughly `20 * n` time units can meet most of them.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::MalformedInstance;
use crate::instance::{FuelModel, ProblemInstance, TimeWindow, DEFAULT_BIG_M, DEPOT};
use crate::rounding::round2;

/// Side of the square cities are drawn in
pub const AREA_SIZE: f64 = 100.0;
/// Travel speed (distance per time unit)
pub const SPEED: f64 = 1.0;
/// Horizon budget per city
pub const HORIZON_PER_CITY: f64 = 20.0;
/// Default linear fuel coefficient
pub const DEFAULT_FUEL_LINEAR: f64 = 0.5;
/// Default quadratic fuel coefficient
pub const DEFAULT_FUEL_QUADRATIC: f64 = 0.01;

/// Toggles for the synthetic generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Generate with `a = b = 0`
    pub disable_fuel: bool,
    /// Replace every window with `(0, 100 * horizon)`
    pub disable_time_windows: bool,
}

/// Builds random instances from an injected random source.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    pub config: GeneratorConfig,
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        SyntheticGenerator { config }
    }

    /// Horizon used for `n` cities
    pub fn horizon(n: usize) -> f64 {
        n as f64 * HORIZON_PER_CITY
    }

    /// Generate an instance with `n` cities drawing from `rng`.
    ///
    /// The same generator state always yields the same instance.
    pub fn generate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<ProblemInstance, MalformedInstance> {
        if n == 0 {
            return Err(MalformedInstance::Empty);
        }

        let points: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..AREA_SIZE), rng.gen_range(0.0..AREA_SIZE)))
            .collect();

        let mut cost = vec![vec![0.0; n]; n];
        let mut time = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = points[i].0 - points[j].0;
                    let dy = points[i].1 - points[j].1;
                    cost[i][j] = round2((dx * dx + dy * dy).sqrt());
                    time[i][j] = round2(cost[i][j] / SPEED);
                }
            }
        }

        let horizon = Self::horizon(n);
        let windows = if self.config.disable_time_windows {
            vec![TimeWindow::new(0.0, horizon * 100.0); n]
        } else {
            (0..n)
                .map(|i| {
                    if i == DEPOT {
                        TimeWindow::new(0.0, horizon)
                    } else {
                        let start = rng.gen_range(0.0..0.7 * horizon);
                        let duration = rng.gen_range(10.0..30.0);
                        TimeWindow::new(round2(start), round2(start + duration))
                    }
                })
                .collect()
        };

        let fuel = if self.config.disable_fuel {
            FuelModel::disabled()
        } else {
            FuelModel::new(DEFAULT_FUEL_LINEAR, DEFAULT_FUEL_QUADRATIC)
        };

        let instance = ProblemInstance::new(n, cost, time, windows, fuel, DEFAULT_BIG_M)?;
        log::debug!("Generated instance with {} cities (horizon {})", n, horizon);
        Ok(instance)
    }

    /// Generate from a ChaCha8 stream seeded with `seed`
    pub fn generate_seeded(&self, n: usize, seed: u64) -> Result<ProblemInstance, MalformedInstance> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.generate(n, &mut rng)
    }

    /// Generate one instance per `(n, seed)` pair in parallel.
    ///
    /// Each instance has its own random stream, so the result matches calling
    /// [`generate_seeded`](Self::generate_seeded) sequentially.
    pub fn generate_batch(&self, specs: &[(usize, u64)]) -> Result<Vec<ProblemInstance>, MalformedInstance> {
        specs
            .par_iter()
            .map(|&(n, seed)| self.generate_seeded(n, seed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_invariants() {
        let gen = SyntheticGenerator::new();
        for seed in 0..5 {
            let inst = gen.generate_seeded(15, seed).unwrap();
            let n = inst.n();
            for i in 0..n {
                assert_eq!(inst.cost(i, i), 0.0);
                assert_eq!(inst.time(i, i), 0.0);
                for j in 0..n {
                    assert!(inst.cost(i, j) >= 0.0);
                    assert!(inst.time(i, j) >= 0.0);
                }
                let w = inst.window(i);
                assert!(w.open <= w.close);
            }
            let depot = inst.window(DEPOT);
            assert!(depot.open <= 0.0 && depot.close >= n as f64 * 20.0);
        }
    }

    #[test]
    fn test_window_ranges() {
        let inst = SyntheticGenerator::new().generate_seeded(30, 7).unwrap();
        let horizon = SyntheticGenerator::horizon(30);
        assert_eq!(inst.window(DEPOT), TimeWindow::new(0.0, horizon));
        for i in 1..30 {
            let w = inst.window(i);
            assert!(w.open >= 0.0 && w.open <= round2(0.7 * horizon));
            assert!(w.width() >= 10.0 - 0.02 && w.width() <= 30.0 + 0.02);
        }
    }

    #[test]
    fn test_time_equals_cost_at_unit_speed() {
        let inst = SyntheticGenerator::new().generate_seeded(10, 3).unwrap();
        assert_eq!(inst.cost_matrix(), inst.time_matrix());
        for row in inst.cost_matrix() {
            for &c in row {
                assert_eq!(c, round2(c));
                assert!(c <= AREA_SIZE * 2f64.sqrt() + 0.01);
            }
        }
    }

    #[test]
    fn test_seed_reproducibility() {
        let gen = SyntheticGenerator::new();
        let a = gen.generate_seeded(12, 42).unwrap();
        let b = gen.generate_seeded(12, 42).unwrap();
        let c = gen.generate_seeded(12, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_toggles() {
        let gen = SyntheticGenerator::with_config(GeneratorConfig {
            disable_fuel: true,
            disable_time_windows: true,
        });
        let inst = gen.generate_seeded(8, 1).unwrap();
        assert!(inst.fuel().is_disabled());
        for w in inst.windows() {
            assert_eq!(*w, TimeWindow::new(0.0, 8.0 * 20.0 * 100.0));
        }

        let inst = SyntheticGenerator::new().generate_seeded(8, 1).unwrap();
        assert_eq!(inst.fuel(), FuelModel::new(0.5, 0.01));
        assert_eq!(inst.big_m(), 10_000.0);
    }

    #[test]
    fn test_zero_cities_rejected() {
        let err = SyntheticGenerator::new().generate_seeded(0, 1).unwrap_err();
        assert_eq!(err, MalformedInstance::Empty);
    }

    #[test]
    fn test_single_city() {
        let inst = SyntheticGenerator::new().generate_seeded(1, 9).unwrap();
        assert_eq!(inst.n(), 1);
        assert_eq!(inst.cost(0, 0), 0.0);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let gen = SyntheticGenerator::new();
        let specs = [(5, 1), (10, 2), (20, 3)];
        let batch = gen.generate_batch(&specs).unwrap();
        assert_eq!(batch.len(), 3);
        for (inst, &(n, seed)) in batch.iter().zip(specs.iter()) {
            assert_eq!(*inst, gen.generate_seeded(n, seed).unwrap());
        }
        assert!(gen.generate_batch(&[(3, 1), (0, 2)]).is_err());
    }
}
