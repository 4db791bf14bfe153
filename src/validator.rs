//! Independent re-verification of solver output.
//!
//! Validation runs in three phases: structural checks on the raw route, a simulation
//! of the tour against the instance (waiting at early arrivals, linear lateness penalty),
//! and a comparison of the simulated cost with the claimed one.

use std::io::Write;

use serde::Serialize;

use crate::error::ValidationError;
use crate::instance::ProblemInstance;
use crate::solution::{Route, SolutionDocument};

/// Default absolute tolerance between claimed and simulated cost
pub const DEFAULT_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatorConfig {
    /// A solution passes when `|computed - claimed| < tolerance` (strict)
    pub tolerance: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// One traversed edge of a simulated tour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceEntry {
    pub from: usize,
    pub to: usize,
    pub dist: f64,
    pub fuel: f64,
    /// Time service can start at `to`, after any wait
    pub arrival: f64,
    pub wait: f64,
    pub window_open: f64,
    pub window_close: f64,
    pub penalty: f64,
}

/// Result of driving a route through an instance
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub trace: Vec<TraceEntry>,
    /// Distance + fuel + lateness penalties
    pub total_cost: f64,
    pub total_distance: f64,
    pub total_fuel: f64,
    pub total_penalty: f64,
    /// Clock value when the tour closes at the depot
    pub finish_time: f64,
}

/// Simulate `route` on `instance`.
///
/// Early arrivals wait for the window to open at no charge. Late arrivals pay
/// `arrival - close` and the clock keeps the late time.
pub fn simulate(instance: &ProblemInstance, route: &Route) -> Simulation {
    let fuel_model = instance.fuel();
    let mut t = 0.0;
    let mut total_cost = 0.0;
    let mut total_distance = 0.0;
    let mut total_fuel = 0.0;
    let mut total_penalty = 0.0;
    let mut trace = Vec::with_capacity(route.len().saturating_sub(1));

    for (u, v) in route.edges() {
        let dist = instance.cost(u, v);
        let fuel = fuel_model.cost(dist);
        let window = instance.window(v);

        let mut arrival = t + instance.time(u, v);
        let mut wait = 0.0;
        if arrival < window.open {
            wait = window.open - arrival;
            arrival = window.open;
        }
        let penalty = if arrival > window.close {
            arrival - window.close
        } else {
            0.0
        };

        total_cost += dist + fuel + penalty;
        total_distance += dist;
        total_fuel += fuel;
        total_penalty += penalty;
        t = arrival;

        log::debug!(
            "{} -> {}: dist {:.2}, fuel {:.2}, arrival {:.2}, window [{:.2}, {:.2}], penalty {:.2}",
            u, v, dist, fuel, arrival, window.open, window.close, penalty
        );
        trace.push(TraceEntry {
            from: u,
            to: v,
            dist,
            fuel,
            arrival,
            wait,
            window_open: window.open,
            window_close: window.close,
            penalty,
        });
    }

    Simulation {
        trace,
        total_cost,
        total_distance,
        total_fuel,
        total_penalty,
        finish_time: t,
    }
}

/// Outcome of validating one solution document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub claimed_cost: f64,
    /// Present whenever the route passed the structural checks
    pub simulation: Option<Simulation>,
    pub outcome: Result<(), ValidationError>,
}

impl ValidationReport {
    pub fn verdict(&self) -> Verdict {
        if self.outcome.is_ok() {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict() == Verdict::Pass
    }

    pub fn computed_cost(&self) -> Option<f64> {
        self.simulation.as_ref().map(|s| s.total_cost)
    }

    pub fn trace(&self) -> &[TraceEntry] {
        match &self.simulation {
            Some(sim) => &sim.trace,
            None => &[],
        }
    }

    /// Write the edge trace as CSV
    pub fn write_trace_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for entry in self.trace() {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Err(ValidationError::StructuralRouteError(violations)) = &self.outcome {
            writeln!(f, "[ROUTE STRUCTURE ERROR]")?;
            for v in violations {
                writeln!(f, "- {}", v)?;
            }
            return write!(f, "=== {} ===", self.verdict());
        }

        if let Some(sim) = &self.simulation {
            writeln!(f, "{:<15} | {:<8} | {:<8} | {:<10} | {:<17} | {:<8}",
                "Edge", "Dist", "Fuel", "Arrival", "Window", "Penalty")?;
            writeln!(f, "{}", "-".repeat(80))?;
            for e in &sim.trace {
                let edge = format!("{:>3} -> {:<3}", e.from, e.to);
                let window = format!("[{:.1}, {:.1}]", e.window_open, e.window_close);
                writeln!(f, "{:<15} | {:<8.2} | {:<8.2} | {:<10.2} | {:<17} | {:<8.2}",
                    edge, e.dist, e.fuel, e.arrival, window, e.penalty)?;
            }
            writeln!(f, "{}", "-".repeat(80))?;
            writeln!(f, "Claimed cost:  {:.4}", self.claimed_cost)?;
            writeln!(f, "Computed cost: {:.4}", sim.total_cost)?;
            writeln!(f, "Delta:         {:.6}", (sim.total_cost - self.claimed_cost).abs())?;
        }

        match &self.outcome {
            Ok(()) => write!(f, "=== {} ===", self.verdict()),
            Err(e) => write!(f, "=== {} ({}) ===", self.verdict(), e),
        }
    }
}

/// Certifies routes returned by an external solver.
#[derive(Debug, Clone, Default)]
pub struct SolutionValidator {
    pub config: ValidatorConfig,
}

impl SolutionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        SolutionValidator { config }
    }

    /// Validate `solution` against `instance`.
    ///
    /// Never repairs the route: structural violations skip the simulation, and a
    /// simulated cost outside the tolerance is a [`ValidationError::CostMismatch`].
    pub fn validate(&self, instance: &ProblemInstance, solution: &SolutionDocument) -> ValidationReport {
        let claimed = solution.total_cost;

        let route = match Route::check(instance, &solution.route) {
            Ok(route) => route,
            Err(violations) => {
                log::warn!("Route has {} structural violation(s)", violations.len());
                return ValidationReport {
                    claimed_cost: claimed,
                    simulation: None,
                    outcome: Err(ValidationError::StructuralRouteError(violations)),
                };
            }
        };

        let simulation = simulate(instance, &route);
        let computed = simulation.total_cost;
        let outcome = self.compare(computed, claimed);
        match &outcome {
            Ok(()) => log::info!("Route certified: cost {:.4}", computed),
            Err(e) => log::warn!("{}", e),
        }

        ValidationReport {
            claimed_cost: claimed,
            simulation: Some(simulation),
            outcome,
        }
    }

    /// Phase 3: strict comparison against the tolerance.
    pub fn compare(&self, computed: f64, claimed: f64) -> Result<(), ValidationError> {
        let delta = (computed - claimed).abs();
        if delta < self.config.tolerance {
            Ok(())
        } else {
            Err(ValidationError::CostMismatch {
                computed,
                claimed,
                delta,
            })
        }
    }
}
