//! Module for representing TSP-TW-F instances.
//!
//! A [`ProblemInstance`] bundles the cost and travel-time matrices, one time window per
//! city and the fuel model. It is validated once at construction and immutable afterwards.
//! The JSON exchange document handed to external solvers is produced and consumed here.

use std::fs;
use std::path::Path;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{DocumentError, MalformedInstance};

/// Index of the depot, the mandatory start and end of every route.
pub const DEPOT: usize = 0;

/// Big-M constant written into every instance; only the external solver reads it.
pub const DEFAULT_BIG_M: f64 = 10_000.0;

/// Interval `[open, close]` during which a city should be visited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub open: f64,
    pub close: f64,
}

impl TimeWindow {
    pub fn new(open: f64, close: f64) -> Self {
        TimeWindow { open, close }
    }

    /// Width of the window
    pub fn width(&self) -> f64 {
        self.close - self.open
    }
}

/// Per-edge fuel model `a * d + b * d^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelModel {
    /// Linear coefficient
    pub a: f64,
    /// Quadratic coefficient
    pub b: f64,
}

impl FuelModel {
    pub fn new(a: f64, b: f64) -> Self {
        FuelModel { a, b }
    }

    /// No fuel term at all
    pub fn disabled() -> Self {
        FuelModel { a: 0.0, b: 0.0 }
    }

    /// Fuel burnt on an edge of length `dist`
    #[inline]
    pub fn cost(&self, dist: f64) -> f64 {
        self.a * dist + self.b * dist * dist
    }

    pub fn is_disabled(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }
}

/// Represents a complete TSP-TW-F instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstanceDocument", into = "InstanceDocument")]
pub struct ProblemInstance {
    n: usize,
    cost: Vec<Vec<f64>>,
    time: Vec<Vec<f64>>,
    windows: Vec<TimeWindow>,
    fuel: FuelModel,
    big_m: f64,
}

/// Wire shape of an instance, using the key names external solvers expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDocument {
    pub n: usize,
    pub c_matrix: Vec<Vec<f64>>,
    pub t_matrix: Vec<Vec<f64>>,
    pub t_windows: Vec<[f64; 2]>,
    pub a: f64,
    pub b: f64,
    #[serde(rename = "M")]
    pub big_m: f64,
}

impl TryFrom<InstanceDocument> for ProblemInstance {
    type Error = MalformedInstance;

    fn try_from(doc: InstanceDocument) -> Result<Self, Self::Error> {
        let windows = doc
            .t_windows
            .iter()
            .map(|&[open, close]| TimeWindow::new(open, close))
            .collect();
        ProblemInstance::new(
            doc.n,
            doc.c_matrix,
            doc.t_matrix,
            windows,
            FuelModel::new(doc.a, doc.b),
            doc.big_m,
        )
    }
}

impl From<ProblemInstance> for InstanceDocument {
    fn from(instance: ProblemInstance) -> Self {
        InstanceDocument {
            n: instance.n,
            t_windows: instance.windows.iter().map(|w| [w.open, w.close]).collect(),
            c_matrix: instance.cost,
            t_matrix: instance.time,
            a: instance.fuel.a,
            b: instance.fuel.b,
            big_m: instance.big_m,
        }
    }
}

impl ProblemInstance {
    /// Build an instance, checking every invariant.
    ///
    /// Fails with [`MalformedInstance`] on inconsistent dimensions, negative or non-finite
    /// entries, non-zero diagonals, inverted windows, negative fuel coefficients or a
    /// non-positive big-M. An instance needs at least the depot, so `n = 0` is rejected.
    pub fn new(
        n: usize,
        cost: Vec<Vec<f64>>,
        time: Vec<Vec<f64>>,
        windows: Vec<TimeWindow>,
        fuel: FuelModel,
        big_m: f64,
    ) -> Result<Self, MalformedInstance> {
        if n == 0 {
            return Err(MalformedInstance::Empty);
        }
        check_matrix("cost", &cost, n)?;
        check_matrix("time", &time, n)?;

        if windows.len() != n {
            return Err(MalformedInstance::WindowCount {
                expected: n,
                found: windows.len(),
            });
        }
        for (city, w) in windows.iter().enumerate() {
            if !w.open.is_finite() || !w.close.is_finite() {
                return Err(MalformedInstance::NonFinite {
                    field: format!("t_windows[{}]", city),
                });
            }
            if w.open > w.close {
                return Err(MalformedInstance::InvertedWindow {
                    city,
                    open: w.open,
                    close: w.close,
                });
            }
        }

        for (name, value) in [("a", fuel.a), ("b", fuel.b)] {
            if !value.is_finite() {
                return Err(MalformedInstance::NonFinite { field: name.to_string() });
            }
            if value < 0.0 {
                return Err(MalformedInstance::NegativeFuelCoefficient { name, value });
            }
        }

        if !big_m.is_finite() {
            return Err(MalformedInstance::NonFinite { field: "M".to_string() });
        }
        if big_m <= 0.0 {
            return Err(MalformedInstance::NonPositiveBigM(big_m));
        }

        Ok(ProblemInstance {
            n,
            cost,
            time,
            windows,
            fuel,
            big_m,
        })
    }

    /// Number of cities, depot included
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.cost[i][j]
    }

    #[inline]
    pub fn time(&self, i: usize, j: usize) -> f64 {
        self.time[i][j]
    }

    #[inline]
    pub fn window(&self, i: usize) -> TimeWindow {
        self.windows[i]
    }

    pub fn cost_matrix(&self) -> &[Vec<f64>] {
        &self.cost
    }

    pub fn time_matrix(&self) -> &[Vec<f64>] {
        &self.time
    }

    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    pub fn fuel(&self) -> FuelModel {
        self.fuel
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    /// Fuel burnt on an edge of length `dist`
    #[inline]
    pub fn fuel_cost(&self, dist: f64) -> f64 {
        self.fuel.cost(dist)
    }

    /// Distance plus fuel for edge `u -> v`, waiting and lateness excluded
    #[inline]
    pub fn edge_cost(&self, u: usize, v: usize) -> f64 {
        let dist = self.cost(u, v);
        dist + self.fuel_cost(dist)
    }

    /// Parse an instance from its JSON exchange document
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        let doc: InstanceDocument = serde_json::from_str(json)?;
        Ok(ProblemInstance::try_from(doc)?)
    }

    /// Load an instance from a JSON exchange document on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON exchange document to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut costs = Vec::with_capacity(self.n * self.n.saturating_sub(1));
        for i in 0..self.n {
            for j in 0..self.n {
                if i != j {
                    costs.push(self.cost[i][j]);
                }
            }
        }

        let (avg_cost, std_cost, min_cost, max_cost) = if costs.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            // `Statistics` also provides min/max, so name the iterator ones explicitly
            let min = Iterator::min(costs.iter().copied().map(OrderedFloat)).map_or(0.0, |c| c.0);
            let max = Iterator::max(costs.iter().copied().map(OrderedFloat)).map_or(0.0, |c| c.0);
            let std = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };
            (costs.iter().mean(), std, min, max)
        };

        let customer_windows: Vec<f64> = self.windows.iter().skip(1).map(|w| w.width()).collect();
        let avg_window_width = if customer_windows.is_empty() {
            0.0
        } else {
            customer_windows.iter().mean()
        };
        let tightest_window = self
            .windows
            .iter()
            .enumerate()
            .skip(1)
            .min_by_key(|(_, w)| OrderedFloat(w.width()))
            .map(|(city, w)| (city, w.width()));

        InstanceStatistics {
            n: self.n,
            avg_cost,
            std_cost,
            min_cost,
            max_cost,
            horizon: self.windows[DEPOT].close,
            avg_window_width,
            tightest_window,
            fuel: self.fuel,
            big_m: self.big_m,
        }
    }
}

fn check_matrix(name: &'static str, matrix: &[Vec<f64>], n: usize) -> Result<(), MalformedInstance> {
    if matrix.len() != n {
        return Err(MalformedInstance::MatrixRows {
            matrix: name,
            expected: n,
            found: matrix.len(),
        });
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(MalformedInstance::MatrixColumns {
                matrix: name,
                row: i,
                expected: n,
                found: row.len(),
            });
        }
        for (j, &value) in row.iter().enumerate() {
            if !value.is_finite() {
                return Err(MalformedInstance::NonFinite {
                    field: format!("{}[{}][{}]", name, i, j),
                });
            }
            if value < 0.0 {
                return Err(MalformedInstance::NegativeEntry {
                    matrix: name,
                    i,
                    j,
                    value,
                });
            }
            if i == j && value != 0.0 {
                return Err(MalformedInstance::NonZeroDiagonal { matrix: name, i, value });
            }
        }
    }
    Ok(())
}

/// Statistics about a TSP-TW-F instance
#[derive(Debug, Clone)]
pub struct InstanceStatistics {
    pub n: usize,
    pub avg_cost: f64,
    pub std_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    /// Closing time of the depot window
    pub horizon: f64,
    /// Mean window width over non-depot cities
    pub avg_window_width: f64,
    /// Narrowest non-depot window as `(city, width)`
    pub tightest_window: Option<(usize, f64)>,
    pub fuel: FuelModel,
    pub big_m: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {} cities (1 depot + {} customers)", self.n, self.n - 1)?;
        writeln!(f, "  Edge cost: avg {:.2}, std {:.2}, min {:.2}, max {:.2}",
            self.avg_cost, self.std_cost, self.min_cost, self.max_cost)?;
        writeln!(f, "  Horizon (depot close): {:.2}", self.horizon)?;
        writeln!(f, "  Avg window width: {:.2}", self.avg_window_width)?;
        if let Some((city, width)) = self.tightest_window {
            writeln!(f, "  Tightest window: city {} ({:.2})", city, width)?;
        }
        writeln!(f, "  Fuel: a = {}, b = {}", self.fuel.a, self.fuel.b)?;
        write!(f, "  M: {}", self.big_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(n: usize, value: f64) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| (0..n).map(|j| if i == j { 0.0 } else { value }).collect())
            .collect()
    }

    fn open_windows(n: usize) -> Vec<TimeWindow> {
        vec![TimeWindow::new(0.0, 1000.0); n]
    }

    #[test]
    fn test_valid_instance() {
        let inst = ProblemInstance::new(3, square(3, 2.0), square(3, 1.0), open_windows(3),
            FuelModel::new(0.5, 0.01), DEFAULT_BIG_M).unwrap();
        assert_eq!(inst.n(), 3);
        assert_eq!(inst.cost(0, 1), 2.0);
        assert_eq!(inst.time(1, 1), 0.0);
    }

    #[test]
    fn test_empty_instance_rejected() {
        let err = ProblemInstance::new(0, vec![], vec![], vec![], FuelModel::disabled(), 1.0)
            .unwrap_err();
        assert_eq!(err, MalformedInstance::Empty);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = ProblemInstance::new(3, square(2, 1.0), square(3, 1.0), open_windows(3),
            FuelModel::disabled(), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::MatrixRows { matrix: "cost", expected: 3, found: 2 }));

        let mut time = square(3, 1.0);
        time[1].pop();
        let err = ProblemInstance::new(3, square(3, 1.0), time, open_windows(3),
            FuelModel::disabled(), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::MatrixColumns { matrix: "time", row: 1, .. }));

        let err = ProblemInstance::new(3, square(3, 1.0), square(3, 1.0), open_windows(2),
            FuelModel::disabled(), 1.0).unwrap_err();
        assert_eq!(err, MalformedInstance::WindowCount { expected: 3, found: 2 });
    }

    #[test]
    fn test_negative_and_non_finite_entries() {
        let mut cost = square(2, 1.0);
        cost[0][1] = -1.0;
        let err = ProblemInstance::new(2, cost, square(2, 1.0), open_windows(2),
            FuelModel::disabled(), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::NegativeEntry { i: 0, j: 1, .. }));

        let mut time = square(2, 1.0);
        time[1][0] = f64::NAN;
        let err = ProblemInstance::new(2, square(2, 1.0), time, open_windows(2),
            FuelModel::disabled(), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::NonFinite { .. }));

        let mut cost = square(2, 1.0);
        cost[1][1] = 3.0;
        let err = ProblemInstance::new(2, cost, square(2, 1.0), open_windows(2),
            FuelModel::disabled(), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::NonZeroDiagonal { i: 1, .. }));
    }

    #[test]
    fn test_inverted_window_and_parameters() {
        let mut windows = open_windows(2);
        windows[1] = TimeWindow::new(20.0, 15.0);
        let err = ProblemInstance::new(2, square(2, 1.0), square(2, 1.0), windows,
            FuelModel::disabled(), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::InvertedWindow { city: 1, .. }));

        let err = ProblemInstance::new(2, square(2, 1.0), square(2, 1.0), open_windows(2),
            FuelModel::new(-0.5, 0.0), 1.0).unwrap_err();
        assert!(matches!(err, MalformedInstance::NegativeFuelCoefficient { name: "a", .. }));

        let err = ProblemInstance::new(2, square(2, 1.0), square(2, 1.0), open_windows(2),
            FuelModel::disabled(), 0.0).unwrap_err();
        assert_eq!(err, MalformedInstance::NonPositiveBigM(0.0));
    }

    #[test]
    fn test_fuel_cost() {
        let fuel = FuelModel::new(0.5, 0.01);
        assert!((fuel.cost(10.0) - 6.0).abs() < 1e-12);
        assert!(FuelModel::disabled().is_disabled());
    }

    #[test]
    fn test_json_document_keys() {
        let inst = ProblemInstance::new(2, square(2, 4.0), square(2, 4.0), open_windows(2),
            FuelModel::new(0.5, 0.01), DEFAULT_BIG_M).unwrap();
        let json = inst.to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["n", "c_matrix", "t_matrix", "t_windows", "a", "b", "M"] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["t_windows"][1], serde_json::json!([0.0, 1000.0]));

        let back = ProblemInstance::from_json_str(&json).unwrap();
        assert_eq!(back, inst);
    }

    #[test]
    fn test_malformed_document_rejected_at_boundary() {
        let json = r#"{"n": 2, "c_matrix": [[0, 1], [1, 0]], "t_matrix": [[0, 1], [1, 0]],
            "t_windows": [[0, 10], [30, 20]], "a": 0, "b": 0, "M": 10000}"#;
        match ProblemInstance::from_json_str(json) {
            Err(DocumentError::Malformed(MalformedInstance::InvertedWindow { city, .. })) => {
                assert_eq!(city, 1)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(ProblemInstance::from_json_str("{"), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_statistics() {
        let mut windows = open_windows(3);
        windows[2] = TimeWindow::new(5.0, 15.0);
        let inst = ProblemInstance::new(3, square(3, 2.0), square(3, 2.0), windows,
            FuelModel::disabled(), DEFAULT_BIG_M).unwrap();
        let stats = inst.statistics();
        assert_eq!(stats.n, 3);
        assert!((stats.avg_cost - 2.0).abs() < 1e-12);
        assert!(stats.std_cost.abs() < 1e-12);
        assert_eq!(stats.max_cost, 2.0);
        assert_eq!(stats.horizon, 1000.0);
        assert_eq!(stats.tightest_window, Some((2, 10.0)));
        assert!(stats.to_string().contains("3 cities"));
    }
}
