//! Candidate solutions.
//!
//! [`SolutionDocument`] is the exchange document an external solver returns. [`Route`] is a
//! tour that has passed the structural checks against a particular instance and can be
//! simulated without further bounds checks.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, RouteViolation};
use crate::instance::{ProblemInstance, DEPOT};

/// Solver output: a route and the cost the solver claims for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionDocument {
    /// City indices, depot first and last. Signed so that negative
    /// indices are reported as route violations instead of parse errors.
    pub route: Vec<i64>,
    /// Cost asserted by the producer of the route
    pub total_cost: f64,
    /// Any other solver output (status, timing, ...), kept untouched
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl SolutionDocument {
    pub fn new(route: Vec<i64>, total_cost: f64) -> Self {
        SolutionDocument {
            route,
            total_cost,
            metadata: BTreeMap::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a solution document from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A structurally valid closed tour over all cities of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    cities: Vec<usize>,
}

impl Route {
    /// The tour `0, 1, ..., n-1, 0`
    pub fn identity(n: usize) -> Self {
        let mut cities: Vec<usize> = (0..n).collect();
        cities.push(DEPOT);
        Route { cities }
    }

    /// Check `raw` against `instance`, collecting every violation.
    ///
    /// The route must have `n + 1` entries, start and end at the depot, and its first `n`
    /// entries must be a permutation of `0..n`. Entries outside `[0, n)` are violations
    /// of their own and are left out of the permutation check.
    pub fn check(instance: &ProblemInstance, raw: &[i64]) -> Result<Self, Vec<RouteViolation>> {
        let n = instance.n();
        let mut violations = Vec::new();

        if raw.len() != n + 1 {
            violations.push(RouteViolation::WrongLength {
                expected: n + 1,
                found: raw.len(),
            });
        }

        let first = raw.first().copied();
        if first != Some(DEPOT as i64) {
            violations.push(RouteViolation::BadStart { found: first });
        }
        let last = raw.get(n).copied();
        if last != Some(DEPOT as i64) {
            violations.push(RouteViolation::BadEnd { found: last });
        }

        for (position, &city) in raw.iter().enumerate() {
            if city < 0 || city as u64 >= n as u64 {
                violations.push(RouteViolation::IndexOutOfRange { position, city, n });
            }
        }

        let mut positions: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (position, &city) in raw.iter().take(n).enumerate() {
            if city >= 0 && (city as u64) < n as u64 {
                positions[city as usize].push(position);
            }
        }
        for (city, seen) in positions.into_iter().enumerate() {
            match seen.len() {
                0 => violations.push(RouteViolation::MissingCity { city }),
                1 => {}
                _ => violations.push(RouteViolation::DuplicateCity { city, positions: seen }),
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(Route {
            cities: raw.iter().map(|&c| c as usize).collect(),
        })
    }

    pub fn cities(&self) -> &[usize] {
        &self.cities
    }

    /// Consecutive `(u, v)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cities.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.cities.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{FuelModel, TimeWindow};

    fn instance(n: usize) -> ProblemInstance {
        let m: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 0.0 } else { 1.0 }).collect())
            .collect();
        ProblemInstance::new(n, m.clone(), m, vec![TimeWindow::new(0.0, 100.0); n],
            FuelModel::disabled(), 10_000.0).unwrap()
    }

    #[test]
    fn test_identity_route() {
        let route = Route::identity(4);
        assert_eq!(route.cities(), &[0, 1, 2, 3, 0]);
        assert_eq!(route.edges().count(), 4);
        assert_eq!(route.to_string(), "0 -> 1 -> 2 -> 3 -> 0");
        assert_eq!(Route::check(&instance(4), &[0, 1, 2, 3, 0]).unwrap(), route);
    }

    #[test]
    fn test_wrong_length_and_endpoints() {
        let violations = Route::check(&instance(3), &[1, 2, 0, 1]).unwrap_err();
        assert!(violations.contains(&RouteViolation::BadStart { found: Some(1) }));
        assert!(violations.contains(&RouteViolation::BadEnd { found: Some(1) }));
        // the closing 1 is outside the permutation prefix
        assert_eq!(violations.len(), 2);

        let violations = Route::check(&instance(3), &[0, 1, 2]).unwrap_err();
        assert!(violations.contains(&RouteViolation::WrongLength { expected: 4, found: 3 }));
        assert!(violations.contains(&RouteViolation::BadEnd { found: None }));
    }

    #[test]
    fn test_all_violations_collected() {
        let violations = Route::check(&instance(4), &[0, 1, 1, 0]).unwrap_err();
        assert!(violations.contains(&RouteViolation::WrongLength { expected: 5, found: 4 }));
        assert!(violations.contains(&RouteViolation::BadEnd { found: None }));
        assert!(violations.contains(&RouteViolation::DuplicateCity { city: 1, positions: vec![1, 2] }));
        assert!(violations.contains(&RouteViolation::DuplicateCity { city: 0, positions: vec![0, 3] }));
        assert!(violations.contains(&RouteViolation::MissingCity { city: 2 }));
        assert!(violations.contains(&RouteViolation::MissingCity { city: 3 }));
    }

    #[test]
    fn test_out_of_range_indices() {
        let violations = Route::check(&instance(3), &[0, 7, -1, 0]).unwrap_err();
        assert!(violations.contains(&RouteViolation::IndexOutOfRange { position: 1, city: 7, n: 3 }));
        assert!(violations.contains(&RouteViolation::IndexOutOfRange { position: 2, city: -1, n: 3 }));
        assert!(violations.contains(&RouteViolation::MissingCity { city: 1 }));
        assert!(violations.contains(&RouteViolation::MissingCity { city: 2 }));
    }

    #[test]
    fn test_empty_route() {
        let violations = Route::check(&instance(2), &[]).unwrap_err();
        assert!(violations.contains(&RouteViolation::BadStart { found: None }));
        assert!(violations.contains(&RouteViolation::BadEnd { found: None }));
    }

    #[test]
    fn test_document_metadata_passthrough() {
        let json = r#"{"route": [0, 2, 1, 0], "total_cost": 12.5, "status": "OPTIMAL", "time": 0.42}"#;
        let doc = SolutionDocument::from_json_str(json).unwrap();
        assert_eq!(doc.route, vec![0, 2, 1, 0]);
        assert_eq!(doc.total_cost, 12.5);
        assert_eq!(doc.metadata.get("status"), Some(&Value::from("OPTIMAL")));

        let back: Value = serde_json::from_str(&doc.to_json_string().unwrap()).unwrap();
        assert_eq!(back["time"], Value::from(0.42));
        assert_eq!(back["total_cost"], Value::from(12.5));
    }

    #[test]
    fn test_document_missing_fields() {
        assert!(matches!(
            SolutionDocument::from_json_str(r#"{"route": [0, 0]}"#),
            Err(DocumentError::Json(_))
        ));
    }
}
