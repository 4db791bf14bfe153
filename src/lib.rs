//! TSP-TW-F Benchmark Library
//!
//! Instance tooling for the Traveling Salesman Problem with time windows and a
//! nonlinear (linear + quadratic) fuel cost.
//!
//! # Features
//!
//! - Seedable synthetic instance generation
//! - TSPLIB import (`EUC_2D`, `GEO`) into pure routing instances
//! - JSON exchange documents for external solvers
//! - Independent validation of solver output with a per-edge trace
//!
//! # Example
//!
//! ```no_run
//! use tsptw_bench::generator::SyntheticGenerator;
//! use tsptw_bench::solution::SolutionDocument;
//! use tsptw_bench::validator::SolutionValidator;
//!
//! // Generate an instance and hand it to a solver
//! let instance = SyntheticGenerator::new().generate_seeded(20, 42).unwrap();
//! instance.save("tsp_data.json").unwrap();
//!
//! // Certify what the solver returned
//! let solution = SolutionDocument::from_file("solution.json").unwrap();
//! let report = SolutionValidator::new().validate(&instance, &solution);
//! eprintln!("{}", report);
//! ```

pub mod error;
pub mod rounding;
pub mod instance;
pub mod generator;
pub mod tsplib;
pub mod solution;
pub mod validator;

pub use instance::ProblemInstance;
pub use solution::{Route, SolutionDocument};
pub use validator::{SolutionValidator, ValidationReport, Verdict};
