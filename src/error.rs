//! Error taxonomy shared by instance construction, TSPLIB import and route validation.

use thiserror::Error;

/// An instance that violates the data-model invariants. Raised at construction time;
/// no partial instance is ever produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedInstance {
    #[error("instance has no cities (the depot, city 0, must exist)")]
    Empty,
    #[error("{matrix} matrix has {found} rows, expected {expected}")]
    MatrixRows {
        matrix: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{matrix} matrix row {row} has {found} columns, expected {expected}")]
    MatrixColumns {
        matrix: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{found} time windows given for {expected} cities")]
    WindowCount { expected: usize, found: usize },
    #[error("non-finite value in {field}")]
    NonFinite { field: String },
    #[error("{matrix}[{i}][{j}] = {value} is negative")]
    NegativeEntry {
        matrix: &'static str,
        i: usize,
        j: usize,
        value: f64,
    },
    #[error("{matrix}[{i}][{i}] = {value}, diagonal must be 0")]
    NonZeroDiagonal {
        matrix: &'static str,
        i: usize,
        value: f64,
    },
    #[error("time window of city {city} is inverted: open {open} > close {close}")]
    InvertedWindow { city: usize, open: f64, close: f64 },
    #[error("fuel coefficient {name} = {value} is negative")]
    NegativeFuelCoefficient { name: &'static str, value: f64 },
    #[error("big-M constant must be positive, got {0}")]
    NonPositiveBigM(f64),
}

/// A single Phase-1 structural defect of a candidate route.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteViolation {
    #[error("route has length {found}, expected {expected}")]
    WrongLength { expected: usize, found: usize },
    #[error("route must start at depot 0, starts at {found:?}")]
    BadStart { found: Option<i64> },
    #[error("route must end at depot 0, ends at {found:?}")]
    BadEnd { found: Option<i64> },
    #[error("position {position} holds city {city}, outside [0, {n})")]
    IndexOutOfRange { position: usize, city: i64, n: usize },
    #[error("city {city} visited more than once (positions {positions:?})")]
    DuplicateCity { city: usize, positions: Vec<usize> },
    #[error("city {city} is never visited")]
    MissingCity { city: usize },
}

/// Why a candidate solution was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("structurally invalid route ({} violation(s))", .0.len())]
    StructuralRouteError(Vec<RouteViolation>),
    #[error("cost mismatch: computed {computed:.4}, claimed {claimed:.4}, delta {delta:.6}")]
    CostMismatch {
        computed: f64,
        claimed: f64,
        delta: f64,
    },
}

/// Non-fatal observations made while importing a TSPLIB document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// `DIMENSION` disagrees with the number of coordinate rows; the parsed count wins.
    DimensionMismatch { declared: usize, parsed: usize },
    /// A coordinate row that is not `id x y` and was dropped.
    SkippedRow { line: usize, content: String },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::DimensionMismatch { declared, parsed } => write!(
                f,
                "declared DIMENSION {} but parsed {} coordinate rows, using {}",
                declared, parsed, parsed
            ),
            ParseWarning::SkippedRow { line, content } => {
                write!(f, "line {}: skipped unparseable coordinate row {:?}", line, content)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("cannot read TSPLIB file")]
    Io(#[from] std::io::Error),
    #[error("invalid header line {line}: {content:?}")]
    InvalidHeader { line: usize, content: String },
    #[error("unsupported EDGE_WEIGHT_TYPE {0:?} (supported: EUC_2D, GEO)")]
    UnsupportedEdgeWeightType(String),
    #[error(transparent)]
    Malformed(#[from] MalformedInstance),
}

/// Failure to load or store an exchange document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot access document")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON document")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedInstance),
}
