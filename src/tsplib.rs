//! TSPLIB import.
//!
//! Reads node-coordinate documents (`EUC_2D` or `GEO`) and turns them into pure routing
//! instances: unit speed, non-binding windows and no fuel term.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ImportError, MalformedInstance, ParseWarning};
use crate::instance::{FuelModel, ProblemInstance, TimeWindow, DEFAULT_BIG_M};
use crate::rounding::{floor_plus_one, round_half_up};

/// Closing time given to every window of an imported instance
pub const IMPORT_WINDOW_CLOSE: f64 = 1_000_000.0;

/// Earth radius used by TSPLIB `GEO` distances, in km
pub const EARTH_RADIUS: f64 = 6378.388;

/// Supported TSPLIB `EDGE_WEIGHT_TYPE` values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EdgeWeightType {
    #[default]
    Euc2d,
    Geo,
}

impl EdgeWeightType {
    /// Distance between two coordinate pairs under this metric
    pub fn distance(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        match self {
            EdgeWeightType::Euc2d => euc_2d(a, b),
            EdgeWeightType::Geo => geo(a, b),
        }
    }
}

impl std::str::FromStr for EdgeWeightType {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "EUC_2D" => Ok(EdgeWeightType::Euc2d),
            "GEO" => Ok(EdgeWeightType::Geo),
            other => Err(ImportError::UnsupportedEdgeWeightType(other.to_string())),
        }
    }
}

impl std::fmt::Display for EdgeWeightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeWeightType::Euc2d => write!(f, "EUC_2D"),
            EdgeWeightType::Geo => write!(f, "GEO"),
        }
    }
}

/// Planar distance rounded to the nearest integer, halves up.
pub fn euc_2d(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    round_half_up((dx * dx + dy * dy).sqrt())
}

/// Convert a packed `DDD.MM` coordinate to radians.
pub fn geo_radians(x: f64) -> f64 {
    let deg = x.trunc();
    let min = x - deg;
    PI * (deg + 5.0 * min / 3.0) / 180.0
}

/// Great-circle distance between two `(latitude, longitude)` pairs in `DDD.MM` form.
pub fn geo(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat_a, lon_a) = (geo_radians(a.0), geo_radians(a.1));
    let (lat_b, lon_b) = (geo_radians(b.0), geo_radians(b.1));

    let q1 = (lon_a - lon_b).cos();
    let q2 = (lat_a - lat_b).cos();
    let q3 = (lat_a + lat_b).cos();
    // clamp guards acos against rounding just outside [-1, 1]
    let arc = (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).clamp(-1.0, 1.0).acos();
    floor_plus_one(EARTH_RADIUS * arc)
}

/// A parsed TSPLIB document
#[derive(Debug, Clone)]
pub struct TsplibImport {
    pub instance: ProblemInstance,
    /// Value of the `NAME` header, if present
    pub name: Option<String>,
    pub edge_weight_type: EdgeWeightType,
    /// Declared `DIMENSION`, if present
    pub declared_dimension: Option<usize>,
    pub warnings: Vec<ParseWarning>,
}

/// Imports TSPLIB node-coordinate documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsplibImporter;

impl TsplibImporter {
    pub fn new() -> Self {
        TsplibImporter
    }

    /// Parse a TSPLIB file
    pub fn from_file<P: AsRef<Path>>(&self, path: P) -> Result<TsplibImport, ImportError> {
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }

    /// Parse a TSPLIB document held in memory
    pub fn parse_str(&self, text: &str) -> Result<TsplibImport, ImportError> {
        self.parse_reader(text.as_bytes())
    }

    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<TsplibImport, ImportError> {
        let mut name = None;
        let mut edge_weight_type = EdgeWeightType::default();
        let mut declared_dimension = None;
        let mut coords: Vec<(f64, f64)> = Vec::new();
        let mut warnings = Vec::new();
        let mut in_coords = false;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            let (key, value) = match line.split_once(':') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (line, None),
            };

            if key.ends_with("_SECTION") {
                in_coords = key == "NODE_COORD_SECTION";
                continue;
            }

            if let Some(value) = value {
                match key {
                    "NAME" => name = Some(value.to_string()),
                    "EDGE_WEIGHT_TYPE" => edge_weight_type = value.parse()?,
                    "DIMENSION" => {
                        let dim = value.parse().map_err(|_| ImportError::InvalidHeader {
                            line: line_no,
                            content: line.to_string(),
                        })?;
                        declared_dimension = Some(dim);
                    }
                    _ => log::debug!("Ignoring header {}", key),
                }
                continue;
            }

            if in_coords {
                match parse_coord_row(line) {
                    Some(point) => coords.push(point),
                    None => {
                        let warning = ParseWarning::SkippedRow {
                            line: line_no,
                            content: line.to_string(),
                        };
                        log::warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }
        }

        if let Some(declared) = declared_dimension {
            if declared != coords.len() {
                let warning = ParseWarning::DimensionMismatch {
                    declared,
                    parsed: coords.len(),
                };
                log::warn!("{}", warning);
                warnings.push(warning);
            }
        }

        let instance = build_instance(&coords, edge_weight_type)?;
        log::info!(
            "Imported {} cities ({})",
            instance.n(),
            edge_weight_type
        );

        Ok(TsplibImport {
            instance,
            name,
            edge_weight_type,
            declared_dimension,
            warnings,
        })
    }
}

/// `id x y`, extra columns ignored
fn parse_coord_row(line: &str) -> Option<(f64, f64)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    parts[0].parse::<usize>().ok()?;
    let x: f64 = parts[1].parse().ok()?;
    let y: f64 = parts[2].parse().ok()?;
    if x.is_finite() && y.is_finite() {
        Some((x, y))
    } else {
        None
    }
}

fn build_instance(coords: &[(f64, f64)], metric: EdgeWeightType) -> Result<ProblemInstance, MalformedInstance> {
    let n = coords.len();
    let mut cost = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                cost[i][j] = metric.distance(coords[i], coords[j]);
            }
        }
    }
    let time = cost.clone();
    let windows = vec![TimeWindow::new(0.0, IMPORT_WINDOW_CLOSE); n];

    ProblemInstance::new(n, cost, time, windows, FuelModel::disabled(), DEFAULT_BIG_M)
}
