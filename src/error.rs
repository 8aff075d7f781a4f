use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to load the impact dataset. Fatal at startup.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("row {row}: column `{column}` is empty")]
    EmptyField { row: u64, column: &'static str },
    #[error("row {row}: column `{column}` has non-numeric value {value:?}")]
    NotNumeric {
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: column `{column}` must be non-negative, found {value}")]
    Negative {
        row: u64,
        column: &'static str,
        value: f64,
    },
    #[error("row {row}: column `{column}` must be a whole number, found {value}")]
    NotWhole {
        row: u64,
        column: &'static str,
        value: f64,
    },
    #[error("row {row}: decade {value} is not one of 1900, 1910, ..., 2100")]
    InvalidDecade { row: u64, value: f64 },
}

/// Failure to load the sub-region boundaries. Fatal at startup.
#[derive(Debug, Error)]
pub enum GeometryLoadError {
    #[error("cannot read boundaries {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("expected a FeatureCollection at the top level")]
    NotFeatureCollection,
    #[error("feature #{index} has no string `subregion` property")]
    MissingKey { index: usize },
    #[error("sub-region {subregion:?} has no geometry")]
    MissingGeometry { subregion: String },
    #[error("sub-region {subregion:?} has unsupported geometry type {kind}")]
    UnsupportedGeometry {
        subregion: String,
        kind: &'static str,
    },
    #[error("sub-region {subregion:?} has a malformed ring: {reason}")]
    MalformedRing {
        subregion: String,
        reason: &'static str,
    },
    #[error("sub-region {0:?} is defined more than once")]
    DuplicateKey(String),
}

/// Rejected query parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("decade {0} is not one of 1900, 1910, ..., 2100")]
    UnknownDecade(i32),
    #[error("decade range start {min} is after end {max}")]
    ReversedRange { min: i32, max: i32 },
}

/// An aggregated sub-region with no boundary. Non-fatal: the row is left off the map.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedRegionWarning {
    pub subregion: String,
    pub value: f64,
}

impl fmt::Display for UnresolvedRegionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sub-region {:?} (value {}) has no boundary and was not drawn",
            self.subregion, self.value
        )
    }
}
