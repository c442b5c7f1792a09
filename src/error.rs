use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Boundary feature #{index} has no string name property '{property}'")]
    MissingName { index: usize, property: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Malformed GeoJSON in '{path}': {source}")]
    GeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },
    #[error("'{path}' is not a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
    #[error("Column '{column}' not found in header of '{path}'")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Row {row} of '{path}': cannot parse '{value}' in column '{column}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config '{path}': {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

macro_rules! io_err {
    ($path:expr, $err:expr) => {
        $crate::error::LoadError::Io {
            path: $path.to_path_buf(),
            source: $err,
        }
    };
}

pub(crate) use io_err;
