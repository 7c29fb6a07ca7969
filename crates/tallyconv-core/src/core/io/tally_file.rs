use crate::core::models::mesh::Mesh;
use crate::core::models::results::{MEAN_COLUMN, ResultsTable, TableError};
use crate::core::models::tally::{Filter, Tally};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TallyLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid results table in '{path}': {source}")]
    Table { path: String, source: TableError },
    #[error("Results table '{path}' has no numeric '{column}' column")]
    MissingColumn { path: String, column: &'static str },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
enum FilterDescriptor {
    Energy {
        edges: Vec<f64>,
    },
    RegularMesh {
        lower_left: [f64; 3],
        upper_right: [f64; 3],
        dimension: [usize; 3],
    },
    CylindricalMesh {
        r_grid: Vec<f64>,
        phi_grid: Vec<f64>,
        z_grid: Vec<f64>,
    },
    UnstructuredMesh {
        element_count: usize,
    },
    Cell {
        cells: Vec<u32>,
    },
    Particle {
        particles: Vec<String>,
    },
    EnergyFunction {
        energy: Vec<f64>,
        response: Vec<f64>,
    },
}

impl From<FilterDescriptor> for Filter {
    fn from(descriptor: FilterDescriptor) -> Self {
        match descriptor {
            FilterDescriptor::Energy { edges } => Filter::Energy { edges },
            FilterDescriptor::RegularMesh {
                lower_left,
                upper_right,
                dimension,
            } => Filter::Mesh {
                mesh: Mesh::regular(lower_left, upper_right, dimension),
            },
            FilterDescriptor::CylindricalMesh {
                r_grid,
                phi_grid,
                z_grid,
            } => Filter::Mesh {
                mesh: Mesh::Cylindrical {
                    r_grid,
                    phi_grid,
                    z_grid,
                },
            },
            FilterDescriptor::UnstructuredMesh { element_count } => Filter::Mesh {
                mesh: Mesh::Unstructured { element_count },
            },
            FilterDescriptor::Cell { cells } => Filter::Cell { cells },
            FilterDescriptor::Particle { particles } => Filter::Particle { particles },
            FilterDescriptor::EnergyFunction { energy, response } => {
                Filter::EnergyFunction { energy, response }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct TallyDescriptor {
    id: u32,
    #[serde(default)]
    name: String,
    scores: Vec<String>,
    #[serde(default)]
    filters: Vec<FilterDescriptor>,
    /// Results CSV, relative to the descriptor's directory.
    results: String,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Loads a tally from a TOML descriptor and the CSV results table it names.
///
/// ```toml
/// id = 4
/// name = "blanket heating"
/// scores = ["heating"]
/// results = "heating.csv"
///
/// [[filters]]
/// type = "regular-mesh"
/// lower-left = [-100.0, -100.0, -100.0]
/// upper-right = [100.0, 100.0, 100.0]
/// dimension = [10, 10, 1]
/// ```
pub fn load_tally(descriptor_path: &Path) -> Result<Tally, TallyLoadError> {
    let content = std::fs::read_to_string(descriptor_path).map_err(|e| TallyLoadError::Io {
        path: path_string(descriptor_path),
        source: e,
    })?;
    let descriptor: TallyDescriptor =
        toml::from_str(&content).map_err(|e| TallyLoadError::Toml {
            path: path_string(descriptor_path),
            source: e,
        })?;

    let results_path = descriptor_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&descriptor.results);
    let results = read_results_csv(&results_path)?;

    debug!(
        id = descriptor.id,
        rows = results.rows(),
        filters = descriptor.filters.len(),
        "Loaded tally descriptor"
    );

    Ok(Tally::new(
        descriptor.id,
        &descriptor.name,
        descriptor.scores,
        descriptor.filters.into_iter().map(Filter::from).collect(),
        results,
    ))
}

/// Reads a results table exported from a tally dataframe. Columns whose cells
/// are not all numeric (nuclide, score) are skipped; a numeric `mean` column is
/// required.
pub fn read_results_csv(path: &Path) -> Result<ResultsTable, TallyLoadError> {
    let csv_error = |e: csv::Error| TallyLoadError::Csv {
        path: path_string(path),
        source: e,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut columns: Vec<Option<Vec<f64>>> = vec![Some(Vec::new()); headers.len()];
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        for (cell, column) in record.iter().zip(columns.iter_mut()) {
            if let Some(values) = column {
                match cell.trim().parse::<f64>() {
                    Ok(value) => values.push(value),
                    Err(_) => *column = None,
                }
            }
        }
    }

    let mut numeric = Vec::new();
    for (name, column) in headers.into_iter().zip(columns) {
        match column {
            Some(values) => numeric.push((name, values)),
            None => debug!(column = %name, "Skipping non-numeric results column"),
        }
    }
    if !numeric.iter().any(|(name, _)| name == MEAN_COLUMN) {
        warn!(path = %path.display(), "Results table has no numeric mean column");
        return Err(TallyLoadError::MissingColumn {
            path: path_string(path),
            column: MEAN_COLUMN,
        });
    }
    ResultsTable::from_columns(numeric).map_err(|e| TallyLoadError::Table {
        path: path_string(path),
        source: e,
    })
}
