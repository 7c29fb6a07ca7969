use thiserror::Error;

use super::scaling::Axis;
use crate::core::models::tally::FilterKind;
use crate::core::units::error::UnitError;
use crate::core::utils::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unsupported score {score:?} on {tally} (supported: {supported})")]
    UnsupportedScore {
        tally: String,
        score: String,
        supported: String,
    },

    #[error("{operation} requires a {kind} filter, but {tally} has none")]
    MissingFilter {
        tally: String,
        kind: FilterKind,
        operation: &'static str,
    },

    #[error("{tally} carries a {kind} filter, which {operation} cannot interpret: {hint}")]
    ConflictingFilter {
        tally: String,
        kind: FilterKind,
        operation: &'static str,
        hint: &'static str,
    },

    #[error(
        "Missing auxiliary parameter '{parameter}' to close a {axis} gap of {difference}"
    )]
    MissingAuxiliaryParameter {
        parameter: &'static str,
        axis: Axis,
        difference: i32,
    },

    #[error("Parameter '{parameter}' must lie in [{min}, {max}], got {value}")]
    InvalidRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Cannot reach '{to}' from '{from}': {source}")]
    IncompatibleUnit {
        from: String,
        to: String,
        #[source]
        source: UnitError,
    },

    #[error("Results of {tally} have no '{column}' column")]
    MissingColumn { tally: String, column: &'static str },

    #[error("Unit error: {source}")]
    Unit {
        #[from]
        source: UnitError,
    },

    #[error("Geometry error: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },
}
