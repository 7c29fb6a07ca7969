use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("Malformed unit expression '{expression}': {reason}")]
    Parse { expression: String, reason: String },

    #[error("Unit expression '{expression}' carries a numeric factor of {factor}, expected 1")]
    UnexpectedFactor { expression: String, factor: f64 },

    #[error("Cannot convert from '{from}' ({from_dims}) to '{to}' ({to_dims})")]
    Incompatible {
        from: String,
        from_dims: String,
        to: String,
        to_dims: String,
    },

    #[error("Unit '{expression}' has an exponent beyond the supported limit of {max}")]
    ExponentOverflow { expression: String, max: i32 },

    #[error("Shape mismatch: {left:?} and {right:?} cannot be combined")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("Cannot reshape {len} values into shape {shape:?}")]
    InvalidShape { len: usize, shape: Vec<usize> },

    #[error("Invalid unit definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}
