use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const JOULES_PER_ELECTRON_VOLT: f64 = 1.602176487e-19;

const DT_NEUTRON_MEV: f64 = 14.06;
const DT_ALPHA_MEV: f64 = 3.52;
const DD_TRITON_MEV: f64 = 1.01;
const DD_PROTON_MEV: f64 = 3.02;
const DD_HELIUM3_MEV: f64 = 0.82;
const DD_NEUTRON_MEV: f64 = 2.45;
/// The two D-D channels are taken as equally likely.
const DD_BRANCHING: f64 = 0.5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FusionError {
    #[error("Unsupported fusion reactants '{0}' (expected \"DT\" or \"DD\")")]
    UnsupportedReactants(String),
    #[error("Fusion energy must be non-negative and finite, got {0} J")]
    InvalidEnergy(f64),
}

/// Fuel pair burned in the fusion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reactants {
    DT,
    DD,
}

impl Reactants {
    pub fn energy_per_reaction_mev(self) -> f64 {
        match self {
            Reactants::DT => DT_NEUTRON_MEV + DT_ALPHA_MEV,
            Reactants::DD => {
                DD_BRANCHING * (DD_TRITON_MEV + DD_PROTON_MEV)
                    + (1.0 - DD_BRANCHING) * (DD_HELIUM3_MEV + DD_NEUTRON_MEV)
            }
        }
    }

    pub fn energy_per_reaction_j(self) -> f64 {
        self.energy_per_reaction_mev() * 1e6 * JOULES_PER_ELECTRON_VOLT
    }
}

impl FromStr for Reactants {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DT" => Ok(Reactants::DT),
            "DD" => Ok(Reactants::DD),
            other => Err(FusionError::UnsupportedReactants(other.to_string())),
        }
    }
}

impl fmt::Display for Reactants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reactants::DT => write!(f, "DT"),
            Reactants::DD => write!(f, "DD"),
        }
    }
}

/// Reactions per unit time (or per pulse) needed to release `energy_j` joules
/// per unit time (or per pulse). Pass a fusion power in watts for a per-second
/// rate, or a pulse energy in joules for a per-pulse rate.
pub fn source_strength(energy_j: f64, reactants: Reactants) -> Result<f64, FusionError> {
    if !energy_j.is_finite() || energy_j < 0.0 {
        return Err(FusionError::InvalidEnergy(energy_j));
    }
    Ok(energy_j / reactants.energy_per_reaction_j())
}
