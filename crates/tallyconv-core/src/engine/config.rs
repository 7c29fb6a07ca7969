use crate::core::fusion::{self, FusionError, Reactants};
use crate::core::models::material::{Material, MaterialError};
use crate::engine::scaling::SourceStrength;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Parameters '{first}' and '{second}' cannot both be set")]
    Conflict {
        first: &'static str,
        second: &'static str,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error(transparent)]
    Material(#[from] MaterialError),
}

/// Auxiliary physical values used to close dimensional gaps for one conversion.
///
/// Every value is optional; a missing value only matters when the requested
/// units actually need it. Nothing here is shared between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingInputs {
    /// Source particle rate, tagged with the axis it may close.
    pub source_strength: Option<SourceStrength>,
    /// Region or voxel volume in cm³.
    pub volume: Option<f64>,
    pub atoms: Option<f64>,
    /// Energy in eV needed to produce one displacement.
    pub energy_per_displacement: Option<f64>,
    /// Fraction of displacements lost to recombination, in [0, 1].
    pub recombination_fraction: f64,
    pub material: Option<Material>,
}

impl Default for ScalingInputs {
    fn default() -> Self {
        Self {
            source_strength: None,
            volume: None,
            atoms: None,
            energy_per_displacement: None,
            recombination_fraction: 0.0,
            material: None,
        }
    }
}

impl ScalingInputs {
    pub fn builder() -> ScalingInputsBuilder {
        ScalingInputsBuilder::new()
    }
}

fn check_positive(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("expected a positive finite number, got {}", value),
        })
    }
}

#[derive(Default)]
pub struct ScalingInputsBuilder {
    source_strength: Option<f64>,
    fusion_power: Option<f64>,
    fusion_energy_per_pulse: Option<f64>,
    reactants: Option<Reactants>,
    volume: Option<f64>,
    atoms: Option<f64>,
    energy_per_displacement: Option<f64>,
    recombination_fraction: Option<f64>,
    material: Option<Material>,
}

impl ScalingInputsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rate the caller vouches for on whichever axis the target needs.
    pub fn source_strength(mut self, particles_per_unit: f64) -> Self {
        self.source_strength = Some(particles_per_unit);
        self
    }
    /// Derive a per-second source strength from a fusion power in watts.
    pub fn fusion_power(mut self, watts: f64) -> Self {
        self.fusion_power = Some(watts);
        self
    }
    /// Derive a per-pulse source strength from a pulse energy in joules.
    pub fn fusion_energy_per_pulse(mut self, joules: f64) -> Self {
        self.fusion_energy_per_pulse = Some(joules);
        self
    }
    pub fn reactants(mut self, reactants: Reactants) -> Self {
        self.reactants = Some(reactants);
        self
    }
    pub fn volume(mut self, cubic_centimeters: f64) -> Self {
        self.volume = Some(cubic_centimeters);
        self
    }
    pub fn atoms(mut self, atoms: f64) -> Self {
        self.atoms = Some(atoms);
        self
    }
    pub fn energy_per_displacement(mut self, electron_volts: f64) -> Self {
        self.energy_per_displacement = Some(electron_volts);
        self
    }
    pub fn recombination_fraction(mut self, fraction: f64) -> Self {
        self.recombination_fraction = Some(fraction);
        self
    }
    pub fn material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    fn derive_strength(&self, energy: f64) -> Result<f64, ConfigError> {
        let reactants = self.reactants.unwrap_or(Reactants::DT);
        let strength = fusion::source_strength(energy, reactants)?;
        debug!(%reactants, energy, strength, "Derived source strength from fusion output");
        check_positive("source_strength", strength)
    }

    /// Validates the inputs. The recombination fraction range is checked when a
    /// damage tally is processed.
    pub fn build(self) -> Result<ScalingInputs, ConfigError> {
        let source_strength = match (
            self.source_strength,
            self.fusion_power,
            self.fusion_energy_per_pulse,
        ) {
            (_, Some(_), Some(_)) => {
                return Err(ConfigError::Conflict {
                    first: "fusion_power",
                    second: "fusion_energy_per_pulse",
                });
            }
            (Some(_), Some(_), None) => {
                return Err(ConfigError::Conflict {
                    first: "source_strength",
                    second: "fusion_power",
                });
            }
            (Some(_), None, Some(_)) => {
                return Err(ConfigError::Conflict {
                    first: "source_strength",
                    second: "fusion_energy_per_pulse",
                });
            }
            (Some(strength), None, None) => {
                let strength = check_positive("source_strength", strength)?;
                Some(SourceStrength::Unspecified(strength))
            }
            (None, Some(watts), None) => {
                Some(SourceStrength::PerSecond(self.derive_strength(watts)?))
            }
            (None, None, Some(joules)) => {
                Some(SourceStrength::PerPulse(self.derive_strength(joules)?))
            }
            (None, None, None) => None,
        };

        Ok(ScalingInputs {
            source_strength,
            volume: self
                .volume
                .map(|v| check_positive("volume", v))
                .transpose()?,
            atoms: self
                .atoms
                .map(|v| check_positive("atoms", v))
                .transpose()?,
            energy_per_displacement: self
                .energy_per_displacement
                .map(|v| check_positive("energy_per_displacement", v))
                .transpose()?,
            recombination_fraction: self.recombination_fraction.unwrap_or(0.0),
            material: self.material,
        })
    }
}

/// What a caller wants back from a tally: target units plus the auxiliary
/// inputs needed to reach them. `required_units = None` returns base units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionRequest {
    pub required_units: Option<String>,
    /// Energy axis units for spectra; electron volts when unset.
    pub required_energy_units: Option<String>,
    pub inputs: ScalingInputs,
}

impl ConversionRequest {
    pub fn base_units() -> Self {
        Self::default()
    }

    pub fn to_units(units: &str) -> Self {
        Self {
            required_units: Some(units.to_string()),
            ..Self::default()
        }
    }

    pub fn with_energy_units(mut self, units: &str) -> Self {
        self.required_energy_units = Some(units.to_string());
        self
    }

    pub fn with_inputs(mut self, inputs: ScalingInputs) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading conversion request from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let partial: PartialConversionRequest =
            toml::from_str(content).map_err(|e| ConfigError::Toml {
                path: origin.to_string(),
                source: e,
            })?;
        partial.resolve()
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMaterial {
    name: Option<String>,
    density: f64,
    average_molar_mass: Option<f64>,
    /// Element symbol to atom fraction.
    composition: Option<BTreeMap<String, f64>>,
}

impl PartialMaterial {
    fn resolve(self) -> Result<Material, ConfigError> {
        let material = match (self.average_molar_mass, self.composition) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Conflict {
                    first: "material.average-molar-mass",
                    second: "material.composition",
                });
            }
            (Some(mass), None) => Material::new(self.density, mass)?,
            (None, Some(composition)) => {
                let pairs: Vec<(&str, f64)> = composition
                    .iter()
                    .map(|(symbol, fraction)| (symbol.as_str(), *fraction))
                    .collect();
                Material::from_composition(&pairs, self.density)?
            }
            (None, None) => {
                return Err(ConfigError::MissingParameter("material.average-molar-mass"));
            }
        };
        Ok(match self.name {
            Some(name) => material.with_name(&name),
            None => material,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialConversionRequest {
    required_units: Option<String>,
    required_energy_units: Option<String>,
    source_strength: Option<f64>,
    fusion_power: Option<f64>,
    fusion_energy_per_pulse: Option<f64>,
    reactants: Option<String>,
    volume: Option<f64>,
    atoms: Option<f64>,
    energy_per_displacement: Option<f64>,
    recombination_fraction: Option<f64>,
    material: Option<PartialMaterial>,
}

impl PartialConversionRequest {
    fn resolve(self) -> Result<ConversionRequest, ConfigError> {
        let mut builder = ScalingInputsBuilder::new();
        if let Some(v) = self.source_strength {
            builder = builder.source_strength(v);
        }
        if let Some(v) = self.fusion_power {
            builder = builder.fusion_power(v);
        }
        if let Some(v) = self.fusion_energy_per_pulse {
            builder = builder.fusion_energy_per_pulse(v);
        }
        if let Some(r) = self.reactants {
            builder = builder.reactants(r.parse::<Reactants>()?);
        }
        if let Some(v) = self.volume {
            builder = builder.volume(v);
        }
        if let Some(v) = self.atoms {
            builder = builder.atoms(v);
        }
        if let Some(v) = self.energy_per_displacement {
            builder = builder.energy_per_displacement(v);
        }
        if let Some(v) = self.recombination_fraction {
            builder = builder.recombination_fraction(v);
        }
        if let Some(m) = self.material {
            builder = builder.material(m.resolve()?);
        }
        Ok(ConversionRequest {
            required_units: self.required_units,
            required_energy_units: self.required_energy_units,
            inputs: builder.build()?,
        })
    }
}
