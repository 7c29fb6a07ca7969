use crate::core::models::mesh::Mesh;
use crate::core::models::results::{ENERGY_LOW_COLUMN, MEAN_COLUMN};
use crate::core::models::tally::{FilterKind, Tally};
use crate::core::units::quantity::Quantity;
use crate::core::units::registry::UnitRegistry;
use crate::core::units::unit::Unit;
use crate::core::utils::geometry::{voxel_grid_shape, voxel_volume};
use crate::engine::classifier::{ClassificationMode, ENERGY_AXIS_UNITS, UnitSpec, classify};
use crate::engine::config::{ConversionRequest, ScalingInputs};
use crate::engine::error::EngineError;
use crate::engine::scaling::{Auxiliaries, scale};
use tracing::{debug, info, instrument};

/// Mean values of a tally and, when recorded, their standard deviations. Both
/// always carry the same units.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTally {
    pub value: Quantity,
    pub std_dev: Option<Quantity>,
}

/// An energy-binned tally: lower bin energies alongside the scaled values.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSpectrum {
    pub energy: Quantity,
    pub value: Quantity,
    pub std_dev: Option<Quantity>,
}

/// Converts a flux, current or heating tally into the requested units.
#[instrument(skip_all, name = "process_tally", fields(tally = tally.id))]
pub fn process_tally(
    tally: &Tally,
    request: &ConversionRequest,
    registry: &UnitRegistry,
) -> Result<ProcessedTally, EngineError> {
    info!(units = ?request.required_units, "Processing tally.");
    let spec = classify(tally, ClassificationMode::Plain, registry)?;
    let aux = auxiliaries(tally, &request.inputs, request.inputs.atoms);
    convert_columns(tally, spec.quantity(), 1.0, request, &aux, registry)
}

/// Converts a tally whose energy-function filter holds flux-to-dose
/// coefficients in pSv cm².
#[instrument(skip_all, name = "process_dose_tally", fields(tally = tally.id))]
pub fn process_dose_tally(
    tally: &Tally,
    request: &ConversionRequest,
    registry: &UnitRegistry,
) -> Result<ProcessedTally, EngineError> {
    info!(units = ?request.required_units, "Processing dose tally.");
    let spec = classify(tally, ClassificationMode::Dose, registry)?;
    let aux = auxiliaries(tally, &request.inputs, request.inputs.atoms);
    convert_columns(tally, spec.quantity(), 1.0, request, &aux, registry)
}

/// Converts an energy-binned tally. Energies are returned in
/// `request.required_energy_units` (eV by default).
#[instrument(skip_all, name = "process_spectra_tally", fields(tally = tally.id))]
pub fn process_spectra_tally(
    tally: &Tally,
    request: &ConversionRequest,
    registry: &UnitRegistry,
) -> Result<ProcessedSpectrum, EngineError> {
    info!(
        units = ?request.required_units,
        energy_units = ?request.required_energy_units,
        "Processing spectrum tally."
    );
    let spec = classify(tally, ClassificationMode::Spectrum, registry)?;
    let UnitSpec::Spectral { energy, quantity } = spec else {
        return Err(EngineError::MissingFilter {
            tally: tally.to_string(),
            kind: FilterKind::Energy,
            operation: "process_spectra_tally",
        });
    };

    let energy_values = spectrum_energies(tally)?;
    let energy = Quantity::new(energy_values, energy);
    let energy_target = registry.parse_units(
        request
            .required_energy_units
            .as_deref()
            .unwrap_or(ENERGY_AXIS_UNITS),
    )?;
    let energy = energy
        .to(&energy_target)
        .map_err(|e| EngineError::IncompatibleUnit {
            from: energy.units().to_string(),
            to: energy_target.to_string(),
            source: e,
        })?;

    let aux = auxiliaries(tally, &request.inputs, request.inputs.atoms);
    let ProcessedTally { value, std_dev } =
        convert_columns(tally, &quantity, 1.0, request, &aux, registry)?;
    Ok(ProcessedSpectrum {
        energy,
        value,
        std_dev,
    })
}

/// Converts a damage-energy tally, typically into displacements per atom.
///
/// The deposited energy is first attenuated by `1 - recombination_fraction`.
/// When no atom count is given but a material is, the count is derived from
/// the material's number density and the explicit or mesh voxel volume.
#[instrument(skip_all, name = "process_damage_energy_tally", fields(tally = tally.id))]
pub fn process_damage_energy_tally(
    tally: &Tally,
    request: &ConversionRequest,
    registry: &UnitRegistry,
) -> Result<ProcessedTally, EngineError> {
    info!(units = ?request.required_units, "Processing damage energy tally.");
    let inputs = &request.inputs;
    let fraction = inputs.recombination_fraction;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(EngineError::InvalidRange {
            parameter: "recombination_fraction",
            value: fraction,
            min: 0.0,
            max: 1.0,
        });
    }

    let spec = classify(tally, ClassificationMode::Plain, registry)?;
    if !spec.quantity().dimensionality().carries_energy() {
        return Err(EngineError::UnsupportedScore {
            tally: tally.to_string(),
            score: tally.scores.join(", "),
            supported: "damage-energy, heating, heating-local".to_string(),
        });
    }

    let atoms = inputs.atoms.or_else(|| {
        let material = inputs.material.as_ref()?;
        let volume = inputs.volume.or_else(|| tally.mesh().and_then(mesh_volume))?;
        let atoms = material.atoms_per_cm3() * volume;
        debug!(atoms, volume, "Derived atom count from material density.");
        Some(atoms)
    });
    let aux = auxiliaries(tally, inputs, atoms);
    convert_columns(tally, spec.quantity(), 1.0 - fraction, request, &aux, registry)
}

/// Converts every tally with the same request, stopping at the first failure.
pub fn process_tallies(
    tallies: &[Tally],
    request: &ConversionRequest,
    registry: &UnitRegistry,
) -> Result<Vec<ProcessedTally>, EngineError> {
    info!(count = tallies.len(), "Processing tallies.");
    tallies
        .iter()
        .map(|tally| process_tally(tally, request, registry))
        .collect()
}

fn mesh_volume(mesh: &Mesh) -> Option<f64> {
    match voxel_volume(mesh) {
        Ok(volume) => Some(volume),
        Err(e) => {
            debug!(error = %e, "Mesh cannot provide a volume for atom count.");
            None
        }
    }
}

fn auxiliaries<'a>(
    tally: &'a Tally,
    inputs: &ScalingInputs,
    atoms: Option<f64>,
) -> Auxiliaries<'a> {
    Auxiliaries {
        source_strength: inputs.source_strength,
        volume: inputs.volume,
        atoms,
        energy_per_displacement: inputs.energy_per_displacement,
        mesh: tally.mesh(),
    }
}

/// Tags a results column with `units`, reshaping multi-row mesh results to the
/// voxel grid when the row count matches.
fn column_quantity(
    values: &[f64],
    units: &Unit,
    factor: f64,
    mesh: Option<&Mesh>,
) -> Result<Quantity, EngineError> {
    let rows = values.len();
    let quantity = Quantity::new(values.iter().map(|v| v * factor).collect(), units.clone());
    match mesh {
        Some(mesh) if rows > 1 && mesh.voxel_count() == rows => {
            Ok(quantity.reshape(voxel_grid_shape(mesh))?)
        }
        _ => Ok(quantity),
    }
}

fn convert_columns(
    tally: &Tally,
    base: &Unit,
    factor: f64,
    request: &ConversionRequest,
    aux: &Auxiliaries<'_>,
    registry: &UnitRegistry,
) -> Result<ProcessedTally, EngineError> {
    let mean = tally
        .results
        .mean()
        .ok_or_else(|| EngineError::MissingColumn {
            tally: tally.to_string(),
            column: MEAN_COLUMN,
        })?;
    let mesh = tally.mesh();
    let value = column_quantity(mean, base, factor, mesh)?;
    let std_dev = tally
        .results
        .std_dev()
        .map(|std_dev| column_quantity(std_dev, base, factor, mesh))
        .transpose()?;

    let Some(required) = request.required_units.as_deref() else {
        return Ok(ProcessedTally { value, std_dev });
    };
    let target = registry.parse_units(required)?;
    let value = scale(value, &target, aux, registry)?;
    let std_dev = std_dev
        .map(|std_dev| scale(std_dev, &target, aux, registry))
        .transpose()?;
    debug!(units = %value.units(), rows = value.len(), "Converted tally results.");
    Ok(ProcessedTally { value, std_dev })
}

fn spectrum_energies(tally: &Tally) -> Result<Vec<f64>, EngineError> {
    if let Some(column) = tally.results.column(ENERGY_LOW_COLUMN) {
        return Ok(column.to_vec());
    }
    tally
        .row_energies()
        .ok_or_else(|| EngineError::MissingColumn {
            tally: tally.to_string(),
            column: ENERGY_LOW_COLUMN,
        })
}
