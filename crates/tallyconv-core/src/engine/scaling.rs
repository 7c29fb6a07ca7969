use super::error::EngineError;
use crate::core::models::mesh::Mesh;
use crate::core::units::dimension::Dimension;
use crate::core::units::quantity::Quantity;
use crate::core::units::registry::UnitRegistry;
use crate::core::units::unit::Unit;
use crate::core::utils::geometry::voxel_volume;
use std::fmt;
use tracing::debug;

/// A physical axis the engine can correct with an auxiliary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Displacement,
    Time,
    Pulse,
    Length,
    Atom,
}

impl Axis {
    /// Correction order. Displacement comes first so the later time and atom
    /// corrections see the displacement count rather than the energy.
    pub const ORDER: [Axis; 5] = [
        Axis::Displacement,
        Axis::Time,
        Axis::Pulse,
        Axis::Length,
        Axis::Atom,
    ];

    pub fn dimension(self) -> Dimension {
        match self {
            Axis::Displacement => Dimension::Displacement,
            Axis::Time => Dimension::Time,
            Axis::Pulse => Dimension::Pulse,
            Axis::Length => Dimension::Length,
            Axis::Atom => Dimension::Atom,
        }
    }

    fn correction(self) -> Correction {
        match self {
            Axis::Displacement => Correction {
                parameter: "energy_per_displacement",
                units: "electron_volt / displacements",
            },
            Axis::Time => Correction {
                parameter: "source_strength",
                units: "simulated_particle / second",
            },
            Axis::Pulse => Correction {
                parameter: "source_strength",
                units: "simulated_particle / pulse",
            },
            Axis::Length => Correction {
                parameter: "volume",
                units: "centimeter ** 3",
            },
            Axis::Atom => Correction {
                parameter: "atoms",
                units: "atom",
            },
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dimension().name())
    }
}

struct Correction {
    parameter: &'static str,
    units: &'static str,
}

/// Signed exponent difference on one axis, `source - target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitGap {
    pub axis: Axis,
    pub difference: i32,
}

impl UnitGap {
    pub fn between(axis: Axis, source: &Unit, target: &Unit) -> Self {
        let dimension = axis.dimension();
        Self {
            axis,
            difference: source.exponent(dimension) - target.exponent(dimension),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.difference == 0
    }
}

/// A source particle rate together with the axis it is valid for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceStrength {
    /// Given directly by the caller; closes either a time or a pulse gap.
    Unspecified(f64),
    /// Derived from a fusion power; only closes time gaps.
    PerSecond(f64),
    /// Derived from a fusion pulse energy; only closes pulse gaps.
    PerPulse(f64),
}

impl SourceStrength {
    pub fn value(self) -> f64 {
        match self {
            SourceStrength::Unspecified(v)
            | SourceStrength::PerSecond(v)
            | SourceStrength::PerPulse(v) => v,
        }
    }

    pub fn for_axis(self, axis: Axis) -> Option<f64> {
        match (self, axis) {
            (SourceStrength::Unspecified(v), Axis::Time | Axis::Pulse)
            | (SourceStrength::PerSecond(v), Axis::Time)
            | (SourceStrength::PerPulse(v), Axis::Pulse) => Some(v),
            _ => None,
        }
    }
}

/// Caller-supplied values for closing gaps. `mesh` is only used to derive a
/// voxel volume when `volume` is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Auxiliaries<'a> {
    pub source_strength: Option<SourceStrength>,
    pub volume: Option<f64>,
    pub atoms: Option<f64>,
    pub energy_per_displacement: Option<f64>,
    pub mesh: Option<&'a Mesh>,
}

impl Auxiliaries<'_> {
    fn value_for(&self, axis: Axis) -> Result<Option<f64>, EngineError> {
        Ok(match axis {
            Axis::Displacement => self.energy_per_displacement,
            Axis::Time | Axis::Pulse => self
                .source_strength
                .and_then(|strength| strength.for_axis(axis)),
            Axis::Atom => self.atoms,
            Axis::Length => match (self.volume, self.mesh) {
                (Some(volume), _) => Some(volume),
                (None, Some(mesh)) => {
                    let volume = voxel_volume(mesh)?;
                    debug!(
                        volume,
                        mesh = mesh.kind_name(),
                        "Derived volume from mesh voxel size"
                    );
                    Some(volume)
                }
                (None, None) => None,
            },
        })
    }
}

/// Brings `quantity` into `target` units, closing dimensional gaps with the
/// auxiliary values.
///
/// Each axis in [`Axis::ORDER`] is checked against the target. A gap is closed
/// by multiplying with the axis's auxiliary quantity raised to `k = -gap / e`,
/// where `e` is that quantity's exponent on the axis. Only `|k| = 1` is
/// applied; the displacement axis is only touched while the quantity still
/// carries energy. Whatever remains is handed to the final unit conversion,
/// which rejects any dimension that still differs.
///
/// # Errors
///
/// [`EngineError::MissingAuxiliaryParameter`] when a closable gap has no value,
/// [`EngineError::IncompatibleUnit`] when the final conversion fails.
pub fn scale(
    quantity: Quantity,
    target: &Unit,
    aux: &Auxiliaries<'_>,
    registry: &UnitRegistry,
) -> Result<Quantity, EngineError> {
    let mut current = quantity;
    for axis in Axis::ORDER {
        let gap = UnitGap::between(axis, current.units(), target);
        if gap.is_closed() {
            continue;
        }
        if axis == Axis::Displacement {
            let units = current.units();
            if !units.dimensionality().carries_energy()
                || units.exponent(Dimension::Displacement) != 0
            {
                continue;
            }
        }
        current = close_gap(current, gap, aux, registry)?;
    }

    current.to(target).map_err(|e| EngineError::IncompatibleUnit {
        from: current.units().to_string(),
        to: target.to_string(),
        source: e,
    })
}

fn close_gap(
    current: Quantity,
    gap: UnitGap,
    aux: &Auxiliaries<'_>,
    registry: &UnitRegistry,
) -> Result<Quantity, EngineError> {
    let correction = gap.axis.correction();
    let units = registry.parse_units(correction.units)?;
    let exponent = units.exponent(gap.axis.dimension());
    if gap.difference % exponent != 0 || (gap.difference / exponent).abs() != 1 {
        debug!(
            axis = %gap.axis,
            difference = gap.difference,
            "Leaving gap to final conversion"
        );
        return Ok(current);
    }
    let power = -gap.difference / exponent;

    let value = aux
        .value_for(gap.axis)?
        .ok_or(EngineError::MissingAuxiliaryParameter {
            parameter: correction.parameter,
            axis: gap.axis,
            difference: gap.difference,
        })?;
    let factor = Quantity::scalar(value, units);
    debug!(
        axis = %gap.axis,
        difference = gap.difference,
        parameter = correction.parameter,
        value,
        "Closing unit gap"
    );
    let corrected = if power > 0 {
        current.multiply(&factor)?
    } else {
        current.divide(&factor)?
    };
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

    fn registry() -> UnitRegistry {
        UnitRegistry::default()
    }

    fn units(expression: &str) -> Unit {
        registry().parse_units(expression).unwrap()
    }

    fn quantity(values: &[f64], expression: &str) -> Quantity {
        Quantity::new(values.to_vec(), units(expression))
    }

    fn assert_close(a: f64, b: f64) {
        assert!(
            (a - b).abs() <= 1e-9 * a.abs().max(b.abs()),
            "{} != {}",
            a,
            b
        );
    }

    #[test]
    fn unit_gap_is_source_minus_target_exponent() {
        let gap = UnitGap::between(
            Axis::Length,
            &units("centimeter / simulated_particle"),
            &units("1 / centimeter ** 2"),
        );
        assert_eq!(gap.difference, 3);
        assert!(!gap.is_closed());
        assert!(UnitGap::between(Axis::Time, &units("eV"), &units("J")).is_closed());
    }

    #[test]
    fn scale_without_gaps_is_plain_conversion() {
        let q = quantity(&[1e6], "eV / simulated_particle");
        let scaled = scale(
            q,
            &units("MeV / simulated_particle"),
            &Auxiliaries::default(),
            &registry(),
        )
        .unwrap();
        assert_close(scaled.values()[0], 1.0);
        assert_eq!(scaled.units().to_string(), "megaelectron_volt / simulated_particle");
    }

    #[test]
    fn scale_multiplies_by_source_strength_for_time_gap() {
        let q = quantity(&[2.0], "eV / simulated_particle");
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::Unspecified(1e9)),
            ..Default::default()
        };
        let scaled = scale(q, &units("joule / second"), &aux, &registry()).unwrap();
        assert_eq!(scaled.units().to_string(), "joule / second");
        assert_close(scaled.values()[0], 2.0 * 1e9 * 1.602_176_634e-19);
    }

    #[test]
    fn scale_fails_when_source_strength_missing_for_time_gap() {
        let q = quantity(&[2.0], "eV / simulated_particle");
        let result = scale(
            q,
            &units("eV / second"),
            &Auxiliaries::default(),
            &registry(),
        );
        assert!(matches!(
            result,
            Err(EngineError::MissingAuxiliaryParameter {
                parameter: "source_strength",
                axis: Axis::Time,
                difference: 1,
            })
        ));
    }

    #[test]
    fn scale_divides_by_source_strength_when_removing_time() {
        let q = quantity(&[10.0], "eV / second");
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::Unspecified(5.0)),
            ..Default::default()
        };
        let scaled = scale(q, &units("eV / simulated_particle"), &aux, &registry()).unwrap();
        assert_close(scaled.values()[0], 2.0);
    }

    #[test]
    fn scale_uses_source_strength_per_pulse_for_pulse_gap() {
        let q = quantity(&[3.0], "neutron * cm / simulated_particle");
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::Unspecified(1e3)),
            ..Default::default()
        };
        let scaled = scale(q, &units("neutron * cm / pulse"), &aux, &registry()).unwrap();
        assert_close(scaled.values()[0], 3e3);

        let missing = scale(
            quantity(&[3.0], "cm / simulated_particle"),
            &units("cm / pulse"),
            &Auxiliaries::default(),
            &registry(),
        );
        assert!(matches!(
            missing,
            Err(EngineError::MissingAuxiliaryParameter {
                axis: Axis::Pulse,
                ..
            })
        ));
    }

    #[test]
    fn scale_rejects_per_second_rate_for_pulse_gap() {
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::PerSecond(3.55e20)),
            ..Default::default()
        };
        let result = scale(
            quantity(&[17.58e6], "eV / simulated_particle"),
            &units("eV / pulse"),
            &aux,
            &registry(),
        );
        assert!(matches!(
            result,
            Err(EngineError::MissingAuxiliaryParameter {
                parameter: "source_strength",
                axis: Axis::Pulse,
                difference: 1,
            })
        ));
    }

    #[test]
    fn scale_rejects_per_pulse_rate_for_time_gap() {
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::PerPulse(1e18)),
            ..Default::default()
        };
        let result = scale(
            quantity(&[1.0], "eV / simulated_particle"),
            &units("watt"),
            &aux,
            &registry(),
        );
        assert!(matches!(
            result,
            Err(EngineError::MissingAuxiliaryParameter {
                parameter: "source_strength",
                axis: Axis::Time,
                ..
            })
        ));

        let per_pulse = scale(
            quantity(&[2.0], "eV / simulated_particle"),
            &units("eV / pulse"),
            &aux,
            &registry(),
        )
        .unwrap();
        assert_close(per_pulse.values()[0], 2e18);
    }

    #[test]
    fn source_strength_matches_only_its_own_axis() {
        assert_eq!(SourceStrength::PerSecond(2.0).for_axis(Axis::Time), Some(2.0));
        assert_eq!(SourceStrength::PerSecond(2.0).for_axis(Axis::Pulse), None);
        assert_eq!(SourceStrength::PerPulse(2.0).for_axis(Axis::Time), None);
        assert_eq!(SourceStrength::Unspecified(2.0).for_axis(Axis::Pulse), Some(2.0));
        assert_eq!(SourceStrength::Unspecified(2.0).for_axis(Axis::Length), None);
    }

    #[test]
    fn scale_closes_volume_gap_with_explicit_volume() {
        let q = quantity(&[200.0, 50.0], "centimeter / simulated_particle");
        let aux = Auxiliaries {
            volume: Some(100.0),
            ..Default::default()
        };
        let scaled = scale(q, &units("1 / centimeter ** 2"), &aux, &registry()).unwrap();
        assert_eq!(scaled.units().to_string(), "1 / centimeter ** 2");
        assert_close(scaled.values()[0], 2.0);
        assert_close(scaled.values()[1], 0.5);
    }

    #[test]
    fn scale_falls_back_to_mesh_voxel_volume() {
        let mesh = Mesh::regular([0.0; 3], [10.0, 10.0, 10.0], [2, 2, 2]);
        let aux = Auxiliaries {
            mesh: Some(&mesh),
            ..Default::default()
        };
        let scaled = scale(
            quantity(&[250.0], "centimeter / simulated_particle"),
            &units("1 / centimeter ** 2"),
            &aux,
            &registry(),
        )
        .unwrap();
        assert_close(scaled.values()[0], 2.0);
    }

    #[test]
    fn scale_rejects_volume_fallback_on_non_regular_mesh() {
        let mesh = Mesh::Unstructured { element_count: 8 };
        let aux = Auxiliaries {
            mesh: Some(&mesh),
            ..Default::default()
        };
        let result = scale(
            quantity(&[1.0], "centimeter / simulated_particle"),
            &units("1 / centimeter ** 2"),
            &aux,
            &registry(),
        );
        assert!(matches!(result, Err(EngineError::Geometry { .. })));
    }

    #[test]
    fn scale_fails_naming_volume_without_mesh() {
        let result = scale(
            quantity(&[1.0], "centimeter / simulated_particle"),
            &units("1 / centimeter ** 2"),
            &Auxiliaries::default(),
            &registry(),
        );
        assert!(matches!(
            result,
            Err(EngineError::MissingAuxiliaryParameter {
                parameter: "volume",
                ..
            })
        ));
    }

    #[test]
    fn scale_leaves_non_volume_length_gaps_to_final_conversion() {
        let aux = Auxiliaries {
            volume: Some(10.0),
            ..Default::default()
        };
        let result = scale(
            quantity(&[1.0], "centimeter / simulated_particle"),
            &units("1 / centimeter"),
            &aux,
            &registry(),
        );
        assert!(matches!(result, Err(EngineError::IncompatibleUnit { .. })));
    }

    #[test]
    fn scale_converts_energy_to_displacements_per_atom() {
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::PerSecond(100.0)),
            atoms: Some(4.0),
            energy_per_displacement: Some(80.0),
            ..Default::default()
        };
        let per_second = scale(
            quantity(&[160.0], "eV / simulated_particle"),
            &units("displacements / atom / second"),
            &aux,
            &registry(),
        )
        .unwrap();
        assert_close(per_second.values()[0], 160.0 / 80.0 * 100.0 / 4.0);

        let per_year = scale(
            quantity(&[160.0], "eV / simulated_particle"),
            &units("displacements / atom / year"),
            &aux,
            &registry(),
        )
        .unwrap();
        assert_close(per_year.values()[0], per_second.values()[0] * SECONDS_PER_YEAR);
    }

    #[test]
    fn scale_requires_energy_per_displacement_for_displacement_gap() {
        let result = scale(
            quantity(&[1.0], "eV / simulated_particle"),
            &units("displacements / simulated_particle"),
            &Auxiliaries::default(),
            &registry(),
        );
        assert!(matches!(
            result,
            Err(EngineError::MissingAuxiliaryParameter {
                parameter: "energy_per_displacement",
                axis: Axis::Displacement,
                ..
            })
        ));
    }

    #[test]
    fn scale_multiplies_by_atoms_when_target_drops_per_atom() {
        let aux = Auxiliaries {
            atoms: Some(1e3),
            ..Default::default()
        };
        let scaled = scale(
            quantity(&[2.0], "displacements / atom"),
            &units("displacements"),
            &aux,
            &registry(),
        )
        .unwrap();
        assert_close(scaled.values()[0], 2e3);
    }

    #[test]
    fn scale_reports_unreachable_targets_as_incompatible() {
        let result = scale(
            quantity(&[1.0], "centimeter / simulated_particle"),
            &units("gram"),
            &Auxiliaries::default(),
            &registry(),
        );
        assert!(matches!(result, Err(EngineError::IncompatibleUnit { .. })));
    }

    #[test]
    fn scale_is_idempotent_for_identical_inputs() {
        let aux = Auxiliaries {
            source_strength: Some(SourceStrength::Unspecified(3e17)),
            volume: Some(12.5),
            ..Default::default()
        };
        let target = units("neutron / cm ** 2 / s");
        let run = || {
            scale(
                quantity(&[0.25, 0.75], "neutron * cm / simulated_particle"),
                &target,
                &aux,
                &registry(),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }
}
