use super::error::EngineError;
use crate::core::models::tally::{FilterKind, Tally};
use crate::core::units::registry::UnitRegistry;
use crate::core::units::unit::Unit;
use phf::phf_map;
use tracing::debug;

/// Unit every raw tally is normalised to.
pub const SIMULATED_PARTICLE: &str = "simulated_particle";
/// Units of the spectral energy axis and of recorded energy bin edges.
pub const ENERGY_AXIS_UNITS: &str = "electron_volt";
/// Units attached to energy-function (flux-to-dose coefficient) filters.
pub const DOSE_COEFFICIENT_UNITS: &str = "picosievert * centimeter ** 2";
const GENERIC_PARTICLE: &str = "particle";

#[derive(Debug, Clone, Copy)]
struct ScoreTemplate {
    /// Unit per simulated particle, before any particle weighting.
    numerator: &'static str,
    /// Whether the particle-type filter contributes a particle factor.
    counts_particles: bool,
}

static SCORE_UNITS: phf::Map<&'static str, ScoreTemplate> = phf_map! {
    "current" => ScoreTemplate { numerator: "1", counts_particles: true },
    "flux" => ScoreTemplate { numerator: "centimeter", counts_particles: true },
    "heating" => ScoreTemplate { numerator: "electron_volt", counts_particles: false },
    "heating-local" => ScoreTemplate { numerator: "electron_volt", counts_particles: false },
    "damage-energy" => ScoreTemplate { numerator: "electron_volt", counts_particles: false },
};

fn supported_scores() -> String {
    let mut scores: Vec<&str> = SCORE_UNITS.keys().copied().collect();
    scores.sort_unstable();
    scores.join(", ")
}

/// Which processing path the classification serves. The path decides how an
/// energy-function filter is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    Plain,
    Dose,
    Spectrum,
}

impl ClassificationMode {
    fn operation(self) -> &'static str {
        match self {
            ClassificationMode::Plain => "process_tally",
            ClassificationMode::Dose => "process_dose_tally",
            ClassificationMode::Spectrum => "process_spectra_tally",
        }
    }
}

/// Base units of a tally's results.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitSpec {
    Single(Unit),
    /// Energy-binned results: the energy axis first, then the scored quantity.
    Spectral { energy: Unit, quantity: Unit },
}

impl UnitSpec {
    pub fn quantity(&self) -> &Unit {
        match self {
            UnitSpec::Single(unit) => unit,
            UnitSpec::Spectral { quantity, .. } => quantity,
        }
    }
}

/// Infers the base units of `tally` from its score and filters.
pub fn classify(
    tally: &Tally,
    mode: ClassificationMode,
    registry: &UnitRegistry,
) -> Result<UnitSpec, EngineError> {
    let score = match tally.scores.as_slice() {
        [score] => score.as_str(),
        scores => {
            return Err(EngineError::UnsupportedScore {
                tally: tally.to_string(),
                score: scores.join(", "),
                supported: format!("a single one of {}", supported_scores()),
            });
        }
    };
    let template = SCORE_UNITS
        .get(score)
        .ok_or_else(|| EngineError::UnsupportedScore {
            tally: tally.to_string(),
            score: score.to_string(),
            supported: supported_scores(),
        })?;

    let has_response = tally.contains_filter(FilterKind::EnergyFunction);
    match mode {
        ClassificationMode::Dose if !has_response => {
            return Err(EngineError::MissingFilter {
                tally: tally.to_string(),
                kind: FilterKind::EnergyFunction,
                operation: mode.operation(),
            });
        }
        ClassificationMode::Plain if has_response => {
            return Err(EngineError::ConflictingFilter {
                tally: tally.to_string(),
                kind: FilterKind::EnergyFunction,
                operation: mode.operation(),
                hint: "its coefficient units are unknown; use process_dose_tally",
            });
        }
        ClassificationMode::Spectrum if has_response => {
            return Err(EngineError::ConflictingFilter {
                tally: tally.to_string(),
                kind: FilterKind::EnergyFunction,
                operation: mode.operation(),
                hint: "energy-function and energy filters cannot be combined in a spectrum",
            });
        }
        ClassificationMode::Spectrum if !tally.contains_filter(FilterKind::Energy) => {
            return Err(EngineError::MissingFilter {
                tally: tally.to_string(),
                kind: FilterKind::Energy,
                operation: mode.operation(),
            });
        }
        _ => {}
    }

    let mut quantity = registry.parse_units(template.numerator)?;
    if template.counts_particles {
        quantity = quantity.try_mul(&particle_units(tally, registry)?)?;
    }
    quantity = quantity.try_div(&registry.unit(SIMULATED_PARTICLE)?)?;
    if mode == ClassificationMode::Dose {
        quantity = quantity.try_mul(&registry.parse_units(DOSE_COEFFICIENT_UNITS)?)?;
    }

    let spec = if tally.contains_filter(FilterKind::Energy) {
        UnitSpec::Spectral {
            energy: registry.unit(ENERGY_AXIS_UNITS)?,
            quantity,
        }
    } else {
        UnitSpec::Single(quantity)
    };
    debug!(tally = %tally, score, units = %spec.quantity(), "Classified tally");
    Ok(spec)
}

/// Product of all particle types named by particle filters, or the generic
/// `particle` unit when the tally has none.
fn particle_units(tally: &Tally, registry: &UnitRegistry) -> Result<Unit, EngineError> {
    let particles = tally.particles();
    if particles.is_empty() {
        return Ok(registry.unit(GENERIC_PARTICLE)?);
    }
    particles.iter().try_fold(Unit::dimensionless(), |acc, name| {
        Ok(acc.try_mul(&registry.unit(name)?)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::results::ResultsTable;
    use crate::core::models::tally::Filter;

    fn tally(score: &str, filters: Vec<Filter>) -> Tally {
        Tally::new(
            3,
            "under test",
            vec![score.to_string()],
            filters,
            ResultsTable::from_mean(vec![1.0], Some(vec![0.1])).unwrap(),
        )
    }

    fn energy_filter() -> Filter {
        Filter::Energy {
            edges: vec![0.0, 1e6, 2e7],
        }
    }

    fn response_filter() -> Filter {
        Filter::EnergyFunction {
            energy: vec![1.0, 1e6],
            response: vec![3.0, 400.0],
        }
    }

    fn classify_plain(t: &Tally) -> Result<UnitSpec, EngineError> {
        classify(t, ClassificationMode::Plain, &UnitRegistry::default())
    }

    #[test]
    fn heating_scores_are_electron_volts_per_simulated_particle() {
        for score in ["heating", "heating-local", "damage-energy"] {
            let spec = classify_plain(&tally(score, vec![])).unwrap();
            assert_eq!(
                spec.quantity().to_string(),
                "electron_volt / simulated_particle"
            );
        }
    }

    #[test]
    fn flux_defaults_to_generic_particle() {
        let spec = classify_plain(&tally("flux", vec![])).unwrap();
        assert_eq!(
            spec.quantity().to_string(),
            "centimeter * particle / simulated_particle"
        );
    }

    #[test]
    fn flux_is_weighted_by_every_filtered_particle_type() {
        let filters = vec![Filter::Particle {
            particles: vec!["neutron".into(), "photon".into()],
        }];
        let spec = classify_plain(&tally("flux", filters)).unwrap();
        assert_eq!(
            spec.quantity().to_string(),
            "centimeter * neutron * photon / simulated_particle"
        );
    }

    #[test]
    fn current_carries_no_length() {
        let filters = vec![Filter::Particle {
            particles: vec!["neutron".into()],
        }];
        let spec = classify_plain(&tally("current", filters)).unwrap();
        assert_eq!(spec.quantity().to_string(), "neutron / simulated_particle");
    }

    #[test]
    fn unknown_scores_are_rejected() {
        let result = classify_plain(&tally("absorption", vec![]));
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedScore { ref score, .. }) if score == "absorption"
        ));
    }

    #[test]
    fn multiple_scores_are_rejected() {
        let mut t = tally("flux", vec![]);
        t.scores.push("heating".into());
        assert!(matches!(
            classify_plain(&t),
            Err(EngineError::UnsupportedScore { .. })
        ));
    }

    #[test]
    fn energy_filter_yields_energy_axis_first() {
        let spec = classify_plain(&tally("heating", vec![energy_filter()])).unwrap();
        match spec {
            UnitSpec::Spectral { energy, quantity } => {
                assert_eq!(energy.to_string(), "electron_volt");
                assert_eq!(quantity.to_string(), "electron_volt / simulated_particle");
            }
            other => panic!("expected spectral units, got {:?}", other),
        }
    }

    #[test]
    fn dose_mode_adds_dose_coefficient_units() {
        let spec = classify(
            &tally("flux", vec![response_filter()]),
            ClassificationMode::Dose,
            &UnitRegistry::default(),
        )
        .unwrap();
        assert_eq!(
            spec.quantity().to_string(),
            "centimeter ** 3 * particle * picosievert / simulated_particle"
        );
    }

    #[test]
    fn dose_mode_requires_energy_function_filter() {
        let result = classify(
            &tally("flux", vec![]),
            ClassificationMode::Dose,
            &UnitRegistry::default(),
        );
        assert!(matches!(
            result,
            Err(EngineError::MissingFilter {
                kind: FilterKind::EnergyFunction,
                ..
            })
        ));
    }

    #[test]
    fn plain_mode_rejects_energy_function_filter() {
        let result = classify_plain(&tally("flux", vec![response_filter()]));
        assert!(matches!(
            result,
            Err(EngineError::ConflictingFilter {
                kind: FilterKind::EnergyFunction,
                ..
            })
        ));
    }

    #[test]
    fn spectrum_mode_requires_energy_filter_without_response() {
        let registry = UnitRegistry::default();
        let missing = classify(&tally("flux", vec![]), ClassificationMode::Spectrum, &registry);
        assert!(matches!(
            missing,
            Err(EngineError::MissingFilter {
                kind: FilterKind::Energy,
                ..
            })
        ));

        let both = classify(
            &tally("flux", vec![energy_filter(), response_filter()]),
            ClassificationMode::Spectrum,
            &registry,
        );
        assert!(matches!(both, Err(EngineError::ConflictingFilter { .. })));
    }
}
