use super::dimension::{Dimension, Dimensionality};
use super::error::UnitError;
use super::parser::parse_expression;
use super::quantity::Quantity;
use super::unit::Unit;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
struct Definition {
    scale: f64,
    dimensionality: Dimensionality,
}

const fn def(scale: f64, dimensionality: Dimensionality) -> Definition {
    Definition {
        scale,
        dimensionality,
    }
}

const LENGTH: Dimensionality = Dimensionality::of(Dimension::Length);
const MASS: Dimensionality = Dimensionality::of(Dimension::Mass);
const TIME: Dimensionality = Dimensionality::of(Dimension::Time);
const ENERGY: Dimensionality = Dimensionality::new(2, 1, -2, 0, 0, 0);
const POWER: Dimensionality = Dimensionality::new(2, 1, -3, 0, 0, 0);
const ABSORBED_DOSE: Dimensionality = Dimensionality::new(2, 0, -2, 0, 0, 0);
const COUNT: Dimensionality = Dimensionality::DIMENSIONLESS;

const ELECTRON_VOLT_IN_JOULE: f64 = 1.602_176_634e-19;
const SECONDS_PER_DAY: f64 = 86_400.0;

static UNITS: Map<&'static str, Definition> = phf_map! {
    // --- Length, area, volume ---
    "meter" => def(1.0, LENGTH),
    "barn" => def(1e-28, Dimensionality::new(2, 0, 0, 0, 0, 0)),
    "liter" => def(1e-3, Dimensionality::new(3, 0, 0, 0, 0, 0)),

    // --- Mass ---
    "gram" => def(1e-3, MASS),

    // --- Time ---
    "second" => def(1.0, TIME),
    "minute" => def(60.0, TIME),
    "hour" => def(3_600.0, TIME),
    "day" => def(SECONDS_PER_DAY, TIME),
    "week" => def(7.0 * SECONDS_PER_DAY, TIME),
    "year" => def(365.25 * SECONDS_PER_DAY, TIME),

    // --- Energy and power ---
    "joule" => def(1.0, ENERGY),
    "electron_volt" => def(ELECTRON_VOLT_IN_JOULE, ENERGY),
    "watt" => def(1.0, POWER),

    // --- Dose ---
    "sievert" => def(1.0, ABSORBED_DOSE),
    "gray" => def(1.0, ABSORBED_DOSE),
    "rem" => def(1e-2, ABSORBED_DOSE),

    // --- Neutronics base dimensions ---
    "pulse" => def(1.0, Dimensionality::of(Dimension::Pulse)),
    "atom" => def(1.0, Dimensionality::of(Dimension::Atom)),
    "displacements" => def(1.0, Dimensionality::of(Dimension::Displacement)),

    // --- Counting units (dimensionless, kept by name) ---
    "simulated_particle" => def(1.0, COUNT),
    "source_particle" => def(1.0, COUNT),
    "particle" => def(1.0, COUNT),
    "neutron" => def(1.0, COUNT),
    "photon" => def(1.0, COUNT),
    "electron" => def(1.0, COUNT),
    "positron" => def(1.0, COUNT),
    "reactions" => def(1.0, COUNT),
};

static ALIASES: Map<&'static str, &'static str> = phf_map! {
    "m" => "meter",
    "metre" => "meter",
    "b" => "barn",
    "L" => "liter",
    "l" => "liter",
    "litre" => "liter",
    "g" => "gram",
    "s" => "second",
    "sec" => "second",
    "min" => "minute",
    "h" => "hour",
    "hr" => "hour",
    "d" => "day",
    "yr" => "year",
    "J" => "joule",
    "eV" => "electron_volt",
    "W" => "watt",
    "Sv" => "sievert",
    "Gy" => "gray",
    "reaction" => "reactions",
    "displacement" => "displacements",
    "gamma" => "photon",
};

/// SI prefixes as (spelling, canonical long form, factor). Long spellings come
/// first so that "megaelectron_volt" never matches the "m" prefix.
static PREFIXES: &[(&str, &str, f64)] = &[
    ("exa", "exa", 1e18),
    ("peta", "peta", 1e15),
    ("tera", "tera", 1e12),
    ("giga", "giga", 1e9),
    ("mega", "mega", 1e6),
    ("kilo", "kilo", 1e3),
    ("hecto", "hecto", 1e2),
    ("deca", "deca", 1e1),
    ("deci", "deci", 1e-1),
    ("centi", "centi", 1e-2),
    ("milli", "milli", 1e-3),
    ("micro", "micro", 1e-6),
    ("nano", "nano", 1e-9),
    ("pico", "pico", 1e-12),
    ("femto", "femto", 1e-15),
    ("atto", "atto", 1e-18),
    ("da", "deca", 1e1),
    ("E", "exa", 1e18),
    ("P", "peta", 1e15),
    ("T", "tera", 1e12),
    ("G", "giga", 1e9),
    ("M", "mega", 1e6),
    ("k", "kilo", 1e3),
    ("h", "hecto", 1e2),
    ("d", "deci", 1e-1),
    ("c", "centi", 1e-2),
    ("m", "milli", 1e-3),
    ("u", "micro", 1e-6),
    ("µ", "micro", 1e-6),
    ("n", "nano", 1e-9),
    ("p", "pico", 1e-12),
    ("f", "femto", 1e-15),
    ("a", "atto", 1e-18),
];

/// An immutable set of unit definitions used to parse unit expressions.
///
/// The built-in definitions cover SI mechanics, dose, and the neutronics
/// pseudo-units. Extra definitions can only be added through
/// [`UnitRegistryBuilder`], so a built registry never changes and can be shared
/// freely between conversions.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    custom: HashMap<String, Definition>,
    custom_aliases: HashMap<String, String>,
}

impl UnitRegistry {
    pub fn builder() -> UnitRegistryBuilder {
        UnitRegistryBuilder::default()
    }

    fn lookup_exact(&self, name: &str) -> Option<(String, Definition)> {
        if let Some(definition) = self.custom.get(name) {
            return Some((name.to_string(), *definition));
        }
        if let Some(canonical) = self.custom_aliases.get(name) {
            return self
                .custom
                .get(canonical)
                .map(|d| (canonical.clone(), *d));
        }
        if let Some(definition) = UNITS.get(name) {
            return Some((name.to_string(), *definition));
        }
        ALIASES
            .get(name)
            .and_then(|canonical| UNITS.get(canonical).map(|d| (canonical.to_string(), *d)))
    }

    fn lookup_unprefixed(&self, name: &str) -> Option<(String, Definition)> {
        self.lookup_exact(name).or_else(|| {
            // One-letter singulars are symbols: "ms" is a millisecond, not meters.
            name.strip_suffix('s')
                .filter(|singular| singular.chars().count() >= 2)
                .and_then(|singular| self.lookup_exact(singular))
        })
    }

    fn lookup(&self, name: &str) -> Option<(String, Definition)> {
        if let Some(found) = self.lookup_unprefixed(name) {
            return Some(found);
        }
        PREFIXES.iter().find_map(|(spelling, long, factor)| {
            let rest = name.strip_prefix(spelling)?;
            if rest.is_empty() {
                return None;
            }
            let (canonical, definition) = self.lookup_unprefixed(rest)?;
            Some((
                format!("{}{}", long, canonical),
                def(factor * definition.scale, definition.dimensionality),
            ))
        })
    }

    /// Resolves a single unit name, alias, plural or prefixed form.
    pub fn unit(&self, name: &str) -> Result<Unit, UnitError> {
        self.lookup(name)
            .map(|(canonical, d)| Unit::named(canonical, d.scale, d.dimensionality))
            .ok_or_else(|| UnitError::UnknownUnit(name.to_string()))
    }

    /// Parses a full unit expression such as `"MeV / atom / second"`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::UnexpectedFactor`] if the expression carries a
    /// numeric factor other than 1 (`"2 cm"`), besides the usual parse and
    /// lookup failures.
    pub fn parse_units(&self, expression: &str) -> Result<Unit, UnitError> {
        let (factor, unit) = parse_expression(expression, |name| self.unit(name))?;
        if (factor - 1.0).abs() > f64::EPSILON {
            return Err(UnitError::UnexpectedFactor {
                expression: expression.to_string(),
                factor,
            });
        }
        Ok(unit)
    }

    /// A scalar quantity in the given units.
    pub fn quantity(&self, value: f64, expression: &str) -> Result<Quantity, UnitError> {
        Ok(Quantity::scalar(value, self.parse_units(expression)?))
    }
}

#[derive(Debug, Error)]
pub enum RegistryLoadError {
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
    #[error("Invalid unit definition in '{path}': {source}")]
    Definition { path: String, source: UnitError },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionEntry {
    /// Expression this unit is a multiple of; omitted for counting units.
    base: Option<String>,
    #[serde(default = "default_factor")]
    factor: f64,
    #[serde(default)]
    aliases: Vec<String>,
}

fn default_factor() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    #[serde(default)]
    units: HashMap<String, DefinitionEntry>,
}

#[derive(Debug, Default)]
pub struct UnitRegistryBuilder {
    registry: UnitRegistry,
}

impl UnitRegistryBuilder {
    fn check_free(&self, name: &str) -> Result<(), UnitError> {
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(UnitError::InvalidDefinition {
                name: name.to_string(),
                reason: "names must be non-empty identifiers".into(),
            });
        }
        if self.registry.lookup_exact(name).is_some() {
            return Err(UnitError::InvalidDefinition {
                name: name.to_string(),
                reason: "name is already defined".into(),
            });
        }
        Ok(())
    }

    /// Defines `name` as `factor` times the unit expression `base`.
    pub fn define(
        mut self,
        name: &str,
        factor: f64,
        base: &str,
        aliases: &[&str],
    ) -> Result<Self, UnitError> {
        self.check_free(name)?;
        let base_unit = self.registry.parse_units(base)?;
        self.insert(
            name,
            def(factor * base_unit.scale(), base_unit.dimensionality()),
            aliases,
        )?;
        Ok(self)
    }

    /// Defines a dimensionless unit that is tracked by name only.
    pub fn define_counting_unit(
        mut self,
        name: &str,
        aliases: &[&str],
    ) -> Result<Self, UnitError> {
        self.check_free(name)?;
        self.insert(name, def(1.0, COUNT), aliases)?;
        Ok(self)
    }

    fn insert(
        &mut self,
        name: &str,
        definition: Definition,
        aliases: &[&str],
    ) -> Result<(), UnitError> {
        for alias in aliases {
            self.check_free(alias)?;
        }
        self.registry.custom.insert(name.to_string(), definition);
        for alias in aliases {
            self.registry
                .custom_aliases
                .insert(alias.to_string(), name.to_string());
        }
        Ok(())
    }

    /// Adds every definition from a TOML document of the form
    ///
    /// ```toml
    /// [units.shot]
    /// base = "pulse"
    /// aliases = ["shots"]
    ///
    /// [units.triton]   # no base: a counting unit
    /// ```
    pub fn with_definitions_str(
        self,
        content: &str,
        origin: &str,
    ) -> Result<Self, RegistryLoadError> {
        let file: DefinitionFile = toml::from_str(content).map_err(|e| RegistryLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;

        // Counting units first so that derived definitions may refer to them.
        let mut entries: Vec<(String, DefinitionEntry)> = file.units.into_iter().collect();
        entries.sort_by(|a, b| (a.1.base.is_some(), &a.0).cmp(&(b.1.base.is_some(), &b.0)));

        let mut builder = self;
        for (name, entry) in entries {
            let aliases: Vec<&str> = entry.aliases.iter().map(String::as_str).collect();
            let result = match &entry.base {
                Some(base) => builder.define(&name, entry.factor, base, &aliases),
                None => builder.define_counting_unit(&name, &aliases),
            };
            builder = result.map_err(|e| RegistryLoadError::Definition {
                path: origin.to_string(),
                source: e,
            })?;
        }
        Ok(builder)
    }

    pub fn with_definitions_file(self, path: &Path) -> Result<Self, RegistryLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        self.with_definitions_str(&content, &path.to_string_lossy())
    }

    pub fn build(self) -> UnitRegistry {
        self.registry
    }
}
