//! # Units Module
//!
//! A compact dimensional-quantity system tailored to neutronics post-processing.
//!
//! ## Overview
//!
//! Quantities carry a [`unit::Unit`], a product of named units raised to integer powers.
//! Every unit resolves to a [`dimension::Dimensionality`] over six base axes: length,
//! mass and time, plus the neutronics pseudo-dimensions pulse, atom and displacement.
//! Counting units such as `simulated_particle`, `neutron` or `reactions` are kept in
//! unit expressions by name but carry no dimension, so they never block a conversion.
//!
//! ## Key Components
//!
//! - [`registry`] - Immutable registry of unit names, aliases and SI prefixes
//! - [`parser`] - Unit expression parsing (`"sievert cm ** 2 / second"`)
//! - [`quantity`] - Values tagged with units, with conversion and arithmetic
//! - [`dimension`] - Base axes and exponent vectors
//!
//! ```ignore
//! use tallyconv::core::units::registry::UnitRegistry;
//!
//! let registry = UnitRegistry::default();
//! let heating = registry.quantity(3.2e6, "eV / simulated_particle")?;
//! let in_mev = heating.to(&registry.parse_units("MeV / simulated_particle")?)?;
//! ```

pub mod dimension;
pub mod error;
pub(crate) mod parser;
pub mod quantity;
pub mod registry;
pub mod unit;
