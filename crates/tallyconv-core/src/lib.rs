//! # tallyconv
//!
//! Unit inference and dimensional scaling for Monte Carlo transport tallies.
//!
//! Raw tally results are expressed per simulated source particle. This library works
//! out what physical units a tally's numbers actually carry and converts them into
//! whatever the caller asks for (sievert per hour, displacements per atom per year,
//! watts), using source strengths, volumes and material data to bridge the dimensions
//! a plain unit conversion cannot.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: the dimensional-quantity
//!   system (`units`), tally/mesh/material models, fusion source yields, mesh geometry
//!   and tally file I/O.
//!
//! - **[`engine`]: The Logic Core.** The score classifier, the multi-axis scaling engine,
//!   conversion requests and the error taxonomy.
//!
//! - **[`workflows`]: The Public API.** `process_tally`, `process_dose_tally`,
//!   `process_spectra_tally` and `process_damage_energy_tally`, each returning values and
//!   standard deviations in identical units.
//!
//! ```ignore
//! use tallyconv::core::io::tally_file::load_tally;
//! use tallyconv::core::units::registry::UnitRegistry;
//! use tallyconv::engine::config::{ConversionRequest, ScalingInputs};
//! use tallyconv::workflows::process::process_tally;
//!
//! let registry = UnitRegistry::default();
//! let tally = load_tally(Path::new("tallies/blanket_heating.toml"))?;
//! let inputs = ScalingInputs::builder().fusion_power(1e9).build()?;
//! let request = ConversionRequest::to_units("watt").with_inputs(inputs);
//! let heating = process_tally(&tally, &request, &registry)?;
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
