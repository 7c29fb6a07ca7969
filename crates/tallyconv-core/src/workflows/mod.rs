//! # Workflows Module
//!
//! Entry points that turn a tally into physical quantities in the caller's units.
//!
//! ## Overview
//!
//! Each workflow classifies the tally, lifts its `mean` and `std. dev.` columns into
//! quantities, and runs both through the same scaling so they always end in identical
//! units. Multi-row mesh tallies are reshaped onto the voxel grid.
//!
//! ## Key Components
//!
//! - [`process::process_tally`] - Flux, current and heating tallies
//! - [`process::process_dose_tally`] - Tallies with flux-to-dose energy-function filters
//! - [`process::process_spectra_tally`] - Energy-binned tallies, returned with bin energies
//! - [`process::process_damage_energy_tally`] - Damage energy, with recombination and
//!   atom counts derived from a material
//! - [`process::process_tallies`] - Several tallies under one request

pub mod process;
