//! # Core Models Module
//!
//! Read-only records describing what a transport run measured.
//!
//! ## Overview
//!
//! A [`tally::Tally`] bundles the recorded scores, the filters that bin or tag the
//! measurement, and a [`results::ResultsTable`] with one row per output bin. Filters
//! are a closed tagged enum, so every consumer matches on an explicit kind rather than
//! probing types at runtime.
//!
//! ## Key Components
//!
//! - [`tally`] - Tally, filters and filter kinds
//! - [`results`] - Named numeric result columns (`mean`, `std. dev.`, `energy low [eV]`)
//! - [`mesh`] - Regular, cylindrical and unstructured mesh descriptors
//! - [`material`] - Density and mean atomic mass, for atom-count derivation

pub mod material;
pub mod mesh;
pub mod results;
pub mod tally;
