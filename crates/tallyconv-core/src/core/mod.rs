//! # Core Module
//!
//! Stateless building blocks for turning raw tally results into physical quantities.
//!
//! ## Overview
//!
//! Nothing in this layer knows about the conversion pipeline. It provides a small
//! dimensional-quantity system, read-only tally records and the physics helpers the
//! engine draws its auxiliary factors from.
//!
//! ## Architecture
//!
//! - **Units** ([`units`]) - Dimensions, unit expressions, the unit registry and quantities
//! - **Tally Records** ([`models`]) - Tallies, filters, result tables, meshes and materials
//! - **Fusion Sources** ([`fusion`]) - Energy per reaction and source strength for DT/DD fuel
//! - **Geometry** ([`utils`]) - Voxel volume and grid shape of mesh tallies
//! - **File I/O** ([`io`]) - Tally descriptors and CSV result tables

pub mod fusion;
pub mod io;
pub mod models;
pub mod units;
pub mod utils;
