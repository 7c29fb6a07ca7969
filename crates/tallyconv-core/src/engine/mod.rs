//! # Engine Module
//!
//! Unit inference and dimensional scaling for tally results.
//!
//! ## Overview
//!
//! The engine answers two questions about a tally. First, what are the base units of
//! its raw results? The [`classifier`] works this out from the score and filter set.
//! Second, how do those units become the ones the caller asked for? The [`scaling`]
//! engine measures the exponent gap on each correctable axis (displacement, time,
//! pulse, length, atom), closes it with the matching auxiliary value, then performs a
//! final checked conversion.
//!
//! ## Architecture
//!
//! - **Classification** ([`classifier`]) - Score lookup table and filter-driven unit templates
//! - **Scaling** ([`scaling`]) - Per-axis gap detection and correction
//! - **Configuration** ([`config`]) - Per-call auxiliary inputs and conversion requests
//! - **Error Handling** ([`error`]) - The engine's error taxonomy
//!
//! All operations are stateless; the unit registry is passed in by the caller and never
//! mutated.

pub mod classifier;
pub mod config;
pub mod error;
pub mod scaling;
