//! Reads tallies from disk.
//!
//! A tally is stored as a small TOML descriptor (id, scores and tagged filters) next
//! to a CSV export of its results dataframe. Only numeric result columns are kept.

pub mod tally_file;
