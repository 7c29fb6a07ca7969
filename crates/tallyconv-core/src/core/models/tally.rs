use super::mesh::Mesh;
use super::results::ResultsTable;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Energy,
    Mesh,
    Cell,
    Particle,
    EnergyFunction,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::Energy => "energy",
            FilterKind::Mesh => "mesh",
            FilterKind::Cell => "cell",
            FilterKind::Particle => "particle",
            FilterKind::EnergyFunction => "energy-function",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Energy bin edges in eV; `n` edges define `n - 1` bins.
    Energy { edges: Vec<f64> },
    Mesh { mesh: Mesh },
    Cell { cells: Vec<u32> },
    Particle { particles: Vec<String> },
    /// Energy-dependent response (e.g. flux-to-dose coefficients). The units of
    /// `response` are not recorded by the transport code.
    EnergyFunction { energy: Vec<f64>, response: Vec<f64> },
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Energy { .. } => FilterKind::Energy,
            Filter::Mesh { .. } => FilterKind::Mesh,
            Filter::Cell { .. } => FilterKind::Cell,
            Filter::Particle { .. } => FilterKind::Particle,
            Filter::EnergyFunction { .. } => FilterKind::EnergyFunction,
        }
    }

    /// Number of result bins this filter contributes. Energy functions weight
    /// scores without binning them.
    pub fn bin_count(&self) -> usize {
        match self {
            Filter::Energy { edges } => edges.len().saturating_sub(1),
            Filter::Mesh { mesh } => mesh.voxel_count(),
            Filter::Cell { cells } => cells.len(),
            Filter::Particle { particles } => particles.len(),
            Filter::EnergyFunction { .. } => 1,
        }
    }
}

/// A single tally read back from a transport run.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub id: u32,
    pub name: String,
    pub scores: Vec<String>,
    pub filters: Vec<Filter>,
    pub results: ResultsTable,
}

impl Tally {
    pub fn new(
        id: u32,
        name: &str,
        scores: Vec<String>,
        filters: Vec<Filter>,
        results: ResultsTable,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            scores,
            filters,
            results,
        }
    }

    pub fn find_filter(&self, kind: FilterKind) -> Option<&Filter> {
        self.filters.iter().find(|f| f.kind() == kind)
    }

    pub fn contains_filter(&self, kind: FilterKind) -> bool {
        self.find_filter(kind).is_some()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.filters.iter().find_map(|f| match f {
            Filter::Mesh { mesh } => Some(mesh),
            _ => None,
        })
    }

    /// Lower bin edges of the first energy filter.
    pub fn energy_lower_edges(&self) -> Option<&[f64]> {
        self.filters.iter().find_map(|f| match f {
            Filter::Energy { edges } if !edges.is_empty() => Some(&edges[..edges.len() - 1]),
            _ => None,
        })
    }

    /// Lower energy of each results row. Rows follow filter order with the last
    /// filter varying fastest, so one energy bin spans the product of the bin
    /// counts of every filter after it. `None` when there is no energy filter or
    /// the row count does not fit those bins.
    pub fn row_energies(&self) -> Option<Vec<f64>> {
        let lower = self.energy_lower_edges()?;
        let position = self
            .filters
            .iter()
            .position(|f| matches!(f, Filter::Energy { edges } if !edges.is_empty()))?;
        let stride: usize = self.filters[position + 1..]
            .iter()
            .map(Filter::bin_count)
            .product();
        let block = lower.len() * stride;
        let rows = self.results.rows();
        if block == 0 || rows % block != 0 {
            return None;
        }
        Some((0..rows).map(|row| lower[(row / stride) % lower.len()]).collect())
    }

    /// Distinct particle names across all particle filters, in first-seen order.
    pub fn particles(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for filter in &self.filters {
            if let Filter::Particle { particles } = filter {
                for particle in particles {
                    if !seen.contains(&particle.as_str()) {
                        seen.push(particle);
                    }
                }
            }
        }
        seen
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tally {} '{}'", self.id, self.name)
    }
}
