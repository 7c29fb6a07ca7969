use nalgebra::Point3;

/// Spatial mesh attached to a tally through a mesh filter. Coordinates are in
/// centimeters.
#[derive(Debug, Clone, PartialEq)]
pub enum Mesh {
    /// Axis-aligned box split into `dimension[0] × dimension[1] × dimension[2]`
    /// equally sized voxels.
    Regular {
        lower_left: Point3<f64>,
        upper_right: Point3<f64>,
        dimension: [usize; 3],
    },
    Cylindrical {
        r_grid: Vec<f64>,
        phi_grid: Vec<f64>,
        z_grid: Vec<f64>,
    },
    Unstructured {
        element_count: usize,
    },
}

impl Mesh {
    pub fn regular(lower_left: [f64; 3], upper_right: [f64; 3], dimension: [usize; 3]) -> Self {
        Mesh::Regular {
            lower_left: Point3::from(lower_left),
            upper_right: Point3::from(upper_right),
            dimension,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Mesh::Regular { .. } => "regular",
            Mesh::Cylindrical { .. } => "cylindrical",
            Mesh::Unstructured { .. } => "unstructured",
        }
    }

    pub fn voxel_count(&self) -> usize {
        let bins = |grid: &[f64]| grid.len().saturating_sub(1);
        match self {
            Mesh::Regular { dimension, .. } => dimension.iter().product(),
            Mesh::Cylindrical {
                r_grid,
                phi_grid,
                z_grid,
            } => bins(r_grid) * bins(phi_grid) * bins(z_grid),
            Mesh::Unstructured { element_count } => *element_count,
        }
    }
}
