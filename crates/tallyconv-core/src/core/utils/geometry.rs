use crate::core::models::mesh::Mesh;
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Voxel volume is only defined for regular meshes, got a {0} mesh")]
    UnsupportedMesh(&'static str),
    #[error("Mesh axis {axis} has zero voxels")]
    EmptyAxis { axis: usize },
}

/// Volume of one voxel of a regular mesh, in cm³.
pub fn voxel_volume(mesh: &Mesh) -> Result<f64, GeometryError> {
    let Mesh::Regular {
        lower_left,
        upper_right,
        dimension,
    } = mesh
    else {
        return Err(GeometryError::UnsupportedMesh(mesh.kind_name()));
    };
    if let Some(axis) = dimension.iter().position(|&n| n == 0) {
        return Err(GeometryError::EmptyAxis { axis });
    }
    let extent: Vector3<f64> = (upper_right - lower_left).abs();
    let counts = Vector3::new(
        dimension[0] as f64,
        dimension[1] as f64,
        dimension[2] as f64,
    );
    Ok(extent.component_div(&counts).product())
}

/// Target shape for reshaping flat mesh results: voxel counts in (z, y, x)
/// order with extent-1 axes dropped. Other mesh kinds keep their voxel count
/// as a single axis.
pub fn voxel_grid_shape(mesh: &Mesh) -> Vec<usize> {
    match mesh {
        Mesh::Regular { dimension, .. } => dimension
            .iter()
            .rev()
            .copied()
            .filter(|&n| n != 1)
            .collect(),
        Mesh::Cylindrical {
            r_grid,
            phi_grid,
            z_grid,
        } => [z_grid, phi_grid, r_grid]
            .iter()
            .map(|grid| grid.len().saturating_sub(1))
            .filter(|&n| n != 1)
            .collect(),
        other => vec![other.voxel_count()],
    }
}
