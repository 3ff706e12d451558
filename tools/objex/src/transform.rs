//! Geometry transforms applied before export.

use glam::{Mat3, Mat4, Vec3};
use objex_shared::Mesh;

/// Copy of `mesh` (new identity, same name) with `matrix` applied.
///
/// Positions are transformed as points. Normals use the inverse-transpose
/// of the upper 3x3 and are renormalised, so non-uniform scale keeps them
/// perpendicular to the surface. A mirroring matrix (negative determinant)
/// also reverses every triangle so faces keep pointing outwards.
pub fn transform_mesh(mesh: &Mesh, matrix: Mat4) -> Mesh {
    let mut result = mesh.duplicate();

    for v in &mut result.vertices {
        *v = matrix.transform_point3(Vec3::from_array(*v)).to_array();
    }

    let linear = Mat3::from_mat4(matrix);
    if linear.determinant() < 0.0 {
        for triangle in result.indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
    }

    let normal_matrix = linear.inverse().transpose();
    for n in &mut result.normals {
        *n = (normal_matrix * Vec3::from_array(*n))
            .normalize_or_zero()
            .to_array();
    }

    result
}

/// Replace the normals of `mesh` with smooth per-vertex normals.
///
/// Each triangle adds its area-weighted face normal to its three vertices.
/// Vertices not referenced by any triangle end up with a zero normal.
pub fn recalculate_normals(mesh: &mut Mesh) {
    let mut normals = vec![Vec3::ZERO; mesh.vertex_count()];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (Some(&v0), Some(&v1), Some(&v2)) = (
            mesh.vertices.get(i0),
            mesh.vertices.get(i1),
            mesh.vertices.get(i2),
        ) else {
            continue;
        };

        let v0 = Vec3::from_array(v0);
        let face = (Vec3::from_array(v1) - v0).cross(Vec3::from_array(v2) - v0);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    mesh.normals = normals
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect();
}
