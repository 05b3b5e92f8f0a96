use cad_types::geom::{vlength, vnormalize, vscale};
use geometry_kernel::ShapeHandle;
use tracing::debug;

use crate::boolean::fuse_all;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Extrude every face along `direction` by `distance` and fuse the results
/// into a single tool body. A negative distance extrudes backwards.
pub fn extrude_faces(
    kb: &mut dyn KernelBundle,
    faces: &[ShapeHandle],
    direction: [f64; 3],
    distance: f64,
) -> Result<ShapeHandle, OpError> {
    if distance == 0.0 || !distance.is_finite() {
        return Err(OpError::ExtrusionHasNoVolume);
    }
    if vlength(direction) < 1e-12 {
        return Err(OpError::InvalidParameter {
            reason: "extrusion direction is zero".into(),
        });
    }
    let vector = vscale(vnormalize(direction), distance);
    debug!(faces = faces.len(), distance, "extruding profiles");

    let bodies = faces
        .iter()
        .map(|face| kb.extrude(face, vector))
        .collect::<Result<Vec<_>, _>>()?;
    fuse_all(kb, bodies)
}

/// Extrude by `distance / 2` to both sides of the sketch plane.
pub fn extrude_symmetric(
    kb: &mut dyn KernelBundle,
    faces: &[ShapeHandle],
    direction: [f64; 3],
    distance: f64,
) -> Result<ShapeHandle, OpError> {
    let forward = extrude_faces(kb, faces, direction, distance / 2.0)?;
    let backward = extrude_faces(kb, faces, direction, -distance / 2.0)?;
    Ok(kb.union(&forward, &backward)?)
}
