use cad_types::Axis;
use geometry_kernel::ShapeHandle;
use tracing::debug;

use crate::boolean::fuse_all;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Revolve every face about `axis` by `angle` radians and fuse the results
/// into a single tool body. Angles beyond a full turn are clamped.
pub fn revolve_faces(
    kb: &mut dyn KernelBundle,
    faces: &[ShapeHandle],
    axis: &Axis,
    angle: f64,
) -> Result<ShapeHandle, OpError> {
    if angle == 0.0 || !angle.is_finite() {
        return Err(OpError::RevolutionHasNoVolume);
    }
    let angle = angle.clamp(-std::f64::consts::TAU, std::f64::consts::TAU);
    debug!(faces = faces.len(), angle, "revolving profiles");

    let bodies = faces
        .iter()
        .map(|face| kb.revolve(face, axis, angle))
        .collect::<Result<Vec<_>, _>>()?;
    fuse_all(kb, bodies)
}
