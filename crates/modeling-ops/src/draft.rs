use cad_types::Plane;
use geometry_kernel::ShapeHandle;
use tracing::debug;
use uuid::Uuid;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Tilt `faces` by `angle` radians about their intersection with the
/// neutral plane. The pull direction is the plane's normal.
pub fn draft_faces(
    kb: &mut dyn KernelBundle,
    solid: &ShapeHandle,
    faces: &[Uuid],
    neutral: &Plane,
    angle: f64,
) -> Result<ShapeHandle, OpError> {
    if faces.is_empty() {
        return Err(OpError::InvalidParameter {
            reason: "no faces to draft".into(),
        });
    }
    debug!(faces = faces.len(), angle, "draft");
    Ok(kb.draft(solid, faces, neutral, angle)?)
}
