use geometry_kernel::{KernelError, ShapeHandle};
use tracing::debug;
use uuid::Uuid;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Hollow a solid: remove `open_faces` and thicken the remaining skin by
/// `distance`. Positive distances grow inward, negative outward. The
/// result is validated and healed before it is returned.
pub fn shell_solid(
    kb: &mut dyn KernelBundle,
    solid: &ShapeHandle,
    open_faces: &[Uuid],
    distance: f64,
) -> Result<ShapeHandle, OpError> {
    debug!(open_faces = open_faces.len(), distance, "shell");
    let shelled = kb.offset(solid, open_faces, distance).map_err(|err| match err {
        KernelError::ShellFailed { .. } => OpError::OffsetFailed,
        other => OpError::Kernel(other),
    })?;
    if kb.is_valid(&shelled) {
        return Ok(shelled);
    }
    kb.fix(&shelled).map_err(|_| OpError::ShellNotClosed)
}
