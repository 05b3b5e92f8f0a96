use geometry_kernel::{KernelError, ShapeHandle};
use tracing::debug;
use uuid::Uuid;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Round the given edges of a solid. `edges` are kernel identities.
pub fn fillet_edges(
    kb: &mut dyn KernelBundle,
    solid: &ShapeHandle,
    edges: &[Uuid],
    radius: f64,
) -> Result<ShapeHandle, OpError> {
    if radius <= 0.0 {
        return Err(OpError::InvalidParameter {
            reason: "fillet radius must be positive".to_string(),
        });
    }
    debug!(edges = edges.len(), radius, "fillet");
    kb.fillet(solid, edges, radius).map_err(|err| match err {
        KernelError::FilletFailed { .. } => OpError::FilletFailed,
        other => OpError::Kernel(other),
    })
}
