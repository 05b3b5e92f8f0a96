use geometry_kernel::ShapeHandle;
use tracing::debug;

use crate::kernel_ext::KernelBundle;
use crate::types::{OpError, Operation};

/// Combine a tool body with a component's compound.
///
/// A component without a body takes the tool as-is for `Join` and `Create`;
/// `Cut` and `Intersect` need something to act on.
pub fn apply_operation(
    kb: &mut dyn KernelBundle,
    compound: Option<&ShapeHandle>,
    tool: ShapeHandle,
    operation: Operation,
) -> Result<ShapeHandle, OpError> {
    let has_volume = kb
        .mass_properties(&tool)
        .map(|props| props.volume > 0.0)
        .unwrap_or(false);
    if !has_volume {
        return Err(OpError::EmptyTool);
    }

    let Some(compound) = compound else {
        return match operation {
            Operation::Join | Operation::Create => Ok(tool),
            Operation::Cut | Operation::Intersect => Err(OpError::NoTarget { operation }),
        };
    };

    debug!(%operation, "boolean");
    let result = match operation {
        Operation::Join => kb.union(compound, &tool)?,
        Operation::Cut => kb.subtract(compound, &tool)?,
        Operation::Intersect => kb.intersect(compound, &tool)?,
        Operation::Create => kb.combine(&[compound.clone(), tool])?,
    };
    Ok(result)
}

/// Fuse bodies left to right into one.
pub(crate) fn fuse_all(
    kb: &mut dyn KernelBundle,
    bodies: Vec<ShapeHandle>,
) -> Result<ShapeHandle, OpError> {
    let mut bodies = bodies.into_iter();
    let first = bodies.next().ok_or(OpError::NoProfiles)?;
    bodies.try_fold(first, |acc, body| Ok(kb.union(&acc, &body)?))
}
