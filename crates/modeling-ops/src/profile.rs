use cad_types::Plane;
use geometry_kernel::ShapeHandle;
use sketch_profiles::{Profile, Wire};

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Build a planar kernel face from a profile placed on `plane`.
///
/// Each edge is named after the sketch segment it came from, so faces and
/// edges generated from it keep their identity across recomputes.
pub fn make_profile_face(
    kb: &mut dyn KernelBundle,
    profile: &Profile,
    plane: &Plane,
) -> Result<ShapeHandle, OpError> {
    let outer = make_wire(kb, &profile.outer, plane)?;
    let holes = profile
        .holes
        .iter()
        .map(|hole| make_wire(kb, hole, plane))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(kb.make_face(&outer, &holes)?)
}

fn make_wire(kb: &mut dyn KernelBundle, wire: &Wire, plane: &Plane) -> Result<ShapeHandle, OpError> {
    let edges = wire
        .segments
        .iter()
        .map(|seg| kb.make_curve(&seg.curve, seg.id.edge_id(), plane))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(kb.make_wire(&edges)?)
}
