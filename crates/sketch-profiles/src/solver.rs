use cad_types::{ElementPoint, Point2, Sketch, Tolerance};
use thiserror::Error;
use tracing::debug;

use crate::profiles::build_profiles_with;
use crate::types::Profile;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("sketch is over-constrained ({} conflicting constraints)", conflicts.len())]
    OverConstrained { conflicts: Vec<usize> },

    #[error("constraint solve failed: {reason}")]
    Failed { reason: String },

    #[error("solution moves unknown point {point:?}")]
    UnknownHandle { point: ElementPoint },
}

/// An external geometric constraint solver. Given a sketch, returns the new
/// position of every control point it moved. Points it leaves alone may be
/// omitted.
pub trait ConstraintSolver {
    fn solve(&mut self, sketch: &Sketch) -> Result<Vec<(ElementPoint, Point2)>, SolveError>;
}

/// Write solved positions back into the sketch. Nothing is written if any
/// position names a point the sketch does not have.
pub fn apply_solution(
    sketch: &mut Sketch,
    solution: &[(ElementPoint, Point2)],
) -> Result<(), SolveError> {
    for (point, _) in solution {
        let valid = sketch
            .element(point.element)
            .is_some_and(|e| point.handle < e.handles().len());
        if !valid {
            return Err(SolveError::UnknownHandle { point: *point });
        }
    }
    for &(point, position) in solution {
        if let Some(element) = sketch.element_mut(point.element) {
            element.set_handle(point.handle, position);
        }
    }
    Ok(())
}

/// Solve the sketch's constraints, apply the result and rebuild its
/// profiles, outer boundaries excluded.
pub fn solve_sketch(
    sketch: &mut Sketch,
    solver: &mut dyn ConstraintSolver,
) -> Result<Vec<Profile>, SolveError> {
    let solution = solver.solve(sketch)?;
    debug!(moved = solution.len(), "applying constraint solution");
    apply_solution(sketch, &solution)?;
    Ok(build_profiles_with(
        &sketch.elements,
        false,
        &Tolerance::default(),
    ))
}
