use std::rc::Rc;

use cad_types::{AxialRef, Axis, ProfileRef, Tolerance};
use geometry_kernel::{KernelIntrospect, ShapeHandle};
use modeling_ops::{
    apply_operation, draft_faces, extrude_faces, extrude_symmetric, fillet_edges, make_profile_face,
    revolve_faces, shell_solid, KernelBundle, OpError, Operation,
};
use tracing::debug;
use uuid::Uuid;

use crate::resolve::{
    resolve_axis, resolve_edge, resolve_face, resolve_plane, resolve_profile, Resolution,
    ResolvedProfile,
};
use crate::tree::{Component, ComponentTree};
use crate::types::*;

/// A warning to record on success, or the error that failed the feature.
type Outcome = Result<Option<FeatureError>, FeatureError>;

impl From<OpError> for FeatureError {
    fn from(err: OpError) -> Self {
        FeatureError::error(err.to_string())
    }
}

impl Feature {
    pub fn new(component_id: Uuid, kind: FeatureKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_id,
            kind,
            error: None,
            state: FeatureState::Incomplete,
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// Whether every required reference-typed setting is set.
    pub fn is_complete(&self) -> bool {
        match &self.kind {
            FeatureKind::NewComponent(_) => true,
            FeatureKind::Sketch(s) => s.plane.is_some(),
            FeatureKind::Extrusion(s) => !s.profiles.is_empty(),
            FeatureKind::Revolution(s) => s.axis.is_some() && !s.profiles.is_empty(),
            FeatureKind::Fillet(s) => !s.edges.is_empty(),
            FeatureKind::Draft(s) => s.plane.is_some() && !s.faces.is_empty(),
            FeatureKind::Shell(s) => !s.faces.is_empty(),
        }
    }

    pub fn is_errored(&self) -> bool {
        self.error.as_ref().is_some_and(FeatureError::is_error)
    }

    /// Apply this feature to `tree`. Failures never escape: they are
    /// recorded in `error` and `state`, and the caller rolls the step back
    /// when the feature ends up `Errored`.
    pub fn execute(&mut self, tree: &mut ComponentTree, kb: &mut dyn KernelBundle) {
        if !self.is_complete() {
            self.state = FeatureState::Incomplete;
            self.error = None;
            return;
        }
        self.state = FeatureState::Ready;
        match self.update_feature(tree, kb) {
            Ok(warning) => {
                self.error = warning;
                self.state = FeatureState::Executed;
            }
            Err(error) => {
                self.error = Some(error);
                self.state = FeatureState::Errored;
            }
        }
    }

    fn update_feature(&self, tree: &mut ComponentTree, kb: &mut dyn KernelBundle) -> Outcome {
        let tol = Tolerance::default();
        match &self.kind {
            FeatureKind::NewComponent(s) => {
                if tree.find(s.component).is_some() {
                    return Err(FeatureError::error("Component already exists"));
                }
                let parent = component_mut(tree, self.component_id)?;
                parent.children.push(Rc::new(Component::new(
                    s.component,
                    Some(parent.id),
                    s.name.clone(),
                )));
                Ok(None)
            }

            FeatureKind::Sketch(s) => {
                let plane = s
                    .plane
                    .as_ref()
                    .map(|p| resolve_plane(p, tree, kb.as_introspect()))
                    .and_then(Resolution::value)
                    .ok_or_else(|| FeatureError::error("Sketch plane was lost"))?;
                let mut sketch = s.sketch.clone();
                sketch.workplane = plane;
                let comp = component_mut(tree, self.component_id)?;
                comp.sketches.retain(|existing| existing.id != sketch.id);
                comp.sketches.push(Rc::new(sketch));
                Ok(None)
            }

            FeatureKind::Extrusion(s) => {
                let (profiles, warning) = update_profiles(&s.profiles, tree, &tol)?;
                let direction = match &s.axis {
                    Some(axis) => axis_of(axis, tree, kb.as_introspect())?.direction,
                    None => profiles[0].plane.normal,
                };
                let faces = profiles
                    .iter()
                    .map(|p| make_profile_face(kb, &p.profile, &p.plane))
                    .collect::<Result<Vec<_>, _>>()?;
                let tool = if s.symmetric {
                    extrude_symmetric(kb, &faces, direction, s.distance)?
                } else {
                    let distance = if s.side { s.distance } else { -s.distance };
                    extrude_faces(kb, &faces, direction, distance)?
                };
                combine_into(tree, self.component_id, kb, tool, s.operation)?;
                Ok(warning)
            }

            FeatureKind::Revolution(s) => {
                let (profiles, warning) = update_profiles(&s.profiles, tree, &tol)?;
                let axis = match &s.axis {
                    Some(axis) => axis_of(axis, tree, kb.as_introspect())?,
                    None => return Err(FeatureError::error("Axis was lost")),
                };
                let angle = if s.side { s.angle } else { -s.angle }.to_radians();
                let faces = profiles
                    .iter()
                    .map(|p| make_profile_face(kb, &p.profile, &p.plane))
                    .collect::<Result<Vec<_>, _>>()?;
                let tool = revolve_faces(kb, &faces, &axis, angle)?;
                combine_into(tree, self.component_id, kb, tool, s.operation)?;
                Ok(warning)
            }

            FeatureKind::Fillet(s) => {
                let (edges, warning) = collect(&s.edges, "Edge reference was lost", |r| {
                    resolve_edge(r, tree, kb.as_introspect())
                })?;
                let ids: Vec<Uuid> = edges.iter().map(|e| e.id).collect();
                let solid = body_of(tree, self.component_id)?;
                let result = fillet_edges(kb, &solid, &ids, s.radius)?;
                component_mut(tree, self.component_id)?.compound = Some(result);
                Ok(warning)
            }

            FeatureKind::Draft(s) => {
                let neutral = s
                    .plane
                    .as_ref()
                    .map(|p| resolve_plane(p, tree, kb.as_introspect()))
                    .and_then(Resolution::value)
                    .ok_or_else(|| FeatureError::error("Reference plane was lost"))?;
                let (faces, warning) = collect(&s.faces, "Face reference was lost", |r| {
                    resolve_face(r, tree, kb.as_introspect())
                })?;
                let ids: Vec<Uuid> = faces.iter().map(|f| f.id).collect();
                let solid = body_of(tree, self.component_id)?;
                let result = draft_faces(kb, &solid, &ids, &neutral, s.angle.to_radians())?;
                component_mut(tree, self.component_id)?.compound = Some(result);
                Ok(warning)
            }

            FeatureKind::Shell(s) => {
                let (faces, warning) = collect(&s.faces, "Face reference was lost", |r| {
                    resolve_face(r, tree, kb.as_introspect())
                })?;
                let ids: Vec<Uuid> = faces.iter().map(|f| f.id).collect();
                let distance = if s.side { s.distance } else { -s.distance };
                let solid = body_of(tree, self.component_id)?;
                let result = shell_solid(kb, &solid, &ids, distance)?;
                component_mut(tree, self.component_id)?.compound = Some(result);
                Ok(warning)
            }
        }
    }

    /// Drop references that no longer resolve against `tree`, the snapshot
    /// this feature runs on, and clear the recorded error.
    pub fn repair(&mut self, tree: &ComponentTree, ki: &dyn KernelIntrospect) {
        let tol = Tolerance::default();
        match &mut self.kind {
            FeatureKind::Extrusion(ExtrusionSettings { profiles, .. })
            | FeatureKind::Revolution(RevolutionSettings { profiles, .. }) => {
                *profiles = profiles
                    .iter()
                    .filter_map(|r| resolve_profile(r, tree, &tol).value())
                    .map(|p| p.reference)
                    .collect();
            }
            FeatureKind::Fillet(s) => {
                s.edges.retain(|r| !resolve_edge(r, tree, ki).is_lost());
            }
            FeatureKind::Draft(DraftSettings { faces, .. })
            | FeatureKind::Shell(ShellSettings { faces, .. }) => {
                faces.retain(|r| !resolve_face(r, tree, ki).is_lost());
            }
            FeatureKind::NewComponent(_) | FeatureKind::Sketch(_) => {}
        }
        debug!(feature = %self.id, "repaired");
        self.error = None;
        self.state = if self.is_complete() {
            FeatureState::Ready
        } else {
            FeatureState::Incomplete
        };
    }
}

/// Resolve profile references. A repaired profile is a warning.
fn update_profiles(
    refs: &[ProfileRef],
    tree: &ComponentTree,
    tol: &Tolerance,
) -> Result<(Vec<ResolvedProfile>, Option<FeatureError>), FeatureError> {
    let mut repaired = false;
    let (profiles, lost) = collect(refs, "Profile was lost", |r| {
        let resolution = resolve_profile(r, tree, tol);
        repaired |= matches!(resolution, Resolution::Repaired(_));
        resolution
    })?;
    let warning =
        lost.or_else(|| repaired.then(|| FeatureError::warning("Profile has been repaired")));
    Ok((profiles, warning))
}

/// Resolve a multi-valued setting. Lost items are dropped: none lost is
/// fine, some lost is a warning, all lost is an error.
fn collect<R, T>(
    refs: &[R],
    lost_message: &str,
    mut resolve: impl FnMut(&R) -> Resolution<T>,
) -> Result<(Vec<T>, Option<FeatureError>), FeatureError> {
    let found: Vec<T> = refs.iter().filter_map(|r| resolve(r).value()).collect();
    if found.is_empty() {
        Err(FeatureError::error(lost_message))
    } else if found.len() < refs.len() {
        Ok((found, Some(FeatureError::warning(lost_message))))
    } else {
        Ok((found, None))
    }
}

fn axis_of(
    reference: &AxialRef,
    tree: &ComponentTree,
    ki: &dyn KernelIntrospect,
) -> Result<Axis, FeatureError> {
    resolve_axis(reference, tree, ki).value().ok_or_else(|| {
        FeatureError::error(match reference {
            AxialRef::Fixed { .. } => "Axis was lost",
            AxialRef::Edge { .. } => "Edge reference was lost",
            AxialRef::Curve { .. } => "Curve reference was lost",
        })
    })
}

fn component_mut(tree: &mut ComponentTree, id: Uuid) -> Result<&mut Component, FeatureError> {
    tree.component_mut(id)
        .ok_or_else(|| FeatureError::error("Component was lost"))
}

fn body_of(tree: &ComponentTree, id: Uuid) -> Result<ShapeHandle, FeatureError> {
    tree.find(id)
        .and_then(|c| c.compound.clone())
        .ok_or_else(|| FeatureError::error("Component has no body"))
}

fn combine_into(
    tree: &mut ComponentTree,
    id: Uuid,
    kb: &mut dyn KernelBundle,
    tool: ShapeHandle,
    operation: Operation,
) -> Result<(), FeatureError> {
    let current = tree
        .find(id)
        .ok_or_else(|| FeatureError::error("Component was lost"))?
        .compound
        .clone();
    let result = apply_operation(kb, current.as_ref(), tool, operation)?;
    component_mut(tree, id)?.compound = Some(result);
    Ok(())
}
