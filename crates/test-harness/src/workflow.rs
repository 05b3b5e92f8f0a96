//! ModelBuilder: fluent API for scripting modeling sessions in tests.
//!
//! Drives a real [`Timeline`] with the mock kernel. All methods accept
//! string names instead of UUIDs for readability.

use std::collections::HashMap;

use cad_types::*;
use feature_engine::*;
use file_format::{load_document, save_document, DocumentMetadata};
use geometry_kernel::{KernelIntrospect, MockKernel, ShapeHandle};
use modeling_ops::Operation;
use uuid::Uuid;

use crate::assertions;
use crate::helpers::*;

/// A fluent builder for constructing and verifying models in tests.
pub struct ModelBuilder {
    pub timeline: Timeline,
    pub kernel: MockKernel,
    named_features: HashMap<String, Uuid>,
    /// Component ids reported by the last timeline call.
    last_changed: Vec<Uuid>,
}

impl ModelBuilder {
    /// Create a new ModelBuilder with MockKernel (deterministic, fast).
    pub fn mock() -> Self {
        Self {
            timeline: Timeline::new(),
            kernel: MockKernel::new(),
            named_features: HashMap::new(),
            last_changed: Vec::new(),
        }
    }

    // ── Structure ───────────────────────────────────────────────────────

    /// Add a component under `parent`. Returns the new component's id.
    pub fn new_component(&mut self, name: &str, parent: Uuid) -> Result<Uuid, HarnessError> {
        let component = Uuid::new_v4();
        self.insert(
            name,
            Feature::new(
                parent,
                FeatureKind::NewComponent(NewComponentSettings {
                    component,
                    name: name.to_string(),
                }),
            ),
        )?;
        Ok(component)
    }

    // ── Sketches ────────────────────────────────────────────────────────

    pub fn sketch(
        &mut self,
        name: &str,
        component: Uuid,
        plane: PlanarRef,
        elements: Vec<SketchElement>,
    ) -> Result<Uuid, HarnessError> {
        self.insert(
            name,
            Feature::new(
                component,
                FeatureKind::Sketch(SketchSettings {
                    plane: Some(plane),
                    sketch: sketch_with(elements),
                }),
            ),
        )
    }

    /// A rectangle on the XY plane of the root component.
    pub fn rect_sketch(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) -> Result<Uuid, HarnessError> {
        self.sketch(
            name,
            ComponentTree::ROOT_ID,
            fixed_plane(Plane::XY),
            rect_elements(x, y, w, h),
        )
    }

    /// Edit a sketch's elements and recompute.
    pub fn edit_sketch(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut Sketch),
    ) -> Result<&mut Self, HarnessError> {
        let id = self.feature_id(name)?;
        let mut settings = match &self.feature(name)?.kind {
            FeatureKind::Sketch(s) => s.clone(),
            _ => return Err(HarnessError::NotASketch { name: name.into() }),
        };
        edit(&mut settings.sketch);
        self.last_changed = self.timeline.update_feature(
            id,
            FeatureKind::Sketch(settings),
            &mut self.kernel,
        )?;
        Ok(self)
    }

    /// The sketch as last stored on its feature.
    pub fn sketch_of(&self, name: &str) -> Result<&Sketch, HarnessError> {
        match &self.feature(name)?.kind {
            FeatureKind::Sketch(s) => Ok(&s.sketch),
            _ => Err(HarnessError::NotASketch { name: name.into() }),
        }
    }

    // ── Solid Features ──────────────────────────────────────────────────

    pub fn extrude(&mut self, name: &str, sketch: &str, distance: f64) -> Result<Uuid, HarnessError> {
        self.extrude_with(name, sketch, distance, Operation::Join)
    }

    /// Extrude every region of a sketch along its plane normal.
    pub fn extrude_with(
        &mut self,
        name: &str,
        sketch: &str,
        distance: f64,
        operation: Operation,
    ) -> Result<Uuid, HarnessError> {
        let (component, profiles) = self.profiles_of(sketch)?;
        self.insert(
            name,
            Feature::new(
                component,
                FeatureKind::Extrusion(ExtrusionSettings {
                    profiles,
                    axis: None,
                    distance,
                    side: true,
                    symmetric: false,
                    operation,
                }),
            ),
        )
    }

    pub fn revolve(
        &mut self,
        name: &str,
        sketch: &str,
        axis: Axis,
        degrees: f64,
    ) -> Result<Uuid, HarnessError> {
        let (component, profiles) = self.profiles_of(sketch)?;
        self.insert(
            name,
            Feature::new(
                component,
                FeatureKind::Revolution(RevolutionSettings {
                    profiles,
                    axis: Some(AxialRef::Fixed { axis }),
                    angle: degrees,
                    side: true,
                    operation: Operation::Join,
                }),
            ),
        )
    }

    pub fn fillet(
        &mut self,
        name: &str,
        component: Uuid,
        edges: &[Uuid],
        radius: f64,
    ) -> Result<Uuid, HarnessError> {
        self.insert(
            name,
            Feature::new(
                component,
                FeatureKind::Fillet(FilletSettings {
                    edges: edge_refs(component, edges),
                    radius,
                }),
            ),
        )
    }

    pub fn shell(
        &mut self,
        name: &str,
        component: Uuid,
        open_faces: &[Uuid],
        distance: f64,
    ) -> Result<Uuid, HarnessError> {
        self.insert(
            name,
            Feature::new(
                component,
                FeatureKind::Shell(ShellSettings {
                    faces: face_refs(component, open_faces),
                    distance,
                    side: true,
                }),
            ),
        )
    }

    pub fn draft(
        &mut self,
        name: &str,
        component: Uuid,
        neutral: PlanarRef,
        faces: &[Uuid],
        degrees: f64,
    ) -> Result<Uuid, HarnessError> {
        self.insert(
            name,
            Feature::new(
                component,
                FeatureKind::Draft(DraftSettings {
                    plane: Some(neutral),
                    faces: face_refs(component, faces),
                    angle: degrees,
                }),
            ),
        )
    }

    // ── Timeline Editing ────────────────────────────────────────────────

    pub fn delete_feature(&mut self, name: &str) -> Result<&mut Self, HarnessError> {
        let id = self.feature_id(name)?;
        self.last_changed = self.timeline.remove_feature(id, &mut self.kernel)?;
        self.named_features.remove(name);
        Ok(self)
    }

    pub fn move_marker(&mut self, marker: usize) -> Result<&mut Self, HarnessError> {
        self.last_changed = self.timeline.move_marker(marker, &mut self.kernel)?;
        Ok(self)
    }

    pub fn repair(&mut self, name: &str) -> Result<&mut Self, HarnessError> {
        let id = self.feature_id(name)?;
        self.last_changed = self.timeline.repair_feature(id, &mut self.kernel)?;
        Ok(self)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn feature_id(&self, name: &str) -> Result<Uuid, HarnessError> {
        self.named_features
            .get(name)
            .copied()
            .ok_or_else(|| HarnessError::FeatureNotFound { name: name.into() })
    }

    pub fn feature(&self, name: &str) -> Result<&Feature, HarnessError> {
        let id = self.feature_id(name)?;
        self.timeline
            .feature(id)
            .ok_or_else(|| HarnessError::FeatureNotFound { name: name.into() })
    }

    pub fn last_changed(&self) -> &[Uuid] {
        &self.last_changed
    }

    /// The compound of a component in the snapshot at the marker.
    pub fn solid(&self, component: Uuid) -> Result<ShapeHandle, HarnessError> {
        self.timeline
            .top()
            .find(component)
            .and_then(|c| c.compound.clone())
            .ok_or(HarnessError::NoSolid { component })
    }

    pub fn volume(&self, component: Uuid) -> Result<f64, HarnessError> {
        let solid = self.solid(component)?;
        Ok(self.kernel.mass_properties(&solid)?.volume)
    }

    pub fn face_ids(&self, component: Uuid) -> Result<Vec<Uuid>, HarnessError> {
        let solid = self.solid(component)?;
        Ok(self.kernel.list_faces(&solid).iter().map(|f| f.id).collect())
    }

    pub fn edge_ids(&self, component: Uuid) -> Result<Vec<Uuid>, HarnessError> {
        let solid = self.solid(component)?;
        Ok(self.kernel.list_edges(&solid).iter().map(|e| e.id).collect())
    }

    pub fn select_face_by_normal(
        &self,
        component: Uuid,
        normal: [f64; 3],
    ) -> Result<Uuid, HarnessError> {
        let solid = self.solid(component)?;
        face_by_normal(&self.kernel, &solid, normal).ok_or(HarnessError::NoSuchFace { normal })
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn save(&self) -> Result<String, HarnessError> {
        let mut meta = DocumentMetadata::new("harness");
        Ok(save_document(&self.timeline, &mut meta)?)
    }

    /// Replace the timeline with one loaded from `json` on a fresh kernel.
    /// Feature names survive since ids are persisted.
    pub fn load(&mut self, json: &str) -> Result<&mut Self, HarnessError> {
        let mut kernel = MockKernel::new();
        let (timeline, _) = load_document(json, &mut kernel)?;
        self.timeline = timeline;
        self.kernel = kernel;
        self.last_changed.clear();
        Ok(self)
    }

    // ── Assertions ──────────────────────────────────────────────────────

    pub fn assert_no_errors(&self) -> Result<&Self, HarnessError> {
        assertions::assert_no_feature_errors(&self.timeline)?;
        Ok(self)
    }

    pub fn assert_volume(&self, component: Uuid, expected: f64) -> Result<&Self, HarnessError> {
        let actual = self.volume(component)?;
        assertions::assert_close(actual, expected, 1e-6, "volume")?;
        Ok(self)
    }

    pub fn assert_state(&self, name: &str, expected: FeatureState) -> Result<&Self, HarnessError> {
        assertions::assert_feature_state(self.feature(name)?, expected)?;
        Ok(self)
    }

    fn insert(&mut self, name: &str, feature: Feature) -> Result<Uuid, HarnessError> {
        if self.named_features.contains_key(name) {
            return Err(HarnessError::DuplicateName { name: name.into() });
        }
        let id = feature.id;
        self.last_changed = self.timeline.insert_feature(feature, &mut self.kernel);
        self.named_features.insert(name.to_string(), id);
        Ok(id)
    }

    fn profiles_of(&self, sketch: &str) -> Result<(Uuid, Vec<ProfileRef>), HarnessError> {
        let feature = self.feature(sketch)?;
        match &feature.kind {
            FeatureKind::Sketch(s) => Ok((
                feature.component_id,
                profile_refs(feature.component_id, &s.sketch),
            )),
            _ => Err(HarnessError::NotASketch {
                name: sketch.into(),
            }),
        }
    }
}
