pub mod features;
pub mod resolve;
pub mod tree;
pub mod types;

pub use resolve::{Resolution, ResolvedProfile};
pub use tree::{Component, ComponentTree};
pub use types::*;

use cad_types::{Point2, Tolerance};
use modeling_ops::KernelBundle;
use sketch_profiles::{apply_solution, ConstraintSolver};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// The parametric modeling history.
///
/// Holds the ordered features and one component-tree snapshot per step:
/// `cache[i]` is the tree before `features[i]` runs, so there is always one
/// more snapshot than there are features. Snapshots up to
/// `invalidation_index` are current; later ones are recomputed on demand.
#[derive(Debug)]
pub struct Timeline {
    features: Vec<Feature>,
    cache: Vec<ComponentTree>,
    marker: usize,
    invalidation_index: usize,
    /// The snapshot the last `evaluate` reported against.
    last_evaluated: ComponentTree,
}

impl Timeline {
    pub fn new() -> Self {
        let empty = ComponentTree::new();
        Self {
            features: Vec::new(),
            cache: vec![empty.clone()],
            marker: 0,
            invalidation_index: 0,
            last_evaluated: empty,
        }
    }

    /// Insert a feature at the marker, advance the marker past it and
    /// recompute. Returns the ids of the components that changed.
    pub fn insert_feature(&mut self, feature: Feature, kb: &mut dyn KernelBundle) -> Vec<Uuid> {
        let at = self.marker;
        self.features.insert(at, feature);
        self.cache.insert(at + 1, self.cache[at].clone());
        self.invalidate(at);
        self.marker += 1;
        self.evaluate(kb)
    }

    pub fn remove_feature(
        &mut self,
        id: Uuid,
        kb: &mut dyn KernelBundle,
    ) -> Result<Vec<Uuid>, EngineError> {
        let index = self.index_of(id)?;
        self.features.remove(index);
        self.cache.remove(index + 1);
        if self.marker > index {
            self.marker -= 1;
        }
        self.invalidate(index);
        Ok(self.evaluate(kb))
    }

    /// Reposition the cursor. Features past it are kept but not applied.
    pub fn move_marker(
        &mut self,
        target: usize,
        kb: &mut dyn KernelBundle,
    ) -> Result<Vec<Uuid>, EngineError> {
        if target > self.features.len() {
            return Err(EngineError::MarkerOutOfRange {
                marker: target,
                len: self.features.len(),
            });
        }
        self.marker = target;
        Ok(self.evaluate(kb))
    }

    /// Bring the snapshot at the marker up to date. Returns the components
    /// that differ from the previously evaluated snapshot, with descendants
    /// of a reported component left out.
    pub fn evaluate(&mut self, kb: &mut dyn KernelBundle) -> Vec<Uuid> {
        self.regenerate(self.invalidation_index.min(self.marker), self.marker, kb);
        let top = self.cache[self.marker].clone();
        let changed = self.last_evaluated.changed_components(&top);
        self.last_evaluated = top;
        changed
    }

    /// Recompute the snapshots after steps `from..to`. A step whose feature
    /// fails keeps the snapshot it was given; the error stays on the
    /// feature.
    #[instrument(skip(self, kb))]
    pub fn regenerate(&mut self, from: usize, to: usize, kb: &mut dyn KernelBundle) {
        let to = to.min(self.features.len());
        for i in from.min(to)..to {
            let mut tree = self.cache[i].clone();
            let feature = &mut self.features[i];
            feature.execute(&mut tree, kb);

            match &feature.error {
                Some(error) if error.is_error() => {
                    warn!(
                        feature = %feature.id,
                        title = feature.title(),
                        %error,
                        "step rolled back"
                    );
                    tree = self.cache[i].clone();
                }
                Some(warning) => {
                    warn!(
                        feature = %feature.id,
                        title = feature.title(),
                        %warning,
                        "step executed with warning"
                    );
                }
                None => {}
            }
            debug!(step = i, title = feature.title(), state = ?feature.state, "regenerated");
            self.cache[i + 1] = tree;
            self.invalidation_index = i + 1;
        }
    }

    /// Replace a feature's settings and recompute from it.
    pub fn update_feature(
        &mut self,
        id: Uuid,
        kind: FeatureKind,
        kb: &mut dyn KernelBundle,
    ) -> Result<Vec<Uuid>, EngineError> {
        let index = self.index_of(id)?;
        self.features[index].kind = kind;
        self.invalidate(index);
        Ok(self.evaluate(kb))
    }

    /// Drop the references of a feature that no longer resolve, clear its
    /// error and recompute from it.
    pub fn repair_feature(
        &mut self,
        id: Uuid,
        kb: &mut dyn KernelBundle,
    ) -> Result<Vec<Uuid>, EngineError> {
        let index = self.index_of(id)?;
        self.regenerate(self.invalidation_index.min(index), index, kb);
        let before = self.cache[index].clone();
        self.features[index].repair(&before, kb.as_introspect());
        self.invalidate(index);
        Ok(self.evaluate(kb))
    }

    /// Move one control point of a sketch element without recomputing.
    /// Returns the element's new display polyline.
    pub fn drag_sketch_handle(
        &mut self,
        feature: Uuid,
        element: Uuid,
        handle: usize,
        position: Point2,
    ) -> Result<Vec<Point2>, EngineError> {
        let sketch = self.sketch_mut(feature)?;
        let element_ref = sketch
            .element_mut(element)
            .ok_or(EngineError::ElementNotFound { id: element })?;
        if !element_ref.set_handle(handle, position) {
            return Err(EngineError::UnknownHandle { element, handle });
        }
        Ok(element_ref.tessellate(Tolerance::default().samples_per_curve))
    }

    /// Finish a drag: recompute from the sketch feature.
    pub fn commit_drag(
        &mut self,
        feature: Uuid,
        kb: &mut dyn KernelBundle,
    ) -> Result<Vec<Uuid>, EngineError> {
        let index = self.index_of(feature)?;
        self.invalidate(index);
        Ok(self.evaluate(kb))
    }

    /// Run a constraint solver on a sketch feature, write the solved
    /// positions back and recompute.
    pub fn solve_sketch(
        &mut self,
        feature: Uuid,
        solver: &mut dyn ConstraintSolver,
        kb: &mut dyn KernelBundle,
    ) -> Result<Vec<Uuid>, EngineError> {
        let sketch = self.sketch_mut(feature)?;
        let solution = solver.solve(sketch)?;
        apply_solution(sketch, &solution)?;
        self.commit_drag(feature, kb)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, id: Uuid) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn marker(&self) -> usize {
        self.marker
    }

    pub fn invalidation_index(&self) -> usize {
        self.invalidation_index
    }

    /// The snapshot before step `index`. May be stale past the
    /// invalidation index.
    pub fn tree_at(&self, index: usize) -> Option<&ComponentTree> {
        self.cache.get(index)
    }

    /// The snapshot at the marker.
    pub fn top(&self) -> &ComponentTree {
        &self.cache[self.marker]
    }

    /// The snapshot after the whole history, whatever the marker.
    pub fn final_tree(&mut self, kb: &mut dyn KernelBundle) -> &ComponentTree {
        let len = self.features.len();
        self.regenerate(self.invalidation_index.min(len), len, kb);
        &self.cache[len]
    }

    fn invalidate(&mut self, index: usize) {
        self.invalidation_index = self.invalidation_index.min(index);
    }

    fn index_of(&self, id: Uuid) -> Result<usize, EngineError> {
        self.features
            .iter()
            .position(|f| f.id == id)
            .ok_or(EngineError::FeatureNotFound { id })
    }

    fn sketch_mut(&mut self, id: Uuid) -> Result<&mut cad_types::Sketch, EngineError> {
        let index = self.index_of(id)?;
        match &mut self.features[index].kind {
            FeatureKind::Sketch(settings) => Ok(&mut settings.sketch),
            _ => Err(EngineError::NotASketch { id }),
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
