use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use cad_types::{Sketch, Transform};
use geometry_kernel::ShapeHandle;
use uuid::Uuid;

/// A named body in the assembly hierarchy.
///
/// Children and sketches sit behind `Rc` so that snapshots share every
/// subtree a recompute step did not touch.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: Uuid,
    /// Id of the owning component. `None` for the root.
    pub parent: Option<Uuid>,
    pub name: String,
    pub transform: Transform,
    /// The solid geometry of this component, if it has any yet.
    pub compound: Option<ShapeHandle>,
    pub children: Vec<Rc<Component>>,
    pub sketches: Vec<Rc<Sketch>>,
}

impl Component {
    pub fn new(id: Uuid, parent: Option<Uuid>, name: impl Into<String>) -> Self {
        Self {
            id,
            parent,
            name: name.into(),
            transform: Transform::IDENTITY,
            compound: None,
            children: Vec::new(),
            sketches: Vec::new(),
        }
    }

    pub fn sketch(&self, id: Uuid) -> Option<&Sketch> {
        self.sketches.iter().find(|s| s.id == id).map(|s| s.as_ref())
    }

    /// Same name, placement, geometry, sketches and child list, ignoring
    /// what happens inside the children.
    fn same_content(&self, other: &Component) -> bool {
        let same_compound = match (&self.compound, &other.compound) {
            (Some(a), Some(b)) => ShapeHandle::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        let same_sketches = self.sketches.len() == other.sketches.len()
            && self
                .sketches
                .iter()
                .zip(&other.sketches)
                .all(|(a, b)| Rc::ptr_eq(a, b) || a == b);
        let same_children = self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.id == b.id);
        self.name == other.name
            && self.transform == other.transform
            && same_compound
            && same_sketches
            && same_children
    }
}

/// One snapshot of the component hierarchy. Cloning is O(1).
#[derive(Debug, Clone)]
pub struct ComponentTree {
    root: Rc<Component>,
}

impl ComponentTree {
    /// Id of the top-level assembly every document starts with.
    pub const ROOT_ID: Uuid = Uuid::nil();

    pub fn new() -> Self {
        Self {
            root: Rc::new(Component::new(Self::ROOT_ID, None, "Main Assembly")),
        }
    }

    pub fn root(&self) -> &Component {
        &self.root
    }

    /// True when both snapshots are the same object, not merely equal.
    pub fn ptr_eq(a: &ComponentTree, b: &ComponentTree) -> bool {
        Rc::ptr_eq(&a.root, &b.root)
    }

    pub fn find(&self, id: Uuid) -> Option<&Component> {
        let mut stack = vec![self.root.as_ref()];
        while let Some(comp) = stack.pop() {
            if comp.id == id {
                return Some(comp);
            }
            stack.extend(comp.children.iter().map(|c| c.as_ref()));
        }
        None
    }

    /// The shared handle of a component, for identity checks across
    /// snapshots.
    pub fn find_rc(&self, id: Uuid) -> Option<&Rc<Component>> {
        let mut stack = vec![&self.root];
        while let Some(comp) = stack.pop() {
            if comp.id == id {
                return Some(comp);
            }
            stack.extend(comp.children.iter());
        }
        None
    }

    /// Mutable access to one component. Only the nodes on the path from
    /// the root are copied; everything else stays shared.
    pub fn component_mut(&mut self, id: Uuid) -> Option<&mut Component> {
        let path = self.path_to(id)?;
        let mut node = Rc::make_mut(&mut self.root);
        for index in path {
            node = Rc::make_mut(&mut node.children[index]);
        }
        Some(node)
    }

    /// All components, parents before children.
    pub fn components(&self) -> Vec<&Component> {
        let mut out = Vec::new();
        let mut stack = vec![self.root.as_ref()];
        while let Some(comp) = stack.pop() {
            out.push(comp);
            stack.extend(comp.children.iter().rev().map(|c| c.as_ref()));
        }
        out
    }

    /// Ids of the components that differ between `self` and `newer`,
    /// including ones that were removed. A component is left out when one
    /// of its ancestors is already listed.
    pub fn changed_components(&self, newer: &ComponentTree) -> Vec<Uuid> {
        if Self::ptr_eq(self, newer) {
            return Vec::new();
        }
        let old: HashMap<Uuid, &Component> = self.components().into_iter().map(|c| (c.id, c)).collect();
        let new: HashMap<Uuid, &Component> = newer.components().into_iter().map(|c| (c.id, c)).collect();

        let mut changed: Vec<Uuid> = newer
            .components()
            .into_iter()
            .filter(|c| old.get(&c.id).map_or(true, |o| !o.same_content(c)))
            .map(|c| c.id)
            .collect();
        changed.extend(
            self.components()
                .into_iter()
                .filter(|c| !new.contains_key(&c.id))
                .map(|c| c.id),
        );

        let reported: HashSet<Uuid> = changed.iter().copied().collect();
        let parent_of = |id: Uuid| {
            new.get(&id)
                .or_else(|| old.get(&id))
                .and_then(|c| c.parent)
        };
        changed.retain(|&id| {
            let mut current = parent_of(id);
            while let Some(ancestor) = current {
                if reported.contains(&ancestor) {
                    return false;
                }
                current = parent_of(ancestor);
            }
            true
        });
        changed
    }

    /// Child indices leading from the root to `id`.
    fn path_to(&self, id: Uuid) -> Option<Vec<usize>> {
        fn walk(comp: &Component, id: Uuid, path: &mut Vec<usize>) -> bool {
            if comp.id == id {
                return true;
            }
            for (i, child) in comp.children.iter().enumerate() {
                path.push(i);
                if walk(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.root, id, &mut path).then_some(path)
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_children() -> (ComponentTree, Uuid, Uuid) {
        let mut tree = ComponentTree::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let root = tree.component_mut(ComponentTree::ROOT_ID).unwrap();
        root.children.push(Rc::new(Component::new(a, Some(ComponentTree::ROOT_ID), "A")));
        root.children.push(Rc::new(Component::new(b, Some(ComponentTree::ROOT_ID), "B")));
        (tree, a, b)
    }

    #[test]
    fn mutation_copies_only_the_path() {
        let (tree, a, b) = tree_with_children();
        let mut next = tree.clone();
        next.component_mut(a).unwrap().name = "A2".into();

        assert!(!ComponentTree::ptr_eq(&tree, &next));
        assert!(!Rc::ptr_eq(tree.find_rc(a).unwrap(), next.find_rc(a).unwrap()));
        assert!(Rc::ptr_eq(tree.find_rc(b).unwrap(), next.find_rc(b).unwrap()));
        assert_eq!(tree.find(a).unwrap().name, "A");
    }

    #[test]
    fn changed_reports_only_the_touched_component() {
        let (tree, a, _) = tree_with_children();
        let mut next = tree.clone();
        next.component_mut(a).unwrap().name = "A2".into();
        assert_eq!(tree.changed_components(&next), vec![a]);
    }

    #[test]
    fn changed_prunes_descendants_of_reported_parent() {
        let (tree, a, _) = tree_with_children();
        let mut next = tree.clone();
        let grandchild = Uuid::new_v4();
        next.component_mut(a)
            .unwrap()
            .children
            .push(Rc::new(Component::new(grandchild, Some(a), "C")));
        // `a` changed its child list; the new grandchild is covered by it.
        assert_eq!(tree.changed_components(&next), vec![a]);
    }

    #[test]
    fn removed_components_are_reported() {
        let (tree, a, b) = tree_with_children();
        let mut next = tree.clone();
        next.component_mut(ComponentTree::ROOT_ID)
            .unwrap()
            .children
            .retain(|c| c.id != a);
        // The root lost a child, so the root covers everything.
        assert_eq!(tree.changed_components(&next), vec![ComponentTree::ROOT_ID]);
        assert!(next.find(b).is_some());
    }

    #[test]
    fn unchanged_snapshot_reports_nothing() {
        let (tree, _, _) = tree_with_children();
        assert!(tree.changed_components(&tree.clone()).is_empty());
    }
}
