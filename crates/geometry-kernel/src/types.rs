use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

pub use cad_types::TopoKind;

/// Reference-counted handle to kernel geometry (edge, wire, face or solid).
///
/// The payload belongs to the kernel that created it. Cloning a handle
/// shares the geometry; it is freed when the last cache slot holding a
/// clone is dropped.
#[derive(Clone)]
pub struct ShapeHandle {
    inner: Rc<dyn Any>,
}

impl ShapeHandle {
    pub fn new<T: Any>(payload: T) -> Self {
        Self {
            inner: Rc::new(payload),
        }
    }

    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// True when both handles point at the same geometry.
    pub fn ptr_eq(a: &ShapeHandle, b: &ShapeHandle) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of live handles sharing this geometry.
    pub fn share_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl fmt::Debug for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeHandle({:p})", Rc::as_ptr(&self.inner))
    }
}

/// A face or edge of a shape. `id` is the kernel's persistent identity for
/// the entity; `owner` is the shape it was listed from.
#[derive(Debug, Clone)]
pub struct TopoEntity {
    pub id: Uuid,
    pub kind: TopoKind,
    pub owner: ShapeHandle,
}

/// Volume, surface area and centroid of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub volume: f64,
    pub area: f64,
    pub centroid: [f64; 3],
}

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("shell failed: {reason}")]
    ShellFailed { reason: String },

    #[error("draft failed: {reason}")]
    DraftFailed { reason: String },

    #[error("invalid wire: {reason}")]
    InvalidWire { reason: String },

    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("entity not found: {id}")]
    EntityNotFound { id: Uuid },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Tessellated triangle mesh for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals [nx0, ny0, nz0, ...].
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
