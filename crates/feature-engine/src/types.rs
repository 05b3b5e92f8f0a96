use std::fmt;

use cad_types::{AxialRef, EdgeRef, FaceRef, PlanarRef, ProfileRef, Sketch};
use modeling_ops::Operation;
use sketch_profiles::SolveError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single step of the modeling history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Unique identifier.
    pub id: Uuid,
    /// The component this feature works on. For `New Component` this is the
    /// parent the new component is added to.
    pub component_id: Uuid,
    /// Persisted as `{"title": ..., "values": {...}}`.
    #[serde(flatten)]
    pub kind: FeatureKind,
    /// Outcome of the last execution. Not persisted.
    #[serde(skip)]
    pub error: Option<FeatureError>,
    #[serde(skip)]
    pub state: FeatureState,
}

/// The operation a feature performs, with its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "title", content = "values")]
pub enum FeatureKind {
    #[serde(rename = "New Component")]
    NewComponent(NewComponentSettings),
    Sketch(SketchSettings),
    Extrusion(ExtrusionSettings),
    Revolution(RevolutionSettings),
    Fillet(FilletSettings),
    Draft(DraftSettings),
    /// Hollowing by offset of the remaining faces.
    Shell(ShellSettings),
}

impl FeatureKind {
    pub fn title(&self) -> &'static str {
        match self {
            FeatureKind::NewComponent(_) => "New Component",
            FeatureKind::Sketch(_) => "Sketch",
            FeatureKind::Extrusion(_) => "Extrusion",
            FeatureKind::Revolution(_) => "Revolution",
            FeatureKind::Fillet(_) => "Fillet",
            FeatureKind::Draft(_) => "Draft",
            FeatureKind::Shell(_) => "Shell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComponentSettings {
    /// Id given to the created component.
    pub component: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchSettings {
    #[serde(default)]
    pub plane: Option<PlanarRef>,
    pub sketch: Sketch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionSettings {
    #[serde(default)]
    pub profiles: Vec<ProfileRef>,
    /// Extrusion direction. Defaults to the sketch plane normal.
    #[serde(default)]
    pub axis: Option<AxialRef>,
    pub distance: f64,
    /// `true` extrudes along the direction, `false` against it.
    #[serde(default = "default_side")]
    pub side: bool,
    /// Split the distance evenly to both sides of the sketch plane.
    /// Overrides `side`.
    #[serde(default)]
    pub symmetric: bool,
    #[serde(default)]
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevolutionSettings {
    #[serde(default)]
    pub profiles: Vec<ProfileRef>,
    #[serde(default)]
    pub axis: Option<AxialRef>,
    /// Degrees.
    pub angle: f64,
    #[serde(default = "default_side")]
    pub side: bool,
    #[serde(default)]
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilletSettings {
    #[serde(default)]
    pub edges: Vec<EdgeRef>,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    /// Neutral plane; its normal is the pull direction.
    #[serde(default)]
    pub plane: Option<PlanarRef>,
    #[serde(default)]
    pub faces: Vec<FaceRef>,
    /// Degrees.
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellSettings {
    /// Faces removed to open the shell.
    #[serde(default)]
    pub faces: Vec<FaceRef>,
    pub distance: f64,
    /// `true` thickens inward, `false` outward.
    #[serde(default)]
    pub side: bool,
}

fn default_side() -> bool {
    true
}

/// Where a feature stands after its last execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureState {
    /// A required reference is not set; the feature is skipped.
    #[default]
    Incomplete,
    /// All required settings are present but the feature has not run.
    Ready,
    /// The feature changed the tree, possibly with a warning.
    Executed,
    /// The feature failed; its step keeps the tree it was given.
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A problem recorded on a feature for display. Warnings still let the
/// feature execute; errors roll its step back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureError {
    pub severity: Severity,
    pub message: String,
}

impl FeatureError {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors from the timeline API itself. Feature failures are recorded on
/// the feature instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("feature not found: {id}")]
    FeatureNotFound { id: Uuid },

    #[error("marker {marker} out of range (timeline has {len} features)")]
    MarkerOutOfRange { marker: usize, len: usize },

    #[error("feature {id} is not a sketch")]
    NotASketch { id: Uuid },

    #[error("sketch element not found: {id}")]
    ElementNotFound { id: Uuid },

    #[error("element {element} has no handle {handle}")]
    UnknownHandle { element: Uuid, handle: usize },

    #[error(transparent)]
    Solve(#[from] SolveError),
}
