use serde::{Deserialize, Serialize};

/// The kind of topological entity a reference or kernel query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoKind {
    Edge,
    Face,
}
