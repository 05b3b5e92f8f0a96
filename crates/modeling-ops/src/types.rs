use std::fmt;

use geometry_kernel::KernelError;
use serde::{Deserialize, Serialize};

/// How a new tool body is combined with a component's existing compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Fuse the tool into the compound.
    #[default]
    Join,
    /// Remove the tool from the compound.
    Cut,
    /// Keep only the volume common to both.
    Intersect,
    /// Add the tool as a separate solid without fusing.
    Create,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Join => "join",
            Operation::Cut => "cut",
            Operation::Intersect => "intersect",
            Operation::Create => "create",
        })
    }
}

/// Errors from modeling operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("no profiles available for operation")]
    NoProfiles,

    #[error("Extrusion has no volume")]
    ExtrusionHasNoVolume,

    #[error("Revolution has no volume")]
    RevolutionHasNoVolume,

    #[error("Tool body has no volume")]
    EmptyTool,

    #[error("nothing to {operation}: component has no body")]
    NoTarget { operation: Operation },

    #[error("Fillet could not be built")]
    FilletFailed,

    #[error("Offset could not be built")]
    OffsetFailed,

    #[error("Could not close shell")]
    ShellNotClosed,

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}
