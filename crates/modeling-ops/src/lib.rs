pub mod boolean;
pub mod draft;
pub mod extrude;
pub mod fillet;
pub mod kernel_ext;
pub mod profile;
pub mod revolve;
pub mod shell;
pub mod types;

pub use boolean::apply_operation;
pub use draft::draft_faces;
pub use extrude::{extrude_faces, extrude_symmetric};
pub use fillet::fillet_edges;
pub use kernel_ext::KernelBundle;
pub use profile::make_profile_face;
pub use revolve::revolve_faces;
pub use shell::shell_solid;
pub use types::*;
