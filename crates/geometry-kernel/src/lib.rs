pub mod mock_kernel;
pub mod traits;
pub mod types;

pub use mock_kernel::{KernelOp, MockKernel};
pub use traits::*;
pub use types::*;
