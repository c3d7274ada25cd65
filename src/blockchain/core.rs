// core.rs splits responsibilities into submodules for easier maintenance.
pub mod block;
pub mod chain;
pub mod snapshot;
pub mod state;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use snapshot::*;
pub use state::*;
pub use validation::*;
