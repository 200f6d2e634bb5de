pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `dockhand::params` instead of `dockhand::core::params`
pub use core::*;
pub use utils::*;
