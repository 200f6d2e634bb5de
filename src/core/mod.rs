// Public modules
pub mod cleanup;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod params;
pub mod pipeline;
pub mod prompt;
pub mod provision;
pub mod proxy;
pub mod source;
pub mod ssh;
pub mod sync;
pub mod validate;

// Re-export common types for convenience
pub use error::{Error, Result};
