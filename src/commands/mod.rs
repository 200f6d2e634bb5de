pub mod cleanup;
pub mod deploy;
