//! gbridge Conflict - Overwrite decisions for folder sync
//!
//! Provides:
//! - The [`Decision`] between overwriting a destination file and skipping it
//! - [`ConflictResolver`], which decides from modification timestamps

pub mod error;
pub mod resolver;

pub use error::ConflictError;
pub use resolver::{ConflictResolver, Decision};
