//! Configuration schema and loading for the conversation-map sync service.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Loading and validation entry points.
pub use loader::{load_from_path, load_from_str, validate};
/// Configuration schema models.
pub use model::*;
