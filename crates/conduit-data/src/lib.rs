//! Content loading for the conduit engine: block families, path descriptors
//! and engine configuration from RON, TOML or JSON files.

pub mod content;
pub mod loader;
pub mod schema;

pub use content::{Content, load_config, load_content};
pub use loader::{DataLoadError, Format};
