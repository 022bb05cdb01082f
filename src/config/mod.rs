//! Settings loading for pipewright.
//!
//! This module handles the process-wide settings object:
//! - Schema definitions in [`settings`]
//! - File discovery and layering in [`loader`]
//! - Deep merging over defaults in [`merger`]
//! - `.env` parsing in [`env_file`]
//!
//! # Example
//!
//! ```
//! use pipewright::config::load_settings;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("pipewright.yml"), "runtime:\n  dry_run: true\n").unwrap();
//!
//! let settings = load_settings(temp.path(), None).unwrap();
//! assert!(settings.runtime.dry_run);
//! assert_eq!(settings.runtime.log_level, "info");
//! ```

pub mod env_file;
pub mod loader;
pub mod merger;
pub mod settings;

pub use env_file::EnvFileParser;
pub use loader::{
    apply_env_overrides, load_settings, load_settings_file, load_settings_with_env,
    parse_settings, ENV_FILE, ENV_KEYS, SETTINGS_FILE,
};
pub use merger::deep_merge;
pub use settings::{RuntimeSettings, Settings, CONFIG_NAMESPACES};
