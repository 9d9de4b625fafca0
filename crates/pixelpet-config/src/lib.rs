//! Configuration types and loaders for pixelpet.
//!
//! This crate owns the on-disk configuration schema (and the small file
//! helpers every persisted document shares) so the runtime crates have a
//! single source of truth.

pub mod fs;
pub mod settings;

pub use settings::{
    config_path, GeneratorSettings, LifecycleSettings, PathSettings, Settings, SpriteSettings,
};
