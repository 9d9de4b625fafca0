//! Sprite-sheet segmentation and playback for pixelpet.
//!
//! A generated sprite sheet is turned into a frame table in three passes:
//! [`PixelMask`] thresholds luminance, [`label`] flood-fills connected
//! components, and [`AtlasBuilder`] filters and orders them into an
//! [`AtlasEntry`]. The entry is persisted as the atlas file the animation
//! player reads back through [`loader`].
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use pixelpet_sprite::{extract_atlas, AtlasBuilder};
//!
//! let sheet = image::open("assets/pet_animations/pet_1.png").unwrap();
//! let entry = extract_atlas(&sheet, "/abs/pet_1.png", 20, &AtlasBuilder::default()).unwrap();
//! entry.write_file(Path::new("animation_mapping.atlas")).unwrap();
//! ```

pub mod animation;
pub mod atlas;
mod error;
pub mod labeler;
pub mod loader;
pub mod mask;
pub mod painter;
pub mod sheet;
mod types;

pub use animation::{Animation, FrameClock};
pub use atlas::{extract_atlas, AreaWindow, AtlasBuilder, AtlasEntry};
pub use error::SpriteError;
pub use labeler::{label, Component};
pub use mask::PixelMask;
pub use types::{Frame, FrameRect};
