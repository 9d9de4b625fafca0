use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::DynamicImage;
use pixelpet_config::Settings;
use pixelpet_sprite::sheet::{absolute_key, save_next_sheet, save_png, sheet_path, SavedSheet};
use pixelpet_sprite::{extract_atlas, AtlasBuilder, AtlasEntry, SpriteError};

use crate::error::SessionError;
use crate::generate::Generator;
use crate::pet::Pet;
use crate::prompt;
use crate::save::SaveStore;

pub const FAREWELL_FILE: &str = "pet_dead.png";

/// Turns generated images into stored sheets and atlas entries.
#[derive(Debug, Clone)]
pub struct SpritePipeline {
    animations_dir: PathBuf,
    atlas_file: PathBuf,
    threshold: u8,
    builder: AtlasBuilder,
}

impl SpritePipeline {
    pub fn new(
        animations_dir: impl Into<PathBuf>,
        atlas_file: impl Into<PathBuf>,
        threshold: u8,
        builder: AtlasBuilder,
    ) -> Self {
        Self {
            animations_dir: animations_dir.into(),
            atlas_file: atlas_file.into(),
            threshold,
            builder,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.paths.animations_dir,
            &settings.paths.atlas_file,
            settings.sprite.luminance_threshold,
            AtlasBuilder::from_settings(&settings.sprite),
        )
    }

    pub fn animations_dir(&self) -> &Path {
        &self.animations_dir
    }

    pub fn atlas_file(&self) -> &Path {
        &self.atlas_file
    }

    /// Where sheet number `number` lives.
    pub fn sheet_for(&self, number: u32) -> PathBuf {
        sheet_path(&self.animations_dir, number)
    }

    /// Build the atlas entry for a stored sheet and overwrite the atlas file.
    ///
    /// Nothing is written if extraction fails.
    pub fn index_sheet(&self, path: &Path, image: &DynamicImage) -> Result<AtlasEntry, SpriteError> {
        let entry = extract_atlas(image, absolute_key(path), self.threshold, &self.builder)?;
        if entry.frames.is_empty() {
            tracing::warn!(sheet = %path.display(), "no frames found in sprite sheet");
        }
        entry.write_file(&self.atlas_file)?;
        Ok(entry)
    }

    /// Index a sheet already on disk.
    pub fn index_existing(&self, path: &Path) -> Result<AtlasEntry, SpriteError> {
        let image = image::open(path)?;
        self.index_sheet(path, &image)
    }

    /// Ask for a sprite sheet of `animal`, store it, and index it.
    pub fn generate_sheet<G: Generator + ?Sized>(
        &self,
        generator: &mut G,
        animal: &str,
    ) -> Result<(SavedSheet, AtlasEntry), SessionError> {
        let bytes = generator.generate_image(&prompt::sprite_sheet(animal))?;
        let saved = save_next_sheet(&self.animations_dir, &bytes)?;
        let entry = self.index_sheet(&saved.path, &saved.image)?;
        tracing::info!(
            animal,
            sheet = saved.number,
            frames = entry.frames.len(),
            "generated sprite sheet"
        );
        Ok((saved, entry))
    }

    /// Ask for a farewell picture of `animal` and store it.
    pub fn generate_farewell<G: Generator + ?Sized>(
        &self,
        generator: &mut G,
        animal: &str,
    ) -> Result<PathBuf, SessionError> {
        let bytes = generator.generate_image(&prompt::farewell(animal))?;
        let path = self.animations_dir.join(FAREWELL_FILE);
        save_png(&path, &bytes)?;
        tracing::info!(path = %path.display(), "saved farewell image");
        Ok(path)
    }
}

/// Finalize a candidate: name it, give it a sprite sheet, and save it.
///
/// A blank `name` keeps the candidate's current one. The vitals clocks
/// restart at `now`, so time spent browsing candidates is not charged.
pub fn adopt<G: Generator + ?Sized>(
    mut candidate: Pet,
    name: &str,
    generator: &mut G,
    pipeline: &SpritePipeline,
    store: &SaveStore,
    now: DateTime<Utc>,
) -> Result<Pet, SessionError> {
    let name = name.trim();
    if !name.is_empty() {
        candidate.name = name.to_string();
    }

    let (sheet, _) = pipeline.generate_sheet(generator, &candidate.animal_type)?;
    candidate.image_number = Some(sheet.number);

    let state = &mut candidate.state;
    state.last_fed = now;
    state.last_played = now;
    state.last_chatted = now;
    state.decay = Default::default();

    store.save(&candidate)?;
    tracing::info!(
        name = %candidate.name,
        animal = %candidate.animal_type,
        sheet = sheet.number,
        "adopted pet"
    );
    Ok(candidate)
}
