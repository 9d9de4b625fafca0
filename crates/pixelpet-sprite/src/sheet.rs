use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use pixelpet_config::fs::write_atomic;

use crate::error::SpriteError;

const SHEET_PREFIX: &str = "pet_";
const SHEET_SUFFIX: &str = ".png";

/// A sprite sheet persisted under the animations directory.
#[derive(Debug, Clone)]
pub struct SavedSheet {
    pub number: u32,
    pub path: PathBuf,
    pub image: DynamicImage,
}

/// Path of sheet `number` inside `dir` (`pet_<number>.png`).
pub fn sheet_path(dir: &Path, number: u32) -> PathBuf {
    dir.join(format!("{SHEET_PREFIX}{number}{SHEET_SUFFIX}"))
}

/// One more than the highest `pet_<n>.png` in `dir`, or 1 if there is none.
///
/// Files that don't follow the naming pattern are ignored. A missing
/// directory counts as empty.
pub fn next_sheet_number(dir: &Path) -> Result<u32, SpriteError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(1),
        Err(err) => return Err(SpriteError::io("list", dir, err)),
    };

    let highest = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            name.strip_prefix(SHEET_PREFIX)?
                .strip_suffix(SHEET_SUFFIX)?
                .parse::<u32>()
                .ok()
        })
        .max()
        .unwrap_or(0);
    Ok(highest + 1)
}

/// Decode `bytes` (PNG, JPEG, WebP or GIF) and store them as a PNG at `path`.
///
/// The file is replaced atomically; on any failure a previous file at
/// `path` is left as it was.
pub fn save_png(path: &Path, bytes: &[u8]) -> Result<DynamicImage, SpriteError> {
    let image = image::load_from_memory(bytes)?;
    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, ImageFormat::Png)?;
    write_atomic(path, encoded.get_ref()).map_err(|err| SpriteError::io("write", path, err))?;
    Ok(image)
}

/// Store freshly generated sheet bytes as the next numbered sheet in `dir`.
pub fn save_next_sheet(dir: &Path, bytes: &[u8]) -> Result<SavedSheet, SpriteError> {
    let number = next_sheet_number(dir)?;
    let path = sheet_path(dir, number);
    let image = save_png(&path, bytes)?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "saved sprite sheet"
    );
    Ok(SavedSheet {
        number,
        path,
        image,
    })
}

/// Absolute form of `path`, used as the sheet's atlas key.
///
/// Falls back to joining onto the current directory when the file can't be
/// canonicalized (e.g. it doesn't exist yet).
pub fn absolute_key(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    });
    absolute.to_string_lossy().into_owned()
}
