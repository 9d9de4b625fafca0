use std::path::Path;

use image::DynamicImage;

use crate::atlas::{read_entry, AtlasEntry};
use crate::error::SpriteError;
use crate::sheet::absolute_key;
use crate::types::Frame;

/// Crop every frame of `entry` out of a decoded sheet.
///
/// Atlas rects use a bottom-left origin; they are flipped back to image
/// coordinates before cropping. A rect reaching outside the sheet is an
/// error rather than a silently clipped frame.
pub fn frames_from_entry(
    sheet: &DynamicImage,
    entry: &AtlasEntry,
) -> Result<Vec<Frame>, SpriteError> {
    let (sheet_w, sheet_h) = (sheet.width(), sheet.height());

    entry
        .frames
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            let fits_x = rect.x.checked_add(rect.w).is_some_and(|right| right <= sheet_w);
            let top = rect.top(sheet_h).filter(|_| fits_x).ok_or_else(|| {
                SpriteError::Atlas(format!(
                    "{} [{}, {}, {}, {}] lies outside the {sheet_w}×{sheet_h} sheet",
                    AtlasEntry::frame_name(i),
                    rect.x,
                    rect.y,
                    rect.w,
                    rect.h
                ))
            })?;

            let sub = sheet.crop_imm(rect.x, top, rect.w, rect.h);
            Ok(Frame {
                data: sub.to_rgba8().into_raw(),
                width: rect.w,
                height: rect.h,
            })
        })
        .collect()
}

/// Load the animation frames for the sheet at `sheet_path`.
///
/// The atlas entry is looked up by the sheet's absolute path, matching the
/// key written when the atlas was built.
pub fn load_frames(sheet_path: &Path, atlas_path: &Path) -> Result<Vec<Frame>, SpriteError> {
    let key = absolute_key(sheet_path);
    let entry = read_entry(atlas_path, &key)?;
    let sheet = image::open(sheet_path)?;
    let frames = frames_from_entry(&sheet, &entry)?;
    tracing::debug!(
        sheet = %sheet_path.display(),
        frames = frames.len(),
        "loaded animation frames"
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{extract_atlas, AtlasBuilder};
    use crate::painter;
    use crate::sheet::save_next_sheet;
    use crate::types::FrameRect;
    use image::{Rgba, RgbaImage};

    #[test]
    fn crop_uses_bottom_left_origin() {
        // 4×4 sheet: bottom-left 2×2 block is red, everything else black.
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        for y in 2..4 {
            for x in 0..2 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let sheet = DynamicImage::ImageRgba8(img);
        let entry = AtlasEntry {
            source: "s".into(),
            frames: vec![FrameRect {
                x: 0,
                y: 0,
                w: 2,
                h: 2,
            }],
        };

        let frames = frames_from_entry(&sheet, &entry).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].width, 2);
        assert_eq!(frames[0].data.len(), 2 * 2 * 4);
        assert!(frames[0].data.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
    }

    #[test]
    fn out_of_bounds_rect_is_rejected() {
        let sheet = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        let entry = AtlasEntry {
            source: "s".into(),
            frames: vec![FrameRect {
                x: 8,
                y: 0,
                w: 5,
                h: 5,
            }],
        };
        let err = frames_from_entry(&sheet, &entry).unwrap_err();
        assert!(err.to_string().contains("frame1"));
    }

    #[test]
    fn load_frames_round_trips_through_atlas_file() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = painter::encode_png(&painter::paint_sheet(2)).unwrap();
        let saved = save_next_sheet(dir.path(), &bytes).unwrap();

        let key = absolute_key(&saved.path);
        let entry = extract_atlas(&saved.image, key, 20, &AtlasBuilder::default()).unwrap();
        let atlas_path = dir.path().join("mapping.atlas");
        entry.write_file(&atlas_path).unwrap();

        let frames = load_frames(&saved.path, &atlas_path).unwrap();
        assert_eq!(frames.len(), painter::SHEET_FRAMES as usize);
        // The frame corner sits outside the disc, so it is background.
        assert_eq!(&frames[0].data[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn load_frames_without_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let atlas_path = dir.path().join("mapping.atlas");
        std::fs::write(&atlas_path, "{}").unwrap();
        let err = load_frames(&dir.path().join("pet_1.png"), &atlas_path).unwrap_err();
        assert!(matches!(err, SpriteError::Atlas(_)));
    }
}
