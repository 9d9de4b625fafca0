use std::collections::BTreeMap;
use std::path::Path;

use image::DynamicImage;
use pixelpet_config::{fs::write_atomic, SpriteSettings};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::SpriteError;
use crate::labeler::{label, Component};
use crate::mask::PixelMask;
use crate::types::FrameRect;

/// Open interval of accepted bounding-box areas, in px².
///
/// The defaults match one face sprite in a generated sheet: anything at or
/// below the floor is noise, anything at or above the ceiling is background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaWindow {
    pub min_exclusive: u64,
    pub max_exclusive: u64,
}

impl Default for AreaWindow {
    fn default() -> Self {
        Self {
            min_exclusive: 25_000,
            max_exclusive: 230_000,
        }
    }
}

impl AreaWindow {
    pub fn contains(&self, area: u64) -> bool {
        self.min_exclusive < area && area < self.max_exclusive
    }
}

/// Turns labelled components into an ordered frame table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtlasBuilder {
    window: AreaWindow,
}

impl AtlasBuilder {
    pub fn new(window: AreaWindow) -> Self {
        Self { window }
    }

    pub fn from_settings(settings: &SpriteSettings) -> Self {
        Self::new(AreaWindow {
            min_exclusive: settings.min_frame_area,
            max_exclusive: settings.max_frame_area,
        })
    }

    pub fn window(&self) -> AreaWindow {
        self.window
    }

    /// Filter, order and remap `components` into an [`AtlasEntry`].
    ///
    /// Components outside the area window are dropped; survivors are sorted
    /// by `min_x` and flipped to a bottom-left origin against `image_height`.
    pub fn build(
        &self,
        components: &[Component],
        image_height: u32,
        source_id: impl Into<String>,
    ) -> AtlasEntry {
        let mut accepted: Vec<&Component> = components
            .iter()
            .filter(|c| self.window.contains(c.area()))
            .collect();
        // Stable sort keeps discovery order for frames sharing a column.
        accepted.sort_by_key(|c| c.min_x);

        let frames = accepted
            .into_iter()
            .map(|c| FrameRect {
                x: c.min_x,
                y: image_height.saturating_sub(c.min_y + c.height()),
                w: c.width(),
                h: c.height(),
            })
            .collect::<Vec<_>>();

        let source = source_id.into();
        tracing::debug!(
            source = %source,
            candidates = components.len(),
            frames = frames.len(),
            "built atlas entry"
        );
        AtlasEntry { source, frames }
    }
}

/// Frame table for one sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasEntry {
    /// Absolute path (or other identifier) of the sheet.
    pub source: String,
    /// Frames in playback order; `frames[0]` is `frame1`.
    pub frames: Vec<FrameRect>,
}

impl AtlasEntry {
    /// Name of the frame at zero-based `index` (`frame1`, `frame2`, ...).
    pub fn frame_name(index: usize) -> String {
        format!("frame{}", index + 1)
    }

    /// Encode as the atlas file document: `{source: {frame1: [x,y,w,h], ...}}`.
    pub fn to_json(&self) -> Result<String, SpriteError> {
        let doc = AtlasDocument(std::slice::from_ref(self));
        serde_json::to_string_pretty(&doc)
            .map_err(|err| SpriteError::Atlas(format!("failed to encode atlas: {err}")))
    }

    /// Overwrite the atlas file with this entry as its only record.
    pub fn write_file(&self, path: &Path) -> Result<(), SpriteError> {
        let json = self.to_json()?;
        write_atomic(path, json.as_bytes()).map_err(|err| SpriteError::io("write", path, err))?;
        tracing::info!(
            path = %path.display(),
            source = %self.source,
            frames = self.frames.len(),
            "atlas written"
        );
        Ok(())
    }
}

impl Serialize for AtlasEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.frames.len()))?;
        for (i, frame) in self.frames.iter().enumerate() {
            map.serialize_entry(&Self::frame_name(i), &frame.to_array())?;
        }
        map.end()
    }
}

struct AtlasDocument<'a>(&'a [AtlasEntry]);

impl Serialize for AtlasDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.source, entry)?;
        }
        map.end()
    }
}

/// Parse every entry of an atlas document.
///
/// Frames are ordered by their numeric suffix, so `frame10` follows `frame9`.
pub fn parse_atlas(json: &str) -> Result<Vec<AtlasEntry>, SpriteError> {
    let raw: BTreeMap<String, BTreeMap<String, [i64; 4]>> = serde_json::from_str(json)
        .map_err(|err| SpriteError::Atlas(format!("failed to parse atlas JSON: {err}")))?;

    raw.into_iter()
        .map(|(source, frames)| {
            let mut indexed = frames
                .into_iter()
                .map(|(name, rect)| Ok((frame_index(&name)?, to_rect(&name, rect)?)))
                .collect::<Result<Vec<_>, SpriteError>>()?;
            indexed.sort_by_key(|(idx, _)| *idx);
            Ok(AtlasEntry {
                source,
                frames: indexed.into_iter().map(|(_, rect)| rect).collect(),
            })
        })
        .collect()
}

/// Read the atlas file and return the entry recorded for `source`.
pub fn read_entry(path: &Path, source: &str) -> Result<AtlasEntry, SpriteError> {
    let json =
        std::fs::read_to_string(path).map_err(|err| SpriteError::io("read", path, err))?;
    parse_atlas(&json)?
        .into_iter()
        .find(|entry| entry.source == source)
        .ok_or_else(|| {
            SpriteError::Atlas(format!("no atlas entry for {source} in {}", path.display()))
        })
}

/// Run the full mask → label → build pipeline on a decoded sheet.
pub fn extract_atlas(
    sheet: &DynamicImage,
    source_id: impl Into<String>,
    threshold: u8,
    builder: &AtlasBuilder,
) -> Result<AtlasEntry, SpriteError> {
    let mask = PixelMask::build(sheet, threshold)?;
    let components = label(&mask);
    Ok(builder.build(&components, mask.height(), source_id))
}

fn frame_index(name: &str) -> Result<u32, SpriteError> {
    name.strip_prefix("frame")
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| SpriteError::Atlas(format!("unexpected frame name {name:?}")))
}

fn to_rect(name: &str, [x, y, w, h]: [i64; 4]) -> Result<FrameRect, SpriteError> {
    let field = |v: i64| {
        u32::try_from(v)
            .map_err(|_| SpriteError::Atlas(format!("{name} has out-of-range coordinate {v}")))
    };
    Ok(FrameRect {
        x: field(x)?,
        y: field(y)?,
        w: field(w)?,
        h: field(h)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn square_mask(width: u32, height: u32, squares: &[(u32, u32, u32)]) -> PixelMask {
        PixelMask::from_fn(width, height, |x, y| {
            squares
                .iter()
                .any(|&(sx, sy, side)| x >= sx && x < sx + side && y >= sy && y < sy + side)
        })
        .unwrap()
    }

    #[test]
    fn two_squares_become_two_ordered_frames() {
        // The right square is higher up, so it is discovered first.
        let mask = square_mask(700, 300, &[(450, 10, 200), (20, 60, 200)]);
        let comps = label(&mask);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].min_x, 450);

        let entry = AtlasBuilder::default().build(&comps, mask.height(), "/sheets/pet_1.png");
        assert_eq!(entry.frames.len(), 2);
        assert_eq!(
            entry.frames[0],
            FrameRect {
                x: 20,
                y: 300 - (60 + 200),
                w: 200,
                h: 200
            }
        );
        assert_eq!(
            entry.frames[1],
            FrameRect {
                x: 450,
                y: 300 - (10 + 200),
                w: 200,
                h: 200
            }
        );
    }

    #[test]
    fn area_window_boundaries_are_exclusive() {
        let builder = AtlasBuilder::default();
        let cases = [
            (Component::from_bounds(0, 0, 125, 200), false), // 25,000
            (Component::from_bounds(0, 0, 1, 25_001), true),
            (Component::from_bounds(0, 0, 7, 32_857), true), // 229,999
            (Component::from_bounds(0, 0, 460, 500), false), // 230,000
        ];
        for (comp, kept) in cases {
            let entry = builder.build(&[comp], 40_000, "s");
            assert_eq!(
                entry.frames.len() == 1,
                kept,
                "area {} kept={kept}",
                comp.area()
            );
        }
    }

    #[test]
    fn noise_and_background_are_dropped() {
        let comps = [
            Component::from_bounds(5, 5, 3, 3),
            Component::from_bounds(0, 0, 1024, 1024),
            Component::from_bounds(300, 100, 180, 180),
        ];
        let entry = AtlasBuilder::default().build(&comps, 1024, "s");
        assert_eq!(entry.frames.len(), 1);
        assert_eq!(entry.frames[0].x, 300);
    }

    #[test]
    fn custom_window_from_settings() {
        let settings = SpriteSettings {
            min_frame_area: 10,
            max_frame_area: 100,
            ..SpriteSettings::default()
        };
        let builder = AtlasBuilder::from_settings(&settings);
        let entry = builder.build(&[Component::from_bounds(0, 0, 5, 5)], 10, "s");
        assert_eq!(entry.frames.len(), 1);
    }

    #[test]
    fn json_keeps_numeric_frame_order() {
        let entry = AtlasEntry {
            source: "/abs/pet_3.png".into(),
            frames: (0..11)
                .map(|i| FrameRect {
                    x: i * 10,
                    y: 1,
                    w: 2,
                    h: 3,
                })
                .collect(),
        };
        let json = entry.to_json().unwrap();
        let frame2 = json.find("\"frame2\"").unwrap();
        let frame10 = json.find("\"frame10\"").unwrap();
        assert!(frame2 < frame10, "frames must be written in index order");

        let parsed = parse_atlas(&json).unwrap();
        assert_eq!(parsed, vec![entry]);
    }

    #[test]
    fn document_shape_matches_player_format() {
        let entry = AtlasEntry {
            source: "/abs/pet_1.png".into(),
            frames: vec![FrameRect {
                x: 4,
                y: 5,
                w: 6,
                h: 7,
            }],
        };
        let value: serde_json::Value = serde_json::from_str(&entry.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "/abs/pet_1.png": { "frame1": [4, 5, 6, 7] } })
        );
    }

    #[test]
    fn malformed_atlas_is_rejected() {
        let err = parse_atlas("{\"a\": {\"frameX\": [1,2,3,4]}}").unwrap_err();
        assert!(err.to_string().contains("unexpected frame name"));

        let err = parse_atlas("{\"a\": {\"frame1\": [-1,2,3,4]}}").unwrap_err();
        assert!(err.to_string().contains("out-of-range"));

        assert!(parse_atlas("not json").is_err());
    }

    #[test]
    fn write_file_overwrites_previous_atlas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.atlas");
        let first = AtlasEntry {
            source: "/abs/pet_1.png".into(),
            frames: vec![],
        };
        let second = AtlasEntry {
            source: "/abs/pet_2.png".into(),
            frames: vec![FrameRect {
                x: 1,
                y: 1,
                w: 1,
                h: 1,
            }],
        };
        first.write_file(&path).unwrap();
        second.write_file(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_atlas(&json).unwrap(), vec![second.clone()]);
        assert_eq!(read_entry(&path, "/abs/pet_2.png").unwrap(), second);
        assert!(read_entry(&path, "/abs/pet_1.png").is_err());
    }

    #[test]
    fn extract_atlas_runs_full_pipeline() {
        let mut img = RgbImage::new(600, 260);
        for (sx, sy) in [(360u32, 20u32), (40, 40)] {
            for y in sy..sy + 200 {
                for x in sx..sx + 200 {
                    img.put_pixel(x, y, Rgb([200, 180, 40]));
                }
            }
        }
        // A speck of noise.
        img.put_pixel(5, 5, Rgb([255, 255, 255]));

        let sheet = DynamicImage::ImageRgb8(img);
        let entry = extract_atlas(&sheet, "sheet", 20, &AtlasBuilder::default()).unwrap();
        assert_eq!(entry.frames.len(), 2);
        assert_eq!(entry.frames[0].x, 40);
        assert_eq!(entry.frames[0].y, 260 - 240);
        assert_eq!(entry.frames[1].x, 360);
    }

    #[test]
    fn extract_atlas_rejects_empty_image() {
        let sheet = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let err = extract_atlas(&sheet, "sheet", 20, &AtlasBuilder::default()).unwrap_err();
        assert!(matches!(err, SpriteError::InvalidImage(_)));
    }
}
