//! Procedural sprite sheets for running without an image generator.
//!
//! The painted sheets follow the same layout a generated sheet is expected to
//! have: six face frames side by side on a black background, each frame well
//! inside the default atlas area window.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::SpriteError;

pub const SHEET_FRAMES: u32 = 6;
const CELL: u32 = 256;
const FACE_RADIUS: i64 = 95;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

const PALETTE: [[u8; 3]; 6] = [
    [250, 200, 60],
    [120, 210, 120],
    [240, 140, 170],
    [110, 180, 250],
    [250, 150, 80],
    [190, 150, 240],
];

/// Paint a six-frame face sheet. `seed` picks the face colour.
pub fn paint_sheet(seed: u64) -> RgbaImage {
    let colour = PALETTE[(seed % PALETTE.len() as u64) as usize];
    let colour = Rgba([colour[0], colour[1], colour[2], 255]);
    let mut img = RgbaImage::from_pixel(CELL * SHEET_FRAMES, CELL * 2, BACKGROUND);

    // Mouth half-widths cycle to give a chewing/smiling loop.
    let mouths = [20i64, 30, 40, 30, 20, 26];
    for frame in 0..SHEET_FRAMES {
        let cx = (CELL * frame + CELL / 2) as i64;
        let cy = CELL as i64;
        fill_disc(&mut img, cx, cy, FACE_RADIUS, colour);

        let eye_y = cy - 25;
        if frame == 2 {
            // Blink.
            fill_rect(&mut img, cx - 47, eye_y - 2, 24, 4, BACKGROUND);
            fill_rect(&mut img, cx + 23, eye_y - 2, 24, 4, BACKGROUND);
        } else {
            fill_disc(&mut img, cx - 35, eye_y, 12, BACKGROUND);
            fill_disc(&mut img, cx + 35, eye_y, 12, BACKGROUND);
        }

        let half = mouths[frame as usize];
        fill_rect(&mut img, cx - half, cy + 35, half * 2, 6, BACKGROUND);
    }
    img
}

/// Paint a single grey face with crossed-out eyes.
pub fn paint_farewell() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(CELL * 2, CELL * 2, BACKGROUND);
    let c = CELL as i64;
    fill_disc(&mut img, c, c, 150, Rgba([150, 150, 150, 255]));
    for eye_x in [c - 55, c + 55] {
        for d in -18i64..=18 {
            fill_rect(&mut img, eye_x + d - 2, c - 40 + d - 2, 4, 4, BACKGROUND);
            fill_rect(&mut img, eye_x + d - 2, c - 40 - d - 2, 4, 4, BACKGROUND);
        }
    }
    fill_rect(&mut img, c - 45, c + 60, 90, 6, BACKGROUND);
    img
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, SpriteError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn fill_disc(img: &mut RgbaImage, cx: i64, cy: i64, r: i64, colour: Rgba<u8>) {
    for y in (cy - r)..=(cy + r) {
        for x in (cx - r)..=(cx + r) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r * r {
                put(img, x, y, colour);
            }
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x0: i64, y0: i64, w: i64, h: i64, colour: Rgba<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            put(img, x, y, colour);
        }
    }
}

fn put(img: &mut RgbaImage, x: i64, y: i64, colour: Rgba<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    img.put_pixel(x as u32, y as u32, colour);
}
