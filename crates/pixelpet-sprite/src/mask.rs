use image::DynamicImage;

use crate::error::SpriteError;

/// Default luminance cut-off separating sprite pixels from the background.
pub const DEFAULT_LUMINANCE_THRESHOLD: u8 = 20;

/// Binary occupancy grid built from a raster image.
///
/// A cell is `true` when the source pixel's luminance is strictly above the
/// threshold. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl PixelMask {
    /// Threshold `image` by luminance.
    ///
    /// Luminance uses the ITU-R 601-2 luma transform on the RGB channels;
    /// alpha is ignored.
    pub fn build(image: &DynamicImage, threshold: u8) -> Result<Self, SpriteError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_fn(width, height, |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            luminance(r, g, b) > threshold
        })
    }

    /// Build a mask by evaluating `f(x, y)` for every cell.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> bool,
    ) -> Result<Self, SpriteError> {
        if width == 0 || height == 0 {
            return Err(SpriteError::InvalidImage(format!(
                "image has zero area ({width}×{height})"
            )));
        }

        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cell value at `(x, y)`; out-of-bounds reads are `false`.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[self.index(x, y)]
    }

    /// Number of `true` cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub(crate) fn cells(&self) -> &[bool] {
        &self.cells
    }
}

/// Integer luma matching the common `L = R*299/1000 + G*587/1000 + B*114/1000`
/// greyscale conversion, rounded to nearest.
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn luminance_of_grey_is_identity() {
        for v in [0u8, 1, 20, 21, 128, 255] {
            assert_eq!(luminance(v, v, v), v);
        }
    }

    #[test]
    fn threshold_is_strict() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([20]));
        img.put_pixel(1, 0, Luma([21]));
        img.put_pixel(2, 0, Luma([0]));
        let mask = PixelMask::build(&DynamicImage::ImageLuma8(img), 20).unwrap();
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(!mask.get(2, 0));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn alpha_is_ignored() {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 0]));
        let mask = PixelMask::build(&DynamicImage::ImageRgba8(img), 20).unwrap();
        assert!(mask.get(0, 0));
    }

    #[test]
    fn dark_blue_stays_background() {
        // Pure blue at 255 has luma ~29, a dimmer blue drops below 20.
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 150, 255]));
        let mask = PixelMask::build(&DynamicImage::ImageRgba8(img), 20).unwrap();
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn zero_area_is_invalid() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 5));
        let err = PixelMask::build(&img, 20).unwrap_err();
        assert!(matches!(err, SpriteError::InvalidImage(_)));
    }

    #[test]
    fn out_of_bounds_reads_are_false() {
        let mask = PixelMask::from_fn(2, 2, |_, _| true).unwrap();
        assert!(mask.get(1, 1));
        assert!(!mask.get(2, 0));
        assert!(!mask.get(0, 2));
    }
}
