/// A single animation frame: raw RGBA pixel data at a known resolution.
///
/// Stored as a flat `Vec<u8>` in row-major RGBA order (4 bytes per pixel)
/// so consumers don't need to depend on the `image` crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw RGBA pixel data, length = `width * height * 4`.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// Where one frame lives in its sprite sheet.
///
/// Coordinates use a bottom-left origin: `y` is the distance from the bottom
/// edge of the sheet to the bottom edge of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl FrameRect {
    /// Top edge of the frame in top-left-origin image coordinates.
    ///
    /// Returns `None` if the rect does not fit in a sheet of `sheet_height`.
    pub fn top(&self, sheet_height: u32) -> Option<u32> {
        sheet_height.checked_sub(self.y.checked_add(self.h)?)
    }

    /// The `[x, y, w, h]` array stored in the atlas file.
    pub fn to_array(self) -> [u32; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_inverts_bottom_left_origin() {
        let rect = FrameRect {
            x: 10,
            y: 30,
            w: 50,
            h: 40,
        };
        // 100 - (30 + 40)
        assert_eq!(rect.top(100), Some(30));
    }

    #[test]
    fn top_rejects_rect_taller_than_sheet() {
        let rect = FrameRect {
            x: 0,
            y: 70,
            w: 5,
            h: 40,
        };
        assert_eq!(rect.top(100), None);
    }
}
