use pixelpet_sprite::Frame as SpriteFrame;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Pixels with less alpha than this are left empty.
const ALPHA_THRESHOLD: u8 = 128;

/// Draw a bordered panel titled `title` showing `frame` in half-block cells.
///
/// Each cell packs two vertically stacked pixels using `▀` (top pixel as
/// foreground, bottom as background). The frame is nearest-neighbour scaled
/// to the panel's inner area. Without a frame a placeholder line is shown.
pub fn render_face(buf: &mut Buffer, area: Rect, frame: Option<&SpriteFrame>, title: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    match frame {
        Some(frame) if frame_is_drawable(frame) => draw_pixels(buf, inner, frame),
        _ => render_placeholder(buf, inner),
    }
}

fn frame_is_drawable(frame: &SpriteFrame) -> bool {
    if frame.width == 0 || frame.height == 0 {
        return false;
    }
    u64::from(frame.width)
        .checked_mul(u64::from(frame.height))
        .and_then(|px| px.checked_mul(4))
        .is_some_and(|needed| frame.data.len() as u64 >= needed)
}

fn render_placeholder(buf: &mut Buffer, inner: Rect) {
    let middle = Rect {
        y: inner.y + inner.height / 2,
        height: 1,
        ..inner
    };
    Paragraph::new(Line::from("(no sprite yet)"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .render(middle, buf);
}

fn draw_pixels(buf: &mut Buffer, inner: Rect, frame: &SpriteFrame) {
    let (src_w, src_h) = (frame.width, frame.height);
    let cell_w = u32::from(inner.width);
    let cell_h = u32::from(inner.height);
    let pixel_h = cell_h * 2;

    for cy in 0..cell_h {
        for cx in 0..cell_w {
            let px = (cx * src_w) / cell_w;
            let top_py = (cy * 2 * src_h) / pixel_h;
            let bot_py = ((cy * 2 + 1) * src_h) / pixel_h;

            let (Some(top), Some(bot)) = (
                sample_pixel(&frame.data, src_w, px, top_py),
                sample_pixel(&frame.data, src_w, px, bot_py),
            ) else {
                continue;
            };

            let top_opaque = top[3] >= ALPHA_THRESHOLD;
            let bot_opaque = bot[3] >= ALPHA_THRESHOLD;
            if !top_opaque && !bot_opaque {
                continue;
            }

            let Some(cell) = buf.cell_mut((inner.x + cx as u16, inner.y + cy as u16)) else {
                continue;
            };
            match (top_opaque, bot_opaque) {
                (true, true) => {
                    cell.set_char('▀');
                    cell.set_fg(rgb(top));
                    cell.set_bg(rgb(bot));
                }
                (true, false) => {
                    cell.set_char('▀');
                    cell.set_fg(rgb(top));
                    cell.set_bg(Color::Reset);
                }
                _ => {
                    cell.set_char('▄');
                    cell.set_fg(rgb(bot));
                    cell.set_bg(Color::Reset);
                }
            }
        }
    }
}

fn rgb(p: [u8; 4]) -> Color {
    Color::Rgb(p[0], p[1], p[2])
}

/// RGBA pixel at (`x`, `y`) of row-major `data`, if in range.
fn sample_pixel(data: &[u8], width: u32, x: u32, y: u32) -> Option<[u8; 4]> {
    let idx = (y as usize)
        .checked_mul(width as usize)?
        .checked_add(x as usize)?
        .checked_mul(4)?;
    data.get(idx..idx + 4)?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> SpriteFrame {
        SpriteFrame {
            data: rgba.repeat((w * h) as usize),
            width: w,
            height: h,
        }
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map_or(" ", |c| c.symbol()).to_string())
            .collect()
    }

    #[test]
    fn solid_frame_fills_inner_area() {
        // 4×4 pixels into a 6×4 panel: inner 4×2 cells = 4×4 pixels.
        let area = Rect::new(0, 0, 6, 4);
        let mut buf = Buffer::empty(area);
        render_face(&mut buf, area, Some(&solid(4, 4, [255, 0, 0, 255])), "MOCHI");

        let cell = buf.cell((1, 1)).unwrap();
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(255, 0, 0));
        assert!(row_text(&buf, 0).contains("MOCHI"));
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let area = Rect::new(0, 0, 6, 4);
        let mut buf = Buffer::empty(area);
        render_face(&mut buf, area, Some(&solid(4, 4, [0, 255, 0, 0])), "PET");

        let cell = buf.cell((1, 1)).unwrap();
        assert_ne!(cell.symbol(), "▀");
        assert_ne!(cell.symbol(), "▄");
    }

    #[test]
    fn lower_half_only_uses_lower_block() {
        // Top two pixel rows transparent, bottom two opaque blue.
        let mut frame = solid(2, 4, [0, 0, 0, 0]);
        for px in frame.data.chunks_exact_mut(4).skip(4) {
            px.copy_from_slice(&[0, 0, 255, 255]);
        }
        // Inner 2×4 cells, 8 pixel rows: rows 4..8 sample the opaque half.
        let area = Rect::new(0, 0, 4, 6);
        let mut buf = Buffer::empty(area);
        render_face(&mut buf, area, Some(&frame), "PET");

        assert_ne!(buf.cell((1, 1)).unwrap().symbol(), "▄");
        let cell = buf.cell((1, 4)).unwrap();
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn missing_frame_shows_placeholder() {
        let area = Rect::new(0, 0, 24, 5);
        let mut buf = Buffer::empty(area);
        render_face(&mut buf, area, None, "PET");
        assert!(row_text(&buf, 2).contains("no sprite yet"));
    }

    #[test]
    fn short_data_falls_back_to_placeholder() {
        let area = Rect::new(0, 0, 24, 5);
        let mut buf = Buffer::empty(area);
        let broken = SpriteFrame {
            data: vec![0; 8],
            width: 4,
            height: 4,
        };
        render_face(&mut buf, area, Some(&broken), "PET");
        assert!(row_text(&buf, 2).contains("no sprite yet"));
    }

    #[test]
    fn empty_area_is_a_no_op() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 10));
        render_face(&mut buf, Rect::new(0, 0, 0, 0), Some(&solid(4, 4, [1, 2, 3, 255])), "PET");
        assert_eq!(buf, Buffer::empty(Rect::new(0, 0, 10, 10)));
    }
}
