use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen regions of the care screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetRects {
    pub top: Rect,
    pub face: Rect,
    pub vitals: Rect,
    pub chat: Rect,
    pub log: Rect,
    pub help: Rect,
}

const VITALS_HEIGHT: u16 = 8;

/// Split `area` into a top bar, the sprite face beside vitals and chat, an
/// event log strip and a key-hint line.
pub fn pet_layout(area: Rect, face_width: u16, log_height: u16) -> PetRects {
    let log_height = log_height.min(area.height.saturating_sub(10));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),          // top bar
            Constraint::Min(6),             // face + vitals + chat
            Constraint::Length(log_height), // event log
            Constraint::Length(1),          // key hints
        ])
        .split(area);

    let main = rows[1];
    let face_width = face_width.min(main.width / 2).max(10.min(main.width));
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(face_width), Constraint::Min(10)])
        .split(main);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(VITALS_HEIGHT), Constraint::Min(3)])
        .split(cols[1]);

    PetRects {
        top: rows[0],
        face: cols[0],
        vitals: right[0],
        chat: right[1],
        log: rows[2],
        help: rows[3],
    }
}

/// A `width`×`height` rect centred in `area`, clipped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside(outer: Rect, inner: Rect) -> bool {
        inner.x >= outer.x
            && inner.y >= outer.y
            && inner.right() <= outer.right()
            && inner.bottom() <= outer.bottom()
    }

    #[test]
    fn regions_fit_and_stack() {
        let area = Rect::new(0, 0, 100, 40);
        let r = pet_layout(area, 40, 6);

        for rect in [r.top, r.face, r.vitals, r.chat, r.log, r.help] {
            assert!(inside(area, rect), "{rect:?} escapes {area:?}");
        }
        assert_eq!(r.top.height, 1);
        assert_eq!(r.help.height, 1);
        assert_eq!(r.log.height, 6);
        assert_eq!(r.face.width, 40);
        assert_eq!(r.vitals.x, r.chat.x);
        assert!(r.vitals.bottom() <= r.chat.y);
        assert_eq!(r.help.bottom(), area.bottom());
    }

    #[test]
    fn face_never_takes_more_than_half() {
        let r = pet_layout(Rect::new(0, 0, 60, 30), 200, 4);
        assert_eq!(r.face.width, 30);
    }

    #[test]
    fn small_terminal_shrinks_log() {
        let r = pet_layout(Rect::new(0, 0, 40, 12), 20, 8);
        assert!(r.log.height <= 2);
        assert!(r.face.height >= 6);
    }

    #[test]
    fn centered_clips_to_area() {
        let area = Rect::new(10, 5, 20, 10);
        assert_eq!(centered(area, 10, 4), Rect::new(15, 8, 10, 4));
        assert_eq!(centered(area, 50, 50), area);
    }
}
