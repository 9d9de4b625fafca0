use std::collections::VecDeque;

use crate::mask::PixelMask;

/// One 4-connected region of foreground cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Number of foreground cells in the region (not the bounding box).
    pub pixel_count: u64,
}

impl Component {
    /// A component covering a single cell.
    fn seed(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 0,
        }
    }

    /// Build a component from a bounding box alone.
    ///
    /// `pixel_count` is set to the full box area.
    pub fn from_bounds(min_x: u32, min_y: u32, width: u32, height: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x: min_x + width.saturating_sub(1),
            max_y: min_y + height.saturating_sub(1),
            pixel_count: width as u64 * height as u64,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Bounding-box area.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }
}

/// Extract every 4-connected component of `true` cells.
///
/// Cells are scanned in row-major order; each unvisited foreground cell seeds
/// a breadth-first fill that claims its whole region. Components are returned
/// in seed discovery order, not spatial order. Each cell is visited once.
pub fn label(mask: &PixelMask) -> Vec<Component> {
    let width = mask.width();
    let height = mask.height();
    let cells = mask.cells();

    let mut visited = vec![false; cells.len()];
    let mut components = Vec::new();
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            let idx = mask.index(x, y);
            if !cells[idx] || visited[idx] {
                continue;
            }

            visited[idx] = true;
            queue.push_back((x, y));
            let mut component = Component::seed(x, y);

            while let Some((cx, cy)) = queue.pop_front() {
                component.include(cx, cy);

                // Check all 4 direct neighbours (not diagonals).
                let neighbours = [
                    (cx.checked_add(1), Some(cy)),
                    (cx.checked_sub(1), Some(cy)),
                    (Some(cx), cy.checked_add(1)),
                    (Some(cx), cy.checked_sub(1)),
                ];
                for (nx, ny) in neighbours {
                    let (Some(nx), Some(ny)) = (nx, ny) else {
                        continue;
                    };
                    if nx >= width || ny >= height {
                        continue;
                    }
                    let nidx = mask.index(nx, ny);
                    if cells[nidx] && !visited[nidx] {
                        visited[nidx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }

            components.push(component);
        }
    }

    tracing::debug!(
        width,
        height,
        components = components.len(),
        "labelled sprite mask"
    );
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn mask_from_rows(rows: &[&str]) -> PixelMask {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        PixelMask::from_fn(width, height, |x, y| {
            rows[y as usize].as_bytes()[x as usize] == b'#'
        })
        .unwrap()
    }

    #[test]
    fn empty_mask_has_no_components() {
        let mask = PixelMask::from_fn(8, 8, |_, _| false).unwrap();
        assert!(label(&mask).is_empty());
    }

    #[test]
    fn diagonal_neighbours_are_separate() {
        let mask = mask_from_rows(&["#.", ".#"]);
        let comps = label(&mask);
        assert_eq!(comps.len(), 2);
        assert!(comps.iter().all(|c| c.pixel_count == 1));
    }

    #[test]
    fn u_shape_is_one_component() {
        let mask = mask_from_rows(&[
            "#...#", //
            "#...#", //
            "#####",
        ]);
        let comps = label(&mask);
        assert_eq!(comps.len(), 1);
        let c = comps[0];
        assert_eq!((c.min_x, c.min_y, c.max_x, c.max_y), (0, 0, 4, 2));
        assert_eq!(c.pixel_count, 9);
        assert_eq!(c.area(), 15);
    }

    #[test]
    fn components_follow_seed_discovery_order() {
        // The right-hand blob starts on row 0, so it is discovered first even
        // though it lies further right.
        let mask = mask_from_rows(&[
            "....##", //
            "##..##", //
            "##....",
        ]);
        let comps = label(&mask);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].min_x, 4);
        assert_eq!(comps[1].min_x, 0);
    }

    #[test]
    fn hole_does_not_split_component() {
        let mask = mask_from_rows(&[
            "#####", //
            "#...#", //
            "#.#.#", //
            "#...#", //
            "#####",
        ]);
        let comps = label(&mask);
        // The ring and the isolated centre cell.
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].pixel_count, 16);
        assert_eq!(comps[1].pixel_count, 1);
        assert_eq!((comps[1].min_x, comps[1].min_y), (2, 2));
    }

    #[test]
    fn full_mask_is_single_component() {
        let mask = PixelMask::from_fn(37, 23, |_, _| true).unwrap();
        let comps = label(&mask);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].pixel_count, 37 * 23);
        assert_eq!(comps[0].width(), 37);
        assert_eq!(comps[0].height(), 23);
    }

    #[test]
    fn every_foreground_cell_counted_once() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for round in 0..40 {
            let width = rng.gen_range(1..64);
            let height = rng.gen_range(1..64);
            let density = rng.gen_range(0.05..0.95);
            let mask = PixelMask::from_fn(width, height, |_, _| rng.gen_bool(density)).unwrap();

            let comps = label(&mask);
            let total: u64 = comps.iter().map(|c| c.pixel_count).sum();
            assert_eq!(
                total,
                mask.count() as u64,
                "round {round}: {width}×{height} at density {density:.2}"
            );
            for c in &comps {
                assert!(c.pixel_count <= c.area());
                assert!(c.max_x < width && c.max_y < height);
            }
        }
    }

    #[test]
    fn labelling_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let mask = PixelMask::from_fn(50, 40, |_, _| rng.gen_bool(0.45)).unwrap();
        assert_eq!(label(&mask), label(&mask));
    }
}
