use glam::Vec2;

/// Maps a cols × rows board onto world space, centered in the play area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f32,
    /// World position of the top-left corner of cell (0, 0).
    pub origin: Vec2,
}

impl GridLayout {
    /// Fit the board inside `world` with `margin` on every side, square cells.
    pub fn fit(cols: usize, rows: usize, world: Vec2, margin: f32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let avail = (world - Vec2::splat(margin * 2.0)).max(Vec2::ONE);
        let cell_size = (avail.x / cols as f32).min(avail.y / rows as f32);
        let board = Vec2::new(cols as f32, rows as f32) * cell_size;
        Self {
            cols,
            rows,
            cell_size,
            origin: (world - board) * 0.5,
        }
    }

    /// Convert world coordinates to a grid cell (x, y).
    pub fn world_to_cell(&self, world: Vec2) -> Option<(usize, usize)> {
        let local = (world - self.origin) / self.cell_size;
        let (gx, gy) = (local.x.floor(), local.y.floor());
        if gx >= 0.0 && gy >= 0.0 && (gx as usize) < self.cols && (gy as usize) < self.rows {
            Some((gx as usize, gy as usize))
        } else {
            None
        }
    }

    /// World-space center of a grid cell.
    pub fn cell_center(&self, x: usize, y: usize) -> Vec2 {
        self.origin + (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) * self.cell_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_centers_square_board() {
        let layout = GridLayout::fit(4, 4, Vec2::new(800.0, 600.0), 50.0);
        assert_eq!(layout.cell_size, 125.0);
        assert_eq!(layout.origin, Vec2::new(150.0, 50.0));
    }

    #[test]
    fn world_to_cell_round_trips_centers() {
        let layout = GridLayout::fit(7, 5, Vec2::new(800.0, 600.0), 20.0);
        for y in 0..5 {
            for x in 0..7 {
                assert_eq!(layout.world_to_cell(layout.cell_center(x, y)), Some((x, y)));
            }
        }
    }

    #[test]
    fn outside_board_is_none() {
        let layout = GridLayout::fit(3, 3, Vec2::new(300.0, 300.0), 0.0);
        assert_eq!(layout.world_to_cell(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(layout.world_to_cell(Vec2::new(10.0, 300.5)), None);
    }
}
