use crate::grid::{Grid, Point};

impl Grid {
    /// Makes `start` visible and floods outward through zero-count cells.
    ///
    /// Uses an explicit stack so the depth is bounded by the heap, not the
    /// call stack. A cell is pushed at most once: it becomes visible before
    /// it is queued. Calling this on an already visible cell is allowed and
    /// only floods into neighbors that are still hidden.
    ///
    /// Returns the cells that were newly revealed.
    pub fn reveal(&mut self, start: Point) -> Vec<Point> {
        let mut revealed_points = Vec::new();
        if self.make_visible(start) {
            revealed_points.push(start);
        }

        let mut stack = vec![start];
        while let Some(point) = stack.pop() {
            if self.cell(point).adjacent_mines != 0 {
                continue;
            }
            for neighbor in self.neighbors(point) {
                if self.cell(neighbor).is_hidden() {
                    self.make_visible(neighbor);
                    revealed_points.push(neighbor);
                    stack.push(neighbor);
                }
            }
        }

        revealed_points
    }

    /// Returns true if the cell was hidden before.
    fn make_visible(&mut self, point: Point) -> bool {
        let cell = self.cell_mut(point);
        let newly = !cell.visible;
        cell.visible = true;
        cell.flag = false;
        cell.question_mark = false;
        if newly {
            self.visible_count += 1;
        }
        newly
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::{Grid, Point};

    #[test]
    fn test_corner_reveal_around_center_mine() {
        let mut grid = Grid::new(3, 3);
        grid.place_mine(Point::new(1, 1));

        let revealed = grid.reveal(Point::new(0, 0));

        // Every cell touches the center mine, so nothing cascades.
        assert_eq!(revealed, vec![Point::new(0, 0)]);
        assert_eq!(grid.cell(Point::new(0, 0)).adjacent_mines, 1);
        assert_eq!(grid.visible_count(), 1);
    }

    #[test]
    fn test_reveal_all_non_mine_cells_one_by_one() {
        let mut grid = Grid::new(3, 3);
        grid.place_mine(Point::new(1, 1));

        for point in grid.points().filter(|&p| p != Point::new(1, 1)) {
            grid.reveal(point);
        }

        assert_eq!(grid.visible_count(), 8);
        assert!(grid.all_safe_cells_visible());
        for (point, cell) in grid.cells() {
            if point != Point::new(1, 1) {
                assert!(cell.visible);
                assert_eq!(cell.adjacent_mines, 1);
            }
        }
    }

    #[test]
    fn test_flood_stops_at_numbered_border() {
        // 5x5 with a single mine in the bottom-right corner.
        let mut grid = Grid::new(5, 5);
        grid.place_mine(Point::new(4, 4));

        let revealed = grid.reveal(Point::new(0, 0));

        assert_eq!(revealed.len(), 24);
        assert_eq!(grid.visible_count(), 24);
        assert!(!grid.cell(Point::new(4, 4)).visible);
        assert_eq!(grid.cell(Point::new(3, 3)).adjacent_mines, 1);
        assert!(grid.all_safe_cells_visible());
    }

    #[test]
    fn test_flood_does_not_cross_a_wall_of_numbers() {
        // A column of mines at x = 2 splits the board in two.
        let mut grid = Grid::new(5, 3);
        for y in 0..3 {
            grid.place_mine(Point::new(2, y));
        }

        grid.reveal(Point::new(0, 1));

        for y in 0..3 {
            assert!(grid.cell(Point::new(0, y)).visible);
            assert!(grid.cell(Point::new(1, y)).visible);
            assert!(!grid.cell(Point::new(3, y)).visible);
            assert!(!grid.cell(Point::new(4, y)).visible);
        }
        assert_eq!(grid.visible_count(), 6);
    }

    #[test]
    fn test_reveal_clears_marks_and_is_idempotent() {
        let mut grid = Grid::new(4, 4);
        grid.place_mine(Point::new(3, 3));
        grid.cell_mut(Point::new(1, 1)).flag = true;
        grid.cell_mut(Point::new(2, 0)).question_mark = true;

        grid.reveal(Point::new(0, 0));
        let count = grid.visible_count();
        assert!(!grid.cell(Point::new(1, 1)).flag);
        assert!(!grid.cell(Point::new(2, 0)).question_mark);

        assert!(grid.reveal(Point::new(0, 0)).is_empty());
        assert_eq!(grid.visible_count(), count);
    }

    #[test]
    fn test_large_open_board_does_not_recurse() {
        let mut grid = Grid::new(377, 233);
        let revealed = grid.reveal(Point::new(200, 100));

        assert_eq!(revealed.len(), 377 * 233);
        assert!(grid.all_safe_cells_visible());
    }
}
