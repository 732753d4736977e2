use std::collections::HashMap;

use crate::grid::{Grid, Point};

/// Where a hidden cell sits relative to the revealed part of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// At least one neighbor is visible; the cell is a solver variable.
    Shallow,
    /// No visible neighbor; nothing on the board constrains it.
    Deep,
}

/// A one-shot classification of every hidden cell, rebuilt on each solve
/// attempt.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Shallow cells in row-major order. Position `i` is solver variable `i`.
    pub shallow: Vec<Point>,
    /// Deep cells in row-major order.
    pub deep: Vec<Point>,
    variable_of: HashMap<Point, usize>,
    /// Visible cells with a nonzero count, in row-major order.
    pub sources: Vec<Point>,
    pub shallow_mines: usize,
    pub deep_mines: usize,
}

impl Partition {
    pub fn scan(grid: &Grid) -> Self {
        let mut partition = Partition {
            shallow: Vec::new(),
            deep: Vec::new(),
            variable_of: HashMap::new(),
            sources: Vec::new(),
            shallow_mines: 0,
            deep_mines: 0,
        };

        for (point, cell) in grid.cells() {
            if cell.visible {
                if cell.adjacent_mines != 0 {
                    partition.sources.push(point);
                }
            } else if grid.count_adjacent_visible(point) == 0 {
                partition.deep.push(point);
                partition.deep_mines += usize::from(cell.mine);
            } else {
                partition
                    .variable_of
                    .insert(point, partition.shallow.len());
                partition.shallow.push(point);
                partition.shallow_mines += usize::from(cell.mine);
            }
        }

        assert_eq!(
            partition.sources.is_empty(),
            partition.shallow.is_empty(),
            "constraint sources and shallow cells must appear together"
        );
        partition
    }

    pub fn depth(&self, point: Point) -> Option<Depth> {
        if self.variable_of.contains_key(&point) {
            Some(Depth::Shallow)
        } else if self.deep.binary_search_by_key(&(point.y, point.x), |p| (p.y, p.x)).is_ok() {
            Some(Depth::Deep)
        } else {
            None
        }
    }

    /// The solver variable addressing a shallow cell.
    pub fn variable(&self, point: Point) -> Option<usize> {
        self.variable_of.get(&point).copied()
    }

    pub fn mines(&self) -> usize {
        self.shallow_mines + self.deep_mines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_board_is_all_deep() {
        let mut grid = Grid::new(4, 3);
        grid.place_mine(Point::new(2, 2));

        let partition = Partition::scan(&grid);

        assert_eq!(partition.deep.len(), 12);
        assert!(partition.shallow.is_empty());
        assert!(partition.sources.is_empty());
        assert_eq!(partition.deep_mines, 1);
        assert_eq!(partition.depth(Point::new(0, 0)), Some(Depth::Deep));
    }

    #[test]
    fn test_revealed_number_makes_neighbors_shallow() {
        // 5x1 strip: mine at x = 1, reveal x = 0 (shows "1").
        let mut grid = Grid::new(5, 1);
        grid.place_mine(Point::new(1, 0));
        grid.reveal(Point::new(0, 0));

        let partition = Partition::scan(&grid);

        assert_eq!(partition.sources, vec![Point::new(0, 0)]);
        assert_eq!(partition.shallow, vec![Point::new(1, 0)]);
        assert_eq!(
            partition.deep,
            vec![Point::new(2, 0), Point::new(3, 0), Point::new(4, 0)]
        );
        assert_eq!(partition.shallow_mines, 1);
        assert_eq!(partition.deep_mines, 0);
        assert_eq!(partition.variable(Point::new(1, 0)), Some(0));
        assert_eq!(partition.depth(Point::new(3, 0)), Some(Depth::Deep));
        assert_eq!(partition.depth(Point::new(0, 0)), None);
    }

    #[test]
    fn test_variables_follow_row_major_order() {
        let mut grid = Grid::new(3, 3);
        grid.place_mine(Point::new(0, 0));
        grid.place_mine(Point::new(2, 2));
        grid.reveal(Point::new(1, 1));

        let partition = Partition::scan(&grid);

        assert_eq!(partition.shallow.len(), 8);
        for (i, &point) in partition.shallow.iter().enumerate() {
            assert_eq!(partition.variable(point), Some(i));
        }
        assert_eq!(partition.mines(), grid.mines_total());
    }

    #[test]
    fn test_zero_region_has_no_sources_of_its_own() {
        // Revealed zeros never become constraint sources.
        let mut grid = Grid::new(6, 1);
        grid.place_mine(Point::new(5, 0));
        grid.reveal(Point::new(0, 0));

        let partition = Partition::scan(&grid);

        assert_eq!(partition.sources, vec![Point::new(4, 0)]);
        assert_eq!(partition.shallow, vec![Point::new(5, 0)]);
        assert!(partition.deep.is_empty());
    }
}
