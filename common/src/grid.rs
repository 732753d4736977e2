use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the minesweeper board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}

/// Everything the game knows about a single grid position.
///
/// `mine` and `visible` can both be set: an exploded mine, or the mines
/// disclosed once the game is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub mine: bool,
    /// Set only on the mine that ended the game.
    pub exploded: bool,
    pub flag: bool,
    pub question_mark: bool,
    pub visible: bool,
    /// A flag on a cell without a mine, discovered when the game ends.
    pub mistake: bool,
    /// Number of mines among the (up to 8) neighbors.
    pub adjacent_mines: u8,
}

impl Cell {
    pub fn is_hidden(&self) -> bool {
        !self.visible
    }

    /// Flags and question marks both protect a cell from an ordinary click.
    pub fn is_marked(&self) -> bool {
        self.flag || self.question_mark
    }
}

/// The fixed-size minefield for one game.
///
/// Cells are stored row-major; every access goes through [`Grid::index`]
/// which rejects out-of-bounds coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    /// Number of cells that have ever been made visible.
    pub(crate) visible_count: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Grid {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            visible_count: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.width && point.y < self.height
    }

    fn index(&self, point: Point) -> usize {
        assert!(
            self.contains(point),
            "({}, {}) is outside the {}x{} grid",
            point.x,
            point.y,
            self.width,
            self.height
        );
        point.y * self.width + point.x
    }

    pub fn cell(&self, point: Point) -> &Cell {
        &self.cells[self.index(point)]
    }

    pub fn cell_mut(&mut self, point: Point) -> &mut Cell {
        let i = self.index(point);
        &mut self.cells[i]
    }

    pub fn get(&self, point: Point) -> Option<&Cell> {
        self.contains(point).then(|| self.cell(point))
    }

    /// All points in row-major order. The engine relies on this order being
    /// stable between partitioning and committing.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Point { x, y }))
    }

    pub fn cells(&self) -> impl Iterator<Item = (Point, &Cell)> {
        self.points().zip(self.cells.iter())
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// All in-bounds neighbor coordinates of `point`, excluding the point itself.
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> + use<> {
        let width = self.width;
        let height = self.height;

        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    return None;
                }
                let nx = point.x as isize + dx;
                let ny = point.y as isize + dy;
                if nx >= 0 && nx < width as isize && ny >= 0 && ny < height as isize {
                    Some(Point {
                        x: nx as usize,
                        y: ny as usize,
                    })
                } else {
                    None
                }
            })
        })
    }

    pub fn count_adjacent_mines(&self, point: Point) -> u8 {
        self.neighbors(point)
            .filter(|&n| self.cell(n).mine)
            .count() as u8
    }

    pub fn count_adjacent_visible(&self, point: Point) -> usize {
        self.neighbors(point)
            .filter(|&n| self.cell(n).visible)
            .count()
    }

    pub fn count_adjacent_flags(&self, point: Point) -> usize {
        self.neighbors(point)
            .filter(|&n| {
                let cell = self.cell(n);
                cell.is_hidden() && cell.flag
            })
            .count()
    }

    /// Places a mine and bumps the neighbors' counts.
    /// Returns `false` without touching anything if a mine is already there.
    pub fn place_mine(&mut self, point: Point) -> bool {
        if self.cell(point).mine {
            return false;
        }
        self.cell_mut(point).mine = true;
        for neighbor in self.neighbors(point) {
            self.cell_mut(neighbor).adjacent_mines += 1;
        }
        true
    }

    /// Removes a mine and lowers the neighbors' counts. Visible neighbors
    /// are revealed again, since a count that dropped to zero must flood.
    /// Returns `false` if there was no mine there.
    pub fn remove_mine(&mut self, point: Point) -> bool {
        if !self.cell(point).mine {
            return false;
        }
        self.cell_mut(point).mine = false;
        for neighbor in self.neighbors(point) {
            self.cell_mut(neighbor).adjacent_mines -= 1;
        }
        for neighbor in self.neighbors(point) {
            if self.cell(neighbor).visible {
                self.reveal(neighbor);
            }
        }
        true
    }

    pub fn recompute_all_adjacency(&mut self) {
        for point in self.points() {
            let count = self.count_adjacent_mines(point);
            self.cell_mut(point).adjacent_mines = count;
        }
    }

    pub fn mines_total(&self) -> usize {
        self.cells.iter().filter(|c| c.mine).count()
    }

    /// Total mines minus the flags that are not known mistakes.
    /// Goes negative when the player over-flags.
    pub fn mines_remaining(&self) -> isize {
        self.cells.iter().fold(0, |acc, c| {
            acc + isize::from(c.mine) - isize::from(c.flag && !c.mistake)
        })
    }

    /// True once every non-mine cell has been revealed.
    pub fn all_safe_cells_visible(&self) -> bool {
        self.visible_count + self.mines_total() == self.area()
    }

    pub(crate) fn mark_flag_mistakes(&mut self) {
        for cell in self.cells.iter_mut() {
            if cell.flag && !cell.mine {
                cell.mistake = true;
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn assert_adjacency_consistent(grid: &Grid) {
    for point in grid.points() {
        assert_eq!(
            grid.cell(point).adjacent_mines,
            grid.count_adjacent_mines(point),
            "stale adjacency at {point:?}"
        );
    }
}
