//! Arena grid: terrain codes plus brick hit points
//!
//! Cell (x, y) covers the square `[x, x+1) x [y, y+1)` in continuous
//! coordinates; y grows downward toward the base.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::consts::FENCE_PENETRATION_POWER;

/// Terrain code of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    /// Brick with hit points; the only terrain bullets can wear down
    Destructible,
    /// Steel fence, stops weak bullets
    Fence,
    /// Blocks tanks, bullets fly over it
    Water,
    /// The base the player defends
    Base,
}

impl Cell {
    /// Tanks may only enter empty cells
    pub fn blocks_movement(self) -> bool {
        self != Cell::Empty
    }

    /// Whether this terrain ends a bullet of the given power
    pub fn stops_bullet(self, power: u32) -> bool {
        match self {
            Cell::Destructible => true,
            Cell::Fence => power < FENCE_PENETRATION_POWER,
            _ => false,
        }
    }
}

/// Cardinal facing / movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Neighbor expansion order used for pathfinding tie-breaks
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Grid step for this direction
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    /// Unit vector in continuous coordinates
    pub fn unit(self) -> Vec2 {
        self.offset().as_vec2()
    }

    /// Inverse of [`Direction::offset`]
    pub fn from_offset(offset: IVec2) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| dir.offset() == offset)
    }
}

/// Center of a cell in continuous coordinates
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    cell.as_vec2() + Vec2::splat(0.5)
}

/// Cell containing a continuous position
#[inline]
pub fn cell_at(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}

/// Fixed-size terrain map with a parallel health map for bricks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    health: Vec<u32>,
    base: IVec2,
}

impl Grid {
    /// Empty grid with the base placed at `base`
    pub fn new(width: i32, height: i32, base: IVec2) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        let mut grid = Self {
            width,
            height,
            cells: vec![Cell::Empty; len],
            health: vec![0; len],
            base,
        };
        if let Some(i) = grid.index(base) {
            grid.cells[i] = Cell::Base;
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn base(&self) -> IVec2 {
        self.base
    }

    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: IVec2) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Terrain at `pos`, or `None` outside the grid
    pub fn get(&self, pos: IVec2) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Remaining hit points; zero for anything but bricks
    pub fn health(&self, pos: IVec2) -> u32 {
        self.index(pos).map(|i| self.health[i]).unwrap_or(0)
    }

    /// In bounds and free of terrain
    pub fn is_passable(&self, pos: IVec2) -> bool {
        self.get(pos) == Some(Cell::Empty)
    }

    /// Overwrite a cell. Bricks get `brick_health` hit points, everything
    /// else none. The base cell can neither be moved nor overwritten.
    pub fn set(&mut self, pos: IVec2, cell: Cell, brick_health: u32) -> bool {
        if cell == Cell::Base || pos == self.base {
            return false;
        }
        let Some(i) = self.index(pos) else {
            return false;
        };
        self.cells[i] = cell;
        self.health[i] = if cell == Cell::Destructible { brick_health } else { 0 };
        true
    }

    /// Apply bullet damage to a brick. Returns `Some(true)` when the brick
    /// crumbles, `Some(false)` when it survives, `None` if `pos` is no brick.
    pub fn damage(&mut self, pos: IVec2, power: u32) -> Option<bool> {
        let i = self.index(pos)?;
        if self.cells[i] != Cell::Destructible {
            return None;
        }
        self.health[i] = self.health[i].saturating_sub(power);
        if self.health[i] == 0 {
            self.cells[i] = Cell::Empty;
            Some(true)
        } else {
            Some(false)
        }
    }

    /// All coordinates, row-major
    pub fn positions(&self) -> impl Iterator<Item = IVec2> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| IVec2::new(x, y)))
    }

    /// Number of cells holding `cell`
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_has_single_base() {
        let grid = Grid::new(10, 8, IVec2::new(5, 6));
        assert_eq!(grid.count(Cell::Base), 1);
        assert_eq!(grid.get(IVec2::new(5, 6)), Some(Cell::Base));
        assert_eq!(grid.get(IVec2::new(10, 0)), None);
        assert_eq!(grid.get(IVec2::new(0, -1)), None);
    }

    #[test]
    fn test_base_cannot_be_overwritten() {
        let mut grid = Grid::new(10, 10, IVec2::new(5, 8));
        assert!(!grid.set(IVec2::new(5, 8), Cell::Empty, 2));
        assert!(!grid.set(IVec2::new(1, 1), Cell::Base, 2));
        assert_eq!(grid.count(Cell::Base), 1);
    }

    #[test]
    fn test_health_only_for_bricks() {
        let mut grid = Grid::new(10, 10, IVec2::new(5, 8));
        grid.set(IVec2::new(1, 1), Cell::Destructible, 2);
        grid.set(IVec2::new(2, 1), Cell::Fence, 2);
        assert_eq!(grid.health(IVec2::new(1, 1)), 2);
        assert_eq!(grid.health(IVec2::new(2, 1)), 0);

        // Replacing a brick drops its health
        grid.set(IVec2::new(1, 1), Cell::Water, 2);
        assert_eq!(grid.health(IVec2::new(1, 1)), 0);
    }

    #[test]
    fn test_damage_brick() {
        let mut grid = Grid::new(10, 10, IVec2::new(5, 8));
        let pos = IVec2::new(3, 3);
        grid.set(pos, Cell::Destructible, 2);

        assert_eq!(grid.damage(pos, 1), Some(false));
        assert_eq!(grid.health(pos), 1);
        assert_eq!(grid.damage(pos, 1), Some(true));
        assert_eq!(grid.get(pos), Some(Cell::Empty));
        assert_eq!(grid.damage(pos, 1), None);
    }

    #[test]
    fn test_fence_penetration() {
        assert!(Cell::Fence.stops_bullet(1));
        assert!(!Cell::Fence.stops_bullet(2));
        assert!(Cell::Destructible.stops_bullet(2));
        assert!(!Cell::Water.stops_bullet(1));
    }

    #[test]
    fn test_cell_mapping() {
        let center = cell_center(IVec2::new(3, 4));
        assert_eq!(center, Vec2::new(3.5, 4.5));
        assert_eq!(cell_at(center), IVec2::new(3, 4));
        assert_eq!(cell_at(Vec2::new(-0.1, 2.0)), IVec2::new(-1, 2));
        assert_eq!(Direction::from_offset(IVec2::new(0, -1)), Some(Direction::Up));
        assert_eq!(Direction::from_offset(IVec2::new(1, 1)), None);
    }
}
