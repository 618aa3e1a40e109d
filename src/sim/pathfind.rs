//! Breadth-first shortest paths on the arena grid

use std::collections::VecDeque;

use glam::IVec2;

use super::grid::{Direction, Grid};

/// First step of a shortest 4-connected path from `start` to `target`.
///
/// Cells are entered only when `passable` allows it, except `target`
/// itself, which counts as reached even when impassable (the base). Ties
/// break by expansion order up, down, left, right. Returns `None` when
/// already there or no path exists.
pub fn first_step<F>(grid: &Grid, start: IVec2, target: IVec2, mut passable: F) -> Option<Direction>
where
    F: FnMut(IVec2) -> bool,
{
    if start == target || !grid.in_bounds(start) || !grid.in_bounds(target) {
        return None;
    }

    let width = grid.width() as usize;
    let len = width * grid.height() as usize;
    let index = |cell: IVec2| cell.y as usize * width + cell.x as usize;

    let mut visited = vec![false; len];
    // First move taken from `start` to reach each visited cell
    let mut first: Vec<Option<Direction>> = vec![None; len];
    visited[index(start)] = true;

    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        for dir in Direction::ALL {
            let next = cell + dir.offset();
            if !grid.in_bounds(next) || visited[index(next)] {
                continue;
            }
            let step = if cell == start {
                dir
            } else {
                first[index(cell)].unwrap_or(dir)
            };
            if next == target {
                return Some(step);
            }
            visited[index(next)] = true;
            if !passable(next) {
                continue;
            }
            first[index(next)] = Some(step);
            queue.push_back(next);
        }
    }
    None
}

/// Directions whose neighbor cell `passable` accepts
pub fn legal_moves<F>(start: IVec2, mut passable: F) -> Vec<Direction>
where
    F: FnMut(IVec2) -> bool,
{
    Direction::ALL
        .into_iter()
        .filter(|dir| passable(start + dir.offset()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Cell;
    use proptest::prelude::*;

    fn open(grid: &Grid) -> impl Fn(IVec2) -> bool + '_ {
        |cell| grid.is_passable(cell)
    }

    /// Reference BFS distance for checking optimality
    fn distance(grid: &Grid, start: IVec2, target: IVec2) -> Option<u32> {
        let mut dist = vec![u32::MAX; (grid.width() * grid.height()) as usize];
        let idx = |c: IVec2| (c.y * grid.width() + c.x) as usize;
        dist[idx(start)] = 0;
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            if cell == target {
                return Some(dist[idx(cell)]);
            }
            for dir in Direction::ALL {
                let next = cell + dir.offset();
                if grid.in_bounds(next)
                    && dist[idx(next)] == u32::MAX
                    && (next == target || grid.is_passable(next))
                {
                    dist[idx(next)] = dist[idx(cell)] + 1;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    #[test]
    fn test_straight_line() {
        let grid = Grid::new(10, 10, IVec2::new(5, 8));
        let step = first_step(&grid, IVec2::new(5, 2), IVec2::new(5, 8), open(&grid));
        assert_eq!(step, Some(Direction::Down));
    }

    #[test]
    fn test_routes_around_wall() {
        let mut grid = Grid::new(10, 10, IVec2::new(5, 8));
        for x in 0..9 {
            grid.set(IVec2::new(x, 5), Cell::Fence, 2);
        }
        let step = first_step(&grid, IVec2::new(5, 2), IVec2::new(5, 8), open(&grid));
        assert_eq!(step, Some(Direction::Right));
    }

    #[test]
    fn test_unreachable_and_arrived() {
        let mut grid = Grid::new(10, 10, IVec2::new(5, 8));
        for x in 0..10 {
            grid.set(IVec2::new(x, 5), Cell::Water, 2);
        }
        assert_eq!(first_step(&grid, IVec2::new(5, 2), IVec2::new(5, 8), open(&grid)), None);
        assert_eq!(first_step(&grid, IVec2::new(5, 2), IVec2::new(5, 2), open(&grid)), None);
    }

    #[test]
    fn test_tie_break_prefers_up_then_down() {
        let grid = Grid::new(10, 10, IVec2::new(9, 9));
        // Both targets are two steps away; vertical moves expand before left
        let step = first_step(&grid, IVec2::new(5, 5), IVec2::new(4, 4), open(&grid));
        assert_eq!(step, Some(Direction::Up));
        let step = first_step(&grid, IVec2::new(5, 5), IVec2::new(4, 6), open(&grid));
        assert_eq!(step, Some(Direction::Down));
    }

    #[test]
    fn test_legal_moves() {
        let mut grid = Grid::new(5, 5, IVec2::new(2, 3));
        grid.set(IVec2::new(1, 1), Cell::Fence, 2);
        let moves = legal_moves(IVec2::new(0, 1), open(&grid));
        assert_eq!(moves, vec![Direction::Up, Direction::Down]);
    }

    proptest! {
        /// Following first steps walks a shortest path to the target
        #[test]
        fn prop_first_step_is_optimal(
            walls in prop::collection::vec((0i32..12, 0i32..12), 0..40),
            sx in 0i32..12, sy in 0i32..10,
        ) {
            let base = IVec2::new(6, 11);
            let mut grid = Grid::new(12, 12, base);
            for (x, y) in walls {
                grid.set(IVec2::new(x, y), Cell::Fence, 2);
            }
            let start = IVec2::new(sx, sy);
            prop_assume!(grid.is_passable(start));

            let mut cell = start;
            match distance(&grid, start, base) {
                None => prop_assert_eq!(first_step(&grid, start, base, open(&grid)), None),
                Some(total) => {
                    for remaining in (1..=total).rev() {
                        let dir = first_step(&grid, cell, base, open(&grid));
                        prop_assert!(dir.is_some());
                        cell += dir.unwrap().offset();
                        prop_assert_eq!(distance(&grid, cell, base), Some(remaining - 1));
                    }
                    prop_assert_eq!(cell, base);
                }
            }
        }
    }
}
