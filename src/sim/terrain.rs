//! Procedural terrain generation
//!
//! Layout order matters: base, base defenses, boundary fence, random
//! segments, then spawn clearing which overrides everything placed before.

use glam::IVec2;
use rand::Rng;
use thiserror::Error;

use super::grid::{Cell, Grid};
use crate::consts::MIN_GRID_SIZE;
use crate::tuning::Tuning;

/// Terrain generation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerrainError {
    #[error("grid {width}x{height} is smaller than the {min}x{min} minimum")]
    GridTooSmall { width: i32, height: i32, min: i32 },
    #[error("placed {placed} of {target} segments before running out of {attempts} attempts")]
    PlacementExhausted { placed: u32, target: u32, attempts: u32 },
}

/// Base defenses as (dx, dy) offsets from the base, literal reference layout
const BASE_DEFENSES: [(i32, i32, Cell); 31] = {
    use Cell::{Destructible as D, Fence as F};
    [
        (-3, -4, F), (-2, -4, D), (-1, -4, D), (0, -4, F), (1, -4, D), (2, -4, D), (3, -4, F),
        (-3, -3, F), (-2, -3, D), (-1, -3, D), (0, -3, F), (1, -3, D), (2, -3, D), (3, -3, F),
        (-3, -2, D), (-2, -2, D), (-1, -2, D), (0, -2, D), (1, -2, D), (2, -2, D), (3, -2, D),
        (-3, -1, F), (-2, -1, D), (-1, -1, D), (1, -1, D), (2, -1, D), (3, -1, F),
        (-2, 0, D), (-1, 0, D), (1, 0, D), (2, 0, D),
    ]
};

/// Keep-out radii around the player spawns and the base
const SPAWN_EXCLUSION_RADIUS: f32 = 3.0;
const BASE_EXCLUSION_RADIUS: f32 = 5.0;
/// Half width of the cleared player spawn rectangle
const SPAWN_HALF_WIDTH: i32 = 2;
/// Random segments keep this far from the outer edge
const INNER_MARGIN: i32 = 4;
const SEGMENT_LEN: i32 = 3;
const FENCE_LEN: i32 = 2;

/// Fixed landmarks derived from the arena size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub base: IVec2,
    pub player_spawns: [IVec2; 2],
    pub enemy_lanes: [IVec2; 3],
}

impl Layout {
    /// Landmarks for a `width` x `height` arena (61x61 puts the base at 30,59)
    pub fn for_size(width: i32, height: i32) -> Self {
        let base = IVec2::new(width / 2, height - 2);
        let lane_row = height - 11;
        Self {
            width,
            height,
            base,
            player_spawns: [base - IVec2::new(10, 0), base + IVec2::new(10, 0)],
            enemy_lanes: [
                IVec2::new(5, lane_row),
                IVec2::new(width / 2, lane_row),
                IVec2::new(width - 6, lane_row),
            ],
        }
    }

    /// Cells force-cleared around a player spawn
    pub fn spawn_rect(&self, slot: usize) -> impl Iterator<Item = IVec2> + use<> {
        let spawn = self.player_spawns[slot];
        let rows = (self.height - 4)..=(self.height - 2);
        rows.flat_map(move |y| {
            (spawn.x - SPAWN_HALF_WIDTH..=spawn.x + SPAWN_HALF_WIDTH).map(move |x| IVec2::new(x, y))
        })
    }

    fn in_spawn_gap(&self, x: i32) -> bool {
        self.player_spawns
            .iter()
            .any(|s| (s.x - SPAWN_HALF_WIDTH..=s.x + SPAWN_HALF_WIDTH).contains(&x))
    }
}

/// A straight run of identical cells placed by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub origin: IVec2,
    pub horizontal: bool,
    pub len: i32,
    pub cell: Cell,
}

impl Segment {
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + use<> {
        let step = if self.horizontal { IVec2::X } else { IVec2::Y };
        let origin = self.origin;
        (0..self.len).map(move |i| origin + step * i)
    }
}

/// Generated terrain plus the random segments that went into it
#[derive(Debug, Clone)]
pub struct Generated {
    pub grid: Grid,
    pub segments: Vec<Segment>,
    /// How many random segments were requested
    pub target: u32,
}

/// Generate a fresh arena
pub fn generate<R: Rng>(
    width: i32,
    height: i32,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<Grid, TerrainError> {
    generate_with_segments(width, height, tuning, rng).map(|g| g.grid)
}

/// Generate a fresh arena and report the random segments placed
pub fn generate_with_segments<R: Rng>(
    width: i32,
    height: i32,
    tuning: &Tuning,
    rng: &mut R,
) -> Result<Generated, TerrainError> {
    if width < MIN_GRID_SIZE || height < MIN_GRID_SIZE {
        return Err(TerrainError::GridTooSmall {
            width,
            height,
            min: MIN_GRID_SIZE,
        });
    }

    let layout = Layout::for_size(width, height);
    let brick_health = tuning.brick_health;
    let mut grid = Grid::new(width, height, layout.base);

    for (dx, dy, cell) in BASE_DEFENSES {
        grid.set(layout.base + IVec2::new(dx, dy), cell, brick_health);
    }

    place_boundary_fence(&mut grid, &layout, brick_health);

    let target = rng.random_range(tuning.min_random_segments..=tuning.max_random_segments);
    let segments = place_random_segments(&mut grid, &layout, tuning, target, rng)?;

    for slot in 0..layout.player_spawns.len() {
        for pos in layout.spawn_rect(slot) {
            grid.set(pos, Cell::Empty, 0);
        }
    }
    for lane in layout.enemy_lanes {
        grid.set(lane, Cell::Empty, 0);
    }

    Ok(Generated {
        grid,
        segments,
        target,
    })
}

/// Ring the edge with 2-cell fence pieces, leaving the spawn lanes open
fn place_boundary_fence(grid: &mut Grid, layout: &Layout, brick_health: u32) {
    let (width, height) = (grid.width(), grid.height());

    let place = |grid: &mut Grid, origin: IVec2, horizontal: bool| {
        let piece = Segment {
            origin,
            horizontal,
            len: FENCE_LEN,
            cell: Cell::Fence,
        };
        if piece.cells().all(|c| grid.get(c) == Some(Cell::Empty)) {
            for c in piece.cells() {
                grid.set(c, Cell::Fence, brick_health);
            }
        }
    };

    for x in (0..width - 1).step_by(FENCE_LEN as usize) {
        if layout.in_spawn_gap(x) {
            continue;
        }
        place(grid, IVec2::new(x, 0), true);
        place(grid, IVec2::new(x, height - 1), true);
    }

    for y in (0..height - 1).step_by(FENCE_LEN as usize) {
        if (height - 4..=height - 2).contains(&y) {
            continue;
        }
        place(grid, IVec2::new(0, y), false);
        place(grid, IVec2::new(width - 1, y), false);
    }
}

fn place_random_segments<R: Rng>(
    grid: &mut Grid,
    layout: &Layout,
    tuning: &Tuning,
    target: u32,
    rng: &mut R,
) -> Result<Vec<Segment>, TerrainError> {
    let avoid = [
        (layout.player_spawns[0], SPAWN_EXCLUSION_RADIUS),
        (layout.player_spawns[1], SPAWN_EXCLUSION_RADIUS),
        (layout.base, BASE_EXCLUSION_RADIUS),
    ];
    let max_x = grid.width() - INNER_MARGIN - 2;
    let max_y = grid.height() - INNER_MARGIN - 2;

    let mut segments = Vec::with_capacity(target as usize);
    let mut attempts = 0;

    while (segments.len() as u32) < target {
        if attempts >= tuning.max_placement_attempts {
            log::error!(
                "Terrain generation gave up: {} of {} segments after {} attempts",
                segments.len(),
                target,
                attempts
            );
            return Err(TerrainError::PlacementExhausted {
                placed: segments.len() as u32,
                target,
                attempts,
            });
        }
        attempts += 1;

        let origin = IVec2::new(
            rng.random_range(INNER_MARGIN..max_x),
            rng.random_range(INNER_MARGIN..max_y),
        );
        let horizontal = rng.random_bool(0.5);
        let mut segment = Segment {
            origin,
            horizontal,
            len: SEGMENT_LEN,
            cell: Cell::Empty,
        };

        let clear = segment.cells().all(|c| {
            grid.get(c) == Some(Cell::Empty)
                && avoid
                    .iter()
                    .all(|&(center, radius)| (c - center).as_vec2().length() >= radius)
        });
        if !clear {
            continue;
        }

        segment.cell = if rng.random_bool(0.6) {
            Cell::Destructible
        } else if rng.random_bool(0.5) {
            Cell::Fence
        } else {
            Cell::Water
        };
        for c in segment.cells() {
            grid.set(c, segment.cell, tuning.brick_health);
        }
        segments.push(segment);
    }

    log::debug!("Placed {} terrain segments in {} attempts", segments.len(), attempts);
    Ok(segments)
}

/// Lay a fresh layout over `grid` without touching surviving bricks, the
/// base, or any cell in `keep`. Surviving bricks keep their damage.
pub fn refill<R: Rng>(
    grid: &mut Grid,
    keep: &[IVec2],
    tuning: &Tuning,
    rng: &mut R,
) -> Result<usize, TerrainError> {
    let fresh = generate(grid.width(), grid.height(), tuning, rng)?;
    let mut changed = 0;
    for pos in grid.positions() {
        let current = grid.get(pos);
        if matches!(current, Some(Cell::Destructible | Cell::Base)) || keep.contains(&pos) {
            continue;
        }
        let Some(next) = fresh.get(pos) else { continue };
        if current != Some(next) && grid.set(pos, next, fresh.health(pos)) {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn reference() -> Generated {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        generate_with_segments(61, 61, &tuning, &mut rng).unwrap()
    }

    #[test]
    fn test_reference_landmarks() {
        let layout = Layout::for_size(61, 61);
        assert_eq!(layout.base, IVec2::new(30, 59));
        assert_eq!(layout.player_spawns, [IVec2::new(20, 59), IVec2::new(40, 59)]);
        assert_eq!(
            layout.enemy_lanes,
            [IVec2::new(5, 50), IVec2::new(30, 50), IVec2::new(55, 50)]
        );
    }

    #[test]
    fn test_base_and_defenses() {
        let generated = reference();
        let grid = &generated.grid;
        assert_eq!(grid.count(Cell::Base), 1);
        assert_eq!(grid.get(IVec2::new(30, 59)), Some(Cell::Base));
        assert_eq!(grid.get(IVec2::new(27, 55)), Some(Cell::Fence));
        assert_eq!(grid.get(IVec2::new(28, 55)), Some(Cell::Destructible));
        assert_eq!(grid.health(IVec2::new(28, 55)), 2);
        assert_eq!(grid.get(IVec2::new(30, 58)), Some(Cell::Empty));
    }

    #[test]
    fn test_boundary_fence_skips_spawn_gaps() {
        let grid = reference().grid;
        assert_eq!(grid.get(IVec2::new(0, 0)), Some(Cell::Fence));
        assert_eq!(grid.get(IVec2::new(1, 0)), Some(Cell::Fence));
        assert_eq!(grid.get(IVec2::new(10, 60)), Some(Cell::Fence));
        // Column 20 lies in the player 1 lane
        assert_eq!(grid.get(IVec2::new(20, 0)), Some(Cell::Empty));
        assert_eq!(grid.get(IVec2::new(20, 60)), Some(Cell::Empty));
        // Left edge stays open beside the spawn rows
        assert_eq!(grid.get(IVec2::new(0, 58)), Some(Cell::Empty));
        assert_eq!(grid.get(IVec2::new(0, 10)), Some(Cell::Fence));
    }

    #[test]
    fn test_same_seed_same_map() {
        let tuning = Tuning::default();
        let a = generate(61, 61, &tuning, &mut Pcg32::seed_from_u64(99)).unwrap();
        let b = generate(61, 61, &tuning, &mut Pcg32::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_small_rejected() {
        let tuning = Tuning::default();
        let err = generate(20, 61, &tuning, &mut Pcg32::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, TerrainError::GridTooSmall { .. }));
    }

    #[test]
    fn test_exhaustion_fails_instead_of_looping() {
        let tuning = Tuning {
            min_random_segments: 5000,
            max_random_segments: 5000,
            max_placement_attempts: 2000,
            ..Tuning::default()
        };
        let err = generate(61, 61, &tuning, &mut Pcg32::seed_from_u64(3)).unwrap_err();
        match err {
            TerrainError::PlacementExhausted { placed, target, attempts } => {
                assert!(placed < target);
                assert_eq!(target, 5000);
                assert_eq!(attempts, 2000);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_refill_preserves_damaged_bricks_and_kept_cells() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut grid = generate(61, 61, &tuning, &mut rng).unwrap();

        let brick = grid
            .positions()
            .find(|&p| p.y > 20 && grid.get(p) == Some(Cell::Destructible))
            .unwrap();
        grid.damage(brick, 1);

        // Clear a patch and keep one of its cells
        let keep = IVec2::new(10, 10);
        for y in 8..13 {
            for x in 8..13 {
                let p = IVec2::new(x, y);
                if p != brick {
                    grid.set(p, Cell::Empty, 0);
                }
            }
        }

        refill(&mut grid, &[keep], &tuning, &mut rng).unwrap();
        assert_eq!(grid.get(brick), Some(Cell::Destructible));
        assert_eq!(grid.health(brick), 1);
        assert_eq!(grid.get(keep), Some(Cell::Empty));
        assert_eq!(grid.count(Cell::Base), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_generated_terrain_invariants(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let generated = generate_with_segments(61, 61, &tuning, &mut rng).unwrap();
            let grid = &generated.grid;

            prop_assert!(generated.target >= tuning.min_random_segments);
            prop_assert!(generated.target <= tuning.max_random_segments);
            prop_assert_eq!(generated.segments.len() as u32, generated.target);

            let mut seen = std::collections::HashSet::new();
            for segment in &generated.segments {
                for c in segment.cells() {
                    prop_assert!(grid.in_bounds(c));
                    prop_assert!(seen.insert(c), "segments overlap at {:?}", c);
                }
            }

            let layout = Layout::for_size(61, 61);
            for slot in 0..2 {
                for p in layout.spawn_rect(slot) {
                    prop_assert_eq!(grid.get(p), Some(Cell::Empty));
                }
            }
            prop_assert_eq!(grid.count(Cell::Base), 1);
        }
    }
}
