#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first route planner over the room's walkable tiles.
//!
//! Neighbours are explored in a fixed order (up, down, left, right) so equal
//! length routes resolve deterministically. The target tile is always
//! enterable, which lets callers walk up to an occupied tile.

use std::collections::VecDeque;

use room_builder_core::{GridSize, Path, TileCoord, TileView};
use tracing::debug;

const UNVISITED: usize = usize::MAX;

/// Shortest-path planner that reuses its search buffers between queries.
#[derive(Clone, Debug, Default)]
pub struct Pathfinder {
    parents: Vec<usize>,
    queue: VecDeque<TileCoord>,
}

impl Pathfinder {
    /// Creates a planner with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a route across the view, treating furnished tiles as obstacles.
    pub fn find(
        &mut self,
        view: TileView<'_>,
        start: TileCoord,
        target: TileCoord,
    ) -> Option<Path> {
        self.find_with(view.size(), start, target, |cell| view.is_walkable(cell))
    }

    /// Finds a route using a caller-provided walkability predicate.
    ///
    /// Returns an empty path when `start == target` and `None` when either
    /// endpoint lies outside the grid or the target cannot be reached. The
    /// predicate is never consulted for the start or the target tile.
    pub fn find_with<F>(
        &mut self,
        size: GridSize,
        start: TileCoord,
        target: TileCoord,
        mut is_walkable: F,
    ) -> Option<Path>
    where
        F: FnMut(TileCoord) -> bool,
    {
        if !size.contains(start) || !size.contains(target) {
            debug!(%start, %target, "path endpoint outside the room");
            return None;
        }

        if start == target {
            return Some(Path::default());
        }

        self.parents.clear();
        self.parents.resize(size.tile_count(), UNVISITED);
        self.queue.clear();

        let start_index = size.offset(start)?;
        let target_index = size.offset(target)?;
        self.parents[start_index] = start_index;
        self.queue.push_back(start);

        while let Some(cell) = self.queue.pop_front() {
            let Some(current_index) = size.offset(cell) else {
                continue;
            };

            for neighbor in neighbors(cell, size) {
                let Some(neighbor_index) = size.offset(neighbor) else {
                    continue;
                };

                if self.parents[neighbor_index] != UNVISITED {
                    continue;
                }

                if neighbor != target && !is_walkable(neighbor) {
                    continue;
                }

                self.parents[neighbor_index] = current_index;
                if neighbor_index == target_index {
                    let path = self.trace_back(size, start_index, target_index);
                    debug!(%start, %target, steps = path.len(), "path found");
                    return Some(path);
                }
                self.queue.push_back(neighbor);
            }
        }

        debug!(%start, %target, "target unreachable");
        None
    }

    /// Closest walkable tile to `start` by step count, searching through
    /// occupied tiles as well. Returns `start` itself when it is walkable.
    pub fn nearest_walkable(&mut self, view: TileView<'_>, start: TileCoord) -> Option<TileCoord> {
        let size = view.size();
        let start_index = size.offset(start)?;

        self.parents.clear();
        self.parents.resize(size.tile_count(), UNVISITED);
        self.queue.clear();
        self.parents[start_index] = start_index;
        self.queue.push_back(start);

        while let Some(cell) = self.queue.pop_front() {
            if view.is_walkable(cell) {
                return Some(cell);
            }
            let Some(current_index) = size.offset(cell) else {
                continue;
            };

            for neighbor in neighbors(cell, size) {
                let Some(neighbor_index) = size.offset(neighbor) else {
                    continue;
                };
                if self.parents[neighbor_index] == UNVISITED {
                    self.parents[neighbor_index] = current_index;
                    self.queue.push_back(neighbor);
                }
            }
        }

        None
    }

    fn trace_back(&self, size: GridSize, start_index: usize, target_index: usize) -> Path {
        let mut steps = Vec::new();
        let mut cursor = target_index;

        while cursor != start_index {
            let Some(cell) = size.cell_at(cursor) else {
                break;
            };
            steps.push(cell);
            cursor = self.parents[cursor];
        }

        steps.reverse();
        Path::new(steps)
    }
}

fn neighbors(cell: TileCoord, size: GridSize) -> impl Iterator<Item = TileCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.y().checked_sub(1) {
        candidates[count] = Some(TileCoord::new(cell.x(), row));
        count += 1;
    }

    if let Some(row) = cell.y().checked_add(1) {
        if row < size.height() {
            candidates[count] = Some(TileCoord::new(cell.x(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.x().checked_sub(1) {
        candidates[count] = Some(TileCoord::new(column, cell.y()));
        count += 1;
    }

    if let Some(column) = cell.x().checked_add(1) {
        if column < size.width() {
            candidates[count] = Some(TileCoord::new(column, cell.y()));
            count += 1;
        }
    }

    candidates.into_iter().take(count).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: u32, height: u32) -> GridSize {
        GridSize::new(width, height).expect("valid grid")
    }

    #[test]
    fn neighbors_follow_up_down_left_right_order() {
        let found: Vec<_> = neighbors(TileCoord::new(1, 1), size(3, 3)).collect();
        assert_eq!(
            found,
            vec![
                TileCoord::new(1, 0),
                TileCoord::new(1, 2),
                TileCoord::new(0, 1),
                TileCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn neighbors_are_clipped_at_the_border() {
        let found: Vec<_> = neighbors(TileCoord::new(0, 0), size(1, 2)).collect();
        assert_eq!(found, vec![TileCoord::new(0, 1)]);
    }

    #[test]
    fn equal_length_routes_prefer_vertical_moves_first() {
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder
            .find_with(size(2, 2), TileCoord::new(0, 0), TileCoord::new(1, 1), |_| true)
            .expect("open grid");

        assert_eq!(path.steps(), &[TileCoord::new(0, 1), TileCoord::new(1, 1)]);
    }

    #[test]
    fn blocked_target_is_still_entered() {
        let mut pathfinder = Pathfinder::new();
        let target = TileCoord::new(2, 0);
        let path = pathfinder
            .find_with(size(3, 1), TileCoord::new(0, 0), target, |cell| cell != target)
            .expect("target is always enterable");

        assert_eq!(path.destination(), Some(target));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn buffers_are_reused_across_differently_sized_queries() {
        let mut pathfinder = Pathfinder::new();
        let first =
            pathfinder.find_with(size(4, 4), TileCoord::new(0, 0), TileCoord::new(3, 3), |_| true);
        let second =
            pathfinder.find_with(size(2, 1), TileCoord::new(0, 0), TileCoord::new(1, 0), |_| true);

        assert_eq!(first.map(|path| path.len()), Some(6));
        assert_eq!(second.map(|path| path.len()), Some(1));
    }
}
