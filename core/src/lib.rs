#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the room builder engine.
//!
//! This crate defines the vocabulary that connects the tile store, the pure
//! systems and the adapters. Adapters translate pointer input into
//! [`EditCommand`] values or movement requests, the world executes edits and
//! broadcasts [`RoomChange`] notifications, and systems read the room through
//! the immutable [`TileView`] snapshot.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod projection;

pub use catalog::{
    Catalog, CatalogError, FloorDefinition, FurnitureDefinition, FurnitureShape, PaletteSample,
    WallDefinition,
};
pub use projection::{Camera, GridTransform, ProjectionError, TileMetrics};

/// Tolerance used when comparing continuous tile-space positions.
pub const POSITION_EPSILON: f64 = 1e-9;

/// Location of a single tile expressed as column (`x`) and row (`y`) indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Converts signed coordinates, returning `None` for negative or oversized input.
    #[must_use]
    pub fn from_signed(x: i64, y: i64) -> Option<Self> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        Some(Self::new(x, y))
    }

    /// Snaps a continuous tile-space position to the nearest tile.
    ///
    /// Returns `None` when the position is not finite or rounds to a negative index.
    #[must_use]
    pub fn nearest(position: DVec2) -> Option<Self> {
        if !position.is_finite() {
            return None;
        }

        Self::from_signed(position.x.round() as i64, position.y.round() as i64)
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Position of the tile expressed in continuous tile units.
    #[must_use]
    pub fn to_point(self) -> DVec2 {
        DVec2::new(f64::from(self.x), f64::from(self.y))
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Reports whether the two tiles are exactly one 4-directional step apart.
    #[must_use]
    pub fn is_adjacent(self, other: TileCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fixed dimensions of a room measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    /// Creates a grid size, rejecting zero-area grids.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }

        Ok(Self { width, height })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles contained in the grid.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        usize::try_from(u64::from(self.width) * u64::from(self.height)).unwrap_or(0)
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: TileCoord) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// Reports whether signed coordinates lie inside the grid.
    #[must_use]
    pub fn contains_signed(&self, x: i64, y: i64) -> bool {
        TileCoord::from_signed(x, y).is_some_and(|cell| self.contains(cell))
    }

    /// Tile located at the centre of the grid, rounding towards the origin.
    #[must_use]
    pub const fn center(&self) -> TileCoord {
        TileCoord::new(self.width / 2, self.height / 2)
    }

    /// Row-major storage offset of the tile, ignoring the row bound.
    fn index(&self, cell: TileCoord) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.x).ok()?;
        let row = usize::try_from(cell.y).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Row-major storage offset of a tile inside the grid.
    #[must_use]
    pub fn offset(&self, cell: TileCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        self.index(cell)
    }

    /// Tile stored at the provided row-major offset.
    #[must_use]
    pub fn cell_at(&self, offset: usize) -> Option<TileCoord> {
        let width = usize::try_from(self.width).ok()?;
        let x = u32::try_from(offset % width).ok()?;
        let y = u32::try_from(offset / width).ok()?;
        let cell = TileCoord::new(x, y);
        self.contains(cell).then_some(cell)
    }

    /// Iterator over every tile in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = TileCoord> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| TileCoord::new(x, y)))
    }
}

/// Errors raised when describing a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Both grid dimensions must be positive.
    #[error("grid dimensions must be positive (received {width}x{height})")]
    EmptyGrid {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
}

macro_rules! palette_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the provided key.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Retrieves the textual key of the identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

palette_id!(
    /// Identifier of a floor definition in the catalog.
    FloorId
);
palette_id!(
    /// Identifier of a wall definition in the catalog.
    WallId
);
palette_id!(
    /// Identifier of a furniture definition in the catalog.
    FurnitureId
);

/// Edge of a tile that may carry a wall segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallOrientation {
    /// Wall running along the tile's north-east edge.
    North,
    /// Wall running along the tile's north-west edge.
    West,
}

/// Quarter-turn rotation applied to a furniture piece, always in `0..4`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Rotation(u8);

impl Rotation {
    /// Number of distinct rotations.
    pub const COUNT: u8 = 4;

    /// Creates a rotation, wrapping the provided quarter turns modulo four.
    #[must_use]
    pub const fn new(quarter_turns: u8) -> Self {
        Self(quarter_turns % Self::COUNT)
    }

    /// Number of quarter turns in `0..4`.
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }

    /// Rotates by the provided number of steps; negative steps turn the other way.
    #[must_use]
    pub fn rotated(self, step: i32) -> Self {
        let turned = (i32::from(self.0) + step).rem_euclid(i32::from(Self::COUNT));
        Self::new(turned as u8)
    }

    /// Facing the rotated piece presents to the viewer.
    #[must_use]
    pub const fn facing(self) -> Facing {
        match self.0 {
            0 => Facing::NorthEast,
            1 => Facing::SouthEast,
            2 => Facing::SouthWest,
            _ => Facing::NorthWest,
        }
    }
}

impl From<u8> for Rotation {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Rotation> for u8 {
    fn from(value: Rotation) -> Self {
        value.0
    }
}

/// Direction an avatar or furniture piece faces on the isometric screen.
///
/// Screen directions follow the projection: increasing `x` runs south-east,
/// increasing `y` runs south-west.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Towards decreasing `y`.
    NorthEast,
    /// Towards increasing `x`.
    #[default]
    SouthEast,
    /// Towards increasing `y`.
    SouthWest,
    /// Towards decreasing `x`.
    NorthWest,
}

impl Facing {
    /// Maps a tile-space movement delta onto a facing.
    ///
    /// Axis-aligned steps map exactly; other deltas resolve by quadrant.
    /// Returns `None` for a zero delta so callers keep their previous facing.
    #[must_use]
    pub fn from_delta(delta: DVec2) -> Option<Self> {
        if !delta.is_finite() || delta.length_squared() <= POSITION_EPSILON * POSITION_EPSILON {
            return None;
        }

        let (dx, dy) = (delta.x, delta.y);
        let facing = if dx >= 0.0 && dy < 0.0 {
            Self::NorthEast
        } else if dx > 0.0 && dy >= 0.0 {
            Self::SouthEast
        } else if dx <= 0.0 && dy > 0.0 {
            Self::SouthWest
        } else {
            Self::NorthWest
        };
        Some(facing)
    }
}

/// Furniture piece occupying a tile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FurniturePlacement {
    /// Catalog entry describing the piece.
    pub id: FurnitureId,
    /// Orientation applied to the piece.
    pub rotation: Rotation,
}

impl FurniturePlacement {
    /// Creates a new furniture placement.
    #[must_use]
    pub fn new(id: FurnitureId, rotation: Rotation) -> Self {
        Self { id, rotation }
    }
}

/// Per-cell record stored by the room.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Floor finish painted on the tile.
    pub floor: Option<FloorId>,
    /// Wall segment along the north edge.
    pub wall_north: Option<WallId>,
    /// Wall segment along the west edge.
    pub wall_west: Option<WallId>,
    /// Furniture occupying the tile.
    pub furniture: Option<FurniturePlacement>,
}

impl Tile {
    /// Reports whether every slot of the tile is vacant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floor.is_none()
            && self.wall_north.is_none()
            && self.wall_west.is_none()
            && self.furniture.is_none()
    }

    /// Wall stored along the requested edge.
    #[must_use]
    pub fn wall(&self, orientation: WallOrientation) -> Option<&WallId> {
        match orientation {
            WallOrientation::North => self.wall_north.as_ref(),
            WallOrientation::West => self.wall_west.as_ref(),
        }
    }

    /// Mutable wall slot for the requested edge.
    pub fn wall_slot_mut(&mut self, orientation: WallOrientation) -> &mut Option<WallId> {
        match orientation {
            WallOrientation::North => &mut self.wall_north,
            WallOrientation::West => &mut self.wall_west,
        }
    }

    /// Resets every slot to vacant.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Ordered walk from a start tile (exclusive) to a target tile (inclusive).
///
/// Consecutive steps are exactly one 4-directional grid step apart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    steps: Vec<TileCoord>,
}

impl Path {
    /// Creates a path from already validated steps.
    #[must_use]
    pub fn new(steps: Vec<TileCoord>) -> Self {
        Self { steps }
    }

    /// Waypoints in walking order.
    #[must_use]
    pub fn steps(&self) -> &[TileCoord] {
        &self.steps
    }

    /// Number of grid steps contained in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Final tile of the path, if any.
    #[must_use]
    pub fn destination(&self) -> Option<TileCoord> {
        self.steps.last().copied()
    }

    /// Consumes the path, yielding its waypoints.
    #[must_use]
    pub fn into_steps(self) -> Vec<TileCoord> {
        self.steps
    }
}

/// Commands that express every permissible room edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditCommand {
    /// Paints the floor of a tile.
    SetFloor {
        /// Tile receiving the floor.
        cell: TileCoord,
        /// Floor finish to paint.
        floor: FloorId,
    },
    /// Removes the floor finish of a tile.
    ClearFloor {
        /// Tile whose floor is removed.
        cell: TileCoord,
    },
    /// Toggles a wall segment; repeating the same wall clears it.
    ToggleWall {
        /// Tile carrying the wall.
        cell: TileCoord,
        /// Edge of the tile the wall runs along.
        orientation: WallOrientation,
        /// Wall finish to toggle.
        wall: WallId,
    },
    /// Places furniture, replacing any piece already on the tile.
    SetFurniture {
        /// Tile receiving the furniture.
        cell: TileCoord,
        /// Furniture to place.
        furniture: FurnitureId,
        /// Orientation applied to the piece.
        rotation: Rotation,
    },
    /// Rotates the furniture occupying a tile.
    RotateFurniture {
        /// Tile holding the furniture.
        cell: TileCoord,
        /// Quarter turns to apply; negative values turn the other way.
        step: i32,
    },
    /// Removes the furniture occupying a tile.
    ClearFurniture {
        /// Tile whose furniture is removed.
        cell: TileCoord,
    },
    /// Resets every slot of a tile.
    ClearTile {
        /// Tile to reset.
        cell: TileCoord,
    },
    /// Resets every tile in the room.
    ClearAll,
    /// Replaces the room with the starter layout.
    ApplyStarterLayout,
}

/// Notification payload broadcast after the room changed.
///
/// Listeners may ignore the payload and simply redraw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomChange {
    /// The floor of a tile was painted or cleared.
    Floor {
        /// Edited tile.
        cell: TileCoord,
        /// Floor stored after the edit.
        floor: Option<FloorId>,
    },
    /// A wall segment was toggled.
    Wall {
        /// Edited tile.
        cell: TileCoord,
        /// Edge the wall runs along.
        orientation: WallOrientation,
        /// Wall stored after the edit.
        wall: Option<WallId>,
    },
    /// Furniture was placed, rotated or removed.
    Furniture {
        /// Edited tile.
        cell: TileCoord,
        /// Furniture stored after the edit.
        furniture: Option<FurniturePlacement>,
    },
    /// Every slot of a tile was reset.
    TileCleared {
        /// Reset tile.
        cell: TileCoord,
    },
    /// Every tile of the room was reset.
    RoomCleared,
    /// The starter layout replaced the room contents.
    StarterLayout,
}

/// Read-only view over the dense tile storage.
#[derive(Clone, Copy, Debug)]
pub struct TileView<'a> {
    tiles: &'a [Tile],
    size: GridSize,
}

impl<'a> TileView<'a> {
    /// Captures a view backed by row-major tile storage.
    #[must_use]
    pub fn new(tiles: &'a [Tile], size: GridSize) -> Self {
        Self { tiles, size }
    }

    /// Dimensions of the viewed grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Tile stored at the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn tile(&self, cell: TileCoord) -> Option<&'a Tile> {
        self.size
            .offset(cell)
            .and_then(|offset| self.tiles.get(offset))
    }

    /// Furniture occupying the provided cell, if any.
    #[must_use]
    pub fn furniture(&self, cell: TileCoord) -> Option<&'a FurniturePlacement> {
        self.tile(cell).and_then(|tile| tile.furniture.as_ref())
    }

    /// Reports whether an avatar may stand on the cell.
    ///
    /// Only furniture blocks movement; floors and walls never do.
    #[must_use]
    pub fn is_walkable(&self, cell: TileCoord) -> bool {
        self.size.contains(cell) && self.furniture(cell).is_none()
    }

    /// Iterator over every tile paired with its coordinate, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &'a Tile)> + 'a {
        let size = self.size;
        self.tiles
            .iter()
            .enumerate()
            .filter_map(move |(offset, tile)| size.cell_at(offset).map(|cell| (cell, tile)))
    }
}

/// Render-state snapshot of the avatar polled once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarPose {
    /// Continuous position measured in tile units.
    pub position: DVec2,
    /// Direction the avatar faces.
    pub facing: Facing,
    /// Walk-cycle phase in `[0, 1)`.
    pub animation_phase: f64,
    /// Blend between idle (`0`) and full stride (`1`).
    pub stride: f64,
    /// Vertical bob offset in pixels.
    pub bob: f64,
    /// Horizontal sway offset in pixels.
    pub sway: f64,
    /// Forward lean of the torso in pixels, swinging with the stride.
    pub lean: f64,
    /// Whether the avatar is travelling along a path.
    pub moving: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TileCoord::new(1, 1);
        let destination = TileCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn grid_size_rejects_zero_dimensions() {
        assert_eq!(
            GridSize::new(0, 4),
            Err(GridError::EmptyGrid {
                width: 0,
                height: 4
            })
        );
        assert!(GridSize::new(3, 0).is_err());
    }

    #[test]
    fn grid_size_bounds_and_offsets_agree() {
        let size = GridSize::new(3, 2).expect("valid grid");
        assert_eq!(size.tile_count(), 6);
        assert!(size.contains(TileCoord::new(2, 1)));
        assert!(!size.contains(TileCoord::new(3, 0)));
        assert!(!size.contains_signed(-1, 0));
        assert_eq!(size.offset(TileCoord::new(1, 1)), Some(4));
        assert_eq!(size.cell_at(4), Some(TileCoord::new(1, 1)));
        assert_eq!(size.cell_at(6), None);
        assert_eq!(size.cells().count(), 6);
    }

    #[test]
    fn nearest_tile_rejects_negative_and_non_finite_positions() {
        assert_eq!(
            TileCoord::nearest(DVec2::new(1.4, 2.6)),
            Some(TileCoord::new(1, 3))
        );
        assert_eq!(TileCoord::nearest(DVec2::new(-0.6, 0.0)), None);
        assert_eq!(TileCoord::nearest(DVec2::new(f64::NAN, 0.0)), None);
    }

    #[test]
    fn rotation_wraps_in_both_directions() {
        assert_eq!(Rotation::new(3).rotated(1), Rotation::new(0));
        assert_eq!(Rotation::new(0).rotated(-1), Rotation::new(3));
        assert_eq!(Rotation::new(6).quarter_turns(), 2);
    }

    #[test]
    fn facing_maps_axis_steps_and_keeps_zero_delta_undecided() {
        assert_eq!(
            Facing::from_delta(DVec2::new(1.0, 0.0)),
            Some(Facing::SouthEast)
        );
        assert_eq!(
            Facing::from_delta(DVec2::new(-1.0, 0.0)),
            Some(Facing::NorthWest)
        );
        assert_eq!(
            Facing::from_delta(DVec2::new(0.0, 1.0)),
            Some(Facing::SouthWest)
        );
        assert_eq!(
            Facing::from_delta(DVec2::new(0.0, -1.0)),
            Some(Facing::NorthEast)
        );
        assert_eq!(Facing::from_delta(DVec2::ZERO), None);
    }

    #[test]
    fn tile_view_treats_furniture_as_the_only_obstacle() {
        let size = GridSize::new(2, 1).expect("valid grid");
        let tiles = vec![
            Tile {
                wall_north: Some(WallId::new("wall-north")),
                ..Tile::default()
            },
            Tile {
                furniture: Some(FurniturePlacement::new(
                    FurnitureId::new("furni-sofa"),
                    Rotation::default(),
                )),
                ..Tile::default()
            },
        ];
        let view = TileView::new(&tiles, size);

        assert!(view.is_walkable(TileCoord::new(0, 0)));
        assert!(!view.is_walkable(TileCoord::new(1, 0)));
        assert!(!view.is_walkable(TileCoord::new(2, 0)));
        assert_eq!(view.iter().count(), 2);
    }

    #[test]
    fn tile_round_trips_through_bincode() {
        let tile = Tile {
            floor: Some(FloorId::new("floor-wood")),
            wall_north: None,
            wall_west: Some(WallId::new("wall-west")),
            furniture: Some(FurniturePlacement::new(
                FurnitureId::new("furni-table"),
                Rotation::new(2),
            )),
        };
        let bytes = bincode::serialize(&tile).expect("serialize");
        let restored: Tile = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, tile);
    }
}
