#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Painter's-algorithm draw ordering for a room frame.
//!
//! Floors form the first layer, walls the second, and furniture together with
//! the avatar the third. Within each layer entries are ordered by the depth
//! key `x + y`, ties broken by `y` and then by `x`, so nearer entities draw
//! on top of farther ones.

use std::cmp::Ordering;

use glam::DVec2;
use room_builder_core::{
    AvatarPose, Catalog, FloorId, FurniturePlacement, FurnitureShape, GridTransform, TileCoord,
    TileView, WallId, WallOrientation,
};

/// Compositing pass an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrawLayer {
    /// Floor diamonds.
    Floor,
    /// Wall segments along tile edges.
    Wall,
    /// Furniture and the avatar.
    Entity,
}

/// Entity the renderer should draw.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityRef {
    /// Floor diamond of a tile; `floor` is `None` for bare or unknown finishes.
    Floor {
        /// Tile being drawn.
        cell: TileCoord,
        /// Floor finish resolved through the catalog.
        floor: Option<FloorId>,
    },
    /// Wall segment along one tile edge.
    Wall {
        /// Tile carrying the wall.
        cell: TileCoord,
        /// Edge the wall runs along.
        orientation: WallOrientation,
        /// Wall finish.
        wall: WallId,
    },
    /// Furniture piece standing on a tile.
    Furniture {
        /// Tile occupied by the piece.
        cell: TileCoord,
        /// Placement stored by the room.
        placement: FurniturePlacement,
        /// Archetype selecting the draw routine.
        shape: FurnitureShape,
        /// Extrusion height in pixels at zoom 1.
        height: f64,
    },
    /// The avatar at its continuous position.
    Avatar {
        /// Render-state snapshot.
        pose: AvatarPose,
    },
}

/// Single entry of the ordered draw list.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawEntry {
    /// Compositing pass of the entry.
    pub layer: DrawLayer,
    /// Entity to draw.
    pub entity: EntityRef,
    /// Tile-space position the depth key derives from.
    pub grid: DVec2,
    /// Screen position of the entity's anchor.
    pub screen: DVec2,
}

impl DrawEntry {
    /// Primary depth key `x + y`.
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.grid.x + self.grid.y
    }
}

/// Ordered entries for one frame, drawn first to last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    entries: Vec<DrawEntry>,
}

impl DrawList {
    /// Iterator over the entries in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &DrawEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one layer in draw order.
    pub fn layer(&self, layer: DrawLayer) -> impl Iterator<Item = &DrawEntry> {
        self.entries.iter().filter(move |entry| entry.layer == layer)
    }
}

/// Compares two tile-space positions by depth, then `y`, then `x`.
#[must_use]
pub fn depth_order(a: DVec2, b: DVec2) -> Ordering {
    (a.x + a.y)
        .total_cmp(&(b.x + b.y))
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.x.total_cmp(&b.x))
}

/// Builds the draw order of a frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct DepthSorter;

impl DepthSorter {
    /// Creates a new sorter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Orders every floor, wall, furniture piece and the avatar for drawing.
    ///
    /// Walls and furniture whose ids are missing from the catalog are
    /// skipped. Furniture sharing a depth key with the avatar draws first.
    #[must_use]
    pub fn sort(
        &self,
        transform: &GridTransform,
        view: TileView<'_>,
        catalog: &Catalog,
        avatar: Option<&AvatarPose>,
    ) -> DrawList {
        let anchor = |grid: DVec2| transform.grid_to_screen(grid);
        let mut floors = Vec::with_capacity(view.size().tile_count());
        let mut walls = Vec::new();
        let mut entities = Vec::new();

        for (cell, tile) in view.iter() {
            let grid = cell.to_point();
            let screen = anchor(grid);

            floors.push(DrawEntry {
                layer: DrawLayer::Floor,
                entity: EntityRef::Floor {
                    cell,
                    floor: tile.floor.clone().filter(|id| catalog.floor(id).is_some()),
                },
                grid,
                screen,
            });

            for orientation in [WallOrientation::North, WallOrientation::West] {
                let Some(wall) = tile.wall(orientation).filter(|id| catalog.wall(id).is_some())
                else {
                    continue;
                };
                walls.push(DrawEntry {
                    layer: DrawLayer::Wall,
                    entity: EntityRef::Wall {
                        cell,
                        orientation,
                        wall: wall.clone(),
                    },
                    grid,
                    screen,
                });
            }

            let Some(placement) = &tile.furniture else {
                continue;
            };
            let Some(definition) = catalog.furniture_definition(&placement.id) else {
                continue;
            };
            entities.push(DrawEntry {
                layer: DrawLayer::Entity,
                entity: EntityRef::Furniture {
                    cell,
                    placement: placement.clone(),
                    shape: definition.shape,
                    height: definition.height,
                },
                grid,
                screen,
            });
        }

        if let Some(pose) = avatar.filter(|pose| pose.position.is_finite()) {
            entities.push(DrawEntry {
                layer: DrawLayer::Entity,
                entity: EntityRef::Avatar { pose: *pose },
                grid: pose.position,
                screen: anchor(pose.position),
            });
        }

        let mut entries = Vec::with_capacity(floors.len() + walls.len() + entities.len());
        for mut layer in [floors, walls, entities] {
            layer.sort_by(|a, b| depth_order(a.grid, b.grid));
            entries.extend(layer);
        }

        DrawList { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_order_breaks_ties_by_row_then_column() {
        let a = DVec2::new(2.0, 0.0);
        let b = DVec2::new(1.0, 1.0);
        assert_eq!(depth_order(a, b), Ordering::Less);
        assert_eq!(depth_order(b, a), Ordering::Greater);
        assert_eq!(
            depth_order(DVec2::new(0.0, 1.0), DVec2::new(1.0, 1.0)),
            Ordering::Less
        );
        assert_eq!(depth_order(a, a), Ordering::Equal);
    }

    #[test]
    fn fractional_depth_sits_between_integer_rows() {
        let avatar = DVec2::new(1.5, 1.0);
        assert_eq!(depth_order(DVec2::new(1.0, 1.0), avatar), Ordering::Less);
        assert_eq!(depth_order(avatar, DVec2::new(3.0, 0.0)), Ordering::Less);
    }

    #[test]
    fn empty_list_reports_empty() {
        let list = DrawList::default();
        assert!(list.is_empty());
        assert_eq!(list.layer(DrawLayer::Floor).count(), 0);
    }
}
