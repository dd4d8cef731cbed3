#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tile storage for the room builder.
//!
//! The [`RoomGrid`] owns every tile, enforces bounds and catalog membership on
//! edits, and synchronously broadcasts a [`RoomChange`] to its subscribers
//! after each accepted mutation.

use std::fmt;

use room_builder_core::{
    Catalog, EditCommand, FloorId, FurnitureId, FurniturePlacement, GridSize, RoomChange,
    Rotation, Tile, TileCoord, WallId, WallOrientation,
};
use tracing::debug;

const STARTER_PADDING: u32 = 2;
const STARTER_RUG_FLOOR: usize = 2;

/// Token returned by [`RoomGrid::subscribe`] that identifies a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&RoomChange) + Send>;

/// Dense row-major tile store with change notification.
pub struct RoomGrid {
    size: GridSize,
    tiles: Vec<Tile>,
    catalog: Catalog,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl RoomGrid {
    /// Creates an empty room of the provided size backed by the catalog.
    #[must_use]
    pub fn new(size: GridSize, catalog: Catalog) -> Self {
        Self {
            size,
            tiles: vec![Tile::default(); size.tile_count()],
            catalog,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Registers a listener invoked after every accepted edit.
    ///
    /// Listeners run synchronously in registration order.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&RoomChange) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when the token is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(position) = self
            .listeners
            .iter()
            .position(|(candidate, _)| *candidate == id)
        else {
            return false;
        };

        let _ = self.listeners.remove(position);
        true
    }

    /// Paints the floor of a tile.
    pub fn set_floor(&mut self, cell: TileCoord, floor: FloorId) -> bool {
        if self.catalog.floor(&floor).is_none() {
            debug!(%cell, floor = %floor, "rejected unknown floor");
            return false;
        }
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };

        tile.floor = Some(floor.clone());
        self.notify(&RoomChange::Floor {
            cell,
            floor: Some(floor),
        });
        true
    }

    /// Removes the floor finish of a tile.
    pub fn clear_floor(&mut self, cell: TileCoord) -> bool {
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };

        tile.floor = None;
        self.notify(&RoomChange::Floor { cell, floor: None });
        true
    }

    /// Toggles a wall segment: placing the wall already stored clears it.
    pub fn toggle_wall(
        &mut self,
        cell: TileCoord,
        orientation: WallOrientation,
        wall: WallId,
    ) -> bool {
        if self.catalog.wall(&wall).is_none() {
            debug!(%cell, wall = %wall, "rejected unknown wall");
            return false;
        }
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };

        let slot = tile.wall_slot_mut(orientation);
        *slot = if slot.as_ref() == Some(&wall) {
            None
        } else {
            Some(wall)
        };
        let stored = slot.clone();
        self.notify(&RoomChange::Wall {
            cell,
            orientation,
            wall: stored,
        });
        true
    }

    /// Places furniture on a tile, replacing any existing piece.
    pub fn set_furniture(
        &mut self,
        cell: TileCoord,
        furniture: FurnitureId,
        rotation: Rotation,
    ) -> bool {
        if self.catalog.furniture_definition(&furniture).is_none() {
            debug!(%cell, furniture = %furniture, "rejected unknown furniture");
            return false;
        }
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };

        let placement = FurniturePlacement::new(furniture, rotation);
        tile.furniture = Some(placement.clone());
        self.notify(&RoomChange::Furniture {
            cell,
            furniture: Some(placement),
        });
        true
    }

    /// Rotates the furniture on a tile. Returns `false` when the tile holds none.
    pub fn rotate_furniture(&mut self, cell: TileCoord, step: i32) -> bool {
        let Some(placement) = self
            .tile_mut(cell)
            .and_then(|tile| tile.furniture.as_mut())
        else {
            return false;
        };

        placement.rotation = placement.rotation.rotated(step);
        let stored = placement.clone();
        self.notify(&RoomChange::Furniture {
            cell,
            furniture: Some(stored),
        });
        true
    }

    /// Removes the furniture occupying a tile.
    pub fn clear_furniture(&mut self, cell: TileCoord) -> bool {
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };

        tile.furniture = None;
        self.notify(&RoomChange::Furniture {
            cell,
            furniture: None,
        });
        true
    }

    /// Resets every slot of a tile.
    pub fn clear_tile(&mut self, cell: TileCoord) -> bool {
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };

        tile.clear();
        self.notify(&RoomChange::TileCleared { cell });
        true
    }

    /// Resets every tile in the room.
    pub fn clear_all(&mut self) {
        self.reset_tiles();
        self.notify(&RoomChange::RoomCleared);
    }

    /// Replaces the room contents with the starter layout.
    ///
    /// The layout paints a padded checkerboard floor, a rug in the centre,
    /// walls along the north and west padding edges and a few furniture
    /// pieces around the centre. Listeners are notified once.
    pub fn apply_starter_layout(&mut self) {
        self.reset_tiles();

        let floors: Vec<FloorId> = self
            .catalog
            .floors()
            .iter()
            .map(|entry| entry.id.clone())
            .collect();
        let furniture: Vec<FurnitureId> = self
            .catalog
            .furniture()
            .iter()
            .map(|entry| entry.id.clone())
            .collect();
        let wall_north = self
            .catalog
            .first_wall_for(WallOrientation::North)
            .map(|entry| entry.id.clone());
        let wall_west = self
            .catalog
            .first_wall_for(WallOrientation::West)
            .map(|entry| entry.id.clone());

        let width = self.size.width();
        let height = self.size.height();
        let columns = STARTER_PADDING..width.saturating_sub(STARTER_PADDING);
        let rows = STARTER_PADDING..height.saturating_sub(STARTER_PADDING);

        if !floors.is_empty() {
            for y in rows.clone() {
                for x in columns.clone() {
                    let choice = (x as usize + y as usize) % floors.len();
                    self.store_floor(TileCoord::new(x, y), &floors[choice]);
                }
            }
        }

        let center = self.size.center();
        let (cx, cy) = (i64::from(center.x()), i64::from(center.y()));
        if let Some(rug) = floors.get(STARTER_RUG_FLOOR).or_else(|| floors.first()) {
            for y in cy - 1..=cy + 1 {
                for x in cx - 2..=cx + 2 {
                    if let Some(cell) = self.signed_cell(x, y) {
                        self.store_floor(cell, rug);
                    }
                }
            }
        }

        if let Some(wall) = wall_north {
            for x in columns {
                if let Some(tile) = self.tile_mut(TileCoord::new(x, STARTER_PADDING)) {
                    tile.wall_north = Some(wall.clone());
                }
            }
        }

        if let Some(wall) = wall_west {
            for y in rows {
                if let Some(tile) = self.tile_mut(TileCoord::new(STARTER_PADDING, y)) {
                    tile.wall_west = Some(wall.clone());
                }
            }
        }

        let spots = [(cx - 2, cy + 1), (cx, cy), (cx + 3, cy - 1)];
        for (id, (x, y)) in furniture.iter().zip(spots) {
            if let Some(tile) = self
                .signed_cell(x, y)
                .and_then(|cell| self.tile_mut(cell))
            {
                tile.furniture = Some(FurniturePlacement::new(id.clone(), Rotation::default()));
            }
        }

        debug!(
            width,
            height,
            furniture = furniture.len().min(spots.len()),
            "applied starter layout"
        );
        self.notify(&RoomChange::StarterLayout);
    }

    fn tile_mut(&mut self, cell: TileCoord) -> Option<&mut Tile> {
        let offset = self.size.offset(cell)?;
        self.tiles.get_mut(offset)
    }

    fn signed_cell(&self, x: i64, y: i64) -> Option<TileCoord> {
        TileCoord::from_signed(x, y).filter(|cell| self.size.contains(*cell))
    }

    fn store_floor(&mut self, cell: TileCoord, floor: &FloorId) {
        if let Some(tile) = self.tile_mut(cell) {
            tile.floor = Some(floor.clone());
        }
    }

    fn reset_tiles(&mut self) {
        self.tiles.iter_mut().for_each(Tile::clear);
    }

    fn notify(&mut self, change: &RoomChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

impl fmt::Debug for RoomGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomGrid")
            .field("size", &self.size)
            .field("tiles", &self.tiles.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Applies the provided command to the room.
///
/// Returns `false` when the command was rejected, in which case the room is
/// unchanged and no listener was notified.
pub fn apply(grid: &mut RoomGrid, command: EditCommand) -> bool {
    match command {
        EditCommand::SetFloor { cell, floor } => grid.set_floor(cell, floor),
        EditCommand::ClearFloor { cell } => grid.clear_floor(cell),
        EditCommand::ToggleWall {
            cell,
            orientation,
            wall,
        } => grid.toggle_wall(cell, orientation, wall),
        EditCommand::SetFurniture {
            cell,
            furniture,
            rotation,
        } => grid.set_furniture(cell, furniture, rotation),
        EditCommand::RotateFurniture { cell, step } => grid.rotate_furniture(cell, step),
        EditCommand::ClearFurniture { cell } => grid.clear_furniture(cell),
        EditCommand::ClearTile { cell } => grid.clear_tile(cell),
        EditCommand::ClearAll => {
            grid.clear_all();
            true
        }
        EditCommand::ApplyStarterLayout => {
            grid.apply_starter_layout();
            true
        }
    }
}

/// Query helpers that expose read-only room state.
pub mod query {
    use room_builder_core::{Catalog, FurniturePlacement, GridSize, Tile, TileCoord, TileView};

    use super::RoomGrid;

    /// Dimensions of the room.
    #[must_use]
    pub fn size(grid: &RoomGrid) -> GridSize {
        grid.size
    }

    /// Catalog the room validates edits against.
    #[must_use]
    pub fn catalog(grid: &RoomGrid) -> &Catalog {
        &grid.catalog
    }

    /// Reports whether the tile lies inside the room.
    #[must_use]
    pub fn is_inside(grid: &RoomGrid, cell: TileCoord) -> bool {
        grid.size.contains(cell)
    }

    /// Tile stored at the provided cell, or `None` outside the room.
    #[must_use]
    pub fn tile(grid: &RoomGrid, cell: TileCoord) -> Option<&Tile> {
        tile_view(grid).tile(cell)
    }

    /// Furniture occupying the provided cell.
    #[must_use]
    pub fn furniture_at(grid: &RoomGrid, cell: TileCoord) -> Option<&FurniturePlacement> {
        tile_view(grid).furniture(cell)
    }

    /// Captures a read-only view of every tile.
    #[must_use]
    pub fn tile_view(grid: &RoomGrid) -> TileView<'_> {
        TileView::new(&grid.tiles, grid.size)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(grid: &RoomGrid) -> usize {
        grid.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn grid(width: u32, height: u32) -> RoomGrid {
        RoomGrid::new(
            GridSize::new(width, height).expect("valid grid"),
            Catalog::starter(),
        )
    }

    fn record(grid: &mut RoomGrid) -> Arc<Mutex<Vec<RoomChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let _ = grid.subscribe(move |change| sink.lock().expect("lock").push(change.clone()));
        log
    }

    #[test]
    fn toggle_wall_twice_restores_previous_value() {
        let mut grid = grid(4, 4);
        let cell = TileCoord::new(1, 2);
        let wall = WallId::new("wall-north");

        assert!(grid.toggle_wall(cell, WallOrientation::North, wall.clone()));
        assert_eq!(
            query::tile(&grid, cell).and_then(|tile| tile.wall_north.clone()),
            Some(wall.clone())
        );
        assert!(grid.toggle_wall(cell, WallOrientation::North, wall));
        assert_eq!(query::tile(&grid, cell), Some(&Tile::default()));
    }

    #[test]
    fn toggling_a_different_wall_replaces_the_segment() {
        let mut grid = grid(2, 2);
        let cell = TileCoord::new(0, 0);

        assert!(grid.toggle_wall(cell, WallOrientation::West, WallId::new("wall-west")));
        assert!(grid.toggle_wall(cell, WallOrientation::West, WallId::new("wall-north")));
        assert_eq!(
            query::tile(&grid, cell).and_then(|tile| tile.wall_west.clone()),
            Some(WallId::new("wall-north"))
        );
    }

    #[test]
    fn every_accepted_edit_notifies_exactly_once_even_without_change() {
        let mut grid = grid(3, 3);
        let log = record(&mut grid);
        let cell = TileCoord::new(1, 1);

        assert!(grid.set_floor(cell, FloorId::new("floor-wood")));
        assert!(grid.set_floor(cell, FloorId::new("floor-wood")));
        assert!(grid.clear_furniture(cell));

        let changes = log.lock().expect("lock").clone();
        assert_eq!(
            changes,
            vec![
                RoomChange::Floor {
                    cell,
                    floor: Some(FloorId::new("floor-wood")),
                },
                RoomChange::Floor {
                    cell,
                    floor: Some(FloorId::new("floor-wood")),
                },
                RoomChange::Furniture {
                    cell,
                    furniture: None,
                },
            ]
        );
    }

    #[test]
    fn out_of_bounds_edits_are_silent_no_ops() {
        let mut grid = grid(2, 2);
        let log = record(&mut grid);
        let outside = TileCoord::new(2, 0);

        assert!(!grid.set_floor(outside, FloorId::new("floor-wood")));
        assert!(!grid.clear_floor(outside));
        assert!(!grid.toggle_wall(outside, WallOrientation::North, WallId::new("wall-north")));
        assert!(!grid.set_furniture(outside, FurnitureId::new("furni-sofa"), Rotation::default()));
        assert!(!grid.clear_furniture(outside));
        assert!(!grid.clear_tile(outside));
        assert!(query::tile(&grid, outside).is_none());
        assert!(log.lock().expect("lock").is_empty());
    }

    #[test]
    fn unknown_palette_ids_are_rejected_without_notification() {
        let mut grid = grid(2, 2);
        let log = record(&mut grid);
        let cell = TileCoord::new(0, 0);

        assert!(!grid.set_floor(cell, FloorId::new("floor-lava")));
        assert!(!grid.set_furniture(cell, FurnitureId::new("furni-piano"), Rotation::default()));
        assert_eq!(query::tile(&grid, cell), Some(&Tile::default()));
        assert!(log.lock().expect("lock").is_empty());
    }

    #[test]
    fn placing_furniture_replaces_previous_piece() {
        let mut grid = grid(2, 2);
        let cell = TileCoord::new(1, 0);

        assert!(grid.set_furniture(cell, FurnitureId::new("furni-sofa"), Rotation::new(1)));
        assert!(grid.set_furniture(cell, FurnitureId::new("furni-table"), Rotation::default()));
        assert_eq!(
            query::furniture_at(&grid, cell),
            Some(&FurniturePlacement::new(
                FurnitureId::new("furni-table"),
                Rotation::default()
            ))
        );
    }

    #[test]
    fn rotate_furniture_wraps_and_requires_an_occupant() {
        let mut grid = grid(2, 2);
        let cell = TileCoord::new(0, 1);

        assert!(!grid.rotate_furniture(cell, 1));
        assert!(grid.set_furniture(cell, FurnitureId::new("furni-plant"), Rotation::new(3)));
        assert!(grid.rotate_furniture(cell, 1));
        assert_eq!(
            query::furniture_at(&grid, cell).map(|placement| placement.rotation),
            Some(Rotation::new(0))
        );
    }

    #[test]
    fn listeners_run_in_registration_order_until_unsubscribed() {
        let mut grid = grid(2, 2);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first_sink = Arc::clone(&order);
        let first = grid.subscribe(move |_| first_sink.lock().expect("lock").push("first"));
        let second_sink = Arc::clone(&order);
        let _ = grid.subscribe(move |_| second_sink.lock().expect("lock").push("second"));

        grid.clear_all();
        assert!(grid.unsubscribe(first));
        assert!(!grid.unsubscribe(first));
        grid.clear_all();

        assert_eq!(
            order.lock().expect("lock").clone(),
            vec!["first", "second", "second"]
        );
        assert_eq!(query::listener_count(&grid), 1);
    }

    #[test]
    fn starter_layout_populates_room_and_notifies_once() {
        let mut grid = grid(12, 10);
        let log = record(&mut grid);

        grid.apply_starter_layout();

        assert_eq!(
            log.lock().expect("lock").clone(),
            vec![RoomChange::StarterLayout]
        );
        let center = TileCoord::new(6, 5);
        assert_eq!(
            query::furniture_at(&grid, center).map(|placement| placement.id.clone()),
            Some(FurnitureId::new("furni-table"))
        );
        assert_eq!(
            query::furniture_at(&grid, TileCoord::new(4, 6)).map(|placement| placement.id.clone()),
            Some(FurnitureId::new("furni-sofa"))
        );
        assert_eq!(
            query::furniture_at(&grid, TileCoord::new(9, 4)).map(|placement| placement.id.clone()),
            Some(FurnitureId::new("furni-plant"))
        );
        assert_eq!(
            query::tile(&grid, TileCoord::new(5, 5)).and_then(|tile| tile.floor.clone()),
            Some(FloorId::new("floor-emerald"))
        );
        assert_eq!(
            query::tile(&grid, TileCoord::new(3, 2)).and_then(|tile| tile.wall_north.clone()),
            Some(WallId::new("wall-north"))
        );
        assert_eq!(
            query::tile(&grid, TileCoord::new(2, 3)).and_then(|tile| tile.wall_west.clone()),
            Some(WallId::new("wall-west"))
        );
        assert_eq!(query::tile(&grid, TileCoord::new(0, 0)), Some(&Tile::default()));
    }

    #[test]
    fn apply_routes_commands_to_the_room() {
        let mut grid = grid(3, 3);
        let cell = TileCoord::new(2, 2);

        assert!(apply(
            &mut grid,
            EditCommand::SetFurniture {
                cell,
                furniture: FurnitureId::new("furni-lamp"),
                rotation: Rotation::default(),
            }
        ));
        assert!(apply(&mut grid, EditCommand::RotateFurniture { cell, step: -1 }));
        assert_eq!(
            query::furniture_at(&grid, cell).map(|placement| placement.rotation),
            Some(Rotation::new(3))
        );
        assert!(apply(&mut grid, EditCommand::ClearTile { cell }));
        assert!(query::tile_view(&grid).is_walkable(cell));
        assert!(!apply(
            &mut grid,
            EditCommand::ClearFloor {
                cell: TileCoord::new(3, 3)
            }
        ));
    }
}
