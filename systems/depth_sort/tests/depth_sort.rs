use glam::DVec2;
use room_builder_core::{
    AvatarPose, Catalog, Facing, FloorId, FurnitureId, FurnitureShape, GridSize, GridTransform,
    Rotation, TileCoord, TileMetrics, WallId, WallOrientation,
};
use room_builder_system_depth_sort::{DepthSorter, DrawLayer, DrawList, EntityRef};
use room_builder_world::{query, RoomGrid};

fn room(width: u32, height: u32) -> RoomGrid {
    RoomGrid::new(
        GridSize::new(width, height).expect("valid grid"),
        Catalog::starter(),
    )
}

fn transform() -> GridTransform {
    GridTransform::new(
        TileMetrics::new(64.0, 32.0).expect("metrics"),
        DVec2::new(400.0, 120.0),
    )
    .expect("transform")
}

fn pose_at(x: f64, y: f64) -> AvatarPose {
    AvatarPose {
        position: DVec2::new(x, y),
        facing: Facing::SouthEast,
        animation_phase: 0.0,
        stride: 0.0,
        bob: 0.0,
        sway: 0.0,
        lean: 0.0,
        moving: false,
    }
}

fn furniture_cells(list: &DrawList) -> Vec<TileCoord> {
    list.layer(DrawLayer::Entity)
        .filter_map(|entry| match &entry.entity {
            EntityRef::Furniture { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect()
}

#[test]
fn equal_depth_furniture_orders_by_row_then_column() {
    let mut grid = room(4, 4);
    for (x, y) in [(1, 1), (2, 0)] {
        assert!(grid.set_furniture(
            TileCoord::new(x, y),
            FurnitureId::new("furni-table"),
            Rotation::default()
        ));
    }

    let list = DepthSorter::new().sort(
        &transform(),
        query::tile_view(&grid),
        query::catalog(&grid),
        None,
    );

    assert_eq!(
        furniture_cells(&list),
        vec![TileCoord::new(2, 0), TileCoord::new(1, 1)]
    );
}

#[test]
fn layers_draw_floors_then_walls_then_entities() {
    let mut grid = room(3, 3);
    assert!(grid.set_floor(TileCoord::new(2, 2), FloorId::new("floor-wood")));
    assert!(grid.toggle_wall(
        TileCoord::new(2, 2),
        WallOrientation::North,
        WallId::new("wall-north")
    ));
    assert!(grid.set_furniture(
        TileCoord::new(0, 0),
        FurnitureId::new("furni-sofa"),
        Rotation::new(2)
    ));

    let list = DepthSorter::new().sort(
        &transform(),
        query::tile_view(&grid),
        query::catalog(&grid),
        Some(&pose_at(1.0, 1.0)),
    );

    let layers: Vec<_> = list.iter().map(|entry| entry.layer).collect();
    let mut sorted = layers.clone();
    sorted.sort();
    assert_eq!(layers, sorted);
    assert_eq!(list.layer(DrawLayer::Floor).count(), 9);
    assert_eq!(list.layer(DrawLayer::Wall).count(), 1);
    assert_eq!(list.layer(DrawLayer::Entity).count(), 2);

    let depths: Vec<_> = list.layer(DrawLayer::Floor).map(|entry| entry.depth()).collect();
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn avatar_interleaves_with_furniture_by_fractional_depth() {
    let mut grid = room(4, 4);
    for (x, y) in [(0, 1), (2, 1)] {
        assert!(grid.set_furniture(
            TileCoord::new(x, y),
            FurnitureId::new("furni-plant"),
            Rotation::default()
        ));
    }

    let list = DepthSorter::new().sort(
        &transform(),
        query::tile_view(&grid),
        query::catalog(&grid),
        Some(&pose_at(1.4, 1.0)),
    );

    let order: Vec<_> = list
        .layer(DrawLayer::Entity)
        .map(|entry| match &entry.entity {
            EntityRef::Furniture { cell, shape, .. } => {
                assert_eq!(*shape, FurnitureShape::PalmPlant);
                format!("furniture {cell}")
            }
            EntityRef::Avatar { .. } => "avatar".to_owned(),
            other => panic!("unexpected entity {other:?}"),
        })
        .collect();
    assert_eq!(order, vec!["furniture (0, 1)", "avatar", "furniture (2, 1)"]);
}

#[test]
fn furniture_draws_before_the_avatar_on_identical_keys() {
    let mut grid = room(3, 3);
    assert!(grid.set_furniture(
        TileCoord::new(1, 1),
        FurnitureId::new("furni-lamp"),
        Rotation::default()
    ));

    let list = DepthSorter::new().sort(
        &transform(),
        query::tile_view(&grid),
        query::catalog(&grid),
        Some(&pose_at(1.0, 1.0)),
    );

    let entities: Vec<_> = list.layer(DrawLayer::Entity).collect();
    assert!(matches!(entities[0].entity, EntityRef::Furniture { .. }));
    assert!(matches!(entities[1].entity, EntityRef::Avatar { .. }));
}

#[test]
fn entries_unknown_to_the_catalog_are_skipped() {
    let mut grid = room(2, 2);
    let cell = TileCoord::new(1, 0);
    assert!(grid.set_furniture(cell, FurnitureId::new("furni-table"), Rotation::default()));
    assert!(grid.set_floor(cell, FloorId::new("floor-slate")));
    assert!(grid.toggle_wall(cell, WallOrientation::West, WallId::new("wall-west")));
    let walls_only = Catalog::new(
        Vec::new(),
        query::catalog(&grid).walls().to_vec(),
        Vec::new(),
    )
    .expect("catalog");

    let list = DepthSorter::new().sort(&transform(), query::tile_view(&grid), &walls_only, None);

    assert_eq!(list.layer(DrawLayer::Entity).count(), 0);
    assert_eq!(list.layer(DrawLayer::Wall).count(), 1);
    assert_eq!(list.layer(DrawLayer::Floor).count(), 4);
    assert!(list
        .layer(DrawLayer::Floor)
        .all(|entry| matches!(entry.entity, EntityRef::Floor { floor: None, .. })));
}

#[test]
fn screen_anchor_matches_the_tile_apex() {
    let grid = room(2, 2);
    let transform = transform();

    let list = DepthSorter::new().sort(
        &transform,
        query::tile_view(&grid),
        query::catalog(&grid),
        None,
    );

    for entry in list.iter() {
        assert_eq!(entry.screen, transform.grid_to_screen(entry.grid));
    }
}
