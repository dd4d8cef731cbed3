//! Palette catalog describing the floors, walls and furniture available to the editor.
//!
//! The catalog is constructed explicitly and handed to the components that
//! need it. Tiles only store identifiers; resolving them into definitions is a
//! lookup that may fail, in which case the id is treated as absent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FloorId, FurnitureId, Tile, WallId, WallOrientation};

const DEFAULT_FURNITURE_HEIGHT: f64 = 24.0;

/// Floor finish that can be painted onto tiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorDefinition {
    /// Identifier referenced by tiles.
    pub id: FloorId,
    /// Human readable name.
    #[serde(default)]
    pub label: String,
}

/// Wall finish that can be toggled along tile edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallDefinition {
    /// Identifier referenced by tiles.
    pub id: WallId,
    /// Human readable name.
    #[serde(default)]
    pub label: String,
    /// Edge the wall is placed along by default.
    pub orientation: WallOrientation,
}

/// Furniture piece that can occupy a tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FurnitureDefinition {
    /// Identifier referenced by tiles.
    pub id: FurnitureId,
    /// Human readable name.
    #[serde(default)]
    pub label: String,
    /// Archetype selecting the draw routine.
    #[serde(default)]
    pub shape: FurnitureShape,
    /// Extrusion height in pixels at zoom 1.
    #[serde(default = "default_furniture_height")]
    pub height: f64,
}

fn default_furniture_height() -> f64 {
    DEFAULT_FURNITURE_HEIGHT
}

/// Furniture archetypes understood by renderers.
///
/// Unknown shape keys resolve to [`FurnitureShape::Block`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FurnitureShape {
    /// Rounded loveseat.
    RetroSofa,
    /// Low tapered table.
    LofiTable,
    /// Tall glowing column.
    NeonLamp,
    /// Potted palm.
    PalmPlant,
    /// Generic block with an orientation cue.
    #[default]
    Block,
}

impl FurnitureShape {
    /// Resolves a shape key, falling back to [`FurnitureShape::Block`].
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key {
            "retro-sofa" => Self::RetroSofa,
            "lofi-table" => Self::LofiTable,
            "neon-lamp" => Self::NeonLamp,
            "palm-plant" => Self::PalmPlant,
            _ => Self::Block,
        }
    }

    /// Canonical key of the shape.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RetroSofa => "retro-sofa",
            Self::LofiTable => "lofi-table",
            Self::NeonLamp => "neon-lamp",
            Self::PalmPlant => "palm-plant",
            Self::Block => "block",
        }
    }
}

impl From<String> for FurnitureShape {
    fn from(value: String) -> Self {
        Self::from_key(&value)
    }
}

impl From<FurnitureShape> for String {
    fn from(value: FurnitureShape) -> Self {
        value.key().to_owned()
    }
}

/// Catalog entry adopted by the eyedropper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaletteSample {
    /// A floor finish.
    Floor(FloorId),
    /// A wall finish together with the edge it was sampled from.
    Wall {
        /// Sampled wall.
        id: WallId,
        /// Edge the wall should be placed along.
        orientation: WallOrientation,
    },
    /// A furniture piece.
    Furniture(FurnitureId),
}

/// Errors raised while assembling a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Identifiers must not be empty.
    #[error("{category} entry has an empty id")]
    EmptyId {
        /// Category containing the offending entry.
        category: &'static str,
    },
    /// Identifiers must be unique within their category.
    #[error("{category} id `{id}` is defined more than once")]
    DuplicateId {
        /// Category containing the duplicate.
        category: &'static str,
        /// Offending identifier.
        id: String,
    },
}

/// Explicitly constructed palette of floor, wall and furniture definitions.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    floors: Vec<FloorDefinition>,
    walls: Vec<WallDefinition>,
    furniture: Vec<FurnitureDefinition>,
}

impl Catalog {
    /// Assembles a catalog, rejecting empty or duplicate identifiers.
    pub fn new(
        floors: Vec<FloorDefinition>,
        walls: Vec<WallDefinition>,
        furniture: Vec<FurnitureDefinition>,
    ) -> Result<Self, CatalogError> {
        ensure_unique("floor", floors.iter().map(|entry| entry.id.as_str()))?;
        ensure_unique("wall", walls.iter().map(|entry| entry.id.as_str()))?;
        ensure_unique("furniture", furniture.iter().map(|entry| entry.id.as_str()))?;

        Ok(Self {
            floors,
            walls,
            furniture,
        })
    }

    /// Built-in palette used when no catalog is configured.
    #[must_use]
    pub fn starter() -> Self {
        let floor = |id: &str, label: &str| FloorDefinition {
            id: FloorId::new(id),
            label: label.to_owned(),
        };
        let wall = |id: &str, label: &str, orientation| WallDefinition {
            id: WallId::new(id),
            label: label.to_owned(),
            orientation,
        };
        let furniture = |id: &str, label: &str, shape, height| FurnitureDefinition {
            id: FurnitureId::new(id),
            label: label.to_owned(),
            shape,
            height,
        };

        Self {
            floors: vec![
                floor("floor-wood", "Warm Wood"),
                floor("floor-slate", "Slate Stone"),
                floor("floor-emerald", "Emerald Carpet"),
                floor("floor-sunset", "Sunset Tile"),
            ],
            walls: vec![
                wall("wall-north", "North Wall", WallOrientation::North),
                wall("wall-west", "West Wall", WallOrientation::West),
            ],
            furniture: vec![
                furniture("furni-sofa", "Retro Sofa", FurnitureShape::RetroSofa, 26.0),
                furniture("furni-table", "Low Table", FurnitureShape::LofiTable, 16.0),
                furniture("furni-plant", "Potted Plant", FurnitureShape::PalmPlant, 42.0),
                furniture("furni-lamp", "Neon Lamp", FurnitureShape::NeonLamp, 72.0),
            ],
        }
    }

    /// Floor definitions in catalog order.
    #[must_use]
    pub fn floors(&self) -> &[FloorDefinition] {
        &self.floors
    }

    /// Wall definitions in catalog order.
    #[must_use]
    pub fn walls(&self) -> &[WallDefinition] {
        &self.walls
    }

    /// Furniture definitions in catalog order.
    #[must_use]
    pub fn furniture(&self) -> &[FurnitureDefinition] {
        &self.furniture
    }

    /// Looks up a floor definition.
    #[must_use]
    pub fn floor(&self, id: &FloorId) -> Option<&FloorDefinition> {
        self.floors.iter().find(|entry| &entry.id == id)
    }

    /// Looks up a wall definition.
    #[must_use]
    pub fn wall(&self, id: &WallId) -> Option<&WallDefinition> {
        self.walls.iter().find(|entry| &entry.id == id)
    }

    /// Looks up a furniture definition.
    #[must_use]
    pub fn furniture_definition(&self, id: &FurnitureId) -> Option<&FurnitureDefinition> {
        self.furniture.iter().find(|entry| &entry.id == id)
    }

    /// First wall whose default edge matches the orientation.
    #[must_use]
    pub fn first_wall_for(&self, orientation: WallOrientation) -> Option<&WallDefinition> {
        self.walls
            .iter()
            .find(|entry| entry.orientation == orientation)
    }

    /// Resolves the entry an eyedropper adopts from a tile.
    ///
    /// Furniture wins over floors, floors over the north wall, and the north
    /// wall over the west wall. Ids missing from the catalog are skipped.
    #[must_use]
    pub fn sample_tile(&self, tile: &Tile) -> Option<PaletteSample> {
        if let Some(placement) = &tile.furniture {
            if self.furniture_definition(&placement.id).is_some() {
                return Some(PaletteSample::Furniture(placement.id.clone()));
            }
        }

        if let Some(floor) = tile.floor.as_ref().filter(|id| self.floor(id).is_some()) {
            return Some(PaletteSample::Floor(floor.clone()));
        }

        [WallOrientation::North, WallOrientation::West]
            .into_iter()
            .find_map(|edge| {
                let id = tile.wall(edge)?;
                let definition = self.wall(id)?;
                Some(PaletteSample::Wall {
                    id: id.clone(),
                    orientation: definition.orientation,
                })
            })
    }
}

fn ensure_unique<'a>(
    category: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(CatalogError::EmptyId { category });
        }
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                category,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}
