#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure editing system that turns picked pointer input into room edit commands.
//!
//! A primary press starts a stroke and applies the active tool to the picked
//! tile. Dragging re-applies the tool only when the picked tile changes, so a
//! wall toggle never flickers while the pointer rests on one tile. A
//! secondary press removes furniture instead.

use room_builder_core::{
    EditCommand, FloorId, FurnitureId, PaletteSample, Rotation, TileCoord, WallId, WallOrientation,
};
use tracing::debug;

/// Active editing tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Paints a floor finish.
    Floor(FloorId),
    /// Toggles a wall segment along one edge.
    Wall {
        /// Wall finish to toggle.
        wall: WallId,
        /// Edge the wall runs along.
        orientation: WallOrientation,
    },
    /// Places a furniture piece using the selected rotation.
    Furniture(FurnitureId),
    /// Clears every slot of a tile.
    Erase,
    /// Adopts the palette entry found on a tile.
    Eyedropper,
}

impl From<PaletteSample> for Tool {
    fn from(sample: PaletteSample) -> Self {
        match sample {
            PaletteSample::Floor(floor) => Self::Floor(floor),
            PaletteSample::Wall { id, orientation } => Self::Wall {
                wall: id,
                orientation,
            },
            PaletteSample::Furniture(furniture) => Self::Furniture(furniture),
        }
    }
}

/// Pointer button that triggered a press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Applies the active tool.
    Primary,
    /// Removes furniture.
    Secondary,
}

/// Pointer input already resolved to tiles by the picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    /// A button went down over the tile, if any.
    Pressed {
        /// Tile under the pointer.
        cell: Option<TileCoord>,
        /// Button that was pressed.
        button: PointerButton,
    },
    /// The pointer moved over the tile, if any.
    Moved {
        /// Tile under the pointer.
        cell: Option<TileCoord>,
    },
    /// The pressed button was released.
    Released,
    /// The pointer left the viewport.
    Left,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Stroke {
    button: PointerButton,
    last_cell: Option<TileCoord>,
}

/// Editing system tracking the active tool, the selected rotation and the current stroke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Editor {
    tool: Tool,
    rotation: Rotation,
    stroke: Option<Stroke>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Tool::Erase)
    }
}

impl Editor {
    /// Creates an editor with the provided active tool.
    #[must_use]
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            rotation: Rotation::default(),
            stroke: None,
        }
    }

    /// Active tool.
    #[must_use]
    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Replaces the active tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Rotation applied to newly placed furniture.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Cycles the selected furniture rotation by `step` quarter turns.
    pub fn rotate_selection(&mut self, step: i32) -> Rotation {
        self.rotation = self.rotation.rotated(step);
        self.rotation
    }

    /// Reports whether a stroke is in progress.
    #[must_use]
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Consumes a pointer event and emits the resulting edit commands.
    ///
    /// The `sample_at` closure should mirror the semantics of the catalog's
    /// tile sampling so the eyedropper can adopt the entry under the pointer.
    pub fn handle<F>(&mut self, event: PointerEvent, mut sample_at: F, out: &mut Vec<EditCommand>)
    where
        F: FnMut(TileCoord) -> Option<PaletteSample>,
    {
        match event {
            PointerEvent::Pressed { cell, button } => {
                self.stroke = Some(Stroke {
                    button,
                    last_cell: cell,
                });
                if let Some(cell) = cell {
                    self.apply(button, cell, &mut sample_at, out);
                }
            }
            PointerEvent::Moved { cell } => {
                let Some(stroke) = self.stroke.as_mut() else {
                    return;
                };
                let Some(cell) = cell else {
                    return;
                };
                if stroke.last_cell == Some(cell) {
                    return;
                }

                stroke.last_cell = Some(cell);
                let button = stroke.button;
                self.apply(button, cell, &mut sample_at, out);
            }
            PointerEvent::Released | PointerEvent::Left => {
                self.stroke = None;
            }
        }
    }

    fn apply<F>(
        &mut self,
        button: PointerButton,
        cell: TileCoord,
        sample_at: &mut F,
        out: &mut Vec<EditCommand>,
    ) where
        F: FnMut(TileCoord) -> Option<PaletteSample>,
    {
        if button == PointerButton::Secondary {
            out.push(EditCommand::ClearFurniture { cell });
            return;
        }

        if self.tool == Tool::Eyedropper {
            if let Some(sample) = sample_at(cell) {
                debug!(%cell, ?sample, "eyedropper adopted palette entry");
                self.tool = Tool::from(sample);
            }
            return;
        }

        match &self.tool {
            Tool::Floor(floor) => out.push(EditCommand::SetFloor {
                cell,
                floor: floor.clone(),
            }),
            Tool::Wall { wall, orientation } => out.push(EditCommand::ToggleWall {
                cell,
                orientation: *orientation,
                wall: wall.clone(),
            }),
            Tool::Furniture(furniture) => out.push(EditCommand::SetFurniture {
                cell,
                furniture: furniture.clone(),
                rotation: self.rotation,
            }),
            Tool::Erase => out.push(EditCommand::ClearTile { cell }),
            Tool::Eyedropper => {}
        }
    }
}
