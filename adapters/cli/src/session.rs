//! Headless room session wiring pointer input through the engine.
//!
//! Pointer positions are resolved by the picker and then either handed to the
//! editor, whose commands mutate the room, or turned into avatar move
//! requests, depending on the active [`Mode`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use glam::DVec2;
use room_builder_core::{AvatarPose, Camera, EditCommand, GridTransform, TileCoord, TileMetrics};
use room_builder_system_depth_sort::{DepthSorter, DrawList};
use room_builder_system_editor::{Editor, PointerButton, PointerEvent, Tool};
use room_builder_system_movement::AvatarMotion;
use room_builder_system_picking::Picker;
use room_builder_world::{self as world, query, RoomGrid};
use tracing::debug;

use crate::config::EngineConfig;

/// What primary clicks do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Clicks apply the active editing tool.
    #[default]
    Edit,
    /// Clicks send the avatar walking.
    Walk,
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Tile under the pointer.
    pub hover: Option<TileCoord>,
    /// Avatar render state.
    pub pose: AvatarPose,
    /// Ordered draw entries.
    pub draw_list: DrawList,
    /// Transform the screen positions were computed with.
    pub transform: GridTransform,
}

/// Room, camera, editor and avatar driven by pointer input and ticks.
#[derive(Debug)]
pub struct RoomSession {
    grid: RoomGrid,
    camera: Camera,
    metrics: TileMetrics,
    picker: Picker,
    editor: Editor,
    avatar: AvatarMotion,
    sorter: DepthSorter,
    mode: Mode,
    hover: Option<TileCoord>,
    dirty: Arc<AtomicBool>,
}

impl RoomSession {
    /// Builds a session with an empty room and the avatar standing at its centre.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let size = config.grid_size()?;
        let mut grid = RoomGrid::new(size, config.catalog()?);
        let dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&dirty);
        let _ = grid.subscribe(move |_| flag.store(true, Ordering::Relaxed));

        let avatar = AvatarMotion::new(config.motion()?, query::tile_view(&grid), size.center())
            .context("failed to place the avatar")?;

        Ok(Self {
            grid,
            camera: config.camera()?,
            metrics: config.tile_metrics()?,
            picker: Picker::new(),
            editor: Editor::default(),
            avatar,
            sorter: DepthSorter::new(),
            mode: Mode::default(),
            hover: None,
            dirty,
        })
    }

    /// Room being edited.
    #[must_use]
    pub fn grid(&self) -> &RoomGrid {
        &self.grid
    }

    /// Avatar state machine.
    #[must_use]
    pub fn avatar(&self) -> &AvatarMotion {
        &self.avatar
    }

    /// Camera applied to the projection.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera for pan and zoom controls.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Active input mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches the input mode, ending any stroke in progress.
    pub fn set_mode(&mut self, mode: Mode) {
        self.editor
            .handle(PointerEvent::Released, |_| None, &mut Vec::new());
        self.mode = mode;
    }

    /// Active editing tool.
    #[must_use]
    pub fn tool(&self) -> &Tool {
        self.editor.tool()
    }

    /// Selects the editing tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.editor.set_tool(tool);
    }

    /// Cycles the rotation applied to newly placed furniture.
    pub fn rotate_selection(&mut self, step: i32) {
        let rotation = self.editor.rotate_selection(step);
        debug!(rotation = rotation.quarter_turns(), "selection rotated");
    }

    /// Projection for the current pan and zoom.
    #[must_use]
    pub fn transform(&self) -> GridTransform {
        self.camera.transform(self.metrics)
    }

    /// Tile under the screen point.
    #[must_use]
    pub fn pick(&self, point: DVec2) -> Option<TileCoord> {
        self.picker
            .pick(&self.transform(), query::size(&self.grid), point)
    }

    /// Zooms around the screen point.
    pub fn zoom_at(&mut self, factor: f64, point: DVec2) {
        self.camera.zoom_at(factor, point, self.metrics);
    }

    /// Handles a button press at the screen point.
    ///
    /// Returns whether the press changed the room or redirected the avatar.
    pub fn pointer_pressed(&mut self, point: DVec2, button: PointerButton) -> bool {
        let cell = self.pick(point);
        self.hover = cell;

        match (self.mode, button) {
            (Mode::Walk, PointerButton::Primary) => cell
                .is_some_and(|cell| self.avatar.set_target(query::tile_view(&self.grid), cell)),
            _ => self.forward_to_editor(PointerEvent::Pressed { cell, button }) > 0,
        }
    }

    /// Handles pointer motion, continuing any stroke in progress.
    pub fn pointer_moved(&mut self, point: DVec2) -> bool {
        let cell = self.pick(point);
        self.hover = cell;
        self.forward_to_editor(PointerEvent::Moved { cell }) > 0
    }

    /// Ends the stroke in progress.
    pub fn pointer_released(&mut self) {
        let _ = self.forward_to_editor(PointerEvent::Released);
    }

    /// Clears the hover state when the pointer leaves the viewport.
    pub fn pointer_left(&mut self) {
        self.hover = None;
        let _ = self.forward_to_editor(PointerEvent::Left);
    }

    /// Applies an edit command directly.
    pub fn edit(&mut self, command: EditCommand) -> bool {
        self.apply_edit(command)
    }

    /// Advances the avatar by one frame.
    pub fn tick(&mut self, delta_seconds: f64) {
        self.avatar.update(delta_seconds);
    }

    /// Reports whether the room changed since the last call, clearing the flag.
    pub fn take_room_changed(&mut self) -> bool {
        self.dirty.swap(false, Ordering::Relaxed)
    }

    /// Captures the frame the renderer should draw.
    #[must_use]
    pub fn frame(&self) -> Frame {
        let transform = self.transform();
        let pose = self.avatar.pose();
        let draw_list = self.sorter.sort(
            &transform,
            query::tile_view(&self.grid),
            query::catalog(&self.grid),
            Some(&pose),
        );

        Frame {
            hover: self.hover,
            pose,
            draw_list,
            transform,
        }
    }

    fn forward_to_editor(&mut self, event: PointerEvent) -> usize {
        if self.mode != Mode::Edit {
            return 0;
        }

        let mut commands = Vec::new();
        let grid = &self.grid;
        self.editor.handle(
            event,
            |cell| query::tile(grid, cell).and_then(|tile| query::catalog(grid).sample_tile(tile)),
            &mut commands,
        );

        let mut applied = 0;
        for command in commands {
            if self.apply_edit(command) {
                applied += 1;
            }
        }
        applied
    }

    fn apply_edit(&mut self, command: EditCommand) -> bool {
        if !world::apply(&mut self.grid, command) {
            return false;
        }
        if self.avatar.settle(query::tile_view(&self.grid)) {
            debug!(position = ?self.avatar.position(), "avatar moved off new furniture");
        }
        true
    }
}
