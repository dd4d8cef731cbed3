//! TOML configuration for the headless room session.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use glam::DVec2;
use room_builder_core::{
    Camera, Catalog, FloorDefinition, FurnitureDefinition, GridSize, TileMetrics, WallDefinition,
};
use room_builder_system_movement::{
    MotionConfig, DEFAULT_MAX_TICK_SECONDS, DEFAULT_SPEED_TILES_PER_SECOND,
};
use serde::Deserialize;

/// Complete engine configuration. Missing sections fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Room dimensions.
    pub grid: GridConfig,
    /// Tile size and screen origin.
    pub projection: ProjectionConfig,
    /// Zoom limits.
    pub camera: CameraConfig,
    /// Avatar motion parameters.
    pub avatar: AvatarConfig,
    /// Palette entries; the built-in starter catalog is used when absent.
    pub catalog: Option<CatalogConfig>,
}

/// `[grid]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 12,
            height: 10,
        }
    }
}

/// `[projection]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionConfig {
    /// Full diamond width in pixels at zoom 1.
    pub tile_width: f64,
    /// Full diamond height in pixels at zoom 1.
    pub tile_height: f64,
    /// Horizontal screen position of tile `(0, 0)`.
    pub origin_x: f64,
    /// Vertical screen position of tile `(0, 0)`.
    pub origin_y: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            tile_width: 64.0,
            tile_height: 32.0,
            origin_x: 400.0,
            origin_y: 120.0,
        }
    }
}

/// `[camera]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Smallest allowed zoom.
    pub min_zoom: f64,
    /// Largest allowed zoom.
    pub max_zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 2.5,
        }
    }
}

/// `[avatar]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvatarConfig {
    /// Walking speed in tiles per second.
    pub speed_tiles_per_second: f64,
    /// Largest delta applied by a single tick.
    pub max_tick_seconds: f64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            speed_tiles_per_second: DEFAULT_SPEED_TILES_PER_SECOND,
            max_tick_seconds: DEFAULT_MAX_TICK_SECONDS,
        }
    }
}

/// `[catalog]` section.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Floor definitions.
    pub floors: Vec<FloorDefinition>,
    /// Wall definitions.
    pub walls: Vec<WallDefinition>,
    /// Furniture definitions.
    pub furniture: Vec<FurnitureDefinition>,
}

impl EngineConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid config at {}", path.display()))
    }

    /// Parses configuration from TOML text and validates every section.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse config toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every section describes a usable engine.
    pub fn validate(&self) -> Result<()> {
        let _ = self.grid_size()?;
        let _ = self.tile_metrics()?;
        let _ = self.camera()?;
        let _ = self.motion()?;
        let _ = self.catalog()?;
        Ok(())
    }

    /// Room dimensions.
    pub fn grid_size(&self) -> Result<GridSize> {
        GridSize::new(self.grid.width, self.grid.height).context("invalid [grid] section")
    }

    /// Unscaled tile dimensions.
    pub fn tile_metrics(&self) -> Result<TileMetrics> {
        TileMetrics::new(self.projection.tile_width, self.projection.tile_height)
            .context("invalid [projection] section")
    }

    /// Camera anchored at the configured origin.
    pub fn camera(&self) -> Result<Camera> {
        let origin = DVec2::new(self.projection.origin_x, self.projection.origin_y);
        Camera::new(origin, self.camera.min_zoom, self.camera.max_zoom)
            .context("invalid [camera] section")
    }

    /// Avatar motion parameters.
    pub fn motion(&self) -> Result<MotionConfig> {
        let AvatarConfig {
            speed_tiles_per_second,
            max_tick_seconds,
        } = self.avatar;
        if !(speed_tiles_per_second.is_finite() && speed_tiles_per_second > 0.0) {
            bail!("invalid [avatar] section: speed must be positive, got {speed_tiles_per_second}");
        }
        if !(max_tick_seconds.is_finite() && max_tick_seconds > 0.0) {
            bail!("invalid [avatar] section: max tick must be positive, got {max_tick_seconds}");
        }

        Ok(MotionConfig {
            speed_tiles_per_second,
            max_tick_seconds,
        })
    }

    /// Palette used by the room.
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(entries) => Catalog::new(
                entries.floors.clone(),
                entries.walls.clone(),
                entries.furniture.clone(),
            )
            .context("invalid [catalog] section"),
            None => Ok(Catalog::starter()),
        }
    }
}
