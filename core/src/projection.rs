//! Isometric projection between tile space and screen space.
//!
//! Tiles project to diamonds whose full width and height are given by
//! [`TileMetrics`]. Increasing `x` runs down-right on screen, increasing `y`
//! runs down-left, and the origin marks the top vertex of tile `(0, 0)`.

use glam::DVec2;
use thiserror::Error;

use crate::TileCoord;

/// Errors raised when describing the projection or the camera.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ProjectionError {
    /// Tile dimensions must be positive and finite.
    #[error("tile dimensions must be positive and finite (received {width}x{height})")]
    InvalidTileSize {
        /// Requested diamond width.
        width: f64,
        /// Requested diamond height.
        height: f64,
    },
    /// Zoom limits must be positive, finite and ordered.
    #[error("zoom limits must satisfy 0 < min <= max (received {min}..={max})")]
    InvalidZoomRange {
        /// Requested minimum zoom.
        min: f64,
        /// Requested maximum zoom.
        max: f64,
    },
    /// The camera anchor must be a finite screen point.
    #[error("origin must be finite (received {x}, {y})")]
    InvalidOrigin {
        /// Requested horizontal coordinate.
        x: f64,
        /// Requested vertical coordinate.
        y: f64,
    },
}

/// Unscaled pixel dimensions of a tile diamond.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileMetrics {
    width: f64,
    height: f64,
}

impl TileMetrics {
    /// Creates tile metrics, rejecting non-positive or non-finite sizes.
    pub fn new(width: f64, height: f64) -> Result<Self, ProjectionError> {
        if !(is_positive(width) && is_positive(height)) {
            return Err(ProjectionError::InvalidTileSize { width, height });
        }

        Ok(Self { width, height })
    }

    /// Full width of the diamond in pixels.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Full height of the diamond in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    fn scaled(self, zoom: f64) -> Self {
        Self {
            width: self.width * zoom,
            height: self.height * zoom,
        }
    }
}

/// Pure grid <-> screen conversion for a fixed tile size and origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTransform {
    half_width: f64,
    half_height: f64,
    origin: DVec2,
}

impl GridTransform {
    /// Creates a transform for the provided tile size and screen origin.
    pub fn new(metrics: TileMetrics, origin: DVec2) -> Result<Self, ProjectionError> {
        if !origin.is_finite() {
            return Err(ProjectionError::InvalidOrigin {
                x: origin.x,
                y: origin.y,
            });
        }

        Ok(Self::from_parts(metrics, origin))
    }

    fn from_parts(metrics: TileMetrics, origin: DVec2) -> Self {
        Self {
            half_width: metrics.width * 0.5,
            half_height: metrics.height * 0.5,
            origin,
        }
    }

    /// Screen position of the top vertex of tile `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> DVec2 {
        self.origin
    }

    /// Full diamond width in pixels.
    #[must_use]
    pub fn tile_width(&self) -> f64 {
        self.half_width * 2.0
    }

    /// Full diamond height in pixels.
    #[must_use]
    pub fn tile_height(&self) -> f64 {
        self.half_height * 2.0
    }

    /// Projects a (possibly fractional) grid position onto the screen.
    #[must_use]
    pub fn grid_to_screen(&self, grid: DVec2) -> DVec2 {
        DVec2::new(
            (grid.x - grid.y) * self.half_width + self.origin.x,
            (grid.x + grid.y) * self.half_height + self.origin.y,
        )
    }

    /// Inverts the projection, yielding a fractional grid position.
    #[must_use]
    pub fn screen_to_grid(&self, screen: DVec2) -> DVec2 {
        let dx = (screen.x - self.origin.x) / self.half_width;
        let dy = (screen.y - self.origin.y) / self.half_height;
        DVec2::new((dy + dx) * 0.5, (dy - dx) * 0.5)
    }

    /// Screen position of a tile's top vertex.
    #[must_use]
    pub fn tile_to_screen(&self, cell: TileCoord) -> DVec2 {
        self.grid_to_screen(cell.to_point())
    }

    /// Corners of the tile's diamond ordered top, right, bottom, left.
    #[must_use]
    pub fn tile_diamond(&self, cell: TileCoord) -> [DVec2; 4] {
        let top = cell.to_point();
        [
            self.grid_to_screen(top),
            self.grid_to_screen(top + DVec2::X),
            self.grid_to_screen(top + DVec2::ONE),
            self.grid_to_screen(top + DVec2::Y),
        ]
    }
}

/// Pan and zoom state applied on top of a fixed screen anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    anchor: DVec2,
    pan: DVec2,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Camera {
    /// Creates a camera at zoom 1 (clamped into range) with no pan.
    pub fn new(anchor: DVec2, min_zoom: f64, max_zoom: f64) -> Result<Self, ProjectionError> {
        if !anchor.is_finite() {
            return Err(ProjectionError::InvalidOrigin {
                x: anchor.x,
                y: anchor.y,
            });
        }
        if !(is_positive(min_zoom) && is_positive(max_zoom) && min_zoom <= max_zoom) {
            return Err(ProjectionError::InvalidZoomRange {
                min: min_zoom,
                max: max_zoom,
            });
        }

        Ok(Self {
            anchor,
            pan: DVec2::ZERO,
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        })
    }

    /// Current zoom factor.
    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current pan offset in pixels.
    #[must_use]
    pub const fn pan(&self) -> DVec2 {
        self.pan
    }

    /// Screen position of the top vertex of tile `(0, 0)`.
    #[must_use]
    pub fn origin(&self) -> DVec2 {
        self.anchor + self.pan
    }

    /// Shifts the view by the provided pixel delta. Non-finite deltas are ignored.
    pub fn pan_by(&mut self, delta: DVec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    /// Replaces the pan offset. Non-finite offsets are ignored.
    pub fn set_pan(&mut self, pan: DVec2) {
        if pan.is_finite() {
            self.pan = pan;
        }
    }

    /// Sets the zoom, clamped to the configured range. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Multiplies the zoom while keeping the grid point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, factor: f64, anchor: DVec2, metrics: TileMetrics) {
        if !is_positive(factor) || !anchor.is_finite() {
            return;
        }

        let grid_point = self.transform(metrics).screen_to_grid(anchor);
        self.set_zoom(self.zoom * factor);
        let drifted = self.transform(metrics).grid_to_screen(grid_point);
        self.pan += anchor - drifted;
    }

    /// Transform matching the current pan and zoom.
    #[must_use]
    pub fn transform(&self, metrics: TileMetrics) -> GridTransform {
        GridTransform::from_parts(metrics.scaled(self.zoom), self.origin())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
