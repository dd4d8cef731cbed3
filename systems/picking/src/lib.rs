#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Maps screen-space pointer positions onto room tiles.
//!
//! Picking inverts the projection, floors the fractional coordinate to a
//! candidate tile and then confirms the hit with an exact containment test
//! against the candidate's diamond.

use glam::DVec2;
use room_builder_core::{Catalog, GridSize, GridTransform, PaletteSample, TileCoord, TileView};
use tracing::trace;

/// Tolerance, in squared pixels, of the diamond containment test.
pub const DEFAULT_CONTAINMENT_EPSILON: f64 = 0.5;

/// Fractional coordinates closer than this to an integer are treated as that integer.
const VERTEX_SNAP: f64 = 1e-9;

/// Screen-to-tile hit tester.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Picker {
    containment_epsilon: f64,
}

impl Default for Picker {
    fn default() -> Self {
        Self {
            containment_epsilon: DEFAULT_CONTAINMENT_EPSILON,
        }
    }
}

impl Picker {
    /// Creates a picker using the default containment tolerance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a picker with a custom containment tolerance in squared pixels.
    #[must_use]
    pub fn with_containment_epsilon(containment_epsilon: f64) -> Self {
        Self {
            containment_epsilon: containment_epsilon.abs(),
        }
    }

    /// Tolerance applied by the containment test.
    #[must_use]
    pub const fn containment_epsilon(&self) -> f64 {
        self.containment_epsilon
    }

    /// Resolves the tile under the screen point.
    ///
    /// Returns `None` when the point is not finite, when the candidate tile
    /// lies outside the grid, or when the point falls outside the candidate's
    /// diamond.
    #[must_use]
    pub fn pick(
        &self,
        transform: &GridTransform,
        size: GridSize,
        point: DVec2,
    ) -> Option<TileCoord> {
        if !point.is_finite() {
            return None;
        }

        let grid = transform.screen_to_grid(point);
        let candidate = (candidate_index(grid.x), candidate_index(grid.y));
        if !size.contains_signed(candidate.0, candidate.1) {
            trace!(?point, ?grid, "pointer outside the room");
            return None;
        }

        let cell = TileCoord::from_signed(candidate.0, candidate.1)?;
        let diamond = transform.tile_diamond(cell);
        if !point_in_diamond(point, &diamond, self.containment_epsilon) {
            trace!(?point, %cell, "pointer outside the candidate diamond");
            return None;
        }

        trace!(?point, %cell, "picked tile");
        Some(cell)
    }

    /// Resolves the palette entry an eyedropper adopts from the tile under the point.
    #[must_use]
    pub fn sample(
        &self,
        transform: &GridTransform,
        view: TileView<'_>,
        catalog: &Catalog,
        point: DVec2,
    ) -> Option<PaletteSample> {
        let cell = self.pick(transform, view.size(), point)?;
        catalog.sample_tile(view.tile(cell)?)
    }
}

/// Reports whether the point lies inside the diamond given as top, right,
/// bottom and left corners.
///
/// The four triangles formed by the point and each diamond edge must add up
/// to the diamond's own area within `epsilon`.
#[must_use]
pub fn point_in_diamond(point: DVec2, diamond: &[DVec2; 4], epsilon: f64) -> bool {
    let [top, right, bottom, left] = *diamond;
    let area = triangle_area(top, right, bottom) + triangle_area(top, bottom, left);
    let covered = triangle_area(point, top, right)
        + triangle_area(point, right, bottom)
        + triangle_area(point, bottom, left)
        + triangle_area(point, left, top);

    (covered - area).abs() <= epsilon
}

fn triangle_area(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    ((b - a).perp_dot(c - a) * 0.5).abs()
}

fn candidate_index(value: f64) -> i64 {
    let nearest = value.round();
    let snapped = if (value - nearest).abs() <= VERTEX_SNAP {
        nearest
    } else {
        value.floor()
    };
    snapped as i64
}
