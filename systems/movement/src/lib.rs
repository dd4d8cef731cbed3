#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Continuous avatar motion along planned tile routes.
//!
//! [`AvatarMotion`] owns the avatar's kinematic state. A move request plans a
//! route with the [`Pathfinder`], and each [`AvatarMotion::update`] call
//! interpolates the position along the active segment before popping the
//! next waypoint. Presentation values (walk cycle, bob, sway) are derived from
//! the same clock but never influence the position.

use std::{collections::VecDeque, f64::consts::TAU};

use glam::DVec2;
use room_builder_core::{AvatarPose, Facing, TileCoord, TileView, POSITION_EPSILON};
use room_builder_system_pathfinding::Pathfinder;
use thiserror::Error;
use tracing::{debug, trace};

/// Default walking speed measured in tiles per second.
pub const DEFAULT_SPEED_TILES_PER_SECOND: f64 = 3.2;
/// Default upper bound applied to a single tick.
pub const DEFAULT_MAX_TICK_SECONDS: f64 = 0.1;

const WALK_CYCLE_PER_TILE: f64 = 0.45;
const IDLE_CYCLE_RATE: f64 = 0.55;
const STRIDE_BLEND_MOVING: f64 = 6.0;
const STRIDE_BLEND_IDLE: f64 = 4.5;
const WALK_BOB: f64 = 4.0;
const WALK_SWAY: f64 = 3.2;
const IDLE_BOB: f64 = 1.2;
const IDLE_BOB_RATE: f64 = 0.35;
const IDLE_SWAY: f64 = 1.4;
const IDLE_SWAY_RATE: f64 = 0.5;
const WALK_LEAN: f64 = 9.0;

/// Errors raised when configuring avatar motion.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum MotionError {
    /// Walking speed must be positive and finite.
    #[error("speed must be positive and finite (received {0})")]
    InvalidSpeed(f64),
    /// Tick clamp must be positive and finite.
    #[error("maximum tick must be positive and finite (received {0})")]
    InvalidMaxTick(f64),
    /// The spawn tile lies outside the room.
    #[error("spawn tile {0} lies outside the room")]
    SpawnOutsideRoom(TileCoord),
}

/// Tunable motion parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Walking speed measured in tiles per second.
    pub speed_tiles_per_second: f64,
    /// Largest delta applied by a single update; longer ticks are clamped.
    pub max_tick_seconds: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_tiles_per_second: DEFAULT_SPEED_TILES_PER_SECOND,
            max_tick_seconds: DEFAULT_MAX_TICK_SECONDS,
        }
    }
}

impl MotionConfig {
    fn validate(self) -> Result<Self, MotionError> {
        if !(self.speed_tiles_per_second.is_finite() && self.speed_tiles_per_second > 0.0) {
            return Err(MotionError::InvalidSpeed(self.speed_tiles_per_second));
        }
        if !(self.max_tick_seconds.is_finite() && self.max_tick_seconds > 0.0) {
            return Err(MotionError::InvalidMaxTick(self.max_tick_seconds));
        }
        Ok(self)
    }
}

/// Continuous interpolation between two waypoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    from: DVec2,
    to: DVec2,
    progress: f64,
}

impl Segment {
    fn new(from: DVec2, to: DVec2) -> Self {
        Self {
            from,
            to,
            progress: 0.0,
        }
    }

    /// Position the segment started from.
    #[must_use]
    pub const fn from(&self) -> DVec2 {
        self.from
    }

    /// Waypoint the segment ends at.
    #[must_use]
    pub const fn to(&self) -> DVec2 {
        self.to
    }

    /// Completed fraction of the segment in `[0, 1]`.
    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Euclidean length of the segment in tile units.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.from.distance(self.to)
    }

    fn position(&self) -> DVec2 {
        self.from.lerp(self.to, self.progress)
    }
}

/// Avatar kinematic state machine.
///
/// The avatar is idle when it has neither an active segment nor queued
/// waypoints. A new move request replaces the queue and starts from the
/// current continuous position.
#[derive(Clone, Debug)]
pub struct AvatarMotion {
    config: MotionConfig,
    position: DVec2,
    facing: Facing,
    segment: Option<Segment>,
    waypoints: VecDeque<TileCoord>,
    pathfinder: Pathfinder,
    walk_cycle: f64,
    stride: f64,
    idle_time: f64,
}

impl AvatarMotion {
    /// Creates an idle avatar standing on the spawn tile inside the room.
    pub fn new(
        config: MotionConfig,
        view: TileView<'_>,
        spawn: TileCoord,
    ) -> Result<Self, MotionError> {
        let config = config.validate()?;
        if !view.size().contains(spawn) {
            return Err(MotionError::SpawnOutsideRoom(spawn));
        }

        Ok(Self {
            config,
            position: spawn.to_point(),
            facing: Facing::default(),
            segment: None,
            waypoints: VecDeque::new(),
            pathfinder: Pathfinder::new(),
            walk_cycle: 0.0,
            stride: 0.0,
            idle_time: 0.0,
        })
    }

    /// Continuous position measured in tile units.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// Direction the avatar currently faces.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Segment currently being walked, if any.
    #[must_use]
    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    /// Waypoints queued after the active segment.
    pub fn waypoints(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.waypoints.iter().copied()
    }

    /// Reports whether the avatar is travelling.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.segment.is_some() || !self.waypoints.is_empty()
    }

    /// Requests a walk to the target tile.
    ///
    /// Returns `false`, leaving the state untouched, when the target lies
    /// outside the room or cannot be reached. When the target holds
    /// furniture the avatar stops on the tile before it. An avatar caught
    /// between tiles first heads back to the nearest tile unless the route
    /// continues along its current line of travel.
    pub fn set_target(&mut self, view: TileView<'_>, target: TileCoord) -> bool {
        if !view.size().contains(target) {
            debug!(%target, "move target outside the room");
            return false;
        }

        let Some(start) =
            TileCoord::nearest(self.position).filter(|cell| view.size().contains(*cell))
        else {
            debug!(position = ?self.position, "avatar is not standing inside the room");
            return false;
        };

        let Some(path) = self.pathfinder.find(view, start, target) else {
            debug!(%start, %target, "move target unreachable");
            return false;
        };

        let mut steps = path.into_steps();
        if view.furniture(target).is_some() {
            let _ = steps.pop();
        }

        let anchor = start.to_point();
        let offset = self.position - anchor;
        let continues_line = steps.first().is_some_and(|next| {
            let heading = next.to_point() - anchor;
            offset.dot(heading) > 0.0 && offset.perp_dot(heading).abs() <= POSITION_EPSILON
        });
        let off_centre = offset.length() > POSITION_EPSILON;

        self.waypoints.clear();
        if off_centre && !continues_line {
            self.waypoints.push_back(start);
        }
        self.waypoints.extend(steps);
        self.segment = None;
        self.begin_next_segment();

        debug!(
            %target,
            from = ?self.position,
            waypoints = self.waypoints.len() + usize::from(self.segment.is_some()),
            "move target accepted"
        );
        true
    }

    /// Advances the avatar by `delta_seconds`.
    ///
    /// Non-finite or non-positive deltas are ignored; larger deltas are
    /// clamped to the configured maximum tick.
    pub fn update(&mut self, delta_seconds: f64) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        let delta = delta_seconds.min(self.config.max_tick_seconds);

        if let Some(segment) = self.segment.as_mut() {
            let length = segment.length();
            segment.progress = if length <= POSITION_EPSILON {
                1.0
            } else {
                (segment.progress + self.config.speed_tiles_per_second * delta / length).min(1.0)
            };

            if segment.progress >= 1.0 {
                self.position = segment.to;
                self.segment = None;
                self.begin_next_segment();
            } else {
                self.position = segment.position();
            }
            trace!(position = ?self.position, facing = ?self.facing, "avatar advanced");
        }

        self.animate(delta);
    }

    /// Render-state snapshot for the current frame.
    #[must_use]
    pub fn pose(&self) -> AvatarPose {
        let cycle = self.walk_cycle * TAU;
        let idle_blend = 1.0 - self.stride;
        let bob = cycle.sin() * WALK_BOB * self.stride
            + (self.idle_time * TAU * IDLE_BOB_RATE).sin() * IDLE_BOB * idle_blend;
        let sway = (cycle + TAU / 4.0).sin() * WALK_SWAY * self.stride
            + (self.idle_time * TAU * IDLE_SWAY_RATE).sin() * IDLE_SWAY * idle_blend;
        let lean = cycle.sin() * WALK_LEAN * self.stride;

        AvatarPose {
            position: self.position,
            facing: self.facing,
            animation_phase: self.walk_cycle,
            stride: self.stride,
            bob,
            sway,
            lean,
            moving: self.is_moving(),
        }
    }

    /// Moves the avatar off furniture placed on the tile it stands on.
    ///
    /// The avatar stops and reappears on the closest walkable tile. Returns
    /// `true` when it was moved.
    pub fn settle(&mut self, view: TileView<'_>) -> bool {
        let Some(current) =
            TileCoord::nearest(self.position).filter(|cell| view.size().contains(*cell))
        else {
            return false;
        };
        if view.is_walkable(current) {
            return false;
        }
        let Some(free) = self.pathfinder.nearest_walkable(view, current) else {
            debug!(%current, "no walkable tile left for the avatar");
            return false;
        };

        self.position = free.to_point();
        self.segment = None;
        self.waypoints.clear();
        debug!(from = %current, to = %free, "avatar displaced by furniture");
        true
    }

    fn begin_next_segment(&mut self) {
        let Some(next) = self.waypoints.pop_front() else {
            return;
        };

        let to = next.to_point();
        if let Some(facing) = Facing::from_delta(to - self.position) {
            self.facing = facing;
        }
        self.segment = Some(Segment::new(self.position, to));
    }

    fn animate(&mut self, delta: f64) {
        let moving = self.is_moving();
        let cycle_rate = if moving {
            self.config.speed_tiles_per_second * WALK_CYCLE_PER_TILE
        } else {
            IDLE_CYCLE_RATE
        };
        self.walk_cycle = (self.walk_cycle + delta * cycle_rate).rem_euclid(1.0);

        let (target, rate) = if moving {
            (1.0, STRIDE_BLEND_MOVING)
        } else {
            (0.0, STRIDE_BLEND_IDLE)
        };
        self.stride =
            (self.stride + (target - self.stride) * (delta * rate).min(1.0)).clamp(0.0, 1.0);

        self.idle_time = if moving { 0.0 } else { self.idle_time + delta };
    }
}

#[cfg(test)]
mod tests {
    use room_builder_core::{GridSize, Tile};

    use super::*;

    fn open_room(width: u32, height: u32) -> (Vec<Tile>, GridSize) {
        let size = GridSize::new(width, height).expect("valid grid");
        (vec![Tile::default(); size.tile_count()], size)
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let (tiles, size) = open_room(2, 2);
        let view = TileView::new(&tiles, size);

        let slow = MotionConfig {
            speed_tiles_per_second: 0.0,
            ..MotionConfig::default()
        };
        assert_eq!(
            AvatarMotion::new(slow, view, TileCoord::new(0, 0)).err(),
            Some(MotionError::InvalidSpeed(0.0))
        );
        assert_eq!(
            AvatarMotion::new(MotionConfig::default(), view, TileCoord::new(2, 0)).err(),
            Some(MotionError::SpawnOutsideRoom(TileCoord::new(2, 0)))
        );
    }

    #[test]
    fn large_deltas_are_clamped_to_the_maximum_tick() {
        let (tiles, size) = open_room(6, 1);
        let view = TileView::new(&tiles, size);
        let mut avatar =
            AvatarMotion::new(MotionConfig::default(), view, TileCoord::new(0, 0)).expect("avatar");
        assert!(avatar.set_target(view, TileCoord::new(5, 0)));

        avatar.update(5.0);

        let expected = DEFAULT_SPEED_TILES_PER_SECOND * DEFAULT_MAX_TICK_SECONDS;
        assert!((avatar.position().x - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_length_segment_completes_and_keeps_facing() {
        let (tiles, size) = open_room(3, 3);
        let view = TileView::new(&tiles, size);
        let mut avatar =
            AvatarMotion::new(MotionConfig::default(), view, TileCoord::new(1, 1)).expect("avatar");
        avatar.facing = Facing::NorthWest;
        avatar.waypoints.push_back(TileCoord::new(1, 1));
        avatar.begin_next_segment();

        assert_eq!(avatar.facing(), Facing::NorthWest);
        avatar.update(0.01);
        assert!(avatar.segment().is_none());
        assert_eq!(avatar.facing(), Facing::NorthWest);
        assert_eq!(avatar.position(), DVec2::new(1.0, 1.0));
    }

    #[test]
    fn stride_blends_towards_walking_and_back() {
        let (tiles, size) = open_room(8, 1);
        let view = TileView::new(&tiles, size);
        let mut avatar =
            AvatarMotion::new(MotionConfig::default(), view, TileCoord::new(0, 0)).expect("avatar");
        assert!(avatar.set_target(view, TileCoord::new(7, 0)));

        for _ in 0..5 {
            avatar.update(0.05);
        }
        let walking = avatar.pose();
        assert!(walking.moving);
        assert!(walking.stride > 0.5);
        assert!((0.0..1.0).contains(&walking.animation_phase));
        let expected_lean = (walking.animation_phase * TAU).sin() * WALK_LEAN * walking.stride;
        assert!((walking.lean - expected_lean).abs() < 1e-12);

        for _ in 0..100 {
            avatar.update(0.1);
        }
        let resting = avatar.pose();
        assert!(!resting.moving);
        assert!(resting.stride < 0.01);
        assert!(resting.lean.abs() < WALK_LEAN * 0.01);
    }
}
