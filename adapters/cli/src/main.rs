#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted room builder session.
//!
//! The session lays out the starter room, clicks a seeded sequence of walk
//! targets through the picker, ticks the avatar to each of them and prints the
//! final draw order.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use room_builder_cli::{EngineConfig, Mode, RoomSession};
use room_builder_core::{EditCommand, TileCoord};
use room_builder_system_depth_sort::{DrawEntry, EntityRef};
use room_builder_system_editor::PointerButton;
use room_builder_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MAX_FRAMES_PER_WALK: usize = 10_000;

/// Headless isometric room builder session.
#[derive(Debug, Parser)]
#[command(name = "room-builder", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the scripted walk targets.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Number of walk targets to click.
    #[arg(long, default_value_t = 5)]
    walks: usize,

    /// Simulated frame length in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_seconds: f64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mut session = RoomSession::new(&config)?;
    let _ = session.edit(EditCommand::ApplyStarterLayout);

    let size = query::size(session.grid());
    info!(
        width = size.width(),
        height = size.height(),
        "starter room ready"
    );

    session.set_mode(Mode::Walk);
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    for walk in 0..cli.walks {
        let target = TileCoord::new(
            rng.gen_range(0..size.width()),
            rng.gen_range(0..size.height()),
        );
        let point = session
            .transform()
            .grid_to_screen(target.to_point() + DVec2::splat(0.5));

        let accepted = session.pointer_pressed(point, PointerButton::Primary);
        session.pointer_released();
        if !accepted {
            info!(walk, %target, "walk target refused");
            continue;
        }

        let mut frames = 0;
        while session.avatar().is_moving() && frames < MAX_FRAMES_PER_WALK {
            session.tick(cli.frame_seconds);
            frames += 1;
        }
        info!(
            walk,
            %target,
            frames,
            position = ?session.avatar().position(),
            "walk finished"
        );
    }

    let frame = session.frame();
    for (index, entry) in frame.draw_list.iter().enumerate() {
        println!("{index:4} {}", describe(entry));
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn describe(entry: &DrawEntry) -> String {
    let at = format!("@ ({:.1}, {:.1})", entry.screen.x, entry.screen.y);
    match &entry.entity {
        EntityRef::Floor { cell, floor } => {
            let floor = floor.as_ref().map_or("bare", |id| id.as_str());
            format!("floor     {cell} {floor} {at}")
        }
        EntityRef::Wall {
            cell,
            orientation,
            wall,
        } => format!("wall      {cell} {wall} {orientation:?} {at}"),
        EntityRef::Furniture {
            cell,
            placement,
            shape,
            ..
        } => format!(
            "furniture {cell} {} {} r{} {at}",
            placement.id,
            shape.key(),
            placement.rotation.quarter_turns()
        ),
        EntityRef::Avatar { pose } => format!(
            "avatar    ({:.2}, {:.2}) {:?} {at}",
            pose.position.x, pose.position.y, pose.facing
        ),
    }
}
