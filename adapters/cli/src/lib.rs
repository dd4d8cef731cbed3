#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless adapter that drives the room builder engine from the command line.

pub mod config;
pub mod session;

pub use config::EngineConfig;
pub use session::{Frame, Mode, RoomSession};
