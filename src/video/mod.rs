pub mod engine;
pub mod ffi;
pub mod mpv;
pub mod properties;
pub mod render;

#[cfg(test)]
mod properties_test;

pub use engine::*;
pub use mpv::{EngineConfig, MpvEngine};
pub use render::VideoOutput;
