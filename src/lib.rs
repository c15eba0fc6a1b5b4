//! arrangegrid: a bar/beat-aligned arrangement grid with GPU rendering and
//! direct-manipulation editing. The core is four pieces: a pure scene
//! builder (snapshot -> pixel layout), a CPU picking engine that agrees
//! with the draw order, an instanced wgpu render engine, and a pointer
//! state machine that emits edit commands to an external sink.

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod messages;
pub mod model;
pub mod picking;
pub mod providers;
pub mod render;
pub mod scene;
pub mod time_utils;

pub use host::GridView;
pub use messages::{CommandSink, GridCommand};
pub use model::Snapshot;
pub use scene::{Scene, SceneBuilder, Viewport};
