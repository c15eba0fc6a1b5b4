pub mod engine;
pub mod frame;
pub mod instances;

pub use engine::RenderEngine;
pub use frame::{FocusState, FrameBuffers, FrameBuilder, OverlayBuffers};
pub use instances::Globals;
