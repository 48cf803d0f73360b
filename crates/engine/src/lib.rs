//! The window and GPU side of playback: a [Display] that pictures are uploaded
//! to and presented on.

mod display;
mod engine_errors;
mod renderer;
mod video_texture;

pub use display::{Display, DisplayStatus};
pub use engine_errors::EngineError;
pub use video_texture::VideoTexture;
