//! Plays a network video stream in a window. A [clock::FrameClock] asks for
//! frames through a [dispatcher::Dispatcher], and [playback::run] keeps
//! starting [session::StreamSession]s against the stream until it's told to
//! quit.

pub mod args;
pub mod clock;
pub mod dispatcher;
pub mod playback;
pub mod session;
