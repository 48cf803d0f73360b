//! Assorted plumbing shared by the other crates in the workspace: the message
//! channel the player's event queue is built on, stop-signal polling, the
//! shutdown flag, and a thread handle that joins when dropped.

pub mod channels;
pub mod drop_join_thread;
pub mod shutdown;
pub mod stop_signals;
