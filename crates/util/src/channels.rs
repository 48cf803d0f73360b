//! This module contains [message_channel], a queue-based message passing system
//! with a single consumer and any number of producers.

pub mod message_channel;

use thiserror::Error;

/// An alias for a [Result] that has [ChannelError] as the error type.
pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelError {
    #[error("One side of the connection was dropped.")]
    ConnectionDropped,
}

const THREAD_PANIC_MSG: &str = "Another thread panicked while holding a resource this one needs.";
