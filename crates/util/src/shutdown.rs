//! Contains [ShutdownFlag], a write-once flag that can be shared between
//! threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag that starts out unset and can be set exactly once. Cloning a
/// [ShutdownFlag] gives another handle to the same flag.
///
/// There's no way to clear the flag once it's been set.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` if this call is the one that set it and
    /// `false` if it was already set.
    pub fn set(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    /// Whether the flag has been set (by any handle).
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn flag_is_only_set_once() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_set());

        assert!(flag.set());
        assert!(flag.is_set());

        assert!(!flag.set());
        assert!(flag.is_set());
    }

    #[test]
    fn clones_share_state_across_threads() {
        let flag = ShutdownFlag::new();
        let writer = flag.clone();

        thread::spawn(move || assert!(writer.set())).join().unwrap();

        assert!(flag.is_set());
        assert!(!flag.set());
    }
}
