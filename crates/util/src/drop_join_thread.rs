//! This module contains the [DropJoinHandle] type, a thin wrapper type around
//! [JoinHandle] that joins the thread when the handle is dropped (RAII style).

use std::ops::Deref;
use std::thread::{self, JoinHandle};

/// A thin wrapper around [JoinHandle] that joins the thread when the handle is
/// dropped (RAII style).
///
/// Any error in joining the thread will be ignored.
#[derive(Debug)]
pub struct DropJoinHandle<T>(Option<JoinHandle<T>>);

impl<T> Deref for DropJoinHandle<T> {
    type Target = JoinHandle<T>;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref().expect(EXPECT_MSG)
    }
}

impl<T> From<JoinHandle<T>> for DropJoinHandle<T> {
    fn from(handle: JoinHandle<T>) -> Self {
        DropJoinHandle(Some(handle))
    }
}

impl<T> Drop for DropJoinHandle<T> {
    fn drop(&mut self) {
        _ = self.0.take().expect(EXPECT_MSG).join();
    }
}

/// The same as [thread::Builder::spawn] with a thread name, but a
/// [DropJoinHandle] is returned instead.
pub fn spawn_named<F, T>(name: &str, f: F) -> std::io::Result<DropJoinHandle<T>>
where
    F: FnOnce() -> T,
    F: Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(f)
        .map(DropJoinHandle::from)
}

const EXPECT_MSG: &str = "The handle should be present.";
