//! This module defines the [Inbox] and [Outbox] types for working with a
//! one-way message queue, useful in situations where one thread consumes
//! messages that one or more other threads produce. Messages are received in
//! the order they were sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use super::{ChannelError, ChannelResult, THREAD_PANIC_MSG};

/// The inbox (message receiver) of a one-way message channel. Also see
/// [Outbox].
///
/// See [new] and [with_capacity] to construct.
#[derive(Debug)]
pub struct Inbox<T> {
    channel: Arc<OneWayChannel<T>>,
}

impl<T> Inbox<T> {
    /// Waits for a message from an outbox until one appears.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if every outbox
    /// was dropped and there are no more items in the queue.
    ///
    /// Also see [Self::check].
    pub fn wait(&self) -> ChannelResult<T> {
        let mut queue = self.channel.lock();

        loop {
            if let Some(msg) = queue.pop_front() {
                return Ok(msg);
            }

            // If there are no messages we need to make sure there's still
            // someone around to send one.
            self.ensure_outboxes_alive()?;

            queue = self.channel.notifier.wait(queue).expect(THREAD_PANIC_MSG);
        }
    }

    /// Receives a message from an outbox if a message is waiting, returning
    /// [None] otherwise. This function may still block slightly.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if every outbox
    /// was dropped and there are no more items in the queue.
    pub fn check(&self) -> ChannelResult<Option<T>> {
        let mut queue = self.channel.lock();

        if let Some(msg) = queue.pop_front() {
            return Ok(Some(msg));
        }

        self.ensure_outboxes_alive()?;

        Ok(None)
    }

    /// Whether at least one outbox is still alive, the inverse of
    /// [Self::connection_closed].
    pub fn connection_open(&self) -> bool {
        self.channel.outboxes.load(Ordering::SeqCst) > 0
    }

    /// Whether every outbox has been dropped, the inverse of
    /// [Self::connection_open].
    pub fn connection_closed(&self) -> bool {
        !self.connection_open()
    }

    fn ensure_outboxes_alive(&self) -> ChannelResult<()> {
        if self.connection_open() {
            Ok(())
        } else {
            Err(ChannelError::ConnectionDropped)
        }
    }
}

impl<T> Drop for Inbox<T> {
    fn drop(&mut self) {
        self.channel.inbox_alive.store(false, Ordering::SeqCst);
    }
}

/// The outbox (message sender) of a one-way message channel. Also see
/// [Inbox].
///
/// Cloning an outbox gives another sender for the same inbox.
///
/// See [new] and [with_capacity] to construct.
#[derive(Debug)]
pub struct Outbox<T> {
    channel: Arc<OneWayChannel<T>>,
}

impl<T> Outbox<T> {
    /// Sends a message to the inbox, returning the number of messages that have
    /// been sent but not received (after sending the message).
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if the inbox was
    /// dropped.
    pub fn send(&self, msg: T) -> ChannelResult<usize> {
        self.send_unless(msg, |_| false)
            .map(|in_flight| in_flight.unwrap_or_default())
    }

    /// Sends a message to the inbox unless a message that's already waiting in
    /// the queue matches `pred`, in which case `msg` is discarded.
    ///
    /// Returns the number of messages that have been sent but not received
    /// after sending, or [None] if the message was discarded.
    ///
    /// A [ChannelError::ConnectionDropped] error is returned if the inbox was
    /// dropped.
    pub fn send_unless<F>(&self, msg: T, pred: F) -> ChannelResult<Option<usize>>
    where
        F: FnMut(&T) -> bool,
    {
        self.ensure_inbox_alive()?;

        let mut queue = self.channel.lock();
        if queue.iter().any(pred) {
            return Ok(None);
        }

        queue.push_back(msg);
        let in_flight = queue.len();

        // We need to notify the inbox that a message has arrived if it's
        // waiting.
        self.channel.notifier.notify_one();

        Ok(Some(in_flight))
    }

    /// Whether the inbox is still alive, the inverse of
    /// [Self::connection_closed].
    pub fn connection_open(&self) -> bool {
        self.channel.inbox_alive.load(Ordering::SeqCst)
    }

    /// Whether the inbox has been dropped, the inverse of
    /// [Self::connection_open].
    pub fn connection_closed(&self) -> bool {
        !self.connection_open()
    }

    fn ensure_inbox_alive(&self) -> ChannelResult<()> {
        if self.connection_open() {
            Ok(())
        } else {
            Err(ChannelError::ConnectionDropped)
        }
    }
}

impl<T> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        self.channel.outboxes.fetch_add(1, Ordering::SeqCst);
        Self {
            channel: self.channel.clone(),
        }
    }
}

// We need a custom `Drop` implementation since the inbox may be waiting. If
// this was the last outbox we have to notify it that no more messages are
// coming so it doesn't just wait forever. The count is changed while holding
// the queue's lock so the inbox can't miss the notification between checking
// the count and going to sleep.
impl<T> Drop for Outbox<T> {
    fn drop(&mut self) {
        let _queue = self
            .channel
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.channel.outboxes.fetch_sub(1, Ordering::SeqCst);
        self.channel.notifier.notify_all();
    }
}

/// Create a one-way message channel's [Inbox] and [Outbox].
///
/// - The inbox will be able to receive messages as long as at least one outbox
///   hasn't been dropped or while there are still pending messages.
/// - An outbox will be able to send messages as long as the inbox hasn't been
///   dropped.
pub fn new<T>() -> (Inbox<T>, Outbox<T>) {
    with_capacity(0)
}

/// Create a one-way message channel's [Inbox] and [Outbox] with space to store
/// `capacity` messages without reallocating memory. More messages than
/// `capacity` can still sit in the inbox at a time (the channel is not
/// bounded).
pub fn with_capacity<T>(capacity: usize) -> (Inbox<T>, Outbox<T>) {
    let channel = Arc::new(OneWayChannel {
        queue: Mutex::new(VecDeque::with_capacity(capacity)),
        notifier: Condvar::default(),
        outboxes: AtomicUsize::new(1),
        inbox_alive: AtomicBool::new(true),
    });

    (
        Inbox {
            channel: channel.clone(),
        },
        Outbox { channel },
    )
}

#[derive(Debug)]
struct OneWayChannel<T> {
    queue: Mutex<VecDeque<T>>,
    notifier: Condvar,
    outboxes: AtomicUsize,
    inbox_alive: AtomicBool,
}

impl<T> OneWayChannel<T> {
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().expect(THREAD_PANIC_MSG)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn messages_can_be_received() {
        let (inbox, outbox) = new::<i32>();

        let thread = thread::spawn(move || {
            assert!(outbox.send(1).is_ok());
            assert!(outbox.send(2).is_ok());
            assert!(outbox.send(3).is_ok());
        });

        assert_eq!(inbox.wait(), Ok(1));
        assert_eq!(inbox.wait(), Ok(2));
        assert_eq!(inbox.wait(), Ok(3));

        thread.join().unwrap();
    }

    #[test]
    fn check_works() {
        let (inbox, outbox) = new::<i32>();

        assert_eq!(inbox.check(), Ok(None));

        assert_eq!(outbox.send(1), Ok(1));
        assert_eq!(outbox.send(2), Ok(2));

        assert_eq!(inbox.check(), Ok(Some(1)));
        assert_eq!(inbox.check(), Ok(Some(2)));
        assert_eq!(inbox.check(), Ok(None));
    }

    #[test]
    fn send_unless_skips_matching_messages() {
        let (inbox, outbox) = new::<i32>();

        assert_eq!(outbox.send_unless(1, |&m| m == 1), Ok(Some(1)));
        assert_eq!(outbox.send_unless(1, |&m| m == 1), Ok(None));
        assert_eq!(outbox.send_unless(2, |&m| m == 2), Ok(Some(2)));

        assert_eq!(inbox.wait(), Ok(1));
        assert_eq!(outbox.send_unless(1, |&m| m == 1), Ok(Some(2)));

        assert_eq!(inbox.wait(), Ok(2));
        assert_eq!(inbox.wait(), Ok(1));
    }

    #[test]
    fn multiple_outboxes_keep_order_per_sender() {
        let (inbox, outbox) = new::<(u8, i32)>();
        let other = outbox.clone();

        thread::scope(|s| {
            s.spawn(move || {
                for i in 0..1_000 {
                    outbox.send((0, i)).unwrap();
                }
            });
            s.spawn(move || {
                for i in 0..1_000 {
                    other.send((1, i)).unwrap();
                }
            });
        });

        let mut next = [0, 0];
        while let Ok((sender, i)) = inbox.wait() {
            assert_eq!(next[sender as usize], i);
            next[sender as usize] += 1;
        }
        assert_eq!(next, [1_000, 1_000]);
    }

    #[test]
    fn inbox_only_closes_once_every_outbox_is_gone() {
        let (inbox, outbox) = new::<i32>();
        let other = outbox.clone();

        drop(outbox);
        assert!(inbox.connection_open());
        assert_eq!(inbox.check(), Ok(None));

        other.send(7).unwrap();
        drop(other);

        assert!(inbox.connection_closed());
        assert_eq!(inbox.wait(), Ok(7));
        assert_eq!(inbox.wait(), Err(ChannelError::ConnectionDropped));
    }

    #[test]
    fn waiting_inbox_wakes_when_last_outbox_drops() {
        let (inbox, outbox) = new::<i32>();

        let thread = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            drop(outbox);
        });

        assert_eq!(inbox.wait(), Err(ChannelError::ConnectionDropped));
        thread.join().unwrap();
    }

    #[test]
    fn early_inbox_drop_is_fine() {
        let (inbox, outbox) = new::<i32>();

        drop(inbox);

        assert!(outbox.connection_closed());
        assert_eq!(outbox.send(1), Err(ChannelError::ConnectionDropped));
    }
}
