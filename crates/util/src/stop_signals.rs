//! Tools for handling stop signals (e.g. `SIGINT`) with polling. This allows
//! you to essentially ignore stop signals until you want to deal with them
//! (which can make resource cleanup a lot easier).
//!
//! While a [CaptureGuard] is alive, the default stop-signal handler is
//! replaced by one that only counts signals. [poll] and [consume] report what
//! was counted. The player's frame clock consumes these between ticks, so
//! `Ctrl+C` turns into an ordinary quit request instead of killing the process
//! mid-decode.

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use signal_hook::{SigId, consts, low_level};

const THREAD_EXPECT_MSG: &str = "Another thread panicked while capturing stop signals.";

/// Keeps stop signals captured until it's dropped. Create one with [capture].
#[derive(Debug)]
#[must_use = "stop signals are only captured while the guard is alive"]
pub struct CaptureGuard(());

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let mut sig_ids = SIG_IDS.lock().expect(THREAD_EXPECT_MSG);
        unregister_all(&mut sig_ids);
    }
}

/// Start capturing stop signals. Captured signals can be checked with
/// [poll]/[consume] until the returned guard is dropped.
///
/// Only one guard can exist at a time; a second call fails with
/// [io::ErrorKind::AlreadyExists].
pub fn capture() -> io::Result<CaptureGuard> {
    let mut sig_ids = SIG_IDS.lock().expect(THREAD_EXPECT_MSG);
    if !sig_ids.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "stop signals are already being captured",
        ));
    }

    for &signal in consts::TERM_SIGNALS {
        // SAFETY: Messing with atomics is one of the only things you can
        // safely do in a signal handler and that's all we're doing here.
        // There's no mutexes, no memory allocations, no functions being called
        // that aren't async-signal-safe, and nothing that can panic.
        let registered = unsafe {
            low_level::register(signal, || {
                STOP_SIGNALS.fetch_add(1, Ordering::SeqCst);
            })
        };

        match registered {
            Ok(sig_id) => sig_ids.push(sig_id),
            Err(e) => {
                log::error!("Failed to register a handler for signal {signal}: {e}");
                unregister_all(&mut sig_ids);
                return Err(e);
            }
        }
    }

    Ok(CaptureGuard(()))
}

/// Whether stop signals are currently being captured (a [CaptureGuard] is
/// alive).
pub fn is_capturing() -> bool {
    !SIG_IDS.lock().expect(THREAD_EXPECT_MSG).is_empty()
}

/// Returns whether a stop signal (e.g. `SIGINT`) has been captured, consuming
/// the signal in the process. To check without consuming the signal, see
/// [poll].
///
/// Signals captured before the last [CaptureGuard] was dropped stay around
/// until they're consumed.
pub fn consume() -> bool {
    STOP_SIGNALS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
            count.checked_sub(1)
        })
        .is_ok()
}

/// Returns whether a stop signal (e.g. `SIGINT`) has been captured without
/// consuming the signal in the process. To consume the signal, see [consume].
pub fn poll() -> bool {
    STOP_SIGNALS.load(Ordering::SeqCst) > 0
}

fn unregister_all(sig_ids: &mut Vec<SigId>) {
    for sig_id in sig_ids.drain(..) {
        low_level::unregister(sig_id);
    }
}

static STOP_SIGNALS: AtomicUsize = AtomicUsize::new(0);

static SIG_IDS: Mutex<Vec<SigId>> = Mutex::new(Vec::new());
