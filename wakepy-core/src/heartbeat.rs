//! The heartbeat task: a cooperative, periodic liveness operation some
//! Methods require.
//!
//! Modeled as a dedicated thread parked on a timeout, not a raw spawn-and-
//! forget: [`HeartbeatTask::stop`] sends a stop signal and joins the
//! thread within a short bounded wait on deactivation.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::warn;

use crate::method::MethodInstance;

/// How long [`HeartbeatTask::stop`] waits for the thread to join before
/// giving up and logging instead of blocking forever.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Handle to a running heartbeat thread for one Method instance.
///
/// The *initial* tick runs synchronously on the caller's thread as part
/// of activation, before this task is spawned; [`HeartbeatTask::spawn`]
/// only covers the recurring ticks after that. The instance is moved
/// into the thread for the duration of the task and handed back by
/// [`HeartbeatTask::stop`], since `exit_mode` must still be invoked on it
/// afterwards from the caller's side.
pub struct HeartbeatTask {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<Box<dyn MethodInstance>>>,
}

impl HeartbeatTask {
    /// Spawns the recurring heartbeat loop for `method_name`, ticking
    /// every `period`. Heartbeat failures after activation are logged and
    /// non-fatal.
    #[must_use]
    pub fn spawn(
        method_name: String,
        period: Duration,
        mut instance: Box<dyn MethodInstance>,
    ) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(format!("wakepy-heartbeat-{method_name}"))
            .spawn(move || {
                let ticker = tick(period);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if let Err(err) = instance.heartbeat() {
                                warn!(method = %method_name, error = %err, "heartbeat failed; continuing");
                            }
                        },
                    }
                }
                instance
            })
            .expect("failed to spawn heartbeat thread");

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signals the thread to stop and waits up to [`SHUTDOWN_GRACE`] for
    /// it to quiesce, returning the Method instance so the caller can run
    /// `exit_mode` on it. A timeout is logged and `None` is returned —
    /// deactivation always proceeds within the grace period even if the
    /// heartbeat thread is genuinely stuck (e.g. blocked inside a hung
    /// `instance.heartbeat()` call); the still-running `waiter`/`handle`
    /// are dropped rather than joined, so this call never blocks past
    /// [`SHUTDOWN_GRACE`], and the instance is then leaked rather than
    /// risk calling into a thread that never stopped.
    #[must_use]
    pub fn stop(mut self) -> Option<Box<dyn MethodInstance>> {
        let _ = self.stop_tx.send(());
        let Some(handle) = self.handle.take() else {
            return None;
        };

        let (done_tx, done_rx) = bounded::<Box<dyn MethodInstance>>(0);
        let waiter = thread::spawn(move || {
            if let Ok(instance) = handle.join() {
                let _ = done_tx.send(instance);
            }
        });
        let result = done_rx.recv_timeout(SHUTDOWN_GRACE).ok();
        if result.is_none() {
            warn!("heartbeat thread did not quiesce within the shutdown grace period");
            return None;
        }
        let _ = waiter.join();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::error::MethodError;

    struct CountingHeartbeat(Arc<AtomicUsize>);
    impl MethodInstance for CountingHeartbeat {
        fn heartbeat(&mut self) -> Result<(), MethodError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn ticks_and_stops_cleanly() {
        let count = Arc::new(AtomicUsize::new(0));
        let task = HeartbeatTask::spawn(
            "counting".to_string(),
            Duration::from_millis(10),
            Box::new(CountingHeartbeat(Arc::clone(&count))),
        );
        thread::sleep(Duration::from_millis(50));
        let returned = task.stop();
        assert!(returned.is_some());
        assert!(count.load(Ordering::SeqCst) >= 1);
    }
}
