//! Deadline supervision for untrusted phase work.
//!
//! The work runs on a dedicated, named worker thread inside `catch_unwind`
//! and reports back over a oneshot channel. The async side races that
//! channel against `tokio::time::timeout`. A worker that misses its deadline
//! is detached, never joined; the caller is expected to latch cancellation
//! in the shared phase state so that nothing the worker does afterwards has
//! any effect.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::GameError;

/// How supervised work ended.
#[derive(Debug)]
pub(crate) enum Supervised<T> {
    /// The work returned a value in time.
    Finished(T),
    /// The work panicked; carries the panic message.
    Panicked(String),
    /// The deadline passed first.
    TimedOut,
}

/// Run `work` on a worker thread named `delve-{label}`, waiting at most
/// `deadline` (forever when `None`).
pub(crate) async fn supervise<T, F>(
    label: &str,
    deadline: Option<Duration>,
    work: F,
) -> Result<Supervised<T>, GameError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let name = format!("delve-{label}");

    let _detached = thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work));
            if sender.send(result).is_err() {
                debug!(worker = %name, "Supervisor stopped waiting before the worker finished");
            }
        })
        .map_err(|source| GameError::Spawn { source })?;

    let received = match deadline {
        Some(limit) => match tokio::time::timeout(limit, receiver).await {
            Ok(received) => received,
            Err(_elapsed) => return Ok(Supervised::TimedOut),
        },
        None => receiver.await,
    };

    match received {
        Ok(Ok(value)) => Ok(Supervised::Finished(value)),
        Ok(Err(payload)) => Ok(Supervised::Panicked(panic_message(payload.as_ref()))),
        Err(_closed) => Err(GameError::WorkerLost),
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "policy panicked".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn finished_work_returns_its_value() {
        let outcome = supervise("sum", Some(Duration::from_secs(5)), || 2 + 3)
            .await
            .unwrap();
        assert!(matches!(outcome, Supervised::Finished(5)));
    }

    #[tokio::test]
    async fn no_deadline_waits_for_completion() {
        let outcome = supervise("slow", None, || {
            thread::sleep(Duration::from_millis(50));
            "done"
        })
        .await
        .unwrap();
        assert!(matches!(outcome, Supervised::Finished("done")));
    }

    #[tokio::test]
    async fn panics_are_caught() {
        let outcome = supervise("boom", None, || -> u32 { panic!("cave-in") })
            .await
            .unwrap();
        match outcome {
            Supervised::Panicked(message) => assert_eq!(message, "cave-in"),
            other => panic!("expected a caught panic, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stuck_work_times_out_and_is_detached() {
        let release = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&release);
        let outcome = supervise("stuck", Some(Duration::from_millis(50)), move || {
            while !flag.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(5));
            }
        })
        .await
        .unwrap();
        assert!(matches!(outcome, Supervised::TimedOut));
        release.store(true, Ordering::Relaxed);
    }
}
