//! The background execution context owned by each endpoint.
//!
//! Every endpoint drives all of its asynchronous work (accepts, reads, writes)
//! on a current-thread Tokio runtime that runs on one dedicated OS thread.
//! The foreground thread never performs socket I/O itself; it only queues
//! work through the runtime [`Handle`] and blocks on queue waits.
//!
//! Stopping sends a shutdown signal, joins the thread and drops the runtime,
//! which abandons every task still in flight.

use std::future::Future;
use std::io;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Builds the single-threaded runtime an endpoint runs on.
pub(crate) fn build_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// A runtime being driven on its own named thread.
pub(crate) struct IoThread {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl IoThread {
    /// Moves `runtime` onto a new thread called `name` and drives `root` (and
    /// every task spawned through [`IoThread::handle`]) until stopped.
    pub(crate) fn spawn<F>(runtime: Runtime, name: &str, root: F) -> io::Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = runtime.handle().clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new().name(name.to_string()).spawn(move || {
            runtime.block_on(async move {
                tokio::select! {
                    () = root => {}
                    _ = shutdown_rx => {}
                }
            });
            // Dropping the runtime here cancels every remaining task.
            drop(runtime);
        })?;

        debug!("started I/O thread {name}");
        Ok(Self {
            handle,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Signals shutdown and joins the thread.  Safe to call more than once.
    pub(crate) fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("I/O thread panicked before shutdown");
            }
        }
    }
}

impl Drop for IoThread {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_spawned_tasks_run_on_the_io_thread() {
        // Arrange
        let runtime = build_runtime().unwrap();
        let mut io = IoThread::spawn(runtime, "test-io", std::future::pending()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        // Act
        io.handle().spawn(async move {
            let name = thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        });

        // Assert
        let name = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(name.as_deref(), Some("test-io"));
        io.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let runtime = build_runtime().unwrap();
        let mut io = IoThread::spawn(runtime, "test-io", std::future::pending()).unwrap();

        io.stop();
        io.stop();
    }

    #[test]
    fn test_stop_abandons_pending_tasks() {
        // Arrange: a task that would set the flag only after a long sleep
        let runtime = build_runtime().unwrap();
        let mut io = IoThread::spawn(runtime, "test-io", std::future::pending()).unwrap();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        io.handle().spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            flag.store(true, Ordering::SeqCst);
        });

        // Act
        io.stop();

        // Assert
        assert!(!finished.load(Ordering::SeqCst));
    }
}
