use std::future::Future;

use tokio::runtime::Handle;
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

/// One message from a worker call: zero or more `Progress`, then exactly one
/// `Finished`.
#[derive(Debug)]
pub enum WorkerMessage<P, T> {
    Progress(P),
    Finished(Result<T, EngineError>),
}

/// Handed to the worker function for reporting progress and observing
/// cancellation.
pub struct ProgressSink<P> {
    tx: UnboundedSender<P>,
    cancel: CancellationToken,
}

impl<P> ProgressSink<P> {
    pub fn emit(&self, progress: P) {
        let _ = self.tx.send(progress);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `Err(Cancelled)` once the caller has given up on this call.
    pub fn checkpoint(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle to a worker running on the blocking pool.
///
/// Dropping the call cancels it. Cancellation is logical: a worker that never
/// checks its sink runs to completion, but the call resolves to `Cancelled`
/// as soon as the token fires.
pub struct WorkerCall<P, T> {
    progress: UnboundedReceiver<P>,
    result: JoinHandle<Result<T, EngineError>>,
    cancel: CancellationToken,
    done: Option<Result<T, EngineError>>,
    finished: bool,
}

impl<P, T> WorkerCall<P, T> {
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next message, or `None` after the terminal message was delivered.
    pub async fn next(&mut self) -> Option<WorkerMessage<P, T>> {
        if self.finished {
            return None;
        }
        if self.done.is_none() {
            select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.finished = true;
                    return Some(WorkerMessage::Finished(Err(EngineError::Cancelled)));
                }
                Some(progress) = self.progress.recv() => {
                    return Some(WorkerMessage::Progress(progress));
                }
                joined = &mut self.result => {
                    self.done = Some(match joined {
                        Ok(result) => result,
                        Err(err) if err.is_cancelled() => Err(EngineError::Cancelled),
                        Err(err) => Err(EngineError::WorkerLost(err.to_string())),
                    });
                }
            }
        }
        // Progress is sent before the worker returns, so anything still
        // queued goes out ahead of the terminal message.
        if let Ok(progress) = self.progress.try_recv() {
            return Some(WorkerMessage::Progress(progress));
        }
        self.finished = true;
        self.done.take().map(WorkerMessage::Finished)
    }

    /// Drives the call to completion, passing progress to `on_progress`.
    pub async fn finish(mut self, mut on_progress: impl FnMut(P)) -> Result<T, EngineError> {
        while let Some(message) = self.next().await {
            match message {
                WorkerMessage::Progress(progress) => on_progress(progress),
                WorkerMessage::Finished(result) => return result,
            }
        }
        Err(EngineError::Cancelled)
    }
}

impl<P, T> Drop for WorkerCall<P, T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Runs CPU-bound work off the interactive path.
#[derive(Clone)]
pub struct Dispatcher {
    runtime: Handle,
}

impl Dispatcher {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Dispatcher on the runtime of the calling task.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn run<P, T, F>(&self, work: F) -> WorkerCall<P, T>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: FnOnce(&ProgressSink<P>) -> Result<T, EngineError> + Send + 'static,
    {
        let (tx, progress) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let sink = ProgressSink {
            tx,
            cancel: cancel.clone(),
        };
        let result = self.runtime.spawn_blocking(move || {
            sink.checkpoint()?;
            work(&sink)
        });
        WorkerCall {
            progress,
            result,
            cancel,
            done: None,
            finished: false,
        }
    }

    /// Spawns the async glue that forwards a call's messages.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(future);
    }
}
