//! Exactly-once result delivery
//!
//! Every storage call takes a [`Consumer`] and delivers exactly one value to
//! it. A consumer is either a callback or the sending half of a
//! [`Completion`]. A consumer that is dropped without a value (its job was
//! lost with the worker) delivers the "worker unavailable" failure instead,
//! so the caller still hears back once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::commit::CommitResult;
use crate::errors::{StorageError, StorageResult};

/// Values that have a failure form for when the worker went away
pub trait FailureValue {
    fn worker_unavailable() -> Self;
}

impl<T> FailureValue for StorageResult<T> {
    fn worker_unavailable() -> Self {
        Err(StorageError::WorkerUnavailable)
    }
}

impl FailureValue for CommitResult {
    fn worker_unavailable() -> Self {
        CommitResult::Failure
    }
}

enum Target<T> {
    Channel(oneshot::Sender<T>),
    Callback(Box<dyn FnOnce(T) + Send>),
}

impl<T> Target<T> {
    fn deliver(self, value: T) {
        match self {
            // The receiver may have been dropped; nobody is listening then.
            Target::Channel(sender) => {
                let _ = sender.send(value);
            }
            Target::Callback(callback) => callback(value),
        }
    }
}

/// Single-use receiver of an operation's result
pub struct Consumer<T: FailureValue> {
    target: Option<Target<T>>,
}

impl<T: FailureValue> Consumer<T> {
    /// A consumer that calls `callback` with the result.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        Self {
            target: Some(Target::Callback(Box::new(callback))),
        }
    }

    /// A consumer paired with the completion it resolves.
    pub fn channel() -> (Self, Completion<T>) {
        let (sender, receiver) = oneshot::channel();
        let consumer = Self {
            target: Some(Target::Channel(sender)),
        };
        (consumer, Completion::pending(receiver))
    }

    /// Deliver the result. Consumes the consumer, so it can only happen once.
    pub fn accept(mut self, value: T) {
        if let Some(target) = self.target.take() {
            target.deliver(value);
        }
    }
}

impl<T: FailureValue> Drop for Consumer<T> {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            target.deliver(T::worker_unavailable());
        }
    }
}

impl<T: FailureValue> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.target {
            Some(Target::Channel(_)) => "channel",
            Some(Target::Callback(_)) => "callback",
            None => "delivered",
        };
        f.debug_struct("Consumer").field("target", &kind).finish()
    }
}

enum State<T> {
    Ready(Option<T>),
    Pending(oneshot::Receiver<T>),
}

/// The result of a storage call, resolved exactly once.
///
/// Await it from async code, or call [`Completion::wait`] from a plain
/// thread. Results produced inline (in-memory backends) never block.
pub struct Completion<T: FailureValue> {
    state: State<T>,
}

// The value is moved out, never pinned.
impl<T: FailureValue> Unpin for Completion<T> {}

impl<T: FailureValue> Completion<T> {
    /// An already-resolved completion
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready(Some(value)),
        }
    }

    fn pending(receiver: oneshot::Receiver<T>) -> Self {
        Self {
            state: State::Pending(receiver),
        }
    }

    /// Takes the value if it has already been delivered.
    pub fn try_take(&mut self) -> Option<T> {
        match &mut self.state {
            State::Ready(value) => value.take(),
            State::Pending(receiver) => match receiver.try_recv() {
                Ok(value) => Some(value),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(T::worker_unavailable()),
            },
        }
    }

    /// Blocks the current thread until the value arrives.
    ///
    /// Must not be called from inside an async runtime while the value is
    /// still pending; `.await` the completion there instead.
    pub fn wait(mut self) -> T {
        if let Some(value) = self.try_take() {
            return value;
        }
        match self.state {
            State::Ready(_) => T::worker_unavailable(),
            State::Pending(receiver) => receiver
                .blocking_recv()
                .unwrap_or_else(|_| T::worker_unavailable()),
        }
    }
}

impl<T: FailureValue> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        match &mut this.state {
            State::Ready(value) => Poll::Ready(value.take().unwrap_or_else(T::worker_unavailable)),
            State::Pending(receiver) => Pin::new(receiver)
                .poll(cx)
                .map(|result| result.unwrap_or_else(|_| T::worker_unavailable())),
        }
    }
}

impl<T: FailureValue> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Ready(Some(_)) => "ready",
            State::Ready(None) => "taken",
            State::Pending(_) => "pending",
        };
        f.debug_struct("Completion").field("state", &state).finish()
    }
}
