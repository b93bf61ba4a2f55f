//! Serial background worker
//!
//! One OS thread owns a state value and runs queued jobs against it, one at
//! a time, in submission order. Persistent backends keep their lazily
//! created directory in that state, so initialization needs no lock.

use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use crate::errors::{StorageError, StorageResult};
use crate::observability::{Event, Logger};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Single-threaded FIFO executor owning a state `S`
pub struct SerialWorker<S> {
    name: String,
    sender: Option<mpsc::UnboundedSender<Job<S>>>,
    handle: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> SerialWorker<S> {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WorkerSpawn` if the OS refuses the thread.
    pub fn spawn(name: impl Into<String>, state: S) -> StorageResult<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job<S>>();

        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut state = state;
                Logger::trace(Event::WorkerStarted.as_str(), &[("worker", &thread_name)]);
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut state);
                }
                Logger::trace(Event::WorkerStopped.as_str(), &[("worker", &thread_name)]);
            })
            .map_err(StorageError::WorkerSpawn)?;

        Ok(Self {
            name,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queues a job. Jobs run in the order they were queued.
    ///
    /// If the worker thread has died the job is dropped; any consumer it
    /// captured then reports `WorkerUnavailable`.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Box::new(job)).is_err() {
            Logger::error(Event::WorkerUnavailable.as_str(), &[("worker", &self.name)]);
        }
    }

    /// Name of the worker thread
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> Drop for SerialWorker<S> {
    fn drop(&mut self) {
        // Closing the queue lets the thread drain what is left and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitResult;
    use crate::threading::Consumer;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_jobs_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let worker = SerialWorker::spawn("test-order", 0u32).unwrap();
            for i in 0..50 {
                let seen = seen.clone();
                worker.execute(move |count: &mut u32| {
                    *count += 1;
                    seen.lock().unwrap().push((i, *count));
                });
            }
        }
        // Dropping the worker drains the queue.
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 50);
        for (index, (job, count)) in seen.iter().enumerate() {
            assert_eq!(*job, index);
            assert_eq!(*count as usize, index + 1);
        }
    }

    #[test]
    fn test_jobs_run_off_the_calling_thread() {
        let caller = thread::current().id();
        let worker = SerialWorker::spawn("test-thread", ()).unwrap();
        let (consumer, completion) = Consumer::<StorageResult<bool>>::channel();
        worker.execute(move |_| consumer.accept(Ok(thread::current().id() != caller)));
        assert!(completion.wait().unwrap());
        assert_eq!(worker.name(), "test-thread");
    }

    #[test]
    fn test_panicking_job_fails_later_jobs() {
        let worker = SerialWorker::spawn("test-panic", ()).unwrap();
        worker.execute(|_| panic!("job failed"));

        let (consumer, completion) = Consumer::<CommitResult>::channel();
        worker.execute(move |_| consumer.accept(CommitResult::Success));
        assert_eq!(completion.wait(), CommitResult::Failure);
    }
}
