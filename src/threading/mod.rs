//! Threading primitives shared by the storage backends
//!
//! - [`ThreadChecker`]: main-thread / background-thread assertions
//! - [`SerialWorker`]: one background thread running jobs in FIFO order
//! - [`Consumer`] / [`Completion`]: exactly-once result delivery

mod affinity;
mod completion;
mod worker;

pub use affinity::ThreadChecker;
pub use completion::{Completion, Consumer, FailureValue};
pub use worker::SerialWorker;
