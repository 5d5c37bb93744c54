//! Deferred work moved between threads.
//!
//! A [`Job`] is a one-shot callable plus a `required` flag. Ownership moves into a
//! [`JobQueue`] on enqueue; the consumer thread runs it against its own context and
//! drops it. Queues are multi-producer, single-consumer and FIFO per queue.

mod queue;

pub use queue::{Job, JobQueue, JobSender};
