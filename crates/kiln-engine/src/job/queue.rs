use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// A deferred, one-shot unit of work run against a context of type `C`.
///
/// `required` jobs must run exactly once; best-effort jobs may be dropped
/// unexecuted by a consumer that is falling behind.
pub struct Job<C: ?Sized> {
    run: Box<dyn FnOnce(&mut C) + Send>,
    required: bool,
    label: &'static str,
}

impl<C: ?Sized> Job<C> {
    pub fn required(label: &'static str, f: impl FnOnce(&mut C) + Send + 'static) -> Self {
        Self { run: Box::new(f), required: true, label }
    }

    pub fn best_effort(label: &'static str, f: impl FnOnce(&mut C) + Send + 'static) -> Self {
        Self { run: Box::new(f), required: false, label }
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Runs the job, consuming it.
    #[inline]
    pub fn run(self, ctx: &mut C) {
        (self.run)(ctx)
    }
}

impl<C: ?Sized> fmt::Debug for Job<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Producer half of a [`JobQueue`]. Cheap to clone and safe to move to any thread.
pub struct JobSender<C: ?Sized> {
    tx: Sender<Job<C>>,
}

impl<C: ?Sized> JobSender<C> {
    /// Enqueues `job`. Returns `false` if the consuming side is gone, in which
    /// case the job is dropped unexecuted.
    pub fn enqueue(&self, job: Job<C>) -> bool {
        match self.tx.send(job) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("job '{}' dropped: queue closed", err.0.label);
                false
            }
        }
    }
}

impl<C: ?Sized> Clone for JobSender<C> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

/// Unbounded multi-producer FIFO of [`Job`]s, consumed by one thread.
///
/// Ordering is preserved per producer; jobs from different producers interleave
/// in arrival order.
pub struct JobQueue<C: ?Sized> {
    tx: Sender<Job<C>>,
    rx: Receiver<Job<C>>,
}

impl<C: ?Sized> JobQueue<C> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> JobSender<C> {
        JobSender { tx: self.tx.clone() }
    }

    #[inline]
    pub fn enqueue(&self, job: Job<C>) {
        // Cannot fail: the queue holds its own receiver.
        let _ = self.tx.send(job);
    }

    #[inline]
    pub fn try_dequeue(&self) -> Option<Job<C>> {
        match self.rx.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Runs every job that is queued at the time of the call, in FIFO order.
    ///
    /// Jobs enqueued while draining (including by the jobs themselves) wait for the
    /// next drain, so a job that re-enqueues itself cannot stall the caller.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let pending = self.rx.len();
        let mut ran = 0;
        while ran < pending {
            let Some(job) = self.try_dequeue() else { break };
            job.run(ctx);
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for the first job, then drains like [`drain`](Self::drain).
    pub fn drain_timeout(&self, ctx: &mut C, timeout: Duration) -> usize {
        if self.rx.is_empty() {
            match self.rx.recv_timeout(timeout) {
                Ok(job) => {
                    job.run(ctx);
                    return 1 + self.drain(ctx);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return 0,
            }
        }
        self.drain(ctx)
    }
}

impl<C: ?Sized> Default for JobQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> fmt::Debug for JobQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn push(label: &'static str, n: u32) -> Job<Vec<u32>> {
        Job::required(label, move |out: &mut Vec<u32>| out.push(n))
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn drain_runs_in_fifo_order() {
        let q = JobQueue::new();
        for n in 0..5 {
            q.enqueue(push("n", n));
        }

        let mut out = Vec::new();
        assert_eq!(q.drain(&mut out), 5);
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn self_enqueued_job_waits_for_next_drain() {
        let q: JobQueue<Vec<u32>> = JobQueue::new();
        let tx = q.sender();
        q.enqueue(Job::required("respawn", move |out: &mut Vec<u32>| {
            out.push(1);
            tx.enqueue(Job::required("child", |out: &mut Vec<u32>| out.push(2)));
        }));

        let mut out = Vec::new();
        assert_eq!(q.drain(&mut out), 1);
        assert_eq!(out, vec![1]);
        assert_eq!(q.drain(&mut out), 1);
        assert_eq!(out, vec![1, 2]);
    }

    // ── producers ─────────────────────────────────────────────────────────

    #[test]
    fn per_producer_order_is_preserved_across_threads() {
        let q: JobQueue<Vec<(u32, u32)>> = JobQueue::new();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let tx = q.sender();
                thread::spawn(move || {
                    for i in 0..100 {
                        tx.enqueue(Job::required("pair", move |out: &mut Vec<(u32, u32)>| {
                            out.push((p, i))
                        }));
                    }
                })
            })
            .collect();
        for h in producers {
            h.join().unwrap();
        }

        let mut out = Vec::new();
        assert_eq!(q.drain(&mut out), 400);
        for p in 0..4 {
            let seq: Vec<u32> = out.iter().filter(|(owner, _)| *owner == p).map(|(_, i)| *i).collect();
            assert_eq!(seq, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn sender_reports_closed_queue() {
        let q: JobQueue<Vec<u32>> = JobQueue::new();
        let tx = q.sender();
        drop(q);
        assert!(!tx.enqueue(push("late", 1)));
    }

    // ── flags ─────────────────────────────────────────────────────────────

    #[test]
    fn constructors_set_required_flag() {
        let r: Job<()> = Job::required("r", |_| {});
        let b: Job<()> = Job::best_effort("b", |_| {});
        assert!(r.is_required());
        assert!(!b.is_required());
        assert_eq!(b.label(), "b");
    }

    #[test]
    fn drain_timeout_returns_zero_when_idle() {
        let q: JobQueue<Vec<u32>> = JobQueue::new();
        let mut out = Vec::new();
        assert_eq!(q.drain_timeout(&mut out, Duration::from_millis(5)), 0);
    }
}
