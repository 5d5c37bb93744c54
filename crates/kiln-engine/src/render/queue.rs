use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::{DynBackend, RenderJob};

/// All render jobs produced by one logic tick.
///
/// A batch travels as a single message, so the render thread observes either the
/// whole frame or none of it.
#[derive(Debug)]
pub struct RenderBatch {
    pub frame: u64,
    pub jobs: Vec<RenderJob>,
}

/// Counters from one drain pass.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DrainReport {
    pub batches: usize,
    pub executed: usize,
    pub skipped: usize,
}

impl DrainReport {
    fn merge(&mut self, other: DrainReport) {
        self.batches += other.batches;
        self.executed += other.executed;
        self.skipped += other.skipped;
    }
}

/// Creates the render queue. `overload_threshold` is the number of pending jobs above
/// which the consumer starts shedding best-effort work.
pub fn render_queue(overload_threshold: usize) -> (RenderSubmitter, RenderDrain) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let backlog = Arc::new(AtomicUsize::new(0));
    (
        RenderSubmitter { tx, backlog: Arc::clone(&backlog) },
        RenderDrain { rx, backlog, overload_threshold, stash: None },
    )
}

/// Logic-thread side of the render queue.
#[derive(Debug, Clone)]
pub struct RenderSubmitter {
    tx: Sender<RenderBatch>,
    backlog: Arc<AtomicUsize>,
}

impl RenderSubmitter {
    /// Hands a whole frame to the render thread. Returns `false` if the render
    /// thread is gone; the batch is dropped unexecuted.
    pub fn submit(&self, batch: RenderBatch) -> bool {
        let n = batch.jobs.len();
        self.backlog.fetch_add(n, Ordering::AcqRel);
        match self.tx.send(batch) {
            Ok(()) => true,
            Err(err) => {
                self.backlog.fetch_sub(n, Ordering::AcqRel);
                log::debug!("render batch {} dropped: render thread gone", err.0.frame);
                false
            }
        }
    }

    /// Jobs submitted but not yet executed or skipped.
    #[inline]
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Acquire)
    }
}

/// Render-thread side of the render queue.
#[derive(Debug)]
pub struct RenderDrain {
    rx: Receiver<RenderBatch>,
    backlog: Arc<AtomicUsize>,
    overload_threshold: usize,
    stash: Option<RenderBatch>,
}

impl RenderDrain {
    #[inline]
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Acquire)
    }

    #[inline]
    pub fn overload_threshold(&self) -> usize {
        self.overload_threshold
    }

    /// Blocks up to `timeout` until at least one batch is ready to drain.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        if self.stash.is_some() || !self.rx.is_empty() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(batch) => {
                self.stash = Some(batch);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Executes every batch that is ready, in submission order.
    ///
    /// The backlog is measured once at the start of the pass. If it exceeds the
    /// overload threshold, best-effort jobs in this pass are dropped unexecuted and
    /// only required jobs run.
    pub fn drain(&mut self, gpu: &mut DynBackend) -> DrainReport {
        let pending = self.backlog();
        let shedding = pending > self.overload_threshold;
        let report = self.run_pass(gpu, shedding);

        if shedding && report.skipped > 0 {
            log::info!(
                "render backlog {pending} over threshold {}: skipped {} best-effort jobs",
                self.overload_threshold,
                report.skipped
            );
        }
        report
    }

    /// Final drain at shutdown: runs required jobs only.
    pub fn drain_required(&mut self, gpu: &mut DynBackend) -> DrainReport {
        let report = self.run_pass(gpu, true);
        log::debug!(
            "final render drain: {} required jobs run, {} best-effort dropped",
            report.executed,
            report.skipped
        );
        report
    }

    fn run_pass(&mut self, gpu: &mut DynBackend, shedding: bool) -> DrainReport {
        let mut report = DrainReport::default();

        if let Some(batch) = self.stash.take() {
            report.merge(self.execute(batch, gpu, shedding));
        }

        // Batches that arrive during the pass belong to the next one.
        for _ in 0..self.rx.len() {
            let Ok(batch) = self.rx.try_recv() else { break };
            report.merge(self.execute(batch, gpu, shedding));
        }
        report
    }

    fn execute(&self, batch: RenderBatch, gpu: &mut DynBackend, shedding: bool) -> DrainReport {
        let mut report = DrainReport { batches: 1, ..DrainReport::default() };
        let total = batch.jobs.len();

        for job in batch.jobs {
            if shedding && !job.is_required() {
                report.skipped += 1;
            } else {
                job.run(gpu);
                report.executed += 1;
            }
        }

        self.backlog.fetch_sub(total, Ordering::AcqRel);
        log::trace!(
            "render frame {}: {} run, {} skipped",
            batch.frame,
            report.executed,
            report.skipped
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::thread;

    use super::*;
    use crate::coords::ColorRgba;
    use crate::job::Job;
    use crate::render::{BackendKind, GpuBackend, SurfaceHandle};

    #[derive(Default)]
    struct Counting {
        required: usize,
        best_effort: usize,
    }

    impl GpuBackend for Counting {
        fn initialize(&mut self, _: &SurfaceHandle, _: u32, _: u32, _: BackendKind) -> anyhow::Result<()> {
            Ok(())
        }
        fn shutdown(&mut self) {}
        fn resize(&mut self, _: u32, _: u32) {}
        fn clear(&mut self, _: ColorRgba) {}
        fn present(&mut self) {}
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn counting(gpu: &mut DynBackend) -> &mut Counting {
        gpu.as_any_mut().downcast_mut::<Counting>().unwrap()
    }

    fn batch(frame: u64, required: usize, best_effort: usize) -> RenderBatch {
        let mut jobs: Vec<RenderJob> = Vec::new();
        for _ in 0..required {
            jobs.push(Job::required("req", |gpu: &mut DynBackend| counting(gpu).required += 1));
        }
        for _ in 0..best_effort {
            jobs.push(Job::best_effort("opt", |gpu: &mut DynBackend| counting(gpu).best_effort += 1));
        }
        RenderBatch { frame, jobs }
    }

    // ── normal load ───────────────────────────────────────────────────────

    #[test]
    fn under_threshold_everything_runs() {
        let (tx, mut rx) = render_queue(16);
        tx.submit(batch(0, 2, 3));
        tx.submit(batch(1, 2, 3));

        let mut gpu = Counting::default();
        let report = rx.drain(&mut gpu);

        assert_eq!(report, DrainReport { batches: 2, executed: 10, skipped: 0 });
        assert_eq!((gpu.required, gpu.best_effort), (4, 6));
        assert_eq!(rx.backlog(), 0);
    }

    // ── overload ──────────────────────────────────────────────────────────

    #[test]
    fn over_threshold_skips_all_best_effort_and_runs_required_once() {
        let (tx, mut rx) = render_queue(8);
        // Render thread "stalls" while five frames pile up: 25 pending jobs.
        for frame in 0..5 {
            tx.submit(batch(frame, 2, 3));
        }
        assert_eq!(tx.backlog(), 25);

        let mut gpu = Counting::default();
        let report = rx.drain(&mut gpu);

        assert_eq!(gpu.required, 10);
        assert_eq!(gpu.best_effort, 0);
        assert_eq!(report.skipped, 15);
        assert_eq!(rx.backlog(), 0);

        // Caught up: the next frame runs in full.
        tx.submit(batch(5, 2, 3));
        rx.drain(&mut gpu);
        assert_eq!((gpu.required, gpu.best_effort), (12, 3));
    }

    #[test]
    fn final_drain_runs_required_only() {
        let (tx, mut rx) = render_queue(1000);
        tx.submit(batch(0, 1, 4));

        let mut gpu = Counting::default();
        let report = rx.drain_required(&mut gpu);

        assert_eq!((gpu.required, gpu.best_effort), (1, 0));
        assert_eq!(report.skipped, 4);
    }

    // ── atomicity ─────────────────────────────────────────────────────────

    #[test]
    fn batches_arrive_whole_and_in_order() {
        let (tx, mut rx) = render_queue(usize::MAX);
        let producer = thread::spawn(move || {
            for frame in 0..200 {
                tx.submit(batch(frame, 3, 0));
            }
        });

        let mut gpu = Counting::default();
        let mut seen = 0;
        while seen < 200 {
            if rx.wait(Duration::from_millis(50)) {
                let report = rx.drain(&mut gpu);
                assert_eq!(report.executed, report.batches * 3);
                seen += report.batches;
            }
        }
        producer.join().unwrap();
        assert_eq!(gpu.required, 600);
    }

    #[test]
    fn submit_after_drain_dropped_fails() {
        let (tx, rx) = render_queue(4);
        drop(rx);
        assert!(!tx.submit(batch(0, 1, 0)));
        assert_eq!(tx.backlog(), 0);
    }
}
