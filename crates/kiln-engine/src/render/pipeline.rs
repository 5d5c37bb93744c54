use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::order::sort_items;
use super::{DynBackend, LayerOrders, RenderBatch, RenderItem, RenderJob, RenderSubmitter};
use crate::job::Job;

/// Render work accumulated during one logic tick.
///
/// Direct jobs (clear, say) keep their push order and run first; offloaded
/// items are sorted by layer and depth after them.
#[derive(Default)]
pub struct FrameBuilder {
    jobs: Vec<RenderJob>,
    items: Vec<RenderItem>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a job that runs before any offloaded item.
    pub fn push(&mut self, job: RenderJob) {
        self.jobs.push(job);
    }

    pub fn push_item(&mut self, item: RenderItem) {
        self.items.push(item);
    }

    /// Moves everything from `other` after this builder's own jobs and items.
    pub fn append(&mut self, mut other: FrameBuilder) {
        self.jobs.append(&mut other.jobs);
        self.items.append(&mut other.items);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len() + self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of [`RenderPipeline::submit`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SubmitReport {
    pub frame: u64,
    pub submitted: usize,
    /// Best-effort jobs dropped because the previous frame was still in flight.
    pub dropped: usize,
    pub delivered: bool,
}

/// Logic-side end of the render pipeline.
///
/// Each submitted frame ends with a required `present` job that clears the
/// frame-in-flight flag when it runs. If the flag is still set when the next frame is
/// submitted, the render thread is behind and that frame's best-effort jobs are dropped
/// before they are ever queued.
pub struct RenderPipeline {
    submitter: RenderSubmitter,
    orders: LayerOrders,
    in_flight: Arc<AtomicBool>,
    frame: u64,
    skipped_frames: u64,
}

impl RenderPipeline {
    pub fn new(submitter: RenderSubmitter, orders: LayerOrders) -> Self {
        Self {
            submitter,
            orders,
            in_flight: Arc::new(AtomicBool::new(false)),
            frame: 0,
            skipped_frames: 0,
        }
    }

    #[inline]
    pub fn frame_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Frames that had best-effort work dropped at submission.
    #[inline]
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    #[inline]
    pub fn backlog(&self) -> usize {
        self.submitter.backlog()
    }

    pub fn orders_mut(&mut self) -> &mut LayerOrders {
        &mut self.orders
    }

    /// Seals `frame` into one batch and hands it to the render thread.
    pub fn submit(&mut self, frame: FrameBuilder) -> SubmitReport {
        let FrameBuilder { mut jobs, items } = frame;
        jobs.extend(sort_items(items, &self.orders));

        let mut dropped = 0;
        if self.frame_in_flight() {
            let before = jobs.len();
            jobs.retain(Job::is_required);
            dropped = before - jobs.len();
            self.skipped_frames += 1;
            log::debug!(
                "frame {}: previous frame still in flight, dropped {dropped} best-effort jobs",
                self.frame
            );
        }

        self.in_flight.store(true, Ordering::Release);
        let in_flight = Arc::clone(&self.in_flight);
        jobs.push(Job::required("present", move |gpu: &mut DynBackend| {
            gpu.present();
            in_flight.store(false, Ordering::Release);
        }));

        let report = SubmitReport {
            frame: self.frame,
            submitted: jobs.len(),
            dropped,
            delivered: false,
        };
        let delivered = self.submitter.submit(RenderBatch { frame: self.frame, jobs });
        if !delivered {
            self.in_flight.store(false, Ordering::Release);
        }
        self.frame += 1;

        SubmitReport { delivered, ..report }
    }
}
