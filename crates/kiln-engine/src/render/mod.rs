//! Render job pipeline.
//!
//! The logic thread accumulates a frame of [`RenderJob`]s in a [`FrameBuilder`] and
//! seals it through the [`RenderPipeline`]; the render thread drains whole batches
//! from the [`RenderDrain`] and runs them against the [`GpuBackend`].
//!
//! Load is shed at two points:
//! - producer side: a frame submitted while the previous one is still in flight
//!   loses its best-effort jobs
//! - consumer side: when the pending job count exceeds the overload threshold, a
//!   drain pass runs required jobs only

mod backend;
mod order;
mod pipeline;
mod queue;

pub use backend::{BackendKind, GpuBackend, NativeWindow, SurfaceHandle};
pub use order::{Layer, LayerOrders, RenderItem, RenderOrder};
pub use pipeline::{FrameBuilder, RenderPipeline, SubmitReport};
pub use queue::{render_queue, DrainReport, RenderBatch, RenderDrain, RenderSubmitter};

use crate::job::Job;

/// The render thread's view of the backend; render jobs receive `&mut DynBackend`.
pub type DynBackend = dyn GpuBackend;

/// A job executed on the render thread.
pub type RenderJob = Job<DynBackend>;
