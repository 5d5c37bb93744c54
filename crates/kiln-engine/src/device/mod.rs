//! wgpu implementation of the render thread's GPU backend.
//!
//! Owns Instance/Adapter/Device/Queue and the surface configuration, and turns
//! the backend calls issued by render jobs into a clear pass plus recorded passes.

mod backend;
mod init;
mod surface;

pub use backend::{FramePass, WgpuBackend};
pub use init::GpuInit;
