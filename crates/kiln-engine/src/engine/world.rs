use super::EngineHandle;
use crate::coords::{ColorRgba, Viewport};
use crate::input::{InputFrame, InputState};
use crate::job::Job;
use crate::render::{DynBackend, FrameBuilder};
use crate::scene::Scene;
use crate::time::FrameTime;

/// Everything the logic thread owns. Tick callbacks and logic-side jobs get
/// `&mut World`.
pub struct World {
    pub scene: Scene,
    pub input: InputState,
    /// Input edges since the previous tick; cleared after every tick.
    pub input_frame: InputFrame,
    pub time: FrameTime,
    pub viewport: Viewport,
    /// False while the window is occluded; component offloads are skipped.
    pub visible: bool,
    pub clear_color: ColorRgba,
    handle: EngineHandle,
}

impl World {
    pub(crate) fn new(handle: EngineHandle, viewport: Viewport, clear_color: ColorRgba) -> Self {
        Self {
            scene: Scene::new(),
            input: InputState::default(),
            input_frame: InputFrame::default(),
            time: FrameTime::fixed(0.0, 0),
            viewport,
            visible: true,
            clear_color,
            handle,
        }
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// Records a new drawable size. The render thread resizes the backend itself
    /// before its next pass.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.viewport.physical_width = width;
        self.viewport.physical_height = height;
    }

    /// Jobs every frame needs regardless of scene content.
    pub(crate) fn required_frame(&self) -> FrameBuilder {
        let mut frame = FrameBuilder::new();
        let color = self.clear_color;
        frame.push(Job::required("clear", move |gpu: &mut DynBackend| gpu.clear(color)));
        frame
    }

    /// Collects component offloads into `frame`. Nothing is offloaded while the
    /// window is occluded or has no drawable area.
    pub(crate) fn offload(&self, frame: &mut FrameBuilder) {
        if self.visible && self.viewport.is_valid() {
            self.scene.offload(frame);
        }
    }
}
