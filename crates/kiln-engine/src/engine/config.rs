use crate::coords::ColorRgba;
use crate::device::GpuInit;
use crate::logging::LoggingConfig;
use crate::render::{BackendKind, LayerOrders};
use crate::window::WindowConfig;

/// Everything the engine needs before its threads start.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub gpu: GpuInit,
    pub logging: LoggingConfig,
    /// Logic ticks per second; 0 runs uncapped.
    pub tick_rate: u32,
    /// Pending render jobs above which the render thread runs required jobs only.
    pub overload_threshold: usize,
    /// Backend kinds to try, in order.
    pub backend_priority: Vec<BackendKind>,
    pub layer_order: LayerOrders,
    pub clear_color: ColorRgba,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            gpu: GpuInit::default(),
            logging: LoggingConfig::default(),
            tick_rate: 60,
            overload_threshold: 256,
            backend_priority: BackendKind::default_priority().to_vec(),
            layer_order: LayerOrders::default(),
            clear_color: ColorRgba::black(),
        }
    }
}
