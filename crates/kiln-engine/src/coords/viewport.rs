/// Drawable area of the window.
///
/// The physical size is what the GPU surface is configured with; the logical size is
/// what the 2D hierarchy lays out against.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub physical_width: u32,
    pub physical_height: u32,
    pub scale_factor: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(physical_width: u32, physical_height: u32, scale_factor: f32) -> Self {
        Self { physical_width, physical_height, scale_factor }
    }

    #[inline]
    pub fn logical_width(self) -> f32 {
        self.physical_width as f32 / self.scale_factor
    }

    #[inline]
    pub fn logical_height(self) -> f32 {
        self.physical_height as f32 / self.scale_factor
    }

    /// A zero-area viewport (minimized window) cannot be rendered into.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.physical_width > 0
            && self.physical_height > 0
            && self.scale_factor > 0.0
            && self.scale_factor.is_finite()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0, 1.0)
    }
}
