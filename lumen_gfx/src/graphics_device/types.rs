/// Plain value types exchanged between the frame driver and a device backend

use crate::graphics_device::{ColorFormat, DepthFormat};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-sized drawable area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering the whole extent with depth range [0, 1]
    pub fn full(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Rectangle (for scissor)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    /// Rectangle covering the whole extent
    pub fn full(extent: Extent2D) -> Self {
        Self { x: 0, y: 0, width: extent.width, height: extent.height }
    }
}

/// Clear value for render pass attachments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Clear color (RGBA)
    Color([f32; 4]),
    /// Clear depth and stencil
    DepthStencil { depth: f32, stencil: u32 },
}

/// Clear values of the main pass: opaque black, far depth
pub const MAINPASS_CLEAR_VALUES: [ClearValue; 2] = [
    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
    ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
];

/// Where an allocation should live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUsage {
    /// Device-local, not visible to the CPU (render targets, depth)
    GpuOnly,
    /// Host-visible upload memory
    CpuToGpu,
    /// Host-visible readback memory
    GpuToCpu,
}

/// Result of a successful image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    pub image_index: u32,
    /// The swapchain still works but no longer matches the surface exactly
    pub suboptimal: bool,
}

/// Outcome of a successful present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    Suboptimal,
}

/// Negotiated state of the current swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainInfo {
    pub image_count: usize,
    pub format: ColorFormat,
    pub extent: Extent2D,
}

/// State of the depth attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthInfo {
    pub format: DepthFormat,
    pub extent: Extent2D,
}
