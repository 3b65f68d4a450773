/// Device and frame-driver configuration

use crate::graphics_device::{DepthFormat, DEFAULT_DEPTH_CANDIDATES};

/// Which validation messages are forwarded to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything the validation layer reports (verbose)
    All,
}

/// Configuration passed to the device bootstrap
///
/// The frame ring size is not configured here: it is the const parameter of
/// `FrameDriver` (default `FRAMES_IN_FLIGHT`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Wait for vertical blank (FIFO present mode)
    pub vsync: bool,
    /// Requested swapchain image count, clamped to the surface limits
    pub preferred_image_count: Option<u32>,
    /// Depth formats to try, in order of preference
    pub depth_format_candidates: Vec<DepthFormat>,
    /// Validation messages forwarded to the logger
    pub debug_severity: DebugSeverity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Lumen Application".to_string(),
            app_version: (1, 0, 0),
            vsync: true,
            preferred_image_count: None,
            depth_format_candidates: DEFAULT_DEPTH_CANDIDATES.to_vec(),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
        }
    }
}
