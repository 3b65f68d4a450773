/// Pixel formats used by the swapchain and the depth attachment

use crate::error::{Error, Result};

/// Color format of the presentable images
///
/// Formats the core does not name are carried through untouched as `Raw`.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    /// Backend format value without a named variant
    Raw(i32),
}

/// Depth (and optional stencil) attachment format
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFormat {
    D16_UNORM,
    D32_SFLOAT,
    D32_SFLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
}

/// Candidate depth formats, in order of preference
pub const DEFAULT_DEPTH_CANDIDATES: [DepthFormat; 3] = [
    DepthFormat::D32_SFLOAT,
    DepthFormat::D32_SFLOAT_S8_UINT,
    DepthFormat::D24_UNORM_S8_UINT,
];

impl DepthFormat {
    /// True if the format has a stencil aspect
    pub fn has_stencil_component(self) -> bool {
        matches!(self, DepthFormat::D32_SFLOAT_S8_UINT | DepthFormat::D24_UNORM_S8_UINT)
    }
}

/// Pick the first candidate the device can use as an optimal-tiling
/// depth/stencil attachment.
pub fn select_depth_format<F>(candidates: &[DepthFormat], is_supported: F) -> Result<DepthFormat>
where
    F: Fn(DepthFormat) -> bool,
{
    candidates
        .iter()
        .copied()
        .find(|format| is_supported(*format))
        .ok_or_else(|| {
            crate::engine_error!(
                "lumen::depth",
                "No supported depth format among {:?}",
                candidates
            );
            Error::UnsupportedFormat(format!("no supported depth format among {:?}", candidates))
        })
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
