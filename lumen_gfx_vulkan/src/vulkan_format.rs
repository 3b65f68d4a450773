//! Conversions between lumen_gfx types and their Vulkan equivalents

use ash::vk;
use gpu_allocator::MemoryLocation;
use lumen_gfx::lumen::Error;
use lumen_gfx::lumen::device::{
    AccessFlags, ClearValue, ColorFormat, DepthFormat, Extent2D, ImageLayout, LoadOp,
    MemoryUsage, PipelineStages, Rect2D, StoreOp, SubpassRef, Viewport,
};
use lumen_gfx::engine_error;

pub(crate) fn color_format_to_vk(format: ColorFormat) -> vk::Format {
    match format {
        ColorFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        ColorFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        ColorFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        ColorFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        ColorFormat::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        ColorFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        ColorFormat::Raw(raw) => vk::Format::from_raw(raw),
    }
}

pub(crate) fn vk_to_color_format(format: vk::Format) -> ColorFormat {
    match format {
        vk::Format::B8G8R8A8_SRGB => ColorFormat::B8G8R8A8_SRGB,
        vk::Format::B8G8R8A8_UNORM => ColorFormat::B8G8R8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => ColorFormat::R8G8B8A8_SRGB,
        vk::Format::R8G8B8A8_UNORM => ColorFormat::R8G8B8A8_UNORM,
        vk::Format::A2B10G10R10_UNORM_PACK32 => ColorFormat::A2B10G10R10_UNORM,
        vk::Format::R16G16B16A16_SFLOAT => ColorFormat::R16G16B16A16_SFLOAT,
        other => ColorFormat::Raw(other.as_raw()),
    }
}

pub(crate) fn depth_format_to_vk(format: DepthFormat) -> vk::Format {
    match format {
        DepthFormat::D16_UNORM => vk::Format::D16_UNORM,
        DepthFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        DepthFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        DepthFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
    }
}

/// Aspect of a depth view: depth, plus stencil when the format has one
pub(crate) fn depth_aspect(format: DepthFormat) -> vk::ImageAspectFlags {
    if format.has_stencil_component() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        vk::ImageAspectFlags::DEPTH
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();
    if stages.contains(PipelineStages::TOP_OF_PIPE) {
        flags |= vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    if stages.contains(PipelineStages::EARLY_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
    }
    if stages.contains(PipelineStages::LATE_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    }
    if stages.contains(PipelineStages::COLOR_ATTACHMENT_OUTPUT) {
        flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
    }
    if stages.contains(PipelineStages::BOTTOM_OF_PIPE) {
        flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }
    flags
}

pub(crate) fn access_to_vk(access: AccessFlags) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if access.contains(AccessFlags::COLOR_ATTACHMENT_READ) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ;
    }
    if access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
    }
    if access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ;
    }
    if access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }
    flags
}

pub(crate) fn subpass_to_vk(subpass: SubpassRef) -> u32 {
    match subpass {
        SubpassRef::External => vk::SUBPASS_EXTERNAL,
        SubpassRef::Index(index) => index,
    }
}

pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match *value {
        ClearValue::Color(float32) => vk::ClearValue {
            color: vk::ClearColorValue { float32 },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

pub(crate) fn extent_to_vk(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D { width: extent.width, height: extent.height }
}

pub(crate) fn vk_to_extent(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

pub(crate) fn viewport_to_vk(viewport: &Viewport) -> vk::Viewport {
    vk::Viewport {
        x: viewport.x,
        y: viewport.y,
        width: viewport.width,
        height: viewport.height,
        min_depth: viewport.min_depth,
        max_depth: viewport.max_depth,
    }
}

pub(crate) fn rect_to_vk(rect: &Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

pub(crate) fn memory_location(usage: MemoryUsage) -> MemoryLocation {
    match usage {
        MemoryUsage::GpuOnly => MemoryLocation::GpuOnly,
        MemoryUsage::CpuToGpu => MemoryLocation::CpuToGpu,
        MemoryUsage::GpuToCpu => MemoryLocation::GpuToCpu,
    }
}

/// Classify a failed Vulkan call
///
/// Out-of-date is the only recoverable code; memory exhaustion gets its own
/// variant and everything else is a backend error.
pub(crate) fn vk_result_to_error(result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SwapchainOutOfDate,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            Error::OutOfMemory
        }
        other => Error::BackendError(format!("{:?}", other)),
    }
}

/// Log a failed Vulkan call and classify it
pub(crate) fn vk_error(what: &str, result: vk::Result) -> Error {
    let error = vk_result_to_error(result);
    if !error.is_recoverable() {
        engine_error!("lumen::vulkan", "{} failed: {:?}", what, result);
    }
    match error {
        Error::BackendError(_) => Error::BackendError(format!("{} failed: {:?}", what, result)),
        other => other,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
