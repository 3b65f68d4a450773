/// Depth attachment sized to the swapchain extent

use ash::vk;
use lumen_gfx::lumen::device::{DepthFormat, DepthInfo, Extent2D, MemoryUsage};
use lumen_gfx::lumen::Result;

use crate::vulkan_allocator::{AllocatedImage, ImageDesc};
use crate::vulkan_context::DeviceContext;
use crate::vulkan_format::{depth_aspect, depth_format_to_vk, vk_error};

pub(crate) struct DepthResources {
    image: AllocatedImage,
    pub view: vk::ImageView,
    pub format: DepthFormat,
    pub extent: Extent2D,
}

impl DepthResources {
    pub(crate) fn create(context: &DeviceContext, extent: Extent2D, format: DepthFormat) -> Result<Self> {
        let vk_format = depth_format_to_vk(format);

        let mut image = AllocatedImage::create(context, &ImageDesc {
            name: "depth_attachment",
            extent,
            format: vk_format,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            memory: MemoryUsage::GpuOnly,
        })?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(vk_format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: depth_aspect(format),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = match unsafe { context.device.create_image_view(&view_info, None) } {
            Ok(view) => view,
            Err(e) => {
                image.destroy(context);
                return Err(vk_error("vkCreateImageView (depth)", e));
            }
        };

        Ok(Self { image, view, format, extent })
    }

    pub(crate) fn info(&self) -> DepthInfo {
        DepthInfo { format: self.format, extent: self.extent }
    }

    /// View first, then the image and its memory
    pub(crate) fn destroy(&mut self, context: &DeviceContext) {
        unsafe {
            context.device.destroy_image_view(self.view, None);
        }
        self.view = vk::ImageView::null();
        self.image.destroy(context);
    }
}

/// Whether `format` can back a depth-stencil attachment with optimal tiling
pub(crate) fn supports_depth_attachment(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    format: DepthFormat,
) -> bool {
    let properties = unsafe {
        instance.get_physical_device_format_properties(physical_device, depth_format_to_vk(format))
    };
    properties
        .optimal_tiling_features
        .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
}
