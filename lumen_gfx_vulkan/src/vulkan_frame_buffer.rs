/// Framebuffers - one per swapchain image, sharing the depth view

use ash::vk;
use lumen_gfx::lumen::Result;

use crate::vulkan_format::vk_error;

/// Build one framebuffer per color view, each binding that view and `depth_view`
///
/// On failure the framebuffers created so far are destroyed.
pub(crate) fn create_framebuffers(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    color_views: &[vk::ImageView],
    depth_view: vk::ImageView,
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>> {
    let mut framebuffers = Vec::with_capacity(color_views.len());

    for &color_view in color_views {
        let attachments = [color_view, depth_view];
        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        match unsafe { device.create_framebuffer(&framebuffer_info, None) } {
            Ok(framebuffer) => framebuffers.push(framebuffer),
            Err(e) => {
                destroy_framebuffers(device, &mut framebuffers);
                return Err(vk_error("vkCreateFramebuffer", e));
            }
        }
    }

    Ok(framebuffers)
}

pub(crate) fn destroy_framebuffers(device: &ash::Device, framebuffers: &mut Vec<vk::Framebuffer>) {
    for framebuffer in framebuffers.drain(..) {
        unsafe {
            device.destroy_framebuffer(framebuffer, None);
        }
    }
}
