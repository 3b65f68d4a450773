/// Swapchain - presentable image chain and its per-image views
///
/// Negotiation (image count, surface format, present mode, extent) lives in
/// plain functions over the surface queries so it can be checked without a GPU.

use ash::vk;
use lumen_gfx::lumen::device::{Extent2D, SwapchainInfo};
use lumen_gfx::lumen::{Error, Result};
use lumen_gfx::{engine_debug, engine_error};

use crate::vulkan_context::DeviceContext;
use crate::vulkan_format::{vk_error, vk_to_color_format, vk_to_extent};

/// Swapchain negotiation inputs taken from the engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwapchainSettings {
    pub vsync: bool,
    pub preferred_image_count: Option<u32>,
}

/// Swapchain handle, its images and (once created) their views
pub(crate) struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub views: Vec<vk::ImageView>,
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
}

impl Swapchain {
    /// Negotiate and create the swapchain
    ///
    /// Image views are created separately by `create_image_views()`.
    pub(crate) fn create(
        context: &DeviceContext,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        swapchain_loader: &ash::khr::swapchain::Device,
        drawable: Extent2D,
        settings: SwapchainSettings,
    ) -> Result<Self> {
        unsafe {
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(context.physical_device, surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;
            let formats = surface_loader
                .get_physical_device_surface_formats(context.physical_device, surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;
            let present_modes = surface_loader
                .get_physical_device_surface_present_modes(context.physical_device, surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;

            let surface_format = choose_surface_format(&formats).ok_or_else(|| {
                engine_error!("lumen::swapchain", "Surface reports no formats");
                Error::UnsupportedFormat("Surface reports no formats".to_string())
            })?;
            let present_mode = choose_present_mode(&present_modes, settings.vsync);
            let image_count = choose_image_count(&capabilities, settings.preferred_image_count);
            let extent = choose_extent(&capabilities, drawable);

            let queue_families = [context.graphics_queue_family, context.present_queue_family];
            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true);

            create_info = if context.graphics_queue_family != context.present_queue_family {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&queue_families)
            } else {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            };

            let handle = swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| vk_error("vkCreateSwapchainKHR", e))?;

            let images = match swapchain_loader.get_swapchain_images(handle) {
                Ok(images) => images,
                Err(e) => {
                    swapchain_loader.destroy_swapchain(handle, None);
                    return Err(vk_error("vkGetSwapchainImagesKHR", e));
                }
            };

            engine_debug!("lumen::swapchain", "Swapchain created: {} images, {:?}, {:?}, {}x{}",
                images.len(), surface_format.format, present_mode, extent.width, extent.height);

            Ok(Self {
                handle,
                images,
                views: Vec::new(),
                surface_format,
                present_mode,
                extent,
            })
        }
    }

    /// Create one color view per swapchain image
    pub(crate) fn create_image_views(&mut self, context: &DeviceContext) -> Result<()> {
        let mut views = Vec::with_capacity(self.images.len());

        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.surface_format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            match unsafe { context.device.create_image_view(&create_info, None) } {
                Ok(view) => views.push(view),
                Err(e) => {
                    for view in views {
                        unsafe { context.device.destroy_image_view(view, None) };
                    }
                    return Err(vk_error("vkCreateImageView (swapchain)", e));
                }
            }
        }

        self.views = views;
        Ok(())
    }

    /// Release views first, then the swapchain handle
    ///
    /// Images belong to the presentation engine and are not destroyed.
    pub(crate) fn destroy(&mut self, context: &DeviceContext, swapchain_loader: &ash::khr::swapchain::Device) {
        unsafe {
            for view in self.views.drain(..) {
                context.device.destroy_image_view(view, None);
            }
            swapchain_loader.destroy_swapchain(self.handle, None);
        }
        self.handle = vk::SwapchainKHR::null();
        self.images.clear();
    }

    pub(crate) fn info(&self) -> SwapchainInfo {
        SwapchainInfo {
            image_count: self.images.len(),
            format: vk_to_color_format(self.surface_format.format),
            extent: vk_to_extent(self.extent),
        }
    }
}

/// Prefer B8G8R8A8_SRGB with sRGB non-linear color space, else the first reported
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// FIFO when vsync is on, else MAILBOX, then IMMEDIATE, then FIFO
pub(crate) fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR, preferred: Option<u32>) -> u32 {
    let wanted = preferred.unwrap_or(capabilities.min_image_count + 1);
    let wanted = wanted.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        wanted.min(capabilities.max_image_count)
    } else {
        wanted
    }
}

/// Surface-reported extent, or the drawable size clamped to the surface limits
/// when the surface leaves the choice to the swapchain (`u32::MAX`)
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, drawable: Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: drawable.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: drawable.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
