/// Allocator binding - gpu-allocator backed image memory

use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use lumen_gfx::lumen::device::{Extent2D, MemoryUsage};
use lumen_gfx::lumen::{Error, Result};
use lumen_gfx::{engine_error, engine_warn};

use crate::vulkan_context::DeviceContext;
use crate::vulkan_format::{extent_to_vk, memory_location, vk_error};

pub(crate) fn create_allocator(
    instance: &ash::Instance,
    device: &ash::Device,
    physical_device: vk::PhysicalDevice,
) -> Result<Allocator> {
    Allocator::new(&AllocatorCreateDesc {
        instance: instance.clone(),
        device: device.clone(),
        physical_device,
        debug_settings: Default::default(),
        buffer_device_address: false,
        allocation_sizes: Default::default(),
    })
    .map_err(|e| {
        engine_error!("lumen::vulkan", "Failed to create GPU allocator: {:?}", e);
        Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
    })
}

/// Parameters of a single-mip, single-layer 2D image
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc<'a> {
    pub name: &'a str,
    pub extent: Extent2D,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub memory: MemoryUsage,
}

/// A 2D image and the allocation backing it
pub struct AllocatedImage {
    pub image: vk::Image,
    allocation: Option<Allocation>,
}

impl AllocatedImage {
    pub fn create(context: &DeviceContext, desc: &ImageDesc) -> Result<Self> {
        let device = &context.device;

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: desc.extent.width,
                height: desc.extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(desc.format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(desc.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        unsafe {
            let image = device
                .create_image(&image_info, None)
                .map_err(|e| vk_error("vkCreateImage", e))?;

            let requirements = device.get_image_memory_requirements(image);

            let allocation = context.allocator()?.allocate(&AllocationCreateDesc {
                name: desc.name,
                requirements,
                location: memory_location(desc.memory),
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_image(image, None);
                    let extent = extent_to_vk(desc.extent);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("lumen::vulkan", "Out of GPU memory for {} ({}x{}, {:.2} MB): {:?}",
                        desc.name, extent.width, extent.height, size_mb, e);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                device.destroy_image(image, None);
                free_allocation(context, allocation);
                return Err(vk_error("vkBindImageMemory", e));
            }

            Ok(Self {
                image,
                allocation: Some(allocation),
            })
        }
    }

    /// Destroy the image and return its memory to the allocator
    ///
    /// Calling it again is a no-op.
    pub fn destroy(&mut self, context: &DeviceContext) {
        let Some(allocation) = self.allocation.take() else {
            return;
        };

        unsafe {
            context.device.destroy_image(self.image, None);
        }
        self.image = vk::Image::null();

        free_allocation(context, allocation);
    }
}

fn free_allocation(context: &DeviceContext, allocation: Allocation) {
    match context.allocator() {
        Ok(mut allocator) => {
            report_free(allocator.free(allocation));
        }
        Err(_) => engine_warn!("lumen::vulkan", "Image allocation leaked (allocator unavailable)"),
    }
}

/// Returns false (after logging) when the allocator refused the free.
fn report_free(result: gpu_allocator::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            engine_warn!("lumen::vulkan", "Failed to free image allocation: {:?}", e);
            false
        }
    }
}
