/// DeviceContext - Process-wide Vulkan device state
///
/// Contains everything the swapchain, depth and frame code borrow:
/// - Logical device and the queues with their family indices
/// - Physical-device properties
/// - Allocator for image memory
/// - Shared transient command pool for one-shot submissions
/// - Descriptor pool and default texture sampler

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use lumen_gfx::lumen::{Error, Result};
use lumen_gfx::{engine_debug, engine_error};
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

use crate::vulkan_allocator::create_allocator;
use crate::vulkan_format::vk_error;

/// Descriptor pool sizing: per-type descriptor count and total set count
const DESCRIPTORS_PER_TYPE: u32 = 32;
const MAX_DESCRIPTOR_SETS: u32 = 64;

/// Shared Vulkan device state.
///
/// Created once after the logical device, destroyed once by
/// `VulkanDevice::drop()` after every dependent resource is gone. Components
/// borrow it; none own it.
pub struct DeviceContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// Selected physical device and its properties
    pub physical_device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Graphics queue and its family index
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Present queue and its family index (may equal the graphics queue)
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,

    /// Command pool for one-shot submissions
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub transient_command_pool: Mutex<vk::CommandPool>,

    /// Descriptor pool shared by higher layers
    pub descriptor_pool: vk::DescriptorPool,

    /// Default sampler (linear, repeat, max anisotropy when supported)
    pub texture_sampler: vk::Sampler,

    /// Vulkan instance (kept for queries, destroyed by VulkanDevice)
    instance: ash::Instance,
}

impl DeviceContext {
    /// Build the context around a freshly created logical device
    ///
    /// # Safety
    ///
    /// `device` must have been created from `physical_device` with one queue
    /// in each of the two given families.
    pub(crate) unsafe fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue_family: u32,
        present_queue_family: u32,
    ) -> Result<Self> {
        let properties = instance.get_physical_device_properties(physical_device);
        let graphics_queue = device.get_device_queue(graphics_queue_family, 0);
        let present_queue = device.get_device_queue(present_queue_family, 0);

        let allocator = create_allocator(instance, &device, physical_device)?;

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(graphics_queue_family)
            .flags(
                vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            );
        let transient_command_pool = device
            .create_command_pool(&pool_info, None)
            .map_err(|e| vk_error("vkCreateCommandPool (transient)", e))?;

        let descriptor_pool = create_descriptor_pool(&device)?;
        let anisotropy = instance.get_physical_device_features(physical_device).sampler_anisotropy == vk::TRUE;
        let texture_sampler = create_default_sampler(&device, &properties, anisotropy)?;

        let context = Self {
            device,
            physical_device,
            properties,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            present_queue,
            present_queue_family,
            transient_command_pool: Mutex::new(transient_command_pool),
            descriptor_pool,
            texture_sampler,
            instance: instance.clone(),
        };

        engine_debug!("lumen::vulkan", "Device context ready: {}", context.device_label());
        Ok(context)
    }

    /// Vulkan instance the device belongs to
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Human readable device summary, e.g. "DISCRETE NVIDIA RTX 3080 Vulkan 1.3"
    pub fn device_label(&self) -> String {
        let name = driver_string(&self.properties.device_name);
        device_label(self.properties.device_type, &name, self.properties.api_version)
    }

    /// Lock the allocator
    pub fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator.lock().map_err(|_| {
            engine_error!("lumen::vulkan", "Allocator mutex poisoned");
            Error::BackendError("Allocator mutex poisoned".to_string())
        })
    }

    /// Record, submit and wait for a one-shot command buffer
    ///
    /// The buffer comes from the transient pool and is freed before returning.
    pub fn submit_one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let pool = self.transient_command_pool.lock().map_err(|_| {
            engine_error!("lumen::vulkan", "Transient command pool mutex poisoned");
            Error::BackendError("Transient command pool mutex poisoned".to_string())
        })?;

        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| vk_error("vkAllocateCommandBuffers (one-shot)", e))?
                .into_iter()
                .next()
                .ok_or_else(|| Error::BackendError("No one-shot command buffer returned".to_string()))?;

            let result = self.record_and_wait(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn record_and_wait<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| vk_error("vkBeginCommandBuffer (one-shot)", e))?;

        record(&self.device, command_buffer);

        self.device
            .end_command_buffer(command_buffer)
            .map_err(|e| vk_error("vkEndCommandBuffer (one-shot)", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        self.device
            .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
            .map_err(|e| vk_error("vkQueueSubmit (one-shot)", e))?;
        self.device
            .queue_wait_idle(self.graphics_queue)
            .map_err(|e| vk_error("vkQueueWaitIdle (one-shot)", e))
    }

    /// Release everything the context created, then the logical device
    ///
    /// # Safety
    ///
    /// The device must be idle and every resource allocated through this
    /// context must already be destroyed. Must be called exactly once.
    pub(crate) unsafe fn destroy(&mut self) {
        self.device.destroy_sampler(self.texture_sampler, None);
        self.device.destroy_descriptor_pool(self.descriptor_pool, None);
        if let Ok(pool) = self.transient_command_pool.lock() {
            self.device.destroy_command_pool(*pool, None);
        }

        // Allocator must go before the device
        ManuallyDrop::drop(&mut self.allocator);

        self.device.destroy_device(None);
    }
}

fn create_descriptor_pool(device: &ash::Device) -> Result<vk::DescriptorPool> {
    let pool_sizes = [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: DESCRIPTORS_PER_TYPE,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: DESCRIPTORS_PER_TYPE,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
            descriptor_count: DESCRIPTORS_PER_TYPE,
        },
    ];

    let pool_info = vk::DescriptorPoolCreateInfo::default()
        .pool_sizes(&pool_sizes)
        .max_sets(MAX_DESCRIPTOR_SETS)
        .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET);

    unsafe {
        device
            .create_descriptor_pool(&pool_info, None)
            .map_err(|e| vk_error("vkCreateDescriptorPool", e))
    }
}

fn create_default_sampler(
    device: &ash::Device,
    properties: &vk::PhysicalDeviceProperties,
    anisotropy: bool,
) -> Result<vk::Sampler> {
    let max_anisotropy = if anisotropy { properties.limits.max_sampler_anisotropy } else { 1.0 };

    let sampler_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(anisotropy)
        .max_anisotropy(max_anisotropy)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0);

    unsafe {
        device
            .create_sampler(&sampler_info, None)
            .map_err(|e| vk_error("vkCreateSampler", e))
    }
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {
    match device_type {
        vk::PhysicalDeviceType::VIRTUAL_GPU => "VIRTUAL",
        vk::PhysicalDeviceType::DISCRETE_GPU => "DISCRETE",
        vk::PhysicalDeviceType::CPU => "CPU",
        vk::PhysicalDeviceType::INTEGRATED_GPU => "INTEGRATED",
        _ => "OTHER",
    }
}

pub(crate) fn device_label(device_type: vk::PhysicalDeviceType, name: &str, api_version: u32) -> String {
    format!(
        "{} {} Vulkan {}.{}",
        device_type_name(device_type),
        name,
        vk::api_version_major(api_version),
        vk::api_version_minor(api_version),
    )
}

/// Read a fixed-size, NUL-terminated name reported by the driver
pub(crate) fn driver_string(raw: &[std::ffi::c_char]) -> String {
    // SAFETY: c_char and u8 share size and alignment
    let bytes = unsafe { std::slice::from_raw_parts(raw.as_ptr().cast::<u8>(), raw.len()) };
    CStr::from_bytes_until_nul(bytes)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
