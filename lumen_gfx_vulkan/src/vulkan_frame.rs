/// Per-frame command pool, command buffer and synchronization objects

use ash::vk;
use lumen_gfx::lumen::device::FrameSync;
use lumen_gfx::lumen::{Error, Result};

use crate::vulkan::VulkanDevice;
use crate::vulkan_format::vk_error;

/// Create the objects of one frame context
///
/// Returns the sync set handed to the frame ring together with the pool the
/// command buffer was allocated from. Everything created before a failure is
/// released again.
pub(crate) fn create_frame_objects(
    device: &ash::Device,
    queue_family: u32,
) -> Result<(FrameSync<VulkanDevice>, vk::CommandPool)> {
    unsafe {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(
                vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER
                    | vk::CommandPoolCreateFlags::TRANSIENT,
            );
        let pool = device
            .create_command_pool(&pool_info, None)
            .map_err(|e| vk_error("vkCreateCommandPool (frame)", e))?;

        // Destroying the pool frees its command buffer
        let mut guard = PartialFrame { device, pool, semaphores: Vec::new() };

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = device
            .allocate_command_buffers(&alloc_info)
            .map_err(|e| vk_error("vkAllocateCommandBuffers (frame)", e))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::BackendError("No frame command buffer returned".to_string()))?;

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let image_acquired = device
            .create_semaphore(&semaphore_info, None)
            .map_err(|e| vk_error("vkCreateSemaphore (image acquired)", e))?;
        guard.semaphores.push(image_acquired);
        let render_finished = device
            .create_semaphore(&semaphore_info, None)
            .map_err(|e| vk_error("vkCreateSemaphore (render finished)", e))?;
        guard.semaphores.push(render_finished);

        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let in_flight = device
            .create_fence(&fence_info, None)
            .map_err(|e| vk_error("vkCreateFence (in flight)", e))?;

        guard.disarm();

        Ok((
            FrameSync {
                command_buffer,
                image_acquired,
                render_finished,
                in_flight,
            },
            pool,
        ))
    }
}

/// Destroy the objects of one frame context
///
/// The device must be idle.
pub(crate) fn destroy_frame_objects(
    device: &ash::Device,
    sync: &FrameSync<VulkanDevice>,
    pool: vk::CommandPool,
) {
    unsafe {
        device.destroy_fence(sync.in_flight, None);
        device.destroy_semaphore(sync.render_finished, None);
        device.destroy_semaphore(sync.image_acquired, None);
        device.destroy_command_pool(pool, None);
    }
}

/// Cleans up a frame that failed half way through creation
struct PartialFrame<'a> {
    device: &'a ash::Device,
    pool: vk::CommandPool,
    semaphores: Vec<vk::Semaphore>,
}

impl PartialFrame<'_> {
    fn disarm(&mut self) {
        self.pool = vk::CommandPool::null();
        self.semaphores.clear();
    }
}

impl Drop for PartialFrame<'_> {
    fn drop(&mut self) {
        if self.pool == vk::CommandPool::null() {
            return;
        }
        unsafe {
            for semaphore in self.semaphores.drain(..) {
                self.device.destroy_semaphore(semaphore, None);
            }
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}
