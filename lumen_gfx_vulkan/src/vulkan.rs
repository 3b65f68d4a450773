/// VulkanDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Owns the instance, surface, device context and every swapchain-dependent
/// object (swapchain, image views, depth target, render pass, framebuffers,
/// frame command pools). The frame driver decides when each is created or
/// destroyed; this type only executes.

use ash::vk;
use lumen_gfx::lumen::device::{
    AcquiredImage, ClearValue, DepthFormat, DepthInfo, Extent2D, FrameSync, GraphicsDevice,
    MainPassDesc, PipelineStages, PresentStatus, Rect2D, SwapchainInfo, Viewport,
};
use lumen_gfx::lumen::{Config, Error, Result};
use lumen_gfx::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use std::ffi::CString;
use std::fmt::Debug;

#[cfg(feature = "vulkan-validation")]
use crate::debug::DebugMessenger;
use crate::vulkan_context::{driver_string, DeviceContext};
use crate::vulkan_depth::{supports_depth_attachment, DepthResources};
use crate::vulkan_format::{clear_value_to_vk, extent_to_vk, rect_to_vk, stages_to_vk, viewport_to_vk, vk_error};
use crate::vulkan_frame::{create_frame_objects, destroy_frame_objects};
use crate::vulkan_frame_buffer::{create_framebuffers, destroy_framebuffers};
use crate::vulkan_render_pass::create_render_pass;
use crate::vulkan_swapchain::{Swapchain, SwapchainSettings};

#[cfg(feature = "vulkan-validation")]
const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

fn init_error(what: &str, e: impl Debug) -> Error {
    engine_error!("lumen::vulkan", "{}: {:?}", what, e);
    Error::InitializationFailed(format!("{}: {:?}", what, e))
}

fn missing(what: &str) -> Error {
    engine_error!("lumen::vulkan", "{} does not exist", what);
    Error::InvalidResource(format!("{} does not exist", what))
}

fn already_exists(what: &str) -> Error {
    engine_error!("lumen::vulkan", "{} already exists", what);
    Error::InvalidResource(format!("{} already exists", what))
}

/// Vulkan graphics device
pub struct VulkanDevice {
    /// Shared device state (device, queues, allocator, pools, sampler)
    context: DeviceContext,

    swapchain_loader: ash::khr::swapchain::Device,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    settings: SwapchainSettings,

    swapchain: Option<Swapchain>,
    depth: Option<DepthResources>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,

    /// Live frame contexts, keyed by their command buffer
    frames: FxHashMap<vk::CommandBuffer, (FrameSync<VulkanDevice>, vk::CommandPool)>,

    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<DebugMessenger>,

    instance: ash::Instance,

    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
}

impl VulkanDevice {
    /// Bootstrap Vulkan for a window
    ///
    /// Creates the instance (with validation when enabled and compiled in),
    /// the surface, picks the first physical device with a graphics and a
    /// present queue, and creates the logical device with `VK_KHR_swapchain`.
    /// The swapchain itself is created later by the frame driver.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_error("Failed to load Vulkan library", e))?;

            let validation = validation_enabled(&entry, config);

            let app_name = CString::new(config.app_name.clone())
                .map_err(|e| init_error("Invalid application name", e))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Lumen")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| init_error("Failed to get display handle", e))?;
            #[allow(unused_mut)]
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_error("Failed to get required extensions", e))?
                .to_vec();

            #[allow(unused_mut)]
            let mut layer_names: Vec<*const std::ffi::c_char> = Vec::new();
            #[cfg(feature = "vulkan-validation")]
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(VALIDATION_LAYER.as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_error("Failed to create Vulkan instance", e))?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                Some(DebugMessenger::new(&entry, &instance, config.debug_severity)?)
            } else {
                None
            };

            let window_handle = window.window_handle()
                .map_err(|e| init_error("Failed to get window handle", e))?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_error("Failed to create surface", e))?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let (physical_device, graphics_family, present_family) =
                pick_physical_device(&instance, &surface_loader, surface)?;

            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family)
                    .queue_priorities(&queue_priorities),
            ];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

            let supported = instance.get_physical_device_features(physical_device);
            let device_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(supported.sampler_anisotropy == vk::TRUE);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_error("Failed to create logical device", e))?;

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            let context = DeviceContext::new(
                &instance,
                physical_device,
                device,
                graphics_family,
                present_family,
            )?;

            engine_info!("lumen::vulkan", "Vulkan device created: {} (validation {})",
                context.device_label(), if validation { "on" } else { "off" });

            Ok(Self {
                context,
                swapchain_loader,
                surface_loader,
                surface,
                settings: SwapchainSettings {
                    vsync: config.vsync,
                    preferred_image_count: config.preferred_image_count,
                },
                swapchain: None,
                depth: None,
                render_pass: vk::RenderPass::null(),
                framebuffers: Vec::new(),
                frames: FxHashMap::default(),
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
                instance,
                _entry: entry,
            })
        }
    }

    /// Shared device state
    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    /// Native render pass handle (null until created)
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Present mode of the current swapchain
    pub fn present_mode(&self) -> Option<vk::PresentModeKHR> {
        self.swapchain.as_ref().map(|swapchain| swapchain.present_mode)
    }

    /// Current swapchain state, if one exists
    pub fn swapchain_info(&self) -> Option<SwapchainInfo> {
        self.swapchain.as_ref().map(Swapchain::info)
    }

    /// Current depth target state, if one exists
    pub fn depth_info(&self) -> Option<DepthInfo> {
        self.depth.as_ref().map(DepthResources::info)
    }
}

/// Whether the validation layer will be enabled for this instance
#[cfg(feature = "vulkan-validation")]
fn validation_enabled(entry: &ash::Entry, config: &Config) -> bool {
    if !config.enable_validation {
        return false;
    }
    let available = unsafe { entry.enumerate_instance_layer_properties() }
        .map(|layers| {
            layers.iter().any(|layer| {
                driver_string(&layer.layer_name).as_bytes() == VALIDATION_LAYER.to_bytes()
            })
        })
        .unwrap_or(false);
    if !available {
        engine_warn!("lumen::vulkan", "Validation requested but {:?} is not installed", VALIDATION_LAYER);
    }
    available
}

#[cfg(not(feature = "vulkan-validation"))]
fn validation_enabled(_entry: &ash::Entry, config: &Config) -> bool {
    if config.enable_validation {
        engine_warn!("lumen::vulkan", "Validation requested but the vulkan-validation feature is disabled");
    }
    false
}

/// First physical device with a graphics queue family and a family that can
/// present to `surface`
fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32, u32)> {
    let physical_devices = unsafe { instance.enumerate_physical_devices() }
        .map_err(|e| init_error("Failed to enumerate physical devices", e))?;

    for physical_device in physical_devices {
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

        let graphics = queue_families
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|index| index as u32);

        let supports_present = |index: u32| unsafe {
            surface_loader
                .get_physical_device_surface_support(physical_device, index, surface)
                .unwrap_or(false)
        };

        // Prefer a family that does both
        let present = match graphics {
            Some(index) if supports_present(index) => Some(index),
            _ => (0..queue_families.len() as u32).find(|&index| supports_present(index)),
        };

        if let (Some(graphics), Some(present)) = (graphics, present) {
            let name = unsafe { instance.get_physical_device_properties(physical_device) };
            engine_debug!("lumen::vulkan", "Selected {} (graphics family {}, present family {})",
                driver_string(&name.device_name), graphics, present);
            return Ok((physical_device, graphics, present));
        }
    }

    engine_error!("lumen::vulkan", "No GPU with graphics and present support found");
    Err(Error::InitializationFailed("No GPU with graphics and present support found".to_string()))
}

impl GraphicsDevice for VulkanDevice {
    type Fence = vk::Fence;
    type Semaphore = vk::Semaphore;
    type CommandBuffer = vk::CommandBuffer;

    // ===== Frame resources =====

    fn create_frame_sync(&mut self) -> Result<FrameSync<Self>> {
        let (sync, pool) = create_frame_objects(&self.context.device, self.context.graphics_queue_family)?;
        self.frames.insert(sync.command_buffer, (sync, pool));
        Ok(sync)
    }

    fn destroy_frame_sync(&mut self, sync: &FrameSync<Self>) {
        match self.frames.remove(&sync.command_buffer) {
            Some((owned, pool)) => destroy_frame_objects(&self.context.device, &owned, pool),
            None => engine_warn!("lumen::vulkan", "destroy_frame_sync: unknown frame {:?}", sync.command_buffer),
        }
    }

    // ===== Synchronization =====

    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe {
            self.context
                .device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(|e| vk_error("vkWaitForFences", e))
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe {
            self.context
                .device
                .reset_fences(&[fence])
                .map_err(|e| vk_error("vkResetFences", e))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .device_wait_idle()
                .map_err(|e| vk_error("vkDeviceWaitIdle", e))
        }
    }

    // ===== Swapchain =====

    fn create_swapchain(&mut self, drawable: Extent2D) -> Result<SwapchainInfo> {
        if self.swapchain.is_some() {
            return Err(already_exists("Swapchain"));
        }
        let swapchain = Swapchain::create(
            &self.context,
            &self.surface_loader,
            self.surface,
            &self.swapchain_loader,
            drawable,
            self.settings,
        )?;
        let info = swapchain.info();
        self.swapchain = Some(swapchain);
        Ok(info)
    }

    fn create_image_views(&mut self) -> Result<()> {
        let swapchain = self.swapchain.as_mut().ok_or_else(|| missing("Swapchain"))?;
        swapchain.create_image_views(&self.context)
    }

    fn destroy_swapchain(&mut self) {
        if let Some(mut swapchain) = self.swapchain.take() {
            swapchain.destroy(&self.context, &self.swapchain_loader);
        }
    }

    fn acquire_next_image(&mut self, signal: vk::Semaphore) -> Result<AcquiredImage> {
        let swapchain = self.swapchain.as_ref().ok_or_else(|| missing("Swapchain"))?;
        let acquired = unsafe {
            self.swapchain_loader.acquire_next_image(
                swapchain.handle,
                u64::MAX,
                signal,
                vk::Fence::null(),
            )
        };

        match acquired {
            Ok((image_index, suboptimal)) => Ok(AcquiredImage { image_index, suboptimal }),
            Err(e) => {
                if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                    engine_trace!("lumen::vulkan", "Swapchain out of date during acquire");
                }
                Err(vk_error("vkAcquireNextImageKHR", e))
            }
        }
    }

    fn present(&mut self, image_index: u32, wait: vk::Semaphore) -> Result<PresentStatus> {
        let swapchain = self.swapchain.as_ref().ok_or_else(|| missing("Swapchain"))?;

        let wait_semaphores = [wait];
        let swapchains = [swapchain.handle];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe {
            self.swapchain_loader
                .queue_present(self.context.present_queue, &present_info)
        };

        match presented {
            Ok(false) => Ok(PresentStatus::Optimal),
            Ok(true) => Ok(PresentStatus::Suboptimal),
            Err(e) => {
                if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                    engine_trace!("lumen::vulkan", "Swapchain out of date during present");
                }
                Err(vk_error("vkQueuePresentKHR", e))
            }
        }
    }

    // ===== Depth target =====

    fn supports_depth_format(&self, format: DepthFormat) -> bool {
        supports_depth_attachment(self.context.instance(), self.context.physical_device, format)
    }

    fn create_depth_resources(&mut self, extent: Extent2D, format: DepthFormat) -> Result<DepthInfo> {
        if self.depth.is_some() {
            return Err(already_exists("Depth target"));
        }
        let depth = DepthResources::create(&self.context, extent, format)?;
        let info = depth.info();
        self.depth = Some(depth);
        Ok(info)
    }

    fn destroy_depth_resources(&mut self) {
        if let Some(mut depth) = self.depth.take() {
            depth.destroy(&self.context);
        }
    }

    // ===== Render pass & framebuffers =====

    fn create_render_pass(&mut self, desc: &MainPassDesc) -> Result<()> {
        if self.render_pass != vk::RenderPass::null() {
            return Err(already_exists("Render pass"));
        }
        self.render_pass = create_render_pass(&self.context.device, desc)?;
        Ok(())
    }

    fn destroy_render_pass(&mut self) {
        if self.render_pass != vk::RenderPass::null() {
            unsafe {
                self.context.device.destroy_render_pass(self.render_pass, None);
            }
            self.render_pass = vk::RenderPass::null();
        }
    }

    fn create_framebuffers(&mut self) -> Result<usize> {
        if self.render_pass == vk::RenderPass::null() {
            return Err(missing("Render pass"));
        }
        if !self.framebuffers.is_empty() {
            return Err(already_exists("Framebuffers"));
        }
        let swapchain = self.swapchain.as_ref().ok_or_else(|| missing("Swapchain"))?;
        let depth = self.depth.as_ref().ok_or_else(|| missing("Depth target"))?;
        if swapchain.views.len() != swapchain.images.len() {
            return Err(missing("Swapchain image views"));
        }

        self.framebuffers = create_framebuffers(
            &self.context.device,
            self.render_pass,
            &swapchain.views,
            depth.view,
            swapchain.extent,
        )?;
        Ok(self.framebuffers.len())
    }

    fn destroy_framebuffers(&mut self) {
        destroy_framebuffers(&self.context.device, &mut self.framebuffers);
    }

    // ===== Command recording =====

    fn begin_commands(&self, cmd: vk::CommandBuffer) -> Result<()> {
        let device = &self.context.device;
        unsafe {
            device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error("vkResetCommandBuffer", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(cmd, &begin_info)
                .map_err(|e| vk_error("vkBeginCommandBuffer", e))
        }
    }

    fn end_commands(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.context
                .device
                .end_command_buffer(cmd)
                .map_err(|e| vk_error("vkEndCommandBuffer", e))
        }
    }

    fn cmd_begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        image_index: u32,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) {
        let Some(&framebuffer) = self.framebuffers.get(image_index as usize) else {
            engine_error!("lumen::vulkan", "No framebuffer for swapchain image {}", image_index);
            return;
        };

        let clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: extent_to_vk(extent),
            })
            .clear_values(&clear_values);

        unsafe {
            self.context
                .device
                .cmd_begin_render_pass(cmd, &begin_info, vk::SubpassContents::INLINE);
        }
    }

    fn cmd_set_viewport(&self, cmd: vk::CommandBuffer, viewport: &Viewport) {
        unsafe {
            self.context
                .device
                .cmd_set_viewport(cmd, 0, &[viewport_to_vk(viewport)]);
        }
    }

    fn cmd_set_scissor(&self, cmd: vk::CommandBuffer, scissor: &Rect2D) {
        unsafe {
            self.context.device.cmd_set_scissor(cmd, 0, &[rect_to_vk(scissor)]);
        }
    }

    fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer) {
        unsafe {
            self.context.device.cmd_end_render_pass(cmd);
        }
    }

    // ===== Submission =====

    fn submit(
        &self,
        cmd: vk::CommandBuffer,
        wait: vk::Semaphore,
        wait_stages: PipelineStages,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()> {
        let wait_semaphores = [wait];
        let wait_stage_masks = [stages_to_vk(wait_stages)];
        let command_buffers = [cmd];
        let signal_semaphores = [signal];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stage_masks)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.context
                .device
                .queue_submit(self.context.graphics_queue, &[submit_info], fence)
                .map_err(|e| vk_error("vkQueueSubmit", e))
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.context.device.device_wait_idle() {
                engine_error!("lumen::vulkan", "vkDeviceWaitIdle failed during shutdown: {:?}", e);
            }

            // Normally already released by the frame driver
            destroy_framebuffers(&self.context.device, &mut self.framebuffers);
            if let Some(mut depth) = self.depth.take() {
                depth.destroy(&self.context);
            }
            if let Some(mut swapchain) = self.swapchain.take() {
                swapchain.destroy(&self.context, &self.swapchain_loader);
            }
            if self.render_pass != vk::RenderPass::null() {
                self.context.device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
            if !self.frames.is_empty() {
                engine_warn!("lumen::vulkan", "{} frame context(s) still alive at shutdown", self.frames.len());
            }
            for (_, (sync, pool)) in self.frames.drain() {
                destroy_frame_objects(&self.context.device, &sync, pool);
            }

            // Context owns the allocator and the device
            self.context.destroy();

            self.surface_loader.destroy_surface(self.surface, None);

            #[cfg(feature = "vulkan-validation")]
            if let Some(mut messenger) = self.debug_messenger.take() {
                messenger.destroy();
                crate::debug::print_validation_stats_report();
            }

            self.instance.destroy_instance(None);
        }

        engine_debug!("lumen::vulkan", "Vulkan device destroyed");
    }
}
