/// GraphicsDevice trait - the seam between the frame driver and a backend
///
/// The frame driver owns the frame lifecycle (which fence to wait on, when to
/// rebuild the swapchain, in what order). The device only executes: it owns
/// the native swapchain, depth target, render pass and framebuffers, and
/// exposes them through the narrow set of calls below.

use std::fmt;
use crate::error::Result;
use crate::graphics_device::{
    AcquiredImage, ClearValue, DepthFormat, DepthInfo, Extent2D, MainPassDesc,
    PipelineStages, PresentStatus, Rect2D, SwapchainInfo, Viewport,
};

/// Synchronization objects and command buffer owned by one frame context
pub struct FrameSync<D: GraphicsDevice + ?Sized> {
    /// Primary command buffer, from a pool dedicated to this frame
    pub command_buffer: D::CommandBuffer,
    /// Signaled by the presentation engine when the acquired image is ready
    pub image_acquired: D::Semaphore,
    /// Signaled by the queue when rendering into the image is done
    pub render_finished: D::Semaphore,
    /// Signaled when the frame's submission completes (created signaled)
    pub in_flight: D::Fence,
}

impl<D: GraphicsDevice + ?Sized> Clone for FrameSync<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: GraphicsDevice + ?Sized> Copy for FrameSync<D> {}

impl<D: GraphicsDevice + ?Sized> fmt::Debug for FrameSync<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSync")
            .field("command_buffer", &self.command_buffer)
            .field("image_acquired", &self.image_acquired)
            .field("render_finished", &self.render_finished)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

/// Backend operations driven by the frame driver
///
/// Every fallible call returns `Result`. Out-of-date swapchains are reported as
/// `Error::SwapchainOutOfDate`; suboptimal ones through the returned status.
/// Any other error is unrecoverable.
pub trait GraphicsDevice {
    type Fence: Copy + PartialEq + fmt::Debug;
    type Semaphore: Copy + PartialEq + fmt::Debug;
    type CommandBuffer: Copy + PartialEq + fmt::Debug;

    // ===== Frame resources =====

    /// Create the command buffer and sync objects of one frame context.
    /// The fence must start signaled.
    fn create_frame_sync(&mut self) -> Result<FrameSync<Self>>;

    fn destroy_frame_sync(&mut self, sync: &FrameSync<Self>);

    // ===== Synchronization =====

    /// Block until the fence is signaled (no timeout)
    fn wait_for_fence(&self, fence: Self::Fence) -> Result<()>;

    fn reset_fence(&self, fence: Self::Fence) -> Result<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;

    // ===== Swapchain =====

    /// Create the swapchain for a drawable area of the given size
    fn create_swapchain(&mut self, drawable: Extent2D) -> Result<SwapchainInfo>;

    /// Create one view per swapchain image
    fn create_image_views(&mut self) -> Result<()>;

    /// Destroy the image views, then the swapchain
    fn destroy_swapchain(&mut self);

    /// Acquire the next presentable image, signaling `signal` when it is ready
    fn acquire_next_image(&mut self, signal: Self::Semaphore) -> Result<AcquiredImage>;

    /// Queue the image for presentation once `wait` is signaled
    fn present(&mut self, image_index: u32, wait: Self::Semaphore) -> Result<PresentStatus>;

    // ===== Depth target =====

    fn supports_depth_format(&self, format: DepthFormat) -> bool;

    fn create_depth_resources(&mut self, extent: Extent2D, format: DepthFormat) -> Result<DepthInfo>;

    fn destroy_depth_resources(&mut self);

    // ===== Render pass & framebuffers =====

    fn create_render_pass(&mut self, desc: &MainPassDesc) -> Result<()>;

    fn destroy_render_pass(&mut self);

    /// Create one framebuffer per swapchain image and return how many were made
    fn create_framebuffers(&mut self) -> Result<usize>;

    fn destroy_framebuffers(&mut self);

    // ===== Command recording =====

    /// Reset the buffer and begin one-time-submit recording
    fn begin_commands(&self, cmd: Self::CommandBuffer) -> Result<()>;

    fn end_commands(&self, cmd: Self::CommandBuffer) -> Result<()>;

    fn cmd_begin_render_pass(
        &self,
        cmd: Self::CommandBuffer,
        image_index: u32,
        extent: Extent2D,
        clear_values: &[ClearValue],
    );

    fn cmd_set_viewport(&self, cmd: Self::CommandBuffer, viewport: &Viewport);

    fn cmd_set_scissor(&self, cmd: Self::CommandBuffer, scissor: &Rect2D);

    fn cmd_end_render_pass(&self, cmd: Self::CommandBuffer);

    // ===== Submission =====

    /// Submit one command buffer to the graphics queue
    fn submit(
        &self,
        cmd: Self::CommandBuffer,
        wait: Self::Semaphore,
        wait_stages: PipelineStages,
        signal: Self::Semaphore,
        fence: Self::Fence,
    ) -> Result<()>;
}
