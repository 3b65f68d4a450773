/*!
# Lumen GFX - Vulkan Backend

Vulkan implementation of the `lumen_gfx`
[`GraphicsDevice`](lumen_gfx::lumen::device::GraphicsDevice) seam.

This crate uses the Ash library for Vulkan bindings, gpu-allocator for image
memory, and ash-window / raw-window-handle to create the presentation surface
for a winit window.

```no_run
use std::sync::Arc;
use lumen_gfx::lumen::Config;
use winit::window::Window;

fn run(window: Arc<Window>) -> lumen_gfx::lumen::Result<()> {
    let mut driver = lumen_gfx_vulkan::frame_driver_for_window(window, &Config::default())?;
    let frame = driver.frame_get();
    driver.mainpass_begin(&frame);
    driver.mainpass_end(&frame);
    driver.frame_submit(frame);
    Ok(())
}
```
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_allocator;
mod vulkan_format;
mod vulkan_swapchain;
mod vulkan_depth;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_frame;
mod vulkan_window;
#[cfg(feature = "vulkan-validation")]
mod debug;

use lumen_gfx::lumen::frame::FrameDriver;
use lumen_gfx::lumen::{Config, Result};
use std::sync::Arc;
use winit::window::Window;

pub use vulkan::VulkanDevice;
pub use vulkan_context::DeviceContext;
pub use vulkan_allocator::{AllocatedImage, ImageDesc};
pub use vulkan_window::WinitSurface;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{validation_stats, print_validation_stats_report, ValidationStats};

/// Create a Vulkan device for `window` and a frame driver presenting into it
pub fn frame_driver_for_window(window: Arc<Window>, config: &Config) -> Result<FrameDriver<VulkanDevice>> {
    let device = VulkanDevice::new(window.as_ref(), config)?;
    FrameDriver::new(device, Arc::new(WinitSurface::new(window)), config)
}
