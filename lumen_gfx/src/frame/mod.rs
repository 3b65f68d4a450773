/// Frame module - frame ring, per-image fences and the frame driver

pub mod frame_context;
pub mod frame_ring;
pub mod image_fences;
pub mod surface;
pub mod swapchain_events;
pub mod frame_driver;

pub use frame_context::*;
pub use frame_ring::*;
pub use image_fences::*;
pub use surface::*;
pub use swapchain_events::*;
pub use frame_driver::*;
