/// Graphics device module - the backend seam and the types it exchanges

// Module declarations
pub mod graphics_device;
pub mod format;
pub mod types;
pub mod render_pass;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use format::*;
pub use types::*;
pub use render_pass::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
