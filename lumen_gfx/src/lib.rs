/*!
# Lumen GFX

Backend-agnostic frame and swapchain orchestration for the Lumen renderer.

The crate drives the per-frame acquire, record, submit, present cycle over a
[`GraphicsDevice`](graphics_device::GraphicsDevice) implemented by a backend
crate (`lumen_gfx_vulkan`). It owns the decisions a backend should not make on
its own: which fence to wait on before reusing a frame context or a swapchain
image, when the swapchain is stale, and the order in which the swapchain, the
depth target and the framebuffers are torn down and rebuilt.

## Architecture

- **FrameDriver**: acquire / main pass / submit / present state machine
- **FrameRing**: N in-flight frame contexts (`FRAMES_IN_FLIGHT` by default)
- **ImageFenceTable**: last fence that targeted each swapchain image
- **SwapchainObserver**: notified around every swapchain recreation
- **GraphicsDevice**: the backend seam
*/

// Internal modules
mod error;
mod config;
pub mod fatal;
pub mod log;
pub mod graphics_device;
pub mod frame;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Fatal error policy
    pub use crate::fatal::{crash, OrCrash};

    // Configuration
    pub use crate::config::{Config, DebugSeverity};

    // Logging sub-module (types and logger control, NOT macros)
    pub mod log {
        pub use crate::log::{
            Logger, LogEntry, LogSeverity, DefaultLogger,
            set_logger, reset_logger, emit, emit_detailed,
        };
    }

    // Device seam and the types it exchanges
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Frame ring and driver
    pub mod frame {
        pub use crate::frame::*;
    }
}
