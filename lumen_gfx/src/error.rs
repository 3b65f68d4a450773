//! Error types for the Lumen graphics core
//!
//! Every device call returns a `Result`. Only swapchain staleness is
//! recoverable; the frame driver absorbs it by rebuilding the swapchain.
//! Anything else reaching the top level is handed to [`crate::fatal`].

use std::fmt;

/// Result type for Lumen graphics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen graphics errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failed with an unexpected code)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Initialization failed (instance, device, swapchain, frame ring)
    InitializationFailed(String),

    /// No candidate format is supported by the device
    UnsupportedFormat(String),

    /// Invalid resource or API misuse (wrong frame token, bad image index)
    InvalidResource(String),

    /// The swapchain no longer matches the surface and must be recreated
    SwapchainOutOfDate,
}

impl Error {
    /// Returns true if the frame driver can recover from this error by
    /// recreating the swapchain.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SwapchainOutOfDate)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
