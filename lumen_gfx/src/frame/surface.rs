//! Window-side collaborators of the frame driver

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::graphics_device::Extent2D;

/// The window the swapchain presents into, as seen by the frame driver
///
/// Only two things are needed: the current drawable size in pixels, and a way
/// to block until something happens while the window is minimized.
pub trait DrawableSurface {
    /// Current drawable size; zero in either dimension while minimized
    fn drawable_size(&self) -> Extent2D;

    /// Block until the windowing system has new events (or a short while)
    fn wait_events(&self);
}

/// Pending-resize flag shared between the windowing callbacks and the driver
///
/// Cloning shares the same flag, so an event-loop callback (possibly on
/// another thread) can raise it and the driver consumes it after the next
/// present.
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag(Arc<AtomicBool>);

impl ResizeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}
