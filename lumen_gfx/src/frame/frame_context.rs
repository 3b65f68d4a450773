/// Per-frame state owned by the frame ring

use std::fmt;
use crate::graphics_device::{Extent2D, FrameSync, GraphicsDevice};

/// Where a frame context is in its lifecycle
///
/// `Idle -> Recording -> Submitted -> (fence signaled) -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Fence signaled (or never submitted), free to record
    Idle,
    /// Image acquired, command buffer recording
    Recording,
    /// Submitted to the queue, fence pending
    Submitted,
}

/// One of the N in-flight frame contexts
pub struct FrameContext<D: GraphicsDevice> {
    id: usize,
    sync: FrameSync<D>,
    image_index: u32,
    state: FrameState,
}

impl<D: GraphicsDevice> FrameContext<D> {
    pub(crate) fn new(id: usize, sync: FrameSync<D>) -> Self {
        Self {
            id,
            sync,
            image_index: 0,
            state: FrameState::Idle,
        }
    }

    /// Stable index of this context in the ring
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn sync(&self) -> &FrameSync<D> {
        &self.sync
    }

    /// Swapchain image targeted by the last acquire
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub(crate) fn begin_recording(&mut self, image_index: u32) {
        self.image_index = image_index;
        self.state = FrameState::Recording;
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.state = FrameState::Submitted;
    }

    pub(crate) fn mark_idle(&mut self) {
        self.state = FrameState::Idle;
    }
}

impl<D: GraphicsDevice> fmt::Debug for FrameContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameContext")
            .field("id", &self.id)
            .field("image_index", &self.image_index)
            .field("state", &self.state)
            .field("sync", &self.sync)
            .finish()
    }
}

/// Token for the frame being recorded, returned by `FrameDriver::frame_get`
///
/// It is consumed by `frame_submit`, so a frame can only be submitted once.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<C> {
    pub(crate) id: usize,
    pub(crate) image_index: u32,
    pub(crate) command_buffer: C,
    pub(crate) extent: Extent2D,
}

impl<C: Copy> Frame<C> {
    /// Frame context index in `0..N`
    pub fn id(&self) -> usize {
        self.id
    }

    /// Acquired swapchain image
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Command buffer to record draw calls into (inside the main pass)
    pub fn command_buffer(&self) -> C {
        self.command_buffer
    }

    /// Swapchain extent at acquire time
    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}
