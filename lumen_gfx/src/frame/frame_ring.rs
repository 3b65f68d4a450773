/// Fixed ring of N in-flight frame contexts

use crate::error::{Error, Result};
use crate::frame::FrameContext;
use crate::graphics_device::GraphicsDevice;

/// Default number of frames the CPU may record ahead of the GPU
pub const FRAMES_IN_FLIGHT: usize = 2;

/// N frame contexts visited round-robin
///
/// Contexts are created once and live until the ring is destroyed; swapchain
/// recreation never touches them.
pub struct FrameRing<D: GraphicsDevice, const N: usize = FRAMES_IN_FLIGHT> {
    frames: [FrameContext<D>; N],
    current: usize,
}

impl<D: GraphicsDevice, const N: usize> FrameRing<D, N> {
    pub fn new(device: &mut D) -> Result<Self> {
        if N == 0 {
            crate::engine_error!("lumen::frame", "Frame ring needs at least one frame");
            return Err(Error::InitializationFailed(
                "frame ring needs at least one frame".to_string(),
            ));
        }

        let mut contexts = Vec::with_capacity(N);
        for id in 0..N {
            match device.create_frame_sync() {
                Ok(sync) => contexts.push(FrameContext::new(id, sync)),
                Err(e) => {
                    for context in &contexts {
                        device.destroy_frame_sync(context.sync());
                    }
                    return Err(e);
                }
            }
        }

        let frames: [FrameContext<D>; N] = contexts
            .try_into()
            .map_err(|_| Error::InitializationFailed("frame ring size mismatch".to_string()))?;

        crate::engine_debug!("lumen::frame", "Created {} frame contexts", N);

        Ok(Self { frames, current: 0 })
    }

    /// Index of the context the next frame uses
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &FrameContext<D> {
        &self.frames[self.current]
    }

    pub fn current_mut(&mut self) -> &mut FrameContext<D> {
        &mut self.frames[self.current]
    }

    pub fn get(&self, id: usize) -> Option<&FrameContext<D>> {
        self.frames.get(id)
    }

    /// `current = (current + 1) % N`
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % N;
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameContext<D>> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Release every context's objects. The device must be idle.
    pub fn destroy(&self, device: &mut D) {
        for frame in self.frames.iter() {
            device.destroy_frame_sync(frame.sync());
        }
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
