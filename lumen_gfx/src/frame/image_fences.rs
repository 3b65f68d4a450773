/// Per-image fence table
///
/// With N frames in flight and M swapchain images the presentation engine may
/// hand out an image that a different frame context submitted into and the
/// GPU has not finished with. The table remembers, per image, which frame's
/// fence last targeted it so that frame can be waited on first.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImageFence<F> {
    fence: F,
    frame_id: usize,
}

#[derive(Debug, Clone)]
pub struct ImageFenceTable<F> {
    slots: Vec<Option<ImageFence<F>>>,
}

impl<F: Copy + PartialEq> ImageFenceTable<F> {
    pub fn new(image_count: usize) -> Self {
        Self { slots: vec![None; image_count] }
    }

    /// Drop all entries and resize for a new swapchain
    pub fn reset(&mut self, image_count: usize) {
        self.slots.clear();
        self.slots.resize(image_count, None);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fence to wait on before `frame_id` may use `image_index`, if another
    /// frame context targeted it last.
    pub fn pending(&self, image_index: u32, frame_id: usize) -> Result<Option<F>> {
        let slot = self.slot(image_index)?;
        Ok(slot
            .filter(|entry| entry.frame_id != frame_id)
            .map(|entry| entry.fence))
    }

    /// Record that `frame_id`'s fence now guards `image_index`
    pub fn record(&mut self, image_index: u32, fence: F, frame_id: usize) -> Result<()> {
        self.slot(image_index)?;
        self.slots[image_index as usize] = Some(ImageFence { fence, frame_id });
        Ok(())
    }

    /// Fence recorded for the image, if any
    pub fn fence(&self, image_index: u32) -> Option<F> {
        self.slots
            .get(image_index as usize)
            .copied()
            .flatten()
            .map(|entry| entry.fence)
    }

    fn slot(&self, image_index: u32) -> Result<Option<ImageFence<F>>> {
        self.slots.get(image_index as usize).copied().ok_or_else(|| {
            Error::InvalidResource(format!(
                "image index {} out of range ({} images)",
                image_index,
                self.slots.len()
            ))
        })
    }
}

#[cfg(test)]
#[path = "image_fences_tests.rs"]
mod tests;
