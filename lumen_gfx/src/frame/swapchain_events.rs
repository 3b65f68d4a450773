/// Swapchain lifecycle notifications
///
/// Anything holding swapchain-sized resources (post-processing targets, UI
/// overlays) registers an observer on the frame driver and rebuilds them
/// between the two callbacks.

use crate::graphics_device::SwapchainInfo;

pub trait SwapchainObserver {
    /// Called before the old swapchain and everything sized to it is destroyed.
    /// The device is idle at this point.
    fn on_swapchain_destroy(&mut self);

    /// Called once the new swapchain, depth target and framebuffers exist
    fn on_swapchain_create(&mut self, info: &SwapchainInfo);
}

/// Ordered list of observers; notified in registration order
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn SwapchainObserver>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Box<dyn SwapchainObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify_destroy(&mut self) {
        for observer in self.observers.iter_mut() {
            observer.on_swapchain_destroy();
        }
    }

    pub fn notify_create(&mut self, info: &SwapchainInfo) {
        for observer in self.observers.iter_mut() {
            observer.on_swapchain_create(info);
        }
    }
}
