/// winit window as the frame driver's drawable surface

use lumen_gfx::lumen::device::Extent2D;
use lumen_gfx::lumen::frame::DrawableSurface;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use winit::window::Window;

/// Poll interval while the window has no drawable area
const MINIMIZED_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Drawable surface backed by a winit window
///
/// Events are pumped by the application's event loop, so waiting here is a
/// short sleep before the size is queried again. Called on the event-loop
/// thread that sleep never sees the window restored: do not drive frames
/// while the window is minimized. Track `WindowEvent::Resized` to a zero
/// size, or check [`FrameDriver::surface_is_drawable`], and skip the frame.
///
/// [`FrameDriver::surface_is_drawable`]: lumen_gfx::lumen::frame::FrameDriver::surface_is_drawable
#[derive(Clone)]
pub struct WinitSurface {
    window: Arc<Window>,
}

impl WinitSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl DrawableSurface for WinitSurface {
    fn drawable_size(&self) -> Extent2D {
        let size = self.window.inner_size();
        Extent2D::new(size.width, size.height)
    }

    fn wait_events(&self) {
        thread::sleep(MINIMIZED_POLL_INTERVAL);
    }
}
