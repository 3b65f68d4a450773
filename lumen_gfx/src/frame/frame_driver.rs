/// Frame driver - the acquire, record, submit, present cycle
///
/// ```text
/// frame_get()        wait in-flight fence, acquire image, wait image fence,
///                    begin command buffer
/// mainpass_begin()   render pass on the image's framebuffer, viewport, scissor
///   ...user draws...
/// mainpass_end()
/// frame_submit()     end commands, submit, present, recreate if stale, advance
/// ```
///
/// The driver owns the swapchain-dependent resources through the device and
/// rebuilds them in dependency order whenever the swapchain goes stale.
/// Public operations treat every non-staleness failure as fatal; the `try_*`
/// twins return it instead.

use std::sync::Arc;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fatal::OrCrash;
use crate::frame::{
    DrawableSurface, Frame, FrameContext, FrameRing, FrameState, ImageFenceTable,
    ObserverList, ResizeFlag, SwapchainObserver, FRAMES_IN_FLIGHT,
};
use crate::graphics_device::{
    select_depth_format, DepthInfo, GraphicsDevice, MainPassDesc,
    PipelineStages, PresentStatus, Rect2D, SwapchainInfo, Viewport, MAINPASS_CLEAR_VALUES,
};
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "lumen::frame";

pub struct FrameDriver<D: GraphicsDevice, const N: usize = FRAMES_IN_FLIGHT> {
    device: D,
    surface: Arc<dyn DrawableSurface>,
    main_pass: MainPassDesc,
    swapchain: SwapchainInfo,
    depth: DepthInfo,
    framebuffer_count: usize,
    ring: FrameRing<D, N>,
    image_fences: ImageFenceTable<D::Fence>,
    observers: ObserverList,
    resize: ResizeFlag,
    recreations: u64,
}

impl<D: GraphicsDevice, const N: usize> FrameDriver<D, N> {
    /// Build the swapchain, depth target, render pass, framebuffers and the
    /// frame ring on top of an initialized device.
    pub fn new(mut device: D, surface: Arc<dyn DrawableSurface>, config: &Config) -> Result<Self> {
        let mut drawable = surface.drawable_size();
        while drawable.is_empty() {
            surface.wait_events();
            drawable = surface.drawable_size();
        }

        let swapchain = device.create_swapchain(drawable)?;
        device.create_image_views()?;

        let depth_format = select_depth_format(&config.depth_format_candidates, |format| {
            device.supports_depth_format(format)
        })?;

        let main_pass = MainPassDesc::new(swapchain.format, depth_format);
        device.create_render_pass(&main_pass)?;

        let depth = device.create_depth_resources(swapchain.extent, depth_format)?;
        check_depth_extent(&swapchain, &depth)?;
        let framebuffer_count = device.create_framebuffers()?;
        let ring = FrameRing::new(&mut device)?;

        engine_info!(
            SOURCE,
            "Frame driver ready: {}x{}, {} images, {:?} / {:?}, {} frames in flight",
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.image_count,
            swapchain.format,
            depth_format,
            N
        );

        Ok(Self {
            device,
            surface,
            main_pass,
            swapchain,
            depth,
            framebuffer_count,
            ring,
            image_fences: ImageFenceTable::new(swapchain.image_count),
            observers: ObserverList::new(),
            resize: ResizeFlag::new(),
            recreations: 0,
        })
    }

    // ===== Accessors =====

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn swapchain_info(&self) -> SwapchainInfo {
        self.swapchain
    }

    pub fn depth_info(&self) -> DepthInfo {
        self.depth
    }

    pub fn main_pass(&self) -> &MainPassDesc {
        &self.main_pass
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffer_count
    }

    /// Index of the frame context the next `frame_get` uses
    pub fn current_frame(&self) -> usize {
        self.ring.current_index()
    }

    pub fn frame(&self, id: usize) -> Option<&FrameContext<D>> {
        self.ring.get(id)
    }

    pub fn frames_in_flight(&self) -> usize {
        N
    }

    pub fn image_fences(&self) -> &ImageFenceTable<D::Fence> {
        &self.image_fences
    }

    /// False while the window has no drawable area. Callers whose surface
    /// cannot block for events (an event-loop thread) skip frames while false.
    pub fn surface_is_drawable(&self) -> bool {
        !self.surface.drawable_size().is_empty()
    }

    /// Number of swapchain recreations since startup
    pub fn recreation_count(&self) -> u64 {
        self.recreations
    }

    // ===== Notifications =====

    pub fn add_observer(&mut self, observer: Box<dyn SwapchainObserver>) {
        self.observers.add(observer);
    }

    /// Handle the windowing layer can keep to request a resize
    pub fn resize_flag(&self) -> ResizeFlag {
        self.resize.clone()
    }

    /// Request a swapchain rebuild after the next present
    pub fn notify_resize(&self) {
        self.resize.raise();
    }

    // ===== Frame cycle =====

    /// Start a new frame. Terminates the process on unrecoverable errors.
    #[track_caller]
    pub fn frame_get(&mut self) -> Frame<D::CommandBuffer> {
        self.try_frame_get().or_crash(SOURCE, "frame_get failed")
    }

    pub fn try_frame_get(&mut self) -> Result<Frame<D::CommandBuffer>> {
        let frame_id = self.ring.current_index();
        let sync = *self.ring.current().sync();

        if self.ring.current().state() == FrameState::Recording {
            return Err(Error::InvalidResource(format!(
                "frame {} is already recording; submit it before the next frame_get",
                frame_id
            )));
        }

        self.device.wait_for_fence(sync.in_flight)?;
        self.ring.current_mut().mark_idle();

        let acquired = loop {
            match self.device.acquire_next_image(sync.image_acquired) {
                Ok(acquired) => break acquired,
                Err(Error::SwapchainOutOfDate) => {
                    engine_debug!(SOURCE, "Swapchain out of date on acquire, recreating");
                    self.try_recreate_swapchain()?;
                }
                Err(e) => return Err(e),
            }
        };

        if acquired.suboptimal {
            engine_trace!(
                SOURCE,
                "Image {} acquired suboptimal, continuing",
                acquired.image_index
            );
        }

        if let Some(previous) = self.image_fences.pending(acquired.image_index, frame_id)? {
            self.device.wait_for_fence(previous)?;
        }
        self.image_fences.record(acquired.image_index, sync.in_flight, frame_id)?;

        self.device.begin_commands(sync.command_buffer)?;
        self.ring.current_mut().begin_recording(acquired.image_index);

        Ok(Frame {
            id: frame_id,
            image_index: acquired.image_index,
            command_buffer: sync.command_buffer,
            extent: self.swapchain.extent,
        })
    }

    /// Begin the main pass on the frame's image
    #[track_caller]
    pub fn mainpass_begin(&self, frame: &Frame<D::CommandBuffer>) {
        self.try_mainpass_begin(frame).or_crash(SOURCE, "mainpass_begin failed")
    }

    pub fn try_mainpass_begin(&self, frame: &Frame<D::CommandBuffer>) -> Result<()> {
        self.check_recording(frame)?;
        if frame.image_index as usize >= self.framebuffer_count {
            return Err(Error::InvalidResource(format!(
                "no framebuffer for image {} ({} framebuffers)",
                frame.image_index, self.framebuffer_count
            )));
        }

        let extent = self.swapchain.extent;
        let cmd = frame.command_buffer;
        self.device
            .cmd_begin_render_pass(cmd, frame.image_index, extent, &MAINPASS_CLEAR_VALUES);
        self.device.cmd_set_scissor(cmd, &Rect2D::full(extent));
        self.device.cmd_set_viewport(cmd, &Viewport::full(extent));
        Ok(())
    }

    #[track_caller]
    pub fn mainpass_end(&self, frame: &Frame<D::CommandBuffer>) {
        self.try_mainpass_end(frame).or_crash(SOURCE, "mainpass_end failed")
    }

    pub fn try_mainpass_end(&self, frame: &Frame<D::CommandBuffer>) -> Result<()> {
        self.check_recording(frame)?;
        self.device.cmd_end_render_pass(frame.command_buffer);
        Ok(())
    }

    /// Submit and present the frame, then move to the next frame context.
    #[track_caller]
    pub fn frame_submit(&mut self, frame: Frame<D::CommandBuffer>) {
        self.try_frame_submit(frame).or_crash(SOURCE, "frame_submit failed")
    }

    pub fn try_frame_submit(&mut self, frame: Frame<D::CommandBuffer>) -> Result<()> {
        self.check_recording(&frame)?;
        let sync = *self.ring.current().sync();

        self.device.end_commands(sync.command_buffer)?;
        self.device.reset_fence(sync.in_flight)?;
        self.device.submit(
            sync.command_buffer,
            sync.image_acquired,
            PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            sync.render_finished,
            sync.in_flight,
        )?;
        self.ring.current_mut().mark_submitted();

        let stale = match self.device.present(frame.image_index, sync.render_finished) {
            Ok(PresentStatus::Optimal) => false,
            Ok(PresentStatus::Suboptimal) => {
                engine_trace!(SOURCE, "Present reported suboptimal");
                true
            }
            Err(Error::SwapchainOutOfDate) => {
                engine_trace!(SOURCE, "Present reported out of date");
                true
            }
            Err(e) => return Err(e),
        };

        if stale || self.resize.is_pending() {
            self.try_recreate_swapchain()?;
        }

        self.ring.advance();
        Ok(())
    }

    // ===== Swapchain recreation =====

    #[track_caller]
    pub fn recreate_swapchain(&mut self) {
        self.try_recreate_swapchain()
            .or_crash("lumen::swapchain", "swapchain recreation failed")
    }

    /// Rebuild the swapchain and everything sized to it
    pub fn try_recreate_swapchain(&mut self) -> Result<()> {
        let current = self.ring.current();
        if current.state() == FrameState::Recording {
            return Err(Error::InvalidResource(format!(
                "frame {} is recording; submit it before recreating the swapchain",
                current.id()
            )));
        }

        let mut drawable = self.surface.drawable_size();
        while drawable.is_empty() {
            self.surface.wait_events();
            drawable = self.surface.drawable_size();
        }

        self.device.wait_idle()?;
        self.observers.notify_destroy();

        self.device.destroy_framebuffers();
        self.device.destroy_depth_resources();
        self.device.destroy_swapchain();
        self.framebuffer_count = 0;

        let swapchain = self.device.create_swapchain(drawable)?;
        self.device.create_image_views()?;

        if swapchain.format != self.main_pass.color_format() {
            engine_warn!(
                "lumen::swapchain",
                "Swapchain format changed from {:?} to {:?}; the render pass is not rebuilt",
                self.main_pass.color_format(),
                swapchain.format
            );
        }

        let depth = self
            .device
            .create_depth_resources(swapchain.extent, self.main_pass.depth_format())?;
        check_depth_extent(&swapchain, &depth)?;

        let framebuffer_count = self.device.create_framebuffers()?;

        self.swapchain = swapchain;
        self.depth = depth;
        self.framebuffer_count = framebuffer_count;
        self.image_fences.reset(swapchain.image_count);

        self.observers.notify_create(&swapchain);
        self.resize.clear();
        self.recreations += 1;

        engine_debug!(
            "lumen::swapchain",
            "Swapchain recreated: {}x{}, {} images",
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.image_count
        );
        Ok(())
    }

    fn check_recording(&self, frame: &Frame<D::CommandBuffer>) -> Result<()> {
        let current = self.ring.current();
        if frame.id != current.id() || current.state() != FrameState::Recording {
            return Err(Error::InvalidResource(format!(
                "frame {} is not the recording frame (current {} is {:?})",
                frame.id,
                current.id(),
                current.state()
            )));
        }
        Ok(())
    }
}

/// The depth target must cover exactly the swapchain images it is paired with.
fn check_depth_extent(swapchain: &SwapchainInfo, depth: &DepthInfo) -> Result<()> {
    if depth.extent != swapchain.extent {
        engine_error!(
            "lumen::swapchain",
            "Depth extent {:?} does not match swapchain extent {:?}",
            depth.extent,
            swapchain.extent
        );
        return Err(Error::InvalidResource(format!(
            "depth extent {}x{} != swapchain extent {}x{}",
            depth.extent.width, depth.extent.height, swapchain.extent.width, swapchain.extent.height
        )));
    }
    Ok(())
}

impl<D: GraphicsDevice, const N: usize> Drop for FrameDriver<D, N> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_error!(SOURCE, "wait_idle failed during shutdown: {}", e);
        }
        self.ring.destroy(&mut self.device);
        self.device.destroy_framebuffers();
        self.device.destroy_depth_resources();
        self.device.destroy_swapchain();
        self.device.destroy_render_pass();
        engine_debug!(SOURCE, "Frame driver destroyed after {} recreations", self.recreations);
    }
}

#[cfg(test)]
#[path = "frame_driver_tests.rs"]
mod tests;
