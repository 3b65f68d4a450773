/// Mock graphics device for unit tests (no GPU required)
///
/// Every call is appended to a shared call log so tests can assert ordering.
/// Fences behave like real ones from the CPU side: they stay unsignaled after
/// a submit until someone waits on them. Submitting into an image that an
/// unsignaled fence from another submission still targets is recorded as a
/// violation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use crate::frame::DrawableSurface;
use crate::graphics_device::{
    AcquiredImage, ClearValue, ColorFormat, DepthFormat, DepthInfo, Extent2D,
    FrameSync, GraphicsDevice, MainPassDesc, PipelineStages, PresentStatus,
    Rect2D, SwapchainInfo, Viewport,
};

/// Shared, ordered record of calls
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Scripted result of the next acquire
#[derive(Debug, Clone, PartialEq)]
pub enum MockAcquire {
    Optimal,
    Suboptimal,
    OutOfDate,
    Fail(Error),
}

/// Scripted result of the next present
#[derive(Debug, Clone, PartialEq)]
pub enum MockPresent {
    Optimal,
    Suboptimal,
    OutOfDate,
    Fail(Error),
}

#[derive(Debug)]
struct MockFence {
    signaled: bool,
    image: Option<u32>,
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

pub struct MockGraphicsDevice {
    pub calls: CallLog,
    pub image_count: usize,
    pub surface_format: ColorFormat,
    pub supported_depth_formats: Vec<DepthFormat>,
    pub acquire_script: VecDeque<MockAcquire>,
    pub present_script: VecDeque<MockPresent>,
    /// Image indices handed out by successful acquires, in order. Round robin
    /// once empty.
    pub acquire_order: VecDeque<u32>,
    pub submit_failure: Option<Error>,
    /// Extent reported for depth targets instead of the requested one
    pub depth_extent_override: Option<Extent2D>,

    pub swapchain: Option<SwapchainInfo>,
    pub image_views: usize,
    pub depth: Option<DepthInfo>,
    pub render_pass: Option<MainPassDesc>,
    pub framebuffer_extents: Vec<Extent2D>,
    pub live_frame_syncs: usize,

    fences: Mutex<HashMap<u64, MockFence>>,
    semaphore_images: Mutex<HashMap<u64, u32>>,
    violations: Mutex<Vec<String>>,
    next_handle: u64,
    next_image: u32,
}

impl MockGraphicsDevice {
    pub fn new(image_count: usize, calls: CallLog) -> Self {
        Self {
            calls,
            image_count,
            surface_format: ColorFormat::B8G8R8A8_SRGB,
            supported_depth_formats: vec![
                DepthFormat::D32_SFLOAT,
                DepthFormat::D32_SFLOAT_S8_UINT,
                DepthFormat::D24_UNORM_S8_UINT,
            ],
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            acquire_order: VecDeque::new(),
            submit_failure: None,
            depth_extent_override: None,
            swapchain: None,
            image_views: 0,
            depth: None,
            render_pass: None,
            framebuffer_extents: Vec::new(),
            live_frame_syncs: 0,
            fences: Mutex::new(HashMap::new()),
            semaphore_images: Mutex::new(HashMap::new()),
            violations: Mutex::new(Vec::new()),
            next_handle: 1,
            next_image: 0,
        }
    }

    /// Synchronization or ordering violations observed so far
    pub fn violations(&self) -> Vec<String> {
        self.violations.lock().unwrap().clone()
    }

    /// Recorded calls whose name starts with `prefix`
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn violation(&self, message: String) {
        self.violations.lock().unwrap().push(message);
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    type Fence = u64;
    type Semaphore = u64;
    type CommandBuffer = u64;

    fn create_frame_sync(&mut self) -> Result<FrameSync<Self>> {
        let sync = FrameSync {
            command_buffer: self.handle(),
            image_acquired: self.handle(),
            render_finished: self.handle(),
            in_flight: self.handle(),
        };
        self.fences
            .lock()
            .unwrap()
            .insert(sync.in_flight, MockFence { signaled: true, image: None });
        self.live_frame_syncs += 1;
        self.record("create_frame_sync");
        Ok(sync)
    }

    fn destroy_frame_sync(&mut self, sync: &FrameSync<Self>) {
        self.fences.lock().unwrap().remove(&sync.in_flight);
        self.live_frame_syncs -= 1;
        self.record("destroy_frame_sync");
    }

    fn wait_for_fence(&self, fence: u64) -> Result<()> {
        let mut fences = self.fences.lock().unwrap();
        let state = fences
            .get_mut(&fence)
            .ok_or_else(|| Error::InvalidResource(format!("unknown fence {}", fence)))?;
        state.signaled = true;
        drop(fences);
        self.record(format!("wait_fence:{}", fence));
        Ok(())
    }

    fn reset_fence(&self, fence: u64) -> Result<()> {
        let mut fences = self.fences.lock().unwrap();
        let state = fences
            .get_mut(&fence)
            .ok_or_else(|| Error::InvalidResource(format!("unknown fence {}", fence)))?;
        state.signaled = false;
        drop(fences);
        self.record(format!("reset_fence:{}", fence));
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        for fence in self.fences.lock().unwrap().values_mut() {
            fence.signaled = true;
        }
        self.record("wait_idle");
        Ok(())
    }

    fn create_swapchain(&mut self, drawable: Extent2D) -> Result<SwapchainInfo> {
        if self.swapchain.is_some() {
            self.violation("swapchain created while another one is alive".to_string());
        }
        if drawable.is_empty() {
            self.violation(format!("swapchain created for empty drawable {:?}", drawable));
        }
        let info = SwapchainInfo {
            image_count: self.image_count,
            format: self.surface_format,
            extent: drawable,
        };
        self.swapchain = Some(info);
        self.next_image = 0;
        self.record(format!("create_swapchain:{}x{}", drawable.width, drawable.height));
        Ok(info)
    }

    fn create_image_views(&mut self) -> Result<()> {
        let info = self
            .swapchain
            .ok_or_else(|| Error::InvalidResource("no swapchain".to_string()))?;
        self.image_views = info.image_count;
        self.record("create_image_views");
        Ok(())
    }

    fn destroy_swapchain(&mut self) {
        if !self.framebuffer_extents.is_empty() {
            self.violation("swapchain destroyed before its framebuffers".to_string());
        }
        self.swapchain = None;
        self.image_views = 0;
        self.record("destroy_swapchain");
    }

    fn acquire_next_image(&mut self, signal: u64) -> Result<AcquiredImage> {
        let info = self
            .swapchain
            .ok_or_else(|| Error::InvalidResource("no swapchain".to_string()))?;

        let suboptimal = match self.acquire_script.pop_front().unwrap_or(MockAcquire::Optimal) {
            MockAcquire::Optimal => false,
            MockAcquire::Suboptimal => true,
            MockAcquire::OutOfDate => {
                self.record("acquire:out_of_date");
                return Err(Error::SwapchainOutOfDate);
            }
            MockAcquire::Fail(err) => {
                self.record("acquire:failed");
                return Err(err);
            }
        };

        let image_index = match self.acquire_order.pop_front() {
            Some(index) => index % info.image_count as u32,
            None => {
                let index = self.next_image % info.image_count as u32;
                self.next_image = self.next_image.wrapping_add(1);
                index
            }
        };
        self.semaphore_images.lock().unwrap().insert(signal, image_index);

        if suboptimal {
            self.record(format!("acquire:{}:suboptimal", image_index));
        } else {
            self.record(format!("acquire:{}", image_index));
        }
        Ok(AcquiredImage { image_index, suboptimal })
    }

    fn present(&mut self, image_index: u32, _wait: u64) -> Result<PresentStatus> {
        match self.present_script.pop_front().unwrap_or(MockPresent::Optimal) {
            MockPresent::Optimal => {
                self.record(format!("present:{}", image_index));
                Ok(PresentStatus::Optimal)
            }
            MockPresent::Suboptimal => {
                self.record(format!("present:{}:suboptimal", image_index));
                Ok(PresentStatus::Suboptimal)
            }
            MockPresent::OutOfDate => {
                self.record(format!("present:{}:out_of_date", image_index));
                Err(Error::SwapchainOutOfDate)
            }
            MockPresent::Fail(err) => {
                self.record("present:failed");
                Err(err)
            }
        }
    }

    fn supports_depth_format(&self, format: DepthFormat) -> bool {
        self.supported_depth_formats.contains(&format)
    }

    fn create_depth_resources(&mut self, extent: Extent2D, format: DepthFormat) -> Result<DepthInfo> {
        let extent = self.depth_extent_override.unwrap_or(extent);
        let info = DepthInfo { format, extent };
        self.depth = Some(info);
        self.record(format!("create_depth:{}x{}", extent.width, extent.height));
        Ok(info)
    }

    fn destroy_depth_resources(&mut self) {
        self.depth = None;
        self.record("destroy_depth");
    }

    fn create_render_pass(&mut self, desc: &MainPassDesc) -> Result<()> {
        self.render_pass = Some(*desc);
        self.record("create_render_pass");
        Ok(())
    }

    fn destroy_render_pass(&mut self) {
        self.render_pass = None;
        self.record("destroy_render_pass");
    }

    fn create_framebuffers(&mut self) -> Result<usize> {
        let info = self
            .swapchain
            .ok_or_else(|| Error::InvalidResource("no swapchain".to_string()))?;
        if self.render_pass.is_none() || self.depth.is_none() || self.image_views != info.image_count {
            return Err(Error::InvalidResource(
                "framebuffers need a render pass, a depth view and image views".to_string(),
            ));
        }
        self.framebuffer_extents = vec![info.extent; info.image_count];
        self.record(format!("create_framebuffers:{}", info.image_count));
        Ok(info.image_count)
    }

    fn destroy_framebuffers(&mut self) {
        self.framebuffer_extents.clear();
        self.record("destroy_framebuffers");
    }

    fn begin_commands(&self, cmd: u64) -> Result<()> {
        self.record(format!("begin_commands:{}", cmd));
        Ok(())
    }

    fn end_commands(&self, cmd: u64) -> Result<()> {
        self.record(format!("end_commands:{}", cmd));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        _cmd: u64,
        image_index: u32,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) {
        if image_index as usize >= self.framebuffer_extents.len() {
            self.violation(format!("render pass begun on missing framebuffer {}", image_index));
        }
        self.record(format!(
            "begin_render_pass:{}:{}x{}:{}",
            image_index,
            extent.width,
            extent.height,
            clear_values.len()
        ));
    }

    fn cmd_set_viewport(&self, _cmd: u64, viewport: &Viewport) {
        self.record(format!("set_viewport:{}x{}", viewport.width, viewport.height));
    }

    fn cmd_set_scissor(&self, _cmd: u64, scissor: &Rect2D) {
        self.record(format!("set_scissor:{}x{}", scissor.width, scissor.height));
    }

    fn cmd_end_render_pass(&self, _cmd: u64) {
        self.record("end_render_pass");
    }

    fn submit(
        &self,
        _cmd: u64,
        wait: u64,
        _wait_stages: PipelineStages,
        _signal: u64,
        fence: u64,
    ) -> Result<()> {
        if let Some(err) = &self.submit_failure {
            self.record("submit:failed");
            return Err(err.clone());
        }

        let image = self
            .semaphore_images
            .lock()
            .unwrap()
            .get(&wait)
            .copied()
            .ok_or_else(|| Error::InvalidResource("wait semaphore was never signaled".to_string()))?;

        let mut fences = self.fences.lock().unwrap();
        for (handle, state) in fences.iter() {
            if *handle != fence && !state.signaled && state.image == Some(image) {
                self.violation(format!(
                    "submit into image {} while fence {} is still pending on it",
                    image, handle
                ));
            }
        }
        if let Some(state) = fences.get_mut(&fence) {
            if state.signaled {
                self.violation(format!("fence {} submitted without reset", fence));
            }
            state.image = Some(image);
        }
        drop(fences);

        self.record(format!("submit:{}", image));
        Ok(())
    }
}

// ============================================================================
// Mock Surface
// ============================================================================

/// Window stand-in. `wait_events` applies the next queued size, which is how
/// tests simulate a window being restored after minimization.
pub struct MockSurface {
    size: Mutex<Extent2D>,
    queued_sizes: Mutex<VecDeque<Extent2D>>,
    waits: AtomicUsize,
    calls: CallLog,
}

impl MockSurface {
    pub fn new(size: Extent2D, calls: CallLog) -> Self {
        Self {
            size: Mutex::new(size),
            queued_sizes: Mutex::new(VecDeque::new()),
            waits: AtomicUsize::new(0),
            calls,
        }
    }

    pub fn set_size(&self, size: Extent2D) {
        *self.size.lock().unwrap() = size;
    }

    /// Size reported after the next `wait_events`
    pub fn queue_size(&self, size: Extent2D) {
        self.queued_sizes.lock().unwrap().push_back(size);
    }

    pub fn wait_count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

impl DrawableSurface for MockSurface {
    fn drawable_size(&self) -> Extent2D {
        *self.size.lock().unwrap()
    }

    fn wait_events(&self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.queued_sizes.lock().unwrap().pop_front() {
            *self.size.lock().unwrap() = next;
        }
        self.calls.lock().unwrap().push("wait_events".to_string());
    }
}
