//! Unit tests for the frame driver, run against MockGraphicsDevice

use super::*;
use crate::graphics_device::mock_graphics_device::{
    new_call_log, CallLog, MockAcquire, MockGraphicsDevice, MockPresent, MockSurface,
};
use crate::graphics_device::{ColorFormat, DepthFormat, Extent2D};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// HELPERS
// ============================================================================

fn setup<const N: usize>(
    image_count: usize,
) -> (FrameDriver<MockGraphicsDevice, N>, Arc<MockSurface>, CallLog) {
    let calls = new_call_log();
    let surface = Arc::new(MockSurface::new(Extent2D::new(800, 600), calls.clone()));
    let device = MockGraphicsDevice::new(image_count, calls.clone());
    let driver = FrameDriver::new(device, surface.clone(), &Config::default()).unwrap();
    (driver, surface, calls)
}

/// Full frame: get, main pass, submit. Returns the image rendered into.
fn render_frame<const N: usize>(driver: &mut FrameDriver<MockGraphicsDevice, N>) -> u32 {
    let frame = driver.try_frame_get().unwrap();
    let image = frame.image_index();
    driver.try_mainpass_begin(&frame).unwrap();
    driver.try_mainpass_end(&frame).unwrap();
    driver.try_frame_submit(frame).unwrap();
    image
}

fn snapshot(calls: &CallLog) -> Vec<String> {
    calls.lock().unwrap().clone()
}

fn first_index(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|call| call == entry)
        .unwrap_or_else(|| panic!("'{}' not found in {:?}", entry, log))
}

fn last_index(log: &[String], entry: &str) -> usize {
    log.iter()
        .rposition(|call| call == entry)
        .unwrap_or_else(|| panic!("'{}' not found in {:?}", entry, log))
}

struct RecordingObserver {
    calls: CallLog,
}

impl SwapchainObserver for RecordingObserver {
    fn on_swapchain_destroy(&mut self) {
        self.calls.lock().unwrap().push("observer:destroy".to_string());
    }

    fn on_swapchain_create(&mut self, info: &SwapchainInfo) {
        self.calls.lock().unwrap().push(format!(
            "observer:create:{}x{}:{}",
            info.extent.width, info.extent.height, info.image_count
        ));
    }
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
fn test_new_builds_resources_in_dependency_order() {
    let (driver, _surface, calls) = setup::<2>(3);

    let log = snapshot(&calls);
    assert_eq!(
        &log[..7],
        &[
            "create_swapchain:800x600",
            "create_image_views",
            "create_render_pass",
            "create_depth:800x600",
            "create_framebuffers:3",
            "create_frame_sync",
            "create_frame_sync",
        ]
    );

    assert_eq!(driver.swapchain_info().extent, Extent2D::new(800, 600));
    assert_eq!(driver.swapchain_info().image_count, 3);
    assert_eq!(driver.framebuffer_count(), 3);
    assert_eq!(driver.image_fences().len(), 3);
    assert_eq!(driver.depth_info().format, DepthFormat::D32_SFLOAT);
    assert_eq!(driver.main_pass().color_format(), ColorFormat::B8G8R8A8_SRGB);
    assert_eq!(driver.frames_in_flight(), 2);
    assert_eq!(driver.current_frame(), 0);
    assert_eq!(driver.recreation_count(), 0);
}

#[test]
fn test_new_picks_first_supported_depth_format() {
    let calls = new_call_log();
    let surface = Arc::new(MockSurface::new(Extent2D::new(640, 480), calls.clone()));
    let mut device = MockGraphicsDevice::new(2, calls);
    device.supported_depth_formats = vec![DepthFormat::D24_UNORM_S8_UINT];

    let driver: FrameDriver<MockGraphicsDevice> =
        FrameDriver::new(device, surface, &Config::default()).unwrap();
    assert_eq!(driver.depth_info().format, DepthFormat::D24_UNORM_S8_UINT);
    assert_eq!(driver.main_pass().depth_format(), DepthFormat::D24_UNORM_S8_UINT);
}

#[test]
fn test_new_fails_without_supported_depth_format() {
    let calls = new_call_log();
    let surface = Arc::new(MockSurface::new(Extent2D::new(640, 480), calls.clone()));
    let mut device = MockGraphicsDevice::new(2, calls);
    device.supported_depth_formats.clear();

    let result: Result<FrameDriver<MockGraphicsDevice>> =
        FrameDriver::new(device, surface, &Config::default());
    match result {
        Err(err) => {
            assert!(matches!(err, Error::UnsupportedFormat(_)));
            assert!(!err.is_recoverable());
        }
        Ok(_) => panic!("expected UnsupportedFormat"),
    }
}

#[test]
fn test_new_rejects_depth_extent_mismatch() {
    let calls = new_call_log();
    let surface = Arc::new(MockSurface::new(Extent2D::new(640, 480), calls.clone()));
    let mut device = MockGraphicsDevice::new(2, calls.clone());
    device.depth_extent_override = Some(Extent2D::new(320, 240));

    let result: Result<FrameDriver<MockGraphicsDevice>> =
        FrameDriver::new(device, surface, &Config::default());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(!snapshot(&calls).iter().any(|call| call.starts_with("create_framebuffers")));
}

#[test]
fn test_new_waits_for_non_zero_drawable() {
    let calls = new_call_log();
    let surface = Arc::new(MockSurface::new(Extent2D::new(0, 0), calls.clone()));
    surface.queue_size(Extent2D::new(640, 480));
    let device = MockGraphicsDevice::new(2, calls.clone());

    let driver: FrameDriver<MockGraphicsDevice> =
        FrameDriver::new(device, surface.clone(), &Config::default()).unwrap();
    assert_eq!(surface.wait_count(), 1);
    assert_eq!(driver.swapchain_info().extent, Extent2D::new(640, 480));
    assert!(driver.device().violations().is_empty());
}

// ============================================================================
// FRAME CYCLE
// ============================================================================

#[test]
fn test_frame_cycle_records_main_pass() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    let start = snapshot(&calls).len();

    let frame = driver.try_frame_get().unwrap();
    assert_eq!(frame.id(), 0);
    assert_eq!(frame.image_index(), 0);
    assert_eq!(frame.extent(), Extent2D::new(800, 600));
    assert_eq!(driver.frame(0).unwrap().state(), FrameState::Recording);

    driver.try_mainpass_begin(&frame).unwrap();
    driver.try_mainpass_end(&frame).unwrap();
    let cmd = frame.command_buffer();
    driver.try_frame_submit(frame).unwrap();

    let fence = driver.frame(0).unwrap().sync().in_flight;
    let log = snapshot(&calls)[start..].to_vec();
    assert_eq!(
        log,
        vec![
            format!("wait_fence:{}", fence),
            "acquire:0".to_string(),
            format!("begin_commands:{}", cmd),
            "begin_render_pass:0:800x600:2".to_string(),
            "set_scissor:800x600".to_string(),
            "set_viewport:800x600".to_string(),
            "end_render_pass".to_string(),
            format!("end_commands:{}", cmd),
            format!("reset_fence:{}", fence),
            "submit:0".to_string(),
            "present:0".to_string(),
        ]
    );
    assert_eq!(driver.frame(0).unwrap().state(), FrameState::Submitted);
    assert_eq!(driver.current_frame(), 1);
}

#[test]
fn test_frame_state_returns_to_idle_after_fence_wait() {
    let (mut driver, _surface, _calls) = setup::<1>(2);

    render_frame(&mut driver);
    assert_eq!(driver.frame(0).unwrap().state(), FrameState::Submitted);

    let frame = driver.try_frame_get().unwrap();
    assert_eq!(driver.frame(0).unwrap().state(), FrameState::Recording);
    driver.try_frame_submit(frame).unwrap();
}

#[test]
fn test_current_frame_is_submit_count_mod_n() {
    fn check<const N: usize>() {
        let (mut driver, _surface, _calls) = setup::<N>(3);
        for submitted in 1..=10 {
            render_frame(&mut driver);
            assert_eq!(driver.current_frame(), submitted % N);
        }
    }

    check::<1>();
    check::<2>();
    check::<3>();
}

#[test]
fn test_frames_use_their_own_context_objects() {
    let (mut driver, _surface, _calls) = setup::<2>(3);

    let frame0 = driver.try_frame_get().unwrap();
    let cmd0 = frame0.command_buffer();
    driver.try_frame_submit(frame0).unwrap();

    let frame1 = driver.try_frame_get().unwrap();
    assert_eq!(frame1.id(), 1);
    assert_ne!(frame1.command_buffer(), cmd0);
    driver.try_frame_submit(frame1).unwrap();
}

// ============================================================================
// PER-IMAGE FENCES
// ============================================================================

#[test]
fn test_never_submits_into_image_with_pending_foreign_fence() {
    fn check<const N: usize>(image_count: usize) {
        let (mut driver, _surface, _calls) = setup::<N>(image_count);
        for _ in 0..12 {
            render_frame(&mut driver);
        }
        assert!(
            driver.device().violations().is_empty(),
            "N={} M={}: {:?}",
            N,
            image_count,
            driver.device().violations()
        );
    }

    for image_count in 1..=4 {
        check::<1>(image_count);
        check::<2>(image_count);
        check::<3>(image_count);
    }
}

#[test]
fn test_waits_on_previous_owner_when_frames_exceed_images() {
    let (mut driver, _surface, calls) = setup::<3>(2);
    let fence0 = driver.frame(0).unwrap().sync().in_flight;
    let fence2 = driver.frame(2).unwrap().sync().in_flight;

    render_frame(&mut driver); // frame 0 -> image 0
    render_frame(&mut driver); // frame 1 -> image 1
    let start = snapshot(&calls).len();

    let frame = driver.try_frame_get().unwrap(); // frame 2 -> image 0
    assert_eq!(frame.image_index(), 0);

    let log = snapshot(&calls)[start..].to_vec();
    assert_eq!(log[0], format!("wait_fence:{}", fence2));
    assert_eq!(log[1], "acquire:0");
    assert_eq!(log[2], format!("wait_fence:{}", fence0));
    assert_eq!(driver.image_fences().fence(0), Some(fence2));

    driver.try_frame_submit(frame).unwrap();
}

#[test]
fn test_random_acquire_order_never_submits_into_pending_image() {
    fn check<const N: usize>(image_count: usize, rng: &mut StdRng) {
        let (mut driver, _surface, _calls) = setup::<N>(image_count);
        driver.device_mut().acquire_order =
            (0..200).map(|_| rng.gen_range(0..image_count as u32)).collect();

        for _ in 0..200 {
            render_frame(&mut driver);
        }
        assert!(
            driver.device().violations().is_empty(),
            "N={} M={}: {:?}",
            N,
            image_count,
            driver.device().violations()
        );
    }

    let mut rng = StdRng::seed_from_u64(7);
    for image_count in 1..=4 {
        check::<1>(image_count, &mut rng);
        check::<2>(image_count, &mut rng);
        check::<3>(image_count, &mut rng);
    }
}

#[test]
fn test_repeated_image_index_waits_on_own_previous_submit() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    let fence0 = driver.frame(0).unwrap().sync().in_flight;
    driver.device_mut().acquire_order = [1, 1, 1].into_iter().collect();

    render_frame(&mut driver); // frame 0 -> image 1
    let start = snapshot(&calls).len();
    render_frame(&mut driver); // frame 1 -> image 1 again

    let log = snapshot(&calls)[start..].to_vec();
    let acquire = first_index(&log, "acquire:1");
    let wait = first_index(&log, &format!("wait_fence:{}", fence0));
    assert!(acquire < wait, "{:?}", log);
    assert!(wait < first_index(&log, "submit:1"));

    render_frame(&mut driver); // frame 0 -> image 1 a third time
    assert!(driver.device().violations().is_empty());
}

#[test]
fn test_mock_detects_unguarded_submit() {
    // The property above is only meaningful if the mock catches a bad submit
    let mut device = MockGraphicsDevice::new(1, new_call_log());
    device.create_swapchain(Extent2D::new(100, 100)).unwrap();
    let a = device.create_frame_sync().unwrap();
    let b = device.create_frame_sync().unwrap();

    device.acquire_next_image(a.image_acquired).unwrap();
    device.reset_fence(a.in_flight).unwrap();
    device
        .submit(a.command_buffer, a.image_acquired, PipelineStages::COLOR_ATTACHMENT_OUTPUT, a.render_finished, a.in_flight)
        .unwrap();

    device.acquire_next_image(b.image_acquired).unwrap();
    device.reset_fence(b.in_flight).unwrap();
    device
        .submit(b.command_buffer, b.image_acquired, PipelineStages::COLOR_ATTACHMENT_OUTPUT, b.render_finished, b.in_flight)
        .unwrap();

    assert_eq!(device.violations().len(), 1);
}

// ============================================================================
// SWAPCHAIN RECREATION
// ============================================================================

#[test]
fn test_recreate_twice_keeps_state_consistent() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    render_frame(&mut driver);

    driver.try_recreate_swapchain().unwrap();
    driver.try_recreate_swapchain().unwrap();

    let info = driver.swapchain_info();
    assert_eq!(info.image_count, 3);
    assert_eq!(info.extent, Extent2D::new(800, 600));
    assert_eq!(driver.framebuffer_count(), 3);
    assert_eq!(driver.image_fences().len(), 3);
    assert_eq!(driver.device().framebuffer_extents, vec![Extent2D::new(800, 600); 3]);
    assert_eq!(driver.recreation_count(), 2);
    assert!(driver.device().violations().is_empty());

    // Still renders afterwards
    render_frame(&mut driver);
    assert!(driver.device().violations().is_empty());
}

#[test]
fn test_recreate_follows_new_image_count() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    render_frame(&mut driver);

    driver.device_mut().image_count = 4;
    driver.try_recreate_swapchain().unwrap();

    assert_eq!(driver.swapchain_info().image_count, 4);
    assert_eq!(driver.framebuffer_count(), 4);
    assert_eq!(driver.image_fences().len(), 4);
    assert!((0..4).all(|image| driver.image_fences().fence(image).is_none()));
}

#[test]
fn test_depth_extent_matches_swapchain_after_recreation() {
    let (mut driver, surface, _calls) = setup::<2>(3);
    assert_eq!(driver.depth_info().extent, driver.swapchain_info().extent);

    surface.set_size(Extent2D::new(1280, 720));
    driver.try_recreate_swapchain().unwrap();

    assert_eq!(driver.swapchain_info().extent, Extent2D::new(1280, 720));
    assert_eq!(driver.depth_info().extent, Extent2D::new(1280, 720));
    assert_eq!(driver.device().depth.unwrap().extent, Extent2D::new(1280, 720));
}

#[test]
fn test_recreate_rejects_depth_extent_mismatch() {
    let (mut driver, surface, _calls) = setup::<2>(3);
    surface.set_size(Extent2D::new(1024, 768));
    driver.device_mut().depth_extent_override = Some(Extent2D::new(800, 600));

    let err = driver.try_recreate_swapchain().unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
    assert_eq!(driver.recreation_count(), 0);
}

#[test]
fn test_recreate_while_recording_is_misuse() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    let frame = driver.try_frame_get().unwrap();
    let fence = driver.frame(0).unwrap().sync().in_flight;
    let start = snapshot(&calls).len();

    let err = driver.try_recreate_swapchain().unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
    assert!(snapshot(&calls)[start..].is_empty());
    assert_eq!(driver.recreation_count(), 0);
    assert_eq!(driver.image_fences().fence(frame.image_index()), Some(fence));

    driver.try_mainpass_begin(&frame).unwrap();
    driver.try_mainpass_end(&frame).unwrap();
    driver.try_frame_submit(frame).unwrap();
    driver.try_recreate_swapchain().unwrap();
    assert_eq!(driver.recreation_count(), 1);
    assert!(driver.device().violations().is_empty());
}

#[test]
fn test_recreation_sequence_and_notification_order() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    driver.add_observer(Box::new(RecordingObserver { calls: calls.clone() }));
    let start = snapshot(&calls).len();

    driver.try_recreate_swapchain().unwrap();

    let log = snapshot(&calls)[start..].to_vec();
    assert_eq!(
        log,
        vec![
            "wait_idle",
            "observer:destroy",
            "destroy_framebuffers",
            "destroy_depth",
            "destroy_swapchain",
            "create_swapchain:800x600",
            "create_image_views",
            "create_depth:800x600",
            "create_framebuffers:3",
            "observer:create:800x600:3",
        ]
    );
}

#[test]
fn test_observers_notified_in_registration_order() {
    struct Named {
        name: &'static str,
        calls: CallLog,
    }

    impl SwapchainObserver for Named {
        fn on_swapchain_destroy(&mut self) {
            self.calls.lock().unwrap().push(format!("{}:destroy", self.name));
        }

        fn on_swapchain_create(&mut self, _info: &SwapchainInfo) {
            self.calls.lock().unwrap().push(format!("{}:create", self.name));
        }
    }

    let (mut driver, _surface, calls) = setup::<2>(2);
    driver.add_observer(Box::new(Named { name: "a", calls: calls.clone() }));
    driver.add_observer(Box::new(Named { name: "b", calls: calls.clone() }));

    driver.try_recreate_swapchain().unwrap();

    let log = snapshot(&calls);
    assert!(first_index(&log, "a:destroy") < first_index(&log, "b:destroy"));
    assert!(first_index(&log, "b:destroy") < first_index(&log, "destroy_swapchain"));
    assert!(last_index(&log, "create_framebuffers:2") < first_index(&log, "a:create"));
    assert!(first_index(&log, "a:create") < first_index(&log, "b:create"));
}

#[test]
fn test_resize_through_minimized_window() {
    let (mut driver, surface, calls) = setup::<2>(3);
    render_frame(&mut driver);

    // Window minimized, then restored at a new size
    surface.set_size(Extent2D::new(0, 0));
    surface.queue_size(Extent2D::new(0, 0));
    surface.queue_size(Extent2D::new(1024, 768));
    driver.notify_resize();

    render_frame(&mut driver);

    assert_eq!(surface.wait_count(), 2);
    assert_eq!(driver.recreation_count(), 1);
    assert!(!driver.resize_flag().is_pending());
    assert_eq!(driver.swapchain_info().extent, Extent2D::new(1024, 768));
    assert_eq!(driver.device().framebuffer_extents, vec![Extent2D::new(1024, 768); 3]);

    let log = snapshot(&calls);
    assert!(last_index(&log, "wait_events") < last_index(&log, "wait_idle"));
    assert!(!log.iter().any(|call| call == "create_swapchain:0x0"));
    assert!(driver.device().violations().is_empty());
}

#[test]
fn test_surface_is_drawable_tracks_minimization() {
    let (mut driver, surface, _calls) = setup::<2>(3);
    assert!(driver.surface_is_drawable());

    surface.set_size(Extent2D::new(0, 0));
    driver.notify_resize();
    assert!(!driver.surface_is_drawable());
    // A caller honoring the gate does not drive frames, so nothing blocks
    assert_eq!(surface.wait_count(), 0);
    assert!(driver.resize_flag().is_pending());

    surface.set_size(Extent2D::new(1024, 768));
    assert!(driver.surface_is_drawable());
    render_frame(&mut driver);
    assert_eq!(surface.wait_count(), 0);
    assert_eq!(driver.swapchain_info().extent, Extent2D::new(1024, 768));
}

#[test]
fn test_resize_flag_raised_from_another_thread() {
    let (mut driver, surface, _calls) = setup::<2>(3);
    let flag = driver.resize_flag();
    surface.set_size(Extent2D::new(1920, 1080));

    std::thread::spawn(move || flag.raise()).join().unwrap();
    assert!(driver.resize_flag().is_pending());

    render_frame(&mut driver);

    assert_eq!(driver.recreation_count(), 1);
    assert_eq!(driver.swapchain_info().extent, Extent2D::new(1920, 1080));
    assert!(!driver.resize_flag().is_pending());
}

#[test]
fn test_suboptimal_acquire_on_frame_five() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    {
        let device = driver.device_mut();
        device.acquire_script.extend(vec![MockAcquire::Optimal; 4]);
        device.acquire_script.push_back(MockAcquire::Suboptimal);
        device.present_script.extend(vec![MockPresent::Optimal; 4]);
        device.present_script.push_back(MockPresent::Suboptimal);
    }

    for _ in 0..4 {
        render_frame(&mut driver);
    }
    assert_eq!(driver.recreation_count(), 0);

    // Frame 5 renders normally despite the suboptimal acquire
    let frame = driver.try_frame_get().unwrap();
    assert_eq!(driver.recreation_count(), 0);
    let image = frame.image_index();
    driver.try_mainpass_begin(&frame).unwrap();
    driver.try_mainpass_end(&frame).unwrap();
    driver.try_frame_submit(frame).unwrap();

    assert_eq!(driver.recreation_count(), 1);

    let log = snapshot(&calls);
    let submit = last_index(&log, &format!("submit:{}", image));
    let present = first_index(&log, &format!("present:{}:suboptimal", image));
    let recreate = last_index(&log, "create_swapchain:800x600");
    assert!(first_index(&log, &format!("acquire:{}:suboptimal", image)) < submit);
    assert!(submit < present);
    assert!(present < recreate);
}

#[test]
fn test_suboptimal_acquire_alone_does_not_recreate() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    driver.device_mut().acquire_script.push_back(MockAcquire::Suboptimal);

    render_frame(&mut driver);
    assert_eq!(driver.recreation_count(), 0);
}

#[test]
fn test_out_of_date_on_acquire_recreates_and_retries() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    driver.device_mut().acquire_script.push_back(MockAcquire::OutOfDate);
    let start = snapshot(&calls).len();

    let frame = driver.try_frame_get().unwrap();
    assert_eq!(driver.recreation_count(), 1);
    assert_eq!(frame.image_index(), 0);

    let log = snapshot(&calls)[start..].to_vec();
    assert!(first_index(&log, "acquire:out_of_date") < first_index(&log, "create_swapchain:800x600"));
    assert!(first_index(&log, "create_framebuffers:3") < first_index(&log, "acquire:0"));

    driver.try_frame_submit(frame).unwrap();
    assert!(driver.device().violations().is_empty());
}

#[test]
fn test_out_of_date_on_present_recreates_and_advances() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    driver.device_mut().present_script.push_back(MockPresent::OutOfDate);

    render_frame(&mut driver);

    assert_eq!(driver.recreation_count(), 1);
    assert_eq!(driver.current_frame(), 1);
}

// ============================================================================
// FAILURES & MISUSE
// ============================================================================

#[test]
fn test_acquire_failure_is_unrecoverable() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    driver
        .device_mut()
        .acquire_script
        .push_back(MockAcquire::Fail(Error::BackendError("device lost".to_string())));

    let err = driver.try_frame_get().unwrap_err();
    assert_eq!(err, Error::BackendError("device lost".to_string()));
    assert!(!err.is_recoverable());
    assert_eq!(driver.recreation_count(), 0);
}

#[test]
fn test_submit_failure_is_unrecoverable() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    driver.device_mut().submit_failure = Some(Error::OutOfMemory);

    let frame = driver.try_frame_get().unwrap();
    let err = driver.try_frame_submit(frame).unwrap_err();
    assert_eq!(err, Error::OutOfMemory);
    assert!(!err.is_recoverable());
}

#[test]
fn test_present_failure_is_unrecoverable() {
    let (mut driver, _surface, _calls) = setup::<2>(3);
    driver
        .device_mut()
        .present_script
        .push_back(MockPresent::Fail(Error::BackendError("surface lost".to_string())));

    let frame = driver.try_frame_get().unwrap();
    let err = driver.try_frame_submit(frame).unwrap_err();
    assert!(!err.is_recoverable());
    assert_eq!(driver.recreation_count(), 0);
    assert_eq!(driver.current_frame(), 0);
}

#[test]
fn test_frame_get_twice_without_submit_is_misuse() {
    let (mut driver, _surface, _calls) = setup::<2>(3);

    let frame = driver.try_frame_get().unwrap();
    assert!(matches!(driver.try_frame_get(), Err(Error::InvalidResource(_))));

    driver.try_frame_submit(frame).unwrap();
    assert!(driver.try_frame_get().is_ok());
}

#[test]
fn test_known_gap_format_change_keeps_render_pass() {
    let (mut driver, _surface, calls) = setup::<2>(2);
    driver.device_mut().surface_format = ColorFormat::R8G8B8A8_SRGB;

    driver.try_recreate_swapchain().unwrap();

    assert_eq!(driver.swapchain_info().format, ColorFormat::R8G8B8A8_SRGB);
    assert_eq!(driver.main_pass().color_format(), ColorFormat::B8G8R8A8_SRGB);
    let log = snapshot(&calls);
    assert_eq!(log.iter().filter(|call| *call == "create_render_pass").count(), 1);
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_drop_releases_in_reverse_dependency_order() {
    let (mut driver, _surface, calls) = setup::<2>(3);
    render_frame(&mut driver);
    let start = snapshot(&calls).len();

    drop(driver);

    let log = snapshot(&calls)[start..].to_vec();
    assert_eq!(
        log,
        vec![
            "wait_idle",
            "destroy_frame_sync",
            "destroy_frame_sync",
            "destroy_framebuffers",
            "destroy_depth",
            "destroy_swapchain",
            "destroy_render_pass",
        ]
    );
}
