//! Clears the window every frame through the frame driver
//!
//! Run with: cargo run -p lumen_gfx_vulkan --example clear_screen

use std::sync::Arc;

use lumen_gfx::lumen::frame::{FrameDriver, ResizeFlag};
use lumen_gfx::lumen::Config;
use lumen_gfx::{engine_error, engine_info};
use lumen_gfx_vulkan::VulkanDevice;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Default)]
struct App {
    window: Option<Arc<Window>>,
    driver: Option<FrameDriver<VulkanDevice>>,
    resize: Option<ResizeFlag>,
    minimized: bool,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("Lumen - clear screen")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                engine_error!("clear_screen", "Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let config = Config {
            app_name: "Lumen Clear Screen".to_string(),
            ..Config::default()
        };
        match lumen_gfx_vulkan::frame_driver_for_window(window.clone(), &config) {
            Ok(driver) => {
                engine_info!("clear_screen", "Rendering with {}", driver.device().context().device_label());
                self.resize = Some(driver.resize_flag());
                self.driver = Some(driver);
                self.window = Some(window);
            }
            Err(e) => {
                engine_error!("clear_screen", "Failed to create frame driver: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // Driver first: it waits for the GPU before the window goes away
                self.driver = None;
                self.window = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // Frames must not run while minimized: recreation would wait
                // on this thread for a restore it can never observe
                self.minimized = size.width == 0 || size.height == 0;
                if let Some(resize) = &self.resize {
                    resize.raise();
                }
            }
            WindowEvent::RedrawRequested => {
                if self.minimized {
                    return;
                }
                if let Some(driver) = self.driver.as_mut() {
                    if !driver.surface_is_drawable() {
                        return;
                    }
                    let frame = driver.frame_get();
                    driver.mainpass_begin(&frame);
                    driver.mainpass_end(&frame);
                    driver.frame_submit(frame);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            if !self.minimized {
                window.request_redraw();
            }
        }
    }
}

fn main() {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!("clear_screen", "Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!("clear_screen", "Event loop error: {}", e);
    }
}
