use anyhow::Context;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::config::AppConfig;
use crate::input::Action;

mod state;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load();
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(config.window.title.as_str())
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
        .build(&event_loop)
        .context("Failed to create window")?;

    let mut app_state = state::AppState::new(window, &config).await?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app_state.window().id() => match app_state.input(event) {
                Some(Action::Quit) => {
                    log::debug!("Quit key pressed");
                    *control_flow = ControlFlow::Exit;
                }
                Some(Action::Move(_)) => {}
                None => match event {
                    WindowEvent::CloseRequested => {
                        log::debug!("Window close requested");
                        *control_flow = ControlFlow::Exit;
                    }
                    WindowEvent::Resized(physical_size) => {
                        app_state.resize(*physical_size);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        app_state.resize(**new_inner_size);
                    }
                    _ => {}
                },
            },
            Event::RedrawRequested(window_id) if window_id == app_state.window().id() => {
                app_state.update();
                match app_state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => app_state.resize(app_state.size()),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory");
                        *control_flow = ControlFlow::Exit;
                    }
                    Err(err) => log::warn!("Render error: {err:?}"),
                }
            }
            Event::MainEventsCleared => {
                app_state.sleep_if_needed();
                app_state.window().request_redraw();
            }
            _ => {}
        }
    })
}
