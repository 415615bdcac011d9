use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use glam::IVec2;
use log::{debug, info, trace};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::window::Window;

use crate::config::{self, AppConfig};
use crate::fps::{DisplayedFps, FpsCounter, FramePacer, FrameTimeSampler, TimeMs};
use crate::input::{Action, PlayerController};
use crate::render::{ScreenRect, SpriteRenderer};
use crate::sprite::{Player, PlayerSettings};
use crate::text::{self, FpsOverlay};
use crate::texture::SpriteSheet;

/// Monotonic millisecond timestamps relative to application start.
struct FrameClock {
    started: Instant,
}

impl FrameClock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> TimeMs {
        self.started.elapsed().as_millis() as TimeMs
    }
}

pub struct AppState {
    window: Window,
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    sheet: SpriteSheet,
    sprite_renderer: SpriteRenderer,
    fps_overlay: FpsOverlay,
    player: Player,
    controller: PlayerController,
    fps_counter: FpsCounter,
    frame_times: FrameTimeSampler,
    pacer: FramePacer,
    clock: FrameClock,
    average_over_seconds: usize,
    display_limit: u32,
    displayed_fps: DisplayedFps,
}

impl AppState {
    pub async fn new(window: Window, config: &AppConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            dx12_shader_compiler: Default::default(),
        });
        let surface = unsafe { instance.create_surface(&window) }
            .context("Failed to create surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find adapter")?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Primary device"),
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no texture formats")?;
        let present_mode = choose_present_mode(&surface_caps.present_modes, config.present_mode);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        let sheet_path = resolve_asset_path(&config.player.sprite_sheet);
        let sheet = SpriteSheet::load(&device, &queue, &sheet_path)
            .with_context(|| format!("Failed to load sprite sheet {}", sheet_path.display()))?;
        let sprite_renderer = SpriteRenderer::new(&device, surface_format, &sheet);
        let fps_overlay = FpsOverlay::new(&device, &queue, surface_format, text::TEXT_COLOR);

        let drawn_size = sheet
            .layout()
            .sprite_size
            .checked_mul(config.player.scale)
            .and_then(|size| i32::try_from(size).ok())
            .context("Drawn sprite size does not fit the screen coordinate range")?;
        let mut player = Player::new(PlayerSettings {
            start: config.player.start,
            step_pixels: config.player.step_pixels,
            animation_interval_ms: config.player.animation_interval_ms,
            drawn_size,
        });
        player.clamp_to(IVec2::new(size.width as i32, size.height as i32));

        let fps_counter = FpsCounter::new(config.fps.window_seconds)?;
        let frame_times = FrameTimeSampler::new(config.fps.frame_time_samples)?;
        info!(
            "Window {}x{}, {:?}, fps window {}s averaged over {}s",
            size.width,
            size.height,
            present_mode,
            fps_counter.window_seconds(),
            config.fps.average_over_seconds,
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            surface_config,
            size,
            sheet,
            sprite_renderer,
            fps_overlay,
            player,
            controller: PlayerController::new(config.key_bindings.clone()),
            fps_counter,
            frame_times,
            pacer: FramePacer::new(config.fps.goal_fps),
            clock: FrameClock::new(),
            average_over_seconds: config.fps.average_over_seconds,
            display_limit: config.fps.display_limit,
            displayed_fps: DisplayedFps::default(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.player.clamp_to(self.bounds());
    }

    /// Returns the action triggered by `event`, if any.
    pub fn input(&mut self, event: &WindowEvent) -> Option<Action> {
        match event {
            WindowEvent::KeyboardInput { input, .. } => {
                let key = input.virtual_keycode?;
                self.controller
                    .process_keyboard(key, input.state == ElementState::Pressed)
            }
            _ => None,
        }
    }

    pub fn update(&mut self) {
        let now = self.clock.now_ms();
        if self
            .displayed_fps
            .on_frame_start(&mut self.fps_counter, now, self.average_over_seconds)
        {
            debug!(
                "fps: {:.1} over the last {}s",
                self.displayed_fps.value(),
                self.average_over_seconds
            );
        }
        if let Some(mean) = self.frame_times.record(now) {
            debug!(
                "avg time per frame over last {} frames: {:.2} ms",
                self.frame_times.capacity(),
                mean
            );
        }

        let bounds = self.bounds();
        for direction in self.controller.drain_moves() {
            self.player.step(direction, now, self.sheet.layout(), bounds);
            trace!(
                "player moved {} to {:?}, frame {}",
                self.player.facing().as_str(),
                self.player.position(),
                self.player.frame()
            );
        }

        let viewport = [self.size.width, self.size.height];
        let layout = self.sheet.layout();
        let source = self.player.source_rect(layout);
        let position = self.player.position();
        let drawn = self.player.drawn_size() as f32;
        self.sprite_renderer.prepare(
            &self.queue,
            viewport,
            ScreenRect {
                x: position.x as f32,
                y: position.y as f32,
                width: drawn,
                height: drawn,
            },
            source.to_uv(layout.width, layout.height),
        );

        let label = text::fps_label(self.displayed_fps.value(), self.display_limit);
        self.fps_overlay
            .prepare(&self.device, &self.queue, viewport, label.as_deref());
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render encoder"),
            });

        self.sprite_renderer.render(&mut encoder, &view);
        self.fps_overlay.render(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    pub fn sleep_if_needed(&self) {
        let frame_start = self.fps_counter.last_frame_start_time();
        let now = self.clock.now_ms();
        trace!(
            "loop iteration took {} ms ({} frames so far this second)",
            now.saturating_sub(frame_start),
            self.fps_counter.current_second_count()
        );
        self.pacer.frame_sleep(frame_start, now);
    }

    fn bounds(&self) -> IVec2 {
        IVec2::new(self.size.width as i32, self.size.height as i32)
    }
}

fn resolve_asset_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
    }
}

fn choose_present_mode(
    available: &[wgpu::PresentMode],
    requested: config::PresentModeSetting,
) -> wgpu::PresentMode {
    let candidates = match requested {
        config::PresentModeSetting::Immediate => [
            wgpu::PresentMode::Immediate,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Fifo,
        ],
        config::PresentModeSetting::Mailbox => [
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
            wgpu::PresentMode::Fifo,
        ],
        config::PresentModeSetting::VSync => [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
        ],
    };

    candidates
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}
