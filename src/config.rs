use std::fmt;
use std::fs;
use std::io;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use glam::IVec2;
use log::warn;
use serde::Deserialize;
use winit::event::VirtualKeyCode;

use crate::fps::FpsCounter;

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_TITLE: &str = "spritewalk";
const DEFAULT_WINDOW_SECONDS: usize = 5;
const DEFAULT_AVERAGE_SECONDS: usize = 1;
const DEFAULT_DISPLAY_LIMIT: u32 = 120;
const DEFAULT_FRAME_TIME_SAMPLES: usize = 100;
const DEFAULT_SPRITE_SHEET: &str = "assets/sprites/player.json";
const DEFAULT_SCALE: u32 = 2;
const MAX_SCALE: u32 = 16;
const DEFAULT_STEP_PIXELS: i32 = 5;
const MAX_STEP_PIXELS: i32 = 256;
const DEFAULT_ANIMATION_INTERVAL_MS: u64 = 150;
const DEFAULT_START: [i32; 2] = [50, 50];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentModeSetting {
    VSync,
    Mailbox,
    Immediate,
}

#[derive(Clone, Debug)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Clone, Debug)]
pub struct FpsSettings {
    pub window_seconds: usize,
    pub average_over_seconds: usize,
    pub goal_fps: Option<f64>,
    pub display_limit: u32,
    pub frame_time_samples: usize,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub sprite_sheet: PathBuf,
    pub scale: u32,
    pub step_pixels: i32,
    pub animation_interval_ms: u64,
    pub start: IVec2,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub fps: FpsSettings,
    pub player: PlayerConfig,
    pub key_bindings: KeyBindings,
    pub present_mode: PresentModeSetting,
}

impl AppConfig {
    pub fn load() -> Self {
        let path = default_config_path();
        match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<RawConfig>(&bytes) {
                Ok(raw) => AppConfig::from_raw(raw),
                Err(err) => {
                    warn!("Failed to parse config file {}: {}", path.display(), err);
                    AppConfig::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => AppConfig::default(),
            Err(err) => {
                warn!("Failed to read config file {}: {}", path.display(), err);
                AppConfig::default()
            }
        }
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = KeyBindings::default();
        let key_bindings = KeyBindings {
            up: parse_key(raw.keymap.move_up.as_deref(), defaults.up),
            down: parse_key(raw.keymap.move_down.as_deref(), defaults.down),
            left: parse_key(raw.keymap.move_left.as_deref(), defaults.left),
            right: parse_key(raw.keymap.move_right.as_deref(), defaults.right),
            quit: parse_key(raw.keymap.quit.as_deref(), defaults.quit),
        };

        let window = WindowSettings {
            width: positive_or("window.width", raw.window.width, DEFAULT_WIDTH),
            height: positive_or("window.height", raw.window.height, DEFAULT_HEIGHT),
            title: raw.window.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        };

        let mut window_seconds = raw.fps.window_seconds.unwrap_or(DEFAULT_WINDOW_SECONDS);
        if window_seconds < FpsCounter::MIN_WINDOW_SECONDS {
            warn!(
                "fps.window_seconds {} is below {}; falling back to default",
                window_seconds,
                FpsCounter::MIN_WINDOW_SECONDS
            );
            window_seconds = DEFAULT_WINDOW_SECONDS;
        }

        let mut average_over_seconds = raw
            .fps
            .average_over_seconds
            .unwrap_or(DEFAULT_AVERAGE_SECONDS);
        if average_over_seconds == 0 || average_over_seconds >= window_seconds {
            let clamped = average_over_seconds.clamp(1, window_seconds - 1);
            warn!(
                "fps.average_over_seconds {} must be within 1..{}; using {}",
                average_over_seconds, window_seconds, clamped
            );
            average_over_seconds = clamped;
        }

        let goal_fps = match raw.fps.goal_fps {
            Some(fps) if !fps.is_finite() || fps <= 0.0 => {
                warn!("Invalid fps.goal_fps {}; frame pacing disabled", fps);
                None
            }
            other => other,
        };

        let mut frame_time_samples = raw
            .fps
            .frame_time_samples
            .unwrap_or(DEFAULT_FRAME_TIME_SAMPLES);
        if frame_time_samples < 2 {
            warn!(
                "fps.frame_time_samples {} is below 2; falling back to default",
                frame_time_samples
            );
            frame_time_samples = DEFAULT_FRAME_TIME_SAMPLES;
        }

        let fps = FpsSettings {
            window_seconds,
            average_over_seconds,
            goal_fps,
            display_limit: raw.fps.display_limit.unwrap_or(DEFAULT_DISPLAY_LIMIT),
            frame_time_samples,
        };

        let player = PlayerConfig {
            sprite_sheet: raw
                .player
                .sprite_sheet
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPRITE_SHEET)),
            scale: within_or("player.scale", raw.player.scale, 1..=MAX_SCALE, DEFAULT_SCALE),
            step_pixels: within_or(
                "player.step_pixels",
                raw.player.step_pixels,
                1..=MAX_STEP_PIXELS,
                DEFAULT_STEP_PIXELS,
            ),
            animation_interval_ms: raw
                .player
                .animation_interval_ms
                .unwrap_or(DEFAULT_ANIMATION_INTERVAL_MS),
            start: IVec2::from(raw.player.start.unwrap_or(DEFAULT_START)),
        };

        let present_mode = match raw.present_mode.as_deref() {
            None => PresentModeSetting::VSync,
            Some(name) => parse_present_mode(name).unwrap_or_else(|| {
                warn!("Unknown present_mode '{}'; using vsync", name);
                PresentModeSetting::VSync
            }),
        };

        Self {
            window,
            fps,
            player,
            key_bindings,
            present_mode,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_raw(RawConfig::default())
    }
}

#[derive(Clone, Debug)]
pub struct KeyBindings {
    pub up: VirtualKeyCode,
    pub down: VirtualKeyCode,
    pub left: VirtualKeyCode,
    pub right: VirtualKeyCode,
    pub quit: VirtualKeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            up: VirtualKeyCode::Up,
            down: VirtualKeyCode::Down,
            left: VirtualKeyCode::Left,
            right: VirtualKeyCode::Right,
            quit: VirtualKeyCode::Space,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    window: RawWindow,
    fps: RawFps,
    player: RawPlayer,
    keymap: RawKeyMap,
    present_mode: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawWindow {
    width: Option<u32>,
    height: Option<u32>,
    title: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawFps {
    window_seconds: Option<usize>,
    average_over_seconds: Option<usize>,
    goal_fps: Option<f64>,
    display_limit: Option<u32>,
    frame_time_samples: Option<usize>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPlayer {
    sprite_sheet: Option<String>,
    scale: Option<u32>,
    step_pixels: Option<i32>,
    animation_interval_ms: Option<u64>,
    start: Option<[i32; 2]>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawKeyMap {
    move_up: Option<String>,
    move_down: Option<String>,
    move_left: Option<String>,
    move_right: Option<String>,
    quit: Option<String>,
}

fn positive_or(name: &str, value: Option<u32>, fallback: u32) -> u32 {
    match value {
        Some(0) => {
            warn!("{} must be > 0; using {}", name, fallback);
            fallback
        }
        Some(value) => value,
        None => fallback,
    }
}

fn within_or<T>(name: &str, value: Option<T>, range: RangeInclusive<T>, fallback: T) -> T
where
    T: PartialOrd + Copy + fmt::Display,
{
    match value {
        Some(value) if !range.contains(&value) => {
            warn!(
                "{} {} must be within {}..={}; using {}",
                name,
                value,
                range.start(),
                range.end(),
                fallback
            );
            fallback
        }
        Some(value) => value,
        None => fallback,
    }
}

fn parse_present_mode(name: &str) -> Option<PresentModeSetting> {
    match name.trim().to_ascii_lowercase().as_str() {
        "vsync" | "fifo" => Some(PresentModeSetting::VSync),
        "mailbox" => Some(PresentModeSetting::Mailbox),
        "immediate" => Some(PresentModeSetting::Immediate),
        _ => None,
    }
}

fn parse_key(name: Option<&str>, fallback: VirtualKeyCode) -> VirtualKeyCode {
    let Some(name) = name else {
        return fallback;
    };

    match key_from_str(name) {
        Some(code) => code,
        None => {
            warn!("Unknown key '{}' in config; using {:?}", name, fallback);
            fallback
        }
    }
}

fn key_from_str(name: &str) -> Option<VirtualKeyCode> {
    let normalized = name.trim();
    let mut chars = normalized.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return match ch.to_ascii_uppercase() {
            'A' => Some(VirtualKeyCode::A),
            'B' => Some(VirtualKeyCode::B),
            'C' => Some(VirtualKeyCode::C),
            'D' => Some(VirtualKeyCode::D),
            'E' => Some(VirtualKeyCode::E),
            'F' => Some(VirtualKeyCode::F),
            'G' => Some(VirtualKeyCode::G),
            'H' => Some(VirtualKeyCode::H),
            'I' => Some(VirtualKeyCode::I),
            'J' => Some(VirtualKeyCode::J),
            'K' => Some(VirtualKeyCode::K),
            'L' => Some(VirtualKeyCode::L),
            'M' => Some(VirtualKeyCode::M),
            'N' => Some(VirtualKeyCode::N),
            'O' => Some(VirtualKeyCode::O),
            'P' => Some(VirtualKeyCode::P),
            'Q' => Some(VirtualKeyCode::Q),
            'R' => Some(VirtualKeyCode::R),
            'S' => Some(VirtualKeyCode::S),
            'T' => Some(VirtualKeyCode::T),
            'U' => Some(VirtualKeyCode::U),
            'V' => Some(VirtualKeyCode::V),
            'W' => Some(VirtualKeyCode::W),
            'X' => Some(VirtualKeyCode::X),
            'Y' => Some(VirtualKeyCode::Y),
            'Z' => Some(VirtualKeyCode::Z),
            _ => None,
        };
    }

    match normalized.to_ascii_uppercase().as_str() {
        "SPACE" => Some(VirtualKeyCode::Space),
        "ESC" | "ESCAPE" => Some(VirtualKeyCode::Escape),
        "ENTER" | "RETURN" => Some(VirtualKeyCode::Return),
        "TAB" => Some(VirtualKeyCode::Tab),
        "UP" => Some(VirtualKeyCode::Up),
        "DOWN" => Some(VirtualKeyCode::Down),
        "LEFT" => Some(VirtualKeyCode::Left),
        "RIGHT" => Some(VirtualKeyCode::Right),
        _ => None,
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        AppConfig::from_raw(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn empty_object_gives_defaults() {
        let config = parse("{}");
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
        assert_eq!(config.fps.window_seconds, 5);
        assert_eq!(config.fps.average_over_seconds, 1);
        assert_eq!(config.fps.goal_fps, None);
        assert_eq!(config.fps.display_limit, 120);
        assert_eq!(config.fps.frame_time_samples, 100);
        assert_eq!(config.player.start, IVec2::new(50, 50));
        assert_eq!(config.player.scale, 2);
        assert_eq!(config.player.animation_interval_ms, 150);
        assert_eq!(config.key_bindings.quit, VirtualKeyCode::Space);
        assert_eq!(config.present_mode, PresentModeSetting::VSync);
    }

    #[test]
    fn reads_all_sections() {
        let config = parse(
            r#"{
                "window": { "width": 800, "height": 600, "title": "walk" },
                "fps": { "window_seconds": 10, "average_over_seconds": 3, "goal_fps": 30 },
                "player": { "scale": 3, "step_pixels": 8, "start": [0, 12] },
                "keymap": { "move_up": "w", "move_left": "A", "quit": "escape" },
                "present_mode": "Mailbox"
            }"#,
        );
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.title, "walk");
        assert_eq!(config.fps.window_seconds, 10);
        assert_eq!(config.fps.average_over_seconds, 3);
        assert_eq!(config.fps.goal_fps, Some(30.0));
        assert_eq!(config.player.scale, 3);
        assert_eq!(config.player.step_pixels, 8);
        assert_eq!(config.player.start, IVec2::new(0, 12));
        assert_eq!(config.key_bindings.up, VirtualKeyCode::W);
        assert_eq!(config.key_bindings.left, VirtualKeyCode::A);
        assert_eq!(config.key_bindings.down, VirtualKeyCode::Down);
        assert_eq!(config.key_bindings.quit, VirtualKeyCode::Escape);
        assert_eq!(config.present_mode, PresentModeSetting::Mailbox);
    }

    #[test]
    fn invalid_fps_values_fall_back() {
        let config = parse(
            r#"{ "fps": { "window_seconds": 1, "average_over_seconds": 9,
                          "goal_fps": -5.0, "frame_time_samples": 1 } }"#,
        );
        assert_eq!(config.fps.window_seconds, 5);
        assert_eq!(config.fps.average_over_seconds, 4);
        assert_eq!(config.fps.goal_fps, None);
        assert_eq!(config.fps.frame_time_samples, 100);

        let config = parse(r#"{ "fps": { "average_over_seconds": 0 } }"#);
        assert_eq!(config.fps.average_over_seconds, 1);
    }

    #[test]
    fn zero_sizes_fall_back() {
        let config = parse(r#"{ "window": { "width": 0 }, "player": { "scale": 0 } }"#);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.player.scale, 2);
    }

    #[test]
    fn player_motion_values_are_bounded() {
        for step in ["0", "-5", "257", "2147483647"] {
            let config = parse(&format!(r#"{{ "player": {{ "step_pixels": {step} }} }}"#));
            assert_eq!(config.player.step_pixels, 5, "step_pixels {step}");
        }
        let config = parse(r#"{ "player": { "step_pixels": 256, "scale": 16 } }"#);
        assert_eq!(config.player.step_pixels, 256);
        assert_eq!(config.player.scale, 16);

        let config = parse(r#"{ "player": { "scale": 4294967295 } }"#);
        assert_eq!(config.player.scale, 2);
    }

    #[test]
    fn unknown_names_keep_defaults() {
        let config = parse(r#"{ "keymap": { "move_right": "banana" }, "present_mode": "fast" }"#);
        assert_eq!(config.key_bindings.right, VirtualKeyCode::Right);
        assert_eq!(config.present_mode, PresentModeSetting::VSync);
    }

    #[test]
    fn key_names() {
        assert_eq!(key_from_str(" space "), Some(VirtualKeyCode::Space));
        assert_eq!(key_from_str("q"), Some(VirtualKeyCode::Q));
        assert_eq!(key_from_str("Left"), Some(VirtualKeyCode::Left));
        assert_eq!(key_from_str("7"), None);
        assert_eq!(key_from_str(""), None);
    }
}
