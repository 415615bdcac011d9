use std::io;

use glam::IVec2;
use serde::Deserialize;

use crate::fps::TimeMs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Right => IVec2::new(1, 0),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Texture coordinates of the rectangle as `[u0, v0, u1, v1]`.
    pub fn to_uv(&self, sheet_width: u32, sheet_height: u32) -> [f32; 4] {
        let w = sheet_width as f32;
        let h = sheet_height as f32;
        [
            self.x as f32 / w,
            self.y as f32 / h,
            (self.x + self.width) as f32 / w,
            (self.y + self.height) as f32 / h,
        ]
    }
}

/// Frame numbers (row-major tile indices) for each walking direction.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Animations {
    pub up: Vec<u32>,
    pub right: Vec<u32>,
    pub down: Vec<u32>,
    pub left: Vec<u32>,
}

impl Animations {
    pub fn frames(&self, direction: Direction) -> &[u32] {
        match direction {
            Direction::Up => &self.up,
            Direction::Right => &self.right,
            Direction::Down => &self.down,
            Direction::Left => &self.left,
        }
    }
}

impl Default for Animations {
    fn default() -> Self {
        Self {
            up: vec![0, 1],
            right: vec![2, 3],
            down: vec![4, 5],
            left: vec![6, 7],
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpriteSheetLayout {
    pub width: u32,
    pub height: u32,
    pub sprite_size: u32,
    pub animations: Animations,
}

impl SpriteSheetLayout {
    pub fn new(
        width: u32,
        height: u32,
        sprite_size: u32,
        animations: Animations,
    ) -> io::Result<Self> {
        if sprite_size == 0 {
            return Err(invalid_data("sprite_size must be > 0".to_string()));
        }
        if width % sprite_size != 0 || height % sprite_size != 0 {
            return Err(invalid_data(format!(
                "image dimensions {}x{} are not divisible by sprite_size {}",
                width, height, sprite_size
            )));
        }

        let tile_count = (width / sprite_size) * (height / sprite_size);
        for direction in Direction::ALL {
            let frames = animations.frames(direction);
            if frames.is_empty() {
                return Err(invalid_data(format!(
                    "animation '{}' has no frames",
                    direction.as_str()
                )));
            }
            if let Some(frame) = frames.iter().find(|&&frame| frame >= tile_count) {
                return Err(invalid_data(format!(
                    "animation '{}' references frame {} but the sheet has {} tiles",
                    direction.as_str(),
                    frame,
                    tile_count
                )));
            }
        }

        Ok(Self {
            width,
            height,
            sprite_size,
            animations,
        })
    }

    pub fn frame_rect(&self, tile: u32) -> PixelRect {
        let tiles_x = self.width / self.sprite_size;
        PixelRect {
            x: (tile % tiles_x) * self.sprite_size,
            y: (tile / tiles_x) * self.sprite_size,
            width: self.sprite_size,
            height: self.sprite_size,
        }
    }

    pub fn frame_count(&self, direction: Direction) -> usize {
        self.animations.frames(direction).len()
    }

    pub fn animation_frame(&self, direction: Direction, index: usize) -> PixelRect {
        let frames = self.animations.frames(direction);
        self.frame_rect(frames[index % frames.len()])
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerSettings {
    pub start: IVec2,
    pub step_pixels: i32,
    pub animation_interval_ms: TimeMs,
    /// Edge length of the drawn sprite in window pixels.
    pub drawn_size: i32,
}

pub struct Player {
    settings: PlayerSettings,
    position: IVec2,
    facing: Direction,
    frame: usize,
    last_animation: TimeMs,
}

impl Player {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            position: settings.start,
            facing: Direction::Down,
            frame: 0,
            last_animation: 0,
        }
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn drawn_size(&self) -> i32 {
        self.settings.drawn_size
    }

    pub fn step(
        &mut self,
        direction: Direction,
        now_ms: TimeMs,
        layout: &SpriteSheetLayout,
        bounds: IVec2,
    ) {
        self.facing = direction;
        // Negative steps would invert the controls.
        let step = direction.offset() * self.settings.step_pixels.max(0);
        self.position = IVec2::new(
            self.position.x.saturating_add(step.x),
            self.position.y.saturating_add(step.y),
        );

        if now_ms.saturating_sub(self.last_animation) > self.settings.animation_interval_ms {
            self.frame = (self.frame + 1) % layout.frame_count(direction);
            self.last_animation = now_ms;
        }

        self.clamp_to(bounds);
    }

    pub fn clamp_to(&mut self, bounds: IVec2) {
        let max = (bounds - IVec2::splat(self.settings.drawn_size)).max(IVec2::ZERO);
        self.position = self.position.clamp(IVec2::ZERO, max);
    }

    pub fn source_rect(&self, layout: &SpriteSheetLayout) -> PixelRect {
        layout.animation_frame(self.facing, self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SpriteSheetLayout {
        SpriteSheetLayout::new(256, 32, 32, Animations::default()).unwrap()
    }

    fn player() -> Player {
        Player::new(PlayerSettings {
            start: IVec2::new(50, 50),
            step_pixels: 5,
            animation_interval_ms: 150,
            drawn_size: 64,
        })
    }

    #[test]
    fn frame_rects_follow_row_major_tiles() {
        let err = SpriteSheetLayout::new(64, 64, 32, Animations::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("references frame 4"));

        let grid = SpriteSheetLayout::new(
            64,
            64,
            32,
            Animations {
                up: vec![0],
                right: vec![1],
                down: vec![2],
                left: vec![3],
            },
        )
        .unwrap();
        assert_eq!(
            grid.frame_rect(3),
            PixelRect {
                x: 32,
                y: 32,
                width: 32,
                height: 32
            }
        );
        assert_eq!(grid.animation_frame(Direction::Down, 0).y, 32);
    }

    #[test]
    fn layout_rejects_bad_sheets() {
        assert!(SpriteSheetLayout::new(256, 32, 0, Animations::default()).is_err());
        assert!(SpriteSheetLayout::new(250, 32, 32, Animations::default()).is_err());

        let mut animations = Animations::default();
        animations.left.clear();
        let err = SpriteSheetLayout::new(256, 32, 32, animations).unwrap_err();
        assert!(err.to_string().contains("'left'"));
    }

    #[test]
    fn uv_covers_source_rect() {
        let rect = layout().animation_frame(Direction::Right, 1);
        assert_eq!(rect.x, 96);
        assert_eq!(rect.to_uv(256, 32), [0.375, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn starts_facing_down() {
        let player = player();
        assert_eq!(player.position(), IVec2::new(50, 50));
        assert_eq!(player.facing(), Direction::Down);
        assert_eq!(player.source_rect(&layout()).x, 128);
    }

    #[test]
    fn step_moves_and_turns() {
        let layout = layout();
        let bounds = IVec2::new(640, 480);
        let mut player = player();

        player.step(Direction::Right, 1000, &layout, bounds);
        assert_eq!(player.position(), IVec2::new(55, 50));
        assert_eq!(player.facing(), Direction::Right);

        player.step(Direction::Up, 1010, &layout, bounds);
        assert_eq!(player.position(), IVec2::new(55, 45));
        assert_eq!(player.facing(), Direction::Up);
    }

    #[test]
    fn animation_advances_after_interval() {
        let layout = layout();
        let bounds = IVec2::new(640, 480);
        let mut player = player();

        player.step(Direction::Down, 200, &layout, bounds);
        assert_eq!(player.frame(), 1);
        player.step(Direction::Down, 300, &layout, bounds);
        assert_eq!(player.frame(), 1);
        player.step(Direction::Down, 350, &layout, bounds);
        assert_eq!(player.frame(), 1);
        player.step(Direction::Down, 351, &layout, bounds);
        assert_eq!(player.frame(), 0);
    }

    #[test]
    fn position_stays_inside_window() {
        let layout = layout();
        let bounds = IVec2::new(100, 80);
        let mut player = player();

        for _ in 0..20 {
            player.step(Direction::Right, 0, &layout, bounds);
            player.step(Direction::Down, 0, &layout, bounds);
        }
        assert_eq!(player.position(), IVec2::new(36, 16));

        for _ in 0..40 {
            player.step(Direction::Left, 0, &layout, bounds);
            player.step(Direction::Up, 0, &layout, bounds);
        }
        assert_eq!(player.position(), IVec2::ZERO);
    }

    #[test]
    fn huge_steps_saturate_at_the_window_edge() {
        let layout = layout();
        let bounds = IVec2::new(640, 480);
        let mut player = Player::new(PlayerSettings {
            step_pixels: i32::MAX,
            ..player().settings
        });

        player.step(Direction::Right, 0, &layout, bounds);
        assert_eq!(player.position(), IVec2::new(576, 50));
        player.step(Direction::Up, 0, &layout, bounds);
        assert_eq!(player.position(), IVec2::new(576, 0));
    }

    #[test]
    fn negative_step_does_not_reverse_direction() {
        let mut player = Player::new(PlayerSettings {
            step_pixels: -5,
            ..player().settings
        });
        player.step(Direction::Right, 0, &layout(), IVec2::new(640, 480));
        assert_eq!(player.position(), IVec2::new(50, 50));
        assert_eq!(player.facing(), Direction::Right);
    }

    #[test]
    fn tiny_window_pins_to_origin() {
        let mut player = player();
        player.clamp_to(IVec2::new(10, 10));
        assert_eq!(player.position(), IVec2::ZERO);
    }
}
