mod sprite;

pub use sprite::SpriteRenderer;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::WHITE;

/// Axis-aligned rectangle in window pixels, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn screen_to_ndc(x: f32, y: f32, width: f32, height: f32) -> [f32; 2] {
    [(x / width) * 2.0 - 1.0, 1.0 - (y / height) * 2.0]
}

/// Two triangles covering `rect`, as `(position, uv)` pairs in draw order.
pub fn quad_corners(
    rect: ScreenRect,
    uv: [f32; 4],
    viewport: [u32; 2],
) -> [([f32; 2], [f32; 2]); 6] {
    let width = viewport[0] as f32;
    let height = viewport[1] as f32;
    let x1 = rect.x + rect.width;
    let y1 = rect.y + rect.height;

    let p0 = screen_to_ndc(rect.x, rect.y, width, height);
    let p1 = screen_to_ndc(x1, rect.y, width, height);
    let p2 = screen_to_ndc(rect.x, y1, width, height);
    let p3 = screen_to_ndc(x1, y1, width, height);
    let [u0, v0, u1, v1] = uv;

    [
        (p0, [u0, v0]),
        (p1, [u1, v0]),
        (p2, [u0, v1]),
        (p2, [u0, v1]),
        (p1, [u1, v0]),
        (p3, [u1, v1]),
    ]
}
