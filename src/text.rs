use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::render::{ScreenRect, quad_corners};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: f32 = 2.0;
const GLYPH_SPACING_X: f32 = 1.0;
const PADDING_X: f32 = 4.0;
const PADDING_Y: f32 = 4.0;

pub const TEXT_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Label for the overlay, or `None` once the rate reaches `display_limit`.
pub fn fps_label(fps: f64, display_limit: u32) -> Option<String> {
    let rounded = fps.round().max(0.0) as u32;
    (rounded < display_limit).then(|| format!("FPS: {rounded}"))
}

pub struct FpsOverlay {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
    glyphs: HashMap<char, GlyphInfo>,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    vertex_count: usize,
    color: [f32; 4],
    cached: Option<(String, [u32; 2])>,
}

#[derive(Clone, Copy, Debug)]
struct GlyphInfo {
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct TextVertex {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl FpsOverlay {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        color: [f32; 4],
    ) -> Self {
        let (glyphs, atlas_pixels, atlas_size) = build_font_atlas();

        let size = wgpu::Extent3d {
            width: atlas_size[0],
            height: atlas_size[1],
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glyph atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(atlas_size[0] * 4),
                rows_per_image: Some(atlas_size[1]),
            },
            size,
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Glyph sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glyph bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glyph bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Text shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("text_shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Text pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Text pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TextVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                        2 => Float32x4
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        // "FPS: " plus three digits
        let initial_capacity = 64;
        let vertex_buffer = create_vertex_buffer(device, initial_capacity);

        Self {
            pipeline,
            bind_group,
            _texture: texture,
            glyphs,
            vertex_buffer,
            vertex_capacity: initial_capacity,
            vertex_count: 0,
            color,
            cached: None,
        }
    }

    /// Lays out `text` in the top-left corner. Vertex data is only rebuilt
    /// when the text or the viewport changed since the last call.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        viewport: [u32; 2],
        text: Option<&str>,
    ) {
        let Some(text) = text else {
            self.vertex_count = 0;
            self.cached = None;
            return;
        };
        if viewport[0] == 0 || viewport[1] == 0 {
            self.vertex_count = 0;
            return;
        }
        if let Some((cached_text, cached_viewport)) = &self.cached
            && cached_text == text
            && *cached_viewport == viewport
        {
            return;
        }

        let vertices = layout_text(&self.glyphs, text, viewport, self.color);
        self.vertex_count = vertices.len();
        self.cached = Some((text.to_string(), viewport));

        if self.vertex_count == 0 {
            return;
        }

        if self.vertex_count > self.vertex_capacity {
            self.vertex_capacity = self.vertex_count.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }

        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        if self.vertex_count == 0 {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("FPS text pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: true,
                },
            })],
            depth_stencil_attachment: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count as u32, 0..1);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Text vertex buffer"),
        size: (capacity * std::mem::size_of::<TextVertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn layout_text(
    glyphs: &HashMap<char, GlyphInfo>,
    text: &str,
    viewport: [u32; 2],
    color: [f32; 4],
) -> Vec<TextVertex> {
    let glyph_w = GLYPH_WIDTH as f32 * GLYPH_SCALE;
    let glyph_h = GLYPH_HEIGHT as f32 * GLYPH_SCALE;
    let advance = glyph_w + GLYPH_SPACING_X * GLYPH_SCALE;

    let mut vertices = Vec::with_capacity(text.len() * 6);
    let mut cursor_x = PADDING_X;
    for ch in text.chars() {
        if let Some(glyph) = glyphs.get(&ch.to_ascii_uppercase()) {
            let rect = ScreenRect {
                x: cursor_x,
                y: PADDING_Y,
                width: glyph_w,
                height: glyph_h,
            };
            let uv = [glyph.u0, glyph.v0, glyph.u1, glyph.v1];
            vertices.extend(
                quad_corners(rect, uv, viewport)
                    .into_iter()
                    .map(|(position, uv)| TextVertex {
                        position,
                        uv,
                        color,
                    }),
            );
        }
        cursor_x += advance;
    }
    vertices
}

fn build_font_atlas() -> (HashMap<char, GlyphInfo>, Vec<u8>, [u32; 2]) {
    let patterns = GLYPHS;
    let cols = 8u32;
    let rows = (patterns.len() as u32).div_ceil(cols);
    let width = cols * GLYPH_WIDTH;
    let height = rows * GLYPH_HEIGHT;

    let mut pixels = vec![0u8; (width * height * 4) as usize];
    let mut glyphs = HashMap::new();

    for (index, (ch, rows)) in patterns.iter().enumerate() {
        let idx = index as u32;
        let base_x = (idx % cols) * GLYPH_WIDTH;
        let base_y = (idx / cols) * GLYPH_HEIGHT;

        for (row, mask) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (mask >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                    let x = base_x + col;
                    let y = base_y + row as u32;
                    let offset = ((y * width + x) * 4) as usize;
                    pixels[offset..offset + 4].copy_from_slice(&[255, 255, 255, 255]);
                }
            }
        }

        glyphs.insert(
            *ch,
            GlyphInfo {
                u0: base_x as f32 / width as f32,
                v0: base_y as f32 / height as f32,
                u1: (base_x + GLYPH_WIDTH) as f32 / width as f32,
                v1: (base_y + GLYPH_HEIGHT) as f32 / height as f32,
            },
        );
    }

    (glyphs, pixels, [width, height])
}

type GlyphRows = [u8; GLYPH_HEIGHT as usize];

const GLYPHS: &[(char, GlyphRows)] = &[
    (' ', [0, 0, 0, 0, 0, 0, 0]),
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111]),
    ('3', [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    (':', [0b00000, 0b00100, 0b00100, 0b00000, 0b00100, 0b00100, 0b00000]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_rounds_and_hides_at_limit() {
        assert_eq!(fps_label(59.6, 120).as_deref(), Some("FPS: 60"));
        assert_eq!(fps_label(0.0, 120).as_deref(), Some("FPS: 0"));
        assert_eq!(fps_label(119.4, 120).as_deref(), Some("FPS: 119"));
        assert_eq!(fps_label(119.5, 120), None);
        assert_eq!(fps_label(240.0, 120), None);
    }

    #[test]
    fn atlas_holds_every_label_glyph() {
        let (glyphs, pixels, size) = build_font_atlas();
        assert_eq!(size, [40, 14]);
        assert_eq!(pixels.len(), 40 * 14 * 4);
        for ch in "FPS: 0123456789.".chars() {
            assert!(glyphs.contains_key(&ch), "missing glyph {ch:?}");
        }
    }

    #[test]
    fn layout_emits_one_quad_per_known_glyph() {
        let (glyphs, _, _) = build_font_atlas();
        let vertices = layout_text(&glyphs, "fps: 42", [640, 480], TEXT_COLOR);
        // lowercase maps to the uppercase glyphs, the space is blank but present
        assert_eq!(vertices.len(), 7 * 6);
        assert_eq!(vertices[0].position, [-1.0 + 8.0 / 640.0, 1.0 - 8.0 / 480.0]);

        let unknown = layout_text(&glyphs, "xyz", [640, 480], TEXT_COLOR);
        assert!(unknown.is_empty());
    }
}
