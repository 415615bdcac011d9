use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Deserialize;

use crate::sprite::{Animations, SpriteSheetLayout};

pub struct SpriteSheet {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    layout: SpriteSheetLayout,
}

#[derive(Deserialize)]
struct SheetMetadata {
    texture: String,
    sprite_size: u32,
    #[serde(default)]
    animations: Animations,
}

impl SpriteSheet {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        metadata_path: impl AsRef<Path>,
    ) -> io::Result<Self> {
        let metadata_path = metadata_path.as_ref();
        let metadata: SheetMetadata =
            serde_json::from_slice(&fs::read(metadata_path)?).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("metadata parse error: {err}"),
                )
            })?;

        let texture_path = resolve_texture_path(metadata_path, &metadata.texture);
        let image = image::open(&texture_path).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "failed to open sprite sheet {}: {err}",
                    texture_path.display()
                ),
            )
        })?;
        let mut rgba = image.to_rgba8();
        apply_color_key(&mut rgba);
        let (width, height) = rgba.dimensions();

        let layout =
            SpriteSheetLayout::new(width, height, metadata.sprite_size, metadata.animations)?;
        let pixel_data = rgba.into_raw();

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite sheet texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
            &pixel_data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Pixel art: keep hard edges when scaled up.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite sheet sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            _texture: texture,
            view,
            sampler,
            layout,
        })
    }

    pub fn layout(&self) -> &SpriteSheetLayout {
        &self.layout
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite sheet bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

/// Makes every pixel matching the top-left pixel's color fully transparent.
pub fn apply_color_key(image: &mut RgbaImage) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }

    let key = *image.get_pixel(0, 0);
    for pixel in image.pixels_mut() {
        if pixel.0[..3] == key.0[..3] {
            pixel.0[3] = 0;
        }
    }
}

fn resolve_texture_path(metadata_path: &Path, texture: &str) -> PathBuf {
    let base = metadata_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(texture)
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn color_key_clears_background_only() {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([255, 0, 255, 255]));
        image.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        image.put_pixel(2, 0, Rgba([255, 0, 255, 128]));

        apply_color_key(&mut image);

        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 255, 0]);
        assert_eq!(image.get_pixel(2, 0).0, [255, 0, 255, 0]);
        assert_eq!(image.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn color_key_ignores_empty_images() {
        let mut image = RgbaImage::new(0, 0);
        apply_color_key(&mut image);
        assert_eq!(image.len(), 0);
    }

    #[test]
    fn metadata_defaults_to_four_direction_layout() {
        let metadata: SheetMetadata =
            serde_json::from_str(r#"{ "texture": "player.png", "sprite_size": 32 }"#).unwrap();
        assert_eq!(metadata.texture, "player.png");
        assert_eq!(metadata.animations, Animations::default());
    }

    #[test]
    fn texture_path_is_relative_to_metadata() {
        let path = resolve_texture_path(Path::new("assets/sprites/player.json"), "player.png");
        assert_eq!(path, PathBuf::from("assets/sprites/player.png"));
    }
}
