use std::num::NonZeroU32;

use crate::resources;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const SHADOW_MAP_SIZE: u32 = 1024;

/// Logical texture identifiers. `Shadow` and `Mirror` are dynamic render
/// targets rewritten every frame; everything else is loaded once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureId {
    Blank,
    Wood,
    Carpet,
    Roof,
    Door,
    Window,
    CarpetNorm,
    RoofNorm,
    DoorNorm,
    WoodNorm,
    Shadow,
    Mirror,
}

impl TextureId {
    pub fn is_dynamic(self) -> bool {
        matches!(self, TextureId::Shadow | TextureId::Mirror)
    }
}

/// Static texture set, indexed by `TextureId`. Upload order is fixed.
const STATIC_TEXTURES: &[(TextureId, &str, bool)] = &[
    (TextureId::Blank, "blank.png", false),
    (TextureId::Wood, "wood.png", false),
    (TextureId::Carpet, "carpet.png", false),
    (TextureId::Roof, "roof.png", false),
    (TextureId::Door, "door.png", false),
    (TextureId::Window, "landscape.png", true),
    (TextureId::CarpetNorm, "carpet_map.png", false),
    (TextureId::RoofNorm, "roof_map.png", false),
    (TextureId::DoorNorm, "door_map.png", false),
    (TextureId::WoodNorm, "floor_map.png", false),
];

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Loads an image file into an RGBA8 texture. Missing or unreadable
    /// files degrade to a 1x1 white pixel with a warning; non-power-of-two
    /// dimensions warn but load anyway.
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        file_name: &str,
        flip: bool,
    ) -> Self {
        let (width, height, pixels) = match resources::load_image(file_name) {
            Ok(img) => {
                let img = if flip { img.flipv() } else { img };
                let rgba = img.to_rgba8();
                (rgba.width(), rgba.height(), rgba.into_raw())
            }
            Err(err) => {
                log::warn!("could not load texture {}: {:#}", file_name, err);
                (1, 1, vec![255u8; 4])
            }
        };
        if !width.is_power_of_two() || !height.is_power_of_two() {
            log::warn!(
                "texture {} is not power-of-2 dimensions ({}x{})",
                file_name,
                width,
                height
            );
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(file_name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(4 * width),
                rows_per_image: NonZeroU32::new(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(file_name),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Per-pass depth attachment sized to the window.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Dynamic target: depth map rendered from the shadow light's viewpoint,
    /// sampled with a comparison sampler in the shadowed variants.
    pub fn create_shadow_map(device: &wgpu::Device) -> Self {
        let size = wgpu::Extent3d {
            width: SHADOW_MAP_SIZE,
            height: SHADOW_MAP_SIZE,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_map"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Dynamic target: the mirror pass renders the reflected scene here,
    /// and the mirror surface samples it in the main pass. Window sized,
    /// recreated on resize.
    pub fn create_mirror_target(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("mirror_target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("mirror_target"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// The static half of the texture table, loaded once at startup. The two
/// dynamic targets live with the pass that rewrites them.
pub struct TextureTable {
    textures: Vec<(TextureId, Texture)>,
}

impl TextureTable {
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let textures = STATIC_TEXTURES
            .iter()
            .map(|&(id, file, flip)| (id, Texture::from_file(device, queue, file, flip)))
            .collect();
        Self { textures }
    }

    /// View for a static texture. Dynamic ids fall back to blank; the
    /// render pass resolves those against its own targets first.
    pub fn view(&self, id: TextureId) -> &wgpu::TextureView {
        if id.is_dynamic() {
            return &self.textures[0].1.view;
        }
        self.textures
            .iter()
            .find(|(tid, _)| *tid == id)
            .map(|(_, t)| &t.view)
            .unwrap_or(&self.textures[0].1.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_map_resolution_is_fixed() {
        assert_eq!(SHADOW_MAP_SIZE, 1024);
        assert_eq!(DEPTH_FORMAT, wgpu::TextureFormat::Depth32Float);
    }

    #[test]
    fn static_table_covers_every_non_dynamic_id() {
        let ids = [
            TextureId::Blank,
            TextureId::Wood,
            TextureId::Carpet,
            TextureId::Roof,
            TextureId::Door,
            TextureId::Window,
            TextureId::CarpetNorm,
            TextureId::RoofNorm,
            TextureId::DoorNorm,
            TextureId::WoodNorm,
        ];
        assert_eq!(STATIC_TEXTURES.len(), ids.len());
        for id in ids {
            assert!(!id.is_dynamic());
            assert!(STATIC_TEXTURES.iter().any(|&(tid, _, _)| tid == id));
        }
        // blank is the fallback, so it must load first
        assert_eq!(STATIC_TEXTURES[0].0, TextureId::Blank);
        assert!(TextureId::Shadow.is_dynamic());
        assert!(TextureId::Mirror.is_dynamic());
    }

    #[test]
    fn only_the_window_landscape_is_flipped() {
        for &(id, _, flip) in STATIC_TEXTURES {
            assert_eq!(flip, id == TextureId::Window);
        }
    }
}
