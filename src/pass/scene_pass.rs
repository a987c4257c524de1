use std::collections::HashMap;

use cgmath::{Matrix4, Point3, SquareMatrix};

use crate::camera::OPENGL_TO_WGPU_MATRIX;
use crate::context::GraphicsContext;
use crate::geometry::GeometryStore;
use crate::light::LightTable;
use crate::material::MaterialTable;
use crate::scene::DrawCall;
use crate::texture::{Texture, TextureId, TextureTable};

use super::variants::{ShaderVariant, VariantRegistry};
use super::UniformPool;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

/// Per-pass uniforms: the viewpoint matrices, the shadow light's
/// matrices, the eye position, and the light count plus on/off mask.
/// Projection matrices are remapped to wgpu clip space on construction.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    proj: [[f32; 4]; 4],
    camera: [[f32; 4]; 4],
    light_proj: [[f32; 4]; 4],
    light_camera: [[f32; 4]; 4],
    eye: [f32; 4],
    counts: [u32; 4],
}

impl Globals {
    pub fn new(
        proj: Matrix4<f32>,
        view: Matrix4<f32>,
        light_proj: Matrix4<f32>,
        light_view: Matrix4<f32>,
        eye: Point3<f32>,
        num_lights: u32,
        light_mask: u32,
    ) -> Self {
        Self {
            proj: (OPENGL_TO_WGPU_MATRIX * proj).into(),
            camera: view.into(),
            light_proj: (OPENGL_TO_WGPU_MATRIX * light_proj).into(),
            light_camera: light_view.into(),
            eye: [eye.x, eye.y, eye.z, 1.0],
            counts: [num_lights, light_mask, 0, 0],
        }
    }
}

/// Per-draw uniforms. `indices.x` selects the material.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Locals {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    indices: [u32; 4],
}

/// Uniform state owned by one of the three passes: its globals buffer
/// and bind group, plus a locals buffer and bind group per draw call.
/// Bind groups are cached by draw index; the draw list order is stable
/// within a pass, so the cache stays valid until a target is recreated.
struct PassResources {
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    pool: UniformPool,
    local_bind_groups: HashMap<usize, wgpu::BindGroup>,
}

/// The whole frame pipeline: shadow depth pass into the shadow map,
/// mirror pass into the mirror texture, main pass to the surface.
pub struct ScenePass {
    locals_layout: wgpu::BindGroupLayout,
    globals_layout: wgpu::BindGroupLayout,
    variants: VariantRegistry,
    sampler: wgpu::Sampler,
    shadow_map: Texture,
    mirror_target: Texture,
    depth_texture: Texture,
    shadow: PassResources,
    mirror: PassResources,
    main: PassResources,
}

impl ScenePass {
    pub fn new(ctx: &GraphicsContext, lights: &LightTable, materials: &MaterialTable) -> Self {
        let device = &ctx.device;

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        let locals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("locals_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1),
                texture_entry(2),
            ],
        });

        let variants =
            VariantRegistry::new(device, ctx.config.format, &globals_layout, &locals_layout);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shadow_map = Texture::create_shadow_map(device);
        let mirror_target = Texture::create_mirror_target(device, &ctx.config);
        let depth_texture = Texture::create_depth_texture(device, &ctx.config, "depth_texture");

        // The shadow pass writes the shadow map, so its own globals group
        // binds the window depth texture in that slot instead. The depth
        // variant never samples it.
        let shadow = create_pass_resources(
            device,
            &globals_layout,
            "shadow",
            lights,
            materials,
            &sampler,
            &depth_texture.view,
            &shadow_map.sampler,
        );
        let mirror = create_pass_resources(
            device,
            &globals_layout,
            "mirror",
            lights,
            materials,
            &sampler,
            &shadow_map.view,
            &shadow_map.sampler,
        );
        let main = create_pass_resources(
            device,
            &globals_layout,
            "main",
            lights,
            materials,
            &sampler,
            &shadow_map.view,
            &shadow_map.sampler,
        );

        Self {
            locals_layout,
            globals_layout,
            variants,
            sampler,
            shadow_map,
            mirror_target,
            depth_texture,
            shadow,
            mirror,
            main,
        }
    }

    /// Recreates the window-sized targets and drops every bind group
    /// that referenced them.
    pub fn resize(&mut self, ctx: &GraphicsContext, lights: &LightTable, materials: &MaterialTable) {
        self.depth_texture =
            Texture::create_depth_texture(&ctx.device, &ctx.config, "depth_texture");
        self.mirror_target = Texture::create_mirror_target(&ctx.device, &ctx.config);
        self.main.local_bind_groups.clear();
        self.mirror.local_bind_groups.clear();
        self.shadow.globals_bind_group = create_globals_bind_group(
            &ctx.device,
            &self.globals_layout,
            &self.shadow.globals_buffer,
            lights,
            materials,
            &self.sampler,
            &self.depth_texture.view,
            &self.shadow_map.sampler,
        );
    }

    pub fn shadow_pass(
        &mut self,
        ctx: &GraphicsContext,
        geometry: &GeometryStore,
        textures: &TextureTable,
        globals: &Globals,
        draws: &[DrawCall],
    ) {
        ctx.queue
            .write_buffer(&self.shadow.globals_buffer, 0, bytemuck::bytes_of(globals));
        prepare_draws(
            &ctx.device,
            &ctx.queue,
            &mut self.shadow,
            &self.locals_layout,
            draws,
            textures,
            &self.shadow_map.view,
            &self.mirror_target.view,
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shadow_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });
            encode_draws(&mut rp, &self.shadow, &self.variants, geometry, draws);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Renders the reflected view of the room into the mirror texture.
    pub fn mirror_pass(
        &mut self,
        ctx: &GraphicsContext,
        geometry: &GeometryStore,
        textures: &TextureTable,
        globals: &Globals,
        draws: &[DrawCall],
    ) {
        ctx.queue
            .write_buffer(&self.mirror.globals_buffer, 0, bytemuck::bytes_of(globals));
        // The mirror surface itself is excluded from this pass, so its
        // texture slot falls back to blank while it is the attachment.
        prepare_draws(
            &ctx.device,
            &ctx.queue,
            &mut self.mirror,
            &self.locals_layout,
            draws,
            textures,
            &self.shadow_map.view,
            textures.view(TextureId::Blank),
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mirror_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mirror_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.mirror_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });
            encode_draws(&mut rp, &self.mirror, &self.variants, geometry, draws);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    pub fn main_pass(
        &mut self,
        ctx: &GraphicsContext,
        geometry: &GeometryStore,
        textures: &TextureTable,
        globals: &Globals,
        draws: &[DrawCall],
    ) -> Result<(), wgpu::SurfaceError> {
        ctx.queue
            .write_buffer(&self.main.globals_buffer, 0, bytemuck::bytes_of(globals));
        prepare_draws(
            &ctx.device,
            &ctx.queue,
            &mut self.main,
            &self.locals_layout,
            draws,
            textures,
            &self.shadow_map.view,
            &self.mirror_target.view,
        );

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("main_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });
            encode_draws(&mut rp, &self.main, &self.variants, geometry, draws);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Blits the shadow map to the surface as grayscale, replacing the
    /// mirror and main passes while active.
    pub fn debug_pass(&mut self, ctx: &GraphicsContext) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("debug_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("debug_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            rp.set_pipeline(self.variants.pipeline(ShaderVariant::DebugQuad, false));
            rp.set_bind_group(0, &self.main.globals_bind_group, &[]);
            rp.draw(0..3, 0..1);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn create_globals_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    globals_buffer: &wgpu::Buffer,
    lights: &LightTable,
    materials: &MaterialTable,
    sampler: &wgpu::Sampler,
    shadow_view: &wgpu::TextureView,
    shadow_sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("globals"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: lights.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: materials.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(shadow_view),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::Sampler(shadow_sampler),
            },
        ],
    })
}

#[allow(clippy::too_many_arguments)]
fn create_pass_resources(
    device: &wgpu::Device,
    globals_layout: &wgpu::BindGroupLayout,
    label: &'static str,
    lights: &LightTable,
    materials: &MaterialTable,
    sampler: &wgpu::Sampler,
    shadow_view: &wgpu::TextureView,
    shadow_sampler: &wgpu::Sampler,
) -> PassResources {
    let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<Globals>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let globals_bind_group = create_globals_bind_group(
        device,
        globals_layout,
        &globals_buffer,
        lights,
        materials,
        sampler,
        shadow_view,
        shadow_sampler,
    );
    PassResources {
        globals_buffer,
        globals_bind_group,
        pool: UniformPool::new(label, std::mem::size_of::<Locals>() as u64),
        local_bind_groups: HashMap::new(),
    }
}

fn resolve_view<'a>(
    id: TextureId,
    textures: &'a TextureTable,
    shadow: &'a wgpu::TextureView,
    mirror: &'a wgpu::TextureView,
) -> &'a wgpu::TextureView {
    match id {
        TextureId::Shadow => shadow,
        TextureId::Mirror => mirror,
        _ => textures.view(id),
    }
}

#[allow(clippy::too_many_arguments)]
fn prepare_draws(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    res: &mut PassResources,
    locals_layout: &wgpu::BindGroupLayout,
    draws: &[DrawCall],
    textures: &TextureTable,
    shadow_view: &wgpu::TextureView,
    mirror_view: &wgpu::TextureView,
) {
    let PassResources {
        pool,
        local_bind_groups,
        ..
    } = res;

    if pool.buffers.len() < draws.len() {
        pool.alloc_buffers(draws.len(), device);
        local_bind_groups.clear();
    }

    for (i, call) in draws.iter().enumerate() {
        let locals = Locals {
            model: call.model.into(),
            normal: call.normal.unwrap_or_else(Matrix4::identity).into(),
            indices: [call.binding.material_index(), 0, 0, 0],
        };
        pool.update_uniform(i, locals, queue);

        let (base, normal) = call.binding.textures();
        local_bind_groups.entry(i).or_insert_with(|| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("locals"),
                layout: locals_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: pool.buffers[i].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(resolve_view(
                            base,
                            textures,
                            shadow_view,
                            mirror_view,
                        )),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(resolve_view(
                            normal,
                            textures,
                            shadow_view,
                            mirror_view,
                        )),
                    },
                ],
            })
        });
    }
}

fn encode_draws<'a>(
    rp: &mut wgpu::RenderPass<'a>,
    res: &'a PassResources,
    variants: &'a VariantRegistry,
    geometry: &'a GeometryStore,
    draws: &[DrawCall],
) {
    rp.set_bind_group(0, &res.globals_bind_group, &[]);
    for (i, call) in draws.iter().enumerate() {
        rp.set_pipeline(variants.pipeline(call.variant, call.depth_write));
        rp.set_bind_group(1, &res.local_bind_groups[&i], &[]);
        let mesh = geometry.mesh(call.mesh);
        rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        rp.draw(0..mesh.num_vertices, 0..1);
    }
}
