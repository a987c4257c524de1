use crate::context::create_render_pipeline;
use crate::geometry::ModelVertex;
use crate::texture::DEPTH_FORMAT;

/// Every pipeline the renderer can draw with. Scene objects select one
/// through their binding; `ShadowDepth` and `DebugQuad` belong to the
/// pass itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderVariant {
    Color,
    Lit,
    LitShadow,
    Textured,
    Bump,
    BumpShadow,
    ShadowDepth,
    DebugQuad,
}

impl ShaderVariant {
    pub const ALL: [ShaderVariant; 8] = [
        ShaderVariant::Color,
        ShaderVariant::Lit,
        ShaderVariant::LitShadow,
        ShaderVariant::Textured,
        ShaderVariant::Bump,
        ShaderVariant::BumpShadow,
        ShaderVariant::ShadowDepth,
        ShaderVariant::DebugQuad,
    ];
}

/// All render pipelines, compiled once at startup against the shared
/// bind group layouts.
pub struct VariantRegistry {
    color: wgpu::RenderPipeline,
    lit: wgpu::RenderPipeline,
    lit_shadow: wgpu::RenderPipeline,
    lit_shadow_blend: wgpu::RenderPipeline,
    textured: wgpu::RenderPipeline,
    bump: wgpu::RenderPipeline,
    bump_shadow: wgpu::RenderPipeline,
    shadow_depth: wgpu::RenderPipeline,
    debug_quad: wgpu::RenderPipeline,
}

impl VariantRegistry {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        globals_layout: &wgpu::BindGroupLayout,
        locals_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[globals_layout, locals_layout],
            push_constant_ranges: &[],
        });
        // The fullscreen quad reads only the globals group.
        let quad_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[globals_layout],
            push_constant_ranges: &[],
        });

        let color_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/color.wgsl"));
        let phong_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/phong.wgsl"));
        let phong_shadow_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/phong_shadow.wgsl"));
        let texture_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/texture.wgsl"));
        let bump_shader = device.create_shader_module(wgpu::include_wgsl!("../shaders/bump.wgsl"));
        let bump_shadow_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/bump_shadow.wgsl"));
        let shadow_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/shadow.wgsl"));
        let quad_shader =
            device.create_shader_module(wgpu::include_wgsl!("../shaders/debug_quad.wgsl"));

        let vertex_layouts = &[ModelVertex::desc()];
        // The camera sits inside the room, so scene pipelines draw both
        // faces of every cube.
        let color = create_render_pipeline(
            device,
            "color",
            &layout,
            &color_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::REPLACE),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(DEPTH_FORMAT),
            true,
        );
        let lit = create_render_pipeline(
            device,
            "lit",
            &layout,
            &phong_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::REPLACE),
            wgpu::PrimitiveTopology::LineStrip,
            None,
            Some(DEPTH_FORMAT),
            true,
        );
        let lit_shadow = create_render_pipeline(
            device,
            "lit_shadow",
            &layout,
            &phong_shadow_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::ALPHA_BLENDING),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(DEPTH_FORMAT),
            true,
        );
        // Same shading, depth writes off, used for the translucent objects.
        let lit_shadow_blend = create_render_pipeline(
            device,
            "lit_shadow_blend",
            &layout,
            &phong_shadow_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::ALPHA_BLENDING),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(DEPTH_FORMAT),
            false,
        );
        let textured = create_render_pipeline(
            device,
            "textured",
            &layout,
            &texture_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::REPLACE),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(DEPTH_FORMAT),
            true,
        );
        let bump = create_render_pipeline(
            device,
            "bump",
            &layout,
            &bump_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::REPLACE),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(DEPTH_FORMAT),
            true,
        );
        let bump_shadow = create_render_pipeline(
            device,
            "bump_shadow",
            &layout,
            &bump_shadow_shader,
            vertex_layouts,
            Some(color_format),
            Some(wgpu::BlendState::REPLACE),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            Some(DEPTH_FORMAT),
            true,
        );
        // Depth-only pass. Front faces culled to keep occluder depths on
        // the far side of each solid.
        let shadow_depth = create_render_pipeline(
            device,
            "shadow_depth",
            &layout,
            &shadow_shader,
            vertex_layouts,
            None,
            None,
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Front),
            Some(DEPTH_FORMAT),
            true,
        );
        let debug_quad = create_render_pipeline(
            device,
            "debug_quad",
            &quad_layout,
            &quad_shader,
            &[],
            Some(color_format),
            Some(wgpu::BlendState::REPLACE),
            wgpu::PrimitiveTopology::TriangleList,
            None,
            None,
            false,
        );

        Self {
            color,
            lit,
            lit_shadow,
            lit_shadow_blend,
            textured,
            bump,
            bump_shadow,
            shadow_depth,
            debug_quad,
        }
    }

    pub fn pipeline(&self, variant: ShaderVariant, depth_write: bool) -> &wgpu::RenderPipeline {
        match variant {
            ShaderVariant::Color => &self.color,
            ShaderVariant::Lit => &self.lit,
            ShaderVariant::LitShadow => {
                if depth_write {
                    &self.lit_shadow
                } else {
                    &self.lit_shadow_blend
                }
            }
            ShaderVariant::Textured => &self.textured,
            ShaderVariant::Bump => &self.bump,
            ShaderVariant::BumpShadow => &self.bump_shadow,
            ShaderVariant::ShadowDepth => &self.shadow_depth,
            ShaderVariant::DebugQuad => &self.debug_quad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_list_is_complete_and_distinct() {
        assert_eq!(ShaderVariant::ALL.len(), 8);
        for (i, a) in ShaderVariant::ALL.iter().enumerate() {
            for b in &ShaderVariant::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
