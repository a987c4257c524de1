use std::time::Instant;

use cgmath::{Point3, Vector3};
use winit::event::{ElementState, VirtualKeyCode};

pub mod animation;
pub mod camera;
pub mod context;
pub mod geometry;
pub mod light;
pub mod material;
pub mod pass;
pub mod resources;
pub mod scene;
pub mod texture;
pub mod window;

use animation::AnimationState;
use camera::{Camera, CameraController};
use context::GraphicsContext;
use geometry::GeometryStore;
use light::{LightId, LightTable};
use material::MaterialTable;
use pass::scene_pass::{Globals, ScenePass};
use scene::{PassMode, Scene};
use texture::TextureTable;
use window::{Window, WindowEvents};

/// The mirror hangs on the south wall; its pass looks back at the room
/// from the glass toward the origin.
const MIRROR_EYE: Point3<f32> = Point3::new(0.0, 2.0, 5.1);

fn mirror_view() -> cgmath::Matrix4<f32> {
    cgmath::Matrix4::look_at_rh(MIRROR_EYE, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())
}

struct State {
    ctx: GraphicsContext,
    camera: Camera,
    camera_controller: CameraController,
    geometry: GeometryStore,
    materials: MaterialTable,
    lights: LightTable,
    textures: TextureTable,
    scene: Scene,
    anim: AnimationState,
    pass: ScenePass,
    debug_shadow_view: bool,
    last_frame: Instant,
}

impl State {
    async fn new(window: &Window) -> anyhow::Result<Self> {
        let ctx = GraphicsContext::new(window).await?;
        let geometry = GeometryStore::build(&ctx.device)?;
        let materials = MaterialTable::new(&ctx.device);
        let lights = LightTable::new(&ctx.device);
        let textures = TextureTable::load(&ctx.device, &ctx.queue);
        let pass = ScenePass::new(&ctx, &lights, &materials);

        Ok(Self {
            ctx,
            camera: Camera::new(),
            camera_controller: CameraController::new(0.1, 0.5),
            geometry,
            materials,
            lights,
            textures,
            scene: Scene::new(),
            anim: AnimationState::new(),
            pass,
            debug_shadow_view: false,
            last_frame: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        log::debug!("resizing surface to {}x{}", width, height);
        self.ctx.config.width = width;
        self.ctx.config.height = height;
        self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
        self.pass.resize(&self.ctx, &self.lights, &self.materials);
    }

    fn input(&mut self, key_state: &ElementState, keycode: &VirtualKeyCode) {
        if *key_state != ElementState::Pressed {
            return;
        }
        if self.camera_controller.process_key(keycode, &mut self.camera) {
            return;
        }
        match keycode {
            VirtualKeyCode::Key1 => {
                let on = self.lights.bank.toggle(LightId::Point);
                self.anim.set_light_switch(LightId::Point, on);
            }
            VirtualKeyCode::Key2 => {
                let on = self.lights.bank.toggle(LightId::Spot);
                self.anim.set_light_switch(LightId::Spot, on);
            }
            VirtualKeyCode::F => self.anim.toggle_fan(),
            VirtualKeyCode::B => self.anim.toggle_blinds(),
            VirtualKeyCode::G => self.debug_shadow_view = !self.debug_shadow_view,
            _ => {}
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.anim.advance(dt);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // The ceiling point light casts the shadows.
        let shadow_light = self.lights.records[LightId::Point as usize];
        let light_proj = light::light_projection();
        let light_view = light::light_view(&shadow_light);
        let light_eye = Point3::new(
            shadow_light.position[0],
            shadow_light.position[1],
            shadow_light.position[2],
        );
        let num_lights = self.lights.bank.count() as u32;
        let light_mask = self.lights.bank.mask();

        let shadow_draws = self.scene.emit(PassMode::Shadow, &self.anim);
        let shadow_globals = Globals::new(
            light_proj,
            light_view,
            light_proj,
            light_view,
            light_eye,
            num_lights,
            light_mask,
        );
        self.pass.shadow_pass(
            &self.ctx,
            &self.geometry,
            &self.textures,
            &shadow_globals,
            &shadow_draws,
        );

        if self.debug_shadow_view {
            return self.pass.debug_pass(&self.ctx);
        }

        let mirror_proj = cgmath::frustum(-0.2, 0.2, -0.2, 0.2, 0.2, 100.0);
        let mirror_draws = self.scene.emit(PassMode::Mirror, &self.anim);
        let mirror_globals = Globals::new(
            mirror_proj,
            mirror_view(),
            light_proj,
            light_view,
            MIRROR_EYE,
            num_lights,
            light_mask,
        );
        self.pass.mirror_pass(
            &self.ctx,
            &self.geometry,
            &self.textures,
            &mirror_globals,
            &mirror_draws,
        );

        let main_draws = self.scene.emit(PassMode::Main, &self.anim);
        let main_globals = Globals::new(
            Camera::projection(self.ctx.config.width, self.ctx.config.height),
            self.camera.view(),
            light_proj,
            light_view,
            self.camera.eye,
            num_lights,
            light_mask,
        );
        self.pass.main_pass(
            &self.ctx,
            &self.geometry,
            &self.textures,
            &main_globals,
            &main_draws,
        )
    }
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::init();

    let window = Window::new()?;
    let mut state = State::new(&window).await?;

    window.run(move |event| match event {
        WindowEvents::Resized { width, height } => state.resize(width, height),
        WindowEvents::Keyboard {
            state: key_state,
            virtual_keycode,
        } => state.input(&key_state, virtual_keycode),
        WindowEvents::Draw => {
            state.update();
            match state.render() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let (width, height) = (state.ctx.config.width, state.ctx.config.height);
                    state.resize(width, height);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("out of GPU memory, exiting");
                    std::process::exit(1);
                }
                Err(e) => log::warn!("surface error: {:?}", e),
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn mirror_pass_looks_at_the_room_origin() {
        let view = mirror_view();
        // the room origin sits straight ahead of the mirror eye
        let origin = view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.x.abs() < 1e-5);
        assert!(origin.y.abs() < 1e-5);
        let dist = (2.0f32 * 2.0 + 5.1 * 5.1).sqrt();
        assert!((origin.z + dist).abs() < 1e-5);
        // and the eye itself maps to the view-space origin
        let eye = view * Vector4::new(MIRROR_EYE.x, MIRROR_EYE.y, MIRROR_EYE.z, 1.0);
        assert!(eye.x.abs() < 1e-5 && eye.y.abs() < 1e-5 && eye.z.abs() < 1e-5);
    }
}
