use cgmath::{Deg, InnerSpace, Matrix, Matrix4, SquareMatrix, Vector3};

use crate::animation::AnimationState;
use crate::geometry::MeshId;
use crate::material::MaterialId;
use crate::pass::variants::ShaderVariant;
use crate::texture::TextureId;

/// Which of the three renders of the scene is being emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassMode {
    Shadow,
    Mirror,
    Main,
}

/// Names for the scene's objects. Repeated parts (table legs, blind
/// slats) share one id; the id only matters for per-pass filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectId {
    Floor,
    WallEast,
    WallWest,
    WallSouth,
    WallNorth,
    Roof,
    TableTop,
    TableLeg,
    Can,
    ChairSeat,
    ChairPost,
    ChairLeg,
    ChairBack,
    LampPole,
    LampShade,
    LampBase,
    SwitchPlate,
    FanSwitch,
    PointLightSwitch,
    SpotLightSwitch,
    Door,
    Window,
    WindowLining,
    BlindSlat,
    FanMount,
    FanHub,
    FanBlade,
    MirrorFrame,
    Mirror,
    DrinkGlass,
    DrinkLiquid,
}

/// Rotation applied between an object's translate and scale. The
/// animated variants read their angle from `AnimationState` each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotation {
    None,
    Fixed { deg: f32, axis: [f32; 3] },
    Switch1,
    Switch2,
    Switch3,
    Blinds,
    FanBlade { offset: f32 },
}

const X_AXIS: [f32; 3] = [1.0, 0.0, 0.0];
const Y_AXIS: [f32; 3] = [0.0, 1.0, 0.0];
const Z_AXIS: [f32; 3] = [0.0, 0.0, 1.0];

impl Rotation {
    fn resolve(&self, anim: &AnimationState) -> Option<([f32; 3], f32)> {
        match *self {
            Rotation::None => None,
            Rotation::Fixed { deg, axis } => Some((axis, deg)),
            Rotation::Switch1 => Some((Z_AXIS, anim.switch1_ang)),
            Rotation::Switch2 => Some((Z_AXIS, anim.switch2_ang)),
            Rotation::Switch3 => Some((Z_AXIS, anim.switch3_ang)),
            Rotation::Blinds => Some((X_AXIS, anim.blinds_ang)),
            Rotation::FanBlade { offset } => Some((Y_AXIS, anim.blade_ang + offset)),
        }
    }
}

/// How an object gets its surface color: a palette material, a texture,
/// or a texture plus normal map, each with or without shadow sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Shadowed phong shading from the material palette.
    Material(MaterialId),
    /// Unshadowed phong, used for line-drawn geometry.
    LitLines(MaterialId),
    /// Unlit texture sample.
    Texture(TextureId),
    /// Texture with normal mapping, no shadow lookup.
    Bump {
        base: TextureId,
        normal: TextureId,
    },
    /// Texture with normal mapping and shadow sampling.
    BumpShadow {
        base: TextureId,
        normal: TextureId,
    },
}

impl Binding {
    pub fn variant(&self) -> ShaderVariant {
        match self {
            Binding::Material(_) => ShaderVariant::LitShadow,
            Binding::LitLines(_) => ShaderVariant::Lit,
            Binding::Texture(_) => ShaderVariant::Textured,
            Binding::Bump { .. } => ShaderVariant::Bump,
            Binding::BumpShadow { .. } => ShaderVariant::BumpShadow,
        }
    }

    pub fn material_index(&self) -> u32 {
        match self {
            Binding::Material(id) | Binding::LitLines(id) => *id as u32,
            _ => 0,
        }
    }

    /// (base, normal) texture pair; unused slots bind blank.
    pub fn textures(&self) -> (TextureId, TextureId) {
        match *self {
            Binding::Material(_) | Binding::LitLines(_) => (TextureId::Blank, TextureId::Blank),
            Binding::Texture(id) => (id, TextureId::Blank),
            Binding::Bump { base, normal } | Binding::BumpShadow { base, normal } => (base, normal),
        }
    }
}

/// One row of the scene table.
pub struct ObjectDesc {
    pub id: ObjectId,
    pub mesh: MeshId,
    pub translate: [f32; 3],
    pub rotate: Rotation,
    pub scale: [f32; 3],
    pub post_rotate: Option<([f32; 3], f32)>,
    pub binding: Binding,
    pub depth_write: bool,
}

impl ObjectDesc {
    fn new(
        id: ObjectId,
        mesh: MeshId,
        translate: [f32; 3],
        rotate: Rotation,
        scale: [f32; 3],
        binding: Binding,
    ) -> Self {
        Self {
            id,
            mesh,
            translate,
            rotate,
            scale,
            post_rotate: None,
            binding,
            depth_write: true,
        }
    }

    fn post_rotate(mut self, axis: [f32; 3], deg: f32) -> Self {
        self.post_rotate = Some((axis, deg));
        self
    }

    fn no_depth_write(mut self) -> Self {
        self.depth_write = false;
        self
    }
}

/// The room's contents in draw order. Opaque objects first; the two
/// translucent drink objects come last so they blend over everything.
pub fn scene_objects() -> Vec<ObjectDesc> {
    use Binding::*;
    use MeshId::*;
    use ObjectId::*;

    let mut objects = vec![
        ObjectDesc::new(
            Floor,
            TexCube,
            [0.0, 0.0, 0.0],
            Rotation::None,
            [11.0, 0.5, 11.0],
            BumpShadow {
                base: TextureId::Carpet,
                normal: TextureId::CarpetNorm,
            },
        ),
        ObjectDesc::new(
            WallEast,
            Cube,
            [5.5, 2.0, 0.0],
            Rotation::None,
            [0.5, 4.0, 11.0],
            Material(MaterialId::Blue),
        ),
        ObjectDesc::new(
            WallWest,
            Cube,
            [-5.5, 2.0, 0.0],
            Rotation::None,
            [0.5, 4.0, 11.0],
            Material(MaterialId::Blue),
        ),
        ObjectDesc::new(
            WallSouth,
            Cube,
            [0.0, 2.0, 5.5],
            Rotation::None,
            [11.0, 4.0, 0.5],
            Material(MaterialId::Blue),
        ),
        ObjectDesc::new(
            WallNorth,
            Cube,
            [0.0, 2.0, -5.5],
            Rotation::None,
            [11.0, 4.0, 0.5],
            Material(MaterialId::Blue),
        ),
        ObjectDesc::new(
            Roof,
            TexCube,
            [0.0, 4.0, 0.0],
            Rotation::None,
            [11.0, 0.5, 11.0],
            BumpShadow {
                base: TextureId::Roof,
                normal: TextureId::RoofNorm,
            },
        ),
        ObjectDesc::new(
            TableTop,
            TexCube,
            [0.0, 1.5, 0.0],
            Rotation::None,
            [2.0, 0.3, 2.0],
            Bump {
                base: TextureId::Wood,
                normal: TextureId::WoodNorm,
            },
        ),
    ];

    for (x, z) in [(0.85, 0.85), (-0.85, 0.85), (-0.85, -0.85), (0.85, -0.85)] {
        objects.push(ObjectDesc::new(
            TableLeg,
            TexCube,
            [x, 1.0, z],
            Rotation::None,
            [0.3, 1.0, 0.3],
            Bump {
                base: TextureId::Wood,
                normal: TextureId::WoodNorm,
            },
        ));
    }

    objects.push(ObjectDesc::new(
        Can,
        Cylinder,
        [0.5, 1.9, 0.5],
        Rotation::None,
        [0.2, 0.23, 0.2],
        Material(MaterialId::Tin),
    ));

    objects.push(ObjectDesc::new(
        ChairSeat,
        TexCube,
        [0.9, 1.0, 0.0],
        Rotation::None,
        [1.0, 0.1, 1.0],
        Bump {
            base: TextureId::Wood,
            normal: TextureId::WoodNorm,
        },
    ));
    for z in [0.45, -0.45] {
        objects.push(ObjectDesc::new(
            ChairPost,
            TexCube,
            [1.35, 1.0, z],
            Rotation::None,
            [0.1, 2.0, 0.1],
            Bump {
                base: TextureId::Wood,
                normal: TextureId::WoodNorm,
            },
        ));
    }
    for z in [0.45, -0.45] {
        objects.push(ObjectDesc::new(
            ChairLeg,
            TexCube,
            [0.45, 0.7, z],
            Rotation::None,
            [0.1, 0.5, 0.1],
            Bump {
                base: TextureId::Wood,
                normal: TextureId::WoodNorm,
            },
        ));
    }
    // Zero x scale flattens the back into a plane; the normal matrix
    // falls back to identity for it.
    objects.push(ObjectDesc::new(
        ChairBack,
        TexCube,
        [1.35, 1.7, 0.0],
        Rotation::None,
        [0.0, 0.6, 1.0],
        Bump {
            base: TextureId::Wood,
            normal: TextureId::WoodNorm,
        },
    ));

    objects.push(ObjectDesc::new(
        LampPole,
        Cylinder,
        [3.0, 1.0, 3.0],
        Rotation::None,
        [0.15, 1.0, 0.15],
        Material(MaterialId::Black),
    ));
    objects.push(
        ObjectDesc::new(
            LampShade,
            Cone,
            [3.0, 1.9, 3.0],
            Rotation::Fixed {
                deg: 180.0,
                axis: Z_AXIS,
            },
            [0.3, 0.3, 0.3],
            Material(MaterialId::Black),
        )
        .post_rotate([1.0, 0.0, 1.0], 90.0),
    );
    objects.push(ObjectDesc::new(
        LampBase,
        Cone,
        [3.0, 0.45, 3.0],
        Rotation::None,
        [0.4, 0.1, 0.4],
        Material(MaterialId::Black),
    ));

    objects.push(ObjectDesc::new(
        SwitchPlate,
        Cube,
        [-5.2, 2.0, -3.3],
        Rotation::None,
        [0.2, 1.0, 1.7],
        Material(MaterialId::White),
    ));
    objects.push(ObjectDesc::new(
        FanSwitch,
        Cube,
        [-5.1, 2.1, -3.3],
        Rotation::Switch1,
        [0.7, 0.3, 0.3],
        Material(MaterialId::OffWhite),
    ));
    objects.push(ObjectDesc::new(
        PointLightSwitch,
        Cube,
        [-5.1, 2.1, -2.7],
        Rotation::Switch2,
        [0.7, 0.3, 0.3],
        Material(MaterialId::OffWhite),
    ));
    objects.push(ObjectDesc::new(
        SpotLightSwitch,
        Cube,
        [-5.1, 2.1, -3.9],
        Rotation::Switch3,
        [0.7, 0.3, 0.3],
        Material(MaterialId::OffWhite),
    ));

    objects.push(ObjectDesc::new(
        Door,
        TexCube,
        [-5.1, 1.5, 0.0],
        Rotation::Fixed {
            deg: 180.0,
            axis: X_AXIS,
        },
        [0.1, 4.0, 2.0],
        Bump {
            base: TextureId::Door,
            normal: TextureId::DoorNorm,
        },
    ));

    objects.push(ObjectDesc::new(
        Window,
        TexCube,
        [0.0, 2.0, -5.25],
        Rotation::Fixed {
            deg: 180.0,
            axis: Z_AXIS,
        },
        [2.0, 2.0, 0.1],
        Texture(TextureId::Window),
    ));
    for (t, s) in [
        ([1.0, 2.0, -5.25], [0.3, 2.3, 0.5]),
        ([-1.0, 2.0, -5.25], [0.3, 2.3, 0.5]),
        ([0.0, 3.0, -5.25], [2.0, 0.3, 0.5]),
        ([0.0, 1.0, -5.25], [2.0, 0.3, 0.5]),
    ] {
        objects.push(ObjectDesc::new(
            WindowLining,
            Cube,
            t,
            Rotation::None,
            s,
            Material(MaterialId::Wood),
        ));
    }

    for i in 0..20 {
        objects.push(ObjectDesc::new(
            BlindSlat,
            Cube,
            [0.0, 3.0 - 0.1 * i as f32, -5.1],
            Rotation::Blinds,
            [1.68, 0.05, 0.1],
            Material(MaterialId::White),
        ));
    }

    objects.push(ObjectDesc::new(
        FanMount,
        Cylinder,
        [0.0, 3.3, 0.0],
        Rotation::None,
        [0.15, 0.1, 0.15],
        Material(MaterialId::Black),
    ));
    objects.push(ObjectDesc::new(
        FanHub,
        Cylinder,
        [0.0, 3.1, 0.0],
        Rotation::None,
        [0.5, 0.05, 0.5],
        Material(MaterialId::Black),
    ));
    for i in 0..2 {
        objects.push(ObjectDesc::new(
            FanBlade,
            Cube,
            [0.0, 3.1, 0.0],
            Rotation::FanBlade {
                offset: 90.0 * i as f32,
            },
            [2.65, 0.05, 0.4],
            Material(MaterialId::Wood),
        ));
    }

    objects.push(ObjectDesc::new(
        MirrorFrame,
        Frame,
        [0.0, 2.0, 5.1],
        Rotation::Fixed {
            deg: -90.0,
            axis: X_AXIS,
        },
        [1.5, 1.0, 1.5],
        LitLines(MaterialId::White),
    ));
    objects.push(ObjectDesc::new(
        ObjectId::Mirror,
        MeshId::Mirror,
        [0.0, 2.0, 5.1],
        Rotation::Fixed {
            deg: -90.0,
            axis: X_AXIS,
        },
        [1.5, 1.0, 1.5],
        Texture(TextureId::Mirror),
    ));

    objects.push(
        ObjectDesc::new(
            DrinkGlass,
            Mug,
            [0.0, 1.6, 0.0],
            Rotation::None,
            [0.25, 0.25, 0.25],
            Material(MaterialId::Glass),
        )
        .no_depth_write(),
    );
    objects.push(
        ObjectDesc::new(
            DrinkLiquid,
            Cylinder,
            [0.0, 1.9, 0.0],
            Rotation::None,
            [0.2, 0.2, 0.2],
            Material(MaterialId::Liquid),
        )
        .no_depth_write(),
    );

    objects
}

/// Resolved per-object draw parameters for one pass of one frame.
pub struct DrawCall {
    pub object: ObjectId,
    pub mesh: MeshId,
    pub model: Matrix4<f32>,
    pub normal: Option<Matrix4<f32>>,
    pub variant: ShaderVariant,
    pub binding: Binding,
    pub depth_write: bool,
}

pub struct Scene {
    objects: Vec<ObjectDesc>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: scene_objects(),
        }
    }

    /// Emits this frame's draw calls for one pass, in table order. The
    /// shadow pass redirects everything through the depth-only variant
    /// and leaves out the mirror surface plus anything that never
    /// writes depth, so the translucent drink casts no shadow; the
    /// mirror pass leaves out both the mirror and its frame so the
    /// reflection does not contain itself.
    pub fn emit(&self, pass: PassMode, anim: &AnimationState) -> Vec<DrawCall> {
        self.objects
            .iter()
            .filter(|desc| match pass {
                PassMode::Shadow => desc.id != ObjectId::Mirror && desc.depth_write,
                PassMode::Mirror => {
                    desc.id != ObjectId::Mirror && desc.id != ObjectId::MirrorFrame
                }
                PassMode::Main => true,
            })
            .map(|desc| {
                let model = model_matrix(desc, anim);
                let (variant, normal) = match pass {
                    PassMode::Shadow => (ShaderVariant::ShadowDepth, None),
                    _ => (desc.binding.variant(), Some(normal_matrix(&model))),
                };
                DrawCall {
                    object: desc.id,
                    mesh: desc.mesh,
                    model,
                    normal,
                    variant,
                    binding: desc.binding,
                    depth_write: desc.depth_write,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn axis_rotation(axis: [f32; 3], deg: f32) -> Matrix4<f32> {
    Matrix4::from_axis_angle(Vector3::from(axis).normalize(), Deg(deg))
}

fn model_matrix(desc: &ObjectDesc, anim: &AnimationState) -> Matrix4<f32> {
    let mut model = Matrix4::from_translation(Vector3::from(desc.translate));
    if let Some((axis, deg)) = desc.rotate.resolve(anim) {
        model = model * axis_rotation(axis, deg);
    }
    model = model
        * Matrix4::from_nonuniform_scale(desc.scale[0], desc.scale[1], desc.scale[2]);
    if let Some((axis, deg)) = desc.post_rotate {
        model = model * axis_rotation(axis, deg);
    }
    model
}

/// Inverse-transpose of the model matrix. Singular models (flattened
/// geometry) fall back to identity rather than aborting the frame.
fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    model
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or_else(Matrix4::identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mats_close(a: Matrix4<f32>, b: Matrix4<f32>) -> bool {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    fn find(calls: &[DrawCall], id: ObjectId) -> &DrawCall {
        calls.iter().find(|c| c.object == id).unwrap()
    }

    #[test]
    fn table_has_the_full_room() {
        let scene = Scene::new();
        assert_eq!(scene.len(), 59);
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        assert_eq!(calls.len(), 59);
        let slats = calls
            .iter()
            .filter(|c| c.object == ObjectId::BlindSlat)
            .count();
        assert_eq!(slats, 20);
    }

    #[test]
    fn shadow_pass_skips_mirror_and_non_writers() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Shadow, &AnimationState::new());
        assert_eq!(calls.len(), 56);
        assert!(calls.iter().all(|c| c.object != ObjectId::Mirror));
        assert!(calls.iter().any(|c| c.object == ObjectId::MirrorFrame));
        // the drink never writes depth, so it cannot cast a shadow
        assert!(calls.iter().all(|c| c.object != ObjectId::DrinkGlass));
        assert!(calls.iter().all(|c| c.object != ObjectId::DrinkLiquid));
        for call in &calls {
            assert_eq!(call.variant, ShaderVariant::ShadowDepth);
            assert!(call.normal.is_none());
            assert!(call.depth_write);
        }
    }

    #[test]
    fn mirror_pass_skips_mirror_and_frame() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Mirror, &AnimationState::new());
        assert_eq!(calls.len(), 57);
        assert!(calls.iter().all(|c| c.object != ObjectId::Mirror));
        assert!(calls.iter().all(|c| c.object != ObjectId::MirrorFrame));
        assert!(calls.iter().all(|c| c.normal.is_some()));
    }

    #[test]
    fn floor_model_matrix_is_a_scale() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let floor = find(&calls, ObjectId::Floor);
        let expected = Matrix4::from_nonuniform_scale(11.0, 0.5, 11.0);
        assert!(mats_close(floor.model, expected));
    }

    #[test]
    fn east_wall_is_translated_then_scaled() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let wall = find(&calls, ObjectId::WallEast);
        let expected = Matrix4::from_translation(Vector3::new(5.5, 2.0, 0.0))
            * Matrix4::from_nonuniform_scale(0.5, 4.0, 11.0);
        assert!(mats_close(wall.model, expected));
    }

    #[test]
    fn door_rotates_before_scaling() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let door = find(&calls, ObjectId::Door);
        let expected = Matrix4::from_translation(Vector3::new(-5.1, 1.5, 0.0))
            * Matrix4::from_axis_angle(Vector3::unit_x(), Deg(180.0))
            * Matrix4::from_nonuniform_scale(0.1, 4.0, 2.0);
        assert!(mats_close(door.model, expected));
    }

    #[test]
    fn lamp_shade_applies_its_trailing_rotation() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let shade = find(&calls, ObjectId::LampShade);
        let expected = Matrix4::from_translation(Vector3::new(3.0, 1.9, 3.0))
            * Matrix4::from_axis_angle(Vector3::unit_z(), Deg(180.0))
            * Matrix4::from_nonuniform_scale(0.3, 0.3, 0.3)
            * Matrix4::from_axis_angle(Vector3::new(1.0, 0.0, 1.0).normalize(), Deg(90.0));
        assert!(mats_close(shade.model, expected));
    }

    #[test]
    fn flattened_chair_back_gets_identity_normal_matrix() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let back = find(&calls, ObjectId::ChairBack);
        assert!(mats_close(back.normal.unwrap(), Matrix4::identity()));
        // a regular object gets a real inverse-transpose
        let wall = find(&calls, ObjectId::WallEast);
        assert!(!mats_close(wall.normal.unwrap(), Matrix4::identity()));
    }

    #[test]
    fn fan_blades_track_the_animation_angle() {
        let scene = Scene::new();
        let mut anim = AnimationState::new();
        anim.advance(1.0);
        let calls = scene.emit(PassMode::Main, &anim);
        let blades: Vec<_> = calls
            .iter()
            .filter(|c| c.object == ObjectId::FanBlade)
            .collect();
        assert_eq!(blades.len(), 2);
        let expected = Matrix4::from_translation(Vector3::new(0.0, 3.1, 0.0))
            * Matrix4::from_axis_angle(Vector3::unit_y(), Deg(anim.blade_ang))
            * Matrix4::from_nonuniform_scale(2.65, 0.05, 0.4);
        assert!(mats_close(blades[0].model, expected));
        assert!(!mats_close(blades[0].model, blades[1].model));
    }

    #[test]
    fn translucent_drink_draws_last_without_depth_writes() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let n = calls.len();
        assert_eq!(calls[n - 2].object, ObjectId::DrinkGlass);
        assert_eq!(calls[n - 1].object, ObjectId::DrinkLiquid);
        assert!(!calls[n - 2].depth_write);
        assert!(!calls[n - 1].depth_write);
        assert!(calls[..n - 2].iter().all(|c| c.depth_write));
    }

    #[test]
    fn bindings_resolve_variants_and_textures() {
        let scene = Scene::new();
        let calls = scene.emit(PassMode::Main, &AnimationState::new());
        let floor = find(&calls, ObjectId::Floor);
        assert_eq!(floor.variant, ShaderVariant::BumpShadow);
        assert_eq!(
            floor.binding.textures(),
            (TextureId::Carpet, TextureId::CarpetNorm)
        );
        let wall = find(&calls, ObjectId::WallEast);
        assert_eq!(wall.variant, ShaderVariant::LitShadow);
        assert_eq!(wall.binding.material_index(), MaterialId::Blue as u32);
        let frame = find(&calls, ObjectId::MirrorFrame);
        assert_eq!(frame.variant, ShaderVariant::Lit);
        let mirror = find(&calls, ObjectId::Mirror);
        assert_eq!(mirror.variant, ShaderVariant::Textured);
        assert_eq!(mirror.binding.textures().0, TextureId::Mirror);
        let lining = find(&calls, ObjectId::WindowLining);
        assert_eq!(lining.mesh, MeshId::Cube);
        assert_eq!(lining.variant, ShaderVariant::LitShadow);
        assert_eq!(lining.binding.material_index(), MaterialId::Wood as u32);
    }
}
