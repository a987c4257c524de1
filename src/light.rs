use bytemuck::Zeroable;
use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

pub const MAX_LIGHTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightId {
    Point,
    Spot,
}

/// Uniform-array element shared by every lit shader variant.
/// `params` packs (kind, cutoff degrees, exponent, unused); kind 0 is a
/// point light, 1 a spotlight.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub params: [f32; 4],
}

pub fn light_records() -> Vec<LightRaw> {
    vec![
        // Ceiling point light, white
        LightRaw {
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            position: [0.0, 2.8, 0.0, 1.0],
            direction: [0.0, -1.0, 0.0, 0.0],
            params: [0.0, 0.0, 0.0, 0.0],
        },
        // Standing lamp spotlight, red
        LightRaw {
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse: [1.0, 0.0, 0.0, 1.0],
            specular: [1.0, 0.0, 0.0, 1.0],
            position: [2.0, 1.8, 2.0, 1.0],
            direction: [-1.0, 0.0, -1.0, 0.0],
            params: [1.0, 20.0, 20.0, 0.0],
        },
    ]
}

/// On/off switches for the light set, kept CPU side and sent to the
/// shaders as a bitmask each frame.
pub struct LightBank {
    on: [bool; MAX_LIGHTS],
    count: usize,
}

impl LightBank {
    pub fn new(count: usize) -> Self {
        let mut on = [false; MAX_LIGHTS];
        for flag in on.iter_mut().take(count) {
            *flag = true;
        }
        Self { on, count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_on(&self, id: LightId) -> bool {
        self.on[id as usize]
    }

    /// Flips the light and returns its new state.
    pub fn toggle(&mut self, id: LightId) -> bool {
        let i = id as usize;
        self.on[i] = !self.on[i];
        self.on[i]
    }

    /// Bit i set means light i contributes this frame.
    pub fn mask(&self) -> u32 {
        self.on
            .iter()
            .take(self.count)
            .enumerate()
            .fold(0u32, |m, (i, &on)| if on { m | (1 << i) } else { m })
    }
}

/// Light definitions packed into one uniform buffer plus the CPU-side
/// switch bank. The records never change after startup; only the mask does.
pub struct LightTable {
    pub buffer: wgpu::Buffer,
    pub bank: LightBank,
    pub records: Vec<LightRaw>,
}

impl LightTable {
    pub fn new(device: &wgpu::Device) -> Self {
        let records = light_records();
        assert!(records.len() <= MAX_LIGHTS);
        let mut padded = records.clone();
        padded.resize(MAX_LIGHTS, LightRaw::zeroed());
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights"),
            contents: bytemuck::cast_slice(&padded),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bank = LightBank::new(records.len());
        Self {
            buffer,
            bank,
            records,
        }
    }
}

/// Projection used for the shadow depth pass.
pub fn light_projection() -> Matrix4<f32> {
    cgmath::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 20.0)
}

/// View matrix looking out from a light along its direction. The up
/// vector must not be collinear with the direction, so straight-up or
/// straight-down lights fall back to +Z.
pub fn light_view(light: &LightRaw) -> Matrix4<f32> {
    let pos = Point3::new(light.position[0], light.position[1], light.position[2]);
    let dir = Vector3::new(light.direction[0], light.direction[1], light.direction[2]);
    let up = if dir.cross(Vector3::unit_y()).magnitude2() < 1e-8 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    Matrix4::look_at_rh(pos, pos + dir, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn two_lights_start_on() {
        let bank = LightBank::new(2);
        assert_eq!(bank.count(), 2);
        assert!(bank.is_on(LightId::Point));
        assert!(bank.is_on(LightId::Spot));
        assert_eq!(bank.mask(), 0b11);
    }

    #[test]
    fn toggling_flips_only_that_bit() {
        let mut bank = LightBank::new(2);
        assert!(!bank.toggle(LightId::Spot));
        assert_eq!(bank.mask(), 0b01);
        assert!(bank.toggle(LightId::Spot));
        assert_eq!(bank.mask(), 0b11);
        assert!(!bank.toggle(LightId::Point));
        assert_eq!(bank.mask(), 0b10);
    }

    #[test]
    fn point_light_sits_below_ceiling_fan() {
        let records = light_records();
        assert!(records.len() <= MAX_LIGHTS);
        let point = records[LightId::Point as usize];
        assert_eq!(point.position, [0.0, 2.8, 0.0, 1.0]);
        assert_eq!(point.params[0], 0.0);
        let spot = records[LightId::Spot as usize];
        assert_eq!(spot.params, [1.0, 20.0, 20.0, 0.0]);
    }

    #[test]
    fn light_views_are_finite_and_invertible() {
        for light in light_records() {
            let view = light_view(&light);
            let m: [[f32; 4]; 4] = view.into();
            assert!(m.iter().flatten().all(|v| v.is_finite()), "{:?}", m);
            assert!(view.invert().is_some());
        }
    }

    #[test]
    fn straight_down_light_gets_a_valid_view() {
        // the ceiling light points along -Y, collinear with the default up
        let light = &light_records()[LightId::Point as usize];
        assert_eq!(light.direction, [0.0, -1.0, 0.0, 0.0]);
        let m: [[f32; 4]; 4] = light_view(light).into();
        assert!(m.iter().flatten().all(|v| v.is_finite()), "{:?}", m);
    }
}
