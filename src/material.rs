use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

pub const MAX_MATERIALS: usize = 8;

/// Phong material palette. Indices are stable because the shaders look
/// materials up by position in a uniform array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialId {
    White,
    OffWhite,
    Blue,
    Black,
    Wood,
    Glass,
    Liquid,
    Tin,
}

/// Uniform-array element. `params.x` is the specular shininess; alpha
/// rides in the diffuse color for the translucent materials.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialRaw {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub params: [f32; 4],
}

impl MaterialRaw {
    fn new(ambient: [f32; 4], diffuse: [f32; 4], specular: [f32; 4], shininess: f32) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            params: [shininess, 0.0, 0.0, 0.0],
        }
    }
}

pub fn material_records() -> Vec<MaterialRaw> {
    vec![
        // White
        MaterialRaw::new(
            [0.5, 0.5, 0.5, 1.0],
            [0.5, 0.5, 0.5, 1.0],
            [0.5, 0.5, 0.5, 1.0],
            32.0,
        ),
        // OffWhite
        MaterialRaw::new(
            [0.7, 0.7, 0.7, 1.0],
            [0.7, 0.7, 0.7, 1.0],
            [0.7, 0.7, 0.7, 1.0],
            32.0,
        ),
        // Blue
        MaterialRaw::new(
            [0.0, 0.0, 0.5, 1.0],
            [0.0, 0.0, 0.8, 1.0],
            [0.0, 0.0, 0.81, 1.0],
            50.0,
        ),
        // Black
        MaterialRaw::new(
            [0.0, 0.0, 0.0, 1.0],
            [0.1, 0.1, 0.1, 1.0],
            [0.8, 0.8, 0.8, 1.0],
            50.0,
        ),
        // Wood
        MaterialRaw::new(
            [0.33, 0.22, 0.03, 1.0],
            [0.38, 0.212, 0.098, 1.0],
            [0.78, 0.64, 0.1, 1.0],
            1.0,
        ),
        // Glass, translucent
        MaterialRaw::new(
            [0.5, 0.5, 0.5, 0.3],
            [0.5, 0.5, 0.5, 0.3],
            [0.5, 0.5, 0.5, 0.3],
            50.0,
        ),
        // Liquid, translucent
        MaterialRaw::new(
            [0.0, 1.0, 0.0, 0.8],
            [0.0, 1.0, 0.0, 0.8],
            [0.0, 1.0, 0.0, 0.8],
            30.0,
        ),
        // Tin
        MaterialRaw::new(
            [0.7, 0.7, 0.7, 1.0],
            [0.7, 0.7, 0.7, 1.0],
            [0.7, 0.7, 0.7, 1.0],
            78.0,
        ),
    ]
}

/// All materials packed into one uniform buffer, uploaded once.
pub struct MaterialTable {
    pub buffer: wgpu::Buffer,
}

impl MaterialTable {
    pub fn new(device: &wgpu::Device) -> Self {
        let mut records = material_records();
        assert!(records.len() <= MAX_MATERIALS);
        records.resize(MAX_MATERIALS, MaterialRaw::zeroed());
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("materials"),
            contents: bytemuck::cast_slice(&records),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        Self { buffer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_fits_uniform_array() {
        let records = material_records();
        assert_eq!(records.len(), 8);
        assert!(records.len() <= MAX_MATERIALS);
    }

    #[test]
    fn material_ids_index_the_palette() {
        let records = material_records();
        let wood = records[MaterialId::Wood as usize];
        assert_eq!(wood.ambient, [0.33, 0.22, 0.03, 1.0]);
        assert_eq!(wood.params[0], 1.0);
        let glass = records[MaterialId::Glass as usize];
        assert_eq!(glass.diffuse[3], 0.3);
        let liquid = records[MaterialId::Liquid as usize];
        assert_eq!(liquid.diffuse, [0.0, 1.0, 0.0, 0.8]);
        let tin = records[MaterialId::Tin as usize];
        assert_eq!(tin.params[0], 78.0);
    }

    #[test]
    fn opaque_materials_have_unit_alpha() {
        let records = material_records();
        for id in [
            MaterialId::White,
            MaterialId::OffWhite,
            MaterialId::Blue,
            MaterialId::Black,
            MaterialId::Wood,
            MaterialId::Tin,
        ] {
            assert_eq!(records[id as usize].diffuse[3], 1.0, "{:?}", id);
        }
    }
}
