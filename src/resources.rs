use std::path::{Path, PathBuf};

use anyhow::Context;

/// Flat per-vertex arrays with OBJ indices already applied.
pub struct MeshData {
    pub positions: Vec<[f32; 4]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
}

fn resource_dir() -> PathBuf {
    Path::new(env!("OUT_DIR")).join("res")
}

pub fn load_image(file_name: &str) -> anyhow::Result<image::DynamicImage> {
    let path = resource_dir().join("textures").join(file_name);
    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    image::load_from_memory(&data).with_context(|| format!("decoding {}", path.display()))
}

/// Loads an OBJ model into flat triangle-list vertex data. Any I/O or
/// parse failure is fatal for the asset and propagates to startup.
pub fn load_mesh(file_name: &str) -> anyhow::Result<MeshData> {
    let path = resource_dir().join("models").join(file_name);
    let (models, _materials) = tobj::load_obj(
        &path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("loading model {}", path.display()))?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut tex_coords = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        for &index in &mesh.indices {
            let i = index as usize;
            positions.push([
                mesh.positions[3 * i],
                mesh.positions[3 * i + 1],
                mesh.positions[3 * i + 2],
                1.0,
            ]);
            if mesh.normals.is_empty() {
                normals.push([0.0, 1.0, 0.0]);
            } else {
                normals.push([
                    mesh.normals[3 * i],
                    mesh.normals[3 * i + 1],
                    mesh.normals[3 * i + 2],
                ]);
            }
            if mesh.texcoords.is_empty() {
                tex_coords.push([0.0, 0.0]);
            } else {
                tex_coords.push([mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]]);
            }
        }
    }

    anyhow::ensure!(!positions.is_empty(), "model {} has no vertices", file_name);
    log::info!("loaded {} ({} vertices)", file_name, positions.len());

    Ok(MeshData {
        positions,
        normals,
        tex_coords,
    })
}
