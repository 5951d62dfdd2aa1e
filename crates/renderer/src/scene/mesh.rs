//! Mesh asset decoding. Loads a glTF/GLB file into flat per-node geometry
//! the GPU layer can upload directly; node names survive so spin effects can
//! address them.

use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Mat4;

#[derive(Debug, Clone, PartialEq)]
pub struct MeshPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: String,
    pub transform: Mat4,
    pub primitives: Vec<MeshPrimitive>,
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub nodes: Vec<MeshNode>,
}

impl MeshData {
    pub fn load(path: &Path) -> Result<Self> {
        let (document, buffers, _images) = gltf::import(path)
            .with_context(|| format!("failed to import mesh asset {}", path.display()))?;

        let mut nodes = Vec::new();
        for node in document.nodes() {
            let Some(mesh) = node.mesh() else { continue };
            let name = node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("node{}", node.index()));
            let transform = Mat4::from_cols_array_2d(&node.transform().matrix());

            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                let reader = primitive
                    .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
                let positions: Vec<[f32; 3]> = match reader.read_positions() {
                    Some(iter) => iter.collect(),
                    None => continue,
                };
                if positions.is_empty() {
                    continue;
                }
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|iter| iter.collect())
                    .unwrap_or_else(|| vec![[0.0, 0.0, 1.0]; positions.len()]);
                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|iter| iter.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());
                primitives.push(MeshPrimitive {
                    positions,
                    normals,
                    indices,
                });
            }

            if !primitives.is_empty() {
                nodes.push(MeshNode {
                    name,
                    transform,
                    primitives,
                });
            }
        }

        if nodes.is_empty() {
            bail!("mesh asset {} contains no drawable geometry", path.display());
        }
        Ok(Self { nodes })
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.name.as_str())
    }

    pub fn vertex_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| &node.primitives)
            .map(|primitive| primitive.positions.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MeshData {
        MeshData {
            nodes: vec![
                MeshNode {
                    name: "SpaceStation".into(),
                    transform: Mat4::IDENTITY,
                    primitives: vec![MeshPrimitive {
                        positions: vec![[0.0; 3]; 3],
                        normals: vec![[0.0, 0.0, 1.0]; 3],
                        indices: vec![0, 1, 2],
                    }],
                },
                MeshNode {
                    name: "Asteroids".into(),
                    transform: Mat4::IDENTITY,
                    primitives: vec![MeshPrimitive {
                        positions: vec![[1.0; 3]; 4],
                        normals: vec![[0.0, 1.0, 0.0]; 4],
                        indices: vec![0, 1, 2, 2, 3, 0],
                    }],
                },
            ],
        }
    }

    #[test]
    fn node_names_are_addressable() {
        let data = sample();
        let names: Vec<&str> = data.node_names().collect();
        assert_eq!(names, vec!["SpaceStation", "Asteroids"]);
    }

    #[test]
    fn vertex_count_sums_primitives() {
        assert_eq!(sample().vertex_count(), 7);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = MeshData::load(Path::new("/nonexistent/asset.glb")).unwrap_err();
        assert!(err.to_string().contains("asset.glb"));
    }
}
