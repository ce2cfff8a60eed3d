use std::path::Path;

use anyhow::{bail, Context};
use glam::{vec3, Vec3};

use crate::mesh_vert::MeshVert;

/// An indexed triangle list, as loaded from disk or generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    pub verts: Vec<MeshVert>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    /// Load by file extension: `.gltf`/`.glb` or `.obj`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("gltf" | "glb") => Self::from_gltf(path),
            Some("obj") => Self::from_obj(path),
            _ => bail!("unsupported mesh format: {}", path.display()),
        }
    }

    /// Every triangle primitive of the first mesh in the file, concatenated. Node transforms are
    /// ignored.
    pub fn from_gltf(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let (doc, buffers, _) =
            gltf::import(path).with_context(|| format!("failed to import {}", path.display()))?;

        let mesh = doc
            .meshes()
            .next()
            .with_context(|| format!("{} contains no meshes", path.display()))?;

        let mut tri_mesh = TriMesh::default();

        for p in mesh.primitives() {
            if p.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping non-triangle primitive {} of {}", p.index(), path.display());
                continue;
            }

            let reader = p.reader(|buffer| Some(&buffers[buffer.index()]));
            let base = tri_mesh.verts.len() as u32;

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .with_context(|| format!("primitive {} has no positions", p.index()))?
                .collect();
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(iter) => iter.collect(),
                None => vec![[0.0; 3]; positions.len()],
            };

            tri_mesh.verts.extend(
                positions
                    .iter()
                    .zip(&normals)
                    .map(|(&p, &n)| MeshVert::new(p.into(), n.into())),
            );

            match reader.read_indices() {
                Some(indices) => tri_mesh
                    .indices
                    .extend(indices.into_u32().map(|i| i + base)),
                None => tri_mesh
                    .indices
                    .extend((0..positions.len() as u32).map(|i| i + base)),
            }
        }

        Ok(tri_mesh)
    }

    /// All polygons of every object in the file, fan triangulated. Vertices are keyed by position
    /// index; a position takes the normal of the first corner that references it.
    pub fn from_obj(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let obj = obj::Obj::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        let data = obj.data;

        let mut normals = vec![None; data.position.len()];
        let mut indices = Vec::new();

        for poly in data
            .objects
            .iter()
            .flat_map(|o| &o.groups)
            .flat_map(|g| &g.polys)
        {
            for tuple in &poly.0 {
                if tuple.0 >= data.position.len() {
                    bail!(
                        "{} references position {} of {}",
                        path.display(),
                        tuple.0,
                        data.position.len()
                    );
                }
                if let Some(n) = tuple.2.and_then(|n| data.normal.get(n)) {
                    normals[tuple.0].get_or_insert(*n);
                }
            }

            for i in 1..poly.0.len().saturating_sub(1) {
                indices.extend([poly.0[0].0, poly.0[i].0, poly.0[i + 1].0].map(|v| v as u32));
            }
        }

        let verts = data
            .position
            .iter()
            .zip(normals)
            .map(|(&p, n)| MeshVert::new(p.into(), n.unwrap_or_default().into()))
            .collect();

        Ok(TriMesh { verts, indices })
    }

    pub fn num_tris(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat `n` by `n` quad grid over the unit square in the xy plane, facing +z.
    pub fn plane(n: u32) -> Self {
        let n = n.max(1);
        let mut verts = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
        for y in 0..=n {
            for x in 0..=n {
                let p = vec3(x as f32 / n as f32, y as f32 / n as f32, 0.0);
                verts.push(MeshVert::new(p, Vec3::Z));
            }
        }

        let mut indices = Vec::with_capacity((n * n * 6) as usize);
        for y in 0..n {
            for x in 0..n {
                let a = y * (n + 1) + x;
                let b = a + 1;
                let c = b + n + 1;
                let d = a + n + 1;
                indices.extend([a, b, c, a, c, d]);
            }
        }

        TriMesh { verts, indices }
    }

    /// Closed unit cube, two triangles per face, wound counter-clockwise seen from outside.
    pub fn cube() -> Self {
        let verts = (0..8)
            .map(|i| {
                // Bit 0 and 1 walk the square 0,1,2,3 counter-clockwise, bit 2 is z
                let x = (i & 1) ^ ((i >> 1) & 1);
                let p = vec3(x as f32, ((i >> 1) & 1) as f32, (i >> 2) as f32);
                MeshVert::new(p, (p - 0.5).normalize())
            })
            .collect();

        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];

        TriMesh { verts, indices }
    }

    /// Closed UV sphere of unit radius with `rings` latitude bands and `segments` longitude bands.
    pub fn uv_sphere(rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let mut verts = vec![MeshVert::new(Vec3::Y, Vec3::Y)];
        for r in 1..rings {
            let theta = std::f32::consts::PI * r as f32 / rings as f32;
            for s in 0..segments {
                let phi = std::f32::consts::TAU * s as f32 / segments as f32;
                let p = vec3(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                verts.push(MeshVert::new(p, p));
            }
        }
        let bottom = verts.len() as u32;
        verts.push(MeshVert::new(-Vec3::Y, -Vec3::Y));

        let ring = |r: u32, s: u32| 1 + r * segments + s % segments;
        let mut indices = Vec::new();
        for s in 0..segments {
            indices.extend([0, ring(0, s + 1), ring(0, s)]);
        }
        for r in 0..rings - 2 {
            for s in 0..segments {
                let (a, b) = (ring(r, s), ring(r, s + 1));
                let (c, d) = (ring(r + 1, s + 1), ring(r + 1, s));
                indices.extend([a, b, c, a, c, d]);
            }
        }
        for s in 0..segments {
            indices.extend([bottom, ring(rings - 2, s), ring(rings - 2, s + 1)]);
        }

        TriMesh { verts, indices }
    }
}
