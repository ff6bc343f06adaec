use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use nalgebra_glm::{cross, normalize, vec3, TVec3};

use super::{
    face::{RawCorner, RawFace, RecordCounts},
    MeshData, TexturedVertex,
};
use crate::error::{Result, ViewerError};

/// Raw records of a Wavefront OBJ file.
pub struct Loader {
    source: PathBuf,
    vertices: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    text: Vec<[f32; 2]>,
    faces: Vec<RawFace>,
    invert: bool,
}

// Normals either come from the file or are computed per triangle, so
// corners are only merged when they agree on where the normal came from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum NormalKey {
    Index(usize),
    Face(usize),
}

impl Loader {
    pub fn new(file_name: impl AsRef<Path>, invert: bool) -> Result<Loader> {
        let path = file_name.as_ref();
        info!("Loading mesh {}", path.display());
        let input = fs::read_to_string(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Loader::parse(&input, path, invert)
    }

    /// `origin` is only used to label errors.
    pub fn parse(input: &str, origin: &Path, invert: bool) -> Result<Loader> {
        let mut loader = Loader {
            source: origin.to_path_buf(),
            vertices: Vec::new(),
            normals: Vec::new(),
            text: Vec::new(),
            faces: Vec::new(),
            invert,
        };

        for (number, line) in input.lines().enumerate() {
            let line = line.trim();
            let (keyword, rest) = match line.split_once(char::is_whitespace) {
                Some((keyword, rest)) => (keyword, rest),
                None => (line, ""),
            };

            let parsed = match keyword {
                "v" => parse_floats::<3>(rest).map(|v| loader.vertices.push(v)),
                "vn" => parse_floats::<3>(rest).map(|n| loader.normals.push(n)),
                "vt" => parse_floats::<2>(rest).map(|t| loader.text.push(t)),
                "f" => RawFace::new(rest, loader.counts()).map(|f| loader.faces.push(f)),
                _ => Ok(()),
            };

            parsed.map_err(|message| ViewerError::ObjParse {
                path: origin.to_path_buf(),
                line: number + 1,
                message,
            })?;
        }

        if loader.faces.is_empty() {
            return Err(ViewerError::EmptyMesh(origin.to_path_buf()));
        }

        debug!(
            "{}: {} vertices, {} normals, {} texcoords, {} faces",
            origin.display(),
            loader.vertices.len(),
            loader.normals.len(),
            loader.text.len(),
            loader.faces.len()
        );

        Ok(loader)
    }

    fn counts(&self) -> RecordCounts {
        RecordCounts {
            verts: self.vertices.len(),
            text: self.text.len(),
            norms: self.normals.len(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Builds an indexed mesh, merging corners that share position,
    /// texture coordinate and normal.
    pub fn as_mesh_data(&self) -> MeshData {
        let mut mesh = MeshData::default();
        let mut seen: HashMap<(usize, Option<usize>, NormalKey), u32> = HashMap::new();
        let mut triangle = 0;

        for face in &self.faces {
            for corners in face.triangles(self.invert) {
                let face_normal = self.face_normal(&corners);

                for corner in corners {
                    let normal_key = match corner.norm {
                        Some(n) => NormalKey::Index(n),
                        None => NormalKey::Face(triangle),
                    };

                    let index = *seen
                        .entry((corner.vert, corner.text, normal_key))
                        .or_insert_with(|| {
                            mesh.vertices.push(self.vertex(corner, face_normal));
                            (mesh.vertices.len() - 1) as u32
                        });
                    mesh.indices.push(index);
                }

                triangle += 1;
            }
        }

        mesh
    }

    fn vertex(&self, corner: RawCorner, face_normal: [f32; 3]) -> TexturedVertex {
        // flip v so the image's first row is the top of the texture
        let tex_coord = corner
            .text
            .map(|t| [self.text[t][0], 1.0 - self.text[t][1]])
            .unwrap_or([0.0, 0.0]);

        TexturedVertex {
            position: self.vertices[corner.vert],
            tex_coord,
            normal: corner.norm.map(|n| self.normals[n]).unwrap_or(face_normal),
        }
    }

    fn face_normal(&self, corners: &[RawCorner; 3]) -> [f32; 3] {
        let p = |c: &RawCorner| -> TVec3<f32> {
            let v = self.vertices[c.vert];
            vec3(v[0], v[1], v[2])
        };
        let (a, b, c) = (p(&corners[0]), p(&corners[1]), p(&corners[2]));
        let n = cross(&(b - a), &(c - a));
        if n.norm() <= f32::EPSILON {
            return [0.0, 1.0, 0.0];
        }
        let n = normalize(&n);
        [n.x, n.y, n.z]
    }
}

fn parse_floats<const N: usize>(rest: &str) -> std::result::Result<[f32; N], String> {
    let mut out = [0.0; N];
    let mut parts = rest.split_whitespace();
    for slot in out.iter_mut() {
        let raw = parts
            .next()
            .ok_or_else(|| format!("expected {N} numbers, got {rest:?}"))?;
        *slot = raw
            .parse()
            .map_err(|_| format!("invalid number {raw:?}"))?;
    }
    // `v` may carry an optional w, `vt` an optional w; both are ignored
    Ok(out)
}
