/// One corner of a face, already converted to 0-based indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawCorner {
    pub vert: usize,
    pub text: Option<usize>,
    pub norm: Option<usize>,
}

pub struct RawFace {
    pub corners: Vec<RawCorner>,
}

/// How many of each record had been read when the face appeared.
/// Needed to resolve negative (relative) indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCounts {
    pub verts: usize,
    pub text: usize,
    pub norms: usize,
}

impl RawFace {
    /// `raw_arg` is everything after the leading `f`.
    pub fn new(raw_arg: &str, counts: RecordCounts) -> Result<RawFace, String> {
        let corners = raw_arg
            .split_whitespace()
            .map(|corner| RawFace::parse_corner(corner, counts))
            .collect::<Result<Vec<_>, _>>()?;

        if corners.len() < 3 {
            return Err(format!("face needs at least 3 corners, got {}", corners.len()));
        }

        Ok(RawFace { corners })
    }

    /// Fan triangulation. Call with invert = true if the model uses a clockwise
    /// winding order (Blender exports are a common example).
    pub fn triangles(&self, invert: bool) -> impl Iterator<Item = [RawCorner; 3]> + '_ {
        let first = self.corners[0];
        self.corners.windows(2).skip(1).map(move |pair| {
            if invert {
                [first, pair[1], pair[0]]
            } else {
                [first, pair[0], pair[1]]
            }
        })
    }

    fn parse_corner(corner: &str, counts: RecordCounts) -> Result<RawCorner, String> {
        let mut parts = corner.split('/');

        let vert = match parts.next() {
            Some(v) if !v.is_empty() => resolve(v, counts.verts, "vertex")?,
            _ => return Err(format!("face corner {corner:?} has no vertex index")),
        };
        let text = match parts.next() {
            Some(t) if !t.is_empty() => Some(resolve(t, counts.text, "texture coordinate")?),
            _ => None,
        };
        let norm = match parts.next() {
            Some(n) if !n.is_empty() => Some(resolve(n, counts.norms, "normal")?),
            _ => None,
        };

        if parts.next().is_some() {
            return Err(format!("face corner {corner:?} has too many components"));
        }

        Ok(RawCorner { vert, text, norm })
    }
}

// .obj files aren't 0-indexed, and negative indices count back from the end
fn resolve(raw: &str, len: usize, what: &str) -> Result<usize, String> {
    let index: i64 = raw
        .parse()
        .map_err(|_| format!("invalid {what} index {raw:?}"))?;

    let resolved = match index {
        0 => return Err(format!("{what} index 0 is not valid in OBJ")),
        i if i > 0 => i as usize - 1,
        i => {
            let back = i.unsigned_abs() as usize;
            if back > len {
                return Err(format!("relative {what} index {i} reaches before the first record"));
            }
            len - back
        }
    };

    if resolved >= len {
        return Err(format!(
            "{what} index {index} out of range ({len} defined so far)"
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTS: RecordCounts = RecordCounts {
        verts: 4,
        text: 4,
        norms: 1,
    };

    #[test]
    fn parses_all_corner_forms() {
        let face = RawFace::new("1 2/3 3//1 4/4/1", COUNTS).unwrap();
        assert_eq!(
            face.corners,
            vec![
                RawCorner { vert: 0, text: None, norm: None },
                RawCorner { vert: 1, text: Some(2), norm: None },
                RawCorner { vert: 2, text: None, norm: Some(0) },
                RawCorner { vert: 3, text: Some(3), norm: Some(0) },
            ]
        );
    }

    #[test]
    fn resolves_relative_indices() {
        let face = RawFace::new("-1 -2 -3", COUNTS).unwrap();
        let verts: Vec<_> = face.corners.iter().map(|c| c.vert).collect();
        assert_eq!(verts, vec![3, 2, 1]);
    }

    #[test]
    fn fan_triangulates_quads() {
        let face = RawFace::new("1 2 3 4", COUNTS).unwrap();
        let tris: Vec<[usize; 3]> = face
            .triangles(false)
            .map(|t| [t[0].vert, t[1].vert, t[2].vert])
            .collect();
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);

        let inverted: Vec<[usize; 3]> = face
            .triangles(true)
            .map(|t| [t[0].vert, t[1].vert, t[2].vert])
            .collect();
        assert_eq!(inverted, vec![[0, 2, 1], [0, 3, 2]]);
    }

    #[test]
    fn rejects_bad_faces() {
        assert!(RawFace::new("1 2", COUNTS).is_err());
        assert!(RawFace::new("1 2 9", COUNTS).is_err());
        assert!(RawFace::new("0 1 2", COUNTS).is_err());
        assert!(RawFace::new("1 2 x", COUNTS).is_err());
        assert!(RawFace::new("1 2 -5", COUNTS).is_err());
        assert!(RawFace::new("1/1/1/1 2 3", COUNTS).is_err());
    }
}
