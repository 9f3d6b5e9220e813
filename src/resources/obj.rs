//! OBJ 模型读取
//!
//! 只处理 `v`/`vt`/`vn`/`f`，多边形面按扇形拆成三角形，结果按顶点展开（不共享索引）。

use crate::core::error::{AssetError, AssetResult};
use std::path::Path;

/// 展开后的顶点数据，三个数组按下标一一对应
///
/// 文件中没有纹理坐标或法线时对应数组为空。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
}

impl ObjModel {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }
}

pub fn load_obj(path: &Path) -> AssetResult<ObjModel> {
    let bytes = super::read_asset(path)?;
    let text = String::from_utf8(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
    let model = parse_obj(&text).map_err(|reason| AssetError::InvalidFormat {
        path: path.display().to_string(),
        expected: format!("OBJ ({})", reason),
    })?;
    tracing::info!(
        target: "assets",
        path = %path.display(),
        vertices = model.vertex_count(),
        "Loaded OBJ model"
    );
    Ok(model)
}

#[derive(Clone, Copy)]
struct FaceVertex {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

pub fn parse_obj(text: &str) -> Result<ObjModel, String> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<[FaceVertex; 3]> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("");
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();
        match keyword {
            "v" => {
                let v = parse_numbers::<3>(&rest, line_no)?;
                positions.push(v);
            }
            "vt" => {
                // v 与 w 可省略，w 不使用
                let [u] = parse_numbers::<1>(&rest, line_no)?;
                let v = match rest.get(1) {
                    Some(token) => parse_number(token, line_no)?,
                    None => 0.0,
                };
                uvs.push([u, v]);
            }
            "vn" => {
                let v = parse_numbers::<3>(&rest, line_no)?;
                normals.push(v);
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(format!("line {}: face needs at least 3 vertices", line_no + 1));
                }
                let corners = rest
                    .iter()
                    .map(|t| {
                        parse_face_vertex(t, positions.len(), uvs.len(), normals.len())
                            .map_err(|e| format!("line {}: {}", line_no + 1, e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                for i in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    let with_uvs = faces.iter().flatten().all(|c| c.uv.is_some()) && !faces.is_empty();
    let with_normals = faces.iter().flatten().all(|c| c.normal.is_some()) && !faces.is_empty();

    let mut model = ObjModel::default();
    for corner in faces.iter().flatten() {
        model.positions.push(positions[corner.position]);
        if with_uvs {
            if let Some(i) = corner.uv {
                model.uvs.push(uvs[i]);
            }
        }
        if with_normals {
            if let Some(i) = corner.normal {
                model.normals.push(normals[i]);
            }
        }
    }
    Ok(model)
}

fn parse_numbers<const N: usize>(tokens: &[&str], line_no: usize) -> Result<[f32; N], String> {
    if tokens.len() < N {
        return Err(format!("line {}: expected {} numbers", line_no + 1, N));
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = parse_number(token, line_no)?;
    }
    Ok(out)
}

fn parse_number(token: &str, line_no: usize) -> Result<f32, String> {
    token
        .parse()
        .map_err(|_| format!("line {}: invalid number '{}'", line_no + 1, token))
}

/// `v`、`v/vt`、`v//vn`、`v/vt/vn`，索引从 1 开始，负数表示从末尾倒数
fn parse_face_vertex(
    token: &str,
    position_count: usize,
    uv_count: usize,
    normal_count: usize,
) -> Result<FaceVertex, String> {
    let mut parts = token.split('/');
    let position = resolve_index(parts.next(), position_count)?
        .ok_or_else(|| format!("face vertex '{}' has no position", token))?;
    let uv = resolve_index(parts.next(), uv_count)?;
    let normal = resolve_index(parts.next(), normal_count)?;
    Ok(FaceVertex {
        position,
        uv,
        normal,
    })
}

fn resolve_index(part: Option<&str>, count: usize) -> Result<Option<usize>, String> {
    let part = match part {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(None),
    };
    let raw: i64 = part
        .parse()
        .map_err(|_| format!("invalid index '{}'", part))?;
    let index = if raw > 0 {
        raw - 1
    } else {
        count as i64 + raw
    };
    if raw == 0 || index < 0 || index >= count as i64 {
        return Err(format!("index {} out of range (have {})", raw, count));
    }
    Ok(Some(index as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let model = parse_obj(QUAD).unwrap();
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.uvs.len(), 6);
        assert_eq!(model.normals.len(), 6);
        assert_eq!(model.positions[3], [0.0, 0.0, 0.0]);
        assert_eq!(model.positions[5], [0.0, 1.0, 0.0]);
        assert_eq!(model.uvs[4], [1.0, 1.0]);
    }

    #[test]
    fn test_positions_only() {
        let model = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(model.vertex_count(), 3);
        assert!(!model.has_uvs());
        assert!(!model.has_normals());
    }

    #[test]
    fn test_negative_indices() {
        let model = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(model.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(model.positions[2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_texture_coordinate_component_counts() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5
vt 0.25 0.75
vt 1 1 0
f 1/1 2/2 3/3
";
        let model = parse_obj(text).unwrap();
        assert_eq!(model.uvs, vec![[0.5, 0.0], [0.25, 0.75], [1.0, 1.0]]);
        assert!(parse_obj("vt\n").is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(parse_obj("v 0 0 0\nf 1 2 3\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(QUAD.as_bytes()).unwrap();
        let model = load_obj(file.path()).unwrap();
        assert_eq!(model.vertex_count(), 6);
    }
}
