//! STL 模型读取
//!
//! 支持二进制与 ASCII 两种格式。二进制格式：80 字节头 + u32 三角形数 +
//! 每个三角形 50 字节（法线、三个顶点、2 字节属性）。

use crate::core::error::{AssetError, AssetResult};
use std::path::Path;

/// 单个三角形，法线可能为零（由使用方自行计算）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub normal: [f32; 3],
    pub vertices: [[f32; 3]; 3],
}

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

pub fn load_stl(path: &Path) -> AssetResult<Vec<Triangle>> {
    let bytes = super::read_asset(path)?;
    let triangles = parse_stl(&bytes).map_err(|reason| AssetError::InvalidFormat {
        path: path.display().to_string(),
        expected: format!("STL ({})", reason),
    })?;
    tracing::info!(
        target: "assets",
        path = %path.display(),
        triangles = triangles.len(),
        "Loaded STL model"
    );
    Ok(triangles)
}

/// 根据内容判断格式并解析
///
/// 以 `solid` 开头的文件也可能是二进制（有些导出工具会这样写头部），
/// 所以先看长度是否与二进制格式的三角形数一致。
pub fn parse_stl(bytes: &[u8]) -> Result<Vec<Triangle>, String> {
    if binary_len_matches(bytes) {
        return parse_binary(bytes);
    }
    if bytes.starts_with(b"solid") {
        let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
        return parse_ascii(text);
    }
    parse_binary(bytes)
}

fn binary_len_matches(bytes: &[u8]) -> bool {
    match read_count(bytes) {
        Some(count) => bytes.len() == HEADER_LEN + 4 + count * TRIANGLE_LEN,
        None => false,
    }
}

fn read_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
}

fn read_vec3(chunk: &[u8]) -> [f32; 3] {
    let f = |i: usize| f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
    [f(0), f(4), f(8)]
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<Triangle>, String> {
    let count = read_count(bytes).ok_or_else(|| "truncated header".to_string())?;
    let body = &bytes[HEADER_LEN + 4..];
    if body.len() < count * TRIANGLE_LEN {
        return Err(format!(
            "header declares {} triangles but only {} bytes follow",
            count,
            body.len()
        ));
    }

    Ok(body
        .chunks_exact(TRIANGLE_LEN)
        .take(count)
        .map(|chunk| Triangle {
            normal: read_vec3(&chunk[0..12]),
            vertices: [
                read_vec3(&chunk[12..24]),
                read_vec3(&chunk[24..36]),
                read_vec3(&chunk[36..48]),
            ],
        })
        .collect())
}

fn parse_ascii(text: &str) -> Result<Vec<Triangle>, String> {
    let mut triangles = Vec::new();
    let mut normal = [0.0; 3];
    let mut vertices: Vec<[f32; 3]> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                // facet normal nx ny nz
                let rest: Vec<&str> = tokens.skip(1).collect();
                normal = parse_floats(&rest, line_no)?;
                vertices.clear();
            }
            Some("vertex") => {
                let rest: Vec<&str> = tokens.collect();
                vertices.push(parse_floats(&rest, line_no)?);
            }
            Some("endfacet") => {
                if vertices.len() != 3 {
                    return Err(format!(
                        "line {}: facet has {} vertices",
                        line_no + 1,
                        vertices.len()
                    ));
                }
                triangles.push(Triangle {
                    normal,
                    vertices: [vertices[0], vertices[1], vertices[2]],
                });
                vertices.clear();
            }
            _ => {}
        }
    }
    Ok(triangles)
}

fn parse_floats(tokens: &[&str], line_no: usize) -> Result<[f32; 3], String> {
    if tokens.len() < 3 {
        return Err(format!("line {}: expected 3 numbers", line_no + 1));
    }
    let mut out = [0.0; 3];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .map_err(|_| format!("line {}: invalid number '{}'", line_no + 1, token))?;
    }
    Ok(out)
}
