//! 模型网格
//!
//! 读取器给出的三角形在这里展开成 `Vertex3D` 顶点流，再上传成 GPU 缓冲。

use crate::resources::{LoadedModel, ObjModel, Triangle};
use glam::Vec3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3D {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU 侧网格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let (a, b, c) = (Vec3::from(a), Vec3::from(b), Vec3::from(c));
    (b - a).cross(c - a).normalize_or_zero().to_array()
}

impl MeshData {
    /// STL 三角形；文件里法线为零时用面法线代替
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        for t in triangles {
            let [a, b, c] = t.vertices;
            let normal = if Vec3::from(t.normal).length_squared() > 0.0 {
                t.normal
            } else {
                face_normal(a, b, c)
            };
            vertices.extend(t.vertices.iter().map(|&pos| Vertex3D {
                pos,
                normal,
                uv: [0.0, 0.0],
            }));
        }
        Self::sequential(vertices)
    }

    /// OBJ 顶点流；缺失的法线按三角形补面法线，缺失的纹理坐标为零
    pub fn from_obj(model: &ObjModel) -> Self {
        let vertices = model
            .positions
            .chunks_exact(3)
            .enumerate()
            .flat_map(|(tri, corners)| {
                let flat = face_normal(corners[0], corners[1], corners[2]);
                (0..3).map(move |k| {
                    let i = tri * 3 + k;
                    Vertex3D {
                        pos: corners[k],
                        normal: model.normals.get(i).copied().unwrap_or(flat),
                        uv: model.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    }
                })
            })
            .collect();
        Self::sequential(vertices)
    }

    pub fn from_model(model: &LoadedModel) -> Self {
        match model {
            LoadedModel::Stl(triangles) => Self::from_triangles(triangles),
            LoadedModel::Obj(obj) => Self::from_obj(obj),
        }
    }

    fn sequential(vertices: Vec<Vertex3D>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, vertices: &[Vertex3D], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn upload(device: &wgpu::Device, mesh: &MeshData) -> Self {
        Self::new(device, &mesh.vertices, &mesh.indices)
    }
}
