//! 粒子数据布局
//!
//! CPU 端直接以 GPU 顶点缓冲的内存布局保存粒子，上传时无需转换。

/// 单个粒子（48 字节，16 字节对齐的三个 vec4）
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuParticle {
    /// xyz 为位置，w 为质量（分配后不再改变）
    pub position: [f32; 4],
    /// RGBA 颜色
    pub color: [f32; 4],
    /// xyz 为速度，w 仅用于对齐
    pub velocity: [f32; 4],
}

impl GpuParticle {
    pub fn new(position: [f32; 3], mass: f32, color: [f32; 3]) -> Self {
        Self {
            position: [position[0], position[1], position[2], mass],
            color: [color[0], color[1], color[2], 1.0],
            velocity: [0.0; 4],
        }
    }

    pub fn mass(&self) -> f32 {
        self.position[3]
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuParticle>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// 域回绕：越过正边界的分量被放到负边界，反之亦然
///
/// 区间内的值原样返回，因此重复回绕不会改变结果。
#[inline]
pub fn wrap_component(p: f32, bound: f32) -> f32 {
    if p > bound {
        -bound
    } else if p < -bound {
        bound
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_size() {
        assert_eq!(std::mem::size_of::<GpuParticle>(), 48);
        assert_eq!(GpuParticle::desc().array_stride, 48);
    }

    #[test]
    fn test_wrap_teleports() {
        assert_eq!(wrap_component(1.2, 1.0), -1.0);
        assert_eq!(wrap_component(-3.0, 1.0), 1.0);
        assert_eq!(wrap_component(1.0, 1.0), 1.0);
        assert_eq!(wrap_component(-0.5, 1.0), -0.5);
    }

    proptest! {
        #[test]
        fn wrap_lands_in_domain_and_is_idempotent(p in -1.0e6f32..1.0e6) {
            let once = wrap_component(p, 1.0);
            prop_assert!((-1.0..=1.0).contains(&once));
            prop_assert_eq!(wrap_component(once, 1.0), once);
        }
    }
}
