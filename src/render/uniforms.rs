//! 逐帧 uniform 数据

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// 场景 uniform，布局与 WGSL 中的 `SceneUniforms` 一致
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// x = 本帧 dt，y = 累计运行秒数，其余保留
    pub params: [f32; 4],
}

impl SceneUniforms {
    pub fn new(view: Mat4, projection: Mat4, model: Mat4, delta_time: f32, elapsed: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            params: [delta_time, elapsed, 0.0, 0.0],
        }
    }

    pub fn delta_time(&self) -> f32 {
        self.params[0]
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_wgsl() {
        // 3 个 mat4x4<f32> + 1 个 vec4<f32>
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 3 * 64 + 16);
    }

    #[test]
    fn test_matrices_are_column_major() {
        let model = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let u = SceneUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, model, 0.016, 1.0);
        assert_eq!(u.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.model_matrix(), model);
        assert_eq!(u.delta_time(), 0.016);
    }
}
