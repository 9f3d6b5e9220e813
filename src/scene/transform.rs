//! 模型变换合成
//!
//! 合成顺序固定为 `Rx · Ry · Rz · T · S`：几何体先缩放、再平移，
//! 最后在已平移的空间里依次绕 Z、Y、X 轴旋转。

use crate::config::TransformConfig;
use glam::{Mat4, Vec3};

/// 平移 / 旋转 / 缩放参数，三者相互独立
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParameters {
    pub translate: Vec3,
    /// 每个轴一个角度（弧度），不回绕
    pub rotate: Vec3,
    pub scale: Vec3,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl From<&TransformConfig> for TransformParameters {
    fn from(config: &TransformConfig) -> Self {
        Self {
            translate: Vec3::from_array(config.translate),
            rotate: Vec3::from_array(config.rotate),
            scale: Vec3::from_array(config.scale),
        }
    }
}

/// 键盘等输入对变换参数的增量修改
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformAction {
    Translate(Vec3),
    Rotate(Vec3),
    /// 对三个轴同时加上同一比例
    Scale(f32),
}

impl TransformParameters {
    pub fn apply(&mut self, action: TransformAction) {
        match action {
            TransformAction::Translate(d) => self.translate += d,
            TransformAction::Rotate(d) => self.rotate += d,
            TransformAction::Scale(d) => self.scale += Vec3::splat(d),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        TransformComposer::compose(self.translate, self.rotate, self.scale)
    }
}

/// 模型矩阵合成器（无状态）
pub struct TransformComposer;

impl TransformComposer {
    /// 合成模型矩阵：`Rx · Ry · Rz · Translate · Scale`
    pub fn compose(translate: Vec3, rotate_xyz: Vec3, scale: Vec3) -> Mat4 {
        let scale_matrix = Mat4::from_scale(scale);
        let translate_matrix = Mat4::from_translation(translate);
        let rot_x = Mat4::from_rotation_x(rotate_xyz.x);
        let rot_y = Mat4::from_rotation_y(rotate_xyz.y);
        let rot_z = Mat4::from_rotation_z(rotate_xyz.z);

        rot_x * rot_y * rot_z * translate_matrix * scale_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_scale_only() {
        let scale = Vec3::new(0.1, 2.0, 3.5);
        let m = TransformComposer::compose(Vec3::ZERO, Vec3::ZERO, scale);
        assert_eq!(m, Mat4::from_scale(scale));
    }

    #[test]
    fn test_translate_only() {
        let t = Vec3::new(1.0, -2.0, 0.25);
        let m = TransformComposer::compose(t, Vec3::ZERO, Vec3::ONE);
        assert_eq!(m, Mat4::from_translation(t));
    }

    #[test]
    fn test_rotation_applied_after_translation() {
        // 先平移到 +X，再绕 Z 旋转 90°，点应落在 +Y 上
        let m = TransformComposer::compose(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, FRAC_PI_2),
            Vec3::ONE,
        );
        let p = m.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_x_rotation_outermost() {
        // 绕 Z 再绕 X：+X 轴先转到 +Y，再被 X 旋转转到 +Z
        let m = TransformComposer::compose(
            Vec3::ZERO,
            Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2),
            Vec3::ONE,
        );
        let p = m.transform_vector3(Vec3::X);
        assert!((p - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_actions_accumulate() {
        let mut params = TransformParameters::default();
        params.apply(TransformAction::Translate(Vec3::X));
        params.apply(TransformAction::Rotate(Vec3::new(0.0, 0.5, 0.0)));
        params.apply(TransformAction::Scale(-0.5));
        assert_eq!(params.translate, Vec3::X);
        assert_eq!(params.rotate.y, 0.5);
        assert_eq!(params.scale, Vec3::splat(0.5));
    }

    proptest! {
        #[test]
        fn scale_then_translate_moves_origin_to_translation(
            tx in -100.0f32..100.0,
            ty in -100.0f32..100.0,
            tz in -100.0f32..100.0,
            s in 0.01f32..10.0,
        ) {
            let t = Vec3::new(tx, ty, tz);
            let m = TransformComposer::compose(t, Vec3::ZERO, Vec3::splat(s));
            prop_assert_eq!(m.transform_point3(Vec3::ZERO), t);
            prop_assert_eq!(m.transform_vector3(Vec3::X), Vec3::new(s, 0.0, 0.0));
        }
    }
}
