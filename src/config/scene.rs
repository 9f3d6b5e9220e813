use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 轨道相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 初始轨道半径
    pub radius: f32,

    /// 初始极角（弧度）
    pub phi: f32,

    /// 初始方位角（弧度）
    pub theta: f32,

    /// 指针水平位移到方位角的灵敏度
    pub sensitivity_theta: f32,

    /// 指针垂直位移到极角的灵敏度
    pub sensitivity_phi: f32,

    /// 半径下限，滚轮缩放后生效
    pub min_radius: f32,

    /// 垂直视场角（度）
    pub fov_y_degrees: f32,

    /// 近裁剪面
    pub near: f32,

    /// 远裁剪面
    pub far: f32,
}

impl_default!(CameraConfig {
    radius: 10.0,
    phi: std::f32::consts::FRAC_PI_2,
    theta: 0.0,
    sensitivity_theta: 0.001,
    sensitivity_phi: 0.001,
    min_radius: 0.1,
    fov_y_degrees: 90.0,
    near: 1.0,
    far: 10_000.0,
});

impl CameraConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.radius > 0.0) || !(self.min_radius > 0.0) {
            return Err(ConfigError::ValidationError(
                "Camera radius and min_radius must be positive".to_string(),
            ));
        }
        if !(self.near > 0.0) || self.near >= self.far {
            return Err(ConfigError::ValidationError(
                "Camera clip planes need 0 < near < far".to_string(),
            ));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(ConfigError::ValidationError(
                "Camera fov must lie in (0, 180) degrees".to_string(),
            ));
        }
        Ok(())
    }
}

/// 模型变换初始参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub translate: [f32; 3],
    /// 绕 X/Y/Z 轴的旋转（弧度）
    pub rotate: [f32; 3],
    pub scale: [f32; 3],
}

impl_default!(TransformConfig {
    translate: [0.0; 3],
    rotate: [0.0; 3],
    scale: [0.1; 3],
});
