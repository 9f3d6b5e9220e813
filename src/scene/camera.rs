//! 轨道相机
//!
//! 相机位置由 `(radius, phi, theta)` 球坐标描述，始终看向原点。
//! 视图矩阵每帧从参数重新计算，不单独保存。

use crate::config::CameraConfig;
use glam::{Mat4, Vec3};

/// 固定的世界上方向
pub const WORLD_UP: Vec3 = Vec3::Y;

/// 轨道相机参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParameters {
    /// 到原点的距离
    pub radius: f32,
    /// 极角（与 +Y 轴的夹角）
    pub phi: f32,
    /// 方位角（XZ 平面内，从 +X 起算）
    pub theta: f32,
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            radius: 10.0,
            phi: std::f32::consts::FRAC_PI_2,
            theta: 0.0,
        }
    }
}

/// 透视投影参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Perspective {
    /// 右手系透视矩阵，`aspect` 为帧缓冲宽高比
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

/// 轨道相机
///
/// 角度不做任何回绕或限制；半径在滚轮缩放后被限制在 `min_radius` 以上。
/// `phi` 为 0 或 π 时相机位于上方向轴上，look-at 基底退化，视图方向未定义。
#[derive(Debug, Clone)]
pub struct CameraRig {
    params: CameraParameters,
    sensitivity_theta: f32,
    sensitivity_phi: f32,
    min_radius: f32,
    perspective: Perspective,
}

impl CameraRig {
    pub fn new(params: CameraParameters) -> Self {
        Self::from_config(&CameraConfig {
            radius: params.radius,
            phi: params.phi,
            theta: params.theta,
            ..CameraConfig::default()
        })
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            params: CameraParameters {
                radius: config.radius,
                phi: config.phi,
                theta: config.theta,
            },
            sensitivity_theta: config.sensitivity_theta,
            sensitivity_phi: config.sensitivity_phi,
            min_radius: config.min_radius,
            perspective: Perspective {
                fov_y: config.fov_y_degrees.to_radians(),
                near: config.near,
                far: config.far,
            },
        }
    }

    pub fn params(&self) -> CameraParameters {
        self.params
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// 应用本帧指针位移（像素）
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.params.theta += dx * self.sensitivity_theta;
        self.params.phi += dy * self.sensitivity_phi;
    }

    /// 应用滚轮位移，直接加到半径上
    pub fn apply_scroll_delta(&mut self, dy: f32) {
        self.params.radius = (self.params.radius + dy).max(self.min_radius);
    }

    /// 世界空间中的相机位置
    pub fn eye(&self) -> Vec3 {
        let CameraParameters { radius, phi, theta } = self.params;
        radius
            * Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            )
    }

    /// 看向原点的视图矩阵
    pub fn compute_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, WORLD_UP)
    }

    /// 投影矩阵
    pub fn compute_projection(&self, framebuffer: (u32, u32)) -> Mat4 {
        let (w, h) = framebuffer;
        let aspect = if h == 0 { 1.0 } else { w as f32 / h as f32 };
        self.perspective.matrix(aspect)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
