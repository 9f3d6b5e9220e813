use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// 窗口标题
    pub title: String,

    /// 初始分辨率
    pub resolution: Resolution,

    /// 垂直同步
    pub vsync: bool,
}

impl_default!(WindowConfig {
    title: "Particle Viewer".to_string(),
    resolution: Resolution::default(),
    vsync: true,
});

impl WindowConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid window resolution".to_string(),
            ));
        }
        Ok(())
    }
}

/// 分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

impl_default!(Resolution {
    width: 640,
    height: 480,
});

/// 渲染目标纹理格式
///
/// 颜色与深度格式共用一个枚举，角色是否正确由离屏目标的完整性检查判定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    Depth32Float,
    Depth24Plus,
    Depth24PlusStencil8,
}

impl TargetFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TargetFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TargetFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TargetFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            TargetFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            TargetFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TargetFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
            TargetFormat::Depth24Plus => wgpu::TextureFormat::Depth24Plus,
            TargetFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        }
    }
}

/// 渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 清屏颜色 (RGBA)
    pub clear_color: [f32; 4],

    /// 窗口表面使用的深度格式
    pub depth_format: TargetFormat,

    /// 离屏渲染目标
    pub offscreen: OffscreenConfig,

    /// 着色器覆盖目录，存在同名 `.wgsl` 文件时替换内置源码
    pub shader_dir: Option<PathBuf>,

    /// 需要绘制的模型
    pub model: Option<ModelConfig>,
}

impl_default!(RenderConfig {
    clear_color: [0.0, 0.0, 0.0, 1.0],
    depth_format: TargetFormat::Depth32Float,
    offscreen: OffscreenConfig::default(),
    shader_dir: None,
    model: None,
});

impl RenderConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.offscreen.validate()?;
        if let Some(model) = &self.model {
            if model.path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Model path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// 离屏渲染目标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OffscreenConfig {
    /// 是否启用两遍渲染（离屏 + 呈现）
    pub enabled: bool,

    /// 宽度（像素），与窗口大小无关
    pub width: u32,

    /// 高度（像素）
    pub height: u32,

    /// 颜色附件格式
    pub color_format: TargetFormat,

    /// 深度附件格式
    pub depth_format: TargetFormat,
}

impl_default!(OffscreenConfig {
    enabled: false,
    width: 1024,
    height: 1024,
    color_format: TargetFormat::Rgba8UnormSrgb,
    depth_format: TargetFormat::Depth32Float,
});

impl OffscreenConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled && (self.width == 0 || self.height == 0) {
            return Err(ConfigError::ValidationError(
                "Offscreen target needs a non-zero size".to_string(),
            ));
        }
        Ok(())
    }
}

/// 模型文件配置（`.stl` 或 `.obj`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 模型路径
    pub path: PathBuf,

    /// 可选贴图
    #[serde(default)]
    pub texture: Option<PathBuf>,
}
