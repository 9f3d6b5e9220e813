use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 输入配置
///
/// 键盘驱动模型变换时每次按键的步长。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// 平移步长（世界单位）
    pub translate_step: f32,

    /// 旋转步长（弧度）
    pub rotate_step: f32,

    /// 缩放步长（每次加减的比例）
    pub scale_step: f32,

    /// 像素滚动量折算为一行滚动所需的像素数
    pub pixels_per_scroll_line: f32,
}

impl_default!(InputConfig {
    translate_step: 0.05,
    rotate_step: 0.05,
    scale_step: 0.01,
    pixels_per_scroll_line: 20.0,
});
