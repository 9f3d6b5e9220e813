//! 场景状态
//!
//! 轨道相机与模型变换。两者都只持有参数，矩阵每帧由参数重新推导。

pub mod camera;
pub mod transform;

pub use camera::{CameraParameters, CameraRig, Perspective, WORLD_UP};
pub use transform::{TransformAction, TransformComposer, TransformParameters};
