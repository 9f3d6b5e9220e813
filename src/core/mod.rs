//! 核心模块
//!
//! 包含查看器的核心功能：
//! - `engine` - 启动流程和 winit 事件循环
//! - `frame_loop` - 每帧的状态机
//! - `timing` - 帧计时与模拟时钟
//! - `error` - 错误类型定义

pub mod engine;
pub mod error;
pub mod frame_loop;
pub mod timing;
#[macro_use]
pub mod macros;


// 重新导出错误类型
pub use error::{
    AssetError, AssetResult, PlatformError, PlatformResult, RenderError, RenderResult,
    ViewerError, ViewerResult,
};

// 重新导出主要类型
pub use engine::Engine;
pub use frame_loop::{FrameLoop, FrameOutcome, FrameRenderer, LoopState, TickReport};
pub use timing::{FpsReport, FrameTiming, SimulationClock, StepMode};
