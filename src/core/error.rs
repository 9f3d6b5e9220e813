//! 统一错误处理模块
//!
//! ## 错误类型分层
//!
//! - **启动期错误**：窗口/设备创建、着色器编译、程序链接、离屏目标完整性检查。
//!   任何一个失败都会在进入帧循环之前终止进程。
//! - **帧内错误**：只有表面丢失一类可恢复情况，由渲染器自行重建表面；
//!   显存耗尽视为致命错误。
//!
//! `ViewerError` 汇总所有层级的错误，供 `main` 打印诊断信息。

use crate::config::ConfigError;
use crate::render::offscreen::Completeness;
use thiserror::Error;

/// 查看器顶层错误类型
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Shader '{label}' failed to compile:\n{log}")]
    ShaderCompilation { label: String, log: String },

    #[error("Program '{label}' failed to link:\n{log}")]
    ProgramLink { label: String, log: String },

    #[error("Render target '{label}' is not complete: {status}")]
    IncompleteTarget { label: String, status: Completeness },

    #[error("Invalid pass graph: {0}")]
    InvalidPassGraph(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

/// 资源加载错误
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    #[error("Failed to load asset: {path}, reason: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Invalid asset format: {path}, expected: {expected}")]
    InvalidFormat { path: String, expected: String },

    #[error("Asset decode error: {0}")]
    Decode(String),
}

/// 平台层错误
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// 查看器结果类型别名
pub type ViewerResult<T> = Result<T, ViewerError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type AssetResult<T> = Result<T, AssetError>;
pub type PlatformResult<T> = Result<T, PlatformError>;
