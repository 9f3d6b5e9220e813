//! # Particle Viewer
//!
//! 基于 wgpu 的三维粒子/模型查看器。
//!
//! ## Features
//!
//! - **Particle Simulation**: 立方体内随机初始化的粒子在重力作用下运动，越界后回绕
//! - **Orbit Camera**: 指针拖动改变方位角/极角，滚轮缩放半径
//! - **Model Transform**: 键盘控制平移、旋转与缩放
//! - **Offscreen Rendering**: 可选的离屏目标，完整性检查通过后才进入帧循环
//! - **Asset Loading**: STL（二进制/ASCII）、OBJ 模型与位图贴图
//!
//! ## Modules
//!
//! - [`core`]: 查看器入口、帧循环、错误与计时
//! - [`config`]: TOML/JSON 配置
//! - [`platform`]: 窗口与输入抽象
//! - [`render`]: 渲染器、着色器服务、离屏目标与帧计划
//! - [`resources`]: 模型与贴图加载
//! - [`scene`]: 轨道相机与模型变换

/// 查看器入口、帧循环、错误与计时
pub mod core;
/// 配置系统
pub mod config;
/// 窗口与输入抽象
pub mod platform;
/// 渲染系统
pub mod render;
/// 模型与贴图加载
pub mod resources;
/// 相机与模型变换
pub mod scene;
