//! 粒子模块
//!
//! ## 每帧流程
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  1. Simulation (CPU)                          │
//! │     - v += gravity * mass * dt                │
//! │     - x += v * dt                             │
//! │     - 逐分量环形回绕到 [-b, b]                 │
//! │                                               │
//! │  2. Upload                                    │
//! │     - 整个粒子数组写入顶点缓冲，布局不变        │
//! │                                               │
//! │  3. Rendering (Vertex + Fragment Shader)      │
//! │     - PointList 绘制                          │
//! └──────────────────────────────────────────────┘
//! ```

pub mod particle;
pub mod system;

pub use particle::{wrap_component, GpuParticle};
pub use system::{ParticleSystem, DEFAULT_MASS_RANGE};
