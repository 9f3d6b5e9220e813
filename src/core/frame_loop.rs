//! 帧循环状态机
//!
//! ## 状态
//!
//! 只有 `Running` 和 `ShouldClose` 两个状态，唯一的转换是收到关闭请求
//! （窗口关闭或 Escape）。没有暂停状态。
//!
//! ## 每个 tick
//!
//! ```text
//! 1. 取指针位移/滚轮/按键 → CameraRig、TransformParameters
//! 2. 重新计算 view / projection / model
//! 3. 以实测帧间隔推进粒子系统
//! 4. 上传粒子缓冲（完整的存活粒子，布局不变）
//! 5. 上传 uniform（矩阵 + dt）
//! 6. 按 FramePlan 执行各 pass
//! 7. 呈现
//! 8. 更新帧计数，每满一个窗口输出一次平均帧率
//! ```
//!
//! 渲染通过 `FrameRenderer` 抽象，帧循环本身不依赖 GPU。

use crate::config::ViewerConfig;
use crate::core::error::RenderResult;
use crate::core::timing::{FpsReport, FrameTiming, SimulationClock};
use crate::platform::{InputEvent, InputState};
use crate::render::graph::FramePlan;
use crate::render::particles::{GpuParticle, ParticleSystem};
use crate::render::uniforms::SceneUniforms;
use crate::scene::{CameraRig, TransformParameters};
use glam::Vec3;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShouldClose,
}

/// 一帧绘制的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// 表面暂时不可用（丢失/过期），已重建，本帧跳过
    Skipped,
}

/// 帧循环需要的渲染能力
pub trait FrameRenderer {
    /// 当前窗口帧缓冲尺寸
    fn framebuffer_size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn upload_particles(&mut self, particles: &[GpuParticle]);
    fn upload_uniforms(&mut self, uniforms: &SceneUniforms);
    /// 按顺序执行计划中的 pass 并呈现
    fn draw(&mut self, plan: &FramePlan) -> RenderResult<FrameOutcome>;
}

/// 单个 tick 的摘要
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub delta_time: f32,
    pub substeps: usize,
    pub outcome: FrameOutcome,
    pub fps: Option<FpsReport>,
}

pub struct FrameLoop {
    state: LoopState,
    input: InputState,
    camera: CameraRig,
    transform: TransformParameters,
    particles: ParticleSystem,
    gravity: Vec3,
    clock: SimulationClock,
    timing: FrameTiming,
    plan: FramePlan,
    elapsed: f32,
    frame_index: u64,
}

impl FrameLoop {
    pub fn new(config: &ViewerConfig, plan: FramePlan, start: Instant) -> Self {
        let particles = ParticleSystem::from_config(&config.particles);
        Self::with_particles(config, particles, plan, start)
    }

    pub fn with_particles(
        config: &ViewerConfig,
        particles: ParticleSystem,
        plan: FramePlan,
        start: Instant,
    ) -> Self {
        tracing::info!(
            target: "engine",
            particles = particles.len(),
            passes = plan.passes().len(),
            offscreen = plan.uses_offscreen(),
            "Frame loop ready"
        );
        Self {
            state: LoopState::Running,
            input: InputState::new(config.input.clone()),
            camera: CameraRig::from_config(&config.camera),
            transform: TransformParameters::from(&config.transform),
            particles,
            gravity: Vec3::from_array(config.particles.gravity),
            clock: SimulationClock::new(config.particles.step),
            timing: FrameTiming::new(start, config.timing.fps_window),
            plan,
            elapsed: 0.0,
            frame_index: 0,
        }
    }

    /// 记录一个输入事件，在下一个 tick 开始时生效
    pub fn push_event(&mut self, event: &InputEvent) {
        self.input.push(event);
        if self.input.close_requested() {
            self.state = LoopState::ShouldClose;
        }
    }

    pub fn request_close(&mut self) {
        self.input.request_close();
        self.state = LoopState::ShouldClose;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn transform(&self) -> &TransformParameters {
        &self.transform
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// 执行一帧；处于 `ShouldClose` 时什么也不做并返回 None
    pub fn tick<R: FrameRenderer>(
        &mut self,
        now: Instant,
        renderer: &mut R,
    ) -> RenderResult<Option<TickReport>> {
        if self.input.close_requested() {
            self.state = LoopState::ShouldClose;
        }
        if self.state == LoopState::ShouldClose {
            return Ok(None);
        }

        // 1. input
        if let Some((width, height)) = self.input.take_resize() {
            renderer.resize(width, height);
        }
        let pointer = self.input.take_pointer_delta();
        self.camera.apply_pointer_delta(pointer.dx, pointer.dy);
        let scroll = self.input.take_scroll();
        if scroll != 0.0 {
            self.camera.apply_scroll_delta(scroll);
        }
        for action in self.input.take_transform_actions() {
            self.transform.apply(action);
        }

        // 2. matrices
        let view = self.camera.compute_view();
        let projection = self.camera.compute_projection(renderer.framebuffer_size());
        let model = self.transform.model_matrix();

        // 3. simulation
        let (delta_time, fps) = self.timing.tick(now);
        let steps = self.clock.advance(delta_time);
        for &dt in &steps {
            self.particles.step(dt, self.gravity);
        }
        self.elapsed += delta_time;

        // 4-5. uploads
        renderer.upload_particles(self.particles.particles());
        renderer.upload_uniforms(&SceneUniforms::new(
            view,
            projection,
            model,
            delta_time,
            self.elapsed,
        ));

        // 6-7. draw + present
        let outcome = renderer.draw(&self.plan)?;
        if outcome == FrameOutcome::Skipped {
            tracing::debug!(target: "frame", frame = self.frame_index, "Frame skipped");
        }

        // 8. timing
        if let Some(report) = fps {
            tracing::info!(
                target: "frame",
                frames = report.frames,
                elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
                fps = report.average_fps(),
                frame_ms = report.average_frame_ms(),
                "Average frame rate"
            );
        }
        self.frame_index += 1;

        Ok(Some(TickReport {
            delta_time,
            substeps: steps.len(),
            outcome,
            fps,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::KeyCode;
    use std::time::Duration;

    #[derive(Default)]
    struct NullRenderer {
        draws: usize,
        uploaded: usize,
        resized: Option<(u32, u32)>,
    }

    impl FrameRenderer for NullRenderer {
        fn framebuffer_size(&self) -> (u32, u32) {
            self.resized.unwrap_or((640, 480))
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.resized = Some((width, height));
        }
        fn upload_particles(&mut self, particles: &[GpuParticle]) {
            self.uploaded = particles.len();
        }
        fn upload_uniforms(&mut self, _uniforms: &SceneUniforms) {}
        fn draw(&mut self, _plan: &FramePlan) -> RenderResult<FrameOutcome> {
            self.draws += 1;
            Ok(FrameOutcome::Presented)
        }
    }

    fn small_config() -> ViewerConfig {
        let mut config = ViewerConfig::default();
        config.particles.count = 16;
        config.particles.seed = Some(1);
        config.timing.fps_window = 3;
        config
    }

    #[test]
    fn test_tick_runs_until_close() {
        let start = Instant::now();
        let mut frame_loop = FrameLoop::new(&small_config(), FramePlan::direct(), start);
        let mut renderer = NullRenderer::default();

        let report = frame_loop
            .tick(start + Duration::from_millis(16), &mut renderer)
            .unwrap()
            .unwrap();
        assert_eq!(report.substeps, 1);
        assert_eq!(renderer.uploaded, 16);
        assert_eq!(renderer.draws, 1);

        frame_loop.push_event(&InputEvent::KeyPressed {
            key: KeyCode::Escape,
            modifiers: Default::default(),
        });
        assert_eq!(frame_loop.state(), LoopState::ShouldClose);
        assert!(frame_loop
            .tick(start + Duration::from_millis(32), &mut renderer)
            .unwrap()
            .is_none());
        assert_eq!(renderer.draws, 1);
    }

    #[test]
    fn test_fps_reported_every_window() {
        let start = Instant::now();
        let mut frame_loop = FrameLoop::new(&small_config(), FramePlan::direct(), start);
        let mut renderer = NullRenderer::default();

        let reports: Vec<_> = (1..=6)
            .map(|i| {
                frame_loop
                    .tick(start + Duration::from_millis(10 * i), &mut renderer)
                    .unwrap()
                    .unwrap()
                    .fps
            })
            .collect();
        assert_eq!(reports.iter().filter(|r| r.is_some()).count(), 2);
        assert_eq!(reports[2].map(|r| r.frames), Some(3));
    }

    #[test]
    fn test_resize_reaches_renderer() {
        let start = Instant::now();
        let mut frame_loop = FrameLoop::new(&small_config(), FramePlan::direct(), start);
        let mut renderer = NullRenderer::default();
        frame_loop.push_event(&InputEvent::WindowResized {
            width: 1280,
            height: 720,
        });
        frame_loop
            .tick(start + Duration::from_millis(16), &mut renderer)
            .unwrap();
        assert_eq!(renderer.framebuffer_size(), (1280, 720));
    }
}
