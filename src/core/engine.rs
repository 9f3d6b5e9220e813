//! 查看器主入口
//!
//! 定义 Engine 结构和主运行循环

use crate::config::{LoggingConfig, ViewerConfig};
use crate::core::error::{PlatformError, ViewerResult};
use crate::core::frame_loop::{FrameLoop, LoopState, TickReport};
use crate::platform::winit::{translate_window_event, WinitWindow};
use crate::platform::{Modifiers, Window};
use crate::render::graph::FramePlan;
use crate::render::wgpu::WgpuRenderer;
use std::path::Path;
use std::time::Instant;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

/// 查看器主结构
///
/// `Engine` 负责：
/// - 读取配置并初始化日志
/// - 创建窗口、渲染器，加载模型与贴图
/// - 在进入帧循环前检查离屏目标完整性
/// - 驱动 winit 事件循环
///
/// # 示例
///
/// ```no_run
/// use particle_viewer::core::Engine;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     Engine::run(None)?;
///     Ok(())
/// }
/// ```
pub struct Engine;

impl Engine {
    /// 运行查看器，`config_path` 为 None 时按默认顺序查找配置文件
    pub fn run(config_path: Option<&Path>) -> ViewerResult<()> {
        let loaded = ViewerConfig::load_or_default(config_path)?;
        Self::initialize_logging(&loaded.config.logging);
        match &loaded.source {
            Some(path) => {
                tracing::info!(target: "config", path = %path.display(), "Configuration loaded")
            }
            None => tracing::info!(target: "config", "Using default configuration"),
        }
        let config = loaded.config;

        let event_loop = EventLoop::new().map_err(|e| {
            PlatformError::EventLoop(format!("Failed to create event loop: {}", e))
        })?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let window = WinitWindow::try_new(&event_loop, &config.window)?;
        let plan = FramePlan::for_config(&config.render)?;
        let mut renderer = WgpuRenderer::new(window.shared(), &config, &plan)?;
        renderer.check_targets()?;

        let frame_loop = FrameLoop::new(&config, plan, Instant::now());
        let result = Self::run_event_loop(
            event_loop,
            &window,
            frame_loop,
            &mut renderer,
            &config,
        );

        renderer.shutdown();
        tracing::info!(target: "engine", "Viewer shutting down");
        result
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 存在时优先使用，否则使用配置中的级别。
    fn initialize_logging(config: &LoggingConfig) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_directive()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .try_init();
        tracing::info!(target: "engine", "Viewer starting");
    }

    /// 事件循环
    ///
    /// 窗口事件被翻译成 `InputEvent` 交给帧循环；`AboutToWait` 请求重绘，
    /// `RedrawRequested` 执行一个 tick，每次得到平均帧率时写进窗口标题。
    /// 帧内的致命错误会结束循环并作为返回值传出。
    fn run_event_loop(
        event_loop: EventLoop<()>,
        window: &WinitWindow,
        mut frame_loop: FrameLoop,
        renderer: &mut WgpuRenderer,
        config: &ViewerConfig,
    ) -> ViewerResult<()> {
        let pixels_per_line = config.input.pixels_per_scroll_line;
        let title = config.window.title.as_str();
        let mut modifiers = Modifiers::default();
        let mut fatal = None;

        let result = event_loop.run(|event, elwt| match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => {
                if let WindowEvent::RedrawRequested = event {
                    match frame_loop.tick(Instant::now(), renderer) {
                        Ok(Some(TickReport { fps: Some(fps), .. })) => {
                            let fps = fps.average_fps();
                            window.set_title(&format!("{} ({:.1} fps)", title, fps));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(target: "frame", "Fatal render error: {}", e);
                            fatal = Some(e);
                            frame_loop.request_close();
                        }
                    }
                } else if let Some(input) =
                    translate_window_event(&event, &mut modifiers, pixels_per_line)
                {
                    frame_loop.push_event(&input);
                }

                if frame_loop.state() == LoopState::ShouldClose {
                    elwt.exit();
                }
            }
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        });

        result.map_err(|e| PlatformError::EventLoop(format!("Event loop error: {}", e)))?;
        match fatal {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
