//! 帧渲染计划
//!
//! 每一帧的绘制被描述为若干具名 pass，每个 pass 声明自己读哪些资源、写哪些资源。
//! 执行顺序由数据依赖决定：写入某资源的 pass 一定排在读取它的 pass 之前。
//!
//! ```text
//! direct:     [scene] ──writes──▶ Surface
//!
//! offscreen:  [offscreen] ──writes──▶ OffscreenColor ──reads──▶ [present] ──writes──▶ Surface
//! ```

use crate::config::RenderConfig;
use crate::core::error::{RenderError, RenderResult};
use std::fmt;

// ============================================================================
// Resources
// ============================================================================

/// pass 之间传递的逻辑资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// 粒子顶点缓冲（每帧上传）
    ParticleBuffer,
    /// 模型顶点缓冲（启动时上传）
    MeshBuffer,
    /// 相机/模型矩阵与逐帧标量（每帧上传）
    SceneUniforms,
    /// 模型贴图（启动时上传）
    ModelTexture,
    OffscreenColor,
    OffscreenDepth,
    /// 窗口表面
    Surface,
}

impl ResourceId {
    /// 由上传步骤而不是某个 pass 提供的资源
    pub fn is_uploaded(self) -> bool {
        matches!(
            self,
            ResourceId::ParticleBuffer
                | ResourceId::MeshBuffer
                | ResourceId::SceneUniforms
                | ResourceId::ModelTexture
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceId::ParticleBuffer => "particle_buffer",
            ResourceId::MeshBuffer => "mesh_buffer",
            ResourceId::SceneUniforms => "scene_uniforms",
            ResourceId::ModelTexture => "model_texture",
            ResourceId::OffscreenColor => "offscreen_color",
            ResourceId::OffscreenDepth => "offscreen_depth",
            ResourceId::Surface => "surface",
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Passes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    Offscreen,
    Surface,
}

impl PassTarget {
    /// 绑定该目标的 pass 必须写入的资源
    fn written_resource(self) -> ResourceId {
        match self {
            PassTarget::Offscreen => ResourceId::OffscreenColor,
            PassTarget::Surface => ResourceId::Surface,
        }
    }
}

/// 视口来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportSource {
    /// 离屏目标的固定尺寸，与窗口无关
    Fixed { width: u32, height: u32 },
    /// 当前窗口帧缓冲尺寸
    Window,
}

impl ViewportSource {
    pub fn resolve(self, framebuffer: (u32, u32)) -> (u32, u32) {
        match self {
            ViewportSource::Fixed { width, height } => (width, height),
            ViewportSource::Window => framebuffer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// 粒子 + 可选模型
    Scene,
    /// 采样离屏颜色附件，铺满屏幕
    PresentTexture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOps {
    pub color: bool,
    pub depth: bool,
}

impl ClearOps {
    pub const ALL: ClearOps = ClearOps {
        color: true,
        depth: true,
    };
}

/// 单个 pass 的声明
#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub name: String,
    pub target: PassTarget,
    pub viewport: ViewportSource,
    pub clear: ClearOps,
    pub draw: DrawKind,
    pub reads: Vec<ResourceId>,
    pub writes: Vec<ResourceId>,
}

impl PassDesc {
    pub fn reads(&self, resource: ResourceId) -> bool {
        self.reads.contains(&resource)
    }

    pub fn writes(&self, resource: ResourceId) -> bool {
        self.writes.contains(&resource)
    }
}

// ============================================================================
// FramePlan
// ============================================================================

/// 按依赖排好序的 pass 列表
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    passes: Vec<PassDesc>,
}

impl FramePlan {
    /// 校验并排序
    ///
    /// 没有依赖关系的 pass 保持声明顺序。以下情况报错：
    /// - pass 读取了既不是上传资源、也没有任何 pass 写入的资源
    /// - pass 没有写入它绑定的目标
    /// - 依赖成环
    /// - 没有 pass 写入窗口表面
    pub fn build(passes: Vec<PassDesc>) -> RenderResult<Self> {
        for pass in &passes {
            let target = pass.target.written_resource();
            if !pass.writes(target) {
                return Err(RenderError::InvalidPassGraph(format!(
                    "pass '{}' targets {:?} but does not write '{}'",
                    pass.name, pass.target, target
                )));
            }
            for &read in &pass.reads {
                if read.is_uploaded() {
                    continue;
                }
                let produced = passes
                    .iter()
                    .any(|other| other.name != pass.name && other.writes(read));
                if !produced {
                    return Err(RenderError::InvalidPassGraph(format!(
                        "pass '{}' reads '{}' which no pass writes",
                        pass.name, read
                    )));
                }
            }
        }

        if !passes.iter().any(|p| p.writes(ResourceId::Surface)) {
            return Err(RenderError::InvalidPassGraph(
                "no pass writes the surface".to_string(),
            ));
        }

        let order = Self::topological_order(&passes)?;
        let mut slots: Vec<Option<PassDesc>> = passes.into_iter().map(Some).collect();
        let passes = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();

        Ok(Self { passes })
    }

    /// Kahn 算法，每一轮取下标最小的入度为零的 pass
    fn topological_order(passes: &[PassDesc]) -> RenderResult<Vec<usize>> {
        let n = passes.len();
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut indegree = vec![0usize; n];

        for (consumer, pass) in passes.iter().enumerate() {
            for &read in &pass.reads {
                for (producer, other) in passes.iter().enumerate() {
                    if producer != consumer && other.writes(read) && !edges[producer].contains(&consumer)
                    {
                        edges[producer].push(consumer);
                        indegree[consumer] += 1;
                    }
                }
            }
        }

        let mut done = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            let next = (0..n).find(|&i| !done[i] && indegree[i] == 0);
            let Some(i) = next else {
                let stuck: Vec<&str> = (0..n)
                    .filter(|&i| !done[i])
                    .map(|i| passes[i].name.as_str())
                    .collect();
                return Err(RenderError::InvalidPassGraph(format!(
                    "dependency cycle between passes: {}",
                    stuck.join(", ")
                )));
            };
            done[i] = true;
            order.push(i);
            for &j in &edges[i] {
                indegree[j] -= 1;
            }
        }
        Ok(order)
    }

    /// 单 pass：直接绘制到窗口
    pub fn direct() -> Self {
        Self {
            passes: vec![scene_pass("scene", PassTarget::Surface, ViewportSource::Window)],
        }
    }

    /// 两 pass：先绘制到固定尺寸的离屏目标，再把结果贴到窗口
    pub fn offscreen(width: u32, height: u32) -> Self {
        Self {
            passes: vec![
                scene_pass(
                    "offscreen",
                    PassTarget::Offscreen,
                    ViewportSource::Fixed { width, height },
                ),
                PassDesc {
                    name: "present".to_string(),
                    target: PassTarget::Surface,
                    viewport: ViewportSource::Window,
                    clear: ClearOps::ALL,
                    draw: DrawKind::PresentTexture,
                    reads: vec![ResourceId::OffscreenColor],
                    writes: vec![ResourceId::Surface],
                },
            ],
        }
    }

    /// 按配置选择直接绘制或离屏两 pass，并重新校验
    pub fn for_config(config: &RenderConfig) -> RenderResult<Self> {
        let reference = if config.offscreen.enabled {
            Self::offscreen(config.offscreen.width, config.offscreen.height)
        } else {
            Self::direct()
        };
        Self::build(reference.passes)
    }

    pub fn passes(&self) -> &[PassDesc] {
        &self.passes
    }

    pub fn pass(&self, name: &str) -> Option<&PassDesc> {
        self.passes.iter().find(|p| p.name == name)
    }

    pub fn uses_offscreen(&self) -> bool {
        self.passes.iter().any(|p| p.target == PassTarget::Offscreen)
    }

    /// 离屏 pass 的固定视口尺寸
    pub fn offscreen_size(&self) -> Option<(u32, u32)> {
        self.passes.iter().find_map(|p| match (p.target, p.viewport) {
            (PassTarget::Offscreen, ViewportSource::Fixed { width, height }) => {
                Some((width, height))
            }
            _ => None,
        })
    }
}

fn scene_pass(name: &str, target: PassTarget, viewport: ViewportSource) -> PassDesc {
    let mut writes = vec![target.written_resource()];
    if target == PassTarget::Offscreen {
        writes.push(ResourceId::OffscreenDepth);
    }
    PassDesc {
        name: name.to_string(),
        target,
        viewport,
        clear: ClearOps::ALL,
        draw: DrawKind::Scene,
        reads: vec![
            ResourceId::ParticleBuffer,
            ResourceId::MeshBuffer,
            ResourceId::SceneUniforms,
            ResourceId::ModelTexture,
        ],
        writes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(plan: &FramePlan) -> Vec<&str> {
        plan.passes().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_reference_plans_validate() {
        let direct = FramePlan::direct();
        assert_eq!(FramePlan::build(direct.passes().to_vec()).unwrap(), direct);
        assert!(!direct.uses_offscreen());

        let offscreen = FramePlan::offscreen(1024, 1024);
        assert_eq!(FramePlan::build(offscreen.passes().to_vec()).unwrap(), offscreen);
        assert_eq!(offscreen.offscreen_size(), Some((1024, 1024)));
    }

    #[test]
    fn test_offscreen_pass_runs_before_present() {
        let mut passes = FramePlan::offscreen(256, 256).passes().to_vec();
        passes.reverse();
        let plan = FramePlan::build(passes).unwrap();
        assert_eq!(names(&plan), vec!["offscreen", "present"]);
    }

    #[test]
    fn test_viewport_sources() {
        let plan = FramePlan::offscreen(256, 128);
        let window = (800, 600);
        let viewports: Vec<_> = plan
            .passes()
            .iter()
            .map(|p| p.viewport.resolve(window))
            .collect();
        assert_eq!(viewports, vec![(256, 128), (800, 600)]);
    }

    #[test]
    fn test_unproduced_read_rejected() {
        let present = FramePlan::offscreen(64, 64).passes()[1].clone();
        let err = FramePlan::build(vec![present]).unwrap_err();
        assert!(err.to_string().contains("offscreen_color"));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut passes = FramePlan::offscreen(64, 64).passes().to_vec();
        passes[0].reads.push(ResourceId::Surface);
        let err = FramePlan::build(passes).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_plan_must_write_surface() {
        let offscreen_only = FramePlan::offscreen(64, 64).passes()[0].clone();
        assert!(FramePlan::build(vec![offscreen_only]).is_err());
    }

    #[test]
    fn test_plan_for_config() {
        let mut config = RenderConfig::default();
        assert!(!FramePlan::for_config(&config).unwrap().uses_offscreen());

        config.offscreen.enabled = true;
        config.offscreen.width = 300;
        config.offscreen.height = 200;
        let plan = FramePlan::for_config(&config).unwrap();
        assert_eq!(plan.offscreen_size(), Some((300, 200)));
    }

    #[test]
    fn test_pass_must_write_its_target() {
        let mut scene = FramePlan::direct().passes()[0].clone();
        scene.writes.clear();
        assert!(FramePlan::build(vec![scene]).is_err());
    }
}
