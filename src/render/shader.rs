//! 着色器服务
//!
//! `compile` 把一段 WGSL 源码编译成某个阶段的着色器句柄，`link` 把顶点/片元句柄
//! 组合成渲染管线。两者都在 wgpu 的验证错误作用域里执行，失败时带回编译器日志。
//!
//! 内置源码嵌在二进制里；配置了 `render.shader_dir` 时，同名的 `.wgsl` 文件优先。

use crate::core::error::{AssetError, AssetResult, RenderError, RenderResult};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// 内置着色器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinShader {
    pub name: &'static str,
    pub source: &'static str,
}

pub const PARTICLES_SHADER: BuiltinShader = BuiltinShader {
    name: "particles",
    source: include_str!("shaders/particles.wgsl"),
};

pub const MESH_SHADER: BuiltinShader = BuiltinShader {
    name: "mesh",
    source: include_str!("shaders/mesh.wgsl"),
};

pub const PRESENT_SHADER: BuiltinShader = BuiltinShader {
    name: "present",
    source: include_str!("shaders/present.wgsl"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    fn attribute(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "@vertex",
            ShaderKind::Fragment => "@fragment",
        }
    }
}

/// 已编译的单阶段着色器
#[derive(Debug)]
pub struct ShaderHandle {
    label: String,
    kind: ShaderKind,
    entry_point: String,
    module: wgpu::ShaderModule,
}

impl ShaderHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// 链接好的渲染管线
#[derive(Debug)]
pub struct ProgramHandle {
    pub label: String,
    pub pipeline: wgpu::RenderPipeline,
}

/// 管线的固定功能部分
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub layout: &'a wgpu::PipelineLayout,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

pub struct ShaderService<'a> {
    device: &'a wgpu::Device,
    shader_dir: Option<PathBuf>,
}

impl<'a> ShaderService<'a> {
    pub fn new(device: &'a wgpu::Device, shader_dir: Option<PathBuf>) -> Self {
        Self { device, shader_dir }
    }

    /// 读取着色器源码，`shader_dir` 下存在 `<name>.wgsl` 时使用磁盘版本
    pub fn source(&self, builtin: BuiltinShader) -> AssetResult<Cow<'static, str>> {
        load_source(self.shader_dir.as_deref(), builtin)
    }

    pub fn compile(
        &self,
        kind: ShaderKind,
        label: &str,
        source: &str,
        entry_point: &str,
    ) -> RenderResult<ShaderHandle> {
        if !declares_entry_point(source, kind, entry_point) {
            return Err(RenderError::ShaderCompilation {
                label: label.to_string(),
                log: format!(
                    "no {} entry point named '{}'",
                    kind.attribute(),
                    entry_point
                ),
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation {
                label: label.to_string(),
                log: err.to_string(),
            });
        }

        tracing::debug!(target: "render", label, ?kind, entry_point, "Shader compiled");
        Ok(ShaderHandle {
            label: label.to_string(),
            kind,
            entry_point: entry_point.to_string(),
            module,
        })
    }

    pub fn link(
        &self,
        desc: &ProgramDesc<'_>,
        handles: &[&ShaderHandle],
    ) -> RenderResult<ProgramHandle> {
        let kinds: Vec<ShaderKind> = handles.iter().map(|h| h.kind).collect();
        let (vi, fi) = select_stages(&kinds).map_err(|log| RenderError::ProgramLink {
            label: desc.label.to_string(),
            log,
        })?;
        let vertex = handles[vi];
        let fragment = fi.map(|i| handles[i]);

        let targets = [Some(wgpu::ColorTargetState {
            format: desc.color_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(desc.layout),
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: &vertex.entry_point,
                    buffers: desc.vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: fragment.map(|f| wgpu::FragmentState {
                    module: &f.module,
                    entry_point: &f.entry_point,
                    targets: &targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    ..Default::default()
                },
                depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ProgramLink {
                label: desc.label.to_string(),
                log: err.to_string(),
            });
        }

        tracing::debug!(target: "render", label = desc.label, "Program linked");
        Ok(ProgramHandle {
            label: desc.label.to_string(),
            pipeline,
        })
    }
}

pub fn load_source(
    shader_dir: Option<&Path>,
    builtin: BuiltinShader,
) -> AssetResult<Cow<'static, str>> {
    let Some(dir) = shader_dir else {
        return Ok(Cow::Borrowed(builtin.source));
    };
    let path = dir.join(format!("{}.wgsl", builtin.name));
    if !path.is_file() {
        tracing::debug!(target: "assets", path = %path.display(), "Shader override not found, using builtin");
        return Ok(Cow::Borrowed(builtin.source));
    }
    let text = std::fs::read_to_string(&path).map_err(|e| AssetError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!(target: "assets", path = %path.display(), "Loaded shader override");
    Ok(Cow::Owned(text))
}

/// 源码里是否有带对应阶段属性、名为 `entry_point` 的函数
pub fn declares_entry_point(source: &str, kind: ShaderKind, entry_point: &str) -> bool {
    let attr = kind.attribute();
    source.match_indices(attr).any(|(at, _)| {
        let rest = source[at + attr.len()..].trim_start();
        let Some(rest) = rest.strip_prefix("fn") else {
            return false;
        };
        let name: String = rest
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        name == entry_point
    })
}

/// 从句柄阶段列表中选出顶点与片元阶段的下标
///
/// 必须恰好一个顶点阶段，最多一个片元阶段。
pub fn select_stages(kinds: &[ShaderKind]) -> Result<(usize, Option<usize>), String> {
    let vertex: Vec<usize> = positions(kinds, ShaderKind::Vertex);
    let fragment: Vec<usize> = positions(kinds, ShaderKind::Fragment);
    match (vertex.as_slice(), fragment.as_slice()) {
        ([v], []) => Ok((*v, None)),
        ([v], [f]) => Ok((*v, Some(*f))),
        ([], _) => Err("program has no vertex stage".to_string()),
        (_, f) if f.len() > 1 => Err(format!("program has {} fragment stages", f.len())),
        (v, _) => Err(format!("program has {} vertex stages", v.len())),
    }
}

fn positions(kinds: &[ShaderKind], kind: ShaderKind) -> Vec<usize> {
    kinds
        .iter()
        .enumerate()
        .filter(|(_, k)| **k == kind)
        .map(|(i, _)| i)
        .collect()
}
