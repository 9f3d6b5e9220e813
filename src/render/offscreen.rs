//! 离屏渲染目标
//!
//! 一个颜色附件加一个深度附件。创建后必须先做完整性检查，
//! 任何非 `Complete` 的结果都是启动期致命错误，帧循环不会开始。
//!
//! 检查分两层：`RenderTargetDesc::check_complete` 只看描述本身，不需要 GPU；
//! `RenderTarget::check_complete` 在此基础上再叠加释放状态和分配时捕获的验证错误。

use crate::config::OffscreenConfig;
use crate::core::error::{RenderError, RenderResult};
use std::fmt;
use wgpu::{Device, Texture, TextureFormat, TextureUsages, TextureView};

// ============================================================================
// Completeness
// ============================================================================

/// 完整性检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    /// 目标已被释放
    Undefined,
    IncompleteAttachment,
    IncompleteMissingAttachment,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    Unsupported,
    IncompleteMultisample,
    IncompleteLayerTargets,
    /// 分配时捕获到的验证错误日志
    Unknown(String),
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete)
    }

    /// 非完整结果转换为 `RenderError::IncompleteTarget`
    pub fn into_result(self, label: &str) -> RenderResult<()> {
        match self {
            Completeness::Complete => Ok(()),
            status => Err(RenderError::IncompleteTarget {
                label: label.to_string(),
                status,
            }),
        }
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completeness::Complete => f.write_str("complete"),
            Completeness::Undefined => f.write_str("undefined"),
            Completeness::IncompleteAttachment => f.write_str("incomplete attachment"),
            Completeness::IncompleteMissingAttachment => {
                f.write_str("incomplete missing attachment")
            }
            Completeness::IncompleteDrawBuffer => f.write_str("incomplete draw buffer"),
            Completeness::IncompleteReadBuffer => f.write_str("incomplete read buffer"),
            Completeness::Unsupported => f.write_str("unsupported"),
            Completeness::IncompleteMultisample => f.write_str("incomplete multisample"),
            Completeness::IncompleteLayerTargets => f.write_str("incomplete layer targets"),
            Completeness::Unknown(log) => write!(f, "unknown ({})", log.trim()),
        }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// 设备能力上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLimits {
    pub max_dimension: u32,
}

impl TargetLimits {
    pub fn from_device_limits(limits: &wgpu::Limits) -> Self {
        Self {
            max_dimension: limits.max_texture_dimension_2d,
        }
    }
}

impl Default for TargetLimits {
    fn default() -> Self {
        Self::from_device_limits(&wgpu::Limits::downlevel_defaults())
    }
}

/// 单个附件的描述
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub sample_count: u32,
    pub layers: u32,
}

impl AttachmentDesc {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            sample_count: 1,
            layers: 1,
        }
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.layers,
        }
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.layers == 0
    }
}

/// 离屏目标描述
///
/// `draw_buffers` 列出片元输出写入的颜色槽，`read_buffer` 为回读使用的颜色槽。
/// 只有一个颜色附件，所以合法的槽号只有 0。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    pub label: String,
    pub color: Option<AttachmentDesc>,
    pub depth: Option<AttachmentDesc>,
    pub draw_buffers: Vec<u32>,
    pub read_buffer: Option<u32>,
}

/// 支持的多重采样数
const SUPPORTED_SAMPLE_COUNTS: [u32; 2] = [1, 4];

impl RenderTargetDesc {
    pub fn new(
        label: impl Into<String>,
        width: u32,
        height: u32,
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> Self {
        Self {
            label: label.into(),
            color: Some(AttachmentDesc::new(width, height, color_format)),
            depth: Some(AttachmentDesc::new(width, height, depth_format)),
            draw_buffers: vec![0],
            read_buffer: None,
        }
    }

    pub fn from_config(label: impl Into<String>, config: &OffscreenConfig) -> Self {
        Self::new(
            label,
            config.width,
            config.height,
            config.color_format.to_wgpu(),
            config.depth_format.to_wgpu(),
        )
    }

    /// 颜色附件尺寸；颜色附件缺失时为 None
    pub fn size(&self) -> Option<(u32, u32)> {
        self.color.map(|c| (c.width, c.height))
    }

    /// 纯描述层面的完整性检查
    pub fn check_complete(&self, limits: &TargetLimits) -> Completeness {
        let (color, depth) = match (&self.color, &self.depth) {
            (Some(c), Some(d)) => (c, d),
            _ => return Completeness::IncompleteMissingAttachment,
        };

        if color.is_empty() || depth.is_empty() {
            return Completeness::IncompleteAttachment;
        }
        if color.format.is_depth_stencil_format() || !depth.format.has_depth_aspect() {
            return Completeness::IncompleteAttachment;
        }
        if (color.width, color.height) != (depth.width, depth.height) {
            return Completeness::IncompleteAttachment;
        }

        if self.draw_buffers.is_empty() || self.draw_buffers.iter().any(|&slot| slot != 0) {
            return Completeness::IncompleteDrawBuffer;
        }
        if matches!(self.read_buffer, Some(slot) if slot != 0) {
            return Completeness::IncompleteReadBuffer;
        }

        if color.sample_count != depth.sample_count {
            return Completeness::IncompleteMultisample;
        }
        if color.layers != depth.layers {
            return Completeness::IncompleteLayerTargets;
        }

        if color.width > limits.max_dimension
            || color.height > limits.max_dimension
            || !SUPPORTED_SAMPLE_COUNTS.contains(&color.sample_count)
        {
            return Completeness::Unsupported;
        }

        Completeness::Complete
    }
}

// ============================================================================
// GPU render target
// ============================================================================

struct Attachment {
    texture: Texture,
    view: TextureView,
}

impl Attachment {
    fn allocate(device: &Device, label: &str, desc: &AttachmentDesc, usage: TextureUsages) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: desc.extent(),
            mip_level_count: 1,
            sample_count: desc.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// GPU 上的离屏目标
///
/// 只有描述通过检查时才会真正分配纹理；分配过程包在错误作用域里，
/// 捕获到的验证错误以 `Completeness::Unknown` 的形式报告。
pub struct RenderTarget {
    desc: RenderTargetDesc,
    status: Completeness,
    color: Option<Attachment>,
    depth: Option<Attachment>,
    released: bool,
}

impl RenderTarget {
    pub fn create(device: &Device, desc: RenderTargetDesc, limits: &TargetLimits) -> Self {
        let status = desc.check_complete(limits);
        if !status.is_complete() {
            tracing::warn!(target: "render", label = %desc.label, %status, "Render target description rejected");
            return Self {
                desc,
                status,
                color: None,
                depth: None,
                released: false,
            };
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let color = desc.color.as_ref().map(|c| {
            Attachment::allocate(
                device,
                &format!("{} color", desc.label),
                c,
                TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            )
        });
        let depth = desc.depth.as_ref().map(|d| {
            Attachment::allocate(
                device,
                &format!("{} depth", desc.label),
                d,
                TextureUsages::RENDER_ATTACHMENT,
            )
        });

        let validation = pollster::block_on(device.pop_error_scope());
        let oom = pollster::block_on(device.pop_error_scope());
        let status = match validation.or(oom) {
            Some(err) => Completeness::Unknown(err.to_string()),
            None => Completeness::Complete,
        };

        tracing::debug!(
            target: "render",
            label = %desc.label,
            size = ?desc.size(),
            %status,
            "Render target allocated"
        );

        Self {
            desc,
            status,
            color,
            depth,
            released: false,
        }
    }

    pub fn check_complete(&self) -> Completeness {
        if self.released {
            Completeness::Undefined
        } else {
            self.status.clone()
        }
    }

    pub fn label(&self) -> &str {
        &self.desc.label
    }

    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }

    /// 固定尺寸，与窗口大小无关
    pub fn size(&self) -> (u32, u32) {
        self.desc.size().unwrap_or((0, 0))
    }

    pub fn color_format(&self) -> Option<TextureFormat> {
        self.desc.color.map(|c| c.format)
    }

    pub fn depth_format(&self) -> Option<TextureFormat> {
        self.desc.depth.map(|d| d.format)
    }

    pub fn color_view(&self) -> Option<&TextureView> {
        self.color.as_ref().map(|a| &a.view)
    }

    pub fn depth_view(&self) -> Option<&TextureView> {
        self.depth.as_ref().map(|a| &a.view)
    }

    /// 释放附件，之后的检查结果为 `Undefined`
    pub fn release(&mut self) {
        for attachment in [self.color.take(), self.depth.take()].into_iter().flatten() {
            attachment.texture.destroy();
        }
        self.released = true;
    }
}
