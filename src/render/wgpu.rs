//! wgpu 渲染器
//!
//! 启动时一次性创建表面、设备、着色器管线、粒子/uniform 缓冲、模型网格与贴图，
//! 以及可选的离屏目标。之后每帧只做两件事：上传数据、按 `FramePlan` 执行 pass。
//!
//! 任何启动期失败（无适配器、着色器编译、管线链接、离屏目标不完整）都直接返回错误，
//! 不进入帧循环。

use crate::config::ViewerConfig;
use crate::core::error::{RenderError, RenderResult, ViewerResult};
use crate::core::frame_loop::{FrameOutcome, FrameRenderer};
use crate::render::graph::{DrawKind, FramePlan, PassTarget};
use crate::render::mesh::{GpuMesh, MeshData, Vertex3D};
use crate::render::offscreen::{RenderTarget, RenderTargetDesc, TargetLimits};
use crate::render::particles::GpuParticle;
use crate::render::shader::{
    BuiltinShader, ProgramDesc, ProgramHandle, ShaderHandle, ShaderKind, ShaderService,
    MESH_SHADER, PARTICLES_SHADER, PRESENT_SHADER,
};
use crate::render::uniforms::SceneUniforms;
use crate::resources::{load_bitmap, load_model, Bitmap};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

const VS_ENTRY: &str = "vs_main";
const FS_ENTRY: &str = "fs_main";

struct DepthBuffer {
    view: wgpu::TextureView,
}

impl DepthBuffer {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Surface Depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view }
    }
}

/// 每种着色器的顶点/片元句柄
struct CompiledShaders {
    particles: [ShaderHandle; 2],
    mesh: [ShaderHandle; 2],
    present: [ShaderHandle; 2],
}

impl CompiledShaders {
    fn compile(service: &ShaderService<'_>) -> ViewerResult<Self> {
        let stage_pair = |builtin: BuiltinShader| -> ViewerResult<[ShaderHandle; 2]> {
            let source = service.source(builtin)?;
            let vs = service.compile(
                ShaderKind::Vertex,
                &format!("{} vs", builtin.name),
                &source,
                VS_ENTRY,
            )?;
            let fs = service.compile(
                ShaderKind::Fragment,
                &format!("{} fs", builtin.name),
                &source,
                FS_ENTRY,
            )?;
            Ok([vs, fs])
        };
        Ok(Self {
            particles: stage_pair(PARTICLES_SHADER)?,
            mesh: stage_pair(MESH_SHADER)?,
            present: stage_pair(PRESENT_SHADER)?,
        })
    }
}

struct Layouts {
    uniform_bgl: wgpu::BindGroupLayout,
    texture_bgl: wgpu::BindGroupLayout,
    particles: wgpu::PipelineLayout,
    mesh: wgpu::PipelineLayout,
    present: wgpu::PipelineLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Uniform BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                push_constant_ranges: &[],
            })
        };
        let particles = layout("Particles Layout", &[&uniform_bgl]);
        let mesh = layout("Mesh Layout", &[&uniform_bgl, &texture_bgl]);
        let present = layout("Present Layout", &[&texture_bgl]);
        Self {
            uniform_bgl,
            texture_bgl,
            particles,
            mesh,
            present,
        }
    }
}

/// 针对某个颜色/深度格式组合链接好的场景管线
struct ScenePipelines {
    particles: ProgramHandle,
    mesh: ProgramHandle,
}

impl ScenePipelines {
    fn link(
        service: &ShaderService<'_>,
        shaders: &CompiledShaders,
        layouts: &Layouts,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> RenderResult<Self> {
        let [pvs, pfs] = &shaders.particles;
        let particles = service.link(
            &ProgramDesc {
                label: "particles",
                layout: &layouts.particles,
                vertex_buffers: &[GpuParticle::desc()],
                topology: wgpu::PrimitiveTopology::PointList,
                color_format,
                depth_format: Some(depth_format),
            },
            &[pvs, pfs],
        )?;
        let [mvs, mfs] = &shaders.mesh;
        let mesh = service.link(
            &ProgramDesc {
                label: "mesh",
                layout: &layouts.mesh,
                vertex_buffers: &[Vertex3D::desc()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                color_format,
                depth_format: Some(depth_format),
            },
            &[mvs, mfs],
        )?;
        Ok(Self { particles, mesh })
    }
}

/// 离屏 pass 所需的全部对象
struct OffscreenStage {
    target: RenderTarget,
    pipelines: ScenePipelines,
    present: ProgramHandle,
    present_bind_group: wgpu::BindGroup,
}

pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_format: wgpu::TextureFormat,
    depth: DepthBuffer,
    clear_color: wgpu::Color,

    surface_pipelines: ScenePipelines,
    offscreen: Option<OffscreenStage>,

    particle_buffer: wgpu::Buffer,
    particle_capacity: usize,
    particle_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    mesh: Option<GpuMesh>,
    model_texture: wgpu::BindGroup,
}

impl WgpuRenderer {
    pub fn new(window: Arc<Window>, config: &ViewerConfig, plan: &FramePlan) -> ViewerResult<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;
        let info = adapter.get_info();
        tracing::info!(target: "render", adapter = %info.name, backend = ?info.backend, "Adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        ))
        .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            tracing::error!(target: "render", "Uncaptured GPU error: {}", err);
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                RenderError::SurfaceCreation("surface reports no supported formats".to_string())
            })?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if config.window.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_format = config.render.depth_format.to_wgpu();
        let depth = DepthBuffer::new(
            &device,
            depth_format,
            surface_config.width,
            surface_config.height,
        );

        let service = ShaderService::new(&device, config.render.shader_dir.clone());
        let shaders = CompiledShaders::compile(&service)?;
        let layouts = Layouts::new(&device);
        let surface_pipelines =
            ScenePipelines::link(&service, &shaders, &layouts, format, depth_format)?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let offscreen = match plan.offscreen_size() {
            Some((width, height)) => {
                let desc = RenderTargetDesc::new(
                    "offscreen",
                    width,
                    height,
                    config.render.offscreen.color_format.to_wgpu(),
                    config.render.offscreen.depth_format.to_wgpu(),
                );
                let limits = TargetLimits::from_device_limits(&device.limits());
                let target = RenderTarget::create(&device, desc, &limits);
                target.check_complete().into_result(target.label())?;

                let (color_format, target_depth) =
                    match (target.color_format(), target.depth_format()) {
                        (Some(c), Some(d)) => (c, d),
                        _ => {
                            return Err(RenderError::InvalidPassGraph(
                                "offscreen target has no attachments".to_string(),
                            )
                            .into())
                        }
                    };
                let pipelines =
                    ScenePipelines::link(&service, &shaders, &layouts, color_format, target_depth)?;
                let [vs, fs] = &shaders.present;
                let present = service.link(
                    &ProgramDesc {
                        label: "present",
                        layout: &layouts.present,
                        vertex_buffers: &[],
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        color_format: format,
                        depth_format: Some(depth_format),
                    },
                    &[vs, fs],
                )?;
                let color_view = target.color_view().ok_or_else(|| {
                    RenderError::InvalidPassGraph("offscreen color view missing".to_string())
                })?;
                let present_bind_group =
                    texture_bind_group(&device, &layouts.texture_bgl, color_view, &sampler, "Present BG");
                Some(OffscreenStage {
                    target,
                    pipelines,
                    present,
                    present_bind_group,
                })
            }
            None => None,
        };

        let particle_capacity = config.particles.count.max(1);
        let particle_buffer = create_particle_buffer(&device, particle_capacity);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniforms"),
            contents: bytemuck::bytes_of(&SceneUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Uniform BG"),
            layout: &layouts.uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let (mesh, bitmap) = match &config.render.model {
            Some(model) => {
                let data = MeshData::from_model(&load_model(&model.path)?);
                let bitmap = match &model.texture {
                    Some(path) => load_bitmap(path)?,
                    None => Bitmap::white(),
                };
                let mesh = (!data.is_empty()).then(|| GpuMesh::upload(&device, &data));
                (mesh, bitmap)
            }
            None => (None, Bitmap::white()),
        };
        let model_view = upload_bitmap(&device, &queue, &bitmap);
        let model_texture =
            texture_bind_group(&device, &layouts.texture_bgl, &model_view, &sampler, "Model Texture BG");

        tracing::info!(
            target: "render",
            format = ?format,
            width = surface_config.width,
            height = surface_config.height,
            offscreen = offscreen.is_some(),
            mesh = mesh.is_some(),
            "Renderer initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            depth_format,
            depth,
            clear_color: to_color(config.render.clear_color),
            surface_pipelines,
            offscreen,
            particle_buffer,
            particle_capacity,
            particle_count: 0,
            uniform_buffer,
            uniform_bind_group,
            mesh,
            model_texture,
        })
    }

    /// 进入帧循环前的离屏目标检查
    pub fn check_targets(&self) -> RenderResult<()> {
        match &self.offscreen {
            Some(stage) => stage.target.check_complete().into_result(stage.target.label()),
            None => Ok(()),
        }
    }

    /// 释放离屏附件
    pub fn shutdown(&mut self) {
        if let Some(stage) = self.offscreen.as_mut() {
            stage.target.release();
            tracing::debug!(target: "render", status = %stage.target.check_complete(), "Offscreen target released");
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn draw_scene<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, pipelines: &'a ScenePipelines) {
        rpass.set_bind_group(0, &self.uniform_bind_group, &[]);

        if let Some(mesh) = &self.mesh {
            rpass.set_pipeline(&pipelines.mesh.pipeline);
            rpass.set_bind_group(1, &self.model_texture, &[]);
            rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        if self.particle_count > 0 {
            rpass.set_pipeline(&pipelines.particles.pipeline);
            rpass.set_vertex_buffer(0, self.particle_buffer.slice(..));
            rpass.draw(0..self.particle_count, 0..1);
        }
    }
}

impl FrameRenderer for WgpuRenderer {
    fn framebuffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        // 最小化时尺寸为零，保持原配置
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::new(&self.device, self.depth_format, width, height);
        tracing::debug!(target: "render", width, height, "Surface resized");
    }

    fn upload_particles(&mut self, particles: &[GpuParticle]) {
        if particles.len() > self.particle_capacity {
            self.particle_capacity = particles.len();
            self.particle_buffer = create_particle_buffer(&self.device, self.particle_capacity);
        }
        self.queue
            .write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(particles));
        self.particle_count = particles.len() as u32;
    }

    fn upload_uniforms(&mut self, uniforms: &SceneUniforms) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn draw(&mut self, plan: &FramePlan) -> RenderResult<FrameOutcome> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!(target: "render", "Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!(target: "render", "Surface acquire timed out");
                return Ok(FrameOutcome::Skipped);
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let window = self.framebuffer_size();
        for pass in plan.passes() {
            let (color_view, depth_view, pipelines) = match pass.target {
                PassTarget::Surface => (&frame_view, &self.depth.view, &self.surface_pipelines),
                PassTarget::Offscreen => {
                    let stage = self.offscreen.as_ref().ok_or_else(|| {
                        RenderError::InvalidPassGraph(format!(
                            "pass '{}' needs an offscreen target but none was created",
                            pass.name
                        ))
                    })?;
                    match (stage.target.color_view(), stage.target.depth_view()) {
                        (Some(c), Some(d)) => (c, d, &stage.pipelines),
                        _ => {
                            return Err(RenderError::IncompleteTarget {
                                label: stage.target.label().to_string(),
                                status: stage.target.check_complete(),
                            })
                        }
                    }
                }
            };

            let color_load = if pass.clear.color {
                wgpu::LoadOp::Clear(self.clear_color)
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if pass.clear.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };
            let (vw, vh) = pass.viewport.resolve(window);

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.name.as_str()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);

            match pass.draw {
                DrawKind::Scene => self.draw_scene(&mut rpass, pipelines),
                DrawKind::PresentTexture => {
                    let stage = self.offscreen.as_ref().ok_or_else(|| {
                        RenderError::InvalidPassGraph(format!(
                            "pass '{}' presents an offscreen texture but none was created",
                            pass.name
                        ))
                    })?;
                    rpass.set_pipeline(&stage.present.pipeline);
                    rpass.set_bind_group(0, &stage.present_bind_group, &[]);
                    rpass.draw(0..3, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(FrameOutcome::Presented)
    }
}

fn create_particle_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Buffer"),
        size: (capacity * std::mem::size_of::<GpuParticle>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn upload_bitmap(device: &wgpu::Device, queue: &wgpu::Queue, bitmap: &Bitmap) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: bitmap.width,
        height: bitmap.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Model Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &bitmap.pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(bitmap.bytes_per_row()),
            rows_per_image: Some(bitmap.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn to_color(c: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: c[0] as f64,
        g: c[1] as f64,
        b: c[2] as f64,
        a: c[3] as f64,
    }
}
