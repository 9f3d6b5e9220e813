pub mod graph;
pub mod mesh;
pub mod offscreen;
pub mod particles;
pub mod shader;
pub mod uniforms;
pub mod wgpu;

// Re-export pass plan
pub use graph::{ClearOps, DrawKind, FramePlan, PassDesc, PassTarget, ResourceId, ViewportSource};

// Re-export render target completeness
pub use offscreen::{AttachmentDesc, Completeness, RenderTarget, RenderTargetDesc, TargetLimits};

// Re-export particle components
pub use particles::{wrap_component, GpuParticle, ParticleSystem};

pub use mesh::{GpuMesh, MeshData, Vertex3D};
pub use shader::{ShaderKind, ShaderService};
pub use uniforms::SceneUniforms;
pub use self::wgpu::WgpuRenderer;

#[cfg(test)]
mod tests;
