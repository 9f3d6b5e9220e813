//! 渲染模块测试
//!
//! 跨文件的约定：着色器输入布局、离屏计划与目标描述之间的一致性。

#[cfg(test)]
mod tests {
    use super::super::graph::*;
    use super::super::offscreen::*;
    use super::super::particles::GpuParticle;
    use super::super::shader::*;
    use crate::config::OffscreenConfig;

    // ========================================
    // 布局测试
    // ========================================

    #[test]
    fn test_particle_layout_matches_shader_inputs() {
        let layout = GpuParticle::desc();
        assert_eq!(layout.array_stride, 48);
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1]);
        assert!(PARTICLES_SHADER.source.contains("@location(0) position: vec4<f32>"));
        assert!(PARTICLES_SHADER.source.contains("@location(1) color: vec4<f32>"));
    }

    #[test]
    fn test_present_shader_samples_texture() {
        assert!(PRESENT_SHADER.source.contains("texture_2d<f32>"));
        assert!(declares_entry_point(PRESENT_SHADER.source, ShaderKind::Vertex, "vs_main"));
    }

    // ========================================
    // 离屏管线测试
    // ========================================

    #[test]
    fn test_offscreen_plan_matches_target_size() {
        let config = OffscreenConfig {
            enabled: true,
            width: 800,
            height: 800,
            ..Default::default()
        };
        let plan = FramePlan::offscreen(config.width, config.height);
        let desc = RenderTargetDesc::from_config("offscreen", &config);
        assert_eq!(plan.offscreen_size(), desc.size());
    }

    #[test]
    fn test_offscreen_clears_before_present() {
        let plan = FramePlan::offscreen(512, 512);
        let passes = plan.passes();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].target, PassTarget::Offscreen);
        assert_eq!(passes[0].clear, ClearOps::ALL);
        assert_eq!(passes[1].draw, DrawKind::PresentTexture);
        assert_eq!(passes[1].clear, ClearOps::ALL);
        assert!(passes[1].reads(ResourceId::OffscreenColor));
    }

    #[test]
    fn test_mismatched_target_refused() {
        let mut desc = RenderTargetDesc::new(
            "offscreen",
            512,
            512,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureFormat::Depth32Float,
        );
        desc.depth = Some(AttachmentDesc::new(
            512,
            256,
            wgpu::TextureFormat::Depth32Float,
        ));
        let status = desc.check_complete(&TargetLimits::default());
        let err = status.into_result(&desc.label).unwrap_err();
        assert!(err.to_string().contains("incomplete attachment"));
    }
}
