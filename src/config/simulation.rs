use super::{ConfigError, ConfigResult};
use crate::core::timing::StepMode;
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 粒子系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// 粒子数量（运行期间固定）
    pub count: usize,

    /// 模拟域半边长，坐标被限制在 `[-half_extent, half_extent]`
    pub half_extent: f32,

    /// 质量采样下限
    pub mass_min: f32,

    /// 质量采样上限
    pub mass_max: f32,

    /// 重力向量，按粒子质量缩放
    pub gravity: [f32; 3],

    /// 随机种子，None 时使用系统熵
    pub seed: Option<u64>,

    /// 积分步长模式
    pub step: StepMode,
}

impl_default!(ParticleConfig {
    count: 10_000,
    half_extent: 1.0,
    mass_min: 10.0,
    mass_max: 100.0,
    gravity: [0.0, -9.81, 0.0],
    seed: None,
    step: StepMode::Variable,
});

impl ParticleConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.count == 0 {
            return Err(ConfigError::ValidationError(
                "Particle count must be positive".to_string(),
            ));
        }
        if !(self.half_extent > 0.0) || !self.half_extent.is_finite() {
            return Err(ConfigError::ValidationError(
                "Particle domain half extent must be positive".to_string(),
            ));
        }
        if !self.mass_min.is_finite()
            || !self.mass_max.is_finite()
            || !(self.mass_min > 0.0)
            || self.mass_min > self.mass_max
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid mass range [{}, {}]",
                self.mass_min, self.mass_max
            )));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "Gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if let StepMode::Fixed { step, max_substeps } = self.step {
            if !(step > 0.0) || !step.is_finite() || max_substeps == 0 {
                return Err(ConfigError::ValidationError(
                    "Fixed step needs step > 0 and max_substeps > 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// 帧计时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// 平均帧率的采样窗口（帧数）
    pub fps_window: u32,
}

impl_default!(TimingConfig { fps_window: 1000 });

impl TimingConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fps_window == 0 {
            return Err(ConfigError::ValidationError(
                "FPS window must be at least one frame".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_mass_range_rejected() {
        let config = ParticleConfig {
            mass_min: 100.0,
            mass_max: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let cases = [
            ParticleConfig {
                half_extent: f32::INFINITY,
                ..Default::default()
            },
            ParticleConfig {
                mass_max: f32::NAN,
                ..Default::default()
            },
            ParticleConfig {
                mass_min: f32::NAN,
                ..Default::default()
            },
            ParticleConfig {
                mass_max: f32::INFINITY,
                ..Default::default()
            },
            ParticleConfig {
                gravity: [0.0, f32::NEG_INFINITY, 0.0],
                ..Default::default()
            },
            ParticleConfig {
                gravity: [f32::NAN, 0.0, 0.0],
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "{:?} accepted",
                config
            );
        }
    }

    #[test]
    fn test_fixed_step_validated() {
        let config = ParticleConfig {
            step: StepMode::Fixed {
                step: 0.0,
                max_substeps: 4,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_fps_window_rejected() {
        assert!(TimingConfig { fps_window: 0 }.validate().is_err());
    }
}
