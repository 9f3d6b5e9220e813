//! 粒子系统
//!
//! 固定数量的质点，每帧用半隐式欧拉法积分并做环形域回绕。

use crate::config::ParticleConfig;
use crate::render::particles::particle::{wrap_component, GpuParticle};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// 默认质量采样范围
pub const DEFAULT_MASS_RANGE: RangeInclusive<f32> = 10.0..=100.0;

/// 粒子系统
///
/// 粒子集合在创建后大小固定，只会原地修改速度与位置。
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<GpuParticle>,
    half_extent: f32,
}

impl ParticleSystem {
    /// 生成 `count` 个粒子
    ///
    /// 位置各分量均匀分布在 `[-half_extent, half_extent]`，质量均匀分布在 `mass`，
    /// 颜色各通道均匀分布在 `[0, 1]`，速度为零。
    pub fn initialize<R: Rng + ?Sized>(
        count: usize,
        half_extent: f32,
        mass: RangeInclusive<f32>,
        rng: &mut R,
    ) -> Self {
        let particles = (0..count)
            .map(|_| {
                let position = [
                    rng.gen_range(-half_extent..=half_extent),
                    rng.gen_range(-half_extent..=half_extent),
                    rng.gen_range(-half_extent..=half_extent),
                ];
                let m = rng.gen_range(mass.clone());
                let color = [
                    rng.gen_range(0.0..=1.0),
                    rng.gen_range(0.0..=1.0),
                    rng.gen_range(0.0..=1.0),
                ];
                GpuParticle::new(position, m, color)
            })
            .collect();

        Self {
            particles,
            half_extent,
        }
    }

    /// 按配置生成，配置了种子时结果可复现
    pub fn from_config(config: &ParticleConfig) -> Self {
        let mass = config.mass_min..=config.mass_max;
        match config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                Self::initialize(config.count, config.half_extent, mass, &mut rng)
            }
            None => Self::initialize(
                config.count,
                config.half_extent,
                mass,
                &mut rand::thread_rng(),
            ),
        }
    }

    /// 由现成的粒子构造（位置不做回绕）
    pub fn from_particles(particles: Vec<GpuParticle>, half_extent: f32) -> Self {
        Self {
            particles,
            half_extent,
        }
    }

    /// 推进一步
    ///
    /// 加速度为 `gravity * mass`（刻意的风格化，不是物理意义上的重力）；
    /// 先更新速度再用新速度更新位置，最后逐分量回绕位置。速度不回绕。
    pub fn step(&mut self, delta_time: f32, gravity: Vec3) {
        let bound = self.half_extent;
        for p in &mut self.particles {
            let acceleration = gravity * p.mass();

            let mut velocity = Vec3::new(p.velocity[0], p.velocity[1], p.velocity[2]);
            velocity += acceleration * delta_time;

            let mut position = Vec3::new(p.position[0], p.position[1], p.position[2]);
            position += velocity * delta_time;

            p.velocity[0] = velocity.x;
            p.velocity[1] = velocity.y;
            p.velocity[2] = velocity.z;
            p.position[0] = wrap_component(position.x, bound);
            p.position[1] = wrap_component(position.y, bound);
            p.position[2] = wrap_component(position.z, bound);
        }
    }

    pub fn particles(&self) -> &[GpuParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    /// 上传用的原始字节，布局与顶点缓冲分配时一致
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}
