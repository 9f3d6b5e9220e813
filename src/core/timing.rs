//! 帧计时与模拟时钟
//!
//! `FrameTiming` 测量两帧之间的墙钟时间并按固定窗口统计平均帧率；
//! `SimulationClock` 决定每帧把多少时间交给粒子积分器。

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// 积分步长模式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// 每帧以实测帧间隔积分一次，结果随帧率变化
    Variable,
    /// 固定步长累加器，每帧最多执行 `max_substeps` 步
    Fixed { step: f32, max_substeps: u32 },
}

impl Default for StepMode {
    fn default() -> Self {
        Self::Variable
    }
}

/// 平均帧率观测
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsReport {
    /// 窗口内帧数
    pub frames: u32,
    /// 窗口内累计时间
    pub elapsed: Duration,
}

impl FpsReport {
    pub fn average_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    pub fn average_frame_ms(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1000.0 / self.frames as f64
    }
}

/// 帧计时器
#[derive(Debug, Clone)]
pub struct FrameTiming {
    last_tick: Instant,
    accumulated: Duration,
    frames: u32,
    window: u32,
}

impl FrameTiming {
    /// 创建计时器，`window` 为统计平均帧率的帧数
    pub fn new(start: Instant, window: u32) -> Self {
        Self {
            last_tick: start,
            accumulated: Duration::ZERO,
            frames: 0,
            window: window.max(1),
        }
    }

    /// 记录一帧
    ///
    /// 返回距上一帧的秒数；每满一个采样窗口额外返回一次平均帧率，并清零累加器。
    pub fn tick(&mut self, now: Instant) -> (f32, Option<FpsReport>) {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.accumulated += delta;
        self.frames += 1;

        let report = if self.frames >= self.window {
            let report = FpsReport {
                frames: self.frames,
                elapsed: self.accumulated,
            };
            self.frames = 0;
            self.accumulated = Duration::ZERO;
            Some(report)
        } else {
            None
        };

        (delta.as_secs_f32(), report)
    }

    /// 当前窗口内已记录的帧数
    pub fn frames_in_window(&self) -> u32 {
        self.frames
    }
}

/// 模拟时钟：把实测帧间隔转换成积分步长序列
#[derive(Debug, Clone)]
pub struct SimulationClock {
    mode: StepMode,
    accumulator: f32,
}

impl SimulationClock {
    pub fn new(mode: StepMode) -> Self {
        Self {
            mode,
            accumulator: 0.0,
        }
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// 计算本帧需要执行的积分步长
    ///
    /// 固定步长模式下超出 `max_substeps` 的时间被丢弃，避免卡顿后追帧。
    pub fn advance(&mut self, frame_delta: f32) -> Vec<f32> {
        match self.mode {
            StepMode::Variable => vec![frame_delta],
            StepMode::Fixed { step, max_substeps } => {
                self.accumulator += frame_delta;
                let mut steps = Vec::new();
                while self.accumulator >= step && steps.len() < max_substeps as usize {
                    self.accumulator -= step;
                    steps.push(step);
                }
                if steps.len() == max_substeps as usize && self.accumulator >= step {
                    tracing::debug!(
                        target: "frame",
                        dropped = self.accumulator,
                        "simulation fell behind, dropping accumulated time"
                    );
                    self.accumulator %= step;
                }
                steps
            }
        }
    }

    /// 固定步长模式下尚未消耗的时间
    pub fn pending(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_measures_delta() {
        let start = Instant::now();
        let mut timing = FrameTiming::new(start, 1000);
        let (dt, report) = timing.tick(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        assert!(report.is_none());
        assert_eq!(timing.frames_in_window(), 1);
    }

    #[test]
    fn test_report_every_window_and_reset() {
        let start = Instant::now();
        let mut timing = FrameTiming::new(start, 4);
        let mut now = start;
        let mut reports = Vec::new();
        for _ in 0..8 {
            now += Duration::from_millis(10);
            if let (_, Some(r)) = timing.tick(now) {
                reports.push(r);
            }
        }
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].frames, 4);
        assert_eq!(reports[0].elapsed, Duration::from_millis(40));
        assert!((reports[1].average_fps() - 100.0).abs() < 1e-9);
        assert!((reports[1].average_frame_ms() - 10.0).abs() < 1e-9);
        assert_eq!(timing.frames_in_window(), 0);
    }

    #[test]
    fn test_clock_earlier_than_last_tick_is_zero() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut timing = FrameTiming::new(start, 10);
        let (dt, _) = timing.tick(start - Duration::from_millis(5));
        assert_eq!(dt, 0.0);
    }

    #[test]
    fn test_variable_clock_passes_delta_through() {
        let mut clock = SimulationClock::new(StepMode::Variable);
        assert_eq!(clock.advance(0.033), vec![0.033]);
        assert_eq!(clock.pending(), 0.0);
    }

    #[test]
    fn test_fixed_clock_carries_remainder() {
        let mut clock = SimulationClock::new(StepMode::Fixed {
            step: 0.01,
            max_substeps: 8,
        });
        assert_eq!(clock.advance(0.025).len(), 2);
        assert!((clock.pending() - 0.005).abs() < 1e-6);
        assert_eq!(clock.advance(0.006).len(), 1);
    }

    #[test]
    fn test_fixed_clock_caps_substeps() {
        let mut clock = SimulationClock::new(StepMode::Fixed {
            step: 0.01,
            max_substeps: 3,
        });
        let steps = clock.advance(1.0);
        assert_eq!(steps.len(), 3);
        assert!(clock.pending() < 0.01);
    }
}
