//! 输入状态累加器
//!
//! 窗口事件在两帧之间被记录下来，帧循环在每个 tick 开始时一次性取走。

use super::{InputEvent, KeyCode, Modifiers};
use crate::config::InputConfig;
use crate::scene::transform::TransformAction;
use glam::Vec3;

/// 本帧指针位移（像素）
///
/// `dy` 取“上一帧 y − 本帧 y”，指针上移时为正。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerDelta {
    pub dx: f32,
    pub dy: f32,
}

/// 输入状态
#[derive(Debug, Clone)]
pub struct InputState {
    config: InputConfig,
    cursor: Option<(f32, f32)>,
    last_tick_cursor: Option<(f32, f32)>,
    scroll: f32,
    actions: Vec<TransformAction>,
    resized: Option<(u32, u32)>,
    close_requested: bool,
}

impl InputState {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            cursor: None,
            last_tick_cursor: None,
            scroll: 0.0,
            actions: Vec::new(),
            resized: None,
            close_requested: false,
        }
    }

    /// 记录一个输入事件
    pub fn push(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::MouseMoved { x, y } => self.cursor = Some((x, y)),
            InputEvent::MouseWheel { delta_y, .. } => self.scroll += delta_y,
            InputEvent::KeyPressed { key, modifiers } => self.key_pressed(key, modifiers),
            InputEvent::KeyReleased { .. } => {}
            InputEvent::WindowResized { width, height } => self.resized = Some((width, height)),
            InputEvent::WindowCloseRequested => self.close_requested = true,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    fn key_pressed(&mut self, key: KeyCode, modifiers: Modifiers) {
        let t = self.config.translate_step;
        let r = if modifiers.shift {
            -self.config.rotate_step
        } else {
            self.config.rotate_step
        };
        let action = match key {
            KeyCode::Escape => {
                self.close_requested = true;
                return;
            }
            KeyCode::Left => TransformAction::Translate(Vec3::new(-t, 0.0, 0.0)),
            KeyCode::Right => TransformAction::Translate(Vec3::new(t, 0.0, 0.0)),
            KeyCode::Up => TransformAction::Translate(Vec3::new(0.0, t, 0.0)),
            KeyCode::Down => TransformAction::Translate(Vec3::new(0.0, -t, 0.0)),
            KeyCode::PageUp => TransformAction::Translate(Vec3::new(0.0, 0.0, t)),
            KeyCode::PageDown => TransformAction::Translate(Vec3::new(0.0, 0.0, -t)),
            KeyCode::X => TransformAction::Rotate(Vec3::new(r, 0.0, 0.0)),
            KeyCode::Y => TransformAction::Rotate(Vec3::new(0.0, r, 0.0)),
            KeyCode::Z => TransformAction::Rotate(Vec3::new(0.0, 0.0, r)),
            KeyCode::Equal => TransformAction::Scale(self.config.scale_step),
            KeyCode::Minus => TransformAction::Scale(-self.config.scale_step),
            KeyCode::Unknown(_) => return,
        };
        self.actions.push(action);
    }

    /// 取走本帧指针位移
    ///
    /// 第一次观测到指针位置时位移为零。
    pub fn take_pointer_delta(&mut self) -> PointerDelta {
        let delta = match (self.last_tick_cursor, self.cursor) {
            (Some((lx, ly)), Some((x, y))) => PointerDelta {
                dx: x - lx,
                dy: ly - y,
            },
            _ => PointerDelta::default(),
        };
        self.last_tick_cursor = self.cursor;
        delta
    }

    /// 取走累计的滚轮量（行）
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    /// 取走累计的变换操作，按发生顺序排列
    pub fn take_transform_actions(&mut self) -> Vec<TransformAction> {
        std::mem::take(&mut self.actions)
    }

    /// 取走最近一次窗口尺寸变化
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.resized.take()
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::MouseMoved { x, y }
    }

    fn pressed(key: KeyCode, shift: bool) -> InputEvent {
        InputEvent::KeyPressed {
            key,
            modifiers: Modifiers {
                shift,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_first_pointer_observation_is_zero() {
        let mut input = InputState::default();
        input.push(&moved(300.0, 200.0));
        assert_eq!(input.take_pointer_delta(), PointerDelta::default());
    }

    #[test]
    fn test_pointer_delta_between_ticks() {
        let mut input = InputState::default();
        input.push(&moved(300.0, 200.0));
        input.take_pointer_delta();

        input.push(&moved(310.0, 190.0));
        input.push(&moved(320.0, 180.0));
        let d = input.take_pointer_delta();
        assert_eq!(d, PointerDelta { dx: 20.0, dy: 20.0 });

        // 没有新事件时位移为零
        assert_eq!(input.take_pointer_delta(), PointerDelta::default());
    }

    #[test]
    fn test_scroll_accumulates_and_drains() {
        let mut input = InputState::default();
        input.push(&InputEvent::MouseWheel {
            delta_x: 0.0,
            delta_y: 1.0,
        });
        input.push(&InputEvent::MouseWheel {
            delta_x: 0.0,
            delta_y: 2.0,
        });
        assert_eq!(input.take_scroll(), 3.0);
        assert_eq!(input.take_scroll(), 0.0);
    }

    #[test]
    fn test_escape_requests_close() {
        let mut input = InputState::default();
        assert!(!input.close_requested());
        input.push(&pressed(KeyCode::Escape, false));
        assert!(input.close_requested());
        assert!(input.take_transform_actions().is_empty());
    }

    #[test]
    fn test_window_close_event() {
        let mut input = InputState::default();
        input.push(&InputEvent::WindowCloseRequested);
        assert!(input.close_requested());
    }

    #[test]
    fn test_keys_map_to_actions_in_order() {
        let mut input = InputState::default();
        input.push(&pressed(KeyCode::Right, false));
        input.push(&pressed(KeyCode::Y, true));
        input.push(&pressed(KeyCode::Equal, false));
        input.push(&pressed(KeyCode::Unknown(42), false));

        let step = InputConfig::default();
        assert_eq!(
            input.take_transform_actions(),
            vec![
                TransformAction::Translate(Vec3::new(step.translate_step, 0.0, 0.0)),
                TransformAction::Rotate(Vec3::new(0.0, -step.rotate_step, 0.0)),
                TransformAction::Scale(step.scale_step),
            ]
        );
    }

    #[test]
    fn test_resize_keeps_latest() {
        let mut input = InputState::default();
        input.push(&InputEvent::WindowResized {
            width: 800,
            height: 600,
        });
        input.push(&InputEvent::WindowResized {
            width: 1024,
            height: 768,
        });
        assert_eq!(input.take_resize(), Some((1024, 768)));
        assert_eq!(input.take_resize(), None);
    }
}
