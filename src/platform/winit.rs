use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::window::{Window as WinitWindowRaw, WindowBuilder};

use super::{InputEvent, KeyCode, Modifiers};
use crate::config::WindowConfig;
use crate::core::error::{PlatformError, PlatformResult};

/// winit 窗口封装，渲染表面通过共享的 `Arc` 持有窗口
#[derive(Clone)]
pub struct WinitWindow {
    window: Arc<WinitWindowRaw>,
}

impl WinitWindow {
    pub fn try_new(event_loop: &EventLoop<()>, config: &WindowConfig) -> PlatformResult<Self> {
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(
                config.resolution.width,
                config.resolution.height,
            ))
            .build(event_loop)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    pub fn shared(&self) -> Arc<WinitWindowRaw> {
        Arc::clone(&self.window)
    }

    pub fn id(&self) -> winit::window::WindowId {
        self.window.id()
    }
}

impl crate::platform::Window for WinitWindow {
    fn request_redraw(&self) {
        self.window.request_redraw();
    }
    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// 把 winit 窗口事件翻译成平台无关的输入事件
///
/// `modifiers` 记录最近一次修饰键状态；`pixels_per_line` 用于把触控板的像素滚动折算成行。
pub fn translate_window_event(
    event: &WindowEvent,
    modifiers: &mut Modifiers,
    pixels_per_line: f32,
) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::WindowCloseRequested),
        WindowEvent::Resized(sz) => Some(InputEvent::WindowResized {
            width: sz.width,
            height: sz.height,
        }),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let (dx, dy) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => {
                    let scale = pixels_per_line.max(f32::EPSILON);
                    (p.x as f32 / scale, p.y as f32 / scale)
                }
            };
            Some(InputEvent::MouseWheel {
                delta_x: dx,
                delta_y: dy,
            })
        }
        WindowEvent::ModifiersChanged(m) => {
            let state = m.state();
            *modifiers = Modifiers {
                shift: state.shift_key(),
                ctrl: state.control_key(),
                alt: state.alt_key(),
                logo: state.super_key(),
            };
            None
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let key = match event.physical_key {
                PhysicalKey::Code(code) => map_key(code),
                PhysicalKey::Unidentified(_) => KeyCode::Unknown(0),
            };
            let m = *modifiers;
            Some(match event.state {
                ElementState::Pressed => InputEvent::KeyPressed { key, modifiers: m },
                ElementState::Released => InputEvent::KeyReleased { key, modifiers: m },
            })
        }
        _ => None,
    }
}

fn map_key(code: WinitKeyCode) -> KeyCode {
    match code {
        WinitKeyCode::KeyX => KeyCode::X,
        WinitKeyCode::KeyY => KeyCode::Y,
        WinitKeyCode::KeyZ => KeyCode::Z,
        WinitKeyCode::Escape => KeyCode::Escape,
        WinitKeyCode::Equal | WinitKeyCode::NumpadAdd => KeyCode::Equal,
        WinitKeyCode::Minus | WinitKeyCode::NumpadSubtract => KeyCode::Minus,
        WinitKeyCode::ArrowLeft => KeyCode::Left,
        WinitKeyCode::ArrowRight => KeyCode::Right,
        WinitKeyCode::ArrowUp => KeyCode::Up,
        WinitKeyCode::ArrowDown => KeyCode::Down,
        WinitKeyCode::PageUp => KeyCode::PageUp,
        WinitKeyCode::PageDown => KeyCode::PageDown,
        _ => KeyCode::Unknown(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    #[test]
    fn test_close_and_resize() {
        let mut m = Modifiers::default();
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested, &mut m, 20.0),
            Some(InputEvent::WindowCloseRequested)
        );
        assert_eq!(
            translate_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600)), &mut m, 20.0),
            Some(InputEvent::WindowResized {
                width: 800,
                height: 600
            })
        );
    }

    #[test]
    fn test_pixel_scroll_converted_to_lines() {
        let mut m = Modifiers::default();
        let event = WindowEvent::MouseWheel {
            device_id: unsafe { DeviceId::dummy() },
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 40.0)),
            phase: TouchPhase::Moved,
        };
        assert_eq!(
            translate_window_event(&event, &mut m, 20.0),
            Some(InputEvent::MouseWheel {
                delta_x: 0.0,
                delta_y: 2.0
            })
        );
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(WinitKeyCode::Escape), KeyCode::Escape);
        assert_eq!(map_key(WinitKeyCode::NumpadAdd), KeyCode::Equal);
        assert!(matches!(map_key(WinitKeyCode::KeyQ), KeyCode::Unknown(_)));
    }
}
