pub mod input;
pub mod winit;

pub use input::{InputState, PointerDelta};

// ============================================================================
// Platform Window Abstraction
// ============================================================================

/// 平台窗口抽象
pub trait Window {
    fn request_redraw(&self);
    fn set_title(&self, title: &str);
}

// ============================================================================
// Input Abstraction
// ============================================================================

/// 与窗口系统无关的输入事件记录
///
/// 回调不直接修改相机或变换状态，只产生事件，由 `InputState` 在帧开始时消费。
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard
    KeyPressed { key: KeyCode, modifiers: Modifiers },
    KeyReleased { key: KeyCode, modifiers: Modifiers },

    // Mouse
    MouseMoved { x: f32, y: f32 },
    /// 以“行”为单位的滚动量
    MouseWheel { delta_x: f32, delta_y: f32 },

    // Window
    WindowResized { width: u32, height: u32 },
    WindowCloseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    X, Y, Z,
    Escape, Equal, Minus,
    Left, Right, Up, Down, PageUp, PageDown,
    Unknown(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}
