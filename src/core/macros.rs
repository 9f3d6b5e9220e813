//! 核心宏定义
//!
//! 配置结构体大量使用固定默认值，用宏统一生成 `Default` 实现

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use particle_viewer::impl_default;
///
/// struct Orbit {
///     radius: f32,
///     label: String,
/// }
///
/// impl_default!(Orbit {
///     radius: 10.0,
///     label: String::from("main"),
/// });
///
/// assert_eq!(Orbit::default().radius, 10.0);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
