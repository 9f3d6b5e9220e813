/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和启动期校验
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod graphics;
pub mod input;
pub mod scene;
pub mod simulation;

pub use graphics::{
    ModelConfig, OffscreenConfig, RenderConfig, Resolution, TargetFormat, WindowConfig,
};
pub use input::InputConfig;
pub use scene::{CameraConfig, TransformConfig};
pub use simulation::{ParticleConfig, TimingConfig};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 查看器主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 轨道相机配置
    #[serde(default)]
    pub camera: CameraConfig,

    /// 模型变换初始参数
    #[serde(default)]
    pub transform: TransformConfig,

    /// 粒子系统配置
    #[serde(default)]
    pub particles: ParticleConfig,

    /// 渲染配置
    #[serde(default)]
    pub render: RenderConfig,

    /// 输入配置
    #[serde(default)]
    pub input: InputConfig,

    /// 帧计时配置
    #[serde(default)]
    pub timing: TimingConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 加载结果：配置本身以及它的来源文件（None 表示使用默认配置）
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ViewerConfig,
    pub source: Option<PathBuf>,
}

impl ViewerConfig {
    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载配置文件，`.json` 走 JSON，其余按 TOML 解析
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// 从任意键值来源覆盖配置，无法解析的值保持原样
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(
            lookup: &dyn Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        if let Some(width) = parsed(&lookup, "VIEWER_WINDOW_WIDTH") {
            self.window.resolution.width = width;
        }
        if let Some(height) = parsed(&lookup, "VIEWER_WINDOW_HEIGHT") {
            self.window.resolution.height = height;
        }
        if let Some(vsync) = parsed(&lookup, "VIEWER_WINDOW_VSYNC") {
            self.window.vsync = vsync;
        }
        if let Some(count) = parsed(&lookup, "VIEWER_PARTICLE_COUNT") {
            self.particles.count = count;
        }
        if let Some(seed) = parsed(&lookup, "VIEWER_PARTICLE_SEED") {
            self.particles.seed = Some(seed);
        }
        if let Some(enabled) = parsed(&lookup, "VIEWER_OFFSCREEN") {
            self.render.offscreen.enabled = enabled;
        }
        if let Some(window) = parsed(&lookup, "VIEWER_FPS_WINDOW") {
            self.timing.fps_window = window;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.window.validate()?;
        self.camera.validate()?;
        self.particles.validate()?;
        self.render.validate()?;
        self.timing.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. 显式传入的路径（加载失败直接返回错误）
    /// 2. ./viewer.toml（存在但无法解析时返回错误，不回落到默认配置）
    /// 3. ./viewer.json
    /// 4. ~/.config/particle_viewer/viewer.toml
    /// 5. 使用默认配置
    ///
    /// 结果已应用环境变量覆盖并通过校验。
    pub fn load_or_default(explicit: Option<&Path>) -> ConfigResult<LoadedConfig> {
        let mut loaded = match explicit {
            Some(path) => LoadedConfig {
                config: Self::from_file(path)?,
                source: Some(path.to_path_buf()),
            },
            None => Self::discover()?,
        };
        loaded.config.apply_env_overrides();
        loaded.config.validate()?;
        Ok(loaded)
    }

    fn discover() -> ConfigResult<LoadedConfig> {
        let home = env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("particle_viewer")
                .join("viewer.toml")
        });
        Self::discover_in(Path::new("."), home)
    }

    /// 在 `dir` 下依次查找候选文件
    ///
    /// 只有文件不存在时才继续查找下一个；存在但读取或解析失败的文件直接返回错误。
    fn discover_in(dir: &Path, home: Option<PathBuf>) -> ConfigResult<LoadedConfig> {
        let candidates = [dir.join("viewer.toml"), dir.join("viewer.json")]
            .into_iter()
            .chain(home);

        for path in candidates {
            match Self::from_file(&path) {
                Ok(config) => {
                    return Ok(LoadedConfig {
                        config,
                        source: Some(path),
                    })
                }
                Err(ConfigError::FileError(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        target: "config",
                        path = %path.display(),
                        error = %e,
                        "Config file rejected"
                    );
                    return Err(e);
                }
            }
        }

        Ok(LoadedConfig {
            config: Self::default(),
            source: None,
        })
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: LogLevel,

    /// 是否输出事件的 target
    pub with_target: bool,
}

use crate::impl_default;

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    with_target: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 对应的 `EnvFilter` 指令
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.resolution.width, 640);
        assert_eq!(config.window.resolution.height, 480);
        assert_eq!(config.timing.fps_window, 1000);
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = ViewerConfig::default();
        config.particles.count = 4096;
        config.render.offscreen.enabled = true;
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: ViewerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.particles.count, 4096);
        assert!(parsed.render.offscreen.enabled);
        assert_eq!(parsed.particles.step, config.particles.step);
    }

    #[test]
    fn test_json_serialization() {
        let config = ViewerConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed: ViewerConfig = serde_json::from_str(&json_str).unwrap();
        assert_eq!(
            config.window.resolution.width,
            parsed.window.resolution.width
        );
        assert_eq!(config.camera.radius, parsed.camera.radius);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [particles]
            count = 10
            half_extent = 1.0
            mass_min = 10.0
            mass_max = 100.0
            gravity = [0.0, -9.81, 0.0]

            [camera]
            radius = 200.0
            "#,
        )
        .unwrap();
        assert_eq!(config.particles.count, 10);
        assert_eq!(config.camera.radius, 200.0);
        assert_eq!(config.camera.sensitivity_theta, 0.001);
        assert_eq!(config.window.title, WindowConfig::default().title);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("VIEWER_WINDOW_WIDTH", "1280"),
            ("VIEWER_PARTICLE_COUNT", "77"),
            ("VIEWER_OFFSCREEN", "true"),
            ("VIEWER_FPS_WINDOW", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ViewerConfig::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.window.resolution.width, 1280);
        assert_eq!(config.particles.count, 77);
        assert!(config.render.offscreen.enabled);
        assert_eq!(config.timing.fps_window, 1000);
    }

    #[test]
    fn test_validation_rejects_zero_particles() {
        let mut config = ViewerConfig::default();
        config.particles.count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("viewer.toml");
        let json_path = dir.path().join("viewer.json");

        let mut config = ViewerConfig::default();
        config.camera.radius = 42.0;
        config.save_toml(&toml_path).unwrap();
        config.save_json(&json_path).unwrap();

        assert_eq!(ViewerConfig::from_file(&toml_path).unwrap().camera.radius, 42.0);
        assert_eq!(ViewerConfig::from_file(&json_path).unwrap().camera.radius, 42.0);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            ViewerConfig::load_or_default(Some(&missing)),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn test_non_finite_particle_values_fail_validation() {
        for text in [
            "[particles]\ncount = 4\nmass_max = nan\n",
            "[particles]\ncount = 4\nhalf_extent = inf\n",
        ] {
            let config = ViewerConfig::from_toml_str(text).unwrap();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_discovered_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("viewer.toml"), "[particles]\ncount = \"oops\"\n").unwrap();

        assert!(matches!(
            ViewerConfig::discover_in(dir.path(), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_discovery_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ViewerConfig::discover_in(dir.path(), None).unwrap();
        assert!(loaded.source.is_none());

        fs::write(dir.path().join("viewer.json"), r#"{"particles": {"count": 7}}"#).unwrap();
        let loaded = ViewerConfig::discover_in(dir.path(), None).unwrap();
        assert_eq!(loaded.source, Some(dir.path().join("viewer.json")));
        assert_eq!(loaded.config.particles.count, 7);
    }

    #[test]
    fn test_log_level_directive() {
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
        let parsed: LoggingConfig = toml::from_str("level = \"debug\"\nwith_target = false").unwrap();
        assert_eq!(parsed.level, LogLevel::Debug);
    }
}
