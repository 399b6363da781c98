use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `QMAP_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("QMAP_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let cwd = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(&cwd)
    }

    /// 在指定目录下寻找 `config/default.toml`。
    pub fn discover_in(dir: &Path) -> Result<Self, ConfigError> {
        let default_path = dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 输出文件与默认纹理。
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "OutputConfig::default_texture")]
    pub default_texture: String,
}

impl OutputConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("generated_map.map")
    }

    fn default_texture() -> String {
        "__TB_empty".to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            default_texture: Self::default_texture(),
        }
    }
}

/// 生成参数。`strict` 打开后退化几何会直接报错。
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "GeometryConfig::default_room_thickness")]
    pub room_thickness: f64,
    #[serde(default = "GeometryConfig::default_step_width")]
    pub step_width: f64,
    #[serde(default = "GeometryConfig::default_step_depth")]
    pub step_depth: f64,
    #[serde(default = "GeometryConfig::default_step_thickness")]
    pub step_thickness: f64,
    #[serde(default)]
    pub strict: bool,
}

impl GeometryConfig {
    fn default_room_thickness() -> f64 {
        16.0
    }

    fn default_step_width() -> f64 {
        48.0
    }

    fn default_step_depth() -> f64 {
        64.0
    }

    fn default_step_thickness() -> f64 {
        8.0
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            room_thickness: Self::default_room_thickness(),
            step_width: Self::default_step_width(),
            step_depth: Self::default_step_depth(),
            step_thickness: Self::default_step_thickness(),
            strict: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
