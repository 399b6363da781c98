use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use qmap_config::{AppConfig, ConfigError};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod generate;

/// 程序化生成 Quake 标准格式的 `.map` 关卡文件。
#[derive(Debug, Parser)]
#[command(name = "qmap", version)]
struct Cli {
    /// 配置文件路径，缺省时读取 `QMAP_CONFIG` 或 `./config/default.toml`
    #[arg(long)]
    config: Option<PathBuf>,
    /// 输出的 `.map` 文件路径，覆盖配置中的 `output.path`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 退化几何直接报错而不是仅记录警告
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, fallback) = load_configuration(cli.config);
    init_logging(&config);
    if let Some(fallback) = fallback {
        fallback.report();
    }
    info!("启动 qmap 地图生成器");

    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if cli.strict {
        config.geometry.strict = true;
    }

    match generate::run(&config) {
        Ok(report) => {
            generate::print_next_steps(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "生成地图失败");
            ExitCode::FAILURE
        }
    }
}

/// 配置加载失败的原因。日志初始化之后才输出，否则警告会被丢弃。
enum ConfigFallback {
    Explicit { path: PathBuf, error: ConfigError },
    Discovered(ConfigError),
}

impl ConfigFallback {
    fn report(&self) {
        match self {
            ConfigFallback::Explicit { path, error } => {
                warn!(path = %path.display(), error = %error, "加载指定配置失败，使用默认配置");
            }
            ConfigFallback::Discovered(error) => match error {
                ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                    warn!(path = %path.display(), error = %error, "加载默认配置失败，使用内建默认值");
                }
                ConfigError::Context { .. } => {
                    warn!(error = %error, "加载默认配置失败，使用内建默认值");
                }
            },
        }
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> (AppConfig, Option<ConfigFallback>) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(&path)
            .map_err(|error| ConfigFallback::Explicit { path, error }),
        None => AppConfig::discover().map_err(ConfigFallback::Discovered),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(fallback) => (AppConfig::default(), Some(fallback)),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
