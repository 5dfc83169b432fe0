//! 命令行参数
//!
//! 参数覆盖配置文件中的同名字段；没有配置文件时从默认配置出发。

use anyhow::{Context, Result};
use clap::Parser;
use saxis_motion::MotionConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// saxis - 六轴绘图机械臂运动序列器
#[derive(Parser, Debug)]
#[command(name = "saxis")]
#[command(about = "Six-axis drawing arm motion sequencer with an HTTP query front end", long_about = None)]
#[command(version)]
pub struct Args {
    /// 监听地址（`:8080` 表示所有网卡）
    #[arg(long, default_value = ":8080")]
    pub addr: String,

    /// 静态资源目录
    #[arg(long, default_value = "./html")]
    pub dir: PathBuf,

    /// Hilbert 曲线阶数
    #[arg(long)]
    pub detail: Option<u32>,

    /// 每个插值步的时长（秒）
    #[arg(long)]
    pub dt: Option<f64>,

    /// 圆弧圆心角（度）
    #[arg(long)]
    pub arc: Option<f64>,

    /// 绘图平面边长
    #[arg(long)]
    pub width: Option<f64>,

    /// 输出逐步日志
    #[arg(long)]
    pub debug: bool,

    /// TOML 配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// 合并配置文件与命令行参数
    pub fn motion_config(&self) -> Result<MotionConfig> {
        let mut config = match &self.config {
            Some(path) => MotionConfig::load_from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => MotionConfig::default(),
        };

        if let Some(detail) = self.detail {
            config.depth = detail;
        }
        if let Some(dt) = self.dt {
            config.dt = dt;
        }
        if let Some(arc) = self.arc {
            config.arc_degrees = arc;
        }
        if let Some(width) = self.width {
            config.width = width;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// 解析监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = match self.addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.addr.clone(),
        };
        addr.parse()
            .with_context(|| format!("invalid listen address {:?}", self.addr))
    }

    /// 日志过滤器（`RUST_LOG` 未设置时使用）
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "saxis=debug,saxis_motion=debug,saxis_kinematics=debug,tower_http=debug"
        } else {
            "saxis=info,saxis_motion=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["saxis", "--detail", "0", "--dt", "0.5", "--width", "4"]);
        let config = args.motion_config().unwrap();
        assert_eq!(config.depth, 0);
        assert_eq!(config.dt, 0.5);
        assert_eq!(config.width, 4.0);
        assert_eq!(config.arc_degrees, 120.0);
        assert!(!args.debug);
        assert_eq!(args.log_filter(), "saxis=info,saxis_motion=info");
    }

    #[test]
    fn test_socket_addr() {
        let args = Args::parse_from(["saxis"]);
        assert_eq!(args.socket_addr().unwrap(), "0.0.0.0:8080".parse().unwrap());

        let args = Args::parse_from(["saxis", "--addr", "127.0.0.1:9000"]);
        assert_eq!(args.socket_addr().unwrap().port(), 9000);

        let args = Args::parse_from(["saxis", "--addr", "nowhere"]);
        assert!(args.socket_addr().is_err());
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let args = Args::parse_from(["saxis", "--dt", "0"]);
        assert!(args.motion_config().is_err());
    }
}
