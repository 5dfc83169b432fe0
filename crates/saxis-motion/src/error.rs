//! 错误类型体系
//!
//! 区分致命错误（序列器停止、进程以非零状态退出）与关闭路径上的正常终止。
//!
//! # 示例
//!
//! ```rust
//! use saxis_motion::MotionError;
//!
//! fn report(err: &MotionError) {
//!     if err.is_fatal() {
//!         eprintln!("致命错误: {}", err);
//!     } else {
//!         eprintln!("已停止: {}", err);
//!     }
//! }
//! ```

use saxis_kinematics::{Flavor, KinematicsError};
use thiserror::Error;

/// 运动序列器错误类型
#[derive(Debug, Clone, Error)]
pub enum MotionError {
    // ==================== Fatal Errors ====================
    /// 运动学层错误（模型无效、候选选择失败、参数无效）
    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    /// 路点不可达（逆解没有候选）
    #[error("Waypoint {index} is unreachable at ({x:.3}, {y:.3}, {z:.3})")]
    Unreachable {
        /// 路点序号
        index: usize,
        /// X 坐标
        x: f64,
        /// Y 坐标
        y: f64,
        /// Z 坐标
        z: f64,
    },

    /// 插值失败（产出了 frac <= 0 的 Pace）
    #[error("Interpolation failed: generation={generation} segment={segment} flavor={flavor}")]
    InterpolationFailed {
        /// 代数
        generation: u64,
        /// 段序号
        segment: usize,
        /// 运动方式
        flavor: Flavor,
    },

    /// 运动方式缺少必要的附加参数
    #[error("Flavor {flavor} requires {missing}")]
    MissingExtras {
        /// 运动方式
        flavor: Flavor,
        /// 缺失的参数
        missing: &'static str,
    },

    /// 配置无效
    #[error("Invalid configuration '{param}': {reason}")]
    InvalidConfig {
        /// 参数名
        param: &'static str,
        /// 原因
        reason: String,
    },

    /// 配置文件读取或解析失败
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    /// 后台线程启动失败
    #[error("Failed to spawn sequencer thread: {0}")]
    Spawn(String),

    // ==================== Shutdown ====================
    /// 取消令牌已触发
    #[error("Motion cancelled")]
    Cancelled,

    /// 同步门已关闭
    #[error("Sync gate closed")]
    GateClosed,
}

impl MotionError {
    /// 是否为致命错误
    ///
    /// 取消与同步门关闭属于正常关闭路径，其余全部致命。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MotionError::Cancelled | MotionError::GateClosed)
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MotionError>;
