//! 运动学层错误类型定义

use thiserror::Error;

/// 运动学层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// 机械臂模型定义无效（关节数量、构型或限位）
    #[error("Invalid robot model: {0}")]
    InvalidModel(String),

    /// 逆解没有任何候选（目标不可达或全部超出限位）
    #[error("No inverse kinematics candidates")]
    NoCandidates,

    /// 候选选择失败（候选均无效，例如含 NaN）
    #[error("No viable candidate among {count} solutions")]
    NoViableCandidate {
        /// 候选数量
        count: usize,
    },

    /// 曲线阶数或序号超出范围
    #[error("Hilbert index {index} out of range for order {order}")]
    CurveOutOfRange {
        /// 阶数
        order: u32,
        /// 序号
        index: u64,
    },

    /// 插值参数无效
    #[error("Invalid motion parameter '{param}': {reason}")]
    InvalidMotion {
        /// 参数名
        param: &'static str,
        /// 原因
        reason: String,
    },
}
