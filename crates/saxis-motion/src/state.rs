//! RobotState - 共享机器人状态
//!
//! 单写多读：只有序列器线程调用 [`RobotState::apply_pace`]，查询处理器并发调用
//! [`RobotState::snapshot`]。
//!
//! # 一致性
//!
//! **强一致**：一个 Pace 的六个关节角与由正运动学导出的末端位姿在同一个写临界区
//! 内整体替换，读者不可能看到只更新了部分关节的位姿。
//!
//! # 使用示例
//!
//! ```rust
//! use saxis_kinematics::{Joints, Pace, Rad, SixAxis};
//! use saxis_motion::RobotState;
//! use std::sync::Arc;
//!
//! let robot = Arc::new(SixAxis::reference().unwrap());
//! let state = RobotState::new(robot, Joints::splat(Rad(0.0)));
//!
//! state.apply_pace(&Pace { frac: 1.0, joints: Joints::splat(Rad(0.1)) });
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.joints, Joints::splat(Rad(0.1)));
//! ```

use parking_lot::RwLock;
use saxis_kinematics::{CartesianPose, Joints, Kinematics, Pace, Pose};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// 机器人状态快照
#[derive(Debug, Clone, Copy)]
pub struct RobotSnapshot {
    /// 关节角
    pub joints: Joints,
    /// 末端位姿（正运动学）
    pub pose: CartesianPose,
    /// 最后更新时间
    pub updated_at: Instant,
}

impl RobotSnapshot {
    /// 转换为完整位姿（笛卡尔 + 关节）
    pub fn to_pose(&self) -> Pose {
        Pose::new(self.pose.position, self.pose.orientation, self.joints)
    }
}

/// 共享机器人状态（可克隆，内部使用 Arc）
#[derive(Clone)]
pub struct RobotState {
    robot: Arc<dyn Kinematics>,
    inner: Arc<RwLock<RobotSnapshot>>,
}

impl fmt::Debug for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobotState")
            .field("snapshot", &*self.inner.read())
            .finish_non_exhaustive()
    }
}

impl RobotState {
    /// 以给定关节角创建状态
    pub fn new(robot: Arc<dyn Kinematics>, joints: Joints) -> Self {
        let snapshot = RobotSnapshot {
            joints,
            pose: robot.forward(&joints),
            updated_at: Instant::now(),
        };
        RobotState {
            robot,
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// 应用一个插值步（仅序列器线程调用）
    pub fn apply_pace(&self, pace: &Pace) {
        self.set_joints(pace.joints);
    }

    /// 直接设置关节角
    ///
    /// 正运动学在锁外计算，锁内只做整体替换。
    pub fn set_joints(&self, joints: Joints) {
        let snapshot = RobotSnapshot {
            joints,
            pose: self.robot.forward(&joints),
            updated_at: Instant::now(),
        };
        *self.inner.write() = snapshot;
    }

    /// 获取状态快照
    pub fn snapshot(&self) -> RobotSnapshot {
        *self.inner.read()
    }

    /// 当前关节角
    pub fn joints(&self) -> Joints {
        self.inner.read().joints
    }

    /// 当前位姿
    pub fn pose(&self) -> Pose {
        self.snapshot().to_pose()
    }

    /// 运动学模型
    pub fn robot(&self) -> &Arc<dyn Kinematics> {
        &self.robot
    }
}
