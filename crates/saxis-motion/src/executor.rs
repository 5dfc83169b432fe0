//! SegmentExecutor - 段执行
//!
//! 把运动方式标签与附加参数组合成具体的 [`Motion`]，交给插值器生成惰性的
//! [`Paces`]。起点缺省时取共享状态中的当前位姿。

use crate::config::MotionConfig;
use crate::error::{MotionError, Result};
use crate::state::RobotState;
use saxis_kinematics::{CancelToken, Flavor, Interpolator, Motion, Paces, Pose, Rad, Vec3};
use std::time::Duration;
use tracing::debug;

/// 运动方式的附加参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extras {
    /// 圆弧弯曲轴
    pub arc_axis: Vec3,
    /// 圆弧圆心角
    pub arc_angle: Rad,
    /// 上一个路点（圆角过渡）
    pub previous: Option<Vec3>,
    /// 下一个路点（圆角过渡）
    pub next: Option<Vec3>,
    /// 切入距离
    pub lead_in: f64,
    /// 切出距离
    pub lead_out: f64,
}

impl Extras {
    /// 由配置构造（圆弧轴为绘图平面法线 +Y）
    pub fn from_config(config: &MotionConfig) -> Self {
        Extras {
            arc_axis: Vec3::y(),
            arc_angle: config.arc_angle(),
            previous: None,
            next: None,
            lead_in: config.lead_in(),
            lead_out: config.lead_out(),
        }
    }

    /// 设置相邻路点
    pub fn with_neighbours(mut self, previous: Option<Vec3>, next: Option<Vec3>) -> Self {
        self.previous = previous;
        self.next = next;
        self
    }
}

/// 段执行器
#[derive(Debug, Clone)]
pub struct SegmentExecutor {
    interpolator: Interpolator,
    state: RobotState,
}

impl SegmentExecutor {
    /// 创建段执行器
    pub fn new(interpolator: Interpolator, state: RobotState) -> Self {
        SegmentExecutor {
            interpolator,
            state,
        }
    }

    /// 运动方式 + 附加参数 → 运动描述
    ///
    /// # 错误
    ///
    /// CornerCut 缺少相邻路点时返回 [`MotionError::MissingExtras`]。
    pub fn motion(flavor: Flavor, extras: &Extras) -> Result<Motion> {
        match flavor {
            Flavor::JointInterpolated => Ok(Motion::JointInterpolated),
            Flavor::Arc => Ok(Motion::Arc {
                axis: extras.arc_axis,
                angle: extras.arc_angle,
            }),
            Flavor::Linear => Ok(Motion::Linear),
            Flavor::CornerCut => {
                let previous = extras.previous.ok_or(MotionError::MissingExtras {
                    flavor,
                    missing: "previous waypoint",
                })?;
                let next = extras.next.ok_or(MotionError::MissingExtras {
                    flavor,
                    missing: "next waypoint",
                })?;
                Ok(Motion::CornerCut {
                    previous,
                    next,
                    lead_in: extras.lead_in,
                    lead_out: extras.lead_out,
                })
            },
        }
    }

    /// 生成一段插值步
    ///
    /// `start` 为空时从共享状态的当前位姿出发。返回的迭代器只能消费一次。
    pub fn run(
        &self,
        flavor: Flavor,
        dt: Duration,
        start: Option<&Pose>,
        end: &Pose,
        extras: &Extras,
        cancel: &CancelToken,
    ) -> Result<Paces> {
        let motion = Self::motion(flavor, extras)?;
        let start = match start {
            Some(pose) => *pose,
            None => self.state.pose(),
        };

        let paces = self.interpolator.run(&motion, &start, dt, end, cancel)?;
        debug!(%flavor, steps = paces.steps(), ?dt, "segment started");
        Ok(paces)
    }

    /// 共享状态
    pub fn state(&self) -> &RobotState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saxis_kinematics::{InterpolatorConfig, Joints, PaceClock, SixAxis};
    use std::sync::Arc;

    fn executor() -> SegmentExecutor {
        let robot = Arc::new(SixAxis::reference().unwrap());
        let interpolator =
            Interpolator::new(robot.clone(), InterpolatorConfig::default(), PaceClock::Unpaced)
                .unwrap();
        let state = RobotState::new(robot, Joints::splat(Rad(0.0)));
        SegmentExecutor::new(interpolator, state)
    }

    #[test]
    fn test_motion_dispatch() {
        let extras = Extras::from_config(&MotionConfig::default());
        assert_eq!(
            SegmentExecutor::motion(Flavor::Linear, &extras).unwrap(),
            Motion::Linear
        );
        assert!(matches!(
            SegmentExecutor::motion(Flavor::Arc, &extras).unwrap(),
            Motion::Arc { axis, .. } if axis == Vec3::y()
        ));
        assert!(matches!(
            SegmentExecutor::motion(Flavor::CornerCut, &extras),
            Err(MotionError::MissingExtras { .. })
        ));

        let extras = extras.with_neighbours(Some(Vec3::zeros()), Some(Vec3::x()));
        assert!(matches!(
            SegmentExecutor::motion(Flavor::CornerCut, &extras).unwrap(),
            Motion::CornerCut { lead_in, .. } if (lead_in - 3.0 / 7.0).abs() < 1e-12
        ));
    }

    #[test]
    fn test_run_starts_from_current_state() {
        let executor = executor();
        let target = Joints::splat(Rad(0.2));
        let end = Pose::from_joints(executor.state().robot().as_ref(), target);
        let extras = Extras::from_config(&MotionConfig::default());

        executor.state().set_joints(Joints::splat(Rad(0.1)));
        let paces: Vec<_> = executor
            .run(
                Flavor::JointInterpolated,
                Duration::ZERO,
                None,
                &end,
                &extras,
                &CancelToken::new(),
            )
            .unwrap()
            .collect();

        // 0.1 rad ≈ 5.7° → 2 步，第一步位于当前状态与终点之间
        assert_eq!(paces.len(), 2);
        assert!((paces[0].joints[0].0 - 0.15).abs() < 1e-12);
        assert_eq!(paces[1].joints, target);
    }
}
