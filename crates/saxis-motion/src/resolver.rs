//! PoseResolver - 路点解析
//!
//! 把路点（位置 + 姿态）解析为一组确定的关节角：在逆解的全部候选中选择与上一
//! 位姿关节距离最近的一个。没有上一位姿时交给运动学模型的默认规则（最接近零位）。
//! 候选为空或选择失败都是致命错误。

use crate::error::{MotionError, Result};
use crate::path::Waypoint;
use saxis_kinematics::{Kinematics, KinematicsError, Pose};
use std::sync::Arc;
use tracing::debug;

/// 路点解析器
#[derive(Clone)]
pub struct PoseResolver {
    robot: Arc<dyn Kinematics>,
}

impl PoseResolver {
    /// 创建解析器
    pub fn new(robot: Arc<dyn Kinematics>) -> Self {
        PoseResolver { robot }
    }

    /// 解析单个路点
    ///
    /// # 错误
    ///
    /// - [`MotionError::Unreachable`]: 逆解没有候选
    /// - [`MotionError::Kinematics`]: 候选选择失败
    pub fn resolve(&self, waypoint: &Waypoint, previous: Option<&Pose>) -> Result<Pose> {
        self.resolve_indexed(0, waypoint, previous)
    }

    /// 链式解析整条路径：第 i 个位姿相对第 i-1 个选择，第 0 个相对 `initial`
    pub fn resolve_path(&self, waypoints: &[Waypoint], initial: Option<&Pose>) -> Result<Vec<Pose>> {
        let mut poses: Vec<Pose> = Vec::with_capacity(waypoints.len());
        for (index, waypoint) in waypoints.iter().enumerate() {
            let previous = poses.last().or(initial);
            let pose = self.resolve_indexed(index, waypoint, previous)?;
            poses.push(pose);
        }
        Ok(poses)
    }

    fn resolve_indexed(
        &self,
        index: usize,
        waypoint: &Waypoint,
        previous: Option<&Pose>,
    ) -> Result<Pose> {
        let candidates = self
            .robot
            .inverse(&waypoint.orientation, &waypoint.position);
        if candidates.is_empty() {
            return Err(MotionError::Unreachable {
                index,
                x: waypoint.position.x,
                y: waypoint.position.y,
                z: waypoint.position.z,
            });
        }

        let best = self
            .robot
            .closest(previous.map(|p| &p.joints), &candidates)?;
        let joints = *candidates.get(best).ok_or(KinematicsError::NoViableCandidate {
            count: candidates.len(),
        })?;

        debug!(
            index,
            candidates = candidates.len(),
            chosen = best,
            "waypoint resolved"
        );

        Ok(Pose::new(waypoint.position, waypoint.orientation, joints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::drawing_orientation;
    use saxis_kinematics::{Candidates, CartesianPose, JointSpec, Joints, Rad, Rot3, SixAxis, Vec3};

    /// 固定候选的运动学模型
    struct Fixed {
        candidates: Vec<Joints>,
    }

    impl Kinematics for Fixed {
        fn joints(&self) -> &[JointSpec] {
            &[]
        }

        fn forward(&self, _joints: &Joints) -> CartesianPose {
            CartesianPose::new(Vec3::zeros(), Rot3::identity())
        }

        fn inverse(&self, _orientation: &Rot3, _point: &Vec3) -> Candidates {
            self.candidates.iter().copied().collect()
        }
    }

    fn waypoint(x: f64, z: f64) -> Waypoint {
        Waypoint::new(Vec3::new(x, -3.79, z), drawing_orientation())
    }

    #[test]
    fn test_resolve_uses_default_tie_break() {
        let resolver = PoseResolver::new(Arc::new(Fixed {
            candidates: vec![Joints::splat(Rad(1.0)), Joints::splat(Rad(0.1))],
        }));
        let pose = resolver.resolve(&waypoint(0.0, 0.0), None).unwrap();
        assert_eq!(pose.joints, Joints::splat(Rad(0.1)));
    }

    #[test]
    fn test_resolve_prefers_previous() {
        let resolver = PoseResolver::new(Arc::new(Fixed {
            candidates: vec![Joints::splat(Rad(1.0)), Joints::splat(Rad(0.1))],
        }));
        let previous = Pose::new(Vec3::zeros(), Rot3::identity(), Joints::splat(Rad(0.8)));
        let pose = resolver.resolve(&waypoint(0.0, 0.0), Some(&previous)).unwrap();
        assert_eq!(pose.joints, Joints::splat(Rad(1.0)));
    }

    #[test]
    fn test_empty_candidates_is_unreachable() {
        let resolver = PoseResolver::new(Arc::new(Fixed { candidates: vec![] }));
        let err = resolver
            .resolve_path(&[waypoint(0.0, 0.0), waypoint(1.0, 0.0)], None)
            .unwrap_err();
        assert!(matches!(err, MotionError::Unreachable { index: 0, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_failed_selection_is_fatal() {
        let resolver = PoseResolver::new(Arc::new(Fixed {
            candidates: vec![Joints::splat(Rad(f64::NAN))],
        }));
        let err = resolver.resolve(&waypoint(0.0, 0.0), None).unwrap_err();
        assert!(matches!(
            err,
            MotionError::Kinematics(KinematicsError::NoViableCandidate { count: 1 })
        ));
    }

    #[test]
    fn test_resolve_path_chains_on_real_arm() {
        let robot = Arc::new(SixAxis::reference().unwrap());
        let resolver = PoseResolver::new(robot.clone());
        let waypoints = [waypoint(-1.5, -0.49), waypoint(1.5, -0.49), waypoint(1.5, 2.51)];

        let poses = resolver.resolve_path(&waypoints, None).unwrap();
        assert_eq!(poses.len(), 3);

        for (i, pose) in poses.iter().enumerate().skip(1) {
            let candidates = robot.inverse(&pose.orientation, &pose.position);
            let chosen = pose.joints.distance(&poses[i - 1].joints);
            assert!(candidates
                .iter()
                .all(|c| c.distance(&poses[i - 1].joints) >= chosen));
        }
    }
}
