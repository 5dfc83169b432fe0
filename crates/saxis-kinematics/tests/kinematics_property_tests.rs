//! 运动学属性测试
//!
//! 使用 proptest 验证：
//! - 正解 → 逆解往返（候选集合包含原始位形，且每个候选的正解都命中目标）
//! - 最近候选规则
//! - 插值步比例单调且为正

use proptest::prelude::*;
use saxis_kinematics::{
    CancelToken, Interpolator, InterpolatorConfig, Joints, Kinematics, Motion, PaceClock, Pose,
    Rad, SixAxis,
};
use std::sync::Arc;
use std::time::Duration;

fn joints(values: [f64; 6]) -> Joints {
    Joints::new(values.map(Rad))
}

proptest! {
    /// 非奇异位形的逆解往返
    #[test]
    fn inverse_recovers_forward(
        j1 in -2.5..2.5f64,
        j2 in 0.2..1.0f64,
        j3 in 0.2..1.0f64,
        j4 in -2.5..2.5f64,
        j5 in 0.2..1.5f64,
        j6 in -3.0..3.0f64,
    ) {
        let robot = SixAxis::reference().unwrap();
        let known = joints([j1, j2, j3, j4, j5, j6]);
        let target = robot.forward(&known);

        let candidates = robot.inverse(&target.orientation, &target.position);
        prop_assert!(candidates.iter().any(|c| c.max_delta(&known).0 < 1e-6));

        for c in &candidates {
            let pose = robot.forward(c);
            prop_assert!((pose.position - target.position).norm() < 1e-6);
            prop_assert!(pose.orientation.angle_to(&target.orientation) < 1e-6);
        }
    }

    /// 所选候选与参考位形的距离不大于任何其他候选
    #[test]
    fn closest_minimises_distance(
        reference in prop::array::uniform6(-3.0..3.0f64),
        candidates in prop::collection::vec(prop::array::uniform6(-3.0..3.0f64), 1..8),
    ) {
        let robot = SixAxis::reference().unwrap();
        let reference = joints(reference);
        let candidates: Vec<Joints> = candidates.into_iter().map(joints).collect();

        let best = robot.closest(Some(&reference), &candidates).unwrap();
        let best_distance = candidates[best].distance(&reference);
        prop_assert!(candidates.iter().all(|c| c.distance(&reference) >= best_distance));
    }

    /// 关节插值：比例严格为正、单调不减，最后一步到达终点
    #[test]
    fn joint_paces_are_monotonic(
        from in prop::array::uniform6(-1.5..1.5f64),
        to in prop::array::uniform6(-1.5..1.5f64),
    ) {
        let robot = Arc::new(SixAxis::reference().unwrap());
        let interpolator =
            Interpolator::new(robot.clone(), InterpolatorConfig::default(), PaceClock::Unpaced)
                .unwrap();
        let start = Pose::from_joints(robot.as_ref(), joints(from));
        let end = Pose::from_joints(robot.as_ref(), joints(to));

        let paces: Vec<_> = interpolator
            .run(&Motion::JointInterpolated, &start, Duration::ZERO, &end, &CancelToken::new())
            .unwrap()
            .collect();

        prop_assert!(!paces.is_empty());
        prop_assert!(paces.iter().all(|p| p.frac > 0.0 && p.frac <= 1.0));
        for w in paces.windows(2) {
            prop_assert!(w[0].frac <= w[1].frac);
        }
        prop_assert_eq!(paces.last().unwrap().joints, end.joints);
    }
}

#[test]
fn inverse_handles_negative_wrist() {
    let robot = SixAxis::reference().unwrap();
    let known = joints([0.3, 0.4, 0.5, 0.2, -0.6, -0.3]);
    let target = robot.forward(&known);

    let candidates = robot.inverse(&target.orientation, &target.position);
    assert!(candidates.iter().any(|c| c.max_delta(&known).0 < 1e-6));
}
