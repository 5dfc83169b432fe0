//! 六轴机械臂运动学模型
//!
//! 提供 [`Kinematics`] 抽象（正解、逆解、最近候选选择）以及参考构型
//! [`SixAxis`] 的闭式实现。
//!
//! # 坐标约定
//!
//! 关节 i 的坐标系 = 关节 i-1 的坐标系 · Rot(axis_i, θ_i)，随后沿新坐标系 +Z
//! 平移 `length_i`。末端姿态即最后一个关节坐标系，工具方向为其 +Z 轴。
//!
//! # 逆解
//!
//! Z-X-X-Z-X-Z 构型的腕心由前三个关节唯一决定（J4 的旋转轴与前臂共线），
//! 因此逆解分为两步：
//!
//! 1. 位置：基座左右（2 种）× 肘上下（2 种）
//! 2. 姿态：ZXZ 欧拉分解，腕部翻转（2 种）
//!
//! 最多 8 个候选，超出关节限位的候选被丢弃。

use crate::error::KinematicsError;
use crate::geometry::{CartesianPose, EPSILON, Rot3, Vec3, axis_rotation, rx, rz};
use crate::joint::{JointAxis, JointSpec, Joints};
use crate::units::Rad;
use smallvec::SmallVec;

/// 逆解候选集合（最多 8 个，栈上分配）
pub type Candidates = SmallVec<[Joints; 8]>;

/// 运动学能力
///
/// 运动学模型本身无状态；"当前关节角"由调用方（例如共享机器人状态）持有。
pub trait Kinematics: Send + Sync {
    /// 关节描述表
    fn joints(&self) -> &[JointSpec];

    /// 正运动学：关节角 → 末端位姿
    fn forward(&self, joints: &Joints) -> CartesianPose;

    /// 逆运动学：末端位姿 → 所有可行的关节角候选
    fn inverse(&self, orientation: &Rot3, point: &Vec3) -> Candidates;

    /// 最近候选规则
    ///
    /// 返回与 `previous` 关节空间距离最小的候选索引；`previous` 为空时以零位
    /// （全部关节为 0）为参考。
    ///
    /// # 错误
    ///
    /// - [`KinematicsError::NoCandidates`]: 候选为空
    /// - [`KinematicsError::NoViableCandidate`]: 所有候选的距离都无法比较（NaN）
    fn closest(
        &self,
        previous: Option<&Joints>,
        candidates: &[Joints],
    ) -> Result<usize, KinematicsError> {
        if candidates.is_empty() {
            return Err(KinematicsError::NoCandidates);
        }

        let home = Joints::splat(Rad::ZERO);
        let reference = previous.unwrap_or(&home);

        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.distance(reference)))
            .filter(|(_, d)| d.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .ok_or(KinematicsError::NoViableCandidate {
                count: candidates.len(),
            })
    }
}

/// 参考六轴机械臂（Z-X-X-Z-X-Z 构型）
#[derive(Debug, Clone)]
pub struct SixAxis {
    specs: Vec<JointSpec>,
    /// 候选去重精度（弧度）
    precision: Rad,
}

impl SixAxis {
    /// 闭式逆解要求的关节轴序列
    pub const AXES: [JointAxis; 6] = [
        JointAxis::Z,
        JointAxis::X,
        JointAxis::X,
        JointAxis::Z,
        JointAxis::X,
        JointAxis::Z,
    ];

    /// 默认候选去重精度：0.001π
    pub const DEFAULT_PRECISION: Rad = Rad(0.001 * std::f64::consts::PI);

    /// 创建机械臂模型
    ///
    /// # 错误
    ///
    /// 关节数量不是 6、构型不是 Z-X-X-Z-X-Z、限位或长度无效时返回
    /// [`KinematicsError::InvalidModel`]。
    pub fn new(specs: Vec<JointSpec>) -> Result<Self, KinematicsError> {
        if specs.len() != 6 {
            return Err(KinematicsError::InvalidModel(format!(
                "expected 6 joints, got {}",
                specs.len()
            )));
        }

        for (i, (spec, axis)) in specs.iter().zip(Self::AXES).enumerate() {
            if spec.axis != axis {
                return Err(KinematicsError::InvalidModel(format!(
                    "joint J{} must rotate about {:?}, got {:?}",
                    i + 1,
                    axis,
                    spec.axis
                )));
            }
            if !(spec.min.0 < spec.max.0) {
                return Err(KinematicsError::InvalidModel(format!(
                    "joint J{} has empty range [{}, {}]",
                    i + 1,
                    spec.min,
                    spec.max
                )));
            }
            if !spec.length.is_finite() || spec.length < 0.0 {
                return Err(KinematicsError::InvalidModel(format!(
                    "joint J{} has invalid length {}",
                    i + 1,
                    spec.length
                )));
            }
        }

        if specs[1].length <= EPSILON || specs[2].length + specs[3].length <= EPSILON {
            return Err(KinematicsError::InvalidModel(
                "upper arm and forearm must have positive length".to_string(),
            ));
        }

        Ok(SixAxis {
            specs,
            precision: Self::DEFAULT_PRECISION,
        })
    }

    /// 参考机械臂
    pub fn reference() -> Result<Self, KinematicsError> {
        Self::new(JointSpec::reference_arm())
    }

    /// 设置候选去重精度
    pub fn with_precision(mut self, precision: Rad) -> Self {
        self.precision = precision;
        self
    }

    /// 检查关节角是否全部在限位内
    pub fn within_limits(&self, joints: &Joints) -> bool {
        self.specs
            .iter()
            .zip(joints.iter())
            .all(|(spec, angle)| spec.contains(*angle))
    }

    fn length(&self, index: usize) -> f64 {
        self.specs[index].length
    }

    /// 腕部 ZXZ 欧拉分解：`m = Rz(a) · Rx(b) · Rz(c)`
    fn wrist_solutions(m: &Rot3) -> SmallVec<[[f64; 3]; 2]> {
        let m = m.matrix();
        let m22 = m[(2, 2)].clamp(-1.0, 1.0);
        let sb = m[(0, 2)].hypot(m[(1, 2)]);

        let mut out = SmallVec::new();
        if sb > EPSILON {
            let b = sb.atan2(m22);
            out.push([
                m[(0, 2)].atan2(-m[(1, 2)]),
                b,
                m[(2, 0)].atan2(m[(2, 1)]),
            ]);
            out.push([
                (-m[(0, 2)]).atan2(m[(1, 2)]),
                -b,
                (-m[(2, 0)]).atan2(-m[(2, 1)]),
            ]);
        } else if m22 > 0.0 {
            // 奇异：J4 与 J6 共轴，约定 J4 = 0
            out.push([0.0, 0.0, m[(1, 0)].atan2(m[(0, 0)])]);
        } else {
            out.push([0.0, std::f64::consts::PI, (-m[(1, 0)]).atan2(m[(0, 0)])]);
        }
        out
    }
}

impl Kinematics for SixAxis {
    fn joints(&self) -> &[JointSpec] {
        &self.specs
    }

    fn forward(&self, joints: &Joints) -> CartesianPose {
        let mut orientation = Rot3::identity();
        let mut position = Vec3::zeros();

        for (spec, angle) in self.specs.iter().zip(joints.iter()) {
            orientation *= axis_rotation(spec.axis, *angle);
            position += orientation * Vec3::new(0.0, 0.0, spec.length);
        }

        CartesianPose::new(position, orientation)
    }

    fn inverse(&self, orientation: &Rot3, point: &Vec3) -> Candidates {
        let shoulder = Vec3::new(0.0, 0.0, self.length(0));
        let upper = self.length(1);
        let fore = self.length(2) + self.length(3);
        let tool = self.length(4) + self.length(5);

        let wrist = point - *orientation * Vec3::new(0.0, 0.0, tool);
        let d = wrist - shoulder;

        // 基座：(θ1, 腕心在臂平面内的水平坐标)
        let r = d.x.hypot(d.y);
        let mut bases: SmallVec<[(f64, f64); 2]> = SmallVec::new();
        if r < EPSILON {
            bases.push((0.0, 0.0));
        } else {
            bases.push(((-d.x).atan2(d.y), r));
            bases.push((d.x.atan2(-d.y), -r));
        }

        let mut candidates = Candidates::new();
        for (theta1, y) in bases {
            let z = d.z;
            let reach_sq = y * y + z * z;
            let cos3 = (reach_sq - upper * upper - fore * fore) / (2.0 * upper * fore);
            if !(-1.0 - EPSILON..=1.0 + EPSILON).contains(&cos3) {
                continue;
            }
            let elbow = cos3.clamp(-1.0, 1.0).acos();
            let beta = (-y).atan2(z);

            let mut elbows: SmallVec<[f64; 2]> = SmallVec::new();
            elbows.push(elbow);
            if elbow > EPSILON {
                elbows.push(-elbow);
            }

            for theta3 in elbows {
                let gamma = (fore * theta3.sin()).atan2(upper + fore * theta3.cos());
                let theta2 = beta - gamma;

                let arm = rz(Rad(theta1)) * rx(Rad(theta2 + theta3));
                let m = arm.transpose() * *orientation;

                for [theta4, theta5, theta6] in Self::wrist_solutions(&m) {
                    let joints = Joints::new([
                        Rad(theta1).normalize(),
                        Rad(theta2).normalize(),
                        Rad(theta3).normalize(),
                        Rad(theta4).normalize(),
                        Rad(theta5).normalize(),
                        Rad(theta6).normalize(),
                    ]);

                    if !self.within_limits(&joints) {
                        continue;
                    }
                    if candidates
                        .iter()
                        .any(|c| c.max_delta(&joints) < self.precision)
                    {
                        continue;
                    }
                    candidates.push(joints);
                }
            }
        }

        candidates
    }
}
