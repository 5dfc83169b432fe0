//! 笛卡尔空间类型
//!
//! 基于 nalgebra 的位姿表示。约定：X-Y 为水平面，+Z 向上。

use crate::joint::JointAxis;
use crate::units::Rad;
use nalgebra::{Rotation3, UnitQuaternion, Vector3};

/// 三维向量（位置、方向）
pub type Vec3 = Vector3<f64>;

/// 三维旋转
pub type Rot3 = Rotation3<f64>;

/// 数值零阈值
pub(crate) const EPSILON: f64 = 1e-9;

/// 绕 X 轴旋转
pub fn rx(angle: Rad) -> Rot3 {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle.0)
}

/// 绕 Y 轴旋转
pub fn ry(angle: Rad) -> Rot3 {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle.0)
}

/// 绕 Z 轴旋转
pub fn rz(angle: Rad) -> Rot3 {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle.0)
}

/// 绕关节轴旋转
pub fn axis_rotation(axis: JointAxis, angle: Rad) -> Rot3 {
    match axis {
        JointAxis::X => rx(angle),
        JointAxis::Y => ry(angle),
        JointAxis::Z => rz(angle),
    }
}

/// 末端位姿（位置 + 姿态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPose {
    /// 位置
    pub position: Vec3,
    /// 姿态
    pub orientation: Rot3,
}

impl CartesianPose {
    /// 创建新的位姿
    pub fn new(position: Vec3, orientation: Rot3) -> Self {
        CartesianPose {
            position,
            orientation,
        }
    }

    /// 姿态插值（球面线性插值）
    ///
    /// 两个姿态正好相反（180°）时没有唯一的插值路径，此时保持起始姿态直到终点。
    pub fn slerp_orientation(from: &Rot3, to: &Rot3, t: f64) -> Rot3 {
        if t >= 1.0 {
            return *to;
        }
        let q0 = UnitQuaternion::from_rotation_matrix(from);
        let q1 = UnitQuaternion::from_rotation_matrix(to);
        match q0.try_slerp(&q1, t, EPSILON) {
            Some(q) => q.to_rotation_matrix(),
            None => *from,
        }
    }
}
