//! 关节索引、关节数组与关节描述
//!
//! 提供编译期安全的关节索引，以及六轴机械臂的关节参数表。
//!
//! # 示例
//!
//! ```rust
//! use saxis_kinematics::{Joint, JointArray, Rad};
//!
//! let positions = JointArray::new([
//!     Rad(0.0), Rad(0.1), Rad(0.2),
//!     Rad(0.3), Rad(0.4), Rad(0.5),
//! ]);
//!
//! // 类型安全的索引访问
//! assert_eq!(positions[Joint::J2], Rad(0.1));
//!
//! // 关节空间距离（连续性判据）
//! let home = JointArray::splat(Rad::ZERO);
//! assert!(positions.distance(&home) > 0.0);
//! ```

use crate::units::{Deg, Rad};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// 关节枚举
///
/// 表示六轴机械臂的 6 个关节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    /// 关节 1（基座旋转）
    J1 = 0,
    /// 关节 2（肩部俯仰）
    J2 = 1,
    /// 关节 3（肘部俯仰）
    J3 = 2,
    /// 关节 4（前臂旋转）
    J4 = 3,
    /// 关节 5（腕部俯仰）
    J5 = 4,
    /// 关节 6（末端旋转）
    J6 = 5,
}

impl Joint {
    /// 获取关节索引（0-5）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 关节数组
///
/// 类型安全的 6 关节数组容器；序列化为长度为 6 的 JSON 数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointArray<T> {
    data: [T; 6],
}

impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; 6]) -> Self {
        JointArray { data }
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 映射转换
    pub fn map<U, F>(self, mut f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        let [a, b, c, d, e, g] = self.data;
        JointArray::new([f(a), f(b), f(c), f(d), f(e), f(g)])
    }

    /// 按关节和另一个数组的元素执行映射
    pub fn map_with<U, V, F>(self, other: JointArray<U>, mut f: F) -> JointArray<V>
    where
        F: FnMut(T, U) -> V,
    {
        let [a1, b1, c1, d1, e1, f1] = self.data;
        let [a2, b2, c2, d2, e2, f2] = other.data;
        JointArray::new([
            f(a1, a2),
            f(b1, b2),
            f(c1, c2),
            f(d1, d2),
            f(e1, e2),
            f(f1, f2),
        ])
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value, value, value, value, value, value])
    }
}

impl<T: Default> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::new(Default::default())
    }
}

impl JointArray<Rad> {
    /// 关节空间欧氏距离
    ///
    /// 用于"最近候选"规则：在逆解的多个候选中选择与上一位形最接近的一个。
    pub fn distance(&self, other: &Self) -> f64 {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| (a.0 - b.0) * (a.0 - b.0))
            .sum::<f64>()
            .sqrt()
    }

    /// 各关节变化量绝对值的最大值
    pub fn max_delta(&self, other: &Self) -> Rad {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| (a.0 - b.0).abs())
            .fold(Rad::ZERO, |acc, d| if d > acc.0 { Rad(d) } else { acc })
    }

    /// 关节空间线性插值
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        self.map_with(*other, |a, b| a.lerp(b, t))
    }
}

impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> Index<usize> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T> From<[T; 6]> for JointArray<T> {
    #[inline]
    fn from(data: [T; 6]) -> Self {
        JointArray::new(data)
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, 6>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// 关节位形（弧度）
pub type Joints = JointArray<Rad>;

/// 关节旋转轴（在父坐标系中）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointAxis {
    /// 绕 X 轴
    X,
    /// 绕 Y 轴
    Y,
    /// 绕 Z 轴
    Z,
}

/// 关节描述
///
/// 既是运动学模型的输入，也是前端渲染所需的几何参数（`width` 仅用于显示）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    /// 角度下限
    pub min: Deg,
    /// 角度上限
    pub max: Deg,
    /// 旋转轴
    pub axis: JointAxis,
    /// 连杆长度（沿关节旋转后坐标系的 +Z）
    pub length: f64,
    /// 连杆显示宽度
    pub width: f64,
}

impl JointSpec {
    /// 创建关节描述
    pub const fn new(axis: JointAxis, min: f64, max: f64, length: f64, width: f64) -> Self {
        JointSpec {
            min: Deg(min),
            max: Deg(max),
            axis,
            length,
            width,
        }
    }

    /// 参考六轴机械臂的关节表
    ///
    /// Z-X-X-Z-X-Z 构型：基座旋转、肩、肘、前臂旋转、腕、法兰旋转。
    pub fn reference_arm() -> Vec<JointSpec> {
        vec![
            JointSpec::new(JointAxis::Z, -170.0, 170.0, 1.0, 1.5),
            JointSpec::new(JointAxis::X, -120.0, 120.0, 2.0, 0.8),
            JointSpec::new(JointAxis::X, -120.0, 120.0, 1.5, 0.7),
            JointSpec::new(JointAxis::Z, -170.0, 170.0, 1.0, 0.6),
            JointSpec::new(JointAxis::X, -120.0, 120.0, 0.5, 0.4),
            JointSpec::new(JointAxis::Z, -360.0, 360.0, 0.0, 0.3),
        ]
    }

    /// 检查角度是否在限位内
    pub fn contains(&self, angle: Rad) -> bool {
        let deg = angle.to_deg().0;
        deg >= self.min.0 && deg <= self.max.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::J1.index(), 0);
        assert_eq!(Joint::J6.index(), 5);
    }

    #[test]
    fn test_joint_array_indexing() {
        let positions =
            JointArray::new([Rad(0.0), Rad(0.1), Rad(0.2), Rad(0.3), Rad(0.4), Rad(0.5)]);

        assert_eq!(positions[Joint::J1], Rad(0.0));
        assert_eq!(positions[Joint::J6], Rad(0.5));
        assert_eq!(positions[5], Rad(0.5));
    }

    #[test]
    fn test_joint_array_map_with() {
        let a = JointArray::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = JointArray::splat(0.5);
        let c = a.map_with(b, |x, y| x * y);

        assert_eq!(c[Joint::J1], 0.5);
        assert_eq!(c[Joint::J2], 1.0);
    }

    #[test]
    fn test_distance() {
        let a = JointArray::splat(Rad(0.0));
        let mut b = a;
        b[Joint::J2] = Rad(3.0);
        b[Joint::J5] = Rad(-4.0);

        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance(&a), 0.0);
        assert_eq!(a.max_delta(&b), Rad(4.0));
    }

    #[test]
    fn test_lerp() {
        let a = JointArray::splat(Rad(0.0));
        let b = JointArray::splat(Rad(2.0));
        assert_eq!(a.lerp(&b, 0.25), JointArray::splat(Rad(0.5)));
        assert_eq!(a.lerp(&b, 1.0), b);
    }

    #[test]
    fn test_reference_arm() {
        let arm = JointSpec::reference_arm();
        assert_eq!(arm.len(), 6);
        assert_eq!(arm[0].axis, JointAxis::Z);
        assert_eq!(arm[1].axis, JointAxis::X);
        assert_eq!(arm[5].length, 0.0);
        assert!(arm[1].contains(Deg(119.0).to_rad()));
        assert!(!arm[1].contains(Deg(121.0).to_rad()));
    }

    #[test]
    fn test_serde_shapes() {
        let joints = JointArray::splat(Rad(1.0));
        assert_eq!(
            serde_json::to_string(&joints).unwrap(),
            "[1.0,1.0,1.0,1.0,1.0,1.0]"
        );

        let spec: JointSpec = serde_json::from_str(
            r#"{"min": -120.0, "max": 120.0, "axis": "x", "length": 2.0, "width": 0.8}"#,
        )
        .unwrap();
        assert_eq!(spec, JointSpec::reference_arm()[1]);
    }
}
