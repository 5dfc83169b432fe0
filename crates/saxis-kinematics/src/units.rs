//! 强类型角度单位
//!
//! 使用 NewType 模式防止弧度与角度混用，在编译期保证类型安全。
//!
//! # 示例
//!
//! ```rust
//! use saxis_kinematics::{Deg, Rad};
//!
//! let limit = Deg(120.0).to_rad();
//! assert!((limit.0 - 2.0 * std::f64::consts::FRAC_PI_3).abs() < 1e-12);
//!
//! // 类型安全：以下代码无法编译
//! // let _ = Rad(1.0) + Deg(1.0);  // ❌ 类型不匹配
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 弧度（NewType）
///
/// 关节角度在整个工作空间内统一使用弧度存储；序列化时即为裸 `f64`。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rad(pub f64);

impl Rad {
    /// 零弧度常量
    pub const ZERO: Self = Rad(0.0);

    /// π/2 弧度（90度）
    pub const FRAC_PI_2: Self = Rad(std::f64::consts::FRAC_PI_2);

    /// 转换为角度
    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(self.0.to_degrees())
    }

    /// 归一化到 [-π, π] 范围
    pub fn normalize(self) -> Self {
        let mut angle = self.0 % std::f64::consts::TAU;
        if angle > std::f64::consts::PI {
            angle -= std::f64::consts::TAU;
        } else if angle < -std::f64::consts::PI {
            angle += std::f64::consts::TAU;
        }
        Rad(angle)
    }

    /// 线性插值：`t = 0` 返回 `self`，`t = 1` 返回 `other`
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Rad(self.0 + (other.0 - self.0) * t)
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

impl Add for Rad {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Rad(self.0 + rhs.0)
    }
}

impl Sub for Rad {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Rad(self.0 - rhs.0)
    }
}

impl Mul<f64> for Rad {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Rad(self.0 * rhs)
    }
}

impl Neg for Rad {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Rad(-self.0)
    }
}

/// 角度（NewType）
///
/// 仅用于配置和展示（关节限位、圆弧角等），内部计算前统一转换为 [`Rad`]。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deg(pub f64);

impl Deg {
    /// 转换为弧度
    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(self.0.to_radians())
    }
}

impl fmt::Display for Deg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}
