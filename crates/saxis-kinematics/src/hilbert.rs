//! Hilbert 曲线
//!
//! 阶数 `n` 的曲线覆盖 `2^(n+1) × 2^(n+1)` 网格，从 `(0, 0)` 出发，在
//! `(w-1, 0)` 结束，相邻两点的曼哈顿距离恒为 1。

use crate::error::KinematicsError;
use crate::geometry::{Rot3, Vec3};

/// 支持的最大阶数（`w² ≤ 2^62`）
pub const MAX_ORDER: u32 = 30;

/// 阶数 `order` 对应的网格边长
pub fn side(order: u32) -> u64 {
    1u64 << (order + 1)
}

/// 第 `index` 步在网格中的坐标
///
/// # 错误
///
/// `order > MAX_ORDER` 或 `index >= side²` 时返回
/// [`KinematicsError::CurveOutOfRange`]。
pub fn step_xy(order: u32, index: u64) -> Result<(u64, u64), KinematicsError> {
    if order > MAX_ORDER {
        return Err(KinematicsError::CurveOutOfRange { order, index });
    }
    let w = side(order);
    if index >= w * w {
        return Err(KinematicsError::CurveOutOfRange { order, index });
    }

    let (mut x, mut y) = (0u64, 0u64);
    let mut t = index;
    let mut s = 1u64;
    while s < w {
        let rx = 1 & (t / 2);
        let ry = 1 & (t ^ rx);
        if ry == 0 {
            if rx == 1 {
                x = s - 1 - x;
                y = s - 1 - y;
            }
            std::mem::swap(&mut x, &mut y);
        }
        x += s * rx;
        y += s * ry;
        t /= 4;
        s *= 2;
    }
    Ok((x, y))
}

/// 将曲线映射到平面上
///
/// 曲线第一坐标沿 `basis` 的 Z 轴、第二坐标沿 X 轴展开，从 `origin` 出发覆盖
/// 边长为 `edge` 的正方形（点间距 `edge / (w-1)`）。
pub fn plane_points(
    depth: u32,
    basis: &Rot3,
    origin: Vec3,
    edge: f64,
) -> Result<Vec<Vec3>, KinematicsError> {
    let w = side(depth.min(MAX_ORDER));
    let spacing = edge / (w - 1) as f64;
    let dx = basis.matrix().column(2) * spacing;
    let dy = basis.matrix().column(0) * spacing;

    (0..w * w)
        .map(|i| {
            let (x, y) = step_xy(depth, i)?;
            Ok(origin + dx * x as f64 + dy * y as f64)
        })
        .collect()
}
