//! 绘图路径
//!
//! 启动时由 Hilbert 曲线生成一次，之后所有代复用同一组路点。

use crate::config::MotionConfig;
use crate::error::Result;
use saxis_kinematics::{Deg, Rot3, Vec3, hilbert, rx};

/// 路点：位置 + 固定姿态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// 位置
    pub position: Vec3,
    /// 姿态
    pub orientation: Rot3,
}

impl Waypoint {
    /// 创建路点
    pub fn new(position: Vec3, orientation: Rot3) -> Self {
        Waypoint {
            position,
            orientation,
        }
    }
}

/// 绘图姿态：工具 +Z 轴指向 -Y（绘图平面）
pub fn drawing_orientation() -> Rot3 {
    rx(Deg(90.0).to_rad())
}

/// 沿 +Y（离开绘图平面、朝向机械臂）偏移
pub fn lift(point: Vec3, distance: f64) -> Vec3 {
    point + Vec3::y() * distance
}

/// 绘图路径
#[derive(Debug, Clone)]
pub struct DrawingPath {
    curve: Vec<Vec3>,
    waypoints: Vec<Waypoint>,
}

impl DrawingPath {
    /// 按配置生成路径
    ///
    /// 曲线铺在 X-Z 平面上（`y = origin.y`），每个路点再沿 +Y 抬起 `standoff`。
    pub fn from_config(config: &MotionConfig) -> Result<Self> {
        let curve =
            hilbert::plane_points(config.depth, &Rot3::identity(), config.origin(), config.width)?;
        Ok(Self::from_curve(curve, config.standoff))
    }

    /// 由曲线点生成路径
    pub fn from_curve(curve: Vec<Vec3>, standoff: f64) -> Self {
        let orientation = drawing_orientation();
        let waypoints = curve
            .iter()
            .map(|&p| Waypoint::new(lift(p, standoff), orientation))
            .collect();
        DrawingPath { curve, waypoints }
    }

    /// 原始曲线点（未抬起）
    pub fn curve(&self) -> &[Vec3] {
        &self.curve
    }

    /// 路点
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// 路点数量
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_zero_path() {
        let config = MotionConfig {
            depth: 0,
            width: 2.0,
            ..Default::default()
        };
        let path = DrawingPath::from_config(&config).unwrap();

        assert_eq!(path.len(), 4);
        assert_eq!(path.curve().len(), 4);
        for (p, w) in path.curve().iter().zip(path.waypoints()) {
            assert!((w.position - p - Vec3::new(0.0, 0.01, 0.0)).norm() < 1e-12);
            assert_eq!(w.orientation, drawing_orientation());
        }
    }

    #[test]
    fn test_default_path_size() {
        let path = DrawingPath::from_config(&MotionConfig::default()).unwrap();
        assert_eq!(path.len(), 64);
        assert!(!path.is_empty());
    }

    #[test]
    fn test_lift() {
        let lifted = lift(Vec3::new(1.0, 2.0, 3.0), 0.2);
        assert!((lifted - Vec3::new(1.0, 2.2, 3.0)).norm() < 1e-12);
    }
}
