//! # 运动配置
//!
//! 绘图路径、节拍、运动方式参数与机械臂模型。支持从 TOML 文件加载，
//! 未出现的字段取默认值。
//!
//! ```toml
//! depth = 1
//! width = 3.0
//! dt = 0.1
//! arc_degrees = 90.0
//! pace_clock = "unpaced"
//! ```

use crate::error::{MotionError, Result};
use saxis_kinematics::{Deg, InterpolatorConfig, JointSpec, PaceClock, Rad, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 运动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Hilbert 曲线阶数（0 → 4 个路点，n → 4^(n+1) 个）
    pub depth: u32,

    /// 绘图平面边长
    pub width: f64,

    /// 曲线起点；缺省时由边长推导为 `[-width/2, -3.8, -(width-2)/2]`
    pub origin: Option<[f64; 3]>,

    /// 每个插值步的时长（秒）
    pub dt: f64,

    /// 圆弧运动的圆心角（度）
    pub arc_degrees: f64,

    /// 圆角过渡的切入距离；缺省为 `width / 7`
    pub lead_in: Option<f64>,

    /// 圆角过渡的切出距离；缺省为 `width / 7`
    pub lead_out: Option<f64>,

    /// 路点离开绘图平面的距离（+Y）
    pub standoff: f64,

    /// 收尾抬起距离（+Y）
    pub retreat: f64,

    /// 同步门容量
    pub gate_capacity: usize,

    /// 笛卡尔插值步长
    pub step_length: f64,

    /// 关节插值步长（度）
    pub joint_step_degrees: f64,

    /// 逆解候选的自检容差（度）
    pub precision_degrees: f64,

    /// 步间节拍
    pub pace_clock: PaceClock,

    /// 机械臂关节表
    pub joints: Vec<JointSpec>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        MotionConfig {
            depth: 2,
            width: 3.0,
            origin: None,
            dt: 0.25,
            arc_degrees: 120.0,
            lead_in: None,
            lead_out: None,
            standoff: 0.01,
            retreat: 0.2,
            gate_capacity: 3,
            step_length: 0.1,
            joint_step_degrees: 5.0,
            precision_degrees: 0.18,
            pace_clock: PaceClock::Realtime,
            joints: JointSpec::reference_arm(),
        }
    }
}

impl MotionConfig {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MotionError::ConfigFile(e.to_string()))
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| MotionError::ConfigFile(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 曲线起点
    pub fn origin(&self) -> Vec3 {
        match self.origin {
            Some([x, y, z]) => Vec3::new(x, y, z),
            None => Vec3::new(-self.width / 2.0, -3.8, -(self.width - 2.0) / 2.0),
        }
    }

    /// 切入距离
    pub fn lead_in(&self) -> f64 {
        self.lead_in.unwrap_or(self.width / 7.0)
    }

    /// 切出距离
    pub fn lead_out(&self) -> f64 {
        self.lead_out.unwrap_or(self.width / 7.0)
    }

    /// 每步时长
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(self.dt)
    }

    /// 圆弧圆心角
    pub fn arc_angle(&self) -> Rad {
        Deg(self.arc_degrees).to_rad()
    }

    /// 插值步长配置
    pub fn interpolator_config(&self) -> InterpolatorConfig {
        InterpolatorConfig {
            step_length: self.step_length,
            joint_step: Deg(self.joint_step_degrees).to_rad(),
        }
    }

    /// 逆解自检容差
    pub fn precision(&self) -> Rad {
        Deg(self.precision_degrees).to_rad()
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        fn positive(param: &'static str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(MotionError::InvalidConfig {
                    param,
                    reason: format!("must be > 0, got {}", value),
                })
            }
        }

        fn non_negative(param: &'static str, value: f64) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(MotionError::InvalidConfig {
                    param,
                    reason: format!("must be >= 0, got {}", value),
                })
            }
        }

        positive("width", self.width)?;
        positive("dt", self.dt)?;
        positive("step_length", self.step_length)?;
        positive("joint_step_degrees", self.joint_step_degrees)?;
        positive("precision_degrees", self.precision_degrees)?;
        non_negative("standoff", self.standoff)?;
        non_negative("retreat", self.retreat)?;
        non_negative("lead_in", self.lead_in())?;
        non_negative("lead_out", self.lead_out())?;

        if !(0.0..360.0).contains(&self.arc_degrees) {
            return Err(MotionError::InvalidConfig {
                param: "arc_degrees",
                reason: format!("must be in [0, 360), got {}", self.arc_degrees),
            });
        }
        if self.gate_capacity == 0 {
            return Err(MotionError::InvalidConfig {
                param: "gate_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        // 4^(depth+1) 个路点；更深的曲线没有实际意义
        if self.depth > 6 {
            return Err(MotionError::InvalidConfig {
                param: "depth",
                reason: format!("must be <= 6, got {}", self.depth),
            });
        }
        if self.origin.is_some_and(|o| !o.iter().all(|c| c.is_finite())) {
            return Err(MotionError::InvalidConfig {
                param: "origin",
                reason: "coordinates must be finite".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saxis_kinematics::{JointAxis, SixAxis};

    #[test]
    fn test_defaults() {
        let config = MotionConfig::default();
        assert_eq!(config.depth, 2);
        assert_eq!(config.origin(), Vec3::new(-1.5, -3.8, -0.5));
        assert!((config.lead_in() - 3.0 / 7.0).abs() < 1e-12);
        assert_eq!(config.lead_in(), config.lead_out());
        assert_eq!(config.step_duration(), Duration::from_millis(250));
        assert_eq!(config.joints.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = MotionConfig::from_toml_str(
            r#"
            depth = 0
            width = 2.0
            lead_in = 0.1
            pace_clock = "unpaced"
            "#,
        )
        .unwrap();

        assert_eq!(config.depth, 0);
        assert_eq!(config.origin(), Vec3::new(-1.0, -3.8, 0.0));
        assert_eq!(config.lead_in(), 0.1);
        assert!((config.lead_out() - 2.0 / 7.0).abs() < 1e-12);
        assert_eq!(config.pace_clock, PaceClock::Unpaced);
        assert_eq!(config.dt, 0.25);
    }

    #[test]
    fn test_precision() {
        let config = MotionConfig::default();
        assert!((config.precision().0 - SixAxis::DEFAULT_PRECISION.0).abs() < 1e-12);

        let config = MotionConfig::from_toml_str("precision_degrees = 1.0").unwrap();
        assert!((config.precision().to_deg().0 - 1.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_joint_table_from_toml() {
        let config = MotionConfig::from_toml_str(
            r#"
            [[joints]]
            min = -90.0
            max = 90.0
            axis = "z"
            length = 1.0
            width = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.joints.len(), 1);
        assert_eq!(config.joints[0].axis, JointAxis::Z);
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            MotionConfig {
                dt: 0.0,
                ..Default::default()
            },
            MotionConfig {
                width: -1.0,
                ..Default::default()
            },
            MotionConfig {
                gate_capacity: 0,
                ..Default::default()
            },
            MotionConfig {
                arc_degrees: 360.0,
                ..Default::default()
            },
            MotionConfig {
                step_length: f64::NAN,
                ..Default::default()
            },
            MotionConfig {
                lead_out: Some(-0.5),
                ..Default::default()
            },
            MotionConfig {
                precision_degrees: 0.0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(MotionError::InvalidConfig { .. })),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            MotionConfig::from_toml_str("depth = \"deep\""),
            Err(MotionError::ConfigFile(_))
        ));
        assert!(matches!(
            MotionConfig::load_from_file("/nonexistent/saxis.toml"),
            Err(MotionError::ConfigFile(_))
        ));
    }
}
