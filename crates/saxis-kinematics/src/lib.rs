//! 六轴机械臂运动学
//!
//! 本 crate 提供运动序列器所依赖的全部几何能力：
//! - 强类型单位（Rad、Deg）与类型安全的关节数组
//! - 参考六轴机械臂模型：正运动学、闭式逆运动学、最近候选规则
//! - 四种运动方式的路径插值（惰性、可取消）
//! - Hilbert 曲线生成与平面映射
//!
//! # 示例
//!
//! ```rust
//! use saxis_kinematics::{Deg, Kinematics, SixAxis, Vec3, rx};
//!
//! let robot = SixAxis::reference().unwrap();
//! let orientation = rx(Deg(90.0).to_rad());
//! let candidates = robot.inverse(&orientation, &Vec3::new(1.5, -3.79, 2.5));
//! let best = robot.closest(None, &candidates).unwrap();
//!
//! let pose = robot.forward(&candidates[best]);
//! assert!((pose.position - Vec3::new(1.5, -3.79, 2.5)).norm() < 1e-6);
//! ```

pub mod cancel;
pub mod error;
pub mod geometry;
pub mod hilbert;
pub mod joint;
pub mod planner;
pub mod robot;
pub mod units;

// 重新导出常用类型
pub use cancel::CancelToken;
pub use error::KinematicsError;
pub use geometry::{CartesianPose, Rot3, Vec3, axis_rotation, rx, ry, rz};
pub use joint::{Joint, JointArray, JointAxis, JointSpec, Joints};
pub use planner::{
    Flavor, Interpolator, InterpolatorConfig, Motion, Pace, PaceClock, Paces, Pose,
};
pub use robot::{Candidates, Kinematics, SixAxis};
pub use units::{Deg, Rad};
