//! 路径插值器
//!
//! 在两个位姿之间生成一串按时间节拍推进的插值步（[`Pace`]），支持四种运动方式：
//!
//! - **JointInterpolated**: 关节空间线性插值，不关心笛卡尔轨迹形状
//! - **Arc**: 绕给定轴弯曲的圆弧
//! - **Linear**: 笛卡尔直线，每一步求逆解（取与上一步最近的候选）
//! - **CornerCut**: 提前切入下一条边的圆角过渡，不在当前路点停留
//!
//! # 特性
//!
//! - **Iterator 模式**: 插值步按需生成，消费一次即结束
//! - **可取消**: 每一步之前检查 [`CancelToken`]，步间等待可被立即唤醒
//! - **失败即终止**: 某一步求解失败时产出 `frac = 0` 的 Pace，然后结束
//!
//! # 示例
//!
//! ```rust,no_run
//! use saxis_kinematics::{
//!     CancelToken, Interpolator, InterpolatorConfig, Joints, Motion, PaceClock, Pose, Rad,
//!     SixAxis,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let robot = Arc::new(SixAxis::reference().unwrap());
//! let interpolator =
//!     Interpolator::new(robot.clone(), InterpolatorConfig::default(), PaceClock::Unpaced).unwrap();
//!
//! let start = Pose::from_joints(robot.as_ref(), Joints::splat(Rad(0.1)));
//! let end = Pose::from_joints(robot.as_ref(), Joints::splat(Rad(0.4)));
//! let cancel = CancelToken::new();
//!
//! for pace in interpolator
//!     .run(&Motion::JointInterpolated, &start, Duration::from_millis(250), &end, &cancel)
//!     .unwrap()
//! {
//!     println!("{:.2}: {:?}", pace.frac, pace.joints);
//! }
//! ```

use crate::cancel::CancelToken;
use crate::error::KinematicsError;
use crate::geometry::{CartesianPose, EPSILON, Rot3, Vec3};
use crate::joint::Joints;
use crate::robot::Kinematics;
use crate::units::{Deg, Rad};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// 已解析的位姿：笛卡尔位置/姿态 + 一组确定的关节角
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// 末端位置
    pub position: Vec3,
    /// 末端姿态
    pub orientation: Rot3,
    /// 关节角
    pub joints: Joints,
}

impl Pose {
    /// 创建位姿
    pub fn new(position: Vec3, orientation: Rot3, joints: Joints) -> Self {
        Pose {
            position,
            orientation,
            joints,
        }
    }

    /// 由关节角通过正运动学构造位姿
    pub fn from_joints(robot: &dyn Kinematics, joints: Joints) -> Self {
        let cartesian = robot.forward(&joints);
        Pose::new(cartesian.position, cartesian.orientation, joints)
    }

    /// 笛卡尔部分
    pub fn cartesian(&self) -> CartesianPose {
        CartesianPose::new(self.position, self.orientation)
    }
}

/// 单个插值步
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pace {
    /// 完成比例，正常取值 (0, 1]；`<= 0` 表示插值失败
    pub frac: f64,
    /// 该比例处的关节角
    pub joints: Joints,
}

impl Pace {
    /// 是否为失败标记
    pub fn is_failure(&self) -> bool {
        // NaN 同样视为失败
        !(self.frac > 0.0)
    }
}

/// 运动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// 关节空间插值
    JointInterpolated,
    /// 圆弧
    Arc,
    /// 笛卡尔直线
    Linear,
    /// 圆角过渡
    CornerCut,
}

impl Flavor {
    /// 轮换顺序
    pub const ALL: [Flavor; 4] = [
        Flavor::JointInterpolated,
        Flavor::Arc,
        Flavor::Linear,
        Flavor::CornerCut,
    ];

    /// 按轮换序号取运动方式（对 4 取模）
    pub fn from_index(index: u64) -> Self {
        Self::ALL[(index % Self::ALL.len() as u64) as usize]
    }

    /// 轮换中的下一个
    pub fn next(self) -> Self {
        Self::from_index(self as u64 + 1)
    }

    /// 名称
    pub const fn name(self) -> &'static str {
        match self {
            Flavor::JointInterpolated => "joint_interpolated",
            Flavor::Arc => "arc",
            Flavor::Linear => "linear",
            Flavor::CornerCut => "corner_cut",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一次插值调用的运动描述（运动方式 + 该方式所需的附加参数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// 关节空间插值
    JointInterpolated,
    /// 圆弧
    Arc {
        /// 弯曲轴
        axis: Vec3,
        /// 圆弧所对圆心角，取值 [0, 2π)
        angle: Rad,
    },
    /// 笛卡尔直线
    Linear,
    /// 圆角过渡
    CornerCut {
        /// 上一个路点位置
        previous: Vec3,
        /// 下一个路点位置
        next: Vec3,
        /// 进入圆角前的切入距离
        lead_in: f64,
        /// 离开圆角后的切出距离
        lead_out: f64,
    },
}

impl Motion {
    /// 对应的运动方式
    pub fn flavor(&self) -> Flavor {
        match self {
            Motion::JointInterpolated => Flavor::JointInterpolated,
            Motion::Arc { .. } => Flavor::Arc,
            Motion::Linear => Flavor::Linear,
            Motion::CornerCut { .. } => Flavor::CornerCut,
        }
    }

    fn validate(&self) -> Result<(), KinematicsError> {
        match *self {
            Motion::Arc { axis, angle } => {
                if !axis.iter().all(|c| c.is_finite()) || axis.norm() < EPSILON {
                    return Err(KinematicsError::InvalidMotion {
                        param: "axis",
                        reason: format!("degenerate arc axis {:?}", axis),
                    });
                }
                if !(0.0..std::f64::consts::TAU).contains(&angle.0) {
                    return Err(KinematicsError::InvalidMotion {
                        param: "angle",
                        reason: format!("arc angle {} outside [0°, 360°)", angle.to_deg()),
                    });
                }
            },
            Motion::CornerCut {
                lead_in, lead_out, ..
            } => {
                for (param, value) in [("lead_in", lead_in), ("lead_out", lead_out)] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(KinematicsError::InvalidMotion {
                            param,
                            reason: format!("blend distance must be >= 0, got {}", value),
                        });
                    }
                }
            },
            Motion::JointInterpolated | Motion::Linear => {},
        }
        Ok(())
    }
}

/// 步间节拍
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceClock {
    /// 每一步之前等待 `dt`（可被取消令牌唤醒）
    #[default]
    Realtime,
    /// 不等待（测试、基准）
    Unpaced,
}

/// 插值步长配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatorConfig {
    /// 笛卡尔方式的步长（长度单位）
    pub step_length: f64,
    /// 关节方式的步长（单关节最大变化量）
    pub joint_step: Rad,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        InterpolatorConfig {
            step_length: 0.1,
            joint_step: Deg(5.0).to_rad(),
        }
    }
}

impl InterpolatorConfig {
    /// 校验步长
    pub fn validate(&self) -> Result<(), KinematicsError> {
        if !(self.step_length.is_finite() && self.step_length > 0.0) {
            return Err(KinematicsError::InvalidMotion {
                param: "step_length",
                reason: format!("must be > 0, got {}", self.step_length),
            });
        }
        if !(self.joint_step.0.is_finite() && self.joint_step.0 > 0.0) {
            return Err(KinematicsError::InvalidMotion {
                param: "joint_step",
                reason: format!("must be > 0, got {}", self.joint_step),
            });
        }
        Ok(())
    }

    fn cartesian_steps(&self, length: f64) -> usize {
        ((length / self.step_length).ceil() as usize).max(1)
    }

    fn joint_steps(&self, delta: Rad) -> usize {
        ((delta.0 / self.joint_step.0).ceil() as usize).max(1)
    }
}

/// 路径插值器
///
/// 持有运动学模型与步长配置；每次 [`run`](Self::run) 产生一个独立的 [`Paces`]。
#[derive(Clone)]
pub struct Interpolator {
    robot: Arc<dyn Kinematics>,
    config: InterpolatorConfig,
    clock: PaceClock,
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolator")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Interpolator {
    /// 创建插值器
    pub fn new(
        robot: Arc<dyn Kinematics>,
        config: InterpolatorConfig,
        clock: PaceClock,
    ) -> Result<Self, KinematicsError> {
        config.validate()?;
        Ok(Interpolator {
            robot,
            config,
            clock,
        })
    }

    /// 生成 `start → end` 的插值步序列（惰性）
    ///
    /// - Linear / Arc / JointInterpolated 的最后一步恰好是 `end.joints`
    /// - CornerCut 的终点是越过 `end` 之后的切出点，而非 `end` 本身
    ///
    /// # 错误
    ///
    /// 运动参数无效时返回 [`KinematicsError::InvalidMotion`]。
    pub fn run(
        &self,
        motion: &Motion,
        start: &Pose,
        dt: Duration,
        end: &Pose,
        cancel: &CancelToken,
    ) -> Result<Paces, KinematicsError> {
        motion.validate()?;

        let (route, steps) = match *motion {
            Motion::JointInterpolated => {
                let steps = self.config.joint_steps(start.joints.max_delta(&end.joints));
                (
                    Route::Joint {
                        from: start.joints,
                        to: end.joints,
                    },
                    steps,
                )
            },
            Motion::Linear => {
                let curve = Curve::line(start.position, end.position);
                self.cartesian(curve, start, end, Some(end.joints))
            },
            Motion::Arc { axis, angle } => {
                let curve = Curve::arc(start.position, end.position, axis, angle);
                self.cartesian(curve, start, end, Some(end.joints))
            },
            Motion::CornerCut {
                previous,
                next,
                lead_in,
                lead_out,
            } => {
                let curve =
                    Curve::corner(start.position, previous, end.position, next, lead_in, lead_out);
                self.cartesian(curve, start, end, None)
            },
        };

        trace!(flavor = %motion.flavor(), steps, "segment planned");

        Ok(Paces {
            robot: Arc::clone(&self.robot),
            route,
            cancel: cancel.clone(),
            clock: self.clock,
            dt,
            step: 0,
            steps,
            previous: start.joints,
            finished: false,
        })
    }

    fn cartesian(
        &self,
        curve: Curve,
        start: &Pose,
        end: &Pose,
        target: Option<Joints>,
    ) -> (Route, usize) {
        let steps = self.config.cartesian_steps(curve.length());
        (
            Route::Cartesian {
                curve,
                from: start.orientation,
                to: end.orientation,
                target,
            },
            steps,
        )
    }
}

/// 插值路线
#[derive(Debug, Clone, Copy)]
enum Route {
    Joint {
        from: Joints,
        to: Joints,
    },
    Cartesian {
        curve: Curve,
        from: Rot3,
        to: Rot3,
        /// 最后一步直接落到的关节角
        target: Option<Joints>,
    },
}

/// 笛卡尔曲线，参数 t ∈ [0, 1]
#[derive(Debug, Clone, Copy)]
enum Curve {
    Line {
        from: Vec3,
        to: Vec3,
    },
    Arc {
        center: Vec3,
        radius: f64,
        /// 弦方向
        u: Vec3,
        /// 凸出方向
        n: Vec3,
        angle: f64,
    },
    /// 直线切入 + 二次 Bézier 圆角
    Corner {
        from: Vec3,
        entry: Vec3,
        corner: Vec3,
        exit: Vec3,
        straight: f64,
        blend: f64,
    },
}

impl Curve {
    fn line(from: Vec3, to: Vec3) -> Self {
        Curve::Line { from, to }
    }

    /// 圆弧；弦为零、弦与轴平行或角度为零时退化为直线
    fn arc(from: Vec3, to: Vec3, axis: Vec3, angle: Rad) -> Self {
        let chord = to - from;
        let length = chord.norm();
        let bulge = axis.normalize().cross(&chord);

        if length < EPSILON || bulge.norm() < EPSILON * length || angle.0 < EPSILON {
            return Curve::line(from, to);
        }

        let u = chord / length;
        let n = bulge.normalize();
        let half = angle.0 / 2.0;
        let radius = length / (2.0 * half.sin());
        let center = (from + to) / 2.0 - n * radius * half.cos();

        Curve::Arc {
            center,
            radius,
            u,
            n,
            angle: angle.0,
        }
    }

    fn corner(from: Vec3, previous: Vec3, corner: Vec3, next: Vec3, lead_in: f64, lead_out: f64) -> Self {
        let incoming = corner - previous;
        let outgoing = next - corner;

        let entry = match incoming.try_normalize(EPSILON) {
            Some(dir) => corner - dir * lead_in.min(incoming.norm() / 2.0),
            None => corner,
        };
        let exit = match outgoing.try_normalize(EPSILON) {
            Some(dir) => corner + dir * lead_out.min(outgoing.norm() / 2.0),
            None => corner,
        };

        let straight = (entry - from).norm();
        let blend = bezier_length(entry, corner, exit);

        Curve::Corner {
            from,
            entry,
            corner,
            exit,
            straight,
            blend,
        }
    }

    fn length(&self) -> f64 {
        match *self {
            Curve::Line { from, to } => (to - from).norm(),
            Curve::Arc { radius, angle, .. } => radius * angle,
            Curve::Corner {
                straight, blend, ..
            } => straight + blend,
        }
    }

    fn point(&self, t: f64) -> Vec3 {
        match *self {
            Curve::Line { from, to } => from + (to - from) * t,
            Curve::Arc {
                center,
                radius,
                u,
                n,
                angle,
            } => {
                let phi = -angle / 2.0 + t * angle;
                center + (u * phi.sin() + n * phi.cos()) * radius
            },
            Curve::Corner {
                from,
                entry,
                corner,
                exit,
                straight,
                blend,
            } => {
                let total = straight + blend;
                if total < EPSILON {
                    return exit;
                }
                let s = t * total;
                if s <= straight {
                    from + (entry - from) * (s / straight)
                } else {
                    let v = ((s - straight) / blend).clamp(0.0, 1.0);
                    bezier(entry, corner, exit, v)
                }
            },
        }
    }
}

fn bezier(a: Vec3, control: Vec3, b: Vec3, t: f64) -> Vec3 {
    let s = 1.0 - t;
    a * (s * s) + control * (2.0 * s * t) + b * (t * t)
}

/// 二次 Bézier 曲线长度（折线近似）
fn bezier_length(a: Vec3, control: Vec3, b: Vec3) -> f64 {
    const SAMPLES: usize = 16;
    let mut length = 0.0;
    let mut last = a;
    for i in 1..=SAMPLES {
        let p = bezier(a, control, b, i as f64 / SAMPLES as f64);
        length += (p - last).norm();
        last = p;
    }
    length
}

/// 插值步迭代器
///
/// 单次消费；取消或失败后不再产出任何 Pace。
pub struct Paces {
    robot: Arc<dyn Kinematics>,
    route: Route,
    cancel: CancelToken,
    clock: PaceClock,
    dt: Duration,
    step: usize,
    steps: usize,
    previous: Joints,
    finished: bool,
}

impl Paces {
    /// 计划步数
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn solve(&self, t: f64, last: bool) -> Option<Joints> {
        match self.route {
            Route::Joint { to, .. } if last => Some(to),
            Route::Joint { from, to } => Some(from.lerp(&to, t)),
            Route::Cartesian {
                target: Some(target),
                ..
            } if last => Some(target),
            Route::Cartesian {
                curve, from, to, ..
            } => {
                let point = curve.point(t);
                let orientation = CartesianPose::slerp_orientation(&from, &to, t);
                let candidates = self.robot.inverse(&orientation, &point);
                match self.robot.closest(Some(&self.previous), &candidates) {
                    Ok(index) => Some(candidates[index]),
                    Err(e) => {
                        warn!(frac = t, ?point, "interpolation step has no solution: {}", e);
                        None
                    },
                }
            },
        }
    }
}

impl Iterator for Paces {
    type Item = Pace;

    fn next(&mut self) -> Option<Pace> {
        if self.finished || self.step >= self.steps {
            return None;
        }
        if self.cancel.is_fired() {
            self.finished = true;
            return None;
        }
        if self.clock == PaceClock::Realtime
            && !self.dt.is_zero()
            && self.cancel.wait_timeout(self.dt)
        {
            self.finished = true;
            return None;
        }

        self.step += 1;
        let frac = self.step as f64 / self.steps as f64;
        match self.solve(frac, self.step == self.steps) {
            Some(joints) => {
                self.previous = joints;
                Some(Pace { frac, joints })
            },
            None => {
                self.finished = true;
                Some(Pace {
                    frac: 0.0,
                    joints: self.previous,
                })
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.steps - self.step))
        }
    }
}
