//! Sequencer - 运动序列器
//!
//! 在独立线程中无限循环：每一代沿全部路点构建一份程序，把每个插值步即时写入
//! 共享状态，发布程序后阻塞等待该代的确认。
//!
//! # 状态机
//!
//! ```text
//! Bootstrap → Building(g, flavor) → AwaitingAck(g) → Building(g+1, flavor+1) → ...
//!                     │                   │
//!                     └──── 致命错误 ──────┴──→ Failed
//!          取消 / 同步门关闭 ──────────────────→ Stopped
//! ```
//!
//! # 运动方式
//!
//! - 第一段与最后一个路点段固定使用 Linear（连接抬起的静止位置）
//! - 其余路点段使用轮换方式：第 g 代（从 1 开始）使用 `Flavor::from_index(g - 1)`
//! - 路点段之后追加收尾段（抬起）与返回段（回到起点上方，`2·dt`）
//!
//! # 关闭
//!
//! [`SequencerHandle::shutdown`]（或 Drop）触发取消令牌、关闭同步门并 join 线程。
//! 序列器在每一代开始时和每个插值步提交时检查取消令牌。

use crate::config::MotionConfig;
use crate::error::{MotionError, Result};
use crate::executor::{Extras, SegmentExecutor};
use crate::gate::SyncGate;
use crate::path::{DrawingPath, Waypoint, drawing_orientation, lift};
use crate::program::{Program, ProgramBoard, Segment};
use crate::resolver::PoseResolver;
use crate::state::RobotState;
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use saxis_kinematics::{CancelToken, Flavor, Interpolator, Kinematics, Pace, Pose};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// 序列器阶段
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerPhase {
    /// 解析全部路点
    Bootstrap,
    /// 构建第 `generation` 代
    Building {
        /// 代数
        generation: u64,
        /// 轮换方式
        flavor: Flavor,
    },
    /// 已发布第 `generation` 代，等待确认
    AwaitingAck {
        /// 代数
        generation: u64,
    },
    /// 已关闭
    Stopped,
    /// 致命错误
    Failed {
        /// 错误描述
        reason: String,
    },
}

impl SequencerPhase {
    /// 是否已结束（Stopped 或 Failed）
    pub fn is_terminal(&self) -> bool {
        matches!(self, SequencerPhase::Stopped | SequencerPhase::Failed { .. })
    }
}

/// 序列器线程的退出原因
#[derive(Debug, Clone)]
pub enum SequencerExit {
    /// 正常关闭
    Stopped,
    /// 致命错误
    Failed(MotionError),
}

/// 启动时解析完成的固定位姿
#[derive(Debug, Clone)]
struct Itinerary {
    /// 路点位姿
    poses: Vec<Pose>,
    /// 最后一个路点上方的收尾位姿
    retreat: Pose,
    /// 起点上方的返回位姿
    home: Pose,
}

/// 运动序列器
pub struct Sequencer {
    dt: Duration,
    retreat: f64,
    extras: Extras,
    path: Arc<DrawingPath>,
    resolver: PoseResolver,
    executor: SegmentExecutor,
    state: RobotState,
    gate: Arc<SyncGate>,
    board: Arc<ProgramBoard>,
    cancel: CancelToken,
    phase: Arc<Mutex<SequencerPhase>>,
}

impl Sequencer {
    /// 创建序列器
    ///
    /// # 错误
    ///
    /// 配置无效或路径为空时返回错误。
    pub fn new(
        config: &MotionConfig,
        robot: Arc<dyn Kinematics>,
        path: Arc<DrawingPath>,
        state: RobotState,
        gate: Arc<SyncGate>,
        board: Arc<ProgramBoard>,
    ) -> Result<Self> {
        config.validate()?;
        if path.is_empty() {
            return Err(MotionError::InvalidConfig {
                param: "depth",
                reason: "path has no waypoints".to_string(),
            });
        }

        let interpolator =
            Interpolator::new(robot.clone(), config.interpolator_config(), config.pace_clock)?;

        Ok(Sequencer {
            dt: config.step_duration(),
            retreat: config.retreat,
            extras: Extras::from_config(config),
            path,
            resolver: PoseResolver::new(robot),
            executor: SegmentExecutor::new(interpolator, state.clone()),
            state,
            gate,
            board,
            cancel: CancelToken::new(),
            phase: Arc::new(Mutex::new(SequencerPhase::Bootstrap)),
        })
    }

    /// 在后台线程中启动
    pub fn spawn(self) -> Result<SequencerHandle> {
        let (exit_tx, exit_rx) = bounded(1);
        let cancel = self.cancel.clone();
        let gate = self.gate.clone();
        let phase = self.phase.clone();

        let thread = thread::Builder::new()
            .name("saxis-sequencer".to_string())
            .spawn(move || self.main_loop(exit_tx))
            .map_err(|e| MotionError::Spawn(e.to_string()))?;

        Ok(SequencerHandle {
            thread: Some(thread),
            cancel,
            gate,
            phase,
            exit: exit_rx,
        })
    }

    fn main_loop(self, exit_tx: Sender<SequencerExit>) {
        let exit = match self.run() {
            Ok(()) => SequencerExit::Stopped,
            Err(e) if !e.is_fatal() => SequencerExit::Stopped,
            Err(e) => SequencerExit::Failed(e),
        };

        match &exit {
            SequencerExit::Stopped => {
                info!("Sequencer stopped");
                self.set_phase(SequencerPhase::Stopped);
            },
            SequencerExit::Failed(e) => {
                error!("Sequencer failed: {}", e);
                self.set_phase(SequencerPhase::Failed {
                    reason: e.to_string(),
                });
            },
        }

        let _ = exit_tx.send(exit);
    }

    fn run(&self) -> Result<()> {
        self.set_phase(SequencerPhase::Bootstrap);
        let itinerary = self.bootstrap()?;

        loop {
            if self.cancel.is_fired() {
                return Ok(());
            }

            let generation = self.board.generation() + 1;
            let flavor = Flavor::from_index(generation - 1);
            self.set_phase(SequencerPhase::Building { generation, flavor });

            let program = self.build(generation, flavor, &itinerary)?;
            let (segments, paces) = (program.len(), program.pace_count());
            let published = self.board.publish(program);
            info!(
                generation = published,
                %flavor,
                segments,
                paces,
                "Program published"
            );

            self.set_phase(SequencerPhase::AwaitingAck {
                generation: published,
            });
            self.gate.await_ack(published)?;
            debug!(generation = published, "Acknowledgment consumed");
        }
    }

    /// 解析起始位形、全部路点位姿以及收尾/返回位姿
    fn bootstrap(&self) -> Result<Itinerary> {
        let orientation = drawing_orientation();
        let Some(&first) = self.path.curve().first() else {
            return Err(MotionError::InvalidConfig {
                param: "depth",
                reason: "path has no waypoints".to_string(),
            });
        };

        let initial = self
            .resolver
            .resolve(&Waypoint::new(first, orientation), None)?;
        self.state.set_joints(initial.joints);

        let poses = self
            .resolver
            .resolve_path(self.path.waypoints(), Some(&initial))?;
        let (Some(head), Some(last)) = (poses.first(), poses.last()) else {
            return Err(MotionError::InvalidConfig {
                param: "depth",
                reason: "no waypoint poses resolved".to_string(),
            });
        };

        let retreat = self.resolver.resolve(
            &Waypoint::new(lift(last.position, self.retreat), orientation),
            Some(last),
        )?;
        let home = self.resolver.resolve(
            &Waypoint::new(lift(first, self.retreat), orientation),
            Some(head),
        )?;

        info!(waypoints = poses.len(), "Bootstrap complete");
        Ok(Itinerary {
            poses,
            retreat,
            home,
        })
    }

    fn build(&self, generation: u64, flavor: Flavor, itinerary: &Itinerary) -> Result<Program> {
        let poses = &itinerary.poses;
        let last = poses.len() - 1;
        let mut program = Program::new();

        for (i, pose) in poses.iter().enumerate() {
            let effective = if i == 0 || i == last {
                Flavor::Linear
            } else {
                flavor
            };
            let extras = self.extras.with_neighbours(
                i.checked_sub(1).map(|j| poses[j].position),
                poses.get(i + 1).map(|p| p.position),
            );

            let paces =
                self.executor
                    .run(effective, self.dt, None, pose, &extras, &self.cancel)?;
            program.push(self.commit(generation, i, effective, paces)?);
        }

        let paces = self.executor.run(
            Flavor::Linear,
            self.dt,
            Some(&poses[last]),
            &itinerary.retreat,
            &self.extras,
            &self.cancel,
        )?;
        program.push(self.commit(generation, last + 1, Flavor::Linear, paces)?);

        let paces = self.executor.run(
            Flavor::Linear,
            self.dt * 2,
            Some(&itinerary.retreat),
            &itinerary.home,
            &self.extras,
            &self.cancel,
        )?;
        program.push(self.commit(generation, last + 2, Flavor::Linear, paces)?);

        Ok(program)
    }

    /// 逐步消费插值步：检查失败与取消，写入共享状态，收集成段
    ///
    /// 取消只在取下一步之前检查；已经产出的插值步总会先写入共享状态。
    fn commit(
        &self,
        generation: u64,
        segment: usize,
        flavor: Flavor,
        mut paces: impl Iterator<Item = Pace>,
    ) -> Result<Segment> {
        let mut collected = Vec::with_capacity(paces.size_hint().1.unwrap_or(0));

        loop {
            // 也覆盖迭代器因取消而提前结束的情况
            if self.cancel.is_fired() {
                return Err(MotionError::Cancelled);
            }
            let Some(pace) = paces.next() else {
                break;
            };
            if pace.is_failure() {
                return Err(MotionError::InterpolationFailed {
                    generation,
                    segment,
                    flavor,
                });
            }
            self.state.apply_pace(&pace);
            debug!(generation, segment, frac = pace.frac, joints = ?pace.joints, "pace");
            collected.push(pace);
        }

        Ok(Segment {
            flavor,
            paces: collected,
        })
    }

    fn set_phase(&self, phase: SequencerPhase) {
        debug!(?phase, "Sequencer phase");
        *self.phase.lock() = phase;
    }
}

/// 序列器句柄
///
/// Drop 时自动关闭并 join 后台线程。
pub struct SequencerHandle {
    thread: Option<thread::JoinHandle<()>>,
    cancel: CancelToken,
    gate: Arc<SyncGate>,
    phase: Arc<Mutex<SequencerPhase>>,
    exit: Receiver<SequencerExit>,
}

impl SequencerHandle {
    /// 当前阶段
    pub fn phase(&self) -> SequencerPhase {
        self.phase.lock().clone()
    }

    /// 退出通知（序列器线程结束时发送一次）
    pub fn exit_receiver(&self) -> Receiver<SequencerExit> {
        self.exit.clone()
    }

    /// 优雅关闭：触发取消、关闭同步门并等待线程结束
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel.fire();
        self.gate.close();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("Sequencer thread panicked");
        }
    }
}

impl Drop for SequencerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saxis_kinematics::{Joints, PaceClock, Rad, SixAxis};

    fn sequencer() -> Sequencer {
        let config = MotionConfig {
            depth: 0,
            pace_clock: PaceClock::Unpaced,
            ..Default::default()
        };
        let robot = Arc::new(SixAxis::reference().unwrap());
        let path = Arc::new(DrawingPath::from_config(&config).unwrap());
        let state = RobotState::new(robot.clone(), Joints::splat(Rad(0.0)));
        Sequencer::new(
            &config,
            robot,
            path,
            state,
            Arc::new(SyncGate::new(config.gate_capacity)),
            Arc::new(ProgramBoard::new()),
        )
        .unwrap()
    }

    fn pace(i: u32) -> Pace {
        Pace {
            frac: f64::from(i) / 3.0,
            joints: Joints::splat(Rad(0.1 * f64::from(i))),
        }
    }

    #[test]
    fn test_commit_collects_every_pace() {
        let sequencer = sequencer();
        let segment = sequencer
            .commit(1, 0, Flavor::Linear, (1..=3).map(pace))
            .unwrap();

        assert_eq!(segment.paces.len(), 3);
        assert_eq!(sequencer.state.joints(), Joints::splat(Rad(0.1 * 3.0)));
    }

    #[test]
    fn test_cancel_after_yield_still_applies_pace() {
        let sequencer = sequencer();
        let cancel = sequencer.cancel.clone();
        // 第二步产出的同时触发取消
        let paces = (1..=3).map(move |i| {
            if i == 2 {
                cancel.fire();
            }
            pace(i)
        });

        let result = sequencer.commit(1, 0, Flavor::Linear, paces);
        assert!(matches!(result, Err(MotionError::Cancelled)));
        assert_eq!(sequencer.state.joints(), Joints::splat(Rad(0.1 * 2.0)));
    }

    #[test]
    fn test_cancel_before_first_pace() {
        let sequencer = sequencer();
        sequencer.cancel.fire();

        let result = sequencer.commit(1, 0, Flavor::Linear, (1..=3).map(pace));
        assert!(matches!(result, Err(MotionError::Cancelled)));
        assert_eq!(sequencer.state.joints(), Joints::splat(Rad(0.0)));
    }

    #[test]
    fn test_failed_pace_reports_segment() {
        let sequencer = sequencer();
        let paces = [
            pace(1),
            Pace {
                frac: 0.0,
                joints: Joints::splat(Rad(0.1)),
            },
        ];

        let result = sequencer.commit(2, 3, Flavor::Arc, paces.into_iter());
        assert!(matches!(
            result,
            Err(MotionError::InterpolationFailed {
                generation: 2,
                segment: 3,
                flavor: Flavor::Arc,
            })
        ));
    }
}
