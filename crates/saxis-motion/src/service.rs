//! MotionService - 组装入口
//!
//! 按配置构造运动学模型、路径、共享状态、同步门与发布板，启动序列器线程，
//! 并把查询服务交给传输层。
//!
//! # 使用示例
//!
//! ```no_run
//! use saxis_motion::{MotionConfig, MotionService, QueryRequest};
//!
//! let service = MotionService::start(&MotionConfig::default()).unwrap();
//! let response = service.query().handle(&QueryRequest::new("status", 0)).unwrap();
//! # let _ = response;
//! service.shutdown();
//! ```

use crate::config::MotionConfig;
use crate::error::{MotionError, Result};
use crate::gate::SyncGate;
use crate::path::DrawingPath;
use crate::program::ProgramBoard;
use crate::query::QueryService;
use crate::sequencer::{Sequencer, SequencerExit, SequencerHandle, SequencerPhase};
use crate::state::RobotState;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use saxis_kinematics::{Joints, Kinematics, Rad, SixAxis};
use std::sync::Arc;
use tracing::info;

/// 运动服务
pub struct MotionService {
    query: QueryService,
    handle: Mutex<Option<SequencerHandle>>,
    exit: Receiver<SequencerExit>,
}

impl MotionService {
    /// 使用配置中的关节表构造机械臂并启动
    pub fn start(config: &MotionConfig) -> Result<Self> {
        let robot = SixAxis::new(config.joints.clone())?.with_precision(config.precision());
        Self::start_with(config, Arc::new(robot))
    }

    /// 使用给定的运动学模型启动
    pub fn start_with(config: &MotionConfig, robot: Arc<dyn Kinematics>) -> Result<Self> {
        config.validate()?;

        let path = Arc::new(DrawingPath::from_config(config)?);
        if path.is_empty() {
            return Err(MotionError::InvalidConfig {
                param: "depth",
                reason: "path has no waypoints".to_string(),
            });
        }

        let state = RobotState::new(robot.clone(), Joints::splat(Rad(0.0)));
        let gate = Arc::new(SyncGate::new(config.gate_capacity));
        let board = Arc::new(ProgramBoard::new());

        let query = QueryService::new(state.clone(), gate.clone(), board.clone(), &path);
        let sequencer = Sequencer::new(config, robot, path.clone(), state, gate, board)?;
        let handle = sequencer.spawn()?;
        let exit = handle.exit_receiver();

        info!(
            depth = config.depth,
            waypoints = path.len(),
            dt = config.dt,
            "Motion service started"
        );

        Ok(MotionService {
            query,
            handle: Mutex::new(Some(handle)),
            exit,
        })
    }

    /// 查询服务（可克隆后交给传输层）
    pub fn query(&self) -> &QueryService {
        &self.query
    }

    /// 序列器当前阶段
    pub fn phase(&self) -> SequencerPhase {
        match self.handle.lock().as_ref() {
            Some(handle) => handle.phase(),
            None => SequencerPhase::Stopped,
        }
    }

    /// 序列器退出通知
    pub fn exit_receiver(&self) -> Receiver<SequencerExit> {
        self.exit.clone()
    }

    /// 关闭序列器并等待线程结束（可重复调用）
    pub fn shutdown(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.shutdown();
            info!("Motion service shut down");
        }
    }
}

impl Drop for MotionService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
