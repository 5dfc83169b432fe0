//! 查询服务
//!
//! 传输层之下的查询接口：解析请求信封，必要时提交确认，然后读取共享状态与已
//! 发布程序。
//!
//! # 请求
//!
//! ```json
//! {"command": "status", "generation": 3}
//! ```
//!
//! 也接受 `{"Cmd": "status", "Pcount": 3}`；缺少代数时视为 0。
//!
//! # 确认规则
//!
//! 请求中的代数等于服务端当前代数（且已至少发布一代）时，该请求同时是一次确认：
//! 在读取之前向同步门提交一次（每个请求至多一次）。确认在任何读锁之外提交，
//! 同步门满时会阻塞调用线程，因此传输层应在阻塞线程池中调用 [`QueryService::handle`]。

use crate::gate::SyncGate;
use crate::path::DrawingPath;
use crate::program::{Program, ProgramBoard};
use crate::state::{RobotSnapshot, RobotState};
use saxis_kinematics::{JointSpec, Joints};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 查询错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// 请求格式错误或命令未知
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 服务正在关闭
    #[error("Service unavailable: shutting down")]
    Unavailable,
}

/// 查询命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 场景：路径、关节描述、当前位姿
    Scene,
    /// 原始路径点
    Hilbert,
    /// 当前位姿、代数，以及调用方落后时的最新程序
    Status,
}

impl FromStr for Command {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scene" => Ok(Command::Scene),
            "hilbert" => Ok(Command::Hilbert),
            "status" => Ok(Command::Status),
            other => Err(QueryError::BadRequest(format!("unknown command {:?}", other))),
        }
    }
}

/// 查询请求信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// 命令
    #[serde(alias = "Cmd")]
    pub command: String,
    /// 调用方已知的代数
    #[serde(default, alias = "Pcount")]
    pub generation: u64,
}

impl QueryRequest {
    /// 创建请求
    pub fn new(command: impl Into<String>, generation: u64) -> Self {
        QueryRequest {
            command: command.into(),
            generation,
        }
    }

    /// 从 JSON 解析
    pub fn from_json(body: &str) -> Result<Self, QueryError> {
        serde_json::from_str(body).map_err(|e| QueryError::BadRequest(e.to_string()))
    }
}

/// 位姿视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseView {
    /// 末端位置
    pub position: [f64; 3],
    /// 末端姿态（行优先 3×3）
    pub orientation: [[f64; 3]; 3],
    /// 关节角（弧度）
    pub joints: Joints,
}

impl From<&RobotSnapshot> for PoseView {
    fn from(snapshot: &RobotSnapshot) -> Self {
        let p = snapshot.pose.position;
        let m = snapshot.pose.orientation.matrix();
        PoseView {
            position: [p.x, p.y, p.z],
            orientation: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
            joints: snapshot.joints,
        }
    }
}

/// 场景视图
#[derive(Debug, Clone, Serialize)]
pub struct SceneView {
    /// 路径点
    pub path: Arc<[[f64; 3]]>,
    /// 关节描述
    pub joints: Arc<[JointSpec]>,
    /// 当前位姿
    pub pose: PoseView,
}

/// 状态视图
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    /// 当前位姿
    pub pose: PoseView,
    /// 服务端当前代数
    pub generation: u64,
    /// 调用方落后时附带最新程序
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<Arc<Program>>,
}

/// 查询响应
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// 场景
    Scene(SceneView),
    /// 原始路径点
    Hilbert(Arc<[[f64; 3]]>),
    /// 状态
    Status(StatusView),
}

/// 查询服务（可克隆，所有克隆共享同一份状态）
#[derive(Debug, Clone)]
pub struct QueryService {
    state: RobotState,
    gate: Arc<SyncGate>,
    board: Arc<ProgramBoard>,
    path: Arc<[[f64; 3]]>,
    joints: Arc<[JointSpec]>,
}

impl QueryService {
    /// 创建查询服务
    pub fn new(
        state: RobotState,
        gate: Arc<SyncGate>,
        board: Arc<ProgramBoard>,
        path: &DrawingPath,
    ) -> Self {
        let joints = state.robot().joints().into();
        let path = path.curve().iter().map(|p| [p.x, p.y, p.z]).collect();
        QueryService {
            state,
            gate,
            board,
            path,
            joints,
        }
    }

    /// 处理请求
    ///
    /// # 错误
    ///
    /// - [`QueryError::BadRequest`]: 未知命令（不会提交确认）
    /// - [`QueryError::Unavailable`]: 同步门已关闭
    pub fn handle(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let command: Command = request.command.parse()?;

        let current = self.board.generation();
        if current > 0 && request.generation == current {
            self.gate
                .acknowledge(current)
                .map_err(|_| QueryError::Unavailable)?;
            debug!(generation = current, "Acknowledgment submitted");
        }

        let response = match command {
            Command::Scene => QueryResponse::Scene(SceneView {
                path: self.path.clone(),
                joints: self.joints.clone(),
                pose: PoseView::from(&self.state.snapshot()),
            }),
            Command::Hilbert => QueryResponse::Hilbert(self.path.clone()),
            Command::Status => {
                let pose = PoseView::from(&self.state.snapshot());
                let published = self.board.current();
                let program = if request.generation < published.generation {
                    published.program.clone()
                } else {
                    None
                };
                QueryResponse::Status(StatusView {
                    pose,
                    generation: published.generation,
                    program,
                })
            },
        };
        Ok(response)
    }

    /// 解析 JSON 请求并处理
    pub fn handle_json(&self, body: &str) -> Result<QueryResponse, QueryError> {
        self.handle(&QueryRequest::from_json(body)?)
    }

    /// 当前代数
    pub fn generation(&self) -> u64 {
        self.board.generation()
    }
}
