//! 运动序列器
//!
//! 在 [`saxis_kinematics`] 之上实现绘图机械臂的运行时：
//! - 路点生成与解析（Hilbert 曲线 → 连续的关节位形）
//! - 段执行与序列器线程（每代轮换一种运动方式）
//! - 共享机器人状态（单写多读，强一致）
//! - 同步门（客户端确认驱动下一代）与程序发布板
//! - 与传输无关的查询服务
//!
//! # 线程模型
//!
//! ```text
//! Sequencer 线程 ──apply_pace──→ RobotState ←──snapshot── 查询处理器（N 个）
//!        │                                                   │
//!        ├──publish──→ ProgramBoard ←──────current───────────┤
//!        └──await_ack──  SyncGate  ←──────acknowledge────────┘
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod path;
pub mod program;
pub mod query;
pub mod resolver;
pub mod sequencer;
mod service;
pub mod state;

pub use config::MotionConfig;
pub use error::{MotionError, Result};
pub use executor::{Extras, SegmentExecutor};
pub use gate::SyncGate;
pub use path::{DrawingPath, Waypoint};
pub use program::{Program, ProgramBoard, Published, Segment};
pub use query::{
    Command, PoseView, QueryError, QueryRequest, QueryResponse, QueryService, SceneView,
    StatusView,
};
pub use resolver::PoseResolver;
pub use sequencer::{Sequencer, SequencerExit, SequencerHandle, SequencerPhase};
pub use service::MotionService;
pub use state::{RobotSnapshot, RobotState};
