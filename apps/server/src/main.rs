//! # saxis
//!
//! 六轴绘图机械臂运动序列器的 HTTP 前端。
//!
//! ```bash
//! # 默认参数：:8080，./html，阶数 2
//! saxis
//!
//! # 小路径、快节拍、逐步日志
//! saxis --detail 0 --dt 0.05 --debug
//!
//! # 配置文件 + 参数覆盖
//! saxis --config saxis.toml --addr 127.0.0.1:9000
//! ```
//!
//! Ctrl-C 触发优雅关闭（退出码 0）；序列器致命错误同样触发关闭（退出码 1）。

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, bounded, select};
use saxis_motion::{MotionError, MotionService, SequencerExit};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

mod config;
mod routes;

use config::Args;

/// 关闭原因
#[derive(Debug)]
enum StopReason {
    /// Ctrl-C
    Interrupted,
    /// 序列器自行停止
    SequencerStopped,
    /// 序列器致命错误
    SequencerFailed(MotionError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_filter())),
        )
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args.motion_config()?;
    let addr = args.socket_addr()?;

    let service =
        Arc::new(MotionService::start(&config).context("failed to start motion service")?);
    let app = routes::router(service.query().clone(), &args.dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, dir = %args.dir.display(), "Listening");

    let (interrupt_tx, interrupt_rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    let (reason_tx, mut reason_rx) = oneshot::channel();
    let exit = service.exit_receiver();
    let stopper = service.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = tokio::task::spawn_blocking(move || wait_for_stop(&interrupt_rx, &exit))
                .await
                .unwrap_or(StopReason::Interrupted);
            info!(?reason, "Shutting down");

            // 先关闭序列器：阻塞在同步门上的查询随之返回
            shutdown_service(stopper).await;
            let _ = reason_tx.send(reason);
        })
        .await;

    shutdown_service(service).await;
    served.context("HTTP server failed")?;

    match reason_rx.try_recv() {
        Ok(StopReason::SequencerFailed(e)) => {
            error!("Sequencer failed: {}", e);
            Ok(ExitCode::FAILURE)
        },
        Ok(StopReason::Interrupted | StopReason::SequencerStopped) => {
            info!("Shutdown complete");
            Ok(ExitCode::SUCCESS)
        },
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// 在阻塞线程池中关闭运动服务（join 序列器线程）
async fn shutdown_service(service: Arc<MotionService>) {
    if let Err(e) = tokio::task::spawn_blocking(move || service.shutdown()).await {
        error!("Motion service shutdown task failed: {}", e);
    }
}

/// 阻塞等待 Ctrl-C 或序列器退出
fn wait_for_stop(interrupt: &Receiver<()>, exit: &Receiver<SequencerExit>) -> StopReason {
    select! {
        recv(interrupt) -> _ => StopReason::Interrupted,
        recv(exit) -> msg => match msg {
            Ok(SequencerExit::Failed(e)) => StopReason::SequencerFailed(e),
            Ok(SequencerExit::Stopped) | Err(_) => StopReason::SequencerStopped,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saxis_kinematics::PaceClock;
    use saxis_motion::{MotionConfig, SequencerPhase};

    #[tokio::test]
    async fn test_shutdown_service_is_idempotent() {
        let config = MotionConfig {
            depth: 0,
            pace_clock: PaceClock::Unpaced,
            ..Default::default()
        };
        let service = Arc::new(MotionService::start(&config).unwrap());

        shutdown_service(service.clone()).await;
        shutdown_service(service.clone()).await;
        assert_eq!(service.phase(), SequencerPhase::Stopped);
    }

    #[test]
    fn test_wait_for_stop_reasons() {
        let (interrupt_tx, interrupt_rx) = bounded(1);
        let (exit_tx, exit_rx) = bounded(1);

        interrupt_tx.send(()).unwrap();
        assert!(matches!(
            wait_for_stop(&interrupt_rx, &exit_rx),
            StopReason::Interrupted
        ));

        exit_tx
            .send(SequencerExit::Failed(MotionError::Cancelled))
            .unwrap();
        assert!(matches!(
            wait_for_stop(&interrupt_rx, &exit_rx),
            StopReason::SequencerFailed(MotionError::Cancelled)
        ));

        drop(exit_tx);
        assert!(matches!(
            wait_for_stop(&interrupt_rx, &exit_rx),
            StopReason::SequencerStopped
        ));
    }
}
