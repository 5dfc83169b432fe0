//! SyncGate - 代际确认同步门
//!
//! 外部观察者每看到一代新程序就提交一次确认；序列器发布第 N 代后阻塞，直到
//! 消费到第 N 代的确认才开始构建第 N+1 代。
//!
//! # 工作原理
//!
//! 监视器（`Mutex` + 两个 `Condvar`）保护一个有界队列：
//!
//! - `acknowledge`: 队列未满时立即返回，满时阻塞直到序列器取走一项
//! - `await_ack`: 逐个取出队列中的确认，丢弃旧代与不匹配的确认，直到遇到期望值
//! - `close`: 唤醒所有等待者，之后两个操作都返回 [`MotionError::GateClosed`]

use crate::error::{MotionError, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug)]
struct Queue {
    acks: VecDeque<u64>,
    closed: bool,
}

/// 代际确认同步门
#[derive(Debug)]
pub struct SyncGate {
    queue: Mutex<Queue>,
    capacity: usize,
    not_full: Condvar,
    not_empty: Condvar,
}

impl SyncGate {
    /// 创建容量为 `capacity` 的同步门（至少为 1）
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SyncGate {
            queue: Mutex::new(Queue {
                acks: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// 当前排队的确认数
    pub fn pending(&self) -> usize {
        self.queue.lock().acks.len()
    }

    /// 提交确认（任意线程并发调用）
    ///
    /// 队列满时阻塞，直到序列器取走一项或同步门关闭。
    pub fn acknowledge(&self, generation: u64) -> Result<()> {
        let mut queue = self.queue.lock();
        while !queue.closed && queue.acks.len() >= self.capacity {
            self.not_full.wait(&mut queue);
        }
        if queue.closed {
            return Err(MotionError::GateClosed);
        }
        queue.acks.push_back(generation);
        self.not_empty.notify_one();
        Ok(())
    }

    /// 等待第 `expected` 代的确认（仅序列器调用）
    ///
    /// 先到的旧代或不匹配的确认被丢弃，每丢弃一项都会唤醒一个阻塞的提交者。
    pub fn await_ack(&self, expected: u64) -> Result<()> {
        let mut queue = self.queue.lock();
        loop {
            if queue.closed {
                return Err(MotionError::GateClosed);
            }
            match queue.acks.pop_front() {
                Some(generation) => {
                    self.not_full.notify_one();
                    if generation == expected {
                        return Ok(());
                    }
                    warn!(
                        expected,
                        received = generation,
                        "discarding mismatched acknowledgment"
                    );
                },
                None => self.not_empty.wait(&mut queue),
            }
        }
    }

    /// 关闭同步门并唤醒所有等待者（幂等）
    pub fn close(&self) {
        let mut queue = self.queue.lock();
        queue.closed = true;
        queue.acks.clear();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.queue.lock().closed
    }
}
