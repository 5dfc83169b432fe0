//! 取消令牌
//!
//! 插值器在每一步之前检查令牌；步间等待使用条件变量，取消后立即唤醒。

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    fired: Mutex<bool>,
    cond: Condvar,
}

/// 可克隆的取消令牌（所有克隆共享同一状态）
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// 创建未触发的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 触发取消（幂等）
    pub fn fire(&self) {
        let mut fired = self.inner.fired.lock();
        if !*fired {
            *fired = true;
            self.inner.cond.notify_all();
        }
    }

    /// 是否已触发
    pub fn is_fired(&self) -> bool {
        *self.inner.fired.lock()
    }

    /// 等待至多 `timeout`
    ///
    /// 返回 `true` 表示令牌已触发（可能提前返回），`false` 表示超时。
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut fired = self.inner.fired.lock();
        while !*fired {
            if self.inner.cond.wait_until(&mut fired, deadline).timed_out() {
                break;
            }
        }
        *fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fire_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_fired());
        token.fire();
        token.fire();
        assert!(clone.is_fired());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_fire_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let fired = waiter.wait_timeout(Duration::from_secs(10));
            (fired, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        token.fire();

        let (fired, elapsed) = handle.join().unwrap();
        assert!(fired);
        assert!(elapsed < Duration::from_secs(5));
    }
}
