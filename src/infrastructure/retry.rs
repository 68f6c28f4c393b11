//! 有界重试原语
//!
//! 采集会话和删除执行器共用的"限定次数 + 单次超时"轮询，替代散落各处的 sleep 循环

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// 有界重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRetry {
    /// 最多尝试次数（至少 1 次）
    pub attempt_limit: u32,
    /// 每次尝试的超时时间
    pub per_attempt_timeout: Duration,
    /// 同一次尝试内的轮询间隔
    pub poll_interval: Duration,
}

impl BoundedRetry {
    pub fn new(attempt_limit: u32, per_attempt_timeout: Duration) -> Self {
        Self {
            attempt_limit: attempt_limit.max(1),
            per_attempt_timeout,
            poll_interval: Duration::from_millis(250),
        }
    }

    /// 单次尝试，只在超时内轮询
    pub fn once(timeout: Duration) -> Self {
        Self::new(1, timeout)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 反复执行 `probe` 直到返回 `Some`，或所有尝试都超时
    ///
    /// 每次尝试至少探测一次，即使超时为零。`probe` 出错时立即返回，
    /// 不消耗剩余的等待时间
    pub async fn poll<T, E, F, Fut>(&self, mut probe: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        for _ in 0..self.attempt_limit.max(1) {
            let deadline = Instant::now() + self.per_attempt_timeout;
            loop {
                if let Some(value) = probe().await? {
                    return Ok(Some(value));
                }
                if Instant::now() >= deadline {
                    break;
                }
                sleep(self.poll_interval.min(deadline - Instant::now())).await;
            }
        }
        Ok(None)
    }

    /// 把每次尝试交给调用方自己等待（传入单次超时），成功即停
    ///
    /// 出错时立即返回错误，不再继续尝试
    pub async fn attempt<E, F, Fut>(&self, mut action: F) -> Result<bool, E>
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        for _ in 0..self.attempt_limit.max(1) {
            if action(self.per_attempt_timeout).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_first_success() {
        let calls = AtomicU32::new(0);
        let retry = BoundedRetry::once(Duration::from_secs(5));

        let found: Result<_, ()> = retry
            .poll(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok((n == 3).then_some(n)) }
            })
            .await;

        assert_eq!(found, Ok(Some(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_gives_up_after_all_attempts() {
        let calls = AtomicU32::new(0);
        let retry = BoundedRetry::new(2, Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(500));

        let found: Result<Option<()>, ()> = retry
            .poll(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;

        assert_eq!(found, Ok(None));
        // 每次尝试: t=0, 0.5, 1.0
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let retry = BoundedRetry::new(3, Duration::from_secs(5));

        let found: Result<Option<()>, &str> = retry
            .poll(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("websocket closed") }
            })
            .await;

        assert_eq!(found, Err("websocket closed"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_stops_on_success_and_error() {
        let calls = AtomicU32::new(0);
        let retry = BoundedRetry::new(3, Duration::from_millis(10));

        let ok: Result<bool, ()> = retry
            .attempt(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n == 2) }
            })
            .await;
        assert_eq!(ok, Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let err: Result<bool, &str> = retry.attempt(|_| async { Err("boom") }).await;
        assert_eq!(err, Err("boom"));
    }

    #[tokio::test]
    async fn test_zero_timeout_still_probes_once() {
        let calls = AtomicU32::new(0);
        let found: Result<Option<()>, ()> = BoundedRetry::once(Duration::ZERO)
            .poll(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;
        assert_eq!(found, Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
