//! 中继指标
//!
//! 原子计数器，可以在任何线程读取快照，不会和中继线程争锁。

use std::sync::atomic::{AtomicU64, Ordering};

/// 中继实时指标
///
/// # 使用示例
///
/// ```rust
/// use watchlink_relay::RelayMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(RelayMetrics::default());
/// metrics.telemetry_sent.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.telemetry_sent, 1);
/// ```
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// 成功下发的遥测消息数
    pub telemetry_sent: AtomicU64,

    /// 被限流丢弃的发送请求数
    pub telemetry_throttled: AtomicU64,

    /// 因数据缺失跳过的发送数
    pub telemetry_skipped: AtomicU64,

    /// 已发送的 ACK 数
    pub acks_sent: AtomicU64,

    /// 已分派到飞行器的指令数
    pub commands_dispatched: AtomicU64,

    /// 被忽略的上行请求数（未知码、未连接）
    pub commands_ignored: AtomicU64,

    /// 在路由边界被记录并吞掉的错误数
    pub errors_suppressed: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            telemetry_sent: self.telemetry_sent.load(Ordering::Relaxed),
            telemetry_throttled: self.telemetry_throttled.load(Ordering::Relaxed),
            telemetry_skipped: self.telemetry_skipped.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            commands_dispatched: self.commands_dispatched.load(Ordering::Relaxed),
            commands_ignored: self.commands_ignored.load(Ordering::Relaxed),
            errors_suppressed: self.errors_suppressed.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.telemetry_sent.store(0, Ordering::Relaxed);
        self.telemetry_throttled.store(0, Ordering::Relaxed);
        self.telemetry_skipped.store(0, Ordering::Relaxed);
        self.acks_sent.store(0, Ordering::Relaxed);
        self.commands_dispatched.store(0, Ordering::Relaxed);
        self.commands_ignored.store(0, Ordering::Relaxed);
        self.errors_suppressed.store(0, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub telemetry_sent: u64,
    pub telemetry_throttled: u64,
    pub telemetry_skipped: u64,
    pub acks_sent: u64,
    pub commands_dispatched: u64,
    pub commands_ignored: u64,
    pub errors_suppressed: u64,
}

impl MetricsSnapshot {
    /// 被限流丢弃的请求占比（百分比），无请求时为 0.0
    pub fn throttle_rate(&self) -> f64 {
        let total = self.telemetry_sent + self.telemetry_throttled;
        if total == 0 {
            return 0.0;
        }
        (self.telemetry_throttled as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_default() {
        let snapshot = RelayMetrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(snapshot.throttle_rate(), 0.0);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = RelayMetrics::new();
        metrics.telemetry_sent.fetch_add(3, Ordering::Relaxed);
        metrics.acks_sent.fetch_add(2, Ordering::Relaxed);
        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_throttle_rate() {
        let metrics = RelayMetrics::new();
        metrics.telemetry_sent.fetch_add(1, Ordering::Relaxed);
        metrics.telemetry_throttled.fetch_add(3, Ordering::Relaxed);
        assert_eq!(metrics.snapshot().throttle_rate(), 75.0);
    }

    #[test]
    fn test_concurrent_reads() {
        let metrics = Arc::new(RelayMetrics::new());
        let writer = {
            let metrics = metrics.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    RelayMetrics::incr(&metrics.acks_sent);
                }
            })
        };
        let _ = metrics.snapshot();
        writer.join().unwrap();
        assert_eq!(metrics.snapshot().acks_sent, 1000);
    }
}
