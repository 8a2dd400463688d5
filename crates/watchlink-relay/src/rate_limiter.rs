//! 遥测限流
//!
//! 常规优先级的发送请求在最小间隔内被直接丢弃（不排队、不合并），
//! 由下一个自然到来的事件重试；高优先级请求绕过限流。

use std::time::{Duration, Instant};

/// 默认最小发送间隔
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// 发送优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPriority {
    /// 常规遥测更新（可丢弃）
    #[default]
    Normal,
    /// 重要更新（绕过限流）
    High,
}

/// 限流器
///
/// 唯一的可变状态是上次成功发送的时间戳；只在发送成功后由
/// [`RateLimiter::record_sent`] 更新。
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_sent_at: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_sent_at(&self) -> Option<Instant> {
        self.last_sent_at
    }

    /// 判断 `now` 时刻是否允许发送
    ///
    /// 常规优先级要求距上次发送严格大于间隔；从未发送过视为无限久以前。
    pub fn permits(&self, now: Instant, priority: SendPriority) -> bool {
        match priority {
            SendPriority::High => true,
            SendPriority::Normal => match self.last_sent_at {
                None => true,
                Some(last) => now.saturating_duration_since(last) > self.interval,
            },
        }
    }

    /// 记录一次成功发送
    pub fn record_sent(&mut self, now: Instant) {
        self.last_sent_at = Some(now);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
