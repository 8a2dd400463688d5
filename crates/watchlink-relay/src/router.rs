//! 事件路由
//!
//! 对 [`VehicleEvent`] 做穷尽匹配，决定每种事件的处理路径：
//!
//! | 事件 | 动作 |
//! |------|------|
//! | `Disconnected` | 完整拆除会话 |
//! | `Connected` | 启动伴侣应用，不发送遥测 |
//! | `ModeChanged` / `BatteryUpdated` / `SpeedUpdated` | 限流发送 |
//! | `FollowStarted` / `FollowStopped` | 限流发送 + 跟随状态提示 |
//!
//! 这里只做决策，执行由 [`Relay`](crate::Relay) 完成。

use crate::rate_limiter::SendPriority;
use crate::vehicle::{FollowState, FollowStateKind, VehicleEvent};

/// 跟随状态提示前缀
pub const FOLLOW_STATUS_PREFIX: &str = "FollowMe ";

/// 单个事件的处理动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// 拆除会话（飞行器句柄、服务绑定、前台状态）
    Teardown,
    /// 在伴侣设备上启动应用
    LaunchApp,
    /// 请求发送遥测
    Send {
        priority: SendPriority,
        /// 同时向用户提示跟随状态
        notify_follow: bool,
    },
}

/// 事件 → 动作
pub fn route(event: VehicleEvent) -> RouteAction {
    match event {
        VehicleEvent::Disconnected => RouteAction::Teardown,
        VehicleEvent::Connected => RouteAction::LaunchApp,
        VehicleEvent::ModeChanged | VehicleEvent::BatteryUpdated | VehicleEvent::SpeedUpdated => {
            RouteAction::Send {
                priority: SendPriority::Normal,
                notify_follow: false,
            }
        },
        VehicleEvent::FollowStarted | VehicleEvent::FollowStopped => RouteAction::Send {
            priority: SendPriority::Normal,
            notify_follow: true,
        },
    }
}

/// 跟随状态种类的提示标签
pub fn follow_status_label(kind: FollowStateKind) -> &'static str {
    match kind {
        FollowStateKind::Start | FollowStateKind::Running => "enabled",
        FollowStateKind::End => "disabled",
        FollowStateKind::Invalid => "error: invalid state",
        FollowStateKind::DroneDisconnected => "error: drone not connected",
        FollowStateKind::DroneNotArmed => "error: drone not armed",
    }
}

/// 面向用户的跟随状态文本，跟随状态不可用时不提示
pub fn follow_status_text(follow: Option<FollowState>) -> Option<String> {
    follow.map(|f| format!("{}{}", FOLLOW_STATUS_PREFIX, follow_status_label(f.kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::FollowType;

    #[test]
    fn test_lifecycle_events_are_not_sends() {
        assert_eq!(route(VehicleEvent::Disconnected), RouteAction::Teardown);
        assert_eq!(route(VehicleEvent::Connected), RouteAction::LaunchApp);
    }

    #[test]
    fn test_telemetry_events_are_throttled() {
        for event in [
            VehicleEvent::ModeChanged,
            VehicleEvent::BatteryUpdated,
            VehicleEvent::SpeedUpdated,
        ] {
            assert_eq!(
                route(event),
                RouteAction::Send {
                    priority: SendPriority::Normal,
                    notify_follow: false
                }
            );
        }
    }

    #[test]
    fn test_follow_events_send_and_notify() {
        for event in [VehicleEvent::FollowStarted, VehicleEvent::FollowStopped] {
            assert_eq!(
                route(event),
                RouteAction::Send {
                    priority: SendPriority::Normal,
                    notify_follow: true
                }
            );
        }
    }

    #[test]
    fn test_follow_status_labels() {
        assert_eq!(follow_status_label(FollowStateKind::Start), "enabled");
        assert_eq!(follow_status_label(FollowStateKind::Running), "enabled");
        assert_eq!(follow_status_label(FollowStateKind::End), "disabled");
        assert_eq!(
            follow_status_label(FollowStateKind::Invalid),
            "error: invalid state"
        );
        assert_eq!(
            follow_status_label(FollowStateKind::DroneDisconnected),
            "error: drone not connected"
        );
        assert_eq!(
            follow_status_label(FollowStateKind::DroneNotArmed),
            "error: drone not armed"
        );
    }

    #[test]
    fn test_follow_status_text() {
        let follow = FollowState::new(FollowStateKind::Running, Some(FollowType::Lead));
        assert_eq!(
            follow_status_text(Some(follow)).as_deref(),
            Some("FollowMe enabled")
        );
        assert_eq!(follow_status_text(None), None);
    }
}
