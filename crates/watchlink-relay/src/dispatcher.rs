//! 上行指令分派
//!
//! 把 [`RequestCode`] 映射到飞行器操作。确认（ACK）与按需连接由
//! [`Relay`](crate::Relay) 在调用这里之前完成；这里只处理"已连接"之后的部分。

use crate::error::RelayError;
use crate::link::VehicleLink;
use crate::vehicle::{Attribute, AttributeKind, FollowState, FollowType, VehicleMode};
use tracing::debug;
use watchlink_protocol::RequestCode;

/// 返航指令的目标模式
pub const RTL_MODE: VehicleMode = VehicleMode::Rtl;

/// 分派结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 连接请求：按需连接已经完成，无需操作
    AlreadyConnected,
    /// 断开请求：由调用方执行完整拆除
    TeardownRequested,
    FollowDisabled,
    /// 已启用跟随（`None` 表示沿用服务端当前类型）
    FollowEnabled(Option<FollowType>),
    Paused,
    ModeChanged(VehicleMode),
}

/// 按固定顺序取下一个元素，越过末尾回到开头
///
/// 当前值为 `None` 或不在序列中时返回第一个元素；空序列返回 `None`。
///
/// # Example
///
/// ```
/// use watchlink_relay::cycle_next;
///
/// let order = [1, 2, 3, 4];
/// assert_eq!(cycle_next(&order, Some(4)), Some(1));
/// assert_eq!(cycle_next(&order, Some(2)), Some(3));
/// assert_eq!(cycle_next(&order, None), Some(1));
/// ```
pub fn cycle_next<T: Copy + PartialEq>(order: &[T], current: Option<T>) -> Option<T> {
    let next = current
        .and_then(|c| order.iter().position(|item| *item == c))
        .map_or(0, |idx| (idx + 1) % order.len());
    order.get(next).copied()
}

fn read_follow_state<V: VehicleLink + ?Sized>(vehicle: &V) -> Result<FollowState, RelayError> {
    match vehicle.read_attribute(AttributeKind::FollowState) {
        Some(Attribute::FollowState(follow)) => Ok(follow),
        _ => Err(RelayError::MissingData(AttributeKind::FollowState)),
    }
}

/// 对已连接的飞行器执行一条请求
pub fn dispatch<V: VehicleLink + ?Sized>(
    vehicle: &mut V,
    code: RequestCode,
) -> Result<DispatchOutcome, RelayError> {
    debug!("Dispatching request {:?}", code);
    match code {
        RequestCode::Connect => Ok(DispatchOutcome::AlreadyConnected),
        RequestCode::Disconnect => Ok(DispatchOutcome::TeardownRequested),
        RequestCode::ModeFollow => {
            let follow = read_follow_state(vehicle)?;
            if follow.is_enabled() {
                vehicle.disable_follow()?;
                Ok(DispatchOutcome::FollowDisabled)
            } else {
                vehicle.enable_follow(follow.follow_type)?;
                Ok(DispatchOutcome::FollowEnabled(follow.follow_type))
            }
        },
        RequestCode::CycleFollowType => {
            let follow = read_follow_state(vehicle)?;
            let next = cycle_next(&FollowType::ALL, follow.follow_type);
            vehicle.enable_follow(next)?;
            Ok(DispatchOutcome::FollowEnabled(next))
        },
        RequestCode::Pause => {
            vehicle.pause_at_current_location()?;
            Ok(DispatchOutcome::Paused)
        },
        RequestCode::ModeRtl => {
            vehicle.change_mode(RTL_MODE)?;
            Ok(DispatchOutcome::ModeChanged(RTL_MODE))
        },
    }
}
