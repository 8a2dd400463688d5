//! 协作者接口
//!
//! 中继核心只通过以下 trait 与外界交互：
//!
//! ```text
//! VehicleService ──create_vehicle()──> VehicleLink    (飞行器服务 / 飞行器句柄)
//! PeripheralChannel                                     (伴侣设备下行通道)
//! HostStatus                                            (宿主进程前台状态)
//! UserNotifier                                          (用户提示)
//! ```
//!
//! 所有调用都是"发出即返回"：连接、断开、飞行器指令的完成情况通过之后的
//! [`RelayEvent`](crate::RelayEvent) 回报，而不是返回值。返回的 `Err` 只表示
//! 请求本身没有被协作者接受。

use crate::config::ConnectionParameter;
use crate::vehicle::{Attribute, AttributeKind, FollowType, VehicleMode};
use thiserror::Error;
use watchlink_protocol::Dictionary;

/// 协作者调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// 协作者当前不可用（未绑定、已销毁等）
    #[error("Collaborator not available")]
    NotAvailable,

    /// 协作者拒绝了请求（例如飞控拒绝模式切换）
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// 底层传输错误
    #[error("I/O error: {0}")]
    Io(String),
}

/// 飞行器服务（服务绑定 + 句柄工厂）
///
/// `bind()` 是异步的：绑定完成后协作者投递 `RelayEvent::ServiceConnected`。
pub trait VehicleService {
    type Vehicle: VehicleLink;

    /// 发起服务绑定
    fn bind(&mut self) -> Result<(), LinkError>;

    /// 解除服务绑定
    fn unbind(&mut self);

    /// 创建一个新的飞行器句柄
    fn create_vehicle(&mut self) -> Self::Vehicle;
}

/// 单个飞行器句柄
pub trait VehicleLink {
    /// 读取属性当前值，协作者尚未上报时返回 `None`
    fn read_attribute(&self, kind: AttributeKind) -> Option<Attribute>;

    fn start(&mut self) -> Result<(), LinkError>;

    fn is_started(&self) -> bool;

    fn is_connected(&self) -> bool;

    fn connect(&mut self, parameter: &ConnectionParameter) -> Result<(), LinkError>;

    fn disconnect(&mut self) -> Result<(), LinkError>;

    /// 启用跟随
    ///
    /// `None` 表示沿用服务端当前的跟随类型。
    fn enable_follow(&mut self, follow_type: Option<FollowType>) -> Result<(), LinkError>;

    fn disable_follow(&mut self) -> Result<(), LinkError>;

    fn pause_at_current_location(&mut self) -> Result<(), LinkError>;

    fn change_mode(&mut self, mode: VehicleMode) -> Result<(), LinkError>;

    /// 服务中断后销毁句柄，释放协作者侧资源
    fn destroy(&mut self);
}

/// 伴侣设备下行通道
pub trait PeripheralChannel {
    /// 确认一条上行消息（无载荷）
    fn send_ack(&mut self, transaction_id: u8) -> Result<(), LinkError>;

    /// 下发一条字典消息（不等待送达确认）
    fn send_data(&mut self, data: &Dictionary) -> Result<(), LinkError>;

    /// 在设备上启动/激活伴侣应用
    fn launch_app(&mut self) -> Result<(), LinkError>;
}

/// 宿主进程的前台可见状态
pub trait HostStatus {
    fn start_foreground(&mut self, title: &str);

    fn stop_foreground(&mut self);
}

/// 用户提示（toast 等）
pub trait UserNotifier {
    fn notify(&mut self, text: &str);
}

/// 丢弃所有提示
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl UserNotifier for NullNotifier {
    fn notify(&mut self, _text: &str) {}
}

/// 不维护任何前台状态
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHostStatus;

impl HostStatus for NullHostStatus {
    fn start_foreground(&mut self, _title: &str) {}

    fn stop_foreground(&mut self) {}
}
