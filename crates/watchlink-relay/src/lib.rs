//! # Watchlink Relay
//!
//! 飞行器遥测服务与腕戴伴侣显示设备之间的中继核心：
//! - 限流的下行遥测管道（稀疏快照 → 固定结构消息，常规优先级最多每 500ms 一次）
//! - 上行指令分派（整数请求码 → 飞行器操作，按需连接）
//! - 单一飞行器句柄的连接生命周期管理
//!
//! # 线程模型
//!
//! [`Relay`] 本身不做任何同步，所有状态修改都经由 [`Relay::process`]。
//! [`spawn_relay`] 把它放进一个专用线程，协作者通过 [`RelayHandle`] 投递
//! [`RelayEvent`]，从而保证所有回调在同一个执行上下文中串行处理。
//!
//! # Features
//!
//! - `mock`: 内存模拟协作者（[`mock`] 模块），用于测试与演示
//! - `serde`: 协议字典的序列化支持

pub mod config;
pub mod dispatcher;
mod error;
pub mod lifecycle;
pub mod link;
pub mod metrics;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rate_limiter;
mod relay;
pub mod router;
mod runtime;
pub mod snapshot;
pub mod telemetry;
pub mod vehicle;

pub use config::{BatteryDisplay, ConfigError, ConnectionParameter, RelayConfig, Transport};
pub use dispatcher::{DispatchOutcome, cycle_next};
pub use error::RelayError;
pub use lifecycle::{ConnectionManager, ConnectionPhase};
pub use link::{
    HostStatus, LinkError, NullHostStatus, NullNotifier, PeripheralChannel, UserNotifier,
    VehicleLink, VehicleService,
};
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use rate_limiter::{RateLimiter, SendPriority};
pub use relay::{Relay, RelayEvent};
pub use runtime::{RelayHandle, RelayRuntime, spawn_relay};
pub use snapshot::VehicleSnapshot;
pub use telemetry::TelemetryEncoder;
pub use vehicle::*;
