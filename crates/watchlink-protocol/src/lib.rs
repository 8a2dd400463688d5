//! # Watchlink Protocol
//!
//! 中继服务与腕戴伴侣显示设备之间的字典协议定义（无 I/O 依赖）
//!
//! ## 模块
//!
//! - `constants`: 字典键、请求码与协议版本常量
//! - `dictionary`: 整数键字典（链路上的唯一载荷形态）
//! - `outbound`: 遥测下行消息（4 个固定字段）
//! - `inbound`: 设备上行请求解析
//!
//! ## 消息形态
//!
//! ```text
//! 下行 (relay → watch):  {0: 模式, 1: 跟随类型, 2: 遥测文本, 3: 协议版本}
//! 上行 (watch → relay):  {100: 请求码 (101..=106)}
//! ```
//!
//! 每条上行消息都必须被确认（ACK），无论其内容是否可识别。

pub mod constants;
pub mod dictionary;
pub mod inbound;
pub mod outbound;

// 重新导出常用类型
pub use constants::*;
pub use dictionary::{Dictionary, Value};
pub use inbound::{InboundMessage, RequestCode};
pub use outbound::TelemetryMessage;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Missing dictionary key {key}")]
    MissingKey { key: u32 },

    #[error("Dictionary key {key} has unexpected type (expected {expected})")]
    WrongType { key: u32, expected: &'static str },

    #[error("Unknown request code: {0}")]
    UnknownRequest(i32),

    #[error("Protocol version mismatch: expected {expected:?}, got {actual:?}")]
    VersionMismatch { expected: String, actual: String },
}
