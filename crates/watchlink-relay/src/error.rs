//! 中继层错误类型定义

use crate::config::ConfigError;
use crate::link::LinkError;
use crate::vehicle::AttributeKind;
use thiserror::Error;
use watchlink_protocol::ProtocolError;

/// 中继层错误类型
#[derive(Error, Debug)]
pub enum RelayError {
    /// 协作者调用错误
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 必需的飞行器属性缺失（协作者尚未上报）
    #[error("Missing vehicle attribute: {0}")]
    MissingData(AttributeKind),

    /// 没有存活的飞行器句柄
    #[error("No live vehicle handle")]
    NoVehicle,

    /// 事件通道已关闭（中继线程退出）
    #[error("Relay channel closed")]
    ChannelClosed,

    /// 事件通道已满
    #[error("Relay channel full")]
    ChannelFull,

    /// 中继线程错误
    #[error("Relay thread error: {0}")]
    Thread(String),
}

impl RelayError {
    /// 是否属于"数据缺失"类错误（静默跳过，等待下一个自然事件重试）
    pub fn is_missing_data(&self) -> bool {
        matches!(self, RelayError::MissingData(_))
    }
}
