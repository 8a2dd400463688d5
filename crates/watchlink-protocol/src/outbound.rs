//! 遥测下行消息
//!
//! 一条下行消息固定包含 4 个字符串字段，要么整体发送，要么不发送。

use crate::constants::*;
use crate::{Dictionary, ProtocolError};

/// 遥测下行消息
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryMessage {
    /// 模式标签（已按 Disarmed / Follow / Paused 优先级覆盖）
    pub mode_label: String,
    /// 跟随类型标签，未设置时为 `"none"`
    pub follow_type_label: String,
    /// 三行遥测文本：电池、高度、速度
    pub telemetry_text: String,
    /// 协议版本标签
    pub protocol_version: String,
}

impl TelemetryMessage {
    /// 使用当前协议版本构建消息
    pub fn new(
        mode_label: impl Into<String>,
        follow_type_label: impl Into<String>,
        telemetry_text: impl Into<String>,
    ) -> Self {
        Self {
            mode_label: mode_label.into(),
            follow_type_label: follow_type_label.into(),
            telemetry_text: telemetry_text.into(),
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// 编码为字典（4 个键全部写入）
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.add_string(KEY_MODE, self.mode_label.as_str());
        dict.add_string(KEY_FOLLOW_TYPE, self.follow_type_label.as_str());
        dict.add_string(KEY_TELEM, self.telemetry_text.as_str());
        dict.add_string(KEY_APP_VERSION, self.protocol_version.as_str());
        dict
    }

    /// 遥测文本按行拆分
    pub fn telemetry_lines(&self) -> impl Iterator<Item = &str> {
        self.telemetry_text.split('\n')
    }
}

/// 设备端解码
///
/// 版本标签与 [`PROTOCOL_VERSION`] 不一致时拒收，这是设备端的兼容性闸门。
impl TryFrom<&Dictionary> for TelemetryMessage {
    type Error = ProtocolError;

    fn try_from(dict: &Dictionary) -> Result<Self, Self::Error> {
        let protocol_version = dict.get_string(KEY_APP_VERSION)?;
        if protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION.to_string(),
                actual: protocol_version.to_string(),
            });
        }

        Ok(Self {
            mode_label: dict.get_string(KEY_MODE)?.to_string(),
            follow_type_label: dict.get_string(KEY_FOLLOW_TYPE)?.to_string(),
            telemetry_text: dict.get_string(KEY_TELEM)?.to_string(),
            protocol_version: protocol_version.to_string(),
        })
    }
}
